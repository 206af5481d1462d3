use syn::{Arm, Block, Expr, ExprIf, ExprMatch, Stmt};

use super::evaluator::{GuardError, GuardEvaluator};
use super::outcome::CheckOutcome;
use super::patterns;
use super::termination;
use crate::config::ResultProtocol;

/// Proof state threaded through one walk of one function body against one
/// target access. The three fields are deliberately orthogonal: the
/// asymmetric conditional and ternary rules only compose because proof
/// state, termination, and access-found are tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkerState {
    pub check_outcome: CheckOutcome,
    pub terminated: bool,
    pub accessed_value: bool,
}

impl WalkerState {
    fn new() -> Self {
        Self {
            check_outcome: CheckOutcome::Unchecked,
            terminated: false,
            accessed_value: false,
        }
    }

    /// The two guarded shapes accepted as safe: the access sits on a
    /// success-proven path, or a failure-proven branch already exited and
    /// the access sits outside it.
    pub fn is_correct_usage(&self) -> bool {
        (self.accessed_value && self.check_outcome == CheckOutcome::CheckedSuccess)
            || (self.check_outcome == CheckOutcome::CheckedFailure
                && self.terminated
                && !self.accessed_value)
    }
}

impl Default for WalkerState {
    fn default() -> Self {
        Self::new()
    }
}

/// How a walk step hands control back to the level that dispatched it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Keep going with the next sibling.
    Continue,
    /// The current path ends here: siblings at the dispatching level are
    /// skipped, but enclosing scopes keep walking.
    EndPath,
    /// A correct-usage verdict was reached; unwind the whole walk.
    Settled,
}

type Step = Result<(WalkerState, Flow), GuardError>;

/// Walks a function body in document order, threading the state through
/// every step as a value instead of mutating a shared object, so a branch
/// can never leak partial state into its siblings by accident.
pub struct BodyWalker<'a> {
    target: &'a Expr,
    protocol: &'a ResultProtocol,
    evaluator: GuardEvaluator<'a>,
}

impl<'a> BodyWalker<'a> {
    pub fn new(target: &'a Expr, protocol: &'a ResultProtocol) -> Self {
        Self {
            target,
            protocol,
            evaluator: GuardEvaluator::new(target, protocol),
        }
    }

    pub fn walk(&self, body: &Block) -> Result<WalkerState, GuardError> {
        let (state, _) = self.walk_block(WalkerState::new(), body)?;
        Ok(state)
    }

    fn walk_block(&self, mut state: WalkerState, block: &Block) -> Step {
        for stmt in &block.stmts {
            let (next, flow) = self.walk_stmt(state, stmt)?;
            state = next;
            if flow == Flow::Settled || state.is_correct_usage() {
                return Ok((state, Flow::Settled));
            }
            if flow == Flow::EndPath {
                break;
            }
        }
        Ok((state, Flow::Continue))
    }

    fn walk_stmt(&self, mut state: WalkerState, stmt: &Stmt) -> Step {
        if termination::is_terminating(stmt) {
            state.terminated = true;
            let (mut state, flow) = self.walk_stmt_children(state, stmt)?;
            if flow == Flow::Settled || state.is_correct_usage() {
                return Ok((state, Flow::Settled));
            }
            // Descending through the statement must not lose the exit.
            state.terminated = true;
            return Ok((state, Flow::EndPath));
        }
        match stmt {
            Stmt::Local(local) => {
                if let Some(init) = &local.init {
                    let (next, flow) = self.walk_expr(state, &init.expr)?;
                    state = next;
                    if flow == Flow::Settled || state.is_correct_usage() {
                        return Ok((state, Flow::Settled));
                    }
                    if let Some((_, diverge)) = &init.diverge {
                        let (next, flow) = self.walk_expr(state, diverge)?;
                        state = next;
                        if flow == Flow::Settled || state.is_correct_usage() {
                            return Ok((state, Flow::Settled));
                        }
                    }
                }
                Ok((state, Flow::Continue))
            }
            Stmt::Expr(Expr::If(expr_if), _) => self.walk_if_statement(state, expr_if),
            Stmt::Expr(expr, _) => {
                let (state, flow) = self.walk_expr(state, expr)?;
                if flow == Flow::Settled || state.is_correct_usage() {
                    return Ok((state, Flow::Settled));
                }
                // An EndPath below statement level is spent here; the block
                // continues with its next statement.
                if flow == Flow::EndPath && state.terminated {
                    return Ok((state, Flow::EndPath));
                }
                Ok((state, Flow::Continue))
            }
            // Nested items get their own analyses; other macro statements
            // carry opaque tokens.
            Stmt::Item(_) | Stmt::Macro(_) => Ok((state, Flow::Continue)),
        }
    }

    fn walk_stmt_children(&self, state: WalkerState, stmt: &Stmt) -> Step {
        match stmt {
            Stmt::Expr(Expr::Return(ret), _) => match &ret.expr {
                Some(expr) => self.walk_expr(state, expr),
                None => Ok((state, Flow::Continue)),
            },
            Stmt::Expr(Expr::Block(expr_block), _) => self.walk_block(state, &expr_block.block),
            Stmt::Expr(expr, _) => self.walk_expr(state, expr),
            _ => Ok((state, Flow::Continue)),
        }
    }

    /// Conditional statement: the condition's proof holds while walking the
    /// substructure; a success proof that only held inside a branch that
    /// exited does not carry past the conditional.
    fn walk_if_statement(&self, mut state: WalkerState, expr_if: &ExprIf) -> Step {
        state.check_outcome = self.evaluator.evaluate(&expr_if.cond)?;
        let (next, flow) = self.walk_if_children(state, expr_if)?;
        state = next;
        if flow == Flow::Settled || state.is_correct_usage() {
            return Ok((state, Flow::Settled));
        }
        if state.check_outcome == CheckOutcome::CheckedSuccess
            && state.terminated
            && !state.accessed_value
        {
            state.check_outcome = CheckOutcome::Unchecked;
        }
        // Termination inside a branch does not terminate the enclosing
        // scope.
        state.terminated = false;
        Ok((state, Flow::Continue))
    }

    fn walk_if_children(&self, mut state: WalkerState, expr_if: &ExprIf) -> Step {
        let (next, flow) = self.walk_expr(state, &expr_if.cond)?;
        state = next;
        if flow == Flow::Settled || state.is_correct_usage() {
            return Ok((state, Flow::Settled));
        }
        if flow == Flow::EndPath {
            return Ok((state, Flow::Continue));
        }

        let (next, flow) = self.walk_block(state, &expr_if.then_branch)?;
        state = next;
        if flow == Flow::Settled || state.is_correct_usage() {
            return Ok((state, Flow::Settled));
        }

        if let Some((_, else_expr)) = &expr_if.else_branch {
            let (next, flow) = match &**else_expr {
                // else-if stays in statement position.
                Expr::If(nested) => self.walk_if_statement(state, nested),
                Expr::Block(expr_block) => self.walk_block(state, &expr_block.block),
                other => self.walk_expr(state, other),
            }?;
            state = next;
            if flow == Flow::Settled || state.is_correct_usage() {
                return Ok((state, Flow::Settled));
            }
        }
        Ok((state, Flow::Continue))
    }

    /// Conditional in expression position: the condition decides which
    /// branch may hold the access, compared by node identity. Whatever state
    /// results, this expression is the final word on its path.
    fn walk_ternary(&self, mut state: WalkerState, expr_if: &ExprIf) -> Step {
        state.check_outcome = self.evaluator.evaluate(&expr_if.cond)?;
        let when_true = block_value(&expr_if.then_branch);
        let when_false = expr_if
            .else_branch
            .as_ref()
            .and_then(|(_, else_expr)| else_value(else_expr));
        match state.check_outcome {
            CheckOutcome::CheckedSuccess => {
                state.accessed_value =
                    self.is_target_opt(when_true) && !self.is_target_opt(when_false);
            }
            CheckOutcome::CheckedFailure => {
                state.accessed_value =
                    self.is_target_opt(when_false) && !self.is_target_opt(when_true);
            }
            _ => {}
        }
        if state.is_correct_usage() {
            Ok((state, Flow::Settled))
        } else {
            Ok((state, Flow::EndPath))
        }
    }

    fn walk_match(&self, mut state: WalkerState, expr_match: &ExprMatch) -> Step {
        // TODO: verify the scrutinee is the wrapper expression itself
        let (next, flow) = self.walk_expr(state, &expr_match.expr)?;
        state = next;
        if flow == Flow::Settled || state.is_correct_usage() {
            return Ok((state, Flow::Settled));
        }
        if flow == Flow::EndPath {
            return Ok((state, Flow::Continue));
        }
        for arm in &expr_match.arms {
            let (next, flow) = self.walk_arm(state, arm)?;
            state = next;
            if flow == Flow::Settled || state.is_correct_usage() {
                return Ok((state, Flow::Settled));
            }
            if flow == Flow::EndPath {
                break;
            }
        }
        Ok((state, Flow::Continue))
    }

    fn walk_arm(&self, mut state: WalkerState, arm: &Arm) -> Step {
        state.check_outcome = patterns::classify_pattern(&arm.pat, self.protocol);
        if state.is_correct_usage() {
            return Ok((state, Flow::Settled));
        }
        if let Some((_, guard)) = &arm.guard {
            let (next, flow) = self.walk_expr(state, guard)?;
            state = next;
            if flow == Flow::Settled || state.is_correct_usage() {
                return Ok((state, Flow::Settled));
            }
        }
        let (next, flow) = self.walk_expr(state, &arm.body)?;
        state = next;
        if flow == Flow::Settled || state.is_correct_usage() {
            return Ok((state, Flow::Settled));
        }
        Ok((state, Flow::Continue))
    }

    fn walk_expr(&self, mut state: WalkerState, expr: &Expr) -> Step {
        if std::ptr::eq(expr, self.target) {
            state.accessed_value = true;
            return Ok((state, Flow::EndPath));
        }
        match expr {
            Expr::If(expr_if) => self.walk_ternary(state, expr_if),
            Expr::Match(expr_match) => self.walk_match(state, expr_match),
            Expr::Return(ret) => {
                state.terminated = true;
                if let Some(inner) = &ret.expr {
                    let (next, flow) = self.walk_expr(state, inner)?;
                    state = next;
                    if flow == Flow::Settled || state.is_correct_usage() {
                        return Ok((state, Flow::Settled));
                    }
                    state.terminated = true;
                }
                Ok((state, Flow::EndPath))
            }
            Expr::Macro(expr_macro) if termination::is_diverging_macro(&expr_macro.mac) => {
                state.terminated = true;
                Ok((state, Flow::EndPath))
            }
            Expr::Block(expr_block) => self.walk_block(state, &expr_block.block),
            Expr::Unsafe(expr_unsafe) => self.walk_block(state, &expr_unsafe.block),
            Expr::Loop(expr_loop) => self.walk_block(state, &expr_loop.body),
            Expr::While(expr_while) => {
                let (next, flow) = self.walk_expr(state, &expr_while.cond)?;
                state = next;
                if flow == Flow::Settled || state.is_correct_usage() {
                    return Ok((state, Flow::Settled));
                }
                if flow == Flow::EndPath {
                    return Ok((state, Flow::Continue));
                }
                self.walk_block(state, &expr_while.body)
            }
            Expr::ForLoop(expr_for) => {
                let (next, flow) = self.walk_expr(state, &expr_for.expr)?;
                state = next;
                if flow == Flow::Settled || state.is_correct_usage() {
                    return Ok((state, Flow::Settled));
                }
                if flow == Flow::EndPath {
                    return Ok((state, Flow::Continue));
                }
                self.walk_block(state, &expr_for.body)
            }
            Expr::Closure(closure) => {
                let (next, flow) = self.walk_expr(state, &closure.body)?;
                state = next;
                if flow == Flow::Settled || state.is_correct_usage() {
                    return Ok((state, Flow::Settled));
                }
                Ok((state, Flow::Continue))
            }
            _ => self.walk_expr_children(state, expr),
        }
    }

    fn walk_expr_children(&self, mut state: WalkerState, expr: &Expr) -> Step {
        for child in subexpressions(expr) {
            let (next, flow) = self.walk_expr(state, child)?;
            state = next;
            if flow == Flow::Settled || state.is_correct_usage() {
                return Ok((state, Flow::Settled));
            }
            if flow == Flow::EndPath {
                break;
            }
        }
        Ok((state, Flow::Continue))
    }

    fn is_target_opt(&self, expr: Option<&Expr>) -> bool {
        expr.is_some_and(|expr| std::ptr::eq(expr, self.target))
    }
}

/// The value an expression-position block evaluates to: its trailing
/// expression, when there is one.
fn block_value(block: &Block) -> Option<&Expr> {
    match block.stmts.last() {
        Some(Stmt::Expr(expr, None)) => Some(expr),
        _ => None,
    }
}

fn else_value(expr: &Expr) -> Option<&Expr> {
    match expr {
        Expr::Block(expr_block) => block_value(&expr_block.block),
        other => Some(other),
    }
}

/// Document-order child expressions for shapes the walker has no special
/// rule for.
fn subexpressions(expr: &Expr) -> Vec<&Expr> {
    match expr {
        Expr::Binary(e) => vec![&e.left, &e.right],
        Expr::Unary(e) => vec![&e.expr],
        Expr::Paren(e) => vec![&e.expr],
        Expr::Group(e) => vec![&e.expr],
        Expr::Field(e) => vec![&e.base],
        Expr::MethodCall(e) => std::iter::once(&*e.receiver).chain(e.args.iter()).collect(),
        Expr::Call(e) => std::iter::once(&*e.func).chain(e.args.iter()).collect(),
        Expr::Index(e) => vec![&e.expr, &e.index],
        Expr::Assign(e) => vec![&e.left, &e.right],
        Expr::Let(e) => vec![&e.expr],
        Expr::Reference(e) => vec![&e.expr],
        Expr::Tuple(e) => e.elems.iter().collect(),
        Expr::Array(e) => e.elems.iter().collect(),
        Expr::Struct(e) => e
            .fields
            .iter()
            .map(|field| &field.expr)
            .chain(e.rest.as_deref())
            .collect(),
        Expr::Cast(e) => vec![&e.expr],
        Expr::Await(e) => vec![&e.base],
        Expr::Try(e) => vec![&e.expr],
        Expr::Range(e) => e
            .start
            .as_deref()
            .into_iter()
            .chain(e.end.as_deref())
            .collect(),
        Expr::Repeat(e) => vec![&e.expr, &e.len],
        Expr::Break(e) => e.expr.as_deref().into_iter().collect(),
        _ => Vec::new(),
    }
}

/// Analyzes one value access against its enclosing function body.
///
/// Returns `true` when the access is provably guarded; `false` verdicts
/// become findings. Deterministic over immutable inputs: a fresh state is
/// built per call and nothing is shared across calls.
pub fn analyze_body(
    body: &Block,
    target: &Expr,
    protocol: &ResultProtocol,
) -> Result<bool, GuardError> {
    let walker = BodyWalker::new(target, protocol);
    Ok(walker.walk(body)?.is_correct_usage())
}
