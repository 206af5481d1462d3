use syn::{BinOp, Expr, ExprBinary, Lit, Member, UnOp};
use thiserror::Error;

use super::outcome::CheckOutcome;
use super::patterns;
use crate::config::ResultProtocol;

/// The one guard shape the evaluator refuses to guess about. Degrading a
/// whole `match` condition to `Unchecked` would silently hide a soundness
/// gap, so it surfaces as an error instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    #[error("match expression as a guard condition is not supported yet (line {line})")]
    MatchCondition { line: usize },
}

/// Derives what a boolean guard expression proves about the wrapper.
///
/// Purely structural: no mutation, and every unsupported shape degrades to
/// `Unchecked` rather than erroring (with the single exception above).
pub struct GuardEvaluator<'a> {
    target: &'a Expr,
    protocol: &'a ResultProtocol,
}

impl<'a> GuardEvaluator<'a> {
    pub fn new(target: &'a Expr, protocol: &'a ResultProtocol) -> Self {
        Self { target, protocol }
    }

    pub fn evaluate(&self, expr: &Expr) -> Result<CheckOutcome, GuardError> {
        match expr {
            Expr::Binary(binary) => self.evaluate_binary(binary),
            Expr::Unary(unary) if matches!(unary.op, UnOp::Not(_)) => {
                Ok(self.evaluate(&unary.expr)?.inverted())
            }
            Expr::Field(_) | Expr::MethodCall(_) => Ok(self.classify_member(expr)),
            Expr::Paren(paren) => self.evaluate(&paren.expr),
            Expr::Group(group) => self.evaluate(&group.expr),
            // The condition of a nested conditional speaks for both of its
            // branches.
            Expr::If(expr_if) => self.evaluate(&expr_if.cond),
            Expr::Let(expr_let) => Ok(patterns::classify_pattern(&expr_let.pat, self.protocol)),
            Expr::Match(expr_match) => Err(GuardError::MatchCondition {
                line: expr_match.match_token.span.start().line,
            }),
            _ => Ok(CheckOutcome::Unchecked),
        }
    }

    fn evaluate_binary(&self, binary: &ExprBinary) -> Result<CheckOutcome, GuardError> {
        use CheckOutcome::*;

        match binary.op {
            BinOp::And(_) => {
                let left = self.evaluate(&binary.left)?;
                let right = self.evaluate(&binary.right)?;
                // Short-circuit: the right operand only executes once the
                // left proof holds, so an access embedded on the right is
                // guarded by the left.
                if left == CheckedSuccess && right == AccessedValue {
                    return Ok(CheckedSuccess);
                }
                Ok(match (left, right) {
                    (Unchecked, other) | (other, Unchecked) => other,
                    (l, r) if l == r => l,
                    _ => Unchecked,
                })
            }
            BinOp::Or(_) => {
                let left = self.evaluate(&binary.left)?;
                let right = self.evaluate(&binary.right)?;
                // `r.is_failure || r.value > 1`: the right operand is only
                // reached when the failure check came up false, i.e. on the
                // success path.
                if left == CheckedFailure && right == AccessedValue {
                    return Ok(CheckedSuccess);
                }
                Ok(match (left, right) {
                    (Unchecked, _) | (CheckedFailure, _) => left,
                    (_, Unchecked) => right,
                    (l, r) if l == r => l,
                    _ => Unchecked,
                })
            }
            BinOp::Eq(_) => self.evaluate_comparison(binary, false),
            BinOp::Ne(_) => self.evaluate_comparison(binary, true),
            _ => {
                let left = self.evaluate(&binary.left)?;
                let right = self.evaluate(&binary.right)?;
                if left == AccessedValue || right == AccessedValue {
                    Ok(AccessedValue)
                } else {
                    Ok(Unchecked)
                }
            }
        }
    }

    /// `r.is_success == true` and friends normalize to the flag outcome the
    /// combination implies; inequality reverses the mapping. The literal may
    /// sit on either side.
    fn evaluate_comparison(
        &self,
        binary: &ExprBinary,
        negated: bool,
    ) -> Result<CheckOutcome, GuardError> {
        let left = self.evaluate(&binary.left)?;
        let right = self.evaluate(&binary.right)?;

        let flag_and_literal = match (bool_literal(&binary.right), bool_literal(&binary.left)) {
            (Some(literal), _) => Some((left, literal)),
            (_, Some(literal)) => Some((right, literal)),
            _ => None,
        };
        if let Some((flag, literal)) = flag_and_literal {
            if flag.is_flag_proof() {
                let mut outcome = flag;
                if !literal {
                    outcome = outcome.inverted();
                }
                if negated {
                    outcome = outcome.inverted();
                }
                return Ok(outcome);
            }
        }

        if !negated && (left == CheckOutcome::AccessedValue || right == CheckOutcome::AccessedValue)
        {
            return Ok(CheckOutcome::AccessedValue);
        }
        Ok(CheckOutcome::Unchecked)
    }

    /// A bare flag read proves its flag; the target access node itself is
    /// reported as such so that guards containing the access stay visible to
    /// the operator rules.
    fn classify_member(&self, expr: &Expr) -> CheckOutcome {
        if std::ptr::eq(expr, self.target) {
            return CheckOutcome::AccessedValue;
        }
        let name = match expr {
            Expr::Field(field) => match &field.member {
                Member::Named(ident) => ident.to_string(),
                Member::Unnamed(_) => return CheckOutcome::Unchecked,
            },
            Expr::MethodCall(call) if call.args.is_empty() => call.method.to_string(),
            _ => return CheckOutcome::Unchecked,
        };
        if name == self.protocol.success_flag {
            CheckOutcome::CheckedSuccess
        } else if name == self.protocol.failure_flag {
            CheckOutcome::CheckedFailure
        } else {
            CheckOutcome::Unchecked
        }
    }
}

fn bool_literal(expr: &Expr) -> Option<bool> {
    match expr {
        Expr::Lit(expr_lit) => match &expr_lit.lit {
            Lit::Bool(lit) => Some(lit.value),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::access::find_value_access;
    use syn::parse_quote;

    // A target that never aliases anything inside the guard under test.
    fn detached_target() -> Expr {
        parse_quote!(detached.value)
    }

    fn eval(guard: Expr) -> CheckOutcome {
        let target = detached_target();
        let protocol = ResultProtocol::default();
        GuardEvaluator::new(&target, &protocol)
            .evaluate(&guard)
            .unwrap()
    }

    /// Evaluates a guard whose embedded `.value` access is the target.
    fn eval_with_embedded_target(guard: &Expr) -> CheckOutcome {
        let protocol = ResultProtocol::default();
        let target = find_value_access(guard, &protocol).expect("guard contains a value access");
        GuardEvaluator::new(target, &protocol)
            .evaluate(guard)
            .unwrap()
    }

    #[test]
    fn flag_reads_prove_their_flag() {
        assert_eq!(eval(parse_quote!(r.is_success)), CheckOutcome::CheckedSuccess);
        assert_eq!(eval(parse_quote!(r.is_failure)), CheckOutcome::CheckedFailure);
        assert_eq!(eval(parse_quote!(r.is_success())), CheckOutcome::CheckedSuccess);
        assert_eq!(eval(parse_quote!(r.is_failure())), CheckOutcome::CheckedFailure);
    }

    #[test]
    fn negation_inverts_flag_proofs() {
        assert_eq!(eval(parse_quote!(!r.is_success)), CheckOutcome::CheckedFailure);
        assert_eq!(eval(parse_quote!(!r.is_failure)), CheckOutcome::CheckedSuccess);
    }

    #[test]
    fn boolean_literal_comparisons_normalize() {
        assert_eq!(
            eval(parse_quote!(r.is_success == true)),
            CheckOutcome::CheckedSuccess
        );
        assert_eq!(
            eval(parse_quote!(r.is_success == false)),
            CheckOutcome::CheckedFailure
        );
        assert_eq!(
            eval(parse_quote!(r.is_failure == true)),
            CheckOutcome::CheckedFailure
        );
        assert_eq!(
            eval(parse_quote!(r.is_failure == false)),
            CheckOutcome::CheckedSuccess
        );
        assert_eq!(
            eval(parse_quote!(true == r.is_success)),
            CheckOutcome::CheckedSuccess
        );
    }

    #[test]
    fn inequality_reverses_the_mapping() {
        assert_eq!(
            eval(parse_quote!(r.is_success != true)),
            CheckOutcome::CheckedFailure
        );
        assert_eq!(
            eval(parse_quote!(r.is_failure != true)),
            CheckOutcome::CheckedSuccess
        );
        assert_eq!(
            eval(parse_quote!(r.is_failure != false)),
            CheckOutcome::CheckedFailure
        );
    }

    #[test]
    fn and_keeps_the_proving_side() {
        assert_eq!(
            eval(parse_quote!(r.is_success && x > 1)),
            CheckOutcome::CheckedSuccess
        );
        assert_eq!(
            eval(parse_quote!(x > 1 && r.is_failure)),
            CheckOutcome::CheckedFailure
        );
        assert_eq!(
            eval(parse_quote!(r.is_success && r.is_success)),
            CheckOutcome::CheckedSuccess
        );
    }

    #[test]
    fn and_with_conflicting_proofs_is_unchecked() {
        assert_eq!(
            eval(parse_quote!(r.is_success && r.is_failure)),
            CheckOutcome::Unchecked
        );
    }

    #[test]
    fn and_carries_the_left_proof_to_an_embedded_access() {
        let guard: Expr = parse_quote!(r.is_success && r.value > 1);
        assert_eq!(eval_with_embedded_target(&guard), CheckOutcome::CheckedSuccess);
    }

    #[test]
    fn or_with_failure_left_guards_an_embedded_access() {
        let guard: Expr = parse_quote!(r.is_failure || r.value > 1);
        assert_eq!(eval_with_embedded_target(&guard), CheckOutcome::CheckedSuccess);
    }

    #[test]
    fn or_with_success_left_does_not_guard_an_embedded_access() {
        // `is_success || f(value)` reaches the access exactly when the check
        // failed.
        let guard: Expr = parse_quote!(r.is_success || r.value > 1);
        assert_eq!(eval_with_embedded_target(&guard), CheckOutcome::Unchecked);
    }

    #[test]
    fn or_keeps_a_weak_left_operand() {
        assert_eq!(
            eval(parse_quote!(x > 1 || r.is_success)),
            CheckOutcome::Unchecked
        );
        assert_eq!(
            eval(parse_quote!(r.is_failure || x > 1)),
            CheckOutcome::CheckedFailure
        );
        assert_eq!(
            eval(parse_quote!(r.is_success || x > 1)),
            CheckOutcome::Unchecked
        );
    }

    #[test]
    fn ternary_condition_speaks_for_the_expression() {
        assert_eq!(
            eval(parse_quote!(if r.is_success { a } else { b })),
            CheckOutcome::CheckedSuccess
        );
    }

    #[test]
    fn let_guard_delegates_to_the_pattern_classifier() {
        assert_eq!(
            eval(parse_quote!(
                let Outcome {
                    is_success: true, ..
                } = r
            )),
            CheckOutcome::CheckedSuccess
        );
    }

    #[test]
    fn unrecognized_shapes_are_unchecked() {
        assert_eq!(eval(parse_quote!(x > 1)), CheckOutcome::Unchecked);
        assert_eq!(eval(parse_quote!(r.check())), CheckOutcome::Unchecked);
        assert_eq!(eval(parse_quote!(true)), CheckOutcome::Unchecked);
        assert_eq!(eval(parse_quote!(r.other_field)), CheckOutcome::Unchecked);
    }

    #[test]
    fn match_condition_is_reported_not_swallowed() {
        let target = detached_target();
        let protocol = ResultProtocol::default();
        let guard: Expr = parse_quote!(match r {
            _ => true,
        });
        let err = GuardEvaluator::new(&target, &protocol)
            .evaluate(&guard)
            .unwrap_err();
        assert!(matches!(err, GuardError::MatchCondition { .. }));
    }

    #[test]
    fn evaluation_is_idempotent() {
        let guard: Expr = parse_quote!(r.is_failure || r.value > 1);
        assert_eq!(
            eval_with_embedded_target(&guard),
            eval_with_embedded_target(&guard)
        );
    }
}
