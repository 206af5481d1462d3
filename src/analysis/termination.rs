use syn::{Block, Expr, Macro, Stmt};

/// Macros that never return control to the caller.
const DIVERGING_MACROS: &[&str] = &["panic", "unreachable", "todo", "unimplemented"];

/// Shallow classification: the statement itself exits the enclosing control
/// flow, or it is a bare block whose direct top-level statements do. Nested
/// blocks are not searched; this is not a reachability analysis.
pub fn is_terminating(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Expr(expr, _) => is_terminating_expr(expr),
        Stmt::Macro(stmt_macro) => is_diverging_macro(&stmt_macro.mac),
        _ => false,
    }
}

fn is_terminating_expr(expr: &Expr) -> bool {
    match expr {
        Expr::Return(_) => true,
        Expr::Macro(expr_macro) => is_diverging_macro(&expr_macro.mac),
        Expr::Block(expr_block) => contains_terminating(&expr_block.block),
        _ => false,
    }
}

/// Direct top-level statements only.
fn contains_terminating(block: &Block) -> bool {
    block.stmts.iter().any(|stmt| match stmt {
        Stmt::Expr(Expr::Return(_), _) => true,
        Stmt::Expr(Expr::Macro(expr_macro), _) => is_diverging_macro(&expr_macro.mac),
        Stmt::Macro(stmt_macro) => is_diverging_macro(&stmt_macro.mac),
        _ => false,
    })
}

pub fn is_diverging_macro(mac: &Macro) -> bool {
    mac.path
        .segments
        .last()
        .map(|segment| {
            let name = segment.ident.to_string();
            DIVERGING_MACROS.contains(&name.as_str())
        })
        .unwrap_or(false)
}
