use syn::{Lit, Member, Pat};

use super::outcome::CheckOutcome;
use crate::config::ResultProtocol;

/// Classifies a destructuring pattern against the wrapper protocol.
///
/// A struct pattern whose named sub-patterns pin the success flag to `true`
/// or the failure flag to `false` proves `CheckedSuccess`. No other
/// combination is classified; in particular there is deliberately no
/// symmetric rule for failure-proving patterns.
pub fn classify_pattern(pat: &Pat, protocol: &ResultProtocol) -> CheckOutcome {
    let Pat::Struct(pat_struct) = pat else {
        return CheckOutcome::Unchecked;
    };

    for field in &pat_struct.fields {
        let Member::Named(name) = &field.member else {
            continue;
        };
        let Some(literal) = bool_pattern(&field.pat) else {
            continue;
        };
        let name = name.to_string();
        if (literal && name == protocol.success_flag)
            || (!literal && name == protocol.failure_flag)
        {
            return CheckOutcome::CheckedSuccess;
        }
    }

    CheckOutcome::Unchecked
}

fn bool_pattern(pat: &Pat) -> Option<bool> {
    match pat {
        Pat::Lit(pat_lit) => match &pat_lit.lit {
            Lit::Bool(lit) => Some(lit.value),
            _ => None,
        },
        _ => None,
    }
}
