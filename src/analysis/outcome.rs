/// What a guard expression proves about the wrapper's state.
///
/// `Unchecked` is the identity element: combining two outcomes that disagree
/// collapses back to it unless a specific operator rule says otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Nothing proven.
    Unchecked,
    /// The guard proves the wrapper holds a value.
    CheckedSuccess,
    /// The guard proves the wrapper holds no value.
    CheckedFailure,
    /// Evaluating the guard reached the target access expression itself.
    /// Only meaningful inside nested condition evaluation, never as a final
    /// body-level state.
    AccessedValue,
}

impl CheckOutcome {
    /// `!is_success` reads as a failure check and vice versa. Anything that
    /// is not a flag proof inverts to nothing.
    pub fn inverted(self) -> CheckOutcome {
        match self {
            CheckOutcome::CheckedSuccess => CheckOutcome::CheckedFailure,
            CheckOutcome::CheckedFailure => CheckOutcome::CheckedSuccess,
            _ => CheckOutcome::Unchecked,
        }
    }

    pub fn is_flag_proof(self) -> bool {
        matches!(
            self,
            CheckOutcome::CheckedSuccess | CheckOutcome::CheckedFailure
        )
    }
}
