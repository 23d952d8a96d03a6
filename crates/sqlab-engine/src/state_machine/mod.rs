//! Engine lifecycle transitions

use crate::error::EngineError;
use crate::types::EngineState;

/// Validates a lifecycle transition.
///
/// Illegal transitions return an error so callers can report them as
/// `Unavailable`. With the `strict-debug` feature they panic instead.
///
/// # Errors
/// `EngineError::IllegalTransition` if `to` is not reachable from `from`.
pub fn validate_transition(from: EngineState, to: EngineState) -> Result<(), EngineError> {
    if allowed(from, to) {
        Ok(())
    } else {
        #[cfg(feature = "strict-debug")]
        panic!("Illegal engine transition attempted: {from:?} -> {to:?}");

        #[allow(unreachable_code)]
        Err(EngineError::IllegalTransition { from, to })
    }
}

/// States reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: EngineState) -> Vec<EngineState> {
    use EngineState::*;
    match from {
        Uninitialized => vec![Loading, Closed],
        Loading => vec![Ready, Closed],
        Ready => vec![Executing, Closed],
        Executing => vec![Ready, Closed],
        Closed => vec![],
    }
}

fn allowed(from: EngineState, to: EngineState) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}
