//! Order lifecycle state machine.
//!
//! The single-step flow models exactly one transition: `place`, from
//! `Draft` to the terminal `Placed`. Transitions are applied through the
//! pure [`apply`] function; the order row itself is only mutated by the
//! payment completer after a successful application.

use crate::entities::OrderState;
use serde::{Deserialize, Serialize};

/// Named transitions defined for the order workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Place,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Place => "place",
        }
    }
}

/// Attempting a transition the workflow does not define for the current
/// state. A configuration invariant violation, not a recoverable runtime
/// condition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("workflow does not allow transition '{}' from state '{from:?}'", transition.as_str())]
pub struct WorkflowViolation {
    pub from: OrderState,
    pub transition: Transition,
}

/// Transitions allowed from a given state.
pub fn allowed_transitions(state: OrderState) -> &'static [Transition] {
    match state {
        OrderState::Draft => &[Transition::Place],
        // Placed is terminal.
        OrderState::Placed => &[],
    }
}

/// Applies `transition` to `state`, returning the new state or a
/// violation. Never touches storage.
pub fn apply(state: OrderState, transition: Transition) -> Result<OrderState, WorkflowViolation> {
    match (state, transition) {
        (OrderState::Draft, Transition::Place) => Ok(OrderState::Placed),
        (from, transition) => Err(WorkflowViolation { from, transition }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_from_draft_succeeds() {
        assert_eq!(
            apply(OrderState::Draft, Transition::Place),
            Ok(OrderState::Placed)
        );
    }

    #[test]
    fn place_from_placed_is_a_violation() {
        let err = apply(OrderState::Placed, Transition::Place).unwrap_err();
        assert_eq!(err.from, OrderState::Placed);
        assert_eq!(err.transition, Transition::Place);
    }

    #[test]
    fn placed_is_terminal() {
        assert!(allowed_transitions(OrderState::Placed).is_empty());
        assert_eq!(
            allowed_transitions(OrderState::Draft),
            &[Transition::Place]
        );
    }
}
