use std::collections::VecDeque;

use super::error::{StateError, StateResult};
use super::{event::StateTransition, InteractionEvent, InteractionState};

/// Most recent transitions kept for diagnostics.
const HISTORY_LIMIT: usize = 32;

#[derive(Debug)]
pub struct StateMachine {
    state: InteractionState,
    transition_history: VecDeque<StateTransition>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: InteractionState::default(),
            transition_history: VecDeque::with_capacity(HISTORY_LIMIT),
        }
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn can_transition(&self, event: InteractionEvent) -> bool {
        self.next_state(event).is_some()
    }

    pub fn next_state(&self, event: InteractionEvent) -> Option<InteractionState> {
        use InteractionEvent::*;
        use InteractionState::*;
        match (self.state, event) {
            (_, Reset) => Some(Idle),
            (Idle, BeginDraw) => Some(Drawing),
            (Idle, BeginHandleDrag) => Some(DraggingHandle),
            (Idle, BeginShapeDrag) => Some(DraggingShape),
            (Idle, BeginTextEdit) => Some(EditingText),
            (Drawing | DraggingHandle | DraggingShape, Release) => Some(Idle),
            (EditingText, FinishTextEdit) => Some(Idle),
            _ => None,
        }
    }

    pub fn transition(&mut self, event: InteractionEvent) -> StateResult<InteractionState> {
        tracing::debug!(from = ?self.state, event = ?event, "request interaction transition");
        let next = self.next_state(event).ok_or_else(|| {
            let from = self.state;
            tracing::warn!(from = ?from, event = ?event, "invalid interaction transition requested");
            StateError::InvalidStateTransition { from, event }
        })?;

        let record = StateTransition::new(self.state, event, next);
        self.state = next;
        if self.transition_history.len() == HISTORY_LIMIT {
            self.transition_history.pop_front();
        }
        self.transition_history.push_back(record);

        Ok(self.state)
    }
}

#[cfg(test)]
impl StateMachine {
    fn history(&self) -> &VecDeque<StateTransition> {
        &self.transition_history
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InteractionState::{:?}", self.state)
    }
}
