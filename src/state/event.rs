use super::model::InteractionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionEvent {
    BeginDraw,
    BeginHandleDrag,
    BeginShapeDrag,
    BeginTextEdit,
    Release,
    FinishTextEdit,
    /// Abandons whatever is in progress, e.g. when the base image is replaced.
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: InteractionState,
    pub event: InteractionEvent,
    pub to: InteractionState,
}

impl StateTransition {
    pub const fn new(
        from: InteractionState,
        event: InteractionEvent,
        to: InteractionState,
    ) -> Self {
        Self { from, event, to }
    }
}
