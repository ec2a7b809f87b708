/// Phase of the canvas pointer/keyboard interaction. Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Drawing,
    DraggingHandle,
    DraggingShape,
    EditingText,
}
