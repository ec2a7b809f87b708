#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutKey {
    Character(char),
    Enter,
    Escape,
    Delete,
    Backspace,
    Tab,
    /// A bare Ctrl, Alt or Shift press.
    Modifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShortcutModifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl ShortcutModifiers {
    pub const fn new(ctrl: bool, shift: bool) -> Self {
        Self {
            ctrl,
            shift,
            alt: false,
        }
    }

    pub const fn with_alt(mut self, alt: bool) -> Self {
        self.alt = alt;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputContext {
    pub text_editing: bool,
    /// Selector tool is active and a selector rectangle exists.
    pub selector_active: bool,
    pub shape_selected: bool,
    pub callout_selected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    TextCommit,
    TextCancel,
    SelectAll,
    DeleteSelection,
    WhiteoutSelector,
    CopySelectorImage,
    CopyShape,
    PasteShape,
    BeginTextEdit { seed: char },
}

fn resolve_text_shortcut(key: ShortcutKey, modifiers: ShortcutModifiers) -> Option<ShortcutAction> {
    match (key, modifiers.ctrl) {
        (ShortcutKey::Enter, true) => Some(ShortcutAction::TextCommit),
        (ShortcutKey::Escape, _) => Some(ShortcutAction::TextCancel),
        _ => None,
    }
}

fn resolve_editor_shortcut(
    key: ShortcutKey,
    modifiers: ShortcutModifiers,
    context: InputContext,
) -> Option<ShortcutAction> {
    match (key, modifiers.ctrl) {
        (ShortcutKey::Character('a' | 'A'), true) => Some(ShortcutAction::SelectAll),
        (ShortcutKey::Character('c' | 'C'), true) => Some(if context.selector_active {
            ShortcutAction::CopySelectorImage
        } else {
            ShortcutAction::CopyShape
        }),
        (ShortcutKey::Character('v' | 'V'), true) => Some(ShortcutAction::PasteShape),
        (ShortcutKey::Delete, false) => Some(if context.selector_active && !context.shape_selected {
            ShortcutAction::WhiteoutSelector
        } else {
            ShortcutAction::DeleteSelection
        }),
        (ShortcutKey::Character(seed), false)
            if context.callout_selected && !modifiers.alt && !seed.is_control() =>
        {
            Some(ShortcutAction::BeginTextEdit { seed })
        }
        _ => None,
    }
}

pub fn resolve_shortcut(
    key: ShortcutKey,
    modifiers: ShortcutModifiers,
    context: InputContext,
) -> Option<ShortcutAction> {
    if context.text_editing {
        return resolve_text_shortcut(key, modifiers);
    }

    resolve_editor_shortcut(key, modifiers, context)
}
