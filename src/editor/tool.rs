use super::region::CutAxis;
use super::shapes::ShapeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolKind {
    /// Select, move and resize existing shapes.
    #[default]
    None,
    Arrow,
    Callout,
    CalloutNoArrow,
    BorderedRectangle,
    BlurRectangle,
    Highlighter,
    Selector,
    VerticalCut,
    HorizontalCut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolOptionVisibility {
    pub has_color: bool,
    pub has_stroke_width: bool,
    pub has_font: bool,
}

impl ToolKind {
    /// Shape a press on empty canvas starts drawing with this tool.
    pub const fn draws(self) -> Option<ShapeKind> {
        match self {
            Self::Arrow => Some(ShapeKind::Arrow),
            Self::Callout => Some(ShapeKind::Callout),
            Self::CalloutNoArrow => Some(ShapeKind::CalloutNoArrow),
            Self::BorderedRectangle => Some(ShapeKind::BorderedRectangle),
            Self::BlurRectangle => Some(ShapeKind::BlurRectangle),
            Self::Highlighter => Some(ShapeKind::Highlighter),
            Self::None | Self::Selector | Self::VerticalCut | Self::HorizontalCut => None,
        }
    }

    pub const fn cut_axis(self) -> Option<CutAxis> {
        match self {
            Self::VerticalCut => Some(CutAxis::Vertical),
            Self::HorizontalCut => Some(CutAxis::Horizontal),
            _ => None,
        }
    }

    pub const fn option_visibility(self) -> ToolOptionVisibility {
        match self {
            Self::Arrow | Self::BorderedRectangle => ToolOptionVisibility {
                has_color: true,
                has_stroke_width: true,
                has_font: false,
            },
            Self::Callout | Self::CalloutNoArrow => ToolOptionVisibility {
                has_color: true,
                has_stroke_width: false,
                has_font: true,
            },
            Self::Highlighter => ToolOptionVisibility {
                has_color: true,
                has_stroke_width: false,
                has_font: false,
            },
            Self::None
            | Self::BlurRectangle
            | Self::Selector
            | Self::VerticalCut
            | Self::HorizontalCut => ToolOptionVisibility {
                has_color: false,
                has_stroke_width: false,
                has_font: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_shape_tools_draw() {
        assert_eq!(ToolKind::Arrow.draws(), Some(ShapeKind::Arrow));
        assert_eq!(ToolKind::Selector.draws(), None);
        assert_eq!(ToolKind::VerticalCut.draws(), None);
        assert_eq!(ToolKind::VerticalCut.cut_axis(), Some(CutAxis::Vertical));
        assert_eq!(ToolKind::Highlighter.cut_axis(), None);
    }

    #[test]
    fn callout_tools_expose_font_options() {
        assert!(ToolKind::Callout.option_visibility().has_font);
        assert!(!ToolKind::Arrow.option_visibility().has_font);
        assert!(!ToolKind::BlurRectangle.option_visibility().has_color);
    }
}
