//! Interactive annotation surface: owns the base image, the shape list and the interaction state.

use image::RgbaImage;

use super::handles::Corner;
use super::overlay::{render_cut_preview, SelectorRectangle, TrimRectangle};
use super::region::{self, CutAxis, StripCut};
use super::shapes::{
    Annotation, ArrowShape, BlurRectangleShape, BorderedRectangleShape, CalloutNoArrowShape,
    CalloutShape, CornerResize, FontSpec, HandleKind, HighlighterShape, Shape, ShapeKind,
    StrokeStyle,
};
use super::tool::ToolKind;
use super::{EditError, EditResult};
use crate::capture::{CaptureProvider, CaptureResult};
use crate::clipboard::{self, ClipboardBackend};
use crate::config::AppConfig;
use crate::geometry::{Point, Rect, Vector};
use crate::input::{resolve_shortcut, InputContext, ShortcutAction, ShortcutKey, ShortcutModifiers};
use crate::render::{self, Composite, FontBook, RenderResult, Surface};
use crate::state::{InteractionEvent, InteractionState, StateMachine};
use crate::storage::{ProjectRecord, ShapeRecord};

/// Offset applied to a pasted shape so it does not cover its source.
pub const PASTE_OFFSET: Vector = Vector::new(20.0, 20.0);

/// Styles and effect parameters given to newly drawn shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorDefaults {
    pub stroke: StrokeStyle,
    pub highlighter: StrokeStyle,
    pub font: FontSpec,
    pub blur_radius: u32,
}

impl From<&AppConfig> for EditorDefaults {
    fn from(config: &AppConfig) -> Self {
        Self {
            stroke: config.stroke_style(),
            highlighter: config.highlighter_style(),
            font: config.font(),
            blur_radius: config.blur_radius,
        }
    }
}

impl Default for EditorDefaults {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// What the host should do with the transient text-input surface.
#[derive(Debug, Clone, PartialEq)]
pub enum TextEditorRequest {
    /// Show an editor over `frame`, seeded with `text`.
    Open {
        frame: Rect,
        text: String,
        font: FontSpec,
    },
    /// Read the editor contents and pass them to [`Canvas::commit_text`].
    Commit,
    Close,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CanvasResponse {
    pub repaint: bool,
    pub text_editor: Option<TextEditorRequest>,
}

impl CanvasResponse {
    pub const NONE: Self = Self {
        repaint: false,
        text_editor: None,
    };

    pub const fn repaint() -> Self {
        Self {
            repaint: true,
            text_editor: None,
        }
    }

    fn with_text_editor(request: TextEditorRequest) -> Self {
        Self {
            repaint: true,
            text_editor: Some(request),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Draft {
    Shape(Annotation),
    Selector,
    Cut(CutAxis),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragTarget {
    Shape { id: u64, handle: HandleKind },
    Selector(Corner),
    Trim(Corner),
}

/// Payload of the current interaction phase.
#[derive(Debug, Clone, PartialEq)]
enum Interaction {
    Idle,
    Drawing {
        anchor: Point,
        current: Point,
        draft: Draft,
    },
    DraggingHandle {
        target: DragTarget,
    },
    DraggingShape {
        id: u64,
        last: Point,
    },
    EditingText {
        id: u64,
    },
}

pub struct Canvas {
    image: RgbaImage,
    shapes: Vec<Annotation>,
    next_id: u64,
    selected: Option<u64>,
    tool: ToolKind,
    selector: Option<SelectorRectangle>,
    trim: Option<TrimRectangle>,
    interaction: Interaction,
    machine: StateMachine,
    defaults: EditorDefaults,
    fonts: Option<FontBook>,
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("image", &self.image.dimensions())
            .field("shapes", &self.shapes.len())
            .field("selected", &self.selected)
            .field("tool", &self.tool)
            .field("state", &self.machine.state())
            .finish_non_exhaustive()
    }
}

impl Canvas {
    pub fn new(image: RgbaImage) -> Self {
        Self::with_defaults(image, EditorDefaults::default())
    }

    pub fn with_defaults(image: RgbaImage, defaults: EditorDefaults) -> Self {
        Self {
            image,
            shapes: Vec::new(),
            next_id: 1,
            selected: None,
            tool: ToolKind::None,
            selector: None,
            trim: None,
            interaction: Interaction::Idle,
            machine: StateMachine::new(),
            defaults,
            fonts: None,
        }
    }

    pub fn with_fonts(mut self, fonts: Option<FontBook>) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Committed shapes in paint order.
    pub fn shapes(&self) -> &[Annotation] {
        &self.shapes
    }

    pub fn shape(&self, id: u64) -> Option<&Annotation> {
        self.shapes.iter().find(|shape| shape.id() == id)
    }

    fn shape_mut(&mut self, id: u64) -> Option<&mut Annotation> {
        self.shapes.iter_mut().find(|shape| shape.id() == id)
    }

    pub fn selected(&self) -> Option<u64> {
        self.selected
    }

    pub fn selected_shape(&self) -> Option<&Annotation> {
        self.selected.and_then(|id| self.shape(id))
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn selector(&self) -> Option<&SelectorRectangle> {
        self.selector.as_ref()
    }

    pub fn trim(&self) -> Option<&TrimRectangle> {
        self.trim.as_ref()
    }

    pub fn defaults_mut(&mut self) -> &mut EditorDefaults {
        &mut self.defaults
    }

    pub fn interaction_state(&self) -> InteractionState {
        self.machine.state()
    }

    fn image_rect(&self) -> Rect {
        Rect::new(
            0.0,
            0.0,
            f64::from(self.image.width()),
            f64::from(self.image.height()),
        )
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Topmost shape under `point`; later shapes win.
    pub fn shape_at(&self, point: Point) -> Option<u64> {
        self.shapes
            .iter()
            .rev()
            .find(|shape| shape.hit_test(point))
            .map(Annotation::id)
    }

    fn begin(&mut self, event: InteractionEvent, interaction: Interaction) -> bool {
        match self.machine.transition(event) {
            Ok(_) => {
                self.interaction = interaction;
                true
            }
            Err(err) => {
                tracing::debug!(%err, "gesture not started");
                false
            }
        }
    }

    fn finish(&mut self, event: InteractionEvent) {
        if self.machine.transition(event).is_ok() {
            self.interaction = Interaction::Idle;
        }
    }

    /// Drops any in-progress gesture. Returns `true` when a text edit was abandoned.
    fn reset_interaction(&mut self) -> bool {
        let was_editing = matches!(self.interaction, Interaction::EditingText { .. });
        if self.machine.state() != InteractionState::Idle {
            self.finish(InteractionEvent::Reset);
        }
        self.interaction = Interaction::Idle;
        was_editing
    }

    pub fn select_tool(&mut self, tool: ToolKind) -> CanvasResponse {
        let abandoned_edit = self.reset_interaction();
        if self.tool == ToolKind::Selector && tool != ToolKind::Selector {
            self.selector = None;
        }
        self.selected = None;
        self.tool = tool;
        tracing::debug!(?tool, "tool selected");

        if abandoned_edit {
            CanvasResponse::with_text_editor(TextEditorRequest::Close)
        } else {
            CanvasResponse::repaint()
        }
    }

    pub fn pointer_pressed(&mut self, point: Point) -> CanvasResponse {
        if self.machine.state() != InteractionState::Idle {
            tracing::debug!(state = ?self.machine.state(), "press ignored while busy");
            return CanvasResponse::NONE;
        }

        if let Some(corner) = self.trim.and_then(|trim| trim.corner_at(point)) {
            return self.begin_handle_drag(DragTarget::Trim(corner));
        }

        if self.tool == ToolKind::None {
            return self.press_with_pointer_tool(point);
        }

        if self.tool == ToolKind::Selector {
            if let Some(corner) = self.selector.and_then(|selector| selector.corner_at(point)) {
                return self.begin_handle_drag(DragTarget::Selector(corner));
            }
        }

        if let Some(id) = self.shape_at(point) {
            self.tool = ToolKind::None;
            self.selector = None;
            return self.select_and_drag(id, point);
        }

        let draft = if let Some(kind) = self.tool.draws() {
            Draft::Shape(self.new_draft(kind, point))
        } else if let Some(axis) = self.tool.cut_axis() {
            Draft::Cut(axis)
        } else {
            Draft::Selector
        };
        let marquee = matches!(draft, Draft::Selector);
        let drawing = Interaction::Drawing {
            anchor: point,
            current: point,
            draft,
        };
        if !self.begin(InteractionEvent::BeginDraw, drawing) {
            return CanvasResponse::NONE;
        }
        if marquee {
            self.selector = Some(SelectorRectangle::new(Rect::new(point.x, point.y, 0.0, 0.0)));
        }
        CanvasResponse::repaint()
    }

    fn press_with_pointer_tool(&mut self, point: Point) -> CanvasResponse {
        if let Some(id) = self.selected {
            if let Some(handle) = self.shape(id).and_then(|shape| shape.handle_at(point)) {
                return self.begin_handle_drag(DragTarget::Shape { id, handle });
            }
        }

        match self.shape_at(point) {
            Some(id) => self.select_and_drag(id, point),
            None => {
                self.selected = None;
                CanvasResponse::repaint()
            }
        }
    }

    fn begin_handle_drag(&mut self, target: DragTarget) -> CanvasResponse {
        if !self.begin(
            InteractionEvent::BeginHandleDrag,
            Interaction::DraggingHandle { target },
        ) {
            return CanvasResponse::NONE;
        }
        CanvasResponse::repaint()
    }

    fn select_and_drag(&mut self, id: u64, point: Point) -> CanvasResponse {
        self.selected = Some(id);
        if !self.begin(
            InteractionEvent::BeginShapeDrag,
            Interaction::DraggingShape { id, last: point },
        ) {
            return CanvasResponse::NONE;
        }
        CanvasResponse::repaint()
    }

    fn new_draft(&self, kind: ShapeKind, point: Point) -> Annotation {
        let stroke = self.defaults.stroke;
        let empty = Rect::new(point.x, point.y, 0.0, 0.0);
        match kind {
            ShapeKind::Arrow => Annotation::Arrow(ArrowShape::new(0, point, point, stroke)),
            ShapeKind::Callout => {
                let mut callout = CalloutShape::new(0, empty, point, stroke);
                callout.body.font = self.defaults.font.clone();
                callout.stretch_to(point, point);
                Annotation::Callout(callout)
            }
            ShapeKind::CalloutNoArrow => {
                let mut callout = CalloutNoArrowShape::new(0, empty, stroke);
                callout.body.font = self.defaults.font.clone();
                Annotation::CalloutNoArrow(callout)
            }
            ShapeKind::BorderedRectangle => {
                Annotation::BorderedRectangle(BorderedRectangleShape::new(0, empty, stroke))
            }
            ShapeKind::BlurRectangle => {
                Annotation::BlurRectangle(BlurRectangleShape::new(0, empty, stroke))
            }
            ShapeKind::Highlighter => Annotation::Highlighter(HighlighterShape::new(
                0,
                point,
                point,
                self.defaults.highlighter,
            )),
        }
    }

    pub fn pointer_moved(&mut self, point: Point) -> CanvasResponse {
        match &mut self.interaction {
            Interaction::Idle | Interaction::EditingText { .. } => return CanvasResponse::NONE,
            Interaction::Drawing {
                anchor,
                current,
                draft,
            } => {
                *current = point;
                match draft {
                    Draft::Shape(shape) => stretch_draft(shape, *anchor, point),
                    Draft::Selector => {
                        self.selector =
                            Some(SelectorRectangle::new(Rect::from_points(*anchor, point)));
                    }
                    Draft::Cut(_) => {}
                }
            }
            Interaction::DraggingShape { id, last } => {
                let offset = last.vector_to(point);
                *last = point;
                let id = *id;
                if let Some(shape) = self.shape_mut(id) {
                    shape.move_by(offset);
                }
                self.refresh_blur(id);
            }
            Interaction::DraggingHandle { target } => {
                let target = *target;
                self.drag_handle(target, point);
            }
        }
        CanvasResponse::repaint()
    }

    fn drag_handle(&mut self, target: DragTarget, point: Point) {
        match target {
            DragTarget::Selector(corner) => {
                if let Some(selector) = self.selector.as_mut() {
                    selector.resize_from_corner(corner, point);
                }
            }
            DragTarget::Trim(corner) => {
                if let Some(trim) = self.trim.as_mut() {
                    trim.resize_from_corner(corner, point);
                }
            }
            DragTarget::Shape { id, handle } => {
                let Some(shape) = self.shape_mut(id) else {
                    return;
                };
                match handle {
                    HandleKind::ArrowEndpoint(endpoint) => {
                        if let Some(arrow) = shape.as_arrow_mut() {
                            arrow.move_endpoint(endpoint, point);
                        }
                    }
                    HandleKind::Beak => {
                        if let Some(callout) = shape.as_callout_mut() {
                            callout.move_beak(point);
                        }
                    }
                    HandleKind::Corner(corner) => {
                        if let Some(resizable) = shape.as_resizable_mut() {
                            resizable.resize_from_corner(corner, point);
                        }
                    }
                }
                self.refresh_blur(id);
            }
        }
    }

    pub fn pointer_released(&mut self, point: Point) -> CanvasResponse {
        let interaction = std::mem::replace(&mut self.interaction, Interaction::Idle);
        match interaction {
            Interaction::Idle => return CanvasResponse::NONE,
            Interaction::EditingText { .. } => {
                self.interaction = interaction;
                return CanvasResponse::NONE;
            }
            Interaction::Drawing {
                anchor,
                draft: Draft::Shape(shape),
                ..
            } => {
                let mut shape = shape;
                stretch_draft(&mut shape, anchor, point);
                self.commit_draft(shape);
            }
            Interaction::Drawing {
                anchor,
                draft: Draft::Cut(axis),
                ..
            } => {
                let (start, end) = match axis {
                    CutAxis::Vertical => (anchor.x, point.x),
                    CutAxis::Horizontal => (anchor.y, point.y),
                };
                if let Err(err) = self.cut_strip(axis, start, end) {
                    tracing::debug!(%err, ?axis, "cut gesture ended without a cut");
                }
            }
            Interaction::Drawing {
                draft: Draft::Selector,
                ..
            }
            | Interaction::DraggingHandle { .. }
            | Interaction::DraggingShape { .. } => {}
        }
        self.finish(InteractionEvent::Release);
        CanvasResponse::repaint()
    }

    fn commit_draft(&mut self, mut shape: Annotation) {
        if !shape.meets_commit_threshold() {
            tracing::debug!(kind = ?shape.kind(), "draft below size threshold; discarded");
            return;
        }
        let id = self.allocate_id();
        shape.set_id(id);
        tracing::debug!(id, kind = ?shape.kind(), "shape committed");
        self.shapes.push(shape);
        self.refresh_blur(id);
    }

    pub fn double_clicked(&mut self, point: Point) -> CanvasResponse {
        let Some(id) = self.selected else {
            return CanvasResponse::NONE;
        };
        let hit = self
            .shape(id)
            .is_some_and(|shape| shape.text_body().is_some() && shape.hit_test(point));
        if !hit {
            return CanvasResponse::NONE;
        }
        self.open_text_editor(id, None)
    }

    fn open_text_editor(&mut self, id: u64, seed: Option<char>) -> CanvasResponse {
        let Some(shape) = self.shape(id) else {
            return CanvasResponse::NONE;
        };
        let Some(body) = shape.text_body() else {
            return CanvasResponse::NONE;
        };
        let frame = shape
            .as_resizable()
            .map_or_else(|| shape.bounds(), |resizable| resizable.frame());
        let mut text = body.text.clone();
        if let Some(seed) = seed {
            text.push(seed);
        }
        let font = body.font.clone();

        if !self.begin(InteractionEvent::BeginTextEdit, Interaction::EditingText { id }) {
            return CanvasResponse::NONE;
        }
        CanvasResponse::with_text_editor(TextEditorRequest::Open { frame, text, font })
    }

    /// Stores the edited text on the shape being edited and closes the editor.
    pub fn commit_text(&mut self, text: &str) -> CanvasResponse {
        let Interaction::EditingText { id } = self.interaction else {
            return CanvasResponse::NONE;
        };
        if let Some(body) = self.shape_mut(id).and_then(Annotation::text_body_mut) {
            body.text = text.to_string();
        }
        self.finish(InteractionEvent::FinishTextEdit);
        CanvasResponse::with_text_editor(TextEditorRequest::Close)
    }

    pub fn cancel_text(&mut self) -> CanvasResponse {
        if !matches!(self.interaction, Interaction::EditingText { .. }) {
            return CanvasResponse::NONE;
        }
        self.finish(InteractionEvent::FinishTextEdit);
        CanvasResponse::with_text_editor(TextEditorRequest::Close)
    }

    fn input_context(&self) -> InputContext {
        let selected = self.selected_shape();
        InputContext {
            text_editing: self.machine.state() == InteractionState::EditingText,
            selector_active: self.tool == ToolKind::Selector && self.selector.is_some(),
            shape_selected: selected.is_some(),
            callout_selected: selected.is_some_and(|shape| shape.text_body().is_some()),
        }
    }

    pub fn key_pressed<B: ClipboardBackend + ?Sized>(
        &mut self,
        key: ShortcutKey,
        modifiers: ShortcutModifiers,
        clipboard: &B,
    ) -> EditResult<CanvasResponse> {
        let Some(action) = resolve_shortcut(key, modifiers, self.input_context()) else {
            return Ok(CanvasResponse::NONE);
        };
        tracing::debug!(?action, "shortcut resolved");

        let response = match action {
            ShortcutAction::TextCommit => {
                CanvasResponse::with_text_editor(TextEditorRequest::Commit)
            }
            ShortcutAction::TextCancel => self.cancel_text(),
            ShortcutAction::SelectAll => {
                self.select_all();
                CanvasResponse::repaint()
            }
            ShortcutAction::DeleteSelection => {
                if self.delete_selected() {
                    CanvasResponse::repaint()
                } else {
                    CanvasResponse::NONE
                }
            }
            ShortcutAction::WhiteoutSelector => {
                self.whiteout_selector()?;
                CanvasResponse::repaint()
            }
            ShortcutAction::CopySelectorImage => {
                self.copy_selector_image(clipboard)?;
                CanvasResponse::NONE
            }
            ShortcutAction::CopyShape => {
                self.copy_selected_shape(clipboard)?;
                CanvasResponse::NONE
            }
            ShortcutAction::PasteShape => {
                if self.paste(clipboard)? {
                    CanvasResponse::repaint()
                } else {
                    CanvasResponse::NONE
                }
            }
            ShortcutAction::BeginTextEdit { seed } => match self.selected {
                Some(id) => self.open_text_editor(id, Some(seed)),
                None => CanvasResponse::NONE,
            },
        };
        Ok(response)
    }

    /// Switches to the selector tool with a selector covering the whole image.
    pub fn select_all(&mut self) {
        if self.tool != ToolKind::Selector {
            self.select_tool(ToolKind::Selector);
        }
        self.selector = Some(SelectorRectangle::new(self.image_rect()));
    }

    pub fn delete_selected(&mut self) -> bool {
        let Some(id) = self.selected.take() else {
            return false;
        };
        let before = self.shapes.len();
        self.shapes.retain(|shape| shape.id() != id);
        tracing::debug!(id, "shape deleted");
        self.shapes.len() != before
    }

    /// Paints the selector area of the base image white and clears the selector.
    pub fn whiteout_selector(&mut self) -> EditResult<()> {
        let selector = self.selector.ok_or(EditError::NoSelector)?;
        region::whiteout(&mut self.image, selector.rect)
            .inspect_err(|err| tracing::warn!(?err, "whiteout abandoned"))?;
        self.selector = None;
        self.refresh_all_blurs();
        Ok(())
    }

    /// Removes the strip between `start` and `end` (clamped to the image) and remaps every shape.
    ///
    /// Returns `false` when the strip is too thin to count as a cut.
    pub fn cut_strip(&mut self, axis: CutAxis, start: f64, end: f64) -> EditResult<bool> {
        let extent = match axis {
            CutAxis::Vertical => f64::from(self.image.width()),
            CutAxis::Horizontal => f64::from(self.image.height()),
        };
        let Some(cut) = StripCut::between(axis, start.clamp(0.0, extent), end.clamp(0.0, extent))
        else {
            tracing::debug!(?axis, start, end, "strip too thin; ignored");
            return Ok(false);
        };

        let image = region::remove_strip(&self.image, &cut)
            .inspect_err(|err| tracing::warn!(?err, ?cut, "strip removal abandoned"))?;

        let remap = |point: Point| cut.remap_point(point);
        for shape in &mut self.shapes {
            shape.remap_points(&remap);
        }
        if let Some(selector) = self.selector.as_mut() {
            selector.remap(&cut);
        }
        if let Some(trim) = self.trim.as_mut() {
            trim.rect = cut.remap_rect(trim.rect);
        }
        self.replace_image(image);
        tracing::info!(?axis, at = cut.at, size = cut.size, "strip removed");
        Ok(true)
    }

    pub fn begin_trim(&mut self) -> EditResult<()> {
        let (width, height) = self.image.dimensions();
        let trim = TrimRectangle::covering(width, height)
            .ok_or(EditError::ImageTooSmall { width, height })?;
        self.trim = Some(trim);
        Ok(())
    }

    /// Crops the base image to the trim rectangle and shifts shapes to the new origin.
    pub fn apply_trim(&mut self) -> EditResult<()> {
        let trim = self.trim.ok_or(EditError::NoActiveTrim)?;
        let (cropped, kept) = region::crop(&self.image, trim.rect)
            .inspect_err(|err| tracing::warn!(?err, "trim abandoned"))?;

        let shift = Vector::new(-kept.x, -kept.y);
        for shape in &mut self.shapes {
            shape.move_by(shift);
        }
        if let Some(selector) = self.selector.as_mut() {
            selector.rect = selector.rect.translate(shift);
        }
        self.trim = None;
        self.replace_image(cropped);
        tracing::info!(?kept, "image trimmed");
        Ok(())
    }

    pub fn cancel_trim(&mut self) {
        self.trim = None;
    }

    pub fn copy_selected_shape<B: ClipboardBackend + ?Sized>(&self, clipboard: &B) -> EditResult<bool> {
        let Some(shape) = self.selected_shape() else {
            return Ok(false);
        };
        clipboard::copy_shape(clipboard, ShapeRecord::from(shape))
            .inspect_err(|err| tracing::warn!(?err, "shape copy failed"))?;
        Ok(true)
    }

    /// Copies the flattened composite cropped to the selector.
    pub fn copy_selector_image<B: ClipboardBackend + ?Sized>(&self, clipboard: &B) -> EditResult<()> {
        let selector = self.selector.ok_or(EditError::NoSelector)?;
        let image = self.render_region(selector.rect)?;
        clipboard::copy_image(clipboard, &image)
            .inspect_err(|err| tracing::warn!(?err, "selector copy failed"))?;
        Ok(())
    }

    pub fn copy_image<B: ClipboardBackend + ?Sized>(&self, clipboard: &B) -> EditResult<()> {
        let composite = self.render()?;
        clipboard::copy_image(clipboard, &composite.image)
            .inspect_err(|err| tracing::warn!(?err, "image copy failed"))?;
        Ok(())
    }

    /// Appends the clipboard shape, offset by [`PASTE_OFFSET`], and selects it.
    pub fn paste<B: ClipboardBackend + ?Sized>(&mut self, clipboard: &B) -> EditResult<bool> {
        let Some(record) = clipboard::paste_shape(clipboard)
            .inspect_err(|err| tracing::warn!(?err, "paste failed"))?
        else {
            return Ok(false);
        };
        let id = self.allocate_id();
        let mut shape = record.to_annotation(id);
        shape.move_by(PASTE_OFFSET);
        self.shapes.push(shape);
        self.selected = Some(id);
        self.refresh_blur(id);
        tracing::debug!(id, "shape pasted");
        Ok(true)
    }

    /// Replaces the base image with a fresh capture and clears all editing state.
    pub fn load_capture<P: CaptureProvider + ?Sized>(&mut self, provider: &P) -> CaptureResult<()> {
        let image = provider
            .capture()
            .inspect_err(|err| tracing::warn!(?err, "capture failed"))?;
        self.reset_interaction();
        self.shapes.clear();
        self.selected = None;
        self.selector = None;
        self.trim = None;
        self.image = image;
        tracing::info!(width = self.image.width(), height = self.image.height(), "capture loaded");
        Ok(())
    }

    /// Canvas holding the project's base image and shapes.
    pub fn from_project(record: &ProjectRecord, defaults: EditorDefaults) -> EditResult<Self> {
        let mut canvas = Self::with_defaults(record.base_image()?, defaults);
        for shape in &record.shapes {
            let id = canvas.allocate_id();
            canvas.shapes.push(shape.to_annotation(id));
        }
        canvas.refresh_all_blurs();
        Ok(canvas)
    }

    pub fn to_project(&self) -> EditResult<ProjectRecord> {
        let preview = self.render()?;
        Ok(ProjectRecord::new(&self.image, &self.shapes, &preview.image)?)
    }

    fn replace_image(&mut self, image: RgbaImage) {
        self.image = image;
        self.refresh_all_blurs();
    }

    fn refresh_blur(&mut self, id: u64) {
        let radius = self.defaults.blur_radius;
        let Some(blur) = self
            .shapes
            .iter_mut()
            .find(|shape| shape.id() == id)
            .and_then(Annotation::as_blur_mut)
        else {
            return;
        };
        if let Err(err) = blur.refresh(&self.image, radius) {
            tracing::warn!(?err, id, "blur regeneration failed; showing fallback");
        }
    }

    fn refresh_all_blurs(&mut self) {
        let radius = self.defaults.blur_radius;
        for blur in self.shapes.iter_mut().filter_map(Annotation::as_blur_mut) {
            if let Err(err) = blur.refresh(&self.image, radius) {
                tracing::warn!(?err, id = blur.id, "blur regeneration failed; showing fallback");
            }
        }
    }

    /// Flattened export of the base image and shapes.
    pub fn render(&self) -> RenderResult<Composite> {
        render::render(&self.image, &self.shapes, self.fonts.as_ref())
    }

    pub fn render_region(&self, rect: Rect) -> RenderResult<RgbaImage> {
        render::render_region(&self.image, &self.shapes, self.fonts.as_ref(), rect)
    }

    /// On-screen view: selection decoration, the draft and every overlay, clipped to the image.
    pub fn render_view(&self) -> RenderResult<RgbaImage> {
        let mut surface = Surface::new(self.image.width(), self.image.height())?
            .with_fonts(self.fonts.clone());
        surface.draw_image(&self.image, Point::new(0.0, 0.0))?;
        for shape in &self.shapes {
            shape.render(&mut surface, self.selected == Some(shape.id()))?;
        }

        if let Interaction::Drawing {
            anchor,
            current,
            draft,
        } = &self.interaction
        {
            match draft {
                Draft::Shape(shape) => shape.render(&mut surface, false)?,
                Draft::Cut(axis) => {
                    render_cut_preview(&mut surface, self.cut_band(*axis, *anchor, *current));
                }
                Draft::Selector => {}
            }
        }
        if let Some(selector) = &self.selector {
            selector.render(&mut surface);
        }
        if let Some(trim) = &self.trim {
            trim.render(&mut surface, self.image_rect());
        }
        surface.into_image()
    }

    fn cut_band(&self, axis: CutAxis, anchor: Point, current: Point) -> Rect {
        let image = self.image_rect();
        match axis {
            CutAxis::Vertical => {
                let (a, b) = (
                    anchor.x.clamp(0.0, image.width),
                    current.x.clamp(0.0, image.width),
                );
                Rect::from_ltrb(a.min(b), 0.0, a.max(b), image.height)
            }
            CutAxis::Horizontal => {
                let (a, b) = (
                    anchor.y.clamp(0.0, image.height),
                    current.y.clamp(0.0, image.height),
                );
                Rect::from_ltrb(0.0, a.min(b), image.width, a.max(b))
            }
        }
    }
}

/// Updates a draft's geometry while its creation drag is in progress.
fn stretch_draft(shape: &mut Annotation, anchor: Point, point: Point) {
    match shape {
        Annotation::Arrow(arrow) => arrow.end = point,
        Annotation::Highlighter(highlighter) => highlighter.end = point,
        Annotation::Callout(callout) => callout.stretch_to(anchor, point),
        Annotation::CalloutNoArrow(_)
        | Annotation::BorderedRectangle(_)
        | Annotation::BlurRectangle(_) => {
            if let Some(resizable) = shape.as_resizable_mut() {
                resizable.set_frame(Rect::from_points(anchor, point));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureError;
    use crate::clipboard::MemoryClipboard;
    use crate::geometry::Color;
    use image::Rgba;

    fn canvas(width: u32, height: u32) -> Canvas {
        Canvas::new(RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])))
    }

    fn drag(canvas: &mut Canvas, from: Point, to: Point) {
        canvas.pointer_pressed(from);
        canvas.pointer_moved(to);
        canvas.pointer_released(to);
    }

    fn draw(canvas: &mut Canvas, tool: ToolKind, from: Point, to: Point) -> Option<u64> {
        canvas.select_tool(tool);
        let before = canvas.shapes().len();
        drag(canvas, from, to);
        (canvas.shapes().len() > before).then(|| canvas.shapes()[before].id())
    }

    #[test]
    fn drawing_commits_only_past_threshold() {
        let mut canvas = canvas(400, 300);
        assert!(draw(&mut canvas, ToolKind::Arrow, Point::new(10.0, 10.0), Point::new(13.0, 13.0)).is_none());
        assert!(draw(
            &mut canvas,
            ToolKind::BorderedRectangle,
            Point::new(10.0, 10.0),
            Point::new(200.0, 18.0)
        )
        .is_none());
        assert!(draw(
            &mut canvas,
            ToolKind::Highlighter,
            Point::new(10.0, 10.0),
            Point::new(17.0, 17.0)
        )
        .is_some());
        assert_eq!(canvas.interaction_state(), InteractionState::Idle);
    }

    #[test]
    fn drawn_callout_starts_with_beak_below_body() {
        let mut canvas = canvas(400, 300);
        let id = draw(&mut canvas, ToolKind::Callout, Point::new(50.0, 50.0), Point::new(250.0, 150.0))
            .expect("callout committed");
        let Some(Annotation::Callout(callout)) = canvas.shape(id) else {
            panic!("expected callout");
        };
        assert_eq!(callout.rect, Rect::from_ltrb(50.0, 50.0, 250.0, 150.0));
        assert_eq!(callout.beak, Point::new(150.0, 180.0));
    }

    #[test]
    fn selecting_another_shape_replaces_selection() {
        let mut canvas = canvas(400, 300);
        let first = draw(&mut canvas, ToolKind::BlurRectangle, Point::new(10.0, 10.0), Point::new(60.0, 60.0))
            .expect("first");
        let second = draw(
            &mut canvas,
            ToolKind::BlurRectangle,
            Point::new(100.0, 100.0),
            Point::new(160.0, 160.0),
        )
        .expect("second");
        canvas.select_tool(ToolKind::None);

        drag(&mut canvas, Point::new(30.0, 30.0), Point::new(30.0, 30.0));
        assert_eq!(canvas.selected(), Some(first));
        drag(&mut canvas, Point::new(130.0, 130.0), Point::new(130.0, 130.0));
        assert_eq!(canvas.selected(), Some(second));

        drag(&mut canvas, Point::new(300.0, 20.0), Point::new(300.0, 20.0));
        assert_eq!(canvas.selected(), None);
    }

    #[test]
    fn topmost_shape_wins_hit_test() {
        let mut canvas = canvas(400, 300);
        let _lower = draw(&mut canvas, ToolKind::BlurRectangle, Point::new(10.0, 10.0), Point::new(100.0, 100.0));
        let upper = draw(&mut canvas, ToolKind::BlurRectangle, Point::new(150.0, 150.0), Point::new(50.0, 50.0))
            .expect("upper");
        assert_eq!(canvas.shape_at(Point::new(75.0, 75.0)), Some(upper));
    }

    #[test]
    fn press_on_shape_with_drawing_tool_selects_instead_of_drawing() {
        let mut canvas = canvas(400, 300);
        let id = draw(&mut canvas, ToolKind::BlurRectangle, Point::new(10.0, 10.0), Point::new(100.0, 100.0))
            .expect("blur");
        canvas.select_tool(ToolKind::Arrow);

        canvas.pointer_pressed(Point::new(50.0, 50.0));
        assert_eq!(canvas.tool(), ToolKind::None);
        assert_eq!(canvas.selected(), Some(id));
        assert_eq!(canvas.interaction_state(), InteractionState::DraggingShape);

        canvas.pointer_moved(Point::new(60.0, 55.0));
        canvas.pointer_released(Point::new(60.0, 55.0));
        assert_eq!(canvas.shapes().len(), 1);
        assert_eq!(
            canvas.shape(id).map(Shape::bounds),
            Some(Rect::from_ltrb(20.0, 15.0, 110.0, 105.0))
        );
    }

    #[test]
    fn selected_handle_takes_priority_over_other_shapes() {
        let mut canvas = canvas(400, 300);
        let arrow = draw(&mut canvas, ToolKind::Arrow, Point::new(10.0, 10.0), Point::new(200.0, 10.0))
            .expect("arrow");
        let _cover = draw(
            &mut canvas,
            ToolKind::BlurRectangle,
            Point::new(260.0, 60.0),
            Point::new(180.0, 0.0),
        );
        canvas.select_tool(ToolKind::None);
        drag(&mut canvas, Point::new(100.0, 12.0), Point::new(100.0, 12.0));
        assert_eq!(canvas.selected(), Some(arrow));

        canvas.pointer_pressed(Point::new(201.0, 11.0));
        assert_eq!(canvas.interaction_state(), InteractionState::DraggingHandle);
        canvas.pointer_moved(Point::new(220.0, 80.0));
        canvas.pointer_released(Point::new(220.0, 80.0));

        let Some(Annotation::Arrow(moved)) = canvas.shape(arrow) else {
            panic!("expected arrow");
        };
        assert_eq!(moved.start, Point::new(10.0, 10.0));
        assert_eq!(moved.end, Point::new(220.0, 80.0));
    }

    #[test]
    fn tool_change_clears_selection_and_selector() {
        let mut canvas = canvas(400, 300);
        canvas.select_all();
        assert_eq!(canvas.tool(), ToolKind::Selector);
        assert_eq!(
            canvas.selector().map(|selector| selector.rect),
            Some(Rect::new(0.0, 0.0, 400.0, 300.0))
        );

        canvas.select_tool(ToolKind::Arrow);
        assert!(canvas.selector().is_none());
    }

    #[test]
    fn vertical_cut_remaps_shapes_and_shrinks_image() {
        let mut canvas = canvas(1000, 100);
        let id = draw(&mut canvas, ToolKind::Arrow, Point::new(450.0, 20.0), Point::new(700.0, 20.0))
            .expect("arrow");

        assert!(canvas
            .cut_strip(CutAxis::Vertical, 400.0, 500.0)
            .expect("cut should succeed"));

        assert_eq!(canvas.image().dimensions(), (900, 100));
        let Some(Annotation::Arrow(arrow)) = canvas.shape(id) else {
            panic!("expected arrow");
        };
        assert_eq!(arrow.start, Point::new(400.0, 20.0));
        assert_eq!(arrow.end, Point::new(600.0, 20.0));
    }

    #[test]
    fn cut_tool_release_performs_clamped_cut() {
        let mut canvas = canvas(200, 100);
        canvas.select_tool(ToolKind::HorizontalCut);
        drag(&mut canvas, Point::new(50.0, 60.0), Point::new(50.0, 500.0));
        assert_eq!(canvas.image().dimensions(), (200, 60));
        assert_eq!(canvas.interaction_state(), InteractionState::Idle);
    }

    #[test]
    fn cut_gesture_over_whole_image_keeps_image_and_returns_to_idle() {
        let mut canvas = canvas(120, 80);
        canvas.select_tool(ToolKind::VerticalCut);
        let before = canvas.image().clone();
        drag(&mut canvas, Point::new(-10.0, 40.0), Point::new(300.0, 40.0));

        assert_eq!(canvas.image(), &before);
        assert_eq!(canvas.interaction_state(), InteractionState::Idle);

        drag(&mut canvas, Point::new(20.0, 40.0), Point::new(50.0, 40.0));
        assert_eq!(canvas.image().dimensions(), (90, 80));
    }

    #[test]
    fn identity_strip_is_a_no_op() {
        let mut canvas = canvas(200, 100);
        let before = canvas.image().clone();
        assert!(!canvas
            .cut_strip(CutAxis::Vertical, 80.0, 80.0)
            .expect("thin strip is not an error"));
        assert_eq!(canvas.image(), &before);
    }

    #[test]
    fn failed_cut_leaves_state_unchanged() {
        let mut canvas = canvas(100, 100);
        let id = draw(&mut canvas, ToolKind::Arrow, Point::new(10.0, 10.0), Point::new(90.0, 10.0))
            .expect("arrow");
        let shape_before = canvas.shape(id).cloned();

        let err = canvas
            .cut_strip(CutAxis::Vertical, -50.0, 500.0)
            .expect_err("removing the whole width fails");
        assert!(matches!(err, EditError::StripConsumesImage { .. }));
        assert_eq!(canvas.image().dimensions(), (100, 100));
        assert_eq!(canvas.shape(id).cloned(), shape_before);
    }

    #[test]
    fn whiteout_needs_selector_and_clears_it() {
        let mut canvas = canvas(50, 50);
        assert!(matches!(
            canvas.whiteout_selector().expect_err("no selector"),
            EditError::NoSelector
        ));

        canvas.select_tool(ToolKind::Selector);
        drag(&mut canvas, Point::new(10.0, 10.0), Point::new(20.0, 20.0));
        canvas.whiteout_selector().expect("whiteout");

        assert_eq!(canvas.image().get_pixel(15, 15), &Rgba([255, 255, 255, 255]));
        assert_eq!(canvas.image().get_pixel(25, 25), &Rgba([0, 0, 0, 255]));
        assert!(canvas.selector().is_none());
    }

    #[test]
    fn delete_key_prefers_selected_shape() {
        let mut canvas = canvas(200, 200);
        let clipboard = MemoryClipboard::new();
        let _ = draw(&mut canvas, ToolKind::BlurRectangle, Point::new(10.0, 10.0), Point::new(80.0, 80.0));
        canvas.select_tool(ToolKind::None);
        drag(&mut canvas, Point::new(40.0, 40.0), Point::new(40.0, 40.0));

        let response = canvas
            .key_pressed(ShortcutKey::Delete, ShortcutModifiers::default(), &clipboard)
            .expect("delete");
        assert!(response.repaint);
        assert!(canvas.shapes().is_empty());
        assert_eq!(canvas.selected(), None);
    }

    #[test]
    fn copy_then_paste_offsets_and_selects_new_shape() {
        let mut canvas = canvas(300, 300);
        let clipboard = MemoryClipboard::new();
        let ctrl = ShortcutModifiers::new(true, false);
        let id = draw(
            &mut canvas,
            ToolKind::BorderedRectangle,
            Point::new(10.0, 10.0),
            Point::new(110.0, 60.0),
        )
        .expect("rect");
        canvas.select_tool(ToolKind::None);
        drag(&mut canvas, Point::new(12.0, 30.0), Point::new(12.0, 30.0));
        assert_eq!(canvas.selected(), Some(id));

        canvas
            .key_pressed(ShortcutKey::Character('c'), ctrl, &clipboard)
            .expect("copy");
        canvas
            .key_pressed(ShortcutKey::Character('v'), ctrl, &clipboard)
            .expect("paste");

        assert_eq!(canvas.shapes().len(), 2);
        let pasted = canvas.shapes().last().expect("pasted shape");
        assert_eq!(canvas.selected(), Some(pasted.id()));
        assert_ne!(pasted.id(), id);
        let Annotation::BorderedRectangle(rect) = pasted else {
            panic!("expected bordered rectangle");
        };
        assert_eq!(rect.rect, Rect::from_ltrb(30.0, 30.0, 130.0, 80.0));
    }

    #[test]
    fn paste_with_empty_clipboard_does_nothing() {
        let mut canvas = canvas(100, 100);
        assert!(!canvas.paste(&MemoryClipboard::new()).expect("paste"));
        assert!(canvas.shapes().is_empty());
    }

    #[test]
    fn selector_copy_puts_cropped_composite_on_clipboard() {
        let mut canvas = canvas(100, 80);
        let clipboard = MemoryClipboard::new();
        canvas.select_tool(ToolKind::Selector);
        drag(&mut canvas, Point::new(10.0, 10.0), Point::new(40.0, 30.0));

        canvas
            .key_pressed(
                ShortcutKey::Character('c'),
                ShortcutModifiers::new(true, false),
                &clipboard,
            )
            .expect("copy selector");
        let image = clipboard.image().expect("decode").expect("image present");
        assert_eq!(image.dimensions(), (30, 20));
    }

    #[test]
    fn typing_on_selected_callout_opens_seeded_editor() {
        let mut canvas = canvas(400, 300);
        let clipboard = MemoryClipboard::new();
        let id = draw(
            &mut canvas,
            ToolKind::CalloutNoArrow,
            Point::new(20.0, 20.0),
            Point::new(220.0, 120.0),
        )
        .expect("callout");
        canvas.select_tool(ToolKind::None);
        drag(&mut canvas, Point::new(100.0, 60.0), Point::new(100.0, 60.0));

        let response = canvas
            .key_pressed(ShortcutKey::Character('H'), ShortcutModifiers::new(false, true), &clipboard)
            .expect("key");
        let Some(TextEditorRequest::Open { frame, text, .. }) = response.text_editor else {
            panic!("editor should open");
        };
        assert_eq!(frame, Rect::from_ltrb(20.0, 20.0, 220.0, 120.0));
        assert_eq!(text, "H");
        assert_eq!(canvas.interaction_state(), InteractionState::EditingText);

        let ignored = canvas
            .key_pressed(ShortcutKey::Delete, ShortcutModifiers::default(), &clipboard)
            .expect("key");
        assert_eq!(ignored, CanvasResponse::NONE);
        assert_eq!(canvas.shapes().len(), 1);

        canvas.commit_text("Hello");
        assert_eq!(canvas.interaction_state(), InteractionState::Idle);
        assert_eq!(
            canvas.shape(id).and_then(Annotation::text_body).map(|body| body.text.as_str()),
            Some("Hello")
        );
    }

    #[test]
    fn escape_cancels_text_edit_without_changes() {
        let mut canvas = canvas(400, 300);
        let clipboard = MemoryClipboard::new();
        let id = draw(&mut canvas, ToolKind::Callout, Point::new(20.0, 20.0), Point::new(220.0, 120.0))
            .expect("callout");
        canvas.select_tool(ToolKind::None);
        drag(&mut canvas, Point::new(100.0, 60.0), Point::new(100.0, 60.0));

        let opened = canvas.double_clicked(Point::new(100.0, 60.0));
        assert!(matches!(opened.text_editor, Some(TextEditorRequest::Open { .. })));

        let response = canvas
            .key_pressed(ShortcutKey::Escape, ShortcutModifiers::default(), &clipboard)
            .expect("escape");
        assert_eq!(response.text_editor, Some(TextEditorRequest::Close));
        assert_eq!(canvas.interaction_state(), InteractionState::Idle);
        assert_eq!(
            canvas.shape(id).and_then(Annotation::text_body).map(|body| body.text.as_str()),
            Some("")
        );
    }

    #[test]
    fn trim_crops_image_and_shifts_shapes() {
        let mut canvas = canvas(200, 100);
        let id = draw(&mut canvas, ToolKind::Arrow, Point::new(60.0, 50.0), Point::new(150.0, 50.0))
            .expect("arrow");
        canvas.begin_trim().expect("trim");

        drag(&mut canvas, Point::new(0.0, 0.0), Point::new(50.0, 20.0));
        assert_eq!(
            canvas.trim().map(|trim| trim.rect),
            Some(Rect::from_ltrb(50.0, 20.0, 200.0, 100.0))
        );

        canvas.apply_trim().expect("apply trim");
        assert_eq!(canvas.image().dimensions(), (150, 80));
        assert!(canvas.trim().is_none());
        let Some(Annotation::Arrow(arrow)) = canvas.shape(id) else {
            panic!("expected arrow");
        };
        assert_eq!(arrow.start, Point::new(10.0, 30.0));
        assert!(matches!(
            canvas.apply_trim().expect_err("no trim"),
            EditError::NoActiveTrim
        ));
    }

    #[test]
    fn blur_cache_follows_base_image_edits() {
        let mut canvas = canvas(100, 100);
        let id = draw(&mut canvas, ToolKind::BlurRectangle, Point::new(10.0, 10.0), Point::new(60.0, 60.0))
            .expect("blur");
        let cached = |canvas: &Canvas| match canvas.shape(id) {
            Some(Annotation::BlurRectangle(blur)) => blur.cache().map(|cache| cache.region),
            _ => None,
        };
        assert_eq!(cached(&canvas), Some(Rect::new(10.0, 10.0, 50.0, 50.0)));

        canvas
            .cut_strip(CutAxis::Vertical, 0.0, 20.0)
            .expect("cut");
        assert_eq!(cached(&canvas), Some(Rect::new(0.0, 10.0, 40.0, 50.0)));
    }

    struct FixedCapture(RgbaImage);

    impl CaptureProvider for FixedCapture {
        fn capture(&self) -> CaptureResult<RgbaImage> {
            Ok(self.0.clone())
        }
    }

    struct BrokenCapture;

    impl CaptureProvider for BrokenCapture {
        fn capture(&self) -> CaptureResult<RgbaImage> {
            Err(CaptureError::Unavailable {
                message: "no display".to_string(),
            })
        }
    }

    #[test]
    fn load_capture_resets_document() {
        let mut canvas = canvas(100, 100);
        let _ = draw(&mut canvas, ToolKind::Arrow, Point::new(10.0, 10.0), Point::new(90.0, 10.0));

        canvas
            .load_capture(&BrokenCapture)
            .expect_err("capture failure propagates");
        assert_eq!(canvas.shapes().len(), 1);

        let fresh = RgbaImage::from_pixel(30, 20, Rgba([1, 2, 3, 255]));
        canvas
            .load_capture(&FixedCapture(fresh.clone()))
            .expect("capture");
        assert!(canvas.shapes().is_empty());
        assert_eq!(canvas.image(), &fresh);
    }

    #[test]
    fn project_round_trip_restores_shapes() {
        let mut canvas = canvas(120, 80);
        let _ = draw(&mut canvas, ToolKind::Highlighter, Point::new(10.0, 10.0), Point::new(60.0, 40.0));
        let record = canvas.to_project().expect("project");

        let restored = Canvas::from_project(&record, EditorDefaults::default()).expect("restore");
        assert_eq!(restored.image(), canvas.image());
        assert_eq!(restored.shapes(), canvas.shapes());
    }

    #[test]
    fn view_shows_selection_while_export_does_not() {
        let mut canvas = canvas(100, 100);
        canvas.defaults_mut().highlighter = StrokeStyle::new(Color::RED, 1.0);
        let _ = draw(&mut canvas, ToolKind::Highlighter, Point::new(10.0, 10.0), Point::new(60.0, 60.0));
        canvas.select_tool(ToolKind::None);
        drag(&mut canvas, Point::new(30.0, 30.0), Point::new(30.0, 30.0));

        let view = canvas.render_view().expect("view");
        let export = canvas.render().expect("export");
        assert_eq!(view.get_pixel(10, 10), &Rgba([255, 255, 255, 255]));
        assert_eq!(export.image.get_pixel(10, 10), &Rgba([255, 0, 0, 255]));
    }
}
