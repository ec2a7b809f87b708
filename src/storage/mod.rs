//! Project and shape records exchanged with files and the clipboard.

use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::editor::shapes::{
    Annotation, ArrowShape, BlurRectangleShape, BorderedRectangleShape, CalloutNoArrowShape,
    CalloutShape, FontSpec, HighlighterShape, StrokeStyle, TextBody,
};
use crate::geometry::{Color, Point, Rect};

pub const PROJECT_VERSION: u32 = 1;

const DEFAULT_RECORD_COLOR: u32 = 0xFFFF_0000;
const DEFAULT_RECORD_THICKNESS: f64 = 2.0;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("failed to read project file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write project file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid project json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid base64 image payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),
}

pub type ProjectResult<T> = std::result::Result<T, ProjectError>;

fn default_record_color() -> u32 {
    DEFAULT_RECORD_COLOR
}

fn default_record_thickness() -> f64 {
    DEFAULT_RECORD_THICKNESS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StrokeRecord {
    #[serde(default = "default_record_color")]
    pub stroke_color: u32,
    #[serde(default = "default_record_thickness")]
    pub stroke_thickness: f64,
}

impl From<StrokeStyle> for StrokeRecord {
    fn from(style: StrokeStyle) -> Self {
        Self {
            stroke_color: style.color.to_argb(),
            stroke_thickness: style.thickness,
        }
    }
}

impl From<&StrokeRecord> for StrokeStyle {
    fn from(record: &StrokeRecord) -> Self {
        Self::new(Color::from_argb(record.stroke_color), record.stroke_thickness)
    }
}

/// Two-point geometry used by arrows and highlighters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpanRecord {
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
    #[serde(flatten)]
    pub stroke: StrokeRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RectRecord {
    pub rect_x: f64,
    pub rect_y: f64,
    pub rect_width: f64,
    pub rect_height: f64,
    #[serde(flatten)]
    pub stroke: StrokeRecord,
}

/// Text and optional font fields; records written before fonts existed leave them out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TextRecord {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_italic: Option<bool>,
}

impl From<&TextBody> for TextRecord {
    fn from(body: &TextBody) -> Self {
        Self {
            text: body.text.clone(),
            font_family: Some(body.font.family.clone()),
            font_size: Some(body.font.size),
            font_bold: Some(body.font.bold),
            font_italic: Some(body.font.italic),
        }
    }
}

impl From<&TextRecord> for TextBody {
    fn from(record: &TextRecord) -> Self {
        let defaults = FontSpec::default();
        Self {
            text: record.text.clone(),
            font: FontSpec {
                family: record.font_family.clone().unwrap_or(defaults.family),
                size: record.font_size.unwrap_or(defaults.size),
                bold: record.font_bold.unwrap_or(defaults.bold),
                italic: record.font_italic.unwrap_or(defaults.italic),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CalloutRecord {
    #[serde(flatten)]
    pub rect: RectRecord,
    pub beak_x: f64,
    pub beak_y: f64,
    #[serde(flatten)]
    pub text: TextRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBoxRecord {
    #[serde(flatten)]
    pub rect: RectRecord,
    #[serde(flatten)]
    pub text: TextRecord,
}

/// One persisted shape, discriminated by `"$type"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "$type", rename_all = "lowercase")]
pub enum ShapeRecord {
    Arrow(SpanRecord),
    Callout(CalloutRecord),
    CalloutNoArrow(TextBoxRecord),
    BorderedRectangle(RectRecord),
    BlurRectangle(RectRecord),
    Highlighter(SpanRecord),
}

impl RectRecord {
    fn new(rect: Rect, style: StrokeStyle) -> Self {
        Self {
            rect_x: rect.x,
            rect_y: rect.y,
            rect_width: rect.width,
            rect_height: rect.height,
            stroke: style.into(),
        }
    }

    fn rect(&self) -> Rect {
        Rect::new(self.rect_x, self.rect_y, self.rect_width, self.rect_height)
    }

    fn style(&self) -> StrokeStyle {
        (&self.stroke).into()
    }
}

impl SpanRecord {
    fn new(start: Point, end: Point, style: StrokeStyle) -> Self {
        Self {
            start_x: start.x,
            start_y: start.y,
            end_x: end.x,
            end_y: end.y,
            stroke: style.into(),
        }
    }

    fn start(&self) -> Point {
        Point::new(self.start_x, self.start_y)
    }

    fn end(&self) -> Point {
        Point::new(self.end_x, self.end_y)
    }

    fn style(&self) -> StrokeStyle {
        (&self.stroke).into()
    }
}

impl From<&Annotation> for ShapeRecord {
    fn from(shape: &Annotation) -> Self {
        match shape {
            Annotation::Arrow(arrow) => {
                Self::Arrow(SpanRecord::new(arrow.start, arrow.end, arrow.style))
            }
            Annotation::Callout(callout) => Self::Callout(CalloutRecord {
                rect: RectRecord::new(callout.rect, callout.style),
                beak_x: callout.beak.x,
                beak_y: callout.beak.y,
                text: (&callout.body).into(),
            }),
            Annotation::CalloutNoArrow(callout) => Self::CalloutNoArrow(TextBoxRecord {
                rect: RectRecord::new(callout.rect, callout.style),
                text: (&callout.body).into(),
            }),
            Annotation::BorderedRectangle(border) => {
                Self::BorderedRectangle(RectRecord::new(border.rect, border.style))
            }
            Annotation::BlurRectangle(blur) => {
                Self::BlurRectangle(RectRecord::new(blur.rect, blur.style))
            }
            Annotation::Highlighter(highlighter) => Self::Highlighter(SpanRecord::new(
                highlighter.start,
                highlighter.end,
                highlighter.style,
            )),
        }
    }
}

impl ShapeRecord {
    /// Live shape for this record. Blur rectangles come back without a cached raster.
    pub fn to_annotation(&self, id: u64) -> Annotation {
        match self {
            Self::Arrow(span) => {
                Annotation::Arrow(ArrowShape::new(id, span.start(), span.end(), span.style()))
            }
            Self::Callout(record) => {
                let mut callout = CalloutShape::new(
                    id,
                    record.rect.rect(),
                    Point::new(record.beak_x, record.beak_y),
                    record.rect.style(),
                );
                callout.body = (&record.text).into();
                Annotation::Callout(callout)
            }
            Self::CalloutNoArrow(record) => {
                let mut callout =
                    CalloutNoArrowShape::new(id, record.rect.rect(), record.rect.style());
                callout.body = (&record.text).into();
                Annotation::CalloutNoArrow(callout)
            }
            Self::BorderedRectangle(rect) => Annotation::BorderedRectangle(
                BorderedRectangleShape::new(id, rect.rect(), rect.style()),
            ),
            Self::BlurRectangle(rect) => {
                Annotation::BlurRectangle(BlurRectangleShape::new(id, rect.rect(), rect.style()))
            }
            Self::Highlighter(span) => Annotation::Highlighter(HighlighterShape::new(
                id,
                span.start(),
                span.end(),
                span.style(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProjectRecord {
    pub version: u32,
    #[serde(default)]
    pub preview_image_base64: String,
    pub base_image_base64: String,
    #[serde(default)]
    pub shapes: Vec<ShapeRecord>,
}

impl ProjectRecord {
    /// Snapshot of a base image, its shapes and a flattened preview.
    pub fn new(base: &RgbaImage, shapes: &[Annotation], preview: &RgbaImage) -> ProjectResult<Self> {
        Ok(Self {
            version: PROJECT_VERSION,
            preview_image_base64: encode_png_base64(preview)?,
            base_image_base64: encode_png_base64(base)?,
            shapes: shapes.iter().map(ShapeRecord::from).collect(),
        })
    }

    pub fn base_image(&self) -> ProjectResult<RgbaImage> {
        decode_png_base64(&self.base_image_base64)
    }
}

pub fn encode_png_base64(image: &RgbaImage) -> ProjectResult<String> {
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png)?;
    Ok(STANDARD.encode(bytes.into_inner()))
}

pub fn decode_png_base64(payload: &str) -> ProjectResult<RgbaImage> {
    let bytes = STANDARD.decode(payload.trim())?;
    Ok(image::load_from_memory(&bytes)?.to_rgba8())
}

pub fn load_project_file(path: &Path) -> ProjectResult<ProjectRecord> {
    let contents = fs::read_to_string(path).map_err(|source| ProjectError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let record: ProjectRecord = serde_json::from_str(&contents)?;
    if record.version != PROJECT_VERSION {
        tracing::warn!(version = record.version, ?path, "unexpected project version; loading anyway");
    }
    tracing::debug!(?path, shapes = record.shapes.len(), "project loaded");
    Ok(record)
}

pub fn save_project_file(path: &Path, record: &ProjectRecord) -> ProjectResult<()> {
    let contents = serde_json::to_string_pretty(record)?;
    fs::write(path, contents).map_err(|source| ProjectError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(?path, shapes = record.shapes.len(), "project saved");
    Ok(())
}
