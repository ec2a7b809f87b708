pub mod capture;
pub mod clipboard;
pub mod config;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod input;
pub mod logging;
pub mod render;
pub mod state;
pub mod storage;
pub use error::{AppError, AppResult};

use std::path::PathBuf;

use editor::{Canvas, EditorDefaults};
use geometry::Rect;
use render::FontBook;

pub const USAGE: &str = "usage: shotmark <project.json> <out.png> [--region x,y,w,h]";

/// Flatten a saved project to a PNG, optionally cropped to `region`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub project: PathBuf,
    pub output: PathBuf,
    pub region: Option<Rect>,
}

impl ExportRequest {
    /// Parses arguments after the program name.
    pub fn from_args<I>(args: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut positional = Vec::new();
        let mut region = None;
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            if arg == "--region" {
                let value = args
                    .next()
                    .ok_or_else(|| AppError::InvalidArgument("--region needs a value".to_string()))?;
                region = Some(parse_region(&value)?);
            } else if arg.starts_with("--") {
                return Err(AppError::InvalidArgument(format!("unknown option {arg}")));
            } else {
                positional.push(PathBuf::from(arg));
            }
        }

        let [project, output]: [PathBuf; 2] = positional
            .try_into()
            .map_err(|_| AppError::InvalidArgument(USAGE.to_string()))?;
        Ok(Self {
            project,
            output,
            region,
        })
    }
}

fn parse_region(value: &str) -> AppResult<Rect> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| AppError::InvalidArgument(format!("region {value:?}: {err}")))?;
    match parts.as_slice() {
        [x, y, width, height] if *width > 0.0 && *height > 0.0 => {
            Ok(Rect::new(*x, *y, *width, *height))
        }
        _ => Err(AppError::InvalidArgument(format!(
            "region {value:?} must be x,y,w,h with positive size"
        ))),
    }
}

/// Entrypoint used by the CLI binding.
pub fn run(request: &ExportRequest) -> AppResult<()> {
    logging::init();
    tracing::info!(project = ?request.project, "starting shotmark export");

    let config = config::load_app_config();
    let fonts = FontBook::load(config.font_path.as_deref());
    if fonts.is_none() {
        tracing::warn!("no usable font found; callout text will be skipped");
    }

    let record = storage::load_project_file(&request.project)?;
    let canvas = Canvas::from_project(&record, EditorDefaults::from(&config))?.with_fonts(fonts);
    let image = match request.region {
        Some(rect) => canvas.render_region(rect)?,
        None => canvas.render()?.image,
    };

    image.save(&request.output).map_err(|source| AppError::Export {
        path: request.output.clone(),
        source,
    })?;
    tracing::info!(
        output = ?request.output,
        width = image.width(),
        height = image.height(),
        shapes = canvas.shapes().len(),
        "export complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::shapes::{Annotation, ArrowShape, StrokeStyle};
    use crate::geometry::Point;
    use crate::storage::{save_project_file, ProjectRecord};
    use image::{Rgba, RgbaImage};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn export_request_parses_positionals_and_region() {
        let request = ExportRequest::from_args(args(&["in.json", "--region", "1,2,30,40", "out.png"]))
            .expect("valid arguments");
        assert_eq!(request.project, PathBuf::from("in.json"));
        assert_eq!(request.output, PathBuf::from("out.png"));
        assert_eq!(request.region, Some(Rect::new(1.0, 2.0, 30.0, 40.0)));
    }

    #[test]
    fn export_request_rejects_bad_arguments() {
        for bad in [
            args(&["only.json"]),
            args(&["a.json", "b.png", "c.png"]),
            args(&["a.json", "b.png", "--region"]),
            args(&["a.json", "b.png", "--region", "1,2,3"]),
            args(&["a.json", "b.png", "--region", "1,2,0,4"]),
            args(&["a.json", "b.png", "--verbose"]),
        ] {
            let err = ExportRequest::from_args(bad).expect_err("should be rejected");
            assert!(matches!(err, AppError::InvalidArgument(_)));
        }
    }

    #[test]
    fn run_writes_flattened_project() {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("shotmark-run-{nanos}"));
        std::fs::create_dir_all(&dir).expect("temp dir");

        let base = RgbaImage::from_pixel(80, 60, Rgba([255, 255, 255, 255]));
        let shapes = vec![Annotation::Arrow(ArrowShape::new(
            1,
            Point::new(10.0, 30.0),
            Point::new(70.0, 30.0),
            StrokeStyle::default(),
        ))];
        let record = ProjectRecord::new(&base, &shapes, &base).expect("record");
        let project = dir.join("project.json");
        save_project_file(&project, &record).expect("save");

        let request = ExportRequest {
            project,
            output: dir.join("out.png"),
            region: Some(Rect::new(0.0, 0.0, 40.0, 20.0)),
        };
        run(&request).expect("export");

        let written = image::open(&request.output).expect("png").to_rgba8();
        let _ = std::fs::remove_dir_all(&dir);
        assert_eq!(written.dimensions(), (40, 20));
    }
}
