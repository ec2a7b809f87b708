use std::path::Path;

use ab_glyph::FontArc;

const REGULAR_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const BOLD_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

const ITALIC_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/liberation/LiberationSans-Italic.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Italic.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Oblique.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Oblique.ttf",
    "/System/Library/Fonts/Supplemental/Arial Italic.ttf",
    "C:\\Windows\\Fonts\\ariali.ttf",
];

const BOLD_ITALIC_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/liberation/LiberationSans-BoldItalic.ttf",
    "/usr/share/fonts/liberation/LiberationSans-BoldItalic.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-BoldOblique.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-BoldOblique.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold Italic.ttf",
    "C:\\Windows\\Fonts\\arialbi.ttf",
];

/// Loaded faces for callout text. Missing styles fall back to the regular face.
#[derive(Clone)]
pub struct FontBook {
    regular: FontArc,
    bold: Option<FontArc>,
    italic: Option<FontArc>,
    bold_italic: Option<FontArc>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("bold", &self.bold.is_some())
            .field("italic", &self.italic.is_some())
            .field("bold_italic", &self.bold_italic.is_some())
            .finish_non_exhaustive()
    }
}

impl FontBook {
    pub fn from_regular(regular: FontArc) -> Self {
        Self {
            regular,
            bold: None,
            italic: None,
            bold_italic: None,
        }
    }

    /// Loads a configured font file, falling back to well-known system fonts.
    pub fn load(custom: Option<&Path>) -> Option<Self> {
        let regular = match custom.and_then(load_font_file) {
            Some(font) => font,
            None => {
                if let Some(path) = custom {
                    tracing::warn!(?path, "configured font could not be loaded; trying system fonts");
                }
                load_first(REGULAR_CANDIDATES)?
            }
        };

        let book = Self {
            regular,
            bold: load_first(BOLD_CANDIDATES),
            italic: load_first(ITALIC_CANDIDATES),
            bold_italic: load_first(BOLD_ITALIC_CANDIDATES),
        };
        tracing::debug!(?book, "font book loaded");
        Some(book)
    }

    pub fn face(&self, bold: bool, italic: bool) -> &FontArc {
        let styled = match (bold, italic) {
            (true, true) => self.bold_italic.as_ref().or(self.bold.as_ref()),
            (true, false) => self.bold.as_ref(),
            (false, true) => self.italic.as_ref(),
            (false, false) => None,
        };
        styled.unwrap_or(&self.regular)
    }
}

fn load_first(candidates: &[&str]) -> Option<FontArc> {
    candidates
        .iter()
        .find_map(|path| load_font_file(Path::new(path)))
}

fn load_font_file(path: &Path) -> Option<FontArc> {
    let bytes = std::fs::read(path).ok()?;
    FontArc::try_from_vec(bytes).ok()
}

/// Font bundled under `testdata/` so text rendering is testable without system fonts.
#[cfg(test)]
pub(crate) fn bundled_test_fonts() -> FontBook {
    let bytes: &'static [u8] = include_bytes!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/testdata/fonts/DejaVuSansMono.ttf"
    ));
    FontBook::from_regular(FontArc::try_from_slice(bytes).expect("bundled font parses"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn bundled_font_path() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata/fonts/DejaVuSansMono.ttf")
    }

    #[test]
    fn load_font_file_returns_none_for_missing_path() {
        assert!(load_font_file(Path::new("/nonexistent/shotmark/font.ttf")).is_none());
    }

    #[test]
    fn load_prefers_configured_font_file() {
        let path = bundled_font_path();
        assert!(load_font_file(&path).is_some());
        assert!(FontBook::load(Some(&path)).is_some());
    }

    #[test]
    fn face_falls_back_to_regular_when_style_missing() {
        let book = bundled_test_fonts();
        let regular = book.face(false, false);
        assert!(std::ptr::eq(book.face(true, true), regular));
        assert!(std::ptr::eq(book.face(true, false), regular));
        assert!(std::ptr::eq(book.face(false, true), regular));
    }
}
