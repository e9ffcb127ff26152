//! Document ingestion: per-file-type previews and the context bundle.
//!
//! Every supporting document is turned into a bounded, deterministic text
//! preview. Extraction never fails: unreadable, malformed, or unsupported
//! files degrade to a descriptive placeholder so a single bad file cannot
//! abort the bundling pass.

pub mod bundle;
mod plain;
pub mod presentation;
pub mod spreadsheet;
pub mod tabular;

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

pub use bundle::{ContextChunk, build_context_bundle, collect_chunks, render_bundle};
pub use presentation::PresentationReader;
pub use spreadsheet::SpreadsheetReader;

/// Preview returned for `.xlsx` files when spreadsheet support is compiled out.
pub const SPREADSHEET_UNAVAILABLE: &str =
    "XLSX provided but spreadsheet support is not available in this build.";

/// Preview returned for `.pptx` files when presentation support is compiled out.
pub const PRESENTATION_UNAVAILABLE: &str =
    "PPTX provided but presentation support is not available in this build.";

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Optional document readers available to the dispatcher.
///
/// A `None` handle means the reader is absent; the dispatcher then emits the
/// matching "not available" preview instead of touching the file.
#[derive(Debug, Clone, Copy, Default)]
pub struct Capabilities {
    pub spreadsheet: Option<SpreadsheetReader>,
    pub presentation: Option<PresentationReader>,
}

impl Capabilities {
    /// Every reader compiled into this build.
    pub fn detect() -> Self {
        Self {
            spreadsheet: SpreadsheetReader::detect(),
            presentation: PresentationReader::detect(),
        }
    }

    /// No optional readers at all.
    pub fn none() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Document kinds
// ---------------------------------------------------------------------------

/// The closed set of document variants the dispatcher understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentKind {
    /// `.txt` / `.md`
    PlainText,
    /// `.csv`
    Csv,
    /// `.xlsx`
    Spreadsheet,
    /// `.pptx`
    Presentation,
    /// Anything else; carries the dotted extension (may be empty).
    Unsupported(String),
}

impl DocumentKind {
    /// Classify a lower-cased, dotted extension such as `.csv`.
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            ".txt" | ".md" => Self::PlainText,
            ".csv" => Self::Csv,
            ".xlsx" => Self::Spreadsheet,
            ".pptx" => Self::Presentation,
            other => Self::Unsupported(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// SourceDocument
// ---------------------------------------------------------------------------

/// A file discovered in the context folder.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    path: PathBuf,
    extension: String,
    kind: DocumentKind,
}

impl SourceDocument {
    /// Classify a file by its extension. The file is not opened.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let extension = path
            .extension()
            .filter(|ext| !ext.is_empty())
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
            .unwrap_or_default();
        let kind = DocumentKind::from_extension(&extension);
        Self {
            path,
            extension,
            kind,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lower-cased extension including the leading dot, or empty.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn kind(&self) -> &DocumentKind {
        &self.kind
    }

    /// File name for headers and placeholders.
    pub fn file_name(&self) -> String {
        display_name(&self.path)
    }

    /// Produce the bounded preview for this document. Never fails.
    #[instrument(skip_all, fields(file = %self.file_name(), kind = ?self.kind))]
    pub fn extract(&self, caps: &Capabilities) -> String {
        let preview = match &self.kind {
            DocumentKind::PlainText => plain::preview(&self.path),
            DocumentKind::Csv => tabular::preview(&self.path),
            DocumentKind::Spreadsheet => match &caps.spreadsheet {
                Some(reader) => reader.preview(&self.path),
                None => SPREADSHEET_UNAVAILABLE.to_string(),
            },
            DocumentKind::Presentation => match &caps.presentation {
                Some(reader) => reader.preview(&self.path),
                None => PRESENTATION_UNAVAILABLE.to_string(),
            },
            DocumentKind::Unsupported(ext) => format!("(Skipped unsupported file type: {ext})"),
        };
        debug!(preview_len = preview.len(), "preview extracted");
        preview
    }
}

/// Last path component, lossily decoded.
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Placeholder for a file that could not be opened or read.
pub(crate) fn unreadable(path: &Path, err: &dyn std::fmt::Display) -> String {
    format!("(Could not read {}: {err})", display_name(path))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_dir;

    #[test]
    fn kind_from_extension() {
        assert_eq!(DocumentKind::from_extension(".md"), DocumentKind::PlainText);
        assert_eq!(DocumentKind::from_extension(".txt"), DocumentKind::PlainText);
        assert_eq!(DocumentKind::from_extension(".csv"), DocumentKind::Csv);
        assert_eq!(DocumentKind::from_extension(".xlsx"), DocumentKind::Spreadsheet);
        assert_eq!(DocumentKind::from_extension(".pptx"), DocumentKind::Presentation);
        assert_eq!(
            DocumentKind::from_extension(".docx"),
            DocumentKind::Unsupported(".docx".into())
        );
    }

    #[test]
    fn extension_is_lowercased_with_dot() {
        let doc = SourceDocument::new("/tmp/Budget.XLSX");
        assert_eq!(doc.extension(), ".xlsx");
        assert_eq!(doc.kind(), &DocumentKind::Spreadsheet);

        let dotfile = SourceDocument::new("/tmp/.DS_Store");
        assert_eq!(dotfile.extension(), "");
        assert_eq!(dotfile.kind(), &DocumentKind::Unsupported(String::new()));

        let trailing_dot = SourceDocument::new("/nonexistent/boardroom/draft.");
        assert_eq!(trailing_dot.extension(), "");
        assert_eq!(
            trailing_dot.extract(&Capabilities::none()),
            "(Skipped unsupported file type: )"
        );
    }

    #[test]
    fn unsupported_file_is_never_opened() {
        // The path does not exist; an attempt to read it would yield a read error.
        let doc = SourceDocument::new("/nonexistent/boardroom/spec.docx");
        assert_eq!(
            doc.extract(&Capabilities::detect()),
            "(Skipped unsupported file type: .docx)"
        );
    }

    #[test]
    fn absent_capabilities_yield_unavailable_messages() {
        let tmp = temp_dir("boardroom-caps");
        let xlsx = tmp.join("model.xlsx");
        let pptx = tmp.join("deck.pptx");
        std::fs::write(&xlsx, b"not really a workbook").unwrap();
        std::fs::write(&pptx, b"not really a deck").unwrap();

        let caps = Capabilities::none();
        assert_eq!(SourceDocument::new(&xlsx).extract(&caps), SPREADSHEET_UNAVAILABLE);
        assert_eq!(SourceDocument::new(&pptx).extract(&caps), PRESENTATION_UNAVAILABLE);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_text_file_degrades_to_placeholder() {
        let doc = SourceDocument::new("/nonexistent/boardroom/notes.md");
        let preview = doc.extract(&Capabilities::none());
        assert!(preview.starts_with("(Could not read notes.md:"));
    }

    #[test]
    fn detect_matches_enabled_features() {
        let caps = Capabilities::detect();
        assert_eq!(caps.spreadsheet.is_some(), cfg!(feature = "xlsx"));
        assert_eq!(caps.presentation.is_some(), cfg!(feature = "pptx"));
    }
}
