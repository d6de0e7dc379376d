//! The static catalog of conversion categories offered by the backend.
//!
//! The table is compiled in and never mutated. Each entry's `id` is also the
//! last path segment of the conversion endpoint, so ids must stay in sync with
//! the backend routes.

use crate::error::ConvertError;
use serde::Serialize;

/// Id of the only category whose request carries a `target_format` field.
pub const IMAGE_FORMAT_ID: &str = "image-format";

/// Pictogram shown next to a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Icon {
    FileSpreadsheet,
    FileText,
    Image,
    Video,
    ScanText,
}

impl Icon {
    /// Single-glyph rendering for terminals.
    pub fn glyph(self) -> &'static str {
        match self {
            Icon::FileSpreadsheet => "▦",
            Icon::FileText => "≡",
            Icon::Image => "◩",
            Icon::Video => "▶",
            Icon::ScanText => "⌕",
        }
    }
}

/// Display color of a category card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Accent {
    Blue,
    Green,
    Purple,
    Orange,
    Red,
    Indigo,
}

impl Accent {
    /// ANSI SGR foreground parameter for this accent (256-color palette for
    /// the shades the 16-color set lacks).
    pub fn ansi_code(self) -> &'static str {
        match self {
            Accent::Blue => "34",
            Accent::Green => "32",
            Accent::Purple => "35",
            Accent::Orange => "38;5;208",
            Accent::Red => "31",
            Accent::Indigo => "38;5;63",
        }
    }
}

/// One supported source→target pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionType {
    /// Stable identifier, embedded in the endpoint path.
    pub id: &'static str,
    /// Human title, e.g. `"JSON ↔ CSV"`.
    pub title: &'static str,
    pub description: &'static str,
    pub icon: Icon,
    /// Accepted and produced format labels, in display order.
    pub formats: &'static [&'static str],
    pub accent: Accent,
}

impl ConversionType {
    /// Whether requests for this category carry a `target_format` field.
    pub fn takes_target_format(&self) -> bool {
        self.id == IMAGE_FORMAT_ID
    }

    /// Whether `label` (case-insensitive) is one of this category's formats.
    pub fn lists_format(&self, label: &str) -> bool {
        self.formats.iter().any(|f| f.eq_ignore_ascii_case(label))
    }
}

static CATALOG: [ConversionType; 6] = [
    ConversionType {
        id: "json-csv",
        title: "JSON ↔ CSV",
        description: "Convert between data formats",
        icon: Icon::FileSpreadsheet,
        formats: &["JSON", "CSV"],
        accent: Accent::Blue,
    },
    ConversionType {
        id: "markdown-rtf",
        title: "Markdown ↔ RTF",
        description: "Convert between document formats",
        icon: Icon::FileText,
        formats: &["MD", "DOCX"],
        accent: Accent::Green,
    },
    ConversionType {
        id: IMAGE_FORMAT_ID,
        title: "HEIC/WEBP/AVIF ↔ JPG/PNG",
        description: "Convert image formats",
        icon: Icon::Image,
        formats: &["HEIC", "WEBP", "AVIF", "JPG", "PNG"],
        accent: Accent::Purple,
    },
    ConversionType {
        id: "video-gif",
        title: "Video → GIF",
        description: "Turn a video clip into an animated GIF",
        icon: Icon::Video,
        formats: &["MP4", "AVI", "MOV", "GIF"],
        accent: Accent::Orange,
    },
    ConversionType {
        id: "image-to-text-ocr",
        title: "Image → Text (OCR)",
        description: "Optical character recognition",
        icon: Icon::ScanText,
        formats: &["JPG", "PNG", "PDF", "TXT"],
        accent: Accent::Red,
    },
    ConversionType {
        id: "image-to-searchable-pdf-ocr",
        title: "Image → Searchable PDF (OCR)",
        description: "Produce a searchable PDF",
        icon: Icon::ScanText,
        formats: &["JPG", "PNG", "PDF"],
        accent: Accent::Indigo,
    },
];

/// Every category, in display order.
pub fn all() -> &'static [ConversionType] {
    &CATALOG
}

/// Look a category up by id.
pub fn find(id: &str) -> Option<&'static ConversionType> {
    CATALOG.iter().find(|t| t.id == id)
}

/// Like [`find`], but an unknown id is an error.
pub fn lookup(id: &str) -> Result<&'static ConversionType, ConvertError> {
    find(id).ok_or_else(|| ConvertError::UnknownConversionType { id: id.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique_and_path_safe() {
        let mut seen = HashSet::new();
        for t in all() {
            assert!(seen.insert(t.id), "duplicate id {}", t.id);
            assert!(
                t.id.chars().all(|c| c.is_ascii_lowercase() || c == '-'),
                "id {} is not a plain slug",
                t.id
            );
            assert!(!t.formats.is_empty(), "{} lists no formats", t.id);
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn only_image_format_takes_target_format() {
        let with_target: Vec<&str> = all()
            .iter()
            .filter(|t| t.takes_target_format())
            .map(|t| t.id)
            .collect();
        assert_eq!(with_target, vec![IMAGE_FORMAT_ID]);
    }

    #[test]
    fn find_and_lookup() {
        assert_eq!(find("video-gif").map(|t| t.icon), Some(Icon::Video));
        assert!(find("pdf-docx").is_none());
        assert!(matches!(
            lookup("pdf-docx"),
            Err(ConvertError::UnknownConversionType { ref id }) if id == "pdf-docx"
        ));
    }

    #[test]
    fn lists_format_ignores_case() {
        let img = lookup(IMAGE_FORMAT_ID).unwrap();
        assert!(img.lists_format("webp"));
        assert!(img.lists_format("PNG"));
        assert!(!img.lists_format("gif"));
    }

    #[test]
    fn serialises_for_json_listing() {
        let json = serde_json::to_value(find("json-csv").unwrap()).unwrap();
        assert_eq!(json["id"], "json-csv");
        assert_eq!(json["icon"], "file-spreadsheet");
        assert_eq!(json["accent"], "blue");
        assert_eq!(json["formats"][1], "CSV");
    }
}
