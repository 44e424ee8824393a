use crate::naming::extension_of;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse file classification derived from the extension.
///
/// Ordering follows declaration order, which is also the order statistics are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Document,
    Image,
    Video,
    Audio,
    Archive,
    Code,
    Executable,
    Other,
}

impl Category {
    pub const ALL: [Self; 8] = [
        Self::Document,
        Self::Image,
        Self::Video,
        Self::Audio,
        Self::Archive,
        Self::Code,
        Self::Executable,
        Self::Other,
    ];

    /// Lower-case extensions (without the dot) that map to this category.
    #[must_use]
    pub const fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Document => &["pdf", "doc", "docx", "txt", "ppt", "pptx", "xls", "xlsx", "md"],
            Self::Image => &["jpg", "jpeg", "png", "gif", "bmp", "svg", "webp", "ico"],
            Self::Video => &["mp4", "avi", "mov", "wmv", "flv", "mkv", "webm"],
            Self::Audio => &["mp3", "wav", "ogg", "flac", "aac", "m4a"],
            Self::Archive => &["zip", "rar", "7z", "tar", "gz", "bz2"],
            Self::Code => &["java", "js", "html", "css", "py", "cpp", "c", "h", "xml", "json"],
            Self::Executable => &["exe", "msi", "dmg", "pkg", "deb", "rpm"],
            Self::Other => &[],
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Document => "Documents",
            Self::Image => "Images",
            Self::Video => "Videos",
            Self::Audio => "Audio",
            Self::Archive => "Archives",
            Self::Code => "Code",
            Self::Executable => "Executables",
            Self::Other => "Other",
        }
    }

    /// Hex color used by UIs to badge the category.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Document => "#2196F3",
            Self::Image => "#4CAF50",
            Self::Video => "#FF9800",
            Self::Audio => "#9C27B0",
            Self::Archive => "#795548",
            Self::Code => "#607D8B",
            Self::Executable => "#F44336",
            Self::Other => "#9E9E9E",
        }
    }

    /// Canonical upper-case identifier, e.g. `"DOCUMENT"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Document => "DOCUMENT",
            Self::Image => "IMAGE",
            Self::Video => "VIDEO",
            Self::Audio => "AUDIO",
            Self::Archive => "ARCHIVE",
            Self::Code => "CODE",
            Self::Executable => "EXECUTABLE",
            Self::Other => "OTHER",
        }
    }

    /// Maps an extension (with or without a leading dot, any case) to its category.
    ///
    /// Unknown or empty extensions fall back to [`Category::Other`].
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.trim().trim_start_matches('.');
        if ext.is_empty() {
            return Self::Other;
        }
        Self::ALL
            .into_iter()
            .find(|category| category.extensions().iter().any(|known| known.eq_ignore_ascii_case(ext)))
            .unwrap_or(Self::Other)
    }

    #[must_use]
    pub fn from_filename(name: &str) -> Self {
        extension_of(name).map_or(Self::Other, Self::from_extension)
    }

    /// Lenient filter parsing: a blank or unrecognized value means "no filter".
    #[must_use]
    pub fn parse_filter(raw: Option<&str>) -> Option<Self> {
        raw.map(str::trim).filter(|s| !s.is_empty()).and_then(|s| s.parse().ok())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown file category '{}'", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|category| {
                category.as_str().eq_ignore_ascii_case(trimmed)
                    || category.display_name().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| UnknownCategory(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxhash::FxHashMap;

    #[test]
    fn every_extension_belongs_to_exactly_one_category() {
        let mut owners: FxHashMap<&str, Category> = FxHashMap::default();
        for category in Category::ALL {
            for ext in category.extensions() {
                assert_eq!(*ext, ext.to_ascii_lowercase(), "table entries are lower-case");
                if let Some(previous) = owners.insert(ext, category) {
                    panic!("'{ext}' is claimed by both {previous} and {category}");
                }
            }
        }
        assert!(Category::Other.extensions().is_empty());
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(Category::from_extension("PDF"), Category::Document);
        assert_eq!(Category::from_extension(".Png"), Category::Image);
        assert_eq!(Category::from_extension("mkv"), Category::Video);
        assert_eq!(Category::from_extension("FLAC"), Category::Audio);
        assert_eq!(Category::from_extension("7z"), Category::Archive);
        assert_eq!(Category::from_extension("rs"), Category::Other);
        assert_eq!(Category::from_extension(""), Category::Other);
    }

    #[test]
    fn classification_from_filename() {
        assert_eq!(Category::from_filename("report.PDF"), Category::Document);
        assert_eq!(Category::from_filename("archive.tar.gz"), Category::Archive);
        assert_eq!(Category::from_filename("README"), Category::Other);
        assert_eq!(Category::from_filename(".bashrc"), Category::Other);
        assert_eq!(Category::from_filename("trailing."), Category::Other);
    }

    #[test]
    fn filter_parsing_is_lenient() {
        assert_eq!(Category::parse_filter(Some("image")), Some(Category::Image));
        assert_eq!(Category::parse_filter(Some(" DOCUMENT ")), Some(Category::Document));
        assert_eq!(Category::parse_filter(Some("Archives")), Some(Category::Archive));
        assert_eq!(Category::parse_filter(Some("bogus")), None);
        assert_eq!(Category::parse_filter(Some("  ")), None);
        assert_eq!(Category::parse_filter(None), None);
        assert!("bogus".parse::<Category>().is_err());
    }

    #[test]
    fn serializes_as_upper_case_identifier() {
        assert_eq!(serde_json::to_string(&Category::Executable).unwrap(), "\"EXECUTABLE\"");
        assert_eq!(Category::Code.to_string(), "CODE");
        assert!(Category::Document < Category::Other);
    }
}
