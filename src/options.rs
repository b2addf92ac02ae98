//! Export configuration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Options controlling an export
///
/// ```rust,ignore
/// let options = ExportOptions::default()
///     .with_author("Ada Lovelace")
///     .with_language("en-GB");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Written to `dc:creator` and `cp:lastModifiedBy`
    pub author: Option<String>,
    /// Written to `dc:language`
    pub language: String,
    /// Creation/modification time; the current time when absent
    pub timestamp: Option<DateTime<Utc>>,
    /// Append a bibliography when citations exist but no placeholder does
    pub append_bibliography: bool,
    /// Heading placed above an appended bibliography
    pub bibliography_heading: Option<String>,
    /// Usable page width in pixels (96 dpi); wider images are scaled down
    pub text_width: u32,
    /// Size used for images whose dimensions cannot be determined
    pub default_image_width: u32,
    pub default_image_height: u32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            author: None,
            language: "en-US".to_string(),
            timestamp: None,
            append_bibliography: true,
            bibliography_heading: Some("References".to_string()),
            // 6.5in: A4/Letter with 1in margins
            text_width: 624,
            default_image_width: 320,
            default_image_height: 240,
        }
    }
}

impl ExportOptions {
    /// Parse options from TOML; missing keys keep their defaults
    pub fn from_toml_str(s: &str) -> crate::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_append_bibliography(mut self, append: bool) -> Self {
        self.append_bibliography = append;
        self
    }

    pub fn with_bibliography_heading(mut self, heading: Option<String>) -> Self {
        self.bibliography_heading = heading;
        self
    }

    pub fn with_text_width(mut self, px: u32) -> Self {
        self.text_width = px;
        self
    }

    /// Timestamp to record in the package
    pub fn resolved_timestamp(&self) -> DateTime<Utc> {
        self.timestamp.unwrap_or_else(Utc::now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_toml_overrides_defaults() {
        let options = ExportOptions::from_toml_str(
            r#"
            author = "Ada Lovelace"
            append_bibliography = false
            timestamp = "2024-03-01T12:00:00Z"
            "#,
        )
        .unwrap();

        assert_eq!(options.author.as_deref(), Some("Ada Lovelace"));
        assert!(!options.append_bibliography);
        assert_eq!(options.language, "en-US");
        assert_eq!(options.text_width, 624);
        assert_eq!(
            options.timestamp,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_invalid_toml() {
        let err = ExportOptions::from_toml_str("text_width = \"wide\"").unwrap_err();
        assert!(matches!(err, crate::Error::Options(_)));
    }
}
