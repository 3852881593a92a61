//! Engine configuration.
//!
//! Everything here can also be changed on a live [`Engine`](crate::Engine);
//! the file form exists so a suite can share one YAML configuration.
//!
//! ```yaml
//! time_format: rfc3339
//! float_precision: 2
//! store_shortcut: { prefix: "{{", suffix: "}}" }
//! load_shortcut: { prefix: "_", suffix: "_" }
//! error_policy: aggregate
//! default_headers:
//!   authorization: ["Bearer token"]
//! ```

use crate::substitution::ShortcutBounds;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Format used to parse actual timestamps in time tolerance matchers.
///
/// Written in configuration as `rfc3339`, `rfc2822`, or any other string,
/// which is taken as a chrono strftime format.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum TimeFormat {
    /// RFC 3339 (`2019-06-22T16:00:10.123Z`)
    #[default]
    Rfc3339,
    /// RFC 2822 (`Sat, 22 Jun 2019 16:00:10 +0000`)
    Rfc2822,
    /// A chrono strftime format. Without an offset the time is read as UTC.
    Custom(String),
}

impl TimeFormat {
    pub fn custom(format: impl Into<String>) -> Self {
        TimeFormat::Custom(format.into())
    }

    /// Parse a timestamp in this format.
    pub fn parse(&self, value: &str) -> Result<DateTime<FixedOffset>, String> {
        match self {
            TimeFormat::Rfc3339 => DateTime::parse_from_rfc3339(value)
                .map_err(|e| format!("parsing time {value:?} as RFC 3339: {e}")),
            TimeFormat::Rfc2822 => DateTime::parse_from_rfc2822(value)
                .map_err(|e| format!("parsing time {value:?} as RFC 2822: {e}")),
            TimeFormat::Custom(format) => DateTime::parse_from_str(value, format)
                .or_else(|_| {
                    NaiveDateTime::parse_from_str(value, format)
                        .map(|naive| naive.and_utc().fixed_offset())
                })
                .map_err(|e| format!("parsing time {value:?} as {format:?}: {e}")),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TimeFormat::Rfc3339 => "rfc3339",
            TimeFormat::Rfc2822 => "rfc2822",
            TimeFormat::Custom(format) => format,
        }
    }

    /// Render a timestamp in this format.
    pub fn format(&self, instant: &DateTime<Utc>) -> String {
        match self {
            TimeFormat::Rfc3339 => instant.to_rfc3339(),
            TimeFormat::Rfc2822 => instant.to_rfc2822(),
            TimeFormat::Custom(format) => instant.format(format).to_string(),
        }
    }
}

impl From<String> for TimeFormat {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "rfc3339" => TimeFormat::Rfc3339,
            "rfc2822" => TimeFormat::Rfc2822,
            _ => TimeFormat::Custom(value),
        }
    }
}

impl From<TimeFormat> for String {
    fn from(format: TimeFormat) -> Self {
        format.as_str().to_string()
    }
}

impl fmt::Display for TimeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How child failures of sequences and mappings are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Report every mismatching child, newline-joined.
    #[default]
    Aggregate,
    /// Stop at the first mismatching child.
    FailFast,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Default format for parsing actual values in time tolerance matchers
    #[serde(default)]
    pub time_format: TimeFormat,

    /// Decimals used when a float variable is substituted into a string.
    /// Absent means shortest round-trip representation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub float_precision: Option<usize>,

    /// Bounds of the store shortcut token (default `$name$`)
    #[serde(default = "ShortcutBounds::store_default")]
    pub store_shortcut: ShortcutBounds,

    /// Bounds of the load shortcut token (default `_name_`)
    #[serde(default = "ShortcutBounds::load_default")]
    pub load_shortcut: ShortcutBounds,

    #[serde(default)]
    pub error_policy: ErrorPolicy,

    /// Headers added to every request; test cases override them by name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub default_headers: BTreeMap<String, Vec<String>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            time_format: TimeFormat::default(),
            float_precision: None,
            store_shortcut: ShortcutBounds::store_default(),
            load_shortcut: ShortcutBounds::load_default(),
            error_policy: ErrorPolicy::default(),
            default_headers: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, anyhow::Error> {
        let config: EngineConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        for (name, bounds) in [
            ("store_shortcut", &self.store_shortcut),
            ("load_shortcut", &self.load_shortcut),
        ] {
            if bounds.prefix.is_empty() || bounds.suffix.is_empty() {
                anyhow::bail!("'{name}' prefix and suffix cannot be empty");
            }
        }

        if self.store_shortcut == self.load_shortcut {
            anyhow::bail!(
                "'store_shortcut' and 'load_shortcut' must differ, both are {}name{}",
                self.store_shortcut.prefix,
                self.store_shortcut.suffix
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.time_format, TimeFormat::Rfc3339);
        assert_eq!(config.store_shortcut, ShortcutBounds::new("$", "$"));
        assert_eq!(config.load_shortcut, ShortcutBounds::new("_", "_"));
        assert_eq!(config.error_policy, ErrorPolicy::Aggregate);
        assert!(config.float_precision.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = EngineConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
time_format: "%d/%m/%Y %H:%M:%S"
float_precision: 2
store_shortcut: { prefix: "{{", suffix: "}}" }
error_policy: fail_fast
default_headers:
  x-api-key: ["secret"]
"#;
        let config = EngineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.time_format, TimeFormat::custom("%d/%m/%Y %H:%M:%S"));
        assert_eq!(config.float_precision, Some(2));
        assert_eq!(config.store_shortcut, ShortcutBounds::new("{{", "}}"));
        assert_eq!(config.load_shortcut, ShortcutBounds::load_default());
        assert_eq!(config.error_policy, ErrorPolicy::FailFast);
        assert_eq!(
            config.default_headers.get("x-api-key"),
            Some(&vec!["secret".to_string()])
        );
    }

    #[test]
    fn test_validate_rejects_empty_bounds() {
        let yaml = "load_shortcut: { prefix: \"\", suffix: \"_\" }";
        let err = EngineConfig::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("load_shortcut"));
    }

    #[test]
    fn test_validate_rejects_identical_bounds() {
        let yaml = "store_shortcut: { prefix: \"_\", suffix: \"_\" }";
        assert!(EngineConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "time_format: RFC2822").unwrap();
        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.time_format, TimeFormat::Rfc2822);
    }

    #[test]
    fn test_time_formats() {
        let rfc3339 = TimeFormat::Rfc3339
            .parse("2019-06-22T16:00:10.123Z")
            .unwrap();
        assert_eq!(rfc3339.timestamp_millis(), 1_561_219_210_123);

        let rfc2822 = TimeFormat::Rfc2822
            .parse("Sat, 22 Jun 2019 16:00:10 +0000")
            .unwrap();
        assert_eq!(rfc2822.timestamp(), 1_561_219_210);

        let custom = TimeFormat::custom("%d/%m/%Y %H:%M:%S")
            .parse("22/06/2019 16:00:10")
            .unwrap();
        assert_eq!(custom.timestamp(), 1_561_219_210);

        let err = TimeFormat::Rfc3339.parse("hello").unwrap_err();
        assert!(err.starts_with("parsing time \"hello\" as RFC 3339"));
    }

    #[test]
    fn test_format_renders_parseable_text() {
        use chrono::TimeZone;

        let instant = Utc.with_ymd_and_hms(2019, 6, 22, 16, 0, 10).unwrap();
        let cases = [
            (TimeFormat::Rfc3339, "2019-06-22T16:00:10+00:00"),
            (TimeFormat::Rfc2822, "Sat, 22 Jun 2019 16:00:10 +0000"),
            (TimeFormat::custom("%d/%m/%Y %H:%M:%S"), "22/06/2019 16:00:10"),
        ];
        for (format, text) in cases {
            assert_eq!(format.format(&instant), text);
            assert_eq!(format.parse(text).unwrap(), instant);
        }
    }
}
