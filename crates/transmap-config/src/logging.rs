//! Output formats for mapper log records.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How `transmap` renders its `tracing` events.
///
/// Each format accepts one alias so operators can write
/// `TRANSMAP_LOG_FORMAT=structured` or `--log-format text`.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event with flattened fields.
    #[default]
    #[serde(alias = "structured")]
    #[strum(to_string = "json", serialize = "structured")]
    Json,
    /// Single-line text for terminals.
    #[serde(alias = "text")]
    #[strum(to_string = "compact", serialize = "text")]
    Compact,
}

impl LogFormat {
    /// Returns `true` for machine-readable output.
    #[must_use]
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::json("json", LogFormat::Json)]
    #[case::structured_alias("structured", LogFormat::Json)]
    #[case::compact("compact", LogFormat::Compact)]
    #[case::text_alias("TEXT", LogFormat::Compact)]
    #[case::mixed_case("Compact", LogFormat::Compact)]
    fn parses_formats_and_aliases(#[case] input: &str, #[case] expected: LogFormat) {
        assert_eq!(LogFormat::from_str(input).expect("parse format"), expected);
    }

    #[rstest]
    #[case(LogFormat::Json, "json")]
    #[case(LogFormat::Compact, "compact")]
    fn displays_canonical_name(#[case] format: LogFormat, #[case] expected: &str) {
        assert_eq!(format.to_string(), expected);
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(LogFormat::from_str("yaml").is_err());
    }
}
