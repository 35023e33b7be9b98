//! Input ingestion.
//!
//! Two pipelines produce the same output shape: [`tabular`] for CSV/TSV text
//! and [`json`] for exported JSON. Shared field parsing lives in [`fields`],
//! header and month keywords in [`locale`], the per-row state machine in
//! [`row`].

pub mod fields;
pub mod json;
pub mod locale;
pub mod row;
pub mod tabular;

use crate::config::DEFAULT_PROCEDURE;
use crate::domain::result::Result;
use crate::domain::VisitDraft;

/// Per-run parsing options threaded through both pipelines.
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// Owner applied to every row; overrides per-row owners in JSON input.
    pub owner_uid: Option<String>,
    /// Year assumed for dates written without one.
    pub default_year: i32,
    /// Procedure used when a row names none and carries no surgery hint.
    pub default_procedure: String,
}

impl ParseContext {
    pub fn new(default_year: i32) -> Self {
        Self {
            owner_uid: None,
            default_year,
            default_procedure: DEFAULT_PROCEDURE.to_string(),
        }
    }

    pub fn with_owner(mut self, uid: impl Into<String>) -> Self {
        self.owner_uid = Some(uid.into());
        self
    }

    pub fn with_procedure(mut self, procedure: impl Into<String>) -> Self {
        self.default_procedure = procedure.into();
        self
    }
}

/// Input file format, detected or forced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Json,
}

impl InputFormat {
    pub fn name(self) -> &'static str {
        match self {
            InputFormat::Csv => "csv",
            InputFormat::Json => "json",
        }
    }
}

/// Cell separator for tabular input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Semicolon,
    Tab,
}

impl Delimiter {
    pub fn byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Semicolon => b';',
            Delimiter::Tab => b'\t',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Delimiter::Comma => "comma",
            Delimiter::Semicolon => "semicolon",
            Delimiter::Tab => "tab",
        }
    }
}

/// How the tabular pipeline read the file; surfaced in the import summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvMetadata {
    pub delimiter: Delimiter,
    pub has_header: bool,
}

/// Result of parsing one input file: accepted drafts plus one warning per
/// skipped row.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub drafts: Vec<VisitDraft>,
    pub warnings: Vec<String>,
    pub csv: Option<CsvMetadata>,
}

/// Decide the input format: an explicit choice wins, then the file
/// extension, then a content sniff that must parse as JSON to count.
pub fn detect_input_format(
    file_name: &str,
    raw_text: &str,
    forced: Option<InputFormat>,
) -> InputFormat {
    if let Some(format) = forced {
        return format;
    }

    let lower = file_name.to_lowercase();
    if lower.ends_with(".json") {
        return InputFormat::Json;
    }
    if lower.ends_with(".csv") || lower.ends_with(".tsv") {
        return InputFormat::Csv;
    }

    let trimmed = raw_text
        .strip_prefix('\u{feff}')
        .unwrap_or(raw_text)
        .trim_start();
    if (trimmed.starts_with('[') || trimmed.starts_with('{'))
        && serde_json::from_str::<serde_json::Value>(trimmed).is_ok()
    {
        return InputFormat::Json;
    }

    InputFormat::Csv
}

/// Resolve the format and run the matching pipeline.
pub fn parse_input(
    file_name: &str,
    raw_text: &str,
    ctx: &ParseContext,
    format: Option<InputFormat>,
    delimiter: Option<Delimiter>,
) -> Result<(InputFormat, ImportOutcome)> {
    let format = detect_input_format(file_name, raw_text, format);
    let outcome = match format {
        InputFormat::Json => json::parse_json(raw_text, ctx)?,
        InputFormat::Csv => tabular::parse_tabular(raw_text, ctx, delimiter)?,
    };
    Ok((format, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format_by_extension() {
        assert_eq!(
            detect_input_format("visits.JSON", "whatever", None),
            InputFormat::Json
        );
        // extension beats content
        assert_eq!(
            detect_input_format("visits.tsv", "[{\"a\": 1}]", None),
            InputFormat::Csv
        );
        assert_eq!(
            detect_input_format("visits.csv", "", None),
            InputFormat::Csv
        );
    }

    #[test]
    fn test_detect_format_forced() {
        assert_eq!(
            detect_input_format("visits.json", "", Some(InputFormat::Csv)),
            InputFormat::Csv
        );
    }

    #[test]
    fn test_detect_format_content_sniff() {
        assert_eq!(
            detect_input_format("export", "\u{feff} [{\"a\": 1}]", None),
            InputFormat::Json
        );
        // looks like JSON but does not parse
        assert_eq!(
            detect_input_format("export", "[broken", None),
            InputFormat::Csv
        );
        assert_eq!(
            detect_input_format("export", "Дата;ПІБ;Сума;%", None),
            InputFormat::Csv
        );
    }

    #[test]
    fn test_parse_input_dispatch() {
        let ctx = ParseContext::new(2026).with_owner("uid-1");

        let (format, outcome) =
            parse_input("feb.csv", "19.02;Коротін Д.С.;1150;30", &ctx, None, None).unwrap();
        assert_eq!(format, InputFormat::Csv);
        assert_eq!(outcome.drafts.len(), 1);
        assert!(outcome.csv.is_some());

        let (format, outcome) = parse_input(
            "feb.json",
            r#"[{"patientName": "Коротін Д.С.", "visitDate": "2026-02-19", "amount": 1150, "percent": 30}]"#,
            &ctx,
            None,
            None,
        )
        .unwrap();
        assert_eq!(format, InputFormat::Json);
        assert_eq!(outcome.drafts.len(), 1);
        assert!(outcome.csv.is_none());
    }
}
