//! Locale keyword tables for the tabular pipeline
//!
//! Everything language-specific about header detection, column mapping,
//! month-name dates and meta/total rows lives in these tables. Adding a
//! language means adding one `LocaleKeywords` entry; the pipelines never
//! branch on a particular language.

/// Keyword sets for one supported input language.
///
/// Header/column keywords match by substring against normalized cell text;
/// meta-row labels match by equality or prefix against the trimmed,
/// lowercased name cell.
pub struct LocaleKeywords {
    pub code: &'static str,
    pub date: &'static [&'static str],
    pub patient: &'static [&'static str],
    pub amount: &'static [&'static str],
    pub percent_or_income: &'static [&'static str],
    pub procedure: &'static [&'static str],
    pub notes: &'static [&'static str],
    /// Month aliases, index 0 = January. Abbreviations and full names,
    /// already lowercase with punctuation stripped.
    pub months: [&'static [&'static str]; 12],
    pub meta_exact: &'static [&'static str],
    pub meta_prefix: &'static [&'static str],
    /// Substrings that mark a patient-name annotation as surgical.
    pub surgery: &'static [&'static str],
}

static UKRAINIAN: LocaleKeywords = LocaleKeywords {
    code: "uk",
    date: &["дата"],
    patient: &["піб", "пацієн"],
    amount: &["сума"],
    percent_or_income: &["%", "відсот", "процент", "дохід"],
    procedure: &["послуга", "процедур"],
    notes: &["приміт", "коментар"],
    months: [
        &["січ", "січень"],
        &["лют", "лютий"],
        &["бер", "берез", "березень"],
        &["квіт", "квітень"],
        &["трав", "травень"],
        &["черв", "червень"],
        &["лип", "липень"],
        &["серп", "серпень"],
        &["вер", "верес", "вересень"],
        &["жовт", "жовтень"],
        &["лист", "листопад"],
        &["груд", "грудень"],
    ],
    meta_exact: &["піб", "дата", "сума"],
    meta_prefix: &["зараховано", "всього", "итого", "разом"],
    surgery: &["операц"],
};

static ENGLISH: LocaleKeywords = LocaleKeywords {
    code: "en",
    date: &["date"],
    patient: &["patient"],
    amount: &["amount"],
    percent_or_income: &["%", "percent", "income"],
    procedure: &["procedure"],
    notes: &["note"],
    months: [
        &["jan", "january"],
        &["feb", "february"],
        &["mar", "march"],
        &["apr", "april"],
        &["may"],
        &["jun", "june"],
        &["jul", "july"],
        &["aug", "august"],
        &["sep", "sept", "september"],
        &["oct", "october"],
        &["nov", "november"],
        &["dec", "december"],
    ],
    meta_exact: &["patient", "date", "amount"],
    meta_prefix: &["total", "credited"],
    surgery: &["surger"],
};

/// All supported input languages, in match order.
pub static LOCALES: &[&LocaleKeywords] = &[&UKRAINIAN, &ENGLISH];

/// Normalize a header cell for keyword matching: lowercase, non-breaking
/// spaces, underscores and dots become spaces, whitespace collapsed.
pub fn normalize_header(value: &str) -> String {
    let lowered = value.to_lowercase();
    let spaced: String = lowered
        .chars()
        .map(|c| match c {
            '\u{a0}' | '_' | '.' => ' ',
            other => other,
        })
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn any_keyword_matches(haystack: &str, pick: impl Fn(&LocaleKeywords) -> &'static [&'static str]) -> bool {
    LOCALES
        .iter()
        .flat_map(|locale| pick(locale).iter())
        .any(|keyword| haystack.contains(keyword))
}

/// True if the cells look like a header row: normalized text must contain a
/// date keyword, a patient keyword and an amount keyword (any language).
pub fn looks_like_header(cells: &[String]) -> bool {
    let joined = cells
        .iter()
        .map(|cell| normalize_header(cell))
        .collect::<Vec<_>>()
        .join("|");

    any_keyword_matches(&joined, |l| l.date)
        && any_keyword_matches(&joined, |l| l.patient)
        && any_keyword_matches(&joined, |l| l.amount)
}

/// Fields a header cell can claim, in resolution priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnField {
    Date,
    PatientName,
    Amount,
    PercentOrIncome,
    ProcedureName,
    Notes,
}

impl ColumnField {
    pub(crate) fn keywords(self, locale: &LocaleKeywords) -> &'static [&'static str] {
        match self {
            ColumnField::Date => locale.date,
            ColumnField::PatientName => locale.patient,
            ColumnField::Amount => locale.amount,
            ColumnField::PercentOrIncome => locale.percent_or_income,
            ColumnField::ProcedureName => locale.procedure,
            ColumnField::Notes => locale.notes,
        }
    }
}

/// True if a normalized header cell matches the given field in any language.
pub fn cell_matches_field(normalized_cell: &str, field: ColumnField) -> bool {
    any_keyword_matches(normalized_cell, |locale| field.keywords(locale))
}

/// True for spreadsheet noise rows: repeated header labels and
/// total/subtotal markers ("Всього за місяць", "Total", ...).
pub fn is_meta_row_name(value: &str) -> bool {
    let normalized = value.trim().to_lowercase();
    if normalized.is_empty() {
        return false;
    }

    LOCALES.iter().any(|locale| {
        locale.meta_exact.iter().any(|label| normalized == *label)
            || locale.meta_prefix.iter().any(|label| normalized.starts_with(label))
    })
}

/// Strip a month token down to letters: lowercase, dots dropped, anything
/// outside the Latin and Ukrainian Cyrillic alphabets removed.
pub fn normalize_month_token(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .filter(|c| {
            c.is_ascii_lowercase() || ('а'..='я').contains(c) || matches!(c, 'і' | 'ї' | 'є' | 'ґ')
        })
        .collect()
}

/// Resolve a month-name token to 1..=12 across all language tables.
pub fn resolve_month(token: &str) -> Option<u32> {
    let normalized = normalize_month_token(token);
    if normalized.is_empty() {
        return None;
    }

    for locale in LOCALES {
        for (index, aliases) in locale.months.iter().enumerate() {
            if aliases.iter().any(|alias| *alias == normalized) {
                return Some(index as u32 + 1);
            }
        }
    }

    None
}

/// Alternation of every surgery keyword, for embedding into regexes.
pub(crate) fn surgery_pattern() -> String {
    LOCALES
        .iter()
        .flat_map(|locale| locale.surgery.iter())
        .cloned()
        .collect::<Vec<_>>()
        .join("|")
}
