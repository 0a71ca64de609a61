//! Core types for the search box

use crate::error::{SearchError, SearchResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Static icon reference attached to every suggestion row
pub const ICON_RESOURCE: &str = "res://searchbox/drawable/magnifying_glass";

/// A (language, country) pair as reported by the host environment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locale {
    /// ISO 639 language code, e.g. `en`, `zh`
    pub language: String,
    /// ISO 3166 country code, e.g. `US`, `TW`; may be empty
    pub country: String,
}

impl Locale {
    pub fn new(language: &str, country: &str) -> Self {
        Self {
            language: language.to_string(),
            country: country.to_string(),
        }
    }

    /// Parse a POSIX (`en_US.UTF-8`) or dash-separated (`pt-BR`) locale name.
    ///
    /// Encoding and modifier suffixes are dropped and the language is
    /// lowercased. Returns `None` for empty names and the `C`/`POSIX`
    /// pseudo-locales.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name
            .split(['.', '@'])
            .next()
            .unwrap_or_default()
            .trim();

        if name.is_empty() || name == "C" || name == "POSIX" {
            return None;
        }

        let mut parts = name.splitn(2, ['_', '-']);
        let language = parts.next()?.to_lowercase();
        if language.is_empty() || !language.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        let country = parts.next().unwrap_or_default();

        Some(Self {
            language,
            country: country.to_string(),
        })
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::new("en", "US")
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.country.is_empty() {
            write!(f, "{}", self.language)
        } else {
            write!(f, "{}_{}", self.language, self.country)
        }
    }
}

/// Debug options for verbose request/response logging
#[derive(Debug, Clone, Default)]
pub struct DebugOptions {
    /// Enable verbose logging
    pub enabled: bool,
    /// Log request details (URLs, methods)
    pub log_requests: bool,
    /// Log raw response bodies
    pub log_responses: bool,
}

/// Columns a suggestion row can expose to a host framework
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    Text1,
    Text2,
    Icon1,
    Icon2,
    Query,
}

impl Column {
    pub fn name(&self) -> &'static str {
        match self {
            Column::Id => "_id",
            Column::Text1 => "suggest_text_1",
            Column::Text2 => "suggest_text_2",
            Column::Icon1 => "suggest_icon_1",
            Column::Icon2 => "suggest_icon_2",
            Column::Query => "suggest_intent_query",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Column set advertised by a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnLayout {
    /// `_id`, text 1, text 2, query
    Plain,
    /// Plain columns plus the two icon columns
    #[default]
    WithIcons,
}

impl ColumnLayout {
    pub fn columns(&self) -> &'static [Column] {
        match self {
            ColumnLayout::Plain => &[Column::Id, Column::Text1, Column::Text2, Column::Query],
            ColumnLayout::WithIcons => &[
                Column::Id,
                Column::Text1,
                Column::Text2,
                Column::Icon1,
                Column::Icon2,
                Column::Query,
            ],
        }
    }

    fn contains(&self, column: Column) -> bool {
        self.columns().contains(&column)
    }
}

/// One autocomplete suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestionRow {
    /// Zero-based position in the result set
    pub id: usize,
    /// Suggested query text
    pub text: String,
    /// Approximate result count, e.g. "12,000 results"; display only
    pub popularity: String,
    /// Static icon reference
    pub icon: &'static str,
    /// Query to submit when the row is picked (same as `text`)
    pub query: String,
}

impl SuggestionRow {
    pub fn new(id: usize, text: &str, popularity: &str) -> Self {
        Self {
            id,
            text: text.to_string(),
            popularity: popularity.to_string(),
            icon: ICON_RESOURCE,
            query: text.to_string(),
        }
    }
}

/// Ordered suggestions returned by one lookup
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SuggestionResultSet {
    rows: Vec<SuggestionRow>,
    layout: ColumnLayout,
}

impl SuggestionResultSet {
    pub fn new(rows: Vec<SuggestionRow>, layout: ColumnLayout) -> Self {
        Self { rows, layout }
    }

    pub fn empty(layout: ColumnLayout) -> Self {
        Self::new(Vec::new(), layout)
    }

    /// Build rows from the two parallel arrays of a suggestion response.
    ///
    /// Row count follows `suggestions`; a popularity entry missing from a
    /// shorter array becomes an empty string.
    pub fn from_parallel(
        suggestions: &[String],
        popularity: &[String],
        layout: ColumnLayout,
    ) -> Self {
        let rows = suggestions
            .iter()
            .enumerate()
            .map(|(id, text)| {
                let popularity = popularity.get(id).map(String::as_str).unwrap_or_default();
                SuggestionRow::new(id, text, popularity)
            })
            .collect();

        Self::new(rows, layout)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SuggestionRow> {
        self.rows.iter()
    }

    pub fn rows(&self) -> &[SuggestionRow] {
        &self.rows
    }

    pub fn layout(&self) -> ColumnLayout {
        self.layout
    }

    pub fn columns(&self) -> &'static [Column] {
        self.layout.columns()
    }

    /// Position of a column by its name, if this layout has it
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns().iter().position(|c| c.name() == name)
    }

    pub fn row(&self, index: usize) -> SearchResult<&SuggestionRow> {
        self.rows.get(index).ok_or(SearchError::RowOutOfRange {
            index,
            len: self.rows.len(),
        })
    }

    /// Integer access; only `_id` carries one.
    pub fn get_long(&self, index: usize, column: Column) -> SearchResult<i64> {
        let row = self.row(index)?;
        match self.check_column(column, "long")? {
            Column::Id => Ok(row.id as i64),
            other => Err(unsupported(other, "long")),
        }
    }

    /// Text access. The second icon column exists but is always empty.
    pub fn get_string(&self, index: usize, column: Column) -> SearchResult<Option<&str>> {
        let row = self.row(index)?;
        match self.check_column(column, "string")? {
            Column::Text1 => Ok(Some(row.text.as_str())),
            Column::Text2 => Ok(Some(row.popularity.as_str())),
            Column::Query => Ok(Some(row.query.as_str())),
            Column::Icon1 => Ok(Some(row.icon)),
            Column::Icon2 => Ok(None),
            Column::Id => Err(unsupported(Column::Id, "string")),
        }
    }

    /// Floating point access is never supported.
    pub fn get_double(&self, index: usize, column: Column) -> SearchResult<f64> {
        self.row(index)?;
        Err(unsupported(column, "double"))
    }

    /// Null checks are never supported.
    pub fn is_null(&self, index: usize, column: Column) -> SearchResult<bool> {
        self.row(index)?;
        Err(unsupported(column, "null check"))
    }

    fn check_column(&self, column: Column, accessor: &'static str) -> SearchResult<Column> {
        if self.layout.contains(column) {
            Ok(column)
        } else {
            Err(unsupported(column, accessor))
        }
    }
}

impl<'a> IntoIterator for &'a SuggestionResultSet {
    type Item = &'a SuggestionRow;
    type IntoIter = std::slice::Iter<'a, SuggestionRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

fn unsupported(column: Column, accessor: &'static str) -> SearchError {
    SearchError::UnsupportedColumn {
        column: column.name().to_string(),
        accessor,
    }
}
