//! Canned analyses over a neighbor table.
//!
//! Every analysis is a pure function of the table plus its parameters and
//! returns an [`AnalysisReport`]; the table itself is never modified.

use std::collections::HashMap;

use regex::{Regex, RegexBuilder};
use thiserror::Error;

use crate::chart::Histogram;
use crate::explorer::{NeighborRow, NeighborTable};

const LENGTH_BINS: usize = 20;
const COUNT_BINS: usize = 10;
/// Compiled-size ceiling for a keyword matcher.
const KEYWORD_SIZE_LIMIT: usize = 1 << 20;

/// Inclusive `[min, max]` filter on a derived length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthRange {
    min: usize,
    max: usize,
}

impl LengthRange {
    /// Validates a user-entered range: both bounds non-negative and `min <= max`.
    pub fn new(min: i64, max: i64) -> Result<Self, RangeError> {
        if min < 0 || max < 0 {
            return Err(RangeError::Negative);
        }
        if min > max {
            return Err(RangeError::Inverted { min, max });
        }
        Ok(Self {
            min: min as usize,
            max: max as usize,
        })
    }

    /// Lower bound.
    pub fn min(&self) -> usize {
        self.min
    }

    /// Upper bound.
    pub fn max(&self) -> usize {
        self.max
    }

    /// True when `value` lies within both bounds.
    pub fn contains(&self, value: usize) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Invalid range input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    /// Input was not an integer.
    #[error("'{0}' is not a whole number")]
    NotANumber(String),
    /// A bound was below zero.
    #[error("lengths cannot be negative")]
    Negative,
    /// Minimum exceeded maximum.
    #[error("minimum {min} is greater than maximum {max}")]
    Inverted {
        /// Entered minimum.
        min: i64,
        /// Entered maximum.
        max: i64,
    },
}

/// Keyword that cannot be turned into a matcher.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeywordError {
    /// The compiled matcher would exceed its size ceiling.
    #[error("keyword is too long to search for")]
    TooLong,
    /// Any other pattern failure.
    #[error("keyword cannot be searched for: {0}")]
    Invalid(String),
}

impl From<regex::Error> for KeywordError {
    fn from(err: regex::Error) -> Self {
        match err {
            regex::Error::CompiledTooBig(_) => KeywordError::TooLong,
            other => KeywordError::Invalid(other.to_string()),
        }
    }
}

/// Parses one range bound.
pub fn parse_bound(input: &str) -> Result<i64, RangeError> {
    input
        .trim()
        .parse::<i64>()
        .map_err(|_| RangeError::NotANumber(input.trim().to_string()))
}

/// Text column an analysis reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    /// Result title.
    Title,
    /// Meta description.
    MetaDescription,
    /// Result URL.
    Link,
}

impl TextField {
    fn of(self, row: &NeighborRow) -> &str {
        match self {
            Self::Title => &row.title,
            Self::MetaDescription => &row.meta_description,
            Self::Link => &row.link,
        }
    }
}

/// One printed row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    /// Record id.
    pub id: String,
    /// Cells in column order (id first).
    pub cells: Vec<String>,
    /// True for the active query record.
    pub highlighted: bool,
}

/// Printed table plus chart for one analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    /// Line printed above the rows.
    pub heading: String,
    /// Column names, id first.
    pub columns: Vec<&'static str>,
    /// Rows that passed the analysis filter.
    pub rows: Vec<ReportRow>,
    /// Distribution of the derived column over the whole table.
    pub chart: Histogram,
}

fn report_row(table: &NeighborTable, row: &NeighborRow, rest: Vec<String>) -> ReportRow {
    let mut cells = Vec::with_capacity(rest.len() + 1);
    cells.push(row.id.clone());
    cells.extend(rest);
    ReportRow {
        id: row.id.clone(),
        cells,
        highlighted: table.is_query(&row.id),
    }
}

/// Character count, matching what a reader would count on screen.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Case-insensitive whole-word matcher for a literal keyword.
pub fn keyword_matcher(keyword: &str) -> Result<Regex, KeywordError> {
    let pattern = format!(r"\b{}\b", regex::escape(keyword));
    let matcher = RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .size_limit(KEYWORD_SIZE_LIMIT)
        .build()?;
    Ok(matcher)
}

/// Number of whole-word occurrences of `keyword` in `text`.
pub fn count_keyword(text: &str, keyword: &str) -> Result<usize, KeywordError> {
    Ok(keyword_matcher(keyword)?.find_iter(text).count())
}

/// Number of query parameters in `link`: `&`-separated pieces after the first `?`.
///
/// Only the segment up to a second `?` counts; a bare `?` counts as one.
pub fn url_param_count(link: &str) -> usize {
    match link.split('?').nth(1) {
        Some(query) => query.split('&').count(),
        None => 0,
    }
}

fn length_analysis(
    table: &NeighborTable,
    range: LengthRange,
    field: TextField,
    column: &'static str,
    subject: &str,
    chart_title: &str,
    x_label: &str,
) -> AnalysisReport {
    let lengths: Vec<usize> = table.rows().iter().map(|r| char_len(field.of(r))).collect();
    let rows = table
        .rows()
        .iter()
        .zip(&lengths)
        .filter(|(_, len)| range.contains(**len))
        .map(|(row, len)| report_row(table, row, vec![len.to_string(), field.of(row).to_string()]))
        .collect();
    AnalysisReport {
        heading: format!(
            "{subject} with length between {} and {} characters:",
            range.min, range.max
        ),
        columns: vec!["id", column, field_column(field)],
        rows,
        chart: Histogram::new(
            chart_title,
            x_label,
            "Number of Entries",
            LENGTH_BINS,
            lengths.into_iter().map(|l| l as f64).collect(),
        ),
    }
}

fn field_column(field: TextField) -> &'static str {
    match field {
        TextField::Title => "title",
        TextField::MetaDescription => "meta_description",
        TextField::Link => "link",
    }
}

fn field_label(field: TextField) -> &'static str {
    match field {
        TextField::Title => "title",
        TextField::MetaDescription => "meta description",
        TextField::Link => "URL",
    }
}

/// Meta description lengths within `range`.
pub fn meta_description_length(table: &NeighborTable, range: LengthRange) -> AnalysisReport {
    length_analysis(
        table,
        range,
        TextField::MetaDescription,
        "meta_desc_length",
        "Meta descriptions",
        "Meta Description Lengths",
        "Meta Description Length (character count)",
    )
}

/// Title lengths within `range`.
pub fn title_length(table: &NeighborTable, range: LengthRange) -> AnalysisReport {
    length_analysis(
        table,
        range,
        TextField::Title,
        "title_len",
        "Titles",
        "Title Lengths",
        "Title Length (character count)",
    )
}

/// URL lengths within `range`.
pub fn url_length(table: &NeighborTable, range: LengthRange) -> AnalysisReport {
    length_analysis(
        table,
        range,
        TextField::Link,
        "url_length",
        "URLs",
        "URL Lengths",
        "URL Length (character count)",
    )
}

/// Whole-word keyword occurrences in the title or meta description of every row.
pub fn keyword_occurrences(
    table: &NeighborTable,
    field: TextField,
    keyword: &str,
) -> Result<AnalysisReport, KeywordError> {
    let matcher = keyword_matcher(keyword)?;
    let counts: Vec<usize> = table
        .rows()
        .iter()
        .map(|r| matcher.find_iter(field.of(r)).count())
        .collect();
    let rows = table
        .rows()
        .iter()
        .zip(&counts)
        .map(|(row, count)| {
            report_row(table, row, vec![count.to_string(), field.of(row).to_string()])
        })
        .collect();
    let label = field_label(field);
    Ok(AnalysisReport {
        heading: format!("Number of occurrences of the keyword '{keyword}' in the {label}:"),
        columns: vec!["id", "keyword_count", field_column(field)],
        rows,
        chart: Histogram::new(
            format!("Occurrences of the Keyword '{keyword}' in the {}", title_case(label)),
            "Number of Occurrences",
            "Number of Entries",
            COUNT_BINS,
            counts.into_iter().map(|c| c as f64).collect(),
        ),
    })
}

fn title_case(label: &str) -> String {
    label
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rows whose exact (case-sensitive) title appears at least twice in the table.
pub fn duplicate_titles(table: &NeighborTable) -> AnalysisReport {
    let mut frequency: HashMap<&str, usize> = HashMap::new();
    for row in table.rows() {
        *frequency.entry(row.title.as_str()).or_default() += 1;
    }
    let rows = table
        .rows()
        .iter()
        .filter(|row| frequency[row.title.as_str()] >= 2)
        .map(|row| {
            report_row(
                table,
                row,
                vec![
                    row.title.clone(),
                    row.link.clone(),
                    row.meta_description.clone(),
                ],
            )
        })
        .collect();
    let mut repeated: Vec<f64> = frequency
        .values()
        .filter(|count| **count > 1)
        .map(|count| *count as f64)
        .collect();
    repeated.sort_by(f64::total_cmp);
    AnalysisReport {
        heading: "Duplicate Titles:".to_string(),
        columns: vec!["id", "title", "link", "meta_description"],
        rows,
        chart: Histogram::new(
            "Number of Duplicate Titles",
            "Number of Duplicates",
            "Number of Titles",
            COUNT_BINS,
            repeated,
        ),
    }
}

/// Query parameter presence and count per URL.
pub fn url_parameters(table: &NeighborTable) -> AnalysisReport {
    let counts: Vec<usize> = table.rows().iter().map(|r| url_param_count(&r.link)).collect();
    let rows = table
        .rows()
        .iter()
        .zip(&counts)
        .map(|(row, count)| {
            report_row(
                table,
                row,
                vec![
                    row.link.contains('?').to_string(),
                    count.to_string(),
                    row.link.clone(),
                ],
            )
        })
        .collect();
    AnalysisReport {
        heading: "URLs with Parameters:".to_string(),
        columns: vec!["id", "has_params", "params_count", "link"],
        rows,
        chart: Histogram::new(
            "Parameters in URLs",
            "Number of Parameters",
            "Number of URLs",
            COUNT_BINS,
            counts.into_iter().map(|c| c as f64).collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(id: &str, title: &str, link: &str, meta: &str) -> NeighborRow {
        NeighborRow {
            id: id.to_string(),
            title: title.to_string(),
            link: link.to_string(),
            meta_description: meta.to_string(),
            distance: None,
        }
    }

    fn ids(report: &AnalysisReport) -> Vec<&str> {
        report.rows.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn keyword_is_whole_word_and_case_insensitive() {
        assert_eq!(count_keyword("Cat!", "cat"), Ok(1));
        assert_eq!(count_keyword("category", "cat"), Ok(0));
        assert_eq!(count_keyword("CAT cat, Cat. cats", "cat"), Ok(3));
    }

    #[test]
    fn keyword_is_literal() {
        assert_eq!(count_keyword("price a.b and axb", "a.b"), Ok(1));
        assert_eq!(count_keyword("wid(gets) here", "wid(gets"), Ok(1));
    }

    #[test]
    fn oversized_keyword_is_rejected() {
        let keyword = "k".repeat(200_000);
        assert_eq!(count_keyword("k", &keyword), Err(KeywordError::TooLong));
        let table = NeighborTable::new("1", vec![row("1", "k", "", "k")]);
        assert!(keyword_occurrences(&table, TextField::Title, &keyword).is_err());
    }

    #[test]
    fn range_validation() {
        assert_eq!(LengthRange::new(-1, 5), Err(RangeError::Negative));
        assert_eq!(
            LengthRange::new(6, 5),
            Err(RangeError::Inverted { min: 6, max: 5 })
        );
        assert!(LengthRange::new(5, 5).is_ok());
        assert_eq!(parse_bound(" 12 "), Ok(12));
        assert!(matches!(parse_bound("ten"), Err(RangeError::NotANumber(_))));
    }

    #[test]
    fn length_filter_is_inclusive() {
        let table = NeighborTable::new(
            "b",
            vec![
                row("a", "abcd", "", ""),
                row("b", "abcde", "", ""),
                row("c", "abcdefghij", "", ""),
                row("d", "abcdefghijk", "", ""),
            ],
        );
        let report = title_length(&table, LengthRange::new(5, 10).unwrap());
        assert_eq!(ids(&report), vec!["b", "c"]);
        assert!(report.rows[0].highlighted);
        assert!(!report.rows[1].highlighted);
        assert_eq!(report.rows[0].cells, vec!["b", "5", "abcde"]);
        // the chart covers the unfiltered table
        assert_eq!(report.chart.values.len(), 4);
    }

    #[test]
    fn lengths_count_characters() {
        assert_eq!(char_len("zażółć"), 6);
    }

    #[test]
    fn duplicates_require_two_exact_matches() {
        let table = NeighborTable::new(
            "x",
            vec![
                row("1", "Widgets", "", ""),
                row("2", "widgets", "", ""),
                row("3", "Widgets", "", ""),
                row("4", "Gadgets", "", ""),
                row("5", "Gadgets", "", ""),
                row("6", "Gadgets", "", ""),
                row("7", "Solo", "", ""),
            ],
        );
        let report = duplicate_titles(&table);
        assert_eq!(ids(&report), vec!["1", "3", "4", "5", "6"]);
        assert_eq!(report.chart.values, vec![2.0, 3.0]);
    }

    #[test]
    fn param_counts() {
        assert_eq!(url_param_count("https://a.test/path"), 0);
        assert_eq!(url_param_count("https://a.test/?q=1"), 1);
        assert_eq!(url_param_count("https://a.test/?q=1&b=2&c"), 3);
        assert_eq!(url_param_count("https://a.test/?"), 1);
        assert_eq!(url_param_count("https://a.test/?a=1&b=2?c=3&d"), 2);
    }

    #[test]
    fn parameter_report_columns() {
        let table = NeighborTable::new("1", vec![row("1", "", "https://a.test/?x=1&y=2", "")]);
        let report = url_parameters(&table);
        assert_eq!(report.columns, vec!["id", "has_params", "params_count", "link"]);
        assert_eq!(
            report.rows[0].cells,
            vec!["1", "true", "2", "https://a.test/?x=1&y=2"]
        );
    }

    #[test]
    fn keyword_report_counts_every_row() {
        let table = NeighborTable::new(
            "2",
            vec![
                row("1", "", "", "Blue widgets and red widgets"),
                row("2", "", "", "Widget"),
            ],
        );
        let report = keyword_occurrences(&table, TextField::MetaDescription, "widgets").unwrap();
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].cells[1], "2");
        assert_eq!(report.rows[1].cells[1], "0");
        assert_eq!(
            report.chart.title,
            "Occurrences of the Keyword 'widgets' in the Meta Description"
        );
    }

    #[test]
    fn title_keyword_reads_titles_only() {
        let table = NeighborTable::new(
            "1",
            vec![
                row("1", "Widgets for widgets", "", "no match here"),
                row("2", "Gadgets", "", "widgets widgets widgets"),
            ],
        );
        let report = keyword_occurrences(&table, TextField::Title, "WIDGETS").unwrap();
        assert_eq!(report.columns, vec!["id", "keyword_count", "title"]);
        assert_eq!(report.rows[0].cells, vec!["1", "2", "Widgets for widgets"]);
        assert_eq!(report.rows[1].cells, vec!["2", "0", "Gadgets"]);
        assert!(report.heading.ends_with("in the title:"));
    }

    #[test]
    fn meta_description_length_filters_on_description() {
        let table = NeighborTable::new(
            "2",
            vec![
                row("1", "a much longer title", "", "short"),
                row("2", "t", "", "fourteen chars"),
            ],
        );
        let report = meta_description_length(&table, LengthRange::new(10, 20).unwrap());
        assert_eq!(report.columns, vec!["id", "meta_desc_length", "meta_description"]);
        assert_eq!(ids(&report), vec!["2"]);
        assert_eq!(report.rows[0].cells, vec!["2", "14", "fourteen chars"]);
        assert!(report.rows[0].highlighted);
    }
}
