//! FILENAME: core/engine/src/search.rs
//! PURPOSE: Global free-text search across every field of a row.
//! CONTEXT: Whitespace separates OR-groups and commas separate AND-terms inside
//! a group: "john doe" finds rows mentioning john or doe, "john,doe" finds rows
//! mentioning both. Terms match as case-insensitive substrings of the row slug.

use crate::column::ColumnDef;
use crate::value::Row;
use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Turns whitespace runs into the `;` group separator.
pub fn normalize_query(query: &str) -> String {
    WHITESPACE_RUN.replace_all(query.trim(), ";").into_owned()
}

/// Parsed global search: OR over groups, AND over the terms of a group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    groups: Vec<Vec<String>>,
}

impl SearchQuery {
    pub fn parse(query: &str) -> Self {
        let groups = normalize_query(query)
            .split(';')
            .map(|group| {
                group
                    .split(',')
                    .map(|term| term.trim().to_lowercase())
                    .filter(|term| !term.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|terms| !terms.is_empty())
            .collect();
        SearchQuery { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn groups(&self) -> &[Vec<String>] {
        &self.groups
    }

    /// Tests an already-lowercased slug.
    pub fn matches_slug(&self, slug: &str) -> bool {
        self.is_empty()
            || self
                .groups
                .iter()
                .any(|terms| terms.iter().all(|term| slug.contains(term.as_str())))
    }

    pub fn matches_row(&self, row: &Row, columns: &[ColumnDef]) -> bool {
        self.is_empty() || self.matches_slug(&row_slug(row, columns))
    }
}

/// Every value of the row joined by spaces, followed by the resolved labels of
/// option-mapped columns, lowercased.
pub fn row_slug(row: &Row, columns: &[ColumnDef]) -> String {
    let mut parts: Vec<String> = row
        .values
        .values()
        .filter(|v| !v.is_null())
        .map(|v| v.display())
        .collect();
    for column in columns.iter().filter(|c| !c.options_map.is_empty()) {
        if let Some(label) = column.options_map.get(&row.get(&column.field).key()) {
            parts.push(label.clone());
        }
    }
    parts.join(" ").to_lowercase()
}
