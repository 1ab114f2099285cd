//! FILENAME: core/engine/src/template.rs
//! PURPOSE: Declarative filter templates for lists outside the grid.
//! CONTEXT: A template holds at most one predicate per field and no filter
//! ids. The predicates share their semantics with the grid filters in
//! `filter.rs` (permissive numbers, open-ended ranges, trimmed keys), so a
//! side panel and the grid agree on what a row matches.

use crate::dates::parse_date;
use crate::filter::{
    self, BoolOp, DateOp, FkSelection, NumberOp, Range, TextOp,
};
use crate::search::SearchQuery;
use crate::value::{Row, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// One field's predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TemplateFilter {
    /// Search grammar (space = OR, comma = AND) over the field's text.
    Slug { query: String },
    /// Value is one of `values`; empty selects everything.
    Select { values: Vec<String> },
    /// Include and exclude sets, as for foreign keys.
    TransistorSelect {
        #[serde(default)]
        include: Vec<String>,
        #[serde(default)]
        exclude: Vec<String>,
    },
    /// `None` accepts any value.
    Bool { value: Option<bool> },
    Number { comparison: Comparison, value: Value },
    /// Same calendar day.
    Date { value: Value },
    /// `empty: true` keeps blank values, `false` keeps the rest.
    NonValue { empty: bool },
    Range {
        #[serde(default)]
        min: Value,
        #[serde(default)]
        max: Value,
    },
    DateRange {
        #[serde(default)]
        from: Value,
        #[serde(default)]
        to: Value,
    },
}

/// field -> predicate
pub type FilterTemplate = BTreeMap<String, TemplateFilter>;

// ============================================================================
// PREDICATES
// ============================================================================

pub fn slug_matches(value: &Value, query: &str) -> bool {
    let query = SearchQuery::parse(query);
    query.is_empty() || query.matches_slug(&value.display().to_lowercase())
}

pub fn select_matches(value: &Value, values: &[String]) -> bool {
    filter::text_matches(value, &TextOp::MultiSelect(values.to_vec()))
}

pub fn transistor_select_matches(value: &Value, include: &[String], exclude: &[String]) -> bool {
    let selection = FkSelection { include: include.to_vec(), exclude: exclude.to_vec() };
    filter::fk_matches(value, &selection)
}

pub fn bool_matches(value: &Value, expected: Option<bool>) -> bool {
    match expected {
        None => true,
        Some(true) => filter::bool_matches(value, &BoolOp::IsTrue),
        Some(false) => filter::bool_matches(value, &BoolOp::IsFalse),
    }
}

pub fn number_matches(value: &Value, comparison: Comparison, operand: &Value) -> bool {
    let operand = operand.clone();
    let op = match comparison {
        Comparison::Eq => NumberOp::Equals(operand),
        Comparison::Ne => NumberOp::NotEquals(operand),
        Comparison::Gt => NumberOp::Gt(operand),
        Comparison::Gte => NumberOp::Gte(operand),
        Comparison::Lt => NumberOp::Lt(operand),
        Comparison::Lte => NumberOp::Lte(operand),
    };
    filter::number_matches(value, &op)
}

/// An unparsable operand is inactive; an unparsable row date fails.
pub fn date_matches(value: &Value, on: &Value) -> bool {
    match parse_date(on) {
        None => true,
        Some(day) => parse_date(value) == Some(day),
    }
}

pub fn non_value_matches(value: &Value, empty: bool) -> bool {
    value.is_blank() == empty
}

pub fn range_matches(value: &Value, min: &Value, max: &Value) -> bool {
    filter::number_matches(value, &NumberOp::Between(Range { min: min.clone(), max: max.clone() }))
}

pub fn date_range_matches(value: &Value, from: &Value, to: &Value) -> bool {
    let range = Range { min: from.clone(), max: to.clone() };
    // Today is irrelevant for `between`.
    filter::date_matches(value, &DateOp::Between(range), chrono::NaiveDate::MIN)
}

// ============================================================================
// TEMPLATE EVALUATION
// ============================================================================

pub fn template_filter_matches(value: &Value, predicate: &TemplateFilter) -> bool {
    match predicate {
        TemplateFilter::Slug { query } => slug_matches(value, query),
        TemplateFilter::Select { values } => select_matches(value, values),
        TemplateFilter::TransistorSelect { include, exclude } => {
            transistor_select_matches(value, include, exclude)
        }
        TemplateFilter::Bool { value: expected } => bool_matches(value, *expected),
        TemplateFilter::Number { comparison, value: operand } => {
            number_matches(value, *comparison, operand)
        }
        TemplateFilter::Date { value: on } => date_matches(value, on),
        TemplateFilter::NonValue { empty } => non_value_matches(value, *empty),
        TemplateFilter::Range { min, max } => range_matches(value, min, max),
        TemplateFilter::DateRange { from, to } => date_range_matches(value, from, to),
    }
}

pub fn matches_template(row: &Row, template: &FilterTemplate) -> bool {
    template
        .iter()
        .all(|(field, predicate)| template_filter_matches(row.get(field), predicate))
}

/// Rows passing every predicate, in input order.
pub fn apply_template<'a>(rows: &'a [Row], template: &FilterTemplate) -> Vec<&'a Row> {
    rows.iter().filter(|row| matches_template(row, template)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> Vec<Row> {
        vec![
            Row::new(1).with("name", "Ann Lee").with("age", 31).with("team", "red").with("since", "2020-01-10"),
            Row::new(2).with("name", "Bob Ray").with("age", "n/a").with("team", "blue").with("since", "2022-06-01"),
            Row::new(3).with("name", "Cyd Ng").with("age", 19).with("team", "").with("since", "2024-03-05"),
        ]
    }

    fn ids(rows: &[&Row]) -> Vec<String> {
        rows.iter().map(|r| r.id.to_string()).collect()
    }

    #[test]
    fn test_one_predicate_per_field_all_must_pass() {
        let rows = people();
        let mut template = FilterTemplate::new();
        template.insert("age".into(), TemplateFilter::Number { comparison: Comparison::Gt, value: 20.into() });
        // "n/a" is not numeric and passes.
        assert_eq!(ids(&apply_template(&rows, &template)), vec!["1", "2"]);

        template.insert("team".into(), TemplateFilter::TransistorSelect {
            include: vec![],
            exclude: vec!["blue".into()],
        });
        assert_eq!(ids(&apply_template(&rows, &template)), vec!["1"]);
    }

    #[test]
    fn test_slug_and_non_value() {
        assert!(slug_matches(&"Ann Lee".into(), "lee,ann"));
        assert!(!slug_matches(&"Ann Lee".into(), "bob,ann"));
        assert!(non_value_matches(&"".into(), true));
        assert!(non_value_matches(&"x".into(), false));
    }

    #[test]
    fn test_date_range_and_single_day() {
        let rows = people();
        let mut template = FilterTemplate::new();
        template.insert("since".into(), TemplateFilter::DateRange { from: "2021-01-01".into(), to: Value::Null });
        assert_eq!(ids(&apply_template(&rows, &template)), vec!["2", "3"]);
        assert!(date_matches(&"2024-03-05 08:30:00".into(), &"2024-03-05".into()));
    }

    #[test]
    fn test_template_serde_shape() {
        let json = r#"{"team":{"kind":"select","values":["red"]},"age":{"kind":"range","min":18}}"#;
        let template: FilterTemplate = serde_json::from_str(json).unwrap();
        assert_eq!(ids(&apply_template(&people(), &template)), vec!["1"]);
    }
}
