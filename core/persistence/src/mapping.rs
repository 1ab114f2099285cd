//! FILENAME: core/persistence/src/mapping.rs
//! PURPOSE: Matches uploaded sheet headers to target column fields.
//! CONTEXT: Headers and fields are compared in a compact normal form (no
//! diacritics, lowercase, letters and digits only). Three passes run in
//! order, each only over what is still unmapped: exact match, same position,
//! then containment either way. Computed columns are never targets.

use engine::ColumnDef;
use serde::{Deserialize, Serialize};

/// Latin letters with diacritics and their ASCII base.
const FOLDS: &[(char, &str)] = &[
    ('à', "a"), ('á', "a"), ('â', "a"), ('ã', "a"), ('ä', "a"), ('å', "a"), ('ā', "a"), ('ą', "a"),
    ('æ', "ae"), ('ç', "c"), ('ć', "c"), ('č', "c"), ('ď', "d"), ('đ', "d"),
    ('è', "e"), ('é', "e"), ('ê', "e"), ('ë', "e"), ('ē', "e"), ('ę', "e"), ('ě', "e"),
    ('ğ', "g"), ('ì', "i"), ('í', "i"), ('î', "i"), ('ï', "i"), ('ī', "i"), ('ı', "i"),
    ('ł', "l"), ('ñ', "n"), ('ń', "n"), ('ň', "n"),
    ('ò', "o"), ('ó', "o"), ('ô', "o"), ('õ', "o"), ('ö', "o"), ('ø', "o"), ('ő', "o"), ('œ', "oe"),
    ('ř', "r"), ('ś', "s"), ('š', "s"), ('ş', "s"), ('ß', "ss"), ('ť', "t"),
    ('ù', "u"), ('ú', "u"), ('û', "u"), ('ü', "u"), ('ū', "u"), ('ů', "u"), ('ű', "u"),
    ('ý', "y"), ('ÿ', "y"), ('ź', "z"), ('ż', "z"), ('ž', "z"),
];

/// Lowercases and replaces accented Latin letters by their base letters.
pub fn fold_diacritics(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars().flat_map(char::to_lowercase) {
        match FOLDS.iter().find(|(accented, _)| *accented == c) {
            Some((_, base)) => out.push_str(base),
            None => out.push(c),
        }
    }
    out
}

/// Compact comparison form: folded, lowercase, ASCII letters and digits only.
pub fn normalize_header(s: &str) -> String {
    fold_diacritics(s).chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// Columns an import may write, in display order.
pub fn mappable_columns(columns: &[ColumnDef]) -> Vec<&ColumnDef> {
    let mut targets: Vec<&ColumnDef> = columns.iter().filter(|c| !c.is_action() && !c.computed).collect();
    targets.sort_by_key(|c| c.order);
    targets
}

/// Target field per source header (aligned with the header list).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HeaderMapping {
    pub targets: Vec<Option<String>>,
}

impl HeaderMapping {
    pub fn field_for(&self, header_index: usize) -> Option<&str> {
        self.targets.get(header_index).and_then(|t| t.as_deref())
    }

    pub fn header_index_for(&self, field: &str) -> Option<usize> {
        self.targets.iter().position(|t| t.as_deref() == Some(field))
    }

    pub fn mapped_count(&self) -> usize {
        self.targets.iter().filter(|t| t.is_some()).count()
    }

    /// Points `header_index` at `field`, unmapping any other header that had it.
    pub fn assign(&mut self, header_index: usize, field: Option<&str>) {
        if let Some(field) = field {
            for target in self.targets.iter_mut() {
                if target.as_deref() == Some(field) {
                    *target = None;
                }
            }
        }
        if let Some(slot) = self.targets.get_mut(header_index) {
            *slot = field.map(str::to_string);
        }
    }
}

pub fn auto_map(headers: &[String], columns: &[ColumnDef]) -> HeaderMapping {
    let targets = mappable_columns(columns);
    let target_keys: Vec<(String, String)> = targets
        .iter()
        .map(|c| (normalize_header(&c.field), normalize_header(&c.header_name)))
        .collect();
    let header_keys: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();

    let mut mapped: Vec<Option<usize>> = vec![None; headers.len()];
    let mut taken = vec![false; targets.len()];

    // Exact compact match on field or display name.
    for (h, key) in header_keys.iter().enumerate() {
        if key.is_empty() {
            continue;
        }
        if let Some(t) = (0..targets.len())
            .find(|&t| !taken[t] && (&target_keys[t].0 == key || &target_keys[t].1 == key))
        {
            mapped[h] = Some(t);
            taken[t] = true;
        }
    }

    // Same position.
    for h in 0..headers.len() {
        if mapped[h].is_none() && !header_keys[h].is_empty() && h < targets.len() && !taken[h] {
            mapped[h] = Some(h);
            taken[h] = true;
        }
    }

    // Containment either way.
    for (h, key) in header_keys.iter().enumerate() {
        if mapped[h].is_some() || key.is_empty() {
            continue;
        }
        let contains = |candidate: &str| {
            !candidate.is_empty() && (candidate.contains(key.as_str()) || key.contains(candidate))
        };
        if let Some(t) = (0..targets.len())
            .find(|&t| !taken[t] && (contains(&target_keys[t].0) || contains(&target_keys[t].1)))
        {
            mapped[h] = Some(t);
            taken[t] = true;
        }
    }

    HeaderMapping {
        targets: mapped
            .into_iter()
            .map(|t| t.map(|i| targets[i].field.clone()))
            .collect(),
    }
}
