// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

use std::collections::BTreeMap;

use crate::fbgt_types::MutationError;

// Attribute names reserved for structural use, never emitted from user attributes
pub const RESTRICTED_ATTRIBUTES: [&str; 4] = ["name", "type", "class", "multiple"];

// Hour bounds for time charts
pub const HOUR_MIN: u8 = 0;
pub const HOUR_MAX: u8 = 23;

/// Free-form pass-through attributes attached to a control or section.
/// Keys are case-folded on insert; ordering is by key so emission is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraAttributes {
    entries: BTreeMap<String, String>,
}

impl ExtraAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite; returns the previous value.
    /// Keys that could not be written back as an XML attribute are refused.
    pub fn set(&mut self, key: &str, value: &str) -> Result<Option<String>, MutationError> {
        let key = key.to_lowercase();
        if !is_attribute_name(&key) {
            return Err(MutationError::InvalidAttribute(key));
        }
        Ok(self.entries.insert(key, value.to_string()))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&key.to_lowercase()).map(|v| v.as_str())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(&key.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Entries allowed onto an element, skipping the reserved names and any
    /// attribute the element already carries structurally
    pub fn emittable<'a>(&'a self, structural: &'a [&'a str]) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.iter()
            .filter(move |(k, _)| !is_restricted(k) && !structural.contains(k))
    }
}

pub fn is_restricted(key: &str) -> bool {
    let key = key.to_lowercase();
    RESTRICTED_ATTRIBUTES.contains(&key.as_str())
}

/// XML Name production: a letter, `_` or `:` followed by letters, digits,
/// `-`, `.`, `_` or `:`
pub fn is_attribute_name(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '.' | '_' | ':'))
}

/// Derive a form field name from a human label.
///
/// Lower-cases, trims whitespace and byte-order marks, turns every space into `_`, then every character that is
/// not an ASCII word character into `_`. A character outside the basic
/// multilingual plane yields two underscores, matching the UTF-16 based
/// behaviour downstream form handlers were written against.
pub fn namesafe(label: &str) -> String {
    let lowered = label.to_lowercase();
    let trimmed = lowered.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');

    let mut out = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        if c == ' ' || c == '_' || c.is_ascii_alphanumeric() {
            out.push(if c == ' ' { '_' } else { c });
        } else {
            for _ in 0..c.len_utf16() {
                out.push('_');
            }
        }
    }
    out
}

pub fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

pub fn parse_yes(value: Option<&str>) -> bool {
    value == Some("yes")
}

/// Parse an hour attribute or edit value, clamped into the valid range
pub fn parse_hour(value: &str) -> Option<u8> {
    let n = value.trim().parse::<i64>().ok()?;
    Some(n.clamp(HOUR_MIN as i64, HOUR_MAX as i64) as u8)
}
