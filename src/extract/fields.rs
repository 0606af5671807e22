//! Field patterns applied to recognized text.
//!
//! Each pattern captures the remainder of the line after a `label:`
//! prefix, so a label with nothing behind the colon still produces a
//! (blank) field value rather than no field at all.

use std::sync::OnceLock;

use regex::Regex;

use super::engine::TextRegion;

/// Field name -> label pattern. Confidence comes from the region the
/// match was found in, not from the pattern.
pub const FIELD_PATTERNS: &[(&str, &str)] = &[
    ("first_name", r"(?i)\bfirst[ _]?name[ \t]*:[ \t]*([^\n]*)"),
    ("last_name", r"(?i)\blast[ _]?name[ \t]*:[ \t]*([^\n]*)"),
    ("id_number", r"(?i)\bid[ _]?number[ \t]*:[ \t]*([^\n]*)"),
    ("date", r"(?i)\bdate[ \t]*:[ \t]*([^\n]*)"),
    ("address", r"(?i)\baddress[ \t]*:[ \t]*([^\n]*)"),
    ("phone", r"(?i)\bphone[ \t]*:[ \t]*([^\n]*)"),
    ("email", r"(?i)\be-?mail[ \t]*:[ \t]*([^\n]*)"),
    (
        "invoice_number",
        r"(?i)\binvoice[ _]?(?:no|number)[ \t.]*:[ \t]*([^\n]*)",
    ),
];

/// A field match before evaluation: name, raw trimmed value, and the
/// confidence of the region it came from.
#[derive(Debug, Clone)]
pub struct RawField {
    pub name: &'static str,
    pub value: String,
    pub confidence: f64,
}

fn compiled_patterns() -> &'static Vec<(&'static str, Regex)> {
    static PATTERNS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        FIELD_PATTERNS
            .iter()
            .map(|(name, pattern)| (*name, Regex::new(pattern).expect("invalid field pattern")))
            .collect()
    })
}

/// Apply every field pattern to every region.
///
/// Duplicate hits for the same field (across regions or engines) are
/// resolved later by the adapter's merge step.
pub fn parse_fields(regions: &[TextRegion]) -> Vec<RawField> {
    let mut fields = Vec::new();
    for region in regions {
        for (name, pattern) in compiled_patterns() {
            if let Some(captures) = pattern.captures(&region.text) {
                let value = captures
                    .get(1)
                    .map(|m| m.as_str().trim().to_string())
                    .unwrap_or_default();
                fields.push(RawField {
                    name,
                    value,
                    confidence: region.confidence,
                });
            }
        }
    }
    fields
}
