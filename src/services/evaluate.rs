//! Document evaluation.
//!
//! Pure functions over extracted field candidates: no I/O, fully
//! deterministic, so the rules are trivially testable.

use std::collections::{BTreeMap, HashSet};

use crate::extract::FieldCandidate;
use crate::repository::FieldRow;

/// Which field names are critical for a document to be considered valid.
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    critical_fields: HashSet<String>,
}

impl EvaluatorConfig {
    pub fn new(critical_fields: impl IntoIterator<Item = String>) -> Self {
        Self {
            critical_fields: critical_fields.into_iter().collect(),
        }
    }

    pub fn is_critical(&self, field_name: &str) -> bool {
        self.critical_fields.contains(field_name)
    }
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self::new(
            ["first_name", "last_name", "id_number"]
                .into_iter()
                .map(String::from),
        )
    }
}

/// Outcome of evaluating one document's extracted fields.
#[derive(Debug, Clone)]
pub struct DocumentEvaluation {
    pub fields: Vec<FieldRow>,
    /// True when any critical field is blank.
    pub has_errors: bool,
    pub empty_fields_count: i32,
    /// Mean of field confidences; 0.0 when no fields were found.
    pub confidence_score: f64,
}

/// Evaluate merged field candidates against the critical-field rules.
pub fn evaluate(
    fields: &BTreeMap<String, FieldCandidate>,
    config: &EvaluatorConfig,
) -> DocumentEvaluation {
    let mut rows = Vec::with_capacity(fields.len());
    let mut empty_fields_count = 0;
    let mut has_errors = false;
    let mut confidence_sum = 0.0;

    for (name, candidate) in fields {
        let is_empty = candidate.value.trim().is_empty();
        let is_critical = config.is_critical(name);
        if is_empty {
            empty_fields_count += 1;
            if is_critical {
                has_errors = true;
            }
        }
        confidence_sum += candidate.confidence;
        rows.push(FieldRow {
            field_name: name.clone(),
            field_value: (!is_empty).then(|| candidate.value.clone()),
            is_empty,
            is_critical,
            confidence: candidate.confidence,
        });
    }

    let confidence_score = if rows.is_empty() {
        0.0
    } else {
        confidence_sum / rows.len() as f64
    };

    DocumentEvaluation {
        fields: rows,
        has_errors,
        empty_fields_count,
        confidence_score,
    }
}
