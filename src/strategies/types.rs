use serde::Serialize;

use crate::data::types::Rating;

/// The single answer of a run, with the evidence trail that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub label: String,
    pub confidence: Rating,
    pub reasons: Vec<String>,
}

impl Recommendation {
    pub fn new(label: impl Into<String>, confidence: Rating) -> Self {
        Self {
            label: label.into(),
            confidence,
            reasons: Vec::new(),
        }
    }

    pub fn with_reasons(mut self, earlier: Vec<String>) -> Self {
        let mut reasons = earlier;
        reasons.append(&mut self.reasons);
        self.reasons = reasons;
        self
    }
}
