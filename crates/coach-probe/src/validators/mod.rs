//! Content validators for a rendered Decision Coach response.
//!
//! Quality failures (too short, placeholder text, missing pattern) come back
//! as result values with `valid = false`. Only page-level failures are `Err`.

mod content;
mod tooltip;

pub use content::{
    check_content, default_sections, validate_all_sections, validate_section,
    validate_section_spec, AllSectionsResult, SectionSpec, SectionValidationResult,
    PLACEHOLDER_PHRASES,
};
pub use tooltip::{
    check_tooltip, tooltip_chain, tooltip_payload, validate_tooltips, validate_tooltips_with,
    TooltipDetail, TooltipValidationResult, TOOLTIP_PAYLOAD_ATTRIBUTES,
};

use serde::{Deserialize, Serialize};

/// Thresholds applied by the content validators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    /// Minimum characters of section content
    pub section_min_length: usize,
    /// Minimum characters of tooltip text
    pub tooltip_min_length: usize,
    /// Minimum characters of a tooltip's visible term
    pub tooltip_label_min_length: usize,
    /// Extra placeholder phrases rejected in section content
    pub extra_placeholders: Vec<String>,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            section_min_length: 50,
            tooltip_min_length: 15,
            tooltip_label_min_length: 2,
            extra_placeholders: Vec::new(),
        }
    }
}

impl ValidationPolicy {
    /// Set the minimum section length
    #[must_use]
    pub fn with_section_min_length(mut self, min: usize) -> Self {
        self.section_min_length = min;
        self
    }

    /// Reject an additional placeholder phrase
    #[must_use]
    pub fn with_placeholder(mut self, phrase: impl Into<String>) -> Self {
        self.extra_placeholders.push(phrase.into());
        self
    }

    fn placeholders(&self) -> impl Iterator<Item = &str> {
        PLACEHOLDER_PHRASES
            .iter()
            .copied()
            .chain(self.extra_placeholders.iter().map(String::as_str))
    }
}

/// Length in characters
fn char_count(text: &str) -> usize {
    text.chars().count()
}

/// First `max` characters of `text`, for error messages
fn sample(text: &str, max: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if char_count(&flat) <= max {
        flat
    } else {
        let mut cut: String = flat.chars().take(max).collect();
        cut.push_str("...");
        cut
    }
}
