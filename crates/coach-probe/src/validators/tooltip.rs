//! Tooltip checks for inline glossary terms.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{char_count, sample, ValidationPolicy};
use crate::locator::{ElementSnapshot, Selector, SelectorChain};
use crate::page::PageHandle;
use crate::result::ProbeResult;

/// Attributes carrying tooltip text, highest priority first
pub const TOOLTIP_PAYLOAD_ATTRIBUTES: &[&str] =
    &["data-tooltip", "data-tip", "title", "aria-label"];

const PLACEHOLDER_PATTERNS: &[&str] = &[
    r"(?i)lorem ipsum",
    r"(?i)coming soon",
    r"(?i)\b(todo|tbd|fixme)\b",
    r"(?i)^\s*(tooltip|definition|description)( text)?( goes)?( here)?\W*$",
    r"(?i)no (definition|description) available",
    r"(?i)\bundefined\b",
    r"(?i)\[object object\]",
    r"\{\{.*\}\}",
];

fn placeholder_patterns() -> Vec<Regex> {
    PLACEHOLDER_PATTERNS
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
}

/// Tooltip strategies: class-based, then attribute-based, then `title`-based
#[must_use]
pub fn tooltip_chain() -> SelectorChain {
    SelectorChain::new(
        "tooltips",
        vec![
            Selector::css(".tooltip-term"),
            Selector::css(".has-tooltip"),
            Selector::css(".tooltip"),
            Selector::css("[data-tooltip]"),
            Selector::css("[data-tip]"),
            Selector::css("abbr[title]"),
            Selector::css("span[title]"),
        ],
    )
}

/// One located tooltip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TooltipDetail {
    /// Visible term
    pub term: String,
    /// Tooltip payload
    pub tooltip_text: String,
    /// Passed every rule
    pub valid: bool,
    /// Failed rule
    pub error: Option<String>,
}

/// Outcome of checking every tooltip on the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TooltipValidationResult {
    /// At least one tooltip found and none failed
    pub valid: bool,
    /// Tooltips located
    pub tooltip_count: usize,
    /// Tooltips that passed
    pub valid_tooltip_count: usize,
    /// Every failure, in page order
    pub errors: Vec<String>,
    /// Per-tooltip outcome
    pub details: Vec<TooltipDetail>,
}

/// First non-empty payload attribute of `element`
#[must_use]
pub fn tooltip_payload(element: &ElementSnapshot) -> Option<&str> {
    TOOLTIP_PAYLOAD_ATTRIBUTES
        .iter()
        .filter_map(|name| element.attribute(name))
        .map(str::trim)
        .find(|v| !v.is_empty())
}

/// Apply the label, length, and placeholder rules to one tooltip
pub fn check_tooltip(label: &str, payload: &str, policy: &ValidationPolicy) -> Result<(), String> {
    check_tooltip_with(label, payload, policy, &placeholder_patterns())
}

fn check_tooltip_with(
    label: &str,
    payload: &str,
    policy: &ValidationPolicy,
    patterns: &[Regex],
) -> Result<(), String> {
    if char_count(label) < policy.tooltip_label_min_length {
        return Err(format!(
            "tooltip term {label:?} shorter than {} characters",
            policy.tooltip_label_min_length
        ));
    }
    if payload.is_empty() {
        return Err(format!("tooltip for {label:?} has no text"));
    }
    let count = char_count(payload);
    if count < policy.tooltip_min_length {
        return Err(format!(
            "tooltip for {label:?} too short: {count} < {} characters",
            policy.tooltip_min_length
        ));
    }
    if let Some(re) = patterns.iter().find(|re| re.is_match(payload)) {
        return Err(format!(
            "tooltip for {label:?} is placeholder text /{}/: {:?}",
            re.as_str(),
            sample(payload, 60)
        ));
    }
    Ok(())
}

/// Validate every tooltip with the default thresholds
pub async fn validate_tooltips<P: PageHandle + ?Sized>(
    page: &P,
) -> ProbeResult<TooltipValidationResult> {
    validate_tooltips_with(page, &ValidationPolicy::default()).await
}

/// Validate every tooltip found by the first matching strategy
pub async fn validate_tooltips_with<P: PageHandle + ?Sized>(
    page: &P,
    policy: &ValidationPolicy,
) -> ProbeResult<TooltipValidationResult> {
    let chain = tooltip_chain();
    let Some((selector, elements)) = chain.first_matching(page).await? else {
        let error = format!("no tooltip elements found for {}", chain.describe());
        tracing::warn!(%error, "tooltip validation failed");
        return Ok(TooltipValidationResult {
            valid: false,
            tooltip_count: 0,
            valid_tooltip_count: 0,
            errors: vec![error],
            details: Vec::new(),
        });
    };

    let patterns = placeholder_patterns();
    let mut details = Vec::with_capacity(elements.len());
    let mut errors = Vec::new();
    for element in &elements {
        let term = element.text.trim().to_string();
        let tooltip_text = tooltip_payload(element).unwrap_or_default().to_string();
        let error = check_tooltip_with(&term, &tooltip_text, policy, &patterns).err();
        if let Some(e) = &error {
            errors.push(e.clone());
        }
        details.push(TooltipDetail {
            term,
            tooltip_text,
            valid: error.is_none(),
            error,
        });
    }

    let valid_tooltip_count = details.iter().filter(|d| d.valid).count();
    tracing::debug!(
        %selector,
        tooltip_count = details.len(),
        valid_tooltip_count,
        "tooltips checked"
    );
    Ok(TooltipValidationResult {
        valid: errors.is_empty(),
        tooltip_count: details.len(),
        valid_tooltip_count,
        errors,
        details,
    })
}
