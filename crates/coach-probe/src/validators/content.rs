//! Section content checks.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{char_count, sample, ValidationPolicy};
use crate::locator::{Selector, SelectorChain};
use crate::page::PageHandle;
use crate::result::{ProbeError, ProbeResult};

/// Filler strings that mean the response was not really rendered
pub const PLACEHOLDER_PHRASES: &[&str] = &[
    "No answer available",
    "Loading...",
    "Coming soon...",
    "Lorem ipsum",
    "Content not available",
    "[object Object]",
    "Error generating response",
];

const SAMPLE_CHARS: usize = 80;

// =============================================================================
// Section specs
// =============================================================================

/// One expected section of the response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSpec {
    /// Display name ("Summary")
    pub name: String,
    /// Candidate selectors in priority order
    pub candidates: Vec<Selector>,
    /// Absence fails the response (otherwise it is skipped)
    pub required: bool,
    /// Regex the content must match
    #[serde(default)]
    pub pattern: Option<String>,
}

impl SectionSpec {
    /// Required section
    #[must_use]
    pub fn new(name: impl Into<String>, candidates: Vec<Selector>) -> Self {
        Self {
            name: name.into(),
            candidates,
            required: true,
            pattern: None,
        }
    }

    /// Section conventional in the standard candidate set: test id, id, class,
    /// data attribute, then a heading containing `heading`
    #[must_use]
    pub fn standard(name: &str, slug: &str, heading: &str) -> Self {
        Self::new(
            name,
            vec![
                Selector::test_id(format!("{slug}-section")),
                Selector::css(format!("#{slug}")),
                Selector::css(format!(".{slug}-section")),
                Selector::css(format!("[data-section=\"{slug}\"]")),
                Selector::css_with_text("h2", heading),
                Selector::css_with_text("h3", heading),
            ],
        )
    }

    /// Mark the section optional
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Require the content to match `pattern`
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// The candidates as a named chain
    #[must_use]
    pub fn chain(&self) -> SelectorChain {
        SelectorChain::new(self.name.clone(), self.candidates.clone())
    }
}

/// The five response sections; Next Steps is optional
#[must_use]
pub fn default_sections() -> Vec<SectionSpec> {
    vec![
        SectionSpec::standard("Summary", "summary", "Summary"),
        SectionSpec::standard("Options", "options", "Options"),
        SectionSpec::standard("Considerations", "considerations", "Considerations"),
        SectionSpec::standard("Recommendation", "recommendation", "Recommendation"),
        SectionSpec::standard("Next Steps", "next-steps", "Next Steps").optional(),
    ]
}

// =============================================================================
// Results
// =============================================================================

/// Outcome of checking one section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionValidationResult {
    /// Section name
    pub section_name: String,
    /// Passed every rule
    pub valid: bool,
    /// Extracted content
    pub content: Option<String>,
    /// Characters in `content`
    pub character_count: usize,
    /// Failed rule with context
    pub error: Option<String>,
    /// Selector that located the section
    pub matched_selector: Option<String>,
    /// Optional section absent from the page
    #[serde(default)]
    pub skipped: bool,
}

impl SectionValidationResult {
    fn missing(section_name: &str, error: String) -> Self {
        Self {
            section_name: section_name.to_string(),
            valid: false,
            content: None,
            character_count: 0,
            error: Some(error),
            matched_selector: None,
            skipped: false,
        }
    }
}

/// Outcome of checking every section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllSectionsResult {
    /// Every required section passed
    pub valid: bool,
    /// Per-section results in the order given
    pub sections: Vec<SectionValidationResult>,
    /// Errors of failing sections
    pub errors: Vec<String>,
}

impl AllSectionsResult {
    /// First failing section
    #[must_use]
    pub fn first_failure(&self) -> Option<&SectionValidationResult> {
        self.sections.iter().find(|s| !s.valid)
    }
}

// =============================================================================
// Checks
// =============================================================================

/// Apply the length, placeholder, and pattern rules to extracted text.
///
/// Returns the failed rule as a message naming the section.
pub fn check_content(
    section_name: &str,
    content: &str,
    policy: &ValidationPolicy,
    pattern: Option<&Regex>,
) -> Result<(), String> {
    let count = char_count(content);
    if count < policy.section_min_length {
        return Err(format!(
            "{section_name} content too short: {count} < {} characters (\"{}\")",
            policy.section_min_length,
            sample(content, SAMPLE_CHARS)
        ));
    }
    let lowered = content.to_lowercase();
    if let Some(phrase) = policy
        .placeholders()
        .find(|p| lowered.contains(&p.to_lowercase()))
    {
        return Err(format!(
            "{section_name} contains placeholder text {phrase:?} (\"{}\")",
            sample(content, SAMPLE_CHARS)
        ));
    }
    if let Some(re) = pattern {
        if !re.is_match(content) {
            return Err(format!(
                "{section_name} does not match required pattern /{}/ (\"{}\")",
                re.as_str(),
                sample(content, SAMPLE_CHARS)
            ));
        }
    }
    Ok(())
}

/// Validate one section from explicit candidates with the default placeholder list
pub async fn validate_section<P: PageHandle + ?Sized>(
    page: &P,
    section_name: &str,
    candidates: &[Selector],
    min_length: usize,
) -> ProbeResult<SectionValidationResult> {
    let spec = SectionSpec::new(section_name, candidates.to_vec());
    let policy = ValidationPolicy::default().with_section_min_length(min_length);
    validate_section_spec(page, &spec, &policy).await
}

/// Validate one section.
///
/// The first candidate resolving to a visible element wins. A heading or an
/// empty element is judged by its container's text, anything else by its own.
pub async fn validate_section_spec<P: PageHandle + ?Sized>(
    page: &P,
    spec: &SectionSpec,
    policy: &ValidationPolicy,
) -> ProbeResult<SectionValidationResult> {
    let pattern = spec
        .pattern
        .as_deref()
        .map(Regex::new)
        .transpose()
        .map_err(|e| {
            ProbeError::invalid_config(format!("{} pattern is not a valid regex: {e}", spec.name))
        })?;

    let chain = spec.chain();
    let Some(resolved) = chain.first_visible(page).await? else {
        return Ok(SectionValidationResult::missing(
            &spec.name,
            format!("no visible element for {}", chain.describe()),
        ));
    };

    let content = resolved.element.content_text().to_string();
    let character_count = char_count(&content);
    let error = check_content(&spec.name, &content, policy, pattern.as_ref()).err();
    match &error {
        None => tracing::debug!(section = %spec.name, character_count, "section valid"),
        Some(e) => tracing::warn!(section = %spec.name, error = %e, "section invalid"),
    }
    Ok(SectionValidationResult {
        section_name: spec.name.clone(),
        valid: error.is_none(),
        content: Some(content),
        character_count,
        error,
        matched_selector: Some(resolved.selector.to_string()),
        skipped: false,
    })
}

/// Validate every section in `specs`. Optional sections that are absent are
/// reported as skipped and do not affect validity.
pub async fn validate_all_sections<P: PageHandle + ?Sized>(
    page: &P,
    specs: &[SectionSpec],
    policy: &ValidationPolicy,
) -> ProbeResult<AllSectionsResult> {
    let mut sections = Vec::with_capacity(specs.len());
    let mut errors = Vec::new();
    for spec in specs {
        let mut result = validate_section_spec(page, spec, policy).await?;
        if !spec.required && result.matched_selector.is_none() {
            tracing::info!(section = %spec.name, "optional section absent, skipping");
            result.valid = true;
            result.error = None;
            result.skipped = true;
        }
        if let Some(error) = &result.error {
            errors.push(error.clone());
        }
        sections.push(result);
    }
    Ok(AllSectionsResult {
        valid: errors.is_empty(),
        sections,
        errors,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockElement, MockPage};
    use crate::viewport::Viewport;

    const LONG: &str =
        "Taking the new role gives you broader scope while keeping your current location.";

    fn page_with(elements: Vec<MockElement>) -> MockPage {
        elements
            .into_iter()
            .fold(MockPage::new(Viewport::default()), MockPage::with_element)
    }

    async fn rendered_coach() -> MockPage {
        let page = MockPage::decision_coach(Viewport::default());
        page.fill(&Selector::css("textarea"), "Should I change jobs?")
            .await
            .unwrap();
        page.click(&Selector::css("button[type=\"submit\"]"))
            .await
            .unwrap();
        page
    }

    mod check {
        use super::*;
        use proptest::prelude::*;

        #[test]
        fn test_placeholder_case_insensitive() {
            let text = format!("{LONG} loading...");
            let err = check_content("Summary", &text, &ValidationPolicy::default(), None)
                .unwrap_err();
            assert!(err.contains("Loading..."));
        }

        #[test]
        fn test_required_pattern() {
            let re = Regex::new(r"(?i)\brecommend").unwrap();
            let err =
                check_content("Recommendation", LONG, &ValidationPolicy::default(), Some(&re))
                    .unwrap_err();
            assert!(err.contains("required pattern"));
        }

        #[test]
        fn test_multibyte_counts_chars() {
            let text = "é".repeat(50);
            assert!(check_content("Summary", &text, &ValidationPolicy::default(), None).is_ok());
        }

        proptest! {
            #[test]
            fn prop_short_content_always_fails(text in "[a-z ]{0,49}") {
                let policy = ValidationPolicy::default();
                prop_assert!(check_content("S", &text, &policy, None).is_err());
            }

            #[test]
            fn prop_long_clean_content_passes(text in "[a-z]{50,200}") {
                prop_assert!(check_content("S", &text, &ValidationPolicy::default(), None).is_ok());
            }
        }
    }

    mod section {
        use super::*;

        #[tokio::test]
        async fn test_first_visible_candidate_wins() {
            let page = page_with(vec![
                MockElement::new("#summary").with_text("short").hidden(),
                MockElement::new(".summary-section").with_text(LONG),
            ]);
            let result = validate_section(
                &page,
                "Summary",
                &[Selector::css("#summary"), Selector::css(".summary-section")],
                50,
            )
            .await
            .unwrap();
            assert!(result.valid, "{:?}", result.error);
            assert_eq!(result.matched_selector.as_deref(), Some("css=.summary-section"));
            assert_eq!(result.character_count, LONG.chars().count());
        }

        #[tokio::test]
        async fn test_heading_uses_container_text() {
            let page = page_with(vec![MockElement::new("h2")
                .with_text("Options")
                .with_context(format!("Options\n{LONG}"))]);
            let result = validate_section(
                &page,
                "Options",
                &[Selector::css_with_text("h2", "Options")],
                50,
            )
            .await
            .unwrap();
            assert!(result.valid);
            assert!(result.content.unwrap().contains("broader scope"));
        }

        #[tokio::test]
        async fn test_short_container_not_rescued_by_page_text() {
            let page = page_with(vec![MockElement::new("[data-testid=\"summary-section\"]")
                .with_text("Summary\nTBD")
                .with_context(format!("{LONG} {LONG}"))]);
            let result = validate_section(
                &page,
                "Summary",
                &[Selector::test_id("summary-section")],
                50,
            )
            .await
            .unwrap();
            assert!(!result.valid);
            assert_eq!(result.character_count, 11);
            assert_eq!(result.content.as_deref(), Some("Summary\nTBD"));
        }

        #[tokio::test]
        async fn test_no_candidate_visible() {
            let page = page_with(vec![]);
            let result = validate_section(&page, "Summary", &[Selector::css("#summary")], 50)
                .await
                .unwrap();
            assert!(!result.valid);
            assert!(result.content.is_none());
            assert!(result.error.unwrap().contains("css=#summary"));
        }

        #[tokio::test]
        async fn test_too_short() {
            let page = page_with(vec![MockElement::new("#summary").with_text("Too brief.")]);
            let result = validate_section(&page, "Summary", &[Selector::css("#summary")], 50)
                .await
                .unwrap();
            assert!(!result.valid);
            assert_eq!(result.character_count, 10);
            assert!(result.error.unwrap().contains("10 < 50"));
        }

        #[tokio::test]
        async fn test_placeholder_rejected() {
            let page = page_with(vec![MockElement::new("#summary")
                .with_text(format!("{LONG} No answer available"))]);
            let result = validate_section(&page, "Summary", &[Selector::css("#summary")], 50)
                .await
                .unwrap();
            assert!(!result.valid);
        }

        #[tokio::test]
        async fn test_invalid_pattern_is_config_error() {
            let page = page_with(vec![MockElement::new("#summary").with_text(LONG)]);
            let spec = SectionSpec::new("Summary", vec![Selector::css("#summary")])
                .with_pattern("(unclosed");
            let err = validate_section_spec(&page, &spec, &ValidationPolicy::default())
                .await
                .unwrap_err();
            assert!(matches!(err, ProbeError::InvalidConfig { .. }));
        }

        #[tokio::test]
        async fn test_page_failure_is_err() {
            let page = page_with(vec![]);
            page.fail_next_queries(1);
            assert!(validate_section(&page, "Summary", &[Selector::css("#s")], 50)
                .await
                .is_err());
        }
    }

    mod all_sections {
        use super::*;

        #[tokio::test]
        async fn test_rendered_response_valid_without_next_steps() {
            let page = rendered_coach().await;
            let result =
                validate_all_sections(&page, &default_sections(), &ValidationPolicy::default())
                    .await
                    .unwrap();
            assert!(result.valid, "{:?}", result.errors);
            assert_eq!(result.sections.len(), 5);
            assert!(result.sections[4].skipped);
            assert!(result.first_failure().is_none());
        }

        #[tokio::test]
        async fn test_unrendered_response_fails_required() {
            let page = MockPage::decision_coach(Viewport::default());
            let result =
                validate_all_sections(&page, &default_sections(), &ValidationPolicy::default())
                    .await
                    .unwrap();
            assert!(!result.valid);
            assert_eq!(result.errors.len(), 4);
            assert_eq!(result.first_failure().unwrap().section_name, "Summary");
        }

        #[tokio::test]
        async fn test_present_optional_section_is_validated() {
            let page = rendered_coach().await.with_element(
                MockElement::new("[data-testid=\"next-steps-section\"]").with_text("Soon"),
            );
            let result =
                validate_all_sections(&page, &default_sections(), &ValidationPolicy::default())
                    .await
                    .unwrap();
            assert!(!result.valid);
            assert_eq!(result.first_failure().unwrap().section_name, "Next Steps");
        }
    }
}
