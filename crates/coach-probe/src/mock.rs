//! In-memory page for exercising validators and scenarios without a browser.
//!
//! A [`MockPage`] holds a flat list of [`MockElement`]s, each answering to one
//! or more CSS keys. Clicking the configured submit control with a non-blank
//! input "renders" the response elements, optionally shifting centered layouts
//! to simulate reflow. Elements can also be deferred so they only mount after a
//! number of queries following each navigation, like a client-rendered app.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::locator::{BoundingBox, ElementSnapshot, Selector};
use crate::page::{PageFactory, PageHandle};
use crate::result::{ProbeError, ProbeResult};
use crate::viewport::Viewport;

/// Minimal PNG signature returned as screenshot bytes
pub const MOCK_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// How an element's bounding box is derived
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockLayout {
    /// Not rendered
    None,
    /// Fixed client rect
    Fixed(BoundingBox),
    /// Horizontally centered block, `max_width` wide at most, plus `offset_x`
    Centered {
        /// Maximum width in pixels
        max_width: f64,
        /// Height in pixels
        height: f64,
        /// Deliberate horizontal skew
        offset_x: f64,
    },
}

/// One element of the mock document
#[derive(Debug, Clone)]
pub struct MockElement {
    keys: Vec<String>,
    tag: String,
    text: String,
    context_text: String,
    attributes: HashMap<String, String>,
    visible: bool,
    enabled: bool,
    layout: MockLayout,
    mount_after: usize,
}

impl MockElement {
    /// Element answering to the CSS key `key`.
    ///
    /// A bare tag name key (`h2`, `main`) is also the element's tag; anything
    /// else is a `div` until [`MockElement::with_tag`] says otherwise.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        let tag = if !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric()) {
            key.clone()
        } else {
            "div".to_string()
        };
        Self {
            keys: vec![key],
            tag,
            text: String::new(),
            context_text: String::new(),
            attributes: HashMap::new(),
            visible: true,
            enabled: true,
            layout: MockLayout::Fixed(BoundingBox::new(0.0, 0.0, 100.0, 20.0)),
            mount_after: 0,
        }
    }

    /// Set the tag name
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Also answer to another CSS key
    #[must_use]
    pub fn also(mut self, key: impl Into<String>) -> Self {
        self.keys.push(key.into());
        self
    }

    /// Set the element's own text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the parent container's text
    #[must_use]
    pub fn with_context(mut self, text: impl Into<String>) -> Self {
        self.context_text = text.into();
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Hide the element (no bounding box)
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self.layout = MockLayout::None;
        self
    }

    /// Mark the element disabled
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Use the given layout
    #[must_use]
    pub fn with_layout(mut self, layout: MockLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Center horizontally with a maximum width
    #[must_use]
    pub fn centered(self, max_width: f64) -> Self {
        self.with_layout(MockLayout::Centered {
            max_width,
            height: 600.0,
            offset_x: 0.0,
        })
    }

    /// Only mount after `queries` element queries since the last navigation
    #[must_use]
    pub const fn deferred(mut self, queries: usize) -> Self {
        self.mount_after = queries;
        self
    }

    fn matches(&self, selector: &Selector) -> bool {
        match selector {
            Selector::CssWithText { css, text } => {
                self.keys.iter().any(|k| k == css) && self.text.contains(text.as_str())
            }
            other => other
                .as_css()
                .is_some_and(|css| self.keys.iter().any(|k| *k == css)),
        }
    }

    fn snapshot(&self, viewport: &Viewport, reflow_px: f64) -> ElementSnapshot {
        let bounding_box = match self.layout {
            MockLayout::None => None,
            MockLayout::Fixed(bbox) => Some(bbox),
            MockLayout::Centered {
                max_width,
                height,
                offset_x,
            } => {
                let vw = f64::from(viewport.width);
                let width = max_width.min(vw);
                Some(BoundingBox::new(
                    (vw - width) / 2.0 + offset_x + reflow_px,
                    0.0,
                    width,
                    height,
                ))
            }
        };
        ElementSnapshot {
            tag: self.tag.clone(),
            text: self.text.clone(),
            context_text: self.context_text.clone(),
            attributes: self.attributes.clone(),
            visible: self.visible,
            enabled: self.enabled,
            bounding_box,
        }
    }
}

#[derive(Debug)]
struct MockState {
    url: String,
    viewport: Viewport,
    elements: Vec<MockElement>,
    response: Vec<MockElement>,
    response_rendered: bool,
    submit_key: Option<String>,
    input_key: Option<String>,
    input_value: String,
    submitted: Vec<String>,
    navigations: usize,
    queries_since_navigation: usize,
    closed: bool,
    reflow_px: f64,
    failing_queries: usize,
    screenshot_fails: bool,
    screenshots_taken: usize,
}

/// Scriptable in-memory page
#[derive(Debug, Clone)]
pub struct MockPage {
    state: Arc<Mutex<MockState>>,
}

impl MockPage {
    /// Empty document with the given viewport
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                url: "about:blank".to_string(),
                viewport,
                elements: Vec::new(),
                response: Vec::new(),
                response_rendered: false,
                submit_key: None,
                input_key: None,
                input_value: String::new(),
                submitted: Vec::new(),
                navigations: 0,
                queries_since_navigation: 0,
                closed: false,
                reflow_px: 0.0,
                failing_queries: 0,
                screenshot_fails: false,
                screenshots_taken: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Add a static element
    #[must_use]
    pub fn with_element(self, element: MockElement) -> Self {
        self.lock().elements.push(element);
        self
    }

    /// Elements rendered once a non-blank query is submitted
    #[must_use]
    pub fn with_response(self, elements: Vec<MockElement>) -> Self {
        self.lock().response = elements;
        self
    }

    /// Keys of the query input and submit control that drive the response
    #[must_use]
    pub fn with_controls(
        self,
        input_key: impl Into<String>,
        submit_key: impl Into<String>,
    ) -> Self {
        {
            let mut state = self.lock();
            state.input_key = Some(input_key.into());
            state.submit_key = Some(submit_key.into());
        }
        self
    }

    /// Shift centered layouts by `px` once the response renders
    #[must_use]
    pub fn with_reflow(self, px: f64) -> Self {
        self.lock().reflow_px = px;
        self
    }

    /// Make the next `n` element queries fail with a page error
    pub fn fail_next_queries(&self, n: usize) {
        self.lock().failing_queries = n;
    }

    /// Make every screenshot fail
    pub fn fail_screenshots(&self) {
        self.lock().screenshot_fails = true;
    }

    /// Queries submitted so far
    #[must_use]
    pub fn submitted(&self) -> Vec<String> {
        self.lock().submitted.clone()
    }

    /// Current input value
    #[must_use]
    pub fn input_value(&self) -> String {
        self.lock().input_value.clone()
    }

    /// Number of navigations performed
    #[must_use]
    pub fn navigations(&self) -> usize {
        self.lock().navigations
    }

    /// Number of screenshots captured successfully
    #[must_use]
    pub fn screenshots_taken(&self) -> usize {
        self.lock().screenshots_taken
    }

    /// Whether [`PageHandle::close`] was called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Whether the response elements are currently rendered
    #[must_use]
    pub fn response_rendered(&self) -> bool {
        self.lock().response_rendered
    }

    /// A well-formed Decision Coach page: centered wrapper, query controls,
    /// and a response with every section and two tooltips
    #[must_use]
    pub fn decision_coach(viewport: Viewport) -> Self {
        Self::new(viewport)
            .with_element(
                MockElement::new("[data-testid=\"layout-wrapper\"]")
                    .also("main")
                    .centered(1200.0),
            )
            .with_element(MockElement::new("body").with_layout(MockLayout::Centered {
                max_width: f64::INFINITY,
                height: 900.0,
                offset_x: 0.0,
            }))
            .with_element(
                MockElement::new("textarea")
                    .also("[data-testid=\"query-input\"]")
                    .with_attribute("placeholder", "Describe the decision you are facing"),
            )
            .with_element(
                MockElement::new("button[type=\"submit\"]")
                    .also("[data-testid=\"submit-button\"]")
                    .with_text("Get Advice"),
            )
            .with_controls("textarea", "button[type=\"submit\"]")
            .with_response(decision_coach_response())
    }
}

/// Response elements for [`MockPage::decision_coach`]
#[must_use]
pub fn decision_coach_response() -> Vec<MockElement> {
    let section = |id: &str, heading: &str, body: &str| {
        MockElement::new(format!("[data-testid=\"{id}-section\"]"))
            .with_text(format!("{heading}\n{body}"))
    };
    vec![
        section(
            "summary",
            "Summary",
            "You are weighing a stable salaried role against an early-stage startup \
             offer with equity.",
        ),
        section(
            "options",
            "Options",
            "Accept the startup offer, stay in the current role, \
             or negotiate a delayed start with the startup.",
        ),
        section(
            "considerations",
            "Key Considerations",
            "Financial runway, appetite for risk, career growth, \
             and how each path fits your family commitments.",
        ),
        section(
            "recommendation",
            "Recommendation",
            "Negotiate a delayed start so you can build six months of savings \
             before taking the equity risk.",
        ),
        MockElement::new(".tooltip-term")
            .with_text("equity")
            .with_attribute(
                "data-tooltip",
                "Ownership share in a company, usually vesting over several years.",
            ),
        MockElement::new(".tooltip-term")
            .with_text("runway")
            .with_attribute(
                "data-tooltip",
                "How many months your savings cover expenses without new income.",
            ),
    ]
}

#[async_trait]
impl PageHandle for MockPage {
    async fn goto(&self, url: &str) -> ProbeResult<()> {
        let mut state = self.lock();
        state.url = url.to_string();
        state.navigations += 1;
        state.queries_since_navigation = 0;
        state.response_rendered = false;
        state.input_value.clear();
        Ok(())
    }

    async fn query_all(&self, selector: &Selector) -> ProbeResult<Vec<ElementSnapshot>> {
        let mut state = self.lock();
        if state.failing_queries > 0 {
            state.failing_queries -= 1;
            return Err(ProbeError::page("execution context was destroyed"));
        }
        state.queries_since_navigation += 1;
        let mounted = state.queries_since_navigation;
        let reflow = if state.response_rendered {
            state.reflow_px
        } else {
            0.0
        };
        let rendered: &[MockElement] = if state.response_rendered {
            &state.response
        } else {
            &[]
        };
        Ok(state
            .elements
            .iter()
            .chain(rendered.iter())
            .filter(|e| e.mount_after < mounted && e.matches(selector))
            .map(|e| e.snapshot(&state.viewport, reflow))
            .collect())
    }

    async fn fill(&self, selector: &Selector, text: &str) -> ProbeResult<()> {
        let mut state = self.lock();
        let Some(element) = state.elements.iter().find(|e| e.matches(selector)) else {
            return Err(ProbeError::ElementNotFound {
                description: selector.to_string(),
            });
        };
        if !element.enabled {
            return Err(ProbeError::InputError {
                message: format!("{selector} is disabled"),
            });
        }
        let is_input = state
            .input_key
            .as_ref()
            .map_or(true, |key| element.keys.contains(key));
        if is_input {
            state.input_value = text.to_string();
        }
        Ok(())
    }

    async fn click(&self, selector: &Selector) -> ProbeResult<()> {
        let mut state = self.lock();
        let Some(element) = state.elements.iter().find(|e| e.matches(selector)) else {
            return Err(ProbeError::ElementNotFound {
                description: selector.to_string(),
            });
        };
        let is_submit = state
            .submit_key
            .as_ref()
            .is_some_and(|key| element.keys.contains(key));
        if is_submit && !state.input_value.trim().is_empty() {
            let query = state.input_value.clone();
            state.submitted.push(query);
            state.response_rendered = true;
        }
        Ok(())
    }

    async fn viewport(&self) -> ProbeResult<Viewport> {
        Ok(self.lock().viewport.clone())
    }

    async fn set_viewport(&self, viewport: &Viewport) -> ProbeResult<()> {
        self.lock().viewport = viewport.clone();
        Ok(())
    }

    async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
        let mut state = self.lock();
        if state.screenshot_fails {
            return Err(ProbeError::ScreenshotError {
                message: "target closed".to_string(),
            });
        }
        state.screenshots_taken += 1;
        Ok(MOCK_PNG.to_vec())
    }

    async fn content(&self) -> ProbeResult<String> {
        let state = self.lock();
        let mut html = String::from("<html><body>\n");
        for element in &state.elements {
            html.push_str(&format!(
                "<{tag} data-key=\"{}\">{}</{tag}>\n",
                element.keys[0],
                element.text,
                tag = element.tag
            ));
        }
        html.push_str("</body></html>\n");
        Ok(html)
    }

    async fn close(&self) -> ProbeResult<()> {
        self.lock().closed = true;
        Ok(())
    }
}

/// Produces pages from a closure, one per scenario attempt
pub struct MockPageFactory<F>
where
    F: Fn() -> MockPage + Send + Sync,
{
    make: F,
}

impl<F> MockPageFactory<F>
where
    F: Fn() -> MockPage + Send + Sync,
{
    /// Create a factory
    pub const fn new(make: F) -> Self {
        Self { make }
    }
}

impl<F> std::fmt::Debug for MockPageFactory<F>
where
    F: Fn() -> MockPage + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockPageFactory").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> PageFactory for MockPageFactory<F>
where
    F: Fn() -> MockPage + Send + Sync,
{
    type Page = MockPage;

    async fn new_page(&self) -> ProbeResult<MockPage> {
        Ok((self.make)())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_submit_renders_response() {
        let page = MockPage::decision_coach(Viewport::default());
        let section = Selector::test_id("summary-section");
        assert!(page.query_all(&section).await.unwrap().is_empty());

        page.fill(&Selector::css("textarea"), "Should I move abroad?")
            .await
            .unwrap();
        page.click(&Selector::css("button[type=\"submit\"]"))
            .await
            .unwrap();

        assert_eq!(page.query_all(&section).await.unwrap().len(), 1);
        assert_eq!(page.submitted(), vec!["Should I move abroad?".to_string()]);
    }

    #[tokio::test]
    async fn test_blank_submit_renders_nothing() {
        let page = MockPage::decision_coach(Viewport::default());
        page.fill(&Selector::css("textarea"), "   ").await.unwrap();
        page.click(&Selector::test_id("submit-button")).await.unwrap();
        assert!(!page.response_rendered());
    }

    #[tokio::test]
    async fn test_navigation_clears_response() {
        let page = MockPage::decision_coach(Viewport::default());
        page.fill(&Selector::css("textarea"), "q").await.unwrap();
        page.click(&Selector::css("button[type=\"submit\"]"))
            .await
            .unwrap();
        page.goto("http://localhost:3000").await.unwrap();
        assert!(!page.response_rendered());
        assert_eq!(page.navigations(), 1);
    }

    #[tokio::test]
    async fn test_deferred_element_mounts_after_queries() {
        let page = MockPage::new(Viewport::default())
            .with_element(MockElement::new("main").centered(1200.0).deferred(2));
        page.goto("http://localhost:3000").await.unwrap();
        let main = Selector::css("main");
        assert!(page.query_all(&main).await.unwrap().is_empty());
        assert!(page.query_all(&main).await.unwrap().is_empty());
        assert_eq!(page.query_all(&main).await.unwrap().len(), 1);

        page.goto("http://localhost:3000").await.unwrap();
        assert!(page.query_all(&main).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tag_from_bare_key() {
        let page = MockPage::new(Viewport::default())
            .with_element(MockElement::new("h2").with_text("Options"))
            .with_element(MockElement::new("#summary").with_text("Summary"));
        let heading = page.query_all(&Selector::css("h2")).await.unwrap();
        let summary = page.query_all(&Selector::css("#summary")).await.unwrap();
        assert!(heading[0].is_heading());
        assert_eq!(summary[0].tag, "div");
    }

    #[tokio::test]
    async fn test_close_marks_page() {
        let page = MockPage::decision_coach(Viewport::default());
        assert!(!page.is_closed());
        page.close().await.unwrap();
        assert!(page.is_closed());
    }

    #[tokio::test]
    async fn test_centered_layout_follows_viewport() {
        let page = MockPage::decision_coach(Viewport::new(800, 600, "narrow"));
        let wrapper = page.query_all(&Selector::css("main")).await.unwrap();
        let bbox = wrapper[0].bounding_box.unwrap();
        assert_eq!(bbox.x, 0.0);
        assert_eq!(bbox.width, 800.0);
    }

    #[tokio::test]
    async fn test_failing_queries_then_recover() {
        let page = MockPage::decision_coach(Viewport::default());
        page.fail_next_queries(1);
        assert!(page.query_all(&Selector::css("main")).await.is_err());
        assert!(page.query_all(&Selector::css("main")).await.is_ok());
    }

    #[tokio::test]
    async fn test_click_missing_element() {
        let page = MockPage::new(Viewport::default());
        let err = page.click(&Selector::css("#missing")).await.unwrap_err();
        assert!(matches!(err, ProbeError::ElementNotFound { .. }));
    }
}
