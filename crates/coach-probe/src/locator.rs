//! Selectors, element snapshots, and prioritized selector fallback chains.
//!
//! The Decision Coach markup is not a fixed contract between releases, so every
//! element the suite cares about is located through a [`SelectorChain`]: an
//! ordered list of selectors tried in sequence, stopping at the first one that
//! matches.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::page::PageHandle;
use crate::result::ProbeResult;

/// A point in 2D space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bounding box for an element, in CSS pixels relative to the viewport
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X position
    pub x: f64,
    /// Y position
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Get the center point
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Whether the box occupies any area
    #[must_use]
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// CSS selector (e.g., "button[type=submit]")
    Css(String),
    /// Test ID selector (data-testid attribute)
    TestId(String),
    /// CSS selector filtered by text content
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text content to match
        text: String,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Create a CSS selector filtered by text
    #[must_use]
    pub fn css_with_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self::CssWithText {
            css: css.into(),
            text: text.into(),
        }
    }

    /// The equivalent CSS selector, if this selector can be expressed as one
    #[must_use]
    pub fn as_css(&self) -> Option<String> {
        match self {
            Self::Css(s) => Some(s.clone()),
            Self::TestId(id) => Some(format!("[data-testid={id:?}]")),
            Self::CssWithText { .. } => None,
        }
    }

    /// JavaScript expression yielding an array of every matching element
    #[must_use]
    pub fn to_query_all(&self) -> String {
        match self {
            Self::Css(s) => format!("Array.from(document.querySelectorAll({s:?}))"),
            Self::TestId(id) => {
                format!("Array.from(document.querySelectorAll('[data-testid={id:?}]'))")
            }
            Self::CssWithText { css, text } => format!(
                "Array.from(document.querySelectorAll({css:?})) \
                 .filter(el => el.textContent.includes({text:?}))"
            ),
        }
    }

    /// JavaScript expression serializing every match into [`ElementSnapshot`] JSON
    #[must_use]
    pub fn to_snapshot_query(&self) -> String {
        format!(
            r"(() => {{
    const nodes = {};
    return nodes.map(el => {{
        const rect = el.getBoundingClientRect();
        const style = window.getComputedStyle(el);
        const rendered = el.getClientRects().length > 0;
        const attributes = {{}};
        for (const attr of el.attributes) {{ attributes[attr.name] = attr.value; }}
        const parent = el.parentElement;
        return {{
            tag: el.tagName.toLowerCase(),
            text: (el.innerText || el.textContent || '').trim(),
            context_text: parent ? (parent.innerText || parent.textContent || '').trim() : '',
            attributes,
            visible: rendered && rect.width > 0 && rect.height > 0
                && style.visibility !== 'hidden' && style.display !== 'none',
            enabled: !el.disabled && el.getAttribute('aria-disabled') !== 'true',
            bounding_box: rendered
                ? {{ x: rect.x, y: rect.y, width: rect.width, height: rect.height }}
                : null,
        }};
    }});
}})()",
            self.to_query_all()
        )
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css={s}"),
            Self::TestId(id) => write!(f, "testid={id}"),
            Self::CssWithText { css, text } => write!(f, "css={css} >> text={text}"),
        }
    }
}

/// Serializable view of one DOM element at the moment it was queried
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    /// Lowercase tag name
    #[serde(default)]
    pub tag: String,
    /// Rendered text of the element itself
    pub text: String,
    /// Rendered text of the element's parent container
    #[serde(default)]
    pub context_text: String,
    /// All attributes on the element
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    /// Rendered with area and not hidden by CSS
    pub visible: bool,
    /// Not disabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Client rect, absent when the element is not rendered
    #[serde(default)]
    pub bounding_box: Option<BoundingBox>,
}

const fn default_enabled() -> bool {
    true
}

impl ElementSnapshot {
    /// Look up an attribute value
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Whether the element is an `h1`..`h6` heading
    #[must_use]
    pub fn is_heading(&self) -> bool {
        matches!(self.tag.as_str(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
    }

    /// Text used for content checks.
    ///
    /// A heading stands in for the container it titles, so its parent's text is
    /// used; so is the parent's text of an element with no text of its own.
    /// Any other element is judged on its own text only.
    #[must_use]
    pub fn content_text(&self) -> &str {
        let own = self.text.trim();
        if self.is_heading() || own.is_empty() {
            let context = self.context_text.trim();
            if !context.is_empty() {
                return context;
            }
        }
        own
    }
}

/// A selector that matched, together with the element it resolved to
#[derive(Debug, Clone)]
pub struct Resolved {
    /// The selector from the chain that matched
    pub selector: Selector,
    /// The matched element
    pub element: ElementSnapshot,
}

/// Ordered list of selectors tried until one matches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorChain {
    /// Human-readable name used in errors and logs
    pub name: String,
    /// Selectors in priority order
    pub selectors: Vec<Selector>,
}

impl SelectorChain {
    /// Create a chain
    #[must_use]
    pub fn new(name: impl Into<String>, selectors: Vec<Selector>) -> Self {
        Self {
            name: name.into(),
            selectors,
        }
    }

    /// Append a lower-priority fallback
    #[must_use]
    pub fn or(mut self, selector: Selector) -> Self {
        self.selectors.push(selector);
        self
    }

    /// First selector that resolves to a visible element
    pub async fn first_visible<P: PageHandle + ?Sized>(
        &self,
        page: &P,
    ) -> ProbeResult<Option<Resolved>> {
        for selector in &self.selectors {
            let matches = page.query_all(selector).await?;
            if let Some(element) = matches.into_iter().find(|e| e.visible) {
                tracing::debug!(chain = %self.name, %selector, "resolved visible element");
                return Ok(Some(Resolved {
                    selector: selector.clone(),
                    element,
                }));
            }
        }
        tracing::debug!(chain = %self.name, "no visible element for any selector");
        Ok(None)
    }

    /// First selector that matches at least one element, with all of its matches
    pub async fn first_matching<P: PageHandle + ?Sized>(
        &self,
        page: &P,
    ) -> ProbeResult<Option<(Selector, Vec<ElementSnapshot>)>> {
        for selector in &self.selectors {
            let matches = page.query_all(selector).await?;
            if !matches.is_empty() {
                tracing::debug!(
                    chain = %self.name,
                    %selector,
                    count = matches.len(),
                    "selector matched"
                );
                return Ok(Some((selector.clone(), matches)));
            }
        }
        Ok(None)
    }

    /// First selector yielding an element with a bounding box
    pub async fn first_with_box<P: PageHandle + ?Sized>(
        &self,
        page: &P,
    ) -> ProbeResult<Option<(Selector, BoundingBox)>> {
        for selector in &self.selectors {
            let matches = page.query_all(selector).await?;
            if let Some(bbox) = matches.iter().find_map(|e| e.bounding_box) {
                return Ok(Some((selector.clone(), bbox)));
            }
        }
        Ok(None)
    }

    /// Comma-separated selector list for error messages
    #[must_use]
    pub fn describe(&self) -> String {
        let tried: Vec<String> = self.selectors.iter().map(ToString::to_string).collect();
        format!("{} (tried: {})", self.name, tried.join(", "))
    }
}
