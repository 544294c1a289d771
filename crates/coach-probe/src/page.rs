//! The page surface every validator and scenario is written against.
//!
//! [`crate::Browser`] pages (feature `browser`) drive Chromium over CDP;
//! [`crate::mock::MockPage`] answers the same calls from an in-memory model.

use async_trait::async_trait;

use crate::locator::{ElementSnapshot, Selector};
use crate::result::ProbeResult;
use crate::viewport::Viewport;

/// A single browser tab owned by one scenario
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// Navigate to a URL and wait for the load event
    async fn goto(&self, url: &str) -> ProbeResult<()>;

    /// Snapshot every element matching `selector` (empty when none match)
    async fn query_all(&self, selector: &Selector) -> ProbeResult<Vec<ElementSnapshot>>;

    /// Replace the value of the first matching input with `text`
    async fn fill(&self, selector: &Selector, text: &str) -> ProbeResult<()>;

    /// Click the first matching element
    async fn click(&self, selector: &Selector) -> ProbeResult<()>;

    /// Current viewport size
    async fn viewport(&self) -> ProbeResult<Viewport>;

    /// Resize the viewport
    async fn set_viewport(&self, viewport: &Viewport) -> ProbeResult<()>;

    /// PNG screenshot of the visible viewport
    async fn screenshot(&self) -> ProbeResult<Vec<u8>>;

    /// Serialized HTML of the current document
    async fn content(&self) -> ProbeResult<String>;

    /// Close the page and release whatever isolation it was opened in
    async fn close(&self) -> ProbeResult<()>;
}

/// Opens a fresh, isolated page per scenario attempt
#[async_trait]
pub trait PageFactory: Send + Sync {
    /// Page type produced
    type Page: PageHandle;

    /// Open a new page
    async fn new_page(&self) -> ProbeResult<Self::Page>;
}
