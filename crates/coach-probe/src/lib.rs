//! coach-probe: end-to-end validation of the Decision Coach web app.
//!
//! Drives a page against a running frontend, submits decision queries, and
//! checks that the rendered response meets its content and layout contracts.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    coach-probe                                   │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Scenario   │    │ Validators │    │ PageHandle │            │
//! │   │ Runner     │───►│ + Retry    │───►│ (CDP/mock) │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │         │                                    │                   │
//! │         ▼                                    ▼                   │
//! │   ┌────────────┐                      ┌────────────┐            │
//! │   │ Report     │                      │ Artifacts  │            │
//! │   │ JSON/HTML  │                      │ PNG / HTML │            │
//! │   └────────────┘                      └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validators are written against [`PageHandle`]; enable the `browser`
//! feature for the Chromium implementation, or use [`mock::MockPage`].

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::float_cmp))]

mod artifacts;
mod browser;
mod locator;
mod page;
mod report;
mod result;
mod viewport;

/// Layered suite configuration (defaults, YAML, environment)
pub mod config;

/// Wrapper centering checks across viewports
#[allow(clippy::cast_precision_loss)]
pub mod layout;

/// In-memory page for tests and dry runs
#[allow(clippy::missing_panics_doc)]
pub mod mock;

/// HTTP readiness and interface presence
#[allow(clippy::cast_possible_truncation)]
pub mod readiness;

/// Retry with exponential backoff
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub mod retry;

/// Scenario definitions and runner
pub mod scenario;

/// Section and tooltip content checks
pub mod validators;

/// Polling and deadlines
#[allow(clippy::cast_possible_truncation)]
pub mod wait;

pub use artifacts::{sanitize_name, ArtifactStore, PAGE_DIR, SCREENSHOT_DIR};
#[cfg(feature = "browser")]
pub use browser::{Browser, Page};
pub use browser::BrowserConfig;
pub use config::{SuiteConfig, Timeouts};
pub use layout::{CenteringMeasurement, LayoutTolerance};
pub use locator::{
    BoundingBox, ElementSnapshot, Point, Resolved, Selector, SelectorChain,
};
pub use page::{PageFactory, PageHandle};
pub use readiness::{ReadinessChecker, ReadinessOptions, ReadinessResult};
pub use report::{
    SuiteReport, TestResultEntry, TestStatus, HTML_REPORT, JSON_REPORT, JUNIT_REPORT,
};
pub use result::{ProbeError, ProbeResult};
pub use retry::{with_retry, with_retry_capturing, RetryError, RetryOptions};
pub use scenario::{Scenario, ScenarioRunner};
pub use validators::{
    AllSectionsResult, SectionValidationResult, TooltipValidationResult, ValidationPolicy,
};
pub use viewport::{Viewport, NARROW_MAX_WIDTH};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::artifacts::*;
    pub use super::browser::*;
    pub use super::config::{SuiteConfig, Timeouts};
    pub use super::layout::*;
    pub use super::locator::*;
    pub use super::page::*;
    pub use super::readiness::*;
    pub use super::report::*;
    pub use super::result::*;
    pub use super::retry::*;
    pub use super::scenario::*;
    pub use super::validators::*;
    pub use super::viewport::*;
    pub use super::wait::*;
}
