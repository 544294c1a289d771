//! Horizontal centering of the layout wrapper.
//!
//! `offset = |wrapper_center_x - viewport_width / 2|`. The wrapper is the first
//! element of [`wrapper_chain`] with a bounding box, falling back to `body`.
//! Client-rendered pages mount the wrapper after load, so measurements that
//! follow a navigation wait for it first.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::config::Timeouts;
use crate::locator::{BoundingBox, Selector, SelectorChain};
use crate::page::PageHandle;
use crate::result::{ProbeError, ProbeResult};
use crate::viewport::{Viewport, NARROW_MAX_WIDTH};
use crate::wait::wait_until;

/// Pixel bounds for centering checks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutTolerance {
    /// Largest allowed offset from center
    pub absolute_px: f64,
    /// Largest allowed offset change on narrow viewports
    pub narrow_delta_px: f64,
    /// Largest allowed offset change on wide viewports
    pub wide_delta_px: f64,
    /// Widths up to this value count as narrow
    pub narrow_max_width: u32,
}

impl Default for LayoutTolerance {
    fn default() -> Self {
        Self {
            absolute_px: 5.0,
            narrow_delta_px: 5.0,
            wide_delta_px: 2.0,
            narrow_max_width: NARROW_MAX_WIDTH,
        }
    }
}

impl LayoutTolerance {
    /// Allowed offset change at `viewport_width`
    #[must_use]
    pub fn delta_for(&self, viewport_width: u32) -> f64 {
        if viewport_width <= self.narrow_max_width {
            self.narrow_delta_px
        } else {
            self.wide_delta_px
        }
    }
}

/// Selectors for the app's own layout wrapper
#[must_use]
pub fn mounted_wrapper_chain() -> SelectorChain {
    SelectorChain::new(
        "layout wrapper",
        vec![
            Selector::test_id("layout-wrapper"),
            Selector::css(".layout-wrapper"),
            Selector::css(".app-container"),
            Selector::css("main"),
            Selector::css("#root > div"),
        ],
    )
}

/// Selectors tried for the layout wrapper, `body` last
#[must_use]
pub fn wrapper_chain() -> SelectorChain {
    mounted_wrapper_chain().or(Selector::css("body"))
}

/// One centering measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CenteringMeasurement {
    /// Horizontal center of the wrapper
    pub wrapper_center_x: f64,
    /// Half the viewport width
    pub viewport_center_x: f64,
    /// Absolute distance between the two
    pub offset: f64,
    /// Viewport width at measurement time
    pub viewport_width: u32,
    /// Selector that located the wrapper
    pub wrapper_selector: String,
}

impl CenteringMeasurement {
    /// Measurement from a wrapper box
    #[must_use]
    pub fn from_box(
        bbox: &BoundingBox,
        viewport_width: u32,
        wrapper_selector: impl Into<String>,
    ) -> Self {
        let wrapper_center_x = bbox.center().x;
        let viewport_center_x = f64::from(viewport_width) / 2.0;
        Self {
            wrapper_center_x,
            viewport_center_x,
            offset: (wrapper_center_x - viewport_center_x).abs(),
            viewport_width,
            wrapper_selector: wrapper_selector.into(),
        }
    }
}

impl fmt::Display for CenteringMeasurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "offset {:.1}px (wrapper center {:.1}, viewport center {:.1}, {})",
            self.offset, self.wrapper_center_x, self.viewport_center_x, self.wrapper_selector
        )
    }
}

/// Centering measured at one sweep viewport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportCentering {
    /// Viewport applied
    pub viewport: Viewport,
    /// Measurement after reload
    pub measurement: CenteringMeasurement,
}

/// Before/after measurements around dynamic content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityReport {
    /// Before the action
    pub before: CenteringMeasurement,
    /// After the action
    pub after: CenteringMeasurement,
    /// `|after.offset - before.offset|`
    pub delta: f64,
    /// Allowed delta at this viewport
    pub delta_bound: f64,
}

/// Wait until an element of [`mounted_wrapper_chain`] has a bounding box.
///
/// A page that never mounts one is measured against `body`, so running out of
/// time is logged rather than returned.
pub async fn wait_for_wrapper<P: PageHandle + ?Sized>(
    page: &P,
    timeout: Duration,
    poll_interval: Duration,
) -> ProbeResult<()> {
    let chain = mounted_wrapper_chain();
    let chain = &chain;
    let waited = wait_until("layout wrapper", timeout, poll_interval, move || async move {
        Ok(chain.first_with_box(page).await?.is_some())
    })
    .await;
    match waited {
        Ok(_) => Ok(()),
        Err(ProbeError::Timeout { ms, .. }) => {
            tracing::warn!(waited_ms = ms, "no layout wrapper mounted, measuring body");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Measure wrapper centering at the current viewport
pub async fn measure_centering<P: PageHandle + ?Sized>(
    page: &P,
) -> ProbeResult<CenteringMeasurement> {
    let viewport = page.viewport().await?;
    let chain = wrapper_chain();
    let Some((selector, bbox)) = chain.first_with_box(page).await? else {
        return Err(ProbeError::LayoutUnavailable {
            message: format!("no bounding box for {}", chain.describe()),
        });
    };
    let measurement = CenteringMeasurement::from_box(&bbox, viewport.width, selector.to_string());
    tracing::debug!(
        viewport = %viewport,
        offset = measurement.offset,
        wrapper = %measurement.wrapper_selector,
        "measured centering"
    );
    Ok(measurement)
}

/// Measure and assert `offset <= tolerance.absolute_px`
pub async fn check_centering<P: PageHandle + ?Sized>(
    page: &P,
    tolerance: &LayoutTolerance,
) -> ProbeResult<CenteringMeasurement> {
    let measurement = measure_centering(page).await?;
    if measurement.offset > tolerance.absolute_px {
        let viewport = page.viewport().await?;
        return Err(ProbeError::assertion(format!(
            "wrapper not centered at {viewport}: {measurement} exceeds {}px",
            tolerance.absolute_px
        )));
    }
    Ok(measurement)
}

/// Resize, reload `url`, wait for the wrapper, and measure at each viewport.
///
/// Every viewport is measured; the error lists each one that exceeded tolerance.
pub async fn sweep_viewports<P: PageHandle + ?Sized>(
    page: &P,
    url: &str,
    viewports: &[Viewport],
    tolerance: &LayoutTolerance,
    timeouts: &Timeouts,
) -> ProbeResult<Vec<ViewportCentering>> {
    let mut results = Vec::with_capacity(viewports.len());
    let mut failures = Vec::new();
    for viewport in viewports {
        page.set_viewport(viewport).await?;
        page.goto(url).await?;
        wait_for_wrapper(page, timeouts.element, timeouts.poll_interval).await?;
        let measurement = measure_centering(page).await?;
        if measurement.offset > tolerance.absolute_px {
            tracing::warn!(
                viewport = %viewport,
                offset = measurement.offset,
                "viewport off-center"
            );
            failures.push(format!("{viewport}: {measurement}"));
        } else {
            tracing::info!(viewport = %viewport, offset = measurement.offset, "viewport centered");
        }
        results.push(ViewportCentering {
            viewport: viewport.clone(),
            measurement,
        });
    }
    if failures.is_empty() {
        Ok(results)
    } else {
        Err(ProbeError::assertion(format!(
            "wrapper not centered within {}px at: {}",
            tolerance.absolute_px,
            failures.join("; ")
        )))
    }
}

/// Measure before and after `action`; the after offset must be within the
/// absolute tolerance and its change within the width-dependent delta bound
pub async fn check_stability<P, F, Fut>(
    page: &P,
    tolerance: &LayoutTolerance,
    action: F,
) -> ProbeResult<StabilityReport>
where
    P: PageHandle + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = ProbeResult<()>>,
{
    let before = measure_centering(page).await?;
    action().await?;
    let after = measure_centering(page).await?;

    let delta = (after.offset - before.offset).abs();
    let delta_bound = tolerance.delta_for(after.viewport_width);
    let report = StabilityReport {
        before,
        after,
        delta,
        delta_bound,
    };

    if report.after.offset > tolerance.absolute_px {
        return Err(ProbeError::assertion(format!(
            "wrapper off-center after content loaded: {} exceeds {}px",
            report.after, tolerance.absolute_px
        )));
    }
    if delta > delta_bound {
        return Err(ProbeError::assertion(format!(
            "wrapper shifted {delta:.1}px after content loaded \
             at {}px wide (bound {delta_bound}px)",
            report.after.viewport_width
        )));
    }
    tracing::info!(delta, delta_bound, "layout stable");
    Ok(report)
}
