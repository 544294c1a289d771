//! End-to-end scenarios against the Decision Coach frontend.
//!
//! Each scenario owns its page and runs its steps strictly in order:
//! readiness, navigate, input, submit, wait for render, validate.

mod runner;
mod steps;

pub use runner::ScenarioRunner;
pub use steps::{ScenarioContext, QUERY_SET, PRIMARY_QUERY};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::page::PageHandle;
use crate::result::{ProbeError, ProbeResult};

/// One user-facing behavior under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Submit a query; every required section and tooltip renders well-formed
    BasicRendering,
    /// Several query types each render every required section
    MultipleQueries,
    /// Empty, whitespace, and over-long queries leave the input usable
    ErrorStates,
    /// Wrapper centered at the default viewport
    LayoutDefault,
    /// Wrapper centered at each sweep viewport
    LayoutViewportSweep,
    /// Wrapper stays put while the response renders
    LayoutDynamicStability,
}

impl Scenario {
    /// Every scenario in run order
    pub const ALL: [Self; 6] = [
        Self::BasicRendering,
        Self::MultipleQueries,
        Self::ErrorStates,
        Self::LayoutDefault,
        Self::LayoutViewportSweep,
        Self::LayoutDynamicStability,
    ];

    /// Stable snake_case name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BasicRendering => "basic_rendering",
            Self::MultipleQueries => "multiple_queries",
            Self::ErrorStates => "error_states",
            Self::LayoutDefault => "layout_default",
            Self::LayoutViewportSweep => "layout_viewport_sweep",
            Self::LayoutDynamicStability => "layout_dynamic_stability",
        }
    }

    /// One-line description
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::BasicRendering => "query renders all sections and well-formed tooltips",
            Self::MultipleQueries => {
                "career, financial, relationship, and relocation queries render"
            }
            Self::ErrorStates => {
                "empty, whitespace-only, and over-long queries keep the input usable"
            }
            Self::LayoutDefault => "layout wrapper is centered at the default viewport",
            Self::LayoutViewportSweep => "layout wrapper is centered across six viewport sizes",
            Self::LayoutDynamicStability => {
                "layout wrapper does not shift when the response renders, narrow and wide"
            }
        }
    }

    /// Scenarios whose name contains `filter` (all when `None`)
    #[must_use]
    pub fn select(filter: Option<&str>) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|s| filter.map_or(true, |f| s.name().contains(f)))
            .collect()
    }

    /// Run against `ctx`, returning screenshots captured on success
    pub async fn run<P: PageHandle + ?Sized>(
        self,
        ctx: &ScenarioContext<'_, P>,
    ) -> ProbeResult<Vec<PathBuf>> {
        match self {
            Self::BasicRendering => steps::basic_rendering(ctx).await,
            Self::MultipleQueries => steps::multiple_queries(ctx).await,
            Self::ErrorStates => steps::error_states(ctx).await,
            Self::LayoutDefault => steps::layout_default(ctx).await,
            Self::LayoutViewportSweep => steps::layout_viewport_sweep(ctx).await,
            Self::LayoutDynamicStability => steps::layout_dynamic_stability(ctx).await,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|scenario| scenario.name() == s)
            .ok_or_else(|| ProbeError::invalid_config(format!("unknown scenario {s:?}")))
    }
}
