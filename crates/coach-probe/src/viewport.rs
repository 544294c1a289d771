//! Viewport sizes used for layout checks.

use serde::{Deserialize, Serialize};

/// Widths at or below this are treated as narrow (tablet portrait and phones)
pub const NARROW_MAX_WIDTH: u32 = 768;

/// Viewport dimensions with a display label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Name used in logs and failure messages
    pub label: String,
}

impl Viewport {
    /// Create a new viewport
    #[must_use]
    pub fn new(width: u32, height: u32, label: impl Into<String>) -> Self {
        Self {
            width,
            height,
            label: label.into(),
        }
    }

    /// Horizontal center in CSS pixels
    #[must_use]
    pub fn center_x(&self) -> f64 {
        f64::from(self.width) / 2.0
    }

    /// Whether this viewport is expected to reflow like a mobile layout
    #[must_use]
    pub const fn is_narrow(&self) -> bool {
        self.width <= NARROW_MAX_WIDTH
    }

    /// The fixed sweep used by the layout centering scenario
    #[must_use]
    pub fn sweep() -> Vec<Self> {
        vec![
            Self::new(1920, 1080, "Desktop Large"),
            Self::new(1366, 768, "Desktop Standard"),
            Self::new(1024, 768, "Tablet Landscape"),
            Self::new(768, 1024, "Tablet Portrait"),
            Self::new(375, 667, "Mobile"),
            Self::new(320, 568, "Mobile Small"),
        ]
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720, "Default")
    }
}

impl std::fmt::Display for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}x{})", self.label, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_has_six_fixed_sizes() {
        let sizes: Vec<(u32, u32)> = Viewport::sweep()
            .iter()
            .map(|v| (v.width, v.height))
            .collect();
        assert_eq!(
            sizes,
            vec![
                (1920, 1080),
                (1366, 768),
                (1024, 768),
                (768, 1024),
                (375, 667),
                (320, 568)
            ]
        );
    }

    #[test]
    fn test_narrow_boundary() {
        assert!(Viewport::new(768, 1024, "tablet").is_narrow());
        assert!(!Viewport::new(769, 1024, "wide").is_narrow());
    }

    #[test]
    fn test_display_includes_label() {
        let vp = Viewport::new(375, 667, "Mobile");
        assert_eq!(vp.to_string(), "Mobile (375x667)");
        assert_eq!(vp.center_x(), 187.5);
    }
}
