//! Screenshot and page-dump artifacts written during a run.

use std::path::{Path, PathBuf};

use crate::page::PageHandle;
use crate::result::ProbeResult;

/// Subdirectory for PNG screenshots
pub const SCREENSHOT_DIR: &str = "screenshots";

/// Subdirectory for HTML page dumps
pub const PAGE_DIR: &str = "pages";

/// Reduce a scenario or operation name to `[a-z0-9_-]`, collapsing separators
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        let mapped = if c.is_ascii_alphanumeric() || c == '_' {
            c
        } else {
            '-'
        };
        if mapped == '-' && (out.is_empty() || out.ends_with('-')) {
            continue;
        }
        out.push(mapped);
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        "unnamed".to_string()
    } else {
        out
    }
}

/// Output directory layout for one run
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Store rooted at `root` (directories are created on first write)
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root output directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where a screenshot for `name` / `suffix` is written
    #[must_use]
    pub fn screenshot_path(&self, name: &str, suffix: &str) -> PathBuf {
        self.root
            .join(SCREENSHOT_DIR)
            .join(format!("{}-{}.png", sanitize_name(name), sanitize_name(suffix)))
    }

    /// Where an HTML dump for `name` / `suffix` is written
    #[must_use]
    pub fn page_dump_path(&self, name: &str, suffix: &str) -> PathBuf {
        self.root
            .join(PAGE_DIR)
            .join(format!("{}-{}.html", sanitize_name(name), sanitize_name(suffix)))
    }

    /// Write PNG bytes
    pub async fn write_screenshot(
        &self,
        name: &str,
        suffix: &str,
        png: &[u8],
    ) -> ProbeResult<PathBuf> {
        let path = self.screenshot_path(name, suffix);
        write_file(&path, png).await?;
        Ok(path)
    }

    /// Write an HTML page dump
    pub async fn write_page_dump(
        &self,
        name: &str,
        suffix: &str,
        html: &str,
    ) -> ProbeResult<PathBuf> {
        let path = self.page_dump_path(name, suffix);
        write_file(&path, html.as_bytes()).await?;
        Ok(path)
    }

    /// Capture and store a screenshot, logging instead of failing
    pub async fn capture_screenshot<P: PageHandle + ?Sized>(
        &self,
        page: &P,
        name: &str,
        suffix: &str,
    ) -> Option<PathBuf> {
        let captured = match page.screenshot().await {
            Ok(png) => self.write_screenshot(name, suffix, &png).await,
            Err(e) => Err(e),
        };
        match captured {
            Ok(path) => {
                tracing::info!(name, path = %path.display(), "screenshot saved");
                Some(path)
            }
            Err(e) => {
                tracing::warn!(name, error = %e, "screenshot capture failed");
                None
            }
        }
    }

    /// Capture and store the page HTML, logging instead of failing
    pub async fn capture_page_dump<P: PageHandle + ?Sized>(
        &self,
        page: &P,
        name: &str,
        suffix: &str,
    ) -> Option<PathBuf> {
        let captured = match page.content().await {
            Ok(html) => self.write_page_dump(name, suffix, &html).await,
            Err(e) => Err(e),
        };
        match captured {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(name, error = %e, "page dump failed");
                None
            }
        }
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> ProbeResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockPage, MOCK_PNG};
    use crate::viewport::Viewport;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Layout: Viewport Sweep"), "layout-viewport-sweep");
        assert_eq!(sanitize_name("wait for response (attempt 2)"), "wait-for-response-attempt-2");
        assert_eq!(sanitize_name("--"), "unnamed");
        assert_eq!(sanitize_name("basic_rendering"), "basic_rendering");
    }

    #[test]
    fn test_paths() {
        let store = ArtifactStore::new("/tmp/out");
        assert_eq!(
            store.screenshot_path("Basic Rendering", "success"),
            PathBuf::from("/tmp/out/screenshots/basic-rendering-success.png")
        );
        assert_eq!(
            store.page_dump_path("error states", "failure"),
            PathBuf::from("/tmp/out/pages/error-states-failure.html")
        );
    }

    #[tokio::test]
    async fn test_capture_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let page = MockPage::new(Viewport::default());
        let path = store
            .capture_screenshot(&page, "basic rendering", "success")
            .await
            .unwrap();
        assert_eq!(std::fs::read(path).unwrap(), MOCK_PNG);
    }

    #[tokio::test]
    async fn test_capture_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let page = MockPage::new(Viewport::default());
        page.fail_screenshots();
        assert!(store.capture_screenshot(&page, "x", "y").await.is_none());
    }

    #[tokio::test]
    async fn test_page_dump() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let page = MockPage::decision_coach(Viewport::default());
        let path = store.capture_page_dump(&page, "dump", "failure").await.unwrap();
        let html = std::fs::read_to_string(path).unwrap();
        assert!(html.contains("<html>"));
    }
}
