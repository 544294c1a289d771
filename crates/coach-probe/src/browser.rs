//! Browser control for headless testing.
//!
//! When compiled with the `browser` feature this module drives Chromium through
//! the Chrome `DevTools` Protocol via chromiumoxide. Each page is opened in its
//! own browser context so scenarios never share cookies or storage; closing the
//! page disposes of that context.

use serde::{Deserialize, Serialize};

/// Browser configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport every new page starts with
    pub viewport_width: u32,
    /// Viewport every new page starts with
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Per-CDP-request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            chromium_path: None,
            sandbox: true,
            request_timeout_ms: 30_000,
        }
    }
}

impl BrowserConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Starting viewport of every new page
    #[must_use]
    pub fn viewport(&self) -> crate::viewport::Viewport {
        crate::viewport::Viewport::new(self.viewport_width, self.viewport_height, "Default")
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

#[cfg(feature = "browser")]
#[allow(clippy::wildcard_imports)]
mod cdp {
    use super::*;
    use crate::locator::{ElementSnapshot, Selector};
    use crate::page::{PageFactory, PageHandle};
    use crate::result::{ProbeError, ProbeResult};
    use crate::viewport::Viewport;
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
    use chromiumoxide::cdp::browser_protocol::page::{
        CaptureScreenshotFormat, CaptureScreenshotParams,
    };
    use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
    use chromiumoxide::cdp::browser_protocol::target::{
        CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
    };
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    fn page_err(e: impl std::fmt::Display) -> ProbeError {
        ProbeError::PageError {
            message: e.to_string(),
        }
    }

    /// Browser instance with a live CDP connection
    #[derive(Debug)]
    pub struct Browser {
        config: BrowserConfig,
        inner: Arc<Mutex<CdpBrowser>>,
        handle: tokio::task::JoinHandle<()>,
    }

    impl Browser {
        /// Launch a new browser instance
        pub async fn launch(config: BrowserConfig) -> ProbeResult<Self> {
            let mut builder = CdpConfig::builder()
                .window_size(config.viewport_width, config.viewport_height)
                .request_timeout(Duration::from_millis(config.request_timeout_ms));

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder
                .build()
                .map_err(|e| ProbeError::BrowserLaunchError { message: e })?;

            let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(|e| {
                ProbeError::BrowserLaunchError {
                    message: e.to_string(),
                }
            })?;

            let handle = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            tracing::info!(headless = config.headless, "browser launched");

            Ok(Self {
                config,
                inner: Arc::new(Mutex::new(browser)),
                handle,
            })
        }

        /// Open a page in a fresh browser context
        pub async fn new_page(&self) -> ProbeResult<Page> {
            let mut browser = self.inner.lock().await;
            let context_id = browser
                .create_browser_context(CreateBrowserContextParams::default())
                .await
                .map_err(page_err)?;
            let target = CreateTargetParams::builder()
                .url("about:blank")
                .browser_context_id(context_id.clone())
                .build()
                .map_err(page_err)?;
            let cdp_page = browser.new_page(target).await.map_err(page_err)?;
            drop(browser);

            let page = Page {
                inner: cdp_page,
                browser: Arc::clone(&self.inner),
                context_id,
            };
            page.set_viewport(&Viewport::new(
                self.config.viewport_width,
                self.config.viewport_height,
                "Default",
            ))
            .await?;
            Ok(page)
        }

        /// Get the browser configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }

        /// Close the browser
        pub async fn close(self) -> ProbeResult<()> {
            let mut browser = self.inner.lock().await;
            browser
                .close()
                .await
                .map_err(|e| ProbeError::BrowserLaunchError {
                    message: e.to_string(),
                })?;
            drop(browser);
            self.handle.abort();
            Ok(())
        }
    }

    #[async_trait]
    impl PageFactory for Browser {
        type Page = Page;

        async fn new_page(&self) -> ProbeResult<Page> {
            Self::new_page(self).await
        }
    }

    /// A browser page with a live CDP connection
    #[derive(Debug, Clone)]
    pub struct Page {
        inner: CdpPage,
        browser: Arc<Mutex<CdpBrowser>>,
        context_id: BrowserContextId,
    }

    #[derive(serde::Deserialize)]
    struct WindowSize {
        width: u32,
        height: u32,
    }

    impl Page {
        async fn eval<T: serde::de::DeserializeOwned>(&self, expr: String) -> ProbeResult<T> {
            let result = self
                .inner
                .evaluate(expr)
                .await
                .map_err(|e| ProbeError::EvaluationError {
                    message: e.to_string(),
                })?;
            result
                .into_value()
                .map_err(|e| ProbeError::EvaluationError {
                    message: e.to_string(),
                })
        }
    }

    #[async_trait]
    impl PageHandle for Page {
        async fn goto(&self, url: &str) -> ProbeResult<()> {
            self.inner
                .goto(url)
                .await
                .map_err(|e| ProbeError::NavigationError {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            Ok(())
        }

        async fn query_all(&self, selector: &Selector) -> ProbeResult<Vec<ElementSnapshot>> {
            self.eval(selector.to_snapshot_query()).await
        }

        async fn fill(&self, selector: &Selector, text: &str) -> ProbeResult<()> {
            let css = selector.as_css().ok_or_else(|| ProbeError::InputError {
                message: format!("cannot type into non-CSS selector {selector}"),
            })?;
            let element = self
                .inner
                .find_element(css)
                .await
                .map_err(|e| ProbeError::ElementNotFound {
                    description: format!("{selector}: {e}"),
                })?;
            element
                .call_js_fn(
                    "function() { this.value = ''; \
                     this.dispatchEvent(new Event('input', { bubbles: true })); }",
                    false,
                )
                .await
                .map_err(|e| ProbeError::InputError {
                    message: e.to_string(),
                })?;
            element
                .click()
                .await
                .map_err(|e| ProbeError::InputError {
                    message: e.to_string(),
                })?
                .type_str(text)
                .await
                .map_err(|e| ProbeError::InputError {
                    message: e.to_string(),
                })?;
            Ok(())
        }

        async fn click(&self, selector: &Selector) -> ProbeResult<()> {
            if let Some(css) = selector.as_css() {
                let element = self.inner.find_element(css).await.map_err(|e| {
                    ProbeError::ElementNotFound {
                        description: format!("{selector}: {e}"),
                    }
                })?;
                element.click().await.map_err(|e| ProbeError::InputError {
                    message: e.to_string(),
                })?;
                return Ok(());
            }
            let clicked: bool = self
                .eval(format!(
                    "(() => {{ const el = {}[0]; if (!el) return false; \
                     el.click(); return true; }})()",
                    selector.to_query_all()
                ))
                .await?;
            if clicked {
                Ok(())
            } else {
                Err(ProbeError::ElementNotFound {
                    description: selector.to_string(),
                })
            }
        }

        async fn viewport(&self) -> ProbeResult<Viewport> {
            let size: WindowSize = self
                .eval("({ width: window.innerWidth, height: window.innerHeight })".to_string())
                .await?;
            Ok(Viewport::new(size.width, size.height, "Current"))
        }

        async fn set_viewport(&self, viewport: &Viewport) -> ProbeResult<()> {
            let params = SetDeviceMetricsOverrideParams::builder()
                .width(i64::from(viewport.width))
                .height(i64::from(viewport.height))
                .device_scale_factor(1.0)
                .mobile(viewport.is_narrow())
                .build()
                .map_err(page_err)?;
            self.inner.execute(params).await.map_err(page_err)?;
            tracing::debug!(viewport = %viewport, "viewport set");
            Ok(())
        }

        async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
            let params = CaptureScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .build();

            let screenshot =
                self.inner
                    .execute(params)
                    .await
                    .map_err(|e| ProbeError::ScreenshotError {
                        message: e.to_string(),
                    })?;

            use base64::Engine;
            base64::engine::general_purpose::STANDARD
                .decode(&screenshot.data)
                .map_err(|e| ProbeError::ScreenshotError {
                    message: e.to_string(),
                })
        }

        async fn content(&self) -> ProbeResult<String> {
            self.inner.content().await.map_err(page_err)
        }

        async fn close(&self) -> ProbeResult<()> {
            self.inner.clone().close().await.map_err(page_err)?;
            self.browser
                .lock()
                .await
                .execute(DisposeBrowserContextParams::new(self.context_id.clone()))
                .await
                .map_err(page_err)?;
            tracing::debug!(context = ?self.context_id, "browser context disposed");
            Ok(())
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::{Browser, Page};
