//! Chromium-backed navigator
//!
//! Drives a headless Chromium over CDP. Every navigation is wrapped in a
//! hard timeout so a wedged page fails that task instead of stalling the
//! whole crawl.

use crate::browser::{Navigator, PageSession, USER_AGENT};
use crate::config::CrawlerConfig;
use crate::{CrawlError, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;

const VIEWPORT_WIDTH: u32 = 1366;
const VIEWPORT_HEIGHT: u32 = 900;

const SCROLL_STEP_JS: &str = "window.scrollBy(0, window.innerHeight)";
const WHEEL_NUDGE_JS: &str =
    "window.dispatchEvent(new WheelEvent('wheel', { deltaY: 600, bubbles: true, cancelable: true }))";

pub struct ChromeNavigator {
    browser: Browser,
    handler_task: JoinHandle<()>,
    navigation_timeout: Duration,
    settle: Duration,
}

impl ChromeNavigator {
    /// Launches a headless browser sized like a desktop session.
    pub async fn launch(crawler: &CrawlerConfig) -> Result<Self> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .window_size(VIEWPORT_WIDTH, VIEWPORT_HEIGHT)
            .arg("--disable-setuid-sandbox")
            .build()
            .map_err(CrawlError::BrowserLaunch)?;

        let (browser, mut handler) = Browser::launch(config).await?;

        // The CDP event stream must be polled for the browser to make
        // any progress at all.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        tracing::info!("Browser launched ({}x{})", VIEWPORT_WIDTH, VIEWPORT_HEIGHT);

        Ok(Self {
            browser,
            handler_task,
            navigation_timeout: Duration::from_secs(crawler.navigation_timeout_secs),
            settle: Duration::from_millis(crawler.settle_millis),
        })
    }

    /// Closes the browser and stops the event loop task.
    pub async fn shutdown(mut self) -> Result<()> {
        self.browser.close().await?;
        self.handler_task.abort();
        tracing::debug!("Browser shut down");
        Ok(())
    }
}

#[async_trait]
impl Navigator for ChromeNavigator {
    async fn visit(&self, url: &str) -> Result<Box<dyn PageSession>> {
        tracing::debug!("Navigating to {}", url);
        let page = self.browser.new_page("about:blank").await?;
        page.set_user_agent(SetUserAgentOverrideParams::new(USER_AGENT))
            .await?;

        let outcome = tokio::time::timeout(self.navigation_timeout, async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<(), CrawlError>(())
        })
        .await;

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = page.close().await;
                return Err(e);
            }
            Err(_) => {
                let _ = page.close().await;
                return Err(CrawlError::NavigationTimeout {
                    url: url.to_string(),
                });
            }
        }

        // Client-side hydration needs a moment before the DOM is worth
        // reading.
        tokio::time::sleep(self.settle).await;

        Ok(Box::new(ChromePage { page }))
    }
}

struct ChromePage {
    page: Page,
}

#[async_trait]
impl PageSession for ChromePage {
    async fn content(&self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    async fn scroll_by_viewport(&self) -> Result<()> {
        self.page.evaluate(SCROLL_STEP_JS).await?;
        Ok(())
    }

    async fn nudge_wheel(&self) -> Result<()> {
        self.page.evaluate(WHEEL_NUDGE_JS).await?;
        Ok(())
    }

    async fn activate_control(&self, label: &str) -> Result<bool> {
        let script = click_control_script(label)?;
        let clicked = self.page.evaluate(script).await?.into_value::<bool>()?;
        Ok(clicked)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.page.close().await?;
        Ok(())
    }
}

/// Builds the in-page script that clicks a pagination control. The
/// label goes through JSON quoting so arbitrary text cannot break out
/// of the script.
fn click_control_script(label: &str) -> Result<String> {
    let quoted = serde_json::to_string(label)?;
    Ok(format!(
        r#"(() => {{
    const wanted = {quoted}.trim().toLowerCase();
    const controls = Array.from(document.querySelectorAll('button, a'));
    const control = controls.find((el) => (el.textContent || '').trim().toLowerCase() === wanted);
    if (!control) return false;
    control.click();
    return true;
}})()"#
    ))
}
