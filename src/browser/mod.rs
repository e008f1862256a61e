//! Browser-driven page sessions
//!
//! Category and listing pages on the storefront render client-side, so
//! they have to be loaded through a real browser. These traits keep the
//! crawl logic independent of the concrete backend, which also lets the
//! listing and orchestration layers run against scripted sessions in
//! tests.

mod chrome;

pub use chrome::ChromeNavigator;

use crate::Result;
use async_trait::async_trait;

/// Desktop identity presented to the storefront.
pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120 Safari/537.36";

/// An open page on the target site.
#[async_trait]
pub trait PageSession: Send {
    /// Returns the page's current serialized DOM.
    async fn content(&self) -> Result<String>;

    /// Scrolls the viewport down by one viewport height.
    async fn scroll_by_viewport(&self) -> Result<()>;

    /// Dispatches a synthetic wheel event. Some listings only load more
    /// items on native scroll input, not on position changes.
    async fn nudge_wheel(&self) -> Result<()>;

    /// Clicks the first link or button whose trimmed text equals `label`
    /// case-insensitively. Returns whether such a control existed.
    async fn activate_control(&self, label: &str) -> Result<bool>;

    /// Closes the page.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Opens pages on the target site.
#[async_trait]
pub trait Navigator: Send + Sync {
    /// Navigates to `url` and returns the page once the initial document
    /// has loaded and had a moment to settle.
    async fn visit(&self, url: &str) -> Result<Box<dyn PageSession>>;
}
