//! News collaborator seam
//!
//! An optional external check for fresh news on a pair. `None` means the
//! collaborator has no answer; the engine treats that as "no news", never as
//! an error.

use async_trait::async_trait;

#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Whether fresh news exists for the pair
    async fn has_news(&self, pair: &str) -> Option<bool>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Default provider: news checking is not wired up
pub struct DisabledNews;

#[async_trait]
impl NewsProvider for DisabledNews {
    async fn has_news(&self, _pair: &str) -> Option<bool> {
        None
    }

    fn name(&self) -> &str {
        "disabled"
    }
}
