//! Content safety port
//!
//! Screens user-submitted task descriptions before any agent sees them.

use async_trait::async_trait;

#[async_trait]
pub trait ContentSafety: Send + Sync {
    /// `true` when the text may be processed.
    async fn is_safe(&self, text: &str) -> bool;
}

/// Accepts everything. Used when the safety check is disabled.
pub struct AllowAllContent;

#[async_trait]
impl ContentSafety for AllowAllContent {
    async fn is_safe(&self, _text: &str) -> bool {
        true
    }
}
