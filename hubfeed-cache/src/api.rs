use async_trait::async_trait;
use hubfeed_msg::{RawHubPost, RawWallPost};
use thiserror::Error as ThisError;

#[derive(Clone, Debug, ThisError)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("unexpected response: {0}")]
    MalformedResponse(String),
}

/// Remote collaborator the cache fetches from and mutates through. Each
/// mutation resolves with the server's authoritative updated record.
#[async_trait]
pub trait FeedApi: Send + Sync {
    async fn fetch_wall_posts(&self) -> Result<Vec<RawWallPost>, ApiError>;

    async fn fetch_hub_posts(&self) -> Result<Vec<RawHubPost>, ApiError>;

    async fn like_wall_post(&self, id: &str) -> Result<RawWallPost, ApiError>;

    async fn like_hub_post(&self, id: &str) -> Result<RawHubPost, ApiError>;

    async fn vote_on_poll(&self, id: &str, option_index: usize) -> Result<RawWallPost, ApiError>;
}
