pub mod iot;
pub mod retry;

use async_trait::async_trait;
use tracing::info;

pub use iot::{IotConfig, IotDataPublisher};
pub use retry::{RetryPolicy, RetryingPublisher};

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("publish rejected: {0}")]
    Rejected(String),

    #[error("publish throttled: {0}")]
    Throttled(String),
}

impl PublishError {
    /// Whether another attempt could succeed without changing the request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PublishError::Connection(_) | PublishError::Throttled(_))
    }
}

/// Hands a payload to a pub/sub endpoint.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), PublishError>;
}

#[async_trait]
impl<P: Publisher + ?Sized> Publisher for Box<P> {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        (**self).publish(topic, payload).await
    }
}

/// Accepts everything and only logs it.
#[derive(Debug, Default)]
pub struct DryRunPublisher;

#[async_trait]
impl Publisher for DryRunPublisher {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        info!(topic, bytes = payload.len(), "dry run: skipped publish");
        Ok(())
    }
}
