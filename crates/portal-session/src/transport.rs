use std::pin::Pin;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Capability for issuing one logical chat request against the backend.
///
/// A successful call hands back the raw response byte stream; chunk
/// boundaries carry no meaning and may fall anywhere. Failures (request
/// refused, non-success status) surface as the returned error.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, content: &str, conversation_id: &str) -> Result<ByteStream>;
}
