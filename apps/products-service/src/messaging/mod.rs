//! Messaging abstraction layer
//!
//! Trait-based pub/sub so the server loop can run against NATS in
//! production and an in-process broker in tests.

mod nats_broker;

pub use nats_broker::NatsBroker;

use async_trait::async_trait;
use eyre::Result;

/// Received message with metadata
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    /// Subject the message was received on
    pub subject: String,
    /// Raw payload bytes
    pub payload: Vec<u8>,
    /// Reply subject for request-reply patterns
    pub reply: Option<String>,
}

/// Abstract message broker interface
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Publish raw bytes to a subject
    async fn publish_raw(&self, subject: &str, payload: &[u8]) -> Result<()>;

    /// Create a queue group subscription (load-balanced across replicas)
    async fn queue_subscribe(
        &self,
        subject: &str,
        queue_group: &str,
    ) -> Result<Box<dyn MessageStream>>;

    /// Wait until everything published so far has been written out
    async fn flush(&self) -> Result<()>;
}

/// Stream of incoming messages
#[async_trait]
pub trait MessageStream: Send + Sync {
    /// Receive the next message; `None` once the subscription is closed
    async fn next(&mut self) -> Option<ReceivedMessage>;
}
