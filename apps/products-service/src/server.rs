//! Server loop: one queue subscription per message pattern, every message
//! handled on its own task, replies published to the message's reply subject.

use crate::envelope::{IncomingRequest, OutgoingResponse};
use crate::messaging::{MessageBroker, MessageStream, ReceivedMessage};
use core_config::nats::NatsConfig;
use domain_products::{ProductPattern, ProductRepository, ProductRpcHandler};
use eyre::Result;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

pub struct ProductsServer<B: MessageBroker, R: ProductRepository> {
    broker: Arc<B>,
    handler: ProductRpcHandler<R>,
    nats: NatsConfig,
}

impl<B, R> ProductsServer<B, R>
where
    B: MessageBroker + 'static,
    R: ProductRepository + 'static,
{
    pub fn new(broker: Arc<B>, handler: ProductRpcHandler<R>, nats: NatsConfig) -> Self {
        Self {
            broker,
            handler,
            nats,
        }
    }

    /// Serve every pattern until `shutdown` flips to `true`.
    ///
    /// In-flight messages are finished and their replies flushed before this
    /// returns.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> Result<()> {
        let mut listeners = JoinSet::new();

        for pattern in ProductPattern::iter() {
            let subject = self.nats.subject_for(pattern.as_ref());
            let stream = self
                .broker
                .queue_subscribe(&subject, &self.nats.queue_group)
                .await?;

            info!(
                subject = %subject,
                queue_group = %self.nats.queue_group,
                "Subscribed to message pattern"
            );

            listeners.spawn(listen(
                Arc::clone(&self.broker),
                self.handler.clone(),
                pattern,
                stream,
                shutdown.clone(),
            ));
        }

        info!("Products service ready");

        while let Some(joined) = listeners.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Pattern listener panicked");
            }
        }

        self.broker.flush().await
    }
}

/// Receive messages for one pattern until shutdown or the subscription closes
async fn listen<B, R>(
    broker: Arc<B>,
    handler: ProductRpcHandler<R>,
    pattern: ProductPattern,
    mut stream: Box<dyn MessageStream>,
    mut shutdown: watch::Receiver<bool>,
) where
    B: MessageBroker + 'static,
    R: ProductRepository + 'static,
{
    let mut in_flight = JoinSet::new();

    while !*shutdown.borrow() {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            message = stream.next() => match message {
                Some(message) => {
                    // Reap finished handlers so the set doesn't grow unbounded
                    while in_flight.try_join_next().is_some() {}
                    in_flight.spawn(handle_message(
                        Arc::clone(&broker),
                        handler.clone(),
                        pattern,
                        message,
                    ));
                }
                None => {
                    warn!(%pattern, "Subscription closed");
                    break;
                }
            },
        }
    }

    debug!(%pattern, pending = in_flight.len(), "Draining in-flight messages");
    while in_flight.join_next().await.is_some() {}
}

/// Decode, dispatch and reply to a single message
#[instrument(skip(broker, handler, message), fields(subject = %message.subject))]
async fn handle_message<B, R>(
    broker: Arc<B>,
    handler: ProductRpcHandler<R>,
    pattern: ProductPattern,
    message: ReceivedMessage,
) where
    B: MessageBroker,
    R: ProductRepository,
{
    let Some(reply_to) = message.reply.as_deref() else {
        warn!("Message has no reply subject, dropping");
        return;
    };

    let reply = match IncomingRequest::decode(&message.payload) {
        Ok(request) => {
            let result = handler.dispatch(pattern, request.data).await;
            OutgoingResponse::from_result(request.id, result)
        }
        Err(err) => OutgoingResponse::from_result(None, Err(err)),
    };

    if let Some(err) = &reply.err {
        debug!(status = err.status, message = %err.message, "Replying with error");
    }

    let bytes = match serde_json::to_vec(&reply) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(error = %e, "Failed to encode reply");
            return;
        }
    };

    if let Err(e) = broker.publish_raw(reply_to, &bytes).await {
        error!(error = ?e, "Failed to publish reply");
    }
}
