//! Notifications
//!
//! Mutations report outcomes through an unbounded channel instead of touching
//! any UI directly. The `Toaster` drains the channel, logs each notification
//! and keeps the most recent ones for the API.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use solana_sdk::signature::Signature;
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::onchain_instance::cluster::ClusterConfig;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// A confirmed transaction.
    Transaction {
        signature: String,
        explorer_url: String,
        at: DateTime<Utc>,
    },
    Error {
        message: String,
        at: DateTime<Utc>,
    },
}

/// Sending half handed to the data-access layer.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn transaction(&self, signature: &Signature, cluster: &ClusterConfig) {
        self.send(Notification::Transaction {
            signature: signature.to_string(),
            explorer_url: cluster.explorer_url(&format!("tx/{}", signature)),
            at: Utc::now(),
        });
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(Notification::Error {
            message: message.into(),
            at: Utc::now(),
        });
    }

    fn send(&self, notification: Notification) {
        if let Err(e) = self.sender.send(notification) {
            warn!("Failed to send notification to channel: {}", e);
        }
    }
}

/// Consumer of notifications.
#[derive(Debug, Clone)]
pub struct Toaster {
    history: Arc<RwLock<VecDeque<Notification>>>,
    capacity: usize,
}

impl Toaster {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Drain `receiver` on a background task until every `Notifier` is dropped.
    pub fn spawn(&self, mut receiver: mpsc::UnboundedReceiver<Notification>) -> JoinHandle<()> {
        let toaster = self.clone();
        tokio::spawn(async move {
            while let Some(notification) = receiver.recv().await {
                toaster.push(notification).await;
            }
            info!("Notification channel closed");
        })
    }

    pub async fn push(&self, notification: Notification) {
        match &notification {
            Notification::Transaction { signature, explorer_url, .. } => {
                info!("Transaction sent: {} ({})", signature, explorer_url);
            }
            Notification::Error { message, .. } => {
                error!("{}", message);
            }
        }

        if self.capacity == 0 {
            return;
        }
        let mut history = self.history.write().await;
        while history.len() >= self.capacity {
            history.pop_front();
        }
        history.push_back(notification);
    }

    /// Most recent notifications, newest last.
    pub async fn recent(&self) -> Vec<Notification> {
        self.history.read().await.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_transaction_notification_links_explorer() {
        let (notifier, mut receiver) = Notifier::channel();
        let signature = Signature::new_unique();

        notifier.transaction(&signature, &ClusterConfig::devnet());

        match receiver.recv().await.unwrap() {
            Notification::Transaction { signature: sig, explorer_url, .. } => {
                assert_eq!(sig, signature.to_string());
                assert_eq!(
                    explorer_url,
                    format!("https://explorer.solana.com/tx/{}?cluster=devnet", signature)
                );
            }
            other => panic!("unexpected notification: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped_does_not_panic() {
        let (notifier, receiver) = Notifier::channel();
        drop(receiver);
        notifier.error("Failed to initialize account");
    }

    #[tokio::test]
    async fn test_toaster_keeps_most_recent() {
        let toaster = Toaster::new(2);
        for message in ["first", "second", "third"] {
            toaster
                .push(Notification::Error {
                    message: message.to_string(),
                    at: Utc::now(),
                })
                .await;
        }

        let messages: Vec<String> = toaster
            .recent()
            .await
            .into_iter()
            .map(|n| match n {
                Notification::Error { message, .. } => message,
                Notification::Transaction { signature, .. } => signature,
            })
            .collect();
        assert_eq!(messages, vec!["second", "third"]);
    }

    #[tokio::test]
    async fn test_spawned_toaster_drains_channel() {
        let (notifier, receiver) = Notifier::channel();
        let toaster = Toaster::new(10);
        let handle = toaster.spawn(receiver);

        notifier.error("boom");
        drop(notifier);
        handle.await.unwrap();

        assert_eq!(toaster.recent().await.len(), 1);
    }
}
