//! Strip delivery
//!
//! Each completed session gets one delivery task per requested channel.
//! Tasks hold a guarded status machine (`Pending → Sending → Sent | Error`)
//! and channels are fully independent: an SMS failure never blocks the
//! email, and resending one never touches the other.
//!
//! Automatic dispatch runs exactly once per task; after that, only an
//! explicit resend re-enters `Pending`. There is no automatic retry.

mod email;
mod sms;

pub use email::ResendEmailTransport;
pub use sms::{normalize_phone, TwilioSmsTransport};

use crate::state::SharedState;
use booth_common::events::{BoothEvent, ChannelKind, DeliveryStatus};
use booth_common::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Everything a transport needs to deliver one strip
#[derive(Debug, Clone)]
pub struct SendRequest {
    pub session_id: Uuid,
    pub channel: ChannelKind,
    pub recipient: String,
    /// Encoded strip; shared, never copied per attempt
    pub strip_jpeg: Arc<Vec<u8>>,
    /// Publicly reachable strip URL (required by the MMS transport)
    pub strip_url: Option<String>,
}

/// One delivery channel backend
///
/// `send` returns the provider's message id on success. Transports are
/// stateless; all bookkeeping lives in the dispatcher.
#[async_trait]
pub trait DeliveryTransport: Send + Sync {
    fn channel(&self) -> ChannelKind;
    async fn send(&self, request: &SendRequest) -> Result<String>;
}

/// Per-channel task record
#[derive(Debug, Clone)]
struct DeliveryTask {
    request: SendRequest,
    status: DeliveryStatus,
    /// Error detail; cleared on resend
    detail: Option<String>,
    /// Provider message id from the last successful send
    message_id: Option<String>,
    attempts: u32,
    updated_at: DateTime<Utc>,
}

impl DeliveryTask {
    fn new(request: SendRequest) -> Self {
        Self {
            request,
            status: DeliveryStatus::Pending,
            detail: None,
            message_id: None,
            attempts: 0,
            updated_at: Utc::now(),
        }
    }
}

/// API-facing view of one delivery task
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryView {
    pub channel: ChannelKind,
    pub recipient: String,
    pub status: DeliveryStatus,
    pub detail: Option<String>,
    pub message_id: Option<String>,
    pub attempts: u32,
    pub updated_at: DateTime<Utc>,
}

/// Owns all delivery tasks and is the only writer of their status
pub struct DeliveryDispatcher {
    transports: HashMap<ChannelKind, Arc<dyn DeliveryTransport>>,
    tasks: RwLock<HashMap<(Uuid, ChannelKind), DeliveryTask>>,
    state: Arc<SharedState>,
}

impl DeliveryDispatcher {
    pub fn new(state: Arc<SharedState>) -> Self {
        Self {
            transports: HashMap::new(),
            tasks: RwLock::new(HashMap::new()),
            state,
        }
    }

    pub fn register_transport(&mut self, transport: Arc<dyn DeliveryTransport>) {
        self.transports.insert(transport.channel(), transport);
    }

    pub fn has_transport(&self, channel: ChannelKind) -> bool {
        self.transports.contains_key(&channel)
    }

    /// Create tasks for the requested channels and run each send once
    ///
    /// Channels without a recipient get no task at all. A second dispatch
    /// for the same session is ignored.
    pub async fn dispatch(
        &self,
        session_id: Uuid,
        email: Option<String>,
        phone: Option<String>,
        strip_jpeg: Arc<Vec<u8>>,
        strip_url: Option<String>,
    ) {
        let requests: Vec<SendRequest> = [
            email.map(|r| (ChannelKind::Email, r)),
            phone.map(|r| (ChannelKind::Sms, r)),
        ]
        .into_iter()
        .flatten()
        .map(|(channel, recipient)| SendRequest {
            session_id,
            channel,
            recipient,
            strip_jpeg: Arc::clone(&strip_jpeg),
            strip_url: strip_url.clone(),
        })
        .collect();

        {
            let mut tasks = self.tasks.write().await;
            if tasks.keys().any(|(id, _)| *id == session_id) {
                warn!("Delivery for session {} already dispatched, ignoring", session_id);
                return;
            }
            for request in &requests {
                tasks.insert(
                    (session_id, request.channel),
                    DeliveryTask::new(request.clone()),
                );
            }
        }

        // Channels progress independently: a slow provider on one never
        // delays the other
        join_all(
            requests
                .iter()
                .map(|request| self.run_send(session_id, request.channel)),
        )
        .await;
    }

    /// Re-run a settled task at the user's request
    ///
    /// Resets the task to `Pending` (clearing previous error detail) and
    /// sends again. Rejected while a send is in flight. The sibling
    /// channel's task is never touched.
    pub async fn resend(&self, session_id: Uuid, channel: ChannelKind) -> Result<()> {
        {
            let mut tasks = self.tasks.write().await;
            let task = tasks.get_mut(&(session_id, channel)).ok_or_else(|| {
                Error::NotFound(format!(
                    "no {} delivery for session {}",
                    channel, session_id
                ))
            })?;

            if task.status == DeliveryStatus::Sending {
                return Err(Error::Busy(format!(
                    "{} delivery for session {} is already in flight",
                    channel, session_id
                )));
            }
            // Sent → Pending and Error → Pending are the resend edges
            if !task.status.can_transition_to(DeliveryStatus::Pending) {
                return Err(Error::InvalidInput(format!(
                    "{} delivery for session {} cannot be resent from {}",
                    channel, session_id, task.status
                )));
            }

            task.status = DeliveryStatus::Pending;
            task.detail = None;
            task.updated_at = Utc::now();
        }
        self.emit_status(session_id, channel, DeliveryStatus::Pending, None);
        info!("Resending {} delivery for session {}", channel, session_id);

        self.run_send(session_id, channel).await;
        Ok(())
    }

    /// All tasks for a session, email before sms
    pub async fn statuses(&self, session_id: Uuid) -> Vec<DeliveryView> {
        let tasks = self.tasks.read().await;
        let mut views: Vec<DeliveryView> = tasks
            .iter()
            .filter(|((id, _), _)| *id == session_id)
            .map(|((_, channel), task)| DeliveryView {
                channel: *channel,
                recipient: task.request.recipient.clone(),
                status: task.status,
                detail: task.detail.clone(),
                message_id: task.message_id.clone(),
                attempts: task.attempts,
                updated_at: task.updated_at,
            })
            .collect();
        views.sort_by_key(|v| v.channel != ChannelKind::Email);
        views
    }

    /// Execute one send attempt for an existing task
    async fn run_send(&self, session_id: Uuid, channel: ChannelKind) {
        let request = {
            let mut tasks = self.tasks.write().await;
            let task = match tasks.get_mut(&(session_id, channel)) {
                Some(t) => t,
                None => return,
            };
            if !task.status.can_transition_to(DeliveryStatus::Sending) {
                warn!(
                    "Skipping {} send for session {}: status is {}",
                    channel, session_id, task.status
                );
                return;
            }
            task.status = DeliveryStatus::Sending;
            task.attempts += 1;
            task.updated_at = Utc::now();
            task.request.clone()
        };
        self.emit_status(session_id, channel, DeliveryStatus::Sending, None);

        let outcome = match self.transports.get(&channel) {
            Some(transport) => transport.send(&request).await,
            None => Err(Error::Delivery(format!(
                "{} transport not configured",
                channel
            ))),
        };

        let (status, detail) = {
            let mut tasks = self.tasks.write().await;
            let task = match tasks.get_mut(&(session_id, channel)) {
                Some(t) => t,
                None => return,
            };
            match outcome {
                Ok(message_id) => {
                    task.status = DeliveryStatus::Sent;
                    task.detail = None;
                    task.message_id = Some(message_id.clone());
                    info!(
                        "Delivered session {} via {} (message {})",
                        session_id, channel, message_id
                    );
                }
                Err(e) => {
                    let detail = e.to_string();
                    task.status = DeliveryStatus::Error;
                    task.detail = Some(detail.clone());
                    error!(
                        "Delivery of session {} via {} failed: {}",
                        session_id, channel, detail
                    );
                }
            }
            task.updated_at = Utc::now();
            (task.status, task.detail.clone().or_else(|| task.message_id.clone()))
        };
        self.emit_status(session_id, channel, status, detail);
    }

    fn emit_status(
        &self,
        session_id: Uuid,
        channel: ChannelKind,
        status: DeliveryStatus,
        detail: Option<String>,
    ) {
        self.state.emit(BoothEvent::DeliveryStatusChanged {
            session_id,
            channel,
            status,
            detail,
            timestamp: Utc::now(),
        });
    }
}
