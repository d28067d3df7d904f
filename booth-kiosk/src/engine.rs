//! Booth engine
//!
//! Owns the long-lived pieces (camera, inference, dispatcher, shared state)
//! and brokers between the HTTP surface and the per-session controller. At
//! most one capture session runs at a time; the engine is the arbiter.

use crate::camera::CameraDevice;
use crate::catalog::background_by_id;
use crate::compositor::Compositor;
use crate::delivery::DeliveryDispatcher;
use crate::segmentation::{MaskInference, MaskProvider};
use crate::session::{CaptureCadence, CompletedSession, SessionConfig, SessionController, RecipientSet};
use crate::state::{SessionStatus, SharedState};
use booth_common::config::BoothConfig;
use booth_common::events::ChannelKind;
use booth_common::{Error, Result, StyleFilter};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Session start parameters from the kiosk UI
#[derive(Debug, Clone, Deserialize)]
pub struct StartSessionRequest {
    #[serde(default = "default_background")]
    pub background_id: String,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

fn default_background() -> String {
    "none".to_string()
}

struct ActiveSession {
    session_id: Uuid,
    abort_tx: watch::Sender<bool>,
}

pub struct BoothEngine {
    config: BoothConfig,
    data_folder: PathBuf,
    state: Arc<SharedState>,
    camera: Arc<dyn CameraDevice>,
    mask_inference: Option<Arc<dyn MaskInference>>,
    dispatcher: Arc<DeliveryDispatcher>,
    cadence: CaptureCadence,
    active: RwLock<Option<ActiveSession>>,
}

impl BoothEngine {
    pub fn new(
        config: BoothConfig,
        data_folder: PathBuf,
        state: Arc<SharedState>,
        camera: Arc<dyn CameraDevice>,
        mask_inference: Option<Arc<dyn MaskInference>>,
        dispatcher: Arc<DeliveryDispatcher>,
        cadence: CaptureCadence,
    ) -> Self {
        Self {
            config,
            data_folder,
            state,
            camera,
            mask_inference,
            dispatcher,
            cadence,
            active: RwLock::new(None),
        }
    }

    pub fn state(&self) -> &Arc<SharedState> {
        &self.state
    }

    pub fn dispatcher(&self) -> &Arc<DeliveryDispatcher> {
        &self.dispatcher
    }

    pub fn config(&self) -> &BoothConfig {
        &self.config
    }

    /// Where assembled strips are written and served from
    pub fn strips_dir(&self) -> PathBuf {
        self.data_folder.join("strips")
    }

    /// Start a capture session; rejects while another is in progress
    pub async fn start_session(self: &Arc<Self>, request: StartSessionRequest) -> Result<Uuid> {
        let recipients = RecipientSet::new(request.email, request.phone);
        recipients.validate()?;

        // Unknown styles degrade to the default rather than failing the
        // guest's session
        let style = match request.style.as_deref() {
            None | Some("") => StyleFilter::default(),
            Some(s) => StyleFilter::from_str(s).unwrap_or_else(|| {
                warn!("Unknown style '{}', using {}", s, StyleFilter::default());
                StyleFilter::default()
            }),
        };
        let background = background_by_id(&request.background_id);

        let mut active = self.active.write().await;
        if active.is_some() {
            return Err(Error::Busy("a capture session is already in progress".into()));
        }

        let session_id = Uuid::new_v4();
        let (abort_tx, abort_rx) = watch::channel(false);

        // Inference only pays off when there is a backdrop to matte over
        let masks = match (&self.mask_inference, background.is_none()) {
            (Some(inference), false) => Some(MaskProvider::new(Arc::clone(inference))),
            _ => None,
        };

        let controller = SessionController::new(
            SessionConfig {
                session_id,
                background_id: background.id.to_string(),
                style,
                recipients: recipients.clone(),
            },
            self.cadence.clone(),
            Arc::clone(&self.camera),
            masks,
            Compositor::default(),
            Arc::clone(&self.state),
            abort_rx,
        );

        *active = Some(ActiveSession {
            session_id,
            abort_tx,
        });
        drop(active);

        let engine = Arc::clone(self);
        tokio::spawn(async move {
            match controller.run().await {
                Ok(Some(completed)) => {
                    if let Err(e) = engine.finish_session(completed).await {
                        error!("Post-session handling failed: {}", e);
                    }
                }
                Ok(None) => {}
                Err(e) => error!("Session {} failed: {}", session_id, e),
            }
            *engine.active.write().await = None;
        });

        Ok(session_id)
    }

    /// Abort the in-progress session, if any
    pub async fn abort_session(&self) -> Result<Uuid> {
        let active = self.active.read().await;
        match active.as_ref() {
            Some(session) => {
                // Receiver dropped means the controller already finished;
                // treat that as a successful no-op
                let _ = session.abort_tx.send(true);
                info!("Abort requested for session {}", session.session_id);
                Ok(session.session_id)
            }
            None => Err(Error::NotFound("no session in progress".into())),
        }
    }

    pub async fn status(&self) -> SessionStatus {
        self.state.snapshot().await
    }

    pub fn email_configured(&self) -> bool {
        self.dispatcher.has_transport(ChannelKind::Email)
    }

    pub fn sms_configured(&self) -> bool {
        self.dispatcher.has_transport(ChannelKind::Sms)
    }

    /// Persist the strip, host it, and hand the session to delivery
    async fn finish_session(&self, completed: CompletedSession) -> Result<()> {
        let session_id = completed.session.config.session_id;
        let strips_dir = self.strips_dir();
        tokio::fs::create_dir_all(&strips_dir).await?;

        let path = strips_dir.join(format!("{}.jpg", session_id));
        tokio::fs::write(&path, &completed.strip.jpeg).await?;
        info!("Strip for session {} written to {}", session_id, path.display());

        let strip_url = format!("{}/strips/{}.jpg", self.config.public_base_url, session_id);
        let recipients = &completed.session.config.recipients;
        self.dispatcher
            .dispatch(
                session_id,
                recipients.email.clone(),
                recipients.phone.clone(),
                Arc::new(completed.strip.jpeg),
                Some(strip_url),
            )
            .await;
        Ok(())
    }
}
