//! Fire-and-forget user notifications.
//!
//! Delivery transport (email) lives outside this service. Notifications are spawned
//! after the primary work has committed; a failed send is logged and nothing else.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::cv::{CvType, GenerationRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationNotice {
    pub user_id: Uuid,
    pub cv_id: Uuid,
    pub cv_type: CvType,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn generation_completed(&self, notice: &GenerationNotice) -> anyhow::Result<()>;
}

/// Writes notices to the log. Used until an email transport is wired in.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn generation_completed(&self, notice: &GenerationNotice) -> anyhow::Result<()> {
        info!(
            "Notify user {}: {} CV {} is ready",
            notice.user_id, notice.cv_type, notice.cv_id
        );
        Ok(())
    }
}

/// Spawns the completion notice without awaiting it.
pub fn spawn_generation_completed(notifier: Arc<dyn Notifier>, record: &GenerationRecord) {
    let notice = GenerationNotice {
        user_id: record.user_id,
        cv_id: record.id,
        cv_type: record.cv_type,
    };
    tokio::spawn(async move {
        if let Err(e) = notifier.generation_completed(&notice).await {
            warn!("Completion notice for CV {} failed: {e:#}", notice.cv_id);
        }
    });
}
