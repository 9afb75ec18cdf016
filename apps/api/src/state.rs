use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use crate::generation::generator::ContentGenerator;
use crate::generation::orchestrator::GenerationOrchestrator;
use crate::generation::store::GenerationStore;
use crate::profiles::ProfileReader;
use crate::quota::QuotaLedger;
use crate::render::service::RenderService;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Every I/O dependency sits behind a trait object so tests can swap in memory fakes.
#[derive(Clone)]
pub struct AppState {
    pub quota: QuotaLedger,
    pub generations: Arc<dyn GenerationStore>,
    pub profiles: Arc<dyn ProfileReader>,
    /// Also used directly for the advisory job analysis endpoint.
    pub generator: Arc<dyn ContentGenerator>,
    pub orchestrator: GenerationOrchestrator,
    pub renders: RenderService,
}

/// `?userId=` on owner-scoped GET and DELETE routes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdQuery {
    pub user_id: Uuid,
}
