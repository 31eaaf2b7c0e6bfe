use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::synthesis::pipeline::SynthesisSettings;
use crate::synthesis::provider::GenerativeClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Text-generation provider. `LlmClient` in production.
    pub client: Arc<dyn GenerativeClient>,
    pub settings: SynthesisSettings,
    /// Cancelled on shutdown; each request runs under a child token.
    pub shutdown: CancellationToken,
}
