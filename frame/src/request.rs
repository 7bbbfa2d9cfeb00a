//! What to embed and where.

use crate::callback::Callback;
use serde::{Deserialize, Serialize};

/// Fields that identify one mount of the lifecycle provider.
///
/// When any of them changes, the provider's state is torn down and rebuilt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmbedIdentity {
    /// Document loaded into the primary frame
    pub source_url: String,
    /// Opaque id of the logical embed session
    pub correlation_id: String,
    /// DOM id given to the primary frame
    pub element_id: String,
}

/// Input describing the frame to embed.
///
/// `on_ready` runs exactly once per successful load of this identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedRequest {
    /// Document loaded into the primary frame
    pub source_url: String,
    /// Opaque id of the logical embed session
    pub correlation_id: String,
    /// DOM id given to the primary frame
    pub element_id: String,
    /// Called once the frame reports a successful load
    pub on_ready: Option<Callback>,
}

impl EmbedRequest {
    /// Create a request without a ready callback.
    pub fn new(
        source_url: impl Into<String>,
        correlation_id: impl Into<String>,
        element_id: impl Into<String>,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            correlation_id: correlation_id.into(),
            element_id: element_id.into(),
            on_ready: None,
        }
    }

    /// Attach the ready callback.
    #[must_use]
    pub fn on_ready(mut self, on_ready: Callback) -> Self {
        self.on_ready = Some(on_ready);
        self
    }

    /// Identifying fields of this request.
    #[must_use]
    pub fn identity(&self) -> EmbedIdentity {
        EmbedIdentity {
            source_url: self.source_url.clone(),
            correlation_id: self.correlation_id.clone(),
            element_id: self.element_id.clone(),
        }
    }
}
