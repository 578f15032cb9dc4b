use crate::api::client::ModStackClient;
use crate::api::connection::RequestGate;
use crate::api::models::{RemoteResource, ResourceKind};
use crate::core::cache::TtlCache;
use crate::error::ApiError;
use std::collections::HashMap;
use std::sync::Arc;

/// Chatbot and ticket form lists, cached for the session.
///
/// Each kind has its own request gate: a refresh that finishes after a newer
/// refresh of the same kind was started is discarded.
pub struct ResourceService {
    client: Arc<ModStackClient>,
    cache: TtlCache<ResourceKind, Vec<RemoteResource>>,
    gates: HashMap<ResourceKind, RequestGate>,
}

impl ResourceService {
    pub fn new(client: Arc<ModStackClient>) -> Self {
        let gates = [ResourceKind::Chatbots, ResourceKind::TicketForms]
            .into_iter()
            .map(|kind| (kind, RequestGate::new()))
            .collect();

        Self {
            client,
            cache: TtlCache::for_session(),
            gates,
        }
    }

    fn gate(&self, kind: ResourceKind) -> RequestGate {
        self.gates.get(&kind).cloned().unwrap_or_default()
    }

    /// Cached list, fetching it first if needed
    pub async fn list(&self, kind: ResourceKind) -> Result<Vec<RemoteResource>, ApiError> {
        if let Some(cached) = self.cache.get(&kind) {
            log::debug!("using cached {}", kind.label());
            return Ok(cached);
        }

        match self.refresh(kind).await? {
            Some(resources) => Ok(resources),
            // a newer refresh owns the cache slot
            None => Ok(self.cache.get(&kind).unwrap_or_default()),
        }
    }

    /// Fetch and cache. `Ok(None)` when a newer refresh superseded this one.
    pub async fn refresh(&self, kind: ResourceKind) -> Result<Option<Vec<RemoteResource>>, ApiError> {
        let gate = self.gate(kind);
        let ticket = gate.issue();

        let result = self.client.list_resources(kind).await;

        if !gate.is_current(&ticket) {
            log::debug!("discarding superseded {} response", kind.label());
            return Ok(None);
        }

        let resources = result?;
        self.cache.insert(kind, resources.clone());
        Ok(Some(resources))
    }

    pub fn cached(&self, kind: ResourceKind) -> Option<Vec<RemoteResource>> {
        self.cache.get(&kind)
    }

    pub fn invalidate(&self) {
        self.cache.clear();
    }
}
