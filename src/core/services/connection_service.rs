use crate::api::client::ModStackClient;
use crate::api::connection::{ConnectionStatus, ConnectionTracker};
use crate::api::models::ConnectionInfo;
use crate::error::ApiError;
use std::sync::Arc;

/// Runs connection tests and tracks the session's connection status
pub struct ConnectionService {
    client: Arc<ModStackClient>,
    tracker: ConnectionTracker,
}

impl ConnectionService {
    pub fn new(client: Arc<ModStackClient>) -> Self {
        Self {
            client,
            tracker: ConnectionTracker::new(),
        }
    }

    pub fn status(&self) -> &ConnectionStatus {
        self.tracker.status()
    }

    /// Test a key/URL pair. Also the retry path after a failure.
    pub async fn test(&mut self, api_key: &str, api_url: &str) -> Result<ConnectionInfo, ApiError> {
        let attempt = self.tracker.attempt()?;
        log::debug!("testing connection to {}", api_url);

        let result = self.client.test_connection(api_key, api_url).await;
        attempt.finish(&result)?;

        match &result {
            Ok(_) => log::debug!("connection test succeeded"),
            Err(e) => log::debug!("connection test failed: {}", e),
        }
        result
    }
}
