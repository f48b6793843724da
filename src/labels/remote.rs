//! Remote canonical label store reached over HTTP.

use thiserror::Error;
use url::Url;

use crate::http_client;

use super::LabelMap;

/// Responses larger than this are treated as malformed.
const MAX_RESPONSE_BYTES: usize = 8 * 1024 * 1024;

/// Errors talking to the remote label store.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The HTTP request itself failed.
    #[error("Remote label request failed: {0}")]
    Http(#[from] Box<ureq::Error>),
    /// Reading the response body failed or exceeded the size cap.
    #[error("Failed to read remote labels: {0}")]
    Io(#[from] std::io::Error),
    /// The payload was not a label map.
    #[error("Malformed remote label payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Async-in-spirit collaborator contract for the canonical store. Callers
/// treat both operations as best-effort; failures degrade to local-only.
pub trait RemoteLabelStore {
    fn load(&self) -> Result<LabelMap, SyncError>;
    fn store(&self, labels: &LabelMap) -> Result<(), SyncError>;
}

/// HTTP implementation posting the full canonical map as JSON.
pub struct HttpLabelRemote {
    endpoint: Url,
}

impl HttpLabelRemote {
    pub fn new(endpoint: Url) -> Self {
        Self { endpoint }
    }
}

impl RemoteLabelStore for HttpLabelRemote {
    fn load(&self) -> Result<LabelMap, SyncError> {
        let response = http_client::agent()
            .get(self.endpoint.as_str())
            .call()
            .map_err(Box::new)?;
        let bytes = http_client::read_response_bytes(response, MAX_RESPONSE_BYTES)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn store(&self, labels: &LabelMap) -> Result<(), SyncError> {
        http_client::agent()
            .post(self.endpoint.as_str())
            .send_json(labels)
            .map_err(Box::new)?;
        Ok(())
    }
}
