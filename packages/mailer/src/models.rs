use serde::Deserialize;

/// Response body from the transactional mail API on a successful send.
#[derive(Debug, Clone, Deserialize)]
pub struct SendReceipt {
    /// Provider-assigned message id, if the API returns one.
    pub id: Option<String>,
    pub message: Option<String>,
}
