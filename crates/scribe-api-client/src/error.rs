use thiserror::Error;

/// Remote call errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection failure, timeout or broken response stream
    #[error("Request failed: {}", describe_transport(.0))]
    Transport(#[from] reqwest::Error),

    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// Envelope with a non-success `code`
    #[error("API error {code}: {msg}")]
    Api { code: i64, msg: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Response is missing field: {0}")]
    MissingData(&'static str),

    #[error("Failed to create HTTP client: {0}")]
    Build(String),
}

/// reqwest's own message hides the timeout in the error source.
fn describe_transport(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("timed out: {}", err)
    } else {
        err.to_string()
    }
}
