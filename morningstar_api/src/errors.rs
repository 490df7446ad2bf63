//! Error types for the provider client.

/// Errors that can occur when talking to the data provider.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An HTTP request failed (network error, timeout, or unexpected response).
    #[error("request failed")]
    RequestFailed,
    /// The provider returned a non-success status with a body snippet.
    #[error("request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// The bearer-token exchange pages did not contain the expected token.
    #[error("token exchange failed: {0}")]
    TokenExchange(String),
    /// A response body did not match the expected shape.
    #[error("malformed payload: {0}")]
    Payload(String),
}
