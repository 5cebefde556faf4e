use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayApiError {
    #[error("Could not set up the gateway client. {0}")]
    Initialization(String),
    #[error("The gateway could not be reached. {0}")]
    RestRequestError(String),
    #[error("The gateway sent a response that could not be read. {0}")]
    RestResponseError(String),
    #[error("Unexpected JSON from the gateway. {0}")]
    JsonError(String),
    #[error("The gateway rejected the request with HTTP {status}. {message}")]
    QueryError { status: u16, message: String },
    /// Gateway orders must be for a positive amount.
    #[error("{0} is not a payable amount")]
    InvalidCurrencyAmount(String),
}
