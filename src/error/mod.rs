use thiserror::Error;

use self::parsing::ParsingErrorSource;

pub mod parsing;

pub type VdaDidResult<T> = Result<T, VdaDidError>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum VdaDidError {
    #[error("DID method not supported: {0}")]
    MethodNotSupported(String),
    #[error("Network not supported: {0}")]
    NetworkNotSupported(String),
    #[error("Bad configuration: {0}")]
    BadConfiguration(String),
    #[error("Invalid DID: {0}")]
    InvalidDid(String),
    #[error("Malformed identifier: {0}")]
    MalformedIdentifier(String),
    #[error("No key material for verification method: {0}")]
    MissingKeyMaterial(String),
    #[error("Transport error: {0}")]
    TransportError(Box<dyn std::error::Error + Send + Sync>),
    #[error("Non-success RPC response ({code}): {message}")]
    NonSuccessResponse { code: i64, message: String },
    #[error("Invalid RPC response: {0}")]
    InvalidResponse(String),
    #[error("DID not found: {did_address}")]
    DidNotFound {
        did_address: String,
        source: Box<VdaDidError>,
    },
    #[error("Update hand-off channel closed")]
    HandoffClosed,
    #[error("Parsing error: {0}")]
    ParsingError(ParsingErrorSource),
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl VdaDidError {
    /// Collapse any lookup failure into [VdaDidError::DidNotFound], keeping the
    /// original error reachable through `source()`.
    pub fn not_found(did_address: &str, cause: VdaDidError) -> Self {
        match cause {
            already @ VdaDidError::DidNotFound { .. } => already,
            cause => VdaDidError::DidNotFound {
                did_address: did_address.to_owned(),
                source: Box::new(cause),
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, VdaDidError::DidNotFound { .. })
    }
}
