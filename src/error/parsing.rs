use thiserror::Error;

use super::VdaDidError;

#[derive(Error, Debug)]
pub enum ParsingErrorSource {
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Invalid hex: {0}")]
    HexError(#[from] hex::FromHexError),
    #[error("Invalid encoding: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),
    #[error("Invalid encoding: {0}")]
    IntConversionError(#[from] std::num::TryFromIntError),
    #[error("ABI decoding error: {0}")]
    AbiError(String),
}

impl From<serde_json::Error> for VdaDidError {
    fn from(error: serde_json::Error) -> Self {
        VdaDidError::ParsingError(ParsingErrorSource::JsonError(error))
    }
}

impl From<hex::FromHexError> for VdaDidError {
    fn from(error: hex::FromHexError) -> Self {
        VdaDidError::ParsingError(ParsingErrorSource::HexError(error))
    }
}

impl From<std::string::FromUtf8Error> for VdaDidError {
    fn from(error: std::string::FromUtf8Error) -> Self {
        VdaDidError::ParsingError(ParsingErrorSource::Utf8Error(error))
    }
}

impl From<std::num::TryFromIntError> for VdaDidError {
    fn from(error: std::num::TryFromIntError) -> Self {
        VdaDidError::ParsingError(ParsingErrorSource::IntConversionError(error))
    }
}
