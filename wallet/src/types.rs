use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Errors that can occur while decoding a base58 string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("input cannot be empty")]
    EmptyInput,

    #[error("invalid base58 character {ch:?} at position {position}")]
    InvalidCharacter { ch: char, position: usize },
}

/// Reasons a wallet address is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("wallet address must be a non-empty string")]
    EmptyOrNonString,

    #[error("invalid EVM address checksum")]
    InvalidChecksum,

    #[error("invalid Solana address: {0}")]
    InvalidSolanaEncoding(#[from] DecodeError),

    #[error("Solana address must decode to 32 bytes, got {got}")]
    InvalidByteLength { got: usize },

    #[error("address does not match any supported format (Arweave, EVM, Solana)")]
    UnsupportedFormat,
}

/// The chain family an address was classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletType {
    Arweave,
    Evm,
    Solana,
}

impl WalletType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletType::Arweave => "arweave",
            WalletType::Evm => "evm",
            WalletType::Solana => "solana",
        }
    }
}

impl fmt::Display for WalletType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A wallet address that passed validation, in its canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedWallet {
    #[serde(rename = "type")]
    pub wallet_type: WalletType,
    pub address: String,
}

/// Outcome of validating a wallet address.
///
/// `valid` is true exactly when both `type` and `normalized` are present.
/// The only way to build one is from a `Result`, which keeps that invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    valid: bool,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    wallet_type: Option<WalletType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    normalized: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_error"
    )]
    error: Option<WalletError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn wallet_type(&self) -> Option<WalletType> {
        self.wallet_type
    }

    pub fn normalized(&self) -> Option<&str> {
        self.normalized.as_deref()
    }

    pub fn error(&self) -> Option<&WalletError> {
        self.error.as_ref()
    }

    /// Convert back into a `Result`.
    pub fn into_result(self) -> Result<NormalizedWallet, WalletError> {
        match (self.wallet_type, self.normalized, self.error) {
            (Some(wallet_type), Some(address), None) => Ok(NormalizedWallet {
                wallet_type,
                address,
            }),
            (_, _, Some(err)) => Err(err),
            _ => Err(WalletError::UnsupportedFormat),
        }
    }
}

impl From<Result<NormalizedWallet, WalletError>> for ValidationResult {
    fn from(result: Result<NormalizedWallet, WalletError>) -> Self {
        match result {
            Ok(wallet) => Self {
                valid: true,
                wallet_type: Some(wallet.wallet_type),
                normalized: Some(wallet.address),
                error: None,
            },
            Err(err) => Self {
                valid: false,
                wallet_type: None,
                normalized: None,
                error: Some(err),
            },
        }
    }
}

fn serialize_error<S>(error: &Option<WalletError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match error {
        Some(err) => serializer.serialize_str(&err.to_string()),
        None => serializer.serialize_none(),
    }
}
