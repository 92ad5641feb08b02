use crate::base58;
use crate::checksum::verify_checksum;
use crate::types::{NormalizedWallet, ValidationResult, WalletError, WalletType};

/// Length of an Arweave address (32-byte hash, base64url without padding).
pub const ARWEAVE_ADDRESS_LEN: usize = 43;

/// Length of an EVM address including the `0x` prefix.
pub const EVM_ADDRESS_LEN: usize = 42;

/// Accepted character lengths for a Solana base58 address.
pub const SOLANA_ADDRESS_LEN: std::ops::RangeInclusive<usize> = 32..=44;

/// Decoded size of a Solana public key.
pub const SOLANA_PUBKEY_LEN: usize = 32;

/// Stripped along with whitespace around an address.
const BYTE_ORDER_MARK: char = '\u{feff}';

/// One entry of the classification table: a shape test and the validator
/// that runs once the shape matches.
pub struct FormatRule {
    pub wallet_type: WalletType,
    pub matches: fn(&str) -> bool,
    pub normalize: fn(&str) -> Result<String, WalletError>,
}

/// Address formats in priority order. The first rule whose shape matches
/// decides the outcome; a failing validator does not fall through.
///
/// A 43-character base58 string also fits the Arweave shape, so it is always
/// classified as Arweave and never reaches the Solana rule.
pub const FORMAT_RULES: [FormatRule; 3] = [
    FormatRule {
        wallet_type: WalletType::Arweave,
        matches: is_arweave_shape,
        normalize: normalize_arweave,
    },
    FormatRule {
        wallet_type: WalletType::Evm,
        matches: is_evm_shape,
        normalize: verify_checksum,
    },
    FormatRule {
        wallet_type: WalletType::Solana,
        matches: is_solana_shape,
        normalize: normalize_solana,
    },
];

fn is_base64url_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

pub fn is_arweave_shape(address: &str) -> bool {
    address.len() == ARWEAVE_ADDRESS_LEN && address.bytes().all(is_base64url_byte)
}

pub fn is_evm_shape(address: &str) -> bool {
    address.len() == EVM_ADDRESS_LEN
        && address
            .strip_prefix("0x")
            .is_some_and(|digits| digits.bytes().all(|b| b.is_ascii_hexdigit()))
}

pub fn is_solana_shape(address: &str) -> bool {
    SOLANA_ADDRESS_LEN.contains(&address.len()) && address.bytes().all(base58::is_base58_byte)
}

fn normalize_arweave(address: &str) -> Result<String, WalletError> {
    Ok(address.to_string())
}

fn normalize_solana(address: &str) -> Result<String, WalletError> {
    let decoded = base58::decode(address)?;
    if decoded.len() != SOLANA_PUBKEY_LEN {
        return Err(WalletError::InvalidByteLength { got: decoded.len() });
    }
    Ok(address.to_string())
}

/// Classify and canonicalise a wallet address.
pub fn normalize(address: &str) -> Result<NormalizedWallet, WalletError> {
    if address.is_empty() {
        return Err(WalletError::EmptyOrNonString);
    }

    let address = address.trim_matches(|c: char| c.is_whitespace() || c == BYTE_ORDER_MARK);
    let rule = FORMAT_RULES
        .iter()
        .find(|rule| (rule.matches)(address))
        .ok_or(WalletError::UnsupportedFormat)?;

    Ok(NormalizedWallet {
        wallet_type: rule.wallet_type,
        address: (rule.normalize)(address)?,
    })
}

/// Validate an address and report the outcome as a [`ValidationResult`].
pub fn validate_and_normalize(address: &str) -> ValidationResult {
    normalize(address).into()
}

/// Quick validity check without the normalized form.
pub fn is_valid(address: &str) -> bool {
    normalize(address).is_ok()
}

/// Seam for callers that need to substitute the address check.
pub trait AddressValidator: Send + Sync {
    fn validate_and_normalize(&self, address: &str) -> ValidationResult;

    fn is_valid(&self, address: &str) -> bool {
        self.validate_and_normalize(address).is_valid()
    }
}

/// The stateless multi-chain validator backed by [`FORMAT_RULES`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WalletValidator;

impl AddressValidator for WalletValidator {
    fn validate_and_normalize(&self, address: &str) -> ValidationResult {
        validate_and_normalize(address)
    }
}
