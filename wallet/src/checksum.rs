use sha3::{Digest, Keccak256};

use crate::types::WalletError;

/// Apply EIP-55 mixed-case checksum casing to a 40-digit hex address.
///
/// Input: 40 hex digits, optionally `0x`-prefixed, any case.
/// Output: `0x` followed by the checksum-cased digits.
pub fn to_checksum_address(addr_hex: &str) -> String {
    let digits = addr_hex.strip_prefix("0x").unwrap_or(addr_hex);
    let lower = digits.to_ascii_lowercase();

    let mut hasher = Keccak256::new();
    hasher.update(lower.as_bytes());
    let digest = hasher.finalize();

    let mut out = String::with_capacity(2 + lower.len());
    out.push_str("0x");

    // A letter is uppercased when its hash nibble is >= 8.
    for (i, ch) in lower.chars().enumerate() {
        let Some(&byte) = digest.get(i / 2) else {
            out.push(ch);
            continue;
        };
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };

        if ch.is_ascii_alphabetic() && nibble >= 8 {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push(ch);
        }
    }

    out
}

/// Verify an `0x` + 40 hex digit address and return its checksum form.
///
/// Single-case addresses carry no checksum and are accepted as-is; a
/// mixed-case address must match the EIP-55 casing exactly.
pub fn verify_checksum(address: &str) -> Result<String, WalletError> {
    let digits = address.strip_prefix("0x").unwrap_or(address);
    let checksummed = to_checksum_address(digits);

    let has_lower = digits.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = digits.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper && &checksummed[2..] != digits {
        return Err(WalletError::InvalidChecksum);
    }

    Ok(checksummed)
}
