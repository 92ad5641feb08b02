pub mod base58;
pub mod checksum;
pub mod types;
pub mod validator;

pub use checksum::to_checksum_address;
pub use types::*;
pub use validator::{
    is_valid, normalize, validate_and_normalize, AddressValidator, WalletValidator, FORMAT_RULES,
};
