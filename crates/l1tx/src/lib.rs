//! Interpretation of Bitcoin transactions: stake classification, address
//! decoding and public key recovery.

pub mod address;
pub mod filter;
pub mod pubkey;

pub use address::{decode_address, AddressError, AddressKind, DecodedAddress};
pub use filter::{Rejection, StakeClassifier};
pub use pubkey::{recover_public_key, recover_public_key_for, RecoveredKey};
