//! # Construction API Data Model
//!
//! Request and response shapes for the eight construction endpoints, plus
//! the small identifier types they are built from. Field names follow the
//! Rosetta specification exactly; existing clients deserialize these
//! byte-for-byte, so renaming a field here is a breaking change.

pub mod identifiers;
pub mod metadata;
pub mod operation;
pub mod requests;

pub use identifiers::{
    AccountIdentifier, Amount, Currency, NetworkIdentifier, OperationIdentifier, PublicKey,
    Signature, SigningPayload, TransactionIdentifier,
};
pub use metadata::{
    address_type, get_str, get_u128, get_u64, insert_str, insert_u128, insert_u64, Metadata,
    MetadataKey,
};
pub use operation::{Operation, OperationType};
pub use requests::*;
