//! # Transactions
//!
//! The native Zilliqa transaction and everything that converts it:
//!
//! - [`native`]: the structured transaction and its JSON wire form.
//! - [`codec`]: parse, canonical core bytes, hash, serialize.
//! - [`proto`]: the node's protobuf core message the core bytes encode.
//! - [`envelope`]: the unsigned-transaction blob handed to clients between
//!   payloads and combine.
//! - [`intent`]: the transfer described by a pair of operations.
//!
//! ## Hashing
//!
//! The transaction id is SHA-256 over the protobuf core encoding, which
//! leaves out the signature, the id itself and the priority flag. The id is
//! therefore fixed the moment the unsigned transaction is, and a client can
//! compute it before broadcasting.

pub mod codec;
pub mod envelope;
pub mod intent;
pub mod native;
pub mod proto;

pub use codec::TransactionCodec;
pub use envelope::UnsignedEnvelope;
pub use intent::TransferIntent;
pub use native::NativeTransaction;
