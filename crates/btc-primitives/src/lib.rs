//! Bitcoin SDK - Hashing, chain hashes, and wire-format primitives.
//!
//! This crate provides the foundational building blocks shared by the
//! script, transaction, and peer-to-peer crates:
//! - Hash functions (SHA-256, SHA-256d, RIPEMD-160, Hash160)
//! - Chain hash type for transaction and block identification
//! - Variable-length integer encoding
//! - Cursor reader / append writer for protocol binary data

pub mod hash;
pub mod chainhash;
pub mod util;

mod error;
pub use error::PrimitivesError;
