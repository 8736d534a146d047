#![deny(missing_docs)]

//! Bitcoin SDK - Complete SDK.
//!
//! Re-exports all SDK components for convenient single-crate usage.

pub use btc_p2p as p2p;
pub use btc_primitives as primitives;
pub use btc_script as script;
pub use btc_transaction as transaction;
