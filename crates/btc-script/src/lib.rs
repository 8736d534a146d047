//! Bitcoin SDK - Script parsing, analysis, templates, and builders.
//!
//! Provides the Bitcoin `Script` type, the opcode table, the script
//! operation model and reader, canonical-push and signature-operation
//! analyses, find-and-delete, standard script templates, and a script
//! builder.

pub mod opcodes;
pub mod op;
pub mod script;
pub mod builder;
pub mod template;
pub mod flags;

mod error;
pub use error::ScriptError;
pub use op::{ScriptOp, ScriptReader};
pub use script::{OpPredicate, Script};
pub use builder::ScriptBuilder;
pub use template::{destination, signer, ScriptId, Template};
pub use flags::ScriptFlags;
