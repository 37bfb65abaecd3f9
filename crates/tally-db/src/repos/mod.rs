//! Repository modules for the ledger.
//!
//! Each module adds methods to `TallyDb` via `impl TallyDb` blocks.

pub mod entry;
pub mod invoice;
pub mod query;
pub mod student;
