//! Semantic memory records.

pub mod record;
