//! Adapters implementing domain ports against concrete external systems.

pub mod fs;
pub mod sqlite;
