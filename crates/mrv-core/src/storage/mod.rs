//! # Storage Module
//!
//! Disk-backed implementation of [`crate::store::ScoreStore`].

mod redb_store;

pub use redb_store::RedbStore;
