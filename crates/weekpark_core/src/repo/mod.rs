//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes must enforce model validation before
//!   persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition
//!   to DB transport errors.

pub mod block_repo;
pub mod item_repo;
