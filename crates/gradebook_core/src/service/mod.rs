//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into grading use-cases.
//! - Map repository failures onto the service error taxonomy.
//!
//! # Invariants
//! - Services hold no mutable state between calls; every operation reads,
//!   computes and writes through its repositories.
//! - Repositories are handed in at construction; there is no global handle.

pub mod error;
pub mod id_allocator;
pub mod marks_ledger;
pub mod result_aggregator;
pub mod roster_service;
