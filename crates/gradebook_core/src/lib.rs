//! Core marks and grading engine.
//! This crate is the single source of truth for grading invariants.

pub mod config;
pub mod db;
pub mod grading;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, DatabaseConfig, GradebookConfig, LoggingConfig};
pub use db::{open_db, open_db_in_memory, DbError};
pub use grading::{
    cgpa_of, grade_of, grade_point_for_label, grade_point_of, CreditTally, Grade, MarksPolicy,
};
pub use logging::{default_log_level, init_logging, init_logging_from, logging_status};
pub use model::identifier::IdScope;
pub use model::marks::{InternalMarks, SatMarks};
pub use model::result::{ResultCategory, SubjectResult};
pub use model::roster::{Department, Student, Subject, SubjectKind, Teacher};
pub use model::RecordValidationError;
pub use repo::counter_repo::{IdCounterRepository, SqliteIdCounterRepository};
pub use repo::marks_repo::{MarksRepository, SqliteMarksRepository};
pub use repo::result_repo::{ResultQuery, ResultRepository, SqliteResultRepository};
pub use repo::roster_repo::{RosterRepository, SqliteRosterRepository};
pub use repo::{EntityKind, RepoError, RepoResult};
pub use service::error::{ServiceError, ServiceResult};
pub use service::id_allocator::{Identifier, IdentifierAllocator};
pub use service::marks_ledger::MarksLedger;
pub use service::result_aggregator::{
    ResultAggregator, SemesterSummary, Standing, StudentDashboard,
};
pub use service::roster_service::{NewSubject, RosterService};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
