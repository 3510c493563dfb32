//! Sequential identifier allocation.
//!
//! # Responsibility
//! - Produce student ids `<year><code><seq:04>`, teacher ids `<year>T<seq:04>`
//!   and plain integer ids for other collections.
//!
//! # Invariants
//! - Within one scope sequence numbers strictly increase and are never reused.
//! - Uniqueness comes from the persisted per-scope counter, which is advanced
//!   by one atomic upsert; a scan of existing ids is only used to seed the
//!   counter the first time a scope is seen.
//! - A seed id that cannot be parsed fails allocation with
//!   `MalformedIdentifier`; allocation never restarts at 1 silently.

use super::error::{ServiceError, ServiceResult};
use crate::model::identifier::{IdScope, TEACHER_SCOPE_CODE};
use crate::repo::counter_repo::IdCounterRepository;
use chrono::Datelike;
use log::{error, info};
use std::fmt::{Display, Formatter};

/// Zero-padding width of scoped sequence numbers.
const SEQUENCE_WIDTH: usize = 4;

/// Allocated identifier, rendered through `Display`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    /// Calendar year prefix; absent for plain collection ids.
    pub year: Option<i32>,
    /// Department code or `T`; absent for plain collection ids.
    pub scope_code: Option<String>,
    pub sequence: u64,
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (self.year, self.scope_code.as_deref()) {
            (Some(year), Some(code)) => {
                write!(f, "{year}{code}{:0width$}", self.sequence, width = SEQUENCE_WIDTH)
            }
            _ => write!(f, "{}", self.sequence),
        }
    }
}

/// Allocates identifiers through a persisted counter per scope.
pub struct IdentifierAllocator<C: IdCounterRepository> {
    counters: C,
    year: Option<i32>,
}

impl<C: IdCounterRepository> IdentifierAllocator<C> {
    /// Uses the local calendar year for scoped ids.
    pub fn new(counters: C) -> Self {
        Self {
            counters,
            year: None,
        }
    }

    /// Pins the year prefix; used by imports and tests.
    pub fn with_year(counters: C, year: i32) -> Self {
        Self {
            counters,
            year: Some(year),
        }
    }

    /// Allocates the next identifier of `scope`.
    ///
    /// # Errors
    /// - `Validation` for malformed department codes or collection names.
    /// - `MalformedIdentifier` when seeding finds an unparsable prior id.
    /// - `Persistence` when the counter cannot be advanced.
    pub fn allocate(&self, scope: &IdScope) -> ServiceResult<Identifier> {
        scope.validate()?;

        let seed = match self.counters.current_sequence(scope)? {
            // The counter row wins over the seed on conflict.
            Some(_) => 0,
            None => self.seed_from_existing(scope)?,
        };
        let sequence = self.counters.advance_sequence(scope, seed)?;

        info!(
            "event=id_allocate module=id_allocator status=ok scope={} sequence={}",
            scope, sequence
        );

        let identifier = match scope {
            IdScope::Department(code) => Identifier {
                year: Some(self.year()),
                scope_code: Some(code.clone()),
                sequence,
            },
            IdScope::Teacher => Identifier {
                year: Some(self.year()),
                scope_code: Some(TEACHER_SCOPE_CODE.to_string()),
                sequence,
            },
            IdScope::Collection(_) => Identifier {
                year: None,
                scope_code: None,
                sequence,
            },
        };
        Ok(identifier)
    }

    fn year(&self) -> i32 {
        self.year
            .unwrap_or_else(|| chrono::Local::now().year())
    }

    fn seed_from_existing(&self, scope: &IdScope) -> ServiceResult<u64> {
        let Some(last_id) = self.counters.last_identifier(scope)? else {
            return Ok(0);
        };

        let parsed = match scope {
            IdScope::Department(code) => parse_scoped_sequence(&last_id, code),
            IdScope::Teacher => parse_scoped_sequence(&last_id, TEACHER_SCOPE_CODE),
            IdScope::Collection(_) => last_id.parse::<u64>().ok(),
        };

        parsed.ok_or_else(|| {
            error!(
                "event=id_allocate module=id_allocator status=error scope={} error_code=malformed_identifier",
                scope
            );
            ServiceError::MalformedIdentifier {
                scope: scope.to_string(),
                value: last_id,
            }
        })
    }
}

/// Parses `<4-digit year><code><4+ digits>` and returns the trailing number.
fn parse_scoped_sequence(id: &str, code: &str) -> Option<u64> {
    let year = id.get(..4)?;
    let rest = id.get(4..)?;
    if !year.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    let digits = rest.strip_prefix(code)?;
    if digits.len() < SEQUENCE_WIDTH || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::{parse_scoped_sequence, Identifier};

    #[test]
    fn scoped_identifiers_are_zero_padded() {
        let id = Identifier {
            year: Some(2024),
            scope_code: Some("CS".to_string()),
            sequence: 7,
        };
        assert_eq!(id.to_string(), "2024CS0007");

        let wide = Identifier {
            sequence: 12_345,
            ..id
        };
        assert_eq!(wide.to_string(), "2024CS12345");
    }

    #[test]
    fn collection_identifiers_are_plain_integers() {
        let id = Identifier {
            year: None,
            scope_code: None,
            sequence: 42,
        };
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn parse_scoped_sequence_reads_trailing_digits() {
        assert_eq!(parse_scoped_sequence("2024CS0007", "CS"), Some(7));
        assert_eq!(parse_scoped_sequence("2023T0120", "T"), Some(120));
        assert_eq!(parse_scoped_sequence("2024EC210001", "EC2"), Some(10_001));
    }

    #[test]
    fn parse_scoped_sequence_rejects_malformed_ids() {
        assert_eq!(parse_scoped_sequence("2024CSABCD", "CS"), None);
        assert_eq!(parse_scoped_sequence("2024ME0007", "CS"), None);
        assert_eq!(parse_scoped_sequence("24CS0007", "CS"), None);
        assert_eq!(parse_scoped_sequence("2024CS07", "CS"), None);
    }
}
