//! Service error taxonomy shared by the ledger, allocator and aggregator.

use crate::model::RecordValidationError;
use crate::repo::{EntityKind, RepoError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced to the calling layer.
#[derive(Debug)]
pub enum ServiceError {
    /// Inbound record is missing or has a malformed field; nothing was written.
    Validation(RecordValidationError),
    /// External marks of the pair are locked; nothing was written.
    AlreadySubmitted {
        student_id: String,
        subject_id: String,
    },
    /// Referenced record does not exist; nothing was written.
    NotFound { entity: EntityKind, id: String },
    /// Greatest existing identifier of a scope cannot be parsed.
    MalformedIdentifier { scope: String, value: String },
    /// A result was requested before the external marks were submitted.
    ExternalNotSubmitted {
        student_id: String,
        subject_id: String,
    },
    /// Store unreachable, write unconfirmed or persisted data unreadable.
    Persistence(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "validation failed: {err}"),
            Self::AlreadySubmitted {
                student_id,
                subject_id,
            } => write!(
                f,
                "sat marks already submitted for student {student_id} in subject {subject_id}"
            ),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::MalformedIdentifier { scope, value } => {
                write!(f, "cannot parse last identifier `{value}` in scope `{scope}`")
            }
            Self::ExternalNotSubmitted {
                student_id,
                subject_id,
            } => write!(
                f,
                "sat marks not submitted for student {student_id} in subject {subject_id}"
            ),
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RecordValidationError> for ServiceError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            other => Self::Persistence(other),
        }
    }
}

impl ServiceError {
    pub(crate) fn not_found(entity: EntityKind, id: &str) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Stable machine-readable code for logs and the calling layer.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::AlreadySubmitted { .. } => "already_submitted",
            Self::NotFound { .. } => "not_found",
            Self::MalformedIdentifier { .. } => "malformed_identifier",
            Self::ExternalNotSubmitted { .. } => "external_not_submitted",
            Self::Persistence(_) => "persistence_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ServiceError;
    use crate::model::RecordValidationError;
    use crate::repo::{EntityKind, RepoError};

    #[test]
    fn repo_not_found_maps_to_service_not_found() {
        let err: ServiceError = RepoError::NotFound {
            entity: EntityKind::Student,
            id: "2024CS0001".to_string(),
        }
        .into();
        assert_eq!(err.code(), "not_found");
        assert_eq!(err.to_string(), "student not found: 2024CS0001");
    }

    #[test]
    fn repo_validation_keeps_validation_code() {
        let err: ServiceError =
            RepoError::Validation(RecordValidationError::EmptyField("studentId")).into();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn invalid_data_is_a_persistence_error() {
        let err: ServiceError = RepoError::InvalidData("bad row".to_string()).into();
        assert_eq!(err.code(), "persistence_error");
    }
}
