//! Roster records: departments, subjects, students and teachers.
//!
//! # Invariants
//! - `Student.roll_number` equals `Student.id`.
//! - `Student.cgpa` stays within `[0, 10]`; it is only rewritten by the
//!   result roll-up.
//! - `Subject.credits` is positive; it is the CGPA weight.

use super::{require_range, require_text, RecordValidationError};
use serde::{Deserialize, Serialize};

/// Highest cumulative grade-point average on the ten-point scale.
pub const MAX_CGPA: f64 = 10.0;

/// Academic department; `code` prefixes student identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: String,
    pub name: String,
    pub code: String,
}

impl Department {
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        require_text("id", &self.id)?;
        require_text("name", &self.name)?;
        require_text("code", &self.code)
    }
}

/// Delivery format of a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    /// Lecture-based subject.
    Theory,
    /// Laboratory/practical subject.
    Lab,
}

impl SubjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Theory => "theory",
            Self::Lab => "lab",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "theory" => Some(Self::Theory),
            "lab" => Some(Self::Lab),
            _ => None,
        }
    }
}

/// Catalog entry for one subject offered in a semester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub code: String,
    /// Serialized as `type` to match external schema naming.
    #[serde(rename = "type")]
    pub kind: SubjectKind,
    pub department_id: String,
    pub semester: u32,
    pub credits: u32,
}

impl Subject {
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        require_text("id", &self.id)?;
        require_text("name", &self.name)?;
        require_text("code", &self.code)?;
        require_text("departmentId", &self.department_id)?;
        if self.semester == 0 {
            return Err(RecordValidationError::OutOfRange {
                field: "semester",
                value: 0.0,
                min: 1.0,
                max: f64::from(u32::MAX),
            });
        }
        if self.credits == 0 {
            return Err(RecordValidationError::OutOfRange {
                field: "credits",
                value: 0.0,
                min: 1.0,
                max: f64::from(u32::MAX),
            });
        }
        Ok(())
    }
}

/// Enrolled student with derived standing fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub email: String,
    pub department_id: String,
    pub semester: u32,
    pub roll_number: String,
    /// Derived by the result roll-up.
    pub cgpa: f64,
    /// Derived by the result roll-up.
    pub total_credits: u32,
}

impl Student {
    /// Creates a freshly enrolled student with zeroed standing.
    pub fn enrolled(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        department_id: impl Into<String>,
        semester: u32,
    ) -> Self {
        let id = id.into();
        Self {
            roll_number: id.clone(),
            id,
            name: name.into(),
            email: email.into(),
            department_id: department_id.into(),
            semester,
            cgpa: 0.0,
            total_credits: 0,
        }
    }

    pub fn validate(&self) -> Result<(), RecordValidationError> {
        require_text("id", &self.id)?;
        require_text("name", &self.name)?;
        validate_email(&self.email)?;
        require_text("departmentId", &self.department_id)?;
        if self.semester == 0 {
            return Err(RecordValidationError::OutOfRange {
                field: "semester",
                value: 0.0,
                min: 1.0,
                max: f64::from(u32::MAX),
            });
        }
        if self.roll_number != self.id {
            return Err(RecordValidationError::InvalidFormat {
                field: "rollNumber",
                value: self.roll_number.clone(),
            });
        }
        require_range("cgpa", self.cgpa, 0.0, MAX_CGPA)
    }
}

/// Teaching staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: String,
    pub name: String,
    pub email: String,
    pub department_id: String,
}

impl Teacher {
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        require_text("id", &self.id)?;
        require_text("name", &self.name)?;
        validate_email(&self.email)?;
        require_text("departmentId", &self.department_id)
    }
}

fn validate_email(email: &str) -> Result<(), RecordValidationError> {
    require_text("email", email)?;
    if !email.contains('@') {
        return Err(RecordValidationError::InvalidFormat {
            field: "email",
            value: email.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{RecordValidationError, Student, Subject, SubjectKind};

    #[test]
    fn enrolled_student_mirrors_id_into_roll_number() {
        let student = Student::enrolled("2024CS0001", "Asha", "asha@uni.edu", "1", 1);
        assert_eq!(student.roll_number, "2024CS0001");
        assert_eq!(student.cgpa, 0.0);
        assert_eq!(student.total_credits, 0);
        assert!(student.validate().is_ok());
    }

    #[test]
    fn student_rejects_email_without_at_sign() {
        let student = Student::enrolled("2024CS0001", "Asha", "asha.uni.edu", "1", 1);
        assert!(matches!(
            student.validate(),
            Err(RecordValidationError::InvalidFormat { field: "email", .. })
        ));
    }

    #[test]
    fn subject_requires_positive_credits() {
        let subject = Subject {
            id: "1".to_string(),
            name: "Data Structures".to_string(),
            code: "CS201".to_string(),
            kind: SubjectKind::Theory,
            department_id: "1".to_string(),
            semester: 3,
            credits: 0,
        };
        assert!(matches!(
            subject.validate(),
            Err(RecordValidationError::OutOfRange { field: "credits", .. })
        ));
    }
}
