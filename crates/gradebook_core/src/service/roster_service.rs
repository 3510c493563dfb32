//! Roster enrollment service.
//!
//! # Responsibility
//! - Create departments, subjects, students and teachers with allocated ids.
//!
//! # Invariants
//! - Student ids are scoped by the department code, teacher ids by `T`,
//!   department and subject ids by their collection.
//! - Referenced departments must exist before any id is allocated.

use super::error::{ServiceError, ServiceResult};
use super::id_allocator::IdentifierAllocator;
use crate::model::identifier::IdScope;
use crate::model::roster::{Department, Student, Subject, SubjectKind, Teacher};
use crate::repo::counter_repo::IdCounterRepository;
use crate::repo::roster_repo::RosterRepository;
use crate::repo::EntityKind;
use log::info;

const DEPARTMENTS_COLLECTION: &str = "departments";
const SUBJECTS_COLLECTION: &str = "subjects";
/// Placeholder id used to validate a request before allocation.
const PENDING_ID: &str = "pending";

/// Request model for adding a subject to the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubject {
    pub name: String,
    pub code: String,
    pub kind: SubjectKind,
    pub department_id: String,
    pub semester: u32,
    pub credits: u32,
}

/// Enrollment facade over roster persistence and id allocation.
pub struct RosterService<R: RosterRepository, C: IdCounterRepository> {
    roster: R,
    ids: IdentifierAllocator<C>,
}

impl<R: RosterRepository, C: IdCounterRepository> RosterService<R, C> {
    pub fn new(roster: R, ids: IdentifierAllocator<C>) -> Self {
        Self { roster, ids }
    }

    /// Adds a department; `code` later prefixes its student ids.
    pub fn add_department(&self, name: &str, code: &str) -> ServiceResult<Department> {
        IdScope::department(code).validate()?;
        let mut department = Department {
            id: PENDING_ID.to_string(),
            name: name.to_string(),
            code: code.to_string(),
        };
        department.validate()?;

        department.id = self
            .ids
            .allocate(&IdScope::collection(DEPARTMENTS_COLLECTION))?
            .to_string();
        self.roster.insert_department(&department)?;
        Ok(department)
    }

    /// Adds a subject under an existing department.
    pub fn add_subject(&self, request: &NewSubject) -> ServiceResult<Subject> {
        self.require_department(&request.department_id)?;
        let mut subject = Subject {
            id: PENDING_ID.to_string(),
            name: request.name.clone(),
            code: request.code.clone(),
            kind: request.kind,
            department_id: request.department_id.clone(),
            semester: request.semester,
            credits: request.credits,
        };
        // Reject before consuming a sequence number.
        subject.validate()?;

        subject.id = self
            .ids
            .allocate(&IdScope::collection(SUBJECTS_COLLECTION))?
            .to_string();
        self.roster.insert_subject(&subject)?;
        Ok(subject)
    }

    /// Enrolls a student with id `<year><department code><seq>`.
    pub fn enroll_student(
        &self,
        name: &str,
        email: &str,
        department_id: &str,
        semester: u32,
    ) -> ServiceResult<Student> {
        let department = self.require_department(department_id)?;
        Student::enrolled(PENDING_ID, name, email, department_id, semester).validate()?;

        let id = self.ids.allocate(&IdScope::department(&department.code))?;
        let student = Student::enrolled(id.to_string(), name, email, department_id, semester);
        self.roster.insert_student(&student)?;

        info!(
            "event=student_enroll module=roster status=ok student_id={} department_id={}",
            student.id, department_id
        );
        Ok(student)
    }

    /// Registers a teacher with id `<year>T<seq>`.
    pub fn register_teacher(
        &self,
        name: &str,
        email: &str,
        department_id: &str,
    ) -> ServiceResult<Teacher> {
        self.require_department(department_id)?;
        let mut teacher = Teacher {
            id: PENDING_ID.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            department_id: department_id.to_string(),
        };
        teacher.validate()?;

        teacher.id = self.ids.allocate(&IdScope::Teacher)?.to_string();
        self.roster.insert_teacher(&teacher)?;

        info!(
            "event=teacher_register module=roster status=ok teacher_id={}",
            teacher.id
        );
        Ok(teacher)
    }

    fn require_department(&self, department_id: &str) -> ServiceResult<Department> {
        self.roster
            .get_department(department_id)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Department, department_id))
    }
}
