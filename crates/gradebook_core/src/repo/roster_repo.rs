//! Roster repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Insert and look up departments, subjects, students and teachers.
//! - Persist the derived student standing written by the result roll-up.
//!
//! # Invariants
//! - `update_student_standing` touches only `cgpa` and `total_credits`.
//! - Lookups return `None` for missing ids; `NotFound` is raised only by
//!   writes that target an existing row.

use super::{
    ensure_connection_ready, ensure_stored_valid, to_u32, EntityKind, RepoError, RepoResult,
};
use crate::model::roster::{Department, Student, Subject, SubjectKind, Teacher};
use crate::model::RecordValidationError;
use rusqlite::{params, Connection, OptionalExtension, Row};

const STUDENT_SELECT_SQL: &str = "SELECT
    id,
    name,
    email,
    department_id,
    semester,
    roll_number,
    cgpa,
    total_credits
FROM students";

const SUBJECT_SELECT_SQL: &str = "SELECT
    id,
    name,
    code,
    type,
    department_id,
    semester,
    credits
FROM subjects";

/// Repository interface for roster records.
pub trait RosterRepository {
    fn insert_department(&self, department: &Department) -> RepoResult<()>;
    fn get_department(&self, id: &str) -> RepoResult<Option<Department>>;
    fn insert_subject(&self, subject: &Subject) -> RepoResult<()>;
    fn get_subject(&self, id: &str) -> RepoResult<Option<Subject>>;
    fn insert_student(&self, student: &Student) -> RepoResult<()>;
    fn get_student(&self, id: &str) -> RepoResult<Option<Student>>;
    /// Writes roll-up output onto an existing student.
    fn update_student_standing(&self, id: &str, cgpa: f64, total_credits: u32) -> RepoResult<()>;
    fn insert_teacher(&self, teacher: &Teacher) -> RepoResult<()>;
}

/// SQLite-backed roster repository.
pub struct SqliteRosterRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRosterRepository<'conn> {
    /// Binds to a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl RosterRepository for SqliteRosterRepository<'_> {
    fn insert_department(&self, department: &Department) -> RepoResult<()> {
        department.validate()?;
        self.conn.execute(
            "INSERT INTO departments (id, name, code) VALUES (?1, ?2, ?3);",
            params![department.id, department.name, department.code],
        )?;
        Ok(())
    }

    fn get_department(&self, id: &str) -> RepoResult<Option<Department>> {
        let department = self
            .conn
            .query_row(
                "SELECT id, name, code FROM departments WHERE id = ?1;",
                [id],
                |row| {
                    Ok(Department {
                        id: row.get("id")?,
                        name: row.get("name")?,
                        code: row.get("code")?,
                    })
                },
            )
            .optional()?;
        if let Some(department) = &department {
            ensure_stored_valid("departments", department.validate())?;
        }
        Ok(department)
    }

    fn insert_subject(&self, subject: &Subject) -> RepoResult<()> {
        subject.validate()?;
        self.conn.execute(
            "INSERT INTO subjects (
                id,
                name,
                code,
                type,
                department_id,
                semester,
                credits
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                subject.id,
                subject.name,
                subject.code,
                subject.kind.as_str(),
                subject.department_id,
                subject.semester,
                subject.credits,
            ],
        )?;
        Ok(())
    }

    fn get_subject(&self, id: &str) -> RepoResult<Option<Subject>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SUBJECT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_subject_row(row)?));
        }
        Ok(None)
    }

    fn insert_student(&self, student: &Student) -> RepoResult<()> {
        student.validate()?;
        self.conn.execute(
            "INSERT INTO students (
                id,
                name,
                email,
                department_id,
                semester,
                roll_number,
                cgpa,
                total_credits
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                student.id,
                student.name,
                student.email,
                student.department_id,
                student.semester,
                student.roll_number,
                student.cgpa,
                student.total_credits,
            ],
        )?;
        Ok(())
    }

    fn get_student(&self, id: &str) -> RepoResult<Option<Student>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{STUDENT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_student_row(row)?));
        }
        Ok(None)
    }

    fn update_student_standing(&self, id: &str, cgpa: f64, total_credits: u32) -> RepoResult<()> {
        if !cgpa.is_finite() || !(0.0..=crate::model::roster::MAX_CGPA).contains(&cgpa) {
            return Err(RecordValidationError::OutOfRange {
                field: "cgpa",
                value: cgpa,
                min: 0.0,
                max: crate::model::roster::MAX_CGPA,
            }
            .into());
        }

        let changed = self.conn.execute(
            "UPDATE students
             SET
                cgpa = ?1,
                total_credits = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?3;",
            params![cgpa, total_credits, id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Student,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    fn insert_teacher(&self, teacher: &Teacher) -> RepoResult<()> {
        teacher.validate()?;
        self.conn.execute(
            "INSERT INTO teachers (id, name, email, department_id) VALUES (?1, ?2, ?3, ?4);",
            params![
                teacher.id,
                teacher.name,
                teacher.email,
                teacher.department_id
            ],
        )?;
        Ok(())
    }
}

fn parse_subject_row(row: &Row<'_>) -> RepoResult<Subject> {
    let kind_text: String = row.get("type")?;
    let kind = SubjectKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid subject type `{kind_text}` in subjects.type"))
    })?;

    let subject = Subject {
        id: row.get("id")?,
        name: row.get("name")?,
        code: row.get("code")?,
        kind,
        department_id: row.get("department_id")?,
        semester: to_u32(row.get("semester")?, "subjects.semester")?,
        credits: to_u32(row.get("credits")?, "subjects.credits")?,
    };
    ensure_stored_valid("subjects", subject.validate())?;
    Ok(subject)
}

fn parse_student_row(row: &Row<'_>) -> RepoResult<Student> {
    let student = Student {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        department_id: row.get("department_id")?,
        semester: to_u32(row.get("semester")?, "students.semester")?,
        roll_number: row.get("roll_number")?,
        cgpa: row.get("cgpa")?,
        total_credits: to_u32(row.get("total_credits")?, "students.total_credits")?,
    };
    ensure_stored_valid("students", student.validate())?;
    Ok(student)
}
