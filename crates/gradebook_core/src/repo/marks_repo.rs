//! Marks repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Upsert FAT records keyed by `(student, subject, fat_number)`.
//! - Store SAT marks and apply the subject-wide submission lock.
//!
//! # Invariants
//! - `save_unsubmitted_sat_marks` is one conditional upsert: it never
//!   overwrites a row whose `is_submitted = 1`.
//! - `submit_sat_marks_for_subject` is one `UPDATE` statement, so every
//!   pending row of the subject flips together.
//! - Assignment sub-scores are stored as a JSON array preserving order.

use super::{
    bool_to_int, ensure_connection_ready, ensure_stored_valid, int_to_bool, RepoError, RepoResult,
};
use crate::model::marks::{InternalMarks, SatMarks};
use rusqlite::{params, Connection, Row};

const INTERNAL_SELECT_SQL: &str = "SELECT
    student_id,
    subject_id,
    fat_number,
    fat_marks,
    assignments
FROM internal_marks";

const SAT_SELECT_SQL: &str = "SELECT
    student_id,
    subject_id,
    marks,
    is_submitted
FROM sat_marks";

/// Repository interface for FAT and SAT marks.
pub trait MarksRepository {
    /// Inserts or fully replaces one FAT record.
    fn upsert_internal_marks(&self, marks: &InternalMarks) -> RepoResult<()>;
    /// Lists every FAT record of one pair ordered by `fat_number`.
    fn list_internal_marks(&self, student_id: &str, subject_id: &str)
        -> RepoResult<Vec<InternalMarks>>;
    /// Upserts an unsubmitted SAT record.
    ///
    /// Returns `false` without writing when the stored row is submitted.
    fn save_unsubmitted_sat_marks(&self, marks: &SatMarks) -> RepoResult<bool>;
    fn get_sat_marks(&self, student_id: &str, subject_id: &str) -> RepoResult<Option<SatMarks>>;
    /// Lists SAT records of one subject ordered by student id.
    fn list_sat_marks_for_subject(&self, subject_id: &str) -> RepoResult<Vec<SatMarks>>;
    /// Locks every unsubmitted SAT record of a subject; returns rows locked.
    fn submit_sat_marks_for_subject(&self, subject_id: &str) -> RepoResult<usize>;
}

/// SQLite-backed marks repository.
pub struct SqliteMarksRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMarksRepository<'conn> {
    /// Binds to a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl MarksRepository for SqliteMarksRepository<'_> {
    fn upsert_internal_marks(&self, marks: &InternalMarks) -> RepoResult<()> {
        marks.validate()?;
        let assignments = serde_json::to_string(&marks.assignments).map_err(|err| {
            RepoError::InvalidData(format!("cannot encode assignments: {err}"))
        })?;

        self.conn.execute(
            "INSERT INTO internal_marks (
                student_id,
                subject_id,
                fat_number,
                fat_marks,
                assignments
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (student_id, subject_id, fat_number) DO UPDATE SET
                fat_marks = excluded.fat_marks,
                assignments = excluded.assignments,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                marks.student_id,
                marks.subject_id,
                marks.fat_number,
                marks.fat_marks,
                assignments,
            ],
        )?;
        Ok(())
    }

    fn list_internal_marks(
        &self,
        student_id: &str,
        subject_id: &str,
    ) -> RepoResult<Vec<InternalMarks>> {
        let mut stmt = self.conn.prepare(&format!(
            "{INTERNAL_SELECT_SQL}
             WHERE student_id = ?1
               AND subject_id = ?2
             ORDER BY fat_number ASC;"
        ))?;
        let mut rows = stmt.query(params![student_id, subject_id])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_internal_row(row)?);
        }
        Ok(records)
    }

    fn save_unsubmitted_sat_marks(&self, marks: &SatMarks) -> RepoResult<bool> {
        marks.validate()?;
        if marks.is_submitted {
            return Err(RepoError::InvalidData(
                "sat marks can only be saved unsubmitted".to_string(),
            ));
        }

        let changed = self.conn.execute(
            "INSERT INTO sat_marks (
                student_id,
                subject_id,
                marks,
                is_submitted
            ) VALUES (?1, ?2, ?3, 0)
            ON CONFLICT (student_id, subject_id) DO UPDATE SET
                marks = excluded.marks,
                updated_at = (strftime('%s', 'now') * 1000)
            WHERE sat_marks.is_submitted = 0;",
            params![marks.student_id, marks.subject_id, marks.marks],
        )?;
        Ok(changed > 0)
    }

    fn get_sat_marks(&self, student_id: &str, subject_id: &str) -> RepoResult<Option<SatMarks>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SAT_SELECT_SQL}
             WHERE student_id = ?1
               AND subject_id = ?2;"
        ))?;
        let mut rows = stmt.query(params![student_id, subject_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_sat_row(row)?));
        }
        Ok(None)
    }

    fn list_sat_marks_for_subject(&self, subject_id: &str) -> RepoResult<Vec<SatMarks>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SAT_SELECT_SQL}
             WHERE subject_id = ?1
             ORDER BY student_id ASC;"
        ))?;
        let mut rows = stmt.query([subject_id])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_sat_row(row)?);
        }
        Ok(records)
    }

    fn submit_sat_marks_for_subject(&self, subject_id: &str) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE sat_marks
             SET
                is_submitted = ?1,
                submitted_at = (strftime('%s', 'now') * 1000),
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE subject_id = ?2
               AND is_submitted = 0;",
            params![bool_to_int(true), subject_id],
        )?;
        Ok(changed)
    }
}

fn parse_internal_row(row: &Row<'_>) -> RepoResult<InternalMarks> {
    let fat_number_value: i64 = row.get("fat_number")?;
    let fat_number = u8::try_from(fat_number_value).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid fat number `{fat_number_value}` in internal_marks.fat_number"
        ))
    })?;

    let assignments_text: String = row.get("assignments")?;
    let assignments: Vec<f64> = serde_json::from_str(&assignments_text).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid assignments `{assignments_text}` in internal_marks.assignments: {err}"
        ))
    })?;

    let marks = InternalMarks {
        student_id: row.get("student_id")?,
        subject_id: row.get("subject_id")?,
        fat_number,
        fat_marks: row.get("fat_marks")?,
        assignments,
    };
    ensure_stored_valid("internal_marks", marks.validate())?;
    Ok(marks)
}

fn parse_sat_row(row: &Row<'_>) -> RepoResult<SatMarks> {
    let marks = SatMarks {
        student_id: row.get("student_id")?,
        subject_id: row.get("subject_id")?,
        marks: row.get("marks")?,
        is_submitted: int_to_bool(row.get("is_submitted")?, "sat_marks.is_submitted")?,
    };
    ensure_stored_valid("sat_marks", marks.validate())?;
    Ok(marks)
}
