//! Result repository contracts and SQLite implementation.
//!
//! # Invariants
//! - One row per `(student_id, subject_id)`; recomputation replaces it.
//! - Listing order is deterministic: `semester ASC, subject_id ASC`.

use super::{ensure_connection_ready, ensure_stored_valid, to_u32, RepoError, RepoResult};
use crate::grading::Grade;
use crate::model::result::{ResultCategory, SubjectResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const RESULT_SELECT_SQL: &str = "SELECT
    student_id,
    subject_id,
    semester,
    internal,
    external,
    total,
    grade,
    grade_point,
    category
FROM results";

/// Filter for listing one student's results.
#[derive(Debug, Clone, Default)]
pub struct ResultQuery {
    pub student_id: String,
    pub semester: Option<u32>,
    pub category: Option<ResultCategory>,
}

impl ResultQuery {
    pub fn for_student(student_id: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            ..Self::default()
        }
    }
}

/// Repository interface for derived results.
pub trait ResultRepository {
    /// Inserts or fully replaces the result of one pair.
    fn upsert_result(&self, result: &SubjectResult) -> RepoResult<()>;
    fn list_results(&self, query: &ResultQuery) -> RepoResult<Vec<SubjectResult>>;
}

/// SQLite-backed result repository.
pub struct SqliteResultRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteResultRepository<'conn> {
    /// Binds to a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ResultRepository for SqliteResultRepository<'_> {
    fn upsert_result(&self, result: &SubjectResult) -> RepoResult<()> {
        result.validate()?;
        self.conn.execute(
            "INSERT INTO results (
                student_id,
                subject_id,
                semester,
                internal,
                external,
                total,
                grade,
                grade_point,
                category
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT (student_id, subject_id) DO UPDATE SET
                semester = excluded.semester,
                internal = excluded.internal,
                external = excluded.external,
                total = excluded.total,
                grade = excluded.grade,
                grade_point = excluded.grade_point,
                category = excluded.category,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                result.student_id,
                result.subject_id,
                result.semester,
                result.internal,
                result.external,
                result.total,
                result.grade.as_str(),
                result.grade_point,
                result.category.as_str(),
            ],
        )?;
        Ok(())
    }

    fn list_results(&self, query: &ResultQuery) -> RepoResult<Vec<SubjectResult>> {
        let mut sql = format!("{RESULT_SELECT_SQL} WHERE student_id = ?");
        let mut bind_values: Vec<Value> = vec![Value::Text(query.student_id.clone())];

        if let Some(semester) = query.semester {
            sql.push_str(" AND semester = ?");
            bind_values.push(Value::Integer(i64::from(semester)));
        }

        if let Some(category) = query.category {
            sql.push_str(" AND category = ?");
            bind_values.push(Value::Text(category.as_str().to_string()));
        }

        sql.push_str(" ORDER BY semester ASC, subject_id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut results = Vec::new();
        while let Some(row) = rows.next()? {
            results.push(parse_result_row(row)?);
        }
        Ok(results)
    }
}

fn parse_result_row(row: &Row<'_>) -> RepoResult<SubjectResult> {
    let grade_text: String = row.get("grade")?;
    let grade: Grade = grade_text.parse().map_err(|_| {
        RepoError::InvalidData(format!("invalid grade `{grade_text}` in results.grade"))
    })?;

    let category_text: String = row.get("category")?;
    let category = ResultCategory::parse(&category_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid category `{category_text}` in results.category"
        ))
    })?;

    let grade_point_value: i64 = row.get("grade_point")?;
    let grade_point = u8::try_from(grade_point_value).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid grade point `{grade_point_value}` in results.grade_point"
        ))
    })?;

    let result = SubjectResult {
        student_id: row.get("student_id")?,
        subject_id: row.get("subject_id")?,
        semester: to_u32(row.get("semester")?, "results.semester")?,
        internal: row.get("internal")?,
        external: row.get("external")?,
        total: row.get("total")?,
        grade,
        grade_point,
        category,
    };
    ensure_stored_valid("results", result.validate())?;
    Ok(result)
}
