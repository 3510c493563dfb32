//! Result aggregation and grade-point roll-up.
//!
//! # Responsibility
//! - Combine FAT and SAT marks of one pair into a persisted `SubjectResult`.
//! - Roll results up into credit-weighted CGPA and per-semester GPA.
//!
//! # Invariants
//! - `roll_up` is the only writer of `Student.cgpa` / `Student.total_credits`.
//! - A result is only computed from submitted SAT marks.
//! - Reads across several queries are not a consistent snapshot.

use super::error::{ServiceError, ServiceResult};
use crate::grading::{grade_of, grade_point_of, CreditTally, MarksPolicy};
use crate::model::result::{ResultCategory, SubjectResult};
use crate::model::roster::Student;
use crate::repo::marks_repo::MarksRepository;
use crate::repo::result_repo::{ResultQuery, ResultRepository};
use crate::repo::roster_repo::RosterRepository;
use crate::repo::EntityKind;
use log::info;
use std::collections::BTreeMap;

/// Cumulative standing written back onto the student.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Standing {
    pub cgpa: f64,
    pub total_credits: u32,
}

/// Grade-point average of one semester.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SemesterSummary {
    pub semester: u32,
    pub gpa: f64,
    pub credits: u32,
}

/// Student record with every result, as shown on the student dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentDashboard {
    pub student: Student,
    pub results: Vec<SubjectResult>,
}

/// Aggregator over marks, roster and result repositories.
pub struct ResultAggregator<M, R, S>
where
    M: MarksRepository,
    R: RosterRepository,
    S: ResultRepository,
{
    marks: M,
    roster: R,
    results: S,
    policy: MarksPolicy,
}

impl<M, R, S> ResultAggregator<M, R, S>
where
    M: MarksRepository,
    R: RosterRepository,
    S: ResultRepository,
{
    /// Creates an aggregator with the default marks policy.
    pub fn new(marks: M, roster: R, results: S) -> Self {
        Self {
            marks,
            roster,
            results,
            policy: MarksPolicy::default(),
        }
    }

    /// Creates an aggregator with a custom policy.
    ///
    /// # Errors
    /// - `Validation` when the policy could produce totals above 100.
    pub fn with_policy(
        marks: M,
        roster: R,
        results: S,
        policy: MarksPolicy,
    ) -> ServiceResult<Self> {
        policy.validate()?;
        Ok(Self {
            marks,
            roster,
            results,
            policy,
        })
    }

    /// Computes and persists the result of one `(student, subject)` pair.
    ///
    /// `internal` follows `MarksPolicy::internal_from`, `external` is the
    /// submitted SAT score scaled by `MarksPolicy::external_from`, and
    /// `total = internal + external`.
    ///
    /// # Errors
    /// - `NotFound` for a missing student, subject or SAT record.
    /// - `ExternalNotSubmitted` while the SAT record is still editable.
    pub fn compute_result(
        &self,
        student_id: &str,
        subject_id: &str,
        semester: u32,
        category: ResultCategory,
    ) -> ServiceResult<SubjectResult> {
        if self.roster.get_student(student_id)?.is_none() {
            return Err(ServiceError::not_found(EntityKind::Student, student_id));
        }
        if self.roster.get_subject(subject_id)?.is_none() {
            return Err(ServiceError::not_found(EntityKind::Subject, subject_id));
        }

        let sat = self
            .marks
            .get_sat_marks(student_id, subject_id)?
            .ok_or_else(|| {
                ServiceError::not_found(EntityKind::SatMarks, &format!("{student_id}/{subject_id}"))
            })?;
        if !sat.is_submitted {
            return Err(ServiceError::ExternalNotSubmitted {
                student_id: student_id.to_string(),
                subject_id: subject_id.to_string(),
            });
        }

        let fats = self.marks.list_internal_marks(student_id, subject_id)?;
        let internal = self.policy.internal_from(&fats);
        let external = self.policy.external_from(sat.marks);
        let total = internal + external;
        let grade = grade_of(total);

        let result = SubjectResult {
            student_id: student_id.to_string(),
            subject_id: subject_id.to_string(),
            semester,
            internal,
            external,
            total,
            grade,
            grade_point: grade_point_of(grade),
            category,
        };
        self.results.upsert_result(&result)?;

        info!(
            "event=result_compute module=result_aggregator status=ok student_id={} subject_id={} semester={} fat_count={}",
            student_id,
            subject_id,
            semester,
            fats.len()
        );
        Ok(result)
    }

    /// Recomputes CGPA and total credits from every stored result and writes
    /// both onto the student.
    pub fn roll_up(&self, student_id: &str) -> ServiceResult<Standing> {
        if self.roster.get_student(student_id)?.is_none() {
            return Err(ServiceError::not_found(EntityKind::Student, student_id));
        }

        let results = self.results.list_results(&ResultQuery::for_student(student_id))?;
        let mut tally = CreditTally::default();
        for result in &results {
            tally.add(result.grade_point, self.subject_credits(&result.subject_id)?);
        }

        let standing = Standing {
            cgpa: tally.cgpa(),
            total_credits: tally.total_credits,
        };
        self.roster
            .update_student_standing(student_id, standing.cgpa, standing.total_credits)?;

        info!(
            "event=roll_up module=result_aggregator status=ok student_id={} result_count={} total_credits={}",
            student_id,
            results.len(),
            standing.total_credits
        );
        Ok(standing)
    }

    /// Lists results filtered by semester and/or category.
    pub fn results(&self, query: &ResultQuery) -> ServiceResult<Vec<SubjectResult>> {
        Ok(self.results.list_results(query)?)
    }

    /// Per-semester GPA ordered by semester.
    pub fn semester_summaries(&self, student_id: &str) -> ServiceResult<Vec<SemesterSummary>> {
        let results = self.results.list_results(&ResultQuery::for_student(student_id))?;
        let mut by_semester: BTreeMap<u32, CreditTally> = BTreeMap::new();
        for result in &results {
            let credits = self.subject_credits(&result.subject_id)?;
            by_semester
                .entry(result.semester)
                .or_default()
                .add(result.grade_point, credits);
        }

        Ok(by_semester
            .into_iter()
            .map(|(semester, tally)| SemesterSummary {
                semester,
                gpa: tally.cgpa(),
                credits: tally.total_credits,
            })
            .collect())
    }

    /// Student record together with all of their results.
    pub fn dashboard(&self, student_id: &str) -> ServiceResult<StudentDashboard> {
        let student = self
            .roster
            .get_student(student_id)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Student, student_id))?;
        let results = self.results.list_results(&ResultQuery::for_student(student_id))?;
        Ok(StudentDashboard { student, results })
    }

    fn subject_credits(&self, subject_id: &str) -> ServiceResult<u32> {
        self.roster
            .get_subject(subject_id)?
            .map(|subject| subject.credits)
            .ok_or_else(|| ServiceError::not_found(EntityKind::Subject, subject_id))
    }
}
