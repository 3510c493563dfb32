//! Grade engine: total score to letter grade, grade points and CGPA.
//!
//! # Responsibility
//! - Map a 100-point total onto the seven grade bands.
//! - Fold FAT and assignment scores into the internal component.
//! - Compute credit-weighted grade-point averages.
//!
//! # Invariants
//! - Every function here is pure; no I/O and no rounding.
//! - Band boundaries are inclusive on their lower bound.

use crate::model::marks::{InternalMarks, MAX_RAW_MARKS};
use crate::model::RecordValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Letter grade on the ten-point scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "O")]
    O,
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "F")]
    F,
}

impl Grade {
    /// All grades from best to worst.
    pub const ALL: [Grade; 7] = [
        Grade::O,
        Grade::APlus,
        Grade::A,
        Grade::BPlus,
        Grade::B,
        Grade::C,
        Grade::F,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::O => "O",
            Self::APlus => "A+",
            Self::A => "A",
            Self::BPlus => "B+",
            Self::B => "B",
            Self::C => "C",
            Self::F => "F",
        }
    }

    /// Grade-point value of this grade.
    pub fn point(self) -> u8 {
        match self {
            Self::O => 10,
            Self::APlus => 9,
            Self::A => 8,
            Self::BPlus => 7,
            Self::B => 6,
            Self::C => 5,
            Self::F => 0,
        }
    }
}

impl Display for Grade {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grade {
    type Err = RecordValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Grade::ALL
            .into_iter()
            .find(|grade| grade.as_str() == value)
            .ok_or_else(|| RecordValidationError::InvalidFormat {
                field: "grade",
                value: value.to_string(),
            })
    }
}

/// Maps a total score to its grade band.
///
/// NaN falls through every comparison and maps to `F`.
pub fn grade_of(total: f64) -> Grade {
    if total >= 90.0 {
        Grade::O
    } else if total >= 80.0 {
        Grade::APlus
    } else if total >= 70.0 {
        Grade::A
    } else if total >= 60.0 {
        Grade::BPlus
    } else if total >= 50.0 {
        Grade::B
    } else if total >= 40.0 {
        Grade::C
    } else {
        Grade::F
    }
}

/// Grade-point value of a typed grade.
pub fn grade_point_of(grade: Grade) -> u8 {
    grade.point()
}

/// Grade-point value of a free-form grade label; unknown labels score 0.
pub fn grade_point_for_label(label: &str) -> u8 {
    label.parse::<Grade>().map_or(0, Grade::point)
}

/// Credit-weighted average; exactly `0.0` when no credits were earned.
pub fn cgpa_of(total_grade_points: f64, total_credits: u32) -> f64 {
    if total_credits > 0 {
        total_grade_points / f64::from(total_credits)
    } else {
        0.0
    }
}

/// Running sum of `grade_point * credits` and credits.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CreditTally {
    pub total_grade_points: f64,
    pub total_credits: u32,
}

impl CreditTally {
    pub fn add(&mut self, grade_point: u8, credits: u32) {
        self.total_grade_points += f64::from(grade_point) * f64::from(credits);
        self.total_credits = self.total_credits.saturating_add(credits);
    }

    pub fn cgpa(&self) -> f64 {
        cgpa_of(self.total_grade_points, self.total_credits)
    }
}

impl FromIterator<(u8, u32)> for CreditTally {
    fn from_iter<T: IntoIterator<Item = (u8, u32)>>(iter: T) -> Self {
        let mut tally = Self::default();
        for (grade_point, credits) in iter {
            tally.add(grade_point, credits);
        }
        tally
    }
}

/// Weighting used to fold raw marks into a 100-point total.
///
/// `internal = mean(fat_marks) * fat_weight + mean(assignments) * assignment_weight`
/// where both means are over raw 0..=100 scores across every FAT record.
/// `external = sat_marks * external_max / 100`, so a raw SAT score of 0..=100
/// contributes at most `external_max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarksPolicy {
    pub fat_weight: f64,
    pub assignment_weight: f64,
    pub external_max: f64,
}

impl Default for MarksPolicy {
    fn default() -> Self {
        Self {
            fat_weight: 0.30,
            assignment_weight: 0.10,
            external_max: 60.0,
        }
    }
}

impl MarksPolicy {
    /// Highest internal component this policy can produce.
    pub fn internal_max(&self) -> f64 {
        (self.fat_weight + self.assignment_weight) * MAX_RAW_MARKS
    }

    /// Weights must be finite, non-negative and keep totals on a 100 scale.
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        for (field, value) in [
            ("fat_weight", self.fat_weight),
            ("assignment_weight", self.assignment_weight),
            ("external_max", self.external_max),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(RecordValidationError::OutOfRange {
                    field,
                    value,
                    min: 0.0,
                    max: f64::MAX,
                });
            }
        }
        let ceiling = self.internal_max() + self.external_max;
        if ceiling > MAX_RAW_MARKS + 1e-9 {
            return Err(RecordValidationError::OutOfRange {
                field: "total",
                value: ceiling,
                min: 0.0,
                max: MAX_RAW_MARKS,
            });
        }
        Ok(())
    }

    /// Folds every FAT record of one (student, subject) into the internal
    /// component. No records yields `0.0`.
    pub fn internal_from(&self, records: &[InternalMarks]) -> f64 {
        let fat_mean = mean(records.iter().map(|record| record.fat_marks));
        let assignment_mean = mean(
            records
                .iter()
                .flat_map(|record| record.assignments.iter().copied()),
        );
        fat_mean * self.fat_weight + assignment_mean * self.assignment_weight
    }

    /// Scales a raw 0..=100 SAT score onto the external component.
    pub fn external_from(&self, sat_marks: f64) -> f64 {
        sat_marks * self.external_max / MAX_RAW_MARKS
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0_u32), |(sum, count), value| {
        (sum + value, count + 1)
    });
    if count == 0 {
        0.0
    } else {
        sum / f64::from(count)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        cgpa_of, grade_of, grade_point_for_label, grade_point_of, CreditTally, Grade, MarksPolicy,
    };
    use crate::model::marks::InternalMarks;

    #[test]
    fn boundaries_map_to_the_higher_band() {
        assert_eq!(grade_of(90.0), Grade::O);
        assert_eq!(grade_of(89.999), Grade::APlus);
        assert_eq!(grade_of(80.0), Grade::APlus);
        assert_eq!(grade_of(70.0), Grade::A);
        assert_eq!(grade_of(60.0), Grade::BPlus);
        assert_eq!(grade_of(50.0), Grade::B);
        assert_eq!(grade_of(40.0), Grade::C);
        assert_eq!(grade_of(39.999), Grade::F);
    }

    #[test]
    fn grade_of_is_total_over_extreme_inputs() {
        assert_eq!(grade_of(1_000.0), Grade::O);
        assert_eq!(grade_of(-5.0), Grade::F);
        assert_eq!(grade_of(f64::NAN), Grade::F);
        assert_eq!(grade_of(f64::NEG_INFINITY), Grade::F);
    }

    #[test]
    fn grade_point_table_matches_scale() {
        let points: Vec<u8> = Grade::ALL.into_iter().map(grade_point_of).collect();
        assert_eq!(points, vec![10, 9, 8, 7, 6, 5, 0]);
    }

    #[test]
    fn unknown_label_scores_zero() {
        assert_eq!(grade_point_for_label("A+"), 9);
        assert_eq!(grade_point_for_label("E"), 0);
        assert_eq!(grade_point_for_label(""), 0);
    }

    #[test]
    fn grade_labels_parse_and_display() {
        for grade in Grade::ALL {
            assert_eq!(grade.to_string().parse::<Grade>(), Ok(grade));
        }
        assert!("a+".parse::<Grade>().is_err());
    }

    #[test]
    fn cgpa_of_zero_credits_is_zero() {
        assert_eq!(cgpa_of(64.0, 0), 0.0);
        assert_eq!(cgpa_of(0.0, 7), 0.0);
    }

    #[test]
    fn cgpa_of_is_linear_in_grade_points() {
        let base = cgpa_of(32.0, 7);
        assert!((cgpa_of(64.0, 7) - 2.0 * base).abs() < 1e-12);
    }

    #[test]
    fn credit_tally_weights_by_credits() {
        let tally: CreditTally = [(10, 4), (8, 3)].into_iter().collect();
        assert_eq!(tally.total_credits, 7);
        assert_eq!(tally.total_grade_points, 64.0);
        assert!((tally.cgpa() - 64.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn internal_combines_fat_and_assignment_means() {
        let policy = MarksPolicy::default();
        let records = vec![
            InternalMarks {
                student_id: "s".to_string(),
                subject_id: "1".to_string(),
                fat_number: 1,
                fat_marks: 80.0,
                assignments: vec![90.0, 70.0],
            },
            InternalMarks {
                student_id: "s".to_string(),
                subject_id: "1".to_string(),
                fat_number: 2,
                fat_marks: 60.0,
                assignments: vec![100.0],
            },
        ];
        // fat mean 70 * 0.3 + assignment mean 260/3 * 0.1
        let expected = 70.0 * 0.3 + (260.0 / 3.0) * 0.1;
        assert!((policy.internal_from(&records) - expected).abs() < 1e-9);
        assert_eq!(policy.internal_from(&[]), 0.0);
    }

    #[test]
    fn default_policy_keeps_totals_on_hundred_scale() {
        let policy = MarksPolicy::default();
        assert!(policy.validate().is_ok());
        assert!((policy.internal_max() - 40.0).abs() < 1e-9);

        let oversized = MarksPolicy {
            external_max: 100.0,
            ..policy
        };
        assert!(oversized.validate().is_err());
    }

    #[test]
    fn external_scales_raw_sat_score_onto_policy_ceiling() {
        let policy = MarksPolicy::default();
        assert_eq!(policy.external_from(100.0), 60.0);
        assert_eq!(policy.external_from(90.0), 54.0);
        assert_eq!(policy.external_from(0.0), 0.0);
        assert!(policy.internal_max() + policy.external_from(100.0) <= 100.0 + 1e-9);
    }
}
