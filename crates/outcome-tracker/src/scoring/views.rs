use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::{
    CourseId, EnrollmentId, LearningOutcomeId, ProgramOutcomeId, Student, StudentId,
};

use super::achievement::AchievementLevel;
use super::aggregate::ProgramOutcomeScores;
use super::policy::AggregationStrategy;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentRef {
    pub id: StudentId,
    pub student_number: String,
    pub name: String,
}

impl From<&Student> for StudentRef {
    fn from(student: &Student) -> Self {
        Self {
            id: student.id.clone(),
            student_number: student.student_number.clone(),
            name: student.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoSummaryEntry {
    pub program_outcome_id: ProgramOutcomeId,
    pub title: String,
    /// Rounded to two decimals.
    pub score: f64,
    pub achievement_level: AchievementLevel,
    pub achievement_label: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub average_po_score: f64,
    pub highest_po: Option<String>,
    pub lowest_po: Option<String>,
    pub completed_courses: usize,
    pub total_credits: u32,
}

/// Complete outcome report for one student, keyed by PO code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentSummary {
    pub student: StudentRef,
    pub po_scores: BTreeMap<String, PoSummaryEntry>,
    pub statistics: SummaryStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoScoreView {
    pub student_id: StudentId,
    pub learning_outcome_id: LearningOutcomeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment_id: Option<EnrollmentId>,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoScoreView {
    pub student_id: StudentId,
    pub program_outcome_id: ProgramOutcomeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<CourseId>,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramOutcomeScoreEntry {
    pub program_outcome_id: ProgramOutcomeId,
    pub code: String,
    pub title: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramOutcomeScoresView {
    pub student_id: StudentId,
    pub strategy: AggregationStrategy,
    pub scores: Vec<ProgramOutcomeScoreEntry>,
}

impl ProgramOutcomeScoresView {
    pub fn new(
        student_id: StudentId,
        strategy: AggregationStrategy,
        scores: ProgramOutcomeScores,
    ) -> Self {
        let scores = scores
            .into_iter()
            .map(|entry| ProgramOutcomeScoreEntry {
                program_outcome_id: entry.program_outcome.id,
                code: entry.program_outcome.code,
                title: entry.program_outcome.title,
                score: entry.score,
            })
            .collect();

        Self {
            student_id,
            strategy,
            scores,
        }
    }
}
