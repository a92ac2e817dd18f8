use std::collections::BTreeMap;

use tracing::info;

use crate::catalog::{require, EnrollmentFilter, OutcomeStore, Student};

use super::achievement::AchievementLevel;
use super::aggregate::ProgramOutcomeScores;
use super::error::ScoringError;
use super::policy::AggregationStrategy;
use super::scorer::OutcomeScorer;
use super::views::{PoSummaryEntry, StudentRef, StudentSummary, SummaryStatistics};

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl SummaryStatistics {
    /// Average, highest and lowest among positive scores.
    ///
    /// `scores` is ordered by PO code; on ties the later code wins for both
    /// highest and lowest.
    pub(crate) fn from_scores(scores: &ProgramOutcomeScores) -> Self {
        let mut total = 0.0;
        let mut counted = 0usize;
        let mut highest: Option<(&str, f64)> = None;
        let mut lowest: Option<(&str, f64)> = None;

        for entry in scores.iter().filter(|entry| entry.score > 0.0) {
            let code = entry.program_outcome.code.as_str();
            total += entry.score;
            counted += 1;

            if highest.map_or(true, |(_, best)| entry.score >= best) {
                highest = Some((code, entry.score));
            }
            if lowest.map_or(true, |(_, worst)| entry.score <= worst) {
                lowest = Some((code, entry.score));
            }
        }

        if counted == 0 {
            return Self::default();
        }

        Self {
            average_po_score: round2(total / counted as f64),
            highest_po: highest.map(|(code, _)| code.to_string()),
            lowest_po: lowest.map(|(code, _)| code.to_string()),
            completed_courses: 0,
            total_credits: 0,
        }
    }
}

impl<S> OutcomeScorer<'_, S>
where
    S: OutcomeStore + ?Sized,
{
    /// Credit-weighted PO scores with achievement levels and statistics.
    pub fn student_summary(&self, student: &Student) -> Result<StudentSummary, ScoringError> {
        let scores = self.all_po_scores(student, AggregationStrategy::CreditWeighted)?;

        let po_scores: BTreeMap<String, PoSummaryEntry> = scores
            .iter()
            .map(|entry| {
                let level = AchievementLevel::from_score(entry.score);
                (
                    entry.program_outcome.code.clone(),
                    PoSummaryEntry {
                        program_outcome_id: entry.program_outcome.id.clone(),
                        title: entry.program_outcome.title.clone(),
                        score: round2(entry.score),
                        achievement_level: level,
                        achievement_label: level.label(),
                    },
                )
            })
            .collect();

        let mut statistics = SummaryStatistics::from_scores(&scores);

        let completed = self
            .store
            .enrollments(&EnrollmentFilter::for_student(&student.id).completed())?;
        let mut total_credits = 0;
        for enrollment in &completed {
            let course = require(
                self.store.course(&enrollment.course_id)?,
                "course",
                &enrollment.course_id,
            )?;
            total_credits += course.credit;
        }
        statistics.completed_courses = completed.len();
        statistics.total_credits = total_credits;

        info!(
            student = %student.id,
            outcomes = po_scores.len(),
            average = statistics.average_po_score,
            "student outcome summary built"
        );

        Ok(StudentSummary {
            student: StudentRef::from(student),
            po_scores,
            statistics,
        })
    }
}
