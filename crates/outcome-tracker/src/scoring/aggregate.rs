use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::catalog::{
    require, EnrollmentFilter, OutcomeStore, ProgramOutcome, ProgramOutcomeId, Student,
};

use super::error::ScoringError;
use super::policy::AggregationStrategy;
use super::scorer::OutcomeScorer;

/// Overall score of one program outcome for one student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramOutcomeScore {
    pub program_outcome: ProgramOutcome,
    pub score: f64,
}

/// Scores for every active program outcome, ordered by outcome code.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProgramOutcomeScores(Vec<ProgramOutcomeScore>);

impl ProgramOutcomeScores {
    pub fn iter(&self) -> std::slice::Iter<'_, ProgramOutcomeScore> {
        self.0.iter()
    }

    pub fn get(&self, id: &ProgramOutcomeId) -> Option<f64> {
        self.0
            .iter()
            .find(|entry| entry.program_outcome.id == *id)
            .map(|entry| entry.score)
    }

    pub fn by_code(&self, code: &str) -> Option<f64> {
        self.0
            .iter()
            .find(|entry| entry.program_outcome.code == code)
            .map(|entry| entry.score)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<ProgramOutcomeScore> {
        self.0
    }
}

impl IntoIterator for ProgramOutcomeScores {
    type Item = ProgramOutcomeScore;
    type IntoIter = std::vec::IntoIter<ProgramOutcomeScore>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ProgramOutcomeScores {
    type Item = &'a ProgramOutcomeScore;
    type IntoIter = std::slice::Iter<'a, ProgramOutcomeScore>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct CourseContribution {
    pub(crate) credit: u32,
    pub(crate) score: f64,
}

impl AggregationStrategy {
    pub(crate) fn combine(self, contributions: &[CourseContribution]) -> f64 {
        match self {
            Self::CreditWeighted => {
                let (weighted, credits) = contributions.iter().fold(
                    (0.0, 0.0),
                    |(weighted, credits), contribution| {
                        let credit = f64::from(contribution.credit);
                        (weighted + contribution.score * credit, credits + credit)
                    },
                );
                if credits > 0.0 {
                    weighted / credits
                } else {
                    0.0
                }
            }
            Self::SimpleAverage => {
                if contributions.is_empty() {
                    0.0
                } else {
                    let total: f64 = contributions.iter().map(|c| c.score).sum();
                    total / contributions.len() as f64
                }
            }
        }
    }
}

impl<S> OutcomeScorer<'_, S>
where
    S: OutcomeStore + ?Sized,
{
    /// Score every active program outcome across all courses that feed it.
    pub fn all_po_scores(
        &self,
        student: &Student,
        strategy: AggregationStrategy,
    ) -> Result<ProgramOutcomeScores, ScoringError> {
        let mut outcomes = self.store.active_program_outcomes()?;
        outcomes.sort_by(|left, right| left.code.cmp(&right.code));

        let mut scores = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            let score = self.po_across_courses(&outcome, student, strategy)?;
            scores.push(ProgramOutcomeScore {
                program_outcome: outcome,
                score,
            });
        }

        Ok(ProgramOutcomeScores(scores))
    }

    fn po_across_courses(
        &self,
        outcome: &ProgramOutcome,
        student: &Student,
        strategy: AggregationStrategy,
    ) -> Result<f64, ScoringError> {
        let mut course_ids = BTreeSet::new();
        for mapping in self.store.program_outcome_mappings(&outcome.id)? {
            let learning_outcome = require(
                self.store.learning_outcome(&mapping.learning_outcome_id)?,
                "learning outcome",
                &mapping.learning_outcome_id,
            )?;
            course_ids.insert(learning_outcome.course_id);
        }

        if course_ids.is_empty() {
            return Ok(0.0);
        }

        let mut contributions = Vec::new();
        for course_id in &course_ids {
            let filter = EnrollmentFilter::for_student(&student.id)
                .in_course(course_id)
                .completed();
            if self.store.enrollments(&filter)?.is_empty() {
                continue;
            }

            let course = require(self.store.course(course_id)?, "course", course_id)?;
            let measured = self.measure_po(outcome, student, Some(&course))?;
            if let Some(score) = self.config.zero_policy.admit(measured) {
                contributions.push(CourseContribution {
                    credit: course.credit,
                    score,
                });
            }
        }

        let score = strategy.combine(&contributions);
        debug!(
            program_outcome = %outcome.code,
            student = %student.id,
            strategy = strategy.label(),
            courses = contributions.len(),
            score,
            "program outcome aggregated across courses"
        );
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contributions() -> Vec<CourseContribution> {
        vec![
            CourseContribution {
                credit: 4,
                score: 80.0,
            },
            CourseContribution {
                credit: 2,
                score: 50.0,
            },
        ]
    }

    #[test]
    fn credit_weighting_scales_by_course_credit() {
        let score = AggregationStrategy::CreditWeighted.combine(&contributions());
        assert!((score - 70.0).abs() < 1e-9);
    }

    #[test]
    fn simple_average_ignores_credit() {
        let score = AggregationStrategy::SimpleAverage.combine(&contributions());
        assert!((score - 65.0).abs() < 1e-9);
    }

    #[test]
    fn no_contributions_yield_zero() {
        assert_eq!(AggregationStrategy::CreditWeighted.combine(&[]), 0.0);
        assert_eq!(AggregationStrategy::SimpleAverage.combine(&[]), 0.0);
    }
}
