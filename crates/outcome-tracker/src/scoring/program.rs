use tracing::debug;

use crate::catalog::{require, Course, OutcomeStore, ProgramOutcome, Student};

use super::error::ScoringError;
use super::scorer::OutcomeScorer;

impl<S> OutcomeScorer<'_, S>
where
    S: OutcomeStore + ?Sized,
{
    /// Weighted (1-5) average of the LO scores mapped to a program outcome,
    /// optionally restricted to the learning outcomes of one course.
    pub fn po_score(
        &self,
        outcome: &ProgramOutcome,
        student: &Student,
        course: Option<&Course>,
    ) -> Result<f64, ScoringError> {
        Ok(self.measure_po(outcome, student, course)?.unwrap_or(0.0))
    }

    pub(crate) fn measure_po(
        &self,
        outcome: &ProgramOutcome,
        student: &Student,
        course: Option<&Course>,
    ) -> Result<Option<f64>, ScoringError> {
        let mut contributing = Vec::new();
        for mapping in self.store.program_outcome_mappings(&outcome.id)? {
            let learning_outcome = require(
                self.store.learning_outcome(&mapping.learning_outcome_id)?,
                "learning outcome",
                &mapping.learning_outcome_id,
            )?;
            if course.map_or(true, |course| course.id == learning_outcome.course_id) {
                contributing.push((mapping, learning_outcome));
            }
        }

        if contributing.is_empty() {
            return Ok(None);
        }

        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;
        for (mapping, learning_outcome) in &contributing {
            let Some(enrollment) =
                self.latest_completed_enrollment(&student.id, &learning_outcome.course_id)?
            else {
                continue;
            };

            let measured = self.measure_lo(learning_outcome, student, Some(&enrollment))?;
            let Some(lo_score) = self.config.zero_policy.admit(measured) else {
                continue;
            };

            let weight = f64::from(mapping.weight);
            weighted_sum += lo_score * weight;
            total_weight += weight;
        }

        let measured = (total_weight > 0.0).then(|| weighted_sum / total_weight);
        debug!(
            program_outcome = %outcome.code,
            student = %student.id,
            course = ?course.map(|course| course.code.as_str()),
            score = ?measured,
            "program outcome scored"
        );
        Ok(measured)
    }
}
