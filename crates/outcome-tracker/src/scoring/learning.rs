use tracing::debug;

use crate::catalog::{
    require, CourseId, Enrollment, EnrollmentFilter, LearningOutcome, OutcomeStore, Student,
    StudentId,
};

use super::error::ScoringError;
use super::scorer::OutcomeScorer;

impl<S> OutcomeScorer<'_, S>
where
    S: OutcomeStore + ?Sized,
{
    /// Achievement percentage of one learning outcome for one student.
    ///
    /// Without an explicit enrollment the most recent completed enrollment in the
    /// outcome's course is used. Missing data of any kind yields 0.0.
    pub fn lo_score(
        &self,
        outcome: &LearningOutcome,
        student: &Student,
        enrollment: Option<&Enrollment>,
    ) -> Result<f64, ScoringError> {
        Ok(self
            .measure_lo(outcome, student, enrollment)?
            .unwrap_or(0.0))
    }

    /// Like [`Self::lo_score`] but `None` when nothing could be measured.
    pub(crate) fn measure_lo(
        &self,
        outcome: &LearningOutcome,
        student: &Student,
        enrollment: Option<&Enrollment>,
    ) -> Result<Option<f64>, ScoringError> {
        let resolved;
        let enrollment = match enrollment {
            Some(enrollment) => enrollment,
            None => match self.latest_completed_enrollment(&student.id, &outcome.course_id)? {
                Some(found) => {
                    resolved = found;
                    &resolved
                }
                None => {
                    debug!(
                        student = %student.id,
                        course = %outcome.course_id,
                        "no completed enrollment for learning outcome"
                    );
                    return Ok(None);
                }
            },
        };

        let mappings = self.store.assessment_mappings(&outcome.id)?;
        if mappings.is_empty() {
            return Ok(None);
        }

        let mut total_score = 0.0;
        let mut total_weight = 0.0;
        for mapping in &mappings {
            // untaken assessments leave both numerator and denominator alone
            let Some(score) =
                self.store
                    .assessment_score(&student.id, &mapping.assessment_id, &enrollment.id)?
            else {
                continue;
            };
            let assessment = require(
                self.store.assessment(&mapping.assessment_id)?,
                "assessment",
                &mapping.assessment_id,
            )?;

            let weight = mapping.contribution_percentage / 100.0;
            total_score += assessment.normalize(score.score) * weight;
            total_weight += weight;
        }

        let measured = (total_weight > 0.0).then(|| total_score / total_weight);
        debug!(
            learning_outcome = %outcome.id,
            student = %student.id,
            enrollment = %enrollment.id,
            score = ?measured,
            "learning outcome scored"
        );
        Ok(measured)
    }

    /// Most recent completed enrollment: higher year first, then Fall, Spring, Summer.
    pub fn latest_completed_enrollment(
        &self,
        student: &StudentId,
        course: &CourseId,
    ) -> Result<Option<Enrollment>, ScoringError> {
        let filter = EnrollmentFilter::for_student(student)
            .in_course(course)
            .completed();
        Ok(self
            .store
            .enrollments(&filter)?
            .into_iter()
            .max_by_key(Enrollment::recency_key))
    }
}
