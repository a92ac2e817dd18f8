use std::sync::Arc;

use crate::achievements::{self, CoursePloCoverage, PloStatistics, StudentPloSummary};
use crate::catalog::{
    require, CourseId, EnrollmentId, LearningOutcomeId, OutcomeStore, PloId, ProgramOutcomeId,
    Student, StudentId,
};

use super::error::ScoringError;
use super::policy::{AggregationStrategy, ScoringConfig};
use super::scorer::OutcomeScorer;
use super::views::{LoScoreView, PoScoreView, ProgramOutcomeScoresView, StudentSummary};

/// Id-based entry points over a shared store, used by the HTTP router and CLI.
///
/// Unknown ids surface as `StoreError::NotFound`; sparse data never does.
pub struct OutcomeScoringService<S: ?Sized> {
    store: Arc<S>,
    config: ScoringConfig,
}

impl<S> OutcomeScoringService<S>
where
    S: OutcomeStore + ?Sized + 'static,
{
    pub fn new(store: Arc<S>, config: ScoringConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> ScoringConfig {
        self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn scorer(&self) -> OutcomeScorer<'_, S> {
        OutcomeScorer::with_config(self.store.as_ref(), self.config)
    }

    fn student(&self, id: &StudentId) -> Result<Student, ScoringError> {
        Ok(require(self.store.student(id)?, "student", id)?)
    }

    pub fn lo_score(
        &self,
        student_id: &StudentId,
        learning_outcome_id: &LearningOutcomeId,
        enrollment_id: Option<&EnrollmentId>,
    ) -> Result<LoScoreView, ScoringError> {
        let student = self.student(student_id)?;
        let outcome = require(
            self.store.learning_outcome(learning_outcome_id)?,
            "learning outcome",
            learning_outcome_id,
        )?;

        let enrollment = match enrollment_id {
            Some(id) => {
                let enrollment = require(self.store.enrollment(id)?, "enrollment", id)?;
                if enrollment.student_id != student.id {
                    return Err(ScoringError::EnrollmentMismatch {
                        enrollment: enrollment.id,
                        reason: format!("does not belong to student {}", student.id),
                    });
                }
                if enrollment.course_id != outcome.course_id {
                    return Err(ScoringError::EnrollmentMismatch {
                        enrollment: enrollment.id,
                        reason: format!("is not in course {}", outcome.course_id),
                    });
                }
                Some(enrollment)
            }
            None => None,
        };

        let score = self
            .scorer()
            .lo_score(&outcome, &student, enrollment.as_ref())?;
        Ok(LoScoreView {
            student_id: student.id,
            learning_outcome_id: outcome.id,
            enrollment_id: enrollment.map(|enrollment| enrollment.id),
            score,
        })
    }

    pub fn po_score(
        &self,
        student_id: &StudentId,
        program_outcome_id: &ProgramOutcomeId,
        course_id: Option<&CourseId>,
    ) -> Result<PoScoreView, ScoringError> {
        let student = self.student(student_id)?;
        let outcome = require(
            self.store.program_outcome(program_outcome_id)?,
            "program outcome",
            program_outcome_id,
        )?;
        let course = match course_id {
            Some(id) => Some(require(self.store.course(id)?, "course", id)?),
            None => None,
        };

        let score = self.scorer().po_score(&outcome, &student, course.as_ref())?;
        Ok(PoScoreView {
            student_id: student.id,
            program_outcome_id: outcome.id,
            course_id: course.map(|course| course.id),
            score,
        })
    }

    /// Falls back to the configured strategy when `strategy` is `None`.
    pub fn all_po_scores(
        &self,
        student_id: &StudentId,
        strategy: Option<AggregationStrategy>,
    ) -> Result<ProgramOutcomeScoresView, ScoringError> {
        let student = self.student(student_id)?;
        let strategy = strategy.unwrap_or(self.config.strategy);
        let scores = self.scorer().all_po_scores(&student, strategy)?;
        Ok(ProgramOutcomeScoresView::new(student.id, strategy, scores))
    }

    pub fn student_summary(&self, student_id: &StudentId) -> Result<StudentSummary, ScoringError> {
        let student = self.student(student_id)?;
        self.scorer().student_summary(&student)
    }

    pub fn student_plo_summary(
        &self,
        student_id: &StudentId,
    ) -> Result<StudentPloSummary, ScoringError> {
        Ok(achievements::student_plo_summary(
            self.store.as_ref(),
            student_id,
        )?)
    }

    pub fn plo_statistics(&self, plo_id: &PloId) -> Result<PloStatistics, ScoringError> {
        Ok(achievements::plo_statistics(self.store.as_ref(), plo_id)?)
    }

    pub fn course_plo_coverage(
        &self,
        course_id: &CourseId,
    ) -> Result<Vec<CoursePloCoverage>, ScoringError> {
        Ok(achievements::course_plo_coverage(
            self.store.as_ref(),
            course_id,
        )?)
    }
}
