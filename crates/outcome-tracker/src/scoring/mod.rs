//! Outcome-score aggregation engine.
//!
//! Raw scores roll up bottom-up: assessment scores into LO percentages
//! (`learning`), LO percentages into PO percentages per course (`program`),
//! per-course PO scores into one score per active PO (`aggregate`), and those
//! into a [`StudentSummary`] (`summary`). Every layer only reads the store.
//!
//! A computed score of exactly 0.0 is treated as "no contribution" at the PO
//! and all-PO levels unless [`ZeroScorePolicy::IncludeMeasured`] is selected.

mod achievement;
mod aggregate;
mod error;
mod learning;
mod policy;
mod program;
pub mod router;
mod scorer;
pub mod service;
mod summary;
mod views;

#[cfg(test)]
mod tests;

use crate::catalog::{Course, Enrollment, LearningOutcome, OutcomeStore, ProgramOutcome, Student};

pub use achievement::AchievementLevel;
pub use aggregate::{ProgramOutcomeScore, ProgramOutcomeScores};
pub use error::ScoringError;
pub use policy::{AggregationStrategy, ScoringConfig, ZeroScorePolicy};
pub use router::scoring_router;
pub use scorer::OutcomeScorer;
pub use service::OutcomeScoringService;
pub(crate) use summary::round2;
pub use views::{
    LoScoreView, PoScoreView, PoSummaryEntry, ProgramOutcomeScoreEntry,
    ProgramOutcomeScoresView, StudentRef, StudentSummary, SummaryStatistics,
};

/// LO achievement percentage with the default scoring configuration.
pub fn compute_lo_score<S>(
    store: &S,
    outcome: &LearningOutcome,
    student: &Student,
    enrollment: Option<&Enrollment>,
) -> Result<f64, ScoringError>
where
    S: OutcomeStore + ?Sized,
{
    OutcomeScorer::new(store).lo_score(outcome, student, enrollment)
}

pub fn compute_po_score<S>(
    store: &S,
    outcome: &ProgramOutcome,
    student: &Student,
    course: Option<&Course>,
) -> Result<f64, ScoringError>
where
    S: OutcomeStore + ?Sized,
{
    OutcomeScorer::new(store).po_score(outcome, student, course)
}

/// Every active PO, credit weighted when `use_credits` is set.
pub fn compute_all_po_scores<S>(
    store: &S,
    student: &Student,
    use_credits: bool,
) -> Result<ProgramOutcomeScores, ScoringError>
where
    S: OutcomeStore + ?Sized,
{
    let strategy = AggregationStrategy::from_use_credits(use_credits);
    OutcomeScorer::new(store).all_po_scores(student, strategy)
}

pub fn build_student_summary<S>(
    store: &S,
    student: &Student,
) -> Result<StudentSummary, ScoringError>
where
    S: OutcomeStore + ?Sized,
{
    OutcomeScorer::new(store).student_summary(student)
}
