//! Entity model and the store abstraction the scoring engine reads from.

pub mod dataset;
pub mod domain;
pub mod import;
pub mod memory;
pub mod store;

pub use dataset::{Dataset, DatasetError};
pub use domain::{
    Assessment, AssessmentId, AssessmentKind, AssessmentLoMapping, ContributionLevel, Course,
    CourseId, CourseOffering, CoursePloMapping, Enrollment, EnrollmentId, EnrollmentStatus,
    LearningOutcome, LearningOutcomeId, LetterGrade, LoPoMapping, OfferingId, PloCategory, PloId,
    ProgramLearningOutcome, ProgramOutcome, ProgramOutcomeId, Semester, Student,
    StudentAssessmentScore, StudentId, StudentPloAchievement, StudentStatus,
};
pub use import::{ScoreImportError, ScoreImportReport, ScoreImporter};
pub use memory::InMemoryOutcomeStore;
pub use store::{require, AchievementFilter, EnrollmentFilter, OutcomeStore, StoreError};
