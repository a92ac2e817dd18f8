use super::domain::{
    Assessment, AssessmentId, AssessmentLoMapping, Course, CourseId, CoursePloMapping, Enrollment,
    EnrollmentId, EnrollmentStatus, LearningOutcome, LearningOutcomeId, LoPoMapping, PloId,
    ProgramLearningOutcome, ProgramOutcome, ProgramOutcomeId, Student, StudentAssessmentScore,
    StudentId, StudentPloAchievement,
};

/// Read access to the entity store consumed by the scoring engine.
///
/// Entity lookups return `Ok(None)` for unknown ids; callers decide whether
/// that is a missing-data case or an invalid reference.
pub trait OutcomeStore: Send + Sync {
    fn student(&self, id: &StudentId) -> Result<Option<Student>, StoreError>;
    fn course(&self, id: &CourseId) -> Result<Option<Course>, StoreError>;
    fn enrollment(&self, id: &EnrollmentId) -> Result<Option<Enrollment>, StoreError>;
    fn assessment(&self, id: &AssessmentId) -> Result<Option<Assessment>, StoreError>;
    fn learning_outcome(&self, id: &LearningOutcomeId)
        -> Result<Option<LearningOutcome>, StoreError>;
    fn program_outcome(&self, id: &ProgramOutcomeId) -> Result<Option<ProgramOutcome>, StoreError>;
    fn program_learning_outcome(
        &self,
        id: &PloId,
    ) -> Result<Option<ProgramLearningOutcome>, StoreError>;

    /// Enrollments matching every populated field of `filter`, in no particular order.
    fn enrollments(&self, filter: &EnrollmentFilter) -> Result<Vec<Enrollment>, StoreError>;
    fn active_program_outcomes(&self) -> Result<Vec<ProgramOutcome>, StoreError>;
    fn assessment_mappings(
        &self,
        learning_outcome: &LearningOutcomeId,
    ) -> Result<Vec<AssessmentLoMapping>, StoreError>;
    fn program_outcome_mappings(
        &self,
        program_outcome: &ProgramOutcomeId,
    ) -> Result<Vec<LoPoMapping>, StoreError>;
    fn assessment_score(
        &self,
        student: &StudentId,
        assessment: &AssessmentId,
        enrollment: &EnrollmentId,
    ) -> Result<Option<StudentAssessmentScore>, StoreError>;
    fn course_plo_mappings(&self, course: &CourseId) -> Result<Vec<CoursePloMapping>, StoreError>;
    fn plo_achievements(
        &self,
        filter: &AchievementFilter,
    ) -> Result<Vec<StudentPloAchievement>, StoreError>;
}

/// Predicate over enrollments. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrollmentFilter {
    pub student_id: Option<StudentId>,
    pub course_id: Option<CourseId>,
    pub status: Option<EnrollmentStatus>,
}

impl EnrollmentFilter {
    pub fn for_student(student_id: &StudentId) -> Self {
        Self {
            student_id: Some(student_id.clone()),
            ..Self::default()
        }
    }

    pub fn in_course(mut self, course_id: &CourseId) -> Self {
        self.course_id = Some(course_id.clone());
        self
    }

    pub fn with_status(mut self, status: EnrollmentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn completed(self) -> Self {
        self.with_status(EnrollmentStatus::Completed)
    }

    pub fn matches(&self, enrollment: &Enrollment) -> bool {
        self.student_id
            .as_ref()
            .map_or(true, |id| *id == enrollment.student_id)
            && self
                .course_id
                .as_ref()
                .map_or(true, |id| *id == enrollment.course_id)
            && self.status.map_or(true, |status| status == enrollment.status)
    }
}

/// Predicate over PLO achievement records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AchievementFilter {
    pub student_id: Option<StudentId>,
    pub plo_id: Option<PloId>,
}

impl AchievementFilter {
    pub fn for_student(student_id: &StudentId) -> Self {
        Self {
            student_id: Some(student_id.clone()),
            plo_id: None,
        }
    }

    pub fn for_plo(plo_id: &PloId) -> Self {
        Self {
            student_id: None,
            plo_id: Some(plo_id.clone()),
        }
    }

    pub fn matches(&self, record: &StudentPloAchievement) -> bool {
        self.student_id
            .as_ref()
            .map_or(true, |id| *id == record.student_id)
            && self.plo_id.as_ref().map_or(true, |id| *id == record.plo_id)
    }
}

/// Error enumeration for store failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },
    #[error("conflicting record: {0}")]
    Conflict(String),
    #[error("invalid record: {0}")]
    Invalid(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Turn an optional lookup into a not-found error.
pub fn require<T>(
    value: Option<T>,
    entity: &'static str,
    id: impl ToString,
) -> Result<T, StoreError> {
    value.ok_or_else(|| StoreError::not_found(entity, id))
}
