use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::AchievementLevel;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

entity_id!(
    /// Identifier wrapper for students.
    StudentId
);
entity_id!(CourseId);
entity_id!(EnrollmentId);
entity_id!(OfferingId);
entity_id!(AssessmentId);
entity_id!(LearningOutcomeId);
entity_id!(ProgramOutcomeId);
entity_id!(
    /// Identifier wrapper for program learning outcomes (PLOs).
    PloId
);

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub student_number: String,
    pub name: String,
    #[serde(default)]
    pub status: StudentStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StudentStatus {
    #[default]
    Active,
    Graduated,
    Suspended,
    Withdrawn,
}

/// Course catalog entry. `credit` only matters for credit-weighted aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub code: String,
    pub name: String,
    pub credit: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Semester {
    Fall,
    Spring,
    Summer,
}

impl Semester {
    /// Rank used when picking the most recent enrollment inside one year.
    /// Fall outranks Spring, Spring outranks Summer. This is a fixed term
    /// order, not a descending sort of the semester codes, which would put
    /// Summer first.
    pub const fn recency_rank(self) -> u8 {
        match self {
            Self::Fall => 3,
            Self::Spring => 2,
            Self::Summer => 1,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Fall => "Fall",
            Self::Spring => "Spring",
            Self::Summer => "Summer",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    #[default]
    Active,
    Completed,
    Dropped,
    Withdrawn,
}

impl EnrollmentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Completed => "Completed",
            Self::Dropped => "Dropped",
            Self::Withdrawn => "Withdrawn",
        }
    }
}

/// Letter grades on the four point scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LetterGrade {
    Aa,
    Ba,
    Bb,
    Cb,
    Cc,
    Dc,
    Dd,
    Fd,
    Ff,
}

impl LetterGrade {
    pub const fn grade_points(self) -> f32 {
        match self {
            Self::Aa => 4.0,
            Self::Ba => 3.5,
            Self::Bb => 3.0,
            Self::Cb => 2.5,
            Self::Cc => 2.0,
            Self::Dc => 1.5,
            Self::Dd => 1.0,
            Self::Fd => 0.5,
            Self::Ff => 0.0,
        }
    }
}

/// A student's registration in a course for one term.
///
/// Natural key: (student, course, semester, year).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub student_id: StudentId,
    pub course_id: CourseId,
    pub semester: Semester,
    pub year: i32,
    #[serde(default)]
    pub status: EnrollmentStatus,
    #[serde(default)]
    pub grade: Option<LetterGrade>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Enrollment {
    pub fn is_completed(&self) -> bool {
        self.status == EnrollmentStatus::Completed
    }

    /// Sort key where a greater value means a more recent term.
    pub fn recency_key(&self) -> (i32, u8) {
        (self.year, self.semester.recency_rank())
    }

    pub(crate) fn natural_key(&self) -> (StudentId, CourseId, Semester, i32) {
        (
            self.student_id.clone(),
            self.course_id.clone(),
            self.semester,
            self.year,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseOffering {
    pub id: OfferingId,
    pub course_id: CourseId,
    pub semester: Semester,
    pub year: i32,
    #[serde(default = "default_section")]
    pub section: String,
}

fn default_section() -> String {
    "01".to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssessmentKind {
    Exam,
    Quiz,
    Project,
    Assignment,
    Presentation,
    Lab,
    Homework,
    Participation,
    #[default]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: AssessmentId,
    pub offering_id: OfferingId,
    pub name: String,
    #[serde(default)]
    pub kind: AssessmentKind,
    pub max_score: f64,
    #[serde(default)]
    pub weight_percentage: f64,
}

impl Assessment {
    /// Express a raw score as a percentage of `max_score`.
    ///
    /// A non-positive `max_score` is a data-entry error and yields 0.0.
    pub fn normalize(&self, raw_score: f64) -> f64 {
        if self.max_score <= 0.0 {
            return 0.0;
        }
        raw_score / self.max_score * 100.0
    }
}

/// Course-level learning outcome (CLO).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningOutcome {
    pub id: LearningOutcomeId,
    pub course_id: CourseId,
    pub code: String,
    #[serde(default)]
    pub description: String,
    /// Legacy single PLO link. Not consulted by PO aggregation.
    #[serde(default)]
    pub plo_id: Option<PloId>,
    /// Informational weight inside the course; not used by the score formulas.
    #[serde(default)]
    pub weight_percentage: u8,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramOutcome {
    pub id: ProgramOutcomeId,
    pub code: String,
    pub title: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// How much one assessment counts toward one learning outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentLoMapping {
    pub assessment_id: AssessmentId,
    pub learning_outcome_id: LearningOutcomeId,
    /// Percentage in [0, 100].
    pub contribution_percentage: f64,
}

/// Strength of a learning outcome's influence on a program outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoPoMapping {
    pub learning_outcome_id: LearningOutcomeId,
    pub program_outcome_id: ProgramOutcomeId,
    /// Integer weight in [1, 5].
    pub weight: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentAssessmentScore {
    pub student_id: StudentId,
    pub assessment_id: AssessmentId,
    pub enrollment_id: EnrollmentId,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramLearningOutcome {
    pub id: PloId,
    pub number: u32,
    pub short_name: String,
    #[serde(default)]
    pub category: PloCategory,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PloCategory {
    #[default]
    Knowledge,
    Skills,
    Competence,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContributionLevel {
    Introductory,
    #[default]
    Reinforcing,
    Mastery,
}

impl ContributionLevel {
    pub const fn level(self) -> u8 {
        match self {
            Self::Introductory => 1,
            Self::Reinforcing => 2,
            Self::Mastery => 3,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Introductory => "Introductory",
            Self::Reinforcing => "Reinforcing",
            Self::Mastery => "Mastery",
        }
    }
}

/// Which PLOs a course addresses, and how deeply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoursePloMapping {
    pub course_id: CourseId,
    pub plo_id: PloId,
    #[serde(default)]
    pub contribution_level: ContributionLevel,
    pub weight_percentage: u8,
}

/// Recorded PLO achievement for one student in one enrollment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentPloAchievement {
    pub student_id: StudentId,
    pub plo_id: PloId,
    pub enrollment_id: EnrollmentId,
    pub score: f64,
    pub achievement_level: AchievementLevel,
    #[serde(default)]
    pub notes: String,
}
