use std::sync::Arc;

use axum::body::to_bytes;
use axum::response::Response;
use serde_json::Value;

use crate::catalog::{
    Assessment, AssessmentId, AssessmentKind, AssessmentLoMapping, Course, CourseId,
    CourseOffering, Enrollment, EnrollmentId, EnrollmentStatus, InMemoryOutcomeStore,
    LearningOutcome, LearningOutcomeId, LoPoMapping, OfferingId, OutcomeStore, ProgramOutcome,
    ProgramOutcomeId, Semester, Student, StudentAssessmentScore, StudentId, StudentStatus,
};
use crate::scoring::{OutcomeScorer, OutcomeScoringService, ScoringConfig, ZeroScorePolicy};

pub(super) const STUDENT: &str = "s-1";

/// Small builder over an in-memory store. Every helper panics on store errors.
pub(super) struct Fixture {
    pub(super) store: InMemoryOutcomeStore,
}

impl Fixture {
    pub(super) fn new() -> Self {
        let fixture = Self {
            store: InMemoryOutcomeStore::new(),
        };
        fixture.student(STUDENT, "Ada Lovelace");
        fixture
    }

    pub(super) fn student(&self, id: &str, name: &str) -> &Self {
        self.store
            .upsert_student(Student {
                id: StudentId::new(id),
                student_number: format!("2024-{id}"),
                name: name.to_string(),
                status: StudentStatus::Active,
            })
            .expect("student");
        self
    }

    /// Adds the course and one Fall 2024 offering named `off-<id>`.
    pub(super) fn course(&self, id: &str, code: &str, credit: u32) -> &Self {
        self.store
            .upsert_course(Course {
                id: CourseId::new(id),
                code: code.to_string(),
                name: format!("{code} course"),
                credit,
            })
            .expect("course");
        self.store
            .upsert_offering(CourseOffering {
                id: OfferingId::new(format!("off-{id}")),
                course_id: CourseId::new(id),
                semester: Semester::Fall,
                year: 2024,
                section: "01".to_string(),
            })
            .expect("offering");
        self
    }

    pub(super) fn enroll(
        &self,
        id: &str,
        student: &str,
        course: &str,
        semester: Semester,
        year: i32,
        status: EnrollmentStatus,
    ) -> &Self {
        self.store
            .upsert_enrollment(Enrollment {
                id: EnrollmentId::new(id),
                student_id: StudentId::new(student),
                course_id: CourseId::new(course),
                semester,
                year,
                status,
                grade: None,
                completed_at: None,
            })
            .expect("enrollment");
        self
    }

    /// Completed Fall 2024 enrollment of the default student.
    pub(super) fn completed(&self, id: &str, course: &str) -> &Self {
        self.enroll(
            id,
            STUDENT,
            course,
            Semester::Fall,
            2024,
            EnrollmentStatus::Completed,
        )
    }

    pub(super) fn assessment(&self, id: &str, course: &str, max_score: f64) -> &Self {
        self.store
            .upsert_assessment(Assessment {
                id: AssessmentId::new(id),
                offering_id: OfferingId::new(format!("off-{course}")),
                name: format!("Assessment {id}"),
                kind: AssessmentKind::Exam,
                max_score,
                weight_percentage: 0.0,
            })
            .expect("assessment");
        self
    }

    pub(super) fn learning_outcome(&self, id: &str, course: &str) -> &Self {
        self.store
            .upsert_learning_outcome(LearningOutcome {
                id: LearningOutcomeId::new(id),
                course_id: CourseId::new(course),
                code: id.to_uppercase(),
                description: String::new(),
                plo_id: None,
                weight_percentage: 0,
                is_active: true,
            })
            .expect("learning outcome");
        self
    }

    pub(super) fn program_outcome(&self, id: &str, code: &str) -> &Self {
        self.program_outcome_with_status(id, code, true)
    }

    pub(super) fn program_outcome_with_status(
        &self,
        id: &str,
        code: &str,
        active: bool,
    ) -> &Self {
        self.store
            .upsert_program_outcome(ProgramOutcome {
                id: ProgramOutcomeId::new(id),
                code: code.to_string(),
                title: format!("{code} title"),
                is_active: active,
            })
            .expect("program outcome");
        self
    }

    pub(super) fn measures(
        &self,
        assessment: &str,
        learning_outcome: &str,
        percentage: f64,
    ) -> &Self {
        self.store
            .upsert_assessment_mapping(AssessmentLoMapping {
                assessment_id: AssessmentId::new(assessment),
                learning_outcome_id: LearningOutcomeId::new(learning_outcome),
                contribution_percentage: percentage,
            })
            .expect("assessment mapping");
        self
    }

    pub(super) fn supports(
        &self,
        learning_outcome: &str,
        program_outcome: &str,
        weight: u8,
    ) -> &Self {
        self.store
            .upsert_lo_po_mapping(LoPoMapping {
                learning_outcome_id: LearningOutcomeId::new(learning_outcome),
                program_outcome_id: ProgramOutcomeId::new(program_outcome),
                weight,
            })
            .expect("lo po mapping");
        self
    }

    pub(super) fn score(&self, assessment: &str, enrollment: &str, score: f64) -> &Self {
        self.score_for(STUDENT, assessment, enrollment, score)
    }

    pub(super) fn score_for(
        &self,
        student: &str,
        assessment: &str,
        enrollment: &str,
        score: f64,
    ) -> &Self {
        self.store
            .upsert_score(StudentAssessmentScore {
                student_id: StudentId::new(student),
                assessment_id: AssessmentId::new(assessment),
                enrollment_id: EnrollmentId::new(enrollment),
                score,
            })
            .expect("score");
        self
    }

    /// One course with one assessment fully measuring one LO; the default
    /// student's completed enrollment `e-<course>` scored `percent` out of 100.
    pub(super) fn course_with_lo(
        &self,
        course: &str,
        credit: u32,
        lo: &str,
        percent: f64,
    ) -> &Self {
        let assessment = format!("a-{lo}");
        let enrollment = format!("e-{course}");
        self.course(course, &course.to_uppercase(), credit)
            .completed(&enrollment, course)
            .assessment(&assessment, course, 100.0)
            .learning_outcome(lo, course)
            .measures(&assessment, lo, 100.0)
            .score(&assessment, &enrollment, percent)
    }

    pub(super) fn scorer(&self) -> OutcomeScorer<'_, InMemoryOutcomeStore> {
        OutcomeScorer::new(&self.store)
    }

    pub(super) fn strict_scorer(&self) -> OutcomeScorer<'_, InMemoryOutcomeStore> {
        OutcomeScorer::with_config(
            &self.store,
            ScoringConfig {
                zero_policy: ZeroScorePolicy::IncludeMeasured,
                ..ScoringConfig::default()
            },
        )
    }

    pub(super) fn into_service(self) -> Arc<OutcomeScoringService<InMemoryOutcomeStore>> {
        Arc::new(OutcomeScoringService::new(
            Arc::new(self.store),
            ScoringConfig::default(),
        ))
    }

    pub(super) fn get_student(&self, id: &str) -> Student {
        self.store
            .student(&StudentId::new(id))
            .expect("store")
            .expect("student exists")
    }

    pub(super) fn get_course(&self, id: &str) -> Course {
        self.store
            .course(&CourseId::new(id))
            .expect("store")
            .expect("course exists")
    }

    pub(super) fn get_enrollment(&self, id: &str) -> Enrollment {
        self.store
            .enrollment(&EnrollmentId::new(id))
            .expect("store")
            .expect("enrollment exists")
    }

    pub(super) fn get_lo(&self, id: &str) -> LearningOutcome {
        self.store
            .learning_outcome(&LearningOutcomeId::new(id))
            .expect("store")
            .expect("learning outcome exists")
    }

    pub(super) fn get_po(&self, id: &str) -> ProgramOutcome {
        self.store
            .program_outcome(&ProgramOutcomeId::new(id))
            .expect("store")
            .expect("program outcome exists")
    }
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

pub(super) async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}
