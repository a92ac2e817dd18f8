use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::domain::{
    Assessment, AssessmentId, AssessmentLoMapping, Course, CourseId, CourseOffering,
    CoursePloMapping, Enrollment, EnrollmentId, LearningOutcome, LearningOutcomeId, LoPoMapping,
    OfferingId, PloId, ProgramLearningOutcome, ProgramOutcome, ProgramOutcomeId, Student,
    StudentAssessmentScore, StudentId, StudentPloAchievement,
};
use super::store::{require, AchievementFilter, EnrollmentFilter, OutcomeStore, StoreError};

#[derive(Debug, Default)]
struct Tables {
    students: BTreeMap<StudentId, Student>,
    courses: BTreeMap<CourseId, Course>,
    offerings: BTreeMap<OfferingId, CourseOffering>,
    enrollments: BTreeMap<EnrollmentId, Enrollment>,
    assessments: BTreeMap<AssessmentId, Assessment>,
    learning_outcomes: BTreeMap<LearningOutcomeId, LearningOutcome>,
    program_outcomes: BTreeMap<ProgramOutcomeId, ProgramOutcome>,
    plos: BTreeMap<PloId, ProgramLearningOutcome>,
    assessment_mappings: BTreeMap<(AssessmentId, LearningOutcomeId), AssessmentLoMapping>,
    lo_po_mappings: BTreeMap<(LearningOutcomeId, ProgramOutcomeId), LoPoMapping>,
    scores: BTreeMap<(StudentId, AssessmentId, EnrollmentId), StudentAssessmentScore>,
    course_plo_mappings: BTreeMap<(CourseId, PloId), CoursePloMapping>,
    plo_achievements: BTreeMap<(StudentId, PloId, EnrollmentId), StudentPloAchievement>,
}

/// Thread-safe in-memory entity store.
///
/// Upserts replace the record stored under the same key, enforce the natural
/// key uniqueness of every table, and reject references to unknown parents.
#[derive(Debug, Default)]
pub struct InMemoryOutcomeStore {
    tables: RwLock<Tables>,
}

fn ensure_unique<K: Ord, V>(
    table: &BTreeMap<K, V>,
    key: &K,
    clashes: impl Fn(&V) -> bool,
    describe: impl FnOnce() -> String,
) -> Result<(), StoreError> {
    if table
        .iter()
        .any(|(existing, value)| existing != key && clashes(value))
    {
        return Err(StoreError::Conflict(describe()));
    }
    Ok(())
}

fn ensure_exists<K: Ord, V>(
    table: &BTreeMap<K, V>,
    key: &K,
    entity: &'static str,
    id: impl ToString,
) -> Result<(), StoreError> {
    require(table.get(key), entity, id).map(|_| ())
}

fn ensure_percentage(value: f64, field: &str) -> Result<(), StoreError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(StoreError::Invalid(format!(
            "{field} must be within [0, 100], got {value}"
        )))
    }
}

fn score_key(score: &StudentAssessmentScore) -> (StudentId, AssessmentId, EnrollmentId) {
    (
        score.student_id.clone(),
        score.assessment_id.clone(),
        score.enrollment_id.clone(),
    )
}

fn check_score(tables: &Tables, score: &StudentAssessmentScore) -> Result<(), StoreError> {
    if !score.score.is_finite() || score.score < 0.0 {
        return Err(StoreError::Invalid(format!(
            "score for assessment {} must be a non-negative number",
            score.assessment_id
        )));
    }
    ensure_exists(&tables.students, &score.student_id, "student", &score.student_id)?;
    ensure_exists(
        &tables.assessments,
        &score.assessment_id,
        "assessment",
        &score.assessment_id,
    )?;
    let enrollment = require(
        tables.enrollments.get(&score.enrollment_id),
        "enrollment",
        &score.enrollment_id,
    )?;
    if enrollment.student_id != score.student_id {
        return Err(StoreError::Invalid(format!(
            "enrollment {} does not belong to student {}",
            score.enrollment_id, score.student_id
        )));
    }
    Ok(())
}

impl InMemoryOutcomeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }

    pub fn upsert_student(&self, student: Student) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        ensure_unique(
            &tables.students,
            &student.id,
            |other| other.student_number == student.student_number,
            || format!("student number {} already assigned", student.student_number),
        )?;
        tables.students.insert(student.id.clone(), student);
        Ok(())
    }

    pub fn upsert_course(&self, course: Course) -> Result<(), StoreError> {
        if course.credit == 0 {
            return Err(StoreError::Invalid(format!(
                "course {} must carry a positive credit",
                course.code
            )));
        }
        let mut tables = self.write()?;
        ensure_unique(
            &tables.courses,
            &course.id,
            |other| other.code == course.code,
            || format!("course code {} already exists", course.code),
        )?;
        tables.courses.insert(course.id.clone(), course);
        Ok(())
    }

    pub fn upsert_offering(&self, offering: CourseOffering) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        ensure_exists(&tables.courses, &offering.course_id, "course", &offering.course_id)?;
        ensure_unique(
            &tables.offerings,
            &offering.id,
            |other| {
                other.course_id == offering.course_id
                    && other.semester == offering.semester
                    && other.year == offering.year
                    && other.section == offering.section
            },
            || {
                format!(
                    "offering of {} section {} already exists for {} {}",
                    offering.course_id,
                    offering.section,
                    offering.semester.label(),
                    offering.year
                )
            },
        )?;
        tables.offerings.insert(offering.id.clone(), offering);
        Ok(())
    }

    pub fn upsert_enrollment(&self, enrollment: Enrollment) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        ensure_exists(
            &tables.students,
            &enrollment.student_id,
            "student",
            &enrollment.student_id,
        )?;
        ensure_exists(
            &tables.courses,
            &enrollment.course_id,
            "course",
            &enrollment.course_id,
        )?;
        let natural_key = enrollment.natural_key();
        ensure_unique(
            &tables.enrollments,
            &enrollment.id,
            |other| other.natural_key() == natural_key,
            || {
                format!(
                    "student {} is already enrolled in {} for {} {}",
                    enrollment.student_id,
                    enrollment.course_id,
                    enrollment.semester.label(),
                    enrollment.year
                )
            },
        )?;
        tables.enrollments.insert(enrollment.id.clone(), enrollment);
        Ok(())
    }

    pub fn upsert_assessment(&self, assessment: Assessment) -> Result<(), StoreError> {
        if !assessment.max_score.is_finite() {
            return Err(StoreError::Invalid(format!(
                "assessment {} has a non-finite max score",
                assessment.id
            )));
        }
        let mut tables = self.write()?;
        ensure_exists(
            &tables.offerings,
            &assessment.offering_id,
            "course offering",
            &assessment.offering_id,
        )?;
        tables.assessments.insert(assessment.id.clone(), assessment);
        Ok(())
    }

    pub fn upsert_learning_outcome(&self, outcome: LearningOutcome) -> Result<(), StoreError> {
        if outcome.weight_percentage > 100 {
            return Err(StoreError::Invalid(format!(
                "learning outcome {} weight must be within [0, 100]",
                outcome.id
            )));
        }
        let mut tables = self.write()?;
        ensure_exists(&tables.courses, &outcome.course_id, "course", &outcome.course_id)?;
        if let Some(plo_id) = &outcome.plo_id {
            ensure_exists(&tables.plos, plo_id, "program learning outcome", plo_id)?;
        }
        ensure_unique(
            &tables.learning_outcomes,
            &outcome.id,
            |other| other.course_id == outcome.course_id && other.code == outcome.code,
            || format!("{} already defines {}", outcome.course_id, outcome.code),
        )?;
        tables
            .learning_outcomes
            .insert(outcome.id.clone(), outcome);
        Ok(())
    }

    pub fn upsert_program_outcome(&self, outcome: ProgramOutcome) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        ensure_unique(
            &tables.program_outcomes,
            &outcome.id,
            |other| other.code == outcome.code,
            || format!("program outcome code {} already exists", outcome.code),
        )?;
        tables.program_outcomes.insert(outcome.id.clone(), outcome);
        Ok(())
    }

    pub fn upsert_plo(&self, plo: ProgramLearningOutcome) -> Result<(), StoreError> {
        if plo.number == 0 {
            return Err(StoreError::Invalid("PLO numbers start at 1".to_string()));
        }
        let mut tables = self.write()?;
        ensure_unique(
            &tables.plos,
            &plo.id,
            |other| other.number == plo.number,
            || format!("PLO-{} already exists", plo.number),
        )?;
        tables.plos.insert(plo.id.clone(), plo);
        Ok(())
    }

    pub fn upsert_assessment_mapping(
        &self,
        mapping: AssessmentLoMapping,
    ) -> Result<(), StoreError> {
        ensure_percentage(mapping.contribution_percentage, "contribution_percentage")?;
        let mut tables = self.write()?;
        ensure_exists(
            &tables.assessments,
            &mapping.assessment_id,
            "assessment",
            &mapping.assessment_id,
        )?;
        ensure_exists(
            &tables.learning_outcomes,
            &mapping.learning_outcome_id,
            "learning outcome",
            &mapping.learning_outcome_id,
        )?;
        let key = (
            mapping.assessment_id.clone(),
            mapping.learning_outcome_id.clone(),
        );
        tables.assessment_mappings.insert(key, mapping);
        Ok(())
    }

    pub fn upsert_lo_po_mapping(&self, mapping: LoPoMapping) -> Result<(), StoreError> {
        if !(1..=5).contains(&mapping.weight) {
            return Err(StoreError::Invalid(format!(
                "LO to PO weight must be within [1, 5], got {}",
                mapping.weight
            )));
        }
        let mut tables = self.write()?;
        ensure_exists(
            &tables.learning_outcomes,
            &mapping.learning_outcome_id,
            "learning outcome",
            &mapping.learning_outcome_id,
        )?;
        ensure_exists(
            &tables.program_outcomes,
            &mapping.program_outcome_id,
            "program outcome",
            &mapping.program_outcome_id,
        )?;
        let key = (
            mapping.learning_outcome_id.clone(),
            mapping.program_outcome_id.clone(),
        );
        tables.lo_po_mappings.insert(key, mapping);
        Ok(())
    }

    pub fn upsert_score(&self, score: StudentAssessmentScore) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        check_score(&tables, &score)?;
        tables.scores.insert(score_key(&score), score);
        Ok(())
    }

    /// Upsert a batch of scores all or nothing.
    ///
    /// Every record is checked before any is written. The error carries the
    /// position of the first rejected record, or `None` when the store itself
    /// failed.
    pub(crate) fn upsert_scores(
        &self,
        scores: Vec<StudentAssessmentScore>,
    ) -> Result<usize, (Option<usize>, StoreError)> {
        let mut tables = self.write().map_err(|err| (None, err))?;
        for (position, score) in scores.iter().enumerate() {
            check_score(&tables, score).map_err(|err| (Some(position), err))?;
        }
        let applied = scores.len();
        for score in scores {
            tables.scores.insert(score_key(&score), score);
        }
        Ok(applied)
    }

    pub fn upsert_course_plo_mapping(&self, mapping: CoursePloMapping) -> Result<(), StoreError> {
        if mapping.weight_percentage > 100 {
            return Err(StoreError::Invalid(format!(
                "course PLO weight must be within [0, 100], got {}",
                mapping.weight_percentage
            )));
        }
        let mut tables = self.write()?;
        ensure_exists(&tables.courses, &mapping.course_id, "course", &mapping.course_id)?;
        ensure_exists(
            &tables.plos,
            &mapping.plo_id,
            "program learning outcome",
            &mapping.plo_id,
        )?;
        let key = (mapping.course_id.clone(), mapping.plo_id.clone());
        tables.course_plo_mappings.insert(key, mapping);
        Ok(())
    }

    pub fn upsert_plo_achievement(&self, record: StudentPloAchievement) -> Result<(), StoreError> {
        ensure_percentage(record.score, "achievement score")?;
        let mut tables = self.write()?;
        ensure_exists(&tables.students, &record.student_id, "student", &record.student_id)?;
        ensure_exists(
            &tables.plos,
            &record.plo_id,
            "program learning outcome",
            &record.plo_id,
        )?;
        ensure_exists(
            &tables.enrollments,
            &record.enrollment_id,
            "enrollment",
            &record.enrollment_id,
        )?;
        let key = (
            record.student_id.clone(),
            record.plo_id.clone(),
            record.enrollment_id.clone(),
        );
        tables.plo_achievements.insert(key, record);
        Ok(())
    }
}

impl OutcomeStore for InMemoryOutcomeStore {
    fn student(&self, id: &StudentId) -> Result<Option<Student>, StoreError> {
        Ok(self.read()?.students.get(id).cloned())
    }

    fn course(&self, id: &CourseId) -> Result<Option<Course>, StoreError> {
        Ok(self.read()?.courses.get(id).cloned())
    }

    fn enrollment(&self, id: &EnrollmentId) -> Result<Option<Enrollment>, StoreError> {
        Ok(self.read()?.enrollments.get(id).cloned())
    }

    fn assessment(&self, id: &AssessmentId) -> Result<Option<Assessment>, StoreError> {
        Ok(self.read()?.assessments.get(id).cloned())
    }

    fn learning_outcome(
        &self,
        id: &LearningOutcomeId,
    ) -> Result<Option<LearningOutcome>, StoreError> {
        Ok(self.read()?.learning_outcomes.get(id).cloned())
    }

    fn program_outcome(&self, id: &ProgramOutcomeId) -> Result<Option<ProgramOutcome>, StoreError> {
        Ok(self.read()?.program_outcomes.get(id).cloned())
    }

    fn program_learning_outcome(
        &self,
        id: &PloId,
    ) -> Result<Option<ProgramLearningOutcome>, StoreError> {
        Ok(self.read()?.plos.get(id).cloned())
    }

    fn enrollments(&self, filter: &EnrollmentFilter) -> Result<Vec<Enrollment>, StoreError> {
        Ok(self
            .read()?
            .enrollments
            .values()
            .filter(|enrollment| filter.matches(enrollment))
            .cloned()
            .collect())
    }

    fn active_program_outcomes(&self) -> Result<Vec<ProgramOutcome>, StoreError> {
        Ok(self
            .read()?
            .program_outcomes
            .values()
            .filter(|outcome| outcome.is_active)
            .cloned()
            .collect())
    }

    fn assessment_mappings(
        &self,
        learning_outcome: &LearningOutcomeId,
    ) -> Result<Vec<AssessmentLoMapping>, StoreError> {
        Ok(self
            .read()?
            .assessment_mappings
            .values()
            .filter(|mapping| mapping.learning_outcome_id == *learning_outcome)
            .cloned()
            .collect())
    }

    fn program_outcome_mappings(
        &self,
        program_outcome: &ProgramOutcomeId,
    ) -> Result<Vec<LoPoMapping>, StoreError> {
        Ok(self
            .read()?
            .lo_po_mappings
            .values()
            .filter(|mapping| mapping.program_outcome_id == *program_outcome)
            .cloned()
            .collect())
    }

    fn assessment_score(
        &self,
        student: &StudentId,
        assessment: &AssessmentId,
        enrollment: &EnrollmentId,
    ) -> Result<Option<StudentAssessmentScore>, StoreError> {
        let key = (student.clone(), assessment.clone(), enrollment.clone());
        Ok(self.read()?.scores.get(&key).cloned())
    }

    fn course_plo_mappings(&self, course: &CourseId) -> Result<Vec<CoursePloMapping>, StoreError> {
        Ok(self
            .read()?
            .course_plo_mappings
            .values()
            .filter(|mapping| mapping.course_id == *course)
            .cloned()
            .collect())
    }

    fn plo_achievements(
        &self,
        filter: &AchievementFilter,
    ) -> Result<Vec<StudentPloAchievement>, StoreError> {
        Ok(self
            .read()?
            .plo_achievements
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::domain::{AssessmentKind, EnrollmentStatus, Semester};

    fn seeded() -> InMemoryOutcomeStore {
        let store = InMemoryOutcomeStore::new();
        store
            .upsert_student(Student {
                id: StudentId::new("s-1"),
                student_number: "2021001".to_string(),
                name: "Ada".to_string(),
                status: Default::default(),
            })
            .expect("student");
        store
            .upsert_course(Course {
                id: CourseId::new("cs201"),
                code: "CS201".to_string(),
                name: "Data Structures".to_string(),
                credit: 4,
            })
            .expect("course");
        store
            .upsert_offering(CourseOffering {
                id: OfferingId::new("cs201-f24"),
                course_id: CourseId::new("cs201"),
                semester: Semester::Fall,
                year: 2024,
                section: "01".to_string(),
            })
            .expect("offering");
        store
            .upsert_assessment(Assessment {
                id: AssessmentId::new("midterm"),
                offering_id: OfferingId::new("cs201-f24"),
                name: "Midterm".to_string(),
                kind: AssessmentKind::Exam,
                max_score: 100.0,
                weight_percentage: 30.0,
            })
            .expect("assessment");
        store
            .upsert_learning_outcome(LearningOutcome {
                id: LearningOutcomeId::new("cs201-clo1"),
                course_id: CourseId::new("cs201"),
                code: "CLO-1".to_string(),
                description: String::new(),
                plo_id: None,
                weight_percentage: 50,
                is_active: true,
            })
            .expect("learning outcome");
        store
            .upsert_enrollment(Enrollment {
                id: EnrollmentId::new("e-1"),
                student_id: StudentId::new("s-1"),
                course_id: CourseId::new("cs201"),
                semester: Semester::Fall,
                year: 2024,
                status: EnrollmentStatus::Completed,
                grade: None,
                completed_at: None,
            })
            .expect("enrollment");
        store
    }

    #[test]
    fn assessment_mapping_upsert_replaces_existing_pair() {
        let store = seeded();
        for contribution in [30.0, 45.0] {
            store
                .upsert_assessment_mapping(AssessmentLoMapping {
                    assessment_id: AssessmentId::new("midterm"),
                    learning_outcome_id: LearningOutcomeId::new("cs201-clo1"),
                    contribution_percentage: contribution,
                })
                .expect("mapping upsert");
        }

        let mappings = store
            .assessment_mappings(&LearningOutcomeId::new("cs201-clo1"))
            .expect("mappings");
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].contribution_percentage, 45.0);
    }

    #[test]
    fn rejects_out_of_range_mapping_values() {
        let store = seeded();
        let error = store
            .upsert_assessment_mapping(AssessmentLoMapping {
                assessment_id: AssessmentId::new("midterm"),
                learning_outcome_id: LearningOutcomeId::new("cs201-clo1"),
                contribution_percentage: 120.0,
            })
            .expect_err("contribution above 100");
        assert!(matches!(error, StoreError::Invalid(_)));

        store
            .upsert_program_outcome(ProgramOutcome {
                id: ProgramOutcomeId::new("po-a"),
                code: "PO-A".to_string(),
                title: "Engineering knowledge".to_string(),
                is_active: true,
            })
            .expect("program outcome");
        let error = store
            .upsert_lo_po_mapping(LoPoMapping {
                learning_outcome_id: LearningOutcomeId::new("cs201-clo1"),
                program_outcome_id: ProgramOutcomeId::new("po-a"),
                weight: 6,
            })
            .expect_err("weight above 5");
        assert!(matches!(error, StoreError::Invalid(_)));
    }

    #[test]
    fn enrollment_natural_key_is_unique() {
        let store = seeded();
        let error = store
            .upsert_enrollment(Enrollment {
                id: EnrollmentId::new("e-2"),
                student_id: StudentId::new("s-1"),
                course_id: CourseId::new("cs201"),
                semester: Semester::Fall,
                year: 2024,
                status: EnrollmentStatus::Active,
                grade: None,
                completed_at: None,
            })
            .expect_err("duplicate term enrollment");
        assert!(matches!(error, StoreError::Conflict(_)));
    }

    #[test]
    fn score_requires_known_parents_and_matching_student() {
        let store = seeded();
        let error = store
            .upsert_score(StudentAssessmentScore {
                student_id: StudentId::new("s-1"),
                assessment_id: AssessmentId::new("final"),
                enrollment_id: EnrollmentId::new("e-1"),
                score: 80.0,
            })
            .expect_err("unknown assessment");
        assert_eq!(error, StoreError::not_found("assessment", "final"));

        store
            .upsert_student(Student {
                id: StudentId::new("s-2"),
                student_number: "2021002".to_string(),
                name: "Grace".to_string(),
                status: Default::default(),
            })
            .expect("second student");
        let error = store
            .upsert_score(StudentAssessmentScore {
                student_id: StudentId::new("s-2"),
                assessment_id: AssessmentId::new("midterm"),
                enrollment_id: EnrollmentId::new("e-1"),
                score: 80.0,
            })
            .expect_err("enrollment of another student");
        assert!(matches!(error, StoreError::Invalid(_)));
    }

    #[test]
    fn negative_scores_are_rejected() {
        let store = seeded();
        let error = store
            .upsert_score(StudentAssessmentScore {
                student_id: StudentId::new("s-1"),
                assessment_id: AssessmentId::new("midterm"),
                enrollment_id: EnrollmentId::new("e-1"),
                score: -1.0,
            })
            .expect_err("negative score");
        assert!(matches!(error, StoreError::Invalid(_)));
    }

    #[test]
    fn inactive_program_outcomes_are_hidden_from_active_listing() {
        let store = seeded();
        for (id, code, active) in [("po-a", "PO-A", true), ("po-b", "PO-B", false)] {
            store
                .upsert_program_outcome(ProgramOutcome {
                    id: ProgramOutcomeId::new(id),
                    code: code.to_string(),
                    title: code.to_string(),
                    is_active: active,
                })
                .expect("program outcome");
        }

        let active = store.active_program_outcomes().expect("active outcomes");
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].code, "PO-A");
    }
}
