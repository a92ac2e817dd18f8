use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{
    Assessment, AssessmentLoMapping, Course, CourseOffering, CoursePloMapping, Enrollment,
    LearningOutcome, LoPoMapping, ProgramLearningOutcome, ProgramOutcome, Student,
    StudentAssessmentScore, StudentPloAchievement,
};
use super::memory::InMemoryOutcomeStore;
use super::store::StoreError;

/// JSON snapshot of every entity table, used to hydrate an in-memory store.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Dataset {
    pub students: Vec<Student>,
    pub courses: Vec<Course>,
    pub offerings: Vec<CourseOffering>,
    pub assessments: Vec<Assessment>,
    pub plos: Vec<ProgramLearningOutcome>,
    pub learning_outcomes: Vec<LearningOutcome>,
    pub program_outcomes: Vec<ProgramOutcome>,
    pub enrollments: Vec<Enrollment>,
    pub assessment_mappings: Vec<AssessmentLoMapping>,
    pub lo_po_mappings: Vec<LoPoMapping>,
    pub scores: Vec<StudentAssessmentScore>,
    pub course_plo_mappings: Vec<CoursePloMapping>,
    pub plo_achievements: Vec<StudentPloAchievement>,
}

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid dataset JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("dataset rejected by store: {0}")]
    Store(#[from] StoreError),
}

impl Dataset {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Upsert every record into `store`, parents before children.
    pub fn apply_to(self, store: &InMemoryOutcomeStore) -> Result<(), DatasetError> {
        let Dataset {
            students,
            courses,
            offerings,
            assessments,
            plos,
            learning_outcomes,
            program_outcomes,
            enrollments,
            assessment_mappings,
            lo_po_mappings,
            scores,
            course_plo_mappings,
            plo_achievements,
        } = self;

        let score_count = scores.len();
        let student_count = students.len();

        students
            .into_iter()
            .try_for_each(|record| store.upsert_student(record))?;
        courses
            .into_iter()
            .try_for_each(|record| store.upsert_course(record))?;
        offerings
            .into_iter()
            .try_for_each(|record| store.upsert_offering(record))?;
        assessments
            .into_iter()
            .try_for_each(|record| store.upsert_assessment(record))?;
        plos.into_iter()
            .try_for_each(|record| store.upsert_plo(record))?;
        learning_outcomes
            .into_iter()
            .try_for_each(|record| store.upsert_learning_outcome(record))?;
        program_outcomes
            .into_iter()
            .try_for_each(|record| store.upsert_program_outcome(record))?;
        enrollments
            .into_iter()
            .try_for_each(|record| store.upsert_enrollment(record))?;
        assessment_mappings
            .into_iter()
            .try_for_each(|record| store.upsert_assessment_mapping(record))?;
        lo_po_mappings
            .into_iter()
            .try_for_each(|record| store.upsert_lo_po_mapping(record))?;
        scores
            .into_iter()
            .try_for_each(|record| store.upsert_score(record))?;
        course_plo_mappings
            .into_iter()
            .try_for_each(|record| store.upsert_course_plo_mapping(record))?;
        plo_achievements
            .into_iter()
            .try_for_each(|record| store.upsert_plo_achievement(record))?;

        info!(
            students = student_count,
            scores = score_count,
            "dataset applied to store"
        );
        Ok(())
    }

    pub fn into_store(self) -> Result<InMemoryOutcomeStore, DatasetError> {
        let store = InMemoryOutcomeStore::new();
        self.apply_to(&store)?;
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::domain::{CourseId, StudentId};
    use crate::catalog::store::OutcomeStore;
    use std::io::Cursor;

    #[test]
    fn missing_tables_default_to_empty() {
        let dataset = Dataset::from_reader(Cursor::new(
            r#"{"students":[{"id":"s-1","student_number":"2021001","name":"Ada"}]}"#,
        ))
        .expect("dataset parses");
        assert_eq!(dataset.students.len(), 1);
        assert!(dataset.courses.is_empty());

        let store = dataset.into_store().expect("store builds");
        let student = store
            .student(&StudentId::new("s-1"))
            .expect("lookup")
            .expect("student present");
        assert_eq!(student.name, "Ada");
    }

    #[test]
    fn dangling_references_surface_store_errors() {
        let dataset = Dataset::from_reader(Cursor::new(
            r#"{"learning_outcomes":[{"id":"lo-1","course_id":"missing","code":"CLO-1"}]}"#,
        ))
        .expect("dataset parses");

        match dataset.into_store() {
            Err(DatasetError::Store(StoreError::NotFound { entity, id })) => {
                assert_eq!(entity, "course");
                assert_eq!(id, CourseId::new("missing").to_string());
            }
            other => panic!("expected missing course, got {other:?}"),
        }
    }

    #[test]
    fn load_propagates_io_errors() {
        match Dataset::load("./does-not-exist.json") {
            Err(DatasetError::Io(_)) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
