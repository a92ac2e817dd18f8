use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use super::domain::{AssessmentId, EnrollmentId, StudentAssessmentScore, StudentId};
use super::memory::InMemoryOutcomeStore;
use super::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ScoreImportError {
    #[error("failed to read score export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid score CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: {source}")]
    Row { row: usize, source: StoreError },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of a score import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreImportReport {
    pub applied: usize,
}

/// Loads raw assessment scores from a gradebook CSV export.
///
/// Expected header: `student_id,assessment_id,enrollment_id,score`. An import
/// is all or nothing: a rejected row leaves the store untouched.
pub struct ScoreImporter;

impl ScoreImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        store: &InMemoryOutcomeStore,
    ) -> Result<ScoreImportReport, ScoreImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, store)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        store: &InMemoryOutcomeStore,
    ) -> Result<ScoreImportReport, ScoreImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for row in csv_reader.deserialize::<ScoreRow>() {
            let record = row?.into_record();
            debug!(
                student = %record.student_id,
                assessment = %record.assessment_id,
                "parsed assessment score"
            );
            records.push(record);
        }

        let applied = store
            .upsert_scores(records)
            .map_err(|(position, source)| match position {
                Some(position) => {
                    // header is line 1
                    let line = position + 2;
                    warn!(line, error = %source, "score import rejected");
                    ScoreImportError::Row { row: line, source }
                }
                None => ScoreImportError::Store(source),
            })?;

        Ok(ScoreImportReport { applied })
    }
}

#[derive(Debug, Deserialize)]
struct ScoreRow {
    student_id: String,
    assessment_id: String,
    enrollment_id: String,
    score: f64,
}

impl ScoreRow {
    fn into_record(self) -> StudentAssessmentScore {
        StudentAssessmentScore {
            student_id: StudentId(self.student_id),
            assessment_id: AssessmentId(self.assessment_id),
            enrollment_id: EnrollmentId(self.enrollment_id),
            score: self.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::dataset::Dataset;
    use crate::catalog::store::OutcomeStore;
    use std::io::Cursor;

    fn store() -> InMemoryOutcomeStore {
        Dataset::from_reader(Cursor::new(
            r#"{
                "students": [{"id": "s-1", "student_number": "2021001", "name": "Ada"}],
                "courses": [{"id": "cs201", "code": "CS201", "name": "Data Structures", "credit": 4}],
                "offerings": [{"id": "cs201-f24", "course_id": "cs201", "semester": "FALL", "year": 2024}],
                "assessments": [
                    {"id": "midterm", "offering_id": "cs201-f24", "name": "Midterm", "kind": "EXAM", "max_score": 100.0},
                    {"id": "final", "offering_id": "cs201-f24", "name": "Final", "kind": "EXAM", "max_score": 50.0}
                ],
                "enrollments": [{"id": "e-1", "student_id": "s-1", "course_id": "cs201", "semester": "FALL", "year": 2024, "status": "COMPLETED"}]
            }"#,
        ))
        .expect("dataset parses")
        .into_store()
        .expect("store builds")
    }

    #[test]
    fn imports_trimmed_rows() {
        let store = store();
        let csv = "student_id,assessment_id,enrollment_id,score\n s-1 , midterm , e-1 , 80\ns-1,final,e-1,40.5\n";
        let report = ScoreImporter::from_reader(Cursor::new(csv), &store).expect("import succeeds");
        assert_eq!(report.applied, 2);

        let score = store
            .assessment_score(
                &StudentId::new("s-1"),
                &AssessmentId::new("final"),
                &EnrollmentId::new("e-1"),
            )
            .expect("lookup")
            .expect("score stored");
        assert_eq!(score.score, 40.5);
    }

    #[test]
    fn reimporting_a_row_overwrites_the_score() {
        let store = store();
        let csv = "student_id,assessment_id,enrollment_id,score\ns-1,midterm,e-1,80\ns-1,midterm,e-1,65\n";
        ScoreImporter::from_reader(Cursor::new(csv), &store).expect("import succeeds");

        let score = store
            .assessment_score(
                &StudentId::new("s-1"),
                &AssessmentId::new("midterm"),
                &EnrollmentId::new("e-1"),
            )
            .expect("lookup")
            .expect("score stored");
        assert_eq!(score.score, 65.0);
    }

    #[test]
    fn unknown_references_name_the_row() {
        let store = store();
        let csv = "student_id,assessment_id,enrollment_id,score\ns-1,midterm,e-1,80\ns-1,quiz-9,e-1,70\n";
        match ScoreImporter::from_reader(Cursor::new(csv), &store) {
            Err(ScoreImportError::Row { row, source }) => {
                assert_eq!(row, 3);
                assert_eq!(source, StoreError::not_found("assessment", "quiz-9"));
            }
            other => panic!("expected row error, got {other:?}"),
        }
    }

    #[test]
    fn rejected_row_leaves_earlier_rows_unwritten() {
        let store = store();
        let csv = "student_id,assessment_id,enrollment_id,score\ns-1,midterm,e-1,80\ns-1,quiz-9,e-1,70\n";
        let error = ScoreImporter::from_reader(Cursor::new(csv), &store).expect_err("row rejected");
        assert!(matches!(error, ScoreImportError::Row { row: 3, .. }));

        let stored = store
            .assessment_score(
                &StudentId::new("s-1"),
                &AssessmentId::new("midterm"),
                &EnrollmentId::new("e-1"),
            )
            .expect("lookup");
        assert_eq!(stored, None);
    }

    #[test]
    fn malformed_scores_are_csv_errors() {
        let store = store();
        let csv = "student_id,assessment_id,enrollment_id,score\ns-1,midterm,e-1,eighty\n";
        match ScoreImporter::from_reader(Cursor::new(csv), &store) {
            Err(ScoreImportError::Csv(_)) => {}
            other => panic!("expected csv error, got {other:?}"),
        }
    }

    #[test]
    fn from_path_propagates_io_errors() {
        let store = store();
        match ScoreImporter::from_path("./does-not-exist.csv", &store) {
            Err(ScoreImportError::Io(_)) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
