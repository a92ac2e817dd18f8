use crate::infra::load_store;
use chrono::{TimeZone, Utc};
use clap::Args;
use outcome_tracker::catalog::{
    Assessment, AssessmentId, AssessmentKind, AssessmentLoMapping, ContributionLevel, Course,
    CourseId, CourseOffering, CoursePloMapping, Dataset, Enrollment, EnrollmentId,
    EnrollmentStatus, LearningOutcome, LearningOutcomeId, LetterGrade,
    LoPoMapping, OfferingId, PloCategory, PloId, ProgramLearningOutcome, ProgramOutcome,
    ProgramOutcomeId, ScoreImporter, Semester, Student, StudentAssessmentScore, StudentId,
    StudentPloAchievement, StudentStatus,
};
use outcome_tracker::config::AppConfig;
use outcome_tracker::error::AppError;
use outcome_tracker::scoring::{
    AchievementLevel, AggregationStrategy, OutcomeScoringService, ProgramOutcomeScoresView,
    ScoringConfig, StudentSummary,
};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Student whose scores are walked through
    #[arg(long, default_value = "s-1001")]
    pub(crate) student: String,
    /// Print the transcript, aggregations and summary as one JSON report
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct TranscriptLine {
    pub(crate) course: String,
    pub(crate) term: String,
    pub(crate) credit: u32,
    pub(crate) status: &'static str,
    /// Only set for completed, graded enrollments.
    pub(crate) grade_points: Option<f32>,
}

#[derive(Debug, Serialize)]
struct DemoReport<'a> {
    transcript: &'a [TranscriptLine],
    grade_point_average: Option<f64>,
    program_outcomes: Vec<ProgramOutcomeScoresView>,
    summary: &'a StudentSummary,
}

#[derive(Args, Debug)]
pub(crate) struct SummaryArgs {
    /// JSON dataset holding the cohort
    #[arg(long)]
    pub(crate) dataset: PathBuf,
    /// Student id to summarize
    #[arg(long)]
    pub(crate) student: String,
    /// Print the summary as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ImportScoresArgs {
    /// JSON dataset holding the cohort
    #[arg(long)]
    pub(crate) dataset: PathBuf,
    /// Gradebook CSV with student_id,assessment_id,enrollment_id,score
    #[arg(long)]
    pub(crate) scores: PathBuf,
    /// Student id to summarize after the import
    #[arg(long)]
    pub(crate) student: String,
    /// Print the summary as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_summary(args: SummaryArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let store = load_store(Some(&args.dataset))?;
    let service = OutcomeScoringService::new(Arc::new(store), config.scoring);

    let summary = service.student_summary(&StudentId::new(args.student))?;
    print_summary(&summary, args.json)
}

pub(crate) fn run_import_scores(args: ImportScoresArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let store = load_store(Some(&args.dataset))?;
    let report = ScoreImporter::from_path(&args.scores, &store)?;
    println!(
        "Imported {} assessment scores from {}",
        report.applied,
        args.scores.display()
    );

    let service = OutcomeScoringService::new(Arc::new(store), config.scoring);
    let summary = service.student_summary(&StudentId::new(args.student))?;
    print_summary(&summary, args.json)
}

pub(crate) fn transcript(
    enrollments: &[Enrollment],
    courses: &[Course],
    student: &StudentId,
) -> Vec<TranscriptLine> {
    enrollments
        .iter()
        .filter(|enrollment| &enrollment.student_id == student)
        .map(|enrollment| {
            let course = courses
                .iter()
                .find(|course| course.id == enrollment.course_id);
            TranscriptLine {
                course: course.map_or_else(
                    || enrollment.course_id.to_string(),
                    |course| course.code.clone(),
                ),
                term: format!("{} {}", enrollment.semester.label(), enrollment.year),
                credit: course.map_or(0, |course| course.credit),
                status: enrollment.status.label(),
                grade_points: enrollment
                    .grade
                    .filter(|_| enrollment.is_completed())
                    .map(LetterGrade::grade_points),
            }
        })
        .collect()
}

/// Credit-weighted grade point average over graded lines.
pub(crate) fn grade_point_average(lines: &[TranscriptLine]) -> Option<f64> {
    let (points, credits) = lines
        .iter()
        .filter_map(|line| line.grade_points.map(|points| (f64::from(points), line.credit)))
        .fold((0.0, 0u32), |(total, credits), (points, credit)| {
            (total + points * f64::from(credit), credits + credit)
        });
    (credits > 0).then(|| points / f64::from(credits))
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let dataset = demo_dataset();
    let learning_outcomes = dataset.learning_outcomes.clone();
    let courses = dataset.courses.clone();
    let program_outcomes = dataset.program_outcomes.clone();
    let plos = dataset.plos.clone();
    let student_id = StudentId::new(args.student);
    let lines = transcript(&dataset.enrollments, &courses, &student_id);
    let gpa = grade_point_average(&lines);

    let store = Arc::new(dataset.into_store()?);
    let service = OutcomeScoringService::new(store, ScoringConfig::default());
    let strategies = [
        AggregationStrategy::CreditWeighted,
        AggregationStrategy::SimpleAverage,
    ];

    if args.json {
        let program_outcomes = strategies
            .into_iter()
            .map(|strategy| service.all_po_scores(&student_id, Some(strategy)))
            .collect::<Result<Vec<_>, _>>()?;
        let summary = service.student_summary(&student_id)?;
        let report = DemoReport {
            transcript: &lines,
            grade_point_average: gpa,
            program_outcomes,
            summary: &summary,
        };
        let rendered = serde_json::to_string_pretty(&report).map_err(std::io::Error::from)?;
        println!("{rendered}");
        return Ok(());
    }

    println!("Outcome scoring demo for student {student_id}");

    println!("\nTranscript");
    for line in &lines {
        let grade = line
            .grade_points
            .map_or_else(|| "-".to_string(), |points| format!("{points:.1}"));
        println!(
            "- {} {} ({} cr): {} | grade points {grade}",
            line.course, line.term, line.credit, line.status
        );
    }
    if let Some(gpa) = gpa {
        println!("GPA: {gpa:.2}");
    }

    println!("\nLearning outcome scores (latest completed enrollment)");
    for outcome in &learning_outcomes {
        let view = service.lo_score(&student_id, &outcome.id, None)?;
        println!(
            "- {} {}: {:.2}%",
            outcome.code, outcome.description, view.score
        );
    }

    println!("\nProgram outcome scores per course");
    for course in &courses {
        for outcome in &program_outcomes {
            let view = service.po_score(&student_id, &outcome.id, Some(&course.id))?;
            if view.score > 0.0 {
                println!("- {} {}: {:.2}%", course.code, outcome.code, view.score);
            }
        }
    }

    for strategy in strategies {
        println!("\nAll program outcomes ({})", strategy.label());
        let view = service.all_po_scores(&student_id, Some(strategy))?;
        for entry in &view.scores {
            println!("- {} {}: {:.2}%", entry.code, entry.title, entry.score);
        }
    }

    println!("\nPLO achievement bands (cohort)");
    for plo in &plos {
        let stats = service.plo_statistics(&plo.id)?;
        let bands: Vec<String> = stats
            .levels
            .by_level()
            .map(|(level, count)| format!("{} {count}", level.label()))
            .collect();
        println!("- PLO {} {}: {}", stats.number, stats.short_name, bands.join(", "));
    }

    println!();
    let summary = service.student_summary(&student_id)?;
    print_summary(&summary, false)
}

fn print_summary(summary: &StudentSummary, json: bool) -> Result<(), AppError> {
    if json {
        let rendered = serde_json::to_string_pretty(summary).map_err(std::io::Error::from)?;
        println!("{rendered}");
    } else {
        print!("{}", render_summary(summary));
    }
    Ok(())
}

pub(crate) fn render_summary(summary: &StudentSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Outcome summary for {} ({})",
        summary.student.name, summary.student.student_number
    );
    for (code, entry) in &summary.po_scores {
        let _ = writeln!(
            out,
            "  {code} {}: {:.2}% [{}]",
            entry.title,
            entry.score,
            entry.achievement_level.label()
        );
    }

    let stats = &summary.statistics;
    let _ = writeln!(
        out,
        "Average PO score: {:.2}% | highest: {} | lowest: {}",
        stats.average_po_score,
        stats.highest_po.as_deref().unwrap_or("-"),
        stats.lowest_po.as_deref().unwrap_or("-")
    );
    let _ = writeln!(
        out,
        "Completed courses: {} | total credits: {}",
        stats.completed_courses, stats.total_credits
    );
    out
}

fn student(id: &str, number: &str, name: &str) -> Student {
    Student {
        id: StudentId::new(id),
        student_number: number.to_string(),
        name: name.to_string(),
        status: StudentStatus::Active,
    }
}

fn course(id: &str, code: &str, name: &str, credit: u32) -> Course {
    Course {
        id: CourseId::new(id),
        code: code.to_string(),
        name: name.to_string(),
        credit,
    }
}

fn offering(id: &str, course: &str, semester: Semester, year: i32) -> CourseOffering {
    CourseOffering {
        id: OfferingId::new(id),
        course_id: CourseId::new(course),
        semester,
        year,
        section: "01".to_string(),
    }
}

fn enrollment(
    id: &str,
    student: &str,
    course: &str,
    (semester, year): (Semester, i32),
    grade: Option<LetterGrade>,
) -> Enrollment {
    let status = if grade.is_some() {
        EnrollmentStatus::Completed
    } else {
        EnrollmentStatus::Active
    };
    let (end_year, end_month) = match semester {
        Semester::Fall => (year + 1, 1),
        Semester::Spring => (year, 6),
        Semester::Summer => (year, 8),
    };
    let completed_at = grade.and_then(|_| {
        Utc.with_ymd_and_hms(end_year, end_month, 15, 12, 0, 0)
            .single()
    });
    Enrollment {
        id: EnrollmentId::new(id),
        student_id: StudentId::new(student),
        course_id: CourseId::new(course),
        semester,
        year,
        status,
        grade,
        completed_at,
    }
}

fn assessment(id: &str, offering: &str, name: &str, kind: AssessmentKind, max: f64) -> Assessment {
    Assessment {
        id: AssessmentId::new(id),
        offering_id: OfferingId::new(offering),
        name: name.to_string(),
        kind,
        max_score: max,
        weight_percentage: 0.0,
    }
}

fn learning_outcome(id: &str, course: &str, code: &str, description: &str) -> LearningOutcome {
    LearningOutcome {
        id: LearningOutcomeId::new(id),
        course_id: CourseId::new(course),
        code: code.to_string(),
        description: description.to_string(),
        plo_id: None,
        weight_percentage: 50,
        is_active: true,
    }
}

fn measures(assessment: &str, outcome: &str, percentage: f64) -> AssessmentLoMapping {
    AssessmentLoMapping {
        assessment_id: AssessmentId::new(assessment),
        learning_outcome_id: LearningOutcomeId::new(outcome),
        contribution_percentage: percentage,
    }
}

fn supports(outcome: &str, program_outcome: &str, weight: u8) -> LoPoMapping {
    LoPoMapping {
        learning_outcome_id: LearningOutcomeId::new(outcome),
        program_outcome_id: ProgramOutcomeId::new(program_outcome),
        weight,
    }
}

fn score(student: &str, assessment: &str, enrollment: &str, value: f64) -> StudentAssessmentScore {
    StudentAssessmentScore {
        student_id: StudentId::new(student),
        assessment_id: AssessmentId::new(assessment),
        enrollment_id: EnrollmentId::new(enrollment),
        score: value,
    }
}

fn plo(id: &str, number: u32, short_name: &str, category: PloCategory) -> ProgramLearningOutcome {
    ProgramLearningOutcome {
        id: PloId::new(id),
        number,
        short_name: short_name.to_string(),
        category,
        is_active: true,
    }
}

fn covers(course: &str, plo: &str, level: ContributionLevel, weight: u8) -> CoursePloMapping {
    CoursePloMapping {
        course_id: CourseId::new(course),
        plo_id: PloId::new(plo),
        contribution_level: level,
        weight_percentage: weight,
    }
}

fn achieved(student: &str, plo: &str, enrollment: &str, value: f64) -> StudentPloAchievement {
    StudentPloAchievement {
        student_id: StudentId::new(student),
        plo_id: PloId::new(plo),
        enrollment_id: EnrollmentId::new(enrollment),
        score: value,
        achievement_level: AchievementLevel::from_score(value),
        notes: String::new(),
    }
}

/// Two students across CS201, CS301 and CS302 feeding PO-A and PO-B.
pub(crate) fn demo_dataset() -> Dataset {
    let fall_2024 = (Semester::Fall, 2024);
    let spring_2025 = (Semester::Spring, 2025);

    Dataset {
        students: vec![
            student("s-1001", "2021001", "Ayse Yilmaz"),
            student("s-1002", "2021002", "Mehmet Kaya"),
        ],
        courses: vec![
            course("c-cs201", "CS201", "Data Structures", 4),
            course("c-cs301", "CS301", "Algorithms", 3),
            course("c-cs302", "CS302", "Database Systems", 3),
        ],
        offerings: vec![
            offering("off-cs201-f24", "c-cs201", Semester::Fall, 2024),
            offering("off-cs301-f24", "c-cs301", Semester::Fall, 2024),
            offering("off-cs302-s25", "c-cs302", Semester::Spring, 2025),
        ],
        assessments: vec![
            assessment("a-cs201-mid", "off-cs201-f24", "Midterm", AssessmentKind::Exam, 100.0),
            assessment("a-cs201-final", "off-cs201-f24", "Final", AssessmentKind::Exam, 100.0),
            assessment("a-cs201-proj", "off-cs201-f24", "Project", AssessmentKind::Project, 50.0),
            assessment("a-cs301-mid", "off-cs301-f24", "Midterm", AssessmentKind::Exam, 100.0),
            assessment("a-cs301-hw", "off-cs301-f24", "Homework", AssessmentKind::Homework, 20.0),
            assessment("a-cs302-proj", "off-cs302-s25", "Project", AssessmentKind::Project, 100.0),
            assessment("a-cs302-quiz", "off-cs302-s25", "Quiz", AssessmentKind::Quiz, 10.0),
        ],
        plos: vec![
            plo("plo-1", 1, "Computing Knowledge", PloCategory::Knowledge),
            plo("plo-2", 2, "Problem Solving", PloCategory::Skills),
        ],
        learning_outcomes: vec![
            learning_outcome("lo-cs201-1", "c-cs201", "CS201-LO1", "Implement data structures"),
            learning_outcome("lo-cs201-2", "c-cs201", "CS201-LO2", "Analyze time complexity"),
            learning_outcome("lo-cs301-1", "c-cs301", "CS301-LO1", "Design efficient algorithms"),
            learning_outcome("lo-cs302-1", "c-cs302", "CS302-LO1", "Model relational data"),
        ],
        program_outcomes: vec![
            ProgramOutcome {
                id: ProgramOutcomeId::new("po-a"),
                code: "PO-A".to_string(),
                title: "Apply computing and mathematics knowledge".to_string(),
                is_active: true,
            },
            ProgramOutcome {
                id: ProgramOutcomeId::new("po-b"),
                code: "PO-B".to_string(),
                title: "Design and evaluate computing solutions".to_string(),
                is_active: true,
            },
        ],
        enrollments: vec![
            enrollment("e-1001-cs201", "s-1001", "c-cs201", fall_2024, Some(LetterGrade::Ba)),
            enrollment("e-1001-cs301", "s-1001", "c-cs301", fall_2024, Some(LetterGrade::Cb)),
            enrollment("e-1001-cs302", "s-1001", "c-cs302", spring_2025, Some(LetterGrade::Bb)),
            enrollment("e-1002-cs201", "s-1002", "c-cs201", fall_2024, Some(LetterGrade::Cc)),
            enrollment("e-1002-cs301", "s-1002", "c-cs301", spring_2025, None),
        ],
        assessment_mappings: vec![
            measures("a-cs201-mid", "lo-cs201-1", 40.0),
            measures("a-cs201-proj", "lo-cs201-1", 60.0),
            measures("a-cs201-mid", "lo-cs201-2", 30.0),
            measures("a-cs201-final", "lo-cs201-2", 70.0),
            measures("a-cs301-mid", "lo-cs301-1", 50.0),
            measures("a-cs301-hw", "lo-cs301-1", 50.0),
            measures("a-cs302-proj", "lo-cs302-1", 70.0),
            measures("a-cs302-quiz", "lo-cs302-1", 30.0),
        ],
        lo_po_mappings: vec![
            supports("lo-cs201-1", "po-a", 5),
            supports("lo-cs201-2", "po-a", 3),
            supports("lo-cs301-1", "po-a", 4),
            supports("lo-cs201-2", "po-b", 2),
            supports("lo-cs301-1", "po-b", 5),
            supports("lo-cs302-1", "po-b", 4),
        ],
        scores: vec![
            score("s-1001", "a-cs201-mid", "e-1001-cs201", 82.0),
            score("s-1001", "a-cs201-final", "e-1001-cs201", 88.0),
            score("s-1001", "a-cs201-proj", "e-1001-cs201", 45.0),
            score("s-1001", "a-cs301-mid", "e-1001-cs301", 64.0),
            score("s-1001", "a-cs301-hw", "e-1001-cs301", 15.0),
            score("s-1001", "a-cs302-proj", "e-1001-cs302", 91.0),
            score("s-1001", "a-cs302-quiz", "e-1001-cs302", 7.0),
            score("s-1002", "a-cs201-mid", "e-1002-cs201", 55.0),
            score("s-1002", "a-cs201-final", "e-1002-cs201", 61.0),
        ],
        course_plo_mappings: vec![
            covers("c-cs201", "plo-1", ContributionLevel::Introductory, 40),
            covers("c-cs301", "plo-2", ContributionLevel::Reinforcing, 60),
            covers("c-cs302", "plo-2", ContributionLevel::Mastery, 50),
        ],
        plo_achievements: vec![
            achieved("s-1001", "plo-1", "e-1001-cs201", 86.0),
            achieved("s-1001", "plo-2", "e-1001-cs301", 71.0),
            achieved("s-1002", "plo-1", "e-1002-cs201", 58.0),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outcome_tracker::catalog::InMemoryOutcomeStore;

    fn demo_store() -> InMemoryOutcomeStore {
        demo_dataset().into_store().expect("demo dataset loads")
    }

    fn service() -> OutcomeScoringService<InMemoryOutcomeStore> {
        OutcomeScoringService::new(Arc::new(demo_store()), ScoringConfig::default())
    }

    #[test]
    fn demo_summary_matches_hand_computed_scores() {
        let summary = service()
            .student_summary(&StudentId::new("s-1001"))
            .expect("summary");

        let po_a = &summary.po_scores["PO-A"];
        assert!((po_a.score - 79.26).abs() < 1e-9);
        assert_eq!(po_a.achievement_level, AchievementLevel::Achieved);
        assert_eq!(summary.po_scores["PO-B"].score, 80.74);
        assert_eq!(summary.statistics.highest_po.as_deref(), Some("PO-B"));
        assert_eq!(summary.statistics.lowest_po.as_deref(), Some("PO-A"));
        assert_eq!(summary.statistics.completed_courses, 3);
        assert_eq!(summary.statistics.total_credits, 10);
    }

    #[test]
    fn demo_lo_scores_follow_contribution_weights() {
        let view = service()
            .lo_score(
                &StudentId::new("s-1001"),
                &LearningOutcomeId::new("lo-cs201-1"),
                None,
            )
            .expect("lo score");
        // (82 * 0.4 + 90 * 0.6)
        assert!((view.score - 86.8).abs() < 1e-9);
    }

    #[test]
    fn active_enrollment_does_not_count_toward_summary() {
        let summary = service()
            .student_summary(&StudentId::new("s-1002"))
            .expect("summary");
        assert_eq!(summary.statistics.completed_courses, 1);
        assert_eq!(summary.statistics.total_credits, 4);
    }

    #[test]
    fn demo_plo_statistics_cover_both_students() {
        let stats = service()
            .plo_statistics(&PloId::new("plo-1"))
            .expect("statistics");
        assert_eq!(stats.total_students, 2);
        assert_eq!(stats.average_score, Some(72.0));
    }

    #[test]
    fn imported_scores_change_the_summary() {
        let store = demo_store();
        let csv = "student_id,assessment_id,enrollment_id,score\n\
                   s-1002,a-cs201-proj,e-1002-cs201,50\n";
        let report = ScoreImporter::from_reader(csv.as_bytes(), &store).expect("import");
        assert_eq!(report.applied, 1);

        let service = OutcomeScoringService::new(Arc::new(store), ScoringConfig::default());
        let view = service
            .lo_score(
                &StudentId::new("s-1002"),
                &LearningOutcomeId::new("lo-cs201-1"),
                None,
            )
            .expect("lo score");
        // (55 * 0.4 + 100 * 0.6)
        assert!((view.score - 82.0).abs() < 1e-9);
    }

    #[test]
    fn transcript_reports_status_and_grade_points() {
        let dataset = demo_dataset();
        let lines = transcript(
            &dataset.enrollments,
            &dataset.courses,
            &StudentId::new("s-1002"),
        );

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].course, "CS201");
        assert_eq!(lines[0].term, "Fall 2024");
        assert_eq!(lines[0].status, "Completed");
        assert_eq!(lines[0].grade_points, Some(2.0));
        assert_eq!(lines[1].status, "Active");
        assert_eq!(lines[1].grade_points, None);
        assert_eq!(grade_point_average(&lines), Some(2.0));
    }

    #[test]
    fn grade_point_average_weights_by_credit() {
        let dataset = demo_dataset();
        let lines = transcript(
            &dataset.enrollments,
            &dataset.courses,
            &StudentId::new("s-1001"),
        );
        // (3.5 * 4 + 2.5 * 3 + 3.0 * 3) / 10
        let gpa = grade_point_average(&lines).expect("graded courses");
        assert!((gpa - 3.05).abs() < 1e-9);
    }

    #[test]
    fn demo_report_serializes_every_section() {
        let dataset = demo_dataset();
        let student = StudentId::new("s-1001");
        let lines = transcript(&dataset.enrollments, &dataset.courses, &student);
        let service = service();
        let summary = service.student_summary(&student).expect("summary");
        let report = DemoReport {
            transcript: &lines,
            grade_point_average: grade_point_average(&lines),
            program_outcomes: vec![service
                .all_po_scores(&student, Some(AggregationStrategy::SimpleAverage))
                .expect("aggregation")],
            summary: &summary,
        };

        let json = serde_json::to_value(&report).expect("serialize report");
        assert_eq!(json["transcript"][0]["status"], "Completed");
        assert_eq!(json["transcript"].as_array().map(Vec::len), Some(3));
        assert_eq!(json["program_outcomes"][0]["strategy"], "simple_average");
        assert_eq!(json["summary"]["statistics"]["total_credits"], 10);
    }

    #[test]
    fn rendered_summary_lists_outcomes_and_statistics() {
        let summary = service()
            .student_summary(&StudentId::new("s-1001"))
            .expect("summary");
        let text = render_summary(&summary);

        assert!(text.starts_with("Outcome summary for Ayse Yilmaz (2021001)"));
        assert!(text.contains("PO-B Design and evaluate computing solutions: 80.74% [Achieved]"));
        assert!(text.contains("Completed courses: 3 | total credits: 10"));
    }
}
