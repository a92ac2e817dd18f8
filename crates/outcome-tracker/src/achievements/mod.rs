//! Program learning outcome (PLO) achievement reporting.
//!
//! These reports read recorded [`StudentPloAchievement`] rows and course to
//! PLO mappings; they do not derive anything from raw assessment scores.

mod views;

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::catalog::{
    require, AchievementFilter, CourseId, OutcomeStore, PloId, StoreError, StudentId,
    StudentPloAchievement,
};
use crate::scoring::round2;

pub use views::{
    CoursePloCoverage, LevelCounts, PloAchievementSummary, PloStatistics, StudentPloSummary,
};

fn average(scores: impl Iterator<Item = f64>) -> Option<f64> {
    let (total, count) = scores.fold((0.0, 0usize), |(total, count), score| {
        (total + score, count + 1)
    });
    (count > 0).then(|| round2(total / count as f64))
}

/// Average recorded score per PLO for one student.
pub fn student_plo_summary<S>(
    store: &S,
    student_id: &StudentId,
) -> Result<StudentPloSummary, StoreError>
where
    S: OutcomeStore + ?Sized,
{
    require(store.student(student_id)?, "student", student_id)?;

    let records = store.plo_achievements(&AchievementFilter::for_student(student_id))?;
    let mut by_plo: BTreeMap<PloId, Vec<&StudentPloAchievement>> = BTreeMap::new();
    for record in &records {
        by_plo.entry(record.plo_id.clone()).or_default().push(record);
    }

    let mut plos = Vec::with_capacity(by_plo.len());
    for (plo_id, group) in by_plo {
        let plo = require(
            store.program_learning_outcome(&plo_id)?,
            "program learning outcome",
            &plo_id,
        )?;
        plos.push(PloAchievementSummary {
            plo_id,
            number: plo.number,
            short_name: plo.short_name,
            average_score: average(group.iter().map(|record| record.score)).unwrap_or(0.0),
            assessment_count: group.len(),
        });
    }
    plos.sort_by_key(|entry| entry.number);

    debug!(student = %student_id, plos = plos.len(), "student PLO summary built");
    Ok(StudentPloSummary {
        student_id: student_id.clone(),
        total_achievements: records.len(),
        plos,
    })
}

/// Cohort-wide statistics for one PLO.
pub fn plo_statistics<S>(store: &S, plo_id: &PloId) -> Result<PloStatistics, StoreError>
where
    S: OutcomeStore + ?Sized,
{
    let plo = require(
        store.program_learning_outcome(plo_id)?,
        "program learning outcome",
        plo_id,
    )?;

    let records = store.plo_achievements(&AchievementFilter::for_plo(plo_id))?;
    let students: BTreeSet<&StudentId> = records.iter().map(|record| &record.student_id).collect();
    let mut levels = LevelCounts::default();
    for record in &records {
        levels.record(record.achievement_level);
    }

    Ok(PloStatistics {
        plo_id: plo.id,
        number: plo.number,
        short_name: plo.short_name,
        average_score: average(records.iter().map(|record| record.score)),
        total_students: students.len(),
        levels,
    })
}

/// PLOs a course addresses, ordered by PLO number.
pub fn course_plo_coverage<S>(
    store: &S,
    course_id: &CourseId,
) -> Result<Vec<CoursePloCoverage>, StoreError>
where
    S: OutcomeStore + ?Sized,
{
    require(store.course(course_id)?, "course", course_id)?;

    let mut coverage = Vec::new();
    for mapping in store.course_plo_mappings(course_id)? {
        let plo = require(
            store.program_learning_outcome(&mapping.plo_id)?,
            "program learning outcome",
            &mapping.plo_id,
        )?;
        coverage.push(CoursePloCoverage {
            course_id: mapping.course_id,
            plo_id: mapping.plo_id,
            number: plo.number,
            short_name: plo.short_name,
            contribution_level: mapping.contribution_level,
            contribution_label: mapping.contribution_level.label(),
            weight_percentage: mapping.weight_percentage,
        });
    }
    coverage.sort_by_key(|entry| entry.number);
    Ok(coverage)
}
