use serde::Serialize;

use crate::catalog::{ContributionLevel, CourseId, PloId, StudentId};
use crate::scoring::AchievementLevel;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PloAchievementSummary {
    pub plo_id: PloId,
    pub number: u32,
    pub short_name: String,
    pub average_score: f64,
    pub assessment_count: usize,
}

/// Recorded PLO achievements of one student, ordered by PLO number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentPloSummary {
    pub student_id: StudentId,
    pub total_achievements: usize,
    pub plos: Vec<PloAchievementSummary>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LevelCounts {
    pub not_achieved: usize,
    pub partially: usize,
    pub achieved: usize,
    pub exceeded: usize,
}

impl LevelCounts {
    pub(crate) fn record(&mut self, level: AchievementLevel) {
        match level {
            AchievementLevel::NotAchieved => self.not_achieved += 1,
            AchievementLevel::Partially => self.partially += 1,
            AchievementLevel::Achieved => self.achieved += 1,
            AchievementLevel::Exceeded => self.exceeded += 1,
        }
    }

    pub fn count(&self, level: AchievementLevel) -> usize {
        match level {
            AchievementLevel::NotAchieved => self.not_achieved,
            AchievementLevel::Partially => self.partially,
            AchievementLevel::Achieved => self.achieved,
            AchievementLevel::Exceeded => self.exceeded,
        }
    }

    /// Counts from the lowest band to the highest.
    pub fn by_level(&self) -> impl Iterator<Item = (AchievementLevel, usize)> + '_ {
        AchievementLevel::ordered()
            .into_iter()
            .map(move |level| (level, self.count(level)))
    }

    pub fn total(&self) -> usize {
        self.by_level().map(|(_, count)| count).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PloStatistics {
    pub plo_id: PloId,
    pub number: u32,
    pub short_name: String,
    /// `None` when no achievement has been recorded for the PLO.
    pub average_score: Option<f64>,
    pub total_students: usize,
    pub levels: LevelCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoursePloCoverage {
    pub course_id: CourseId,
    pub plo_id: PloId,
    pub number: u32,
    pub short_name: String,
    pub contribution_level: ContributionLevel,
    pub contribution_label: &'static str,
    pub weight_percentage: u8,
}
