use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::achievements::{CoursePloCoverage, PloStatistics, StudentPloSummary};
use crate::catalog::{
    CourseId, EnrollmentId, LearningOutcomeId, OutcomeStore, PloId, ProgramOutcomeId, StudentId,
};

use super::error::ScoringError;
use super::policy::AggregationStrategy;
use super::service::OutcomeScoringService;
use super::views::{LoScoreView, PoScoreView, ProgramOutcomeScoresView, StudentSummary};

type SharedService<S> = Arc<OutcomeScoringService<S>>;

/// Router exposing the read-only outcome reports.
pub fn scoring_router<S>(service: SharedService<S>) -> Router
where
    S: OutcomeStore + ?Sized + 'static,
{
    Router::new()
        .route(
            "/api/v1/students/:student_id/learning-outcomes/:lo_id/score",
            get(lo_score_handler::<S>),
        )
        .route(
            "/api/v1/students/:student_id/program-outcomes/:po_id/score",
            get(po_score_handler::<S>),
        )
        .route(
            "/api/v1/students/:student_id/program-outcomes",
            get(all_po_scores_handler::<S>),
        )
        .route(
            "/api/v1/students/:student_id/summary",
            get(summary_handler::<S>),
        )
        .route(
            "/api/v1/students/:student_id/plo-summary",
            get(plo_summary_handler::<S>),
        )
        .route(
            "/api/v1/plos/:plo_id/statistics",
            get(plo_statistics_handler::<S>),
        )
        .route(
            "/api/v1/courses/:course_id/plo-coverage",
            get(course_coverage_handler::<S>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LoScoreQuery {
    pub(crate) enrollment_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PoScoreQuery {
    pub(crate) course_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StrategyQuery {
    pub(crate) strategy: Option<String>,
}

pub(crate) async fn lo_score_handler<S>(
    State(service): State<SharedService<S>>,
    Path((student_id, lo_id)): Path<(String, String)>,
    Query(query): Query<LoScoreQuery>,
) -> Result<Json<LoScoreView>, ScoringError>
where
    S: OutcomeStore + ?Sized + 'static,
{
    let enrollment_id = query.enrollment_id.map(EnrollmentId);
    service
        .lo_score(
            &StudentId(student_id),
            &LearningOutcomeId(lo_id),
            enrollment_id.as_ref(),
        )
        .map(Json)
}

pub(crate) async fn po_score_handler<S>(
    State(service): State<SharedService<S>>,
    Path((student_id, po_id)): Path<(String, String)>,
    Query(query): Query<PoScoreQuery>,
) -> Result<Json<PoScoreView>, ScoringError>
where
    S: OutcomeStore + ?Sized + 'static,
{
    let course_id = query.course_id.map(CourseId);
    service
        .po_score(
            &StudentId(student_id),
            &ProgramOutcomeId(po_id),
            course_id.as_ref(),
        )
        .map(Json)
}

pub(crate) async fn all_po_scores_handler<S>(
    State(service): State<SharedService<S>>,
    Path(student_id): Path<String>,
    Query(query): Query<StrategyQuery>,
) -> Result<Json<ProgramOutcomeScoresView>, ScoringError>
where
    S: OutcomeStore + ?Sized + 'static,
{
    let strategy = match query.strategy {
        Some(raw) => Some(AggregationStrategy::parse(&raw).ok_or(
            ScoringError::InvalidParameter {
                name: "strategy",
                value: raw,
            },
        )?),
        None => None,
    };
    service
        .all_po_scores(&StudentId(student_id), strategy)
        .map(Json)
}

pub(crate) async fn summary_handler<S>(
    State(service): State<SharedService<S>>,
    Path(student_id): Path<String>,
) -> Result<Json<StudentSummary>, ScoringError>
where
    S: OutcomeStore + ?Sized + 'static,
{
    service.student_summary(&StudentId(student_id)).map(Json)
}

pub(crate) async fn plo_summary_handler<S>(
    State(service): State<SharedService<S>>,
    Path(student_id): Path<String>,
) -> Result<Json<StudentPloSummary>, ScoringError>
where
    S: OutcomeStore + ?Sized + 'static,
{
    service.student_plo_summary(&StudentId(student_id)).map(Json)
}

pub(crate) async fn plo_statistics_handler<S>(
    State(service): State<SharedService<S>>,
    Path(plo_id): Path<String>,
) -> Result<Json<PloStatistics>, ScoringError>
where
    S: OutcomeStore + ?Sized + 'static,
{
    service.plo_statistics(&PloId(plo_id)).map(Json)
}

pub(crate) async fn course_coverage_handler<S>(
    State(service): State<SharedService<S>>,
    Path(course_id): Path<String>,
) -> Result<Json<Vec<CoursePloCoverage>>, ScoringError>
where
    S: OutcomeStore + ?Sized + 'static,
{
    service.course_plo_coverage(&CourseId(course_id)).map(Json)
}
