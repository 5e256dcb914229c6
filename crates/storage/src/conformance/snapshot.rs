use std::future::Future;

use surveyflow_core::{SurveyId, SurveyStatus};

use super::{qid, sample_answer, sample_survey, seed_response, seed_survey, TestResult};
use crate::SurveyStorage;

pub(super) async fn run_snapshot_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: SurveyStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "snapshot",
            "uncommitted_survey_invisible",
            uncommitted_survey_invisible(factory).await,
        ),
        TestResult::from_result(
            "snapshot",
            "uncommitted_status_invisible",
            uncommitted_status_invisible(factory).await,
        ),
        TestResult::from_result(
            "snapshot",
            "uncommitted_response_invisible",
            uncommitted_response_invisible(factory).await,
        ),
        TestResult::from_result(
            "snapshot",
            "abort_discards_answer",
            abort_discards_answer(factory).await,
        ),
        TestResult::from_result(
            "snapshot",
            "dropped_snapshot_discards_answer",
            dropped_snapshot_discards_answer(factory).await,
        ),
    ]
}

async fn uncommitted_survey_invisible<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: SurveyStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.save_survey(&mut snap, sample_survey(1))
        .await
        .map_err(|e| e.to_string())?;

    let seen = s.load_survey_graph(SurveyId(1)).await;
    let _ = s.abort_snapshot(snap).await;
    if seen.is_ok() {
        return Err("uncommitted survey was visible".to_string());
    }
    Ok(())
}

async fn uncommitted_status_invisible<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: SurveyStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed_survey(&s, sample_survey(1)).await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.set_survey_status(&mut snap, SurveyId(1), SurveyStatus::Active)
        .await
        .map_err(|e| e.to_string())?;
    let seen = s
        .load_survey_graph(SurveyId(1))
        .await
        .map_err(|e| e.to_string())?;
    let _ = s.abort_snapshot(snap).await;

    if seen.status != SurveyStatus::Draft {
        return Err(format!("uncommitted status leaked: {}", seen.status));
    }
    Ok(())
}

async fn uncommitted_response_invisible<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: SurveyStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed_survey(&s, sample_survey(1)).await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let response = s
        .create_response(&mut snap, SurveyId(1), "r", "2025-01-01T00:00:00Z")
        .await
        .map_err(|e| e.to_string())?;
    let seen = s.load_response(response.id).await;
    let count = s
        .count_responses(SurveyId(1))
        .await
        .map_err(|e| e.to_string())?;
    let _ = s.abort_snapshot(snap).await;

    if seen.is_ok() || count != 0 {
        return Err("uncommitted response was visible".to_string());
    }
    Ok(())
}

async fn abort_discards_answer<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: SurveyStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let response_id = seed_response(&s, 1).await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.persist_answer(&mut snap, response_id, sample_answer(1, "hello"))
        .await
        .map_err(|e| e.to_string())?;
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;

    let response = s
        .load_response(response_id)
        .await
        .map_err(|e| e.to_string())?;
    if response.answer_for(qid(1)).is_some() {
        return Err("aborted answer was persisted".to_string());
    }
    Ok(())
}

async fn dropped_snapshot_discards_answer<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: SurveyStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let response_id = seed_response(&s, 1).await?;

    {
        let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
        s.persist_answer(&mut snap, response_id, sample_answer(1, "hello"))
            .await
            .map_err(|e| e.to_string())?;
    }

    let response = s
        .load_response(response_id)
        .await
        .map_err(|e| e.to_string())?;
    if !response.answers.is_empty() || response.version != 0 {
        return Err(format!("dropped snapshot left state behind: {response:?}"));
    }
    Ok(())
}
