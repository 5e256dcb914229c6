use std::future::Future;

use surveyflow_core::Response;

use super::{qid, sample_answer, seed_response, TestResult};
use crate::{StorageError, SurveyStorage};

pub(super) async fn run_commit_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: SurveyStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "commit",
            "answer_and_state_commit_together",
            answer_and_state_commit_together(factory).await,
        ),
        TestResult::from_result(
            "commit",
            "answer_replaces_existing_answer",
            answer_replaces_existing_answer(factory).await,
        ),
        TestResult::from_result(
            "commit",
            "several_answers_in_one_snapshot",
            several_answers_in_one_snapshot(factory).await,
        ),
        TestResult::from_result(
            "commit",
            "failed_commit_applies_nothing",
            failed_commit_applies_nothing(factory).await,
        ),
    ]
}

async fn load<S: SurveyStorage>(s: &S, response: &Response) -> Result<Response, String> {
    s.load_response(response.id).await.map_err(|e| e.to_string())
}

async fn answer_and_state_commit_together<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: SurveyStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let response_id = seed_response(&s, 1).await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let mut response = s
        .load_response_for_update(&mut snap, response_id)
        .await
        .map_err(|e| e.to_string())?;
    s.persist_answer(&mut snap, response_id, sample_answer(1, "hello"))
        .await
        .map_err(|e| e.to_string())?;
    response.record_visited(qid(1));
    response.mark_complete("2025-01-01T00:05:00Z");
    s.persist_response_state(&mut snap, &response)
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let stored = load(&s, &response).await?;
    if stored.answer_for(qid(1)).is_none() {
        return Err("answer missing after commit".to_string());
    }
    if !stored.complete || stored.submitted_at.is_none() {
        return Err("completion state missing after commit".to_string());
    }
    if !stored.has_visited(qid(1)) {
        return Err("visited set missing after commit".to_string());
    }
    Ok(())
}

async fn answer_replaces_existing_answer<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: SurveyStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let response_id = seed_response(&s, 1).await?;

    for text in ["first", "second"] {
        let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
        s.persist_answer(&mut snap, response_id, sample_answer(1, text))
            .await
            .map_err(|e| e.to_string())?;
        s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;
    }

    let stored = s
        .load_response(response_id)
        .await
        .map_err(|e| e.to_string())?;
    if stored.answers.len() != 1 {
        return Err(format!("expected 1 answer, got {}", stored.answers.len()));
    }
    if stored.answers[0] != sample_answer(1, "second") {
        return Err(format!("answer not replaced: {:?}", stored.answers[0]));
    }
    Ok(())
}

async fn several_answers_in_one_snapshot<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: SurveyStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let response_id = seed_response(&s, 1).await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    for question in [1, 2] {
        s.persist_answer(&mut snap, response_id, sample_answer(question, "x"))
            .await
            .map_err(|e| e.to_string())?;
    }
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let stored = s
        .load_response(response_id)
        .await
        .map_err(|e| e.to_string())?;
    if stored.answers.len() != 2 {
        return Err(format!("expected 2 answers, got {}", stored.answers.len()));
    }
    if stored.version != 1 {
        return Err(format!("one commit should bump once, got version {}", stored.version));
    }
    Ok(())
}

async fn failed_commit_applies_nothing<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: SurveyStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let response_id = seed_response(&s, 1).await?;

    let mut loser = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.load_response_for_update(&mut loser, response_id)
        .await
        .map_err(|e| e.to_string())?;
    s.persist_answer(&mut loser, response_id, sample_answer(2, "loser"))
        .await
        .map_err(|e| e.to_string())?;

    let mut winner = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.persist_answer(&mut winner, response_id, sample_answer(1, "winner"))
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(winner).await.map_err(|e| e.to_string())?;

    match s.commit_snapshot(loser).await {
        Err(StorageError::ConcurrentConflict { .. }) => {}
        other => return Err(format!("expected ConcurrentConflict, got {other:?}")),
    }

    let stored = s
        .load_response(response_id)
        .await
        .map_err(|e| e.to_string())?;
    if stored.answer_for(qid(2)).is_some() {
        return Err("conflicting snapshot leaked an answer".to_string());
    }
    if stored.answer_for(qid(1)).is_none() {
        return Err("winning answer missing".to_string());
    }
    Ok(())
}
