use std::future::Future;

use surveyflow_core::{SurveyId, SurveyStatus};

use super::{qid, sample_answer, sample_survey, seed_response, seed_survey, TestResult};
use crate::SurveyStorage;

pub(super) async fn run_survey_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: SurveyStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "survey",
            "saved_survey_loads_with_questions",
            saved_survey_loads_with_questions(factory).await,
        ),
        TestResult::from_result(
            "survey",
            "load_returns_only_own_questions",
            load_returns_only_own_questions(factory).await,
        ),
        TestResult::from_result(
            "survey",
            "save_replaces_authored_state",
            save_replaces_authored_state(factory).await,
        ),
        TestResult::from_result(
            "survey",
            "status_change_visible_after_commit",
            status_change_visible_after_commit(factory).await,
        ),
        TestResult::from_result(
            "survey",
            "count_responses_is_per_survey",
            count_responses_is_per_survey(factory).await,
        ),
        TestResult::from_result(
            "survey",
            "answered_count_skips_unanswered_responses",
            answered_count_skips_unanswered_responses(factory).await,
        ),
    ]
}

async fn saved_survey_loads_with_questions<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: SurveyStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let survey = sample_survey(1);
    seed_survey(&s, survey.clone()).await?;

    let loaded = s
        .load_survey_graph(SurveyId(1))
        .await
        .map_err(|e| e.to_string())?;
    if loaded != survey {
        return Err(format!("loaded survey differs: {loaded:?}"));
    }
    Ok(())
}

async fn load_returns_only_own_questions<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: SurveyStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut other = sample_survey(2);
    other.questions.truncate(1);
    seed_survey(&s, sample_survey(1)).await?;
    seed_survey(&s, other).await?;

    let loaded = s
        .load_survey_graph(SurveyId(2))
        .await
        .map_err(|e| e.to_string())?;
    if loaded.questions.len() != 1 {
        return Err(format!(
            "expected 1 question for survey 2, got {}",
            loaded.questions.len()
        ));
    }
    Ok(())
}

async fn save_replaces_authored_state<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: SurveyStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed_survey(&s, sample_survey(1)).await?;

    let mut edited = sample_survey(1);
    edited.title = "edited".to_string();
    edited.questions.retain(|q| q.id != qid(1));
    seed_survey(&s, edited).await?;

    let loaded = s
        .load_survey_graph(SurveyId(1))
        .await
        .map_err(|e| e.to_string())?;
    if loaded.title != "edited" || loaded.contains(qid(1)) {
        return Err(format!("survey was not replaced: {loaded:?}"));
    }
    Ok(())
}

async fn status_change_visible_after_commit<S, F, Fut>(factory: &F) -> Result<(), String>
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
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let loaded = s
        .load_survey_graph(SurveyId(1))
        .await
        .map_err(|e| e.to_string())?;
    if loaded.status != SurveyStatus::Active {
        return Err(format!("expected active, got {}", loaded.status));
    }
    Ok(())
}

async fn count_responses_is_per_survey<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: SurveyStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed_response(&s, 1).await?;
    seed_survey(&s, sample_survey(2)).await?;

    let one = s
        .count_responses(SurveyId(1))
        .await
        .map_err(|e| e.to_string())?;
    let two = s
        .count_responses(SurveyId(2))
        .await
        .map_err(|e| e.to_string())?;
    if (one, two) != (1, 0) {
        return Err(format!("expected counts (1, 0), got ({one}, {two})"));
    }
    Ok(())
}

async fn answered_count_skips_unanswered_responses<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: SurveyStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let answered = seed_response(&s, 1).await?;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.create_response(&mut snap, SurveyId(1), "idle", "2025-01-01T00:00:10Z")
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let before = s
        .count_answered_responses(SurveyId(1))
        .await
        .map_err(|e| e.to_string())?;
    if before != 0 {
        return Err(format!("expected no answered responses, got {before}"));
    }

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.persist_answer(&mut snap, answered, sample_answer(1, "hello"))
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let after = s
        .count_answered_responses(SurveyId(1))
        .await
        .map_err(|e| e.to_string())?;
    let all = s
        .count_responses(SurveyId(1))
        .await
        .map_err(|e| e.to_string())?;
    if (after, all) != (1, 2) {
        return Err(format!("expected (answered, all) = (1, 2), got ({after}, {all})"));
    }
    Ok(())
}
