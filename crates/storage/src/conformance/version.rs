use std::future::Future;

use surveyflow_core::{ResponseId, SurveyId};

use super::{sample_answer, sample_survey, seed_response, seed_survey, TestResult};
use crate::{StorageError, SurveyStorage};

pub(super) async fn run_version_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: SurveyStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "version",
            "response_version_starts_at_zero",
            response_version_starts_at_zero(factory).await,
        ),
        TestResult::from_result(
            "version",
            "version_increments_per_commit",
            version_increments_per_commit(factory).await,
        ),
        TestResult::from_result(
            "version",
            "read_only_load_does_not_bump",
            read_only_load_does_not_bump(factory).await,
        ),
        TestResult::from_result(
            "version",
            "two_snapshots_race_one_wins",
            two_snapshots_race_one_wins(factory).await,
        ),
        TestResult::from_result(
            "version",
            "version_per_response_independent",
            version_per_response_independent(factory).await,
        ),
    ]
}

async fn bump<S: SurveyStorage>(s: &S, response_id: ResponseId) -> Result<(), String> {
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.load_response_for_update(&mut snap, response_id)
        .await
        .map_err(|e| e.to_string())?;
    s.persist_answer(&mut snap, response_id, sample_answer(1, "x"))
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())
}

async fn response_version_starts_at_zero<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: SurveyStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let response_id = seed_response(&s, 1).await?;
    let stored = s
        .load_response(response_id)
        .await
        .map_err(|e| e.to_string())?;
    if stored.version != 0 {
        return Err(format!("expected version 0, got {}", stored.version));
    }
    Ok(())
}

async fn version_increments_per_commit<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: SurveyStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let response_id = seed_response(&s, 1).await?;
    for expected in 1..=3 {
        bump(&s, response_id).await?;
        let stored = s
            .load_response(response_id)
            .await
            .map_err(|e| e.to_string())?;
        if stored.version != expected {
            return Err(format!("expected version {expected}, got {}", stored.version));
        }
    }
    Ok(())
}

async fn read_only_load_does_not_bump<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: SurveyStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let response_id = seed_response(&s, 1).await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.load_response_for_update(&mut snap, response_id)
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let stored = s
        .load_response(response_id)
        .await
        .map_err(|e| e.to_string())?;
    if stored.version != 0 {
        return Err(format!("read-only commit bumped version to {}", stored.version));
    }
    Ok(())
}

async fn two_snapshots_race_one_wins<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: SurveyStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let response_id = seed_response(&s, 1).await?;

    let mut snap1 = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let mut snap2 = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    for snap in [&mut snap1, &mut snap2] {
        s.load_response_for_update(&mut *snap, response_id)
            .await
            .map_err(|e| e.to_string())?;
        s.persist_answer(&mut *snap, response_id, sample_answer(1, "race"))
            .await
            .map_err(|e| e.to_string())?;
    }

    s.commit_snapshot(snap1).await.map_err(|e| e.to_string())?;
    match s.commit_snapshot(snap2).await {
        Err(StorageError::ConcurrentConflict {
            response_id: conflicted,
            expected_version,
        }) => {
            if conflicted != response_id || expected_version != 0 {
                return Err(format!(
                    "conflict reported {conflicted} at version {expected_version}"
                ));
            }
        }
        other => return Err(format!("expected ConcurrentConflict, got {other:?}")),
    }

    let stored = s
        .load_response(response_id)
        .await
        .map_err(|e| e.to_string())?;
    if stored.version != 1 {
        return Err(format!("expected version 1 after race, got {}", stored.version));
    }
    Ok(())
}

async fn version_per_response_independent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: SurveyStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let first = seed_response(&s, 1).await?;
    seed_survey(&s, sample_survey(2)).await?;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let second = s
        .create_response(&mut snap, SurveyId(2), "other", "2025-01-01T00:00:00Z")
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    bump(&s, first).await?;
    bump(&s, first).await?;

    let other = s
        .load_response(second.id)
        .await
        .map_err(|e| e.to_string())?;
    if other.version != 0 {
        return Err(format!("unrelated response bumped to {}", other.version));
    }
    if second.id == first {
        return Err("response ids were reused".to_string());
    }
    Ok(())
}
