//! Conformance test suite for `SurveyStorage` implementations.
//!
//! A backend-agnostic suite any `SurveyStorage` implementation can run to
//! verify correctness. The suite covers:
//!
//! - **Surveys**: save, load, status changes, per-survey isolation
//! - **Snapshot isolation**: uncommitted writes invisible, aborts discard
//! - **Atomic commit**: answer and response state land together
//! - **Version validation / OCC**: concurrent writers to one response
//! - **Error handling**: correct error variants for missing records
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory that creates a
//! fresh, empty storage instance for each test:
//!
//! ```ignore
//! use surveyflow_storage::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn sqlite_conformance() {
//!     let report = run_conformance_suite(|| async { open_test_sqlite().await }).await;
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod commit;
mod error;
mod snapshot;
mod survey;
mod version;

use std::fmt;
use std::future::Future;

use surveyflow_core::{
    Answer, AnswerValue, FlowDeterminant, Question, QuestionId, QuestionKind, ResolutionSource,
    ResponseId, Survey, SurveyId,
};

use crate::SurveyStorage;

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "survey", "snapshot", "version").
    pub category: String,
    /// Test name (e.g. "response_version_starts_at_zero").
    pub name: String,
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        let (passed, message) = match result {
            Ok(()) => (true, None),
            Err(msg) => (false, Some(msg)),
        };
        TestResult {
            category: category.to_string(),
            name: name.to_string(),
            passed,
            message,
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in self.results.iter().filter(|r| !r.passed) {
            writeln!(
                f,
                "  FAIL [{}/{}]: {}",
                r.category,
                r.name,
                r.message.as_deref().unwrap_or("(no message)")
            )?;
        }
        Ok(())
    }
}

/// Run the full conformance suite against a storage backend.
///
/// `factory` is called once per test so every test starts from empty storage.
pub async fn run_conformance_suite<S, F, Fut>(factory: F) -> ConformanceReport
where
    S: SurveyStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.extend(survey::run_survey_tests(&factory).await);
    results.extend(error::run_error_tests(&factory).await);
    results.extend(snapshot::run_snapshot_tests(&factory).await);
    results.extend(commit::run_commit_tests(&factory).await);
    results.extend(version::run_version_tests(&factory).await);

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn qid(n: u64) -> QuestionId {
    QuestionId::new(n).unwrap_or(QuestionId::MIN)
}

/// Two free-text questions, the second ending the survey.
fn sample_survey(id: u64) -> Survey {
    Survey::new(
        SurveyId(id),
        format!("survey {id}"),
        vec![
            Question::new(qid(1), 0, QuestionKind::FreeText, "first"),
            Question::new(qid(2), 1, QuestionKind::FreeText, "second")
                .with_default_flow(FlowDeterminant::End),
        ],
    )
}

fn sample_answer(question: u64, text: &str) -> Answer {
    Answer {
        question_id: qid(question),
        value: AnswerValue::Text(text.to_string()),
        determinant: FlowDeterminant::End,
        source: ResolutionSource::QuestionDefault,
        answered_at: "2025-01-01T00:00:30Z".to_string(),
    }
}

async fn seed_survey<S: SurveyStorage>(s: &S, survey: Survey) -> Result<(), String> {
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.save_survey(&mut snap, survey)
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())
}

/// Seed a survey and one committed response to it.
async fn seed_response<S: SurveyStorage>(s: &S, survey_id: u64) -> Result<ResponseId, String> {
    seed_survey(s, sample_survey(survey_id)).await?;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let response = s
        .create_response(&mut snap, SurveyId(survey_id), "respondent", "2025-01-01T00:00:00Z")
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;
    Ok(response.id)
}
