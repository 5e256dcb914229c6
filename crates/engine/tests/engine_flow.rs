use surveyflow_core::{
    AnswerValue, FlowDeterminant, FlowError, Question, QuestionId, QuestionKind, QuestionOption,
    ResolutionSource, Survey, SurveyId, SurveyStatus, ValidationOutcome,
};
use surveyflow_engine::{EngineConfig, EngineError, FlowEngine, NextQuestion};
use surveyflow_storage::{MemoryStorage, SurveyStorage};

fn q(n: u64) -> QuestionId {
    QuestionId::new(n).unwrap()
}

fn text(s: &str) -> AnswerValue {
    AnswerValue::Text(s.to_string())
}

fn choice(s: &str) -> AnswerValue {
    AnswerValue::Choice(s.to_string())
}

/// Q1 "Yes" skips to Q3, "No" ends; Q2 and Q3 are free text, Q3 ends.
fn branching_survey() -> Survey {
    Survey::new(
        SurveyId(1),
        "feedback",
        vec![
            Question::new(q(1), 0, QuestionKind::SingleChoice, "Continue?").with_options(vec![
                QuestionOption::new(0, "Yes").with_flow(FlowDeterminant::GoTo(q(3))),
                QuestionOption::new(1, "No").with_flow(FlowDeterminant::End),
            ]),
            Question::new(q(2), 1, QuestionKind::FreeText, "Why?"),
            Question::new(q(3), 2, QuestionKind::FreeText, "Anything else?")
                .with_default_flow(FlowDeterminant::End),
        ],
    )
}

async fn active_engine(survey: Survey) -> FlowEngine<MemoryStorage> {
    let engine = FlowEngine::new(MemoryStorage::new());
    let id = survey.id;
    engine.save_survey(survey).await.unwrap();
    engine.activate_survey(id).await.unwrap();
    engine
}

#[tokio::test]
async fn walks_branching_survey_to_completion() {
    let engine = active_engine(branching_survey()).await;
    let response = engine.start_response(SurveyId(1), "alice").await.unwrap();

    assert_eq!(
        engine.next_visible_question(response.id).await.unwrap(),
        NextQuestion::Question(q(1))
    );
    let outcome = engine
        .submit_answer(response.id, q(1), choice("Yes"))
        .await
        .unwrap();
    assert_eq!(outcome.determinant, FlowDeterminant::GoTo(q(3)));
    assert_eq!(outcome.source, ResolutionSource::Option { order_index: 0 });
    assert_eq!(outcome.response, engine.response(response.id).await.unwrap());

    assert_eq!(
        engine.next_visible_question(response.id).await.unwrap(),
        NextQuestion::Question(q(3))
    );
    engine
        .submit_answer(response.id, q(3), text("no"))
        .await
        .unwrap();
    assert_eq!(
        engine.next_visible_question(response.id).await.unwrap(),
        NextQuestion::SurveyComplete
    );

    let stored = engine.response(response.id).await.unwrap();
    assert!(stored.complete);
    assert!(stored.submitted_at.is_some());
    assert!(!stored.has_visited(q(2)));
    assert_eq!(stored.answers.len(), 2);
}

#[tokio::test]
async fn pending_question_is_shown_again() {
    let engine = active_engine(branching_survey()).await;
    let response = engine.start_response(SurveyId(1), "bob").await.unwrap();

    let first = engine.next_visible_question(response.id).await.unwrap();
    let again = engine.next_visible_question(response.id).await.unwrap();
    assert_eq!(first, again);
    assert_eq!(engine.response(response.id).await.unwrap().visited.len(), 1);
}

#[tokio::test]
async fn invalid_answer_leaves_response_untouched() {
    let engine = active_engine(branching_survey()).await;
    let response = engine.start_response(SurveyId(1), "carol").await.unwrap();
    engine.next_visible_question(response.id).await.unwrap();
    let before = engine.response(response.id).await.unwrap();

    let err = engine
        .submit_answer(response.id, q(1), choice("Maybe"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Flow(FlowError::InvalidAnswer { .. })
    ));
    assert_eq!(engine.response(response.id).await.unwrap(), before);
}

#[tokio::test]
async fn unknown_question_is_rejected() {
    let engine = active_engine(branching_survey()).await;
    let response = engine.start_response(SurveyId(1), "dan").await.unwrap();

    let err = engine
        .submit_answer(response.id, q(99), text("?"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Flow(FlowError::UnknownQuestion { question, .. }) if question == q(99)
    ));
}

#[tokio::test]
async fn only_the_question_on_screen_can_be_answered() {
    let engine = active_engine(branching_survey()).await;
    let response = engine.start_response(SurveyId(1), "nia").await.unwrap();

    let err = engine
        .submit_answer(response.id, q(1), choice("Yes"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Flow(FlowError::QuestionNotShown { question }) if question == q(1)
    ));

    assert_eq!(
        engine.next_visible_question(response.id).await.unwrap(),
        NextQuestion::Question(q(1))
    );
    let before = engine.response(response.id).await.unwrap();

    // Q2 is off the branch; answering it must not move the flow.
    let err = engine
        .submit_answer(response.id, q(2), text("sneaky"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Flow(FlowError::QuestionNotShown { question }) if question == q(2)
    ));
    assert_eq!(engine.response(response.id).await.unwrap(), before);
    assert_eq!(
        engine.next_visible_question(response.id).await.unwrap(),
        NextQuestion::Question(q(1))
    );
}

#[tokio::test]
async fn skipped_question_cannot_be_answered_later() {
    let engine = active_engine(branching_survey()).await;
    let response = engine.start_response(SurveyId(1), "oli").await.unwrap();

    // Q1 was shown and left unanswered, then Q3 went on screen.
    let storage = engine.storage();
    let mut snap = storage.begin_snapshot().await.unwrap();
    let mut staged = storage
        .load_response_for_update(&mut snap, response.id)
        .await
        .unwrap();
    staged.record_visited(q(1));
    staged.record_visited(q(3));
    storage
        .persist_response_state(&mut snap, &staged)
        .await
        .unwrap();
    storage.commit_snapshot(snap).await.unwrap();

    let err = engine
        .submit_answer(response.id, q(1), choice("No"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Flow(FlowError::QuestionAlreadyVisited { question }) if question == q(1)
    ));
    engine
        .submit_answer(response.id, q(3), text("fine"))
        .await
        .unwrap();
}

#[tokio::test]
async fn answer_can_be_revised_until_superseded() {
    let engine = active_engine(branching_survey()).await;
    let response = engine.start_response(SurveyId(1), "erin").await.unwrap();
    engine.next_visible_question(response.id).await.unwrap();

    engine
        .submit_answer(response.id, q(1), choice("No"))
        .await
        .unwrap();
    let revised = engine
        .submit_answer(response.id, q(1), choice("Yes"))
        .await
        .unwrap();
    assert_eq!(revised.determinant, FlowDeterminant::GoTo(q(3)));
    assert_eq!(revised.response.answers.len(), 1);

    engine.next_visible_question(response.id).await.unwrap();
    let err = engine
        .submit_answer(response.id, q(1), choice("No"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Flow(FlowError::QuestionAlreadyAnswered { .. })
    ));
}

#[tokio::test]
async fn revision_can_be_disabled() {
    let engine = FlowEngine::with_config(
        MemoryStorage::new(),
        EngineConfig {
            allow_answer_revision: false,
            ..EngineConfig::default()
        },
    );
    engine.save_survey(branching_survey()).await.unwrap();
    engine.activate_survey(SurveyId(1)).await.unwrap();
    let response = engine.start_response(SurveyId(1), "fay").await.unwrap();
    engine.next_visible_question(response.id).await.unwrap();

    engine
        .submit_answer(response.id, q(1), choice("No"))
        .await
        .unwrap();
    let err = engine
        .submit_answer(response.id, q(1), choice("Yes"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Flow(FlowError::QuestionAlreadyAnswered { .. })
    ));
}

#[tokio::test]
async fn completed_response_rejects_answers() {
    let engine = active_engine(branching_survey()).await;
    let response = engine.start_response(SurveyId(1), "gus").await.unwrap();
    engine.next_visible_question(response.id).await.unwrap();
    engine
        .submit_answer(response.id, q(1), choice("No"))
        .await
        .unwrap();
    assert_eq!(
        engine.next_visible_question(response.id).await.unwrap(),
        NextQuestion::SurveyComplete
    );

    let err = engine
        .submit_answer(response.id, q(3), text("late"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ResponseComplete { .. }));
}

#[tokio::test]
async fn frozen_determinant_wins_over_later_edits() {
    let engine = active_engine(branching_survey()).await;
    let response = engine.start_response(SurveyId(1), "hal").await.unwrap();
    engine.next_visible_question(response.id).await.unwrap();
    engine
        .submit_answer(response.id, q(1), choice("Yes"))
        .await
        .unwrap();

    // Re-route "Yes" to the end while the survey has no other respondents.
    let mut edited = branching_survey();
    edited.questions[0].options[0].flow = FlowDeterminant::End;
    let mut snap = engine.storage().begin_snapshot().await.unwrap();
    engine
        .storage()
        .save_survey(&mut snap, Survey {
            status: SurveyStatus::Active,
            ..edited
        })
        .await
        .unwrap();
    engine.storage().commit_snapshot(snap).await.unwrap();

    assert_eq!(
        engine.next_visible_question(response.id).await.unwrap(),
        NextQuestion::Question(q(3))
    );
}

#[tokio::test]
async fn frozen_target_missing_from_survey_is_reported() {
    let engine = active_engine(branching_survey()).await;
    let response = engine.start_response(SurveyId(1), "ivy").await.unwrap();
    engine.next_visible_question(response.id).await.unwrap();
    engine
        .submit_answer(response.id, q(1), choice("Yes"))
        .await
        .unwrap();

    let mut edited = branching_survey();
    edited.status = SurveyStatus::Active;
    edited.questions.retain(|question| question.id != q(3));
    let mut snap = engine.storage().begin_snapshot().await.unwrap();
    engine.storage().save_survey(&mut snap, edited).await.unwrap();
    engine.storage().commit_snapshot(snap).await.unwrap();

    let err = engine.next_visible_question(response.id).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Flow(FlowError::QuestionNotInSurvey { question, .. }) if question == q(3)
    ));
}

#[tokio::test]
async fn revisiting_a_question_is_refused() {
    // Q2 routes back to Q1. Stored directly, bypassing activation, to
    // exercise the runtime guard on its own.
    let survey = Survey {
        status: SurveyStatus::Active,
        ..Survey::new(
            SurveyId(2),
            "loop",
            vec![
                Question::new(q(1), 0, QuestionKind::FreeText, "a"),
                Question::new(q(2), 1, QuestionKind::FreeText, "b")
                    .with_default_flow(FlowDeterminant::GoTo(q(1))),
            ],
        )
    };
    let engine = FlowEngine::new(MemoryStorage::with_surveys([survey]));
    let response = engine.start_response(SurveyId(2), "jo").await.unwrap();

    for question in [q(1), q(2)] {
        assert_eq!(
            engine.next_visible_question(response.id).await.unwrap(),
            NextQuestion::Question(question)
        );
        engine
            .submit_answer(response.id, question, text("x"))
            .await
            .unwrap();
    }
    let err = engine.next_visible_question(response.id).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Flow(FlowError::QuestionAlreadyVisited { question }) if question == q(1)
    ));
}

// ──────────────────────────────────────────────
// Survey lifecycle
// ──────────────────────────────────────────────

#[tokio::test]
async fn cyclic_survey_cannot_be_activated() {
    let survey = Survey::new(
        SurveyId(3),
        "cycle",
        vec![
            Question::new(q(1), 0, QuestionKind::FreeText, "a")
                .with_default_flow(FlowDeterminant::GoTo(q(2))),
            Question::new(q(2), 1, QuestionKind::FreeText, "b")
                .with_default_flow(FlowDeterminant::GoTo(q(1))),
        ],
    );
    let engine = FlowEngine::new(MemoryStorage::new());
    engine.save_survey(survey).await.unwrap();

    let err = engine.activate_survey(SurveyId(3)).await.unwrap_err();
    let report = err.report().expect("validation report");
    assert!(matches!(
        report.outcome,
        ValidationOutcome::CycleDetected { .. }
    ));

    let stored = engine.storage().load_survey_graph(SurveyId(3)).await.unwrap();
    assert_eq!(stored.status, SurveyStatus::Draft);
}

#[tokio::test]
async fn lenient_config_activates_without_explicit_end() {
    let survey = Survey::new(
        SurveyId(4),
        "implicit end",
        vec![Question::new(q(1), 0, QuestionKind::FreeText, "a")],
    );
    let engine = FlowEngine::with_config(
        MemoryStorage::new(),
        EngineConfig {
            require_explicit_end: false,
            ..EngineConfig::default()
        },
    );
    engine.save_survey(survey).await.unwrap();

    let report = engine.activate_survey(SurveyId(4)).await.unwrap();
    assert!(report.is_ok());
    assert_eq!(report.warnings().count(), 1);
}

#[tokio::test]
async fn draft_survey_refuses_responses() {
    let engine = FlowEngine::new(MemoryStorage::new());
    engine.save_survey(branching_survey()).await.unwrap();

    let err = engine.start_response(SurveyId(1), "kim").await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::SurveyNotActive {
            status: SurveyStatus::Draft,
            ..
        }
    ));
}

#[tokio::test]
async fn live_survey_with_answers_is_locked() {
    let engine = active_engine(branching_survey()).await;
    let response = engine.start_response(SurveyId(1), "lee").await.unwrap();

    // A started response without answers does not lock the survey.
    engine.save_survey(branching_survey()).await.unwrap();

    engine.next_visible_question(response.id).await.unwrap();
    engine
        .submit_answer(response.id, q(1), choice("Yes"))
        .await
        .unwrap();
    let err = engine.save_survey(branching_survey()).await.unwrap_err();
    assert!(matches!(err, EngineError::SurveyLocked { answered: 1, .. }));

    engine.deactivate_survey(SurveyId(1)).await.unwrap();
    engine.save_survey(branching_survey()).await.unwrap();
}

#[tokio::test]
async fn closed_survey_stays_closed() {
    let engine = active_engine(branching_survey()).await;
    engine.close_survey(SurveyId(1)).await.unwrap();

    assert!(matches!(
        engine.activate_survey(SurveyId(1)).await.unwrap_err(),
        EngineError::StatusTransition { .. }
    ));
    assert!(matches!(
        engine.close_survey(SurveyId(1)).await.unwrap_err(),
        EngineError::StatusTransition { .. }
    ));
    assert!(matches!(
        engine.start_response(SurveyId(1), "max").await.unwrap_err(),
        EngineError::SurveyNotActive { .. }
    ));
}

#[tokio::test]
async fn validate_for_activation_reports_without_changing_status() {
    let engine = FlowEngine::new(MemoryStorage::new());
    engine.save_survey(branching_survey()).await.unwrap();

    let report = engine.validate_for_activation(SurveyId(1)).await.unwrap();
    assert!(report.is_ok());
    let stored = engine.storage().load_survey_graph(SurveyId(1)).await.unwrap();
    assert_eq!(stored.status, SurveyStatus::Draft);
}

#[tokio::test]
async fn preview_does_not_record() {
    let engine = active_engine(branching_survey()).await;
    let resolution = engine
        .preview_answer(SurveyId(1), q(1), &choice("No"))
        .await
        .unwrap();
    assert_eq!(resolution.determinant, FlowDeterminant::End);
    assert_eq!(engine.storage().count_responses(SurveyId(1)).await.unwrap(), 0);
}
