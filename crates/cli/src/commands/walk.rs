//! `surveyflow walk`: activate a survey in an in-memory store and drive one
//! scripted respondent through it with the real engine.

use std::path::Path;
use std::process;

use serde::Serialize;
use surveyflow_core::{
    AnswerValue, FlowDeterminant, QuestionId, ResolutionSource, Response, Survey, ValidationReport,
};
use surveyflow_engine::{EngineConfig, EngineError, FlowEngine, NextQuestion};
use surveyflow_storage::MemoryStorage;

use super::validate::print_report;
use crate::config::CliConfig;
use crate::input::{read_survey, AnswerScript};
use crate::{fail, print_json, OutputFormat};

const RESPONDENT: &str = "surveyflow-cli";

#[derive(Serialize)]
struct WalkStep {
    question: QuestionId,
    answer: AnswerValue,
    determinant: FlowDeterminant,
    source: ResolutionSource,
}

#[derive(Serialize)]
struct WalkOutput {
    activation: ValidationReport,
    steps: Vec<WalkStep>,
    response: Response,
}

enum WalkFailure {
    Engine(EngineError),
    Answer(String),
}

impl From<EngineError> for WalkFailure {
    fn from(e: EngineError) -> Self {
        WalkFailure::Engine(e)
    }
}

pub(crate) fn cmd_walk(
    survey_path: &Path,
    answers_path: &Path,
    config: &CliConfig,
    output: OutputFormat,
    quiet: bool,
) {
    let survey = read_survey(survey_path).unwrap_or_else(|msg| fail(&msg, output, quiet));
    let script = AnswerScript::read(answers_path).unwrap_or_else(|msg| fail(&msg, output, quiet));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| fail(&format!("failed to start runtime: {}", e), output, quiet));

    match runtime.block_on(walk(survey, &script, config.engine)) {
        Ok(walked) => match output {
            OutputFormat::Json => print_json(&walked),
            OutputFormat::Text => print_walk(&walked, quiet),
        },
        Err(WalkFailure::Engine(EngineError::ActivationRejected(report))) => {
            match output {
                OutputFormat::Json => print_json(&report),
                OutputFormat::Text => print_report(&report, quiet),
            }
            process::exit(1);
        }
        Err(WalkFailure::Engine(e)) => fail(&e.to_string(), output, quiet),
        Err(WalkFailure::Answer(msg)) => fail(&msg, output, quiet),
    }
}

async fn walk(
    survey: Survey,
    script: &AnswerScript,
    config: EngineConfig,
) -> Result<WalkOutput, WalkFailure> {
    let survey_id = survey.id;
    let engine = FlowEngine::with_config(MemoryStorage::new(), config);
    engine.save_survey(survey.clone()).await?;
    let activation = engine.activate_survey(survey_id).await?;
    let response = engine.start_response(survey_id, RESPONDENT).await?;

    let mut steps = Vec::new();
    while let NextQuestion::Question(id) = engine.next_visible_question(response.id).await? {
        let question = survey.require_question(id).map_err(EngineError::from)?;
        let answer = script.answer_for(question).map_err(WalkFailure::Answer)?;
        let outcome = engine
            .submit_answer(response.id, id, answer.clone())
            .await?;
        steps.push(WalkStep {
            question: id,
            answer,
            determinant: outcome.determinant,
            source: outcome.source,
        });
    }

    Ok(WalkOutput {
        activation,
        steps,
        response: engine.response(response.id).await?,
    })
}

fn print_walk(walked: &WalkOutput, quiet: bool) {
    if !quiet {
        for finding in walked.activation.warnings() {
            println!("warning: {}", finding.message);
        }
    }
    for step in &walked.steps {
        println!("{} = {} -> {}", step.question, step.answer, step.determinant);
        if !quiet {
            println!("  decided by {}", step.source);
        }
    }
    println!(
        "complete: {} question(s) answered",
        walked.response.answers.len()
    );
}
