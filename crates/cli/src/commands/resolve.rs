use std::path::Path;
use serde::Serialize;
use surveyflow_core::{AnswerValue, FlowDeterminant, FlowResolver, QuestionId, ResolutionSource};

use crate::input::{parse_answer, read_survey};
use crate::{fail, print_json, OutputFormat};

#[derive(Serialize)]
struct ResolveOutput {
    question: QuestionId,
    answer: AnswerValue,
    determinant: FlowDeterminant,
    source: ResolutionSource,
}

pub(crate) fn cmd_resolve(
    survey_path: &Path,
    question_id: QuestionId,
    raw_answer: &str,
    output: OutputFormat,
    quiet: bool,
) {
    let survey = read_survey(survey_path).unwrap_or_else(|msg| fail(&msg, output, quiet));
    let question = survey
        .require_question(question_id)
        .unwrap_or_else(|e| fail(&e.to_string(), output, quiet));
    let answer =
        parse_answer(question, raw_answer).unwrap_or_else(|msg| fail(&msg, output, quiet));
    let resolution = FlowResolver::new(&survey)
        .resolve_question(question, &answer)
        .unwrap_or_else(|e| fail(&e.to_string(), output, quiet));

    match output {
        OutputFormat::Json => print_json(&ResolveOutput {
            question: question_id,
            answer,
            determinant: resolution.determinant,
            source: resolution.source,
        }),
        OutputFormat::Text => {
            println!("{} -> {}", question_id, resolution.determinant);
            if !quiet {
                println!("  decided by {}", resolution.source);
            }
        }
    }
}
