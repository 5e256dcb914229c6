//! Runtime reachability, including sequential fallback.
//!
//! Unlike the cycle and terminal checks this walks the resolver's read model,
//! so it sees what a respondent can actually be shown. Its results are
//! findings only and never block activation.

use std::collections::{BTreeSet, VecDeque};

use crate::answer::ResolutionSource;
use crate::model::{QuestionId, Routing, Survey};
use crate::report::{Finding, FindingSeverity};
use crate::resolve::FlowResolver;

pub(super) fn reachability_findings(survey: &Survey) -> Vec<Finding> {
    let mut findings = Vec::new();
    let resolver = FlowResolver::new(survey);

    let reachable = reachable_from_first(survey, &resolver);
    for question in survey.ordered_questions() {
        if !reachable.contains(&question.id) {
            findings.push(Finding {
                severity: FindingSeverity::Info,
                question: Some(question.id),
                message: format!(
                    "question {} is never shown on any path from the first question",
                    question.id
                ),
            });
        }
    }

    for question in survey.ordered_questions() {
        if question.routing() != Routing::PerAnswer || question.default_flow.is_decisive() {
            continue;
        }
        let routed = question.options.iter().filter(|o| o.flow.is_decisive()).count();
        if routed == 0 || routed == question.options.len() {
            continue;
        }
        let unrouted: Vec<&str> = question
            .options_in_order()
            .into_iter()
            .filter(|o| !o.flow.is_decisive())
            .map(|o| o.text.as_str())
            .collect();
        let fallback = resolver
            .possible_outcomes(question)
            .into_iter()
            .find(|r| r.source == ResolutionSource::SequentialFallback)
            .map(|r| r.determinant.to_string())
            .unwrap_or_else(|| "the next question".to_string());
        findings.push(Finding {
            severity: FindingSeverity::Warning,
            question: Some(question.id),
            message: format!(
                "question {} routes some options explicitly but not {}; they fall back to {}",
                question.id,
                unrouted
                    .iter()
                    .map(|t| format!("'{}'", t))
                    .collect::<Vec<_>>()
                    .join(", "),
                fallback
            ),
        });
    }

    findings
}

/// Breadth-first walk over every outcome each question can produce.
fn reachable_from_first(survey: &Survey, resolver: &FlowResolver<'_>) -> BTreeSet<QuestionId> {
    let mut reachable = BTreeSet::new();
    let mut queue = VecDeque::new();

    if let Some(first) = survey.first_question() {
        reachable.insert(first.id);
        queue.push_back(first.id);
    }

    while let Some(id) = queue.pop_front() {
        let Some(question) = survey.question(id) else {
            continue;
        };
        for resolution in resolver.possible_outcomes(question) {
            if let Some(next) = resolution.determinant.target() {
                if survey.contains(next) && reachable.insert(next) {
                    queue.push_back(next);
                }
            }
        }
    }

    reachable
}
