//! Activation-time validation of a survey's flow configuration.
//!
//! All checks share one [`FlowGraph`] built from the survey's explicit
//! determinants. They run in a fixed order and the first failure decides the
//! outcome:
//!
//! 1. structure (unique ids and order indices, well-formed options),
//! 2. dangling `GoTo` targets,
//! 3. acyclicity (three-color DFS),
//! 4. at least one explicit `End`.
//!
//! Reachability findings are attached regardless of the outcome.

mod cycle;
mod reachability;

use serde::Deserialize;

use crate::error::FlowError;
use crate::graph::FlowGraph;
use crate::model::Survey;
use crate::report::{render_path, Finding, FindingSeverity, ValidationOutcome, ValidationReport};

/// Validation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValidatorOptions {
    /// Require an explicit `End` somewhere in the survey. When false, a
    /// survey without one is accepted with a warning and ends after its last
    /// question.
    pub require_explicit_end: bool,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        ValidatorOptions {
            require_explicit_end: true,
        }
    }
}

/// Validate with the default (strict) policy.
pub fn validate(survey: &Survey) -> ValidationReport {
    validate_with(survey, ValidatorOptions::default())
}

pub fn validate_with(survey: &Survey, options: ValidatorOptions) -> ValidationReport {
    let graph = FlowGraph::build(survey);
    let mut findings = Vec::new();

    let outcome = match check(survey, &graph) {
        Ok(()) if graph.terminal_candidates().is_empty() => {
            if options.require_explicit_end {
                ValidationOutcome::NoTerminalPath
            } else {
                findings.push(Finding {
                    severity: FindingSeverity::Warning,
                    question: None,
                    message: "no question is explicitly marked as ending the survey; it ends after the last question".to_string(),
                });
                ValidationOutcome::Ok
            }
        }
        Ok(()) => ValidationOutcome::Ok,
        Err(outcome) => outcome,
    };

    if !matches!(outcome, ValidationOutcome::Malformed { .. }) {
        findings.extend(reachability::reachability_findings(survey));
    }

    tracing::debug!(
        survey = %survey.id,
        questions = graph.nodes().len(),
        edges = graph.edge_count(),
        outcome = %outcome,
        "validated survey flow"
    );

    ValidationReport {
        survey: survey.id,
        outcome,
        question_count: graph.nodes().len(),
        edge_count: graph.edge_count(),
        terminal_candidates: graph.terminal_candidates().to_vec(),
        findings,
    }
}

fn check(survey: &Survey, graph: &FlowGraph) -> Result<(), ValidationOutcome> {
    survey.check_structure().map_err(|e| match e {
        FlowError::MalformedSurvey { reason, .. } => ValidationOutcome::Malformed { reason },
        other => ValidationOutcome::Malformed {
            reason: other.to_string(),
        },
    })?;

    if let Some(edge) = graph.edges().find(|e| !graph.contains(e.to)) {
        return Err(ValidationOutcome::DanglingTarget {
            from: edge.from,
            target: edge.to,
            origin: edge.origin,
        });
    }

    if let Some(path) = cycle::find_cycle(graph) {
        return Err(ValidationOutcome::CycleDetected {
            explanation: render_path(&path),
            path,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::determinant::FlowDeterminant;
    use crate::graph::EdgeOrigin;
    use crate::model::{Question, QuestionId, QuestionKind, QuestionOption, SurveyId};

    fn q(n: u64) -> QuestionId {
        QuestionId::new(n).unwrap()
    }

    fn text(id: u64, order: u32) -> Question {
        Question::new(q(id), order, QuestionKind::FreeText, "t")
    }

    #[test]
    fn linear_survey_with_explicit_end_is_ok() {
        let survey = Survey::new(
            SurveyId(1),
            "s",
            vec![
                text(1, 0),
                text(2, 1),
                text(3, 2).with_default_flow(FlowDeterminant::End),
            ],
        );
        let report = validate(&survey);
        assert!(report.is_ok(), "{}", report.outcome);
        assert_eq!(report.terminal_candidates.len(), 1);
        assert!(report.findings.is_empty());
    }

    #[test]
    fn unconfigured_linear_survey_is_rejected_by_default() {
        let survey = Survey::new(SurveyId(1), "s", vec![text(1, 0), text(2, 1)]);
        assert_eq!(validate(&survey).outcome, ValidationOutcome::NoTerminalPath);
    }

    #[test]
    fn lenient_policy_downgrades_missing_end_to_warning() {
        let survey = Survey::new(SurveyId(1), "s", vec![text(1, 0), text(2, 1)]);
        let report = validate_with(
            &survey,
            ValidatorOptions {
                require_explicit_end: false,
            },
        );
        assert!(report.is_ok());
        assert_eq!(report.warnings().count(), 1);
    }

    #[test]
    fn dangling_target_is_reported_before_cycles() {
        let survey = Survey::new(
            SurveyId(1),
            "s",
            vec![
                text(1, 0).with_default_flow(FlowDeterminant::GoTo(q(1))),
                text(2, 1).with_default_flow(FlowDeterminant::GoTo(q(42))),
            ],
        );
        assert_eq!(
            validate(&survey).outcome,
            ValidationOutcome::DanglingTarget {
                from: q(2),
                target: q(42),
                origin: EdgeOrigin::QuestionDefault,
            }
        );
    }

    #[test]
    fn malformed_survey_is_reported() {
        let survey = Survey::new(SurveyId(1), "s", vec![text(1, 0), text(1, 1)]);
        assert!(matches!(
            validate(&survey).outcome,
            ValidationOutcome::Malformed { .. }
        ));
    }

    #[test]
    fn cycle_through_branching_default_is_caught() {
        // Option "b" is unrouted, so Q2 falls through to its default GoTo(Q1).
        let branching = Question::new(q(2), 1, QuestionKind::SingleChoice, "?")
            .with_options(vec![
                QuestionOption::new(0, "a").with_flow(FlowDeterminant::End),
                QuestionOption::new(1, "b"),
            ])
            .with_default_flow(FlowDeterminant::GoTo(q(1)));
        let survey = Survey::new(
            SurveyId(1),
            "s",
            vec![text(1, 0).with_default_flow(FlowDeterminant::GoTo(q(2))), branching],
        );
        match validate(&survey).outcome {
            ValidationOutcome::CycleDetected { path, explanation } => {
                assert_eq!(path, vec![q(1), q(2), q(1)]);
                assert_eq!(explanation, "Q1 \u{2192} Q2 \u{2192} Q1");
            }
            other => panic!("expected cycle, got {other}"),
        }
    }

    #[test]
    fn unreachable_question_is_an_info_finding() {
        let survey = Survey::new(
            SurveyId(1),
            "s",
            vec![
                text(1, 0).with_default_flow(FlowDeterminant::GoTo(q(3))),
                text(2, 1),
                text(3, 2).with_default_flow(FlowDeterminant::End),
            ],
        );
        let report = validate(&survey);
        assert!(report.is_ok());
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].severity, FindingSeverity::Info);
        assert_eq!(report.findings[0].question, Some(q(2)));
    }

    #[test]
    fn partially_routed_options_warn() {
        let branching = Question::new(q(1), 0, QuestionKind::SingleChoice, "?").with_options(vec![
            QuestionOption::new(0, "Yes").with_flow(FlowDeterminant::End),
            QuestionOption::new(1, "No"),
        ]);
        let survey = Survey::new(
            SurveyId(1),
            "s",
            vec![branching, text(2, 1).with_default_flow(FlowDeterminant::End)],
        );
        let report = validate(&survey);
        assert!(report.is_ok());
        let warning = report.warnings().next().expect("warning");
        assert!(warning.message.contains("'No'"));
        assert!(warning.message.contains("go to Q2"));
    }
}
