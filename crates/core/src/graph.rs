//! The validator's read model: explicit `GoTo` links only.
//!
//! Sequential fallback never contributes an edge. It always advances to a
//! strictly larger order index, so any cycle must go through at least one
//! explicit edge, and every explicit edge is in this graph.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::determinant::FlowDeterminant;
use crate::model::{Question, QuestionId, Routing, Survey};

/// Which configuration slot an edge or terminal came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EdgeOrigin {
    Option { order_index: u32 },
    QuestionDefault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlowEdge {
    pub from: QuestionId,
    pub to: QuestionId,
    pub origin: EdgeOrigin,
}

/// A question or option explicitly configured with `End`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TerminalCandidate {
    pub question: QuestionId,
    pub origin: EdgeOrigin,
}

#[derive(Debug, Clone)]
pub struct FlowGraph {
    nodes: Vec<QuestionId>,
    edges: BTreeMap<QuestionId, Vec<FlowEdge>>,
    terminals: Vec<TerminalCandidate>,
}

impl FlowGraph {
    /// Build the explicit-edge graph of one survey. Nodes are kept in display
    /// order and each node's edges in option order, so traversals are
    /// deterministic.
    pub fn build(survey: &Survey) -> Self {
        let mut nodes = Vec::with_capacity(survey.questions.len());
        let mut edges = BTreeMap::new();
        let mut terminals = Vec::new();

        for question in survey.ordered_questions() {
            nodes.push(question.id);
            let mut out = Vec::new();
            collect_question(question, &mut out, &mut terminals);
            edges.insert(question.id, out);
        }

        FlowGraph {
            nodes,
            edges,
            terminals,
        }
    }

    pub fn nodes(&self) -> &[QuestionId] {
        &self.nodes
    }

    pub fn contains(&self, id: QuestionId) -> bool {
        self.edges.contains_key(&id)
    }

    pub fn edges_from(&self, id: QuestionId) -> &[FlowEdge] {
        self.edges.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn edges(&self) -> impl Iterator<Item = &FlowEdge> + '_ {
        self.nodes.iter().flat_map(move |id| self.edges_from(*id).iter())
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    pub fn terminal_candidates(&self) -> &[TerminalCandidate] {
        &self.terminals
    }
}

fn collect_question(
    question: &Question,
    edges: &mut Vec<FlowEdge>,
    terminals: &mut Vec<TerminalCandidate>,
) {
    let mut record = |flow: FlowDeterminant, origin: EdgeOrigin| match flow {
        FlowDeterminant::GoTo(to) => edges.push(FlowEdge {
            from: question.id,
            to,
            origin,
        }),
        FlowDeterminant::End => terminals.push(TerminalCandidate {
            question: question.id,
            origin,
        }),
        FlowDeterminant::Unset => {}
    };

    match question.routing() {
        Routing::PerAnswer => {
            for option in question.options_in_order() {
                record(
                    option.flow,
                    EdgeOrigin::Option {
                        order_index: option.order_index,
                    },
                );
            }
            if question.default_flow.is_end() || default_reachable(question) {
                record(question.default_flow, EdgeOrigin::QuestionDefault);
            }
        }
        Routing::QuestionDefault => record(question.default_flow, EdgeOrigin::QuestionDefault),
    }
}

/// A branching question falls through to its default when some option is
/// left unconfigured, or when it may be skipped.
fn default_reachable(question: &Question) -> bool {
    !question.required || question.options.iter().any(|o| !o.flow.is_decisive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionKind, QuestionOption, SurveyId};

    fn q(n: u64) -> QuestionId {
        QuestionId::new(n).unwrap()
    }

    #[test]
    fn branching_question_contributes_one_edge_per_goto_option() {
        let question = Question::new(q(1), 0, QuestionKind::SingleChoice, "?").with_options(vec![
            QuestionOption::new(0, "a").with_flow(FlowDeterminant::GoTo(q(2))),
            QuestionOption::new(1, "b").with_flow(FlowDeterminant::GoTo(q(3))),
            QuestionOption::new(2, "c").with_flow(FlowDeterminant::End),
        ]);
        let survey = Survey::new(SurveyId(1), "s", vec![question]);
        let graph = FlowGraph::build(&survey);

        let targets: Vec<QuestionId> = graph.edges_from(q(1)).iter().map(|e| e.to).collect();
        assert_eq!(targets, vec![q(2), q(3)]);
        assert_eq!(graph.terminal_candidates().len(), 1);
        assert_eq!(
            graph.terminal_candidates()[0].origin,
            EdgeOrigin::Option { order_index: 2 }
        );
    }

    #[test]
    fn unset_and_fallback_contribute_nothing() {
        let survey = Survey::new(
            SurveyId(1),
            "linear",
            vec![
                Question::new(q(1), 0, QuestionKind::FreeText, "a"),
                Question::new(q(2), 1, QuestionKind::FreeText, "b"),
            ],
        );
        let graph = FlowGraph::build(&survey);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.terminal_candidates().is_empty());
        assert_eq!(graph.nodes(), &[q(1), q(2)]);
    }

    #[test]
    fn branching_default_counts_only_when_reachable() {
        let fully_routed = Question::new(q(1), 0, QuestionKind::SingleChoice, "?")
            .with_options(vec![QuestionOption::new(0, "a").with_flow(FlowDeterminant::End)])
            .with_default_flow(FlowDeterminant::GoTo(q(1)));
        let survey = Survey::new(SurveyId(1), "s", vec![fully_routed.clone()]);
        assert_eq!(FlowGraph::build(&survey).edge_count(), 0);

        let mut partly_routed = fully_routed;
        partly_routed.options.push(QuestionOption::new(1, "b"));
        let survey = Survey::new(SurveyId(1), "s", vec![partly_routed]);
        let graph = FlowGraph::build(&survey);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edges_from(q(1))[0].origin, EdgeOrigin::QuestionDefault);
    }

    #[test]
    fn non_branching_default_edge() {
        let survey = Survey::new(
            SurveyId(1),
            "s",
            vec![
                Question::new(q(1), 0, QuestionKind::FreeText, "a")
                    .with_default_flow(FlowDeterminant::GoTo(q(2))),
                Question::new(q(2), 1, QuestionKind::FreeText, "b")
                    .with_default_flow(FlowDeterminant::End),
            ],
        );
        let graph = FlowGraph::build(&survey);
        assert_eq!(graph.edges().count(), 1);
        assert_eq!(graph.terminal_candidates()[0].question, q(2));
    }
}
