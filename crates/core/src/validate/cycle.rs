//! Three-color depth-first search over the explicit-edge graph.

use std::collections::HashMap;

use crate::graph::FlowGraph;
use crate::model::QuestionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Unvisited,
    InProgress,
    Done,
}

/// Find a directed cycle. The returned path starts at the cycle's entry
/// point and ends with it again, e.g. `[Q1, Q2, Q1]`.
///
/// Roots are tried in display order, so the first cycle reported is stable
/// for a given survey. Edges to questions outside the graph are ignored here.
pub(super) fn find_cycle(graph: &FlowGraph) -> Option<Vec<QuestionId>> {
    let mut color: HashMap<QuestionId, Color> = graph
        .nodes()
        .iter()
        .map(|id| (*id, Color::Unvisited))
        .collect();
    let mut path: Vec<QuestionId> = Vec::new();

    for &root in graph.nodes() {
        if color.get(&root) == Some(&Color::Unvisited) {
            if let Some(cycle) = visit(root, graph, &mut color, &mut path) {
                return Some(cycle);
            }
        }
    }
    None
}

fn visit(
    node: QuestionId,
    graph: &FlowGraph,
    color: &mut HashMap<QuestionId, Color>,
    path: &mut Vec<QuestionId>,
) -> Option<Vec<QuestionId>> {
    color.insert(node, Color::InProgress);
    path.push(node);

    for edge in graph.edges_from(node) {
        match color.get(&edge.to).copied() {
            Some(Color::InProgress) => {
                if let Some(start) = path.iter().position(|&n| n == edge.to) {
                    let mut cycle = path[start..].to_vec();
                    cycle.push(edge.to);
                    return Some(cycle);
                }
            }
            Some(Color::Unvisited) => {
                if let Some(cycle) = visit(edge.to, graph, color, path) {
                    return Some(cycle);
                }
            }
            Some(Color::Done) | None => {}
        }
    }

    path.pop();
    color.insert(node, Color::Done);
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::determinant::FlowDeterminant;
    use crate::model::{Question, QuestionKind, Survey, SurveyId};

    fn q(n: u64) -> QuestionId {
        QuestionId::new(n).unwrap()
    }

    fn text(id: u64, order: u32, flow: FlowDeterminant) -> Question {
        Question::new(q(id), order, QuestionKind::FreeText, "t").with_default_flow(flow)
    }

    #[test]
    fn self_loop() {
        let survey = Survey::new(SurveyId(1), "s", vec![text(1, 0, FlowDeterminant::GoTo(q(1)))]);
        assert_eq!(find_cycle(&FlowGraph::build(&survey)), Some(vec![q(1), q(1)]));
    }

    #[test]
    fn cycle_path_starts_at_entry_point() {
        // Q1 -> Q2 -> Q3 -> Q2: the cycle is entered at Q2.
        let survey = Survey::new(
            SurveyId(1),
            "s",
            vec![
                text(1, 0, FlowDeterminant::GoTo(q(2))),
                text(2, 1, FlowDeterminant::GoTo(q(3))),
                text(3, 2, FlowDeterminant::GoTo(q(2))),
            ],
        );
        assert_eq!(
            find_cycle(&FlowGraph::build(&survey)),
            Some(vec![q(2), q(3), q(2)])
        );
    }

    #[test]
    fn diamond_is_acyclic() {
        // Q1 -> Q3, Q2 -> Q3, Q1 -> Q2: Q3 is reached twice but never re-entered.
        let survey = Survey::new(
            SurveyId(1),
            "s",
            vec![
                text(1, 0, FlowDeterminant::GoTo(q(2))),
                text(2, 1, FlowDeterminant::GoTo(q(3))),
                text(3, 2, FlowDeterminant::End),
                text(4, 3, FlowDeterminant::GoTo(q(3))),
            ],
        );
        assert_eq!(find_cycle(&FlowGraph::build(&survey)), None);
    }

    #[test]
    fn dangling_edges_are_ignored() {
        let survey = Survey::new(SurveyId(1), "s", vec![text(1, 0, FlowDeterminant::GoTo(q(9)))]);
        assert_eq!(find_cycle(&FlowGraph::build(&survey)), None);
    }
}
