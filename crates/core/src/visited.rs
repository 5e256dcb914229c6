//! Per-response record of questions already shown to the respondent.
//!
//! The guard is independent of the graph validator: a survey may be edited
//! and re-activated while responses are mid-flight, and answers resolved
//! under the old configuration can still point at questions the respondent
//! has already seen.

use serde::{Deserialize, Serialize};

use crate::error::FlowError;
use crate::model::QuestionId;

/// Question identifiers in first-visit order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisitedSet {
    order: Vec<QuestionId>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_visited(&self, question: QuestionId) -> bool {
        self.order.contains(&question)
    }

    /// Record a visit. Returns `false` when the question was already present.
    pub fn record_visited(&mut self, question: QuestionId) -> bool {
        if self.has_visited(question) {
            return false;
        }
        self.order.push(question);
        true
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    /// Fail with `QuestionAlreadyVisited` if the question appeared before.
    pub fn ensure_unvisited(&self, question: QuestionId) -> Result<(), FlowError> {
        if self.has_visited(question) {
            return Err(FlowError::QuestionAlreadyVisited { question });
        }
        Ok(())
    }

    /// Most recently first-visited question.
    pub fn last(&self) -> Option<QuestionId> {
        self.order.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = QuestionId> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(n: u64) -> QuestionId {
        QuestionId::new(n).unwrap()
    }

    #[test]
    fn records_in_first_visit_order() {
        let mut visited = VisitedSet::new();
        assert!(visited.record_visited(q(3)));
        assert!(visited.record_visited(q(1)));
        assert!(!visited.record_visited(q(3)));
        assert_eq!(visited.iter().collect::<Vec<_>>(), vec![q(3), q(1)]);
        assert_eq!(visited.last(), Some(q(1)));
    }

    #[test]
    fn ensure_unvisited_rejects_repeats() {
        let mut visited = VisitedSet::new();
        visited.record_visited(q(2));
        assert_eq!(
            visited.ensure_unvisited(q(2)),
            Err(FlowError::QuestionAlreadyVisited { question: q(2) })
        );
        assert!(visited.ensure_unvisited(q(5)).is_ok());
    }

    #[test]
    fn clear_forgets_everything() {
        let mut visited = VisitedSet::new();
        visited.record_visited(q(1));
        visited.clear();
        assert!(visited.is_empty());
        assert!(!visited.has_visited(q(1)));
    }
}
