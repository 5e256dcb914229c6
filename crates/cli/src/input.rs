//! Reading survey and answer files, and turning raw answers into
//! [`AnswerValue`]s for a given question.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;
use surveyflow_core::{AnswerValue, Question, QuestionId, QuestionKind, Survey};

pub(crate) fn read_survey(path: &Path) -> Result<Survey, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|_| format!("survey file not found: {}", path.display()))?;
    serde_json::from_str(&content)
        .map_err(|e| format!("invalid survey JSON in {}: {}", path.display(), e))
}

/// Scripted answers for `walk`, keyed by question id.
#[derive(Debug, Default)]
pub(crate) struct AnswerScript {
    answers: BTreeMap<QuestionId, Value>,
}

impl AnswerScript {
    /// Parse `{"1": "Yes", "Q3": ["a", "b"], "4": 5, "5": null}`.
    pub(crate) fn from_json(json: &str) -> Result<Self, String> {
        let raw: BTreeMap<String, Value> =
            serde_json::from_str(json).map_err(|e| format!("expected a JSON object: {}", e))?;
        let mut answers = BTreeMap::new();
        for (key, value) in raw {
            let id: QuestionId = key
                .parse()
                .map_err(|_| format!("'{}' is not a question id", key))?;
            answers.insert(id, value);
        }
        Ok(AnswerScript { answers })
    }

    pub(crate) fn read(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| format!("answers file not found: {}", path.display()))?;
        Self::from_json(&content).map_err(|e| format!("invalid answers in {}: {}", path.display(), e))
    }

    /// The scripted answer for `question`; unscripted questions are skipped.
    pub(crate) fn answer_for(&self, question: &Question) -> Result<AnswerValue, String> {
        match self.answers.get(&question.id) {
            Some(value) => answer_from_json(question, value),
            None => Ok(AnswerValue::Skipped),
        }
    }
}

/// Interpret a command-line answer according to the question's type.
/// Empty input means the question was skipped.
pub(crate) fn parse_answer(question: &Question, raw: &str) -> Result<AnswerValue, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(AnswerValue::Skipped);
    }
    match question.kind {
        QuestionKind::FreeText => Ok(AnswerValue::Text(raw.to_string())),
        QuestionKind::SingleChoice => Ok(AnswerValue::Choice(raw.to_string())),
        QuestionKind::MultipleChoice => Ok(AnswerValue::Choices(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )),
        QuestionKind::Rating => raw.parse().map(AnswerValue::Rating).map_err(|_| {
            format!(
                "rating answer for {} must be a whole number, got '{}'",
                question.id, raw
            )
        }),
    }
}

fn answer_from_json(question: &Question, value: &Value) -> Result<AnswerValue, String> {
    match value {
        Value::Null => Ok(AnswerValue::Skipped),
        Value::String(s) => parse_answer(question, s),
        Value::Number(n) => parse_answer(question, &n.to_string()),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    format!("selections for {} must be strings", question.id)
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(AnswerValue::Choices),
        Value::Bool(_) | Value::Object(_) => Err(format!(
            "unsupported answer for {}: {}",
            question.id, value
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surveyflow_core::QuestionOption;

    fn question(kind: QuestionKind) -> Question {
        Question::new(QuestionId::new(2).unwrap(), 0, kind, "?")
            .with_options(vec![QuestionOption::new(0, "a"), QuestionOption::new(1, "b")])
    }

    #[test]
    fn command_line_answers_follow_question_kind() {
        assert_eq!(
            parse_answer(&question(QuestionKind::SingleChoice), "a").unwrap(),
            AnswerValue::Choice("a".into())
        );
        assert_eq!(
            parse_answer(&question(QuestionKind::MultipleChoice), "a, b").unwrap(),
            AnswerValue::Choices(vec!["a".into(), "b".into()])
        );
        assert_eq!(
            parse_answer(&question(QuestionKind::Rating), "4").unwrap(),
            AnswerValue::Rating(4)
        );
        assert_eq!(
            parse_answer(&question(QuestionKind::FreeText), "  ").unwrap(),
            AnswerValue::Skipped
        );
        assert!(parse_answer(&question(QuestionKind::Rating), "four").is_err());
    }

    #[test]
    fn script_accepts_prefixed_ids_and_json_shapes() {
        let script = AnswerScript::from_json(r#"{"Q2": ["a"], "3": 5, "4": null}"#).unwrap();
        let multi = question(QuestionKind::MultipleChoice);
        assert_eq!(
            script.answer_for(&multi).unwrap(),
            AnswerValue::Choices(vec!["a".into()])
        );

        let rating = Question::rating(QuestionId::new(3).unwrap(), 1, "rate", 5);
        assert_eq!(script.answer_for(&rating).unwrap(), AnswerValue::Rating(5));

        let unscripted = Question::new(QuestionId::new(9).unwrap(), 2, QuestionKind::FreeText, "?");
        assert_eq!(script.answer_for(&unscripted).unwrap(), AnswerValue::Skipped);
    }

    #[test]
    fn script_rejects_bad_keys() {
        assert!(AnswerScript::from_json(r#"{"zero": "x"}"#).is_err());
        assert!(AnswerScript::from_json(r#"{"0": "x"}"#).is_err());
    }
}
