//! Turning raw generated text into typed fields.
//!
//! Three modes, one per prompt kind:
//! - [`parse_qa`] for "Question: ... Answer: ..." responses
//! - [`parse_knowledge_point`] for single-sentence summaries
//! - [`extract_choice_question`] for single-choice question stems
//!
//! All functions are pure and never fail on odd input; callers decide what an
//! empty field means.

use crate::ParseError;
use serde::{Deserialize, Serialize};

const QUESTION_MARKER: &str = "Question:";
const ANSWER_MARKER: &str = "Answer:";

/// Boilerplate lead-ins models put before a knowledge point. Matched in order,
/// case-insensitively, at most one is removed.
pub const KNOWLEDGE_PREFIXES: [&str; 6] = [
    "the key knowledge point is ",
    "the key knowledge is ",
    "key knowledge: ",
    "knowledge point: ",
    "the main concept is ",
    "the core concept is ",
];

/// Question/answer pair extracted from a QA response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

/// Raw QA extraction. Fields may come back empty.
///
/// When both markers are present the text between them is used. Otherwise
/// falls back to scanning for lines that start with a marker.
pub fn extract_qa(text: &str) -> QaPair {
    if text.contains(QUESTION_MARKER) && text.contains(ANSWER_MARKER) {
        let question = text
            .split(QUESTION_MARKER)
            .nth(1)
            .and_then(|segment| segment.split(ANSWER_MARKER).next())
            .unwrap_or_default()
            .trim();
        let answer = text.split(ANSWER_MARKER).nth(1).unwrap_or_default().trim();
        return QaPair {
            question: question.to_string(),
            answer: answer.to_string(),
        };
    }

    QaPair {
        question: labelled_line(text, QUESTION_MARKER),
        answer: labelled_line(text, ANSWER_MARKER),
    }
}

fn labelled_line(text: &str, marker: &str) -> String {
    text.split('\n')
        .find(|line| line.starts_with(marker))
        .map(|line| line.replace(marker, "").trim().to_string())
        .unwrap_or_default()
}

/// Extract a QA pair, failing if either side is empty.
pub fn parse_qa(text: &str) -> Result<QaPair, ParseError> {
    let pair = extract_qa(text);
    let mut missing = Vec::new();
    if pair.question.is_empty() {
        missing.push("question");
    }
    if pair.answer.is_empty() {
        missing.push("answer");
    }
    if missing.is_empty() {
        Ok(pair)
    } else {
        Err(ParseError::MissingFields { fields: missing })
    }
}

/// Normalize a knowledge-point response.
///
/// Returns an empty string when nothing is left after cleanup.
pub fn parse_knowledge_point(text: &str) -> String {
    let mut point = text.trim();

    for prefix in KNOWLEDGE_PREFIXES {
        let matches = point
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix));
        if matches {
            point = point[prefix.len()..].trim();
            break;
        }
    }

    capitalize_first(point)
}

fn capitalize_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Extract the stem of a single-choice question, dropping any option list
/// the model added anyway.
pub fn extract_choice_question(text: &str) -> String {
    let stem = match text.split(QUESTION_MARKER).nth(1) {
        Some(after_marker) => after_marker.trim(),
        None => text.trim(),
    };

    if stem.contains("A)") || stem.contains("a)") {
        let before_upper = stem.split("A)").next().unwrap_or_default();
        before_upper
            .split("a)")
            .next()
            .unwrap_or_default()
            .trim()
            .to_string()
    } else {
        stem.to_string()
    }
}
