//! Response decoder
//!
//! Turns raw completion text into a validated `StudyPackage`. JSON is pulled
//! out of code fences or surrounding prose, checked against the package
//! shape, and every quiz answer is normalised to an in-range option letter.

use serde_json::Value;

use super::types::{QuizItem, StudyPackage};
use crate::error::DecodeError;

/// Extract a JSON object from a response that might contain markdown or other text
///
/// Handles:
/// - ```json code blocks
/// - Plain ``` code blocks
/// - Raw JSON objects, optionally surrounded by prose
pub fn extract_json_object(text: &str) -> Option<&str> {
    if let Some(start) = text.find("```json") {
        let json_start = start + 7;
        if let Some(end) = text[json_start..].find("```") {
            return Some(text[json_start..json_start + end].trim());
        }
    }

    if let Some(start) = text.find("```") {
        let block_start = start + 3;
        let content_start = text[block_start..]
            .find('\n')
            .map(|i| block_start + i + 1)
            .unwrap_or(block_start);
        if let Some(end) = text[content_start..].find("```") {
            let block = text[content_start..content_start + end].trim();
            if block.starts_with('{') {
                return Some(block);
            }
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse and validate a completion into a study package
///
/// The whole response is parsed as JSON first. Fence and prose extraction
/// only run when that fails, so fences quoted inside string values are kept.
pub fn decode_study_package(raw: &str) -> Result<StudyPackage, DecodeError> {
    let value: Value = match serde_json::from_str(raw.trim()) {
        Ok(value) => value,
        Err(_) => {
            let json = extract_json_object(raw).ok_or_else(|| {
                DecodeError::InvalidJson("no JSON object found in response".to_string())
            })?;
            serde_json::from_str(json).map_err(|e| DecodeError::InvalidJson(e.to_string()))?
        }
    };

    if !value.is_object() {
        return Err(DecodeError::Schema(format!(
            "expected a JSON object, got {}",
            json_type_name(&value)
        )));
    }

    let mut package: StudyPackage =
        serde_json::from_value(value).map_err(|e| DecodeError::Schema(e.to_string()))?;

    for (index, item) in package.quiz.iter_mut().enumerate() {
        validate_quiz_item(index, item)?;
    }

    tracing::debug!(
        key_points = package.key_points.len(),
        flashcards = package.flashcards.len(),
        quiz = package.quiz.len(),
        gaps = package.fill_in_the_gaps.len(),
        "Decoded study package"
    );

    Ok(package)
}

/// Checks option count and rewrites `answer` as a bare letter
fn validate_quiz_item(index: usize, item: &mut QuizItem) -> Result<(), DecodeError> {
    if item.options.len() < 2 {
        return Err(DecodeError::Schema(format!(
            "quiz[{}] has {} options, need at least 2",
            index,
            item.options.len()
        )));
    }

    let choice = normalize_answer(&item.answer, &item.options).ok_or_else(|| {
        DecodeError::Schema(format!(
            "quiz[{}] answer {:?} does not name one of its {} options",
            index,
            item.answer,
            item.options.len()
        ))
    })?;

    if let Some(letter) = QuizItem::letter_for(choice) {
        item.answer = letter.to_string();
    }
    Ok(())
}

/// Option index for a model-supplied answer
///
/// A letter in forms like `b`, `B)`, `(C)` or `D. text` wins. Only answers
/// that are not a letter form are matched against the option text.
fn normalize_answer(answer: &str, options: &[String]) -> Option<usize> {
    let answer = answer.trim();

    if let Some(letter) = answer_letter(answer) {
        let choice = (letter as u8 - b'A') as usize;
        return (choice < options.len()).then_some(choice);
    }

    options
        .iter()
        .position(|option| option.trim().eq_ignore_ascii_case(answer))
}

/// Uppercase letter when the answer is a bare or punctuated option letter
fn answer_letter(answer: &str) -> Option<char> {
    let unwrapped = answer.strip_prefix('(').unwrap_or(answer);
    let mut chars = unwrapped.chars();
    let letter = chars.next().filter(char::is_ascii_alphabetic)?;
    match chars.next() {
        None | Some(')') | Some('.') | Some(':') => Some(letter.to_ascii_uppercase()),
        _ => None,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
