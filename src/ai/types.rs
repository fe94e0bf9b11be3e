//! Shared types for study package generation

use serde::{Deserialize, Serialize};

/// The generated study artifact, one per generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPackage {
    pub summary: String,
    pub key_points: Vec<String>,
    pub flashcards: Vec<Flashcard>,
    pub quiz: Vec<QuizItem>,
    pub fill_in_the_gaps: Vec<GapItem>,
    pub exam_questions: Vec<String>,
    pub fun_facts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
}

/// Multiple choice question; `answer` is a letter indexing `options` (A = 0)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizItem {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
    pub explanation: String,
    pub difficulty: String,
}

impl QuizItem {
    /// Option index named by `answer`, if it is a letter within range
    pub fn correct_index(&self) -> Option<usize> {
        let letter = self.answer.chars().next()?;
        if !letter.is_ascii_uppercase() {
            return None;
        }
        let index = (letter as u8 - b'A') as usize;
        (index < self.options.len()).then_some(index)
    }

    pub fn is_correct(&self, choice: usize) -> bool {
        self.correct_index() == Some(choice)
    }

    /// Letter label for an option index
    pub fn letter_for(index: usize) -> Option<char> {
        u8::try_from(index)
            .ok()
            .filter(|i| *i < 26)
            .map(|i| (b'A' + i) as char)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapItem {
    pub sentence: String,
    pub answer: String,
}

impl GapItem {
    pub const BLANK: &'static str = "________";

    /// Sentence with the first case-insensitive occurrence of the answer blanked out
    pub fn masked_sentence(&self) -> String {
        let answer = self.answer.trim();
        if answer.is_empty() {
            return self.sentence.clone();
        }
        let haystack = self.sentence.to_lowercase();
        let needle = answer.to_lowercase();
        // Lowercasing can change byte lengths; only trust offsets when it didn't.
        if haystack.len() == self.sentence.len() {
            if let Some(start) = haystack.find(&needle) {
                let end = start + needle.len();
                if self.sentence.is_char_boundary(start) && self.sentence.is_char_boundary(end) {
                    return format!("{}{}{}", &self.sentence[..start], Self::BLANK, &self.sentence[end..]);
                }
            }
        }
        self.sentence.replacen(answer, Self::BLANK, 1)
    }

    /// Trimmed, case-insensitive comparison against the expected answer
    pub fn check(&self, attempt: &str) -> bool {
        attempt.trim().to_lowercase() == self.answer.trim().to_lowercase()
    }
}

/// How long the generated summary should be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Long,
    Detailed,
}

impl SummaryLength {
    pub fn style_phrase(&self) -> &'static str {
        match self {
            Self::Short => "1-2 concise paragraphs",
            Self::Medium => "3-4 paragraphs",
            Self::Long => "6-8 detailed paragraphs",
            Self::Detailed => "10-15+ in-depth paragraphs",
        }
    }

}

impl std::str::FromStr for SummaryLength {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "medium" => Ok(Self::Medium),
            "long" => Ok(Self::Long),
            "detailed" => Ok(Self::Detailed),
            other => Err(format!("unknown summary length {:?}", other)),
        }
    }
}

/// Caller-supplied modifiers for a generation request
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationOptions {
    pub custom_instructions: Option<String>,
    pub summary_length: SummaryLength,
    pub chapter_by_chapter: bool,
}

impl GenerationOptions {
    /// Custom instructions, if any survive trimming
    pub fn instructions(&self) -> Option<&str> {
        self.custom_instructions
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}
