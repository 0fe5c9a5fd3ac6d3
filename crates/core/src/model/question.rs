use serde::{Deserialize, Deserializer, Serialize, de};
use std::fmt;

/// One selectable answer attached to a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    #[serde(rename = "text")]
    label: String,
    #[serde(rename = "correct", deserialize_with = "flag_from_bool_or_str")]
    is_correct: bool,
}

impl AnswerOption {
    #[must_use]
    pub fn new(label: impl Into<String>, is_correct: bool) -> Self {
        Self {
            label: label.into(),
            is_correct,
        }
    }

    #[must_use]
    pub fn correct(label: impl Into<String>) -> Self {
        Self::new(label, true)
    }

    #[must_use]
    pub fn incorrect(label: impl Into<String>) -> Self {
        Self::new(label, false)
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }
}

/// A multiple-choice question. Options keep the order they were loaded in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "question")]
    prompt: String,
    options: Vec<AnswerOption>,
}

impl Question {
    #[must_use]
    pub fn new(prompt: impl Into<String>, options: Vec<AnswerOption>) -> Self {
        Self {
            prompt: prompt.into(),
            options,
        }
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[AnswerOption] {
        &self.options
    }

    /// Label of the first option flagged correct.
    ///
    /// Source data is trusted to flag exactly one option; `None` means the
    /// question can never be answered correctly.
    #[must_use]
    pub fn correct_label(&self) -> Option<&str> {
        self.options
            .iter()
            .find(|opt| opt.is_correct)
            .map(AnswerOption::label)
    }

    /// Whether `selected` matches the correct label exactly.
    #[must_use]
    pub fn is_correct_answer(&self, selected: &str) -> bool {
        self.correct_label() == Some(selected)
    }
}

// Upstream tables store the flag as the strings "true"/"false".
fn flag_from_bool_or_str<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    struct FlagVisitor;

    impl de::Visitor<'_> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a boolean or the string \"true\"/\"false\"")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<bool, E> {
            Ok(v)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<bool, E> {
            match v.trim() {
                s if s.eq_ignore_ascii_case("true") => Ok(true),
                s if s.eq_ignore_ascii_case("false") => Ok(false),
                other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
            }
        }
    }

    deserializer.deserialize_any(FlagVisitor)
}
