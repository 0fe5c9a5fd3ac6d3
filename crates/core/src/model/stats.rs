use serde::Serialize;

/// Aggregate score and timing for a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStatistics {
    pub total_questions: u32,
    pub correct_answers: u32,
    /// Whole percent, rounded half-up.
    pub percentage: u32,
    pub total_time_seconds: u64,
    /// Whole seconds, rounded half-up.
    pub average_time_seconds: u64,
}

/// How a single question was answered, for the results review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionOutcome {
    pub index: usize,
    pub prompt: String,
    pub selected_label: String,
    pub correct_label: Option<String>,
    pub is_correct: bool,
    pub elapsed_seconds: u32,
}

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
    pub percent_complete: u32,
}

/// `num / den` rounded half-up, exact for non-negative integers.
///
/// Returns 0 when `den` is 0.
#[must_use]
pub(crate) fn round_half_up(num: u64, den: u64) -> u64 {
    if den == 0 {
        return 0;
    }
    let num = u128::from(num);
    let den = u128::from(den);
    let rounded = (2 * num + den) / (2 * den);
    u64::try_from(rounded).unwrap_or(u64::MAX)
}
