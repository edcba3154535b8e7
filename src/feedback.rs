/* Grading feedback: which short words a submission gets wrong, and how close it is to the
 * reference language overall. */

use color_eyre::eyre::{Report, Result};
use log::debug;

use crate::dfa::DFA;
use crate::fa::{render_word, Automaton, FA};

/// Longest word length the partial credit computation accepts.
pub const MAX_WORD_LIMIT: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackError {
    WordLimitTooHigh(usize),
    AlphabetMismatch,
}

impl std::fmt::Display for FeedbackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedbackError::WordLimitTooHigh(limit) => {
                write!(f, "Word limit to check {} too high.", limit)
            }
            FeedbackError::AlphabetMismatch => write!(
                f,
                "Input symbols for submitted automaton don't match reference"
            ),
        }
    }
}

impl std::error::Error for FeedbackError {}

/// Words on which a submission and the reference disagree, each list in shortlex order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageDifference {
    /// Accepted by the submission but not in the language.
    pub false_positives: Vec<String>,
    /// In the language but not accepted by the submission.
    pub false_negatives: Vec<String>,
}

impl LanguageDifference {
    pub fn is_empty(&self) -> bool {
        self.false_positives.is_empty() && self.false_negatives.is_empty()
    }
}

fn determinize_pair(candidate: &Automaton, reference: &Automaton) -> Result<(DFA, DFA)> {
    if candidate.get_alphabet() != reference.get_alphabet() {
        return Err(Report::new(FeedbackError::AlphabetMismatch));
    }
    Ok((candidate.determinize(), reference.determinize()))
}

/// List up to `max_examples` false positives and false negatives of length at most `max_length`.
pub fn check_languages(
    candidate: &Automaton,
    reference: &Automaton,
    max_length: usize,
    max_examples: usize,
) -> Result<LanguageDifference> {
    let (candidate, reference) = determinize_pair(candidate, reference)?;

    let false_positives = candidate
        .product(&reference, |c, r| c && !r)
        .accepted_words(max_length, max_examples);
    let false_negatives = candidate
        .product(&reference, |c, r| !c && r)
        .accepted_words(max_length, max_examples);

    debug!(
        "Found {} false positives and {} false negatives up to length {}",
        false_positives.len(),
        false_negatives.len(),
        max_length
    );

    Ok(LanguageDifference {
        false_positives,
        false_negatives,
    })
}

/// Plain-text feedback for a submission. `subject` names what was submitted, e.g. "DFA".
pub fn feedback_text(difference: &LanguageDifference, max_length: usize, subject: &str) -> String {
    if difference.is_empty() {
        return format!(
            "There are no counterexamples of length at most {}.",
            max_length
        );
    }

    let mut lines: Vec<String> = Vec::new();

    if !difference.false_positives.is_empty() {
        lines.push(format!(
            "Here are some strings matched by your {} which are not in the language:",
            subject
        ));
        lines.extend(
            difference
                .false_positives
                .iter()
                .map(|word| render_word(word).to_string()),
        );
        if !difference.false_negatives.is_empty() {
            lines.push(String::new());
        }
    }

    if !difference.false_negatives.is_empty() {
        lines.push(format!(
            "Here are some strings in the language which aren't matched by your {}:",
            subject
        ));
        lines.extend(
            difference
                .false_negatives
                .iter()
                .map(|word| render_word(word).to_string()),
        );
    }

    lines.join("\n")
}

/// Similarity of two DFAs by density of their symmetric difference, in `[0, 1]`.
///
/// For each length `n` up to the word limit the number of words of length `n` in the symmetric
/// difference is divided by the number of words of length `n` in the reference (at least 1). The
/// score is one minus the average of these ratios, clamped at zero. The word limit defaults to
/// twice the number of reference states.
pub fn compute_partial_credit(
    candidate: &DFA,
    reference: &DFA,
    word_limit: Option<usize>,
) -> Result<f64> {
    let word_limit = word_limit.unwrap_or(2 * reference.get_num_states());
    if word_limit > MAX_WORD_LIMIT {
        return Err(Report::new(FeedbackError::WordLimitTooHigh(word_limit)));
    }
    if candidate.get_alphabet() != reference.get_alphabet() {
        return Err(Report::new(FeedbackError::AlphabetMismatch));
    }

    let difference = candidate.product(reference, |c, r| c != r);
    let reference = reference.to_complete();

    let total: f64 = (0..=word_limit)
        .map(|n| {
            let differing = difference.count_words_of_length(n);
            let expected = reference.count_words_of_length(n).max(1.0);
            differing / expected
        })
        .sum();

    let similarity = (total / (word_limit + 1) as f64).min(1.0);
    Ok(1.0 - similarity)
}
