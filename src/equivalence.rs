/* Decide whether two automata accept the same language. Both sides are determinized and
 * minimized; differing minimal DFAs are then searched for their shortest distinguishing input. */

use color_eyre::eyre::{Report, Result};
use log::{debug, trace};
use std::collections::{HashMap, VecDeque};
use std::fmt;

use crate::dfa::{construct_minimal_dfa, DFA};
use crate::fa::{render_word, Automaton, FA};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EquivalenceError {
    AlphabetMismatch(String, String),
}

impl std::fmt::Display for EquivalenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EquivalenceError::AlphabetMismatch(candidate, reference) => write!(
                f,
                "Alphabet mismatch: candidate uses {{{}}} but reference uses {{{}}}",
                candidate, reference
            ),
        }
    }
}

impl std::error::Error for EquivalenceError {}

/// A word accepted by exactly one of the two automata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counterexample {
    pub input: String,
    pub accepted_by_candidate: bool,
}

impl fmt::Display for Counterexample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (accepting, rejecting) = if self.accepted_by_candidate {
            ("candidate", "reference")
        } else {
            ("reference", "candidate")
        };
        write!(
            f,
            "'{}' is accepted by the {} but not by the {}",
            render_word(&self.input),
            accepting,
            rejecting
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Equivalent,
    Counterexample(Counterexample),
    /// The languages differ, but only on inputs longer than the search bound.
    Undetermined { max_length: usize },
}

impl Verdict {
    pub fn is_equivalent(&self) -> bool {
        matches!(self, Verdict::Equivalent)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Equivalent => write!(f, "equivalent"),
            Verdict::Counterexample(counterexample) => {
                write!(f, "not equivalent: {}", counterexample)
            }
            Verdict::Undetermined { max_length } => write!(
                f,
                "undetermined: no distinguishing input of length at most {}",
                max_length
            ),
        }
    }
}

fn join_alphabet(fa: &dyn FA) -> String {
    fa.get_alphabet()
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Shortest input of length at most `max_length` on which the two DFAs disagree. Ties are broken
/// by symbol order, so the result is the shortlex-least such input.
pub fn shortest_distinguishing_input(
    candidate: &DFA,
    reference: &DFA,
    max_length: usize,
) -> Option<Counterexample> {
    let candidate = candidate.to_complete();
    let reference = reference.to_complete();

    let start = (candidate.get_start_state(), reference.get_start_state());
    // Each visited pair remembers the pair and symbol it was first reached from
    let mut parents: HashMap<(usize, usize), Option<((usize, usize), char)>> = HashMap::new();
    parents.insert(start, None);

    let mut frontier: VecDeque<(usize, usize)> = VecDeque::from([start]);
    let mut depth = 0;

    loop {
        let mut next_frontier = VecDeque::new();

        while let Some(pair) = frontier.pop_front() {
            let (a, b) = pair;
            let accepted_by_candidate = candidate.is_accept_state(a);
            if accepted_by_candidate != reference.is_accept_state(b) {
                let mut symbols = Vec::new();
                let mut cursor = pair;
                while let Some(Some((parent, c))) = parents.get(&cursor) {
                    symbols.push(*c);
                    cursor = *parent;
                }
                return Some(Counterexample {
                    input: symbols.into_iter().rev().collect(),
                    accepted_by_candidate,
                });
            }

            if depth == max_length {
                continue;
            }
            for c in candidate.get_alphabet() {
                let (Some(next_a), Some(next_b)) =
                    (candidate.next_state(a, *c), reference.next_state(b, *c))
                else {
                    continue;
                };
                let next = (next_a, next_b);
                if !parents.contains_key(&next) {
                    parents.insert(next, Some((pair, *c)));
                    next_frontier.push_back(next);
                }
            }
        }

        if next_frontier.is_empty() {
            return None;
        }
        depth += 1;
        trace!(
            "Product search depth {}: {} pairs in frontier",
            depth,
            next_frontier.len()
        );
        frontier = next_frontier;
    }
}

/// Compare two DFAs over the same alphabet.
pub fn check_dfa_equivalence(candidate: &DFA, reference: &DFA, max_length: usize) -> Result<Verdict> {
    if candidate.get_alphabet() != reference.get_alphabet() {
        return Err(Report::new(EquivalenceError::AlphabetMismatch(
            join_alphabet(candidate),
            join_alphabet(reference),
        )));
    }

    let minimal_candidate = construct_minimal_dfa(candidate);
    let minimal_reference = construct_minimal_dfa(reference);

    let verdict = if minimal_candidate == minimal_reference {
        Verdict::Equivalent
    } else {
        match shortest_distinguishing_input(&minimal_candidate, &minimal_reference, max_length) {
            Some(counterexample) => Verdict::Counterexample(counterexample),
            None => Verdict::Undetermined { max_length },
        }
    };

    debug!("Equivalence check verdict: {}", verdict);
    Ok(verdict)
}

/// Compare two automata of either kind. Neither input is modified.
pub fn check_equivalence(
    candidate: &Automaton,
    reference: &Automaton,
    max_length: usize,
) -> Result<Verdict> {
    check_dfa_equivalence(&candidate.determinize(), &reference.determinize(), max_length)
}
