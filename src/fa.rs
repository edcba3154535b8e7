use bitvec::prelude::*;
use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use crate::dfa::{construct_dfa, DFA};
use crate::nfa::NFA;

/// A set of active states, indexed by state id.
pub type StateSet = BitVec<u8>;

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub enum Symbol {
    Epsilon,
    Char(char),
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Epsilon => write!(f, "ε"),
            Symbol::Char(c) => write!(f, "{}", c),
        }
    }
}

/// Behaviour shared by deterministic and nondeterministic automata. Both are simulated the same
/// way: a DFA is just an automaton whose active set never holds more than one state and which has
/// no epsilon transitions.
pub trait FA {
    fn get_num_states(&self) -> usize;
    fn get_start_state(&self) -> usize;
    fn get_alphabet(&self) -> &BTreeSet<char>;
    fn get_acceptor_states(&self) -> &BitVec<u8>;
    fn get_state_label(&self, state_id: usize) -> &str;
    /// Outgoing transitions of a state, ordered by symbol and then by destination.
    fn get_state_transitions(&self, state_id: usize) -> Vec<(Symbol, usize)>;

    /// Smallest superset of `states` closed under epsilon transitions.
    fn epsilon_closure(&self, states: &StateSet) -> StateSet {
        let mut closure = states.clone();
        let mut work_list: VecDeque<usize> = states.iter_ones().collect();

        while let Some(state) = work_list.pop_front() {
            for (symbol, target) in self.get_state_transitions(state) {
                if symbol == Symbol::Epsilon && !closure[target] {
                    closure.set(target, true);
                    work_list.push_back(target);
                }
            }
        }
        closure
    }

    /// States reachable from the start state along any transitions.
    fn reachable_states(&self) -> StateSet {
        let mut reachable: StateSet = BitVec::repeat(false, self.get_num_states());
        reachable.set(self.get_start_state(), true);
        let mut work_list = VecDeque::from([self.get_start_state()]);

        while let Some(state) = work_list.pop_front() {
            for (_, target) in self.get_state_transitions(state) {
                if !reachable[target] {
                    reachable.set(target, true);
                    work_list.push_back(target);
                }
            }
        }
        reachable
    }

    /// States reachable from `states` by reading exactly one `c`, without any closure.
    fn move_on(&self, states: &StateSet, c: char) -> StateSet {
        let mut result: StateSet = BitVec::repeat(false, self.get_num_states());
        for state in states.iter_ones() {
            for (symbol, target) in self.get_state_transitions(state) {
                if symbol == Symbol::Char(c) {
                    result.set(target, true);
                }
            }
        }
        result
    }

    fn initial_states(&self) -> StateSet {
        let mut start: StateSet = BitVec::repeat(false, self.get_num_states());
        start.set(self.get_start_state(), true);
        self.epsilon_closure(&start)
    }

    fn step(&self, active: &StateSet, c: char) -> StateSet {
        self.epsilon_closure(&self.move_on(active, c))
    }

    fn is_accepting(&self, active: &StateSet) -> bool {
        active
            .iter_ones()
            .any(|state| self.get_acceptor_states()[state])
    }

    /// Run the automaton over `input`, recording every intermediate active set.
    fn run(&self, input: &str) -> Run {
        let mut active = self.initial_states();
        let mut steps = vec![active.clone()];
        let mut rejected_at = None;

        for (position, c) in input.chars().enumerate() {
            active = if rejected_at.is_some() {
                BitVec::repeat(false, self.get_num_states())
            } else {
                self.step(&active, c)
            };
            if rejected_at.is_none() && active.not_any() {
                rejected_at = Some(position);
            }
            steps.push(active.clone());
        }

        let accepted = rejected_at.is_none() && self.is_accepting(&active);
        Run {
            steps,
            accepted,
            rejected_at,
        }
    }

    fn accepts(&self, input: &str) -> bool {
        self.run(input).is_accepted()
    }
}

/// The active state sets visited while reading an input, one more than the input length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    steps: Vec<StateSet>,
    accepted: bool,
    rejected_at: Option<usize>,
}

impl Run {
    pub fn steps(&self) -> impl Iterator<Item = &StateSet> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    /// Position of the input symbol after which no state was active, if that happened.
    pub fn rejected_at(&self) -> Option<usize> {
        self.rejected_at
    }

    pub fn final_states(&self) -> Option<&StateSet> {
        self.steps.last()
    }
}

/// Render a set of states as `{a, b}` with labels sorted, or `∅` when empty.
pub fn format_state_set<T: FA + ?Sized>(fa: &T, states: &StateSet) -> String {
    if states.not_any() {
        return "∅".to_string();
    }
    let mut labels: Vec<&str> = states
        .iter_ones()
        .map(|state| fa.get_state_label(state))
        .collect();
    labels.sort();
    format!("{{{}}}", labels.join(", "))
}

/// Render an input word for display, showing the empty word as `ε`.
pub fn render_word(word: &str) -> &str {
    if word.is_empty() {
        "ε"
    } else {
        word
    }
}

/// Either kind of automaton behind one interface.
#[derive(Debug, Clone)]
pub enum Automaton {
    Deterministic(DFA),
    Nondeterministic(NFA),
}

impl Automaton {
    pub fn as_fa(&self) -> &dyn FA {
        match self {
            Automaton::Deterministic(dfa) => dfa,
            Automaton::Nondeterministic(nfa) => nfa,
        }
    }

    pub fn is_deterministic(&self) -> bool {
        matches!(self, Automaton::Deterministic(_))
    }

    /// An equivalent DFA. Nondeterministic automata go through subset construction.
    pub fn determinize(&self) -> DFA {
        match self {
            Automaton::Deterministic(dfa) => dfa.clone(),
            Automaton::Nondeterministic(nfa) => construct_dfa(nfa),
        }
    }

    pub fn get_alphabet(&self) -> &BTreeSet<char> {
        self.as_fa().get_alphabet()
    }

    pub fn run(&self, input: &str) -> Run {
        self.as_fa().run(input)
    }

    pub fn accepts(&self, input: &str) -> bool {
        self.as_fa().accepts(input)
    }
}

impl From<DFA> for Automaton {
    fn from(dfa: DFA) -> Self {
        Automaton::Deterministic(dfa)
    }
}

impl From<NFA> for Automaton {
    fn from(nfa: NFA) -> Self {
        Automaton::Nondeterministic(nfa)
    }
}
