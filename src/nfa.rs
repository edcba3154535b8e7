use bitvec::prelude::*;
use color_eyre::eyre::Result;
use log::debug;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::dfa::{construct_dfa, construct_minimal_dfa, DFA};
use crate::fa::{Symbol, FA};
use crate::reg_ex::{parse_regex_lines, RegEx, RegExProgram};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NFAState {
    id: usize,
    label: String,
    transitions: BTreeMap<Symbol, BTreeSet<usize>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NFA {
    states: Vec<NFAState>,
    start_state: usize,
    accept_states: BitVec<u8>,
    alphabet: BTreeSet<char>,
    regex: String,
}

impl FA for NFA {
    fn get_num_states(&self) -> usize {
        self.states.len()
    }

    fn get_start_state(&self) -> usize {
        self.start_state
    }

    fn get_alphabet(&self) -> &BTreeSet<char> {
        &self.alphabet
    }

    fn get_acceptor_states(&self) -> &BitVec<u8> {
        &self.accept_states
    }

    fn get_state_label(&self, state_id: usize) -> &str {
        &self.states[state_id].label
    }

    fn get_state_transitions(&self, state_id: usize) -> Vec<(Symbol, usize)> {
        let mut transition_list = Vec::new();
        for (symbol, targets) in &self.states[state_id].transitions {
            for target in targets {
                transition_list.push((*symbol, *target));
            }
        }
        transition_list
    }
}

impl NFAState {
    fn new(id: usize, label: String) -> Self {
        NFAState {
            id,
            label,
            transitions: BTreeMap::new(),
        }
    }

    pub fn get_id(&self) -> usize {
        self.id
    }

    pub fn get_label(&self) -> &str {
        &self.label
    }

    pub fn get_transitions(&self) -> &BTreeMap<Symbol, BTreeSet<usize>> {
        &self.transitions
    }
}

impl Default for NFA {
    fn default() -> Self {
        Self::new()
    }
}

impl NFA {
    pub fn new() -> Self {
        NFA {
            states: Vec::new(),
            start_state: 0,
            accept_states: BitVec::new(),
            alphabet: BTreeSet::new(),
            regex: String::new(),
        }
    }

    pub fn add_state(&mut self, label: impl Into<String>) -> usize {
        let state_id = self.states.len();
        self.states.push(NFAState::new(state_id, label.into()));
        self.accept_states.push(false);
        state_id
    }

    pub fn add_transition(&mut self, from: usize, symbol: Symbol, to: usize) {
        self.states[from]
            .transitions
            .entry(symbol)
            .or_default()
            .insert(to);
    }

    pub fn set_start_state(&mut self, state_id: usize) {
        self.start_state = state_id;
    }

    pub fn set_accept_state(&mut self, state_id: usize) {
        self.accept_states.set(state_id, true);
    }

    pub fn set_alphabet(&mut self, alphabet: BTreeSet<char>) {
        self.alphabet = alphabet;
    }

    pub fn get_state(&self, id: usize) -> Option<&NFAState> {
        self.states.get(id)
    }

    pub fn get_states(&self) -> &[NFAState] {
        &self.states
    }

    /// Source text of the regular expression this NFA was compiled from, if any.
    pub fn get_regex(&self) -> &str {
        &self.regex
    }

    fn set_regex(&mut self, regex: String) {
        self.regex = regex;
    }
}

/// Hands out fresh state ids for one compilation.
#[derive(Debug, Default)]
pub struct StateCounter {
    next: usize,
}

impl StateCounter {
    pub fn new() -> Self {
        StateCounter { next: 0 }
    }

    pub fn fresh(&mut self) -> usize {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> usize {
        self.next
    }
}

pub type Transition = (usize, Symbol, usize);

/// Minimal DFAs of the definitions compiled so far, by name.
pub type Definitions = HashMap<String, DFA>;

/// The piece of NFA built for one subexpression: a single entry and a single exit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment {
    pub start: usize,
    pub accept: usize,
}

enum Visit<'a> {
    Enter(&'a RegEx),
    Exit(&'a RegEx),
}

fn pop_pair(fragments: &mut Vec<Fragment>) -> (Fragment, Fragment) {
    let right = fragments.pop();
    let left = fragments.pop();
    match (left, right) {
        (Some(left), Some(right)) => (left, right),
        _ => unreachable!("operand fragments are built before their operator"),
    }
}

/// Copy the states of `dfa` that can still reach acceptance into a fragment. Accepting states get
/// an epsilon edge to a fresh exit state.
fn splice_definition(
    dfa: &DFA,
    counter: &mut StateCounter,
    transitions: &mut Vec<Transition>,
) -> Fragment {
    let live = dfa.live_states();
    let ids: Vec<Option<usize>> = (0..dfa.get_num_states())
        .map(|state_id| live[state_id].then(|| counter.fresh()))
        .collect();

    let start = match ids[dfa.get_start_state()] {
        Some(start) => start,
        None => counter.fresh(),
    };
    let accept = counter.fresh();

    for (state_id, from) in ids.iter().enumerate() {
        let Some(from) = from else {
            continue;
        };
        for (symbol, target) in dfa.get_state_transitions(state_id) {
            if let Some(to) = ids[target] {
                transitions.push((*from, symbol, to));
            }
        }
        if dfa.get_acceptor_states()[state_id] {
            transitions.push((*from, Symbol::Epsilon, accept));
        }
    }
    Fragment { start, accept }
}

/// Thompson construction of `tree`, walking it post-order with an explicit stack. States come
/// from `counter` and edges are appended to `transitions`. Variables are replaced by a copy of
/// their minimal DFA from `definitions`; a name with no definition matches nothing.
pub fn compile_fragment(
    tree: &RegEx,
    definitions: &Definitions,
    counter: &mut StateCounter,
    transitions: &mut Vec<Transition>,
) -> Fragment {
    let mut stack = vec![Visit::Enter(tree)];
    let mut fragments: Vec<Fragment> = Vec::new();

    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(node) => match node {
                RegEx::Symbol(c) => {
                    let start = counter.fresh();
                    let accept = counter.fresh();
                    transitions.push((start, Symbol::Char(*c), accept));
                    fragments.push(Fragment { start, accept });
                }
                RegEx::Empty => {
                    let start = counter.fresh();
                    let accept = counter.fresh();
                    transitions.push((start, Symbol::Epsilon, accept));
                    fragments.push(Fragment { start, accept });
                }
                RegEx::Variable(name) => {
                    let fragment = match definitions.get(name) {
                        Some(dfa) => splice_definition(dfa, counter, transitions),
                        None => Fragment {
                            start: counter.fresh(),
                            accept: counter.fresh(),
                        },
                    };
                    fragments.push(fragment);
                }
                RegEx::Union(left, right) | RegEx::Concat(left, right) => {
                    stack.push(Visit::Exit(node));
                    stack.push(Visit::Enter(right));
                    stack.push(Visit::Enter(left));
                }
                RegEx::Star(inner) => {
                    stack.push(Visit::Exit(node));
                    stack.push(Visit::Enter(inner));
                }
            },
            Visit::Exit(node) => match node {
                RegEx::Concat(..) => {
                    let (left, right) = pop_pair(&mut fragments);
                    transitions.push((left.accept, Symbol::Epsilon, right.start));
                    fragments.push(Fragment {
                        start: left.start,
                        accept: right.accept,
                    });
                }
                RegEx::Union(..) => {
                    let (left, right) = pop_pair(&mut fragments);
                    let start = counter.fresh();
                    let accept = counter.fresh();
                    transitions.push((start, Symbol::Epsilon, left.start));
                    transitions.push((start, Symbol::Epsilon, right.start));
                    transitions.push((left.accept, Symbol::Epsilon, accept));
                    transitions.push((right.accept, Symbol::Epsilon, accept));
                    fragments.push(Fragment { start, accept });
                }
                RegEx::Star(..) => {
                    let Some(inner) = fragments.pop() else {
                        unreachable!("operand fragments are built before their operator");
                    };
                    let start = counter.fresh();
                    let accept = counter.fresh();
                    transitions.push((start, Symbol::Epsilon, inner.start));
                    transitions.push((start, Symbol::Epsilon, accept));
                    transitions.push((inner.accept, Symbol::Epsilon, inner.start));
                    transitions.push((inner.accept, Symbol::Epsilon, accept));
                    fragments.push(Fragment { start, accept });
                }
                RegEx::Symbol(_) | RegEx::Empty | RegEx::Variable(_) => {}
            },
        }
    }

    match fragments.pop() {
        Some(fragment) => fragment,
        None => unreachable!("every tree compiles to one fragment"),
    }
}

fn build_nfa(tree: &RegEx, definitions: &Definitions, alphabet: &BTreeSet<char>) -> NFA {
    let mut counter = StateCounter::new();
    let mut transitions = Vec::new();
    let fragment = compile_fragment(tree, definitions, &mut counter, &mut transitions);

    let mut result = NFA::new();
    for state_id in 0..counter.issued() {
        result.add_state(state_id.to_string());
    }
    for (from, symbol, to) in transitions {
        result.add_transition(from, symbol, to);
    }
    result.set_start_state(fragment.start);
    result.set_accept_state(fragment.accept);
    result.set_alphabet(alphabet.clone());
    result
}

/// Compile a syntax tree into an NFA over `alphabet` using Thompson construction.
pub fn construct_nfa(tree: &RegEx, alphabet: &BTreeSet<char>) -> NFA {
    let result = build_nfa(tree, &Definitions::new(), alphabet);
    debug!(
        "Thompson construction produced {} states",
        result.get_num_states()
    );
    result
}

/// Compile a program. Each definition is compiled once and minimized, and every use of its name
/// splices in a copy of that minimal DFA.
pub fn construct_program_nfa(program: &RegExProgram, alphabet: &BTreeSet<char>) -> NFA {
    let mut definitions = Definitions::new();

    for (name, tree) in &program.definitions {
        let nfa = build_nfa(tree, &definitions, alphabet);
        let minimal = construct_minimal_dfa(&construct_dfa(&nfa));
        debug!(
            "Definition '{}' compiled to {} states, {} after minimization",
            name,
            nfa.get_num_states(),
            minimal.get_num_states()
        );
        definitions.insert(name.clone(), minimal);
    }

    let result = build_nfa(&program.expression, &definitions, alphabet);
    debug!(
        "Thompson construction produced {} states",
        result.get_num_states()
    );
    result
}

/// Parse and compile a (possibly multi-line) regular expression.
pub fn compile_regex(regex: &str, alphabet: &BTreeSet<char>) -> Result<NFA> {
    let program = parse_regex_lines(regex, alphabet)?;
    let mut nfa = construct_program_nfa(&program, alphabet);
    nfa.set_regex(regex.to_string());
    Ok(nfa)
}
