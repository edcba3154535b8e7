/* Canonical transport form for automata. States are renamed "0".."N-1" in enumeration order and
 * every list is sorted as strings, so structurally equal automata serialize identically. */

use color_eyre::eyre::{Report, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::dfa::DFA;
use crate::fa::{Automaton, Symbol, FA};
use crate::nfa::NFA;

/// Key used for epsilon transitions in the nondeterministic form.
pub const EPSILON_KEY: &str = "";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalForm<D> {
    pub states: Vec<String>,
    pub input_symbols: Vec<String>,
    pub transitions: BTreeMap<String, BTreeMap<String, D>>,
    pub initial_state: String,
    pub final_states: Vec<String>,
}

pub type DfaForm = CanonicalForm<String>;
pub type NfaForm = CanonicalForm<Vec<String>>;

impl DfaForm {
    fn has_destinations(&self) -> bool {
        self.transitions.values().any(|row| !row.is_empty())
    }

    fn into_nondeterministic(self) -> NfaForm {
        let transitions = self
            .transitions
            .into_iter()
            .map(|(source, row)| {
                let row = row
                    .into_iter()
                    .map(|(key, target)| (key, vec![target]))
                    .collect();
                (source, row)
            })
            .collect();

        CanonicalForm {
            states: self.states,
            input_symbols: self.input_symbols,
            transitions,
            initial_state: self.initial_state,
            final_states: self.final_states,
        }
    }
}

/// Either canonical form. Single-valued destinations are read as the deterministic form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EncodedAutomaton {
    Deterministic(DfaForm),
    Nondeterministic(NfaForm),
}

/// An automaton as drawn in an editor: any number of start states, list-valued destinations for
/// both kinds, and optionally an input symbol that stands for epsilon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedForm {
    pub states: Vec<String>,
    pub input_symbols: Vec<String>,
    pub transitions: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    pub initial_state: Vec<String>,
    pub final_states: Vec<String>,
    #[serde(default)]
    pub epsilon_symbol: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionKind {
    Deterministic,
    Nondeterministic,
}

/// Checks applied on top of structural validation while decoding. All are off by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeOptions {
    /// Send missing deterministic transitions to a fresh dump state instead of rejecting them.
    pub dump_state: bool,
    pub reject_unreachable_states: bool,
    pub require_accepting_state: bool,
    /// Reject a destination list naming the same state twice.
    pub reject_redundant_transitions: bool,
}

impl DecodeOptions {
    /// Every rejecting check enabled, no dump state.
    pub fn strict() -> Self {
        DecodeOptions {
            dump_state: false,
            reject_unreachable_states: true,
            require_accepting_state: true,
            reject_redundant_transitions: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    DuplicateEntries(String),
    InvalidSymbol(String),
    UnknownState(String),
    InvalidTransitionSymbol(String, String),
    EpsilonInDFA(String),
    MissingTransition(String, String),
    MissingStartState,
    MultipleStartStates(Vec<String>),
    /// More than one destination for one symbol out of a deterministic state.
    DuplicateTransitions(String, String),
    RedundantTransition(String, String, String),
    NoAcceptingStates,
    UnreachableStates(Vec<String>),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::DuplicateEntries(field) => {
                write!(f, "duplicate entries in {}", field)
            }
            ValidationError::InvalidSymbol(symbol) => write!(
                f,
                "Input symbol '{}' is not a single character",
                symbol
            ),
            ValidationError::UnknownState(state) => write!(f, "Unknown state '{}'", state),
            ValidationError::InvalidTransitionSymbol(state, symbol) => write!(
                f,
                "State '{}' has a transition on '{}' which is not an input symbol",
                state, symbol
            ),
            ValidationError::EpsilonInDFA(state) => write!(
                f,
                "State '{}' has an epsilon transition in a deterministic automaton",
                state
            ),
            ValidationError::MissingTransition(state, symbol) => write!(
                f,
                "State '{}' has no transition on '{}'",
                state, symbol
            ),
            ValidationError::MissingStartState => write!(f, "Your FSM is missing a start state."),
            ValidationError::MultipleStartStates(states) => write!(
                f,
                "Multiple states marked as start states: {}",
                states.join(", ")
            ),
            ValidationError::DuplicateTransitions(state, symbol) => write!(
                f,
                "State '{}' has multiple transitions on '{}'",
                state, symbol
            ),
            ValidationError::RedundantTransition(state, symbol, target) => write!(
                f,
                "Identical transitions present: '{}' on '{}' to '{}'",
                state, symbol, target
            ),
            ValidationError::NoAcceptingStates => {
                write!(f, "You must have at least one accepting state.")
            }
            ValidationError::UnreachableStates(states) => {
                write!(f, "Unreachable states present: {}", states.join(", "))
            }
        }
    }
}

impl std::error::Error for ValidationError {}

fn sorted_labels(state_ids: impl Iterator<Item = usize>) -> Vec<String> {
    let mut labels: Vec<String> = state_ids.map(|id| id.to_string()).collect();
    labels.sort();
    labels
}

fn encode_common<T: FA + ?Sized>(fa: &T) -> (Vec<String>, Vec<String>, String, Vec<String>) {
    let states = sorted_labels(0..fa.get_num_states());
    let input_symbols = fa.get_alphabet().iter().map(|c| c.to_string()).collect();
    let initial_state = fa.get_start_state().to_string();
    let final_states = sorted_labels(fa.get_acceptor_states().iter_ones());
    (states, input_symbols, initial_state, final_states)
}

/// Encode a DFA, labelling its states by their index.
pub fn encode_dfa(dfa: &DFA) -> DfaForm {
    let (states, input_symbols, initial_state, final_states) = encode_common(dfa);

    let mut transitions = BTreeMap::new();
    for state_id in 0..dfa.get_num_states() {
        let row: BTreeMap<String, String> = dfa
            .get_state_transitions(state_id)
            .into_iter()
            .map(|(symbol, target)| (symbol.to_string(), target.to_string()))
            .collect();
        transitions.insert(state_id.to_string(), row);
    }

    CanonicalForm {
        states,
        input_symbols,
        transitions,
        initial_state,
        final_states,
    }
}

/// Encode an NFA, labelling its states by their index. Epsilon transitions use [`EPSILON_KEY`].
pub fn encode_nfa(nfa: &NFA) -> NfaForm {
    let (states, input_symbols, initial_state, final_states) = encode_common(nfa);

    let mut transitions = BTreeMap::new();
    for state in nfa.get_states() {
        let row: BTreeMap<String, Vec<String>> = state
            .get_transitions()
            .iter()
            .map(|(symbol, targets)| {
                let key = match symbol {
                    Symbol::Epsilon => EPSILON_KEY.to_string(),
                    Symbol::Char(c) => c.to_string(),
                };
                (key, sorted_labels(targets.iter().copied()))
            })
            .collect();
        transitions.insert(state.get_id().to_string(), row);
    }

    CanonicalForm {
        states,
        input_symbols,
        transitions,
        initial_state,
        final_states,
    }
}

pub fn encode(automaton: &Automaton) -> EncodedAutomaton {
    match automaton {
        Automaton::Deterministic(dfa) => EncodedAutomaton::Deterministic(encode_dfa(dfa)),
        Automaton::Nondeterministic(nfa) => EncodedAutomaton::Nondeterministic(encode_nfa(nfa)),
    }
}

fn check_unique(entries: &[String], field: &str) -> Result<(), ValidationError> {
    let unique: BTreeSet<&String> = entries.iter().collect();
    if unique.len() != entries.len() {
        return Err(ValidationError::DuplicateEntries(field.to_string()));
    }
    Ok(())
}

/// `base`, followed by as many `_` as it takes to differ from every label in `states`.
fn fresh_label(states: &[String], base: &str) -> String {
    let mut label = base.to_string();
    while states.contains(&label) {
        label.push('_');
    }
    label
}

/// The parts of a canonical form that are shared by both variants, checked and indexed.
struct Skeleton {
    state_ids: HashMap<String, usize>,
    alphabet: BTreeSet<char>,
    initial: usize,
    finals: Vec<usize>,
}

impl Skeleton {
    fn state_id(&self, label: &str) -> Result<usize, ValidationError> {
        self.state_ids
            .get(label)
            .copied()
            .ok_or_else(|| ValidationError::UnknownState(label.to_string()))
    }

    fn symbol(&self, state: &str, key: &str) -> Result<char, ValidationError> {
        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if self.alphabet.contains(&c) => Ok(c),
            _ => Err(ValidationError::InvalidTransitionSymbol(
                state.to_string(),
                key.to_string(),
            )),
        }
    }
}

fn validate_skeleton<D>(form: &CanonicalForm<D>) -> Result<Skeleton, ValidationError> {
    check_unique(&form.states, "states")?;
    check_unique(&form.input_symbols, "input_symbols")?;
    check_unique(&form.final_states, "final_states")?;

    let state_ids: HashMap<String, usize> = form
        .states
        .iter()
        .enumerate()
        .map(|(id, label)| (label.clone(), id))
        .collect();

    let mut alphabet = BTreeSet::new();
    for symbol in &form.input_symbols {
        let mut chars = symbol.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => alphabet.insert(c),
            _ => return Err(ValidationError::InvalidSymbol(symbol.clone())),
        };
    }

    let lookup = |label: &String| {
        state_ids
            .get(label)
            .copied()
            .ok_or_else(|| ValidationError::UnknownState(label.clone()))
    };
    let initial = lookup(&form.initial_state)?;
    let finals = form
        .final_states
        .iter()
        .map(lookup)
        .collect::<Result<Vec<usize>, ValidationError>>()?;
    for source in form.transitions.keys() {
        lookup(source)?;
    }

    Ok(Skeleton {
        state_ids,
        alphabet,
        initial,
        finals,
    })
}

/// Opt-in checks on a decoded automaton. `exempt` is a state added while decoding.
fn check_decoded<T: FA>(
    fa: &T,
    options: &DecodeOptions,
    exempt: Option<usize>,
) -> Result<(), ValidationError> {
    if options.require_accepting_state && fa.get_acceptor_states().not_any() {
        return Err(ValidationError::NoAcceptingStates);
    }

    if options.reject_unreachable_states {
        let unreachable: Vec<String> = fa
            .reachable_states()
            .iter_zeros()
            .filter(|state_id| Some(*state_id) != exempt)
            .map(|state_id| fa.get_state_label(state_id).to_string())
            .collect();
        if !unreachable.is_empty() {
            return Err(ValidationError::UnreachableStates(unreachable));
        }
    }
    Ok(())
}

fn decode_dfa_form(form: &DfaForm, options: &DecodeOptions) -> Result<DFA, ValidationError> {
    let skeleton = validate_skeleton(form)?;

    let mut dfa = DFA::new();
    for label in &form.states {
        dfa.add_state(label.clone());
    }
    dfa.set_alphabet(skeleton.alphabet.clone());

    for (source, row) in &form.transitions {
        let from = skeleton.state_id(source)?;
        for (key, target) in row {
            if key == EPSILON_KEY {
                return Err(ValidationError::EpsilonInDFA(source.clone()));
            }
            let c = skeleton.symbol(source, key)?;
            dfa.add_transition(from, c, skeleton.state_id(target)?);
        }
    }

    let mut dump = None;
    for (state_id, label) in form.states.iter().enumerate() {
        for c in &skeleton.alphabet {
            if dfa.next_state(state_id, *c).is_some() {
                continue;
            }
            if !options.dump_state {
                return Err(ValidationError::MissingTransition(
                    label.clone(),
                    c.to_string(),
                ));
            }
            let dump_id = match dump {
                Some(dump_id) => dump_id,
                None => {
                    let dump_id = dfa.add_state(fresh_label(&form.states, "dump"));
                    dump = Some(dump_id);
                    dump_id
                }
            };
            dfa.add_transition(state_id, *c, dump_id);
        }
    }
    if let Some(dump_id) = dump {
        for c in &skeleton.alphabet {
            dfa.add_transition(dump_id, *c, dump_id);
        }
    }

    dfa.set_start_state(skeleton.initial);
    for state_id in &skeleton.finals {
        dfa.set_accept_state(*state_id);
    }

    check_decoded(&dfa, options, dump)?;
    Ok(dfa)
}

fn decode_nfa_form(form: &NfaForm, options: &DecodeOptions) -> Result<NFA, ValidationError> {
    let skeleton = validate_skeleton(form)?;

    let mut nfa = NFA::new();
    for label in &form.states {
        nfa.add_state(label.clone());
    }
    nfa.set_alphabet(skeleton.alphabet.clone());

    for (source, row) in &form.transitions {
        let from = skeleton.state_id(source)?;
        for (key, targets) in row {
            let symbol = if key == EPSILON_KEY {
                Symbol::Epsilon
            } else {
                Symbol::Char(skeleton.symbol(source, key)?)
            };

            let mut seen = BTreeSet::new();
            for target in targets {
                if !seen.insert(target) && options.reject_redundant_transitions {
                    return Err(ValidationError::RedundantTransition(
                        source.clone(),
                        key.clone(),
                        target.clone(),
                    ));
                }
                nfa.add_transition(from, symbol, skeleton.state_id(target)?);
            }
        }
    }

    nfa.set_start_state(skeleton.initial);
    for state_id in &skeleton.finals {
        nfa.set_accept_state(*state_id);
    }

    check_decoded(&nfa, options, None)?;
    Ok(nfa)
}

/// Rebuild a DFA. The form is fully validated before any state is created.
pub fn decode_dfa(form: &DfaForm) -> Result<DFA> {
    decode_dfa_form(form, &DecodeOptions::default()).map_err(Report::new)
}

pub fn decode_nfa(form: &NfaForm) -> Result<NFA> {
    decode_nfa_form(form, &DecodeOptions::default()).map_err(Report::new)
}

pub fn decode_with(encoded: &EncodedAutomaton, options: &DecodeOptions) -> Result<Automaton> {
    let automaton = match encoded {
        EncodedAutomaton::Deterministic(form) => {
            decode_dfa_form(form, options).map(Automaton::from)
        }
        EncodedAutomaton::Nondeterministic(form) => {
            decode_nfa_form(form, options).map(Automaton::from)
        }
    };
    automaton.map_err(Report::new)
}

pub fn decode(encoded: &EncodedAutomaton) -> Result<Automaton> {
    decode_with(encoded, &DecodeOptions::default())
}

fn decode_submission_form(
    form: &SubmittedForm,
    kind: SubmissionKind,
    options: &DecodeOptions,
) -> Result<Automaton, ValidationError> {
    check_unique(&form.initial_state, "initial_state")?;
    let Some(first) = form.initial_state.first() else {
        return Err(ValidationError::MissingStartState);
    };

    match kind {
        SubmissionKind::Deterministic => {
            if form.initial_state.len() > 1 {
                return Err(ValidationError::MultipleStartStates(
                    form.initial_state.clone(),
                ));
            }

            let mut transitions = BTreeMap::new();
            for (source, row) in &form.transitions {
                let mut single: BTreeMap<String, String> = BTreeMap::new();
                for (key, targets) in row {
                    match targets.as_slice() {
                        [] => {}
                        [target] => {
                            single.insert(key.clone(), target.clone());
                        }
                        _ => {
                            return Err(ValidationError::DuplicateTransitions(
                                source.clone(),
                                key.clone(),
                            ))
                        }
                    }
                }
                transitions.insert(source.clone(), single);
            }

            let canonical = CanonicalForm {
                states: form.states.clone(),
                input_symbols: form.input_symbols.clone(),
                transitions,
                initial_state: first.clone(),
                final_states: form.final_states.clone(),
            };
            decode_dfa_form(&canonical, options).map(Automaton::from)
        }
        SubmissionKind::Nondeterministic => {
            let epsilon = form.epsilon_symbol.as_deref();
            let input_symbols = form
                .input_symbols
                .iter()
                .filter(|symbol| Some(symbol.as_str()) != epsilon)
                .cloned()
                .collect();

            let mut transitions: BTreeMap<String, BTreeMap<String, Vec<String>>> = BTreeMap::new();
            for (source, row) in &form.transitions {
                let mut renamed: BTreeMap<String, Vec<String>> = BTreeMap::new();
                for (key, targets) in row {
                    let key = if Some(key.as_str()) == epsilon {
                        EPSILON_KEY.to_string()
                    } else {
                        key.clone()
                    };
                    renamed.entry(key).or_default().extend(targets.iter().cloned());
                }
                transitions.insert(source.clone(), renamed);
            }

            // Several start states are merged behind a fresh one with epsilon edges to each
            let mut states = form.states.clone();
            let initial_state = if form.initial_state.len() == 1 {
                first.clone()
            } else {
                let start = fresh_label(&states, "start");
                let row = BTreeMap::from([(EPSILON_KEY.to_string(), form.initial_state.clone())]);
                transitions.insert(start.clone(), row);
                states.push(start.clone());
                start
            };

            let canonical = CanonicalForm {
                states,
                input_symbols,
                transitions,
                initial_state,
                final_states: form.final_states.clone(),
            };
            decode_nfa_form(&canonical, options).map(Automaton::from)
        }
    }
}

/// Decode an automaton drawn in an editor as either kind.
pub fn decode_submission(
    form: &SubmittedForm,
    kind: SubmissionKind,
    options: &DecodeOptions,
) -> Result<Automaton> {
    decode_submission_form(form, kind, options).map_err(Report::new)
}

pub fn to_json(encoded: &EncodedAutomaton) -> Result<String> {
    Ok(serde_json::to_string_pretty(encoded)?)
}

/// Parse and decode an automaton from its canonical JSON text.
pub fn from_json(text: &str) -> Result<Automaton> {
    from_json_with(text, &DecodeOptions::default())
}

pub fn from_json_with(text: &str, options: &DecodeOptions) -> Result<Automaton> {
    let encoded = match serde_json::from_str::<EncodedAutomaton>(text)? {
        // With no destinations at all the two shapes coincide; only the nondeterministic reading
        // is valid once there are input symbols
        EncodedAutomaton::Deterministic(form)
            if !form.has_destinations() && !form.input_symbols.is_empty() =>
        {
            EncodedAutomaton::Nondeterministic(form.into_nondeterministic())
        }
        encoded => encoded,
    };
    decode_with(&encoded, options)
}

/// Parse and decode an editor submission from JSON.
pub fn submission_from_json(
    text: &str,
    kind: SubmissionKind,
    options: &DecodeOptions,
) -> Result<Automaton> {
    let form: SubmittedForm = serde_json::from_str(text)?;
    decode_submission(&form, kind, options)
}

#[cfg(test)]
mod codec_tests {
    use super::*;
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    fn binary() -> BTreeSet<char> {
        ['0', '1'].into_iter().collect()
    }

    fn strings_up_to(alphabet: &BTreeSet<char>, max_length: usize) -> Vec<String> {
        let mut all = vec![String::new()];
        let mut layer = vec![String::new()];
        for _ in 0..max_length {
            layer = layer
                .iter()
                .flat_map(|prefix| {
                    alphabet.iter().map(move |c| {
                        let mut word = prefix.clone();
                        word.push(*c);
                        word
                    })
                })
                .collect();
            all.extend(layer.iter().cloned());
        }
        all
    }

    fn scenario_dfa() -> DFA {
        let mut dfa = DFA::new();
        let a = dfa.add_state("A");
        let b = dfa.add_state("B");
        dfa.set_alphabet(binary());
        dfa.add_transition(a, '0', b);
        dfa.add_transition(a, '1', a);
        dfa.add_transition(b, '0', a);
        dfa.add_transition(b, '1', b);
        dfa.set_start_state(a);
        dfa.set_accept_state(b);
        dfa
    }

    #[derive(Debug, Clone)]
    struct SmallNfa(NFA);

    impl Arbitrary for SmallNfa {
        fn arbitrary(g: &mut Gen) -> Self {
            let num_states = usize::arbitrary(g) % 5 + 1;
            let symbols = [Symbol::Epsilon, Symbol::Char('0'), Symbol::Char('1')];

            let mut nfa = NFA::new();
            for id in 0..num_states {
                nfa.add_state(format!("q{}", id));
            }
            nfa.set_alphabet(binary());
            for _ in 0..usize::arbitrary(g) % (3 * num_states + 1) {
                let from = usize::arbitrary(g) % num_states;
                let to = usize::arbitrary(g) % num_states;
                let symbol = *g.choose(&symbols).unwrap_or(&Symbol::Epsilon);
                nfa.add_transition(from, symbol, to);
            }
            nfa.set_start_state(usize::arbitrary(g) % num_states);
            for id in 0..num_states {
                if bool::arbitrary(g) {
                    nfa.set_accept_state(id);
                }
            }
            SmallNfa(nfa)
        }
    }

    #[test]
    fn test_encode_dfa_uses_enumeration_order() {
        let form = encode_dfa(&scenario_dfa());
        assert_eq!(form.states, vec!["0", "1"]);
        assert_eq!(form.input_symbols, vec!["0", "1"]);
        assert_eq!(form.initial_state, "0");
        assert_eq!(form.final_states, vec!["1"]);
        assert_eq!(form.transitions["0"]["0"], "1");
        assert_eq!(form.transitions["1"]["1"], "1");
    }

    #[test]
    fn test_encode_is_deterministic() {
        let automaton = Automaton::from(scenario_dfa());
        assert_eq!(encode(&automaton), encode(&automaton));
        assert_eq!(
            to_json(&encode(&automaton)).unwrap(),
            to_json(&encode(&automaton)).unwrap()
        );
    }

    #[test]
    fn test_encode_nfa_uses_epsilon_key() {
        let mut nfa = NFA::new();
        let s0 = nfa.add_state("x");
        let s1 = nfa.add_state("y");
        nfa.set_alphabet(binary());
        nfa.add_transition(s0, Symbol::Epsilon, s1);
        nfa.add_transition(s0, Symbol::Char('1'), s0);
        nfa.add_transition(s0, Symbol::Char('1'), s1);
        nfa.set_accept_state(s1);

        let form = encode_nfa(&nfa);
        assert_eq!(form.transitions["0"][EPSILON_KEY], vec!["1"]);
        assert_eq!(form.transitions["0"]["1"], vec!["0", "1"]);
        assert!(form.transitions["1"].is_empty());
    }

    #[test]
    fn test_duplicate_final_states_are_rejected() {
        let mut form = encode_dfa(&scenario_dfa());
        form.final_states = vec!["1".to_string(), "1".to_string()];

        let err = decode_dfa(&form).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>().unwrap(),
            &ValidationError::DuplicateEntries("final_states".to_string())
        );
        assert_eq!(err.to_string(), "duplicate entries in final_states");
    }

    #[test]
    fn test_duplicate_states_and_symbols_are_rejected() {
        let mut nfa = NFA::new();
        let s0 = nfa.add_state("only");
        nfa.set_alphabet(binary());
        nfa.add_transition(s0, Symbol::Char('0'), s0);
        let mut form = encode_nfa(&nfa);
        form.states.push("0".to_string());
        assert!(matches!(
            decode_nfa(&form).unwrap_err().downcast_ref::<ValidationError>(),
            Some(ValidationError::DuplicateEntries(field)) if field == "states"
        ));

        let mut form = encode_dfa(&scenario_dfa());
        form.input_symbols.push("0".to_string());
        assert!(matches!(
            decode_dfa(&form).unwrap_err().downcast_ref::<ValidationError>(),
            Some(ValidationError::DuplicateEntries(field)) if field == "input_symbols"
        ));
    }

    #[test]
    fn test_dfa_form_must_be_complete_and_epsilon_free() {
        let mut form = encode_dfa(&scenario_dfa());
        form.transitions.get_mut("1").unwrap().remove("0");
        assert_eq!(
            decode_dfa(&form)
                .unwrap_err()
                .downcast_ref::<ValidationError>()
                .unwrap(),
            &ValidationError::MissingTransition("1".to_string(), "0".to_string())
        );

        let mut form = encode_dfa(&scenario_dfa());
        form.transitions
            .get_mut("0")
            .unwrap()
            .insert(EPSILON_KEY.to_string(), "1".to_string());
        assert_eq!(
            decode_dfa(&form)
                .unwrap_err()
                .downcast_ref::<ValidationError>()
                .unwrap(),
            &ValidationError::EpsilonInDFA("0".to_string())
        );
    }

    #[test]
    fn test_unknown_states_and_symbols_are_rejected() {
        let mut form = encode_dfa(&scenario_dfa());
        form.initial_state = "7".to_string();
        assert_eq!(
            decode_dfa(&form)
                .unwrap_err()
                .downcast_ref::<ValidationError>()
                .unwrap(),
            &ValidationError::UnknownState("7".to_string())
        );

        let mut form = encode_dfa(&scenario_dfa());
        form.transitions
            .get_mut("0")
            .unwrap()
            .insert("2".to_string(), "1".to_string());
        assert!(matches!(
            decode_dfa(&form).unwrap_err().downcast_ref::<ValidationError>(),
            Some(ValidationError::InvalidTransitionSymbol(_, symbol)) if symbol == "2"
        ));

        let mut form = encode_dfa(&scenario_dfa());
        form.input_symbols = vec!["0".to_string(), "10".to_string()];
        assert!(matches!(
            decode_dfa(&form).unwrap_err().downcast_ref::<ValidationError>(),
            Some(ValidationError::InvalidSymbol(_))
        ));
    }

    #[test]
    fn test_decoded_states_keep_their_labels() {
        let json = r#"{
            "states": ["p", "q"],
            "input_symbols": ["a"],
            "transitions": {"p": {"a": ["q"], "": ["q"]}},
            "initial_state": "p",
            "final_states": ["q"]
        }"#;
        let automaton = from_json(json).unwrap();
        assert!(!automaton.is_deterministic());
        assert_eq!(automaton.as_fa().get_state_label(1), "q");
        assert!(automaton.accepts(""));
        assert!(automaton.accepts("a"));
        assert!(!automaton.accepts("aa"));
    }

    #[test]
    fn test_json_shape_selects_variant() {
        let json = to_json(&encode(&Automaton::from(scenario_dfa()))).unwrap();
        let automaton = from_json(&json).unwrap();
        assert!(automaton.is_deterministic());
        assert!(automaton.accepts("0"));
        assert!(!automaton.accepts("00"));
    }

    fn validation_error(result: Result<Automaton>) -> ValidationError {
        result
            .unwrap_err()
            .downcast_ref::<ValidationError>()
            .unwrap()
            .clone()
    }

    #[test]
    fn test_json_round_trip_without_transitions() {
        let mut nfa = NFA::new();
        let only = nfa.add_state("only");
        nfa.set_alphabet(binary());
        nfa.set_accept_state(only);

        let json = to_json(&encode(&Automaton::from(nfa))).unwrap();
        let decoded = from_json(&json).unwrap();
        assert!(!decoded.is_deterministic());
        assert!(decoded.accepts(""));
        assert!(!decoded.accepts("0"));

        let mut nfa = NFA::new();
        nfa.add_state("p");
        let q = nfa.add_state("q");
        nfa.set_alphabet(binary());
        nfa.set_accept_state(q);

        let json = to_json(&encode(&Automaton::from(nfa))).unwrap();
        let decoded = from_json(&json).unwrap();
        assert!(!decoded.accepts(""));
        assert!(!decoded.accepts("1"));
    }

    #[test]
    fn test_state_lists_sort_as_strings() {
        let mut dfa = DFA::new();
        for id in 0..12 {
            dfa.add_state(format!("s{}", id));
        }
        dfa.set_alphabet(binary());
        for id in 0..12 {
            dfa.add_transition(id, '0', (id + 1) % 12);
            dfa.add_transition(id, '1', id);
        }
        dfa.set_accept_state(2);
        dfa.set_accept_state(10);

        let form = encode_dfa(&dfa);
        assert_eq!(
            form.states,
            vec!["0", "1", "10", "11", "2", "3", "4", "5", "6", "7", "8", "9"]
        );
        assert_eq!(form.final_states, vec!["10", "2"]);
        assert_eq!(form.transitions["9"]["0"], "10");

        let decoded = decode_dfa(&form).unwrap();
        for n in 0..24 {
            let zeros = "0".repeat(n);
            assert_eq!(decoded.accepts(&zeros), n % 12 == 2 || n % 12 == 10, "{}", n);
        }

        let mut nfa = NFA::new();
        for id in 0..11 {
            nfa.add_state(id.to_string());
        }
        nfa.set_alphabet(binary());
        nfa.add_transition(0, Symbol::Char('0'), 2);
        nfa.add_transition(0, Symbol::Char('0'), 10);
        assert_eq!(encode_nfa(&nfa).transitions["0"]["0"], vec!["10", "2"]);
    }

    #[test]
    fn test_dump_state_completes_missing_transitions() {
        let mut form = encode_dfa(&scenario_dfa());
        form.transitions.get_mut("1").unwrap().remove("0");
        let options = DecodeOptions {
            dump_state: true,
            ..DecodeOptions::default()
        };

        let dfa = decode_dfa_form(&form, &options).unwrap();
        assert_eq!(dfa.get_num_states(), 3);
        assert_eq!(dfa.get_state_label(2), "dump");
        assert!(dfa.is_complete());
        assert!(dfa.accepts("0"));
        assert!(!dfa.accepts("00"));
        assert!(!dfa.accepts("001"));

        let complete = decode_dfa_form(&encode_dfa(&scenario_dfa()), &options).unwrap();
        assert_eq!(complete.get_num_states(), 2);

        let taken = vec!["dump".to_string(), "dump_".to_string()];
        assert_eq!(fresh_label(&taken, "dump"), "dump__");
    }

    #[test]
    fn test_submission_with_several_start_states() {
        let json = r#"{
            "states": ["a", "b", "c"],
            "input_symbols": ["0", "1", "~"],
            "transitions": {"a": {"0": ["c"]}, "b": {"1": ["c"], "~": ["a"]}, "c": {}},
            "initial_state": ["a", "b"],
            "final_states": ["c"],
            "epsilon_symbol": "~"
        }"#;

        let automaton =
            submission_from_json(json, SubmissionKind::Nondeterministic, &DecodeOptions::strict())
                .unwrap();
        assert_eq!(automaton.get_alphabet(), &binary());
        assert_eq!(automaton.as_fa().get_start_state(), 3);
        assert_eq!(automaton.as_fa().get_state_label(3), "start");
        assert!(automaton.accepts("0"));
        assert!(automaton.accepts("1"));
        assert!(!automaton.accepts(""));
        assert!(!automaton.accepts("01"));

        let form: SubmittedForm = serde_json::from_str(json).unwrap();
        assert_eq!(
            validation_error(decode_submission(
                &form,
                SubmissionKind::Deterministic,
                &DecodeOptions::default()
            )),
            ValidationError::MultipleStartStates(vec!["a".to_string(), "b".to_string()])
        );

        let mut no_start = form.clone();
        no_start.initial_state.clear();
        let err = validation_error(decode_submission(
            &no_start,
            SubmissionKind::Nondeterministic,
            &DecodeOptions::default(),
        ));
        assert_eq!(err, ValidationError::MissingStartState);
        assert_eq!(err.to_string(), "Your FSM is missing a start state.");
    }

    #[test]
    fn test_duplicate_and_redundant_transitions() {
        let json = r#"{
            "states": ["A", "B"],
            "input_symbols": ["0"],
            "transitions": {"A": {"0": ["B", "B"]}, "B": {"0": ["B"]}},
            "initial_state": ["A"],
            "final_states": ["B"]
        }"#;

        assert_eq!(
            validation_error(submission_from_json(
                json,
                SubmissionKind::Deterministic,
                &DecodeOptions::default()
            )),
            ValidationError::DuplicateTransitions("A".to_string(), "0".to_string())
        );
        assert_eq!(
            validation_error(submission_from_json(
                json,
                SubmissionKind::Nondeterministic,
                &DecodeOptions::strict()
            )),
            ValidationError::RedundantTransition("A".to_string(), "0".to_string(), "B".to_string())
        );

        let lenient =
            submission_from_json(json, SubmissionKind::Nondeterministic, &DecodeOptions::default())
                .unwrap();
        assert!(lenient.accepts("000"));
        assert!(!lenient.accepts(""));
    }

    #[test]
    fn test_unreachable_and_accepting_checks() {
        let mut form = encode_dfa(&scenario_dfa());
        form.states.push("2".to_string());
        form.transitions.insert(
            "2".to_string(),
            BTreeMap::from([
                ("0".to_string(), "2".to_string()),
                ("1".to_string(), "2".to_string()),
            ]),
        );
        let encoded = EncodedAutomaton::Deterministic(form.clone());

        assert!(decode(&encoded).is_ok());
        let options = DecodeOptions {
            reject_unreachable_states: true,
            ..DecodeOptions::default()
        };
        assert_eq!(
            validation_error(decode_with(&encoded, &options)),
            ValidationError::UnreachableStates(vec!["2".to_string()])
        );

        form.final_states.clear();
        let encoded = EncodedAutomaton::Deterministic(form);
        assert!(decode(&encoded).is_ok());
        let options = DecodeOptions {
            require_accepting_state: true,
            ..DecodeOptions::default()
        };
        let err = validation_error(decode_with(&encoded, &options));
        assert_eq!(err, ValidationError::NoAcceptingStates);
        assert_eq!(err.to_string(), "You must have at least one accepting state.");
    }

    #[quickcheck]
    fn decode_encode_preserves_language(nfa: SmallNfa) -> bool {
        let original = Automaton::from(nfa.0);
        let Ok(decoded) = decode(&encode(&original)) else {
            return false;
        };
        strings_up_to(&binary(), 6)
            .iter()
            .all(|input| original.accepts(input) == decoded.accepts(input))
    }

    #[quickcheck]
    fn decode_encode_preserves_dfa_language(nfa: SmallNfa) -> bool {
        let original = Automaton::from(Automaton::from(nfa.0).determinize());
        let Ok(decoded) = decode(&encode(&original)) else {
            return false;
        };
        decoded.is_deterministic()
            && strings_up_to(&binary(), 6)
                .iter()
                .all(|input| original.accepts(input) == decoded.accepts(input))
    }
}
