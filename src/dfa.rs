/* Perform subset construction to convert NFA into DFA
 * Minimize DFAs by partition refinement and renumber them canonically */

use crate::fa::{format_state_set, StateSet, Symbol, FA};
use crate::nfa::NFA;
use bitvec::prelude::*;
use log::{debug, trace};
use std::collections::VecDeque;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::{DefaultHasher, Hash, Hasher};

/// A struct which is a bitvec and its hash stored together to ease fetching the hash of the bitvec
/// quickly instead of calculating it each time.
#[derive(Clone)]
struct HashedBitVec {
    bv: BitVec<u8>,
    hash: u64,
}

impl HashedBitVec {
    fn new(bv: BitVec<u8>) -> Self {
        let mut hasher = DefaultHasher::new();
        bv.hash(&mut hasher);
        let hash = hasher.finish();
        Self { bv, hash }
    }
}

impl Hash for HashedBitVec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl PartialEq for HashedBitVec {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.bv == other.bv
    }
}

impl Eq for HashedBitVec {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DFA {
    states: Vec<DFAState>,
    start_state: usize,
    accept_states: BitVec<u8>,
    alphabet: BTreeSet<char>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DFAState {
    label: String,
    transitions: BTreeMap<char, usize>,
}

struct LookupTable {
    state_to_set_map: HashMap<usize, usize>,
    set_to_states_map: HashMap<usize, HashSet<usize>>,
}

impl LookupTable {
    fn new() -> Self {
        LookupTable {
            state_to_set_map: HashMap::new(),
            set_to_states_map: HashMap::new(),
        }
    }

    fn insert_state_in_set(&mut self, state: usize, set: usize) {
        if let Some(prev_set_key) = self.state_to_set_map.insert(state, set) {
            // Moving a state out of its old block drops the block once it is empty
            if let Some(prev_set) = self.set_to_states_map.get_mut(&prev_set_key) {
                prev_set.remove(&state);
                if prev_set.is_empty() {
                    self.set_to_states_map.remove(&prev_set_key);
                }
            }
        }
        self.set_to_states_map.entry(set).or_default().insert(state);
    }

    fn get_set_of_state(&self, state: &usize) -> Option<&usize> {
        self.state_to_set_map.get(state)
    }

    fn get_num_sets(&self) -> usize {
        self.set_to_states_map.len()
    }

    fn get_states_of_set(&self, set: &usize) -> Option<&HashSet<usize>> {
        self.set_to_states_map.get(set)
    }
}

impl FA for DFA {
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
        self.states[state_id]
            .transitions
            .iter()
            .map(|(c, target)| (Symbol::Char(*c), *target))
            .collect()
    }
}

impl DFAState {
    fn new(label: String) -> Self {
        DFAState {
            label,
            transitions: BTreeMap::new(),
        }
    }

    pub fn get_label(&self) -> &str {
        &self.label
    }

    /// Get a list of all outgoing transitions for the given state
    pub fn get_transitions(&self) -> &BTreeMap<char, usize> {
        &self.transitions
    }
}

impl Default for DFA {
    fn default() -> Self {
        Self::new()
    }
}

impl DFA {
    pub fn new() -> Self {
        DFA {
            states: Vec::new(),
            start_state: 0,
            accept_states: BitVec::new(),
            alphabet: BTreeSet::new(),
        }
    }

    pub fn add_state(&mut self, label: impl Into<String>) -> usize {
        let state_id = self.states.len();
        self.states.push(DFAState::new(label.into()));
        self.accept_states.push(false);
        state_id
    }

    /// Set the destination of `from` on `c`, replacing any previous one.
    pub fn add_transition(&mut self, from: usize, c: char, to: usize) {
        self.states[from].transitions.insert(c, to);
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

    /// Returns a reference to the DFA state whose id is provided
    pub fn get_state(&self, id: usize) -> Option<&DFAState> {
        self.states.get(id)
    }

    pub fn is_accept_state(&self, state_id: usize) -> bool {
        self.accept_states[state_id]
    }

    pub fn next_state(&self, state_id: usize, c: char) -> Option<usize> {
        self.states[state_id].transitions.get(&c).copied()
    }

    /// State reached after reading `input`, or None if some transition is missing.
    pub fn read_input(&self, input: &str) -> Option<usize> {
        input
            .chars()
            .try_fold(self.start_state, |state, c| self.next_state(state, c))
    }

    /// True if every state has exactly one transition on every alphabet symbol.
    pub fn is_complete(&self) -> bool {
        self.states.iter().all(|state| {
            self.alphabet
                .iter()
                .all(|c| state.transitions.contains_key(c))
        })
    }

    /// An equivalent complete DFA. Missing transitions are sent to a new trap state.
    pub fn to_complete(&self) -> DFA {
        if self.is_complete() {
            return self.clone();
        }

        let mut result = self.clone();
        let mut trap_label = "trap".to_string();
        while self.states.iter().any(|state| state.label == trap_label) {
            trap_label.push('_');
        }
        let trap = result.add_state(trap_label);

        for state_id in 0..result.states.len() {
            for c in &self.alphabet {
                result.states[state_id].transitions.entry(*c).or_insert(trap);
            }
        }
        result
    }

    /// Synchronized product of two DFAs over the same alphabet, keeping only the pairs reachable
    /// from the pair of start states. A pair accepts when `accept` says so.
    pub fn product<F>(&self, other: &DFA, accept: F) -> DFA
    where
        F: Fn(bool, bool) -> bool,
    {
        let left = self.to_complete();
        let right = other.to_complete();

        let mut result = DFA::new();
        result.alphabet = left.alphabet.clone();

        let mut pair_ids: HashMap<(usize, usize), usize> = HashMap::new();
        let mut work_list: VecDeque<(usize, usize)> = VecDeque::new();

        let add_pair = |result: &mut DFA,
                        pair_ids: &mut HashMap<(usize, usize), usize>,
                        work_list: &mut VecDeque<(usize, usize)>,
                        (a, b): (usize, usize)| {
            if let Some(&id) = pair_ids.get(&(a, b)) {
                return id;
            }
            let id = result.add_state(format!(
                "({}, {})",
                left.states[a].label, right.states[b].label
            ));
            if accept(left.is_accept_state(a), right.is_accept_state(b)) {
                result.set_accept_state(id);
            }
            pair_ids.insert((a, b), id);
            work_list.push_back((a, b));
            id
        };

        let start_pair = (left.start_state, right.start_state);
        let start = add_pair(&mut result, &mut pair_ids, &mut work_list, start_pair);
        result.start_state = start;

        while let Some((a, b)) = work_list.pop_front() {
            let from = pair_ids[&(a, b)];
            for c in &left.alphabet {
                let (Some(next_a), Some(next_b)) = (left.next_state(a, *c), right.next_state(b, *c))
                else {
                    continue;
                };
                let to = add_pair(&mut result, &mut pair_ids, &mut work_list, (next_a, next_b));
                result.add_transition(from, *c, to);
            }
        }
        result
    }

    /// Number of accepted words of length exactly `length`. Counts are floating point because
    /// they grow as `|alphabet|^length`; they are exact below 2^53.
    pub fn count_words_of_length(&self, length: usize) -> f64 {
        let mut counts = vec![0f64; self.states.len()];
        counts[self.start_state] = 1.0;

        for _ in 0..length {
            let mut next = vec![0f64; self.states.len()];
            for (state_id, count) in counts.iter().enumerate() {
                if *count == 0.0 {
                    continue;
                }
                for target in self.states[state_id].transitions.values() {
                    next[*target] += count;
                }
            }
            counts = next;
        }

        self.accept_states
            .iter_ones()
            .map(|state_id| counts[state_id])
            .sum()
    }

    /// Accepted words of length at most `max_length` in shortlex order, at most `limit` of them.
    pub fn accepted_words(&self, max_length: usize, limit: usize) -> Vec<String> {
        let num_states = self.states.len();

        // can_finish[k] marks the states from which some word of length exactly k is accepted
        let mut can_finish: Vec<BitVec<u8>> = vec![self.accept_states.clone()];
        for k in 1..=max_length {
            let mut layer: BitVec<u8> = BitVec::repeat(false, num_states);
            for state_id in 0..num_states {
                let reaches = self.states[state_id]
                    .transitions
                    .values()
                    .any(|target| can_finish[k - 1][*target]);
                layer.set(state_id, reaches);
            }
            can_finish.push(layer);
        }

        let mut words = Vec::new();

        for length in 0..=max_length {
            let mut stack: Vec<(usize, String)> = Vec::new();
            if can_finish[length][self.start_state] {
                stack.push((self.start_state, String::new()));
            }

            while let Some((state_id, prefix)) = stack.pop() {
                if words.len() >= limit {
                    return words;
                }
                let remaining = length - prefix.chars().count();
                if remaining == 0 {
                    words.push(prefix);
                    continue;
                }
                // Reverse order so the smallest symbol is popped first
                for (c, target) in self.states[state_id].transitions.iter().rev() {
                    if can_finish[remaining - 1][*target] {
                        let mut word = prefix.clone();
                        word.push(*c);
                        stack.push((*target, word));
                    }
                }
            }
        }
        words
    }

    /// True if no word at all is accepted.
    pub fn is_empty_language(&self) -> bool {
        let mut visited: BitVec<u8> = BitVec::repeat(false, self.states.len());
        let mut work_list = VecDeque::from([self.start_state]);
        visited.set(self.start_state, true);

        while let Some(state_id) = work_list.pop_front() {
            if self.accept_states[state_id] {
                return false;
            }
            for target in self.states[state_id].transitions.values() {
                if !visited[*target] {
                    visited.set(*target, true);
                    work_list.push_back(*target);
                }
            }
        }
        true
    }

    /// States from which some accepting state can be reached.
    pub fn live_states(&self) -> BitVec<u8> {
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); self.states.len()];
        for (state_id, state) in self.states.iter().enumerate() {
            for target in state.transitions.values() {
                predecessors[*target].push(state_id);
            }
        }

        let mut live = self.accept_states.clone();
        let mut work_list: VecDeque<usize> = self.accept_states.iter_ones().collect();
        while let Some(state_id) = work_list.pop_front() {
            for source in &predecessors[state_id] {
                if !live[*source] {
                    live.set(*source, true);
                    work_list.push_back(*source);
                }
            }
        }
        live
    }
}

/// Hopcroft partition refinement of a complete DFA. Block 0 starts with the non accepting states
/// and block 1 with the accepting ones; a block is split whenever only some of its states move
/// into a splitter block on a symbol.
fn get_lookup_table(dfa: &DFA) -> LookupTable {
    let mut lookup_table = LookupTable::new();
    let accepts = &dfa.accept_states;

    // Block 0 holds the non accepting states, or the accepting ones if there are no others
    for non_accept_state in accepts.iter_zeros() {
        lookup_table.insert_state_in_set(non_accept_state, 0);
    }
    let accept_set_id = if accepts.not_any() || accepts.all() {
        0
    } else {
        1
    };
    for accept_state in accepts.iter_ones() {
        lookup_table.insert_state_in_set(accept_state, accept_set_id);
    }

    let mut predecessors: Vec<BTreeMap<char, Vec<usize>>> = vec![BTreeMap::new(); dfa.states.len()];
    for (state_id, state) in dfa.states.iter().enumerate() {
        for (c, target) in &state.transitions {
            predecessors[*target].entry(*c).or_default().push(state_id);
        }
    }

    let mut work_list: VecDeque<(usize, char)> = VecDeque::new();
    let mut pending: HashSet<(usize, char)> = HashSet::new();
    if lookup_table.get_num_sets() == 2 {
        let seed = if accepts.count_ones() <= accepts.count_zeros() {
            accept_set_id
        } else {
            0
        };
        for c in &dfa.alphabet {
            pending.insert((seed, *c));
            work_list.push_back((seed, *c));
        }
    }

    let mut splits = 0;

    while let Some((splitter, c)) = work_list.pop_front() {
        pending.remove(&(splitter, c));
        let Some(members) = lookup_table.get_states_of_set(&splitter) else {
            continue;
        };

        // States entering the splitter on c, grouped by their current block
        let mut entering: HashMap<usize, Vec<usize>> = HashMap::new();
        for target in members {
            let Some(sources) = predecessors[*target].get(&c) else {
                continue;
            };
            for source in sources {
                if let Some(block) = lookup_table.get_set_of_state(source) {
                    entering.entry(*block).or_default().push(*source);
                }
            }
        }

        for (block, moving) in entering {
            let block_size = lookup_table
                .get_states_of_set(&block)
                .map_or(0, |states| states.len());
            if moving.len() == block_size {
                continue;
            }

            let new_block = lookup_table.get_num_sets();
            for state_id in &moving {
                lookup_table.insert_state_in_set(*state_id, new_block);
            }
            splits += 1;

            let remaining = block_size - moving.len();
            for symbol in &dfa.alphabet {
                let next = if pending.contains(&(block, *symbol)) || moving.len() <= remaining {
                    new_block
                } else {
                    block
                };
                if pending.insert((next, *symbol)) {
                    work_list.push_back((next, *symbol));
                }
            }
        }
    }

    trace!(
        "Partition refinement made {} splits into {} blocks",
        splits,
        lookup_table.get_num_sets()
    );
    lookup_table
}

/// Renumber the states reachable from the start state in breadth-first order, following
/// transitions in symbol order. Two isomorphic DFAs come out identical.
fn reorder_minimal_dfa(dfa: &DFA) -> DFA {
    let mut reorder_map: HashMap<usize, usize> = HashMap::new();
    let mut order: Vec<usize> = Vec::new();
    let mut queue: VecDeque<usize> = VecDeque::new();

    reorder_map.insert(dfa.start_state, 0);
    order.push(dfa.start_state);
    queue.push_back(dfa.start_state);

    while let Some(state_id) = queue.pop_front() {
        for target in dfa.states[state_id].transitions.values() {
            if !reorder_map.contains_key(target) {
                reorder_map.insert(*target, order.len());
                order.push(*target);
                queue.push_back(*target);
            }
        }
    }

    let mut result = DFA::new();
    result.alphabet = dfa.alphabet.clone();
    for new_id in 0..order.len() {
        result.add_state(new_id.to_string());
    }

    for (new_id, old_id) in order.iter().enumerate() {
        for (c, target) in &dfa.states[*old_id].transitions {
            result.add_transition(new_id, *c, reorder_map[target]);
        }
        if dfa.accept_states[*old_id] {
            result.set_accept_state(new_id);
        }
    }
    result.start_state = 0;
    result
}

/// Minimize a DFA. The input is completed first, merged by Myhill-Nerode partition refinement,
/// stripped of unreachable states and renumbered canonically, so two DFAs accept the same
/// language exactly when their minimal DFAs compare equal.
pub fn construct_minimal_dfa(dfa: &DFA) -> DFA {
    let dfa = dfa.to_complete();
    let lookup_table = get_lookup_table(&dfa);

    // Block ids are not contiguous after refinement, so give every block a dense id
    let mut block_ids: HashMap<usize, usize> = HashMap::new();
    let mut minimal_dfa = DFA::new();
    minimal_dfa.alphabet = dfa.alphabet.clone();

    for state_id in 0..dfa.states.len() {
        let Some(block) = lookup_table.get_set_of_state(&state_id) else {
            continue;
        };
        if !block_ids.contains_key(block) {
            let id = minimal_dfa.add_state(block_ids.len().to_string());
            block_ids.insert(*block, id);
        }
    }

    for (state_id, state) in dfa.states.iter().enumerate() {
        let Some(block) = lookup_table.get_set_of_state(&state_id) else {
            continue;
        };
        let from = block_ids[block];
        for (c, target) in &state.transitions {
            if let Some(target_block) = lookup_table.get_set_of_state(target) {
                minimal_dfa.add_transition(from, *c, block_ids[target_block]);
            }
        }
        if dfa.accept_states[state_id] {
            minimal_dfa.set_accept_state(from);
        }
    }

    if let Some(start_block) = lookup_table.get_set_of_state(&dfa.start_state) {
        minimal_dfa.start_state = block_ids[start_block];
    }

    let result = reorder_minimal_dfa(&minimal_dfa);
    debug!(
        "Minimized DFA from {} to {} states",
        dfa.get_num_states(),
        result.get_num_states()
    );
    result
}

/// Look up the DFA state standing for `subset`, creating and queueing it if it is new.
fn add_subset(
    nfa: &NFA,
    result: &mut DFA,
    q_list: &mut HashMap<HashedBitVec, usize>,
    work_list: &mut VecDeque<HashedBitVec>,
    subset: HashedBitVec,
) -> usize {
    if let Some(&existing) = q_list.get(&subset) {
        return existing;
    }
    let di = result.add_state(format_state_set(nfa, &subset.bv));
    let nfa_accepts = nfa.get_acceptor_states();
    if subset.bv.iter_ones().any(|state| nfa_accepts[state]) {
        result.set_accept_state(di);
    }
    q_list.insert(subset.clone(), di);
    work_list.push_back(subset);
    di
}

/// Apply the subset construction algorithm on an NFA to build a complete DFA. The empty subset
/// becomes a trap state when some subset has no successor on a symbol.
pub fn construct_dfa(nfa: &NFA) -> DFA {
    let mut result = DFA::new();
    result.alphabet = nfa.get_alphabet().clone();

    let mut q_list: HashMap<HashedBitVec, usize> = HashMap::new();
    let mut work_list: VecDeque<HashedBitVec> = VecDeque::new();

    let q0 = HashedBitVec::new(nfa.initial_states());
    let start = add_subset(nfa, &mut result, &mut q_list, &mut work_list, q0);
    result.start_state = start;

    while let Some(q) = work_list.pop_front() {
        let dq = q_list[&q];

        for c in nfa.get_alphabet() {
            let t: StateSet = nfa.step(&q.bv, *c);
            let di = add_subset(nfa, &mut result, &mut q_list, &mut work_list, HashedBitVec::new(t));
            result.add_transition(dq, *c, di);
        }
    }

    debug!(
        "Subset construction produced {} states from {} NFA states",
        result.get_num_states(),
        nfa.get_num_states()
    );
    result
}

#[cfg(test)]
mod dfa_tests {
    use super::*;

    fn binary() -> BTreeSet<char> {
        ['0', '1'].into_iter().collect()
    }

    /// Accepts binary strings with an odd number of 1s, with a redundant copy of each state.
    fn redundant_parity_dfa() -> DFA {
        let mut dfa = DFA::new();
        let even_a = dfa.add_state("even_a");
        let odd_a = dfa.add_state("odd_a");
        let even_b = dfa.add_state("even_b");
        let odd_b = dfa.add_state("odd_b");
        dfa.set_alphabet(binary());
        dfa.add_transition(even_a, '0', even_b);
        dfa.add_transition(even_a, '1', odd_a);
        dfa.add_transition(odd_a, '0', odd_b);
        dfa.add_transition(odd_a, '1', even_b);
        dfa.add_transition(even_b, '0', even_a);
        dfa.add_transition(even_b, '1', odd_b);
        dfa.add_transition(odd_b, '0', odd_a);
        dfa.add_transition(odd_b, '1', even_a);
        dfa.set_start_state(even_a);
        dfa.set_accept_state(odd_a);
        dfa.set_accept_state(odd_b);
        dfa
    }

    fn ends_in_one_nfa() -> NFA {
        let mut nfa = NFA::new();
        let s0 = nfa.add_state("s");
        let s1 = nfa.add_state("t");
        nfa.set_alphabet(binary());
        nfa.add_transition(s0, Symbol::Char('0'), s0);
        nfa.add_transition(s0, Symbol::Char('1'), s0);
        nfa.add_transition(s0, Symbol::Char('1'), s1);
        nfa.set_start_state(s0);
        nfa.set_accept_state(s1);
        nfa
    }

    #[test]
    fn test_lookup_table() {
        let mut lookup_table = LookupTable::new();

        lookup_table.insert_state_in_set(0, 1);
        lookup_table.insert_state_in_set(1, 1);
        lookup_table.insert_state_in_set(2, 2);

        assert_eq!(lookup_table.get_set_of_state(&0), Some(&1));
        assert_eq!(lookup_table.get_set_of_state(&2), Some(&2));
        assert_eq!(lookup_table.get_num_sets(), 2);

        // Moving the last member of a block removes the block
        lookup_table.insert_state_in_set(2, 1);
        assert_eq!(lookup_table.get_num_sets(), 1);
        assert_eq!(lookup_table.get_states_of_set(&1).unwrap().len(), 3);
        assert!(lookup_table.get_states_of_set(&2).is_none());
    }

    #[test]
    fn test_refinement_blocks() {
        let dfa = redundant_parity_dfa();
        let lookup_table = get_lookup_table(&dfa);
        assert_eq!(lookup_table.get_num_sets(), 2);
        assert_eq!(
            lookup_table.get_set_of_state(&0),
            lookup_table.get_set_of_state(&2)
        );
        assert_eq!(
            lookup_table.get_set_of_state(&1),
            lookup_table.get_set_of_state(&3)
        );
        assert_ne!(
            lookup_table.get_set_of_state(&0),
            lookup_table.get_set_of_state(&1)
        );
    }

    #[test]
    fn test_minimize_long_chain() {
        // Words of exactly 5000 zeros; refinement must separate every distance to acceptance
        let length = 5000;
        let mut dfa = DFA::new();
        for id in 0..=length + 1 {
            dfa.add_state(id.to_string());
        }
        dfa.set_alphabet(binary());
        for id in 0..=length {
            let next = if id < length { id + 1 } else { length + 1 };
            dfa.add_transition(id, '0', next);
            dfa.add_transition(id, '1', length + 1);
        }
        dfa.add_transition(length + 1, '0', length + 1);
        dfa.add_transition(length + 1, '1', length + 1);
        dfa.set_accept_state(length);

        let minimal = construct_minimal_dfa(&dfa);
        assert_eq!(minimal.get_num_states(), length + 2);
        assert!(minimal.accepts(&"0".repeat(length)));
        assert!(!minimal.accepts(&"0".repeat(length - 1)));
    }

    #[test]
    fn test_construct_minimal_dfa_merges_equivalent_states() {
        let minimal = construct_minimal_dfa(&redundant_parity_dfa());
        assert_eq!(minimal.get_num_states(), 2);
        assert_eq!(minimal.get_start_state(), 0);
        assert!(!minimal.is_accept_state(0));
        assert!(minimal.is_accept_state(1));
        assert_eq!(minimal.next_state(0, '1'), Some(1));
        assert_eq!(minimal.next_state(0, '0'), Some(0));
    }

    #[test]
    fn test_minimal_dfa_is_canonical() {
        let mut relabeled = DFA::new();
        let a = relabeled.add_state("x");
        let b = relabeled.add_state("y");
        relabeled.set_alphabet(binary());
        relabeled.add_transition(b, '0', b);
        relabeled.add_transition(b, '1', a);
        relabeled.add_transition(a, '0', a);
        relabeled.add_transition(a, '1', b);
        relabeled.set_start_state(b);
        relabeled.set_accept_state(a);

        assert_eq!(
            construct_minimal_dfa(&relabeled),
            construct_minimal_dfa(&redundant_parity_dfa())
        );
    }

    #[test]
    fn test_minimization_drops_unreachable_states() {
        let mut dfa = redundant_parity_dfa();
        let lonely = dfa.add_state("lonely");
        dfa.add_transition(lonely, '0', lonely);
        dfa.add_transition(lonely, '1', lonely);
        assert_eq!(construct_minimal_dfa(&dfa).get_num_states(), 2);
    }

    #[test]
    fn test_single_block_partition() {
        let mut dfa = DFA::new();
        let s0 = dfa.add_state("a");
        let s1 = dfa.add_state("b");
        dfa.set_alphabet(binary());
        for c in ['0', '1'] {
            dfa.add_transition(s0, c, s1);
            dfa.add_transition(s1, c, s0);
        }
        dfa.set_start_state(s0);
        dfa.set_accept_state(s0);
        dfa.set_accept_state(s1);

        let minimal = construct_minimal_dfa(&dfa);
        assert_eq!(minimal.get_num_states(), 1);
        assert!(minimal.accepts("0101"));
    }

    #[test]
    fn test_to_complete_adds_trap_state() {
        let mut dfa = DFA::new();
        let s0 = dfa.add_state("trap");
        dfa.set_alphabet(binary());
        dfa.add_transition(s0, '0', s0);
        dfa.set_start_state(s0);
        dfa.set_accept_state(s0);
        assert!(!dfa.is_complete());

        let complete = dfa.to_complete();
        assert!(complete.is_complete());
        assert_eq!(complete.get_num_states(), 2);
        assert_eq!(complete.get_state_label(1), "trap_");
        assert!(complete.accepts("000"));
        assert!(!complete.accepts("001"));
    }

    #[test]
    fn test_construct_dfa() {
        let nfa = ends_in_one_nfa();
        let dfa = construct_dfa(&nfa);

        assert!(dfa.is_complete());
        assert_eq!(dfa.get_num_states(), 2);
        assert_eq!(dfa.get_state_label(0), "{s}");
        assert_eq!(dfa.get_state_label(1), "{s, t}");
        for input in ["", "1", "0", "01", "10", "0111"] {
            assert_eq!(dfa.accepts(input), nfa.accepts(input), "{}", input);
        }
    }

    #[test]
    fn test_construct_dfa_adds_empty_subset() {
        let mut nfa = NFA::new();
        let s0 = nfa.add_state("p");
        let s1 = nfa.add_state("q");
        nfa.set_alphabet(binary());
        nfa.add_transition(s0, Symbol::Char('0'), s1);
        nfa.set_start_state(s0);
        nfa.set_accept_state(s1);

        let dfa = construct_dfa(&nfa);
        assert!(dfa.is_complete());
        assert_eq!(dfa.get_num_states(), 3);
        assert!((0..3).any(|state| dfa.get_state_label(state) == "∅"));
        assert!(dfa.accepts("0"));
        assert!(!dfa.accepts("00"));
    }

    #[test]
    fn test_product_intersection() {
        let parity = redundant_parity_dfa();
        let ends_in_one = construct_dfa(&ends_in_one_nfa());
        let both = parity.product(&ends_in_one, |a, b| a && b);

        assert!(both.accepts("1"));
        assert!(both.accepts("0111"));
        assert!(!both.accepts("11"));
        assert!(!both.accepts("10"));
    }

    #[test]
    fn test_live_states() {
        let minimal = construct_minimal_dfa(&construct_dfa(&ends_in_one_nfa()));
        assert!(minimal.live_states().all());

        let mut dfa = DFA::new();
        let start = dfa.add_state("start");
        let accept = dfa.add_state("accept");
        let dead = dfa.add_state("dead");
        dfa.set_alphabet(binary());
        dfa.add_transition(start, '0', accept);
        dfa.add_transition(start, '1', dead);
        dfa.add_transition(accept, '0', dead);
        dfa.add_transition(dead, '0', dead);
        dfa.set_accept_state(accept);

        let live = dfa.live_states();
        assert!(live[start]);
        assert!(live[accept]);
        assert!(!live[dead]);
    }

    #[test]
    fn test_count_words_of_length() {
        let parity = redundant_parity_dfa();
        assert_eq!(parity.count_words_of_length(0), 0.0);
        assert_eq!(parity.count_words_of_length(1), 1.0);
        assert_eq!(parity.count_words_of_length(4), 8.0);
    }

    #[test]
    fn test_count_words_over_large_alphabet() {
        let mut universal = DFA::new();
        let only = universal.add_state("all");
        universal.set_alphabet(('a'..='q').collect());
        for c in 'a'..='q' {
            universal.add_transition(only, c, only);
        }
        universal.set_accept_state(only);

        assert_eq!(universal.count_words_of_length(2), 289.0);
        // 17^32 does not fit in 128 bits
        let count = universal.count_words_of_length(32);
        assert!(count.is_finite());
        assert!((count / 17f64.powi(32) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_accepted_words_in_shortlex_order() {
        let ends_in_one = construct_dfa(&ends_in_one_nfa());
        assert_eq!(
            ends_in_one.accepted_words(2, 10),
            vec!["1", "01", "11"]
        );
        assert_eq!(ends_in_one.accepted_words(3, 2), vec!["1", "01"]);
    }

    #[test]
    fn test_is_empty_language() {
        let parity = redundant_parity_dfa();
        assert!(!parity.is_empty_language());
        let nothing = parity.product(&parity, |a, b| a != b);
        assert!(nothing.is_empty_language());
    }

    #[test]
    fn test_read_input() {
        let parity = redundant_parity_dfa();
        assert_eq!(parity.read_input("1"), Some(1));
        assert_eq!(parity.read_input("12"), None);
    }
}
