/* Text renderings of automata: Graphviz DOT graphs and step-by-step runs */

use petgraph::dot::Dot;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::prelude::StableGraph;
use std::collections::HashMap;

pub use crate::fa::format_state_set;
use crate::fa::FA;

fn node_label<T: FA + ?Sized>(fa: &T, state_id: usize) -> String {
    let mut label = String::new();
    if state_id == fa.get_start_state() {
        label.push_str("Start\n");
    }
    if fa.get_acceptor_states()[state_id] {
        label.push_str("Accept\n");
    }
    label.push_str(&format!("State {}", fa.get_state_label(state_id)));
    label
}

/// Render `fa` as a DOT graph. Parallel transitions between two states share one edge whose label
/// lists their symbols.
pub fn to_dot<T: FA + ?Sized>(fa: &T) -> String {
    let mut stable_graph: StableGraph<String, String> = StableGraph::new();
    let mut edge_map: HashMap<(NodeIndex, NodeIndex), EdgeIndex> = HashMap::new();

    let num_states = fa.get_num_states();

    for state_idx in 0..num_states {
        stable_graph.add_node(node_label(fa, state_idx));
    }

    for state_idx in 0..num_states {
        let source = NodeIndex::new(state_idx);

        for (symbol, target) in fa.get_state_transitions(state_idx) {
            let target = NodeIndex::new(target);
            let edge_label = symbol.to_string();

            match edge_map.get(&(source, target)) {
                Some(edge_idx) => {
                    let merged = format!("{}, {}", stable_graph[*edge_idx], edge_label);
                    stable_graph[*edge_idx] = merged;
                }
                None => {
                    let edge_idx = stable_graph.add_edge(source, target, edge_label);
                    edge_map.insert((source, target), edge_idx);
                }
            }
        }
    }

    format!("{}", Dot::new(&stable_graph))
}

/// One line per step of the run of `fa` on `input`, followed by the verdict.
pub fn describe_run<T: FA + ?Sized>(fa: &T, input: &str) -> String {
    let run = fa.run(input);
    let mut lines = Vec::with_capacity(run.len() + 1);

    let mut steps = run.steps();
    if let Some(initial) = steps.next() {
        lines.push(format!("start: {}", format_state_set(fa, initial)));
    }
    for (c, active) in input.chars().zip(steps) {
        lines.push(format!("read '{}': {}", c, format_state_set(fa, active)));
    }

    let verdict = match run.rejected_at() {
        Some(position) => format!("rejected: no active state after symbol {}", position + 1),
        None if run.is_accepted() => "accepted".to_string(),
        None => "rejected: no accepting state is active".to_string(),
    };
    lines.push(verdict);
    lines.join("\n")
}
