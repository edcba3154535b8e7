//! # fagrade
//!
//! Automata toolkit for grading theory of computation exercises.
//!
//! This library provides functionality to:
//! - Parse regular expressions, including multi-line programs with named definitions
//! - Convert regular expressions to NFAs using Thompson Construction
//! - Convert NFAs to DFAs using Subset Construction and minimize them with Hopcroft partition refinement
//! - Simulate automata step by step
//! - Serialize automata to and from a canonical JSON form
//! - Check two automata for equivalence and find the shortest counterexample
//! - Produce grading feedback and partial credit for a submitted automaton
//! - Verify fooling sets against a membership oracle
//! - Render automata as Graphviz DOT graphs

pub mod codec;
pub mod config;
pub mod dfa;
pub mod equivalence;
pub mod fa;
pub mod feedback;
pub mod fooling_set;
pub mod lexer;
pub mod nfa;
pub mod reg_ex;
pub mod visualizer;

// Re-export commonly used functions for convenience
pub use codec::{decode, encode, from_json, to_json};
pub use config::GradingConfig;
pub use dfa::{construct_dfa, construct_minimal_dfa};
pub use equivalence::{check_equivalence, Verdict};
pub use fa::{Automaton, FA};
pub use feedback::{check_languages, compute_partial_credit, feedback_text};
pub use fooling_set::{check_distinguishing_suffix, verify_fooling_set};
pub use nfa::{compile_regex, construct_nfa, construct_program_nfa};
pub use reg_ex::{parse_regex, parse_regex_lines, RegEx, RegExProgram};
pub use visualizer::{describe_run, to_dot};
