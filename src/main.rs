use clap::{Arg, ArgAction, ArgMatches, Command};
use color_eyre::eyre::{Result, WrapErr};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use fagrade::codec::{encode, from_json_with, to_json, DecodeOptions};
use fagrade::config::GradingConfig;
use fagrade::dfa::{construct_minimal_dfa, DFA};
use fagrade::equivalence::{check_equivalence, Verdict};
use fagrade::fa::{Automaton, FA};
use fagrade::feedback::{check_languages, compute_partial_credit, feedback_text, MAX_WORD_LIMIT};
use fagrade::nfa::compile_regex;
use fagrade::visualizer::{describe_run, to_dot};

fn alphabet_arg() -> Arg {
    Arg::new("alphabet")
        .short('a')
        .long("alphabet")
        .value_name("SYMBOLS")
        .help("Input symbols used when an operand is a regular expression, e.g. 01")
        .value_parser(clap::value_parser!(String))
}

fn automaton_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .value_name("JSON FILE | REGEX")
        .help(help)
        .value_parser(clap::value_parser!(String))
        .required(true)
}

fn cli() -> Command {
    Command::new("fagrade")
        .version("0.1.0")
        .about("Compile regular expressions, compare automata and produce grading feedback")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("compile")
                .about("Compile a regular expression and print its canonical JSON form")
                .arg(
                    Arg::new("regex")
                        .short('r')
                        .long("regex")
                        .value_name("REGEX")
                        .help("Regular expression to compile. Earlier lines may define NAME = REGEX")
                        .value_parser(clap::value_parser!(String))
                        .required(true),
                )
                .arg(alphabet_arg())
                .arg(
                    Arg::new("dfa")
                        .long("dfa")
                        .help("Print the DFA obtained by subset construction")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("minimal"),
                )
                .arg(
                    Arg::new("minimal")
                        .long("minimal")
                        .help("Print the minimal DFA")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Check a candidate automaton against a reference")
                .arg(automaton_arg("candidate", "The submitted automaton"))
                .arg(automaton_arg("reference", "The automaton defining the language"))
                .arg(alphabet_arg())
                .arg(
                    Arg::new("max-length")
                        .short('l')
                        .long("max-length")
                        .value_name("LENGTH")
                        .help("Longest counterexample to search for and to list in feedback")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("strict")
                        .long("strict")
                        .help("Reject JSON automata with unreachable states, no accepting state or repeated transitions")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("dump-state")
                        .long("dump-state")
                        .help("Send missing DFA transitions in JSON automata to a dump state")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .value_name("CONFIG FILE")
                        .help("JSON file with grading parameters")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("run")
                .about("Run an automaton on an input, one step at a time")
                .arg(automaton_arg("automaton", "The automaton to run"))
                .arg(alphabet_arg())
                .arg(
                    Arg::new("input")
                        .short('i')
                        .long("input")
                        .value_name("INPUT")
                        .help("The input word")
                        .value_parser(clap::value_parser!(String))
                        .default_value(""),
                ),
        )
        .subcommand(
            Command::new("dot")
                .about("Print an automaton as a Graphviz DOT graph")
                .arg(automaton_arg("automaton", "The automaton to draw"))
                .arg(alphabet_arg()),
        )
}

fn alphabet_of(args: &ArgMatches, config: &GradingConfig) -> BTreeSet<char> {
    match args.get_one::<String>("alphabet") {
        Some(symbols) => symbols.chars().filter(|c| !c.is_whitespace()).collect(),
        None => config.alphabet(),
    }
}

/// An operand naming an existing file is read as canonical JSON, anything else is a regex.
fn load_automaton(
    operand: &str,
    alphabet: &BTreeSet<char>,
    options: &DecodeOptions,
) -> Result<Automaton> {
    let path = Path::new(operand);
    if path.is_file() {
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read automaton file {}", path.display()))?;
        return from_json_with(&text, options)
            .wrap_err_with(|| format!("Invalid automaton in {}", path.display()));
    }
    Ok(Automaton::from(compile_regex(operand, alphabet)?))
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> &'a str {
    args.get_one::<String>(name).map(String::as_str).unwrap_or_default()
}

fn compile_command(args: &ArgMatches) -> Result<()> {
    let alphabet = alphabet_of(args, &GradingConfig::default());
    let nfa = compile_regex(required(args, "regex"), &alphabet)?;

    let automaton = if args.get_flag("minimal") {
        Automaton::from(construct_minimal_dfa(&fagrade::construct_dfa(&nfa)))
    } else if args.get_flag("dfa") {
        Automaton::from(fagrade::construct_dfa(&nfa))
    } else {
        Automaton::from(nfa)
    };

    println!("{}", to_json(&encode(&automaton))?);
    Ok(())
}

fn check_command(args: &ArgMatches) -> Result<()> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => GradingConfig::load(path)?,
        None => GradingConfig::default(),
    };
    if let Some(symbols) = args.get_one::<String>("alphabet") {
        config.alphabet = symbols.clone();
    }
    if let Some(max_length) = args.get_one::<usize>("max-length") {
        config.max_length_to_check = *max_length;
        config.search_bound = *max_length;
    }

    let mut options = if args.get_flag("strict") {
        DecodeOptions::strict()
    } else {
        DecodeOptions::default()
    };
    options.dump_state = args.get_flag("dump-state");

    let alphabet = config.alphabet();
    let candidate = load_automaton(required(args, "candidate"), &alphabet, &options)?;
    let reference = load_automaton(
        required(args, "reference"),
        &alphabet,
        &DecodeOptions::default(),
    )?;

    let verdict = check_equivalence(&candidate, &reference, config.search_bound)?;
    println!("{}", verdict);

    if let Verdict::Equivalent = verdict {
        return Ok(());
    }

    let difference = check_languages(
        &candidate,
        &reference,
        config.max_length_to_check,
        config.max_examples,
    )?;
    println!();
    println!(
        "{}",
        feedback_text(&difference, config.max_length_to_check, "automaton")
    );

    let minimal_candidate: DFA = construct_minimal_dfa(&candidate.determinize());
    let minimal_reference: DFA = construct_minimal_dfa(&reference.determinize());
    let word_limit = (2 * minimal_reference.get_num_states()).min(MAX_WORD_LIMIT);
    let credit = compute_partial_credit(&minimal_candidate, &minimal_reference, Some(word_limit))?;
    println!();
    println!("Partial credit: {:.4}", credit);
    Ok(())
}

fn run_command(args: &ArgMatches) -> Result<()> {
    let alphabet = alphabet_of(args, &GradingConfig::default());
    let automaton = load_automaton(
        required(args, "automaton"),
        &alphabet,
        &DecodeOptions::default(),
    )?;
    println!("{}", describe_run(automaton.as_fa(), required(args, "input")));
    Ok(())
}

fn dot_command(args: &ArgMatches) -> Result<()> {
    let alphabet = alphabet_of(args, &GradingConfig::default());
    let automaton = load_automaton(
        required(args, "automaton"),
        &alphabet,
        &DecodeOptions::default(),
    )?;
    println!("{}", to_dot(automaton.as_fa()));
    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let args = cli().get_matches();

    match args.subcommand() {
        Some(("compile", sub_args)) => compile_command(sub_args),
        Some(("check", sub_args)) => check_command(sub_args),
        Some(("run", sub_args)) => run_command(sub_args),
        Some(("dot", sub_args)) => dot_command(sub_args),
        _ => Ok(()),
    }
}
