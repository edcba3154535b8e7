/* Parse classroom regular expressions into syntax trees.
 *
 * Grammar: alphabet symbols, `+` for union, implicit or `.` concatenation, postfix `*`,
 * parentheses and `e` for the empty string. Precedence is star > concatenation > union. A
 * program may start with `NAME = REGEX` lines which later lines can refer to by name. */

use color_eyre::eyre::{Report, Result};
use std::collections::{BTreeSet, HashSet};

use crate::lexer::{tokenize, Token, TokenKind, EMPTY_LETTER};

/// Syntax tree of a regular expression. Trees may be as deep as their source is long, so
/// cloning, comparing and dropping them all use explicit stacks.
#[derive(Debug)]
pub enum RegEx {
    Symbol(char),
    Empty,
    /// Reference to a definition on an earlier line of a [`RegExProgram`].
    Variable(String),
    Union(Box<RegEx>, Box<RegEx>),
    Concat(Box<RegEx>, Box<RegEx>),
    Star(Box<RegEx>),
}

impl RegEx {
    /// Nodes in post-order, left operand before right operand.
    pub fn post_order(&self) -> Vec<&RegEx> {
        let mut order = Vec::new();
        let mut stack = vec![self];

        while let Some(node) = stack.pop() {
            order.push(node);
            match node {
                RegEx::Union(left, right) | RegEx::Concat(left, right) => {
                    stack.push(left.as_ref());
                    stack.push(right.as_ref());
                }
                RegEx::Star(inner) => stack.push(inner.as_ref()),
                RegEx::Symbol(_) | RegEx::Empty | RegEx::Variable(_) => {}
            }
        }
        order.reverse();
        order
    }
}

fn pop_operand(built: &mut Vec<RegEx>) -> Box<RegEx> {
    match built.pop() {
        Some(tree) => Box::new(tree),
        None => unreachable!("operands are rebuilt before their operator"),
    }
}

impl Clone for RegEx {
    fn clone(&self) -> Self {
        let mut built: Vec<RegEx> = Vec::new();

        for node in self.post_order() {
            let copy = match node {
                RegEx::Symbol(c) => RegEx::Symbol(*c),
                RegEx::Empty => RegEx::Empty,
                RegEx::Variable(name) => RegEx::Variable(name.clone()),
                RegEx::Star(_) => RegEx::Star(pop_operand(&mut built)),
                RegEx::Union(..) => {
                    let right = pop_operand(&mut built);
                    RegEx::Union(pop_operand(&mut built), right)
                }
                RegEx::Concat(..) => {
                    let right = pop_operand(&mut built);
                    RegEx::Concat(pop_operand(&mut built), right)
                }
            };
            built.push(copy);
        }

        match built.pop() {
            Some(tree) => tree,
            None => unreachable!("post-order ends with the root"),
        }
    }
}

impl PartialEq for RegEx {
    fn eq(&self, other: &Self) -> bool {
        let mut stack: Vec<(&RegEx, &RegEx)> = vec![(self, other)];

        while let Some(pair) = stack.pop() {
            match pair {
                (RegEx::Symbol(a), RegEx::Symbol(b)) if a == b => {}
                (RegEx::Variable(a), RegEx::Variable(b)) if a == b => {}
                (RegEx::Empty, RegEx::Empty) => {}
                (RegEx::Union(a_left, a_right), RegEx::Union(b_left, b_right))
                | (RegEx::Concat(a_left, a_right), RegEx::Concat(b_left, b_right)) => {
                    stack.push((a_left.as_ref(), b_left.as_ref()));
                    stack.push((a_right.as_ref(), b_right.as_ref()));
                }
                (RegEx::Star(a), RegEx::Star(b)) => stack.push((a.as_ref(), b.as_ref())),
                _ => return false,
            }
        }
        true
    }
}

impl Eq for RegEx {}

fn detach(child: &mut RegEx, stack: &mut Vec<RegEx>) {
    if matches!(child, RegEx::Union(..) | RegEx::Concat(..) | RegEx::Star(_)) {
        stack.push(std::mem::replace(child, RegEx::Empty));
    }
}

fn detach_children(node: &mut RegEx, stack: &mut Vec<RegEx>) {
    match node {
        RegEx::Union(left, right) | RegEx::Concat(left, right) => {
            detach(left, stack);
            detach(right, stack);
        }
        RegEx::Star(inner) => detach(inner, stack),
        RegEx::Symbol(_) | RegEx::Empty | RegEx::Variable(_) => {}
    }
}

impl Drop for RegEx {
    fn drop(&mut self) {
        // Each popped node only owns leaves by the time it goes out of scope
        let mut stack = Vec::new();
        detach_children(self, &mut stack);
        while let Some(mut node) = stack.pop() {
            detach_children(&mut node, &mut stack);
        }
    }
}

/// A parsed multi-line regular expression: its definitions in source order, then the expression
/// whose language is described. Definitions only refer to names defined before them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegExProgram {
    pub definitions: Vec<(String, RegEx)>,
    pub expression: RegEx,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegExError {
    /// A character outside the alphabet and operator set, with its position.
    LexicalError(String, usize),
    SyntaxError(String),
    InvalidTokenOrdering(String),
    InvalidVariableDefinition(String),
}

impl std::fmt::Display for RegExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegExError::LexicalError(message, position) => {
                write!(f, "{} (position {})", message, position)
            }
            RegExError::SyntaxError(message) => write!(f, "{}", message),
            RegExError::InvalidTokenOrdering(message) => write!(f, "{}", message),
            RegExError::InvalidVariableDefinition(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for RegExError {}

type Names = HashSet<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Union,
    Concat,
    GroupOpen,
}

impl Operator {
    fn precedence(self) -> u8 {
        match self {
            Operator::GroupOpen => 0,
            Operator::Union => 1,
            Operator::Concat => 2,
        }
    }
}

/// Check that operators always have their operands and that parentheses balance.
pub fn validate_tokens(tokens: &[Token]) -> Result<(), RegExError> {
    let mut depth = 0usize;
    let mut previous: Option<&Token> = None;

    for token in tokens {
        let after_operand = previous.is_some_and(|p| p.ends_operand());

        match token.get_kind() {
            TokenKind::Union | TokenKind::Concat | TokenKind::Star if !after_operand => {
                return Err(RegExError::InvalidTokenOrdering(format!(
                    "Missing operand before {} at position {}",
                    token.describe(),
                    token.get_position()
                )));
            }
            TokenKind::GroupClose => {
                if !after_operand {
                    return Err(RegExError::InvalidTokenOrdering(format!(
                        "Missing operand before {} at position {}",
                        token.describe(),
                        token.get_position()
                    )));
                }
                if depth == 0 {
                    return Err(RegExError::SyntaxError(format!(
                        "Unbalanced parenthesis at position {}",
                        token.get_position()
                    )));
                }
                depth -= 1;
            }
            TokenKind::GroupOpen => depth += 1,
            _ => {}
        }
        previous = Some(token);
    }

    if let Some(last) = previous {
        if matches!(
            last.get_kind(),
            TokenKind::Union | TokenKind::Concat | TokenKind::GroupOpen
        ) {
            return Err(RegExError::InvalidTokenOrdering(format!(
                "Missing operand after {} at position {}",
                last.describe(),
                last.get_position()
            )));
        }
    }

    if depth > 0 {
        return Err(RegExError::SyntaxError(format!(
            "Unbalanced parenthesis: {} left open",
            depth
        )));
    }

    Ok(())
}

/// Make implicit concatenation explicit by inserting `.` tokens between adjacent operands.
pub fn insert_concat_tokens(tokens: Vec<Token>) -> Vec<Token> {
    let mut result: Vec<Token> = Vec::with_capacity(tokens.len() * 2);

    for token in tokens {
        if let Some(previous) = result.last() {
            if previous.ends_operand() && token.starts_operand() {
                result.push(Token::new(TokenKind::Concat, token.get_position()));
            }
        }
        result.push(token);
    }
    result
}

fn reduce(operands: &mut Vec<RegEx>, operator: Operator) -> Result<(), RegExError> {
    let right = operands.pop();
    let left = operands.pop();

    let (left, right) = match (left, right) {
        (Some(left), Some(right)) => (Box::new(left), Box::new(right)),
        _ => {
            return Err(RegExError::SyntaxError(
                "Operator is missing an operand".to_string(),
            ))
        }
    };

    match operator {
        Operator::Union => operands.push(RegEx::Union(left, right)),
        Operator::Concat => operands.push(RegEx::Concat(left, right)),
        Operator::GroupOpen => {
            return Err(RegExError::SyntaxError(
                "Unbalanced parenthesis".to_string(),
            ))
        }
    }
    Ok(())
}

/// Build a syntax tree from validated tokens with explicit operand and operator stacks.
fn build_syntax_tree(tokens: &[Token], names: &Names) -> Result<RegEx, RegExError> {
    if tokens.is_empty() {
        return Ok(RegEx::Empty);
    }

    let mut operands: Vec<RegEx> = Vec::new();
    let mut operators: Vec<Operator> = Vec::new();

    for token in tokens {
        match token.get_kind() {
            TokenKind::Symbol(c) => operands.push(RegEx::Symbol(*c)),
            TokenKind::Empty => operands.push(RegEx::Empty),
            TokenKind::Variable(name) => {
                if !names.contains(name) {
                    return Err(RegExError::InvalidVariableDefinition(format!(
                        "Invalid variable name '{}'",
                        name
                    )));
                }
                operands.push(RegEx::Variable(name.clone()));
            }
            TokenKind::Star => {
                let inner = operands.pop().ok_or_else(|| {
                    RegExError::SyntaxError(format!(
                        "Nothing to repeat at position {}",
                        token.get_position()
                    ))
                })?;
                operands.push(RegEx::Star(Box::new(inner)));
            }
            TokenKind::Union | TokenKind::Concat => {
                let operator = if *token.get_kind() == TokenKind::Union {
                    Operator::Union
                } else {
                    Operator::Concat
                };
                while let Some(&top) = operators.last() {
                    if top == Operator::GroupOpen || top.precedence() < operator.precedence() {
                        break;
                    }
                    operators.pop();
                    reduce(&mut operands, top)?;
                }
                operators.push(operator);
            }
            TokenKind::GroupOpen => operators.push(Operator::GroupOpen),
            TokenKind::GroupClose => loop {
                match operators.pop() {
                    Some(Operator::GroupOpen) => break,
                    Some(operator) => reduce(&mut operands, operator)?,
                    None => {
                        return Err(RegExError::SyntaxError(format!(
                            "Unbalanced parenthesis at position {}",
                            token.get_position()
                        )))
                    }
                }
            },
        }
    }

    while let Some(operator) = operators.pop() {
        reduce(&mut operands, operator)?;
    }

    match (operands.pop(), operands.is_empty()) {
        (Some(tree), true) => Ok(tree),
        _ => Err(RegExError::SyntaxError(
            "Expression does not reduce to a single term".to_string(),
        )),
    }
}

fn parse_line(regex: &str, alphabet: &BTreeSet<char>, names: &Names) -> Result<RegEx, RegExError> {
    let tokens = tokenize(regex, alphabet)?;

    validate_tokens(&tokens).map_err(|err| match err {
        RegExError::InvalidTokenOrdering(message) => {
            RegExError::InvalidTokenOrdering(format!("'{}': {}", regex.trim(), message))
        }
        err => err,
    })?;

    let tokens = insert_concat_tokens(tokens);
    build_syntax_tree(&tokens, names)
}

/// Split `NAME = REGEX` into its name and body.
fn split_definition(line: &str) -> Option<(&str, &str)> {
    let (name, body) = line.split_once('=')?;
    let name = name.trim();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some((name, body))
}

fn parse_program(text: &str, alphabet: &BTreeSet<char>) -> Result<RegExProgram, RegExError> {
    let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();

    let Some((last, definition_lines)) = lines.split_last() else {
        return Ok(RegExProgram {
            definitions: Vec::new(),
            expression: RegEx::Empty,
        });
    };

    let mut names: Names = HashSet::new();
    let mut definitions = Vec::with_capacity(definition_lines.len());

    for line in definition_lines {
        let (name, body) = split_definition(line).ok_or_else(|| {
            RegExError::InvalidVariableDefinition(format!(
                "Invalid variable assignment in line '{}'",
                line.trim()
            ))
        })?;

        let reserved = name.len() == 1 && name.starts_with(EMPTY_LETTER);
        if reserved || names.contains(name) {
            return Err(RegExError::InvalidVariableDefinition(format!(
                "Variable '{}' is already defined",
                name
            )));
        }

        let tree = parse_line(body, alphabet, &names)?;
        names.insert(name.to_string());
        definitions.push((name.to_string(), tree));
    }

    Ok(RegExProgram {
        definitions,
        expression: parse_line(last, alphabet, &names)?,
    })
}

/// Parse a single regular expression. Empty input parses to [`RegEx::Empty`].
pub fn parse_regex(regex: &str, alphabet: &BTreeSet<char>) -> Result<RegEx> {
    parse_line(regex, alphabet, &HashSet::new()).map_err(Report::new)
}

/// Parse a multi-line regular expression whose leading lines define variables.
pub fn parse_regex_lines(text: &str, alphabet: &BTreeSet<char>) -> Result<RegExProgram> {
    parse_program(text, alphabet).map_err(Report::new)
}
