/* Split a regular expression into tokens. Alphabet symbols become one token each so that a
 * trailing star only ever binds to the last symbol of a run. */

use std::collections::BTreeSet;

use crate::reg_ex::RegExError;

/// The letter reserved for the empty string.
pub const EMPTY_LETTER: char = 'e';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Symbol(char),
    Union,
    Star,
    Concat,
    GroupOpen,
    GroupClose,
    Empty,
    Variable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    position: usize,
}

impl Token {
    pub fn new(kind: TokenKind, position: usize) -> Self {
        Token { kind, position }
    }

    pub fn get_kind(&self) -> &TokenKind {
        &self.kind
    }

    /// Character offset of the token in the source text.
    pub fn get_position(&self) -> usize {
        self.position
    }

    /// Tokens which can start an operand.
    pub(crate) fn starts_operand(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Symbol(_) | TokenKind::Empty | TokenKind::Variable(_) | TokenKind::GroupOpen
        )
    }

    /// Tokens after which an operand is complete.
    pub(crate) fn ends_operand(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Symbol(_)
                | TokenKind::Empty
                | TokenKind::Variable(_)
                | TokenKind::GroupClose
                | TokenKind::Star
        )
    }

    pub(crate) fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Symbol(c) => format!("'{}'", c),
            TokenKind::Union => "'+'".to_string(),
            TokenKind::Star => "'*'".to_string(),
            TokenKind::Concat => "'.'".to_string(),
            TokenKind::GroupOpen => "'('".to_string(),
            TokenKind::GroupClose => "')'".to_string(),
            TokenKind::Empty => format!("'{}'", EMPTY_LETTER),
            TokenKind::Variable(name) => format!("'{}'", name),
        }
    }
}

fn is_blank(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r')
}

fn run_length(chars: &[char], start: usize, pred: impl Fn(char) -> bool) -> usize {
    chars[start..].iter().take_while(|&&ch| pred(ch)).count()
}

/// Tokenize `regex` over `alphabet`. Fails with a lexical error at the first character that is
/// neither an operator, an alphabet symbol, a letter nor a blank.
pub fn tokenize(regex: &str, alphabet: &BTreeSet<char>) -> Result<Vec<Token>, RegExError> {
    let chars: Vec<char> = regex.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let ch = chars[pos];

        let operator = match ch {
            '+' => Some(TokenKind::Union),
            '*' => Some(TokenKind::Star),
            '.' => Some(TokenKind::Concat),
            '(' => Some(TokenKind::GroupOpen),
            ')' => Some(TokenKind::GroupClose),
            _ => None,
        };

        if let Some(kind) = operator {
            tokens.push(Token::new(kind, pos));
            pos += 1;
            continue;
        }

        // Longest match between a run of alphabet symbols and a run of letters, symbols win ties
        let symbol_run = run_length(&chars, pos, |c| alphabet.contains(&c));
        let letter_run = run_length(&chars, pos, |c| c.is_ascii_alphabetic());

        if symbol_run > 0 && symbol_run >= letter_run {
            for offset in 0..symbol_run {
                tokens.push(Token::new(TokenKind::Symbol(chars[pos + offset]), pos + offset));
            }
            pos += symbol_run;
        } else if letter_run > 0 {
            let name: String = chars[pos..pos + letter_run].iter().collect();
            let kind = if name.len() == 1 && name.starts_with(EMPTY_LETTER) {
                TokenKind::Empty
            } else {
                TokenKind::Variable(name)
            };
            tokens.push(Token::new(kind, pos));
            pos += letter_run;
        } else if is_blank(ch) {
            pos += 1;
        } else {
            return Err(RegExError::LexicalError(
                format!("Invalid character '{}' in '{}'", ch, regex),
                pos,
            ));
        }
    }

    Ok(tokens)
}
