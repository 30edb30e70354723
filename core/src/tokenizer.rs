use crate::index::fold_term;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::fmt;

lazy_static! {
    // Runs of ASCII word characters; only whole runs are candidates for keyword operators.
    static ref ASCII_WORD: Regex = Regex::new(r"[A-Z0-9_]+").expect("valid regex");
}

const SYMBOLS: [char; 5] = ['&', '|', '!', '(', ')'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    And,
    Or,
    Not,
    LParen,
    RParen,
    Term(String),
}

impl Token {
    fn from_piece(piece: &str) -> Token {
        match piece {
            "&" => Token::And,
            "|" => Token::Or,
            "!" => Token::Not,
            "(" => Token::LParen,
            ")" => Token::RParen,
            _ => Token::Term(piece.to_string()),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::And => f.write_str("&"),
            Token::Or => f.write_str("|"),
            Token::Not => f.write_str("!"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::Term(t) => f.write_str(t),
        }
    }
}

/// Rewrite a raw boolean expression into its canonical symbolic form:
/// case-folded, full-width parentheses made half-width, `AND`/`OR`/`NOT`
/// replaced by `&`/`|`/`!`, and every symbol padded with spaces.
///
/// Keywords are only replaced as whole ASCII words; one embedded in a longer
/// word (`BRAND`, `ORANGE`) stays part of that term.
pub fn normalize(expr: &str) -> String {
    let folded = fold_term(expr).replace('（', "(").replace('）', ")");
    let symbolic = ASCII_WORD.replace_all(&folded, |caps: &Captures| match &caps[0] {
        "AND" => "&".to_string(),
        "OR" => "|".to_string(),
        "NOT" => "!".to_string(),
        word => word.to_string(),
    });
    let mut padded = String::with_capacity(symbolic.len() * 2);
    for ch in symbolic.chars() {
        if SYMBOLS.contains(&ch) {
            padded.push(' ');
            padded.push(ch);
            padded.push(' ');
        } else {
            padded.push(ch);
        }
    }
    padded
}

/// Split a raw boolean expression into operator, parenthesis and term tokens.
/// An empty or blank expression yields no tokens.
pub fn tokenize(expr: &str) -> Vec<Token> {
    normalize(expr).split_whitespace().map(Token::from_piece).collect()
}

/// Space-separated canonical form of a token stream.
pub fn render(tokens: &[Token]) -> String {
    tokens.iter().map(Token::to_string).collect::<Vec<_>>().join(" ")
}
