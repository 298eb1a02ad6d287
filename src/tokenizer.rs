use std::fmt::Display;

use num_bigint::BigInt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    // Single-character tokens
    LeftParen,
    RightParen,
    Minus,
    Plus,
    Slash,
    Star,
    Caret,

    // A run of `!` that is not part of `!=`; its length picks the factorial
    Bang(usize),

    // One or two character tokens
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    // Literals
    Identifier(String),
    String(String),
    Integer(BigInt),

    // Keywords
    And,
    Or,
    Not,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::Minus => write!(f, "-"),
            Token::Plus => write!(f, "+"),
            Token::Slash => write!(f, "/"),
            Token::Star => write!(f, "*"),
            Token::Caret => write!(f, "^"),
            Token::Bang(count) => write!(f, "{}", "!".repeat(*count)),
            Token::BangEqual => write!(f, "!="),
            Token::Equal => write!(f, "="),
            Token::EqualEqual => write!(f, "=="),
            Token::Greater => write!(f, ">"),
            Token::GreaterEqual => write!(f, ">="),
            Token::Less => write!(f, "<"),
            Token::LessEqual => write!(f, "<="),
            Token::Identifier(name) => write!(f, "{}", name),
            Token::String(s) => write!(f, "\"{}\"", s),
            Token::Integer(n) => write!(f, "{}", n),
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::Not => write!(f, "not"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenizeError {
    #[error("Invalid character: {0}")]
    UnexpectedCharacter(char),
    #[error("Unterminated string literal")]
    UnterminatedString,
    #[error("Unfinished escape sequence in string")]
    UnfinishedEscape,
}

pub fn tokens(source: &str) -> Result<Vec<Token>, TokenizeError> {
    let mut tokens = Vec::new();
    let mut remaining = source;

    while let Some((token, rest)) = token(remaining)? {
        remaining = rest;
        tokens.push(token);
    }

    Ok(tokens)
}

/// Reads the next token, or `None` once only whitespace is left.
pub fn token(mut source: &str) -> Result<Option<(Token, &str)>, TokenizeError> {
    if let Some((_, rest)) = whitespace(source) {
        source = rest;
    }

    if source.is_empty() {
        return Ok(None);
    }

    maximal(
        &[
            // Single-character tokens
            left_paren,
            right_paren,
            minus,
            plus,
            slash,
            star,
            caret,
            // one or two character tokens
            bang,
            bang_equal,
            equal,
            equal_equal,
            greater,
            greater_equal,
            less,
            less_equal,
            // keywords
            and,
            or,
            not,
            // literals
            identifier,
            string,
            integer,
        ],
        source,
    )
    .map(Some)
    .ok_or_else(|| unmatched(source))
}

fn unmatched(source: &str) -> TokenizeError {
    match source.chars().next() {
        Some('"' | '\'') => match scan_string(source) {
            Err(e) => e,
            Ok(_) => TokenizeError::UnterminatedString,
        },
        Some(c) => TokenizeError::UnexpectedCharacter(c),
        None => TokenizeError::UnterminatedString,
    }
}

fn maximal<'a, T: std::fmt::Debug>(
    parsers: &[fn(&str) -> Option<(T, &str)>],
    source: &'a str,
) -> Option<(T, &'a str)> {
    let mut min_left = source.len() + 1;
    let mut max_match = None;

    let matching_parsers = parsers.iter().filter_map(|parser| parser(source));
    for (m, rest) in matching_parsers {
        let left = rest.len();
        if left < min_left {
            min_left = left;
            max_match = Some((m, rest));
        }
    }

    max_match
}

fn whitespace(source: &str) -> Option<((), &str)> {
    let len = source
        .chars()
        .take_while(|c| c.is_ascii_whitespace())
        .map(char::len_utf8)
        .sum();
    if len > 0 {
        Some(((), &source[len..]))
    } else {
        None
    }
}

macro_rules! match_literal {
    ($name:ident, $word:literal, $token:expr) => {
        fn $name(source: &str) -> Option<(Token, &str)> {
            if source.starts_with($word) {
                Some(($token, &source[$word.len()..]))
            } else {
                None
            }
        }
    };
}

match_literal! { left_paren, "(", Token::LeftParen }
match_literal! { right_paren, ")", Token::RightParen }
match_literal! { minus, "-", Token::Minus }
match_literal! { plus, "+", Token::Plus }
match_literal! { slash, "/", Token::Slash }
match_literal! { star, "*", Token::Star }
match_literal! { caret, "^", Token::Caret }
match_literal! { equal, "=", Token::Equal }
match_literal! { greater, ">", Token::Greater }
match_literal! { less, "<", Token::Less }
match_literal! { bang_equal, "!=", Token::BangEqual }
match_literal! { equal_equal, "==", Token::EqualEqual }
match_literal! { greater_equal, ">=", Token::GreaterEqual }
match_literal! { less_equal, "<=", Token::LessEqual }
match_literal! { and, "and", Token::And }
match_literal! { or, "or", Token::Or }
match_literal! { not, "not", Token::Not }

fn bang(source: &str) -> Option<(Token, &str)> {
    let count = source.chars().take_while(|c| *c == '!').count();
    if count > 0 {
        Some((Token::Bang(count), &source[count..]))
    } else {
        None
    }
}

fn identifier(source: &str) -> Option<(Token, &str)> {
    let len = source
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .count();

    if len > 0 {
        Some((Token::Identifier(source[..len].to_string()), &source[len..]))
    } else {
        None
    }
}

fn integer(source: &str) -> Option<(Token, &str)> {
    let len = source.chars().take_while(|c| c.is_ascii_digit()).count();
    if len == 0 {
        return None;
    }

    let value = source[..len].parse::<BigInt>().ok()?;
    Some((Token::Integer(value), &source[len..]))
}

fn string(source: &str) -> Option<(Token, &str)> {
    let (content, len) = scan_string(source).ok()?;
    Some((Token::String(content), &source[len..]))
}

/// Scans a quoted literal, returning its unescaped content and the byte length consumed
/// including both delimiters. A backslash copies the next character as is.
fn scan_string(source: &str) -> Result<(String, usize), TokenizeError> {
    let mut chars = source.char_indices();
    let delimiter = match chars.next() {
        Some((_, c @ ('"' | '\''))) => c,
        Some((_, c)) => return Err(TokenizeError::UnexpectedCharacter(c)),
        None => return Err(TokenizeError::UnterminatedString),
    };

    let mut content = String::new();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, escaped)) => content.push(escaped),
                None => return Err(TokenizeError::UnfinishedEscape),
            },
            c if c == delimiter => return Ok((content, i + c.len_utf8())),
            c => content.push(c),
        }
    }

    Err(TokenizeError::UnterminatedString)
}
