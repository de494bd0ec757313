use std::{cell::RefCell, fmt, io, io::BufRead, rc::Rc, vec};

use lazy_static::lazy_static;
use log::{trace, warn};
use regex::Regex;

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Eof,
    Def,
    Extern,
    Ident(String),
    Number(f64),
    /// any other character, passed through unclassified
    Char(char),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Eof => write!(f, "end of input"),
            Token::Def => write!(f, "'def'"),
            Token::Extern => write!(f, "'extern'"),
            Token::Ident(ident) => write!(f, "identifier '{}'", ident),
            Token::Number(num) => write!(f, "number {}", num),
            Token::Char(c) => write!(f, "'{}'", c),
        }
    }
}

lazy_static! {
    static ref NUMBER_PREFIX_RE: Regex = Regex::new(r"^(\d+\.?\d*|\.\d+)").unwrap();
}

/// convert a run of digits and dots like `strtod` would - the longest valid
/// prefix is used and text with no valid prefix reads as zero
fn parse_number(text: &str) -> f64 {
    let prefix = NUMBER_PREFIX_RE.find(text).map_or("", |m| m.as_str());
    if prefix.len() != text.len() {
        warn!("numeric literal {:?} read as {:?}", text, prefix);
    }
    prefix.parse().unwrap_or(0.0)
}

/// Pull-based tokenizer over any character source.
///
/// The only state kept between calls is the character read past the end of
/// the previous token. Nothing is read until the first token is requested,
/// so an interactive prompt can be written before the source blocks.
pub struct Lexer<I: Iterator<Item = char>> {
    chars: I,
    last_char: Option<char>,
}

impl<I: Iterator<Item = char>> Lexer<I> {
    pub fn new(chars: I) -> Self {
        Lexer {
            chars,
            last_char: Some(' '),
        }
    }

    fn advance(&mut self) {
        self.last_char = self.chars.next();
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut buf = String::new();
        while let Some(c) = self.last_char.filter(|&c| pred(c)) {
            buf.push(c);
            self.advance();
        }
        buf
    }

    pub fn next_token(&mut self) -> Token {
        let token = loop {
            while matches!(self.last_char, Some(c) if c.is_whitespace()) {
                self.advance();
            }

            let c = match self.last_char {
                Some(c) => c,
                None => break Token::Eof,
            };

            if c.is_alphabetic() {
                let ident = self.take_while(char::is_alphanumeric);
                break match ident.as_str() {
                    "def" => Token::Def,
                    "extern" => Token::Extern,
                    _ => Token::Ident(ident),
                };
            }

            if c.is_ascii_digit() || c == '.' {
                let num = self.take_while(|c| c.is_ascii_digit() || c == '.');
                break Token::Number(parse_number(&num));
            }

            if c == '#' {
                while !matches!(self.last_char, None | Some('\n') | Some('\r')) {
                    self.advance();
                }
                continue;
            }

            self.advance();
            break Token::Char(c);
        };
        trace!("lexed {}", token);
        token
    }
}

impl<I: Iterator<Item = char>> Iterator for Lexer<I> {
    type Item = Token;

    /// yields tokens up to, but not including, the end of input
    fn next(&mut self) -> Option<Token> {
        match self.next_token() {
            Token::Eof => None,
            token => Some(token),
        }
    }
}

/// where a [`ReadChars`] leaves the error that stopped it
pub type ReadError = Rc<RefCell<Option<io::Error>>>;

/// Characters from a reader, one line at a time, so interactive input is
/// tokenized as it arrives.
///
/// Bytes that are not UTF-8 become U+FFFD and reach the lexer like any
/// other character. A failed read ends the characters early and leaves the
/// error in the handle from [`ReadChars::error`].
pub struct ReadChars<R: BufRead> {
    reader: R,
    line: vec::IntoIter<char>,
    error: ReadError,
}

impl<R: BufRead> ReadChars<R> {
    pub fn new(reader: R) -> Self {
        ReadChars {
            reader,
            line: Vec::new().into_iter(),
            error: ReadError::default(),
        }
    }

    pub fn error(&self) -> ReadError {
        Rc::clone(&self.error)
    }
}

impl<R: BufRead> Iterator for ReadChars<R> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        loop {
            if let Some(c) = self.line.next() {
                return Some(c);
            }

            if self.error.borrow().is_some() {
                return None;
            }

            // a failed read may still have filled part of the line
            let mut buf = Vec::new();
            let read = self.reader.read_until(b'\n', &mut buf);
            self.line = String::from_utf8_lossy(&buf)
                .chars()
                .collect::<Vec<_>>()
                .into_iter();
            match read {
                Ok(0) => return None,
                Ok(_) => (),
                Err(err) => *self.error.borrow_mut() = Some(err),
            }
        }
    }
}

/// lex the whole of the given input string, in source order
pub fn lex(input: &str) -> Vec<Token> {
    Lexer::new(input.chars()).collect()
}
