use std::{
    fmt,
    io::{self, Write},
};

use log::debug;

use crate::ast::ASTNode;
use crate::codegen::{GenerateError, Generator};
use crate::lexer::{Lexer, Token};
use crate::parser::Parser;

pub const DEFAULT_PROMPT: &str = "ready> ";

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum UnitKind {
    Definition,
    Extern,
    TopLevel,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKind::Definition => write!(f, "Parsed a function definition."),
            UnitKind::Extern => write!(f, "Parsed an extern"),
            UnitKind::TopLevel => write!(f, "Parsed a top-level expr"),
        }
    }
}

/// what became of one request for a top-level unit
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Outcome {
    /// end of input, nothing more will be read
    Finished,
    /// a lone `;`
    Skipped,
    Parsed(UnitKind),
    /// the unit parsed but the generator rejected it
    GenerateFailed(UnitKind),
    /// the unit failed to parse and one token was discarded
    ParseFailed,
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct Summary {
    pub units: usize,
    pub parse_failures: usize,
    pub generate_failures: usize,
}

/// Read-parse loop over one session.
///
/// Diagnostics (prompt, parse notices, errors) go to `diagnostics`, while
/// whatever the generator produces goes to `output`.
pub struct Driver<I: Iterator<Item = char>, G, D, O> {
    parser: Parser<I>,
    generator: G,
    diagnostics: D,
    output: O,
    prompt: Option<&'static str>,
    primed: bool,
}

impl<I, G, D, O> Driver<I, G, D, O>
where
    I: Iterator<Item = char>,
    G: Generator,
    D: Write,
    O: Write,
{
    pub fn new(lexer: Lexer<I>, generator: G, diagnostics: D, output: O) -> Self {
        Driver {
            parser: Parser::new(lexer),
            generator,
            diagnostics,
            output,
            prompt: Some(DEFAULT_PROMPT),
            primed: false,
        }
    }

    pub fn with_prompt(mut self, prompt: Option<&'static str>) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn diagnostics(&self) -> &D {
        &self.diagnostics
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    fn report_error(&mut self, err: impl fmt::Display) -> io::Result<()> {
        writeln!(self.diagnostics, "Error: {}", err)
    }

    fn hand_off(
        &mut self,
        kind: UnitKind,
        result: Result<G::Artifact, GenerateError>,
    ) -> io::Result<Outcome> {
        match result {
            Ok(artifact) => {
                writeln!(self.output, "{}", artifact)?;
                Ok(Outcome::Parsed(kind))
            }
            Err(err) => {
                self.report_error(err)?;
                Ok(Outcome::GenerateFailed(kind))
            }
        }
    }

    /// Read and handle exactly one top-level unit.
    ///
    /// A parse failure discards the offending token so the next call always
    /// makes progress. Only end of input finishes the session.
    pub fn run_one_unit(&mut self) -> io::Result<Outcome> {
        if !self.primed {
            self.parser.next_token();
            self.primed = true;
        }

        match self.parser.current() {
            Token::Eof => return Ok(Outcome::Finished),
            Token::Char(';') => {
                self.parser.next_token();
                return Ok(Outcome::Skipped);
            }
            _ => (),
        }

        match self.parser.parse_unit() {
            Ok(ASTNode::Function(function)) => {
                let kind = if function.prototype.is_anonymous() {
                    UnitKind::TopLevel
                } else {
                    UnitKind::Definition
                };
                writeln!(self.diagnostics, "{}", kind)?;
                let result = self.generator.generate_definition(function);
                self.hand_off(kind, result)
            }
            Ok(ASTNode::Extern(prototype)) => {
                writeln!(self.diagnostics, "{}", UnitKind::Extern)?;
                let result = self.generator.generate_prototype(prototype);
                self.hand_off(UnitKind::Extern, result)
            }
            Err(err) => {
                self.report_error(&err)?;
                let skipped = self.parser.next_token();
                debug!("recovering from parse error, skipped {}", skipped);
                Ok(Outcome::ParseFailed)
            }
        }
    }

    /// Prompt for and handle units until end of input.
    pub fn run(&mut self) -> io::Result<Summary> {
        let mut summary = Summary::default();

        loop {
            if let Some(prompt) = self.prompt {
                write!(self.diagnostics, "{}", prompt)?;
                self.diagnostics.flush()?;
            }

            match self.run_one_unit()? {
                Outcome::Finished => break,
                Outcome::Skipped => (),
                Outcome::Parsed(_) => summary.units += 1,
                Outcome::GenerateFailed(_) => {
                    summary.units += 1;
                    summary.generate_failures += 1;
                }
                Outcome::ParseFailed => summary.parse_failures += 1,
            }
        }

        self.output.flush()?;
        Ok(summary)
    }
}
