use std::fmt;

use crate::ast::{ASTNode, Function, Prototype};

#[derive(Debug, PartialEq, Clone, thiserror::Error)]
pub enum GenerateError {
    #[error("unknown variable referenced {0}")]
    UnknownVariable(String),
    #[error("unknown operator {0}")]
    UnknownOperator(char),
    #[error("unknown function {0}")]
    UnknownFunction(String),
    #[error("invalid number of args in call {0} expected {1} found {2}")]
    InvalidCall(String, usize, usize),
    #[error("function {0} cannot be redefined")]
    Redefinition(String),
    #[error("no native function {0}")]
    UnknownNative(String),
    #[error("extern {0} declared with {2} args but the native takes {1}")]
    InvalidExtern(String, usize, usize),
    #[error("call depth exceeded in {0}")]
    RecursionLimit(String),
    #[error("expression nested deeper than {0} levels")]
    TooDeep(usize),
}

/// Consumer of parsed units.
///
/// Each unit is moved in whole once the parser is done with it. The driver
/// writes a produced artifact to its output and a failure to its
/// diagnostics.
pub trait Generator {
    type Artifact: fmt::Display;

    fn generate_definition(&mut self, function: Function) -> Result<Self::Artifact, GenerateError>;

    fn generate_prototype(&mut self, prototype: Prototype)
        -> Result<Self::Artifact, GenerateError>;
}

/// Renders every unit back to source text.
#[derive(Debug, Default, Clone)]
pub struct SourceGenerator;

impl Generator for SourceGenerator {
    type Artifact = String;

    fn generate_definition(&mut self, function: Function) -> Result<String, GenerateError> {
        Ok(ASTNode::Function(function).to_string())
    }

    fn generate_prototype(&mut self, prototype: Prototype) -> Result<String, GenerateError> {
        Ok(ASTNode::Extern(prototype).to_string())
    }
}
