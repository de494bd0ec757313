use std::{collections::HashMap, fmt};

use log::debug;

use crate::ast::{Expression, Function, Prototype, MAX_EXPR_DEPTH};
use crate::codegen::{GenerateError, Generator};

/// deepest evaluation before giving up, counting every expression level and
/// every call on the way down
pub const MAX_EVAL_DEPTH: usize = 512;

type Native = fn(&[f64]) -> f64;

/// the host functions an `extern` can bind to, with their arity
fn native(name: &str) -> Option<(usize, Native)> {
    let native: (usize, Native) = match name {
        "sin" => (1, |args: &[f64]| args[0].sin()),
        "cos" => (1, |args: &[f64]| args[0].cos()),
        "tan" => (1, |args: &[f64]| args[0].tan()),
        "sqrt" => (1, |args: &[f64]| args[0].sqrt()),
        "exp" => (1, |args: &[f64]| args[0].exp()),
        "log" => (1, |args: &[f64]| args[0].ln()),
        "fabs" => (1, |args: &[f64]| args[0].abs()),
        "floor" => (1, |args: &[f64]| args[0].floor()),
        "ceil" => (1, |args: &[f64]| args[0].ceil()),
        "pow" => (2, |args: &[f64]| args[0].powf(args[1])),
        "fmin" => (2, |args: &[f64]| args[0].min(args[1])),
        "fmax" => (2, |args: &[f64]| args[0].max(args[1])),
        _ => return None,
    };
    Some(native)
}

#[derive(Debug, PartialEq, Clone)]
pub enum Evaluation {
    Declared(String),
    Defined(String),
    Value(f64),
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluation::Declared(name) => write!(f, "declared extern {}", name),
            Evaluation::Defined(name) => write!(f, "defined {}", name),
            Evaluation::Value(value) => write!(f, "Evaluated to {}", value),
        }
    }
}

/// Tree-walking generator.
///
/// Definitions are checked for unknown names and call arity when they are
/// handed over, then kept for later calls. Top-level expressions are checked
/// the same way and evaluated immediately.
#[derive(Default)]
pub struct Evaluator {
    functions: HashMap<String, Function>,
    externs: HashMap<String, (usize, Native)>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.functions.contains_key(name) || self.externs.contains_key(name)
    }

    fn arity(&self, callee: &str, current: &Prototype) -> Option<usize> {
        if callee == current.name {
            return Some(current.args.len());
        }
        match self.functions.get(callee) {
            Some(function) => Some(function.prototype.args.len()),
            None => self.externs.get(callee).map(|(arity, _)| *arity),
        }
    }

    /// resolve every name in `expr` against `proto` and what is already known
    fn check(&self, expr: &Expression, proto: &Prototype) -> Result<(), GenerateError> {
        match expr {
            Expression::Literal(_) => Ok(()),
            Expression::Variable(name) => {
                if proto.args.contains(name) {
                    Ok(())
                } else {
                    Err(GenerateError::UnknownVariable(name.clone()))
                }
            }
            Expression::Binary(op, left, right) => {
                if !matches!(op, '+' | '-' | '*' | '<') {
                    return Err(GenerateError::UnknownOperator(*op));
                }
                self.check(left, proto)?;
                self.check(right, proto)
            }
            Expression::Call(callee, args) => {
                let arity = self
                    .arity(callee, proto)
                    .ok_or_else(|| GenerateError::UnknownFunction(callee.clone()))?;
                if arity != args.len() {
                    return Err(GenerateError::InvalidCall(callee.clone(), arity, args.len()));
                }
                args.iter().try_for_each(|arg| self.check(arg, proto))
            }
        }
    }

    fn eval_expr(
        &self,
        expr: &Expression,
        named_values: &HashMap<&str, f64>,
        depth: usize,
    ) -> Result<f64, GenerateError> {
        match expr {
            Expression::Literal(value) => Ok(*value),
            Expression::Variable(name) => named_values
                .get(name.as_str())
                .copied()
                .ok_or_else(|| GenerateError::UnknownVariable(name.clone())),
            Expression::Binary(op, left, right) => {
                let lhs = self.eval_expr(left, named_values, depth + 1)?;
                let rhs = self.eval_expr(right, named_values, depth + 1)?;

                match op {
                    '+' => Ok(lhs + rhs),
                    '-' => Ok(lhs - rhs),
                    '*' => Ok(lhs * rhs),
                    // unordered operands compare as less
                    '<' => Ok(if lhs < rhs || lhs.is_nan() || rhs.is_nan() {
                        1.0
                    } else {
                        0.0
                    }),
                    _ => Err(GenerateError::UnknownOperator(*op)),
                }
            }
            Expression::Call(callee, args) => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg, named_values, depth + 1)?);
                }
                self.call(callee, &values, depth + 1)
            }
        }
    }

    fn call(&self, callee: &str, args: &[f64], depth: usize) -> Result<f64, GenerateError> {
        if depth > MAX_EVAL_DEPTH {
            return Err(GenerateError::RecursionLimit(callee.to_string()));
        }

        if let Some(function) = self.functions.get(callee) {
            let params = &function.prototype.args;
            if params.len() != args.len() {
                return Err(GenerateError::InvalidCall(
                    callee.to_string(),
                    params.len(),
                    args.len(),
                ));
            }
            let named_values: HashMap<&str, f64> = params
                .iter()
                .map(String::as_str)
                .zip(args.iter().copied())
                .collect();
            return self.eval_expr(&function.body, &named_values, depth);
        }

        match self.externs.get(callee) {
            Some((arity, _)) if *arity != args.len() => Err(GenerateError::InvalidCall(
                callee.to_string(),
                *arity,
                args.len(),
            )),
            Some((_, native)) => Ok(native(args)),
            None => Err(GenerateError::UnknownFunction(callee.to_string())),
        }
    }
}

impl Generator for Evaluator {
    type Artifact = Evaluation;

    fn generate_definition(&mut self, function: Function) -> Result<Evaluation, GenerateError> {
        let Function { prototype, body } = &function;

        if body.depth() > MAX_EXPR_DEPTH {
            return Err(GenerateError::TooDeep(MAX_EXPR_DEPTH));
        }

        if prototype.is_anonymous() {
            self.check(body, prototype)?;
            let value = self.eval_expr(body, &HashMap::new(), 0)?;
            return Ok(Evaluation::Value(value));
        }

        if self.is_defined(&prototype.name) {
            return Err(GenerateError::Redefinition(prototype.name.clone()));
        }
        self.check(body, prototype)?;

        let name = prototype.name.clone();
        debug!("defining {}", name);
        self.functions.insert(name.clone(), function);
        Ok(Evaluation::Defined(name))
    }

    fn generate_prototype(&mut self, prototype: Prototype) -> Result<Evaluation, GenerateError> {
        if self.functions.contains_key(&prototype.name) {
            return Err(GenerateError::Redefinition(prototype.name));
        }

        let (arity, native) = native(&prototype.name)
            .ok_or_else(|| GenerateError::UnknownNative(prototype.name.clone()))?;
        if arity != prototype.args.len() {
            return Err(GenerateError::InvalidExtern(
                prototype.name,
                arity,
                prototype.args.len(),
            ));
        }

        debug!("binding extern {}", prototype.name);
        self.externs.insert(prototype.name.clone(), (arity, native));
        Ok(Evaluation::Declared(prototype.name))
    }
}
