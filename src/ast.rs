use std::fmt;

#[derive(Debug, PartialEq, Clone)]
pub struct Prototype {
    pub name: String,
    pub args: Vec<String>,
}

impl Prototype {
    /// top-level expressions are wrapped in a function with no name
    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    Literal(f64),
    Variable(String),
    Binary(char, Box<Expression>, Box<Expression>),
    Call(String, Vec<Expression>),
}

/// deepest expression tree the parser builds or a generator accepts
pub const MAX_EXPR_DEPTH: usize = 256;

impl Expression {
    /// levels of nesting from this node down, counted without recursing so
    /// arbitrarily deep trees can be measured
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((expr, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            match expr {
                Expression::Binary(_, lhs, rhs) => {
                    stack.push((lhs.as_ref(), depth + 1));
                    stack.push((rhs.as_ref(), depth + 1));
                }
                Expression::Call(_, args) => stack.extend(args.iter().map(|arg| (arg, depth + 1))),
                Expression::Literal(_) | Expression::Variable(_) => (),
            }
        }
        deepest
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Function {
    pub prototype: Prototype,
    pub body: Expression,
}

impl Function {
    pub fn anonymous(body: Expression) -> Self {
        Function {
            prototype: Prototype {
                name: String::new(),
                args: Vec::new(),
            },
            body,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum ASTNode {
    Extern(Prototype),
    Function(Function),
}

// The renderings below are valid source: feeding them back through the
// parser gives the same tree. Binary expressions are always parenthesised.

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(value) => write!(f, "{}", value),
            Expression::Variable(name) => write!(f, "{}", name),
            Expression::Binary(op, lhs, rhs) => write!(f, "({} {} {})", lhs, op, rhs),
            Expression::Call(callee, args) => {
                write!(f, "{}(", callee)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.args.join(" "))
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prototype.is_anonymous() {
            write!(f, "{}", self.body)
        } else {
            write!(f, "def {} {}", self.prototype, self.body)
        }
    }
}

impl fmt::Display for ASTNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ASTNode::Extern(prototype) => write!(f, "extern {}", prototype),
            ASTNode::Function(function) => write!(f, "{}", function),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn var(name: &str) -> Box<Expression> {
        Box::new(Expression::Variable(name.to_string()))
    }

    #[test]
    fn display_parenthesises_binary() {
        let expr = Expression::Binary(
            '*',
            Box::new(Expression::Binary('+', var("a"), var("b"))),
            Box::new(Expression::Literal(2.5)),
        );
        assert_eq!(expr.to_string(), "((a + b) * 2.5)");
    }

    #[test]
    fn display_call() {
        let call = Expression::Call(
            "foo".to_string(),
            vec![Expression::Literal(1.0), Expression::Variable("x".to_string())],
        );
        assert_eq!(call.to_string(), "foo(1, x)");
        assert_eq!(Expression::Call("bar".to_string(), vec![]).to_string(), "bar()");
    }

    #[test]
    fn display_nodes() {
        let prototype = Prototype {
            name: "add".to_string(),
            args: vec!["x".to_string(), "y".to_string()],
        };
        let function = Function {
            prototype: prototype.clone(),
            body: Expression::Binary('+', var("x"), var("y")),
        };
        assert_eq!(ASTNode::Extern(prototype).to_string(), "extern add(x y)");
        assert_eq!(ASTNode::Function(function).to_string(), "def add(x y) (x + y)");
    }

    #[test]
    fn depth_counts_nesting() {
        assert_eq!(Expression::Literal(1.0).depth(), 1);
        assert_eq!(Expression::Call("f".to_string(), vec![]).depth(), 1);
        let expr = Expression::Call(
            "f".to_string(),
            vec![
                Expression::Literal(1.0),
                Expression::Binary('+', var("a"), Box::new(Expression::Binary('*', var("b"), var("c")))),
            ],
        );
        assert_eq!(expr.depth(), 4);
    }

    #[test]
    fn anonymous_function_renders_body_only() {
        let function = Function::anonymous(Expression::Literal(4.0));
        assert!(function.prototype.is_anonymous());
        assert_eq!(function.to_string(), "4");
    }
}
