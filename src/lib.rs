pub mod ast;
pub mod codegen;
pub mod driver;
pub mod eval;
pub mod lexer;
pub mod parser;
