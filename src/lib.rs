pub mod ast;
pub mod help;
pub mod interpreter;
pub mod lines;
pub mod parser;
pub mod tokenizer;
