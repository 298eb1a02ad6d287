use std::fmt::Display;

use num_bigint::BigInt;

#[derive(Debug, Clone)]
pub enum Expression {
    Identifier(String),
    Literal(Literal),
    Grouping(Box<Expression>),
    Binary(Box<Expression>, InfixOperator, Box<Expression>),
    Unary(UnaryOperator, Box<Expression>),
    Postfix(Box<Expression>, PostfixOperator),
}

#[derive(Debug, Clone)]
pub enum Literal {
    Integer(BigInt),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostfixOperator {
    Factorial,
    DoubleFactorial,
    TripleFactorial,
}

impl PostfixOperator {
    /// Distance between consecutive factors of the product.
    pub fn step(&self) -> usize {
        match self {
            PostfixOperator::Factorial => 1,
            PostfixOperator::DoubleFactorial => 2,
            PostfixOperator::TripleFactorial => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOperator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Plus,
    Minus,
    Multiply,
    Divide,
    Power,
    And,
    Or,
}

/// One source line, classified by its leading keyword or shape. Expressions are kept as
/// source text and only tokenized when the statement runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Nop,
    Else,
    Const { name: String, expr: String },
    Null(String),
    Del(String),
    If(String),
    Out(String),
    Clear,
    Reset,
    Help(Option<String>),
    While(String),
    Assign { name: String, expr: String },
    Expression(String),
}

impl Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Statement::Nop => Ok(()),
            Statement::Else => write!(f, "else:"),
            Statement::Const { name, expr } => write!(f, "const {} = {}", name, expr),
            Statement::Null(name) => write!(f, "null {}", name),
            Statement::Del(name) => write!(f, "del {}", name),
            Statement::If(condition) => write!(f, "if {}:", condition),
            Statement::Out(expr) => write!(f, "out {}", expr),
            Statement::Clear => write!(f, "CLEAR"),
            Statement::Reset => write!(f, "RESET"),
            Statement::Help(None) => write!(f, "help"),
            Statement::Help(Some(topic)) => write!(f, "help {}", topic),
            Statement::While(condition) => write!(f, "while {}:", condition),
            Statement::Assign { name, expr } => write!(f, "{} = {}", name, expr),
            Statement::Expression(expr) => write!(f, "{}", expr),
        }
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::Identifier(name) => write!(f, "{}", name),
            Expression::Literal(literal) => write!(f, "{}", literal),
            Expression::Grouping(expr) => write!(f, "({})", expr),
            Expression::Binary(left, op, right) => write!(f, "({} {} {})", op, left, right),
            Expression::Unary(op, right) => write!(f, "({} {})", op, right),
            Expression::Postfix(left, op) => write!(f, "({} {})", op, left),
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Integer(n) => write!(f, "{}", n),
            Literal::String(s) => write!(f, "\"{}\"", s),
        }
    }
}

impl Display for InfixOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InfixOperator::Equal => write!(f, "=="),
            InfixOperator::NotEqual => write!(f, "!="),
            InfixOperator::LessThan => write!(f, "<"),
            InfixOperator::LessThanOrEqual => write!(f, "<="),
            InfixOperator::GreaterThan => write!(f, ">"),
            InfixOperator::GreaterThanOrEqual => write!(f, ">="),
            InfixOperator::Plus => write!(f, "+"),
            InfixOperator::Minus => write!(f, "-"),
            InfixOperator::Multiply => write!(f, "*"),
            InfixOperator::Divide => write!(f, "/"),
            InfixOperator::Power => write!(f, "^"),
            InfixOperator::And => write!(f, "and"),
            InfixOperator::Or => write!(f, "or"),
        }
    }
}

impl Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOperator::Negate => write!(f, "-"),
            UnaryOperator::Not => write!(f, "not"),
        }
    }
}

impl Display for PostfixOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostfixOperator::Factorial => write!(f, "!"),
            PostfixOperator::DoubleFactorial => write!(f, "!!"),
            PostfixOperator::TripleFactorial => write!(f, "!!!"),
        }
    }
}
