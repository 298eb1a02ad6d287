mod environment;
mod math;
mod value;

use std::{cell::RefCell, fmt::Debug, io::Write, rc::Rc};

use log::{debug, info};
use num_traits::Signed;

use crate::{
    ast::{Expression, InfixOperator, Literal, PostfixOperator, Statement, UnaryOperator},
    help,
    lines::{read_block, BlockError, LineQueue},
    parser::{self, ParseErrorWithContext, StatementError},
    tokenizer::{self, Token, TokenizeError},
};

pub use self::{
    environment::{Environment, KEYWORDS},
    value::Value,
};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub struct Interpreter {
    environment: Environment,
    stdout: Rc<RefCell<dyn Write>>,
}

impl Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("environment", &self.environment)
            .finish()
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(Rc::new(RefCell::new(std::io::stdout())))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("Error executing \"{line}\": {kind}")]
    Execution {
        kind: ExecutionErrorKind,
        line: String,
    },
}

impl ExecutionError {
    pub fn kind(&self) -> &ExecutionErrorKind {
        match self {
            ExecutionError::Execution { kind, .. } => kind,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutionErrorKind {
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("Syntax error: {0}")]
    Tokenize(#[from] TokenizeError),
    #[error("Parse error: {0}")]
    Parse(#[from] ParseErrorWithContext),
    #[error("{0}")]
    Statement(#[from] StatementError),
    #[error("{0}")]
    Block(#[from] BlockError),
    #[error("Unexpected 'else' without matching 'if'")]
    UnexpectedElse,
    #[error("Undefined variable or invalid token: {0}")]
    UndefinedVariable(String),
    #[error("Invalid variable name: {0:?}")]
    InvalidName(String),
    #[error("'{0}' is a reserved keyword and cannot be used for variables or constants")]
    ReservedName(String),
    #[error("'{0}' is a constant and cannot be changed")]
    ConstantReassignment(String),
    #[error("'{0}' is not defined")]
    NotBound(String),
    #[error("Factorial only works on non-negative integers: {0}{1}")]
    FactorialDomain(Value, PostfixOperator),
    #[error("Math domain error: {0} ^ {1}")]
    PowerDomain(Value, Value),
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Integer too large")]
    IntegerOverflow,
    #[error("Invalid less than operation: {0} < {1}")]
    InvalidLess(Value, Value),
    #[error("Invalid less than or equal operation: {0} <= {1}")]
    InvalidLessEqual(Value, Value),
    #[error("Invalid greater than operation: {0} > {1}")]
    InvalidGreater(Value, Value),
    #[error("Invalid greater than or equal operation: {0} >= {1}")]
    InvalidGreaterEqual(Value, Value),
    #[error("Invalid addition operation: {0} + {1}")]
    InvalidAdd(Value, Value),
    #[error("Invalid subtraction operation: {0} - {1}")]
    InvalidSub(Value, Value),
    #[error("Invalid multiplication operation: {0} * {1}")]
    InvalidMult(Value, Value),
    #[error("Invalid division operation: {0} / {1}")]
    InvalidDiv(Value, Value),
    #[error("Invalid power operation: {0} ^ {1}")]
    InvalidPow(Value, Value),
    #[error("Invalid negate operation: -{0}")]
    InvalidNegate(Value),
}

impl Interpreter {
    pub fn new(stdout: Rc<RefCell<dyn Write>>) -> Self {
        info!("starting interpreter");
        Self {
            environment: Environment::new(),
            stdout,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Runs every line of `source`, stopping at the first failing statement.
    pub fn interpret(&mut self, source: &str) -> Result<(), ExecutionError> {
        let mut queue = LineQueue::from_source(source);
        self.run(&mut queue)
    }

    /// Drains the queue one top-level line at a time. Statements dispatched before a
    /// failure keep their effects.
    pub fn run(&mut self, queue: &mut LineQueue) -> Result<(), ExecutionError> {
        while let Some(line) = queue.pop_front() {
            let line = line.trim();
            if let Err(kind) = self.dispatch(line, queue) {
                return Err(ExecutionError::Execution {
                    kind,
                    line: line.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Classifies and executes one line. Block bodies are read from, and nested blocks
    /// re-read from, the same `queue`.
    pub fn dispatch(
        &mut self,
        line: &str,
        queue: &mut LineQueue,
    ) -> Result<(), ExecutionErrorKind> {
        let statement = parser::statement(line)?;
        if statement != Statement::Nop {
            debug!("dispatch {}", statement);
        }
        self.execute(&statement, queue)
    }

    fn execute(
        &mut self,
        statement: &Statement,
        queue: &mut LineQueue,
    ) -> Result<(), ExecutionErrorKind> {
        match statement {
            Statement::Nop => {}
            Statement::Else => return Err(ExecutionErrorKind::UnexpectedElse),
            Statement::Const { name, expr } => {
                self.environment.check_name(name)?;
                let value = self.evaluate_source(expr)?;
                self.environment.define_constant(name, value.clone())?;
                writeln!(self.stdout.borrow_mut(), "{} (constant) = {}", name, value)?;
            }
            Statement::Null(name) => {
                self.environment.null(name);
            }
            Statement::Del(name) => {
                self.environment.delete(name)?;
            }
            Statement::If(condition) => {
                let condition = self.evaluate_source(condition)?;
                let then_block = read_block(queue)?;
                let else_block = if queue.peek().map(str::trim) == Some("else:") {
                    queue.pop_front();
                    read_block(queue)?
                } else {
                    Vec::new()
                };

                let chosen = if condition.is_truthy() {
                    then_block
                } else {
                    else_block
                };
                for line in chosen.iter() {
                    self.dispatch(line, queue)?;
                }
            }
            Statement::Out(expr) => {
                let value = self.evaluate_source(expr)?;
                writeln!(self.stdout.borrow_mut(), "{}", value)?;
            }
            Statement::Clear => {
                write!(self.stdout.borrow_mut(), "{}", CLEAR_SCREEN)?;
            }
            Statement::Reset => {
                self.environment.reset();
                let mut stdout = self.stdout.borrow_mut();
                write!(stdout, "{}", CLEAR_SCREEN)?;
                writeln!(stdout, "Environment reset")?;
            }
            Statement::Help(topic) => {
                let mut stdout = self.stdout.borrow_mut();
                match topic {
                    None => writeln!(stdout, "{}", help::GENERAL)?,
                    Some(topic) => match help::topic(topic) {
                        Some(text) => writeln!(stdout, "{}", text)?,
                        None => writeln!(stdout, "No help available for '{}'", topic)?,
                    },
                }
            }
            Statement::While(condition) => {
                let body = read_block(queue)?;
                while self.evaluate_source(condition)?.is_truthy() {
                    for line in body.iter() {
                        self.dispatch(line, queue)?;
                    }
                }
            }
            Statement::Assign { name, expr } => {
                self.environment.check_assignable(name)?;
                let value = self.evaluate_source(expr)?;
                self.environment.assign_variable(name, value.clone())?;
                writeln!(self.stdout.borrow_mut(), "{} = {}", name, value)?;
            }
            Statement::Expression(expr) => {
                self.evaluate_source(expr)?;
            }
        }

        Ok(())
    }

    /// Tokenizes and evaluates an expression, normalizing an integral float result.
    pub fn evaluate_source(&self, source: &str) -> Result<Value, ExecutionErrorKind> {
        let tokens = tokenizer::tokens(source)?;
        self.evaluate_tokens(&tokens)
    }

    /// Evaluates a complete token stream; leftover tokens are a parse error.
    pub fn evaluate_tokens(&self, tokens: &[Token]) -> Result<Value, ExecutionErrorKind> {
        let expression = parser::expression(tokens)?;

        #[cfg(feature = "trace")]
        {
            eprintln!("tokens: {:?}", tokens);
            eprintln!("expression: {}", expression);
        }

        Ok(self.evaluate(&expression)?.normalize())
    }

    fn evaluate(&self, expression: &Expression) -> Result<Value, ExecutionErrorKind> {
        match expression {
            Expression::Identifier(name) => self
                .environment
                .get(name)
                .cloned()
                .ok_or_else(|| ExecutionErrorKind::UndefinedVariable(name.clone())),
            Expression::Literal(literal) => match literal {
                Literal::Integer(n) => Ok(Value::Integer(n.clone())),
                Literal::String(s) => Ok(Value::String(s.clone())),
            },
            Expression::Grouping(x) => self.evaluate(x),
            Expression::Binary(a, op, b) => {
                let a = self.evaluate(a)?;
                match op {
                    InfixOperator::Or if a.is_truthy() => Ok(a),
                    InfixOperator::And if !a.is_truthy() => Ok(a),
                    op => value::binary(a, *op, self.evaluate(b)?),
                }
            }
            Expression::Unary(op, x) => {
                let x = self.evaluate(x)?;
                match op {
                    UnaryOperator::Negate => x.negate(),
                    UnaryOperator::Not => Ok(Value::Boolean(!x.is_truthy())),
                }
            }
            Expression::Postfix(x, op) => match self.evaluate(x)? {
                Value::Integer(n) if !n.is_negative() => {
                    Ok(Value::Integer(math::multifactorial(&n, op.step())))
                }
                x => Err(ExecutionErrorKind::FactorialDomain(x, *op)),
            },
        }
    }
}
