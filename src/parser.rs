use std::cell::RefCell;

use crate::{
    ast::{Expression, InfixOperator, Literal, PostfixOperator, Statement, UnaryOperator},
    tokenizer::Token,
};

#[derive(Debug, Clone)]
pub struct ParseErrorWithContext {
    pub error: ParseError,
    context: ParseContext,
    pub token: Option<Token>,
}

impl std::error::Error for ParseErrorWithContext {}

impl std::fmt::Display for ParseErrorWithContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)?;
        if let Some(token) = &self.token {
            write!(f, " but found \"{}\"", token)?;
        }
        write!(
            f,
            " (while parsing {})",
            self.context.stack.borrow().join(" > ")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Unexpected end of input")]
    UnexpectedEnd,
    #[error("Expected \"{0}\"")]
    Expected(Token),
    #[error("Unexpected \"{0}\"")]
    Unexpected(Token),
    #[error("Unexpected input after expression: {0}")]
    TrailingInput(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatementError {
    #[error("Expected '=' in constant definition")]
    ExpectedEquals,
}

#[derive(Debug, Clone)]
struct ParseContext {
    stack: RefCell<Vec<&'static str>>,
}

impl ParseContext {
    fn new() -> Self {
        Self {
            stack: RefCell::new(Vec::new()),
        }
    }

    fn push(&self, name: &'static str) -> ParseContextGuard {
        self.stack.borrow_mut().push(name);
        ParseContextGuard::new(self)
    }

    fn pop(&self) {
        self.stack.borrow_mut().pop();
    }

    fn error(&self, error: ParseError, tokens: &[Token]) -> ParseErrorWithContext {
        ParseErrorWithContext {
            error,
            context: self.clone(),
            token: tokens.first().cloned(),
        }
    }
}

struct ParseContextGuard<'a> {
    context: &'a ParseContext,
}

impl<'a> ParseContextGuard<'a> {
    fn new(context: &'a ParseContext) -> Self {
        Self { context }
    }
}

impl<'a> Drop for ParseContextGuard<'a> {
    fn drop(&mut self) {
        self.context.pop();
    }
}

/// Classifies one trimmed source line. The first matching shape wins.
pub fn statement(line: &str) -> Result<Statement, StatementError> {
    let line = line.trim();

    if line.is_empty() || line.starts_with('#') || line == "done" {
        return Ok(Statement::Nop);
    }

    if line == "else:" {
        return Ok(Statement::Else);
    }

    if let Some(rest) = line.strip_prefix("const ") {
        let (name, expr) = rest
            .trim()
            .split_once('=')
            .ok_or(StatementError::ExpectedEquals)?;
        return Ok(Statement::Const {
            name: name.trim().to_string(),
            expr: expr.trim().to_string(),
        });
    }

    if let Some(name) = line.strip_prefix("null ") {
        return Ok(Statement::Null(name.trim().to_string()));
    }

    if let Some(name) = line.strip_prefix("del ") {
        return Ok(Statement::Del(name.trim().to_string()));
    }

    if let Some(condition) = block_header(line, "if ") {
        return Ok(Statement::If(condition.to_string()));
    }

    if let Some(expr) = line.strip_prefix("out ") {
        return Ok(Statement::Out(expr.trim().to_string()));
    }

    match line {
        "CLEAR" => return Ok(Statement::Clear),
        "RESET" => return Ok(Statement::Reset),
        "help" => return Ok(Statement::Help(None)),
        _ => {}
    }

    if let Some(topic) = line.strip_prefix("help ") {
        return Ok(Statement::Help(Some(topic.trim().to_string())));
    }

    if let Some(condition) = block_header(line, "while ") {
        return Ok(Statement::While(condition.to_string()));
    }

    Ok(match assignment(line) {
        Some((name, expr)) => Statement::Assign {
            name: name.to_string(),
            expr: expr.to_string(),
        },
        None => Statement::Expression(line.to_string()),
    })
}

/// The condition of `keyword cond:`, if the line has that shape.
fn block_header<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    line.strip_prefix(keyword)?.strip_suffix(':').map(str::trim)
}

/// Splits at the first `=` that is not part of `==`, `!=`, `<=` or `>=`.
fn assignment(line: &str) -> Option<(&str, &str)> {
    let bytes = line.as_bytes();
    let position = line.find('=')?;

    let next_is_equal = bytes.get(position + 1) == Some(&b'=');
    let after_comparison = position > 0 && matches!(bytes[position - 1], b'!' | b'<' | b'>');
    if next_is_equal || after_comparison {
        return None;
    }

    Some((line[..position].trim(), line[position + 1..].trim()))
}

/// Parses a whole expression; every token must be consumed.
pub fn expression(tokens: &[Token]) -> Result<Expression, ParseErrorWithContext> {
    let context = ParseContext::new();
    let _guard = context.push("expression");
    let (expr, rest) = logical_or(&context, tokens)?;

    if !rest.is_empty() {
        let trailing = rest
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        return Err(context.error(ParseError::TrailingInput(trailing), rest));
    }

    Ok(expr)
}

fn binary<'a>(
    context: &ParseContext,
    left: impl Fn(&ParseContext, &'a [Token]) -> Result<(Expression, &'a [Token]), ParseErrorWithContext>,
    right: impl Fn(&ParseContext, &'a [Token]) -> Result<(Expression, &'a [Token]), ParseErrorWithContext>,
    operator: impl Fn(&Token) -> Option<InfixOperator>,
    tokens: &'a [Token],
) -> Result<(Expression, &'a [Token]), ParseErrorWithContext> {
    let (mut expr, mut tokens) = left(context, tokens)?;

    while let Some(token) = tokens.first() {
        let op = match operator(token) {
            Some(op) => op,
            None => break,
        };
        tokens = &tokens[1..];
        let (rhs, rest) = right(context, tokens)?;
        expr = Expression::Binary(Box::new(expr), op, Box::new(rhs));
        tokens = rest;
    }

    Ok((expr, tokens))
}

fn logical_or<'a>(
    context: &ParseContext,
    tokens: &'a [Token],
) -> Result<(Expression, &'a [Token]), ParseErrorWithContext> {
    let _guard = context.push("logical_or");
    binary(
        context,
        logical_and,
        logical_and,
        |token| match token {
            Token::Or => Some(InfixOperator::Or),
            _ => None,
        },
        tokens,
    )
}

fn logical_and<'a>(
    context: &ParseContext,
    tokens: &'a [Token],
) -> Result<(Expression, &'a [Token]), ParseErrorWithContext> {
    let _guard = context.push("logical_and");
    binary(
        context,
        logical_not,
        logical_not,
        |token| match token {
            Token::And => Some(InfixOperator::And),
            _ => None,
        },
        tokens,
    )
}

fn logical_not<'a>(
    context: &ParseContext,
    tokens: &'a [Token],
) -> Result<(Expression, &'a [Token]), ParseErrorWithContext> {
    let _guard = context.push("logical_not");
    match tokens.first() {
        Some(Token::Not) => {
            let (right, rest) = logical_not(context, &tokens[1..])?;
            Ok((Expression::Unary(UnaryOperator::Not, Box::new(right)), rest))
        }
        _ => comparison(context, tokens),
    }
}

fn comparison<'a>(
    context: &ParseContext,
    tokens: &'a [Token],
) -> Result<(Expression, &'a [Token]), ParseErrorWithContext> {
    let _guard = context.push("comparison");
    binary(
        context,
        sum,
        sum,
        |token| match token {
            Token::EqualEqual => Some(InfixOperator::Equal),
            Token::BangEqual => Some(InfixOperator::NotEqual),
            Token::Less => Some(InfixOperator::LessThan),
            Token::LessEqual => Some(InfixOperator::LessThanOrEqual),
            Token::Greater => Some(InfixOperator::GreaterThan),
            Token::GreaterEqual => Some(InfixOperator::GreaterThanOrEqual),
            _ => None,
        },
        tokens,
    )
}

fn sum<'a>(
    context: &ParseContext,
    tokens: &'a [Token],
) -> Result<(Expression, &'a [Token]), ParseErrorWithContext> {
    let _guard = context.push("sum");
    binary(
        context,
        term,
        term,
        |token| match token {
            Token::Plus => Some(InfixOperator::Plus),
            Token::Minus => Some(InfixOperator::Minus),
            _ => None,
        },
        tokens,
    )
}

// The right operand of `*` and `/` is a bare factor, so `2*3^2` leaves `^ 2` unconsumed.
fn term<'a>(
    context: &ParseContext,
    tokens: &'a [Token],
) -> Result<(Expression, &'a [Token]), ParseErrorWithContext> {
    let _guard = context.push("term");
    binary(
        context,
        power,
        factor,
        |token| match token {
            Token::Star => Some(InfixOperator::Multiply),
            Token::Slash => Some(InfixOperator::Divide),
            _ => None,
        },
        tokens,
    )
}

fn power<'a>(
    context: &ParseContext,
    tokens: &'a [Token],
) -> Result<(Expression, &'a [Token]), ParseErrorWithContext> {
    let _guard = context.push("power");
    let (base, tokens) = factor(context, tokens)?;

    match tokens.first() {
        Some(Token::Caret) => {
            let (exponent, rest) = power(context, &tokens[1..])?;
            Ok((
                Expression::Binary(Box::new(base), InfixOperator::Power, Box::new(exponent)),
                rest,
            ))
        }
        _ => Ok((base, tokens)),
    }
}

fn factor<'a>(
    context: &ParseContext,
    tokens: &'a [Token],
) -> Result<(Expression, &'a [Token]), ParseErrorWithContext> {
    let _guard = context.push("factor");
    let Some(token) = tokens.first() else {
        return Err(context.error(ParseError::UnexpectedEnd, tokens));
    };

    let (expr, tokens) = match token {
        Token::Minus => {
            let (right, rest) = factor(context, &tokens[1..])?;
            return Ok((Expression::Unary(UnaryOperator::Negate, Box::new(right)), rest));
        }
        Token::LeftParen => {
            let (expr, rest) = logical_or(context, &tokens[1..])?;
            let rest = consume(context, rest, Token::RightParen)?;
            (Expression::Grouping(Box::new(expr)), rest)
        }
        Token::Integer(n) => (Expression::Literal(Literal::Integer(n.clone())), &tokens[1..]),
        Token::String(s) => (Expression::Literal(Literal::String(s.clone())), &tokens[1..]),
        Token::Identifier(name) => (Expression::Identifier(name.clone()), &tokens[1..]),
        token => {
            return Err(context.error(ParseError::Unexpected(token.clone()), tokens));
        }
    };

    Ok(postfix(expr, tokens))
}

fn postfix(mut expr: Expression, mut tokens: &[Token]) -> (Expression, &[Token]) {
    while let Some(Token::Bang(count @ 1..=3)) = tokens.first() {
        let op = match *count {
            1 => PostfixOperator::Factorial,
            2 => PostfixOperator::DoubleFactorial,
            _ => PostfixOperator::TripleFactorial,
        };
        expr = Expression::Postfix(Box::new(expr), op);
        tokens = &tokens[1..];
    }
    (expr, tokens)
}

fn consume<'a>(
    context: &ParseContext,
    tokens: &'a [Token],
    expected: Token,
) -> Result<&'a [Token], ParseErrorWithContext> {
    match tokens.first() {
        Some(t) if t == &expected => Ok(&tokens[1..]),
        _ => Err(context.error(ParseError::Expected(expected), tokens)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tokenizer::tokens;

    fn parse(source: &str) -> Result<Expression, ParseErrorWithContext> {
        expression(&tokens(source).unwrap())
    }

    fn parse_display(source: &str) -> String {
        parse(source).unwrap().to_string()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(parse_display("1 + 2 * 3"), "(+ 1 (* 2 3))");
        assert_eq!(parse_display("1 - 2 - 3"), "(- (- 1 2) 3)");
        assert_eq!(parse_display("1 < 2 or 3 and not 4"), "(or (< 1 2) (and 3 (not 4)))");
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(parse_display("2^3^2"), "(^ 2 (^ 3 2))");
        assert_eq!(parse_display("2^2*3"), "(* (^ 2 2) 3)");
    }

    #[test]
    fn test_power_after_multiply_is_trailing_input() {
        let error = parse("2*3^2").unwrap_err();
        assert_eq!(error.error, ParseError::TrailingInput("^ 2".to_string()));
    }

    #[test]
    fn test_negation_binds_tighter_than_power() {
        assert_eq!(parse_display("-2^2"), "(^ (- 2) 2)");
        assert_eq!(parse_display("-3!"), "(- (! 3))");
    }

    #[test]
    fn test_chained_comparison() {
        assert_eq!(parse_display("1 < 2 < 3"), "(< (< 1 2) 3)");
    }

    #[test]
    fn test_postfix() {
        assert_eq!(parse_display("5!"), "(! 5)");
        assert_eq!(parse_display("(a)!!"), "(!! (a))");
        assert_eq!(parse_display("7!!!"), "(!!! 7)");
        assert_eq!(parse_display("3!!"), "(!! 3)");
    }

    #[test]
    fn test_four_bangs_are_rejected() {
        let error = parse("5!!!!").unwrap_err();
        assert_eq!(error.error, ParseError::TrailingInput("!!!!".to_string()));
    }

    #[test]
    fn test_missing_paren() {
        let error = parse("(1 + 2").unwrap_err();
        assert_eq!(error.error, ParseError::Expected(Token::RightParen));
    }

    #[test]
    fn test_unexpected_end() {
        assert_eq!(parse("").unwrap_err().error, ParseError::UnexpectedEnd);
        assert_eq!(parse("1 +").unwrap_err().error, ParseError::UnexpectedEnd);
    }

    #[test]
    fn test_unexpected_token() {
        let error = parse("* 2").unwrap_err();
        assert_eq!(error.error, ParseError::Unexpected(Token::Star));
        assert!(error.to_string().contains("factor"));
    }

    #[test]
    fn test_trailing_tokens() {
        let error = parse("1 2").unwrap_err();
        assert_eq!(error.error, ParseError::TrailingInput("2".to_string()));
    }

    #[test]
    fn test_statement_shapes() {
        assert_eq!(statement("  # note").unwrap(), Statement::Nop);
        assert_eq!(statement("done").unwrap(), Statement::Nop);
        assert_eq!(statement("else:").unwrap(), Statement::Else);
        assert_eq!(
            statement("const pi = 3").unwrap(),
            Statement::Const {
                name: "pi".to_string(),
                expr: "3".to_string()
            }
        );
        assert_eq!(statement("null a").unwrap(), Statement::Null("a".to_string()));
        assert_eq!(statement("del a").unwrap(), Statement::Del("a".to_string()));
        assert_eq!(statement("if a > 1:").unwrap(), Statement::If("a > 1".to_string()));
        assert_eq!(statement("out a").unwrap(), Statement::Out("a".to_string()));
        assert_eq!(statement("CLEAR").unwrap(), Statement::Clear);
        assert_eq!(statement("RESET").unwrap(), Statement::Reset);
        assert_eq!(statement("help").unwrap(), Statement::Help(None));
        assert_eq!(
            statement("help while").unwrap(),
            Statement::Help(Some("while".to_string()))
        );
        assert_eq!(
            statement("while a < 3:").unwrap(),
            Statement::While("a < 3".to_string())
        );
    }

    #[test]
    fn test_assignment_detection() {
        assert_eq!(
            statement("x = a == b").unwrap(),
            Statement::Assign {
                name: "x".to_string(),
                expr: "a == b".to_string()
            }
        );
        assert_eq!(
            statement("a == b").unwrap(),
            Statement::Expression("a == b".to_string())
        );
        assert_eq!(
            statement("a <= b").unwrap(),
            Statement::Expression("a <= b".to_string())
        );
        assert_eq!(
            statement("a != b").unwrap(),
            Statement::Expression("a != b".to_string())
        );
    }

    #[test]
    fn test_const_without_equals() {
        assert_eq!(statement("const pi"), Err(StatementError::ExpectedEquals));
    }

    #[test]
    fn test_header_without_colon_is_expression() {
        assert_eq!(
            statement("if a").unwrap(),
            Statement::Expression("if a".to_string())
        );
    }
}
