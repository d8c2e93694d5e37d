use super::Tool;
use crate::agent::StepError;

/// Evaluates arithmetic: `+ - * / % ^`, parentheses, unary minus.
///
/// `$`, `,` and `_` are ignored so budget figures like `$1,250` can be
/// pasted in directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct CalculatorTool;

impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression, e.g. `3 * 85 + 2 * 40`. \
         Supports + - * / % ^ and parentheses."
    }

    fn call(&self, input: &str) -> Result<String, StepError> {
        let value = evaluate(input)?;
        Ok(format_number(value))
    }
}

/// Evaluate an arithmetic expression.
pub fn evaluate(expr: &str) -> Result<f64, StepError> {
    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        return Err(StepError::invalid("empty expression"));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if let Some(tok) = parser.peek() {
        return Err(StepError::invalid(format!("unexpected token {tok:?}")));
    }
    if !value.is_finite() {
        return Err(StepError::invalid("result is not a finite number"));
    }
    Ok(value)
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let fixed = format!("{value:.10}");
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(f64),
    Op(char),
    Open,
    Close,
}

fn tokenize(expr: &str) -> Result<Vec<Token>, StepError> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() || matches!(c, '$' | ',' | '_') => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else if matches!(d, ',' | '_') {
                        chars.next();
                    } else {
                        break;
                    }
                }
                let n = literal
                    .parse::<f64>()
                    .map_err(|_| StepError::invalid(format!("bad number '{literal}'")))?;
                tokens.push(Token::Num(n));
            }
            '+' | '-' | '*' | '/' | '%' | '^' => {
                tokens.push(Token::Op(c));
                chars.next();
            }
            'x' | '×' => {
                tokens.push(Token::Op('*'));
                chars.next();
            }
            '(' => {
                tokens.push(Token::Open);
                chars.next();
            }
            ')' => {
                tokens.push(Token::Close);
                chars.next();
            }
            other => return Err(StepError::invalid(format!("unexpected character '{other}'"))),
        }
    }

    Ok(tokens)
}

/// Nesting limit for parentheses, signs and exponents.
const MAX_DEPTH: usize = 256;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.peek();
        self.pos += 1;
        tok
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<f64, StepError> {
        let mut acc = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
            self.bump();
            let rhs = self.term()?;
            acc = if op == '+' { acc + rhs } else { acc - rhs };
        }
        Ok(acc)
    }

    // term := unary (('*' | '/' | '%') unary)*
    fn term(&mut self) -> Result<f64, StepError> {
        let mut acc = self.unary()?;
        while let Some(Token::Op(op @ ('*' | '/' | '%'))) = self.peek() {
            self.bump();
            let rhs = self.unary()?;
            if op != '*' && rhs == 0.0 {
                return Err(StepError::invalid("division by zero"));
            }
            acc = match op {
                '*' => acc * rhs,
                '/' => acc / rhs,
                _ => acc % rhs,
            };
        }
        Ok(acc)
    }

    // Every recursive rule passes through here.
    fn unary(&mut self) -> Result<f64, StepError> {
        if self.depth >= MAX_DEPTH {
            return Err(StepError::invalid("expression nested too deeply"));
        }
        self.depth += 1;
        let value = self.signed();
        self.depth -= 1;
        value
    }

    // unary := ('-' | '+') unary | power
    fn signed(&mut self) -> Result<f64, StepError> {
        match self.peek() {
            Some(Token::Op('-')) => {
                self.bump();
                Ok(-self.unary()?)
            }
            Some(Token::Op('+')) => {
                self.bump();
                self.unary()
            }
            _ => self.power(),
        }
    }

    // power := primary ('^' unary)?
    fn power(&mut self) -> Result<f64, StepError> {
        let base = self.primary()?;
        if let Some(Token::Op('^')) = self.peek() {
            self.bump();
            let exp = self.unary()?;
            return Ok(base.powf(exp));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<f64, StepError> {
        match self.bump() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::Open) => {
                let value = self.expr()?;
                match self.bump() {
                    Some(Token::Close) => Ok(value),
                    _ => Err(StepError::invalid("missing closing parenthesis")),
                }
            }
            Some(tok) => Err(StepError::invalid(format!("unexpected token {tok:?}"))),
            None => Err(StepError::invalid("unexpected end of expression")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_and_parentheses() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(evaluate("10 - 4 - 3").unwrap(), 3.0);
        assert_eq!(evaluate("17 % 5").unwrap(), 2.0);
    }

    #[test]
    fn power_is_right_associative_and_binds_tighter_than_minus() {
        assert_eq!(evaluate("2 ^ 3 ^ 2").unwrap(), 512.0);
        assert_eq!(evaluate("-2 ^ 2").unwrap(), -4.0);
        assert_eq!(evaluate("2 ^ -1").unwrap(), 0.5);
    }

    #[test]
    fn currency_and_separators_are_ignored() {
        assert_eq!(evaluate("$1,250 + $250").unwrap(), 1500.0);
        assert_eq!(evaluate("3 x 85").unwrap(), 255.0);
    }

    #[test]
    fn errors_are_invalid() {
        for bad in ["", "1 +", "(1 + 2", "4 / 0", "2 ** 3", "abc", "1 2"] {
            assert!(
                matches!(evaluate(bad), Err(StepError::Invalid(_))),
                "expected error for {bad:?}"
            );
        }
    }

    #[test]
    fn deep_nesting_is_rejected_not_overflowed() {
        let parens = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
        let signs = format!("{}1", "-".repeat(200_000));
        let powers = format!("2{}", "^2".repeat(200_000));
        for expr in [parens, signs, powers] {
            match evaluate(&expr) {
                Err(StepError::Invalid(msg)) => assert_eq!(msg, "expression nested too deeply"),
                other => panic!("expected nesting error, got {other:?}"),
            }
        }
    }

    #[test]
    fn moderate_nesting_still_evaluates() {
        let expr = format!("{}2{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(evaluate(&expr).unwrap(), 2.0);
        assert_eq!(evaluate("--3").unwrap(), 3.0);
    }

    #[test]
    fn tool_formats_results() {
        let calc = CalculatorTool;
        assert_eq!(calc.call("3 * 85 + 2 * 40").unwrap(), "335");
        assert_eq!(calc.call("0.1 + 0.2").unwrap(), "0.3");
        assert_eq!(calc.call("350 / 4").unwrap(), "87.5");
    }
}
