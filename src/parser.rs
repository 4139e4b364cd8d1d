//! Lexer and recursive-descent parser for the analyzed language.
//!
//! The surface syntax is a small C-flavoured language:
//!
//! ```text
//! int a, b;
//! assume(a >= 0);
//! assume(a <= 10);
//! b = a + 1;
//! if (a < 5) { b = 1; } else { b = 2; }
//! while (a < 100) { a = a + 1; }
//! assert(b >= 1);
//! ```
//!
//! Line (`//`) and block (`/* */`) comments are skipped. `true` and `false`
//! in conditions desugar to the comparisons `0 == 0` and `0 != 0`, so the
//! AST only ever carries comparisons. Unary minus desugars to `0 - e`.
//!
//! The parser produces a [`Stmt::Seq`] root with 1-based line numbers on
//! every statement. Errors abort parsing; they are the only fatal errors in
//! the whole pipeline.

use thiserror::Error;

use crate::ast::{Cond, Expr, RelOp, Stmt};

/// Parse failure. Carries the 1-based source line where it occurred.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: unexpected character `{ch}`")]
    UnexpectedChar { ch: char, line: u32 },
    #[error("line {line}: integer literal out of range")]
    IntOutOfRange { line: u32 },
    #[error("line {line}: unterminated block comment")]
    UnterminatedComment { line: u32 },
    #[error("line {line}: expected {expected}, found `{found}`")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
        line: u32,
    },
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: &'static str },
}

/// Parse a whole program into its [`Stmt::Seq`] root.
pub fn parse(source: &str) -> Result<Stmt, ParseError> {
    let tokens = tokenize(source)?;
    Parser { tokens, pos: 0 }.parse_program()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Int(i64),
    KwInt,
    KwIf,
    KwElse,
    KwWhile,
    KwAssume,
    KwAssert,
    KwTrue,
    KwFalse,
    Plus,
    Minus,
    Star,
    Slash,
    Assign,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    Ne,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Semi,
    Comma,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "{}", name),
            Token::Int(n) => write!(f, "{}", n),
            Token::KwInt => write!(f, "int"),
            Token::KwIf => write!(f, "if"),
            Token::KwElse => write!(f, "else"),
            Token::KwWhile => write!(f, "while"),
            Token::KwAssume => write!(f, "assume"),
            Token::KwAssert => write!(f, "assert"),
            Token::KwTrue => write!(f, "true"),
            Token::KwFalse => write!(f, "false"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Assign => write!(f, "="),
            Token::Lt => write!(f, "<"),
            Token::Le => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::Ge => write!(f, ">="),
            Token::EqEq => write!(f, "=="),
            Token::Ne => write!(f, "!="),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Semi => write!(f, ";"),
            Token::Comma => write!(f, ","),
        }
    }
}

fn keyword(ident: &str) -> Option<Token> {
    match ident {
        "int" => Some(Token::KwInt),
        "if" => Some(Token::KwIf),
        "else" => Some(Token::KwElse),
        "while" => Some(Token::KwWhile),
        "assume" => Some(Token::KwAssume),
        "assert" => Some(Token::KwAssert),
        "true" => Some(Token::KwTrue),
        "false" => Some(Token::KwFalse),
        _ => None,
    }
}

fn tokenize(source: &str) -> Result<Vec<(Token, u32)>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut line: u32 = 1;

    while let Some(&ch) = chars.peek() {
        match ch {
            '\n' => {
                line += 1;
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '/' => {
                chars.next();
                match chars.peek() {
                    Some('/') => {
                        for c in chars.by_ref() {
                            if c == '\n' {
                                line += 1;
                                break;
                            }
                        }
                    }
                    Some('*') => {
                        chars.next();
                        let mut closed = false;
                        let mut prev = '\0';
                        for c in chars.by_ref() {
                            if c == '\n' {
                                line += 1;
                            }
                            if prev == '*' && c == '/' {
                                closed = true;
                                break;
                            }
                            prev = c;
                        }
                        if !closed {
                            return Err(ParseError::UnterminatedComment { line });
                        }
                    }
                    _ => tokens.push((Token::Slash, line)),
                }
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push((keyword(&ident).unwrap_or(Token::Ident(ident)), line));
            }
            c if c.is_ascii_digit() => {
                let mut value: i64 = 0;
                while let Some(&c) = chars.peek() {
                    if let Some(digit) = c.to_digit(10) {
                        value = value
                            .checked_mul(10)
                            .and_then(|v| v.checked_add(digit as i64))
                            .ok_or(ParseError::IntOutOfRange { line })?;
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push((Token::Int(value), line));
            }
            '+' => {
                chars.next();
                tokens.push((Token::Plus, line));
            }
            '-' => {
                chars.next();
                tokens.push((Token::Minus, line));
            }
            '*' => {
                chars.next();
                tokens.push((Token::Star, line));
            }
            '(' => {
                chars.next();
                tokens.push((Token::LParen, line));
            }
            ')' => {
                chars.next();
                tokens.push((Token::RParen, line));
            }
            '{' => {
                chars.next();
                tokens.push((Token::LBrace, line));
            }
            '}' => {
                chars.next();
                tokens.push((Token::RBrace, line));
            }
            ';' => {
                chars.next();
                tokens.push((Token::Semi, line));
            }
            ',' => {
                chars.next();
                tokens.push((Token::Comma, line));
            }
            '<' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push((Token::Le, line));
                } else {
                    tokens.push((Token::Lt, line));
                }
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push((Token::Ge, line));
                } else {
                    tokens.push((Token::Gt, line));
                }
            }
            '=' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push((Token::EqEq, line));
                } else {
                    tokens.push((Token::Assign, line));
                }
            }
            '!' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push((Token::Ne, line));
                } else {
                    return Err(ParseError::UnexpectedChar { ch: '!', line });
                }
            }
            _ => return Err(ParseError::UnexpectedChar { ch, line }),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, u32)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    /// Line of the current token, or of the last one at end of input.
    fn line(&self) -> u32 {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|(_, l)| *l)
            .unwrap_or(1)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token, what: &'static str) -> Result<u32, ParseError> {
        let line = self.line();
        match self.bump() {
            Some(token) if token == expected => Ok(line),
            Some(token) => Err(ParseError::UnexpectedToken {
                expected: what,
                found: token.to_string(),
                line,
            }),
            None => Err(ParseError::UnexpectedEof { expected: what }),
        }
    }

    fn expect_ident(&mut self) -> Result<(String, u32), ParseError> {
        let line = self.line();
        match self.bump() {
            Some(Token::Ident(name)) => Ok((name, line)),
            Some(token) => Err(ParseError::UnexpectedToken {
                expected: "an identifier",
                found: token.to_string(),
                line,
            }),
            None => Err(ParseError::UnexpectedEof { expected: "an identifier" }),
        }
    }

    fn parse_program(&mut self) -> Result<Stmt, ParseError> {
        let mut stmts = Vec::new();
        while self.peek().is_some() {
            self.parse_stmt(&mut stmts)?;
        }
        Ok(Stmt::Seq(stmts))
    }

    /// Parse one statement. A declaration like `int a, b;` expands into one
    /// [`Stmt::Decl`] per variable, hence the output vector.
    fn parse_stmt(&mut self, out: &mut Vec<Stmt>) -> Result<(), ParseError> {
        match self.peek() {
            Some(Token::KwInt) => {
                self.bump();
                loop {
                    let (var, line) = self.expect_ident()?;
                    out.push(Stmt::Decl { var, line });
                    let sep_line = self.line();
                    match self.bump() {
                        Some(Token::Comma) => continue,
                        Some(Token::Semi) => break,
                        Some(token) => {
                            return Err(ParseError::UnexpectedToken {
                                expected: "`,` or `;`",
                                found: token.to_string(),
                                line: sep_line,
                            })
                        }
                        None => return Err(ParseError::UnexpectedEof { expected: "`,` or `;`" }),
                    }
                }
            }
            Some(Token::KwAssume) => {
                self.bump();
                let line = self.expect(Token::LParen, "`(`")?;
                let mut conds = vec![self.parse_cond()?];
                while self.peek() == Some(&Token::Comma) {
                    self.bump();
                    conds.push(self.parse_cond()?);
                }
                self.expect(Token::RParen, "`)`")?;
                self.expect(Token::Semi, "`;`")?;
                out.push(Stmt::Assume { conds, line });
            }
            Some(Token::KwAssert) => {
                self.bump();
                let line = self.expect(Token::LParen, "`(`")?;
                let cond = self.parse_cond()?;
                self.expect(Token::RParen, "`)`")?;
                self.expect(Token::Semi, "`;`")?;
                out.push(Stmt::Assert { cond, line });
            }
            Some(Token::KwIf) => {
                let stmt = self.parse_if()?;
                out.push(stmt);
            }
            Some(Token::KwWhile) => {
                self.bump();
                let line = self.expect(Token::LParen, "`(`")?;
                let cond = self.parse_cond()?;
                self.expect(Token::RParen, "`)`")?;
                let body = self.parse_block()?;
                out.push(Stmt::While {
                    cond,
                    body: Box::new(body),
                    line,
                });
            }
            Some(Token::Ident(_)) => {
                let (var, line) = self.expect_ident()?;
                self.expect(Token::Assign, "`=`")?;
                let expr = self.parse_expr()?;
                self.expect(Token::Semi, "`;`")?;
                out.push(Stmt::Assign { var, expr, line });
            }
            Some(token) => {
                return Err(ParseError::UnexpectedToken {
                    expected: "a statement",
                    found: token.to_string(),
                    line: self.line(),
                })
            }
            None => return Err(ParseError::UnexpectedEof { expected: "a statement" }),
        }
        Ok(())
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        self.expect(Token::KwIf, "`if`")?;
        let line = self.expect(Token::LParen, "`(`")?;
        let cond = self.parse_cond()?;
        self.expect(Token::RParen, "`)`")?;
        let then_body = self.parse_block()?;
        let else_body = if self.peek() == Some(&Token::KwElse) {
            self.bump();
            // `else if` chains nest as a one-statement else arm
            let body = if self.peek() == Some(&Token::KwIf) {
                self.parse_if()?
            } else {
                self.parse_block()?
            };
            Some(Box::new(body))
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_body: Box::new(then_body),
            else_body,
            line,
        })
    }

    fn parse_block(&mut self) -> Result<Stmt, ParseError> {
        self.expect(Token::LBrace, "`{`")?;
        let mut stmts = Vec::new();
        loop {
            match self.peek() {
                Some(Token::RBrace) => {
                    self.bump();
                    break;
                }
                Some(_) => self.parse_stmt(&mut stmts)?,
                None => return Err(ParseError::UnexpectedEof { expected: "`}`" }),
            }
        }
        Ok(Stmt::Seq(stmts))
    }

    fn parse_cond(&mut self) -> Result<Cond, ParseError> {
        match self.peek() {
            Some(Token::KwTrue) => {
                self.bump();
                return Ok(Cond::eq(Expr::int(0), Expr::int(0)));
            }
            Some(Token::KwFalse) => {
                self.bump();
                return Ok(Cond::ne(Expr::int(0), Expr::int(0)));
            }
            _ => {}
        }
        let lhs = self.parse_expr()?;
        let line = self.line();
        let op = match self.bump() {
            Some(Token::Lt) => RelOp::Lt,
            Some(Token::Le) => RelOp::Le,
            Some(Token::Gt) => RelOp::Gt,
            Some(Token::Ge) => RelOp::Ge,
            Some(Token::EqEq) => RelOp::Eq,
            Some(Token::Ne) => RelOp::Ne,
            Some(token) => {
                return Err(ParseError::UnexpectedToken {
                    expected: "a comparison operator",
                    found: token.to_string(),
                    line,
                })
            }
            None => return Err(ParseError::UnexpectedEof { expected: "a comparison operator" }),
        };
        let rhs = self.parse_expr()?;
        Ok(Cond::new(op, lhs, rhs))
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.bump();
                    lhs = lhs.add(self.parse_term()?);
                }
                Some(Token::Minus) => {
                    self.bump();
                    lhs = lhs.sub(self.parse_term()?);
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_factor()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.bump();
                    lhs = lhs.mul(self.parse_factor()?);
                }
                Some(Token::Slash) => {
                    self.bump();
                    lhs = lhs.div(self.parse_factor()?);
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        let line = self.line();
        match self.bump() {
            Some(Token::Int(n)) => Ok(Expr::int(n)),
            Some(Token::Ident(name)) => Ok(Expr::Var(name)),
            Some(Token::LParen) => {
                let expr = self.parse_expr()?;
                self.expect(Token::RParen, "`)`")?;
                Ok(expr)
            }
            Some(Token::Minus) => {
                let operand = self.parse_factor()?;
                // Fold a negated literal so pre-conditions can carry
                // negative constants; anything else desugars to 0 - e.
                Ok(match operand {
                    Expr::Int(n) => Expr::int(-n),
                    other => Expr::int(0).sub(other),
                })
            }
            Some(token) => Err(ParseError::UnexpectedToken {
                expected: "an expression",
                found: token.to_string(),
                line,
            }),
            None => Err(ParseError::UnexpectedEof { expected: "an expression" }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinOp;

    #[test]
    fn parse_declarations_and_assignment() {
        let program = parse("int a, b;\nb = a + 1;").unwrap();
        let Stmt::Seq(stmts) = program else { panic!("expected a sequence root") };
        assert_eq!(stmts.len(), 3);
        assert_eq!(stmts[0], Stmt::Decl { var: "a".into(), line: 1 });
        assert_eq!(stmts[1], Stmt::Decl { var: "b".into(), line: 1 });
        assert_eq!(
            stmts[2],
            Stmt::Assign {
                var: "b".into(),
                expr: Expr::var("a").add(Expr::int(1)),
                line: 2,
            }
        );
    }

    #[test]
    fn parse_precedence_and_parens() {
        let program = parse("x = 1 + 2 * 3;").unwrap();
        let Stmt::Seq(stmts) = program else { panic!() };
        let Stmt::Assign { expr, .. } = &stmts[0] else { panic!() };
        assert_eq!(*expr, Expr::int(1).add(Expr::int(2).mul(Expr::int(3))));

        let program = parse("x = (1 + 2) * 3;").unwrap();
        let Stmt::Seq(stmts) = program else { panic!() };
        let Stmt::Assign { expr, .. } = &stmts[0] else { panic!() };
        assert_eq!(*expr, Expr::int(1).add(Expr::int(2)).mul(Expr::int(3)));
    }

    #[test]
    fn parse_unary_minus() {
        // A negated literal folds; a negated expression desugars to 0 - e
        let program = parse("x = -5 + 1;").unwrap();
        let Stmt::Seq(stmts) = program else { panic!() };
        let Stmt::Assign { expr, .. } = &stmts[0] else { panic!() };
        assert_eq!(*expr, Expr::int(-5).add(Expr::int(1)));

        let program = parse("x = -y;").unwrap();
        let Stmt::Seq(stmts) = program else { panic!() };
        let Stmt::Assign { expr, .. } = &stmts[0] else { panic!() };
        assert_eq!(*expr, Expr::int(0).sub(Expr::var("y")));
    }

    #[test]
    fn parse_assume_with_multiple_clauses() {
        let program = parse("assume(a >= 0, a <= 10);").unwrap();
        let Stmt::Seq(stmts) = program else { panic!() };
        let Stmt::Assume { conds, line } = &stmts[0] else { panic!() };
        assert_eq!(*line, 1);
        assert_eq!(conds.len(), 2);
        assert_eq!(conds[0], Cond::ge(Expr::var("a"), Expr::int(0)));
        assert_eq!(conds[1], Cond::le(Expr::var("a"), Expr::int(10)));
    }

    #[test]
    fn parse_if_else_and_while() {
        let source = "if (a < 5) { b = 1; } else { b = 2; }\nwhile (a < 100) { a = a + 1; }";
        let program = parse(source).unwrap();
        let Stmt::Seq(stmts) = program else { panic!() };
        let Stmt::If { cond, else_body, .. } = &stmts[0] else { panic!("expected if") };
        assert_eq!(*cond, Cond::lt(Expr::var("a"), Expr::int(5)));
        assert!(else_body.is_some());
        let Stmt::While { cond, line, .. } = &stmts[1] else { panic!("expected while") };
        assert_eq!(*cond, Cond::lt(Expr::var("a"), Expr::int(100)));
        assert_eq!(*line, 2);
    }

    #[test]
    fn parse_else_if_chain() {
        let source = "if (a < 0) { b = 0; } else if (a < 10) { b = 1; } else { b = 2; }";
        let program = parse(source).unwrap();
        let Stmt::Seq(stmts) = program else { panic!() };
        let Stmt::If { else_body: Some(else_body), .. } = &stmts[0] else { panic!() };
        assert!(matches!(**else_body, Stmt::If { .. }));
    }

    #[test]
    fn parse_true_false_conditions() {
        let program = parse("if (true) { x = 1; }\nassert(false);").unwrap();
        let Stmt::Seq(stmts) = program else { panic!() };
        let Stmt::If { cond, .. } = &stmts[0] else { panic!() };
        assert_eq!(*cond, Cond::eq(Expr::int(0), Expr::int(0)));
        let Stmt::Assert { cond, line } = &stmts[1] else { panic!() };
        assert_eq!(*cond, Cond::ne(Expr::int(0), Expr::int(0)));
        assert_eq!(*line, 2);
    }

    #[test]
    fn parse_comments_and_division() {
        let source = "// setup\nx = 6 / 2; /* multi\nline */ y = x;";
        let program = parse(source).unwrap();
        let Stmt::Seq(stmts) = program else { panic!() };
        let Stmt::Assign { expr, line, .. } = &stmts[0] else { panic!() };
        assert_eq!(*line, 2);
        assert!(matches!(expr, Expr::Binary { op: BinOp::Div, .. }));
        let Stmt::Assign { line, .. } = &stmts[1] else { panic!() };
        assert_eq!(*line, 3);
    }

    #[test]
    fn reject_malformed_input() {
        assert!(matches!(parse("x = ;"), Err(ParseError::UnexpectedToken { .. })));
        assert!(matches!(parse("x = 1"), Err(ParseError::UnexpectedEof { .. })));
        assert!(matches!(parse("@"), Err(ParseError::UnexpectedChar { ch: '@', .. })));
        assert!(matches!(
            parse("x = 99999999999999999999;"),
            Err(ParseError::IntOutOfRange { .. })
        ));
        assert!(matches!(parse("/* open"), Err(ParseError::UnterminatedComment { .. })));
        assert!(matches!(parse("if (a ! b) { }"), Err(ParseError::UnexpectedChar { ch: '!', .. })));
    }
}
