use crate::ast::{AssignOp, BinOp, Expr, Stmt};
use crate::error::ScriptError;
use crate::lexer::{Token, lex};

/// Parse a whole script body into statements.
pub fn parse_script(source: &str) -> Result<Vec<Stmt>, ScriptError> {
    let mut parser = Parser::new(source)?;
    let mut stmts = Vec::new();
    while !parser.at_end() {
        stmts.push(parser.statement()?);
    }
    Ok(stmts)
}

/// Parse a single expression (a when-predicate).
pub fn parse_expression(source: &str) -> Result<Expr, ScriptError> {
    let mut parser = Parser::new(source)?;
    let expr = parser.expression()?;
    if !parser.at_end() {
        return Err(parser.error_here("unexpected input after expression"));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<(Token, std::ops::Range<usize>)>,
    pos: usize,
    source_len: usize,
}

impl Parser {
    fn new(source: &str) -> Result<Self, ScriptError> {
        Ok(Self {
            tokens: lex(source)?,
            pos: 0,
            source_len: source.len(),
        })
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> Result<(), ScriptError> {
        if self.eat(&token) {
            Ok(())
        } else {
            Err(self.error_here(format!("expected `{token}`")))
        }
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(_, span)| span.start)
            .unwrap_or(self.source_len)
    }

    fn error_here(&self, message: impl Into<String>) -> ScriptError {
        ScriptError::Syntax {
            position: self.position(),
            message: message.into(),
        }
    }

    // -- Statements --

    fn statement(&mut self) -> Result<Stmt, ScriptError> {
        match self.peek() {
            Some(Token::Ident(name)) if name == "if" => self.if_statement(),
            Some(Token::Ident(name)) if name == "story" => self.story_statement(),
            _ => Err(self.error_here("expected a statement (`story.…` or `if`)")),
        }
    }

    fn if_statement(&mut self) -> Result<Stmt, ScriptError> {
        self.bump(); // `if`
        self.expect(Token::LParen)?;
        let cond = self.expression()?;
        self.expect(Token::RParen)?;
        let then_branch = self.block()?;

        let mut else_branch = Vec::new();
        if matches!(self.peek(), Some(Token::Ident(name)) if name == "else") {
            self.bump();
            if matches!(self.peek(), Some(Token::Ident(name)) if name == "if") {
                else_branch.push(self.if_statement()?);
            } else {
                else_branch = self.block()?;
            }
        }

        Ok(Stmt::If {
            cond,
            then_branch,
            else_branch,
        })
    }

    fn block(&mut self) -> Result<Vec<Stmt>, ScriptError> {
        self.expect(Token::LBrace)?;
        let mut stmts = Vec::new();
        while !self.eat(&Token::RBrace) {
            if self.at_end() {
                return Err(self.error_here("unterminated block (missing `}`)"));
            }
            stmts.push(self.statement()?);
        }
        Ok(stmts)
    }

    /// `story.name = …`, `story.name += …`, or `story.method(…)`.
    fn story_statement(&mut self) -> Result<Stmt, ScriptError> {
        self.bump(); // `story`
        self.expect(Token::Dot)?;
        let name = self.ident()?;

        let stmt = match self.peek() {
            Some(Token::LParen) => Stmt::Expr(self.finish_call(name)?),
            Some(Token::Assign) => {
                self.bump();
                Stmt::Assign {
                    var: name,
                    op: AssignOp::Set,
                    value: self.expression()?,
                }
            }
            Some(Token::PlusAssign) => {
                self.bump();
                Stmt::Assign {
                    var: name,
                    op: AssignOp::Add,
                    value: self.expression()?,
                }
            }
            Some(Token::MinusAssign) => {
                self.bump();
                Stmt::Assign {
                    var: name,
                    op: AssignOp::Sub,
                    value: self.expression()?,
                }
            }
            _ => return Err(self.error_here("expected `(`, `=`, `+=`, or `-=`")),
        };

        // Statement separators are optional at line ends.
        self.eat(&Token::Semi);
        Ok(stmt)
    }

    fn ident(&mut self) -> Result<String, ScriptError> {
        match self.bump() {
            Some(Token::Ident(name)) => Ok(name),
            _ => {
                self.pos = self.pos.saturating_sub(1);
                Err(self.error_here("expected an identifier"))
            }
        }
    }

    // -- Expressions, loosest-binding first --

    fn expression(&mut self) -> Result<Expr, ScriptError> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.and_expr()?;
        while self.eat(&Token::OrOr) {
            let rhs = self.and_expr()?;
            lhs = Expr::Binary {
                op: BinOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.cmp_expr()?;
        while self.eat(&Token::AndAnd) {
            let rhs = self.cmp_expr()?;
            lhs = Expr::Binary {
                op: BinOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn cmp_expr(&mut self) -> Result<Expr, ScriptError> {
        let lhs = self.add_expr()?;
        let op = match self.peek() {
            Some(Token::EqEq) => Some(BinOp::Eq),
            Some(Token::NotEq) => Some(BinOp::Ne),
            Some(Token::Lt) => Some(BinOp::Lt),
            Some(Token::Le) => Some(BinOp::Le),
            Some(Token::Gt) => Some(BinOp::Gt),
            Some(Token::Ge) => Some(BinOp::Ge),
            _ => None,
        };
        match op {
            Some(op) => {
                self.bump();
                let rhs = self.add_expr()?;
                Ok(Expr::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                })
            }
            None => Ok(lhs),
        }
    }

    fn add_expr(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.bump();
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ScriptError> {
        if self.eat(&Token::Not) {
            Ok(Expr::Not(Box::new(self.unary()?)))
        } else if self.eat(&Token::Minus) {
            Ok(Expr::Neg(Box::new(self.unary()?)))
        } else {
            self.primary()
        }
    }

    fn primary(&mut self) -> Result<Expr, ScriptError> {
        match self.peek().cloned() {
            Some(Token::Int(n)) => {
                self.bump();
                Ok(Expr::Int(n))
            }
            Some(Token::Str(s)) => {
                self.bump();
                Ok(Expr::Str(s))
            }
            Some(Token::LParen) => {
                self.bump();
                let expr = self.expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Some(Token::Ident(name)) if name == "true" => {
                self.bump();
                Ok(Expr::Bool(true))
            }
            Some(Token::Ident(name)) if name == "false" => {
                self.bump();
                Ok(Expr::Bool(false))
            }
            Some(Token::Ident(name)) if name == "story" => {
                self.bump();
                self.expect(Token::Dot)?;
                let member = self.ident()?;
                if self.peek() == Some(&Token::LParen) {
                    self.finish_call(member)
                } else {
                    Ok(Expr::Var(member))
                }
            }
            Some(Token::Ident(name)) => {
                Err(self.error_here(format!("unknown identifier `{name}` (only `story` is in scope)")))
            }
            _ => Err(self.error_here("expected an expression")),
        }
    }

    fn finish_call(&mut self, method: String) -> Result<Expr, ScriptError> {
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        if self.peek() != Some(&Token::RParen) {
            loop {
                args.push(self.expression()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(Token::RParen)?;
        Ok(Expr::Call { method, args })
    }
}
