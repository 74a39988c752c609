//! Recursive-descent parser
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! program    := (';' | statement)*
//! statement  := '@' arguments | expression
//! expression := comparison (assign_op expression)?
//! comparison := additive (cmp_op additive)*
//! additive   := term (('+' | '-') term)*
//! term       := power (('*' | '/' | '%') power)*
//! power      := unary ('**' unary)*
//! unary      := '-' unary | ('++' | '--') identity | postfix
//! postfix    := identity ('++' | '--')? | primary
//! identity   := IDENT ('.' IDENT | '[' expression ']' | '(' arguments ')')*
//! primary    := INT | DOUBLE | STRING | '(' expression ')' | list | object
//! ```
//!
//! Increment, decrement and compound assignment are desugared into
//! [`Expr::Assign`] nodes here; the runtime never sees them as operators.
//!
//! Nesting is bounded: every nested expression, operand of a binary chain,
//! unary minus and call counts one level. A tree within the bound is at most
//! about twice as deep as the bound.

use crate::ast::{BinOp, Expr, Identifier, Program, Span, Spanned};
use crate::builtins;
use crate::error::{CompileError, Result};
use crate::lexer::Token;


const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_GROW_SIZE: usize = 1024 * 1024;

/// Default bound on expression nesting, matching the evaluator's bound
pub const MAX_NESTING_DEPTH: usize = crate::interp::MAX_RECURSION_DEPTH;

/// Parse tokens into a program
pub fn parse(filename: &str, source: &str, tokens: Vec<(Token, Span)>) -> Result<Program> {
    parse_with_max_depth(filename, source, tokens, MAX_NESTING_DEPTH)
}

/// Parse, failing with "nesting too deep" past `max_depth` nested levels
pub fn parse_with_max_depth(
    _filename: &str,
    source: &str,
    tokens: Vec<(Token, Span)>,
    max_depth: usize,
) -> Result<Program> {
    Parser::new(tokens, source.len(), max_depth).program()
}

struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    eof: Span,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    fn new(tokens: Vec<(Token, Span)>, source_len: usize, max_depth: usize) -> Self {
        Parser {
            tokens,
            pos: 0,
            eof: Span::new(source_len, source_len),
            depth: 0,
            max_depth,
        }
    }

    /// Count one nesting level. Callers restore `depth` on success; an error
    /// ends the parse.
    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(CompileError::parser(
                format!("nesting too deep (limit {})", self.max_depth),
                self.peek_span(),
            ));
        }
        Ok(())
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_span(&self) -> Span {
        self.tokens.get(self.pos).map(|(_, s)| *s).unwrap_or(self.eof)
    }

    fn prev_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|(_, s)| *s)
            .unwrap_or(self.eof)
    }

    fn check(&self, expected: &Token) -> bool {
        self.peek() == Some(expected)
    }

    fn advance(&mut self) -> Option<(Token, Span)> {
        let item = self.tokens.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }

    fn eat(&mut self, expected: &Token) -> Result<Span> {
        if self.check(expected) {
            self.pos += 1;
            Ok(self.prev_span())
        } else {
            Err(self.unexpected(&format!("`{expected}`")))
        }
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        let found = match self.peek() {
            Some(tok) => format!("`{tok}`"),
            None => "end of input".to_string(),
        };
        CompileError::parser(format!("expected {expected}, found {found}"), self.peek_span())
    }

    fn at_statement_end(&self) -> bool {
        matches!(self.peek(), None | Some(Token::Semi))
    }

    fn program(&mut self) -> Result<Program> {
        let mut statements = Vec::new();
        while let Some(tok) = self.peek() {
            if *tok == Token::Semi {
                self.pos += 1;
                continue;
            }
            statements.push(self.statement()?);
        }
        Ok(Program { statements })
    }

    fn statement(&mut self) -> Result<Spanned<Expr>> {
        match self.peek() {
            Some(tok) if tok.is_reserved_keyword() => Err(CompileError::parser(
                format!("unexpected reserved keyword `{tok}` at the start of a statement"),
                self.peek_span(),
            )),
            Some(Token::At) => self.print_macro(),
            _ => self.expression(),
        }
    }

    /// `@ a, b` is shorthand for calling the `print` built-in
    fn print_macro(&mut self) -> Result<Spanned<Expr>> {
        let start = self.eat(&Token::At)?;
        let mut args = Vec::new();
        if !self.at_statement_end() {
            args.push(self.expression()?);
            while self.check(&Token::Comma) {
                self.pos += 1;
                args.push(self.expression()?);
            }
        }
        if !self.at_statement_end() {
            return Err(self.unexpected("end of statement after `@`"));
        }
        let callee = builtins::identifier("print", start)
            .ok_or_else(|| CompileError::parser("built-in `print` is not registered", start))?;
        let span = start.merge(self.prev_span());
        let call = Spanned::new(Expr::Call { callee, args }, span);
        Ok(Spanned::new(Expr::Ident(Identifier::new(vec![call])), span))
    }

    fn expression(&mut self) -> Result<Spanned<Expr>> {
        self.enter()?;
        let expr = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.expression_inner());
        self.depth -= 1;
        expr
    }

    fn expression_inner(&mut self) -> Result<Spanned<Expr>> {
        let node = self.comparison()?;

        let compound = match self.peek() {
            Some(Token::Eq) => None,
            Some(Token::PlusEq) => Some(BinOp::Add),
            Some(Token::MinusEq) => Some(BinOp::Sub),
            Some(Token::StarEq) => Some(BinOp::Mul),
            Some(Token::SlashEq) => Some(BinOp::Div),
            Some(Token::PercentEq) => Some(BinOp::Mod),
            Some(Token::StarStarEq) => Some(BinOp::Pow),
            _ => return Ok(node),
        };
        self.pos += 1;

        let target_span = node.span;
        let target = into_target(node, "assign to")?;
        let rhs = self.expression()?;
        let span = target_span.merge(rhs.span);
        let value = match compound {
            None => rhs,
            Some(op) => Spanned::new(
                Expr::Binary {
                    op,
                    left: Box::new(Spanned::new(Expr::Ident(target.clone()), target_span)),
                    right: Box::new(rhs),
                },
                span,
            ),
        };

        Ok(Spanned::new(
            Expr::Assign {
                target,
                value: Box::new(value),
                return_before_assignment: false,
            },
            span,
        ))
    }

    fn comparison(&mut self) -> Result<Spanned<Expr>> {
        let base = self.depth;
        let mut left = self.additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => BinOp::Eq,
                Some(Token::NotEq) => BinOp::Ne,
                Some(Token::Lt) => BinOp::Lt,
                Some(Token::Gt) => BinOp::Gt,
                Some(Token::LtEq) => BinOp::Le,
                Some(Token::GtEq) => BinOp::Ge,
                _ => break,
            };
            self.pos += 1;
            self.enter()?;
            let right = self.additive()?;
            left = binary(op, left, right);
        }
        self.depth = base;
        Ok(left)
    }

    fn additive(&mut self) -> Result<Spanned<Expr>> {
        let base = self.depth;
        let mut left = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            self.enter()?;
            let right = self.term()?;
            left = binary(op, left, right);
        }
        self.depth = base;
        Ok(left)
    }

    fn term(&mut self) -> Result<Spanned<Expr>> {
        let base = self.depth;
        let mut left = self.power()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::Percent) => BinOp::Mod,
                _ => break,
            };
            self.pos += 1;
            self.enter()?;
            let right = self.power()?;
            left = binary(op, left, right);
        }
        self.depth = base;
        Ok(left)
    }

    /// `**` is left-associative: `2 ** 3 ** 2` is `(2 ** 3) ** 2`
    fn power(&mut self) -> Result<Spanned<Expr>> {
        let base = self.depth;
        let mut left = self.unary()?;
        while self.check(&Token::StarStar) {
            self.pos += 1;
            self.enter()?;
            let right = self.unary()?;
            left = binary(BinOp::Pow, left, right);
        }
        self.depth = base;
        Ok(left)
    }

    fn unary(&mut self) -> Result<Spanned<Expr>> {
        match self.peek() {
            Some(Token::Minus) => {
                let start = self.peek_span();
                self.pos += 1;
                self.enter()?;
                let operand = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.unary());
                self.depth -= 1;
                let operand = operand?;
                let span = start.merge(operand.span);
                let node = match operand.node {
                    Expr::IntLit(n) => Expr::IntLit(n.wrapping_neg()),
                    Expr::DoubleLit(d) => Expr::DoubleLit(-d),
                    _ => Expr::Binary {
                        op: BinOp::Sub,
                        left: Box::new(Spanned::new(Expr::IntLit(0), start)),
                        right: Box::new(operand),
                    },
                };
                Ok(Spanned::new(node, span))
            }
            Some(Token::PlusPlus) | Some(Token::MinusMinus) => {
                let (tok, start) = self.advance().ok_or_else(|| self.unexpected("`++` or `--`"))?;
                let operand = self.postfix()?;
                let span = start.merge(operand.span);
                let target = into_target(operand, &format!("apply `{tok}` to"))?;
                Ok(step_assignment(&tok, target, span, false))
            }
            _ => self.postfix(),
        }
    }

    fn postfix(&mut self) -> Result<Spanned<Expr>> {
        if !matches!(self.peek(), Some(Token::Ident(_))) {
            return self.primary();
        }

        let ident = self.identity()?;
        match self.peek() {
            Some(Token::PlusPlus) | Some(Token::MinusMinus) => {
                let (tok, end) = self.advance().ok_or_else(|| self.unexpected("`++` or `--`"))?;
                let span = ident.span.merge(end);
                let target = into_target(ident, &format!("apply `{tok}` to"))?;
                Ok(step_assignment(&tok, target, span, true))
            }
            _ => Ok(ident),
        }
    }

    /// Parse an address: a name followed by `.name`, `[index]` and `(args)` segments
    fn identity(&mut self) -> Result<Spanned<Expr>> {
        let Some(Token::Ident(name)) = self.peek() else {
            return Err(self.unexpected("identifier"));
        };
        let start = self.peek_span();
        let mut address = vec![Spanned::new(Expr::name(name.clone()), start)];
        self.pos += 1;
        let base = self.depth;

        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.pos += 1;
                    let Some(Token::Ident(name)) = self.peek() else {
                        return Err(self.unexpected("property name after `.`"));
                    };
                    let segment = Spanned::new(Expr::name(name.clone()), self.peek_span());
                    self.pos += 1;
                    address.push(segment);
                }
                Some(Token::LBracket) => {
                    self.pos += 1;
                    let index = self.expression()?;
                    self.eat(&Token::RBracket)?;
                    address.push(index);
                }
                Some(Token::LParen) => {
                    self.pos += 1;
                    self.enter()?;
                    let args = self.arguments()?;
                    self.eat(&Token::RParen)?;
                    let span = start.merge(self.prev_span());
                    let callee = Identifier::new(std::mem::take(&mut address));
                    address.push(Spanned::new(Expr::Call { callee, args }, span));
                }
                _ => break,
            }
        }
        self.depth = base;

        let span = start.merge(self.prev_span());
        Ok(Spanned::new(Expr::Ident(Identifier::new(address)), span))
    }

    fn arguments(&mut self) -> Result<Vec<Spanned<Expr>>> {
        let mut args = Vec::new();
        while !self.check(&Token::RParen) {
            args.push(self.expression()?);
            if !self.check(&Token::Comma) {
                break;
            }
            self.pos += 1;
        }
        Ok(args)
    }

    fn primary(&mut self) -> Result<Spanned<Expr>> {
        let span = self.peek_span();
        let node = match self.peek() {
            Some(Token::IntLit(n)) => Expr::IntLit(*n),
            Some(Token::DoubleLit(d)) => Expr::DoubleLit(*d),
            Some(Token::StringLit(s)) => Expr::StringLit(s.clone()),
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.expression()?;
                self.eat(&Token::RParen)?;
                return Ok(Spanned::new(inner.node, span.merge(self.prev_span())));
            }
            Some(Token::LBracket) => return self.list(),
            Some(Token::LBrace) => return self.object(),
            _ => return Err(self.unexpected("expression")),
        };
        self.pos += 1;
        Ok(Spanned::new(node, span))
    }

    fn list(&mut self) -> Result<Spanned<Expr>> {
        let start = self.eat(&Token::LBracket)?;
        let mut elements = Vec::new();
        while !self.check(&Token::RBracket) {
            elements.push(self.expression()?);
            if !self.check(&Token::Comma) {
                break;
            }
            self.pos += 1;
        }
        let end = self.eat(&Token::RBracket)?;
        Ok(Spanned::new(Expr::List(elements), start.merge(end)))
    }

    fn object(&mut self) -> Result<Spanned<Expr>> {
        let start = self.eat(&Token::LBrace)?;
        let mut properties = Vec::new();
        while !self.check(&Token::RBrace) {
            let key = self.expression()?;
            self.eat(&Token::Colon)?;
            let value = self.expression()?;
            properties.push((key, value));
            if !self.check(&Token::Comma) {
                break;
            }
            self.pos += 1;
        }
        let end = self.eat(&Token::RBrace)?;
        Ok(Spanned::new(Expr::Object(properties), start.merge(end)))
    }
}

fn binary(op: BinOp, left: Spanned<Expr>, right: Spanned<Expr>) -> Spanned<Expr> {
    let span = left.span.merge(right.span);
    Spanned::new(
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    )
}

/// Only a non-empty address can be the target of an assignment
fn into_target(node: Spanned<Expr>, action: &str) -> Result<Identifier> {
    match node.node {
        Expr::Ident(ident) if !ident.is_empty() => Ok(ident),
        other => Err(CompileError::parser(
            format!("cannot {action} {}", other.kind_name()),
            node.span,
        )),
    }
}

/// `x++` / `++x` / `x--` / `--x` as `x = x ± 1`
fn step_assignment(tok: &Token, target: Identifier, span: Span, return_before: bool) -> Spanned<Expr> {
    let op = if *tok == Token::PlusPlus { BinOp::Add } else { BinOp::Sub };
    let value = Spanned::new(
        Expr::Binary {
            op,
            left: Box::new(Spanned::new(Expr::Ident(target.clone()), span)),
            right: Box::new(Spanned::new(Expr::IntLit(1), span)),
        },
        span,
    );
    Spanned::new(
        Expr::Assign {
            target,
            value: Box::new(value),
            return_before_assignment: return_before,
        },
        span,
    )
}
