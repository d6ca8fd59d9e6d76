// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The parser implementation: recursive descent for statements, Pratt
//! parsing for expressions.

use std::collections::HashSet;

use weave_ast::expr::{Arg, BinOp, CmpOp, Expr, ExprKind, LogicalOp, UnaryOp};
use weave_ast::stmt::{ClassDef, FnDef, Param, ParamKind, Stmt, StmtKind};
use weave_ast::token::{Token, TokenKind};
use weave_ast::{NodeId, Span};

/// Maximum number of errors to collect before stopping.
const MAX_ERRORS: usize = 20;

/// Binding power of the comparison operators. Loop targets are parsed just
/// above it so `for x in xs` does not read `x in xs` as a membership test.
const CMP_BP: u8 = 7;
const UNARY_BP: u8 = 21;
const NOT_BP: u8 = 5;

/// The parser for weave source.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ParseError>,
    next_node_id: u32,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)) {
            let end = tokens.last().map(|t| t.span.end).unwrap_or(0);
            tokens.push(Token { kind: TokenKind::Eof, span: Span::new(end, end) });
        }
        Self { tokens, pos: 0, errors: Vec::new(), next_node_id: 0 }
    }

    fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    /// Record error, return if should continue.
    fn record_error(&mut self, error: ParseError) -> bool {
        self.errors.push(error);
        self.errors.len() < MAX_ERRORS
    }

    /// Skip past the rest of the broken statement, including any block that
    /// hangs off it.
    fn synchronize(&mut self) {
        let mut depth = 0i32;
        while !self.at_end() {
            match self.current_kind() {
                TokenKind::Indent => depth += 1,
                TokenKind::Dedent => depth -= 1,
                TokenKind::Newline if depth <= 0 && !matches!(self.peek(1), TokenKind::Indent) => {
                    self.advance();
                    while self.check(&TokenKind::Dedent) {
                        self.advance();
                    }
                    return;
                }
                _ => {}
            }
            self.advance();
        }
    }

    // =========================================================================
    // Token Navigation
    // =========================================================================

    fn current(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek(&self, n: usize) -> &TokenKind {
        self.tokens.get(self.pos + n).map(|t| &t.kind).unwrap_or(&TokenKind::Eof)
    }

    fn at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    fn advance(&mut self) -> &Token {
        if !self.at_end() {
            self.pos += 1;
        }
        &self.tokens[self.pos.saturating_sub(1)]
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<&Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::expected(
                &kind.display_name(),
                self.current_kind(),
                self.current().span,
            ))
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(&TokenKind::Newline) {
            self.advance();
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.current_kind().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(ParseError::expected("a name", self.current_kind(), self.current().span)),
        }
    }

    /// End offset of the last real token consumed, skipping layout tokens.
    fn last_end(&self) -> usize {
        self.tokens[..self.pos]
            .iter()
            .rev()
            .find(|t| !matches!(t.kind, TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent))
            .map(|t| t.span.end)
            .unwrap_or(0)
    }

    fn prev_end(&self) -> usize {
        self.tokens[self.pos.saturating_sub(1)].span.end
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Parse the whole token stream as a module body.
    pub fn parse(&mut self) -> ParseResult {
        let mut body = Vec::new();
        self.skip_newlines();

        while !self.at_end() {
            match self.parse_statement() {
                Ok(stmts) => body.extend(stmts),
                Err(e) => {
                    if !self.record_error(e) {
                        break;
                    }
                    self.synchronize();
                }
            }
            self.skip_newlines();
        }

        ParseResult {
            body,
            errors: std::mem::take(&mut self.errors),
        }
    }

    /// One compound statement, or one line of `;`-separated simple ones.
    fn parse_statement(&mut self) -> Result<Vec<Stmt>, ParseError> {
        match self.current_kind() {
            TokenKind::If => Ok(vec![self.parse_if()?]),
            TokenKind::While => Ok(vec![self.parse_while()?]),
            TokenKind::For => Ok(vec![self.parse_for()?]),
            TokenKind::Def | TokenKind::At => Ok(vec![self.parse_def()?]),
            TokenKind::Class => Ok(vec![self.parse_class()?]),
            TokenKind::Indent => Err(ParseError {
                span: self.current().span,
                message: "unexpected indent".to_string(),
                hint: Some("only block bodies are indented".to_string()),
            }),
            _ => self.parse_simple_line(),
        }
    }

    fn parse_simple_line(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut stmts = vec![self.parse_simple_stmt()?];
        while self.match_token(&TokenKind::Semi) {
            if self.check(&TokenKind::Newline) {
                break;
            }
            stmts.push(self.parse_simple_stmt()?);
        }
        self.expect(&TokenKind::Newline)?;
        Ok(stmts)
    }

    fn parse_simple_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current().span.start;
        let kind = match self.current_kind().clone() {
            TokenKind::Pass => {
                self.advance();
                StmtKind::Pass
            }
            TokenKind::Break => {
                self.advance();
                StmtKind::Break
            }
            TokenKind::Continue => {
                self.advance();
                StmtKind::Continue
            }
            TokenKind::Return => {
                self.advance();
                if self.check(&TokenKind::Newline) || self.check(&TokenKind::Semi) {
                    StmtKind::Return(None)
                } else {
                    StmtKind::Return(Some(self.parse_exprlist()?))
                }
            }
            TokenKind::Reserved(word) => return Err(ParseError::reserved(&word, self.current().span)),
            _ => self.parse_expr_or_assign()?,
        };
        Ok(Stmt::new(self.next_id(), kind, Span::new(start, self.prev_end())))
    }

    fn parse_expr_or_assign(&mut self) -> Result<StmtKind, ParseError> {
        let first = self.parse_exprlist()?;

        if self.check(&TokenKind::Eq) {
            let mut targets = vec![first];
            let value = loop {
                self.advance();
                let next = self.parse_exprlist()?;
                if self.check(&TokenKind::Eq) {
                    targets.push(next);
                } else {
                    break next;
                }
            };
            for target in &targets {
                check_target(target)?;
            }
            return Ok(StmtKind::Assign { targets, value });
        }

        if let Some(op) = self.match_compound_assign() {
            if !matches!(
                first.kind,
                ExprKind::Name(_) | ExprKind::Attribute { .. } | ExprKind::Subscript { .. }
            ) {
                return Err(ParseError {
                    span: first.span,
                    message: "illegal target for augmented assignment".to_string(),
                    hint: None,
                });
            }
            let rhs = self.parse_expr()?;
            let span = first.span.to(rhs.span);
            let value = Expr::new(
                self.next_id(),
                ExprKind::Binary { op, left: Box::new(first.clone()), right: Box::new(rhs) },
                span,
            );
            return Ok(StmtKind::Assign { targets: vec![first], value });
        }

        Ok(StmtKind::Expr(first))
    }

    fn match_compound_assign(&mut self) -> Option<BinOp> {
        let op = match self.current_kind() {
            TokenKind::PlusEq => Some(BinOp::Add),
            TokenKind::MinusEq => Some(BinOp::Sub),
            TokenKind::StarEq => Some(BinOp::Mul),
            TokenKind::SlashEq => Some(BinOp::Div),
            TokenKind::SlashSlashEq => Some(BinOp::FloorDiv),
            TokenKind::PercentEq => Some(BinOp::Mod),
            _ => None,
        };
        if op.is_some() {
            self.advance();
        }
        op
    }

    /// `':' NEWLINE INDENT stmt+ DEDENT`, or `':' simple_stmts NEWLINE`.
    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(&TokenKind::Colon)?;
        if !self.match_token(&TokenKind::Newline) {
            return self.parse_simple_line();
        }
        if !self.match_token(&TokenKind::Indent) {
            return Err(ParseError::expected("indented block", self.current_kind(), self.current().span));
        }
        let mut body = Vec::new();
        while !self.check(&TokenKind::Dedent) && !self.at_end() {
            body.extend(self.parse_statement()?);
            self.skip_newlines();
        }
        self.expect(&TokenKind::Dedent)?;
        Ok(body)
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current().span.start;
        self.advance(); // `if` or `elif`
        let cond = self.parse_expr()?;
        let then_branch = self.parse_block()?;
        let else_branch = if self.check(&TokenKind::Elif) {
            vec![self.parse_if()?]
        } else if self.match_token(&TokenKind::Else) {
            self.parse_block()?
        } else {
            Vec::new()
        };
        let kind = StmtKind::If { cond, then_branch, else_branch };
        Ok(Stmt::new(self.next_id(), kind, Span::new(start, self.last_end())))
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current().span.start;
        self.expect(&TokenKind::While)?;
        let cond = self.parse_expr()?;
        let body = self.parse_block()?;
        let kind = StmtKind::While { cond, body };
        Ok(Stmt::new(self.next_id(), kind, Span::new(start, self.last_end())))
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current().span.start;
        self.expect(&TokenKind::For)?;
        let target = self.parse_target_list()?;
        check_target(&target)?;
        self.expect(&TokenKind::In)?;
        let iter = self.parse_exprlist()?;
        let body = self.parse_block()?;
        let orelse = if self.match_token(&TokenKind::Else) {
            self.parse_block()?
        } else {
            Vec::new()
        };
        let kind = StmtKind::For { target, iter, body, orelse };
        Ok(Stmt::new(self.next_id(), kind, Span::new(start, self.last_end())))
    }

    fn parse_target_list(&mut self) -> Result<Expr, ParseError> {
        let start = self.current().span.start;
        let first = self.parse_expr_bp(CMP_BP + 2)?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if self.check(&TokenKind::In) {
                break;
            }
            items.push(self.parse_expr_bp(CMP_BP + 2)?);
        }
        Ok(Expr::new(self.next_id(), ExprKind::Tuple(items), Span::new(start, self.prev_end())))
    }

    fn parse_def(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current().span.start;
        let mut decorators = Vec::new();
        while self.match_token(&TokenKind::At) {
            decorators.push(self.parse_expr()?);
            self.expect(&TokenKind::Newline)?;
            self.skip_newlines();
        }
        if !self.check(&TokenKind::Def) {
            return Err(ParseError::expected("'def'", self.current_kind(), self.current().span)
                .with_hint("decorators apply to function definitions"));
        }
        self.advance();
        let name = self.expect_ident()?;
        self.expect(&TokenKind::LParen)?;
        let params = self.parse_params()?;
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_block()?;
        let kind = StmtKind::FunctionDef(FnDef { name, params, body, decorators });
        Ok(Stmt::new(self.next_id(), kind, Span::new(start, self.last_end())))
    }

    fn parse_params(&mut self) -> Result<Vec<Param>, ParseError> {
        let mut params: Vec<Param> = Vec::new();
        let mut seen = HashSet::new();
        let mut saw_default = false;

        while !self.check(&TokenKind::RParen) {
            let span = self.current().span;
            if params.iter().any(|p| p.kind == ParamKind::KwArgs) {
                return Err(ParseError::at(span, "parameters cannot follow '**' parameter"));
            }
            let param = if self.match_token(&TokenKind::StarStar) {
                Param { name: self.expect_ident()?, kind: ParamKind::KwArgs, default: None }
            } else if self.match_token(&TokenKind::Star) {
                if params.iter().any(|p| p.kind == ParamKind::VarArgs) {
                    return Err(ParseError::at(span, "only one '*' parameter is allowed"));
                }
                Param { name: self.expect_ident()?, kind: ParamKind::VarArgs, default: None }
            } else {
                if params.iter().any(|p| p.kind == ParamKind::VarArgs) {
                    return Err(ParseError::at(span, "parameters cannot follow '*' parameter")
                        .with_hint("keyword-only parameters are not supported"));
                }
                let name = self.expect_ident()?;
                let default = if self.match_token(&TokenKind::Eq) {
                    saw_default = true;
                    Some(self.parse_expr()?)
                } else {
                    if saw_default {
                        return Err(ParseError::at(span, "non-default parameter follows default parameter"));
                    }
                    None
                };
                Param { name, kind: ParamKind::Normal, default }
            };
            if !seen.insert(param.name.clone()) {
                return Err(ParseError::at(
                    span,
                    format!("duplicate parameter '{}' in function definition", param.name),
                ));
            }
            params.push(param);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        Ok(params)
    }

    fn parse_class(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current().span.start;
        self.expect(&TokenKind::Class)?;
        let name = self.expect_ident()?;
        let base = if self.match_token(&TokenKind::LParen) {
            let base = if self.check(&TokenKind::RParen) { None } else { Some(self.parse_expr()?) };
            self.expect(&TokenKind::RParen)?;
            base
        } else {
            None
        };
        let body = self.parse_block()?;
        let kind = StmtKind::ClassDef(ClassDef { name, base, body });
        Ok(Stmt::new(self.next_id(), kind, Span::new(start, self.last_end())))
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_expr_bp(0)
    }

    /// `expr (',' expr)* [',']`; more than one item (or a trailing comma)
    /// makes a tuple.
    fn parse_exprlist(&mut self) -> Result<Expr, ParseError> {
        let start = self.current().span.start;
        let first = self.parse_expr()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if !self.is_expr_start() {
                break;
            }
            items.push(self.parse_expr()?);
        }
        Ok(Expr::new(self.next_id(), ExprKind::Tuple(items), Span::new(start, self.prev_end())))
    }

    fn is_expr_start(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::Int(_)
                | TokenKind::Float(_)
                | TokenKind::String(_)
                | TokenKind::Ident(_)
                | TokenKind::True
                | TokenKind::False
                | TokenKind::None
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::LBrace
                | TokenKind::Minus
                | TokenKind::Plus
                | TokenKind::Tilde
                | TokenKind::Not
        )
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let start = self.current().span.start;
        let mut lhs = self.parse_prefix()?;
        let mut chained_compare = false;

        loop {
            if self.check(&TokenKind::LParen) || self.check(&TokenKind::Dot) || self.check(&TokenKind::LBracket) {
                lhs = self.parse_postfix(lhs)?;
                continue;
            }

            let Some((l_bp, r_bp)) = self.infix_bp() else { break };
            if l_bp < min_bp {
                break;
            }

            if let Some(op) = self.match_compare_op() {
                if chained_compare {
                    return Err(ParseError::at(lhs.span, "comparison chains are not supported")
                        .with_hint("combine the comparisons with 'and'"));
                }
                chained_compare = true;
                let rhs = self.parse_expr_bp(r_bp)?;
                let span = Span::new(start, rhs.span.end);
                lhs = Expr::new(
                    self.next_id(),
                    ExprKind::Compare { op, left: Box::new(lhs), right: Box::new(rhs) },
                    span,
                );
                continue;
            }

            let kind = self.current_kind().clone();
            self.advance();
            let rhs = self.parse_expr_bp(r_bp)?;
            let span = Span::new(start, rhs.span.end);
            let (left, right) = (Box::new(lhs), Box::new(rhs));
            let kind = match kind {
                TokenKind::Or => ExprKind::Logical { op: LogicalOp::Or, left, right },
                TokenKind::And => ExprKind::Logical { op: LogicalOp::And, left, right },
                other => {
                    let op = binop_for(&other).ok_or_else(|| {
                        ParseError::at(span, format!("unexpected {}", other.display_name()))
                    })?;
                    ExprKind::Binary { op, left, right }
                }
            };
            lhs = Expr::new(self.next_id(), kind, span);
            chained_compare = false;
        }

        Ok(lhs)
    }

    /// Binding powers of the infix operator at the cursor.
    fn infix_bp(&self) -> Option<(u8, u8)> {
        Some(match self.current_kind() {
            TokenKind::Or => (1, 2),
            TokenKind::And => (3, 4),
            TokenKind::EqEq
            | TokenKind::BangEq
            | TokenKind::Lt
            | TokenKind::Gt
            | TokenKind::LtEq
            | TokenKind::GtEq
            | TokenKind::In
            | TokenKind::Is => (CMP_BP, CMP_BP + 1),
            TokenKind::Not if matches!(self.peek(1), TokenKind::In) => (CMP_BP, CMP_BP + 1),
            TokenKind::Pipe => (9, 10),
            TokenKind::Caret => (11, 12),
            TokenKind::Amp => (13, 14),
            TokenKind::LtLt | TokenKind::GtGt => (15, 16),
            TokenKind::Plus | TokenKind::Minus => (17, 18),
            TokenKind::Star | TokenKind::Slash | TokenKind::SlashSlash | TokenKind::Percent => (19, 20),
            // right associative, binds tighter than unary minus on its left
            TokenKind::StarStar => (23, 22),
            _ => return None,
        })
    }

    fn match_compare_op(&mut self) -> Option<CmpOp> {
        let op = match self.current_kind() {
            TokenKind::EqEq => CmpOp::Eq,
            TokenKind::BangEq => CmpOp::Ne,
            TokenKind::Lt => CmpOp::Lt,
            TokenKind::Gt => CmpOp::Gt,
            TokenKind::LtEq => CmpOp::Le,
            TokenKind::GtEq => CmpOp::Ge,
            TokenKind::In => CmpOp::In,
            TokenKind::Not => {
                self.advance();
                CmpOp::NotIn
            }
            TokenKind::Is => {
                if matches!(self.peek(1), TokenKind::Not) {
                    self.advance();
                    CmpOp::IsNot
                } else {
                    CmpOp::Is
                }
            }
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        let start = self.current().span.start;
        let kind = match self.current_kind().clone() {
            TokenKind::Int(n) => {
                self.advance();
                ExprKind::Int(n)
            }
            TokenKind::Float(f) => {
                self.advance();
                ExprKind::Float(f)
            }
            TokenKind::String(s) => {
                self.advance();
                // adjacent literals concatenate
                let mut text = s;
                while let TokenKind::String(more) = self.current_kind().clone() {
                    self.advance();
                    text.push_str(&more);
                }
                ExprKind::String(text)
            }
            TokenKind::True => {
                self.advance();
                ExprKind::Bool(true)
            }
            TokenKind::False => {
                self.advance();
                ExprKind::Bool(false)
            }
            TokenKind::None => {
                self.advance();
                ExprKind::None
            }
            TokenKind::Ident(name) => {
                self.advance();
                ExprKind::Name(name)
            }
            TokenKind::LParen => return self.parse_paren_or_tuple(),
            TokenKind::LBracket => {
                self.advance();
                let items = self.parse_comma_list(&TokenKind::RBracket)?;
                self.expect(&TokenKind::RBracket)?;
                ExprKind::List(items)
            }
            TokenKind::LBrace => {
                self.advance();
                let entries = self.parse_dict_entries()?;
                self.expect(&TokenKind::RBrace)?;
                ExprKind::Dict(entries)
            }
            TokenKind::Minus | TokenKind::Plus | TokenKind::Tilde | TokenKind::Not => {
                let (op, bp) = match self.current_kind() {
                    TokenKind::Minus => (UnaryOp::Neg, UNARY_BP),
                    TokenKind::Plus => (UnaryOp::Pos, UNARY_BP),
                    TokenKind::Tilde => (UnaryOp::BitNot, UNARY_BP),
                    _ => (UnaryOp::Not, NOT_BP),
                };
                self.advance();
                let operand = self.parse_expr_bp(bp)?;
                ExprKind::Unary { op, operand: Box::new(operand) }
            }
            TokenKind::Reserved(word) => return Err(ParseError::reserved(&word, self.current().span)),
            _ => {
                return Err(ParseError::expected("expression", self.current_kind(), self.current().span));
            }
        };
        Ok(Expr::new(self.next_id(), kind, Span::new(start, self.prev_end())))
    }

    fn parse_paren_or_tuple(&mut self) -> Result<Expr, ParseError> {
        let start = self.current().span.start;
        self.expect(&TokenKind::LParen)?;

        if self.match_token(&TokenKind::RParen) {
            return Ok(Expr::new(self.next_id(), ExprKind::Tuple(Vec::new()), Span::new(start, self.prev_end())));
        }

        let first = self.parse_expr()?;

        if self.match_token(&TokenKind::Comma) {
            let mut items = vec![first];
            items.extend(self.parse_comma_list(&TokenKind::RParen)?);
            self.expect(&TokenKind::RParen)?;
            Ok(Expr::new(self.next_id(), ExprKind::Tuple(items), Span::new(start, self.prev_end())))
        } else {
            self.expect(&TokenKind::RParen)?;
            Ok(first)
        }
    }

    /// Comma-separated expressions up to (not including) `close`; a trailing
    /// comma is allowed.
    fn parse_comma_list(&mut self, close: &TokenKind) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        while !self.check(close) && !self.at_end() {
            items.push(self.parse_expr()?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        Ok(items)
    }

    fn parse_dict_entries(&mut self) -> Result<Vec<(Expr, Expr)>, ParseError> {
        let mut entries = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            let key = self.parse_expr()?;
            self.expect(&TokenKind::Colon)?;
            let value = self.parse_expr()?;
            entries.push((key, value));
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        Ok(entries)
    }

    fn parse_postfix(&mut self, lhs: Expr) -> Result<Expr, ParseError> {
        let start = lhs.span.start;

        let kind = match self.current_kind() {
            TokenKind::LParen => {
                self.advance();
                let args = self.parse_args()?;
                self.expect(&TokenKind::RParen)?;
                ExprKind::Call { func: Box::new(lhs), args }
            }
            TokenKind::Dot => {
                self.advance();
                let name = self.expect_ident()?;
                ExprKind::Attribute { object: Box::new(lhs), name }
            }
            TokenKind::LBracket => {
                self.advance();
                let index = self.parse_exprlist()?;
                self.expect(&TokenKind::RBracket)?;
                ExprKind::Subscript { object: Box::new(lhs), index: Box::new(index) }
            }
            _ => return Ok(lhs),
        };
        Ok(Expr::new(self.next_id(), kind, Span::new(start, self.prev_end())))
    }

    fn parse_args(&mut self) -> Result<Vec<Arg>, ParseError> {
        let mut args = Vec::new();
        let mut seen_keyword = false;

        while !self.check(&TokenKind::RParen) && !self.at_end() {
            let span = self.current().span;
            let arg = if self.match_token(&TokenKind::StarStar) {
                seen_keyword = true;
                Arg::StarStar(self.parse_expr()?)
            } else if self.match_token(&TokenKind::Star) {
                Arg::Star(self.parse_expr()?)
            } else if matches!(self.current_kind(), TokenKind::Ident(_)) && matches!(self.peek(1), TokenKind::Eq) {
                let name = self.expect_ident()?;
                self.advance(); // `=`
                seen_keyword = true;
                Arg::Keyword(name, self.parse_expr()?)
            } else {
                if seen_keyword {
                    return Err(ParseError::at(span, "positional argument follows keyword argument"));
                }
                Arg::Positional(self.parse_expr()?)
            };
            args.push(arg);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        Ok(args)
    }
}

fn binop_for(kind: &TokenKind) -> Option<BinOp> {
    Some(match kind {
        TokenKind::Plus => BinOp::Add,
        TokenKind::Minus => BinOp::Sub,
        TokenKind::Star => BinOp::Mul,
        TokenKind::Slash => BinOp::Div,
        TokenKind::SlashSlash => BinOp::FloorDiv,
        TokenKind::Percent => BinOp::Mod,
        TokenKind::StarStar => BinOp::Pow,
        TokenKind::Amp => BinOp::BitAnd,
        TokenKind::Pipe => BinOp::BitOr,
        TokenKind::Caret => BinOp::BitXor,
        TokenKind::LtLt => BinOp::Shl,
        TokenKind::GtGt => BinOp::Shr,
        _ => return None,
    })
}

/// Assignable shapes: names, attributes, subscripts, and tuples/lists of
/// those.
fn check_target(target: &Expr) -> Result<(), ParseError> {
    match &target.kind {
        ExprKind::Name(_) | ExprKind::Attribute { .. } | ExprKind::Subscript { .. } => Ok(()),
        ExprKind::Tuple(items) | ExprKind::List(items) if !items.is_empty() => {
            items.iter().try_for_each(check_target)
        }
        other => Err(ParseError::at(
            target.span,
            format!("cannot assign to {}", describe(other)),
        )),
    }
}

fn describe(kind: &ExprKind) -> &'static str {
    match kind {
        ExprKind::Int(_) | ExprKind::Float(_) | ExprKind::String(_) | ExprKind::Bool(_) | ExprKind::None => {
            "literal"
        }
        ExprKind::Call { .. } => "function call",
        ExprKind::Tuple(_) => "empty tuple",
        ExprKind::List(_) => "empty list",
        ExprKind::Compare { .. } => "comparison",
        _ => "expression",
    }
}

/// Result of parsing: statements plus any errors found.
#[derive(Debug)]
pub struct ParseResult {
    pub body: Vec<Stmt>,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A parse error with location and friendly message.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub span: Span,
    pub message: String,
    pub hint: Option<String>,
}

impl ParseError {
    fn expected(expected: &str, found: &TokenKind, span: Span) -> Self {
        let message = format_expected_message(expected, found);
        let hint = crate::hints::for_expected(expected, found).map(String::from);
        Self { span, message, hint }
    }

    fn at(span: Span, message: impl Into<String>) -> Self {
        Self { span, message: message.into(), hint: None }
    }

    fn reserved(word: &str, span: Span) -> Self {
        Self {
            span,
            message: format!("'{}' is a reserved word", word),
            hint: Some("reserved words can't be used as names or statements here".to_string()),
        }
    }

    fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Format a user-friendly "expected X, found Y" message.
fn format_expected_message(expected: &str, found: &TokenKind) -> String {
    match (expected, found) {
        ("')'", TokenKind::Eof) => "unclosed '(' - missing ')'".to_string(),
        ("']'", TokenKind::Eof) => "unclosed '[' - missing ']'".to_string(),
        ("end of line", _) => format!("expected end of line after statement, found {}", found.display_name()),
        ("a name", _) => format!("expected name, found {}", found.display_name()),
        _ => format!("expected {}, found {}", expected, found.display_name()),
    }
}
