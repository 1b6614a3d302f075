//! Recursive descent parser driving the semantic actions
//!
//! The parser owns no AST of its own. Every construct is handed to [`Sema`]
//! as soon as it is recognized, in the bracketing order the actions expect,
//! and the first error aborts the unit.

use crate::ast::{AstContext, BinaryOp, CompoundStmt, DeclId, Expr, Qualifiers, Stmt, Type};
use crate::common::{SemaError, SemaResult};
use crate::sema::{AnalysisState, LookupKind, QualifiedName, Sema};
use crate::token::Token;

static END: Token = Token::Eoi;

/// Parser over a complete token stream of one compilation unit
pub struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    sema: Sema,
}

impl<'t> Parser<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            sema: Sema::new(),
        }
    }

    /// Parse and analyse the whole unit
    pub fn parse(mut self) -> SemaResult<AstContext> {
        let state = self.sema.initial_state();
        while !self.at_end() {
            self.parse_item(state)?;
        }
        Ok(self.sema.finish())
    }

    // =========================================================================
    // Helper methods
    // =========================================================================

    fn current(&self) -> &'t Token {
        self.tokens.get(self.pos).unwrap_or(&END)
    }

    fn at_end(&self) -> bool {
        matches!(self.current(), Token::Eoi)
    }

    fn advance(&mut self) -> &'t Token {
        let token = self.current();
        if !self.at_end() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, token: &Token) -> bool {
        self.current() == token
    }

    fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> SemaResult<()> {
        if self.match_token(token) {
            Ok(())
        } else {
            Err(self.unexpected(&token.to_string()))
        }
    }

    fn expect_identifier(&mut self) -> SemaResult<&'t str> {
        match self.current() {
            Token::Identifier(name) => {
                self.advance();
                Ok(name.as_str())
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn unexpected(&self, expected: &str) -> SemaError {
        SemaError::syntax(format!("expected {}, found {}", expected, self.current()))
    }

    // =========================================================================
    // Items
    // =========================================================================

    fn parse_item(&mut self, state: AnalysisState) -> SemaResult<()> {
        match self.current() {
            Token::Class => self.parse_class(state),
            Token::Enum => self.parse_enum(state),
            Token::Func => self.parse_func(state),
            Token::Let => {
                let var = self.parse_var(state)?;
                self.sema.act_on_decl_in_context(state, var)
            }
            _ => Err(self.unexpected("'class', 'enum', 'func' or 'let'")),
        }
    }

    fn parse_class(&mut self, state: AnalysisState) -> SemaResult<()> {
        self.expect(&Token::Class)?;
        let name = self.expect_identifier()?;
        let class = self.sema.act_on_class(state, name)?;
        self.sema.act_on_decl_in_scope(state, class);
        self.sema.act_on_decl_in_context(state, class)?;

        self.expect(&Token::LBrace)?;
        let inner = self.sema.act_on_tag_start_definition(state, class)?;
        while !self.check(&Token::RBrace) {
            match self.current() {
                Token::Let => self.parse_field(inner)?,
                Token::Func => self.parse_func(inner)?,
                _ => return Err(self.unexpected("'let', 'func' or '}'")),
            }
        }
        self.expect(&Token::RBrace)?;
        self.sema.act_on_tag_finish_definition(inner)?;
        self.match_token(&Token::Semi);
        Ok(())
    }

    fn parse_field(&mut self, state: AnalysisState) -> SemaResult<()> {
        self.expect(&Token::Let)?;
        let ty = self.parse_type(state)?;
        let name = self.expect_identifier()?;
        let field = self.sema.act_on_field_decl(state, name, ty)?;
        self.expect(&Token::Semi)?;
        self.sema.act_on_decl_in_scope(state, field);
        self.sema.act_on_decl_in_context(state, field)
    }

    fn parse_enum(&mut self, state: AnalysisState) -> SemaResult<()> {
        self.expect(&Token::Enum)?;
        let name = self.expect_identifier()?;
        let decl = self.sema.act_on_enum(state, name)?;
        self.sema.act_on_decl_in_scope(state, decl);
        self.sema.act_on_decl_in_context(state, decl)?;

        self.expect(&Token::LBrace)?;
        let inner = self.sema.act_on_tag_start_definition(state, decl)?;
        while !self.check(&Token::RBrace) {
            let name = self.expect_identifier()?;
            let value = if self.match_token(&Token::Eq) {
                match self.advance() {
                    Token::IntLiteral(value) => Some(*value),
                    _ => return Err(SemaError::syntax("enumerator value must be an integer literal")),
                }
            } else {
                None
            };
            let enumerator = self.sema.act_on_enumerator(inner, name, value)?;
            self.sema.act_on_decl_in_scope(inner, enumerator);
            self.sema.act_on_decl_in_context(inner, enumerator)?;

            if !self.match_token(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RBrace)?;
        self.sema.act_on_tag_finish_definition(inner)?;
        self.match_token(&Token::Semi);
        Ok(())
    }

    fn parse_func(&mut self, state: AnalysisState) -> SemaResult<()> {
        self.expect(&Token::Func)?;
        let name = self.expect_identifier()?;

        // The return type follows the parameter list but the declaration
        // needs it up front; read it first, then come back for the params.
        let params_start = self.pos;
        self.skip_parenthesized()?;
        let return_type = if self.match_token(&Token::Arrow) {
            self.parse_type(state)?
        } else {
            Type::void()
        };
        let signature_end = self.pos;
        self.pos = params_start;

        let func = self.sema.act_on_func_decl(state, name, return_type)?;
        self.expect(&Token::LParen)?;
        let params = self.sema.act_on_start_param_list(state);
        if !self.check(&Token::RParen) {
            loop {
                let ty = self.parse_type(params)?;
                let param_name = self.expect_identifier()?;
                let param = self.sema.act_on_param(params, func, param_name, ty)?;
                self.sema.act_on_decl_in_scope(params, param);
                if !self.match_token(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::RParen)?;
        let state = self.sema.act_on_finish_param_list(params, func)?;
        self.pos = signature_end;

        // Visible before the body so that it can call itself
        self.sema.act_on_decl_in_scope(state, func);
        self.sema.act_on_decl_in_context(state, func)?;

        if self.match_token(&Token::Semi) {
            return Ok(());
        }
        self.expect(&Token::LBrace)?;
        let body_state = self.sema.act_on_start_func_def(state, func)?;
        let body = self.parse_block_items(body_state)?;
        self.sema.act_on_finish_func_def(body_state, body)?;
        Ok(())
    }

    fn skip_parenthesized(&mut self) -> SemaResult<()> {
        self.expect(&Token::LParen)?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.advance() {
                Token::LParen => depth += 1,
                Token::RParen => depth -= 1,
                Token::Eoi => return Err(SemaError::syntax("unterminated parameter list")),
                _ => {}
            }
        }
        Ok(())
    }

    /// `let type name (= expr)? ;`, made visible after its initializer
    fn parse_var(&mut self, state: AnalysisState) -> SemaResult<DeclId> {
        self.expect(&Token::Let)?;
        let ty = self.parse_type(state)?;
        let name = self.expect_identifier()?;
        let var = self.sema.act_on_var_decl(state, name, ty)?;
        if self.match_token(&Token::Eq) {
            let init = self.parse_expr(state)?;
            self.sema.act_on_initialization(var, init)?;
        }
        self.expect(&Token::Semi)?;
        self.sema.act_on_decl_in_scope(state, var);
        Ok(var)
    }

    // =========================================================================
    // Types
    // =========================================================================

    fn parse_type(&mut self, state: AnalysisState) -> SemaResult<Type> {
        let mut qualifiers = Qualifiers::new();
        loop {
            match self.current() {
                Token::Const => qualifiers = qualifiers.with_const(),
                Token::Volatile => qualifiers = qualifiers.with_volatile(),
                _ => break,
            }
            self.advance();
        }

        let base = match self.current() {
            Token::Vi8 => Type::int8(),
            Token::Vi16 => Type::int16(),
            Token::Vi32 => Type::int32(),
            Token::Vi64 => Type::int64(),
            Token::Vr32 => Type::float(),
            Token::Vr64 => Type::double(),
            Token::Bool => Type::bool(),
            Token::Void => Type::void(),
            Token::Identifier(_) => {
                let name = self.parse_qualified_name()?;
                let found = self.sema.lookup_qualified(state, &name, LookupKind::AstContext)?;
                return match found.as_slice() {
                    [tag] => {
                        let ty = self
                            .sema
                            .ast()
                            .tag_type(*tag)
                            .ok_or_else(|| SemaError::protocol("tag lookup returned a non-tag"))?;
                        Ok(self.parse_type_suffix(ty.with_qualifiers(qualifiers)))
                    }
                    [] => Err(SemaError::undeclared(name.to_string())),
                    _ => Err(SemaError::AmbiguousName { name: name.to_string() }),
                };
            }
            _ => return Err(self.unexpected("type")),
        };
        self.advance();
        Ok(self.parse_type_suffix(base.with_qualifiers(qualifiers)))
    }

    /// Trailing qualifiers, `*` and `&`, applied left to right
    fn parse_type_suffix(&mut self, mut ty: Type) -> Type {
        loop {
            ty = match self.current() {
                Token::Const => ty.with_const(),
                Token::Volatile => ty.with_volatile(),
                Token::Star => Type::pointer_to(ty),
                Token::Amp => Type::reference_to(ty),
                _ => return ty,
            };
            self.advance();
        }
    }

    fn parse_qualified_name(&mut self) -> SemaResult<QualifiedName> {
        let mut segments = vec![self.expect_identifier()?.to_string()];
        while self.match_token(&Token::ColonColon) {
            segments.push(self.expect_identifier()?.to_string());
        }
        Ok(QualifiedName::new(segments))
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Statements up to and including the closing brace, in the current scope
    fn parse_block_items(&mut self, state: AnalysisState) -> SemaResult<CompoundStmt> {
        let mut stmts = Vec::new();
        while !self.check(&Token::RBrace) {
            if self.at_end() {
                return Err(self.unexpected("'}'"));
            }
            stmts.push(self.parse_stmt(state)?);
        }
        self.expect(&Token::RBrace)?;
        Ok(Sema::act_on_compound_stmt(stmts))
    }

    fn parse_stmt(&mut self, state: AnalysisState) -> SemaResult<Stmt> {
        match self.current() {
            Token::LBrace => {
                self.advance();
                let inner = self.sema.act_on_compound_stmt_begin(state);
                let block = self.parse_block_items(inner)?;
                self.sema.act_on_compound_stmt_end(inner)?;
                Ok(Stmt::Compound(block))
            }
            Token::Let => {
                let var = self.parse_var(state)?;
                Ok(Sema::act_on_decl_stmt(var))
            }
            Token::Return => {
                self.advance();
                let value = if self.check(&Token::Semi) {
                    None
                } else {
                    Some(self.parse_expr(state)?)
                };
                self.expect(&Token::Semi)?;
                self.sema.act_on_return_stmt(state, value)
            }
            _ => {
                let expr = self.parse_expr(state)?;
                self.expect(&Token::Semi)?;
                Ok(Sema::act_on_expr_stmt(expr))
            }
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn parse_expr(&mut self, state: AnalysisState) -> SemaResult<Expr> {
        self.parse_binary(state, 1)
    }

    /// Precedence climbing over [`Token::binary_precedence`]
    fn parse_binary(&mut self, state: AnalysisState, min_prec: u8) -> SemaResult<Expr> {
        let mut lhs = self.parse_primary(state)?;

        while let Some(prec) = self.current().binary_precedence() {
            if prec < min_prec {
                break;
            }
            let token = self.advance();
            let op = binary_op(token).ok_or_else(|| self.unexpected("binary operator"))?;
            let next_min = if token.is_right_associative() { prec } else { prec + 1 };
            let rhs = self.parse_binary(state, next_min)?;
            lhs = Sema::act_on_binary_expr(lhs, op, rhs)?;
        }

        Ok(lhs)
    }

    fn parse_primary(&mut self, state: AnalysisState) -> SemaResult<Expr> {
        match self.current() {
            Token::IntLiteral(value) => {
                self.advance();
                Ok(Sema::act_on_int_literal(*value))
            }
            Token::FloatLiteral(value) => {
                self.advance();
                Ok(Sema::act_on_float_literal(*value))
            }
            Token::True | Token::False => {
                let value = matches!(self.advance(), Token::True);
                Ok(Sema::act_on_bool_literal(value))
            }
            Token::LParen => {
                self.advance();
                let expr = self.parse_expr(state)?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            Token::Identifier(_) => {
                let name = self.parse_qualified_name()?;
                if self.match_token(&Token::LParen) {
                    let args = self.parse_arguments(state)?;
                    self.sema.act_on_func_call(state, &name, args)
                } else {
                    self.sema.act_on_id_expression(state, &name)
                }
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /// Arguments after the opening parenthesis, through the closing one
    fn parse_arguments(&mut self, state: AnalysisState) -> SemaResult<Vec<Expr>> {
        let mut args = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                args.push(self.parse_expr(state)?);
                if !self.match_token(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::RParen)?;
        Ok(args)
    }
}

fn binary_op(token: &Token) -> Option<BinaryOp> {
    let op = match token {
        Token::Eq => BinaryOp::Assign,
        Token::PipePipe => BinaryOp::LogicOr,
        Token::AmpAmp => BinaryOp::LogicAnd,
        Token::EqEq => BinaryOp::Eq,
        Token::NotEq => BinaryOp::Ne,
        Token::Lt => BinaryOp::Lt,
        Token::Gt => BinaryOp::Gt,
        Token::LtEq => BinaryOp::Le,
        Token::GtEq => BinaryOp::Ge,
        Token::Plus => BinaryOp::Add,
        Token::Minus => BinaryOp::Sub,
        Token::Star => BinaryOp::Mul,
        Token::Slash => BinaryOp::Div,
        _ => return None,
    };
    Some(op)
}
