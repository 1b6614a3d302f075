//! Semantic actions
//!
//! The driving parser calls these in a fixed bracketing protocol. Each
//! action either returns a fully typed node or a fatal [`SemaError`];
//! nothing is rolled back once built.

use super::scope::{LookupKind, QualifiedName, ScopeTree};
use super::types::{
    common_builtin_type, implicit_cast_rule, require_implicit_cast, require_reference_binding,
};
use crate::ast::{
    AstContext, BinaryOp, BuiltinKind, CastKind, CompoundStmt, Decl, DeclContext, DeclId,
    DeclKind, DeclTag, EnumeratorDecl, Expr, ExprKind, FieldDecl, FuncDecl, ScopeId, Stmt, Type,
    TypeKind, ValueCategory, VarDecl,
};
use crate::common::{SemaError, SemaResult};
use tracing::debug;

/// Where analysis currently stands.
///
/// Every bracketing action takes the outer state and hands back the inner
/// one (or the reverse), so start and finish actions pair up structurally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisState {
    /// Innermost lexical scope
    pub scope: ScopeId,
    /// Declaration context that owns new declarations
    pub context: DeclId,
    /// Function whose body is being analysed
    pub function: Option<DeclId>,
}

/// Semantic analyser for one compilation unit
#[derive(Debug, Default)]
pub struct Sema {
    pub(super) ast: AstContext,
    pub(super) scopes: ScopeTree,
}

impl Sema {
    pub fn new() -> Self {
        Self {
            ast: AstContext::new(),
            scopes: ScopeTree::new(),
        }
    }

    /// State at the top of the translation unit
    pub fn initial_state(&self) -> AnalysisState {
        AnalysisState {
            scope: self.scopes.root(),
            context: self.ast.translation_unit(),
            function: None,
        }
    }

    pub fn ast(&self) -> &AstContext {
        &self.ast
    }

    pub fn scopes(&self) -> &ScopeTree {
        &self.scopes
    }

    /// Hand the finished declaration tree to the caller
    pub fn finish(self) -> AstContext {
        self.ast
    }

    pub fn lookup(&self, state: AnalysisState, name: &str, kind: LookupKind) -> Vec<DeclId> {
        self.scopes.lookup(&self.ast, state.scope, name, kind)
    }

    pub fn lookup_qualified(
        &self,
        state: AnalysisState,
        name: &QualifiedName,
        kind: LookupKind,
    ) -> SemaResult<Vec<DeclId>> {
        self.scopes.lookup_qualified(&self.ast, state.scope, name, kind)
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    /// Reject `name` if the current scope already declares it. Functions may
    /// share a name with other functions.
    fn check_redefinition(&self, state: AnalysisState, name: &str, overloadable: bool) -> SemaResult<()> {
        let clash = self
            .scopes
            .lookup_local(&self.ast, state.scope, name, LookupKind::Everything)
            .into_iter()
            .any(|id| !(overloadable && self.ast.decl(id).tag() == DeclTag::Func));
        if clash {
            return Err(SemaError::redefinition(name));
        }
        Ok(())
    }

    fn check_object_type(name: &str, ty: &Type) -> SemaResult<()> {
        if ty.is_void() {
            return Err(SemaError::VoidObject { name: name.to_string() });
        }
        Ok(())
    }

    fn expect_context(&self, state: AnalysisState, tag: DeclTag, what: &str) -> SemaResult<()> {
        if self.ast.decl(state.context).tag() != tag {
            return Err(SemaError::protocol(format!(
                "{} declared outside of a {:?} context",
                what, tag
            )));
        }
        Ok(())
    }

    fn declare(&mut self, state: AnalysisState, name: &str, kind: DeclKind) -> DeclId {
        let symbol = self.ast.intern(name);
        self.ast.alloc(Decl::new(Some(symbol), Some(state.context), kind))
    }

    pub(super) fn func_decl(&self, id: DeclId) -> SemaResult<&FuncDecl> {
        self.ast
            .decl(id)
            .as_func()
            .ok_or_else(|| SemaError::protocol(format!("`{}` is not a function", self.ast.display_name(id))))
    }

    fn func_decl_mut(&mut self, id: DeclId) -> SemaResult<&mut FuncDecl> {
        let name = self.ast.display_name(id);
        match &mut self.ast.decl_mut(id).kind {
            DeclKind::Func(func) => Ok(func),
            _ => Err(SemaError::protocol(format!("`{}` is not a function", name))),
        }
    }

    /// Declared type of a variable or parameter
    pub(super) fn var_type(&self, id: DeclId) -> SemaResult<&Type> {
        self.ast
            .decl(id)
            .as_var()
            .map(|var| &var.ty)
            .ok_or_else(|| SemaError::protocol(format!("`{}` is not a variable", self.ast.display_name(id))))
    }

    pub fn act_on_var_decl(&mut self, state: AnalysisState, name: &str, ty: Type) -> SemaResult<DeclId> {
        self.check_redefinition(state, name, false)?;
        Self::check_object_type(name, &ty)?;
        debug!(decl = name, %ty, scope = ?state.scope, "declare variable");
        Ok(self.declare(state, name, DeclKind::Var(VarDecl::new(ty))))
    }

    pub fn act_on_field_decl(&mut self, state: AnalysisState, name: &str, ty: Type) -> SemaResult<DeclId> {
        self.expect_context(state, DeclTag::Class, "field")?;
        self.check_redefinition(state, name, false)?;
        Self::check_object_type(name, &ty)?;
        debug!(decl = name, %ty, "declare field");
        Ok(self.declare(state, name, DeclKind::Field(FieldDecl { ty })))
    }

    pub fn act_on_class(&mut self, state: AnalysisState, name: &str) -> SemaResult<DeclId> {
        self.check_redefinition(state, name, false)?;
        debug!(decl = name, "declare class");
        Ok(self.declare(state, name, DeclKind::Class(DeclContext::default())))
    }

    pub fn act_on_enum(&mut self, state: AnalysisState, name: &str) -> SemaResult<DeclId> {
        self.check_redefinition(state, name, false)?;
        debug!(decl = name, "declare enum");
        Ok(self.declare(state, name, DeclKind::Enum(DeclContext::default())))
    }

    /// Declare an enumerator of the enum `state.context`.
    ///
    /// Without an explicit value it follows the last enumerator already
    /// inserted into the enum, starting at 0.
    pub fn act_on_enumerator(
        &mut self,
        state: AnalysisState,
        name: &str,
        value: Option<i64>,
    ) -> SemaResult<DeclId> {
        self.expect_context(state, DeclTag::Enum, "enumerator")?;
        self.check_redefinition(state, name, false)?;

        let previous = self.ast.context(state.context).and_then(|members| {
            members.decls.iter().rev().find_map(|id| match &self.ast.decl(*id).kind {
                DeclKind::Enumerator(e) => Some(e.value),
                _ => None,
            })
        });
        let value = match value {
            Some(value) => value,
            None => previous
                .map_or(Some(0), |prev| prev.checked_add(1))
                .ok_or_else(|| SemaError::unsupported(format!("enumerator `{}` past the vi64 range", name)))?,
        };

        debug!(decl = name, value, "declare enumerator");
        Ok(self.declare(state, name, DeclKind::Enumerator(EnumeratorDecl { value })))
    }

    pub fn act_on_func_decl(&mut self, state: AnalysisState, name: &str, return_type: Type) -> SemaResult<DeclId> {
        self.check_redefinition(state, name, true)?;
        debug!(decl = name, %return_type, "declare function");
        Ok(self.declare(state, name, DeclKind::Func(FuncDecl::new(return_type))))
    }

    /// Declare a parameter of `func` and append it to the parameter list
    pub fn act_on_param(
        &mut self,
        state: AnalysisState,
        func: DeclId,
        name: &str,
        ty: Type,
    ) -> SemaResult<DeclId> {
        self.check_redefinition(state, name, false)?;
        Self::check_object_type(name, &ty)?;
        let param = self.declare(state, name, DeclKind::Var(VarDecl::new(ty)));
        self.func_decl_mut(func)?.params.push(param);
        Ok(param)
    }

    // ------------------------------------------------------------------
    // Insertion
    // ------------------------------------------------------------------

    /// Make `decl` visible in the current scope
    pub fn act_on_decl_in_scope(&mut self, state: AnalysisState, decl: DeclId) {
        self.scopes.add_decl(state.scope, decl);
    }

    /// Append `decl` to the current declaration context
    pub fn act_on_decl_in_context(&mut self, state: AnalysisState, decl: DeclId) -> SemaResult<()> {
        self.ast.add_to_context(state.context, decl)
    }

    // ------------------------------------------------------------------
    // Bracketing
    // ------------------------------------------------------------------

    /// Enter the body of a class or enum
    pub fn act_on_tag_start_definition(&mut self, state: AnalysisState, tag: DeclId) -> SemaResult<AnalysisState> {
        if !matches!(self.ast.decl(tag).tag(), DeclTag::Class | DeclTag::Enum) {
            return Err(SemaError::protocol(format!(
                "`{}` is not a class or enum",
                self.ast.display_name(tag)
            )));
        }
        let scope = self.scopes.push_scope(state.scope);
        debug!(tag = %self.ast.display_name(tag), ?scope, "enter tag definition");
        Ok(AnalysisState {
            scope,
            context: tag,
            function: state.function,
        })
    }

    pub fn act_on_tag_finish_definition(&mut self, state: AnalysisState) -> SemaResult<AnalysisState> {
        let context = self
            .ast
            .decl(state.context)
            .parent
            .ok_or_else(|| SemaError::protocol("no tag definition to finish"))?;
        let scope = self.scopes.pop_scope(state.scope)?;
        Ok(AnalysisState { scope, context, ..state })
    }

    /// Open the scope that holds the parameters while they are declared
    pub fn act_on_start_param_list(&mut self, state: AnalysisState) -> AnalysisState {
        AnalysisState {
            scope: self.scopes.push_scope(state.scope),
            ..state
        }
    }

    /// Close the parameter scope and check `func` against the functions of
    /// the same name in the enclosing scope.
    ///
    /// A function with the parameter types of an earlier one redeclares it
    /// and must agree on the return type; whether both have a body is only
    /// known once a definition starts.
    pub fn act_on_finish_param_list(&mut self, state: AnalysisState, func: DeclId) -> SemaResult<AnalysisState> {
        let outer = self.scopes.pop_scope(state.scope)?;
        let name = self.ast.display_name(func);

        let mut previous = None;
        for other in self.scopes.lookup_local(&self.ast, outer, &name, LookupKind::Func) {
            if other == func || self.param_types(other)? != self.param_types(func)? {
                continue;
            }
            let expected = &self.func_decl(other)?.return_type;
            let found = &self.func_decl(func)?.return_type;
            if expected != found {
                return Err(SemaError::ConflictingDeclaration {
                    name,
                    previous: expected.to_string(),
                    found: found.to_string(),
                });
            }
            previous = Some(other);
        }

        if previous.is_some() {
            debug!(function = %name, ?previous, "redeclare function");
            self.func_decl_mut(func)?.previous = previous;
        }
        Ok(AnalysisState { scope: outer, ..state })
    }

    /// First declaration of `func`, following its redeclarations back
    pub fn first_declaration(&self, func: DeclId) -> SemaResult<DeclId> {
        let mut current = func;
        while let Some(previous) = self.func_decl(current)?.previous {
            current = previous;
        }
        Ok(current)
    }

    fn param_types(&self, func: DeclId) -> SemaResult<Vec<&Type>> {
        self.func_decl(func)?
            .params
            .iter()
            .map(|param| self.var_type(*param))
            .collect()
    }

    pub fn act_on_compound_stmt_begin(&mut self, state: AnalysisState) -> AnalysisState {
        AnalysisState {
            scope: self.scopes.push_scope(state.scope),
            ..state
        }
    }

    pub fn act_on_compound_stmt_end(&mut self, state: AnalysisState) -> SemaResult<AnalysisState> {
        let scope = self.scopes.pop_scope(state.scope)?;
        Ok(AnalysisState { scope, ..state })
    }

    /// Enter the body of `func`, with its parameters visible
    ///
    /// Fails if `func` or one of its earlier declarations already has a body.
    pub fn act_on_start_func_def(&mut self, state: AnalysisState, func: DeclId) -> SemaResult<AnalysisState> {
        let mut current = Some(func);
        while let Some(decl) = current {
            let declared = self.func_decl(decl)?;
            if declared.is_definition() {
                return Err(SemaError::redefinition(self.ast.display_name(func)));
            }
            current = declared.previous;
        }

        let params = self.func_decl(func)?.params.clone();
        let scope = self.scopes.push_scope(state.scope);
        for param in params {
            self.scopes.add_decl(scope, param);
        }
        debug!(function = %self.ast.display_name(func), ?scope, "enter function body");
        Ok(AnalysisState {
            scope,
            context: state.context,
            function: Some(func),
        })
    }

    /// Attach `body` to the function being defined and leave it. Functions
    /// do not nest, so the outer state has no current function.
    pub fn act_on_finish_func_def(&mut self, state: AnalysisState, body: CompoundStmt) -> SemaResult<AnalysisState> {
        let func = state
            .function
            .ok_or_else(|| SemaError::protocol("no function definition to finish"))?;
        self.func_decl_mut(func)?.body = Some(body);
        let scope = self.scopes.pop_scope(state.scope)?;
        Ok(AnalysisState {
            scope,
            context: state.context,
            function: None,
        })
    }

    // ------------------------------------------------------------------
    // Initialization
    // ------------------------------------------------------------------

    /// Check `init` against the declared type of `var` and store it
    pub fn act_on_initialization(&mut self, var: DeclId, init: Expr) -> SemaResult<()> {
        let target = self.var_type(var)?.clone();
        let init = match &target.kind {
            TypeKind::Reference(referenced) => Self::bind_reference(referenced, init)?,
            TypeKind::Builtin(_) if init.ty.dereferenced().is_builtin() => Self::init_builtin(&target, init)?,
            _ => {
                return Err(SemaError::unsupported(format!(
                    "initializing `{}` from `{}`",
                    target, init.ty
                )));
            }
        };

        if let DeclKind::Var(decl) = &mut self.ast.decl_mut(var).kind {
            decl.init = Some(init);
        }
        Ok(())
    }

    pub(super) fn bind_reference(referenced: &Type, init: Expr) -> SemaResult<Expr> {
        require_reference_binding(referenced, &init)?;
        Ok(init)
    }

    fn init_builtin(target: &Type, init: Expr) -> SemaResult<Expr> {
        let cast = implicit_cast_rule(&init.ty, target).map_err(|_| SemaError::CannotInitialize {
            target: target.to_string(),
            source_ty: init.ty.to_string(),
        })?;
        Ok(Self::act_on_lvalue_to_rvalue(Self::wrap_cast(init, cast, target)))
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    pub(super) fn wrap_cast(expr: Expr, cast: Option<CastKind>, to: &Type) -> Expr {
        match cast {
            None => expr,
            Some(cast) => Expr::rvalue(
                ExprKind::ImplicitCast {
                    cast,
                    operand: Box::new(expr),
                },
                to.clone(),
            ),
        }
    }

    /// Authoritatively convert `expr` to `to`, then load it
    pub(super) fn convert(expr: Expr, to: &Type) -> SemaResult<Expr> {
        let cast = require_implicit_cast(&expr.ty, to)?;
        Ok(Self::act_on_lvalue_to_rvalue(Self::wrap_cast(expr, cast, to)))
    }

    /// Identity for rvalues; lvalues are loaded through a decay node typed
    /// with the dereferenced type.
    pub fn act_on_lvalue_to_rvalue(expr: Expr) -> Expr {
        if expr.is_rvalue() {
            return expr;
        }
        let ty = expr.ty.dereferenced().clone();
        Expr::rvalue(ExprKind::LValueToRValue(Box::new(expr)), ty)
    }

    /// Integer literals take the narrowest integer type holding the value
    pub fn act_on_int_literal(value: i64) -> Expr {
        let kind = if i8::try_from(value).is_ok() {
            BuiltinKind::Int8
        } else if i16::try_from(value).is_ok() {
            BuiltinKind::Int16
        } else if i32::try_from(value).is_ok() {
            BuiltinKind::Int32
        } else {
            BuiltinKind::Int64
        };
        Expr::rvalue(ExprKind::IntLiteral(value), Type::builtin(kind))
    }

    pub fn act_on_float_literal(value: f64) -> Expr {
        Expr::rvalue(ExprKind::FloatLiteral(value), Type::float())
    }

    pub fn act_on_bool_literal(value: bool) -> Expr {
        Expr::rvalue(ExprKind::BoolLiteral(value), Type::bool())
    }

    /// Resolve an identifier used as a value
    pub fn act_on_id_expression(&self, state: AnalysisState, name: &QualifiedName) -> SemaResult<Expr> {
        let found = self.lookup_qualified(state, name, LookupKind::Everything)?;
        let decl = found
            .first()
            .copied()
            .ok_or_else(|| SemaError::undeclared(name.to_string()))?;
        self.act_on_decl_ref_expr(decl)
    }

    pub fn act_on_decl_ref_expr(&self, decl: DeclId) -> SemaResult<Expr> {
        let kind = ExprKind::DeclRef(decl);
        match &self.ast.decl(decl).kind {
            DeclKind::Var(VarDecl { ty, .. }) | DeclKind::Field(FieldDecl { ty }) => {
                Ok(Expr::new(kind, ty.clone(), ValueCategory::LValue))
            }
            DeclKind::Enumerator(_) => {
                let ty = self
                    .ast
                    .value_type(decl)
                    .ok_or_else(|| SemaError::protocol("enumerator outside of an enum"))?;
                Ok(Expr::rvalue(kind, ty))
            }
            _ => Err(SemaError::NotAValue {
                name: self.ast.display_name(decl),
            }),
        }
    }

    pub fn act_on_binary_expr(lhs: Expr, op: BinaryOp, rhs: Expr) -> SemaResult<Expr> {
        match op {
            BinaryOp::Assign => Self::act_on_assignment(lhs, rhs),
            _ if op.is_logical() => Self::act_on_logical_expr(lhs, op, rhs),
            _ => Self::act_on_algebra_expr(lhs, op, rhs),
        }
    }

    pub fn act_on_assignment(lhs: Expr, rhs: Expr) -> SemaResult<Expr> {
        if !lhs.is_lvalue() {
            return Err(SemaError::NotAnLvalue);
        }
        if lhs.ty.is_const() || lhs.ty.dereferenced().is_const() {
            return Err(SemaError::AssignToConst { ty: lhs.ty.to_string() });
        }

        let rhs = Self::convert(rhs, lhs.ty.dereferenced())?;
        let ty = lhs.ty.clone();
        Ok(Expr::rvalue(
            ExprKind::Binary {
                op: BinaryOp::Assign,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            ty,
        ))
    }

    pub fn act_on_logical_expr(lhs: Expr, op: BinaryOp, rhs: Expr) -> SemaResult<Expr> {
        for operand in [&lhs, &rhs] {
            if !operand.ty.dereferenced().is_bool() {
                return Err(SemaError::NonBoolLogicalOperand {
                    op: op.as_str(),
                    ty: operand.ty.to_string(),
                });
            }
        }

        Ok(Expr::rvalue(
            ExprKind::Binary {
                op,
                lhs: Box::new(Self::act_on_lvalue_to_rvalue(lhs)),
                rhs: Box::new(Self::act_on_lvalue_to_rvalue(rhs)),
            },
            Type::bool(),
        ))
    }

    /// Arithmetic, relational and equality operators
    pub fn act_on_algebra_expr(lhs: Expr, op: BinaryOp, rhs: Expr) -> SemaResult<Expr> {
        let common = common_builtin_type(&lhs.ty, &rhs.ty).ok_or_else(|| SemaError::NoCommonType {
            op: op.as_str(),
            lhs: lhs.ty.to_string(),
            rhs: rhs.ty.to_string(),
        })?;

        let lhs = Self::convert(lhs, &common)?;
        let rhs = Self::convert(rhs, &common)?;
        let ty = if op.is_comparison() { Type::bool() } else { common };
        Ok(Expr::rvalue(
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            ty,
        ))
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    pub fn act_on_decl_stmt(decl: DeclId) -> Stmt {
        Stmt::Decl(decl)
    }

    pub fn act_on_expr_stmt(expr: Expr) -> Stmt {
        Stmt::Expr(expr)
    }

    pub fn act_on_compound_stmt(stmts: Vec<Stmt>) -> CompoundStmt {
        CompoundStmt::new(stmts)
    }

    /// Check a return statement against the current function
    pub fn act_on_return_stmt(&self, state: AnalysisState, value: Option<Expr>) -> SemaResult<Stmt> {
        let function = state
            .function
            .ok_or_else(|| SemaError::protocol("return outside of a function"))?;
        let return_type = &self.func_decl(function)?.return_type;

        match value {
            Some(_) if return_type.is_void() => Err(SemaError::UnexpectedReturnValue {
                function: self.ast.display_name(function),
            }),
            None if !return_type.is_void() => Err(SemaError::MissingReturnValue {
                function: self.ast.display_name(function),
            }),
            None => Ok(Stmt::Return(None)),
            Some(value) => {
                let value = match &return_type.kind {
                    TypeKind::Reference(referenced) => Self::bind_reference(referenced, value)?,
                    _ => Self::convert(value, return_type)?,
                };
                Ok(Stmt::Return(Some(value)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::CastFailure;
    use pretty_assertions::assert_eq;

    fn local_var(sema: &mut Sema, state: AnalysisState, name: &str, ty: Type) -> DeclId {
        let decl = sema.act_on_var_decl(state, name, ty).unwrap();
        sema.act_on_decl_in_scope(state, decl);
        decl
    }

    fn id(sema: &Sema, state: AnalysisState, name: &str) -> Expr {
        sema.act_on_id_expression(state, &QualifiedName::simple(name)).unwrap()
    }

    fn int(value: i64) -> Expr {
        Sema::act_on_int_literal(value)
    }

    #[test]
    fn test_redefinition_is_per_scope() {
        let mut sema = Sema::new();
        let state = sema.initial_state();
        local_var(&mut sema, state, "x", Type::int32());

        assert_eq!(
            sema.act_on_var_decl(state, "x", Type::int8()).unwrap_err(),
            SemaError::redefinition("x")
        );

        let inner = sema.act_on_compound_stmt_begin(state);
        let shadow = local_var(&mut sema, inner, "x", Type::int8());
        assert_eq!(id(&sema, inner, "x").ty, Type::int8());
        assert_eq!(id(&sema, inner, "x").kind, ExprKind::DeclRef(shadow));

        let outer = sema.act_on_compound_stmt_end(inner).unwrap();
        assert_eq!(outer, state);
        assert_eq!(id(&sema, outer, "x").ty, Type::int32());
    }

    #[test]
    fn test_declarations_are_not_inserted_implicitly() {
        let mut sema = Sema::new();
        let state = sema.initial_state();
        let decl = sema.act_on_var_decl(state, "x", Type::int32()).unwrap();

        assert_eq!(sema.ast().decl(decl).parent, Some(state.context));
        assert!(sema.lookup(state, "x", LookupKind::Everything).is_empty());
        assert!(sema.ast().lookup_in_context(state.context, "x").is_empty());

        sema.act_on_decl_in_context(state, decl).unwrap();
        assert_eq!(sema.ast().lookup_in_context(state.context, "x"), vec![decl]);
    }

    #[test]
    fn test_void_objects_are_rejected() {
        let mut sema = Sema::new();
        let state = sema.initial_state();

        assert_eq!(
            sema.act_on_var_decl(state, "v", Type::void()).unwrap_err(),
            SemaError::VoidObject { name: "v".to_string() }
        );
        assert!(sema.act_on_var_decl(state, "p", Type::pointer_to(Type::void())).is_ok());
    }

    #[test]
    fn test_undeclared_and_non_value_names() {
        let mut sema = Sema::new();
        let state = sema.initial_state();
        let class = sema.act_on_class(state, "P").unwrap();
        sema.act_on_decl_in_scope(state, class);

        assert_eq!(
            sema.act_on_id_expression(state, &QualifiedName::simple("y")).unwrap_err(),
            SemaError::undeclared("y")
        );
        assert_eq!(
            sema.act_on_id_expression(state, &QualifiedName::simple("P")).unwrap_err(),
            SemaError::NotAValue { name: "P".to_string() }
        );
    }

    #[test]
    fn test_literal_types() {
        assert_eq!(int(1).ty, Type::int8());
        assert_eq!(int(-128).ty, Type::int8());
        assert_eq!(int(300).ty, Type::int16());
        assert_eq!(int(70_000).ty, Type::int32());
        assert_eq!(int(1 << 40).ty, Type::int64());
        assert_eq!(Sema::act_on_float_literal(1.5).ty, Type::float());
        assert_eq!(Sema::act_on_bool_literal(true).ty, Type::bool());
        assert!(int(1).is_rvalue());
    }

    #[test]
    fn test_builtin_initialization_widens_and_decays() {
        let mut sema = Sema::new();
        let state = sema.initial_state();
        let a = local_var(&mut sema, state, "a", Type::int32());
        sema.act_on_initialization(a, int(1)).unwrap();

        let init = sema.ast().decl(a).as_var().unwrap().init.clone().unwrap();
        assert_eq!(init.ty, Type::int32());
        assert!(matches!(
            init.kind,
            ExprKind::ImplicitCast { cast: CastKind::IntegralWiden, .. }
        ));

        let b = local_var(&mut sema, state, "b", Type::int64());
        let a_ref = id(&sema, state, "a");
        sema.act_on_initialization(b, a_ref).unwrap();
        let init = sema.ast().decl(b).as_var().unwrap().init.clone().unwrap();
        assert!(init.is_rvalue());
        assert_eq!(init.ty, Type::int64());
    }

    #[test]
    fn test_builtin_initialization_rejects_narrowing() {
        let mut sema = Sema::new();
        let state = sema.initial_state();
        let big = local_var(&mut sema, state, "big", Type::int64());
        let small = local_var(&mut sema, state, "small", Type::int8());
        let flag = local_var(&mut sema, state, "flag", Type::bool());

        let err = sema.act_on_initialization(small, id(&sema, state, "big")).unwrap_err();
        assert_eq!(
            err,
            SemaError::CannotInitialize {
                target: "vi8".to_string(),
                source_ty: "vi64".to_string(),
            }
        );
        assert!(sema.act_on_initialization(flag, int(1)).is_err());
        assert!(sema.ast().decl(big).as_var().unwrap().init.is_none());
    }

    #[test]
    fn test_unsupported_initialization() {
        let mut sema = Sema::new();
        let state = sema.initial_state();
        let p = local_var(&mut sema, state, "p", Type::pointer_to(Type::int32()));

        assert!(matches!(
            sema.act_on_initialization(p, int(0)).unwrap_err(),
            SemaError::Unsupported { .. }
        ));
    }

    #[test]
    fn test_reference_binding() {
        let mut sema = Sema::new();
        let state = sema.initial_state();
        local_var(&mut sema, state, "x", Type::int32());
        let r = local_var(&mut sema, state, "r", Type::reference_to(Type::int32()));
        let cr = local_var(&mut sema, state, "cr", Type::reference_to(Type::int8().with_const()));
        let wide = local_var(&mut sema, state, "wide", Type::reference_to(Type::int64()));

        sema.act_on_initialization(r, id(&sema, state, "x")).unwrap();
        // bound as is, no load
        assert!(sema.ast().decl(r).as_var().unwrap().init.as_ref().unwrap().is_lvalue());

        assert_eq!(
            sema.act_on_initialization(r, int(1)).unwrap_err(),
            SemaError::RvalueToNonConstRef { referenced: "vi32".to_string() }
        );
        assert_eq!(
            sema.act_on_initialization(wide, id(&sema, state, "x")).unwrap_err(),
            SemaError::ReferenceTypeMismatch {
                referenced: "vi64".to_string(),
                source_ty: "vi32".to_string(),
            }
        );
        // the const check passes, the literal's type is not const vi8
        assert!(matches!(
            sema.act_on_initialization(cr, int(1)).unwrap_err(),
            SemaError::ReferenceTypeMismatch { .. }
        ));
    }

    #[test]
    fn test_const_reference_binds_rvalue_of_same_type() {
        let mut sema = Sema::new();
        let state = sema.initial_state();
        local_var(&mut sema, state, "c", Type::int32().with_const());
        let cr = local_var(&mut sema, state, "cr", Type::reference_to(Type::int32().with_const()));

        let sum = Sema::act_on_binary_expr(id(&sema, state, "c"), BinaryOp::Add, id(&sema, state, "c")).unwrap();
        assert!(sum.is_rvalue());
        assert_eq!(sum.ty, Type::int32().with_const());

        sema.act_on_initialization(cr, sum.clone()).unwrap();
        let init = sema.ast().decl(cr).as_var().unwrap().init.clone().unwrap();
        assert_eq!(init, sum);
    }

    #[test]
    fn test_assignment_requires_mutable_lvalue() {
        let mut sema = Sema::new();
        let state = sema.initial_state();
        local_var(&mut sema, state, "a", Type::int32());
        local_var(&mut sema, state, "c", Type::int32().with_const());
        local_var(&mut sema, state, "rc", Type::reference_to(Type::int32().with_const()));

        assert_eq!(Sema::act_on_assignment(int(1), int(2)).unwrap_err(), SemaError::NotAnLvalue);
        assert!(matches!(
            Sema::act_on_assignment(id(&sema, state, "c"), int(2)).unwrap_err(),
            SemaError::AssignToConst { .. }
        ));
        assert!(matches!(
            Sema::act_on_assignment(id(&sema, state, "rc"), int(2)).unwrap_err(),
            SemaError::AssignToConst { .. }
        ));

        let assign = Sema::act_on_assignment(id(&sema, state, "a"), int(2)).unwrap();
        assert_eq!(assign.ty, Type::int32());
        assert!(assign.is_rvalue());
    }

    #[test]
    fn test_assignment_const_check_precedes_rhs() {
        let mut sema = Sema::new();
        let state = sema.initial_state();
        local_var(&mut sema, state, "c", Type::int8().with_const());

        // rhs would also fail to narrow, the const error wins
        let rhs = Sema::act_on_float_literal(2.0);
        assert!(matches!(
            Sema::act_on_assignment(id(&sema, state, "c"), rhs).unwrap_err(),
            SemaError::AssignToConst { .. }
        ));
    }

    #[test]
    fn test_assignment_rejects_narrowing_rhs() {
        let mut sema = Sema::new();
        let state = sema.initial_state();
        local_var(&mut sema, state, "a", Type::int8());
        local_var(&mut sema, state, "b", Type::int64());

        let err = Sema::act_on_assignment(id(&sema, state, "a"), id(&sema, state, "b")).unwrap_err();
        assert!(matches!(
            err,
            SemaError::InvalidImplicitCast { reason: CastFailure::Narrowing, .. }
        ));
    }

    #[test]
    fn test_logical_operands_must_be_bool() {
        let mut sema = Sema::new();
        let state = sema.initial_state();
        local_var(&mut sema, state, "f", Type::bool());

        let ok = Sema::act_on_logical_expr(id(&sema, state, "f"), BinaryOp::LogicAnd, Sema::act_on_bool_literal(true)).unwrap();
        assert_eq!(ok.ty, Type::bool());
        let ExprKind::Binary { lhs, .. } = &ok.kind else {
            panic!("expected a binary expression");
        };
        assert!(matches!(lhs.kind, ExprKind::LValueToRValue(_)));

        assert_eq!(
            Sema::act_on_logical_expr(int(1), BinaryOp::LogicOr, Sema::act_on_bool_literal(true)).unwrap_err(),
            SemaError::NonBoolLogicalOperand { op: "||", ty: "vi8".to_string() }
        );
        // dispatched by operator, never promoted like arithmetic
        assert_eq!(
            Sema::act_on_binary_expr(int(1), BinaryOp::LogicOr, int(0)).unwrap_err(),
            SemaError::NonBoolLogicalOperand { op: "||", ty: "vi8".to_string() }
        );
    }

    #[test]
    fn test_algebra_promotes_to_common_type() {
        let mut sema = Sema::new();
        let state = sema.initial_state();
        local_var(&mut sema, state, "a", Type::int32());
        local_var(&mut sema, state, "d", Type::double());

        let sum = Sema::act_on_binary_expr(id(&sema, state, "a"), BinaryOp::Add, int(42)).unwrap();
        assert_eq!(sum.ty, Type::int32());
        assert!(sum.is_rvalue());
        let ExprKind::Binary { lhs, rhs, .. } = &sum.kind else {
            panic!("expected a binary expression");
        };
        assert!(matches!(lhs.kind, ExprKind::LValueToRValue(_)));
        assert!(matches!(rhs.kind, ExprKind::ImplicitCast { cast: CastKind::IntegralWiden, .. }));

        let cmp = Sema::act_on_binary_expr(id(&sema, state, "a"), BinaryOp::Gt, int(0)).unwrap();
        assert_eq!(cmp.ty, Type::bool());

        assert_eq!(
            Sema::act_on_binary_expr(id(&sema, state, "a"), BinaryOp::Mul, id(&sema, state, "d")).unwrap_err(),
            SemaError::NoCommonType {
                op: "*",
                lhs: "vi32".to_string(),
                rhs: "vr64".to_string(),
            }
        );
    }

    #[test]
    fn test_decay_is_identity_on_rvalues() {
        let literal = int(3);
        assert_eq!(Sema::act_on_lvalue_to_rvalue(literal.clone()), literal);

        let mut sema = Sema::new();
        let state = sema.initial_state();
        local_var(&mut sema, state, "r", Type::reference_to(Type::int16()));
        let decayed = Sema::act_on_lvalue_to_rvalue(id(&sema, state, "r"));
        assert_eq!(decayed.ty, Type::int16());
        assert!(decayed.is_rvalue());
    }

    #[test]
    fn test_enumerators_count_up_from_previous() {
        let mut sema = Sema::new();
        let state = sema.initial_state();
        let color = sema.act_on_enum(state, "Color").unwrap();
        sema.act_on_decl_in_scope(state, color);
        sema.act_on_decl_in_context(state, color).unwrap();

        let inner = sema.act_on_tag_start_definition(state, color).unwrap();
        let mut values = Vec::new();
        for (name, value) in [("Red", None), ("Green", Some(5)), ("Blue", None)] {
            let e = sema.act_on_enumerator(inner, name, value).unwrap();
            sema.act_on_decl_in_scope(inner, e);
            sema.act_on_decl_in_context(inner, e).unwrap();
            values.push(e);
        }
        assert_eq!(
            sema.act_on_enumerator(inner, "Red", None).unwrap_err(),
            SemaError::redefinition("Red")
        );
        let outer = sema.act_on_tag_finish_definition(inner).unwrap();
        assert_eq!(outer, state);

        let numbers: Vec<i64> = values
            .iter()
            .map(|id| match &sema.ast().decl(*id).kind {
                DeclKind::Enumerator(e) => e.value,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(numbers, vec![0, 5, 6]);

        let blue = sema
            .act_on_id_expression(outer, &QualifiedName::new(vec!["Color".into(), "Blue".into()]))
            .unwrap();
        assert_eq!(blue.ty, Type::enumeration(color, "Color"));
        assert!(blue.is_rvalue());
    }

    #[test]
    fn test_fields_only_inside_classes() {
        let mut sema = Sema::new();
        let state = sema.initial_state();
        assert!(matches!(
            sema.act_on_field_decl(state, "f", Type::int8()).unwrap_err(),
            SemaError::Protocol { .. }
        ));

        let class = sema.act_on_class(state, "P").unwrap();
        let inner = sema.act_on_tag_start_definition(state, class).unwrap();
        let field = sema.act_on_field_decl(inner, "f", Type::int8()).unwrap();
        sema.act_on_decl_in_scope(inner, field);
        assert!(id(&sema, inner, "f").is_lvalue());
    }

    fn declare_func(sema: &mut Sema, state: AnalysisState, name: &str, params: &[Type], ret: Type) -> SemaResult<DeclId> {
        let func = sema.act_on_func_decl(state, name, ret)?;
        let inner = sema.act_on_start_param_list(state);
        for (index, ty) in params.iter().enumerate() {
            let param = sema.act_on_param(inner, func, &format!("p{}", index), ty.clone())?;
            sema.act_on_decl_in_scope(inner, param);
        }
        let outer = sema.act_on_finish_param_list(inner, func)?;
        sema.act_on_decl_in_scope(outer, func);
        sema.act_on_decl_in_context(outer, func)?;
        Ok(func)
    }

    #[test]
    fn test_overloads_need_distinct_parameter_types() {
        let mut sema = Sema::new();
        let state = sema.initial_state();
        declare_func(&mut sema, state, "f", &[Type::int32()], Type::void()).unwrap();
        declare_func(&mut sema, state, "f", &[Type::double()], Type::void()).unwrap();
        declare_func(&mut sema, state, "f", &[], Type::void()).unwrap();

        assert_eq!(
            declare_func(&mut sema, state, "f", &[Type::int32()], Type::int8()).unwrap_err(),
            SemaError::ConflictingDeclaration {
                name: "f".to_string(),
                previous: "void".to_string(),
                found: "vi8".to_string(),
            }
        );

        local_var(&mut sema, state, "g", Type::int32());
        assert_eq!(
            sema.act_on_func_decl(state, "g", Type::void()).unwrap_err(),
            SemaError::redefinition("g")
        );
        assert_eq!(
            sema.act_on_var_decl(state, "f", Type::int32()).unwrap_err(),
            SemaError::redefinition("f")
        );
    }

    #[test]
    fn test_prototype_then_definition() {
        let mut sema = Sema::new();
        let state = sema.initial_state();
        let prototype = declare_func(&mut sema, state, "f", &[Type::int32()], Type::bool()).unwrap();
        let again = declare_func(&mut sema, state, "f", &[Type::int32()], Type::bool()).unwrap();
        let definition = declare_func(&mut sema, state, "f", &[Type::int32()], Type::bool()).unwrap();
        assert_eq!(sema.ast().decl(definition).as_func().unwrap().previous, Some(again));
        assert_eq!(sema.first_declaration(definition).unwrap(), prototype);

        let body = sema.act_on_start_func_def(state, definition).unwrap();
        let ret = sema.act_on_return_stmt(body, Some(Sema::act_on_bool_literal(true))).unwrap();
        let state = sema.act_on_finish_func_def(body, Sema::act_on_compound_stmt(vec![ret])).unwrap();

        // a second body for the same signature
        let twice = declare_func(&mut sema, state, "f", &[Type::int32()], Type::bool()).unwrap();
        assert_eq!(
            sema.act_on_start_func_def(state, twice).unwrap_err(),
            SemaError::redefinition("f")
        );
    }

    #[test]
    fn test_duplicate_parameter_names() {
        let mut sema = Sema::new();
        let state = sema.initial_state();
        let func = sema.act_on_func_decl(state, "f", Type::void()).unwrap();
        let inner = sema.act_on_start_param_list(state);
        let a = sema.act_on_param(inner, func, "a", Type::int8()).unwrap();
        sema.act_on_decl_in_scope(inner, a);

        assert_eq!(
            sema.act_on_param(inner, func, "a", Type::int16()).unwrap_err(),
            SemaError::redefinition("a")
        );
    }

    #[test]
    fn test_function_body_sees_parameters() {
        let mut sema = Sema::new();
        let state = sema.initial_state();
        let func = declare_func(&mut sema, state, "twice", &[Type::int32()], Type::int32()).unwrap();
        assert!(sema.lookup(state, "p0", LookupKind::Everything).is_empty());

        let body = sema.act_on_start_func_def(state, func).unwrap();
        assert_eq!(body.function, Some(func));
        let param = id(&sema, body, "p0");
        assert!(param.is_lvalue());

        let sum = Sema::act_on_binary_expr(param.clone(), BinaryOp::Add, param).unwrap();
        let ret = sema.act_on_return_stmt(body, Some(sum)).unwrap();
        let block = Sema::act_on_compound_stmt(vec![ret]);
        let outer = sema.act_on_finish_func_def(body, block).unwrap();

        assert_eq!(outer, state);
        assert!(sema.ast().decl(func).as_func().unwrap().is_definition());
    }

    #[test]
    fn test_return_checks() {
        let mut sema = Sema::new();
        let state = sema.initial_state();
        let noop = declare_func(&mut sema, state, "noop", &[], Type::void()).unwrap();
        let get = declare_func(&mut sema, state, "get", &[], Type::int8()).unwrap();

        assert!(matches!(
            sema.act_on_return_stmt(state, None).unwrap_err(),
            SemaError::Protocol { .. }
        ));

        let body = sema.act_on_start_func_def(state, noop).unwrap();
        assert_eq!(
            sema.act_on_return_stmt(body, Some(int(1))).unwrap_err(),
            SemaError::UnexpectedReturnValue { function: "noop".to_string() }
        );
        assert_eq!(sema.act_on_return_stmt(body, None).unwrap(), Stmt::Return(None));
        let state = sema.act_on_finish_func_def(body, CompoundStmt::default()).unwrap();

        let body = sema.act_on_start_func_def(state, get).unwrap();
        assert_eq!(
            sema.act_on_return_stmt(body, None).unwrap_err(),
            SemaError::MissingReturnValue { function: "get".to_string() }
        );
        assert!(matches!(
            sema.act_on_return_stmt(body, Some(int(1000))).unwrap_err(),
            SemaError::InvalidImplicitCast { reason: CastFailure::Narrowing, .. }
        ));
    }

    #[test]
    fn test_finishing_without_start_is_protocol_error() {
        let mut sema = Sema::new();
        let state = sema.initial_state();

        assert!(matches!(
            sema.act_on_compound_stmt_end(state).unwrap_err(),
            SemaError::Protocol { .. }
        ));
        assert!(matches!(
            sema.act_on_tag_finish_definition(state).unwrap_err(),
            SemaError::Protocol { .. }
        ));
        assert!(matches!(
            sema.act_on_finish_func_def(state, CompoundStmt::default()).unwrap_err(),
            SemaError::Protocol { .. }
        ));
    }
}
