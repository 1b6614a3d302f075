//! Read-only traversal of a finished compilation unit
//!
//! Each hook defaults to the matching `walk_*` function, which visits the
//! children. The walks match exhaustively on the node kinds, so adding a
//! kind is a compile error here until it is handled.

use super::*;

pub trait Visitor: Sized {
    fn visit_decl(&mut self, ctx: &AstContext, id: DeclId) {
        walk_decl(self, ctx, id);
    }

    fn visit_translation_unit(&mut self, ctx: &AstContext, _id: DeclId, unit: &DeclContext) {
        walk_context(self, ctx, unit);
    }

    fn visit_var(&mut self, ctx: &AstContext, _id: DeclId, var: &VarDecl) {
        if let Some(init) = &var.init {
            self.visit_expr(ctx, init);
        }
    }

    fn visit_field(&mut self, _ctx: &AstContext, _id: DeclId, _field: &FieldDecl) {}

    fn visit_func(&mut self, ctx: &AstContext, _id: DeclId, func: &FuncDecl) {
        for param in &func.params {
            self.visit_decl(ctx, *param);
        }
        if let Some(body) = &func.body {
            self.visit_compound(ctx, body);
        }
    }

    fn visit_class(&mut self, ctx: &AstContext, _id: DeclId, class: &DeclContext) {
        walk_context(self, ctx, class);
    }

    fn visit_enum(&mut self, ctx: &AstContext, _id: DeclId, members: &DeclContext) {
        walk_context(self, ctx, members);
    }

    fn visit_enumerator(&mut self, _ctx: &AstContext, _id: DeclId, _enumerator: &EnumeratorDecl) {}

    fn visit_stmt(&mut self, ctx: &AstContext, stmt: &Stmt) {
        walk_stmt(self, ctx, stmt);
    }

    fn visit_compound(&mut self, ctx: &AstContext, block: &CompoundStmt) {
        for stmt in &block.stmts {
            self.visit_stmt(ctx, stmt);
        }
    }

    fn visit_decl_stmt(&mut self, ctx: &AstContext, decl: DeclId) {
        self.visit_decl(ctx, decl);
    }

    fn visit_expr_stmt(&mut self, ctx: &AstContext, expr: &Expr) {
        self.visit_expr(ctx, expr);
    }

    fn visit_return(&mut self, ctx: &AstContext, value: Option<&Expr>) {
        if let Some(value) = value {
            self.visit_expr(ctx, value);
        }
    }

    fn visit_expr(&mut self, ctx: &AstContext, expr: &Expr) {
        walk_expr(self, ctx, expr);
    }

    fn visit_decl_ref(&mut self, _ctx: &AstContext, _expr: &Expr, _decl: DeclId) {}

    fn visit_call(&mut self, ctx: &AstContext, _callee: DeclId, args: &[Expr]) {
        for arg in args {
            self.visit_expr(ctx, arg);
        }
    }
}

pub fn walk_decl<V: Visitor>(visitor: &mut V, ctx: &AstContext, id: DeclId) {
    match &ctx.decl(id).kind {
        DeclKind::TranslationUnit(unit) => visitor.visit_translation_unit(ctx, id, unit),
        DeclKind::Var(var) => visitor.visit_var(ctx, id, var),
        DeclKind::Field(field) => visitor.visit_field(ctx, id, field),
        DeclKind::Func(func) => visitor.visit_func(ctx, id, func),
        DeclKind::Class(class) => visitor.visit_class(ctx, id, class),
        DeclKind::Enum(members) => visitor.visit_enum(ctx, id, members),
        DeclKind::Enumerator(enumerator) => visitor.visit_enumerator(ctx, id, enumerator),
    }
}

pub fn walk_context<V: Visitor>(visitor: &mut V, ctx: &AstContext, context: &DeclContext) {
    for decl in &context.decls {
        visitor.visit_decl(ctx, *decl);
    }
}

pub fn walk_stmt<V: Visitor>(visitor: &mut V, ctx: &AstContext, stmt: &Stmt) {
    match stmt {
        Stmt::Compound(block) => visitor.visit_compound(ctx, block),
        Stmt::Decl(decl) => visitor.visit_decl_stmt(ctx, *decl),
        Stmt::Expr(expr) => visitor.visit_expr_stmt(ctx, expr),
        Stmt::Return(value) => visitor.visit_return(ctx, value.as_ref()),
    }
}

pub fn walk_expr<V: Visitor>(visitor: &mut V, ctx: &AstContext, expr: &Expr) {
    match &expr.kind {
        ExprKind::IntLiteral(_) | ExprKind::FloatLiteral(_) | ExprKind::BoolLiteral(_) => {}
        ExprKind::DeclRef(decl) => visitor.visit_decl_ref(ctx, expr, *decl),
        ExprKind::Binary { lhs, rhs, .. } => {
            visitor.visit_expr(ctx, lhs);
            visitor.visit_expr(ctx, rhs);
        }
        ExprKind::ImplicitCast { operand, .. } | ExprKind::LValueToRValue(operand) => {
            visitor.visit_expr(ctx, operand);
        }
        ExprKind::Call { callee, args } => visitor.visit_call(ctx, *callee, args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{analyze_tokens, tokenize};
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Counter {
        decls: usize,
        funcs: usize,
        enumerators: usize,
        decl_refs: usize,
        calls: usize,
        returns: usize,
    }

    impl Visitor for Counter {
        fn visit_decl(&mut self, ctx: &AstContext, id: DeclId) {
            self.decls += 1;
            walk_decl(self, ctx, id);
        }

        fn visit_func(&mut self, ctx: &AstContext, _id: DeclId, func: &FuncDecl) {
            self.funcs += 1;
            for param in &func.params {
                self.visit_decl(ctx, *param);
            }
            if let Some(body) = &func.body {
                self.visit_compound(ctx, body);
            }
        }

        fn visit_enumerator(&mut self, _ctx: &AstContext, _id: DeclId, _enumerator: &EnumeratorDecl) {
            self.enumerators += 1;
        }

        fn visit_decl_ref(&mut self, _ctx: &AstContext, _expr: &Expr, _decl: DeclId) {
            self.decl_refs += 1;
        }

        fn visit_call(&mut self, ctx: &AstContext, _callee: DeclId, args: &[Expr]) {
            self.calls += 1;
            for arg in args {
                self.visit_expr(ctx, arg);
            }
        }

        fn visit_return(&mut self, ctx: &AstContext, value: Option<&Expr>) {
            self.returns += 1;
            if let Some(value) = value {
                self.visit_expr(ctx, value);
            }
        }
    }

    #[test]
    fn test_visitor_reaches_every_node() {
        let source = "
            enum Mode { Off , On } ;
            class Box { let vi32 size ; func grow ( vi32 by ) { size = size + by ; } } ;
            func add ( vi32 a , vi32 b ) -> vi32 { return a + b ; }
            func main ( ) -> vi32 {
                let vi32 x = add ( 1 , 2 ) ;
                { let vi32 y = x ; }
                return x ;
            }
        ";
        let ast = analyze_tokens(&tokenize(source)).unwrap();
        let mut counter = Counter::default();
        counter.visit_decl(&ast, ast.translation_unit());

        // tu, Mode, Off, On, Box, size, grow, by, add, a, b, main, x, y
        assert_eq!(counter.decls, 14);
        assert_eq!(counter.funcs, 3);
        assert_eq!(counter.enumerators, 2);
        // size, size, by, a, b, x, x
        assert_eq!(counter.decl_refs, 7);
        assert_eq!(counter.calls, 1);
        assert_eq!(counter.returns, 2);
    }
}
