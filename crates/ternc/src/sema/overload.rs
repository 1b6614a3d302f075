//! Call resolution
//!
//! Candidates are tried in lookup order and the first viable one wins;
//! there is no ranking between viable candidates. A prototype and its
//! definition count as one candidate, named by the first declaration.

use super::actions::{AnalysisState, Sema};
use super::scope::{LookupKind, QualifiedName};
use super::types::{can_bind_reference, can_implicit_cast};
use crate::ast::{DeclId, Expr, ExprKind, Type, TypeKind};
use crate::common::{SemaError, SemaResult};
use tracing::debug;

impl Sema {
    /// Resolve a call to `name` with `args` and build the call expression
    pub fn act_on_func_call(
        &self,
        state: AnalysisState,
        name: &QualifiedName,
        args: Vec<Expr>,
    ) -> SemaResult<Expr> {
        let candidates = self.distinct_functions(self.lookup_qualified(state, name, LookupKind::Func)?)?;
        if candidates.is_empty() {
            return Err(SemaError::UnknownFunction { name: name.to_string() });
        }

        let Some(callee) = candidates.iter().copied().find(|func| self.is_viable(*func, &args)) else {
            return Err(SemaError::NoViableCall {
                name: name.to_string(),
                candidates: candidates.len(),
            });
        };
        debug!(function = %name, ?callee, candidates = candidates.len(), "resolved call");

        let func = self.func_decl(callee)?;
        let args = func
            .params
            .iter()
            .zip(args)
            .map(|(param, arg)| Self::pass_argument(self.var_type(*param)?, arg))
            .collect::<SemaResult<Vec<_>>>()?;

        Ok(Expr::rvalue(ExprKind::Call { callee, args }, func.return_type.clone()))
    }

    /// Collapse redeclarations onto their first declaration, keeping lookup order
    fn distinct_functions(&self, found: Vec<DeclId>) -> SemaResult<Vec<DeclId>> {
        let mut distinct: Vec<DeclId> = Vec::with_capacity(found.len());
        for func in found {
            let first = self.first_declaration(func)?;
            if !distinct.contains(&first) {
                distinct.push(first);
            }
        }
        Ok(distinct)
    }

    /// Speculative check of one candidate; never fails loudly
    fn is_viable(&self, func: DeclId, args: &[Expr]) -> bool {
        let Ok(decl) = self.func_decl(func) else {
            return false;
        };
        decl.arity() == args.len()
            && decl.params.iter().zip(args).all(|(param, arg)| {
                self.var_type(*param)
                    .is_ok_and(|param_ty| Self::accepts_argument(param_ty, arg))
            })
    }

    fn accepts_argument(param_ty: &Type, arg: &Expr) -> bool {
        match &param_ty.kind {
            TypeKind::Reference(referenced) => can_bind_reference(referenced, arg),
            _ => can_implicit_cast(&arg.ty, param_ty),
        }
    }

    /// Authoritative conversion of an argument of the chosen candidate
    fn pass_argument(param_ty: &Type, arg: Expr) -> SemaResult<Expr> {
        match &param_ty.kind {
            TypeKind::Reference(referenced) => Self::bind_reference(referenced, arg),
            _ => Self::convert(arg, param_ty),
        }
    }
}
