//! Type queries: implicit conversions and arithmetic promotion
//!
//! Everything here is pure. The cast rule reports why a conversion is
//! refused as a [`CastFailure`]; callers decide whether that is fatal
//! ([`require_implicit_cast`]) or just a `false` ([`can_implicit_cast`]).

use crate::ast::{CastKind, Expr, QualifierOrdering, Type, TypeKind};
use crate::common::{BindFailure, CastFailure, SemaError, SemaResult};
use tracing::trace;

/// Decide whether `from` converts implicitly to `to`.
///
/// `Ok(None)` means no conversion node is needed, `Ok(Some(kind))` names the
/// conversion to insert.
pub fn implicit_cast_rule(from: &Type, to: &Type) -> Result<Option<CastKind>, CastFailure> {
    if from.structurally_equal(to) {
        return Ok(None);
    }
    if from.is_reference() && to.is_reference() {
        return Err(CastFailure::ReferenceRebind);
    }

    let source = from.dereferenced();
    match to.qualifiers.compare(source.qualifiers) {
        QualifierOrdering::LessQualified | QualifierOrdering::Nonsense => {
            return Err(CastFailure::QualifierDowngrade);
        }
        QualifierOrdering::Equal | QualifierOrdering::MoreQualified => {}
    }

    if source.structurally_equal(to) {
        return Ok(None);
    }
    if source.kind == to.kind {
        return Ok(Some(CastKind::Qualification));
    }

    match (&source.kind, &to.kind) {
        (TypeKind::Builtin(from_kind), TypeKind::Builtin(to_kind)) => {
            match (from_kind.category(), to_kind.category()) {
                (Some(a), Some(b)) if a == b => {
                    if from_kind.rank() > to_kind.rank() {
                        Err(CastFailure::Narrowing)
                    } else if from_kind.is_integer() {
                        Ok(Some(CastKind::IntegralWiden))
                    } else {
                        Ok(Some(CastKind::FloatingWiden))
                    }
                }
                (Some(_), Some(_)) => Err(CastFailure::CategoryMismatch),
                _ => Err(CastFailure::Incompatible),
            }
        }
        (TypeKind::Pointer(_), TypeKind::Pointer(pointee)) => {
            if pointee.is_void() {
                Ok(Some(CastKind::PointerToVoid))
            } else {
                Err(CastFailure::UnrelatedPointee)
            }
        }
        _ => Err(CastFailure::Incompatible),
    }
}

/// Speculative check: no diagnostics, no side effects
pub fn can_implicit_cast(from: &Type, to: &Type) -> bool {
    let verdict = implicit_cast_rule(from, to);
    trace!(%from, %to, ok = verdict.is_ok(), "probe implicit cast");
    verdict.is_ok()
}

/// Authoritative check: a refused conversion is fatal
pub fn require_implicit_cast(from: &Type, to: &Type) -> SemaResult<Option<CastKind>> {
    implicit_cast_rule(from, to).map_err(|reason| SemaError::InvalidImplicitCast {
        from: from.to_string(),
        to: to.to_string(),
        reason,
    })
}

/// Decide whether a reference to `referenced` binds to `init`.
///
/// An rvalue needs a const referenced type, and the referenced type must
/// match the initializer exactly; nothing widens through a reference.
pub fn reference_binding_rule(referenced: &Type, init: &Expr) -> Result<(), BindFailure> {
    if init.is_rvalue() && !referenced.is_const() {
        return Err(BindFailure::RvalueToNonConst);
    }
    if !referenced.structurally_equal(init.ty.dereferenced()) {
        return Err(BindFailure::TypeMismatch);
    }
    Ok(())
}

/// Speculative reference binding
pub fn can_bind_reference(referenced: &Type, init: &Expr) -> bool {
    let verdict = reference_binding_rule(referenced, init);
    trace!(%referenced, from = %init.ty, ok = verdict.is_ok(), "probe reference binding");
    verdict.is_ok()
}

/// Authoritative reference binding: a refused binding is fatal
pub fn require_reference_binding(referenced: &Type, init: &Expr) -> SemaResult<()> {
    reference_binding_rule(referenced, init).map_err(|reason| match reason {
        BindFailure::RvalueToNonConst => SemaError::RvalueToNonConstRef {
            referenced: referenced.to_string(),
        },
        BindFailure::TypeMismatch => SemaError::ReferenceTypeMismatch {
            referenced: referenced.to_string(),
            source_ty: init.ty.dereferenced().to_string(),
        },
    })
}

/// Common type of two builtin operands.
///
/// Both operands must be builtins of the same arithmetic category; the
/// higher-ranked kind wins and carries the qualifiers of both operands.
pub fn common_builtin_type(lhs: &Type, rhs: &Type) -> Option<Type> {
    let (lhs, rhs) = (lhs.dereferenced(), rhs.dereferenced());
    let (lhs_kind, rhs_kind) = (lhs.as_builtin()?, rhs.as_builtin()?);
    if lhs_kind.category()? != rhs_kind.category()? {
        return None;
    }

    let kind = if rhs_kind.rank() > lhs_kind.rank() { rhs_kind } else { lhs_kind };
    Some(Type::builtin(kind).with_qualifiers(lhs.qualifiers.union(rhs.qualifiers)))
}
