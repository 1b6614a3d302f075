//! Lexical scopes and name lookup
//!
//! Scopes form a tree stored in [`ScopeTree`]; each scope only knows its
//! parent. A scope holds the ids of the declarations visible in it, while
//! the declarations themselves stay in the [`AstContext`] arena.

use crate::ast::{AstContext, DeclId, DeclTag, ScopeId};
use crate::common::{SemaError, SemaResult};

/// Which declarations a lookup accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Everything,
    /// Variables, parameters and fields
    VarDecl,
    Func,
    Class,
    Enum,
    /// Classes and enums
    AstContext,
}

impl LookupKind {
    pub fn accepts(self, tag: DeclTag) -> bool {
        match self {
            LookupKind::Everything => true,
            LookupKind::VarDecl => matches!(tag, DeclTag::Var | DeclTag::Field),
            LookupKind::Func => tag == DeclTag::Func,
            LookupKind::Class => tag == DeclTag::Class,
            LookupKind::Enum => tag == DeclTag::Enum,
            LookupKind::AstContext => matches!(tag, DeclTag::Class | DeclTag::Enum),
        }
    }
}

/// A possibly qualified name: `x` or `Outer::Inner::x`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    segments: Vec<String>,
}

impl QualifiedName {
    pub fn new(segments: Vec<String>) -> Self {
        debug_assert!(!segments.is_empty(), "qualified name without segments");
        Self { segments }
    }

    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            segments: vec![name.into()],
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_qualified(&self) -> bool {
        self.segments.len() > 1
    }
}

impl std::fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.segments.join("::"))
    }
}

/// A scope containing visible declarations
#[derive(Debug, Default)]
pub struct Scope {
    parent: Option<ScopeId>,
    depth: u32,
    decls: Vec<DeclId>,
}

impl Scope {
    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn decls(&self) -> &[DeclId] {
        &self.decls
    }
}

/// Owner for all scopes of one compilation unit
#[derive(Debug)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl ScopeTree {
    /// Create a tree holding only the root scope
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId::from_raw(0)
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    /// Allocate a child of `parent`
    pub fn push_scope(&mut self, parent: ScopeId) -> ScopeId {
        let depth = self.get(parent).depth + 1;
        let id = ScopeId::from_raw(self.scopes.len() as u32);
        self.scopes.push(Scope {
            parent: Some(parent),
            depth,
            decls: Vec::new(),
        });
        id
    }

    /// Leave `scope`, returning its parent.
    ///
    /// The scope's visible set is dropped. Declarations that also belong to
    /// a declaration context remain reachable through it.
    pub fn pop_scope(&mut self, scope: ScopeId) -> SemaResult<ScopeId> {
        let parent = self
            .get(scope)
            .parent
            .ok_or_else(|| SemaError::protocol("cannot pop the root scope"))?;
        self.scopes[scope.index()].decls.clear();
        Ok(parent)
    }

    pub fn add_decl(&mut self, scope: ScopeId, decl: DeclId) {
        self.scopes[scope.index()].decls.push(decl);
    }

    pub fn remove_decl(&mut self, scope: ScopeId, decl: DeclId) {
        self.scopes[scope.index()].decls.retain(|d| *d != decl);
    }

    /// Declarations of `kind` named `name` in `scope` itself
    pub fn lookup_local(
        &self,
        ast: &AstContext,
        scope: ScopeId,
        name: &str,
        kind: LookupKind,
    ) -> Vec<DeclId> {
        let Some(symbol) = ast.lookup_name(name) else {
            return Vec::new();
        };
        self.get(scope)
            .decls
            .iter()
            .copied()
            .filter(|id| ast.decl(*id).name == Some(symbol))
            .filter(|id| kind.accepts(ast.decl(*id).tag()))
            .collect()
    }

    /// Innermost non-empty result walking up from `scope`; levels never merge
    pub fn lookup(
        &self,
        ast: &AstContext,
        scope: ScopeId,
        name: &str,
        kind: LookupKind,
    ) -> Vec<DeclId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let found = self.lookup_local(ast, id, name, kind);
            if !found.is_empty() {
                return found;
            }
            current = self.get(id).parent;
        }
        Vec::new()
    }

    /// Resolve a possibly qualified name.
    ///
    /// The first segment of a qualified name is a scoped class/enum lookup;
    /// every following segment is looked up inside the single context the
    /// previous segment named.
    pub fn lookup_qualified(
        &self,
        ast: &AstContext,
        scope: ScopeId,
        name: &QualifiedName,
        kind: LookupKind,
    ) -> SemaResult<Vec<DeclId>> {
        let Some((first, rest)) = name.segments().split_first() else {
            return Ok(Vec::new());
        };
        if !name.is_qualified() {
            return Ok(self.lookup(ast, scope, first, kind));
        }

        let mut found = self.lookup(ast, scope, first, LookupKind::AstContext);
        let mut resolved = first.clone();
        for segment in rest {
            let context = match found.as_slice() {
                [] => return Err(SemaError::undeclared(resolved)),
                [single] => *single,
                _ => return Err(SemaError::AmbiguousName { name: resolved }),
            };
            if !ast.decl(context).is_context() {
                return Err(SemaError::NotAContext { name: resolved });
            }
            found = ast.lookup_in_context(context, segment);
            resolved = format!("{}::{}", resolved, segment);
        }

        Ok(found
            .into_iter()
            .filter(|id| kind.accepts(ast.decl(*id).tag()))
            .collect())
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}
