//! Declaration nodes and the arena that owns them
//!
//! Every declaration lives in [`AstContext`] and is addressed by a
//! [`DeclId`]. Declaration contexts (translation unit, class, enum) and
//! lexical scopes only store ids, so one declaration can belong to its
//! owning context and to the scope that introduced it at the same time.

use super::{CompoundStmt, DeclId, Expr, Type};
use crate::common::{SemaError, SemaResult};
use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Interned declaration name
pub type Name = DefaultSymbol;

/// Declaration node
#[derive(Debug, Clone)]
pub struct Decl {
    pub name: Option<Name>,
    /// Owning declaration context; `None` only for the translation unit
    pub parent: Option<DeclId>,
    pub kind: DeclKind,
}

impl Decl {
    pub fn new(name: Option<Name>, parent: Option<DeclId>, kind: DeclKind) -> Self {
        Self { name, parent, kind }
    }

    pub fn tag(&self) -> DeclTag {
        match self.kind {
            DeclKind::TranslationUnit(_) => DeclTag::TranslationUnit,
            DeclKind::Var(_) => DeclTag::Var,
            DeclKind::Field(_) => DeclTag::Field,
            DeclKind::Func(_) => DeclTag::Func,
            DeclKind::Class(_) => DeclTag::Class,
            DeclKind::Enum(_) => DeclTag::Enum,
            DeclKind::Enumerator(_) => DeclTag::Enumerator,
        }
    }

    /// Nested declarations, if this declaration is a context
    pub fn as_context(&self) -> Option<&DeclContext> {
        match &self.kind {
            DeclKind::TranslationUnit(ctx) | DeclKind::Class(ctx) | DeclKind::Enum(ctx) => Some(ctx),
            _ => None,
        }
    }

    fn as_context_mut(&mut self) -> Option<&mut DeclContext> {
        match &mut self.kind {
            DeclKind::TranslationUnit(ctx) | DeclKind::Class(ctx) | DeclKind::Enum(ctx) => Some(ctx),
            _ => None,
        }
    }

    pub fn is_context(&self) -> bool {
        self.as_context().is_some()
    }

    pub fn as_var(&self) -> Option<&VarDecl> {
        match &self.kind {
            DeclKind::Var(var) => Some(var),
            _ => None,
        }
    }

    pub fn as_func(&self) -> Option<&FuncDecl> {
        match &self.kind {
            DeclKind::Func(func) => Some(func),
            _ => None,
        }
    }
}

/// Declaration kinds
#[derive(Debug, Clone)]
pub enum DeclKind {
    TranslationUnit(DeclContext),
    Var(VarDecl),
    Field(FieldDecl),
    Func(FuncDecl),
    Class(DeclContext),
    Enum(DeclContext),
    Enumerator(EnumeratorDecl),
}

/// Payload-free tag of a declaration kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclTag {
    TranslationUnit,
    Var,
    Field,
    Func,
    Class,
    Enum,
    Enumerator,
}

/// Ordered list of nested declarations
#[derive(Debug, Clone, Default)]
pub struct DeclContext {
    pub decls: Vec<DeclId>,
}

/// Variable or parameter declaration
#[derive(Debug, Clone)]
pub struct VarDecl {
    pub ty: Type,
    pub init: Option<Expr>,
}

impl VarDecl {
    pub fn new(ty: Type) -> Self {
        Self { ty, init: None }
    }
}

/// Class field
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub ty: Type,
}

/// Function declaration or definition
#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub params: Vec<DeclId>,
    pub return_type: Type,
    pub body: Option<CompoundStmt>,
    /// Earlier declaration of the same function, e.g. its prototype
    pub previous: Option<DeclId>,
}

impl FuncDecl {
    pub fn new(return_type: Type) -> Self {
        Self {
            params: Vec::new(),
            return_type,
            body: None,
            previous: None,
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Check if this is a definition (has body)
    pub fn is_definition(&self) -> bool {
        self.body.is_some()
    }
}

/// Enumerator inside an enum
#[derive(Debug, Clone)]
pub struct EnumeratorDecl {
    pub value: i64,
}

/// Arena owning every declaration of one compilation unit
#[derive(Debug)]
pub struct AstContext {
    decls: Vec<Decl>,
    names: DefaultStringInterner,
    translation_unit: DeclId,
}

impl AstContext {
    pub fn new() -> Self {
        let root = Decl::new(None, None, DeclKind::TranslationUnit(DeclContext::default()));
        Self {
            decls: vec![root],
            names: DefaultStringInterner::new(),
            translation_unit: DeclId::from_raw(0),
        }
    }

    /// The top-level declaration context
    pub fn translation_unit(&self) -> DeclId {
        self.translation_unit
    }

    pub fn alloc(&mut self, decl: Decl) -> DeclId {
        let id = DeclId::from_raw(self.decls.len() as u32);
        self.decls.push(decl);
        id
    }

    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id.index()]
    }

    pub fn decl_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id.index()]
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn intern(&mut self, name: &str) -> Name {
        self.names.get_or_intern(name)
    }

    /// Symbol for `name` if any declaration was ever given that name
    pub fn lookup_name(&self, name: &str) -> Option<Name> {
        self.names.get(name)
    }

    pub fn resolve(&self, name: Name) -> &str {
        self.names.resolve(name).unwrap_or("<unknown>")
    }

    pub fn name_of(&self, id: DeclId) -> Option<&str> {
        self.decl(id).name.map(|name| self.resolve(name))
    }

    /// Name for messages; anonymous declarations get a placeholder
    pub fn display_name(&self, id: DeclId) -> String {
        self.name_of(id).unwrap_or("<anonymous>").to_string()
    }

    pub fn context(&self, id: DeclId) -> Option<&DeclContext> {
        self.decl(id).as_context()
    }

    /// Append `decl` to the ordered declarations of `context`
    pub fn add_to_context(&mut self, context: DeclId, decl: DeclId) -> SemaResult<()> {
        let name = self.display_name(context);
        match self.decl_mut(context).as_context_mut() {
            Some(ctx) => {
                ctx.decls.push(decl);
                Ok(())
            }
            None => Err(SemaError::protocol(format!(
                "`{}` is not a declaration context",
                name
            ))),
        }
    }

    /// Declarations named `name` directly inside `context`, in declaration order
    pub fn lookup_in_context(&self, context: DeclId, name: &str) -> Vec<DeclId> {
        let (Some(ctx), Some(symbol)) = (self.context(context), self.lookup_name(name)) else {
            return Vec::new();
        };
        ctx.decls
            .iter()
            .copied()
            .filter(|id| self.decl(*id).name == Some(symbol))
            .collect()
    }

    /// Type of a class or enum declaration used as a type name
    pub fn tag_type(&self, id: DeclId) -> Option<Type> {
        let name = self.display_name(id);
        match self.decl(id).kind {
            DeclKind::Class(_) => Some(Type::class(id, name)),
            DeclKind::Enum(_) => Some(Type::enumeration(id, name)),
            _ => None,
        }
    }

    /// Type of the value a declaration denotes when referenced in an expression
    pub fn value_type(&self, id: DeclId) -> Option<Type> {
        match &self.decl(id).kind {
            DeclKind::Var(var) => Some(var.ty.clone()),
            DeclKind::Field(field) => Some(field.ty.clone()),
            DeclKind::Enumerator(_) => self.decl(id).parent.and_then(|parent| self.tag_type(parent)),
            _ => None,
        }
    }
}

impl Default for AstContext {
    fn default() -> Self {
        Self::new()
    }
}
