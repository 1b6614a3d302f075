//! Semantic analysis: type queries, scopes and the semantic actions

mod actions;
mod overload;
pub mod scope;
pub mod types;

pub use actions::{AnalysisState, Sema};
pub use scope::{LookupKind, QualifiedName, ScopeTree};
