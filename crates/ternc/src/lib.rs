//! Tern semantic core
//!
//! Semantic analysis for Tern, a small statically typed C-like language.
//! The crate resolves names through lexical scopes, checks qualified types
//! and implicit conversions, tracks value categories and picks function
//! overloads.
//!
//! ## Architecture
//!
//! The crate is organized into:
//! - **Tokens** (`token`): The upstream token vocabulary (scanning lives elsewhere)
//! - **AST** (`ast/`): Declaration arena, types, expressions, statements, visitors
//! - **Sema** (`sema/`): Type queries, scope tree and the semantic actions
//! - **Driver** (`driver/`): Token-driven parser that calls the actions in protocol order
//! - **Common** (`common/`): Shared infrastructure (errors, diagnostics)

pub mod common;
pub mod token;
pub mod ast;
pub mod sema;
pub mod driver;

// Re-exports for convenience
pub use common::{DiagnosticReporter, SemaError, SemaResult};
pub use ast::{AstContext, DeclId, Type};
pub use sema::{AnalysisState, Sema};
pub use driver::{Driver, DriverConfig, UnitOutcome};
