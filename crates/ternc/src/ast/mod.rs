//! Abstract Syntax Tree definitions

mod ids;
mod types;
mod expr;
mod stmt;
mod decl;
pub mod visit;

pub use ids::*;
pub use types::*;
pub use expr::*;
pub use stmt::*;
pub use decl::*;
