//! Common infrastructure shared by the semantic actions and the driver

mod error;

pub use error::{BindFailure, CastFailure, DiagnosticReporter, SemaError, SemaResult};
