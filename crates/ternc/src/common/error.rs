//! Error types and diagnostic reporting

use codespan_reporting::diagnostic::Diagnostic;
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, NoColor, StandardStream};
use std::fmt;
use thiserror::Error;

/// Why an implicit conversion was refused.
///
/// Produced by the pure cast rule. The speculative path throws it away, the
/// authoritative path wraps it into [`SemaError::InvalidImplicitCast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastFailure {
    /// Destination drops a qualifier of the source, or the sets are unordered
    QualifierDowngrade,
    /// Builtin kinds belong to different categories (integer, floating, boolean)
    CategoryMismatch,
    /// Same category, but the destination ranks lower than the source
    Narrowing,
    /// Pointer conversion whose destination is not a pointer to void
    UnrelatedPointee,
    /// Both sides are references
    ReferenceRebind,
    /// No implicit conversion exists between these shapes of type
    Incompatible,
}

impl fmt::Display for CastFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CastFailure::QualifierDowngrade => "conversion would discard qualifiers",
            CastFailure::CategoryMismatch => "conversion crosses arithmetic categories",
            CastFailure::Narrowing => "conversion would narrow the value",
            CastFailure::UnrelatedPointee => "pointers only convert implicitly to void pointers",
            CastFailure::ReferenceRebind => "a reference cannot be re-bound to another reference type",
            CastFailure::Incompatible => "no implicit conversion between these types",
        };
        f.write_str(text)
    }
}

/// Why a reference cannot bind to an initializer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindFailure {
    /// An rvalue needs a const-qualified referenced type
    RvalueToNonConst,
    /// The referenced type differs from the initializer's type
    TypeMismatch,
}

/// Fatal semantic error. Any of these aborts the compilation unit.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SemaError {
    #[error("redefinition of `{name}`")]
    Redefinition { name: String },

    #[error("conflicting declaration of `{name}`: return type `{found}` differs from `{previous}`")]
    ConflictingDeclaration { name: String, previous: String, found: String },

    #[error("use of undeclared identifier `{name}`")]
    UndeclaredIdentifier { name: String },

    #[error("unknown function `{name}`")]
    UnknownFunction { name: String },

    #[error("no viable call to function `{name}`, {candidates} candidate(s) considered")]
    NoViableCall { name: String, candidates: usize },

    #[error("name `{name}` is ambiguous here")]
    AmbiguousName { name: String },

    #[error("`{name}` is not a class or enum and cannot be used as a qualifier")]
    NotAContext { name: String },

    #[error("`{name}` does not name a value")]
    NotAValue { name: String },

    #[error("cannot implicitly convert `{from}` to `{to}`: {reason}")]
    InvalidImplicitCast { from: String, to: String, reason: CastFailure },

    #[error("cannot initialize `{target}` with `{source_ty}`")]
    CannotInitialize { target: String, source_ty: String },

    #[error("binding rvalue to non-const lvalue reference of type `{referenced}`")]
    RvalueToNonConstRef { referenced: String },

    #[error("cannot initialize reference to `{referenced}` with `{source_ty}`")]
    ReferenceTypeMismatch { referenced: String, source_ty: String },

    #[error("expected lvalue at the left hand side of assignment")]
    NotAnLvalue,

    #[error("cannot assign to const-qualified `{ty}`")]
    AssignToConst { ty: String },

    #[error("non-bool operand of type `{ty}` used with `{op}`")]
    NonBoolLogicalOperand { op: &'static str, ty: String },

    #[error("no common type for `{lhs}` {op} `{rhs}`")]
    NoCommonType { op: &'static str, lhs: String, rhs: String },

    #[error("`{name}` cannot have type `void`")]
    VoidObject { name: String },

    #[error("non-void function `{function}` must return a value")]
    MissingReturnValue { function: String },

    #[error("void function `{function}` cannot return a value")]
    UnexpectedReturnValue { function: String },

    #[error("{what} is not supported")]
    Unsupported { what: String },

    #[error("protocol violation: {message}")]
    Protocol { message: String },

    #[error("syntax error: {message}")]
    Syntax { message: String },
}

impl SemaError {
    pub fn redefinition(name: impl Into<String>) -> Self {
        Self::Redefinition { name: name.into() }
    }

    pub fn undeclared(name: impl Into<String>) -> Self {
        Self::UndeclaredIdentifier { name: name.into() }
    }

    pub fn unsupported(what: impl Into<String>) -> Self {
        Self::Unsupported { what: what.into() }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol { message: message.into() }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax { message: message.into() }
    }

    /// Stable diagnostic code
    pub fn code(&self) -> &'static str {
        match self {
            SemaError::Redefinition { .. } => "E0001",
            SemaError::UndeclaredIdentifier { .. } => "E0002",
            SemaError::ConflictingDeclaration { .. } => "E0008",
            SemaError::UnknownFunction { .. } => "E0003",
            SemaError::NoViableCall { .. } => "E0004",
            SemaError::AmbiguousName { .. } => "E0005",
            SemaError::NotAContext { .. } => "E0006",
            SemaError::NotAValue { .. } => "E0007",
            SemaError::InvalidImplicitCast { .. } => "E0010",
            SemaError::CannotInitialize { .. } => "E0011",
            SemaError::RvalueToNonConstRef { .. } => "E0012",
            SemaError::ReferenceTypeMismatch { .. } => "E0013",
            SemaError::NotAnLvalue => "E0020",
            SemaError::AssignToConst { .. } => "E0021",
            SemaError::NonBoolLogicalOperand { .. } => "E0022",
            SemaError::NoCommonType { .. } => "E0023",
            SemaError::VoidObject { .. } => "E0024",
            SemaError::MissingReturnValue { .. } => "E0025",
            SemaError::UnexpectedReturnValue { .. } => "E0026",
            SemaError::Unsupported { .. } => "E0090",
            SemaError::Protocol { .. } => "E0098",
            SemaError::Syntax { .. } => "E0099",
        }
    }
}

pub type SemaResult<T> = Result<T, SemaError>;

/// Diagnostic reporter for pretty error output
///
/// Semantic errors carry no source spans, so diagnostics are rendered as a
/// code, a message and notes, without labels.
pub struct DiagnosticReporter {
    writer: StandardStream,
    config: term::Config,
}

impl DiagnosticReporter {
    pub fn new() -> Self {
        Self {
            writer: StandardStream::stderr(ColorChoice::Auto),
            config: term::Config::default(),
        }
    }

    /// Build the diagnostic for an error raised while analysing `unit`
    pub fn diagnostic(&self, unit: &str, error: &SemaError) -> Diagnostic<usize> {
        let mut notes = vec![format!("in compilation unit `{}`", unit)];
        match error {
            SemaError::NoViableCall { candidates, .. } => {
                notes.push(format!(
                    "{} candidate(s) had a mismatched arity or argument types",
                    candidates
                ));
            }
            SemaError::Protocol { .. } => {
                notes.push("the driving parser called the semantic actions out of order".to_string());
            }
            SemaError::Unsupported { .. } => {
                notes.push("user-defined conversions and constructors are not modelled".to_string());
            }
            _ => {}
        }

        Diagnostic::error()
            .with_code(error.code())
            .with_message(error.to_string())
            .with_notes(notes)
    }

    pub fn report_error(&self, unit: &str, error: &SemaError) {
        let diagnostic = self.diagnostic(unit, error);
        let files = SimpleFiles::<String, String>::new();
        let _ = term::emit(&mut self.writer.lock(), &self.config, &files, &diagnostic);
    }

    /// Render the diagnostic without colors, for logs and tests
    pub fn render(&self, unit: &str, error: &SemaError) -> String {
        let diagnostic = self.diagnostic(unit, error);
        let mut buffer = NoColor::new(Vec::new());
        let files = SimpleFiles::<String, String>::new();
        let _ = term::emit(&mut buffer, &self.config, &files, &diagnostic);
        String::from_utf8_lossy(&buffer.into_inner()).into_owned()
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_culprit() {
        let err = SemaError::redefinition("x");
        assert_eq!(err.to_string(), "redefinition of `x`");

        let err = SemaError::NoViableCall { name: "f".to_string(), candidates: 2 };
        assert_eq!(
            err.to_string(),
            "no viable call to function `f`, 2 candidate(s) considered"
        );
    }

    #[test]
    fn test_render_includes_code_and_notes() {
        let reporter = DiagnosticReporter::new();
        let err = SemaError::NoViableCall { name: "f".to_string(), candidates: 3 };
        let text = reporter.render("main", &err);

        assert!(text.contains("E0004"));
        assert!(text.contains("no viable call to function `f`"));
        assert!(text.contains("in compilation unit `main`"));
        assert!(text.contains("3 candidate(s)"));
    }

    #[test]
    fn test_diagnostics_carry_no_labels() {
        let reporter = DiagnosticReporter::new();
        let err = SemaError::undeclared("x");
        let diagnostic = reporter.diagnostic("main", &err);

        assert!(diagnostic.labels.is_empty());
        assert_eq!(diagnostic.code.as_deref(), Some("E0002"));
    }
}
