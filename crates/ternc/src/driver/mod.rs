//! Analysis driver and per-unit error policy

mod parser;

pub use parser::Parser;

use crate::ast::AstContext;
use crate::common::{DiagnosticReporter, SemaResult};
use crate::token::Token;
use tracing::debug;

/// Driver configuration
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Skip the remaining units once one fails
    pub stop_on_first_error: bool,
    /// Render failures to stderr as they happen
    pub emit_diagnostics: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            stop_on_first_error: true,
            emit_diagnostics: true,
        }
    }
}

/// Result of analysing one compilation unit
#[derive(Debug)]
pub struct UnitOutcome {
    pub name: String,
    pub result: SemaResult<AstContext>,
}

impl UnitOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Analyse a single token stream with a fresh analyser
pub fn analyze_tokens(tokens: &[Token]) -> SemaResult<AstContext> {
    Parser::new(tokens).parse()
}

/// Runs compilation units through the parser and the semantic actions
pub struct Driver {
    config: DriverConfig,
    reporter: DiagnosticReporter,
}

impl Driver {
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            reporter: DiagnosticReporter::new(),
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn reporter(&self) -> &DiagnosticReporter {
        &self.reporter
    }

    /// Analyse one unit, reporting its error if configured to
    pub fn analyze_unit(&self, name: &str, tokens: &[Token]) -> SemaResult<AstContext> {
        debug!(unit = name, tokens = tokens.len(), "analyzing unit");
        let result = analyze_tokens(tokens);
        match &result {
            Ok(ast) => debug!(unit = name, decls = ast.len(), "unit analyzed"),
            Err(err) => {
                debug!(unit = name, code = err.code(), "unit failed");
                if self.config.emit_diagnostics {
                    self.reporter.report_error(name, err);
                }
            }
        }
        result
    }

    /// Analyse units in order. Each unit gets its own analyser, so a failure
    /// never leaks into the next one; with `stop_on_first_error` the units
    /// after a failure are not analysed at all.
    pub fn analyze_units<'a, I>(&self, units: I) -> Vec<UnitOutcome>
    where
        I: IntoIterator<Item = (&'a str, &'a [Token])>,
    {
        let mut outcomes = Vec::new();
        for (name, tokens) in units {
            let result = self.analyze_unit(name, tokens);
            let failed = result.is_err();
            outcomes.push(UnitOutcome {
                name: name.to_string(),
                result,
            });
            if failed && self.config.stop_on_first_error {
                break;
            }
        }
        outcomes
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new(DriverConfig::default())
    }
}

/// Split whitespace separated words into tokens, for tests
#[cfg(test)]
pub(crate) fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens: Vec<Token> = source
        .split_whitespace()
        .map(|word| match word {
            "let" => Token::Let,
            "func" => Token::Func,
            "class" => Token::Class,
            "enum" => Token::Enum,
            "const" => Token::Const,
            "volatile" => Token::Volatile,
            "return" => Token::Return,
            "true" => Token::True,
            "false" => Token::False,
            "vi8" => Token::Vi8,
            "vi16" => Token::Vi16,
            "vi32" => Token::Vi32,
            "vi64" => Token::Vi64,
            "vr32" => Token::Vr32,
            "vr64" => Token::Vr64,
            "bool" => Token::Bool,
            "void" => Token::Void,
            "+" => Token::Plus,
            "-" => Token::Minus,
            "*" => Token::Star,
            "/" => Token::Slash,
            "=" => Token::Eq,
            "==" => Token::EqEq,
            "!=" => Token::NotEq,
            "<" => Token::Lt,
            ">" => Token::Gt,
            "<=" => Token::LtEq,
            ">=" => Token::GtEq,
            "&" => Token::Amp,
            "&&" => Token::AmpAmp,
            "||" => Token::PipePipe,
            "->" => Token::Arrow,
            "(" => Token::LParen,
            ")" => Token::RParen,
            "{" => Token::LBrace,
            "}" => Token::RBrace,
            ";" => Token::Semi,
            "," => Token::Comma,
            "::" => Token::ColonColon,
            _ => {
                if let Ok(value) = word.parse::<i64>() {
                    Token::IntLiteral(value)
                } else if let Ok(value) = word.parse::<f64>() {
                    Token::FloatLiteral(value)
                } else {
                    Token::ident(word)
                }
            }
        })
        .collect();
    tokens.push(Token::Eoi);
    tokens
}
