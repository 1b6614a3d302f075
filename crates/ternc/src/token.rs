//! Token definitions consumed by the driver
//!
//! Scanning source text is not part of this crate. A scanner hands over an
//! ordered `Vec<Token>` that ends with [`Token::Eoi`]; literal tokens carry
//! their value.

use std::fmt;

/// All token kinds in Tern
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // === Keywords ===
    Let,
    Func,
    Class,
    Enum,
    Const,
    Volatile,
    Return,
    True,
    False,

    // === Builtin type keywords ===
    Vi8,
    Vi16,
    Vi32,
    Vi64,
    Vr32,
    Vr64,
    Bool,
    Void,

    // === Identifiers and literals ===
    Identifier(String),
    IntLiteral(i64),
    FloatLiteral(f64),

    // === Operators ===
    Plus,
    Minus,
    Star,
    Slash,
    Eq,
    EqEq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Amp,
    AmpAmp,
    PipePipe,
    Arrow,

    // === Delimiters ===
    LParen,
    RParen,
    LBrace,
    RBrace,
    Semi,
    Comma,
    ColonColon,

    /// End of input
    Eoi,
}

impl Token {
    /// Shorthand for building identifier tokens
    pub fn ident(name: impl Into<String>) -> Self {
        Token::Identifier(name.into())
    }

    /// Get the precedence of binary operators (higher = tighter binding)
    pub fn binary_precedence(&self) -> Option<u8> {
        match self {
            // Assignment
            Token::Eq => Some(1),
            // Logical OR
            Token::PipePipe => Some(2),
            // Logical AND
            Token::AmpAmp => Some(3),
            // Equality
            Token::EqEq | Token::NotEq => Some(4),
            // Relational
            Token::Lt | Token::Gt | Token::LtEq | Token::GtEq => Some(5),
            // Additive
            Token::Plus | Token::Minus => Some(6),
            // Multiplicative
            Token::Star | Token::Slash => Some(7),
            _ => None,
        }
    }

    /// Check if this operator is right-associative
    pub fn is_right_associative(&self) -> bool {
        matches!(self, Token::Eq)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Let => write!(f, "'let'"),
            Token::Func => write!(f, "'func'"),
            Token::Class => write!(f, "'class'"),
            Token::Enum => write!(f, "'enum'"),
            Token::Const => write!(f, "'const'"),
            Token::Volatile => write!(f, "'volatile'"),
            Token::Return => write!(f, "'return'"),
            Token::True => write!(f, "'true'"),
            Token::False => write!(f, "'false'"),
            Token::Vi8 => write!(f, "'vi8'"),
            Token::Vi16 => write!(f, "'vi16'"),
            Token::Vi32 => write!(f, "'vi32'"),
            Token::Vi64 => write!(f, "'vi64'"),
            Token::Vr32 => write!(f, "'vr32'"),
            Token::Vr64 => write!(f, "'vr64'"),
            Token::Bool => write!(f, "'bool'"),
            Token::Void => write!(f, "'void'"),
            Token::Identifier(s) => write!(f, "identifier '{}'", s),
            Token::IntLiteral(v) => write!(f, "integer '{}'", v),
            Token::FloatLiteral(v) => write!(f, "float '{}'", v),
            Token::Plus => write!(f, "'+'"),
            Token::Minus => write!(f, "'-'"),
            Token::Star => write!(f, "'*'"),
            Token::Slash => write!(f, "'/'"),
            Token::Eq => write!(f, "'='"),
            Token::EqEq => write!(f, "'=='"),
            Token::NotEq => write!(f, "'!='"),
            Token::Lt => write!(f, "'<'"),
            Token::Gt => write!(f, "'>'"),
            Token::LtEq => write!(f, "'<='"),
            Token::GtEq => write!(f, "'>='"),
            Token::Amp => write!(f, "'&'"),
            Token::AmpAmp => write!(f, "'&&'"),
            Token::PipePipe => write!(f, "'||'"),
            Token::Arrow => write!(f, "'->'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::LBrace => write!(f, "'{{'"),
            Token::RBrace => write!(f, "'}}'"),
            Token::Semi => write!(f, "';'"),
            Token::Comma => write!(f, "','"),
            Token::ColonColon => write!(f, "'::'"),
            Token::Eoi => write!(f, "end of input"),
        }
    }
}
