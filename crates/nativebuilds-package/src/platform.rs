//! Platform qualifiers (`"platform": "linux & !arm"`)
//!
//! Grammar:
//!
//! ```text
//! expr  := and (('|' | ',') and)*
//! and   := unary ('&' unary)*
//! unary := '!' unary | '(' expr ')' | identifier
//! ```

use crate::target::BuildTarget;
use crate::{PackageError, Result};
use std::collections::BTreeSet;
use std::iter::Peekable;
use std::str::CharIndices;

/// Platform a resolution is evaluated against
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Platform {
    /// Every platform-qualified entry is active
    #[default]
    Any,
    /// Only entries whose expression holds for these identifiers
    Identifiers(BTreeSet<String>),
}

impl Platform {
    /// Platform of a single build target
    pub fn for_target(target: BuildTarget) -> Self {
        Self::Identifiers(
            target
                .platform_identifiers()
                .iter()
                .map(|id| id.to_string())
                .collect(),
        )
    }

    /// Check whether an optional platform qualifier is satisfied.
    ///
    /// Expressions are parsed even for [`Platform::Any`] so that malformed
    /// manifests are rejected regardless of the platform.
    pub fn matches(&self, expr: Option<&str>) -> Result<bool> {
        let Some(expr) = expr else {
            return Ok(true);
        };
        let parsed = PlatformExpr::parse(expr)?;
        Ok(match self {
            Self::Any => true,
            Self::Identifiers(ids) => parsed.eval(ids),
        })
    }
}

/// Parsed platform expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformExpr {
    Ident(String),
    Not(Box<PlatformExpr>),
    And(Vec<PlatformExpr>),
    Or(Vec<PlatformExpr>),
}

impl PlatformExpr {
    pub fn parse(source: &str) -> Result<Self> {
        let mut parser = Parser {
            source,
            chars: source.char_indices().peekable(),
        };
        let expr = parser.parse_or()?;
        parser.skip_whitespace();
        if let Some((pos, c)) = parser.chars.peek().copied() {
            return Err(parser.error(format!("unexpected '{}' at offset {}", c, pos)));
        }
        Ok(expr)
    }

    pub fn eval(&self, identifiers: &BTreeSet<String>) -> bool {
        match self {
            Self::Ident(id) => identifiers.contains(id),
            Self::Not(inner) => !inner.eval(identifiers),
            Self::And(terms) => terms.iter().all(|t| t.eval(identifiers)),
            Self::Or(terms) => terms.iter().any(|t| t.eval(identifiers)),
        }
    }
}

struct Parser<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn error(&self, reason: impl Into<String>) -> PackageError {
        PackageError::InvalidPlatformExpr {
            expr: self.source.to_string(),
            reason: reason.into(),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.chars.peek(), Some((_, c)) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn eat(&mut self, expected: &[char]) -> bool {
        self.skip_whitespace();
        match self.chars.peek() {
            Some((_, c)) if expected.contains(c) => {
                self.chars.next();
                true
            }
            _ => false,
        }
    }

    fn parse_or(&mut self) -> Result<PlatformExpr> {
        let mut terms = vec![self.parse_and()?];
        while self.eat(&['|', ',']) {
            terms.push(self.parse_and()?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            PlatformExpr::Or(terms)
        })
    }

    fn parse_and(&mut self) -> Result<PlatformExpr> {
        let mut terms = vec![self.parse_unary()?];
        while self.eat(&['&']) {
            terms.push(self.parse_unary()?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            PlatformExpr::And(terms)
        })
    }

    fn parse_unary(&mut self) -> Result<PlatformExpr> {
        if self.eat(&['!']) {
            return Ok(PlatformExpr::Not(Box::new(self.parse_unary()?)));
        }
        if self.eat(&['(']) {
            let inner = self.parse_or()?;
            if !self.eat(&[')']) {
                return Err(self.error("missing ')'"));
            }
            return Ok(inner);
        }
        self.parse_ident()
    }

    fn parse_ident(&mut self) -> Result<PlatformExpr> {
        self.skip_whitespace();
        let mut ident = String::new();
        while let Some((_, c)) = self.chars.peek().copied() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                ident.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        if ident.is_empty() {
            return Err(self.error("expected identifier"));
        }
        Ok(PlatformExpr::Ident(ident))
    }
}
