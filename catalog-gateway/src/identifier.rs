//! Schema and table name validation
//!
//! Identifiers cannot be bound as query parameters, so they have to be
//! written into the SQL text. [`Identifier`] is the only way a request-supplied
//! name reaches SQL: it can only be built by [`validate`], and it only renders
//! double-quoted.

use std::fmt;

use crate::error::{GatewayError, Result};

/// PostgreSQL truncates identifiers longer than NAMEDATALEN - 1 bytes
pub const MAX_IDENTIFIER_LENGTH: usize = 63;

/// What an identifier names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Schema,
    Table,
    Column,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema => write!(f, "schema"),
            Self::Table => write!(f, "table"),
            Self::Column => write!(f, "column"),
        }
    }
}

/// A name that passed [`validate`]
///
/// Holds the case-folded form. Unquoted PostgreSQL identifiers fold to lower
/// case, so `Orders` and `orders` name the same table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    name: String,
}

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Render for interpolation into SQL text
    ///
    /// The grammar excludes `"`, so wrapping in double quotes cannot be
    /// escaped from. Quoting also keeps reserved words like `order` usable.
    pub fn render(&self) -> String {
        format!("\"{}\"", self.name)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A table, optionally qualified by its schema
///
/// Without a schema the table resolves through the session's `search_path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedTable {
    pub schema: Option<Identifier>,
    pub table: Identifier,
}

impl QualifiedTable {
    /// Validate a table name and an optional schema name together
    pub fn parse(schema: Option<&str>, table: &str) -> Result<Self> {
        let schema = schema
            .map(|raw| validate(raw, IdentifierKind::Schema))
            .transpose()?;
        let table = validate(table, IdentifierKind::Table)?;
        Ok(Self { schema, table })
    }

    pub fn render(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema.render(), self.table.render()),
            None => self.table.render(),
        }
    }
}

impl fmt::Display for QualifiedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.table),
            None => write!(f, "{}", self.table),
        }
    }
}

/// Validate a raw schema, table or column name
///
/// Accepts `[A-Za-z_][A-Za-z0-9_]*` up to [`MAX_IDENTIFIER_LENGTH`] bytes and
/// returns it folded to lower case. Rejection reasons describe the problem
/// and its byte position but never repeat the input.
pub fn validate(raw: &str, kind: IdentifierKind) -> Result<Identifier> {
    if raw.is_empty() {
        return Err(GatewayError::invalid_identifier(kind, "must not be empty"));
    }

    if raw.len() > MAX_IDENTIFIER_LENGTH {
        return Err(GatewayError::invalid_identifier(
            kind,
            format!(
                "longer than {} bytes (got {})",
                MAX_IDENTIFIER_LENGTH,
                raw.len()
            ),
        ));
    }

    if let Some(position) = raw.find("--").or_else(|| raw.find("/*")) {
        return Err(GatewayError::invalid_identifier(
            kind,
            format!("contains a SQL comment sequence at byte {}", position),
        ));
    }

    for (position, character) in raw.char_indices() {
        let allowed = if position == 0 {
            character.is_ascii_alphabetic() || character == '_'
        } else {
            character.is_ascii_alphanumeric() || character == '_'
        };

        if allowed {
            continue;
        }

        let what = match character {
            c if c.is_whitespace() => "whitespace",
            '"' | '\'' | '`' => "a quote",
            ';' => "a semicolon",
            c if c.is_ascii_digit() => "a leading digit",
            _ => "a disallowed character",
        };

        return Err(GatewayError::invalid_identifier(
            kind,
            format!("contains {} at byte {}", what, position),
        ));
    }

    Ok(Identifier {
        name: raw.to_ascii_lowercase(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejection(raw: &str) -> String {
        match validate(raw, IdentifierKind::Table) {
            Err(GatewayError::InvalidIdentifier { reason, .. }) => reason,
            other => panic!("expected InvalidIdentifier, got {:?}", other),
        }
    }

    #[test]
    fn test_accepts_grammar() {
        for name in ["users", "_private", "order_items_2024", "a", "T1"] {
            let identifier = validate(name, IdentifierKind::Table).unwrap();
            assert_eq!(identifier.as_str(), name.to_ascii_lowercase());
        }
    }

    #[test]
    fn test_folds_to_lower_case() {
        let identifier = validate("Public", IdentifierKind::Schema).unwrap();
        assert_eq!(identifier.as_str(), "public");
        assert_eq!(identifier.render(), "\"public\"");
    }

    #[test]
    fn test_length_bound() {
        let longest = "a".repeat(MAX_IDENTIFIER_LENGTH);
        assert!(validate(&longest, IdentifierKind::Table).is_ok());

        let too_long = "a".repeat(MAX_IDENTIFIER_LENGTH + 1);
        assert!(rejection(&too_long).contains("longer than 63 bytes"));
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(rejection(""), "must not be empty");
    }

    #[test]
    fn test_rejects_injection_markers() {
        let hostile = [
            "users; DROP TABLE users",
            "users;",
            "users\"",
            "\"users\"",
            "o'brien",
            "users--",
            "users/*x*/",
            "users`",
            "a b",
            "tab\tle",
            "new\nline",
        ];

        for raw in hostile {
            assert!(
                validate(raw, IdentifierKind::Table).is_err(),
                "{:?} should be rejected",
                raw
            );
            assert!(validate(raw, IdentifierKind::Schema).is_err());
        }
    }

    #[test]
    fn test_rejection_reasons_do_not_echo_input() {
        let reason = rejection("users; DROP TABLE users");
        assert_eq!(reason, "contains a semicolon at byte 5");
        assert!(!reason.contains("DROP"));

        assert_eq!(rejection("x--y"), "contains a SQL comment sequence at byte 1");
        assert_eq!(rejection("my table"), "contains whitespace at byte 2");
        assert_eq!(rejection("1st"), "contains a leading digit at byte 0");
        assert_eq!(rejection("na\u{ef}ve"), "contains a disallowed character at byte 2");
    }

    #[test]
    fn test_qualified_table_rendering() {
        let table = QualifiedTable::parse(Some("Sales"), "Orders").unwrap();
        assert_eq!(table.render(), "\"sales\".\"orders\"");
        assert_eq!(table.to_string(), "sales.orders");

        let table = QualifiedTable::parse(None, "order").unwrap();
        assert_eq!(table.render(), "\"order\"");
    }

    #[test]
    fn test_qualified_table_rejects_bad_schema() {
        let error = QualifiedTable::parse(Some("public;"), "users").unwrap_err();
        assert!(matches!(
            error,
            GatewayError::InvalidIdentifier {
                kind: IdentifierKind::Schema,
                ..
            }
        ));
    }
}
