//! Identifier and literal quoting for dialect DDL.
//!
//! User and database names arrive from deployment configuration, and DDL
//! statements cannot take bind parameters, so every interpolated value goes
//! through these helpers. Generated passwords already exclude quote
//! characters, but the root path must not rely on that.

/// Quote a MariaDB/MySQL identifier with backticks.
pub fn mysql_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Quote a MariaDB/MySQL string literal.
///
/// Doubles single quotes and escapes backslashes, which MySQL treats as an
/// escape character inside string literals regardless of SQL mode defaults.
pub fn mysql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
}

/// Quote a PostgreSQL identifier with double quotes.
pub fn pg_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a PostgreSQL string literal.
pub fn pg_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
