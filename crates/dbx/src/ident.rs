//! MySQL identifier handling.
//!
//! Identifiers are quoted with backticks. Any backticks already present are
//! stripped first, so quoting is idempotent:
//!
//! - `users` → `` `users` ``
//! - `u.name` → ``u.`name` `` (only the right segment of a qualified name)
//! - `*` and `u.*` are left alone
//!
//! # Example
//! ```
//! use dbx::ident::{quote, split_alias};
//!
//! assert_eq!(quote("users"), "`users`");
//! assert_eq!(split_alias("users AS u"), ("users".to_string(), "u".to_string()));
//! ```

use regex::Regex;
use std::sync::LazyLock;

static AS_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[\x20\t]+as[\x20\t]+").expect("valid regex"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x20\t]+").expect("valid regex"));

/// Quote an identifier for MySQL.
///
/// Expressions (anything containing a parenthesis) pass through verbatim.
pub fn quote(name: &str) -> String {
    let name = name.trim().replace('`', "");
    if name.is_empty() || name.contains('(') {
        return name;
    }

    match name.split_once('.') {
        None if name == "*" => name,
        None => format!("`{name}`"),
        Some((left, "*")) => format!("{left}.*"),
        Some((left, right)) => format!("{left}.`{right}`"),
    }
}

/// Split `"name AS alias"` (or `"name alias"`) into its parts.
///
/// The alias is empty when none is given.
pub fn split_alias(input: &str) -> (String, String) {
    let input = input.trim();
    if input.is_empty() {
        return (String::new(), String::new());
    }

    if let Some(m) = AS_SEPARATOR.find(input) {
        let name = input[..m.start()].trim();
        let alias = input[m.end()..].trim();
        return (name.to_string(), alias.to_string());
    }

    // Expressions may contain spaces; only a trailing bare word counts as alias.
    if input.contains('(') {
        return (input.to_string(), String::new());
    }

    let mut parts = WHITESPACE.split(input);
    let name = parts.next().unwrap_or_default().to_string();
    let alias = parts.next().unwrap_or_default().to_string();
    (name, alias)
}

/// Key a selected column appears under in a result row: the alias when
/// one is given, else the last dot-segment of the name, unquoted.
pub fn result_key(column: &str) -> String {
    let (name, alias) = split_alias(column);
    let key = if alias.is_empty() {
        name.rsplit('.').next().unwrap_or_default().to_string()
    } else {
        alias
    };
    key.trim_matches('`').to_string()
}

/// Render `name [AS alias]` with the name quoted.
pub fn with_alias(name: &str, alias: &str) -> String {
    if alias.is_empty() {
        quote(name)
    } else {
        format!("{} AS {}", quote(name), alias)
    }
}

/// Parse one ORDER BY entry such as `"id desc"`.
///
/// Returns `None` for empty entries or directions other than ASC/DESC.
pub fn order_entry(entry: &str) -> Option<String> {
    let mut parts = WHITESPACE.split(entry.trim()).filter(|p| !p.is_empty());
    let column = parts.next()?;
    let direction = match parts.next() {
        Some(dir) => dir.to_uppercase(),
        None => "ASC".to_string(),
    };
    if parts.next().is_some() || !matches!(direction.as_str(), "ASC" | "DESC") {
        return None;
    }
    Some(format!("{} {}", quote(column), direction))
}

/// Strip schema qualification and backticks from a table name.
pub fn bare_table_name(name: &str) -> String {
    let name = name.trim().replace('`', "");
    match name.rsplit_once('.') {
        Some((_, table)) => table.to_string(),
        None => name,
    }
}

/// Lowercase and drop `_` / `-`, used for separator-insensitive matching.
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_plain_and_qualified() {
        assert_eq!(quote("name"), "`name`");
        assert_eq!(quote("`name`"), "`name`");
        assert_eq!(quote("u.name"), "u.`name`");
        assert_eq!(quote("u.*"), "u.*");
        assert_eq!(quote("*"), "*");
    }

    #[test]
    fn quote_leaves_expressions() {
        assert_eq!(quote("COUNT(*)"), "COUNT(*)");
    }

    #[test]
    fn result_key_prefers_alias() {
        assert_eq!(result_key("u.name"), "name");
        assert_eq!(result_key("name AS n"), "n");
        assert_eq!(result_key("u.`name` as `n`"), "n");
        assert_eq!(result_key("u.name nick"), "nick");
        assert_eq!(result_key("`score`"), "score");
    }

    #[test]
    fn split_alias_forms() {
        assert_eq!(split_alias("users as u"), ("users".into(), "u".into()));
        assert_eq!(split_alias("users  AS  u"), ("users".into(), "u".into()));
        assert_eq!(split_alias("users u"), ("users".into(), "u".into()));
        assert_eq!(split_alias(" users "), ("users".into(), "".into()));
        assert_eq!(
            split_alias("COUNT(*) AS total"),
            ("COUNT(*)".into(), "total".into())
        );
    }

    #[test]
    fn order_entry_defaults_to_asc() {
        assert_eq!(order_entry("id").as_deref(), Some("`id` ASC"));
        assert_eq!(order_entry("u.id desc").as_deref(), Some("u.`id` DESC"));
        assert_eq!(order_entry(""), None);
        assert_eq!(order_entry("id sideways"), None);
    }

    #[test]
    fn normalize_ignores_separators_and_case() {
        assert_eq!(normalize("create_time"), "createtime");
        assert_eq!(normalize("createTime"), "createtime");
        assert_eq!(normalize("user-name"), "username");
    }

    #[test]
    fn bare_table_name_strips_schema() {
        assert_eq!(bare_table_name("shop.`orders`"), "orders");
        assert_eq!(bare_table_name("orders"), "orders");
    }
}
