use proc_macro2::Span;
use syn::{Error, LitStr, Result};

pub(crate) fn is_valid_sql_ident(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate an annotated column name such as `#[orm(column = "user_name")]`.
pub(crate) fn parse_sql_ident(lit: &LitStr, what: &str) -> Result<String> {
    parse_sql_ident_with_span(lit.value().trim(), lit.span(), what)
}

fn parse_sql_ident_with_span(s: &str, span: Span, what: &str) -> Result<String> {
    if s.is_empty() {
        return Err(Error::new(span, format!("{what} must not be empty")));
    }
    if !is_valid_sql_ident(s) {
        return Err(Error::new(
            span,
            format!("{what} must be a valid SQL identifier (expected [A-Za-z_][A-Za-z0-9_]*)"),
        ));
    }
    Ok(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        assert!(is_valid_sql_ident("user_name"));
        assert!(is_valid_sql_ident("_x1"));
        assert!(!is_valid_sql_ident("1abc"));
        assert!(!is_valid_sql_ident("a.b"));
        assert!(!is_valid_sql_ident(""));
    }

    #[test]
    fn rejects_blank_column() {
        let lit = LitStr::new("  ", Span::call_site());
        assert!(parse_sql_ident(&lit, "column").is_err());
    }
}
