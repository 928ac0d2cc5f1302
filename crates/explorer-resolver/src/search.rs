//! CQL2 text filter assembly for the catalog search endpoint.

/// Build a parenthesized OR group: `(field='a' or field='b')`.
///
/// Returns `None` for an empty value set so callers never emit a malformed
/// query fragment; single quotes inside values are doubled per CQL2 text
/// escaping.
pub fn or_group<'a>(field: &str, values: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let clauses: Vec<String> = values
        .into_iter()
        .map(|value| format!("{}='{}'", field, value.replace('\'', "''")))
        .collect();
    if clauses.is_empty() {
        return None;
    }
    Some(format!("({})", clauses.join(" or ")))
}

/// Join filter clauses with `AND`, skipping absent ones.
pub fn and_join(clauses: impl IntoIterator<Item = Option<String>>) -> String {
    clauses
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" AND ")
}
