use serde::Deserialize;
use thiserror::Error;

/// Signals that a filter request carried no recognized constraint.
///
/// The caller must not run a query in this case; the legacy route answers
/// with a not-found response instead of "all records".
#[derive(Debug, Error, PartialEq, Eq)]
#[error("no recognized filter parameter supplied")]
pub struct EmptyFilter;

/// Optional equality constraints accepted by the filter endpoint.
///
/// Values arrive as uninterpreted text straight from the query string, so an
/// `id` constraint compares via SQLite's column affinity rather than a parsed
/// integer. This is a direct equality predicate, not a range or pattern
/// filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookFilter {
    pub id: Option<String>,
    pub published: Option<String>,
    pub author: Option<String>,
}

impl BookFilter {
    /// Build the SQL WHERE clause and bound values for this filter.
    ///
    /// Recognized keys are visited in a fixed order (id, published, author);
    /// each present, non-empty value contributes one `column = ?` clause, and
    /// clauses are joined with AND. Values are only ever bound, never spliced
    /// into the SQL text.
    pub fn to_sql_where(&self) -> Result<(String, Vec<String>), EmptyFilter> {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        for (column, value) in [
            ("id", &self.id),
            ("published", &self.published),
            ("author", &self.author),
        ] {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                conditions.push(format!("{} = ?", column));
                params.push(value.to_string());
            }
        }

        if conditions.is_empty() {
            return Err(EmptyFilter);
        }

        Ok((conditions.join(" AND "), params))
    }
}
