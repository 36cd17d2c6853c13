//! PostgREST query construction.
//!
//! Builds the query-string parameters for a PostgREST table endpoint:
//! `select` column lists, `column=op.value` filters, `and=(...)` composite
//! filters, ordering and limits. Conditions inside a composite are taken
//! verbatim so predicate semantics stay exactly as written.

/// A PostgREST query over a single table.
#[derive(Debug, Clone)]
pub struct Query {
    table: String,
    params: Vec<(String, String)>,
}

impl Query {
    /// Creates a query against `table`.
    #[must_use]
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            params: Vec::new(),
        }
    }

    /// Sets the `select` column list.
    #[must_use]
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.params
            .push(("select".to_string(), columns.join(",")));
        self
    }

    /// Adds a `column=op.value` filter (e.g. `created_at`, `gte.2025-10-01`).
    #[must_use]
    pub fn filter(mut self, column: impl Into<String>, condition: impl Into<String>) -> Self {
        self.params.push((column.into(), condition.into()));
        self
    }

    /// Adds an `and=(...)` composite filter from verbatim conditions.
    #[must_use]
    pub fn and_filter(mut self, conditions: &[String]) -> Self {
        self.params
            .push(("and".to_string(), format!("({})", conditions.join(","))));
        self
    }

    /// Sets the `order` clause (e.g. `created_at.asc`).
    #[must_use]
    pub fn order(mut self, clause: impl Into<String>) -> Self {
        self.params.push(("order".to_string(), clause.into()));
        self
    }

    /// Sets the row `limit`.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.params.push(("limit".to_string(), limit.to_string()));
        self
    }

    /// Returns the table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Returns the query parameters for `reqwest::RequestBuilder::query`.
    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_joins_columns() {
        let q = Query::table("ai_signals").select(&["id", "created_at", "symbol"]);
        assert_eq!(q.table_name(), "ai_signals");
        assert_eq!(
            q.params(),
            &[("select".to_string(), "id,created_at,symbol".to_string())]
        );
    }

    #[test]
    fn test_and_filter_renders_composite() {
        let q = Query::table("ai_signals").and_filter(&[
            "is_virtual.eq.false".to_string(),
            "actual_result.eq.PENDING".to_string(),
            "created_at.lt.2025-10-01T00:00:00+00:00".to_string(),
        ]);
        assert_eq!(
            q.params()[0],
            (
                "and".to_string(),
                "(is_virtual.eq.false,actual_result.eq.PENDING,created_at.lt.2025-10-01T00:00:00+00:00)"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_repeated_filters_preserved_in_order() {
        let q = Query::table("ai_signals")
            .filter("created_at", "gte.2025-10-01T00:00:00+00:00")
            .filter("created_at", "lt.2025-12-01T00:00:00+00:00")
            .order("created_at.asc")
            .limit(20);
        let keys: Vec<&str> = q.params().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["created_at", "created_at", "order", "limit"]);
        assert_eq!(q.params()[3].1, "20");
    }
}
