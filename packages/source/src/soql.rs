//! `SoQL` query construction.
//!
//! Socrata endpoints take their query as `$`-prefixed parameters
//! (`$select`, `$where`, `$group`, `$order`, `$limit`, `$offset`). [`SoqlQuery`]
//! collects those clauses and hands them to `reqwest` as a query string so
//! values are percent-encoded in one place.

/// A `SoQL` query against one Socrata resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoqlQuery {
    select: Option<String>,
    conditions: Vec<String>,
    group: Option<String>,
    order: Option<String>,
    limit: Option<u32>,
    offset: Option<u32>,
}

impl SoqlQuery {
    /// Creates an empty query (all columns, all rows, server default limit).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn select(mut self, select: impl Into<String>) -> Self {
        self.select = Some(select.into());
        self
    }

    /// Adds `column = 'value'`. Conditions are joined with `AND`.
    #[must_use]
    pub fn where_eq(mut self, column: &str, value: &str) -> Self {
        self.conditions
            .push(format!("{column} = {}", literal(value)));
        self
    }

    /// Adds `column != 'value'`.
    #[must_use]
    pub fn where_not_eq(mut self, column: &str, value: &str) -> Self {
        self.conditions
            .push(format!("{column} != {}", literal(value)));
        self
    }

    #[must_use]
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    #[must_use]
    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips the first `offset` rows. Paging needs a stable `$order`.
    #[must_use]
    pub const fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns the `$where` clause, if any conditions were added.
    #[must_use]
    pub fn where_clause(&self) -> Option<String> {
        if self.conditions.is_empty() {
            None
        } else {
            Some(self.conditions.join(" AND "))
        }
    }

    /// Returns the query as ordered `(name, value)` parameters.
    #[must_use]
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(select) = &self.select {
            params.push(("$select", select.clone()));
        }
        if let Some(clause) = self.where_clause() {
            params.push(("$where", clause));
        }
        if let Some(group) = &self.group {
            params.push(("$group", group.clone()));
        }
        if let Some(order) = &self.order {
            params.push(("$order", order.clone()));
        }
        if let Some(limit) = self.limit {
            params.push(("$limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            params.push(("$offset", offset.to_string()));
        }
        params
    }
}

/// Quotes a value as a `SoQL` string literal, doubling embedded quotes.
#[must_use]
pub fn literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
