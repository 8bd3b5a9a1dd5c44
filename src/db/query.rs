//! Table-scoped PostgREST requests.
//!
//! Filters, ordering and limits become query parameters
//! (`id=eq.42`, `deleted_at=is.null`, `order=created_at.desc`). Mutations ask
//! for `return=representation` unless [`QueryBuilder::return_minimal`] is set;
//! pair that with [`QueryBuilder::count_exact`] to learn how many rows changed
//! when the changed rows may no longer be readable.

use std::fmt::Display;

use reqwest::{Method, Request};
use serde_json::Value;
use strum::IntoStaticStr;

use super::client::TenantClient;
use super::response::PostgrestResponse;
use crate::core::error::{Result, TenantbaseError};
use crate::utils::identifier_problem;


#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum FilterOperator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Is,
    In,
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub operator: FilterOperator,
    pub negated: bool,
    pub value: String,
}

impl Filter {
    /// Query parameter value, e.g. `eq.42` or `not.is.null`.
    pub fn encode(&self) -> String {
        let op: &'static str = self.operator.into();
        if self.negated {
            format!("not.{}.{}", op, self.value)
        } else {
            format!("{}.{}", op, self.value)
        }
    }
}


#[derive(Debug, Clone)]
enum Action {
    Select(String),
    Insert(Value),
    Update(Value),
    Delete,
}

impl Action {
    fn method(&self) -> Method {
        match self {
            Action::Select(_) => Method::GET,
            Action::Insert(_) => Method::POST,
            Action::Update(_) => Method::PATCH,
            Action::Delete => Method::DELETE,
        }
    }

    fn is_mutation(&self) -> bool {
        !matches!(self, Action::Select(_))
    }
}


pub struct QueryBuilder<'a> {
    client: &'a TenantClient,
    table: String,
    action: Action,
    filters: Vec<Filter>,
    order: Vec<(String, bool)>,
    limit: Option<usize>,
    count_exact: bool,
    return_minimal: bool,
    invalid: Option<String>,
}

impl<'a> QueryBuilder<'a> {
    pub(crate) fn new(client: &'a TenantClient, table: &str) -> Self {
        Self {
            client,
            table: table.to_string(),
            action: Action::Select("*".to_string()),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
            count_exact: false,
            return_minimal: false,
            invalid: None,
        }
    }

    pub fn select(mut self, columns: &str) -> Self {
        let columns = columns.trim();
        self.action = Action::Select(if columns.is_empty() { "*".to_string() } else { columns.to_string() });
        self
    }

    pub fn insert(mut self, row: Value) -> Self {
        self.action = Action::Insert(row);
        self
    }

    pub fn update(mut self, patch: Value) -> Self {
        self.action = Action::Update(patch);
        self
    }

    pub fn delete(mut self) -> Self {
        self.action = Action::Delete;
        self
    }

    pub fn eq(self, column: &str, value: impl Display) -> Self {
        self.filter(column, FilterOperator::Eq, false, value.to_string())
    }

    pub fn neq(self, column: &str, value: impl Display) -> Self {
        self.filter(column, FilterOperator::Neq, false, value.to_string())
    }

    pub fn gt(self, column: &str, value: impl Display) -> Self {
        self.filter(column, FilterOperator::Gt, false, value.to_string())
    }

    pub fn gte(self, column: &str, value: impl Display) -> Self {
        self.filter(column, FilterOperator::Gte, false, value.to_string())
    }

    pub fn lt(self, column: &str, value: impl Display) -> Self {
        self.filter(column, FilterOperator::Lt, false, value.to_string())
    }

    pub fn lte(self, column: &str, value: impl Display) -> Self {
        self.filter(column, FilterOperator::Lte, false, value.to_string())
    }

    pub fn is_null(self, column: &str) -> Self {
        self.filter(column, FilterOperator::Is, false, "null".to_string())
    }

    pub fn not_null(self, column: &str) -> Self {
        self.filter(column, FilterOperator::Is, true, "null".to_string())
    }

    pub fn in_list<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Display,
    {
        let items: Vec<String> = values
            .into_iter()
            .map(|v| quote_list_item(&v.to_string()))
            .collect();
        self.filter(column, FilterOperator::In, false, format!("({})", items.join(",")))
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        if let Some(reason) = identifier_problem("order column", column) {
            self.invalid.get_or_insert(reason);
            return self;
        }
        self.order.push((column.to_string(), ascending));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Asks the service for the total row count (`Prefer: count=exact`).
    pub fn count_exact(mut self) -> Self {
        self.count_exact = true;
        self
    }

    /// Mutations return no rows (`Prefer: return=minimal`).
    pub fn return_minimal(mut self) -> Self {
        self.return_minimal = true;
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    fn filter(mut self, column: &str, operator: FilterOperator, negated: bool, value: String) -> Self {
        if let Some(reason) = identifier_problem("filter column", column) {
            self.invalid.get_or_insert(reason);
            return self;
        }
        self.filters.push(Filter {
            column: column.to_string(),
            operator,
            negated,
            value,
        });
        self
    }

    /// Builds the outbound request without sending it.
    pub fn build(&self) -> Result<Request> {
        if let Some(reason) = &self.invalid {
            return Err(TenantbaseError::InvalidArgument(reason.clone()));
        }
        if matches!(self.action, Action::Update(_) | Action::Delete) && self.filters.is_empty() {
            return Err(TenantbaseError::InvalidArgument(format!(
                "refusing unfiltered {} on {}",
                self.action.method(),
                self.table
            )));
        }

        let mut url = self.client.rest_url(&self.table)?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Action::Select(columns) = &self.action {
                pairs.append_pair("select", columns);
            }
            for filter in &self.filters {
                pairs.append_pair(&filter.column, &filter.encode());
            }
            if !self.order.is_empty() {
                let order: Vec<String> = self
                    .order
                    .iter()
                    .map(|(column, asc)| format!("{}.{}", column, if *asc { "asc" } else { "desc" }))
                    .collect();
                pairs.append_pair("order", &order.join(","));
            }
            if let Some(limit) = self.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        let mut prefer = Vec::new();
        if self.action.is_mutation() {
            prefer.push(if self.return_minimal { "return=minimal" } else { "return=representation" });
        }
        if self.count_exact {
            prefer.push("count=exact");
        }

        let body = match &self.action {
            Action::Insert(row) | Action::Update(row) => Some(row),
            _ => None,
        };
        self.client.build_request(self.action.method(), url, body, &prefer)
    }

    pub async fn execute(self) -> Result<PostgrestResponse> {
        let request = self.build()?;
        self.client.execute(request).await
    }
}

/// Values inside `in.(...)` that contain reserved characters must be double-quoted.
fn quote_list_item(raw: &str) -> String {
    if raw.contains([',', '(', ')', '"', '\\', ' ']) {
        format!("\"{}\"", raw.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        raw.to_string()
    }
}
