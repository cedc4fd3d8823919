use std::{collections::HashMap, fmt, sync::Arc};

use miette::Result;
use tracing::debug;

use crate::{
    TableError,
    db::{
        source::{DataSource, OrderPath},
        table::{
            column_def::{ColumnDefinition, Direction},
            options::TableOptions,
            row::Cell,
            schema::ColumnRegistry,
        },
    },
    model::record::Record,
};

/// A raw ordering request: a comma separated string or a list of tokens.
///
/// Each token is a column name, optionally prefixed with `-` for descending.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OrderSpec {
    #[default]
    Natural,
    Text(String),
    Tokens(Vec<String>),
}

impl OrderSpec {
    /// Splits the request into trimmed, non-empty tokens.
    pub fn tokens(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            OrderSpec::Natural => Vec::new(),
            OrderSpec::Text(text) => text.split(',').collect(),
            OrderSpec::Tokens(tokens) => tokens.iter().map(String::as_str).collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|token| !token.is_empty() && *token != "-")
            .map(str::to_owned)
            .collect()
    }
}

impl From<&str> for OrderSpec {
    fn from(value: &str) -> Self {
        OrderSpec::Text(value.to_owned())
    }
}

impl From<String> for OrderSpec {
    fn from(value: String) -> Self {
        OrderSpec::Text(value)
    }
}

impl From<Vec<String>> for OrderSpec {
    fn from(value: Vec<String>) -> Self {
        OrderSpec::Tokens(value)
    }
}

impl From<Vec<&str>> for OrderSpec {
    fn from(value: Vec<&str>) -> Self {
        OrderSpec::Tokens(value.into_iter().map(str::to_owned).collect())
    }
}

impl From<&[&str]> for OrderSpec {
    fn from(value: &[&str]) -> Self {
        OrderSpec::Tokens(value.iter().map(|s| (*s).to_owned()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for OrderSpec {
    fn from(value: [&str; N]) -> Self {
        OrderSpec::Tokens(value.iter().map(|s| (*s).to_owned()).collect())
    }
}

impl<T: Into<OrderSpec>> From<Option<T>> for OrderSpec {
    fn from(value: Option<T>) -> Self {
        value.map_or(OrderSpec::Natural, Into::into)
    }
}

impl From<&OrderBy> for OrderSpec {
    fn from(value: &OrderBy) -> Self {
        OrderSpec::Tokens(value.iter().map(ToString::to_string).collect())
    }
}

/// One key of an ordering request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderToken {
    pub name: String,

    /// `true` when the token carried a leading `-`.
    pub reverse: bool,
}

impl OrderToken {
    pub fn parse(token: &str) -> Self {
        match token.strip_prefix('-') {
            Some(name) => Self {
                name: name.to_owned(),
                reverse: true,
            },
            None => Self {
                name: token.to_owned(),
                reverse: false,
            },
        }
    }
}

impl fmt::Display for OrderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reverse {
            write!(f, "-{}", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// A validated ordering request, kept in the form it was given.
///
/// Displays as its canonical string form (`"id,-name"`) and offers the
/// helpers used to build ordering links.
///
/// # Example
///
/// ```
/// use tablekit::OrderBy;
///
/// let order = OrderBy::parse("id,-name");
/// assert!(order.contains("name"));
/// assert_eq!(order.polarize(false, &["name"]).to_string(), "id,name");
/// assert_eq!(order.toggle(&["id", "pages"]).to_string(), "-id,-name,pages");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderBy(Vec<OrderToken>);

impl OrderBy {
    pub fn new(tokens: Vec<OrderToken>) -> Self {
        Self(tokens)
    }

    /// Parses a request without validating it against any table.
    pub fn parse(spec: impl Into<OrderSpec>) -> Self {
        Self(
            spec.into()
                .tokens()
                .iter()
                .map(|token| OrderToken::parse(token))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OrderToken> {
        self.0.iter()
    }

    /// The token naming `name`, with or without a `-` prefix.
    pub fn get(&self, name: &str) -> Option<&OrderToken> {
        self.0.iter().find(|token| token.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Sets the polarity of the named keys, appending those not yet present.
    pub fn polarize(&self, reverse: bool, names: &[&str]) -> OrderBy {
        let mut tokens = self.0.clone();
        for name in names {
            match tokens.iter_mut().find(|token| token.name == *name) {
                Some(token) => token.reverse = reverse,
                None => tokens.push(OrderToken {
                    name: (*name).to_owned(),
                    reverse,
                }),
            }
        }
        OrderBy(tokens)
    }

    /// Flips the polarity of the named keys, appending missing ones ascending.
    pub fn toggle(&self, names: &[&str]) -> OrderBy {
        let mut tokens = self.0.clone();
        for name in names {
            match tokens.iter_mut().find(|token| token.name == *name) {
                Some(token) => token.reverse = !token.reverse,
                None => tokens.push(OrderToken {
                    name: (*name).to_owned(),
                    reverse: false,
                }),
            }
        }
        OrderBy(tokens)
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join(","))
    }
}

impl<'a> IntoIterator for &'a OrderBy {
    type Item = &'a OrderToken;
    type IntoIter = std::slice::Iter<'a, OrderToken>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A resolved ordering key: a column and the direction it sorts in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderKey {
    pub name: String,
    pub direction: Direction,
}

impl OrderKey {
    pub fn new(name: &str, direction: Direction) -> Self {
        Self {
            name: name.to_owned(),
            direction,
        }
    }
}

/// Validates ordering requests against a registry and source, and sorts
/// snapshot rows.
pub struct OrderingEngine<'a> {
    registry: &'a ColumnRegistry,
    options: &'a TableOptions,
    source: &'a dyn DataSource,
}

impl<'a> OrderingEngine<'a> {
    pub fn new(
        registry: &'a ColumnRegistry,
        options: &'a TableOptions,
        source: &'a dyn DataSource,
    ) -> Self {
        Self {
            registry,
            options,
            source,
        }
    }

    /// Whether `column` may be used as an ordering key.
    ///
    /// The column must be accessible and sortable (its own flag, else the
    /// table default). For sources that order themselves, every backing path
    /// must also be orderable by the source; this is decided before any
    /// record is touched.
    pub fn is_sortable(&self, column: &ColumnDefinition) -> bool {
        if !column.is_accessible() || !self.options.effective_sortable(column.sortable_flag()) {
            return false;
        }
        if self.source.supports_native_ordering() {
            return column
                .order_paths()
                .iter()
                .all(|path| self.source.can_order_by(path));
        }
        true
    }

    /// Splits a request into the tokens that survive validation and the
    /// tokens that were rejected.
    pub fn validate(&self, spec: &OrderSpec) -> (OrderBy, Vec<String>) {
        let mut kept = Vec::new();
        let mut rejected = Vec::new();

        for raw in spec.tokens() {
            let token = OrderToken::parse(&raw);
            let valid = self
                .registry
                .get(&token.name)
                .is_some_and(|column| self.is_sortable(column));

            if valid {
                kept.push(token);
            } else {
                debug!(token = %raw, "dropping invalid ordering token");
                rejected.push(raw);
            }
        }

        (OrderBy(kept), rejected)
    }

    /// Assigns each token its effective direction.
    ///
    /// Without a prefix the column's default direction applies; a `-` prefix
    /// reverses it. Tokens naming unknown columns are skipped.
    pub fn resolve(&self, order_by: &OrderBy) -> Vec<OrderKey> {
        order_by
            .iter()
            .filter_map(|token| {
                let column = self.registry.get(&token.name)?;
                let direction = if token.reverse {
                    column.direction().reversed()
                } else {
                    column.direction()
                };
                Some(OrderKey::new(&token.name, direction))
            })
            .collect()
    }

    /// Translates resolved keys into backing paths for native ordering.
    pub fn native_paths(&self, keys: &[OrderKey]) -> Vec<OrderPath> {
        keys.iter()
            .filter_map(|key| self.registry.get(&key.name).map(|column| (column, key.direction)))
            .flat_map(|(column, direction)| {
                column
                    .order_paths()
                    .into_iter()
                    .map(move |path| OrderPath::new(path, direction))
            })
            .collect()
    }

    /// Stable multi-key sort of resolved rows.
    ///
    /// The first key is primary; ties fall through to later keys and finally
    /// keep their original relative order.
    ///
    /// # Errors
    ///
    /// Returns the resolution error of the first row whose key cell failed.
    pub(crate) fn sort(
        &self,
        rows: &mut [(Arc<Record>, Arc<[Cell]>)],
        keys: &[OrderKey],
    ) -> Result<(), TableError> {
        let indexed: Vec<(usize, Direction)> = keys
            .iter()
            .filter_map(|key| {
                self.registry
                    .index_of(&key.name)
                    .map(|index| (index, key.direction))
            })
            .collect();

        for (_, cells) in rows.iter() {
            for (index, _) in &indexed {
                match &cells[*index] {
                    Cell::Failed(err) => return Err(err.clone()),
                    Cell::Inaccessible => {
                        let name = self
                            .registry
                            .get_index(*index)
                            .map(|column| column.name().to_string())
                            .unwrap_or_default();
                        return Err(TableError::Access(name));
                    }
                    Cell::Value(_) => {}
                }
            }
        }

        rows.sort_by(|(_, left), (_, right)| {
            for (index, direction) in &indexed {
                let ordering = match (&left[*index], &right[*index]) {
                    (Cell::Value(a), Cell::Value(b)) => a.sort_cmp(b),
                    _ => std::cmp::Ordering::Equal,
                };
                if ordering.is_ne() {
                    return direction.apply(ordering);
                }
            }
            std::cmp::Ordering::Equal
        });

        Ok(())
    }
}

/// Builds an ordering request from query parameters.
///
/// Reads `param` from `query`; when `secondary` is given and the requested
/// key does not already name it, it is appended as a tie-breaker.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use tablekit::{OrderSpec, order_by_param};
///
/// let query = HashMap::from([("sort".to_string(), "-name".to_string())]);
/// assert_eq!(
///     order_by_param(&query, "sort", Some("id")),
///     OrderSpec::from(vec!["-name", "id"])
/// );
/// assert_eq!(order_by_param(&query, "sort", Some("name")), OrderSpec::from("-name"));
/// assert_eq!(order_by_param(&query, "missing", Some("id")), OrderSpec::Natural);
/// ```
pub fn order_by_param(
    query: &HashMap<String, String>,
    param: &str,
    secondary: Option<&str>,
) -> OrderSpec {
    let Some(order_by) = query.get(param).filter(|value| !value.is_empty()) else {
        return OrderSpec::Natural;
    };

    match secondary {
        Some(secondary) if order_by.trim_start_matches('-') != secondary => {
            OrderSpec::Tokens(vec![order_by.clone(), secondary.to_owned()])
        }
        _ => OrderSpec::Text(order_by.clone()),
    }
}
