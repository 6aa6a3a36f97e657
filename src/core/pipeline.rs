//! List-query pipeline: search, filter, order, paginate
//!
//! A [`QueryPipeline`] is static per resource: which fields are searchable,
//! which filters exist and which fields may be ordered on. Each list request
//! runs its [`QuerySpec`] through the four stages in that fixed order.
//!
//! Client mistakes never fail the request. Unknown filters and ordering
//! fields are ignored, values that do not parse disable their filter, and
//! pages past the end come back empty.

use crate::core::entity::Record;
use crate::core::field::{FieldKind, FieldValue};
use crate::core::query::{OrderBy, PagedResult, QuerySpec};
use std::cmp::Ordering;
use std::collections::HashSet;

/// How a filter compares its value with the record's
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Equal to the last supplied value (lists: contains it)
    Exact,
    /// Greater than or equal (inclusive lower bound)
    Gte,
    /// Less than or equal (inclusive upper bound)
    Lte,
    /// Equal to any supplied value; repeated and comma-separated values OR
    In,
}

/// A filter exposed as a query parameter
#[derive(Debug, Clone)]
pub struct FilterDef {
    pub param: String,
    pub field: String,
    pub lookup: Lookup,
    pub kind: FieldKind,
}

impl FilterDef {
    pub fn new(param: &str, field: &str, lookup: Lookup, kind: FieldKind) -> Self {
        Self {
            param: param.to_string(),
            field: field.to_string(),
            lookup,
            kind,
        }
    }

    /// Exact filter where the parameter is named after the field
    pub fn exact(field: &str, kind: FieldKind) -> Self {
        Self::new(field, field, Lookup::Exact, kind)
    }

    /// Parse the values supplied for this filter
    ///
    /// Returns `None` when nothing usable was supplied, which disables the
    /// filter.
    fn wanted(&self, spec: &QuerySpec) -> Option<Vec<FieldValue>> {
        let raw = spec.filter_values(&self.param);
        let values: Vec<FieldValue> = match self.lookup {
            Lookup::In => raw
                .iter()
                .flat_map(|v| v.split(','))
                .filter(|v| !v.trim().is_empty())
                .filter_map(|v| self.kind.parse(v))
                .collect(),
            _ => raw.last().and_then(|v| self.kind.parse(v)).into_iter().collect(),
        };
        (!values.is_empty()).then_some(values)
    }

    fn keep(&self, value: Option<&FieldValue>, wanted: &[FieldValue]) -> bool {
        let Some(value) = value.filter(|v| !v.is_null()) else {
            return false;
        };
        match self.lookup {
            Lookup::Exact | Lookup::In => wanted.iter().any(|w| value.matches(w)),
            Lookup::Gte => wanted
                .iter()
                .all(|w| matches!(value.compare(w), Some(Ordering::Greater | Ordering::Equal))),
            Lookup::Lte => wanted
                .iter()
                .all(|w| matches!(value.compare(w), Some(Ordering::Less | Ordering::Equal))),
        }
    }
}

/// Static list-query configuration of a resource
#[derive(Debug, Clone, Default)]
pub struct QueryPipeline {
    search_fields: Vec<String>,
    filters: Vec<FilterDef>,
    ordering_fields: Vec<String>,
}

impl QueryPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search_fields(mut self, fields: &[&str]) -> Self {
        self.search_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn add_filter(mut self, def: FilterDef) -> Self {
        self.filters.push(def);
        self
    }

    pub fn ordering_fields(mut self, fields: &[&str]) -> Self {
        self.ordering_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn filter_params(&self) -> impl Iterator<Item = &str> {
        self.filters.iter().map(|f| f.param.as_str())
    }

    /// Stage 1: case-insensitive substring match across search fields
    pub fn search<T: Record>(&self, items: Vec<T>, term: Option<&str>) -> Vec<T> {
        let Some(term) = term.map(str::to_lowercase).filter(|t| !t.is_empty()) else {
            return items;
        };
        if self.search_fields.is_empty() {
            return items;
        }
        let mut seen = HashSet::new();
        items
            .into_iter()
            .filter(|item| {
                self.search_fields.iter().any(|field| {
                    item.text_values(field)
                        .iter()
                        .any(|text| text.to_lowercase().contains(&term))
                })
            })
            .filter(|item| seen.insert(item.id()))
            .collect()
    }

    /// Stage 2: apply every declared filter the client supplied
    pub fn filter<T: Record>(&self, items: Vec<T>, spec: &QuerySpec) -> Vec<T> {
        let active: Vec<(&FilterDef, Vec<FieldValue>)> = self
            .filters
            .iter()
            .filter_map(|def| def.wanted(spec).map(|wanted| (def, wanted)))
            .collect();
        if active.is_empty() {
            return items;
        }
        items
            .into_iter()
            .filter(|item| {
                active
                    .iter()
                    .all(|(def, wanted)| def.keep(item.field_value(&def.field).as_ref(), wanted))
            })
            .collect()
    }

    /// Stage 3: stable sort on an allowed field, missing values last
    pub fn order<T: Record>(&self, mut items: Vec<T>, ordering: Option<&OrderBy>) -> Vec<T> {
        let Some(order) = ordering else {
            return items;
        };
        if !self.ordering_fields.iter().any(|f| f == &order.field) {
            tracing::debug!(field = %order.field, "ignoring unknown ordering field");
            return items;
        }
        let present = |item: &T| item.field_value(&order.field).filter(|v| !v.is_null());
        items.sort_by(|a, b| match (present(a), present(b)) {
            (Some(x), Some(y)) => {
                let ord = x.compare(&y).unwrap_or(Ordering::Equal);
                if order.descending { ord.reverse() } else { ord }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        items
    }

    /// Stage 4: cut one page out of the ordered collection
    pub fn paginate<T>(&self, items: Vec<T>, spec: &QuerySpec) -> PagedResult<T> {
        let total_count = items.len();
        if !spec.paginate {
            return PagedResult {
                items,
                page: 1,
                page_size: total_count,
                total_count,
            };
        }
        let page = spec.page.max(1);
        let page_size = spec.page_size.max(1);
        let start = (page - 1).saturating_mul(page_size);
        let items = items.into_iter().skip(start).take(page_size).collect();
        PagedResult {
            items,
            page,
            page_size,
            total_count,
        }
    }

    /// Run all four stages
    pub fn run<T: Record>(&self, items: Vec<T>, spec: &QuerySpec) -> PagedResult<T> {
        let before = items.len();
        let items = self.search(items, spec.search.as_deref());
        let items = self.filter(items, spec);
        let items = self.order(items, spec.ordering.as_ref());
        let result = self.paginate(items, spec);
        tracing::debug!(
            before,
            matched = result.total_count,
            returned = result.items.len(),
            page = result.page,
            "query pipeline"
        );
        result
    }
}

/// Run a collection through a pipeline
pub fn run_query<T: Record>(
    items: Vec<T>,
    spec: &QuerySpec,
    pipeline: &QueryPipeline,
) -> PagedResult<T> {
    pipeline.run(items, spec)
}
