//! Declarative filter specifications shared by every listing and export endpoint.

use std::collections::{HashMap, HashSet};

/// Date bucket accepted by `DateRange` filters.
///
/// The cutoff is evaluated by the database clock at query time, never by the
/// application host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRange {
    Today,
    Last7Days,
    Last30Days,
}

impl DateRange {
    /// Parse a request value. Unknown buckets yield `None` and are treated as
    /// an absent filter.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "today" => Some(Self::Today),
            "last7" => Some(Self::Last7Days),
            "last30" => Some(Self::Last30Days),
            _ => None,
        }
    }

    /// Number of days subtracted from "now" (zero means "since midnight").
    pub fn days(self) -> i64 {
        match self {
            Self::Today => 0,
            Self::Last7Days => 7,
            Self::Last30Days => 30,
        }
    }

    /// SQL predicate comparing `column` against the database clock.
    pub fn predicate(self, column: &str) -> String {
        match self {
            Self::Today => format!("{column} >= CURRENT_DATE"),
            Self::Last7Days | Self::Last30Days => {
                format!("{column} >= NOW() - INTERVAL '{} days'", self.days())
            }
        }
    }
}

/// Comparison applied by a filter field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Equals,
    Like,
    DateRange,
}

/// One recognized request parameter and the column it narrows.
#[derive(Debug, Clone, Copy)]
pub struct FilterField {
    pub param: &'static str,
    pub column: &'static str,
    pub operator: FilterOperator,
    pub required: bool,
}

impl FilterField {
    pub const fn like(param: &'static str, column: &'static str) -> Self {
        Self {
            param,
            column,
            operator: FilterOperator::Like,
            required: false,
        }
    }

    pub const fn equals(param: &'static str, column: &'static str) -> Self {
        Self {
            param,
            column,
            operator: FilterOperator::Equals,
            required: false,
        }
    }

    pub const fn date_range(param: &'static str, column: &'static str) -> Self {
        Self {
            param,
            column,
            operator: FilterOperator::DateRange,
            required: false,
        }
    }
}

/// Exported column with its human-readable CSV header.
#[derive(Debug, Clone, Copy)]
pub struct ExportColumn {
    pub column: &'static str,
    pub header: &'static str,
}

/// Everything the listing engine needs to know about one entity.
#[derive(Debug)]
pub struct EntitySpec {
    /// Short name used in logs and export filenames.
    pub name: &'static str,
    pub table: &'static str,
    /// Columns selected by list and export queries, in output order.
    pub columns: &'static [&'static str],
    pub filters: &'static [FilterField],
    /// Ascending sort keys; must make the order total for stable paging.
    pub order_by: &'static [&'static str],
    pub page_size: i64,
    pub export: &'static [ExportColumn],
}

/// Listing configuration defects. These are programming bugs and are caught
/// at startup, never produced by request input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpecError {
    #[error("{entity}: filter '{param}' references unknown column '{column}'")]
    UnknownFilterColumn {
        entity: &'static str,
        param: &'static str,
        column: &'static str,
    },

    #[error("{entity}: no filter named '{param}'")]
    UnknownFilter {
        entity: &'static str,
        param: &'static str,
    },

    #[error("{entity}: filter parameter '{param}' declared twice")]
    DuplicateParam {
        entity: &'static str,
        param: &'static str,
    },

    #[error("{entity}: order column '{column}' is not selected")]
    UnknownOrderColumn {
        entity: &'static str,
        column: &'static str,
    },

    #[error("{entity}: export column '{column}' is not selected")]
    UnknownExportColumn {
        entity: &'static str,
        column: &'static str,
    },

    #[error("{entity}: page size must be positive, got {page_size}")]
    InvalidPageSize { entity: &'static str, page_size: i64 },

    #[error("{entity}: no sort order declared")]
    MissingOrder { entity: &'static str },

    #[error("statement has {placeholders} placeholders but {params} parameters")]
    PlaceholderMismatch { placeholders: usize, params: usize },
}

impl EntitySpec {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| *c == column)
    }

    pub fn filter(&self, param: &str) -> Option<&FilterField> {
        self.filters.iter().find(|f| f.param == param)
    }

    /// Check the declaration for internal consistency.
    pub fn validate(&self) -> Result<(), SpecError> {
        if self.page_size <= 0 {
            return Err(SpecError::InvalidPageSize {
                entity: self.name,
                page_size: self.page_size,
            });
        }

        let mut seen = HashSet::new();
        for field in self.filters {
            if !seen.insert(field.param) {
                return Err(SpecError::DuplicateParam {
                    entity: self.name,
                    param: field.param,
                });
            }
            if !self.has_column(field.column) {
                return Err(SpecError::UnknownFilterColumn {
                    entity: self.name,
                    param: field.param,
                    column: field.column,
                });
            }
        }

        if self.order_by.is_empty() {
            return Err(SpecError::MissingOrder { entity: self.name });
        }
        if let Some(column) = self.order_by.iter().copied().find(|c| !self.has_column(c)) {
            return Err(SpecError::UnknownOrderColumn {
                entity: self.name,
                column,
            });
        }
        if let Some(col) = self.export.iter().find(|c| !self.has_column(c.column)) {
            return Err(SpecError::UnknownExportColumn {
                entity: self.name,
                column: col.column,
            });
        }

        Ok(())
    }
}

/// Recognized, non-empty filter values extracted once per request.
///
/// Values are kept in the entity's declared filter order, so two requests
/// with the same effective filters compare equal regardless of how the raw
/// parameters were ordered or whether blanks were sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterValues {
    values: Vec<(&'static str, String)>,
}

impl FilterValues {
    /// Keep only parameters the entity declares. Blank values and unknown
    /// date buckets are dropped; unrecognized parameters are ignored.
    pub fn extract(spec: &EntitySpec, raw: &HashMap<String, String>) -> Self {
        let values = spec
            .filters
            .iter()
            .filter_map(|field| {
                let value = raw.get(field.param)?.trim();
                if value.is_empty() {
                    return None;
                }
                if field.operator == FilterOperator::DateRange && DateRange::parse(value).is_none() {
                    return None;
                }
                Some((field.param, value.to_string()))
            })
            .collect();

        Self { values }
    }

    pub fn get(&self, param: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(p, _)| *p == param)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.values.iter().map(|(p, v)| (*p, v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// First required filter of `spec` that is absent, if any.
    pub fn missing_required(&self, spec: &EntitySpec) -> Option<&'static str> {
        spec.filters
            .iter()
            .find(|f| f.required && self.get(f.param).is_none())
            .map(|f| f.param)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static WIDGETS: EntitySpec = EntitySpec {
        name: "widgets",
        table: "widgets",
        columns: &["name", "colour", "created_at"],
        filters: &[
            FilterField::like("search", "name"),
            FilterField::equals("colour", "colour"),
            FilterField::date_range("date_filter", "created_at"),
        ],
        order_by: &["name"],
        page_size: 15,
        export: &[ExportColumn {
            column: "name",
            header: "Name",
        }],
    };

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn extract_ignores_unknown_params() {
        let values = FilterValues::extract(&WIDGETS, &params(&[("search", "jo"), ("page", "users")]));
        assert_eq!(values.len(), 1);
        assert_eq!(values.get("search"), Some("jo"));
        assert_eq!(values.get("page"), None);
    }

    #[test]
    fn blank_values_are_absent() {
        let omitted = FilterValues::extract(&WIDGETS, &params(&[("search", "jo")]));
        let blank = FilterValues::extract(
            &WIDGETS,
            &params(&[("search", "jo"), ("colour", ""), ("date_filter", "   ")]),
        );
        assert_eq!(omitted, blank);
    }

    #[test]
    fn values_are_trimmed() {
        let values = FilterValues::extract(&WIDGETS, &params(&[("colour", "  red ")]));
        assert_eq!(values.get("colour"), Some("red"));
    }

    #[test]
    fn unknown_date_bucket_is_dropped() {
        let values = FilterValues::extract(&WIDGETS, &params(&[("date_filter", "last90")]));
        assert!(values.is_empty());

        let values = FilterValues::extract(&WIDGETS, &params(&[("date_filter", "last7")]));
        assert_eq!(values.get("date_filter"), Some("last7"));
    }

    #[test]
    fn values_follow_declared_order() {
        let values = FilterValues::extract(
            &WIDGETS,
            &params(&[("date_filter", "today"), ("colour", "red"), ("search", "a")]),
        );
        let order: Vec<_> = values.iter().map(|(p, _)| p).collect();
        assert_eq!(order, vec!["search", "colour", "date_filter"]);
    }

    #[test]
    fn date_range_predicates_use_database_clock() {
        assert_eq!(DateRange::Today.predicate("d"), "d >= CURRENT_DATE");
        assert_eq!(
            DateRange::Last7Days.predicate("d"),
            "d >= NOW() - INTERVAL '7 days'"
        );
        assert_eq!(
            DateRange::Last30Days.predicate("d"),
            "d >= NOW() - INTERVAL '30 days'"
        );
    }

    #[test]
    fn validate_accepts_consistent_spec() {
        assert_eq!(WIDGETS.validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_unknown_filter_column() {
        const FILTERS: &[FilterField] = &[FilterField::equals("size", "size")];
        let spec = EntitySpec {
            filters: FILTERS,
            ..spec_like(&WIDGETS)
        };
        assert!(matches!(
            spec.validate(),
            Err(SpecError::UnknownFilterColumn { column: "size", .. })
        ));
    }

    #[test]
    fn validate_rejects_duplicate_param() {
        const FILTERS: &[FilterField] = &[
            FilterField::equals("colour", "colour"),
            FilterField::like("colour", "name"),
        ];
        let spec = EntitySpec {
            filters: FILTERS,
            ..spec_like(&WIDGETS)
        };
        assert!(matches!(
            spec.validate(),
            Err(SpecError::DuplicateParam { param: "colour", .. })
        ));
    }

    #[test]
    fn validate_rejects_bad_page_size_and_order() {
        let spec = EntitySpec {
            page_size: 0,
            ..spec_like(&WIDGETS)
        };
        assert!(matches!(spec.validate(), Err(SpecError::InvalidPageSize { .. })));

        const ORDER: &[&str] = &["weight"];
        let spec = EntitySpec {
            order_by: ORDER,
            ..spec_like(&WIDGETS)
        };
        assert!(matches!(
            spec.validate(),
            Err(SpecError::UnknownOrderColumn { column: "weight", .. })
        ));
    }

    #[test]
    fn missing_required_filter_is_reported() {
        const FILTERS: &[FilterField] = &[FilterField {
            required: true,
            ..FilterField::equals("colour", "colour")
        }];
        let spec = EntitySpec {
            filters: FILTERS,
            ..spec_like(&WIDGETS)
        };
        let values = FilterValues::extract(&spec, &params(&[("colour", " ")]));
        assert_eq!(values.missing_required(&spec), Some("colour"));
    }

    fn spec_like(base: &EntitySpec) -> EntitySpec {
        EntitySpec {
            name: base.name,
            table: base.table,
            columns: base.columns,
            filters: base.filters,
            order_by: base.order_by,
            page_size: base.page_size,
            export: base.export,
        }
    }
}
