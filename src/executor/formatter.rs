//! Result formatters
//!
//! Convert raw search results into the query's return format. When the
//! projection holds identity fields only, the store returned bare
//! identity pairs and the formatters read straight from them.

use std::collections::BTreeMap;

use serde_json::Value;

use super::result::{ReturnFormat, Row};
use crate::fields::{FieldPath, CHANGEKEY, ITEM_ID};
use crate::item::{Found, Item};
use crate::queryset::{QueryError, QueryResult};

/// Formats raw results for one query
#[derive(Debug, Clone)]
pub struct ResultFormatter {
    format: ReturnFormat,
    only_fields: Option<Vec<FieldPath>>,
}

impl ResultFormatter {
    /// Creates a formatter, checking the projection fits the format
    pub fn new(format: ReturnFormat, only_fields: Option<Vec<FieldPath>>) -> QueryResult<Self> {
        let projected = only_fields.as_ref().map_or(0, Vec::len);
        match format {
            _ if format.needs_projection() && projected == 0 => {
                return Err(QueryError::invalid_operation(format!(
                    "{}() requires at least one field name",
                    format.as_str()
                )));
            }
            ReturnFormat::Flat if projected != 1 => {
                return Err(QueryError::invalid_operation(
                    "flat=true requires exactly one field name",
                ));
            }
            _ => {}
        }
        Ok(Self {
            format,
            only_fields,
        })
    }

    pub fn format(&self, found: Found) -> Row {
        match self.format {
            ReturnFormat::Items => self.as_item(found),
            ReturnFormat::Values => self.as_values(&found),
            ReturnFormat::ValuesList => self.as_values_list(&found),
            ReturnFormat::Flat => self.as_flat(&found),
        }
    }

    fn projection(&self) -> &[FieldPath] {
        self.only_fields.as_deref().unwrap_or(&[])
    }

    fn as_item(&self, found: Found) -> Row {
        let pair = match found {
            Found::Item(item) => return Row::Item(item),
            Found::Identity(pair) => pair,
        };

        // An empty or unset projection keeps both identity parts
        let only = self.projection();
        let wants = |name: &str| only.is_empty() || only.iter().any(|p| p.field().name() == name);

        Row::Item(Item {
            item_id: wants(ITEM_ID).then_some(pair.item_id),
            changekey: wants(CHANGEKEY).then_some(pair.changekey),
            values: BTreeMap::new(),
        })
    }

    fn as_values(&self, found: &Found) -> Row {
        let map = self
            .projection()
            .iter()
            .map(|path| (path.path(), Self::read(path, found)))
            .collect();
        Row::Values(map)
    }

    fn as_values_list(&self, found: &Found) -> Row {
        Row::ValuesList(
            self.projection()
                .iter()
                .map(|path| Self::read(path, found))
                .collect(),
        )
    }

    fn as_flat(&self, found: &Found) -> Row {
        let value = self
            .projection()
            .first()
            .map_or(Value::Null, |path| Self::read(path, found));
        Row::Flat(value)
    }

    fn read(path: &FieldPath, found: &Found) -> Value {
        match (found, path.field().name()) {
            (Found::Identity(pair), ITEM_ID) => Value::String(pair.item_id.clone()),
            (Found::Identity(pair), CHANGEKEY) => Value::String(pair.changekey.clone()),
            _ => path.get_value(found),
        }
    }
}
