//! Formatted query results

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fields::{CHANGEKEY, ITEM_ID};
use crate::item::{Item, ItemIdentity};

/// Output shape of a query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnFormat {
    /// Item objects
    #[default]
    Items,
    /// One map of path to value per result
    Values,
    /// One tuple of values per result, in projection order
    ValuesList,
    /// One scalar per result
    Flat,
}

impl ReturnFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnFormat::Items => "items",
            ReturnFormat::Values => "values",
            ReturnFormat::ValuesList => "values_list",
            ReturnFormat::Flat => "flat",
        }
    }

    /// Whether the format reads values from the projection
    pub fn needs_projection(&self) -> bool {
        !matches!(self, ReturnFormat::Items)
    }
}

/// A single formatted result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Row {
    Item(Item),
    Values(BTreeMap<String, Value>),
    ValuesList(Vec<Value>),
    Flat(Value),
}

impl Row {
    pub fn as_item(&self) -> Option<&Item> {
        match self {
            Row::Item(item) => Some(item),
            _ => None,
        }
    }

    pub fn into_item(self) -> Option<Item> {
        match self {
            Row::Item(item) => Some(item),
            _ => None,
        }
    }

    pub fn as_values(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Row::Values(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_values_list(&self) -> Option<&[Value]> {
        match self {
            Row::ValuesList(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_flat(&self) -> Option<&Value> {
        match self {
            Row::Flat(value) => Some(value),
            _ => None,
        }
    }

    /// The identity pair this row carries, if any
    pub fn identity(&self) -> Option<ItemIdentity> {
        match self {
            Row::Item(item) => item.identity(),
            Row::Values(map) => match (map.get(ITEM_ID), map.get(CHANGEKEY)) {
                (Some(Value::String(id)), Some(Value::String(ck))) => {
                    Some(ItemIdentity::new(id.clone(), ck.clone()))
                }
                _ => None,
            },
            Row::ValuesList(_) | Row::Flat(_) => None,
        }
    }
}
