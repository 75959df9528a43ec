//! Items returned by a folder
//!
//! A search either returns bare identity pairs or items carrying the
//! requested field values. `Found` is the union of the two and is what
//! the planner and formatters operate on.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// (primary id, revision token) addressing exactly one remote item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemIdentity {
    pub item_id: String,
    pub changekey: String,
}

impl ItemIdentity {
    pub fn new(item_id: impl Into<String>, changekey: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            changekey: changekey.into(),
        }
    }
}

/// A remote item with whatever field values were retrieved
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changekey: Option<String>,
    /// Field values keyed by field name
    #[serde(default)]
    pub values: BTreeMap<String, Value>,
}

impl Item {
    /// Creates an item with both identity parts and no values
    pub fn new(item_id: impl Into<String>, changekey: impl Into<String>) -> Self {
        Self {
            item_id: Some(item_id.into()),
            changekey: Some(changekey.into()),
            values: BTreeMap::new(),
        }
    }

    /// Builder-style value setter
    pub fn with_value(mut self, field: impl Into<String>, value: Value) -> Self {
        self.values.insert(field.into(), value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.values.insert(field.into(), value);
    }

    /// Resets a field to unset
    pub fn clear(&mut self, field: &str) {
        self.values.remove(field);
    }

    /// Returns the identity pair if both parts are known
    pub fn identity(&self) -> Option<ItemIdentity> {
        match (&self.item_id, &self.changekey) {
            (Some(id), Some(ck)) => Some(ItemIdentity::new(id.clone(), ck.clone())),
            _ => None,
        }
    }

    /// Copy of this item restricted to the named fields
    pub fn project<'a>(&self, fields: impl IntoIterator<Item = &'a str>) -> Item {
        let mut projected = Item {
            item_id: self.item_id.clone(),
            changekey: self.changekey.clone(),
            values: BTreeMap::new(),
        };
        for name in fields {
            if let Some(v) = self.values.get(name) {
                projected.values.insert(name.to_string(), v.clone());
            }
        }
        projected
    }
}

impl From<ItemIdentity> for Item {
    fn from(identity: ItemIdentity) -> Self {
        Item::new(identity.item_id, identity.changekey)
    }
}

/// One element of a folder result stream
#[derive(Debug, Clone, PartialEq)]
pub enum Found {
    /// Identity-only search result
    Identity(ItemIdentity),
    /// Item carrying field values
    Item(Item),
}

impl Found {
    pub fn item_id(&self) -> Option<&str> {
        match self {
            Found::Identity(id) => Some(&id.item_id),
            Found::Item(item) => item.item_id.as_deref(),
        }
    }

    pub fn changekey(&self) -> Option<&str> {
        match self {
            Found::Identity(id) => Some(&id.changekey),
            Found::Item(item) => item.changekey.as_deref(),
        }
    }

    pub fn identity(&self) -> Option<ItemIdentity> {
        match self {
            Found::Identity(id) => Some(id.clone()),
            Found::Item(item) => item.identity(),
        }
    }

    /// Converts into an item; identity pairs become value-less items
    pub fn into_item(self) -> Item {
        match self {
            Found::Identity(id) => Item::from(id),
            Found::Item(item) => item,
        }
    }
}
