//! Fields and field paths

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::folder::Folder;
use crate::item::Found;
use crate::queryset::{QueryError, QueryResult};

/// Name of the primary identity field
pub const ITEM_ID: &str = "item_id";

/// Name of the revision token field
pub const CHANGEKEY: &str = "changekey";

const SUBFIELD_SEPARATOR: &str = "__";

/// A field supported by a folder
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Field {
    name: String,
    /// Complex fields cannot be returned by a plain search
    #[serde(default)]
    complex: bool,
}

impl Field {
    /// Creates a field the store can return from a search
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            complex: false,
        }
    }

    /// Creates a field that requires a follow-up fetch
    pub fn complex(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            complex: true,
        }
    }

    /// The primary id field
    pub fn item_id() -> Self {
        Self::simple(ITEM_ID)
    }

    /// The revision token field
    pub fn changekey() -> Self {
        Self::simple(CHANGEKEY)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_complex(&self) -> bool {
        self.complex
    }

    /// Returns true for `item_id` and `changekey`
    pub fn is_identity(&self) -> bool {
        self.name == ITEM_ID || self.name == CHANGEKEY
    }
}

/// A resolved reference to a field, optionally into one of its subfields
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldPath {
    field: Field,
    subfield: Option<String>,
}

impl FieldPath {
    /// Creates a path to a whole field
    pub fn new(field: Field) -> Self {
        Self {
            field,
            subfield: None,
        }
    }

    /// Creates a path to a subfield
    pub fn with_subfield(field: Field, subfield: impl Into<String>) -> Self {
        Self {
            field,
            subfield: Some(subfield.into()),
        }
    }

    /// Resolves a path string against the fields a folder supports.
    ///
    /// Identity fields always resolve. A subfield is only accepted on a
    /// complex field.
    pub fn from_string<F: Folder + ?Sized>(path: &str, folder: &F) -> QueryResult<Self> {
        let (name, subfield) = match path.split_once(SUBFIELD_SEPARATOR) {
            Some((name, sub)) => (name, Some(sub)),
            None => (path, None),
        };

        if name.is_empty() {
            return Err(QueryError::invalid_field(path, "empty field name"));
        }

        let field = if name == ITEM_ID {
            Field::item_id()
        } else if name == CHANGEKEY {
            Field::changekey()
        } else {
            folder
                .allowed_fields()
                .into_iter()
                .find(|f| f.name() == name)
                .ok_or_else(|| {
                    QueryError::invalid_field(
                        path,
                        format!("unknown field for folder '{}'", folder.name()),
                    )
                })?
        };

        match subfield {
            None => Ok(Self::new(field)),
            Some("") => Err(QueryError::invalid_field(path, "empty subfield name")),
            Some(sub) if field.is_complex() => Ok(Self::with_subfield(field, sub)),
            Some(_) => Err(QueryError::invalid_field(
                path,
                format!("field '{}' has no subfields", field.name()),
            )),
        }
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn subfield(&self) -> Option<&str> {
        self.subfield.as_deref()
    }

    pub fn is_identity(&self) -> bool {
        self.field.is_identity()
    }

    /// The path string, e.g. `organizer__email`
    pub fn path(&self) -> String {
        match &self.subfield {
            Some(sub) => format!("{}{}{}", self.field.name(), SUBFIELD_SEPARATOR, sub),
            None => self.field.name().to_string(),
        }
    }

    /// Reads this path from a search result.
    ///
    /// Identity fields are read straight from the identity pair. Anything
    /// absent reads as `Null`.
    pub fn get_value(&self, found: &Found) -> Value {
        match self.field.name() {
            ITEM_ID => return found.item_id().map_or(Value::Null, Value::from),
            CHANGEKEY => return found.changekey().map_or(Value::Null, Value::from),
            _ => {}
        }

        let value = match found {
            Found::Item(item) => item.get(self.field.name()),
            Found::Identity(_) => None,
        };

        match (value, &self.subfield) {
            (Some(v), None) => v.clone(),
            (Some(v), Some(sub)) => v.get(sub).cloned().unwrap_or(Value::Null),
            (None, _) => Value::Null,
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}
