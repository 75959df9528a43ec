//! Ordering on a field path

use std::fmt;

use serde::{Deserialize, Serialize};

use super::field::FieldPath;
use crate::folder::Folder;
use crate::queryset::QueryResult;

const REVERSE_MARKER: char = '-';

/// A field path plus a sort direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOrder {
    pub path: FieldPath,
    pub reverse: bool,
}

impl FieldOrder {
    pub fn new(path: FieldPath, reverse: bool) -> Self {
        Self { path, reverse }
    }

    /// Resolves an ordering string such as `-datetime_received`
    pub fn from_string<F: Folder + ?Sized>(spec: &str, folder: &F) -> QueryResult<Self> {
        let (reverse, path) = match spec.strip_prefix(REVERSE_MARKER) {
            Some(rest) => (true, rest),
            None => (false, spec),
        };
        Ok(Self::new(FieldPath::from_string(path, folder)?, reverse))
    }

    /// Flips the direction in place
    pub fn flip(&mut self) {
        self.reverse = !self.reverse;
    }
}

impl fmt::Display for FieldOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reverse {
            write!(f, "{}{}", REVERSE_MARKER, self.path)
        } else {
            write!(f, "{}", self.path)
        }
    }
}
