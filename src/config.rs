//! Query configuration
//!
//! Tunables describing the remote store's paging behaviour. Loaded from
//! JSON; every key is optional.

use serde::{Deserialize, Serialize};

use crate::queryset::{QueryError, QueryResult};

/// Paging configuration for queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Items per remote page. Indexes and slice stops below this shrink
    /// the paging hints of the request (default: 100)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Page size hint used when counting (default: 1000)
    #[serde(default = "default_count_page_size")]
    pub count_page_size: usize,

    /// Page size hint used when collecting ids to delete (default: 1000)
    #[serde(default = "default_delete_page_size")]
    pub delete_page_size: usize,
}

fn default_chunk_size() -> usize {
    100
}

fn default_count_page_size() -> usize {
    1000
}

fn default_delete_page_size() -> usize {
    1000
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            count_page_size: default_count_page_size(),
            delete_page_size: default_delete_page_size(),
        }
    }
}

impl QueryConfig {
    /// Parses and validates a JSON configuration
    pub fn from_json(content: &str) -> QueryResult<Self> {
        let config: QueryConfig = serde_json::from_str(content)
            .map_err(|e| QueryError::InvalidConfig(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// All sizes must be positive
    pub fn validate(&self) -> QueryResult<()> {
        let sizes = [
            ("chunk_size", self.chunk_size),
            ("count_page_size", self.count_page_size),
            ("delete_page_size", self.delete_page_size),
        ];
        for (name, value) in sizes {
            if value == 0 {
                return Err(QueryError::InvalidConfig(format!("{} must be > 0", name)));
            }
        }
        Ok(())
    }
}
