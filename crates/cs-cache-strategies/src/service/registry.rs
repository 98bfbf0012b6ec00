//! Strategy registry
//!
//! Tag-keyed dispatch table built once at startup. Each tag maps to the
//! first registered handler that supports it; lookups are a single hash
//! probe. A tag with no handler is a configuration error.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::CacheStrategy;
use crate::error::CacheError;
use crate::ports::StrategySupport;

pub struct StrategyRegistry<H: ?Sized> {
    table: HashMap<CacheStrategy, Arc<H>>,
}

impl<H: ?Sized + StrategySupport> StrategyRegistry<H> {
    /// Build the table; earlier handlers win when several support a tag
    pub fn new(handlers: Vec<Arc<H>>) -> Self {
        let mut table = HashMap::new();
        for strategy in CacheStrategy::ALL {
            if let Some(handler) = handlers.iter().find(|h| h.supports(strategy)) {
                table.insert(strategy, handler.clone());
            }
        }
        Self { table }
    }

    pub fn get(&self, strategy: CacheStrategy) -> Result<Arc<H>, CacheError> {
        self.table
            .get(&strategy)
            .cloned()
            .ok_or(CacheError::UnsupportedStrategy(strategy))
    }

    /// Parse a textual tag and look it up
    pub fn resolve(&self, tag: &str) -> Result<Arc<H>, CacheError> {
        self.get(tag.parse()?)
    }

    pub fn contains(&self, strategy: CacheStrategy) -> bool {
        self.table.contains_key(&strategy)
    }

    /// Registered strategies in declaration order
    pub fn strategies(&self) -> Vec<CacheStrategy> {
        CacheStrategy::ALL
            .into_iter()
            .filter(|s| self.table.contains_key(s))
            .collect()
    }
}
