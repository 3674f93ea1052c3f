// ABOUTME: Catalog tool exposed to the model during generation
// ABOUTME: Zero-argument bridge returning the matching view of every consultant, at most once per turn

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use innerspell_ai::{ToolError, ToolHandler};
use innerspell_core::ConsultantCatalog;
use serde_json::Value;
use tracing::{info, warn};

/// Name the model uses to call the catalog tool
pub const CATALOG_TOOL: &str = "getConsultants";

const MAX_CALLS_PER_TURN: usize = 1;

/// Bridge from the model's tool call to the consultant catalog.
///
/// A fresh instance is built for every turn so the call counter starts at
/// zero.
pub struct CatalogTool {
    catalog: Arc<dyn ConsultantCatalog>,
    calls: AtomicUsize,
}

impl CatalogTool {
    pub fn new(catalog: Arc<dyn ConsultantCatalog>) -> Self {
        Self {
            catalog,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ToolHandler for CatalogTool {
    fn name(&self) -> &str {
        CATALOG_TOOL
    }

    fn description(&self) -> &str {
        "Returns the list of available consultants with their id, name, specialty and keywords. Takes no arguments."
    }

    fn call(&self, _input: &Value) -> Result<Value, ToolError> {
        let previous = self.calls.fetch_add(1, Ordering::SeqCst);
        if previous >= MAX_CALLS_PER_TURN {
            warn!("Catalog tool called {} times in one turn", previous + 1);
            return Err(ToolError::CallLimitExceeded(CATALOG_TOOL.to_string()));
        }

        let entries = self.catalog.entries();
        info!("Catalog tool returning {} consultants", entries.len());
        serde_json::to_value(entries).map_err(|e| ToolError::Failed(e.to_string()))
    }
}
