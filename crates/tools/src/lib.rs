//! Built-in tool implementations for Calculus.
//!
//! Tools give the agent the ability to interact with the world:
//! read the clock, keep a todo list, search the web, and fetch pages.

pub mod brightdata;
pub mod clock;
pub mod fetch;
pub mod search;
pub mod todos;

use std::sync::Arc;

use calculus_core::error::ToolError;
use calculus_core::todo::TodoStore;
use calculus_core::tool::ToolRegistry;

pub use brightdata::BrightDataClient;

/// Create the registry with all built-in tools.
///
/// The todo store and the unlocker client are shared with the caller so the
/// session can reset the list and tests can point the network tools at a
/// mock server.
pub fn default_registry(
    store: Arc<TodoStore>,
    brightdata: Arc<BrightDataClient>,
) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(clock::ClockTool))?;
    registry.register(Box::new(todos::TodosTool::new(store)))?;
    registry.register(Box::new(search::SearchTool::new(brightdata.clone())))?;
    registry.register(Box::new(fetch::FetchTool::new(brightdata)))?;
    Ok(registry)
}
