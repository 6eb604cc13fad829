//! # Calculus Core
//!
//! Domain types, traits, and error definitions for the Calculus terminal
//! agent. Every other crate depends inward on this one.
//!
//! ## Design Philosophy
//!
//! Each seam is a trait defined here, with implementations in their own
//! crates:
//! - [`Provider`]: the model backend (`calculus-providers`)
//! - [`Tool`]: a callable capability (`calculus-tools`)
//!
//! Tests swap either side for scripted stand-ins.

pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod schema;
pub mod todo;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, ToolError};
pub use event::{AgentEvent, EventBus};
pub use message::{Conversation, ConversationId, Message, MessageToolCall, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ReasoningEffort, ToolDefinition, Usage};
pub use schema::Violation;
pub use todo::{Todo, TodoInput, TodoStatus, TodoStore, TodoWrite};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
