//! Model backend implementations for Calculus.
//!
//! All providers implement the `calculus_core::Provider` trait. The agent
//! talks to exactly one backend: an OpenAI-compatible chat-completions
//! endpoint.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
