//! The tool-calling agent loop and the interactive session around it.
//!
//! The agent follows a **Think → Act → Observe** cycle:
//!
//! 1. **Receive** a line of user input
//! 2. **Send** the whole conversation and the tool declarations to the model
//! 3. **If tool calls**: dispatch them, append results, loop back to step 2
//! 4. **If text**: that is the answer; wait for the next input
//!
//! The loop stops at the first text-only response or when the round cap is
//! reached.

pub mod command;
pub mod loop_runner;
pub mod session;

#[cfg(test)]
mod test_helpers;

pub use command::{HELP_LINES, ReplCommand};
pub use loop_runner::{AgentLoop, TurnSummary};
pub use session::{Session, TurnOutcome, default_system_prompt};
