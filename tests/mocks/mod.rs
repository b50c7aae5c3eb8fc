//! Mock infrastructure for testing external services
//!
//! This module provides mock servers for the upstream backends:
//! - OpenAI API (chat completions, JSON and SSE)
//! - Agent runtime (newline-delimited JSON events)

pub mod agent;

pub use agent::*;
pub use openai::*;
