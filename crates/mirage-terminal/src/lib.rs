//! Terminal core for MIRAGE_OS.
//!
//! The terminal is a registry-based dispatch system wrapped in an
//! interactive line-editing session. Keystrokes flow into the
//! [`SessionManager`], which maintains the edit buffer, history, and
//! autocomplete. Committed commands resolve against an injected
//! [`CommandRegistry`]; anything the registry does not know is handed to the
//! [`PipelineRunner`], which interprets a small `cmd1 | cmd2` piping grammar
//! either on a worker thread with streaming chunked output or synchronously
//! in the caller's context. The [`OutputBuffer`] keeps an ANSI-free
//! transcript for scrollback and persistence, and the [`ScriptRunner`]
//! executes a small sequential DSL with cooperative cancellation.

pub mod commands;
mod context;
pub mod interpreter;
pub mod message;
mod output;
mod runner;
pub mod script;
mod session;

/// Register the built-in commands into a registry.
pub use commands::register_builtins;
/// A single executable command trait.
pub use context::Command;
/// Registry of available commands, injected into the session.
pub use context::CommandRegistry;
/// Capability set handed to command handlers and the pipeline.
pub use context::Context;
/// Host-supplied terminal I/O callbacks.
pub use context::SessionIo;
/// Request/response schema for the pipeline execution unit.
pub use message::{PipelineRequest, PipelineResponse};
/// Bounded, ANSI-free scrollback transcript.
pub use output::OutputBuffer;
/// Dual-mode pipeline dispatcher.
pub use runner::{Backend, PipelineRunner, RunOptions};
/// Sequential script interpreter with cancellation.
pub use script::{CancelHandle, ScriptRunner, ScriptStep};
/// Interactive line-editing session.
pub use session::SessionManager;
