//! Command trait, registry, and the capability context.
//!
//! The hosting application owns one `Context` worth of state per session
//! (history, aliases, files, the VFS, the pipeline runner) and rebuilds the
//! borrow for every dispatch. The core mutates only history and aliases.

use std::collections::{BTreeMap, HashMap};

use mirage_types::error::Result;
use mirage_vfs::Vfs;

use crate::runner::{PipelineRunner, RunOptions};

/// Host-supplied terminal I/O callbacks.
///
/// `write`/`write_line` feed the rendering widget and the transcript;
/// `prompt` redraws the prompt after a command settles; `history_changed`
/// fires after a committed command is appended, so hosts can persist.
pub trait SessionIo {
    fn write(&mut self, text: &str);
    fn write_line(&mut self, text: &str);
    fn prompt(&mut self) {}
    fn history_changed(&mut self, _history: &[String]) {}
}

/// Capability set handed to command handlers and the pipeline.
pub struct Context<'a> {
    pub io: &'a mut dyn SessionIo,
    /// Committed commands, append-only, caller-owned.
    pub history: &'a mut Vec<String>,
    /// Alias name → expansion string.
    pub aliases: &'a mut HashMap<String, String>,
    /// Intercept network-shaped commands and simulate them instead.
    pub safe_mode: bool,
    /// Pre-resolved named text blobs the pipeline verbs operate on.
    pub files: &'a BTreeMap<String, String>,
    pub vfs: &'a mut dyn Vfs,
    /// Current working directory for VFS-facing commands.
    pub cwd: String,
    pub runner: &'a mut PipelineRunner,
    /// Milliseconds the runner waits before its synchronous fallback.
    pub pipeline_timeout_ms: u64,
}

impl Context<'_> {
    pub fn write(&mut self, text: &str) {
        self.io.write(text);
    }

    pub fn write_line(&mut self, text: &str) {
        self.io.write_line(text);
    }

    /// Hand a full command string to the pipeline subsystem and return its
    /// joined output.
    pub fn run_worker(&mut self, command: &str) -> Result<String> {
        let options = RunOptions {
            files: self.files.clone(),
            timeout_ms: self.pipeline_timeout_ms,
        };
        self.runner.run(command, &options)
    }
}

/// A single executable command.
pub trait Command {
    /// The command name (what the user types).
    fn name(&self) -> &str;

    /// One-line description for `help` and autocomplete listings.
    fn description(&self) -> &str;

    /// Usage string (e.g. "alias [name=value]").
    fn usage(&self) -> &str;

    /// Execute with the post-verb argument remainder and the context.
    fn execute(&self, args: &str, ctx: &mut Context<'_>) -> Result<()>;
}

/// Registry of available commands.
///
/// Injected into the session manager at construction; never a process-wide
/// singleton, so independent sessions can carry different command sets.
pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn Command>>,
}

impl CommandRegistry {
    /// Create an empty command registry.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Register a command. Replaces any existing command with the same name.
    pub fn register(&mut self, cmd: Box<dyn Command>) {
        self.commands.insert(cmd.name().to_string(), cmd);
    }

    /// Look up a command by exact name.
    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(|c| &**c)
    }

    /// Return a sorted list of (name, description) pairs.
    pub fn list(&self) -> Vec<(&str, &str)> {
        let mut cmds: Vec<(&str, &str)> = self
            .commands
            .values()
            .map(|c| (c.name(), c.description()))
            .collect();
        cmds.sort_by_key(|(name, _)| *name);
        cmds
    }

    /// Return sorted completions for a partial command name.
    pub fn completions(&self, partial: &str) -> Vec<String> {
        let mut matches: Vec<String> = self
            .commands
            .keys()
            .filter(|name| name.starts_with(partial))
            .cloned()
            .collect();
        matches.sort();
        matches
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
