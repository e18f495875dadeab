//! Built-in commands for the MIRAGE_OS terminal.
//!
//! Cosmetic demo commands of the full desktop live outside this core; what
//! ships here is the minimal interactive set: help, echo, history, aliases,
//! and the VFS-facing ls/pwd.

use mirage_types::error::{MirageError, Result};
use mirage_vfs::{EntryKind, Vfs, resolve_path};

use crate::context::{Command, CommandRegistry, Context};

/// Register all built-in commands into a registry.
pub fn register_builtins(reg: &mut CommandRegistry) {
    reg.register(Box::new(HelpCmd));
    reg.register(Box::new(EchoCmd));
    reg.register(Box::new(HistoryCmd));
    reg.register(Box::new(AliasCmd));
    reg.register(Box::new(UnaliasCmd));
    reg.register(Box::new(LsCmd));
    reg.register(Box::new(PwdCmd));
}

// ---------------------------------------------------------------------------
// help
// ---------------------------------------------------------------------------

struct HelpCmd;
impl Command for HelpCmd {
    fn name(&self) -> &str {
        "help"
    }
    fn description(&self) -> &str {
        "List available commands"
    }
    fn usage(&self) -> &str {
        "help [command]"
    }
    fn execute(&self, _args: &str, ctx: &mut Context<'_>) -> Result<()> {
        // The session intercepts `help` because the listing needs the
        // registry; this registration exists for completion and `help help`.
        ctx.write_line("Type 'help' at the prompt for a list of commands.");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// echo
// ---------------------------------------------------------------------------

struct EchoCmd;
impl Command for EchoCmd {
    fn name(&self) -> &str {
        "echo"
    }
    fn description(&self) -> &str {
        "Print arguments"
    }
    fn usage(&self) -> &str {
        "echo [text...]"
    }
    fn execute(&self, args: &str, ctx: &mut Context<'_>) -> Result<()> {
        ctx.write_line(args);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// history
// ---------------------------------------------------------------------------

struct HistoryCmd;
impl Command for HistoryCmd {
    fn name(&self) -> &str {
        "history"
    }
    fn description(&self) -> &str {
        "Show command history"
    }
    fn usage(&self) -> &str {
        "history"
    }
    fn execute(&self, _args: &str, ctx: &mut Context<'_>) -> Result<()> {
        if ctx.history.is_empty() {
            ctx.write_line("(no history)");
            return Ok(());
        }
        let entries: Vec<String> = ctx
            .history
            .iter()
            .enumerate()
            .map(|(i, entry)| format!("  {:4}  {entry}", i + 1))
            .collect();
        for line in entries {
            ctx.write_line(&line);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// alias / unalias
// ---------------------------------------------------------------------------

struct AliasCmd;
impl Command for AliasCmd {
    fn name(&self) -> &str {
        "alias"
    }
    fn description(&self) -> &str {
        "Define or list command aliases"
    }
    fn usage(&self) -> &str {
        "alias [name=command]"
    }
    fn execute(&self, args: &str, ctx: &mut Context<'_>) -> Result<()> {
        let args = args.trim();
        if args.is_empty() {
            if ctx.aliases.is_empty() {
                ctx.write_line("(no aliases defined)");
                return Ok(());
            }
            let mut entries: Vec<(String, String)> = ctx
                .aliases
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            entries.sort();
            for (name, expansion) in entries {
                ctx.write_line(&format!("alias {name}='{expansion}'"));
            }
            return Ok(());
        }
        if let Some((name, value)) = args.split_once('=') {
            let name = name.trim();
            let value = value.trim().trim_matches('\'').trim_matches('"');
            if name.is_empty() {
                return Err(MirageError::Command(
                    "usage: alias <name>=<command>".to_string(),
                ));
            }
            ctx.aliases.insert(name.to_string(), value.to_string());
            return Ok(());
        }
        let found = ctx.aliases.get(args).cloned();
        match found {
            Some(expansion) => ctx.write_line(&format!("alias {args}='{expansion}'")),
            None => ctx.write_line(&format!("{args}: not aliased")),
        }
        Ok(())
    }
}

struct UnaliasCmd;
impl Command for UnaliasCmd {
    fn name(&self) -> &str {
        "unalias"
    }
    fn description(&self) -> &str {
        "Remove a command alias"
    }
    fn usage(&self) -> &str {
        "unalias <name>"
    }
    fn execute(&self, args: &str, ctx: &mut Context<'_>) -> Result<()> {
        let name = args.split_whitespace().next().ok_or_else(|| {
            MirageError::Command("usage: unalias <name>".to_string())
        })?;
        ctx.aliases.remove(name);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ls / pwd
// ---------------------------------------------------------------------------

struct LsCmd;
impl Command for LsCmd {
    fn name(&self) -> &str {
        "ls"
    }
    fn description(&self) -> &str {
        "List directory contents"
    }
    fn usage(&self) -> &str {
        "ls [path]"
    }
    fn execute(&self, args: &str, ctx: &mut Context<'_>) -> Result<()> {
        let arg = args.split_whitespace().next();
        let path = match arg {
            Some(p) => resolve_path(&ctx.cwd, p),
            None => ctx.cwd.clone(),
        };
        let entries = ctx.vfs.readdir(&path)?;
        if entries.is_empty() {
            ctx.write_line("(empty)");
            return Ok(());
        }
        for entry in &entries {
            let suffix = if entry.kind == EntryKind::Directory {
                "/"
            } else {
                ""
            };
            let line = format!("{}{suffix}", entry.name);
            ctx.write_line(&line);
        }
        Ok(())
    }
}

struct PwdCmd;
impl Command for PwdCmd {
    fn name(&self) -> &str {
        "pwd"
    }
    fn description(&self) -> &str {
        "Print working directory"
    }
    fn usage(&self) -> &str {
        "pwd"
    }
    fn execute(&self, _args: &str, ctx: &mut Context<'_>) -> Result<()> {
        let cwd = ctx.cwd.clone();
        ctx.write_line(&cwd);
        Ok(())
    }
}
