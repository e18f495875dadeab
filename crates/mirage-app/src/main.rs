//! Minimal REPL host for the MIRAGE_OS terminal core.
//!
//! Wires a session manager, an in-memory VFS, the pipeline runner, and a
//! scrollback buffer to stdin/stdout. Not a product UI; this exists so the
//! whole commit path can be driven end to end from a shell.

use std::collections::{BTreeMap, HashMap};
use std::io::{self, BufRead, Write};

use anyhow::Result;

use mirage_terminal::{
    Context, OutputBuffer, PipelineRunner, SessionIo, SessionManager, register_builtins,
};
use mirage_types::TerminalConfig;
use mirage_vfs::{MemoryVfs, Vfs};

const PROMPT: &str = "mirage$ ";

/// Stdout-backed terminal I/O that also records the stripped transcript.
struct StdIo {
    transcript: OutputBuffer,
}

impl SessionIo for StdIo {
    fn write(&mut self, text: &str) {
        // Editing echoes stay off the persisted transcript; only committed
        // output lines are recorded.
        print!("{text}");
        let _ = io::stdout().flush();
    }

    fn write_line(&mut self, text: &str) {
        println!("{text}");
        self.transcript.append(text);
        self.transcript.append("\n");
    }

    fn prompt(&mut self) {
        print!("{PROMPT}");
        let _ = io::stdout().flush();
    }

    fn history_changed(&mut self, history: &[String]) {
        log::debug!("history now holds {} entries", history.len());
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let config = TerminalConfig::default();

    let mut registry = mirage_terminal::CommandRegistry::new();
    register_builtins(&mut registry);
    let session = SessionManager::new(registry);

    let mut vfs = MemoryVfs::new();
    vfs.mkdir("/home");
    vfs.write("/home/README.md", "Welcome to the MIRAGE_OS terminal.\n")?;

    let mut files = BTreeMap::new();
    files.insert(
        "README.md".to_string(),
        "Welcome to the MIRAGE_OS terminal.\nPipe verbs: cat, grep, sort, uniq, jq.\n".to_string(),
    );
    files.insert(
        "services.json".to_string(),
        "{\n  \"desktop\": { \"version\": \"0.1.0\" }\n}\n".to_string(),
    );

    let mut runner = PipelineRunner::new();
    let mut history: Vec<String> = Vec::new();
    let mut aliases: HashMap<String, String> = HashMap::new();
    let mut stdio = StdIo {
        transcript: OutputBuffer::new(config.scrollback_lines),
    };

    stdio.write_line("MIRAGE_OS terminal (type 'help' for commands, 'exit' to quit)");
    stdio.prompt();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim() == "exit" {
            break;
        }
        let mut ctx = Context {
            io: &mut stdio,
            history: &mut history,
            aliases: &mut aliases,
            safe_mode: config.safe_mode,
            files: &files,
            vfs: &mut vfs,
            cwd: "/home".to_string(),
            runner: &mut runner,
            pipeline_timeout_ms: config.pipeline_timeout_ms,
        };
        session.run_command(&line, &mut ctx);
    }

    runner.dispose();
    log::info!(
        "session ended with {} transcript lines",
        stdio.transcript.lines().len()
    );
    Ok(())
}
