//! Interactive line-editing session.
//!
//! Converts a raw character stream into committed commands and maintains the
//! editing state: buffer, cursor, and history navigation. Escape sequences
//! are recognized by a small decoder state machine so cursor and history
//! keys are easy to extend and test apart from the main input loop.

use std::collections::HashMap;
use std::mem;

use crate::context::{Command, CommandRegistry, Context};

/// Verbs that are intercepted in safe mode. Covers remote-access, transfer,
/// and scan tools.
const NETWORK_TOOLS: &[&str] = &[
    "curl", "wget", "ssh", "scp", "sftp", "ftp", "telnet", "nc", "ncat", "netcat", "nmap", "ping",
];

/// Column the autocomplete listing pads command names to.
const COMPLETION_PAD: usize = 12;

/// One decoded editing action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Insert(char),
    Commit,
    Backspace,
    CursorLeft,
    CursorRight,
    HistoryUp,
    HistoryDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum DecodeState {
    #[default]
    Ground,
    /// Saw ESC, waiting for the introducer.
    Escape,
    /// Inside `ESC [`, accumulating until the final byte.
    Csi,
}

/// Escape-sequence decoder. Feed characters one at a time; sequences may be
/// split across feeds arbitrarily.
#[derive(Debug, Default)]
pub struct InputDecoder {
    state: DecodeState,
}

impl InputDecoder {
    pub fn feed(&mut self, ch: char) -> Option<InputAction> {
        match self.state {
            DecodeState::Ground => match ch {
                '\r' => Some(InputAction::Commit),
                '\u{7f}' => Some(InputAction::Backspace),
                '\u{1b}' => {
                    self.state = DecodeState::Escape;
                    None
                },
                c if c.is_control() => None,
                c => Some(InputAction::Insert(c)),
            },
            DecodeState::Escape => {
                self.state = if ch == '[' {
                    DecodeState::Csi
                } else {
                    DecodeState::Ground
                };
                None
            },
            DecodeState::Csi => match ch {
                '0'..='9' | ';' => None,
                'A' => self.dispatch(InputAction::HistoryUp),
                'B' => self.dispatch(InputAction::HistoryDown),
                'C' => self.dispatch(InputAction::CursorRight),
                'D' => self.dispatch(InputAction::CursorLeft),
                _ => {
                    // Unrecognized final byte: swallow the sequence.
                    self.state = DecodeState::Ground;
                    None
                },
            },
        }
    }

    fn dispatch(&mut self, action: InputAction) -> Option<InputAction> {
        self.state = DecodeState::Ground;
        Some(action)
    }
}

/// Line-editing session manager.
///
/// Owns only editing state; history, aliases, files, and the runner are
/// caller-owned and arrive through the [`Context`] on every call, so
/// multiple independent sessions can share nothing.
pub struct SessionManager {
    registry: CommandRegistry,
    decoder: InputDecoder,
    buffer: String,
    cursor: usize,
    history_cursor: Option<usize>,
}

impl SessionManager {
    /// Create a session around an injected command registry.
    pub fn new(registry: CommandRegistry) -> Self {
        Self {
            registry,
            decoder: InputDecoder::default(),
            buffer: String::new(),
            cursor: 0,
            history_cursor: None,
        }
    }

    /// Current edit buffer contents.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Replace the edit buffer (host reverse-search), cursor at the end.
    pub fn set_buffer(&mut self, text: &str) {
        self.buffer = text.to_string();
        self.cursor = self.buffer.chars().count();
    }

    /// The injected registry.
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Consume a chunk of raw input characters.
    pub fn handle_input(&mut self, data: &str, ctx: &mut Context<'_>) {
        for ch in data.chars() {
            if let Some(action) = self.decoder.feed(ch) {
                self.apply(action, ctx);
            }
        }
    }

    /// Replay pasted text as committed commands: every line terminator style
    /// maps to the carriage-return trigger.
    pub fn handle_paste(&mut self, text: &str, ctx: &mut Context<'_>) {
        let normalized = text.replace("\r\n", "\r").replace('\n', "\r");
        self.handle_input(&normalized, ctx);
    }

    fn apply(&mut self, action: InputAction, ctx: &mut Context<'_>) {
        match action {
            InputAction::Insert(c) => {
                let at = byte_index(&self.buffer, self.cursor);
                self.buffer.insert(at, c);
                self.cursor += 1;
                ctx.io.write(c.encode_utf8(&mut [0u8; 4]));
            },
            InputAction::Commit => {
                let command = mem::take(&mut self.buffer);
                self.cursor = 0;
                self.history_cursor = None;
                ctx.io.write("\r\n");
                self.run_command(&command, ctx);
            },
            InputAction::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = byte_index(&self.buffer, self.cursor);
                    self.buffer.remove(at);
                    ctx.io.write("\u{8} \u{8}");
                }
            },
            InputAction::CursorLeft => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    ctx.io.write("\u{1b}[D");
                }
            },
            InputAction::CursorRight => {
                if self.cursor < self.buffer.chars().count() {
                    self.cursor += 1;
                    ctx.io.write("\u{1b}[C");
                }
            },
            InputAction::HistoryUp => self.history_up(ctx),
            InputAction::HistoryDown => self.history_down(ctx),
        }
    }

    fn history_up(&mut self, ctx: &mut Context<'_>) {
        if ctx.history.is_empty() {
            return;
        }
        let next = match self.history_cursor {
            None => ctx.history.len() - 1,
            // Already at the oldest entry.
            Some(0) => return,
            Some(i) => i - 1,
        };
        self.history_cursor = Some(next);
        let entry = ctx.history[next].clone();
        self.replace_line(entry, ctx);
    }

    fn history_down(&mut self, ctx: &mut Context<'_>) {
        match self.history_cursor {
            None => {},
            Some(i) if i + 1 < ctx.history.len() => {
                self.history_cursor = Some(i + 1);
                let entry = ctx.history[i + 1].clone();
                self.replace_line(entry, ctx);
            },
            Some(_) => {
                // Past the newest entry: back to an empty buffer.
                self.history_cursor = None;
                self.replace_line(String::new(), ctx);
            },
        }
    }

    fn replace_line(&mut self, text: String, ctx: &mut Context<'_>) {
        ctx.io.write("\u{1b}[2K\r");
        ctx.io.prompt();
        ctx.io.write(&text);
        self.cursor = text.chars().count();
        self.buffer = text;
    }

    /// Run a command line: alias expansion, history append, safe-mode
    /// interception, then built-in dispatch or pipeline forwarding.
    ///
    /// Always settles and always redraws the prompt; a failing built-in is
    /// logged and reported without corrupting session state.
    pub fn run_command(&self, input: &str, ctx: &mut Context<'_>) {
        self.dispatch(input, ctx);
        ctx.io.prompt();
    }

    fn dispatch(&self, input: &str, ctx: &mut Context<'_>) {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return;
        }

        let expanded = expand_alias(trimmed, ctx.aliases);

        // History records what the user typed, not the expansion.
        ctx.history.push(trimmed.to_string());
        ctx.io.history_changed(ctx.history);

        let mut words = expanded.split_whitespace();
        let verb = words.next().unwrap_or("");
        let args: String = words.collect::<Vec<_>>().join(" ");

        if ctx.safe_mode && is_network_command(&expanded, verb) {
            ctx.io
                .write_line("safe mode: network access is disabled; command not executed");
            ctx.io.write_line(&format!("[simulated] {expanded}"));
            return;
        }

        if verb == "help" {
            self.execute_help(&args, ctx);
            return;
        }

        if let Some(cmd) = self.registry.get(verb) {
            if let Err(e) = cmd.execute(&args, ctx) {
                log::warn!("command '{verb}' failed: {e}");
                ctx.io.write_line(&format!("error: {e}"));
            }
        } else if !verb.is_empty() {
            match ctx.run_worker(&expanded) {
                Ok(output) => {
                    for line in output.lines() {
                        if !line.is_empty() {
                            ctx.io.write_line(line);
                        }
                    }
                },
                Err(e) => {
                    log::error!("pipeline for '{expanded}' failed: {e}");
                    ctx.io.write_line(&format!("error: {e}"));
                },
            }
        }
    }

    /// `help` needs the registry, so it is intercepted here instead of being
    /// dispatched like an ordinary command.
    fn execute_help(&self, args: &str, ctx: &mut Context<'_>) {
        let name = args.split_whitespace().next().unwrap_or("");
        if !name.is_empty() {
            match self.registry.get(name) {
                Some(cmd) => {
                    ctx.io.write_line(cmd.name());
                    ctx.io.write_line(&format!("  {}", cmd.description()));
                    ctx.io.write_line(&format!("  Usage: {}", cmd.usage()));
                },
                None => ctx.io.write_line(&format!("help: unknown command: {name}")),
            }
            return;
        }
        for (cmd_name, description) in self.registry.list() {
            ctx.io.write_line(&format!(
                "{cmd_name:<width$} {description}",
                width = COMPLETION_PAD
            ));
        }
        ctx.io.write_line("Type 'help <command>' for details.");
    }

    /// Complete the current buffer against registered command names.
    pub fn autocomplete(&mut self, ctx: &mut Context<'_>) {
        if self.buffer.is_empty() {
            return;
        }
        let matches = self.registry.completions(&self.buffer);
        match matches.as_slice() {
            [] => {},
            [only] => {
                let suffix = only[self.buffer.len()..].to_string();
                ctx.io.write(&suffix);
                self.buffer = only.clone();
                self.cursor = self.buffer.chars().count();
            },
            many => {
                ctx.io.write("\r\n");
                for name in many {
                    let description = self
                        .registry
                        .get(name)
                        .map(|c| c.description())
                        .unwrap_or_default();
                    ctx.io.write_line(&format!(
                        "{name:<width$} {description}",
                        width = COMPLETION_PAD
                    ));
                }
                ctx.io.prompt();
                ctx.io.write(&self.buffer);
            },
        }
    }
}

/// Expand the verb through the alias table, keeping the argument remainder.
fn expand_alias(input: &str, aliases: &HashMap<String, String>) -> String {
    let mut parts = input.splitn(2, char::is_whitespace);
    let verb = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("").trim_start();
    match aliases.get(verb) {
        Some(expansion) if rest.is_empty() => expansion.clone(),
        Some(expansion) => format!("{expansion} {rest}"),
        None => input.to_string(),
    }
}

/// Safe-mode filter: URLs and the fixed network-tool verb list.
fn is_network_command(expanded: &str, verb: &str) -> bool {
    expanded.contains("http://") || expanded.contains("https://") || NETWORK_TOOLS.contains(&verb)
}

/// Byte offset of the `char_idx`-th character.
fn byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use mirage_types::error::{MirageError, Result};
    use mirage_vfs::MemoryVfs;

    use crate::commands::register_builtins;
    use crate::context::{Command, SessionIo};
    use crate::runner::{Backend, PipelineRunner};

    #[derive(Default)]
    struct RecordingIo {
        out: String,
        prompts: usize,
        history_events: usize,
    }

    impl SessionIo for RecordingIo {
        fn write(&mut self, text: &str) {
            self.out.push_str(text);
        }
        fn write_line(&mut self, text: &str) {
            self.out.push_str(text);
            self.out.push('\n');
        }
        fn prompt(&mut self) {
            self.prompts += 1;
        }
        fn history_changed(&mut self, _history: &[String]) {
            self.history_events += 1;
        }
    }

    struct Harness {
        io: RecordingIo,
        history: Vec<String>,
        aliases: HashMap<String, String>,
        files: BTreeMap<String, String>,
        vfs: MemoryVfs,
        runner: PipelineRunner,
        safe_mode: bool,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                io: RecordingIo::default(),
                history: Vec::new(),
                aliases: HashMap::new(),
                files: BTreeMap::new(),
                vfs: MemoryVfs::new(),
                runner: PipelineRunner::with_backend(Backend::Synchronous),
                safe_mode: false,
            }
        }

        fn ctx(&mut self) -> Context<'_> {
            Context {
                io: &mut self.io,
                history: &mut self.history,
                aliases: &mut self.aliases,
                safe_mode: self.safe_mode,
                files: &self.files,
                vfs: &mut self.vfs,
                cwd: "/".to_string(),
                runner: &mut self.runner,
                pipeline_timeout_ms: 1000,
            }
        }
    }

    fn session() -> SessionManager {
        let mut registry = CommandRegistry::new();
        register_builtins(&mut registry);
        SessionManager::new(registry)
    }

    // -- decoder --

    #[test]
    fn decoder_plain_chars_insert() {
        let mut dec = InputDecoder::default();
        assert_eq!(dec.feed('a'), Some(InputAction::Insert('a')));
        assert_eq!(dec.feed('\r'), Some(InputAction::Commit));
        assert_eq!(dec.feed('\u{7f}'), Some(InputAction::Backspace));
    }

    #[test]
    fn decoder_arrow_sequences() {
        let mut dec = InputDecoder::default();
        let actions: Vec<Option<InputAction>> = "\u{1b}[A\u{1b}[B\u{1b}[C\u{1b}[D"
            .chars()
            .map(|c| dec.feed(c))
            .collect();
        let decoded: Vec<InputAction> = actions.into_iter().flatten().collect();
        assert_eq!(
            decoded,
            [
                InputAction::HistoryUp,
                InputAction::HistoryDown,
                InputAction::CursorRight,
                InputAction::CursorLeft,
            ]
        );
    }

    #[test]
    fn decoder_sequence_split_across_feeds() {
        let mut dec = InputDecoder::default();
        assert_eq!(dec.feed('\u{1b}'), None);
        assert_eq!(dec.feed('['), None);
        assert_eq!(dec.feed('D'), Some(InputAction::CursorLeft));
    }

    #[test]
    fn decoder_unknown_sequence_swallowed() {
        let mut dec = InputDecoder::default();
        for c in "\u{1b}[5~".chars() {
            assert_eq!(dec.feed(c), None);
        }
        // Back to ground afterwards.
        assert_eq!(dec.feed('x'), Some(InputAction::Insert('x')));
    }

    #[test]
    fn decoder_two_byte_escape_swallowed() {
        let mut dec = InputDecoder::default();
        assert_eq!(dec.feed('\u{1b}'), None);
        assert_eq!(dec.feed('O'), None);
        assert_eq!(dec.feed('y'), Some(InputAction::Insert('y')));
    }

    // -- editing --

    #[test]
    fn insert_at_cursor_after_moving_left() {
        let mut s = session();
        let mut h = Harness::new();
        s.handle_input("abc", &mut h.ctx());
        s.handle_input("\u{1b}[D", &mut h.ctx());
        s.handle_input("X", &mut h.ctx());
        assert_eq!(s.buffer(), "abXc");
    }

    #[test]
    fn backspace_removes_left_of_cursor() {
        let mut s = session();
        let mut h = Harness::new();
        s.handle_input("abc\u{7f}", &mut h.ctx());
        assert_eq!(s.buffer(), "ab");
        assert!(h.io.out.contains("\u{8} \u{8}"));
    }

    #[test]
    fn backspace_at_start_is_noop() {
        let mut s = session();
        let mut h = Harness::new();
        s.handle_input("\u{7f}", &mut h.ctx());
        assert_eq!(s.buffer(), "");
    }

    #[test]
    fn cursor_moves_clamp_to_buffer() {
        let mut s = session();
        let mut h = Harness::new();
        s.handle_input("ab", &mut h.ctx());
        // Three lefts only move twice; a right at the end is a no-op.
        s.handle_input("\u{1b}[D\u{1b}[D\u{1b}[D", &mut h.ctx());
        s.handle_input("X", &mut h.ctx());
        assert_eq!(s.buffer(), "Xab");
    }

    #[test]
    fn typed_chars_echo_immediately() {
        let mut s = session();
        let mut h = Harness::new();
        s.handle_input("hi", &mut h.ctx());
        assert_eq!(h.io.out, "hi");
    }

    // -- commit & dispatch --

    #[test]
    fn commit_clears_buffer_and_prompts() {
        let mut s = session();
        let mut h = Harness::new();
        s.handle_input("echo hi\r", &mut h.ctx());
        assert_eq!(s.buffer(), "");
        assert!(h.io.out.contains("hi\n"));
        assert_eq!(h.io.prompts, 1);
        assert_eq!(h.history, ["echo hi"]);
        assert_eq!(h.io.history_events, 1);
    }

    #[test]
    fn empty_commit_still_prompts() {
        let mut s = session();
        let mut h = Harness::new();
        s.handle_input("\r", &mut h.ctx());
        assert_eq!(h.io.prompts, 1);
        assert!(h.history.is_empty());
    }

    #[test]
    fn unknown_verb_forwards_to_pipeline() {
        let mut s = session();
        let mut h = Harness::new();
        h.files
            .insert("notes".to_string(), "alpha\nbeta\n".to_string());
        s.run_command("cat notes", &mut h.ctx());
        assert!(h.io.out.contains("alpha\n"));
        assert!(h.io.out.contains("beta\n"));
    }

    #[test]
    fn alias_expansion_reaches_the_pipeline() {
        let s = session();
        let mut h = Harness::new();
        h.files
            .insert("notes".to_string(), "keep\nskip\n".to_string());
        h.aliases
            .insert("filter".to_string(), "cat notes | grep".to_string());
        s.run_command("filter keep", &mut h.ctx());
        assert!(h.io.out.contains("keep\n"));
        assert!(!h.io.out.contains("skip"));
        assert_eq!(h.history, ["filter keep"]);
    }

    #[test]
    fn alias_expands_but_history_keeps_original() {
        let mut s = session();
        let mut h = Harness::new();
        h.aliases
            .insert("greet".to_string(), "echo hello".to_string());
        s.run_command("greet world", &mut h.ctx());
        assert!(h.io.out.contains("hello world\n"));
        assert_eq!(h.history, ["greet world"]);
    }

    #[test]
    fn failing_builtin_is_caught_and_reported() {
        struct Boom;
        impl Command for Boom {
            fn name(&self) -> &str {
                "boom"
            }
            fn description(&self) -> &str {
                "always fails"
            }
            fn usage(&self) -> &str {
                "boom"
            }
            fn execute(&self, _: &str, _: &mut Context<'_>) -> Result<()> {
                Err(MirageError::Command("kaboom".to_string()))
            }
        }
        let mut registry = CommandRegistry::new();
        registry.register(Box::new(Boom));
        let s = SessionManager::new(registry);
        let mut h = Harness::new();
        s.run_command("boom", &mut h.ctx());
        assert!(h.io.out.contains("error: command error: kaboom"));
        assert_eq!(h.io.prompts, 1);
    }

    // -- safe mode --

    #[test]
    fn safe_mode_simulates_url_commands() {
        let mut s = session();
        let mut h = Harness::new();
        h.safe_mode = true;
        s.handle_input("curl http://example.com\r", &mut h.ctx());
        assert!(h.io.out.contains("[simulated] curl http://example.com"));
        assert!(!h.io.out.contains("command not found"));
    }

    #[test]
    fn safe_mode_matches_tool_names_without_urls() {
        let s = session();
        let mut h = Harness::new();
        h.safe_mode = true;
        s.run_command("nmap 10.0.0.1", &mut h.ctx());
        assert!(h.io.out.contains("[simulated] nmap 10.0.0.1"));
    }

    #[test]
    fn safe_mode_off_lets_commands_through() {
        let s = session();
        let mut h = Harness::new();
        s.run_command("curl http://example.com", &mut h.ctx());
        // No interception; the unknown verb reaches the pipeline.
        assert!(h.io.out.contains("command not found: curl"));
    }

    #[test]
    fn safe_mode_checks_expanded_command() {
        let s = session();
        let mut h = Harness::new();
        h.safe_mode = true;
        h.aliases
            .insert("fetch".to_string(), "curl https://mirage.os".to_string());
        s.run_command("fetch", &mut h.ctx());
        assert!(h.io.out.contains("[simulated] curl https://mirage.os"));
    }

    // -- history navigation --

    #[test]
    fn history_up_walks_back_without_wrapping() {
        let mut s = session();
        let mut h = Harness::new();
        h.history = vec!["ls".to_string(), "cat README.md".to_string()];

        s.handle_input("\u{1b}[A", &mut h.ctx());
        assert_eq!(s.buffer(), "cat README.md");
        s.handle_input("\u{1b}[A", &mut h.ctx());
        assert_eq!(s.buffer(), "ls");
        s.handle_input("\u{1b}[A", &mut h.ctx());
        assert_eq!(s.buffer(), "ls");
    }

    #[test]
    fn history_down_past_newest_clears() {
        let mut s = session();
        let mut h = Harness::new();
        h.history = vec!["one".to_string(), "two".to_string()];

        s.handle_input("\u{1b}[A\u{1b}[A", &mut h.ctx());
        assert_eq!(s.buffer(), "one");
        s.handle_input("\u{1b}[B", &mut h.ctx());
        assert_eq!(s.buffer(), "two");
        s.handle_input("\u{1b}[B", &mut h.ctx());
        assert_eq!(s.buffer(), "");
    }

    #[test]
    fn history_up_on_empty_history_is_noop() {
        let mut s = session();
        let mut h = Harness::new();
        s.handle_input("\u{1b}[A", &mut h.ctx());
        assert_eq!(s.buffer(), "");
    }

    #[test]
    fn commit_resets_history_cursor() {
        let mut s = session();
        let mut h = Harness::new();
        h.history = vec!["echo old".to_string()];
        s.handle_input("\u{1b}[A", &mut h.ctx());
        assert_eq!(s.buffer(), "echo old");
        s.handle_input("\r", &mut h.ctx());
        // Navigation starts from the end again.
        s.handle_input("\u{1b}[A", &mut h.ctx());
        assert_eq!(s.buffer(), "echo old");
    }

    // -- autocomplete --

    #[test]
    fn autocomplete_single_match_completes_inline() {
        let mut s = session();
        let mut h = Harness::new();
        s.handle_input("ech", &mut h.ctx());
        s.autocomplete(&mut h.ctx());
        assert_eq!(s.buffer(), "echo");
        assert!(h.io.out.ends_with('o'));
    }

    #[test]
    fn autocomplete_multiple_matches_list_and_redraw() {
        struct Named(&'static str);
        impl Command for Named {
            fn name(&self) -> &str {
                self.0
            }
            fn description(&self) -> &str {
                "demo command"
            }
            fn usage(&self) -> &str {
                self.0
            }
            fn execute(&self, _: &str, _: &mut Context<'_>) -> Result<()> {
                Ok(())
            }
        }
        let mut registry = CommandRegistry::new();
        register_builtins(&mut registry);
        registry.register(Box::new(Named("demo-a")));
        registry.register(Box::new(Named("demo-b")));
        let mut s = SessionManager::new(registry);
        let mut h = Harness::new();
        s.handle_input("demo", &mut h.ctx());
        h.io.out.clear();
        s.autocomplete(&mut h.ctx());
        // Candidates listed, prompt redrawn, buffer rewritten for editing.
        assert_eq!(s.buffer(), "demo");
        assert!(h.io.out.contains("demo-a"));
        assert!(h.io.out.contains("demo-b"));
        assert!(h.io.out.ends_with("demo"));
        assert_eq!(h.io.prompts, 1);
    }

    #[test]
    fn autocomplete_no_match_is_silent() {
        let mut s = session();
        let mut h = Harness::new();
        s.handle_input("zzz", &mut h.ctx());
        h.io.out.clear();
        s.autocomplete(&mut h.ctx());
        assert_eq!(s.buffer(), "zzz");
        assert_eq!(h.io.out, "");
    }

    #[test]
    fn autocomplete_empty_buffer_is_noop() {
        let mut s = session();
        let mut h = Harness::new();
        s.autocomplete(&mut h.ctx());
        assert_eq!(h.io.out, "");
    }

    // -- paste --

    #[test]
    fn paste_replays_lines_as_commits() {
        let mut s = session();
        let mut h = Harness::new();
        s.handle_paste("echo one\necho two\n", &mut h.ctx());
        assert!(h.io.out.contains("one\n"));
        assert!(h.io.out.contains("two\n"));
        assert_eq!(h.history, ["echo one", "echo two"]);
        assert_eq!(h.io.prompts, 2);
    }

    #[test]
    fn paste_normalizes_crlf() {
        let mut s = session();
        let mut h = Harness::new();
        s.handle_paste("echo a\r\necho b", &mut h.ctx());
        assert_eq!(h.history, ["echo a"]);
        assert_eq!(s.buffer(), "echo b");
    }

    // -- help --

    #[test]
    fn help_lists_registered_commands() {
        let s = session();
        let mut h = Harness::new();
        s.run_command("help", &mut h.ctx());
        assert!(h.io.out.contains("echo"));
        assert!(h.io.out.contains("alias"));
        assert!(h.io.out.contains("Type 'help <command>' for details."));
    }

    #[test]
    fn help_for_one_command_shows_usage() {
        let s = session();
        let mut h = Harness::new();
        s.run_command("help echo", &mut h.ctx());
        assert!(h.io.out.contains("Usage: echo"));
    }
}
