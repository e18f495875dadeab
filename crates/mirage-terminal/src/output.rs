//! Bounded, ANSI-free scrollback transcript.
//!
//! The rendering widget owns pixels; this buffer owns the logical text. It
//! strips escape sequences on the way in so persisted transcripts stay
//! plain, and evicts from the front once the line cap is reached.

/// Stripping state. Persists across `append` calls so a sequence split
/// across two streamed chunks never leaks through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum AnsiState {
    #[default]
    Ground,
    /// Saw ESC, waiting for the introducer byte.
    Escape,
    /// Inside `ESC [ ... final` (parameter and intermediate bytes).
    Csi,
    /// Inside `ESC ] ...`, terminated by BEL or `ESC \`.
    Osc,
    /// Saw ESC inside an OSC payload; next byte ends the sequence.
    OscEscape,
}

/// Line-oriented scrollback store with ANSI stripping.
///
/// The last line is the "open" line being appended to. The buffer never
/// holds raw escape bytes after `append`.
#[derive(Debug)]
pub struct OutputBuffer {
    lines: Vec<String>,
    max_lines: usize,
    state: AnsiState,
    last_was_cr: bool,
}

impl OutputBuffer {
    /// Create a buffer retaining at most `max_lines` lines.
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: vec![String::new()],
            max_lines: max_lines.max(1),
            state: AnsiState::Ground,
            last_was_cr: false,
        }
    }

    /// Append a chunk of terminal output.
    ///
    /// Escape sequences (CSI, OSC, two-byte ESC) are stripped, `\r\n` and
    /// bare `\r` normalize to `\n`, and the buffer is trimmed to the line
    /// cap from the front.
    pub fn append(&mut self, chunk: &str) {
        for ch in chunk.chars() {
            match self.state {
                AnsiState::Ground => self.feed_ground(ch),
                AnsiState::Escape => {
                    self.state = match ch {
                        '[' => AnsiState::Csi,
                        ']' => AnsiState::Osc,
                        // Two-byte sequence: the introducer is the final byte.
                        _ => AnsiState::Ground,
                    };
                },
                AnsiState::Csi => {
                    if ('\u{40}'..='\u{7e}').contains(&ch) {
                        self.state = AnsiState::Ground;
                    }
                },
                AnsiState::Osc => match ch {
                    '\u{7}' => self.state = AnsiState::Ground,
                    '\u{1b}' => self.state = AnsiState::OscEscape,
                    _ => {},
                },
                AnsiState::OscEscape => self.state = AnsiState::Ground,
            }
        }
        self.trim_front();
    }

    fn feed_ground(&mut self, ch: char) {
        match ch {
            '\u{1b}' => {
                self.state = AnsiState::Escape;
                self.last_was_cr = false;
            },
            '\r' => {
                self.lines.push(String::new());
                self.last_was_cr = true;
            },
            '\n' => {
                // The \n of a \r\n pair was already handled by the \r.
                if !self.last_was_cr {
                    self.lines.push(String::new());
                }
                self.last_was_cr = false;
            },
            c if c.is_control() && c != '\t' => {
                self.last_was_cr = false;
            },
            c => {
                if let Some(last) = self.lines.last_mut() {
                    last.push(c);
                }
                self.last_was_cr = false;
            },
        }
    }

    fn trim_front(&mut self) {
        let excess = self.lines.len().saturating_sub(self.max_lines);
        if excess > 0 {
            self.lines.drain(..excess);
        }
    }

    /// Full transcript joined with `\n`, trailing-trimmed.
    pub fn text(&self) -> String {
        let joined = self.lines.join("\n");
        joined.trim_end().to_string()
    }

    /// Defensive copy of the line array.
    pub fn lines(&self) -> Vec<String> {
        self.lines.clone()
    }

    /// Update the line cap and re-trim immediately.
    pub fn set_max_lines(&mut self, max_lines: usize) {
        self.max_lines = max_lines.max(1);
        self.trim_front();
    }

    /// Reset to a single empty line. Stripping state is kept so a sequence
    /// split across the clear stays stripped.
    pub fn clear(&mut self) {
        self.lines = vec![String::new()];
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}
