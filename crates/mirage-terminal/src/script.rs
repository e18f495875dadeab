//! Sequential script interpreter with cooperative cancellation.
//!
//! Scripts are newline-delimited: blank lines and `#` comments are skipped,
//! `sleep <ms>` (case-insensitive) becomes a timed wait, and every other
//! line is a command handed to a caller-supplied executor after `$N`
//! positional substitution. Cancellation stops the runner before the next
//! step and interrupts an in-flight sleep immediately.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use regex::{Captures, Regex};

use mirage_types::error::{MirageError, Result};

/// One parsed script directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    /// A command line, still containing `$N` placeholders.
    Command(String),
    /// A pause in milliseconds.
    Sleep(u64),
}

/// Shared cancellation flag with a condvar so sleeps wake immediately.
#[derive(Debug, Default)]
struct CancelToken {
    canceled: Mutex<bool>,
    cv: Condvar,
}

impl CancelToken {
    fn is_canceled(&self) -> bool {
        *self
            .canceled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn cancel(&self) {
        *self
            .canceled
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = true;
        self.cv.notify_all();
    }

    /// Sleep for `dur`, returning early with `Canceled` if the flag is set.
    fn sleep(&self, dur: Duration) -> Result<()> {
        let deadline = Instant::now() + dur;
        let mut canceled = self
            .canceled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        loop {
            if *canceled {
                return Err(MirageError::Canceled);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            let (guard, _) = self
                .cv
                .wait_timeout(canceled, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            canceled = guard;
        }
    }
}

/// Handle for canceling a running script from another thread.
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<CancelToken>);

impl CancelHandle {
    /// Abort the script: no further step starts, an in-flight sleep wakes,
    /// and `run` returns an error whose message is exactly `canceled`.
    pub fn cancel(&self) {
        self.0.cancel();
    }

    /// Whether cancellation has been requested.
    pub fn is_canceled(&self) -> bool {
        self.0.is_canceled()
    }
}

/// Executes a parsed script strictly in order through an executor function,
/// typically the session manager's `run_command`.
#[derive(Debug)]
pub struct ScriptRunner {
    steps: Vec<ScriptStep>,
    token: Arc<CancelToken>,
}

impl ScriptRunner {
    /// Parse script source into a runner.
    pub fn parse(source: &str) -> Self {
        Self {
            steps: parse_steps(source),
            token: Arc::new(CancelToken::default()),
        }
    }

    /// The parsed steps, in execution order.
    pub fn steps(&self) -> &[ScriptStep] {
        &self.steps
    }

    /// A cloneable handle for canceling this runner.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(Arc::clone(&self.token))
    }

    /// Run all steps in order.
    ///
    /// `args` fills `$1`, `$2`, ... in command steps (missing indices
    /// substitute the empty string). An executor error aborts the run with
    /// that error; cancellation aborts with [`MirageError::Canceled`].
    pub fn run<F>(&self, args: &[&str], mut exec: F) -> Result<()>
    where
        F: FnMut(&str) -> Result<()>,
    {
        for step in &self.steps {
            if self.token.is_canceled() {
                return Err(MirageError::Canceled);
            }
            match step {
                ScriptStep::Command(text) => exec(&substitute_args(text, args))?,
                ScriptStep::Sleep(ms) => self.token.sleep(Duration::from_millis(*ms))?,
            }
        }
        Ok(())
    }
}

/// Parse newline-delimited script source, skipping blanks and `#` comments.
fn parse_steps(source: &str) -> Vec<ScriptStep> {
    let mut steps = Vec::new();
    for line in source.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut words = line.split_whitespace();
        let first = words.next().unwrap_or("");
        if first.eq_ignore_ascii_case("sleep")
            && let Some(ms) = words.next()
            && words.next().is_none()
            && let Ok(ms) = ms.parse::<u64>()
        {
            steps.push(ScriptStep::Sleep(ms));
            continue;
        }
        steps.push(ScriptStep::Command(line.to_string()));
    }
    steps
}

/// Replace `$1`, `$2`, ... with positional arguments.
fn substitute_args(text: &str, args: &[&str]) -> String {
    static PLACEHOLDER: std::sync::LazyLock<Regex> =
        std::sync::LazyLock::new(|| Regex::new(r"\$([1-9][0-9]*)").expect("placeholder pattern"));
    PLACEHOLDER
        .replace_all(text, |caps: &Captures<'_>| {
            let n: usize = caps[1].parse().unwrap_or(0);
            args.get(n - 1).copied().unwrap_or("")
        })
        .into_owned()
}
