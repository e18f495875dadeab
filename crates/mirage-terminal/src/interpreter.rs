//! Pipeline grammar and verb implementations.
//!
//! A pipeline is the command string split on literal `|`; each segment is
//! whitespace-split into `(verb, args)`. No quoting, escaping, or
//! redirection is supported. Stages are lazy chunk streams: the streaming
//! mode (worker thread) pulls bounded chunks stage to stage, the whole mode
//! (synchronous fallback) passes entire blobs — both run the same verb
//! implementations, so their concatenated output is identical.
//!
//! Grammar errors (unknown verb, missing file) and resource-limit errors are
//! not `Err`s: they degrade to a single descriptive chunk that becomes the
//! pipeline's entire output.

use std::collections::BTreeMap;
use std::iter;
use std::mem;

use regex::RegexBuilder;
use serde_json::Value;

/// Chunk size used by the streaming mode for file-sourced output.
pub const STREAM_CHUNK_BYTES: usize = 64 * 1024;

/// Cap on the materialized input of a blocking stage (`sort`, `uniq`).
pub const BLOCKING_STAGE_CAP_BYTES: usize = 1024 * 1024;

/// How stage output is chunked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkMode {
    /// Bounded chunks for stage-to-stage streaming.
    Streaming,
    /// Whole blobs; used by the synchronous path.
    Whole,
}

type ChunkIter<'a> = Box<dyn Iterator<Item = String> + 'a>;

const VERBS: &[&str] = &["cat", "grep", "sort", "uniq", "jq"];

/// Evaluate a pipeline string against a files map, producing a lazy chunk
/// stream.
pub fn eval<'a>(
    command: &str,
    files: &'a BTreeMap<String, String>,
    mode: ChunkMode,
) -> ChunkIter<'a> {
    let stages: Vec<Vec<String>> = command
        .split('|')
        .map(|seg| seg.split_whitespace().map(str::to_string).collect())
        .filter(|tokens: &Vec<String>| !tokens.is_empty())
        .collect();

    // An unknown verb anywhere short-circuits the whole pipeline; no stage
    // runs.
    for tokens in &stages {
        let verb = tokens[0].as_str();
        if !VERBS.contains(&verb) {
            return Box::new(iter::once(format!("command not found: {verb}\n")));
        }
    }

    let mut stream: ChunkIter<'a> = Box::new(iter::empty());
    for tokens in stages {
        let verb = tokens[0].clone();
        let args: Vec<String> = tokens[1..].to_vec();
        stream = match verb.as_str() {
            "cat" => cat_stage(&args, stream, files, mode),
            "grep" => grep_stage(&args, stream, files),
            "sort" => sort_stage(stream),
            "uniq" => uniq_stage(stream),
            "jq" => jq_stage(&args, stream, files),
            _ => unreachable!("verbs are validated above"),
        };
    }
    stream
}

/// Evaluate a pipeline synchronously and join all output chunks.
pub fn eval_to_string(command: &str, files: &BTreeMap<String, String>) -> String {
    eval(command, files, ChunkMode::Whole).collect()
}

// ---------------------------------------------------------------------------
// Stage helpers
// ---------------------------------------------------------------------------

fn missing_file(verb: &str, name: &str) -> String {
    format!("{verb}: {name}: No such file\n")
}

fn once<'a>(chunk: String) -> ChunkIter<'a> {
    Box::new(iter::once(chunk))
}

/// Split text into chunks of at most `size` bytes on char boundaries.
fn chunk_text(text: &str, size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if current.len() + ch.len_utf8() > size && !current.is_empty() {
            chunks.push(mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Re-frame an arbitrary chunk stream into complete lines.
///
/// Chunk boundaries carry no meaning; a line may span many chunks. Lines are
/// yielded without their terminator (a trailing `\r` is dropped, matching
/// `str::lines`), and a final unterminated line is yielded at end of input.
struct LineStream<'a> {
    input: ChunkIter<'a>,
    buf: String,
    done: bool,
}

impl<'a> LineStream<'a> {
    fn new(input: ChunkIter<'a>) -> Self {
        Self {
            input,
            buf: String::new(),
            done: false,
        }
    }
}

impl Iterator for LineStream<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if let Some(pos) = self.buf.find('\n') {
                let mut line: String = self.buf.drain(..=pos).collect();
                line.pop();
                if line.ends_with('\r') {
                    line.pop();
                }
                return Some(line);
            }
            if self.done {
                if self.buf.is_empty() {
                    return None;
                }
                return Some(mem::take(&mut self.buf));
            }
            match self.input.next() {
                Some(chunk) => self.buf.push_str(&chunk),
                None => self.done = true,
            }
        }
    }
}

/// Drain a stream into one string, bailing out once `cap` bytes are
/// exceeded.
fn materialize(input: ChunkIter<'_>, cap: usize) -> Option<String> {
    let mut text = String::new();
    for chunk in input {
        text.push_str(&chunk);
        if text.len() > cap {
            return None;
        }
    }
    Some(text)
}

// ---------------------------------------------------------------------------
// cat
// ---------------------------------------------------------------------------

fn cat_stage<'a>(
    args: &[String],
    input: ChunkIter<'a>,
    files: &'a BTreeMap<String, String>,
    mode: ChunkMode,
) -> ChunkIter<'a> {
    let Some(name) = args.first() else {
        // No argument: pass upstream through unchanged.
        return input;
    };
    match files.get(name) {
        Some(text) => match mode {
            ChunkMode::Whole => once(text.clone()),
            ChunkMode::Streaming => Box::new(chunk_text(text, STREAM_CHUNK_BYTES).into_iter()),
        },
        None => once(missing_file("cat", name)),
    }
}

// ---------------------------------------------------------------------------
// grep
// ---------------------------------------------------------------------------

fn grep_stage<'a>(
    args: &[String],
    input: ChunkIter<'a>,
    files: &'a BTreeMap<String, String>,
) -> ChunkIter<'a> {
    let mut case_insensitive = false;
    let mut numbered = false;
    let mut idx = 0;
    while idx < args.len() {
        match args[idx].as_str() {
            "-i" => case_insensitive = true,
            "-n" => numbered = true,
            _ => break,
        }
        idx += 1;
    }
    let Some(pattern) = args.get(idx) else {
        return once("usage: grep [-i] [-n] <pattern> [file]\n".to_string());
    };

    let regex = match RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
    {
        Ok(re) => re,
        Err(_) => return once(format!("grep: invalid pattern: {pattern}\n")),
    };

    let lines: Box<dyn Iterator<Item = String> + 'a> = match args.get(idx + 1) {
        Some(name) => match files.get(name) {
            Some(text) => Box::new(text.lines().map(str::to_string)),
            None => return once(missing_file("grep", name)),
        },
        None => Box::new(LineStream::new(input)),
    };

    Box::new(lines.enumerate().filter_map(move |(i, line)| {
        if regex.is_match(&line) {
            Some(if numbered {
                format!("{}:{line}\n", i + 1)
            } else {
                format!("{line}\n")
            })
        } else {
            None
        }
    }))
}

// ---------------------------------------------------------------------------
// sort / uniq (blocking stages)
// ---------------------------------------------------------------------------

fn sort_stage<'a>(input: ChunkIter<'a>) -> ChunkIter<'a> {
    let Some(text) = materialize(input, BLOCKING_STAGE_CAP_BYTES) else {
        return once("sort: data limit exceeded\n".to_string());
    };
    let mut lines: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();
    lines.sort_unstable();
    if lines.is_empty() {
        return Box::new(iter::empty());
    }
    once(format!("{}\n", lines.join("\n")))
}

fn uniq_stage<'a>(input: ChunkIter<'a>) -> ChunkIter<'a> {
    let Some(text) = materialize(input, BLOCKING_STAGE_CAP_BYTES) else {
        return once("uniq: data limit exceeded\n".to_string());
    };
    let mut kept: Vec<&str> = Vec::new();
    for line in text.lines() {
        // Only adjacent duplicates collapse; non-adjacent repeats survive.
        if kept.last().copied() != Some(line) {
            kept.push(line);
        }
    }
    if kept.is_empty() {
        return Box::new(iter::empty());
    }
    once(format!("{}\n", kept.join("\n")))
}

// ---------------------------------------------------------------------------
// jq
// ---------------------------------------------------------------------------

fn jq_stage<'a>(
    args: &[String],
    input: ChunkIter<'a>,
    files: &'a BTreeMap<String, String>,
) -> ChunkIter<'a> {
    let Some(path) = args.first() else {
        return once("usage: jq <path> [file]\n".to_string());
    };

    let source = match args.get(1) {
        Some(name) => match files.get(name) {
            Some(text) => text.clone(),
            None => return once(missing_file("jq", name)),
        },
        None => input.collect(),
    };

    let value: Value = match serde_json::from_str(&source) {
        Ok(v) => v,
        Err(_) => return once("jq: invalid JSON input\n".to_string()),
    };

    // Dot-separated property path; any absent segment yields null.
    let null = Value::Null;
    let mut current = &value;
    for segment in path.trim_start_matches('.').split('.') {
        if segment.is_empty() {
            continue;
        }
        match current.get(segment) {
            Some(next) => current = next,
            None => {
                current = &null;
                break;
            },
        }
    }

    match serde_json::to_string_pretty(current) {
        Ok(rendered) => once(format!("{rendered}\n")),
        Err(_) => once("jq: invalid JSON input\n".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn files(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn run_streaming(command: &str, files: &BTreeMap<String, String>) -> String {
        eval(command, files, ChunkMode::Streaming).collect()
    }

    #[test]
    fn cat_emits_file_contents() {
        let fs = files(&[("a.txt", "hello\nworld\n")]);
        assert_eq!(eval_to_string("cat a.txt", &fs), "hello\nworld\n");
    }

    #[test]
    fn cat_missing_file() {
        let fs = files(&[]);
        assert_eq!(eval_to_string("cat nope", &fs), "cat: nope: No such file\n");
    }

    #[test]
    fn cat_without_argument_passes_input_through() {
        let fs = files(&[("a.txt", "data\n")]);
        assert_eq!(eval_to_string("cat a.txt | cat", &fs), "data\n");
    }

    #[test]
    fn cat_streaming_chunks_large_files() {
        let big = "x".repeat(STREAM_CHUNK_BYTES * 2 + 17);
        let fs = files(&[("big", big.as_str())]);
        let chunks: Vec<String> = eval("cat big", &fs, ChunkMode::Streaming).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.concat(), big);
    }

    #[test]
    fn grep_filters_lines() {
        let fs = files(&[("log", "alpha\nbeta\ngamma\nalpine\n")]);
        assert_eq!(eval_to_string("grep alp log", &fs), "alpha\nalpine\n");
    }

    #[test]
    fn grep_case_insensitive_flag() {
        let fs = files(&[("log", "Alpha\nbeta\nALPINE\n")]);
        assert_eq!(eval_to_string("grep -i alp log", &fs), "Alpha\nALPINE\n");
    }

    #[test]
    fn grep_numbers_against_prefilter_lines() {
        let fs = files(&[("log", "skip\nkeep one\nskip\nkeep two\n")]);
        // Line numbers come from the source sequence, not the output.
        assert_eq!(
            eval_to_string("grep -n keep log", &fs),
            "2:keep one\n4:keep two\n"
        );
    }

    #[test]
    fn grep_flags_in_any_order() {
        let fs = files(&[("log", "KEEP\nother\n")]);
        assert_eq!(eval_to_string("grep -n -i keep log", &fs), "1:KEEP\n");
        assert_eq!(eval_to_string("grep -i -n keep log", &fs), "1:KEEP\n");
    }

    #[test]
    fn grep_missing_file() {
        let fs = files(&[]);
        assert_eq!(
            eval_to_string("grep pat nope", &fs),
            "grep: nope: No such file\n"
        );
    }

    #[test]
    fn grep_invalid_pattern_degrades() {
        let fs = files(&[("log", "x\n")]);
        assert_eq!(
            eval_to_string("grep ( log", &fs),
            "grep: invalid pattern: (\n"
        );
    }

    #[test]
    fn grep_reads_upstream_when_no_file() {
        let fs = files(&[("log", "one\ntwo\nthree\n")]);
        assert_eq!(eval_to_string("cat log | grep t", &fs), "two\nthree\n");
    }

    #[test]
    fn sort_drops_empty_lines_and_orders() {
        let fs = files(&[("f", "b\n\na\n")]);
        assert_eq!(eval_to_string("cat f | sort", &fs), "a\nb\n");
    }

    #[test]
    fn sort_over_cap_degrades() {
        let big = "line\n".repeat(BLOCKING_STAGE_CAP_BYTES / 4);
        let fs = files(&[("big", big.as_str())]);
        assert_eq!(
            eval_to_string("cat big | sort", &fs),
            "sort: data limit exceeded\n"
        );
    }

    #[test]
    fn uniq_collapses_adjacent_only() {
        let fs = files(&[("f", "a\na\nb\na\n")]);
        assert_eq!(eval_to_string("cat f | uniq", &fs), "a\nb\na\n");
    }

    #[test]
    fn uniq_over_cap_degrades() {
        let big = "z\n".repeat(BLOCKING_STAGE_CAP_BYTES);
        let fs = files(&[("big", big.as_str())]);
        assert_eq!(
            eval_to_string("cat big | uniq", &fs),
            "uniq: data limit exceeded\n"
        );
    }

    #[test]
    fn jq_walks_property_path() {
        let fs = files(&[("cfg.json", r#"{"a":{"b":42}}"#)]);
        assert_eq!(eval_to_string("jq .a.b cfg.json", &fs), "42\n");
    }

    #[test]
    fn jq_absent_segment_is_null() {
        let fs = files(&[("cfg.json", r#"{"a":1}"#)]);
        assert_eq!(eval_to_string("jq .missing.deep cfg.json", &fs), "null\n");
    }

    #[test]
    fn jq_whole_document() {
        let fs = files(&[("cfg.json", r#"{"k":1}"#)]);
        assert_eq!(eval_to_string("jq . cfg.json", &fs), "{\n  \"k\": 1\n}\n");
    }

    #[test]
    fn jq_invalid_json() {
        let fs = files(&[("bad", "not json")]);
        assert_eq!(eval_to_string("jq .a bad", &fs), "jq: invalid JSON input\n");
    }

    #[test]
    fn jq_missing_file() {
        let fs = files(&[]);
        assert_eq!(eval_to_string("jq .a nope", &fs), "jq: nope: No such file\n");
    }

    #[test]
    fn jq_reads_upstream() {
        let fs = files(&[("cfg.json", r#"{"a":"x"}"#)]);
        assert_eq!(eval_to_string("cat cfg.json | jq .a", &fs), "\"x\"\n");
    }

    #[test]
    fn unknown_verb_short_circuits() {
        let fs = files(&[("x", "data\n")]);
        assert_eq!(eval_to_string("foo | cat x", &fs), "command not found: foo\n");
        assert_eq!(eval_to_string("cat x | foo", &fs), "command not found: foo\n");
    }

    #[test]
    fn streaming_and_whole_modes_agree() {
        let fs = files(&[("f", "Apple\nbanana\nAPPLE\ncherry\nbanana\n")]);
        for command in [
            "cat f",
            "cat f | grep -i apple",
            "cat f | grep -n an",
            "cat f | sort",
            "cat f | sort | uniq",
            "cat f | grep -i a | sort | uniq",
        ] {
            assert_eq!(
                run_streaming(command, &fs),
                eval_to_string(command, &fs),
                "modes diverge for {command}"
            );
        }
    }

    #[test]
    fn streaming_grep_across_chunk_boundaries() {
        // Large enough that streaming cat splits the text mid-line.
        let body = "abcdefghij".repeat(10);
        let mut text = String::new();
        for i in 0..2000 {
            text.push_str(&format!("{i} {body}\n"));
        }
        let fs = files(&[("big", text.as_str())]);
        let command = "cat big | grep -n 1999";
        let streamed = run_streaming(command, &fs);
        assert_eq!(streamed, eval_to_string(command, &fs));
        assert!(streamed.starts_with("2000:"));
    }

    #[test]
    fn line_stream_joins_split_lines() {
        let chunks: ChunkIter<'_> = Box::new(
            vec!["par".to_string(), "tial\nwho".to_string(), "le\n".to_string()].into_iter(),
        );
        let lines: Vec<String> = LineStream::new(chunks).collect();
        assert_eq!(lines, ["partial", "whole"]);
    }

    #[test]
    fn line_stream_yields_final_unterminated_line() {
        let chunks: ChunkIter<'_> = Box::new(vec!["a\nb".to_string()].into_iter());
        let lines: Vec<String> = LineStream::new(chunks).collect();
        assert_eq!(lines, ["a", "b"]);
    }

    proptest! {
        #[test]
        fn modes_agree_on_arbitrary_content(text in "[a-cA-C\n]{0,200}", pat in "[a-c]{1,2}") {
            let fs = files(&[("f", text.as_str())]);
            let command = format!("cat f | grep -i {pat} | sort");
            prop_assert_eq!(
                run_streaming(&command, &fs),
                eval_to_string(&command, &fs)
            );
        }
    }
}
