//! Output truncation against an estimated token budget.
//!
//! Uses a fast chars-per-token heuristic rather than a real tokenizer — this
//! is a safety valve against blowing the context window, not a billing figure.

const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token count of a string of the given character length.
pub fn estimate_tokens(char_len: usize) -> usize {
    char_len.div_ceil(CHARS_PER_TOKEN)
}

/// Convert a token budget to an approximate character budget.
pub fn tokens_to_chars(tokens: usize) -> usize {
    tokens * CHARS_PER_TOKEN
}

/// Controls how much of the head/tail of truncated output survives.
#[derive(Clone, Debug)]
pub struct TruncateOptions {
    /// Number of leading lines always kept.
    pub preserve_start_lines: usize,
    /// Number of trailing lines always kept.
    pub preserve_end_lines: usize,
}

impl Default for TruncateOptions {
    fn default() -> Self {
        Self {
            preserve_start_lines: 10,
            preserve_end_lines: 10,
        }
    }
}

/// Result of a truncation pass.
pub struct TruncateResult {
    /// The (possibly truncated) content.
    pub content: String,
    /// Number of lines omitted from the middle, if any.
    pub omitted_lines: usize,
}

/// Truncate `content` to fit within `max_tokens`, preserving head and tail lines.
pub fn truncate_output(content: &str, max_tokens: usize, opts: &TruncateOptions) -> TruncateResult {
    let budget_chars = tokens_to_chars(max_tokens);
    if content.len() <= budget_chars {
        return TruncateResult {
            content: content.to_string(),
            omitted_lines: 0,
        };
    }

    let lines: Vec<&str> = content.lines().collect();
    let keep = opts.preserve_start_lines + opts.preserve_end_lines;
    if lines.len() <= keep {
        return TruncateResult {
            content: content.to_string(),
            omitted_lines: 0,
        };
    }

    let start = &lines[..opts.preserve_start_lines];
    let end = &lines[lines.len() - opts.preserve_end_lines..];
    let omitted = lines.len() - keep;

    let mut out = start.join("\n");
    out.push_str(&format!("\n... [{omitted} lines omitted] ...\n"));
    out.push_str(&end.join("\n"));

    TruncateResult {
        content: out,
        omitted_lines: omitted,
    }
}
