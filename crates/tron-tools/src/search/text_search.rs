//! Text search engine — regex-based file content search.
//!
//! Recursively walks a directory, matching lines against a case-insensitive
//! regex pattern. Skips common build/hidden directories and binary files.
//! Results are formatted as `file:line: content`.

use std::fmt::Write;
use std::path::Path;

use regex::RegexBuilder;

const SKIP_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    ".next",
    "coverage",
    "__pycache__",
];
const DEFAULT_MAX_RESULTS: usize = 100;
const MAX_OUTPUT_TOKENS: usize = 15_000;

/// A single text search match.
pub struct TextMatch {
    /// Relative file path.
    pub file: String,
    /// 1-indexed line number.
    pub line: usize,
    /// Trimmed line content.
    pub content: String,
}

/// Result of a text search operation.
#[derive(Debug)]
pub struct TextSearchResult {
    /// Formatted output text.
    pub output: String,
    /// Number of matches found.
    pub matches: usize,
    /// Number of files searched.
    pub files_searched: usize,
    /// Whether output was truncated.
    pub truncated: bool,
}

/// Run a text search across files under `search_root`.
///
/// Returns formatted results in `file:line: content` format.
pub fn text_search(
    search_root: &Path,
    pattern: &str,
    file_pattern: Option<&str>,
    max_results: Option<usize>,
    context: Option<usize>,
) -> Result<TextSearchResult, String> {
    let regex = RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| format!("Invalid regex pattern: {e}"))?;

    let max_results = max_results.unwrap_or(DEFAULT_MAX_RESULTS);
    let _context_lines = context.unwrap_or(0);

    let file_glob = file_pattern.and_then(|fp| {
        globset::GlobBuilder::new(fp)
            .literal_separator(false)
            .build()
            .ok()
            .map(|g| g.compile_matcher())
    });

    let mut matches = Vec::new();
    let mut files_searched = 0;

    let walker = walkdir::WalkDir::new(search_root);
    for entry in walker.into_iter().filter_entry(|e| {
        let name = e.file_name().to_string_lossy();
        if e.depth() > 0 && e.file_type().is_dir() {
            if name.starts_with('.') {
                return false;
            }
            if SKIP_DIRS.contains(&name.as_ref()) {
                return false;
            }
        }
        true
    }) {
        let Ok(entry) = entry else { continue };
        if entry.file_type().is_dir() {
            continue;
        }

        let rel_path = entry
            .path()
            .strip_prefix(search_root)
            .unwrap_or(entry.path());

        // Apply file pattern filter
        if let Some(ref glob) = file_glob {
            let file_name = entry.file_name().to_string_lossy();
            if !glob.is_match(rel_path) && !glob.is_match(file_name.as_ref()) {
                continue;
            }
        }

        // Read file, skip binary
        let Ok(bytes) = std::fs::read(entry.path()) else {
            continue;
        };
        let check_len = bytes.len().min(8192);
        if bytes[..check_len].contains(&0) {
            continue;
        }

        let file_text = String::from_utf8_lossy(&bytes);
        files_searched += 1;

        for (line_idx, line) in file_text.lines().enumerate() {
            if regex.is_match(line) {
                matches.push(TextMatch {
                    file: rel_path.to_string_lossy().into_owned(),
                    line: line_idx + 1,
                    content: line.trim().to_string(),
                });

                if matches.len() >= max_results {
                    break;
                }
            }
        }

        if matches.len() >= max_results {
            break;
        }
    }

    if matches.is_empty() {
        return Ok(TextSearchResult {
            output: format!("No matches found for pattern: {pattern}"),
            matches: 0,
            files_searched,
            truncated: false,
        });
    }

    let hit_limit = matches.len() >= max_results;
    let match_count = matches.len();

    let mut output = String::new();
    for m in &matches {
        let _ = writeln!(output, "{}:{}: {}", m.file, m.line, m.content);
    }

    if hit_limit {
        let _ = writeln!(output, "\n[Showing {match_count} results (limit reached)]");
    }

    // Token-based truncation
    let token_count = crate::utils::truncation::estimate_tokens(output.len());
    let truncated = token_count > MAX_OUTPUT_TOKENS;
    if truncated {
        let max_chars = crate::utils::truncation::tokens_to_chars(MAX_OUTPUT_TOKENS);
        output.truncate(max_chars);
        output.push_str("\n... [output truncated]");
    }

    Ok(TextSearchResult {
        output,
        matches: match_count,
        files_searched,
        truncated,
    })
}
