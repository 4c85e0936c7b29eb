//! Shared types for the skills subsystem.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a skill was discovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillSource {
    /// Loaded from `~/.tron/skills/`.
    Global,
    /// Loaded from a project-local skills directory.
    Project,
}

impl fmt::Display for SkillSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Project => write!(f, "project"),
        }
    }
}

/// Whether a skill is allowed to run as an isolated subagent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillSubagentMode {
    /// Never run as a subagent; inject directly into the main context.
    No,
    /// Ask the user before running as a subagent.
    Ask,
    /// Always run as a subagent.
    Yes,
}

/// How a skill came to be active in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillAddMethod {
    /// Explicitly requested via `@name`.
    Explicit,
    /// Auto-injected because the user message mentioned the skill's trigger.
    Mention,
}

/// A single denied-tool-parameter pattern rule from skill frontmatter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillDeniedPatternRule {
    /// Tool this rule applies to.
    pub tool: String,
    /// Patterns to deny, one entry per denied parameter.
    pub deny_patterns: Vec<DenyPattern>,
    /// Optional human-readable denial message.
    pub message: Option<String>,
}

/// A single parameter/pattern pair within a [`SkillDeniedPatternRule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenyPattern {
    /// Tool parameter name the pattern is matched against.
    pub parameter: String,
    /// Regex patterns; any match denies the call.
    pub patterns: Vec<String>,
}

/// Parsed `SKILL.md` YAML frontmatter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillFrontmatter {
    /// Display name override.
    pub name: Option<String>,
    /// Short description override.
    pub description: Option<String>,
    /// Skill version string.
    pub version: Option<String>,
    /// Model to use when running this skill as a subagent.
    pub subagent_model: Option<String>,
    /// Subagent execution mode.
    pub subagent: Option<SkillSubagentMode>,
    /// Free-form tags.
    pub tags: Option<Vec<String>>,
    /// Tools this skill allows; all others are denied.
    pub allowed_tools: Option<Vec<String>>,
    /// Tools this skill denies outright.
    pub denied_tools: Option<Vec<String>>,
    /// Parameter-pattern-level denial rules.
    pub denied_patterns: Option<Vec<SkillDeniedPatternRule>>,
}

/// Full metadata and content for a loaded skill.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillMetadata {
    /// Directory name (stable identifier used to reference the skill).
    pub name: String,
    /// Human-facing name (frontmatter override or the directory name).
    pub display_name: String,
    /// Short description (frontmatter override or first body line).
    pub description: String,
    /// Markdown body after frontmatter.
    pub content: String,
    /// Parsed frontmatter.
    pub frontmatter: SkillFrontmatter,
    /// Where this skill was discovered.
    pub source: SkillSource,
    /// Absolute path to the skill's directory.
    pub path: String,
    /// Absolute path to the skill's `SKILL.md`.
    pub skill_md_path: String,
    /// Names of non-`SKILL.md` files alongside it.
    pub additional_files: Vec<String>,
    /// Last-modified time of `SKILL.md`, milliseconds since the Unix epoch.
    pub last_modified: u64,
}

/// Lightweight listing projection of a [`SkillMetadata`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillInfo {
    /// Stable identifier.
    pub name: String,
    /// Human-facing name.
    pub display_name: String,
    /// Short description.
    pub description: String,
    /// Where the skill was discovered.
    pub source: SkillSource,
}

impl From<&SkillMetadata> for SkillInfo {
    fn from(skill: &SkillMetadata) -> Self {
        Self {
            name: skill.name.clone(),
            display_name: skill.display_name.clone(),
            description: skill.description.clone(),
            source: skill.source,
        }
    }
}

/// Information about a skill active within a session.
#[derive(Debug, Clone, PartialEq)]
pub struct AddedSkillInfo {
    /// Stable identifier.
    pub name: String,
    /// Where the skill was discovered.
    pub source: SkillSource,
    /// How it was added to the session.
    pub added_via: SkillAddMethod,
    /// The event that recorded the addition, if reconstructed from history.
    pub event_id: Option<String>,
    /// Estimated token cost of the skill's content, if known.
    pub tokens: Option<u64>,
}

/// Resolved tool-denial configuration derived from skill frontmatter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolDenialConfig {
    /// Tool names denied outright.
    pub denied_tools: Vec<String>,
    /// Parameter-pattern-level denial rules.
    pub denied_patterns: Vec<SkillDeniedPatternRule>,
}

/// Error encountered while scanning or loading a single skill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillScanError {
    /// Path of the file or directory that failed.
    pub path: String,
    /// Human-readable description of the failure.
    pub message: String,
    /// Whether scanning can continue past this error.
    pub recoverable: bool,
}

/// Result of scanning a directory for skills.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillScanResult {
    /// Successfully loaded skills.
    pub skills: Vec<SkillMetadata>,
    /// Errors for directories that failed to load as skills.
    pub errors: Vec<SkillScanError>,
}
