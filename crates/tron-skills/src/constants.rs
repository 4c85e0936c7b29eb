//! Constants for skill discovery.

/// Filename that marks a directory as a skill.
pub const SKILL_MD_FILENAME: &str = "SKILL.md";

/// Global skills directory, relative to `$HOME`.
pub const GLOBAL_SKILLS_DIR: &str = ".tron/skills";

/// Project-local skill directories, relative to the working directory,
/// in precedence order (earlier entries are scanned first; the registry
/// still lets directory order determine which project skill wins a
/// same-name collision).
pub const PROJECT_SKILLS_DIRS: &[&str] = &[".claude/skills", ".tron/skills"];

/// Maximum size of a single `SKILL.md` file, in bytes.
pub const MAX_SKILL_FILE_SIZE: u64 = 1_048_576;
