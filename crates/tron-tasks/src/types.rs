//! Core types for task, project, and area management.
//!
//! All row types and their create/update/filter companions. Enums persist as
//! lowercase `snake_case` strings in SQLite (`as_sql`) and serialize the same
//! way over the wire.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Captured but not yet actionable.
    Backlog,
    /// Actionable, not yet started.
    Pending,
    /// Actively being worked.
    InProgress,
    /// Finished successfully.
    Completed,
    /// Abandoned.
    Cancelled,
}

impl TaskStatus {
    /// SQL column representation.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Terminal statuses no longer participate in active-task views.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Priority level of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl TaskPriority {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Who or what created a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSource {
    Agent,
    User,
    Skill,
    System,
}

impl TaskSource {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::User => "user",
            Self::Skill => "skill",
            Self::System => "system",
        }
    }
}

/// Lifecycle state of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    Paused,
    Completed,
    Archived,
}

impl ProjectStatus {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }
}

/// Lifecycle state of an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaStatus {
    Active,
    Archived,
}

impl AreaStatus {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }
}

/// Kind of relationship between two tasks in `task_dependencies`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyRelationship {
    /// Blocker must complete before blocked can start.
    Blocks,
    /// Informational link; no ordering implied.
    Related,
}

impl DependencyRelationship {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Blocks => "blocks",
            Self::Related => "related",
        }
    }
}

/// Kind of audit entry recorded in `task_activity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Created,
    StatusChanged,
    Updated,
    NoteAdded,
    TimeLogged,
    DependencyAdded,
    DependencyRemoved,
    Moved,
    Deleted,
}

impl ActivityAction {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::StatusChanged => "status_changed",
            Self::Updated => "updated",
            Self::NoteAdded => "note_added",
            Self::TimeLogged => "time_logged",
            Self::DependencyAdded => "dependency_added",
            Self::DependencyRemoved => "dependency_removed",
            Self::Moved => "moved",
            Self::Deleted => "deleted",
        }
    }
}

/// A single actionable unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub project_id: Option<String>,
    pub parent_task_id: Option<String>,
    pub workspace_id: Option<String>,
    pub area_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub active_form: Option<String>,
    pub notes: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub source: TaskSource,
    pub tags: Vec<String>,
    pub due_date: Option<String>,
    pub deferred_until: Option<String>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub estimated_minutes: Option<i32>,
    pub actual_minutes: i32,
    pub created_by_session_id: Option<String>,
    pub last_session_id: Option<String>,
    pub last_session_at: Option<String>,
    pub sort_order: i64,
    pub metadata: Option<serde_json::Value>,
}

/// A grouping of related tasks toward an outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub workspace_id: Option<String>,
    pub area_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// A long-lived sphere of responsibility (PARA "area").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    pub id: String,
    pub workspace_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: AreaStatus,
    pub tags: Vec<String>,
    pub sort_order: f64,
    pub created_at: String,
    pub updated_at: String,
    pub metadata: Option<serde_json::Value>,
}

/// A directed edge between two tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDependency {
    pub blocker_task_id: String,
    pub blocked_task_id: String,
    pub relationship: DependencyRelationship,
    pub created_at: String,
}

/// A single audit-trail entry for a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskActivity {
    pub id: i64,
    pub task_id: String,
    pub session_id: Option<String>,
    pub event_id: Option<String>,
    pub action: ActivityAction,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub detail: Option<String>,
    pub minutes_logged: Option<i32>,
    pub timestamp: String,
}

/// A task enriched with everything a client needs to render a detail view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskWithDetails {
    pub task: Task,
    pub subtasks: Vec<Task>,
    pub blocked_by: Vec<TaskDependency>,
    pub blocks: Vec<TaskDependency>,
    pub recent_activity: Vec<TaskActivity>,
}

/// A project with its task completion counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectWithProgress {
    pub project: Project,
    pub task_count: u32,
    pub completed_task_count: u32,
}

/// An area with its project and task counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaWithCounts {
    pub area: Area,
    pub project_count: u32,
    pub task_count: u32,
    pub active_task_count: u32,
}

/// Parameters to create a task. `..Default::default()` covers optional fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreateParams {
    pub title: String,
    pub description: Option<String>,
    pub active_form: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub source: Option<TaskSource>,
    pub tags: Option<Vec<String>>,
    pub due_date: Option<String>,
    pub deferred_until: Option<String>,
    pub estimated_minutes: Option<i32>,
    pub project_id: Option<String>,
    pub parent_task_id: Option<String>,
    pub area_id: Option<String>,
    pub workspace_id: Option<String>,
    pub created_by_session_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Parameters to update a task. Every field is a patch — `None` leaves the
/// column untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdateParams {
    pub title: Option<String>,
    pub description: Option<String>,
    pub active_form: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub project_id: Option<String>,
    pub parent_task_id: Option<String>,
    pub area_id: Option<String>,
    pub due_date: Option<String>,
    pub deferred_until: Option<String>,
    pub estimated_minutes: Option<i32>,
    pub add_tags: Option<Vec<String>>,
    pub remove_tags: Option<Vec<String>>,
    pub add_note: Option<String>,
    pub last_session_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Filter for listing tasks. Exclusion flags default to `false`, matching
/// the "don't show me noise" default view.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub project_id: Option<String>,
    pub workspace_id: Option<String>,
    pub area_id: Option<String>,
    pub parent_task_id: Option<String>,
    pub due_before: Option<String>,
    pub tags: Option<Vec<String>>,
    pub include_completed: bool,
    pub include_deferred: bool,
    pub include_backlog: bool,
}

/// Page of tasks plus the total matching count (ignoring `limit`/`offset`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListResult {
    pub tasks: Vec<Task>,
    pub total: u32,
}

/// Parameters to create a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCreateParams {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub tags: Option<Vec<String>>,
    pub area_id: Option<String>,
    pub workspace_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Parameters to update a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdateParams {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub area_id: Option<String>,
    pub add_tags: Option<Vec<String>>,
    pub remove_tags: Option<Vec<String>>,
    pub metadata: Option<serde_json::Value>,
}

/// Filter for listing projects.
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    pub status: Option<ProjectStatus>,
    pub workspace_id: Option<String>,
    pub area_id: Option<String>,
}

/// Page of projects-with-progress plus the total matching count.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectListResult {
    pub projects: Vec<ProjectWithProgress>,
    pub total: u32,
}

/// Parameters to create an area.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaCreateParams {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<AreaStatus>,
    pub tags: Option<Vec<String>>,
    pub sort_order: Option<f64>,
    pub workspace_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Parameters to update an area.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaUpdateParams {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<AreaStatus>,
    pub sort_order: Option<f64>,
    pub add_tags: Option<Vec<String>>,
    pub remove_tags: Option<Vec<String>>,
    pub metadata: Option<serde_json::Value>,
}

/// Filter for listing areas.
#[derive(Debug, Clone, Default)]
pub struct AreaFilter {
    pub status: Option<AreaStatus>,
    pub workspace_id: Option<String>,
}

/// Page of areas-with-counts plus the total matching count.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaListResult {
    pub areas: Vec<AreaWithCounts>,
    pub total: u32,
}

/// Parameters to log a `task_activity` row.
#[derive(Debug, Clone)]
pub struct LogActivityParams {
    pub task_id: String,
    pub session_id: Option<String>,
    pub event_id: Option<String>,
    pub action: ActivityAction,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub detail: Option<String>,
    pub minutes_logged: Option<i32>,
}

/// Summary of active work, for LLM context injection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveTaskSummary {
    pub in_progress: Vec<Task>,
    pub pending_count: u32,
    pub overdue_count: u32,
    pub deferred_count: u32,
}

/// A project's completion ratio, for LLM context injection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectProgressEntry {
    pub title: String,
    pub completed: u32,
    pub total: u32,
}
