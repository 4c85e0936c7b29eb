//! UI tools: `AskUserQuestion`, `NotifyApp`, `TaskManager`, `RenderAppUI`.

pub mod ask_user;
pub mod notify;
pub mod render_app_ui;
pub mod task_manager;
