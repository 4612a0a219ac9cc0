//! Command execution logic.
//!
//! Each function runs one command against the workspace and returns its
//! success payload as JSON. Failures are reported by the caller.

use serde::Serialize;
use serde_json::{Value, json};
use std::io::Read;
use std::path::Path;

use super::args::{
    DepsArgs, InitArgs, OpenArgs, ProjectArgs, RelatedArgs, SearchArgs, SessionAction, TeamArgs,
};
use crate::app::App;
use crate::config::init_workspace;
use crate::error::Result;
use crate::session::StageSubmission;

fn payload<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Execute the init command
pub async fn execute_init(dir: &Path, args: &InitArgs) -> Result<Option<Value>> {
    let result = init_workspace(dir).await?;
    if args.quiet {
        return Ok(None);
    }
    Ok(Some(json!({
        "success": true,
        "trellisDir": result.trellis_dir.display().to_string(),
        "configFile": result.config_file.display().to_string(),
        "graphFile": result.graph_file.display().to_string(),
        "sessionsFile": result.sessions_file.display().to_string(),
    })))
}

/// Execute the search command
pub async fn execute_search(app: &App, args: &SearchArgs) -> Result<Value> {
    payload(&app.graph().search_nodes(&args.query).await)
}

/// Execute the open command
pub async fn execute_open(app: &App, args: &OpenArgs) -> Result<Value> {
    payload(&app.graph().open_nodes(&args.names).await)
}

/// Execute the overview command
pub async fn execute_overview(app: &App, args: &ProjectArgs) -> Result<Value> {
    payload(&app.graph().get_project_overview(&args.project).await?)
}

/// Execute the deps command
pub async fn execute_deps(app: &App, args: &DepsArgs) -> Result<Value> {
    let depth = args.depth.unwrap_or(app.config().defaults.dependency_depth);
    payload(&app.graph().get_task_dependencies(&args.task, Some(depth)).await?)
}

/// Execute the team command
pub async fn execute_team(app: &App, args: &TeamArgs) -> Result<Value> {
    payload(&app.graph().get_team_member_assignments(&args.member).await?)
}

/// Execute the milestones command
pub async fn execute_milestones(app: &App, args: &ProjectArgs) -> Result<Value> {
    payload(&app.graph().get_milestone_progress(&args.project).await?)
}

/// Execute the timeline command
pub async fn execute_timeline(app: &App, args: &ProjectArgs) -> Result<Value> {
    payload(&app.graph().get_project_timeline(&args.project).await?)
}

/// Execute the resources command
pub async fn execute_resources(app: &App, args: &ProjectArgs) -> Result<Value> {
    payload(&app.graph().get_resource_allocation(&args.project).await?)
}

/// Execute the risks command
pub async fn execute_risks(app: &App, args: &ProjectArgs) -> Result<Value> {
    payload(&app.graph().get_project_risks(&args.project).await?)
}

/// Execute the related command
pub async fn execute_related(app: &App, args: &RelatedArgs) -> Result<Value> {
    let depth = args.depth.unwrap_or(app.config().defaults.related_depth);
    payload(&app.graph().find_related_projects(&args.project, Some(depth)).await?)
}

/// Execute the decisions command
pub async fn execute_decisions(app: &App, args: &ProjectArgs) -> Result<Value> {
    payload(&app.graph().get_decision_log(&args.project).await?)
}

/// Execute the health command
pub async fn execute_health(app: &App, args: &ProjectArgs) -> Result<Value> {
    payload(&app.graph().get_project_health(&args.project).await?)
}

/// Execute the sessions command
pub async fn execute_sessions(app: &App) -> Result<Value> {
    payload(&app.workflow().list_sessions().await?)
}

/// Execute a session action
pub async fn execute_session(app: &App, action: &SessionAction) -> Result<Value> {
    let workflow = app.workflow();
    match action {
        SessionAction::Start => {
            let id = workflow.start_session().await?;
            Ok(json!({ "success": true, "sessionId": id }))
        }
        SessionAction::Show { id } => payload(&workflow.get_session(id).await?),
        SessionAction::Submit { file } => {
            let input = match file {
                Some(path) => tokio::fs::read_to_string(path).await?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let submission: StageSubmission = serde_json::from_str(&input)?;
            payload(&workflow.submit_stage(submission).await?)
        }
    }
}
