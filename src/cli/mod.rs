use std::{collections::HashSet, str::FromStr, sync::Arc};

use chrono::Utc;
use clap::{Args, Subcommand};
use serde_json::{Value, json};
use tracing::error;

use crate::{
    activity::{DEFAULT_ACTIVITY_LIMIT, format::relative_time},
    api::BoardApi,
    board::Board,
    drag::MoveIntent,
    error::{ApiError, BoardError},
    reconcile::{Proposal, Resolution},
    types::{ActivityEvent, ProjectId, Task, TaskId, TaskStatus},
};

const SCHEMA_VERSION: &str = "cli.v1";
const MAX_ACTIVITY_LIMIT: usize = 50;

#[derive(Debug, Clone, Subcommand)]
pub enum RootCommand {
    /// Print the three status columns and the board summary.
    Board,
    /// Move a task to another status and wait for the server to confirm.
    Move(MoveArgs),
    /// Print the most recent project activity.
    Activity(ActivityArgs),
}

#[derive(Debug, Clone, Args)]
pub struct MoveArgs {
    #[arg(long, value_name = "TASK_ID")]
    pub id: String,

    #[arg(long, value_name = "TODO|IN_PROGRESS|DONE")]
    pub status: String,
}

#[derive(Debug, Clone, Args)]
pub struct ActivityArgs {
    #[arg(long, value_name = "N", default_value_t = DEFAULT_ACTIVITY_LIMIT)]
    pub limit: usize,
}

pub async fn run<A: BoardApi>(
    api: Arc<A>,
    project_id: ProjectId,
    command: RootCommand,
    json_output: bool,
    quiet: bool,
) -> i32 {
    match execute(api, project_id, command).await {
        Ok(output) => {
            print_success(output, json_output, quiet);
            0
        }
        Err(err) => {
            print_error(&err, json_output);
            err.exit_code
        }
    }
}

#[derive(Debug)]
struct CommandOutput {
    command: &'static str,
    project: ProjectId,
    data: Value,
    text: String,
}

#[derive(Debug)]
struct CliError {
    exit_code: i32,
    code: &'static str,
    message: String,
    details: Option<Value>,
}

type CliResult<T> = Result<T, CliError>;

async fn execute<A: BoardApi>(
    api: Arc<A>,
    project_id: ProjectId,
    command: RootCommand,
) -> CliResult<CommandOutput> {
    match command {
        RootCommand::Board => board_show(api, project_id).await,
        RootCommand::Move(args) => task_move(api, project_id, args).await,
        RootCommand::Activity(args) => activity_list(api, project_id, args).await,
    }
}

async fn board_show<A: BoardApi>(api: Arc<A>, project_id: ProjectId) -> CliResult<CommandOutput> {
    let mut board = Board::new(api, project_id, false);
    board.load().await.map_err(|err| classify_board_error(&err))?;

    let columns = board.columns();
    let summary = board.summary();
    let mut data_columns = serde_json::Map::new();
    for (status, tasks) in columns.iter() {
        data_columns.insert(
            status.as_str().to_string(),
            Value::Array(tasks.iter().map(|task| task_json(task)).collect()),
        );
    }

    let rows = columns
        .iter()
        .flat_map(|(status, tasks)| {
            tasks.iter().map(move |task| {
                vec![
                    status.label().to_string(),
                    task.id.to_string(),
                    task.title.replace('\n', " "),
                    task.assignee_summary(),
                ]
            })
        })
        .collect::<Vec<_>>();

    let name = board.project_name().unwrap_or_default().to_string();
    let mut text = render_text_table(&["STATUS", "ID", "TITLE", "ASSIGNEES"], &rows);
    text.push_str(&format!(
        "\n{name}: {} tasks, {} to do, {} doing, {} done ({:.1}% complete)",
        summary.total, summary.todo, summary.in_progress, summary.done, summary.completion_rate
    ));

    Ok(CommandOutput {
        command: "board",
        project: project_id,
        data: json!({
            "name": name,
            "description": board.project_description(),
            "columns": data_columns,
            "summary": summary,
        }),
        text,
    })
}

async fn task_move<A: BoardApi>(
    api: Arc<A>,
    project_id: ProjectId,
    args: MoveArgs,
) -> CliResult<CommandOutput> {
    let task_id = TaskId::from_str(&args.id)
        .map_err(|_| usage_error("INVALID_TASK_ID", format!("invalid task id '{}'", args.id)))?;
    let target = TaskStatus::from_str(&args.status).map_err(|_| {
        usage_error(
            "INVALID_STATUS",
            format!(
                "invalid status '{}', expected one of TODO, IN_PROGRESS, DONE",
                args.status
            ),
        )
    })?;

    let mut board = Board::new(api, project_id, true);
    board.load().await.map_err(|err| classify_board_error(&err))?;
    let previous = board.task(task_id).and_then(|task| task.status);

    let proposal = board
        .propose_move(MoveIntent { task_id, target })
        .map_err(|err| classify_board_error(&err))?;

    let outcome = match proposal {
        Proposal::Unchanged => "unchanged",
        Proposal::Issued { .. } => match board.next_resolution().await {
            Some(Resolution::Confirmed { .. }) => "moved",
            Some(Resolution::RolledBack { error, .. }) => {
                return Err(classify_board_error(&error));
            }
            None => return Err(runtime_error("move finished without a resolution")),
        },
    };

    let text = match outcome {
        "moved" => format!(
            "task {task_id} moved from {} to {}",
            previous.map_or("unknown", TaskStatus::label),
            target.label()
        ),
        _ => format!("task {task_id} is already in {}", target.label()),
    };

    Ok(CommandOutput {
        command: "move",
        project: project_id,
        data: json!({
            "task_id": task_id,
            "from": previous,
            "to": target,
            "outcome": outcome,
        }),
        text,
    })
}

async fn activity_list<A: BoardApi>(
    api: Arc<A>,
    project_id: ProjectId,
    args: ActivityArgs,
) -> CliResult<CommandOutput> {
    if args.limit == 0 || args.limit > MAX_ACTIVITY_LIMIT {
        return Err(usage_error(
            "INVALID_LIMIT",
            format!("--limit must be between 1 and {MAX_ACTIVITY_LIMIT}"),
        ));
    }

    let mut events = api
        .fetch_activity(project_id, args.limit)
        .await
        .map_err(|err| classify_api_error(&err))?;
    events.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(CommandOutput {
        command: "activity",
        project: project_id,
        data: json!({ "events": events }),
        text: render_activity_text(&events),
    })
}

fn render_activity_text(events: &[ActivityEvent]) -> String {
    if events.is_empty() {
        return "No activity yet".to_string();
    }

    let now = Utc::now();
    let rows = events
        .iter()
        .map(|event| {
            vec![
                relative_time(event.created_at, now),
                event.user_name.clone(),
                event.action.as_str().to_string(),
                event.description.replace('\n', " "),
            ]
        })
        .collect::<Vec<_>>();

    render_text_table(&["WHEN", "USER", "ACTION", "DESCRIPTION"], &rows)
}

fn render_text_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|header| header.chars().count())
        .collect::<Vec<_>>();

    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            widths[index] = widths[index].max(cell.chars().count());
        }
    }

    let border = format!(
        "+{}+",
        widths
            .iter()
            .map(|width| "-".repeat(*width + 2))
            .collect::<Vec<_>>()
            .join("+")
    );
    let render_row = |cells: Vec<&str>| {
        format!(
            "| {} |",
            cells
                .iter()
                .enumerate()
                .map(|(index, cell)| format!("{cell:<width$}", width = widths[index]))
                .collect::<Vec<_>>()
                .join(" | ")
        )
    };

    let mut lines = vec![border.clone(), render_row(headers.to_vec()), border.clone()];
    for row in rows {
        lines.push(render_row(row.iter().map(String::as_str).collect()));
    }
    lines.push(border);
    lines.join("\n")
}

fn task_json(task: &Task) -> Value {
    json!({
        "id": task.id,
        "title": task.title,
        "status": task.status,
        "assignees": task.assignees,
    })
}

fn usage_error(code: &'static str, message: impl Into<String>) -> CliError {
    CliError {
        exit_code: 2,
        code,
        message: message.into(),
        details: None,
    }
}

fn not_found_error(code: &'static str, message: impl Into<String>) -> CliError {
    CliError {
        exit_code: 3,
        code,
        message: message.into(),
        details: None,
    }
}

fn rejected_error(
    code: &'static str,
    message: impl Into<String>,
    details: Option<Value>,
) -> CliError {
    CliError {
        exit_code: 4,
        code,
        message: message.into(),
        details,
    }
}

fn runtime_error(err: impl std::fmt::Display) -> CliError {
    CliError {
        exit_code: 5,
        code: "RUNTIME_ERROR",
        message: err.to_string(),
        details: None,
    }
}

fn classify_board_error(err: &BoardError) -> CliError {
    match err {
        BoardError::UnknownTask(task_id) => {
            not_found_error("TASK_NOT_FOUND", format!("task {task_id} not found"))
        }
        BoardError::MutationInFlight(task_id) => rejected_error(
            "MUTATION_IN_FLIGHT",
            format!("task {task_id} already has a move in flight"),
            None,
        ),
        BoardError::RemoteRejected { task_id, cause } => {
            let mut classified = classify_api_error(cause);
            classified.details = Some(json!({ "task_id": task_id, "rolled_back": true }));
            classified
        }
        BoardError::FetchFailed(cause) => classify_api_error(cause),
        BoardError::NetworkUnavailable(message) => {
            classify_api_error(&ApiError::Network(message.clone()))
        }
    }
}

fn classify_api_error(err: &ApiError) -> CliError {
    match err {
        ApiError::Network(message) => CliError {
            exit_code: 5,
            code: "NETWORK_UNAVAILABLE",
            message: message.clone(),
            details: None,
        },
        ApiError::Unauthorized => rejected_error("UNAUTHORIZED", err.to_string(), None),
        ApiError::Rejected(message) if message.contains("not found") => {
            not_found_error("PROJECT_NOT_FOUND", message.clone())
        }
        ApiError::Rejected(message) => rejected_error("REJECTED", message.clone(), None),
        ApiError::Http(_) | ApiError::Decode(_) => runtime_error(err),
    }
}

fn print_success(output: CommandOutput, json_output: bool, quiet: bool) {
    if json_output {
        let payload = json!({
            "schema_version": SCHEMA_VERSION,
            "command": output.command,
            "project": output.project,
            "data": output.data
        });
        match serde_json::to_string_pretty(&payload) {
            Ok(value) => println!("{value}"),
            Err(_) => println!("{}", payload),
        }
        return;
    }

    if quiet {
        return;
    }

    if output.text.is_empty() {
        println!("ok");
    } else {
        println!("{}", output.text);
    }
}

fn print_error(err: &CliError, json_output: bool) {
    error!(
        code = err.code,
        message = %err.message,
        details = ?err.details,
        "cli command failed"
    );

    if json_output {
        let payload = json!({
            "schema_version": SCHEMA_VERSION,
            "error": {
                "code": err.code,
                "message": err.message,
                "details": err.details
            }
        });
        match serde_json::to_string_pretty(&payload) {
            Ok(value) => eprintln!("{value}"),
            Err(_) => eprintln!("{}", payload),
        }
        return;
    }

    eprintln!("error[{}]: {}", err.code, err.message);
}

/// Flattens an error chain into one line, skipping repeated messages.
pub fn format_error_chain(err: &anyhow::Error) -> String {
    let mut seen = HashSet::new();
    let mut parts = Vec::new();
    for cause in err.chain() {
        let text = cause.to_string();
        if seen.insert(text.clone()) {
            parts.push(text);
        }
    }
    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::FakeApi;

    fn fake(tasks: Vec<Task>) -> Arc<FakeApi> {
        Arc::new(FakeApi::new(tasks))
    }

    fn move_args(id: &str, status: &str) -> RootCommand {
        RootCommand::Move(MoveArgs {
            id: id.to_string(),
            status: status.to_string(),
        })
    }

    #[tokio::test]
    async fn board_command_reports_columns_and_summary() {
        let api = fake(vec![
            Task::new(1, "Write docs", TaskStatus::Todo),
            Task::new(2, "Ship", TaskStatus::Done),
        ]);

        let output = execute(api, ProjectId(1), RootCommand::Board)
            .await
            .expect("board should load");

        assert_eq!(output.command, "board");
        assert_eq!(output.data["summary"]["total"], 2);
        assert_eq!(output.data["summary"]["completion_rate"], 50.0);
        assert_eq!(output.data["columns"]["TODO"][0]["title"], "Write docs");
        assert!(output.text.contains("| To Do"));
        assert!(output.text.contains("50.0% complete"));
    }

    #[tokio::test]
    async fn move_command_waits_for_confirmation() {
        let api = fake(vec![Task::new(1, "Write docs", TaskStatus::Todo)]);

        let output = execute(Arc::clone(&api), ProjectId(1), move_args("#1", "in-progress"))
            .await
            .expect("move should confirm");

        assert_eq!(output.data["outcome"], "moved");
        assert_eq!(output.data["to"], "IN_PROGRESS");
        assert_eq!(api.update_count(), 1);
    }

    #[tokio::test]
    async fn move_to_current_status_is_a_no_op() {
        let api = fake(vec![Task::new(1, "Write docs", TaskStatus::Todo)]);

        let output = execute(Arc::clone(&api), ProjectId(1), move_args("1", "TODO"))
            .await
            .expect("no-op succeeds");

        assert_eq!(output.data["outcome"], "unchanged");
        assert_eq!(api.update_count(), 0);
    }

    #[tokio::test]
    async fn move_rejected_by_server_exits_with_rejected_code() {
        let api = fake(vec![Task::new(1, "Write docs", TaskStatus::Todo)]);
        api.fail_update(
            TaskId(1),
            ApiError::Rejected("Only owners can move tasks".to_string()),
        );

        let err = execute(api, ProjectId(1), move_args("1", "DONE"))
            .await
            .expect_err("move should roll back");

        assert_eq!(err.exit_code, 4);
        assert_eq!(err.code, "REJECTED");
        assert_eq!(
            err.details,
            Some(json!({ "task_id": 1, "rolled_back": true }))
        );
    }

    #[tokio::test]
    async fn move_validates_arguments_and_task_presence() {
        let api = fake(vec![Task::new(1, "Write docs", TaskStatus::Todo)]);

        let err = execute(Arc::clone(&api), ProjectId(1), move_args("abc", "DONE"))
            .await
            .expect_err("bad id");
        assert_eq!((err.exit_code, err.code), (2, "INVALID_TASK_ID"));

        let err = execute(Arc::clone(&api), ProjectId(1), move_args("1", "SOMEDAY"))
            .await
            .expect_err("bad status");
        assert_eq!((err.exit_code, err.code), (2, "INVALID_STATUS"));

        let err = execute(api, ProjectId(1), move_args("9", "DONE"))
            .await
            .expect_err("unknown task");
        assert_eq!((err.exit_code, err.code), (3, "TASK_NOT_FOUND"));
    }

    #[tokio::test]
    async fn network_failure_maps_to_runtime_exit_code() {
        let api = fake(Vec::new());
        api.fail_fetch(ApiError::Network("connection refused".to_string()));

        let err = execute(api, ProjectId(1), RootCommand::Board)
            .await
            .expect_err("fetch fails");

        assert_eq!((err.exit_code, err.code), (5, "NETWORK_UNAVAILABLE"));
    }

    #[tokio::test]
    async fn activity_limit_is_validated() {
        let err = execute(
            fake(Vec::new()),
            ProjectId(1),
            RootCommand::Activity(ActivityArgs { limit: 0 }),
        )
        .await
        .expect_err("zero limit");
        assert_eq!(err.exit_code, 2);

        let output = execute(
            fake(Vec::new()),
            ProjectId(1),
            RootCommand::Activity(ActivityArgs { limit: 5 }),
        )
        .await
        .expect("empty activity");
        assert_eq!(output.text, "No activity yet");
        assert_eq!(output.data["events"], json!([]));
    }

    #[test]
    fn classify_api_error_maps_exit_codes() {
        assert_eq!(classify_api_error(&ApiError::Unauthorized).exit_code, 4);
        assert_eq!(
            classify_api_error(&ApiError::Rejected("project not found".to_string())).exit_code,
            3
        );
        assert_eq!(classify_api_error(&ApiError::Http(502)).exit_code, 5);
    }

    #[test]
    fn render_text_table_pads_columns() {
        let table = render_text_table(
            &["ID", "TITLE"],
            &[vec!["1".to_string(), "Write docs".to_string()]],
        );
        let lines = table.lines().collect::<Vec<_>>();

        assert_eq!(lines[0], "+----+------------+");
        assert_eq!(lines[1], "| ID | TITLE      |");
        assert_eq!(lines[3], "| 1  | Write docs |");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn format_error_chain_includes_context_and_root_cause() {
        let err = anyhow::anyhow!("connection refused").context("failed to build client");
        let message = format_error_chain(&err);

        assert_eq!(message, "failed to build client: connection refused");
    }
}
