use std::path::PathBuf;
use std::sync::Arc;

use safe_outputs::config::load_from_str;
use safe_outputs::handlers::ClientError;
use safe_outputs::handlers::client::{ItemState, ProjectContent, PullRequestSnapshot};
use safe_outputs::journal::{AuditLog, FileAuditLog, Outcome};
use safe_outputs::kernel::Mediator;
use safe_outputs::primitives::{Repository, RunContext, RunId, TriggerTarget};
use safeout_handlers::testing::{Call, RecordingClient};
use serde_json::json;
use uuid::Uuid;

const DEFAULT_PROJECT: &str = "https://github.com/orgs/ORG/projects/1";

fn run() -> RunContext {
    RunContext::new(Repository::new("octo", "service"), RunId::new("1234"))
        .with_workflow_name("Nightly Triage")
}

fn mediator(config: &str, client: &Arc<RecordingClient>) -> Mediator {
    Mediator::builder(load_from_str(config).unwrap(), run())
        .client(client.clone())
        .build()
        .unwrap()
}

fn pull_request(
    number: u64,
    state: ItemState,
    title: &str,
    labels: &[&str],
) -> PullRequestSnapshot {
    PullRequestSnapshot {
        number,
        state,
        title: title.to_owned(),
        labels: labels.iter().map(|l| (*l).to_owned()).collect(),
    }
}

fn project_items(client: &RecordingClient) -> Vec<String> {
    client
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::AddProjectItem { project, .. } => Some(project),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn close_pull_request_stops_at_max_count() {
    let client = Arc::new(RecordingClient::new());
    let mediator = mediator(r#"{"close-pull-request": {"max": 2}}"#, &client);

    let mut results = Vec::new();
    for number in 1..=3 {
        results.push(
            mediator
                .handle(json!({
                    "type": "close_pull_request",
                    "pull_request_number": number,
                    "body": "Closing in favour of the rewrite"
                }))
                .await,
        );
    }

    assert!(results[0].success);
    assert!(results[1].success);
    assert!(!results[2].success);
    assert!(results[2].error.as_deref().unwrap().contains("Max count"));
    assert_eq!(client.count("close_pull_request"), 2);
}

#[tokio::test]
async fn update_project_uses_configured_default() {
    let client = Arc::new(RecordingClient::new());
    let mediator = mediator(
        &format!(
            r#"{{
                "github-token": "${{{{ secrets.PROJECTS }}}}",
                "update-project": {{"project": "{DEFAULT_PROJECT}"}}
            }}"#
        ),
        &client,
    );

    let result = mediator
        .handle(json!({
            "type": "update_project",
            "content_type": "draft_issue",
            "draft_title": "T",
            "fields": {"Status": "Todo"}
        }))
        .await;

    assert!(result.success, "{result:?}");
    assert_eq!(result.url.as_deref(), Some(DEFAULT_PROJECT));
    assert_eq!(project_items(&client), vec![DEFAULT_PROJECT.to_owned()]);
    assert!(client.calls().contains(&Call::AddProjectItem {
        project: DEFAULT_PROJECT.to_owned(),
        content: ProjectContent::DraftIssue {
            title: "T".to_owned(),
            body: None,
        },
    }));
    assert_eq!(client.count("update_project_item_field"), 1);
}

#[tokio::test]
async fn request_project_overrides_default() {
    let client = Arc::new(RecordingClient::new());
    let mediator = mediator(
        &format!(
            r#"{{"github-token": "t", "update-project": {{"project": "{DEFAULT_PROJECT}"}}}}"#
        ),
        &client,
    );

    let result = mediator
        .handle(json!({
            "type": "update_project",
            "project": "https://github.com/orgs/ORG/projects/999",
            "content_type": "draft_issue",
            "draft_title": "T",
            "fields": {"Status": "Todo"}
        }))
        .await;

    assert!(result.success, "{result:?}");
    assert_eq!(
        project_items(&client),
        vec!["https://github.com/orgs/ORG/projects/999".to_owned()]
    );
}

#[tokio::test]
async fn status_updates_resolve_scope_independently() {
    let client = Arc::new(RecordingClient::new());
    let mediator = mediator(
        &format!(
            r#"{{
                "github-token": "t",
                "update-project": {{"project": "https://github.com/orgs/ORG/projects/5"}},
                "create-project-status-update": {{"max": 2, "project": "{DEFAULT_PROJECT}"}}
            }}"#
        ),
        &client,
    );

    let defaulted = mediator
        .handle(json!({
            "type": "create-project-status-update",
            "body": "Sprint is on track",
            "status": "on_track"
        }))
        .await;
    let overridden = mediator
        .handle(json!({
            "type": "create-project-status-update",
            "project": "https://github.com/users/octocat/projects/7",
            "body": "Blocked on review",
            "status": "AT_RISK"
        }))
        .await;

    assert!(defaulted.success, "{defaulted:?}");
    assert!(overridden.success, "{overridden:?}");
    let projects: Vec<String> = client
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::CreateProjectStatusUpdate { project, .. } => Some(project),
            _ => None,
        })
        .collect();
    assert_eq!(
        projects,
        vec![
            DEFAULT_PROJECT.to_owned(),
            "https://github.com/users/octocat/projects/7".to_owned()
        ]
    );
}

#[tokio::test]
async fn already_closed_pull_request_is_commented_twice() {
    let client = Arc::new(
        RecordingClient::new().with_pull_request(pull_request(4, ItemState::Closed, "Old", &[])),
    );
    let mediator = mediator(r#"{"close-pull-request": {"max": 5}}"#, &client);

    for body in ["First note", "Second note"] {
        let result = mediator
            .handle(json!({"type": "close-pull-request", "pull_request_number": 4, "body": body}))
            .await;
        assert!(result.success);
        assert_eq!(result.already_closed, Some(true));
        assert_eq!(result.comment_posted, Some(true));
    }

    assert_eq!(client.count("close_pull_request"), 0);
    assert_eq!(client.count("add_comment"), 2);
}

#[tokio::test]
async fn disallowed_label_is_rejected_before_any_call() {
    let client = Arc::new(RecordingClient::new());
    let mediator = mediator(
        r#"{"add-labels": {"allowed": ["smoke-project"], "target": "*"}}"#,
        &client,
    );

    let result = mediator
        .handle(json!({"type": "add-labels", "labels": ["other-label"], "item_number": 8}))
        .await;

    assert!(!result.success);
    assert!(result.error.as_deref().unwrap().contains("other-label"));
    assert!(client.calls().is_empty());

    let entries = mediator.journal().read_all().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].outcome(), Outcome::Rejected);
}

#[tokio::test]
async fn required_labels_accept_any_match() {
    let client = Arc::new(
        RecordingClient::new()
            .with_pull_request(pull_request(1, ItemState::Open, "Bump deps", &["stale"]))
            .with_pull_request(pull_request(2, ItemState::Open, "Bump deps", &["wip"])),
    );
    let mediator = mediator(
        r#"{"close-pull-request": {"max": 3, "required_labels": ["automerge", "stale"]}}"#,
        &client,
    );

    let accepted = mediator
        .handle(json!({"type": "close-pull-request", "pull_request_number": 1, "body": "stale"}))
        .await;
    let rejected = mediator
        .handle(json!({"type": "close-pull-request", "pull_request_number": 2, "body": "stale"}))
        .await;

    assert!(accepted.success);
    assert!(!rejected.success);
    assert!(
        rejected
            .error
            .as_deref()
            .unwrap()
            .contains("does not match required labels")
    );
    assert_eq!(client.mutations().len(), 2);
}

#[tokio::test]
async fn title_prefix_is_exact() {
    let client = Arc::new(
        RecordingClient::new()
            .with_pull_request(pull_request(3, ItemState::Open, "[Bot] bump", &[]))
            .with_pull_request(pull_request(5, ItemState::Open, "[bot] bump", &[])),
    );
    let mediator = mediator(
        r#"{"close-pull-request": {"max": 2, "required-title-prefix": "[bot] "}}"#,
        &client,
    );

    for _ in 0..2 {
        let result = mediator
            .handle(json!({"type": "close-pull-request", "pull_request_number": 3, "body": "x"}))
            .await;
        assert!(
            result
                .error
                .as_deref()
                .unwrap()
                .contains("does not start with required prefix")
        );
    }
    let result = mediator
        .handle(json!({"type": "close-pull-request", "pull_request_number": 5, "body": "x"}))
        .await;
    assert!(result.success);
}

#[tokio::test]
async fn comment_failure_does_not_fail_the_close() {
    let client = Arc::new(
        RecordingClient::new().fail_on("add_comment", ClientError::api(502, "Bad Gateway")),
    );
    let mediator = mediator(r#"{"close-pull-request": {}}"#, &client);

    let result = mediator
        .handle(json!({"type": "close-pull-request", "pull_request_number": 12, "body": "Done"}))
        .await;

    assert!(result.success);
    assert_eq!(result.already_closed, Some(false));
    assert_eq!(result.comment_posted, Some(false));
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("Bad Gateway"));
    assert_eq!(client.count("close_pull_request"), 1);
}

#[tokio::test]
async fn blank_body_needs_a_fallback_comment() {
    let client = Arc::new(RecordingClient::new());
    let strict = mediator(r#"{"close-pull-request": {"max": 5}}"#, &client);
    for body in ["", "   \n"] {
        let result = strict
            .handle(json!({"type": "close-pull-request", "pull_request_number": 1, "body": body}))
            .await;
        assert!(
            result
                .error
                .as_deref()
                .unwrap()
                .contains("No comment body provided")
        );
    }
    assert!(client.mutations().is_empty());

    let lenient = mediator(
        r#"{"close-pull-request": {"default_comment": "Closed by the nightly sweep"}}"#,
        &client,
    );
    let result = lenient
        .handle(json!({"type": "close-pull-request", "pull_request_number": 1, "body": "  "}))
        .await;
    assert!(result.success);
    let posted = client.calls().into_iter().find_map(|call| match call {
        Call::AddComment { body, .. } => Some(body),
        _ => None,
    });
    assert!(posted.unwrap().starts_with("Closed by the nightly sweep"));
}

#[tokio::test]
async fn triggering_pull_request_is_the_default_target() {
    let client = Arc::new(RecordingClient::new());
    let run = run().with_trigger(TriggerTarget::pull_request(42));
    let mediator = Mediator::builder(load_from_str(r#"{"close-pull-request": {}}"#).unwrap(), run)
        .client(client.clone())
        .build()
        .unwrap();

    let result = mediator
        .handle(json!({"type": "close-pull-request", "body": "Superseded"}))
        .await;

    assert!(result.success);
    assert_eq!(result.number, Some(42));
    assert!(client.calls().contains(&Call::ClosePullRequest { number: 42 }));
}

#[tokio::test]
async fn audit_log_records_every_decision_in_order() {
    let mut path: PathBuf = std::env::temp_dir();
    path.push(format!("safe-outputs-scenario-{}.ndjson", Uuid::new_v4()));
    let journal = Arc::new(FileAuditLog::open(&path).await.unwrap());

    let client = Arc::new(RecordingClient::new());
    let mediator = Mediator::builder(
        load_from_str(r#"{"create-issue": {"title-prefix": "[triage] "}}"#).unwrap(),
        run(),
    )
    .client(client.clone())
    .journal(journal.clone())
    .build()
    .unwrap();

    let created = mediator
        .handle(json!({"type": "create-issue", "title": "Flaky test", "body": "Seen twice"}))
        .await;
    let limited = mediator
        .handle(json!({"type": "create-issue", "title": "Another", "body": "x"}))
        .await;
    let unknown = mediator.handle(json!({"type": "delete-branch"})).await;

    assert!(created.success);
    assert!(!limited.success);
    assert!(!unknown.success);

    let entries = journal.read_all().await.unwrap();
    let outcomes: Vec<_> = entries.iter().map(|e| (e.action().to_owned(), e.outcome())).collect();
    assert_eq!(
        outcomes,
        vec![
            ("create-issue".to_owned(), Outcome::Accepted),
            ("create-issue".to_owned(), Outcome::Rejected),
            ("delete-branch".to_owned(), Outcome::Rejected),
        ]
    );
    assert_eq!(entries[0].result(), Some(&created));
    assert_eq!(entries[1].reason(), limited.error.as_deref());

    let issue = client.calls().into_iter().find_map(|call| match call {
        Call::CreateIssue(issue) => Some(issue),
        _ => None,
    });
    assert_eq!(issue.unwrap().title, "[triage] Flaky test");

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn staged_runs_write_nothing_but_still_count() {
    let client = Arc::new(RecordingClient::new());
    let mediator = mediator(r#"{"staged": true, "create-issue": {}}"#, &client);

    let first = mediator
        .handle(json!({"type": "create-issue", "title": "Preview", "body": "x"}))
        .await;
    let second = mediator
        .handle(json!({"type": "create-issue", "title": "Preview", "body": "x"}))
        .await;

    assert!(first.success && first.staged);
    assert!(second.error.as_deref().unwrap().contains("Max count (1) exceeded"));
    assert!(client.mutations().is_empty());
}
