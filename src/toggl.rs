use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use reqwest::{header::CONTENT_TYPE, Client};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::Config;
use crate::datetime::parse_timestamp;
use crate::time_entry::{ProjectRef, TaskRef, TimeEntry};

/// Toggl APIのレスポンスをデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct TogglTimeEntry {
    id: i64,
    description: Option<String>,
    project_id: Option<i64>,
    task_id: Option<i64>,
    start: String,
    stop: Option<String>,
    duration: i64,
    #[serde(default)]
    billable: bool,
    tags: Option<Vec<String>>,
}

/// Toggl APIのプロジェクト情報をデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct TogglProject {
    id: i64,
    name: String,
    color: Option<String>,
}

/// Toggl APIのタスク情報をデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct TogglTask {
    id: i64,
    name: String,
}

/// time entryを取得するためのリポジトリ。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TogglRepository {
    /// 指定された期間のタイムエントリーを取得する。
    ///
    /// # Arguments
    ///
    /// * `start_at` - 取得するタイムエントリーの開始日時
    /// * `end_at` - 取得するタイムエントリーの終了日時
    async fn read_time_entries(
        &self,
        start_at: &DateTime<Utc>,
        end_at: &DateTime<Utc>,
    ) -> Result<Vec<TimeEntry>>;
}

/// Toggl APIと通信するためのクライアント。
///
/// # Examples
///
/// ```
/// let client = TogglClient::new(&config);
/// let time_entries = client.read_time_entries(&start_at, &end_at).await.unwrap();
/// ```
pub struct TogglClient {
    client: Client,
    api_url: String,
    api_token: String,
}

impl TogglClient {
    /// 新しい`TogglClient`を返す。
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        }
    }

    /// APIにGETリクエストを送り、JSONをデシリアライズする。
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.api_url, path);
        debug!("GET {}", url);
        let body = self
            .client
            .get(&url)
            .basic_auth(&self.api_token, Some("api_token"))
            .header(CONTENT_TYPE, "application/json")
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to send request to Toggl API at {}", url))?
            .error_for_status()
            .context("Request returned an error status")?
            .json::<T>()
            .await
            .context("Failed to deserialize response")?;

        Ok(body)
    }

    /// プロジェクト情報を取得する。
    async fn read_projects(&self) -> Result<Vec<TogglProject>> {
        let projects: Option<Vec<TogglProject>> = self.get_json("/me/projects", &[]).await?;
        Ok(projects.unwrap_or_default())
    }

    /// タスク情報を取得する。
    async fn read_tasks(&self) -> Result<Vec<TogglTask>> {
        let tasks: Option<Vec<TogglTask>> = self.get_json("/me/tasks", &[]).await?;
        Ok(tasks.unwrap_or_default())
    }
}

#[async_trait]
impl TogglRepository for TogglClient {
    async fn read_time_entries(
        &self,
        start_at: &DateTime<Utc>,
        end_at: &DateTime<Utc>,
    ) -> Result<Vec<TimeEntry>> {
        let toggl_time_entries: Option<Vec<TogglTimeEntry>> = self
            .get_json(
                "/me/time_entries",
                &[
                    ("start_date", start_at.to_rfc3339()),
                    ("end_date", end_at.to_rfc3339()),
                ],
            )
            .await
            .context("Failed to get time entries from toggl")?;
        let toggl_time_entries = toggl_time_entries.unwrap_or_default();
        info!("length of time entries: {}", toggl_time_entries.len());

        let projects: HashMap<i64, TogglProject> = self
            .read_projects()
            .await
            .context("Failed to get project list from toggl")?
            .into_iter()
            .map(|project| (project.id, project))
            .collect();
        let tasks: HashMap<i64, TogglTask> = self
            .read_tasks()
            .await
            .context("Failed to get task list from toggl")?
            .into_iter()
            .map(|task| (task.id, task))
            .collect();

        toggl_time_entries
            .into_iter()
            .map(|entry| to_time_entry(entry, &projects, &tasks))
            .collect()
    }
}

/// APIのレスポンスを`TimeEntry`に変換する。
///
/// 実行中のtime entryは`duration`が負の値で返るため、0として扱う。
fn to_time_entry(
    entry: TogglTimeEntry,
    projects: &HashMap<i64, TogglProject>,
    tasks: &HashMap<i64, TogglTask>,
) -> Result<TimeEntry> {
    let start = parse_timestamp(&entry.start)
        .with_context(|| format!("Invalid start of time entry {}", entry.id))?;
    let stop = entry
        .stop
        .as_deref()
        .map(parse_timestamp)
        .transpose()
        .with_context(|| format!("Invalid stop of time entry {}", entry.id))?;
    let project = entry
        .project_id
        .and_then(|project_id| projects.get(&project_id));
    let task = entry.task_id.and_then(|task_id| tasks.get(&task_id));

    Ok(TimeEntry {
        id: entry.id,
        description: entry.description.unwrap_or_default(),
        start,
        stop,
        duration: if stop.is_some() { entry.duration.max(0) } else { 0 },
        project: project.map(|project| ProjectRef {
            id: project.id,
            name: project.name.clone(),
        }),
        task: task.map(|task| TaskRef {
            id: task.id,
            title: task.name.clone(),
        }),
        billable: entry.billable,
        tags: entry.tags.unwrap_or_default(),
        color: project.and_then(|project| project.color.clone()),
    })
}

#[cfg(test)]
mod tests {
    use base64::prelude::{Engine as _, BASE64_STANDARD};
    use chrono::{TimeZone, Utc};
    use mockito::Matcher;

    use super::{TogglClient, TogglRepository};
    use crate::config::Config;

    fn config(server: &mockito::Server) -> Config {
        Config {
            api_url: server.url(),
            api_token: "secret".to_string(),
            ..Config::default()
        }
    }

    fn auth_header() -> String {
        format!("Basic {}", BASE64_STANDARD.encode("secret:api_token"))
    }

    const TIME_ENTRIES: &str = r##"[
        {
            "id": 1,
            "description": "Code review",
            "project_id": 10,
            "task_id": 100,
            "start": "2024-03-04T09:30:00+00:00",
            "stop": "2024-03-04T10:00:00+00:00",
            "duration": 1800,
            "billable": true,
            "tags": ["dev"]
        },
        {
            "id": 2,
            "description": null,
            "project_id": null,
            "task_id": null,
            "start": "2024-03-04T11:00:00Z",
            "stop": null,
            "duration": -1709550000,
            "tags": null
        }
    ]"##;

    const PROJECTS: &str = r##"[{"id": 10, "name": "Backend", "color": "#06aaf5"}]"##;

    const TASKS: &str = r##"[{"id": 100, "name": "Review PR"}]"##;

    #[tokio::test]
    async fn test_read_time_entries() {
        let mut server = mockito::Server::new_async().await;
        let entries_mock = server
            .mock("GET", "/me/time_entries")
            .match_header("authorization", auth_header().as_str())
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("start_date".into(), "2024-03-04T00:00:00+00:00".into()),
                Matcher::UrlEncoded("end_date".into(), "2024-03-11T00:00:00+00:00".into()),
            ]))
            .with_header("content-type", "application/json")
            .with_body(TIME_ENTRIES)
            .create_async()
            .await;
        let projects_mock = server
            .mock("GET", "/me/projects")
            .with_body(PROJECTS)
            .create_async()
            .await;
        let tasks_mock = server
            .mock("GET", "/me/tasks")
            .with_body(TASKS)
            .create_async()
            .await;
        let client = TogglClient::new(&config(&server));

        let start_at = Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
        let end_at = Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap();
        let entries = client.read_time_entries(&start_at, &end_at).await.unwrap();

        entries_mock.assert_async().await;
        projects_mock.assert_async().await;
        tasks_mock.assert_async().await;
        assert_eq!(entries.len(), 2);

        let reviewed = &entries[0];
        assert_eq!(reviewed.description, "Code review");
        assert_eq!(reviewed.duration, 1800);
        assert_eq!(reviewed.project.as_ref().map(|p| p.name.as_str()), Some("Backend"));
        assert_eq!(reviewed.task.as_ref().map(|t| t.title.as_str()), Some("Review PR"));
        assert_eq!(reviewed.color.as_deref(), Some("#06aaf5"));
        assert!(reviewed.billable);
        assert_eq!(reviewed.tags, vec!["dev".to_string()]);

        let running = &entries[1];
        assert!(running.is_running());
        assert_eq!(running.duration, 0);
        assert_eq!(running.description, "");
        assert!(running.tags.is_empty());
        assert_eq!(running.project, None);
        assert!(!running.billable);
    }

    /// APIがnullを返した場合は空として扱う。
    #[tokio::test]
    async fn test_read_time_entries_null() {
        let mut server = mockito::Server::new_async().await;
        let _entries = server
            .mock("GET", "/me/time_entries")
            .match_query(Matcher::Any)
            .with_body("null")
            .create_async()
            .await;
        let _projects = server
            .mock("GET", "/me/projects")
            .with_body("null")
            .create_async()
            .await;
        let _tasks = server
            .mock("GET", "/me/tasks")
            .with_body("null")
            .create_async()
            .await;
        let client = TogglClient::new(&config(&server));

        let now = Utc::now();
        let entries = client.read_time_entries(&now, &now).await.unwrap();

        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_read_time_entries_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _entries = server
            .mock("GET", "/me/time_entries")
            .match_query(Matcher::Any)
            .with_status(403)
            .create_async()
            .await;
        let client = TogglClient::new(&config(&server));

        let now = Utc::now();
        let result = client.read_time_entries(&now, &now).await;

        assert!(result.is_err());
    }

    /// 不正な日時はパニックせずにエラーになる。
    #[tokio::test]
    async fn test_read_time_entries_invalid_start() {
        let mut server = mockito::Server::new_async().await;
        let _entries = server
            .mock("GET", "/me/time_entries")
            .match_query(Matcher::Any)
            .with_body(
                r#"[{"id": 3, "description": "x", "project_id": null, "task_id": null,
                    "start": "yesterday", "stop": null, "duration": 0, "tags": []}]"#,
            )
            .create_async()
            .await;
        let _projects = server
            .mock("GET", "/me/projects")
            .with_body("[]")
            .create_async()
            .await;
        let _tasks = server
            .mock("GET", "/me/tasks")
            .with_body("[]")
            .create_async()
            .await;
        let client = TogglClient::new(&config(&server));

        let now = Utc::now();
        let result = client.read_time_entries(&now, &now).await;

        assert!(result.is_err());
    }
}
