use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use futures_util::StreamExt;
use reqwest::multipart;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::error::CvatError;
use super::responses::{Task, TaskPage, UploadStatus};
use super::upload::{indexed_fields, UploadRequest, UploadSource};
use crate::types::AnnotationFormat;

/// Name of the cookie Django-based servers issue for CSRF protection.
const CSRF_COOKIE: &str = "csrftoken";
/// Header carrying the CSRF token on every request after login.
const CSRF_HEADER: &str = "X-CSRFToken";

/// Body of the task creation request. The label schema is passed through
/// opaquely; the client does not interpret it.
#[derive(Debug, Clone, Serialize)]
pub struct NewTask {
    pub name: String,
    pub labels: Value,
    /// Number of images shared between adjacent jobs; 0 means no overlap.
    pub overlap: u32,
    /// Images per job; 0 means a single job containing all images.
    pub segment_size: u32,
    pub z_order: bool,
    pub bug_tracker: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<u64>,
}

/// Server operations the sync driver depends on.
///
/// The concrete implementation is [`CvatClient`]; tests substitute an
/// in-memory fake so the reconciliation logic can run without a server.
#[async_trait::async_trait]
pub trait AnnotationServer: Send + Sync {
    /// Fetch every page of the task listing and return the concatenation, in
    /// page order. A failure on any page discards the partial result.
    async fn list_tasks(&self) -> Result<Vec<Task>, CvatError>;

    async fn create_task(&self, spec: &NewTask) -> Result<Task, CvatError>;

    /// Attach images to a task. Exactly one upload source must be set in
    /// `request`; the precondition is checked before any network call.
    async fn upload_data(&self, task: &Task, request: UploadRequest) -> Result<(), CvatError>;

    /// Read the server's current state for an in-flight upload. Pure read;
    /// the polling loop belongs to the caller.
    async fn upload_status(&self, task: &Task) -> Result<UploadStatus, CvatError>;

    /// Stream the exported annotation archive to `destination`, chunk by
    /// chunk so arbitrarily large archives fit in bounded memory. A partial
    /// file left behind by a stream interruption is not removed.
    async fn download_annotations(
        &self,
        task: &Task,
        destination: &Path,
        format: AnnotationFormat,
    ) -> Result<(), CvatError>;

    async fn delete_task(&self, task: &Task) -> Result<(), CvatError>;
}

/// Authenticated client for the server's versioned REST namespace.
///
/// Holds one `reqwest::Client` with a cookie jar so the session cookie from
/// the login response is replayed on every later call, serially, for the
/// whole run. The client performs no retries: any non-2xx response surfaces
/// as [`CvatError::Transport`] and aborts the caller's run.
pub struct CvatClient {
    client: Client,
    base_url: String,
    csrf_token: Option<String>,
}

/// Root of the versioned REST namespace for a given server address.
fn base_url(host: &str, port: &str, use_https: bool) -> String {
    let scheme = if use_https { "https" } else { "http" };
    format!("{scheme}://{host}:{port}/api/v1")
}

/// Map a non-2xx response to `Transport`, consuming the body for context.
async fn check(response: Response) -> Result<Response, CvatError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(CvatError::Transport { status, url, body })
}

/// Walk a paginated listing by following the server-provided `next` links
/// until exhausted, aggregating all pages before returning.
pub(crate) async fn collect_pages<F, Fut>(
    first_url: String,
    mut fetch: F,
) -> Result<Vec<Task>, CvatError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<TaskPage, CvatError>>,
{
    let mut tasks = Vec::new();
    let mut next = Some(first_url);
    while let Some(url) = next {
        let page = fetch(url).await?;
        tasks.extend(page.results);
        next = page.next;
    }
    Ok(tasks)
}

impl CvatClient {
    /// Log in and return an authenticated client.
    ///
    /// Fails with [`CvatError::Auth`] on a non-2xx login response. If the
    /// response carries a CSRF cookie, its value is attached to all
    /// subsequent requests, reads included.
    pub async fn connect(
        host: &str,
        port: &str,
        use_https: bool,
        username: &str,
        password: &str,
    ) -> Result<Self, CvatError> {
        let base_url = base_url(host, port, use_https);
        let jar = Arc::new(reqwest::cookie::Jar::default());
        let client = Client::builder().cookie_provider(jar).build()?;

        let url = format!("{base_url}/auth/login");
        tracing::debug!("POST {}", url);
        let response = client
            .post(&url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CvatError::Auth { status, body });
        }

        let csrf_token = response
            .cookies()
            .find(|c| c.name() == CSRF_COOKIE)
            .map(|c| c.value().to_string());
        if csrf_token.is_some() {
            tracing::debug!("Captured CSRF token from login response");
        }

        Ok(Self {
            client,
            base_url,
            csrf_token,
        })
    }

    fn url(&self, relative: &str) -> String {
        format!("{}/{}", self.base_url, relative)
    }

    /// Attach the CSRF header when the login response provided a token. The
    /// token accompanies every request for the rest of the session, reads
    /// included, exactly as the login response handed it out.
    fn apply_csrf(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.csrf_token {
            Some(token) => builder.header(CSRF_HEADER, token),
            None => builder,
        }
    }
}

#[async_trait::async_trait]
impl AnnotationServer for CvatClient {
    async fn list_tasks(&self) -> Result<Vec<Task>, CvatError> {
        collect_pages(self.url("tasks"), |url| async move {
            tracing::debug!("GET {}", url);
            let response = self.apply_csrf(self.client.get(&url)).send().await?;
            let page = check(response).await?.json::<TaskPage>().await?;
            Ok(page)
        })
        .await
    }

    async fn create_task(&self, spec: &NewTask) -> Result<Task, CvatError> {
        let url = self.url("tasks");
        tracing::debug!("POST {}", url);
        let response = self
            .apply_csrf(self.client.post(&url))
            .json(spec)
            .send()
            .await?;
        let task = check(response).await?.json::<Task>().await?;
        Ok(task)
    }

    async fn upload_data(&self, task: &Task, request: UploadRequest) -> Result<(), CvatError> {
        let (source, image_quality) = request.into_source()?;
        let url = format!("{}/data", task.url);
        tracing::debug!("POST {}", url);

        let builder = self.apply_csrf(self.client.post(&url));
        let response = match source {
            UploadSource::Client(paths) => {
                let mut form =
                    multipart::Form::new().text("image_quality", image_quality.to_string());
                for (i, path) in paths.iter().enumerate() {
                    let bytes = fs::read(path).await?;
                    let file_name = path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("image.jpg")
                        .to_string();
                    form = form.part(
                        format!("client_files[{i}]"),
                        multipart::Part::bytes(bytes).file_name(file_name),
                    );
                }
                builder.multipart(form).send().await?
            }
            UploadSource::Remote(urls) => {
                let fields = indexed_fields("remote_files", &urls, image_quality);
                builder.form(&fields).send().await?
            }
            UploadSource::Share(paths) => {
                let fields = indexed_fields("server_files", &paths, image_quality);
                builder.form(&fields).send().await?
            }
        };
        check(response).await?;
        Ok(())
    }

    async fn upload_status(&self, task: &Task) -> Result<UploadStatus, CvatError> {
        let url = format!("{}/status", task.url);
        tracing::debug!("GET {}", url);
        let response = self.apply_csrf(self.client.get(&url)).send().await?;
        let status = check(response).await?.json::<UploadStatus>().await?;
        Ok(status)
    }

    async fn download_annotations(
        &self,
        task: &Task,
        destination: &Path,
        format: AnnotationFormat,
    ) -> Result<(), CvatError> {
        let filename = destination
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("annotations.zip");
        let url = format!("{}/annotations", task.url);
        tracing::debug!("GET {}", url);
        let response = self
            .apply_csrf(self.client.get(&url))
            .query(&[
                ("format", format.as_str()),
                ("filename", filename),
                ("action", "download"),
            ])
            .send()
            .await?;
        let response = check(response).await?;

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(destination)
            .await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;
        Ok(())
    }

    async fn delete_task(&self, task: &Task) -> Result<(), CvatError> {
        tracing::debug!("DELETE {}", task.url);
        let response = self.apply_csrf(self.client.delete(&task.url)).send().await?;
        check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_base_url_http() {
        assert_eq!(
            base_url("localhost", "8080", false),
            "http://localhost:8080/api/v1"
        );
    }

    #[test]
    fn test_base_url_https() {
        assert_eq!(
            base_url("cvat.example.com", "443", true),
            "https://cvat.example.com:443/api/v1"
        );
    }

    fn test_client(csrf_token: Option<&str>) -> CvatClient {
        CvatClient {
            client: Client::new(),
            base_url: "http://localhost:8080/api/v1".into(),
            csrf_token: csrf_token.map(str::to_string),
        }
    }

    #[test]
    fn test_csrf_header_accompanies_reads_and_writes() {
        let client = test_client(Some("tok123"));
        let builders = [
            client.client.get(client.url("tasks")),
            client.client.get("http://s/api/v1/tasks/1/status"),
            client.client.get("http://s/api/v1/tasks/1/annotations"),
            client.client.post(client.url("tasks")),
            client.client.delete("http://s/api/v1/tasks/1"),
        ];
        for builder in builders {
            let request = client.apply_csrf(builder).build().unwrap();
            assert_eq!(
                request.headers().get(CSRF_HEADER).unwrap(),
                "tok123",
                "missing CSRF header on {} {}",
                request.method(),
                request.url()
            );
        }
    }

    #[test]
    fn test_no_csrf_header_without_login_cookie() {
        let client = test_client(None);
        let request = client
            .apply_csrf(client.client.get(client.url("tasks")))
            .build()
            .unwrap();
        assert!(request.headers().get(CSRF_HEADER).is_none());
    }

    #[test]
    fn test_new_task_body_omits_absent_project() {
        let spec = NewTask {
            name: "lot_a".into(),
            labels: json!([{"name": "car", "attributes": []}]),
            overlap: 0,
            segment_size: 0,
            z_order: false,
            bug_tracker: String::new(),
            project: None,
        };
        let body = serde_json::to_value(&spec).unwrap();
        assert_eq!(body["name"], "lot_a");
        assert_eq!(body["segment_size"], 0);
        assert_eq!(body["overlap"], 0);
        assert_eq!(body["z_order"], false);
        assert!(body.get("project").is_none());
    }

    #[test]
    fn test_new_task_body_includes_project_when_set() {
        let spec = NewTask {
            name: "lot_b".into(),
            labels: json!([]),
            overlap: 3,
            segment_size: 25,
            z_order: true,
            bug_tracker: "https://bugs/1".into(),
            project: Some(12),
        };
        let body = serde_json::to_value(&spec).unwrap();
        assert_eq!(body["project"], 12);
        assert_eq!(body["segment_size"], 25);
        assert_eq!(body["overlap"], 3);
    }

    fn page(results: &[(u64, &str)], next: Option<&str>) -> TaskPage {
        let tasks: Vec<Value> = results
            .iter()
            .map(|(id, name)| {
                json!({
                    "id": id,
                    "url": format!("http://s/api/v1/tasks/{id}"),
                    "name": name,
                })
            })
            .collect();
        serde_json::from_value(json!({ "next": next, "results": tasks })).unwrap()
    }

    #[tokio::test]
    async fn test_collect_pages_aggregates_three_pages_in_order() {
        let fetch = |url: String| async move {
            match url.as_str() {
                "tasks" => Ok(page(&[(1, "a"), (2, "b")], Some("tasks?page=2"))),
                "tasks?page=2" => Ok(page(&[(3, "c")], Some("tasks?page=3"))),
                "tasks?page=3" => Ok(page(&[(4, "d")], None)),
                other => panic!("unexpected page fetch: {other}"),
            }
        };
        let tasks = collect_pages("tasks".to_string(), fetch).await.unwrap();
        let names: Vec<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
        let ids: Vec<u64> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_collect_pages_single_page() {
        let fetch = |_url: String| async move { Ok(page(&[(1, "only")], None)) };
        let tasks = collect_pages("tasks".to_string(), fetch).await.unwrap();
        assert_eq!(tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_collect_pages_discards_partial_results_on_failure() {
        let fetch = |url: String| async move {
            match url.as_str() {
                "tasks" => Ok(page(&[(1, "a")], Some("tasks?page=2"))),
                _ => Err(CvatError::Transport {
                    status: 502,
                    url,
                    body: "bad gateway".into(),
                }),
            }
        };
        let result = collect_pages("tasks".to_string(), fetch).await;
        match result {
            Err(CvatError::Transport { status, .. }) => assert_eq!(status, 502),
            other => panic!("expected Transport error, got {other:?}"),
        }
    }
}
