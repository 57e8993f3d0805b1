use serde::Deserialize;

/// One annotation task as returned by the `tasks` endpoints.
///
/// Only the fields the sync driver consumes are modeled; everything else the
/// server sends is ignored. `size` is absent until the server has finished
/// processing uploaded data.
#[derive(Debug, Clone, Deserialize)]
pub struct Task {
    #[allow(dead_code)] // per-task endpoints address the task by `url`, not id
    pub id: u64,
    /// Canonical task URL; per-task endpoints (`/data`, `/status`, ...) hang
    /// off this directly.
    pub url: String,
    /// Match key against local folder names, compared by exact string
    /// equality with no normalization.
    pub name: String,
    #[allow(dead_code)] // decoded for completeness; the driver keys on name/status
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[allow(dead_code)] // absent until server-side data processing finishes
    #[serde(default)]
    pub size: Option<u64>,
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Name: {}, url: {}", self.name, self.url)
    }
}

/// Server-side lifecycle status of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Annotation,
    Validation,
    Completed,
    /// Catch-all so a newer server's vocabulary does not break listing.
    #[serde(other)]
    Unknown,
}

/// One page of the paginated `tasks` listing.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskPage {
    #[allow(dead_code)] // decoded for completeness; pagination follows `next` only
    #[serde(default)]
    pub count: Option<u64>,
    /// Absolute link to the next page, or `None` on the last page.
    pub next: Option<String>,
    pub results: Vec<Task>,
}

/// Response of the per-task `status` endpoint: the state of one in-flight
/// data upload. Transient, never persisted locally.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadStatus {
    pub state: UploadState,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum UploadState {
    Queued,
    Started,
    Finished,
    Failed,
}

impl UploadState {
    /// True while the server is still working on the upload.
    pub fn is_pending(&self) -> bool {
        matches!(self, UploadState::Queued | UploadState::Started)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadState::Queued => "Queued",
            UploadState::Started => "Started",
            UploadState::Finished => "Finished",
            UploadState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for UploadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
