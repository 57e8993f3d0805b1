//! One-shot reconciliation between the local share and the server.
//!
//! The driver is strictly sequential: tasks, folders, and uploads are
//! processed one at a time over a single authenticated session. The first
//! error aborts the run; there is no partial continuation.

pub mod labels;
pub mod share;

use std::collections::HashSet;
use std::time::Duration;

use anyhow::Context;

use crate::config::Config;
use crate::cvat::{
    AnnotationServer, CvatClient, CvatError, NewTask, Task, TaskStatus, UploadRequest,
    UploadState,
};

/// Interval between upload status polls. There is deliberately no upper
/// bound on the number of polls: the run waits for as long as the server
/// keeps reporting a pending state.
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Connect and execute one reconciliation pass.
pub async fn run(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Connecting to server ({}:{})...", config.host, config.port);
    let client = CvatClient::connect(
        &config.host,
        &config.port,
        config.https,
        &config.username,
        &config.password,
    )
    .await?;

    run_with(&client, config).await
}

/// The reconciliation pass itself, driven through the [`AnnotationServer`]
/// seam so tests can substitute an in-memory server.
pub async fn run_with(server: &dyn AnnotationServer, config: &Config) -> anyhow::Result<()> {
    tracing::info!("Retrieving tasks...");
    let mut tasks = server.list_tasks().await?;
    log_task_summary(&tasks);

    let completed_count = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .count();
    tracing::info!(
        "{}/{} tasks with status \"completed\".",
        completed_count,
        tasks.len()
    );

    if config.clean_up_completed && completed_count > 0 {
        tracing::warn!("Cleaning up completed tasks...");
        clean_up_completed(server, &tasks, config).await?;

        tracing::info!("Retrieving tasks after cleanup...");
        tasks = server.list_tasks().await?;
        log_task_summary(&tasks);
    }

    // Folders are scanned only after cleanup, so folders archived in this
    // run are excluded by their renamed postfix rather than by refetch
    // timing.
    tracing::info!("Scanning for folders...");
    tracing::info!("Main folder: {}", config.local_share.display());
    let scan = share::scan_share(&config.local_share, &config.completed_postfix)
        .with_context(|| format!("Failed to scan share root {}", config.local_share.display()))?;

    let all_names: Vec<&str> = scan
        .candidates
        .iter()
        .chain(scan.completed.iter())
        .map(|f| f.name.as_str())
        .collect();
    tracing::info!("Found {} folders: {}", scan.total(), all_names.join(":"));
    tracing::info!(
        "Ignoring {}/{} folders marked as completed.",
        scan.completed.len(),
        scan.total()
    );

    let task_names: HashSet<String> = tasks.iter().map(|t| t.name.clone()).collect();
    let unmatched = share::unmatched_folders(scan.candidates, &task_names);
    let unmatched_names: Vec<&str> = unmatched.iter().map(|f| f.name.as_str()).collect();
    tracing::info!("Folders ({}) not matching any tasks:", unmatched.len());
    tracing::info!("{}", unmatched_names.join(":"));

    if unmatched.is_empty() {
        tracing::info!("All folders accounted for. No new tasks created.");
    } else {
        tracing::info!("Creating new tasks for folders with no match...");

        // Read once per run, not cached across runs, so label edits take
        // effect on the next invocation.
        let label_schema = labels::load_labels(&config.labels)?;

        for folder in &unmatched {
            create_task_for_folder(server, folder, &label_schema, config).await?;
        }
    }

    tracing::info!("Done");
    Ok(())
}

fn log_task_summary(tasks: &[Task]) {
    tracing::info!("Found {} task(s) on the server:", tasks.len());
    for task in tasks {
        tracing::info!("{}", task);
    }
}

/// Archive every completed task: download its annotations into the local
/// folder, rename the folder with the completed postfix, then delete the
/// task server-side.
async fn clean_up_completed(
    server: &dyn AnnotationServer,
    tasks: &[Task],
    config: &Config,
) -> anyhow::Result<()> {
    for task in tasks.iter().filter(|t| t.status == TaskStatus::Completed) {
        tracing::info!("Cleaning up: {}", task.name);

        tracing::info!("Downloading annotations...");
        let local_task_folder = config.local_share.join(&task.name);
        tokio::fs::create_dir_all(&local_task_folder).await?;
        let archive_path = local_task_folder.join("annotations.zip");
        tracing::debug!("{}", archive_path.display());
        server
            .download_annotations(task, &archive_path, config.annotation_format)
            .await?;

        tracing::info!("Rename local folder.");
        let renamed = config
            .local_share
            .join(format!("{}{}", task.name, config.completed_postfix));
        tracing::debug!(
            "{} --> {}",
            local_task_folder.display(),
            renamed.display()
        );
        tokio::fs::rename(&local_task_folder, &renamed).await?;

        tracing::info!("Deleting task on server...");
        server.delete_task(task).await?;
        tracing::info!("{} cleaned up.", task.name);
    }
    Ok(())
}

/// Create a task for one unmatched folder and upload its images via the
/// server-share mode. A folder with no `*.jpg` files produces no task.
async fn create_task_for_folder(
    server: &dyn AnnotationServer,
    folder: &share::LocalFolder,
    label_schema: &serde_json::Value,
    config: &Config,
) -> anyhow::Result<()> {
    tracing::info!("Processing folder: {}", folder.name);

    let images = share::list_jpg_files(&folder.path)
        .with_context(|| format!("Failed to list images in {}", folder.path.display()))?;
    tracing::info!("Found {} images", images.len());

    if images.is_empty() {
        tracing::warn!("No images found in folder. Skipping task creation.");
        return Ok(());
    }

    let share_paths: Vec<String> = images
        .iter()
        .map(|f| share::share_file_path(&folder.name, f))
        .collect();
    tracing::debug!("{}", share_paths.join(";"));

    tracing::info!("Creating task");
    let task = server
        .create_task(&NewTask {
            name: folder.name.clone(),
            labels: label_schema.clone(),
            overlap: config.overlap,
            segment_size: config.job_size,
            z_order: false,
            bug_tracker: String::new(),
            project: None,
        })
        .await?;

    tracing::info!("Adding images to task...");
    server
        .upload_data(&task, UploadRequest::share(share_paths, config.image_quality))
        .await?;

    wait_for_upload(server, &task).await?;
    Ok(())
}

/// Poll the upload status once per [`STATUS_POLL_INTERVAL`] until the server
/// reports a terminal state. There is no timeout: a server that never leaves
/// "Queued" or "Started" blocks the run until the process is terminated. A
/// terminal "Failed" state is logged as a warning and does not abort the run.
async fn wait_for_upload(
    server: &dyn AnnotationServer,
    task: &Task,
) -> Result<(), CvatError> {
    tokio::time::sleep(STATUS_POLL_INTERVAL).await;
    let mut status = server.upload_status(task).await?;
    while status.state.is_pending() {
        tracing::info!("State: {} Message: {}", status.state, status.message);
        tokio::time::sleep(STATUS_POLL_INTERVAL).await;
        status = server.upload_status(task).await?;
    }
    if status.state == UploadState::Failed {
        tracing::warn!("State: {}. Message: {}", status.state, status.message);
    } else {
        tracing::info!("State: {}. Message: {}", status.state, status.message);
    }
    Ok(())
}
