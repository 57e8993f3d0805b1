//! Client for the annotation server's versioned REST API.
//!
//! One login per run; the session cookie and the optional CSRF token from
//! the login response are replayed on every later request. All calls run
//! strictly one at a time and there are no retries: the first non-2xx
//! response aborts the run.

pub mod client;
pub mod error;
pub mod responses;
pub mod upload;

pub use client::{AnnotationServer, CvatClient, NewTask};
pub use error::CvatError;
pub use responses::{Task, TaskStatus, UploadState, UploadStatus};
pub use upload::UploadRequest;
