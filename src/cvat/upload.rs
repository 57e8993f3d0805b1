use std::path::PathBuf;

use super::error::CvatError;

/// Image sources for a task data upload.
///
/// The server accepts exactly one source kind per request, so exactly one of
/// the three fields must be set. The combination is validated by
/// [`UploadRequest::into_source`] before any network traffic happens.
#[derive(Debug, Default, Clone)]
pub struct UploadRequest {
    /// Local files transferred through the client as multipart parts.
    pub client_files: Option<Vec<PathBuf>>,
    /// URLs the server fetches itself.
    pub remote_files: Option<Vec<String>>,
    /// Paths relative to a share already mounted on the server; no bytes
    /// travel through the client.
    pub share_files: Option<Vec<String>>,
    /// Re-encoding quality (0-100) applied server-side.
    pub image_quality: u8,
}

impl UploadRequest {
    #[allow(dead_code)] // the driver uploads via share mode only
    pub fn client(files: Vec<PathBuf>, image_quality: u8) -> Self {
        Self {
            client_files: Some(files),
            image_quality,
            ..Self::default()
        }
    }

    #[allow(dead_code)] // the driver uploads via share mode only
    pub fn remote(files: Vec<String>, image_quality: u8) -> Self {
        Self {
            remote_files: Some(files),
            image_quality,
            ..Self::default()
        }
    }

    pub fn share(files: Vec<String>, image_quality: u8) -> Self {
        Self {
            share_files: Some(files),
            image_quality,
            ..Self::default()
        }
    }

    /// Validate the exactly-one-source precondition and collapse the request
    /// into its single source.
    pub fn into_source(self) -> Result<(UploadSource, u8), CvatError> {
        let quality = self.image_quality;
        match (self.client_files, self.remote_files, self.share_files) {
            (Some(c), None, None) => Ok((UploadSource::Client(c), quality)),
            (None, Some(r), None) => Ok((UploadSource::Remote(r), quality)),
            (None, None, Some(s)) => Ok((UploadSource::Share(s), quality)),
            (None, None, None) => Err(CvatError::Configuration(
                "one of client_files, remote_files or share_files must be specified".into(),
            )),
            _ => Err(CvatError::Configuration(
                "only one of client_files, remote_files and share_files can be specified".into(),
            )),
        }
    }
}

/// The single validated source of an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadSource {
    Client(Vec<PathBuf>),
    Remote(Vec<String>),
    Share(Vec<String>),
}

/// Build the indexed form fields the data endpoint expects:
/// `prefix[0]`, `prefix[1]`, ... plus the trailing `image_quality` field.
pub(crate) fn indexed_fields(
    prefix: &str,
    values: &[String],
    image_quality: u8,
) -> Vec<(String, String)> {
    let mut fields: Vec<(String, String)> = values
        .iter()
        .enumerate()
        .map(|(i, v)| (format!("{prefix}[{i}]"), v.clone()))
        .collect();
    fields.push(("image_quality".to_string(), image_quality.to_string()));
    fields
}
