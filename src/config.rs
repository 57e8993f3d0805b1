use std::path::PathBuf;

use anyhow::Context;

use crate::cli::Cli;
use crate::types::AnnotationFormat;

/// Application configuration, built once from the parsed CLI.
pub struct Config {
    pub host: String,
    pub port: String,
    pub username: String,
    pub password: String,
    pub local_share: PathBuf,
    pub completed_postfix: String,
    pub labels: PathBuf,
    pub log_file: PathBuf,
    pub job_size: u32,
    pub overlap: u32,
    pub image_quality: u8,
    pub annotation_format: AnnotationFormat,
    pub https: bool,
    pub clean_up_completed: bool,
    pub debug: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("https", &self.https)
            .field("local_share", &self.local_share)
            .field("completed_postfix", &self.completed_postfix)
            .field("labels", &self.labels)
            .field("job_size", &self.job_size)
            .field("overlap", &self.overlap)
            .field("image_quality", &self.image_quality)
            .field("annotation_format", &self.annotation_format)
            .field("clean_up_completed", &self.clean_up_completed)
            .field("log_file", &self.log_file)
            .field("debug", &self.debug)
            .finish()
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Config {
    pub fn from_cli(cli: Cli) -> anyhow::Result<Self> {
        if cli.image_quality > 100 {
            anyhow::bail!(
                "--image_quality must be between 0 and 100, got {}",
                cli.image_quality
            );
        }

        let password = match cli.password {
            Some(p) => p,
            None => rpassword::prompt_password("CVAT Password: ")
                .context("Failed to read password from prompt")?,
        };

        Ok(Self {
            host: cli.host,
            port: cli.port,
            username: cli.username,
            password,
            local_share: expand_tilde(&cli.local_share),
            completed_postfix: cli.completed_postfix,
            labels: expand_tilde(&cli.labels),
            log_file: expand_tilde(&cli.log_file),
            job_size: cli.job_size,
            overlap: cli.overlap,
            image_quality: cli.image_quality,
            annotation_format: cli.annotation_format,
            https: cli.https,
            clean_up_completed: cli.clean_up_completed,
            debug: cli.debug,
        })
    }
}
