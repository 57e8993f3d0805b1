use clap::Parser;

use crate::types::AnnotationFormat;

#[derive(Parser, Debug)]
#[command(
    name = "cvat-sync",
    about = "Synchronize local image folders with annotation tasks on a CVAT server"
)]
pub struct Cli {
    /// IP or URL of the server
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// Port of the server
    #[arg(long, default_value = "8080")]
    pub port: String,

    /// Username used for authentication at the server
    #[arg(long)]
    pub username: String,

    /// Password for the associated username. A password is always required;
    /// it may be given with this flag, the CVAT_PASSWORD environment
    /// variable, or an interactive prompt. WARNING: passing via --password
    /// is visible in process listings; prefer the environment variable.
    #[arg(long, env = "CVAT_PASSWORD")]
    pub password: Option<String>,

    /// Use an https connection instead of http
    #[arg(long)]
    pub https: bool,

    /// Path to the folder containing subfolders with images. The folder must
    /// be shared with and mounted on the server.
    #[arg(long = "local_share", default_value = "")]
    pub local_share: String,

    /// Ignore local folders with this postfix
    #[arg(long = "completed_postfix", default_value = "__completed")]
    pub completed_postfix: String,

    /// Json file specifying the task labels
    #[arg(long, default_value = "labels.json")]
    pub labels: String,

    /// Number of images in each job of the task. If set to 0, all images are
    /// put into a single job.
    #[arg(long = "job_size", default_value_t = 0)]
    pub job_size: u32,

    /// Number of images to overlap between jobs. If set to 0, no image
    /// overlap between jobs.
    #[arg(long, default_value_t = 0)]
    pub overlap: u32,

    /// Image quality (0-100) of jpeg images
    #[arg(long = "image_quality", default_value_t = 80)]
    pub image_quality: u8,

    /// Download annotations of completed tasks to the corresponding local
    /// folder, rename the folder with the completed postfix, and delete the
    /// task from the server.
    #[arg(long = "clean_up_completed")]
    pub clean_up_completed: bool,

    /// Annotation export format used when archiving completed tasks
    #[arg(
        long = "annotation_format",
        value_enum,
        default_value = "cvat-images-1-1"
    )]
    pub annotation_format: AnnotationFormat,

    /// Append log file capturing every step at debug level
    #[arg(long = "log_file", default_value = "cvat_sync.log")]
    pub log_file: String,

    /// Print additional debug info on the console
    #[arg(long)]
    pub debug: bool,
}
