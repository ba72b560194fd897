pub mod constants;
pub mod export;
pub mod layout;
pub mod marks;
mod options;
mod preview;
pub mod render;
mod stats;
mod types;

pub use export::{
    AverageBorderSampler, BorderColorSampler, CancelToken, ExportOutcome, ImageStore, PendingJobs,
    export_file, normalize_path_key,
};
pub use layout::{cut_rectangles, needs_rotation, paginate, reorder_back};
pub use options::*;
pub use preview::{PreviewCache, render_preview_page};
pub use stats::{LayoutStatistics, calculate_statistics};
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImposeError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Decode error: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Sampler error: {0}")]
    Sampler(String),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
    #[error("No pages with content")]
    NoContent,
}

pub type Result<T> = std::result::Result<T, ImposeError>;
