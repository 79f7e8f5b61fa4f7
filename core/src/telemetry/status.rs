//! User-facing status lines, kept identical across every surface that shows
//! them.

use crate::capture::CaptureError;
use crate::store::FetchError;
use crate::upload::UploadError;

pub const PERMISSION_PROMPT: &str = "Requesting microphone permission...";
pub const PERMISSION_DENIED: &str = "Microphone permission denied!";
pub const UPLOAD_FAILED: &str = "Upload failed!";
pub const CONNECTION_ERROR: &str = "Error connecting to server!";

pub fn recording(duration_secs: u64) -> String {
    format!("Recording for {} seconds...", duration_secs)
}

pub fn finished(db: f64) -> String {
    format!("Recording finished! Noise Level: {:.2} dB", db)
}

pub fn capture_error(err: &CaptureError) -> String {
    match err {
        CaptureError::Denied(_) => PERMISSION_DENIED.to_string(),
        other => format!("Recording failed: {other}"),
    }
}

/// Rejections and transport failures read differently on purpose: one means
/// the service saw and refused the sample, the other means it never did.
pub fn upload_error(err: &UploadError) -> &'static str {
    match err {
        UploadError::Rejected { .. } => UPLOAD_FAILED,
        UploadError::Transport(_) => CONNECTION_ERROR,
    }
}

pub fn fetch_failed(err: &FetchError) -> String {
    format!("Failed to fetch data: {err}")
}
