use log::info;

/// Sink for pipeline progress lines.
#[derive(Debug)]
pub struct PipelineLog;

impl PipelineLog {
    pub fn new() -> Self {
        Self
    }

    pub fn record(&self, message: &str) {
        info!("{}", message);
    }
}

impl Default for PipelineLog {
    fn default() -> Self {
        Self::new()
    }
}
