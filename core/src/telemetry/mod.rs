pub mod log;
pub mod metrics;
pub mod status;

pub use log::PipelineLog;
pub use metrics::SessionMetrics;
