//! One-stop imports for the capture-to-map pipeline.

pub use crate::capture::{CaptureConfig, CaptureError, Clip, PendingCapture, Recorder};
pub use crate::locate::LocationSource;
pub use crate::model::{Coordinates, NoiseRecord};
pub use crate::policy::{HeatPolicy, MarkerPolicy, RenderPolicy};
pub use crate::render::{HeatPoint, MapRenderer, MapSurface, Marker, MarkerColor, NoiseBucket};
pub use crate::session::{Session, SessionOutcome, SessionReport};
pub use crate::store::{FetchError, RecordStore};
pub use crate::upload::{UploadClient, UploadError, UploadReceipt};
pub use crate::view::{apply, ViewEvent, ViewMode, ViewState};
