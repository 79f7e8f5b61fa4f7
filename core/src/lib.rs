//! Core capture-to-map pipeline for the crowd-sourced ambient noise map.
//!
//! The modules follow one sample through its life: capture a clip, resolve a
//! position, upload, fetch the stored set back, and turn it into map layers.
//! Rendering stays behind the [`render::MapSurface`] trait so any toolkit can
//! host the map.

pub mod capture;
pub mod level;
pub mod locate;
pub mod model;
pub mod policy;
pub mod prelude;
pub mod render;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod upload;
pub mod view;

pub use prelude::{NoiseRecord, Session, ViewMode};
