//! Classification and layer construction for the noise map, kept free of any
//! concrete drawing toolkit. Surfaces plug in through [`MapSurface`].

pub mod classify;
pub mod layers;
pub mod renderer;

pub use classify::{heat_intensity, MarkerColor, NoiseBucket};
pub use layers::{popup_text, HeatPoint, MapSurface, Marker};
pub use renderer::MapRenderer;
