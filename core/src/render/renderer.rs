use super::classify::{heat_intensity, NoiseBucket};
use super::layers::{popup_text, HeatPoint, MapSurface, Marker};
use crate::model::NoiseRecord;
use crate::policy::RenderPolicy;
use crate::view::ViewState;

/// Builds marker and heat layers from the working set and pushes them onto a
/// surface according to the active view mode.
#[derive(Debug, Clone, Default)]
pub struct MapRenderer {
    policy: RenderPolicy,
}

impl MapRenderer {
    pub fn new(policy: RenderPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RenderPolicy {
        &self.policy
    }

    /// Markers for every record that carries a complete position. Records
    /// without one contribute nothing, whatever their loudness.
    pub fn markers(&self, records: &[NoiseRecord]) -> Vec<Marker> {
        records
            .iter()
            .filter_map(|record| {
                let position = record.position()?;
                Some(Marker {
                    latitude: position.latitude,
                    longitude: position.longitude,
                    color: NoiseBucket::for_level(record.db, &self.policy.marker).color(),
                    popup: popup_text(record),
                })
            })
            .collect()
    }

    pub fn heat_points(&self, records: &[NoiseRecord]) -> Vec<HeatPoint> {
        records
            .iter()
            .filter_map(|record| {
                let position = record.position()?;
                Some(HeatPoint {
                    latitude: position.latitude,
                    longitude: position.longitude,
                    intensity: heat_intensity(record.db, &self.policy.heat),
                })
            })
            .collect()
    }

    /// Rebuild the surface from scratch: clear both layers, then install the
    /// ones the mode calls for. Running this twice with the same state leaves
    /// the surface unchanged.
    pub fn redraw(&self, state: &ViewState, surface: &mut dyn MapSurface) {
        surface.clear_markers();
        surface.clear_heat();
        if state.mode.shows_pins() {
            surface.set_markers(&self.markers(&state.records));
        }
        if state.mode.shows_heat() {
            surface.set_heat(&self.heat_points(&state.records));
        }
    }
}
