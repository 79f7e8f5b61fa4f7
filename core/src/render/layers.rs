use super::classify::MarkerColor;
use crate::model::NoiseRecord;

/// One pin on the map, already classified and captioned.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub latitude: f64,
    pub longitude: f64,
    pub color: MarkerColor,
    pub popup: String,
}

/// One weighted point of the heat overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub intensity: f64,
}

/// Popup caption for a marker; loudness rounded to two decimals, timestamp
/// passed through untouched.
pub fn popup_text(record: &NoiseRecord) -> String {
    format!("dB: {:.2}\nTime: {}", record.db, record.timestamp)
}

/// Whatever actually draws the map. The renderer only ever replaces or clears
/// whole layers, so a surface never sees partial updates.
pub trait MapSurface {
    fn set_markers(&mut self, markers: &[Marker]);
    fn set_heat(&mut self, points: &[HeatPoint]);
    fn clear_markers(&mut self);
    fn clear_heat(&mut self);
}
