use crate::model::NoiseRecord;

/// Which overlays the map is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Pins,
    Heat,
    Both,
}

impl ViewMode {
    pub const ALL: [ViewMode; 3] = [ViewMode::Pins, ViewMode::Heat, ViewMode::Both];

    pub fn shows_pins(self) -> bool {
        matches!(self, ViewMode::Pins | ViewMode::Both)
    }

    pub fn shows_heat(self) -> bool {
        matches!(self, ViewMode::Heat | ViewMode::Both)
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Pins => "Pins",
            ViewMode::Heat => "Heat",
            ViewMode::Both => "Both",
        }
    }
}

/// The single owned copy of what the map shows: the active mode plus the
/// current working set of records.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub mode: ViewMode,
    pub records: Vec<NoiseRecord>,
}

#[derive(Debug, Clone)]
pub enum ViewEvent {
    ModeSelected(ViewMode),
    RecordsReplaced(Vec<NoiseRecord>),
}

/// Pure transition function. A mode selection never edits the records and a
/// record refresh never edits the mode; refreshes replace the whole set.
pub fn apply(state: ViewState, event: ViewEvent) -> ViewState {
    match event {
        ViewEvent::ModeSelected(mode) => ViewState { mode, ..state },
        ViewEvent::RecordsReplaced(records) => ViewState { records, ..state },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mode_is_pins() {
        assert_eq!(ViewState::default().mode, ViewMode::Pins);
    }

    #[test]
    fn every_mode_transition_is_reachable() {
        for from in ViewMode::ALL {
            for to in ViewMode::ALL {
                let state = ViewState {
                    mode: from,
                    records: Vec::new(),
                };
                let next = apply(state, ViewEvent::ModeSelected(to));
                assert_eq!(next.mode, to);
            }
        }
    }

    #[test]
    fn mode_selection_leaves_records_alone() {
        let state = ViewState {
            mode: ViewMode::Pins,
            records: vec![NoiseRecord::unlocated(33.0, "t0")],
        };
        let next = apply(state, ViewEvent::ModeSelected(ViewMode::Both));
        assert_eq!(next.records.len(), 1);
        assert_eq!(next.records[0].db, 33.0);
    }

    #[test]
    fn refresh_replaces_instead_of_appending() {
        let state = ViewState {
            mode: ViewMode::Heat,
            records: vec![
                NoiseRecord::unlocated(10.0, "old-a"),
                NoiseRecord::unlocated(11.0, "old-b"),
            ],
        };
        let fresh = vec![NoiseRecord::unlocated(50.0, "new")];
        let next = apply(state, ViewEvent::RecordsReplaced(fresh));
        assert_eq!(next.mode, ViewMode::Heat);
        assert_eq!(next.records.len(), 1);
        assert_eq!(next.records[0].timestamp, "new");
    }

    #[test]
    fn overlay_visibility_per_mode() {
        assert!(ViewMode::Pins.shows_pins() && !ViewMode::Pins.shows_heat());
        assert!(!ViewMode::Heat.shows_pins() && ViewMode::Heat.shows_heat());
        assert!(ViewMode::Both.shows_pins() && ViewMode::Both.shows_heat());
    }
}
