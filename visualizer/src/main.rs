use iced::{
    mouse, time,
    widget::{
        button,
        canvas::{self, Canvas, Frame, Geometry, Path, Stroke},
        column, row, scrollable, text, Column, Container,
    },
    Alignment, Color, Element, Length, Point, Rectangle, Renderer, Subscription, Task, Theme,
};
use noisecore::capture::{CaptureConfig, Clip, Recorder};
use noisecore::locate::LocationSource;
use noisecore::model::NoiseRecord;
use noisecore::render::{HeatPoint, MapRenderer, MapSurface, Marker, MarkerColor};
use noisecore::session::{Session, SessionOutcome};
use noisecore::store::RecordStore;
use noisecore::telemetry::status;
use noisecore::view::{apply, ViewEvent, ViewMode, ViewState};
use std::sync::Arc;
use std::time::Duration;

fn main() -> iced::Result {
    iced::application(Visualizer::boot, Visualizer::update, Visualizer::view)
        .title(application_title)
        .subscription(application_subscription)
        .theme(application_theme)
        .run()
}

fn application_title(_: &Visualizer) -> String {
    "Ambient Noise Map".into()
}

fn application_subscription(_: &Visualizer) -> Subscription<Message> {
    time::every(Duration::from_secs(5)).map(|_| Message::Tick)
}

fn application_theme(state: &Visualizer) -> Theme {
    if state.dark {
        Theme::Dark
    } else {
        Theme::Light
    }
}

/// Map area shown by the canvas, in degrees of latitude around the center.
const MAP_CENTER: (f64, f64) = (19.0760, 72.8777);
const MAP_SPAN_LAT: f64 = 0.4;
const MARKER_RADIUS: f32 = 8.0;
const HEAT_RADIUS: f32 = 25.0;

#[derive(Debug)]
struct Visualizer {
    view: ViewState,
    layers: LayerSet,
    renderer: MapRenderer,
    session: Arc<Session>,
    store: RecordStore,
    recorder: Arc<Recorder>,
    status: String,
    history: Vec<String>,
    recording: bool,
    dark: bool,
    selected: Option<usize>,
}

#[derive(Debug, Clone)]
enum Message {
    Tick,
    RecordsFetched(Result<Vec<NoiseRecord>, String>),
    CaptureRequested,
    ClipCaptured(Result<Clip, String>),
    SessionFinished(Result<SessionOutcome, String>),
    ModeSelected(ViewMode),
    ThemeToggled,
    SampleSelected(usize),
}

impl Visualizer {
    fn boot() -> (Self, Task<Message>) {
        let base = service_origin();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        let store = RecordStore::with_client(http.clone(), base.clone());
        let session = Arc::new(Session::with_client(http, base, LocationSource::lookup()));

        let state = Visualizer {
            view: ViewState::default(),
            layers: LayerSet::default(),
            renderer: MapRenderer::default(),
            session,
            store: store.clone(),
            recorder: Arc::new(Recorder::new()),
            status: "Waiting for samples...".into(),
            history: Vec::new(),
            recording: false,
            dark: true,
            selected: None,
        };
        (
            state,
            Task::perform(fetch_records(store), Message::RecordsFetched),
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => Task::perform(
                fetch_records(state.store.clone()),
                Message::RecordsFetched,
            ),
            Message::RecordsFetched(Ok(records)) => {
                state.apply_event(ViewEvent::RecordsReplaced(records));
                Task::none()
            }
            Message::RecordsFetched(Err(err)) => {
                // The map keeps showing what it had.
                state.push_history(format!("Failed to fetch data: {err}"));
                Task::none()
            }
            Message::CaptureRequested => {
                if state.recording {
                    return Task::none();
                }
                state.recording = true;
                state.selected = None;
                state.status = status::recording(CaptureConfig::default().duration_secs);
                Task::perform(capture_clip(state.recorder.clone()), Message::ClipCaptured)
            }
            Message::ClipCaptured(Ok(clip)) => {
                state.status = "Uploading sample...".into();
                Task::perform(
                    submit_clip(state.session.clone(), clip),
                    Message::SessionFinished,
                )
            }
            Message::ClipCaptured(Err(err)) => {
                state.recording = false;
                state.status = err.clone();
                state.push_history(err);
                Task::none()
            }
            Message::SessionFinished(Ok(outcome)) => {
                state.recording = false;
                state.status = status::finished(outcome.receipt.db);
                state.push_history(format!(
                    "Sample stored: {:.2} dB (client estimate {:.2} dB)",
                    outcome.receipt.db, outcome.estimated_db
                ));
                Task::perform(
                    fetch_records(state.store.clone()),
                    Message::RecordsFetched,
                )
            }
            Message::SessionFinished(Err(err)) => {
                state.recording = false;
                state.status = err.clone();
                state.push_history(err);
                Task::none()
            }
            Message::ModeSelected(mode) => {
                state.apply_event(ViewEvent::ModeSelected(mode));
                Task::none()
            }
            Message::ThemeToggled => {
                state.dark = !state.dark;
                Task::none()
            }
            Message::SampleSelected(index) => {
                state.selected = Some(index);
                Task::none()
            }
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let mut record_button = button(if state.recording {
            "Recording..."
        } else {
            "Start Recording"
        })
        .padding(10);
        if !state.recording {
            record_button = record_button.on_press(Message::CaptureRequested);
        }

        let mode_row = row![
            button("Pins")
                .on_press(Message::ModeSelected(ViewMode::Pins))
                .padding(6),
            button("Heat")
                .on_press(Message::ModeSelected(ViewMode::Heat))
                .padding(6),
            button("Both")
                .on_press(Message::ModeSelected(ViewMode::Both))
                .padding(6),
        ]
        .spacing(8);

        let theme_button = button(if state.dark { "Light Mode" } else { "Dark Mode" })
            .on_press(Message::ThemeToggled)
            .padding(6);

        let sample_list = if state.layers.markers.is_empty() {
            Column::new().push(text("No located samples yet").size(12))
        } else {
            state.layers.markers.iter().enumerate().fold(
                Column::new().spacing(4),
                |col, (index, marker)| {
                    let label = format!(
                        "{} ({:.4}, {:.4})",
                        color_name(marker.color),
                        marker.latitude,
                        marker.longitude
                    );
                    col.push(
                        button(text(label).size(12))
                            .on_press(Message::SampleSelected(index))
                            .padding(4),
                    )
                },
            )
        };

        let detail_panel = match state
            .selected
            .and_then(|index| state.layers.markers.get(index))
        {
            Some(marker) => column![
                text("Sample details").size(16),
                text(marker.popup.clone()).size(13),
                text(format!(
                    "Position: {:.4}, {:.4}",
                    marker.latitude, marker.longitude
                ))
                .size(12),
            ]
            .spacing(4)
            .padding(6),
            None => column![text("Select a sample for details").size(12)].padding(6),
        };

        let history_list = if state.history.is_empty() {
            Column::new().push(text("No activity yet").size(12))
        } else {
            state
                .history
                .iter()
                .rev()
                .fold(Column::new().spacing(4), |col, entry| {
                    col.push(text(entry.clone()).size(12))
                })
        };

        let controls_column = column![
            text("Noise Sampler").size(26),
            record_button,
            text(&state.status).size(14),
            text(format!("Layers: {}", state.view.mode.label())).size(16),
            mode_row,
            theme_button,
            text("Legend").size(16),
            column![
                text("Green: up to 20 dB").size(12),
                text("Yellow: 20 to 60 dB").size(12),
                text("Red: above 60 dB").size(12),
                text("Heat spots brighten with loudness.").size(12),
            ]
            .spacing(4)
            .padding(6),
            text("Located samples").size(16),
            Container::new(scrollable(sample_list).height(Length::Fixed(150.0))).padding(6),
            detail_panel,
            text("Activity log").size(16),
            Container::new(scrollable(history_list).height(Length::Fixed(90.0))).padding(6),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fixed(360.0));

        let located = state
            .view
            .records
            .iter()
            .filter(|record| record.position().is_some())
            .count();
        let counts_info = text(format!(
            "Samples: {} stored, {} located",
            state.view.records.len(),
            located
        ))
        .size(18);

        let map_canvas = Canvas::new(NoiseMap::new(&state.layers, state.selected, state.dark))
            .width(Length::Fill)
            .height(Length::Fixed(440.0));

        let map_column = column![
            text("Ambient Noise Map").size(26),
            counts_info,
            map_canvas,
            text(format!(
                "Centered on {:.4}, {:.4}",
                MAP_CENTER.0, MAP_CENTER.1
            ))
            .size(12),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fill);

        let layout = row![controls_column, map_column]
            .spacing(20)
            .align_y(Alignment::Start)
            .padding(20);

        Container::new(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_y(Length::Fill)
            .into()
    }

    /// Run one event through the pure transition, then rebuild the layers
    /// from scratch for the resulting state.
    fn apply_event(&mut self, event: ViewEvent) {
        self.view = apply(std::mem::take(&mut self.view), event);
        self.renderer.redraw(&self.view, &mut self.layers);
        if self
            .selected
            .map_or(false, |index| index >= self.layers.markers.len())
        {
            self.selected = None;
        }
    }

    fn push_history(&mut self, entry: String) {
        self.history.push(entry);
        if self.history.len() > 20 {
            self.history.remove(0);
        }
    }
}

async fn fetch_records(store: RecordStore) -> Result<Vec<NoiseRecord>, String> {
    store.fetch_all().await.map_err(|err| err.to_string())
}

async fn capture_clip(recorder: Arc<Recorder>) -> Result<Clip, String> {
    let clip = recorder
        .record_async(CaptureConfig::default())
        .await
        .map_err(|err| status::capture_error(&err))?;
    // Keep a replayable copy of the latest sample.
    let _ = clip.save(&std::env::temp_dir().join("noise-map-recording.wav"));
    Ok(clip)
}

async fn submit_clip(session: Arc<Session>, clip: Clip) -> Result<SessionOutcome, String> {
    session
        .submit(clip)
        .await
        .map_err(|err| status::upload_error(&err).to_string())
}

fn service_origin() -> String {
    std::env::var("NOISE_MAP_URL").unwrap_or_else(|_| "http://127.0.0.1:5000".into())
}

fn color_name(color: MarkerColor) -> &'static str {
    match color {
        MarkerColor::Green => "green",
        MarkerColor::Yellow => "yellow",
        MarkerColor::Red => "red",
    }
}

/// The surface the renderer draws onto; the canvas reads it back each frame.
#[derive(Debug, Clone, Default)]
struct LayerSet {
    markers: Vec<Marker>,
    heat: Vec<HeatPoint>,
}

impl MapSurface for LayerSet {
    fn set_markers(&mut self, markers: &[Marker]) {
        self.markers = markers.to_vec();
    }

    fn set_heat(&mut self, points: &[HeatPoint]) {
        self.heat = points.to_vec();
    }

    fn clear_markers(&mut self) {
        self.markers.clear();
    }

    fn clear_heat(&mut self) {
        self.heat.clear();
    }
}

#[derive(Clone)]
struct NoiseMap {
    markers: Vec<Marker>,
    heat: Vec<HeatPoint>,
    selected: Option<usize>,
    dark: bool,
}

impl NoiseMap {
    fn new(layers: &LayerSet, selected: Option<usize>, dark: bool) -> Self {
        Self {
            markers: layers.markers.clone(),
            heat: layers.heat.clone(),
            selected,
            dark,
        }
    }
}

impl canvas::Program<Message> for NoiseMap {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let background = if self.dark {
            Color::from_rgb(0.07, 0.09, 0.11)
        } else {
            Color::from_rgb(0.91, 0.93, 0.94)
        };
        frame.fill_rectangle(Point::ORIGIN, bounds.size(), background);

        let grid_color = if self.dark {
            Color::from_rgb(0.13, 0.16, 0.19)
        } else {
            Color::from_rgb(0.80, 0.83, 0.85)
        };
        let grid = Path::new(|builder| {
            let cells = 8;
            for step in 1..cells {
                let x = bounds.width * step as f32 / cells as f32;
                builder.move_to(Point::new(x, 0.0));
                builder.line_to(Point::new(x, bounds.height));
                let y = bounds.height * step as f32 / cells as f32;
                builder.move_to(Point::new(0.0, y));
                builder.line_to(Point::new(bounds.width, y));
            }
        });
        frame.stroke(
            &grid,
            Stroke::default().with_width(1.0).with_color(grid_color),
        );

        // Heat sits under the pins.
        for point in &self.heat {
            let center = project(point.latitude, point.longitude, &bounds);
            let intensity = point.intensity.clamp(0.0, 1.0) as f32;
            let halo = Path::new(|builder| builder.circle(center, HEAT_RADIUS * 1.6));
            frame.fill(&halo, heat_color(intensity, 0.10));
            let core = Path::new(|builder| builder.circle(center, HEAT_RADIUS));
            frame.fill(&core, heat_color(intensity, 0.35));
        }

        for (index, marker) in self.markers.iter().enumerate() {
            let center = project(marker.latitude, marker.longitude, &bounds);
            let pin = Path::new(|builder| builder.circle(center, MARKER_RADIUS));
            frame.fill(&pin, marker_fill(marker.color));
            frame.stroke(
                &pin,
                Stroke::default()
                    .with_width(1.0)
                    .with_color(marker_ring(marker.color)),
            );
            if self.selected == Some(index) {
                let highlight =
                    Path::new(|builder| builder.circle(center, MARKER_RADIUS + 3.0));
                frame.stroke(
                    &highlight,
                    Stroke::default()
                        .with_width(2.0)
                        .with_color(Color::from_rgb(1.0, 1.0, 1.0)),
                );
            }
        }

        vec![frame.into_geometry()]
    }
}

/// Local equirectangular projection around the map center.
fn project(latitude: f64, longitude: f64, bounds: &Rectangle) -> Point {
    let scale = f64::from(bounds.height) / MAP_SPAN_LAT;
    let lon_scale = MAP_CENTER.0.to_radians().cos();
    let x = f64::from(bounds.width) / 2.0 + (longitude - MAP_CENTER.1) * scale * lon_scale;
    let y = f64::from(bounds.height) / 2.0 - (latitude - MAP_CENTER.0) * scale;
    Point::new(x as f32, y as f32)
}

fn marker_fill(color: MarkerColor) -> Color {
    match color {
        MarkerColor::Green => Color::from_rgba(0.18, 0.69, 0.31, 0.7),
        MarkerColor::Yellow => Color::from_rgba(0.95, 0.82, 0.18, 0.7),
        MarkerColor::Red => Color::from_rgba(0.86, 0.21, 0.18, 0.7),
    }
}

fn marker_ring(color: MarkerColor) -> Color {
    match color {
        MarkerColor::Green => Color::from_rgb(0.10, 0.42, 0.19),
        MarkerColor::Yellow => Color::from_rgb(0.62, 0.51, 0.08),
        MarkerColor::Red => Color::from_rgb(0.55, 0.12, 0.10),
    }
}

fn heat_color(intensity: f32, alpha_scale: f32) -> Color {
    let t = intensity.clamp(0.0, 1.0);
    Color::from_rgba(
        0.35 + 0.6 * t,
        0.55 - 0.25 * t,
        1.0 - 0.85 * t,
        alpha_scale * (0.35 + 0.65 * t),
    )
}
