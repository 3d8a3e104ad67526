use async_trait::async_trait;
use geotaste_rs::backend::{AnalysisBackend, CityTarget, Geocoder, Narrative, VisualizationSet};
use geotaste_rs::config::Config;
use geotaste_rs::geo::Coordinate;
use geotaste_rs::map::{MapCommand, MapSlot, MarkerStyle, RecordingMap};
use geotaste_rs::orchestrator::PanelContent;
use geotaste_rs::panels::{PanelEvent, RecordingPanels};
use geotaste_rs::{Dashboard, DashboardCommand, DashboardError, DashboardResult};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// 按城市名返回固定坐标的地理编码
struct FixtureGeocoder {
    cities: HashMap<String, CityTarget>,
}

impl FixtureGeocoder {
    fn new() -> Self {
        let cities = [
            CityTarget::new("London", "GB", Coordinate::new(-0.1276, 51.5072)),
            CityTarget::new("Paris", "FR", Coordinate::new(2.3522, 48.8566)),
            CityTarget::new("Tokyo", "JP", Coordinate::new(139.6917, 35.6895)),
        ]
        .into_iter()
        .map(|city| (city.name.to_lowercase(), city))
        .collect();
        Self { cities }
    }
}

#[async_trait]
impl Geocoder for FixtureGeocoder {
    async fn lookup(&self, query: &str) -> DashboardResult<CityTarget> {
        self.cities
            .get(&query.trim().to_lowercase())
            .cloned()
            .ok_or_else(|| DashboardError::GeocodeNotFound {
                query: query.to_string(),
            })
    }
}

/// 按城市设定两个任务的耗时
struct DelayedBackend {
    delays: HashMap<String, (Duration, Duration)>,
    calls: Mutex<Vec<String>>,
}

impl DelayedBackend {
    fn new(delays: &[(&str, u64, u64)]) -> Self {
        let delays = delays
            .iter()
            .map(|(city, viz, narrative)| {
                (
                    city.to_string(),
                    (Duration::from_millis(*viz), Duration::from_millis(*narrative)),
                )
            })
            .collect();
        Self {
            delays,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn delay(&self, city: &CityTarget) -> (Duration, Duration) {
        self.delays
            .get(&city.name)
            .copied()
            .unwrap_or((Duration::ZERO, Duration::ZERO))
    }
}

#[async_trait]
impl AnalysisBackend for DelayedBackend {
    async fn fetch_visualizations(&self, city: &CityTarget) -> DashboardResult<VisualizationSet> {
        self.calls.lock().unwrap().push(format!("viz:{}", city.name));
        tokio::time::sleep(self.delay(city).0).await;
        VisualizationSet::from_response(json!({
            "business_density": format!("{{\"city\":\"{}\"}}", city.name),
            "price_range": "{\"data\":[]}",
            "city_summary": null
        }))
    }

    async fn fetch_narrative(&self, city: &CityTarget) -> DashboardResult<Narrative> {
        self.calls.lock().unwrap().push(format!("narrative:{}", city.name));
        tokio::time::sleep(self.delay(city).1).await;
        Ok(Narrative {
            analysis: format!("{} ({}) has a dense retail core.", city.name, city.country_code),
        })
    }

    async fn chat(&self, city: &CityTarget, message: &str) -> DashboardResult<String> {
        Ok(format!("{}: {}", city.name, message))
    }
}

struct Running {
    tx: mpsc::Sender<DashboardCommand>,
    task: JoinHandle<anyhow::Result<()>>,
    map: RecordingMap,
    panels: RecordingPanels,
}

impl Running {
    fn start(config: Config, backend: DelayedBackend) -> Self {
        let map = RecordingMap::new();
        let panels = RecordingPanels::new();
        let dashboard = Dashboard::new(
            &config,
            MapSlot::with_handle(Arc::new(map.clone())),
            Arc::new(FixtureGeocoder::new()),
            Arc::new(backend),
            Arc::new(panels.clone()),
        );
        let (tx, rx) = mpsc::channel(8);
        let task = tokio::spawn(dashboard.run(rx));
        Self {
            tx,
            task,
            map,
            panels,
        }
    }

    async fn send(&self, command: DashboardCommand) {
        self.tx.send(command).await.unwrap();
    }

    async fn shutdown(self) {
        self.tx.send(DashboardCommand::Shutdown).await.unwrap();
        self.task.await.unwrap().unwrap();
    }
}

async fn advance_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

fn agent_flights(map: &RecordingMap) -> usize {
    map.commands()
        .iter()
        .filter(|c| matches!(c, MapCommand::FlyTo { zoom, .. } if *zoom >= 13.0))
        .count()
}

#[tokio::test(start_paused = true)]
async fn test_london_reveals_after_slowest_job() {
    let dashboard = Running::start(Config::default(), DelayedBackend::new(&[("London", 2000, 5000)]));

    dashboard.send(DashboardCommand::Search("London".into())).await;
    advance_ms(4900).await;

    // 5秒前只有动画在跑，面板尚未展示
    assert_eq!(dashboard.panels.reveal_count(), 0);
    assert_eq!(agent_flights(&dashboard.map), 3);
    assert!(dashboard.map.marker().is_some());

    advance_ms(200).await;
    assert_eq!(dashboard.panels.reveal_count(), 1);
    let session = dashboard.panels.last_revealed().unwrap();
    assert_eq!(session.city.to_string(), "London, GB");
    assert_eq!(session.visualizations.loaded().unwrap().len(), 2);
    assert_eq!(
        session.narrative.loaded().unwrap().analysis,
        "London (GB) has a dense retail core."
    );

    let london = Coordinate::new(-0.1276, 51.5072);
    assert_eq!(dashboard.map.fly_targets().last(), Some(&london));
    assert_eq!(
        dashboard.map.commands().last(),
        Some(&MapCommand::PlaceMarker {
            at: london,
            style: MarkerStyle::City
        })
    );

    // 展示之后不再有巡游步骤
    let commands = dashboard.map.commands().len();
    advance_ms(5000).await;
    assert_eq!(dashboard.map.commands().len(), commands);

    dashboard.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_newer_search_discards_older_results() {
    let dashboard = Running::start(
        Config::default(),
        DelayedBackend::new(&[("Paris", 2000, 3000), ("Tokyo", 2000, 5000)]),
    );

    dashboard.send(DashboardCommand::Search("Paris".into())).await;
    advance_ms(1000).await;
    dashboard.send(DashboardCommand::Search("Tokyo".into())).await;
    advance_ms(4000).await;

    // Paris的两个任务本应在3秒内完成，但结果不得展示
    assert_eq!(dashboard.panels.reveal_count(), 0);

    advance_ms(2000).await;
    let revealed: Vec<String> = dashboard
        .panels
        .events()
        .into_iter()
        .filter_map(|event| match event {
            PanelEvent::Revealed(_, name) => Some(name),
            _ => None,
        })
        .collect();
    assert_eq!(revealed, vec!["Tokyo".to_string()]);
    let session = dashboard.panels.last_revealed().unwrap();
    assert_eq!(
        session.narrative.loaded().unwrap().analysis,
        "Tokyo (JP) has a dense retail core."
    );

    dashboard.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_job_still_reveals() {
    let mut config = Config::default();
    config.backend.request_timeout_seconds = 3;
    let dashboard = Running::start(config, DelayedBackend::new(&[("London", 1000, 60_000)]));

    dashboard.send(DashboardCommand::Search("London".into())).await;
    advance_ms(3100).await;

    assert_eq!(dashboard.panels.reveal_count(), 1);
    let session = dashboard.panels.last_revealed().unwrap();
    assert!(session.visualizations.loaded().is_some());
    match &session.narrative {
        PanelContent::Error(message) => assert!(message.contains("timed out")),
        other => panic!("expected a timeout error, got {:?}", other),
    }

    dashboard.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_unknown_city_does_not_start_a_session() {
    let dashboard = Running::start(Config::default(), DelayedBackend::new(&[]));

    dashboard.send(DashboardCommand::Search("Atlantis".into())).await;
    advance_ms(3000).await;

    let events = dashboard.panels.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        PanelEvent::SearchFailed(query, DashboardError::GeocodeNotFound { .. }) if query == "Atlantis"
    ));
    assert!(dashboard.map.commands().is_empty());

    dashboard.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_close_then_search_again() {
    let dashboard = Running::start(Config::default(), DelayedBackend::new(&[("Paris", 500, 700)]));

    dashboard.send(DashboardCommand::Search("Paris".into())).await;
    advance_ms(1000).await;
    dashboard.send(DashboardCommand::Minimize).await;
    dashboard.send(DashboardCommand::Close).await;
    advance_ms(100).await;
    assert_eq!(dashboard.map.marker(), None);

    dashboard.send(DashboardCommand::Search("Paris".into())).await;
    advance_ms(1000).await;

    let events = dashboard.panels.events();
    assert_eq!(dashboard.panels.reveal_count(), 2);
    assert!(events.iter().any(|e| matches!(e, PanelEvent::Minimized(_, true))));
    assert!(events.contains(&PanelEvent::Closed));
    let session = dashboard.panels.last_revealed().unwrap();
    assert!(!session.minimized);

    dashboard.shutdown().await;
}
