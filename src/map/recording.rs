use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{MapHandle, MarkerStyle};
use crate::geo::Coordinate;

/// 下发到地图的一条命令
#[derive(Debug, Clone, PartialEq)]
pub enum MapCommand {
    FlyTo {
        target: Coordinate,
        zoom: f64,
        duration: Duration,
    },
    PlaceMarker {
        at: Coordinate,
        style: MarkerStyle,
    },
    RemoveMarker,
    SetPopup {
        at: Coordinate,
        html: String,
    },
    RemovePopup,
}

/// 记录全部命令的内存地图，同时跟踪当前标记与弹窗是否存在
///
/// 可以与其他观察者共享同一条日志，用于断言"先停动画、后展示面板"的顺序。
#[derive(Clone, Default)]
pub struct RecordingMap {
    commands: Arc<Mutex<Vec<MapCommand>>>,
    journal: Option<Arc<Mutex<Vec<String>>>>,
    marker: Arc<Mutex<Option<Coordinate>>>,
    popup: Arc<Mutex<Option<Coordinate>>>,
}

impl RecordingMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 额外把命令摘要写入共享日志
    pub fn with_journal(journal: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            journal: Some(journal),
            ..Self::default()
        }
    }

    pub fn commands(&self) -> Vec<MapCommand> {
        lock(&self.commands).clone()
    }

    pub fn fly_targets(&self) -> Vec<Coordinate> {
        lock(&self.commands)
            .iter()
            .filter_map(|command| match command {
                MapCommand::FlyTo { target, .. } => Some(*target),
                _ => None,
            })
            .collect()
    }

    pub fn marker(&self) -> Option<Coordinate> {
        *lock(&self.marker)
    }

    pub fn popup(&self) -> Option<Coordinate> {
        *lock(&self.popup)
    }

    pub fn popup_messages(&self) -> Vec<String> {
        lock(&self.commands)
            .iter()
            .filter_map(|command| match command {
                MapCommand::SetPopup { html, .. } => Some(html.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        lock(&self.commands).clear();
    }

    fn record(&self, command: MapCommand) {
        if let Some(journal) = &self.journal {
            let entry = match &command {
                MapCommand::FlyTo { .. } => "map:fly_to",
                MapCommand::PlaceMarker { .. } => "map:place_marker",
                MapCommand::RemoveMarker => "map:remove_marker",
                MapCommand::SetPopup { .. } => "map:set_popup",
                MapCommand::RemovePopup => "map:remove_popup",
            };
            lock(journal).push(entry.to_string());
        }
        lock(&self.commands).push(command);
    }
}

impl MapHandle for RecordingMap {
    fn fly_to(&self, target: Coordinate, zoom: f64, duration: Duration) {
        self.record(MapCommand::FlyTo {
            target,
            zoom,
            duration,
        });
    }

    fn place_marker(&self, at: Coordinate, style: MarkerStyle) {
        *lock(&self.marker) = Some(at);
        self.record(MapCommand::PlaceMarker { at, style });
    }

    fn remove_marker(&self) {
        *lock(&self.marker) = None;
        self.record(MapCommand::RemoveMarker);
    }

    fn set_popup(&self, at: Coordinate, html: &str) {
        *lock(&self.popup) = Some(at);
        self.record(MapCommand::SetPopup {
            at,
            html: html.to_string(),
        });
    }

    fn remove_popup(&self) {
        *lock(&self.popup) = None;
        self.record(MapCommand::RemovePopup);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
