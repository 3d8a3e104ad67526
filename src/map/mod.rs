//! 地图句柄能力接口
//!
//! 地图渲染引擎（瓦片、相机投影）属于外部组件，这里只定义编排层向它下发的命令。
//! 代理动画与"飞往搜索城市"动作是唯一允许驱动地图的两方，且不会并发。

use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::geo::Coordinate;

mod console;
mod recording;

pub use console::ConsoleMap;
pub use recording::{MapCommand, RecordingMap};

/// 标记样式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarkerStyle {
    /// 巡游中的分析代理
    Agent { scale: f64 },
    /// 搜索到的城市
    City,
}

impl MarkerStyle {
    pub const AGENT: MarkerStyle = MarkerStyle::Agent { scale: 0.8 };
}

/// 地图引擎对外暴露的命令面
pub trait MapHandle: Send + Sync {
    fn fly_to(&self, target: Coordinate, zoom: f64, duration: Duration);

    fn place_marker(&self, at: Coordinate, style: MarkerStyle);

    fn remove_marker(&self);

    fn set_popup(&self, at: Coordinate, html: &str);

    fn remove_popup(&self);
}

/// 可延迟挂载的地图句柄
///
/// 地图初始化完成前槽位为空，此时动画直接跳过。
#[derive(Clone, Default)]
pub struct MapSlot {
    inner: Arc<RwLock<Option<Arc<dyn MapHandle>>>>,
}

impl MapSlot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_handle(handle: Arc<dyn MapHandle>) -> Self {
        let slot = Self::default();
        slot.attach(handle);
        slot
    }

    /// 地图加载完成后挂载句柄
    pub fn attach(&self, handle: Arc<dyn MapHandle>) {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(handle);
    }

    pub fn get(&self) -> Option<Arc<dyn MapHandle>> {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.get().is_some()
    }
}

impl std::fmt::Debug for MapSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapSlot")
            .field("ready", &self.is_ready())
            .finish()
    }
}
