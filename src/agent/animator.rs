use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use rand::Rng;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::AnimationConfig;
use crate::error::DashboardError;
use crate::geo::{Coordinate, GeoPointSampler};
use crate::map::{MapHandle, MapSlot, MarkerStyle};

/// 巡游过程中轮播的阶段提示
pub fn phase_messages(city: &str) -> Vec<String> {
    vec![
        format!("🔍 GeoTaste Agent analyzing business environment in {}...", city),
        "📊 Calling Qloo API for brand insights...".to_string(),
        "🏢 Gathering local business data...".to_string(),
        "📈 Processing market analytics...".to_string(),
        "🎯 Identifying top brands and categories...".to_string(),
        "📋 Compiling business intelligence...".to_string(),
        "✨ Generating visualizations...".to_string(),
        "🚀 Almost ready with insights!".to_string(),
    ]
}

/// 代理状态弹窗内容
pub fn popup_html(message: &str) -> String {
    format!(
        "<div class=\"agent-status\"><div class=\"agent-title\">🤖 GeoTaste Agent</div><div class=\"agent-message\">{}</div></div>",
        message
    )
}

/// 一次动画运行的可变状态，由计时任务与 `stop` 共享
struct AnimationState {
    active: bool,
    points: Vec<Coordinate>,
    cursor: usize,
    messages: Vec<String>,
    message_index: usize,
}

struct AnimationRun {
    state: Arc<Mutex<AnimationState>>,
    map: Arc<dyn MapHandle>,
    stop_tx: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
}

/// 代理动画器
///
/// 每个地图实例同一时刻只持有一个计时任务；`start` 会先结束上一次运行。
pub struct AgentAnimator {
    map: MapSlot,
    config: AnimationConfig,
    sampler: GeoPointSampler,
    run: Option<AnimationRun>,
    live_timers: Arc<AtomicUsize>,
}

impl AgentAnimator {
    pub fn new(map: MapSlot, config: AnimationConfig) -> Self {
        let sampler = GeoPointSampler::new(config.radius_degrees);
        Self {
            map,
            config,
            sampler,
            run: None,
            live_timers: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 开始围绕 `center` 巡游，返回是否真正启动
    ///
    /// 地图未就绪或不在tokio运行时中时不做任何事。
    pub fn start(&mut self, center: Coordinate, label: &str) -> bool {
        self.stop();

        let Some(map) = self.map.get() else {
            tracing::debug!("skipping agent animation: {}", DashboardError::AnimationUnavailable);
            return false;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("skipping agent animation: no async runtime available");
            return false;
        };

        let points = self.sampler.generate(center, self.config.point_count);
        if points.is_empty() {
            return false;
        }

        map.place_marker(center, MarkerStyle::AGENT);

        let state = Arc::new(Mutex::new(AnimationState {
            active: true,
            points,
            cursor: 0,
            messages: phase_messages(label),
            message_index: 0,
        }));
        let (stop_tx, stop_rx) = oneshot::channel();
        let join = runtime.spawn(tick_loop(
            state.clone(),
            map.clone(),
            self.config.clone(),
            stop_rx,
            TimerGuard::new(self.live_timers.clone()),
        ));

        tracing::debug!(%center, label, "agent animation started");
        self.run = Some(AnimationRun {
            state,
            map,
            stop_tx: Some(stop_tx),
            join,
        });
        true
    }

    /// 结束动画并移除标记与弹窗；未运行时调用是无害的
    pub fn stop(&mut self) -> bool {
        let Some(mut run) = self.run.take() else {
            return false;
        };

        {
            // 持锁清理，保证之后不会再有一次巡游步骤落到地图上
            let mut state = lock(&run.state);
            state.active = false;
            run.map.remove_marker();
            run.map.remove_popup();
        }
        if let Some(stop_tx) = run.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        run.join.abort();

        tracing::debug!("agent animation stopped");
        true
    }

    pub fn is_running(&self) -> bool {
        self.run
            .as_ref()
            .is_some_and(|run| !run.join.is_finished() && lock(&run.state).active)
    }

    /// 仍存活的计时任务数量
    pub fn live_timers(&self) -> usize {
        self.live_timers.load(Ordering::SeqCst)
    }

    /// 当前运行的巡游点
    pub fn points(&self) -> Option<Vec<Coordinate>> {
        self.run.as_ref().map(|run| lock(&run.state).points.clone())
    }
}

impl Drop for AgentAnimator {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for AgentAnimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentAnimator")
            .field("map", &self.map)
            .field("running", &self.is_running())
            .field("live_timers", &self.live_timers())
            .finish()
    }
}

/// 计时任务存活计数，任务结束或被中止时归还
struct TimerGuard(Arc<AtomicUsize>);

impl TimerGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn tick_loop(
    state: Arc<Mutex<AnimationState>>,
    map: Arc<dyn MapHandle>,
    config: AnimationConfig,
    mut stop_rx: oneshot::Receiver<()>,
    _guard: TimerGuard,
) {
    let mut ticker = tokio::time::interval(config.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = &mut stop_rx => break,
            _ = ticker.tick() => {
                let mut state = lock(&state);
                if !state.active {
                    break;
                }
                advance(&mut state, map.as_ref(), &config);
            }
        }
    }
}

/// 飞往下一个巡游点，移动标记并轮换提示
fn advance(state: &mut AnimationState, map: &dyn MapHandle, config: &AnimationConfig) {
    let target = state.points[state.cursor];
    let zoom = rand::rng().random_range(config.zoom_min..=config.zoom_max);

    map.fly_to(target, zoom, config.fly_duration());
    map.place_marker(target, MarkerStyle::AGENT);

    let message = &state.messages[state.message_index];
    map.set_popup(target, &popup_html(message));

    state.cursor = (state.cursor + 1) % state.points.len();
    state.message_index = (state.message_index + 1) % state.messages.len();
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
