#[cfg(test)]
mod tests {
    use crate::agent::{AgentAnimator, phase_messages, popup_html};
    use crate::config::AnimationConfig;
    use crate::geo::Coordinate;
    use crate::map::{MapCommand, MapSlot, MarkerStyle, RecordingMap};
    use std::sync::Arc;
    use std::time::Duration;

    const PARIS: Coordinate = Coordinate::new(2.3522, 48.8566);

    fn animator_with_map(config: AnimationConfig) -> (AgentAnimator, RecordingMap) {
        let map = RecordingMap::new();
        let slot = MapSlot::with_handle(Arc::new(map.clone()));
        (AgentAnimator::new(slot, config), map)
    }

    async fn advance_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_without_map_is_noop() {
        let mut animator = AgentAnimator::new(MapSlot::empty(), AnimationConfig::default());

        assert!(!animator.start(PARIS, "Paris"));
        assert!(!animator.is_running());
        assert_eq!(animator.live_timers(), 0);
        assert!(!animator.stop());
    }

    #[test]
    fn test_start_outside_runtime_is_noop() {
        let (mut animator, map) = animator_with_map(AnimationConfig::default());

        assert!(!animator.start(PARIS, "Paris"));
        assert!(map.commands().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_places_marker_and_tours_points() {
        let (mut animator, map) = animator_with_map(AnimationConfig::default());

        assert!(animator.start(PARIS, "Paris"));
        assert_eq!(
            map.commands().first(),
            Some(&MapCommand::PlaceMarker {
                at: PARIS,
                style: MarkerStyle::AGENT
            })
        );

        // 首次步进立即发生
        advance_ms(10).await;
        let points = animator.points().unwrap();
        assert_eq!(points.len(), 8);
        assert_eq!(map.fly_targets(), vec![points[0]]);
        assert_eq!(map.marker(), Some(points[0]));
        assert_eq!(map.popup(), Some(points[0]));

        advance_ms(1800).await;
        assert_eq!(map.fly_targets(), vec![points[0], points[1]]);
        assert_eq!(map.marker(), Some(points[1]));
        assert!(animator.is_running());
        assert_eq!(animator.live_timers(), 1);

        animator.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_zoom_stays_in_band() {
        let config = AnimationConfig::default();
        let (mut animator, map) = animator_with_map(config.clone());

        animator.start(PARIS, "Paris");
        advance_ms(1800 * 6 + 10).await;
        animator.stop();

        let zooms: Vec<f64> = map
            .commands()
            .into_iter()
            .filter_map(|command| match command {
                MapCommand::FlyTo { zoom, duration, .. } => {
                    assert_eq!(duration, config.fly_duration());
                    Some(zoom)
                }
                _ => None,
            })
            .collect();
        assert_eq!(zooms.len(), 7);
        assert!(zooms.iter().all(|z| (13.0..=15.0).contains(z)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_messages_wrap_independently_of_points() {
        let config = AnimationConfig {
            point_count: 3,
            ..Default::default()
        };
        let (mut animator, map) = animator_with_map(config);

        animator.start(PARIS, "Paris");
        advance_ms(1800 * 4 + 10).await;
        let points = animator.points().unwrap();
        animator.stop();

        assert_eq!(
            map.fly_targets(),
            vec![points[0], points[1], points[2], points[0], points[1]]
        );

        let expected: Vec<String> = phase_messages("Paris")
            .iter()
            .take(5)
            .map(|message| popup_html(message))
            .collect();
        assert_eq!(map.popup_messages(), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_clears_marker_and_timer() {
        let (mut animator, map) = animator_with_map(AnimationConfig::default());

        animator.start(PARIS, "Paris");
        advance_ms(10).await;
        assert!(animator.stop());

        assert_eq!(map.marker(), None);
        assert_eq!(map.popup(), None);
        assert!(!animator.is_running());

        let commands_at_stop = map.commands().len();
        advance_ms(1800 * 3).await;
        assert_eq!(map.commands().len(), commands_at_stop);
        assert_eq!(animator.live_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let (mut animator, map) = animator_with_map(AnimationConfig::default());

        // 从未启动
        assert!(!animator.stop());
        assert!(!animator.stop());
        assert!(map.commands().is_empty());

        animator.start(PARIS, "Paris");
        assert!(animator.stop());
        assert!(!animator.stop());
        advance_ms(10).await;
        assert_eq!(animator.live_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_cancels_previous_timer() {
        let (mut animator, map) = animator_with_map(AnimationConfig::default());
        let tokyo = Coordinate::new(139.6917, 35.6895);

        animator.start(PARIS, "Paris");
        advance_ms(10).await;
        animator.start(tokyo, "Tokyo");
        advance_ms(1800 * 2 + 10).await;

        assert_eq!(animator.live_timers(), 1);
        let tokyo_points = animator.points().unwrap();
        let fly_targets = map.fly_targets();
        // 第一个点属于巴黎，其余全部属于东京
        assert_eq!(&fly_targets[1..], &tokyo_points[..3]);
        assert!(
            fly_targets[1..]
                .iter()
                .all(|p| p.distance_degrees(&tokyo) <= 0.02 + 1e-9)
        );

        animator.stop();
        advance_ms(10).await;
        assert_eq!(animator.live_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_animation() {
        let (mut animator, map) = animator_with_map(AnimationConfig::default());
        animator.start(PARIS, "Paris");
        advance_ms(10).await;

        drop(animator);
        assert_eq!(map.marker(), None);

        let commands = map.commands().len();
        advance_ms(1800 * 2).await;
        assert_eq!(map.commands().len(), commands);
    }

    #[test]
    fn test_phase_messages_mention_city_first() {
        let messages = phase_messages("London");
        assert_eq!(messages.len(), 8);
        assert!(messages[0].contains("London"));
        assert!(messages[7].contains("Almost ready"));
        assert!(popup_html(&messages[1]).contains("GeoTaste Agent"));
    }
}
