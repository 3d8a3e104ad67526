#[cfg(test)]
mod tests {
    use crate::config::{AnimationConfig, BackendConfig, Config, GeocodingConfig};
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.backend.base_url, "http://localhost:5000");
        assert_eq!(config.geocoding.default_country_code, "US");
        assert_eq!(config.animation.point_count, 8);
        assert!(!config.verbose);
    }

    #[test]
    fn test_backend_config_default() {
        let config = BackendConfig::default();

        assert_eq!(config.visualization_limit, 20);
        assert_eq!(config.narrative_limit, 30);
        assert_eq!(config.request_timeout_seconds, 30);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_geocoding_config_default() {
        let config = GeocodingConfig::default();

        // access_token may be empty if env var is not set
        assert!(config.base_url.contains("mapbox.places"));
        assert_eq!(config.result_limit, 1);
    }

    #[test]
    fn test_animation_config_default() {
        let config = AnimationConfig::default();

        assert_eq!(config.radius_degrees, 0.02);
        assert_eq!(config.tick_interval(), Duration::from_millis(1800));
        assert_eq!(config.fly_duration(), Duration::from_millis(1200));
        assert_eq!(config.zoom_min, 13.0);
        assert_eq!(config.zoom_max, 15.0);
        assert_eq!(config.city_zoom, 12.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_animation_config_validation() {
        let zero_points = AnimationConfig {
            point_count: 0,
            ..Default::default()
        };
        assert!(zero_points.validate().is_err());

        let negative_radius = AnimationConfig {
            radius_degrees: -0.1,
            ..Default::default()
        };
        assert!(negative_radius.validate().is_err());

        let zero_tick = AnimationConfig {
            tick_interval_ms: 0,
            ..Default::default()
        };
        assert!(zero_tick.validate().is_err());

        let inverted_zoom = AnimationConfig {
            zoom_min: 16.0,
            zoom_max: 12.0,
            ..Default::default()
        };
        assert!(inverted_zoom.validate().is_err());

        let nan_zoom = AnimationConfig {
            zoom_min: f64::NAN,
            ..Default::default()
        };
        assert!(nan_zoom.validate().is_err());

        let infinite_zoom = AnimationConfig {
            zoom_max: f64::INFINITY,
            ..Default::default()
        };
        assert!(infinite_zoom.validate().is_err());

        let infinite_city_zoom = AnimationConfig {
            city_zoom: f64::NEG_INFINITY,
            ..Default::default()
        };
        assert!(infinite_city_zoom.validate().is_err());
    }

    #[test]
    fn test_config_from_file_rejects_non_finite_zoom() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("geotaste.toml");
        fs::write(&config_path, "[animation]\nzoom_min = nan\nzoom_max = 15.0\n").unwrap();

        assert!(Config::from_file(&config_path).is_err());
    }

    #[test]
    fn test_config_from_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("geotaste.toml");
        fs::write(
            &config_path,
            r#"
verbose = true

[backend]
base_url = "http://analysis.internal:8080"
request_timeout_seconds = 12

[animation]
tick_interval_ms = 2500
"#,
        )
        .unwrap();

        let config = Config::from_file(&config_path).unwrap();

        assert!(config.verbose);
        assert_eq!(config.backend.base_url, "http://analysis.internal:8080");
        assert_eq!(config.backend.request_timeout_seconds, 12);
        // unspecified keys fall back to defaults
        assert_eq!(config.backend.visualization_limit, 20);
        assert_eq!(config.animation.tick_interval_ms, 2500);
        assert_eq!(config.animation.point_count, 8);
        assert_eq!(config.geocoding.default_country_code, "US");
    }

    #[test]
    fn test_config_from_file_rejects_invalid_animation() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("geotaste.toml");
        fs::write(&config_path, "[animation]\npoint_count = 0\n").unwrap();

        assert!(Config::from_file(&config_path).is_err());
    }

    #[test]
    fn test_config_from_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = Config::from_file(&temp_dir.path().join("missing.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_from_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("geotaste.toml");
        fs::write(&config_path, "[backend\nbase_url = ").unwrap();

        assert!(Config::from_file(&config_path).is_err());
    }

    #[test]
    fn test_config_roundtrips_through_toml() {
        let mut config = Config::default();
        config.geocoding.default_country_code = "GB".to_string();
        config.animation.point_count = 12;

        let serialized = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(parsed.geocoding.default_country_code, "GB");
        assert_eq!(parsed.animation, config.animation);
    }
}
