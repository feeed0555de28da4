use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub engine: EngineConfig,
    pub trend: TrendConfig,
    pub alerts: AlertConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_env")]
    pub env: String,

    #[serde(default = "default_app_host")]
    pub host: String,

    #[serde(default = "default_app_port")]
    pub port: u16,
}

/// Windowing and lifecycle knobs for the aggregation engine.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Width of a metric bucket in seconds
    #[serde(default = "default_bucket_width_seconds")]
    pub bucket_width_seconds: u64,

    /// How much bucket history is retained per content item
    #[serde(default = "default_retention_minutes")]
    pub retention_minutes: u64,

    /// Window for the "realtime" view counter, intentionally shorter than
    /// retention so live activity reflects very recent behavior
    #[serde(default = "default_realtime_window_minutes")]
    pub realtime_window_minutes: u64,

    /// Scheduler tick interval driving periodic evaluation
    #[serde(default = "default_tick_interval_seconds")]
    pub tick_interval_seconds: u64,

    /// Per-item evaluation budget; slower items are skipped until next tick
    #[serde(default = "default_evaluation_timeout_ms")]
    pub evaluation_timeout_ms: u64,

    /// Content with no events and no subscribers for this long is evicted
    #[serde(default = "default_idle_eviction_hours")]
    pub idle_eviction_hours: u64,

    /// A subscribed item counts as live while events arrived this recently
    #[serde(default = "default_freshness_minutes")]
    pub freshness_minutes: u64,

    /// Tolerated clock skew for event timestamps in the future
    #[serde(default = "default_clock_skew_seconds")]
    pub clock_skew_seconds: u64,
}

/// Tunable weights for the trend score.
///
/// The score is a bounded combination of normalized velocity and normalized
/// positive acceleration; the exact coefficients are deployment tuning, so
/// they live in configuration rather than code.
#[derive(Debug, Clone, Deserialize)]
pub struct TrendConfig {
    /// Width of the adjacent comparison windows, in minutes
    #[serde(default = "default_trend_window_minutes")]
    pub window_minutes: u64,

    /// Weight of the velocity component (velocity + acceleration weights
    /// should sum to 1.0)
    #[serde(default = "default_velocity_weight")]
    pub velocity_weight: f64,

    /// Weight of the positive-acceleration component
    #[serde(default = "default_acceleration_weight")]
    pub acceleration_weight: f64,

    /// Views/minute at which the velocity component reaches half saturation
    #[serde(default = "default_velocity_scale")]
    pub velocity_scale: f64,

    /// Relative acceleration at which that component reaches half saturation
    #[serde(default = "default_acceleration_scale")]
    pub acceleration_scale: f64,

    /// Display ceiling for the velocity score
    #[serde(default = "default_velocity_ceiling")]
    pub velocity_ceiling: f64,

    /// Horizon for the linear view projection, in minutes
    #[serde(default = "default_projection_horizon_minutes")]
    pub projection_horizon_minutes: u64,

    /// Cumulative views considered "trending" for the time-to-trend estimate
    #[serde(default = "default_trending_views_threshold")]
    pub trending_views_threshold: u64,

    /// Minimum trend score for inclusion in the trending list
    #[serde(default = "default_min_trending_score")]
    pub min_trending_score: f64,

    /// Non-empty buckets needed for full history confidence
    #[serde(default = "default_confidence_target_buckets")]
    pub confidence_target_buckets: u64,

    /// Upper bound on reported confidence
    #[serde(default = "default_confidence_cap")]
    pub confidence_cap: f64,
}

/// Alert rule thresholds and suppression behavior.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertConfig {
    /// Minimum time between repeat emissions of the same (content, type)
    #[serde(default = "default_suppression_minutes")]
    pub suppression_minutes: u64,

    /// How long a rule condition must stay false before a raised alert
    /// decays back to quiet
    #[serde(default = "default_clear_hysteresis_minutes")]
    pub clear_hysteresis_minutes: u64,

    /// Trend score at which viral_potential raises as info
    #[serde(default = "default_viral_trend_threshold")]
    pub viral_trend_threshold: f64,

    /// Trend score at which viral_potential escalates to warning
    #[serde(default = "default_viral_warning_threshold")]
    pub viral_warning_threshold: f64,

    /// Engagement-rate increase over the trailing baseline that counts as a
    /// spike
    #[serde(default = "default_spike_delta")]
    pub spike_delta: f64,

    /// Minimum views in the recent window before the spike rule applies
    #[serde(default = "default_spike_min_views")]
    pub spike_min_views: u64,

    /// performance_drop warns when recent velocity falls below this fraction
    /// of the trailing baseline
    #[serde(default = "default_drop_warning_fraction")]
    pub drop_warning_fraction: f64,

    /// performance_drop escalates to critical below this fraction
    #[serde(default = "default_drop_critical_fraction")]
    pub drop_critical_fraction: f64,

    /// Baseline views/minute below which the drop rule stays silent
    #[serde(default = "default_drop_min_baseline")]
    pub drop_min_baseline: f64,

    /// Cumulative-view boundaries that raise a one-time milestone alert
    #[serde(default = "default_milestones")]
    pub milestones: Vec<u64>,
}

// Default value functions
fn default_app_env() -> String {
    "development".to_string()
}

fn default_app_host() -> String {
    "0.0.0.0".to_string()
}

fn default_app_port() -> u16 {
    8086
}

fn default_bucket_width_seconds() -> u64 {
    60
}

fn default_retention_minutes() -> u64 {
    60
}

fn default_realtime_window_minutes() -> u64 {
    5
}

fn default_tick_interval_seconds() -> u64 {
    5
}

fn default_evaluation_timeout_ms() -> u64 {
    500
}

fn default_idle_eviction_hours() -> u64 {
    24
}

fn default_freshness_minutes() -> u64 {
    10
}

fn default_clock_skew_seconds() -> u64 {
    30
}

fn default_trend_window_minutes() -> u64 {
    5
}

fn default_velocity_weight() -> f64 {
    0.4
}

fn default_acceleration_weight() -> f64 {
    0.6
}

fn default_velocity_scale() -> f64 {
    50.0
}

fn default_acceleration_scale() -> f64 {
    2.0
}

fn default_velocity_ceiling() -> f64 {
    100_000.0
}

fn default_projection_horizon_minutes() -> u64 {
    60
}

fn default_trending_views_threshold() -> u64 {
    1_000
}

fn default_min_trending_score() -> f64 {
    50.0
}

fn default_confidence_target_buckets() -> u64 {
    10
}

fn default_confidence_cap() -> f64 {
    0.95
}

fn default_suppression_minutes() -> u64 {
    30
}

fn default_clear_hysteresis_minutes() -> u64 {
    5
}

fn default_viral_trend_threshold() -> f64 {
    70.0
}

fn default_viral_warning_threshold() -> f64 {
    85.0
}

fn default_spike_delta() -> f64 {
    0.05
}

fn default_spike_min_views() -> u64 {
    10
}

fn default_drop_warning_fraction() -> f64 {
    0.5
}

fn default_drop_critical_fraction() -> f64 {
    0.2
}

fn default_drop_min_baseline() -> f64 {
    1.0
}

fn default_milestones() -> Vec<u64> {
    vec![1_000, 10_000, 100_000, 1_000_000]
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let app = AppConfig {
            env: env::var("APP_ENV").unwrap_or_else(|_| default_app_env()),
            host: env::var("APP_HOST").unwrap_or_else(|_| default_app_host()),
            port: parse_env("APP_PORT", default_app_port()),
        };

        let engine = EngineConfig {
            bucket_width_seconds: parse_env(
                "BUCKET_WIDTH_SECONDS",
                default_bucket_width_seconds(),
            ),
            retention_minutes: parse_env("RETENTION_MINUTES", default_retention_minutes()),
            realtime_window_minutes: parse_env(
                "REALTIME_WINDOW_MINUTES",
                default_realtime_window_minutes(),
            ),
            tick_interval_seconds: parse_env(
                "TICK_INTERVAL_SECONDS",
                default_tick_interval_seconds(),
            ),
            evaluation_timeout_ms: parse_env(
                "EVALUATION_TIMEOUT_MS",
                default_evaluation_timeout_ms(),
            ),
            idle_eviction_hours: parse_env("IDLE_EVICTION_HOURS", default_idle_eviction_hours()),
            freshness_minutes: parse_env("FRESHNESS_MINUTES", default_freshness_minutes()),
            clock_skew_seconds: parse_env("CLOCK_SKEW_SECONDS", default_clock_skew_seconds()),
        };

        let trend = TrendConfig {
            window_minutes: parse_env("TREND_WINDOW_MINUTES", default_trend_window_minutes()),
            velocity_weight: parse_env("TREND_VELOCITY_WEIGHT", default_velocity_weight()),
            acceleration_weight: parse_env(
                "TREND_ACCELERATION_WEIGHT",
                default_acceleration_weight(),
            ),
            velocity_scale: parse_env("TREND_VELOCITY_SCALE", default_velocity_scale()),
            acceleration_scale: parse_env(
                "TREND_ACCELERATION_SCALE",
                default_acceleration_scale(),
            ),
            velocity_ceiling: parse_env("TREND_VELOCITY_CEILING", default_velocity_ceiling()),
            projection_horizon_minutes: parse_env(
                "TREND_PROJECTION_HORIZON_MINUTES",
                default_projection_horizon_minutes(),
            ),
            trending_views_threshold: parse_env(
                "TRENDING_VIEWS_THRESHOLD",
                default_trending_views_threshold(),
            ),
            min_trending_score: parse_env("MIN_TRENDING_SCORE", default_min_trending_score()),
            confidence_target_buckets: parse_env(
                "CONFIDENCE_TARGET_BUCKETS",
                default_confidence_target_buckets(),
            ),
            confidence_cap: parse_env("CONFIDENCE_CAP", default_confidence_cap()),
        };

        let alerts = AlertConfig {
            suppression_minutes: parse_env(
                "ALERT_SUPPRESSION_MINUTES",
                default_suppression_minutes(),
            ),
            clear_hysteresis_minutes: parse_env(
                "ALERT_CLEAR_HYSTERESIS_MINUTES",
                default_clear_hysteresis_minutes(),
            ),
            viral_trend_threshold: parse_env(
                "VIRAL_TREND_THRESHOLD",
                default_viral_trend_threshold(),
            ),
            viral_warning_threshold: parse_env(
                "VIRAL_WARNING_THRESHOLD",
                default_viral_warning_threshold(),
            ),
            spike_delta: parse_env("SPIKE_DELTA", default_spike_delta()),
            spike_min_views: parse_env("SPIKE_MIN_VIEWS", default_spike_min_views()),
            drop_warning_fraction: parse_env(
                "DROP_WARNING_FRACTION",
                default_drop_warning_fraction(),
            ),
            drop_critical_fraction: parse_env(
                "DROP_CRITICAL_FRACTION",
                default_drop_critical_fraction(),
            ),
            drop_min_baseline: parse_env("DROP_MIN_BASELINE", default_drop_min_baseline()),
            milestones: parse_milestones_env(),
        };

        Config {
            app,
            engine,
            trend,
            alerts,
        }
    }

    pub fn is_production(&self) -> bool {
        self.app.env == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            app: AppConfig {
                env: default_app_env(),
                host: default_app_host(),
                port: default_app_port(),
            },
            engine: EngineConfig::default(),
            trend: TrendConfig::default(),
            alerts: AlertConfig::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            bucket_width_seconds: default_bucket_width_seconds(),
            retention_minutes: default_retention_minutes(),
            realtime_window_minutes: default_realtime_window_minutes(),
            tick_interval_seconds: default_tick_interval_seconds(),
            evaluation_timeout_ms: default_evaluation_timeout_ms(),
            idle_eviction_hours: default_idle_eviction_hours(),
            freshness_minutes: default_freshness_minutes(),
            clock_skew_seconds: default_clock_skew_seconds(),
        }
    }
}

impl Default for TrendConfig {
    fn default() -> Self {
        TrendConfig {
            window_minutes: default_trend_window_minutes(),
            velocity_weight: default_velocity_weight(),
            acceleration_weight: default_acceleration_weight(),
            velocity_scale: default_velocity_scale(),
            acceleration_scale: default_acceleration_scale(),
            velocity_ceiling: default_velocity_ceiling(),
            projection_horizon_minutes: default_projection_horizon_minutes(),
            trending_views_threshold: default_trending_views_threshold(),
            min_trending_score: default_min_trending_score(),
            confidence_target_buckets: default_confidence_target_buckets(),
            confidence_cap: default_confidence_cap(),
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        AlertConfig {
            suppression_minutes: default_suppression_minutes(),
            clear_hysteresis_minutes: default_clear_hysteresis_minutes(),
            viral_trend_threshold: default_viral_trend_threshold(),
            viral_warning_threshold: default_viral_warning_threshold(),
            spike_delta: default_spike_delta(),
            spike_min_views: default_spike_min_views(),
            drop_warning_fraction: default_drop_warning_fraction(),
            drop_critical_fraction: default_drop_critical_fraction(),
            drop_min_baseline: default_drop_min_baseline(),
            milestones: default_milestones(),
        }
    }
}

impl TrendConfig {
    /// Validate weighting parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.velocity_weight < 0.0 || self.acceleration_weight < 0.0 {
            return Err("Trend weights must be non-negative".to_string());
        }

        let total = self.velocity_weight + self.acceleration_weight;
        if !(0.99..=1.01).contains(&total) {
            return Err(format!(
                "Trend weights must sum to 1.0, got {:.3}",
                total
            ));
        }

        if self.velocity_scale <= 0.0 || self.acceleration_scale <= 0.0 {
            return Err("Saturation scales must be positive".to_string());
        }

        if !(0.0..=1.0).contains(&self.confidence_cap) {
            return Err(format!(
                "Confidence cap must be in [0, 1], got {}",
                self.confidence_cap
            ));
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

fn parse_milestones_env() -> Vec<u64> {
    let Ok(raw) = env::var("MILESTONES") else {
        return default_milestones();
    };

    let mut boundaries: Vec<u64> = raw
        .split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect();
    boundaries.sort_unstable();
    boundaries.dedup();

    if boundaries.is_empty() {
        default_milestones()
    } else {
        boundaries
    }
}
