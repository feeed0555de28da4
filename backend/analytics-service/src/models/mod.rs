pub mod alert;
pub mod analytics;
pub mod trend;

pub use alert::{Alert, AlertSeverity, AlertType};
pub use analytics::{KindCounts, LiveAnalytics};
pub use trend::{TrendSnapshot, VelocityMetrics};
