pub mod alerts;
pub mod analytics;
pub mod events;
pub mod health;
pub mod subscriptions;

pub use alerts::*;
pub use analytics::*;
pub use events::*;
pub use health::*;
pub use subscriptions::*;
