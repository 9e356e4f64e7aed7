pub mod activity;
pub mod settings;

pub use activity::ActivitySummary;
pub use settings::{HrZonesBpm, UserSettings};
