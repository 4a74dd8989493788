/*!
 * Admin Module
 * Dashboard state and the mutations it mediates
 */
pub mod dashboard;

pub use dashboard::{Banner, BannerKind, Dashboard, DashboardConfig, DashboardSnapshot};
