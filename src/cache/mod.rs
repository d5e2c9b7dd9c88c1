pub mod dashboard_cache;

pub use dashboard_cache::DashboardCache;
