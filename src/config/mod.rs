// src/config/mod.rs
pub mod handle;
pub mod monitor;

pub use handle::{start_hot_reload_thread, ConfigHandle};
pub use monitor::{
    load_config_default, load_config_from, normalize_author, normalize_community, MonitorConfig,
};

pub const ENV_INTERVAL_MINUTES: &str = "MONITOR_INTERVAL_MINUTES";
pub const DEFAULT_INTERVAL_MINUTES: u32 = 15;

/// Cycle interval from $MONITOR_INTERVAL_MINUTES; invalid or zero values fall back to 15.
pub fn interval_minutes_from_env() -> u32 {
    parse_interval(std::env::var(ENV_INTERVAL_MINUTES).ok())
}

fn parse_interval(raw: Option<String>) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|m| *m > 0)
        .unwrap_or(DEFAULT_INTERVAL_MINUTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_parsing_falls_back() {
        assert_eq!(parse_interval(None), 15);
        assert_eq!(parse_interval(Some(" 5 ".into())), 5);
        assert_eq!(parse_interval(Some("0".into())), 15);
        assert_eq!(parse_interval(Some("soon".into())), 15);
    }
}
