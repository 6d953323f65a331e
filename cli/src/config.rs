use adapters::coupon::ClientConfig;
use executor::{COUNT_RANGE, clamp_count};
use tracing::warn;

pub const ENV_API_URL: &str = "COUPON_BENCH_API_URL";
pub const ENV_USERS: &str = "COUPON_BENCH_USERS";
pub const ENV_COUPON_LIMIT: &str = "COUPON_BENCH_COUPON_LIMIT";
pub const ENV_COUPON_ID: &str = "COUPON_BENCH_COUPON_ID";

pub const DEFAULT_USERS: usize = 1_000;
pub const DEFAULT_COUPON_LIMIT: u32 = 500;
pub const DEFAULT_COUPON_ID: &str = "WELCOME";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    /// Root of the coupon service.
    pub api_url: String,

    /// Users generated before each run. Always within `1..=10000`.
    pub users: usize,

    /// Quantity the coupon is created with, and the number of grants the
    /// report compares against. Always within `1..=10000`.
    pub coupon_limit: u32,

    /// Coupon every claim targets. Never blank.
    pub coupon_id: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: ClientConfig::DEFAULT_BASE_URL.to_string(),
            users: DEFAULT_USERS,
            coupon_limit: DEFAULT_COUPON_LIMIT,
            coupon_id: DEFAULT_COUPON_ID.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source; unset, empty or
    /// unparseable values keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(url) = lookup(ENV_API_URL) {
            cfg.set_api_url(url);
        }
        if let Some(n) = parse_number(&lookup, ENV_USERS) {
            cfg.set_users(n);
        }
        if let Some(n) = parse_number(&lookup, ENV_COUPON_LIMIT) {
            cfg.set_coupon_limit(n);
        }
        if let Some(id) = lookup(ENV_COUPON_ID) {
            cfg.set_coupon_id(id);
        }

        cfg
    }

    pub fn set_api_url(&mut self, url: impl Into<String>) {
        let url = url.into();
        if !url.trim().is_empty() {
            self.api_url = url.trim().to_string();
        }
    }

    pub fn set_users(&mut self, n: usize) {
        self.users = clamp_logged("users", n);
    }

    pub fn set_coupon_limit(&mut self, n: usize) {
        // clamped into 1..=10000, always fits
        self.coupon_limit = clamp_logged("coupon_limit", n) as u32;
    }

    /// Blank ids are ignored.
    pub fn set_coupon_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        let id = id.trim();
        if id.is_empty() {
            warn!("blank coupon id ignored; keeping {}", self.coupon_id);
        } else {
            self.coupon_id = id.to_string();
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.api_url.clone())
    }
}

fn parse_number<F>(lookup: &F, key: &str) -> Option<usize>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<usize>() {
        Ok(n) => Some(n),
        Err(e) => {
            warn!(key, value = raw, error = %e, "ignoring non-numeric setting");
            None
        }
    }
}

fn clamp_logged(field: &'static str, n: usize) -> usize {
    let clamped = clamp_count(n);
    if clamped != n {
        warn!(
            field,
            requested = n,
            clamped,
            min = *COUNT_RANGE.start(),
            max = *COUNT_RANGE.end(),
            "value out of range, clamped"
        );
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = AppConfig::from_lookup(lookup(&[]));

        assert_eq!(cfg.api_url, "http://localhost:3500");
        assert_eq!(cfg.users, 1000);
        assert_eq!(cfg.coupon_limit, 500);
        assert_eq!(cfg.coupon_id, "WELCOME");
    }

    #[test]
    fn env_values_override_defaults() {
        let cfg = AppConfig::from_lookup(lookup(&[
            (ENV_API_URL, "http://coupons.test:8080"),
            (ENV_USERS, "250"),
            (ENV_COUPON_LIMIT, "100"),
            (ENV_COUPON_ID, " SPRING "),
        ]));

        assert_eq!(cfg.api_url, "http://coupons.test:8080");
        assert_eq!(cfg.users, 250);
        assert_eq!(cfg.coupon_limit, 100);
        assert_eq!(cfg.coupon_id, "SPRING");
    }

    #[test]
    fn out_of_range_numbers_are_clamped() {
        let cfg = AppConfig::from_lookup(lookup(&[
            (ENV_USERS, "0"),
            (ENV_COUPON_LIMIT, "99999"),
        ]));

        assert_eq!(cfg.users, 1);
        assert_eq!(cfg.coupon_limit, 10_000);
    }

    #[test]
    fn garbage_and_blank_values_keep_defaults() {
        let cfg = AppConfig::from_lookup(lookup(&[
            (ENV_API_URL, "  "),
            (ENV_USERS, "lots"),
            (ENV_COUPON_LIMIT, ""),
            (ENV_COUPON_ID, ""),
        ]));

        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn client_config_uses_api_url() {
        let mut cfg = AppConfig::default();
        cfg.set_api_url("http://10.0.0.5:3500");

        assert_eq!(cfg.client_config().base_url, "http://10.0.0.5:3500");
    }
}
