use super::parse_bool_env;
use std::{env, str::FromStr};
use thiserror::Error;

/// Token bucket parameters for one route group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub per_second: u64,
    pub burst_size: u32,
}

impl RateLimitRule {
    const fn new(per_second: u64, burst_size: u32) -> Self {
        Self {
            per_second,
            burst_size,
        }
    }
}

impl FromStr for RateLimitRule {
    type Err = RateLimitParseError;

    /// `"per_second:burst"`, both strictly positive.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || RateLimitParseError::Rule(raw.trim().to_string());

        let (per_second, burst) = raw.trim().split_once(':').ok_or_else(invalid)?;
        let per_second: u64 = per_second.trim().parse().map_err(|_| invalid())?;
        let burst_size: u32 = burst.trim().parse().map_err(|_| invalid())?;
        if per_second == 0 || burst_size == 0 {
            return Err(invalid());
        }

        Ok(Self::new(per_second, burst_size))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGroup {
    Read,
    Write,
}

impl FromStr for RouteGroup {
    type Err = RateLimitParseError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "read" | "get" => Ok(Self::Read),
            "write" | "mutate" => Ok(Self::Write),
            other => Err(RateLimitParseError::Group(other.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RateLimitParseError {
    #[error("empty value")]
    Empty,
    #[error("invalid rule '{0}', expected per_second:burst with both > 0")]
    Rule(String),
    #[error("unknown group '{0}', expected read or write")]
    Group(String),
    #[error("invalid item '{0}', expected group=per_second:burst")]
    Item(String),
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub read: RateLimitRule,
    pub write: RateLimitRule,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            read: RateLimitRule::new(30, 60),
            write: RateLimitRule::new(10, 20),
        }
    }
}

impl RateLimitConfig {
    /// `RATE_LIMIT_ENABLED` toggles limiting; `RATE_LIMIT_CONFIG` is either
    /// one rule for both groups (`"10:20"`) or per-group rules
    /// (`"read=30:60,write=10:20"`). A malformed value keeps the defaults.
    pub fn from_env() -> Self {
        let defaults = Self {
            enabled: parse_bool_env("RATE_LIMIT_ENABLED", true),
            ..Self::default()
        };

        match env::var("RATE_LIMIT_CONFIG") {
            Ok(raw) => defaults.with_overrides(&raw).unwrap_or_else(|err| {
                tracing::warn!("Invalid RATE_LIMIT_CONFIG '{}': {}", raw, err);
                defaults
            }),
            Err(_) => defaults,
        }
    }

    pub fn rule_for(&self, group: RouteGroup) -> RateLimitRule {
        match group {
            RouteGroup::Read => self.read,
            RouteGroup::Write => self.write,
        }
    }

    fn with_overrides(mut self, raw: &str) -> Result<Self, RateLimitParseError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(RateLimitParseError::Empty);
        }

        if !raw.contains('=') {
            let rule: RateLimitRule = raw.parse()?;
            self.read = rule;
            self.write = rule;
            return Ok(self);
        }

        for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (group, rule) = item
                .split_once('=')
                .ok_or_else(|| RateLimitParseError::Item(item.to_string()))?;
            let rule: RateLimitRule = rule.parse()?;
            match group.parse()? {
                RouteGroup::Read => self.read = rule,
                RouteGroup::Write => self.write = rule,
            }
        }

        Ok(self)
    }
}
