use std::time::Duration;

/// Dispatch tuning for the coordinator's execute loop.
#[derive(Debug, Clone, Copy)]
pub struct DispatchConfig {
    pub timeout: Duration,
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl DispatchConfig {
    /// `max_attempts` is floored at 1; every dispatch gets at least one attempt.
    pub fn new(timeout: Duration, max_attempts: u32, backoff: Duration) -> Self {
        Self {
            timeout,
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            max_attempts: 2,
            backoff: Duration::from_millis(200),
        }
    }
}

/// Node health thresholds and sweep cadence.
///
/// `offline_after` must be greater than `suspect_after`; the classification
/// is undefined otherwise.
#[derive(Debug, Clone, Copy)]
pub struct HealthConfig {
    pub suspect_after: Duration,
    pub offline_after: Duration,
    pub sweep_interval: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            suspect_after: Duration::from_secs(15),
            offline_after: Duration::from_secs(30),
            sweep_interval: Duration::from_secs(5),
        }
    }
}

/// Parse a duration string: `200ms`, `5s`, `2m`, or a bare number of seconds.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if let Some(stripped) = s.strip_suffix("ms") {
        let ms: u64 = stripped
            .trim()
            .parse()
            .map_err(|_| format!("invalid duration: {s}"))?;
        Ok(Duration::from_millis(ms))
    } else if let Some(stripped) = s.strip_suffix('s') {
        let secs: u64 = stripped
            .trim()
            .parse()
            .map_err(|_| format!("invalid duration: {s}"))?;
        Ok(Duration::from_secs(secs))
    } else if let Some(stripped) = s.strip_suffix('m') {
        let mins: u64 = stripped
            .trim()
            .parse()
            .map_err(|_| format!("invalid duration: {s}"))?;
        Ok(Duration::from_secs(mins * 60))
    } else {
        let secs: u64 = s.parse().map_err(|_| format!("invalid duration: {s}"))?;
        Ok(Duration::from_secs(secs))
    }
}

/// Listen addresses may be given as a bare `:port`; bind all interfaces then.
pub fn listen_addr(addr: &str) -> String {
    match addr.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => addr.to_string(),
    }
}

/// Default node identity: the machine hostname, then a fixed fallback.
pub fn default_node_id() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "agent-1".to_string())
}
