use std::time::Duration;

/// Upper bound for a whole token request, response body included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Upper bound for establishing the connection.
pub const DEFAULT_CONN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub struct HttpConfig {
    pub(crate) timeout: Duration,
    pub(crate) conn_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            conn_timeout: DEFAULT_CONN_TIMEOUT,
        }
    }
}

impl HttpConfig {
    /// Zero durations would disable the bound, so they fall back to the defaults.
    pub fn new(timeout: Duration, conn_timeout: Duration) -> Self {
        Self {
            timeout: non_zero_or(timeout, DEFAULT_TIMEOUT),
            conn_timeout: non_zero_or(conn_timeout, DEFAULT_CONN_TIMEOUT),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn conn_timeout(&self) -> Duration {
        self.conn_timeout
    }
}

fn non_zero_or(value: Duration, default: Duration) -> Duration {
    if value.is_zero() { default } else { value }
}
