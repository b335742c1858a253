pub(crate) const DEFAULT_USER_AGENT: &str = concat!("proxyprobe/", env!("CARGO_PKG_VERSION"));

pub(crate) const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub(crate) const DEFAULT_WS_URL: &str = "ws://localhost:8080/ws/connect";
/// Target used by the all-methods batch when no URL is given.
pub(crate) const DEFAULT_BATCH_PATH: &str = "/api/test";
pub(crate) const DEFAULT_CHANNEL: &str = "connect";
