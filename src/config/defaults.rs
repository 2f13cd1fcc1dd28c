pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: i64 = 3000;
pub const DEFAULT_RUST_LOG: &str = "info,tower_http=info";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://todo.db?mode=rwc";
pub const DEFAULT_DB_MAX_CONNECTIONS: i64 = 10;
pub const DEFAULT_DB_MIN_IDLE: i64 = 2;

pub const DEFAULT_HTTP_CONNECT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_HTTP_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_HTTP_SOCKET_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_HTTP_MAX_TOTAL_CONNECTIONS: usize = 50;
pub const DEFAULT_HTTP_KEEP_ALIVE_MS: u64 = 20 * 1000;
pub const DEFAULT_HTTP_IDLE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_HTTP_REAPER_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_HTTP_TRUST_SELF_SIGNED: bool = true;
