/// URL for accessing the PostgreSQL database (should contain a database name in the path)
pub const DB_URL: &str = "DATABASE_URL";
/// Maximum number of pooled database connections
pub const DB_MAX_CONNECTIONS: &str = "DB_MAX_CONNECTIONS";
/// Address the HTTP server binds to, such as 0.0.0.0:8080
pub const BIND_ADDRESS: &str = "BIND_ADDRESS";
/// Log level configuration for the application. Uses [EnvFilter](tracing_subscriber::EnvFilter) directive syntax
pub const LOG_LEVEL: &str = "LOG_LEVEL";

/// Secret used to sign session tokens. Must be at least 32 bytes long.
pub const JWT_SECRET: &str = "JWT_SECRET";
/// How long a session token stays valid, in seconds
pub const SESSION_TTL_SECS: &str = "SESSION_TTL_SECS";
/// Set to "true" to mark the session cookie as Secure (HTTPS only)
pub const SECURE_COOKIES: &str = "SECURE_COOKIES";

/// OpenTelemetry span export URL. Should be http://localhost:4317 by default, as the service should
/// have an OpenTelemetry collector sidecar which directs metrics to the correct place
pub const OTEL_SPAN_EXPORT_URL: &str = "OTEL_SPAN_EXPORT_URL";
/// OpenTelemetry metrics export URL. Should be http://localhost:4317 by default, as the service should
/// have an OpenTelemetry collector sidecar which directs metrics to the correct place
pub const OTEL_METRIC_EXPORT_URL: &str = "OTEL_METRIC_EXPORT_URL";

pub mod test {
    /// URL for accessing the PostgreSQL database during integration tests (should not contain a database name in the path)
    pub const TEST_DB_URL: &str = "TEST_DB_URL";
}
