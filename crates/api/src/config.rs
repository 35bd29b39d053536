use twitcanva_canvas::GenerationDefaults;
use twitcanva_core::node::{ANGLE_IMAGE_MODEL, DEFAULT_IMAGE_MODEL, DEFAULT_VIDEO_MODEL};

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Upper bound on post-shutdown cleanup, in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Models and output settings given to newly derived nodes.
    pub generation: GenerationDefaults,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                      |
    /// |------------------------|------------------------------|
    /// | `HOST`                 | `0.0.0.0`                    |
    /// | `PORT`                 | `3000`                       |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`      |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                         |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                         |
    /// | `DEFAULT_IMAGE_MODEL`  | `gemini-2.5-flash-image`     |
    /// | `DEFAULT_VIDEO_MODEL`  | `veo-3.1`                    |
    /// | `ANGLE_IMAGE_MODEL`    | `gemini-3-pro-image-preview` |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let mut generation = GenerationDefaults::default();
        generation.config.image_model = env_or("DEFAULT_IMAGE_MODEL", DEFAULT_IMAGE_MODEL);
        generation.config.model = env_or("DEFAULT_VIDEO_MODEL", DEFAULT_VIDEO_MODEL);
        generation.angle_image_model = env_or("ANGLE_IMAGE_MODEL", ANGLE_IMAGE_MODEL);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            generation,
        }
    }
}

/// Read a non-empty string variable, falling back to `default`.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
