use std::env;
use std::path::PathBuf;

/// Local-only JWT secret used when `JWT_SECRET` is not set outside production.
pub const LOCAL_JWT_SECRET: &str = "course-portal-local-dev-secret";

/// Default location of the built client bundle, relative to the working directory.
pub const DEFAULT_STATIC_DIR: &str = "dist/public";

pub const DEFAULT_PORT: u16 = 5000;

/// AppConfig
///
/// Immutable runtime configuration, loaded once at startup and shared through
/// `AppState` via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Postgres connection string. `None` selects the in-memory repository (local only).
    pub db_url: Option<String>,
    // Runtime environment marker. Controls the dev bypass and log format.
    pub env: Env,
    // HS256 secret used to validate incoming Bearer tokens.
    pub jwt_secret: String,
    // Directory holding the built client bundle (must contain index.html).
    pub static_dir: PathBuf,
    pub port: u16,
}

/// Env
///
/// Runtime context: `Local` enables developer conveniences, `Production` hardens them away.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking configuration for test setup.
    fn default() -> Self {
        Self {
            db_url: None,
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            port: DEFAULT_PORT,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads configuration from the environment (call `dotenv` first).
    ///
    /// # Panics
    /// Panics in production if `DATABASE_URL` or `JWT_SECRET` is missing, and in any
    /// environment if `PORT` is set but not a valid port number.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let (db_url, jwt_secret) = match env {
            Env::Production => (
                Some(env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod")),
                env::var("JWT_SECRET").expect("FATAL: JWT_SECRET must be set in production."),
            ),
            Env::Local => (
                env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
                env::var("JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
            ),
        };

        let static_dir = env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATIC_DIR));

        let port = match env::var("PORT") {
            Ok(raw) => raw.parse().expect("FATAL: PORT must be a valid port number"),
            Err(_) => DEFAULT_PORT,
        };

        Self {
            db_url,
            env,
            jwt_secret,
            static_dir,
            port,
        }
    }
}
