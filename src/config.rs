use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub route_path: PathBuf,
    pub sessions_path: PathBuf,
    pub local_entries_path: PathBuf,
    pub sheet_url: Option<String>,
    pub recent_sessions: usize,
    pub cache_ttl: Duration,
    pub static_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            route_path: PathBuf::from("data/route.json"),
            sessions_path: PathBuf::from("data/rows.sample.json"),
            local_entries_path: PathBuf::from("data/local_rows.json"),
            sheet_url: None,
            recent_sessions: 10,
            cache_ttl: Duration::from_secs(3600),
            static_dir: PathBuf::from("assets/web"),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        let sheet_url = std::env::var("GOOGLE_SHEET_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let recent_sessions = std::env::var("RECENT_SESSIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.recent_sessions);

        let cache_ttl = std::env::var("CACHE_TTL_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.cache_ttl);

        Self {
            port,
            route_path: path_var("ROUTE_PATH").unwrap_or(defaults.route_path),
            sessions_path: path_var("SESSIONS_PATH").unwrap_or(defaults.sessions_path),
            local_entries_path: path_var("LOCAL_ENTRIES_PATH").unwrap_or(defaults.local_entries_path),
            sheet_url,
            recent_sessions,
            cache_ttl,
            static_dir: path_var("STATIC_DIR").unwrap_or(defaults.static_dir),
        }
    }
}

fn path_var(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
}
