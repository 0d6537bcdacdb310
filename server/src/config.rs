use anyhow::{Context, Result, anyhow};
use platform_authn::HrCredential;
use url::Url;

const DEFAULT_RECORD_STORE_URL: &str = "http://localhost:3001";
const DEFAULT_SESSION_DATABASE_URL: &str = "sqlite://portal-sessions.db?mode=rwc";

/// Where employee records live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordStoreTarget {
    Http(String),
    /// In-process store, lost on exit.
    Memory,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub record_store: RecordStoreTarget,
    pub session_database_url: String,
    pub hr: HrCredential,
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let record_store = match var("RECORD_STORE_URL") {
            Some(raw) if raw.trim().eq_ignore_ascii_case("memory") => RecordStoreTarget::Memory,
            Some(raw) => {
                let raw = raw.trim().to_string();
                Url::parse(&raw).with_context(|| format!("invalid RECORD_STORE_URL {raw}"))?;
                RecordStoreTarget::Http(raw)
            }
            None => RecordStoreTarget::Http(DEFAULT_RECORD_STORE_URL.into()),
        };

        let session_database_url =
            var("SESSION_DATABASE_URL").unwrap_or_else(|| DEFAULT_SESSION_DATABASE_URL.into());

        let defaults = HrCredential::default();
        let hr = match (var("HR_USERNAME"), var("HR_PASSWORD")) {
            (None, None) => defaults,
            (Some(username), Some(password)) => HrCredential { username, password },
            (Some(_), None) => return Err(anyhow!("HR_USERNAME set without HR_PASSWORD")),
            (None, Some(_)) => return Err(anyhow!("HR_PASSWORD set without HR_USERNAME")),
        };

        let cors_allowed_origins = var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect::<Vec<_>>();

        Ok(Self {
            record_store,
            session_database_url,
            hr,
            cors_allowed_origins,
        })
    }
}
