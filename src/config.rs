use std::env;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const DATABASE_URL: &str = "NOTES_DATABASE_URL";
    pub const UNTITLED_TITLE: &str = "NOTES_UNTITLED_TITLE";
}

/// Default values
pub mod defaults {
    pub const DATABASE_URL: &str = "./.db/notes.db";
    pub const UNTITLED_TITLE: &str = "Untitled";
}

/// Store configuration
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Path to the SQLite database file (default: ./.db/notes.db)
    pub database_url: String,
    /// Title applied when an insert omits one. The embedding application
    /// supplies the localized string; this is only the fallback.
    pub untitled_title: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: defaults::DATABASE_URL.to_string(),
            untitled_title: defaults::UNTITLED_TITLE.to_string(),
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var(env_vars::DATABASE_URL)
                .unwrap_or_else(|_| defaults::DATABASE_URL.to_string()),
            untitled_title: env::var(env_vars::UNTITLED_TITLE)
                .unwrap_or_else(|_| defaults::UNTITLED_TITLE.to_string()),
        }
    }
}
