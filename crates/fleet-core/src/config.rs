//! Engine configuration.

/// How many proof items a driver may attach per task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectMode {
    /// Exactly one proof; the first media event advances the session.
    Single,
    /// Any number of proofs; an explicit finish event advances the
    /// session.
    UntilFinish,
}

impl CollectMode {
    /// Parse a config string, defaulting to [`CollectMode::Single`]
    /// for unrecognized values.
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "multi" | "until_finish" => Self::UntilFinish,
            _ => Self::Single,
        }
    }
}

/// Default page size for the review queue and media feed.
const DEFAULT_PAGE_SIZE: i64 = 10;

/// Configuration for the workflow engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Proof collection discipline per deployment.
    pub collect_mode: CollectMode,

    /// Page size for the review queue and the recent-media feed.
    pub page_size: i64,

    /// Static allow-list of administrator chat identities.
    pub admin_ids: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            collect_mode: CollectMode::Single,
            page_size: DEFAULT_PAGE_SIZE,
            admin_ids: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Build a config from environment variables.
    ///
    /// * `FLEETCHECK_ADMIN_IDS` - comma-separated chat identities
    /// * `FLEETCHECK_COLLECT_MODE` - `single` (default) or `multi`
    /// * `FLEETCHECK_PAGE_SIZE` - review/media page size
    pub fn from_env() -> Self {
        let admin_ids = std::env::var("FLEETCHECK_ADMIN_IDS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let collect_mode = std::env::var("FLEETCHECK_COLLECT_MODE")
            .map(|v| CollectMode::from_str(&v))
            .unwrap_or(CollectMode::Single);

        let page_size = std::env::var("FLEETCHECK_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE);

        Self {
            collect_mode,
            page_size,
            admin_ids,
        }
    }

    /// Create a config with the given admin identities.
    pub fn with_admins<I, S>(admin_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            admin_ids: admin_ids.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Check an identity against the admin allow-list.
    pub fn is_admin(&self, identity: &str) -> bool {
        self.admin_ids.iter().any(|id| id == identity)
    }
}
