use std::env;
use std::time::Duration;
use std::num::NonZeroU32;
use governor::Quota;

pub const DEFAULT_GAME_PORT: u16 = 25565;

#[derive(Clone, Debug)]
pub struct Config {
    // Listener
    pub bind_address: String,
    pub port: u16,

    // Target used when a request names no server
    pub default_server_address: String,
    pub default_server_port: u16,

    // Aggregator
    pub aggregator_url: String,
    pub status_timeout_ms: u64,

    // Latency probe
    pub probe_timeout_ms: u64,
    pub probe_protocol_version: i32,
    pub calibration_offset_ms: u64,

    // Avatar providers, tried in order. `{uuid}` is substituted.
    pub avatar_providers: Vec<String>,
    pub default_avatar_url: String,
    pub default_avatar_uuid: String,
    pub avatar_timeout_ms: u64,

    pub profile_lookup_url: String,

    // Admin page
    pub admin_password: String,
    pub session_ttl_secs: u64,
    pub secure_cookies: bool,
    pub login_period_secs: u64,
    pub login_burst_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            default_server_address: "gatisaba.xgames.jp".to_string(),
            default_server_port: DEFAULT_GAME_PORT,
            aggregator_url: "https://api.mcsrvstat.us/3".to_string(),
            status_timeout_ms: 10_000,
            probe_timeout_ms: 3_000,
            probe_protocol_version: 47,
            calibration_offset_ms: 63, // measured against ICMP ping, handshake adds the rest
            avatar_providers: default_avatar_providers(),
            default_avatar_url: "https://crafatar.com/avatars/{uuid}?size=64".to_string(),
            default_avatar_uuid: "8667ba71-b85a-4004-af54-457a9734eed7".to_string(),
            avatar_timeout_ms: 5_000,
            profile_lookup_url: "https://api.mojang.com/users/profiles/minecraft".to_string(),
            admin_password: "admin123".to_string(),
            session_ttl_secs: 3600,
            secure_cookies: false,
            login_period_secs: 10,
            login_burst_limit: 5,
        }
    }
}

fn default_avatar_providers() -> Vec<String> {
    vec![
        "https://crafatar.com/avatars/{uuid}?size=64&overlay=true".to_string(),
        "https://mc-heads.net/avatar/{uuid}/64".to_string(),
        "https://minotar.net/avatar/{uuid}/64.png".to_string(),
        "https://visage.surgeplay.com/face/64/{uuid}".to_string(),
    ]
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let avatar_providers = env::var("AVATAR_PROVIDERS")
            .ok()
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.avatar_providers);

        Self {
            bind_address: env_or("BIND_ADDRESS", defaults.bind_address),
            port: env_or("PORT", defaults.port),

            default_server_address: env_or("DEFAULT_SERVER_ADDRESS", defaults.default_server_address),
            default_server_port: env_or("DEFAULT_SERVER_PORT", defaults.default_server_port),

            aggregator_url: env_or("AGGREGATOR_URL", defaults.aggregator_url),
            status_timeout_ms: env_or("STATUS_TIMEOUT_MS", defaults.status_timeout_ms),

            probe_timeout_ms: env_or("PROBE_TIMEOUT_MS", defaults.probe_timeout_ms),
            probe_protocol_version: env_or("PROBE_PROTOCOL_VERSION", defaults.probe_protocol_version),
            calibration_offset_ms: env_or("CALIBRATION_OFFSET_MS", defaults.calibration_offset_ms),

            avatar_providers,
            default_avatar_url: env_or("DEFAULT_AVATAR_URL", defaults.default_avatar_url),
            default_avatar_uuid: env_or("DEFAULT_AVATAR_UUID", defaults.default_avatar_uuid),
            avatar_timeout_ms: env_or("AVATAR_TIMEOUT_MS", defaults.avatar_timeout_ms),

            profile_lookup_url: env_or("PROFILE_LOOKUP_URL", defaults.profile_lookup_url),

            admin_password: env_or("ADMIN_PASSWORD", defaults.admin_password),
            session_ttl_secs: env_or("SESSION_TTL_SECS", defaults.session_ttl_secs),
            secure_cookies: env::var("APP_ENV").map(|v| v == "production").unwrap_or(false),
            login_period_secs: env_or("LOGIN_PERIOD_SECS", defaults.login_period_secs),
            login_burst_limit: env_or("LOGIN_BURST_LIMIT", defaults.login_burst_limit),
        }
    }

    pub fn bind(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_millis(self.status_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn avatar_timeout(&self) -> Duration {
        Duration::from_millis(self.avatar_timeout_ms)
    }

    pub fn login_quota(&self) -> Quota {
        let burst = NonZeroU32::new(self.login_burst_limit).unwrap_or(NonZeroU32::MIN);
        Quota::with_period(Duration::from_secs(self.login_period_secs))
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
            .allow_burst(burst)
    }
}
