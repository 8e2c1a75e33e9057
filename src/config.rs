use std::collections::HashMap;
use std::time::Duration;

use crate::rooms::RoomType;

/// Backoff schedule for backend calls. Network-class failures are retried,
/// application-level failures are not.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(250),
            backoff_multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Delay to sleep before the given 1-based attempt. The first attempt
    /// fires immediately.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        self.initial_delay * self.backoff_multiplier.saturating_pow(attempt - 2)
    }
}

#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub retry: RetryPolicy,
    /// How long a connectivity drop may last before the session is declared
    /// dead and the user is sent back to the entry point.
    pub grace_period: Duration,
    /// Upper bound on the "leave room, reach the lobby" bridge so a stuck
    /// relay never hangs the UI.
    pub lobby_wait: Duration,
    pub reconnect: ReconnectPolicy,
    pub scene_map: HashMap<RoomType, String>,
    pub default_scene: String,
}

impl Default for Config {
    fn default() -> Self {
        let scene_map = HashMap::from([
            (RoomType::Casual, "GameScene_Casual".to_owned()),
            (RoomType::Work, "GameScene_Work".to_owned()),
            (RoomType::Classroom, "GameScene_Classroom".to_owned()),
        ]);
        Self {
            base_url: "http://localhost:8080".to_owned(),
            retry: RetryPolicy::default(),
            grace_period: Duration::from_secs(10),
            lobby_wait: Duration::from_secs(15),
            reconnect: ReconnectPolicy::default(),
            scene_map,
            default_scene: "GameScene_Default".to_owned(),
        }
    }
}

impl Config {
    pub fn from_env() -> Config {
        let mut config = Config::default();
        if let Ok(url) = dotenv::var("ROOMBRIDGE_BACKEND_URL") {
            config.base_url = url;
        }
        if let Some(secs) = env_secs("ROOMBRIDGE_GRACE_SECS") {
            config.grace_period = secs;
        }
        if let Some(secs) = env_secs("ROOMBRIDGE_LOBBY_WAIT_SECS") {
            config.lobby_wait = secs;
        }
        if let Ok(raw) = dotenv::var("ROOMBRIDGE_RETRY_ATTEMPTS") {
            if let Ok(attempts) = raw.parse() {
                config.retry.max_attempts = attempts;
            }
        }
        config
    }

    pub fn scene_for(&self, room_type: RoomType) -> &str {
        self.scene_map
            .get(&room_type)
            .map(String::as_str)
            .unwrap_or(&self.default_scene)
    }
}

fn env_secs(key: &str) -> Option<Duration> {
    dotenv::var(key).ok()?.parse::<u64>().ok().map(Duration::from_secs)
}
