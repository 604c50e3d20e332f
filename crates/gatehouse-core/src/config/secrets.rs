//! Redis and encryption-key configuration.

use serde::{Deserialize, Serialize};

/// Redis holding the persisted container-id -> IP mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Environment variable holding the Redis URL. Highest precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_env: Option<String>,

    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Prefix prepended to the container id to form the key.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url_env: None,
            url: default_redis_url(),
            key_prefix: default_key_prefix(),
        }
    }
}

impl RedisConfig {
    pub fn resolved_url(&self) -> String {
        if let Some(env_var) = &self.url_env
            && let Ok(url) = std::env::var(env_var)
        {
            return url;
        }
        self.url.clone()
    }
}

/// Symmetric key used to decrypt stored tenant credentials.
///
/// The key is base64 of 32 raw bytes (AES-256).
#[derive(Clone, Serialize, Deserialize)]
pub struct SecretsConfig {
    /// Environment variable holding the key. Highest precedence.
    #[serde(default = "default_key_env")]
    pub encryption_key_env: Option<String>,

    #[serde(default, skip_serializing)]
    pub encryption_key: Option<String>,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            encryption_key_env: default_key_env(),
            encryption_key: None,
        }
    }
}

impl std::fmt::Debug for SecretsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretsConfig")
            .field("encryption_key_env", &self.encryption_key_env)
            .field("encryption_key", &self.encryption_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl SecretsConfig {
    /// Resolve the base64 key, env var first.
    pub fn resolved_key(&self) -> Option<String> {
        if let Some(env_var) = &self.encryption_key_env
            && let Ok(key) = std::env::var(env_var)
            && !key.is_empty()
        {
            return Some(key);
        }
        self.encryption_key.clone()
    }
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_key_prefix() -> String {
    "container_ip:".to_string()
}

fn default_key_env() -> Option<String> {
    Some("GATEHOUSE_ENCRYPTION_KEY".to_string())
}
