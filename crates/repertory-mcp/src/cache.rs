/// Redis cache for suggestion results, with graceful degradation.
///
/// Every operation returns `Option<T>` or `bool`. On any Redis error the operation logs
/// a warning and the caller computes from the repertory instead. The server is fully
/// functional without Redis.
///
/// Key schema:
/// - `rse:v1:{fingerprint}:suggest:{sha256(request)}`: JSON Vec<Suggestion> (TTL 3600s)
///
/// `fingerprint` is a SHA-256 over the reference files, so results computed against an
/// older repertory are never served after the data changes.
use redis::AsyncCommands;
use sha2::{Digest, Sha256};
use tracing::warn;

use remedy_engine::{DataFiles, PatientProfile, Suggestion, Symptom};

const KEY_PREFIX: &str = "rse:v1:";
const SUGGEST_TTL_SECS: u64 = 3600;

pub struct SuggestionCache {
    client: Option<redis::Client>,
    fingerprint: String,
}

impl SuggestionCache {
    /// If the URL is `None` or invalid, returns a cache that always misses.
    pub fn new(url: Option<&str>, fingerprint: String) -> Self {
        let client = url.and_then(|u| {
            redis::Client::open(u)
                .inspect_err(|e| warn!(error = %e, url = u, "failed to create redis client, cache disabled"))
                .ok()
        });
        Self {
            client,
            fingerprint,
        }
    }

    #[cfg(test)]
    pub fn disabled() -> Self {
        Self::new(None, String::new())
    }

    /// Send a PING. Returns `true` if Redis is reachable.
    pub async fn is_available(&self) -> bool {
        let Some(client) = &self.client else {
            return false;
        };
        match client.get_multiplexed_async_connection().await {
            Ok(mut conn) => {
                let result: Result<String, _> = redis::cmd("PING").query_async(&mut conn).await;
                result.is_ok()
            }
            Err(_) => false,
        }
    }

    pub async fn get_suggestions(&self, key: &str) -> Option<Vec<Suggestion>> {
        let client = self.client.as_ref()?;
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .inspect_err(|e| warn!(error = %e, "redis connection failed"))
            .ok()?;
        let json: Option<String> = conn
            .get(key)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis GET failed"))
            .ok()?;
        serde_json::from_str(&json?)
            .inspect_err(|e| warn!(error = %e, key, "cache deserialization failed"))
            .ok()
    }

    pub async fn set_suggestions(&self, key: &str, suggestions: &[Suggestion]) -> bool {
        let Some(client) = &self.client else {
            return false;
        };
        let Ok(json) = serde_json::to_string(suggestions) else {
            return false;
        };
        let Ok(mut conn) = client
            .get_multiplexed_async_connection()
            .await
            .inspect_err(|e| warn!(error = %e, "redis connection failed"))
        else {
            return false;
        };
        conn.set_ex::<_, _, ()>(key, json, SUGGEST_TTL_SECS)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis SETEX failed"))
            .is_ok()
    }

    /// Deterministic key for one `suggest_remedies` request.
    pub fn suggestion_key(
        &self,
        symptoms: &[Symptom],
        profile: &PatientProfile,
        limit: usize,
    ) -> String {
        let mut hasher = Sha256::new();
        if let Ok(json) = serde_json::to_string(symptoms) {
            hasher.update(json.as_bytes());
        }
        hasher.update(b"|");
        if let Ok(json) = serde_json::to_string(profile) {
            hasher.update(json.as_bytes());
        }
        hasher.update(b"|");
        hasher.update(limit.to_string().as_bytes());
        let hash = hasher.finalize();
        format!("{KEY_PREFIX}{}:suggest:{:x}", self.fingerprint, hash)
    }
}

/// SHA-256 over the reference files' contents, truncated to 16 hex chars.
pub fn data_fingerprint(files: &DataFiles) -> std::io::Result<String> {
    let mut hasher = Sha256::new();
    let paths = [Some(&files.repertory), Some(&files.remedy_map), files.patterns.as_ref()];
    for path in paths.into_iter().flatten() {
        hasher.update(std::fs::read(path)?);
        hasher.update(b"|");
    }
    let hex = format!("{:x}", hasher.finalize());
    Ok(hex[..16].to_string())
}
