/// Redis-backed conversation-membership cache
///
/// Membership checks gate every messaging operation, so positive and
/// negative results are cached for a short TTL. Redis being down must never
/// fail a request: every cache error degrades to a miss and the caller falls
/// through to Postgres. Entries are invalidated whenever membership changes.
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use uuid::Uuid;

const MEMBERSHIP_TTL_SECS: u64 = 60;

#[derive(Clone)]
pub struct MembershipCache {
    manager: Option<ConnectionManager>,
}

impl MembershipCache {
    /// Connect to Redis; on failure the cache runs disabled (all misses)
    pub async fn connect(redis_url: &str) -> Self {
        let manager = match redis::Client::open(redis_url) {
            Ok(client) => match ConnectionManager::new(client).await {
                Ok(manager) => {
                    tracing::info!("Membership cache connected to Redis");
                    Some(manager)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Redis unavailable, membership cache disabled");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Invalid Redis URL, membership cache disabled");
                None
            }
        };

        Self { manager }
    }

    /// A cache that never hits; used in tests and when Redis is not configured
    pub fn disabled() -> Self {
        Self { manager: None }
    }

    fn key(conversation_id: Uuid, user_id: Uuid) -> String {
        format!("chat:member:{}:{}", conversation_id, user_id)
    }

    pub async fn get(&self, conversation_id: Uuid, user_id: Uuid) -> Option<bool> {
        let mut conn = self.manager.clone()?;
        match conn
            .get::<_, Option<String>>(Self::key(conversation_id, user_id))
            .await
        {
            Ok(Some(cached)) => Some(cached == "1"),
            Ok(None) => None,
            Err(e) => {
                tracing::debug!(error = %e, "membership cache read failed");
                None
            }
        }
    }

    pub async fn set(&self, conversation_id: Uuid, user_id: Uuid, is_member: bool) {
        let Some(mut conn) = self.manager.clone() else {
            return;
        };
        let value = if is_member { "1" } else { "0" };
        if let Err(e) = conn
            .set_ex::<_, _, ()>(Self::key(conversation_id, user_id), value, MEMBERSHIP_TTL_SECS)
            .await
        {
            tracing::debug!(error = %e, "membership cache write failed");
        }
    }

    /// Drop the cached entry after a membership mutation
    pub async fn invalidate(&self, conversation_id: Uuid, user_id: Uuid) {
        let Some(mut conn) = self.manager.clone() else {
            return;
        };
        if let Err(e) = conn.del::<_, ()>(Self::key(conversation_id, user_id)).await {
            tracing::debug!(error = %e, "membership cache invalidation failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_cache_always_misses() {
        let cache = MembershipCache::disabled();
        let conversation_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        assert_eq!(cache.get(conversation_id, user_id).await, None);
        // Writes and invalidations are no-ops, not errors
        cache.set(conversation_id, user_id, true).await;
        cache.invalidate(conversation_id, user_id).await;
        assert_eq!(cache.get(conversation_id, user_id).await, None);
    }

    #[test]
    fn test_key_is_scoped_per_pair() {
        let c = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_ne!(MembershipCache::key(c, a), MembershipCache::key(c, b));
    }
}
