use scc::HashMap;

use crate::compress::CompactPlayer;

pub struct ServerState {
    pub players: Vec<CompactPlayer>,
    /// Unix timestamp of the snapshot these players came from
    pub updated_at: i64,
}

/// Latest compact player list per server.
/// Only the newest snapshot matters, so nothing here is persisted.
pub struct PlayerCache {
    servers: HashMap<String, ServerState>,
}

impl PlayerCache {
    pub fn new() -> Self {
        Self {
            servers: HashMap::new(),
        }
    }

    /// Replace the player list of a server, registering it on first sight.
    pub async fn replace(&self, server: &str, players: Vec<CompactPlayer>, now: i64) {
        let mut pending = Some(ServerState {
            players,
            updated_at: now,
        });

        let updated = self
            .servers
            .update_async(server, |_, state| {
                if let Some(fresh) = pending.take() {
                    *state = fresh;
                }
            })
            .await;

        if updated.is_none() {
            if let Some(fresh) = pending {
                // Lost a race with another first snapshot; either one is fine.
                let _ = self.servers.insert_async(server.to_string(), fresh).await;
            }
        }
    }

    /// Get a copy of the latest players and their snapshot time.
    pub async fn get(&self, server: &str) -> Option<(Vec<CompactPlayer>, i64)> {
        self.servers
            .read_async(server, |_, state| (state.players.clone(), state.updated_at))
            .await
    }
}

impl Default for PlayerCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> CompactPlayer {
        CompactPlayer {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_unknown_server() {
        let cache = PlayerCache::new();
        assert!(cache.get("main").await.is_none());
    }

    #[tokio::test]
    async fn test_replace_overwrites() {
        let cache = PlayerCache::new();

        cache.replace("main", vec![named("a"), named("b")], 100).await;
        let (players, updated_at) = cache.get("main").await.unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(updated_at, 100);

        cache.replace("main", vec![named("c")], 200).await;
        let (players, updated_at) = cache.get("main").await.unwrap();
        assert_eq!(players, vec![named("c")]);
        assert_eq!(updated_at, 200);
    }

    #[tokio::test]
    async fn test_servers_are_separate() {
        let cache = PlayerCache::new();

        cache.replace("one", vec![named("a")], 100).await;
        cache.replace("two", vec![], 100).await;

        assert_eq!(cache.get("one").await.unwrap().0.len(), 1);
        assert!(cache.get("two").await.unwrap().0.is_empty());
    }
}
