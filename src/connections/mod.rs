//! Private-chat connections.
//!
//! A user may connect their private chat with the bot to a group and
//! manage that group's filters from there. Connections live in memory
//! only and are dropped on restart.

use std::sync::Arc;

use dashmap::DashMap;
use teloxide::types::{ChatId, UserId};
use tracing::debug;

use crate::permissions::Permissions;

/// Where a command issued in some chat should act.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    /// No connection applies; act on the chat the command came from.
    Current,
    /// Act on the connected group.
    Connected(ChatId),
    /// Connected, but the user is no longer an admin there.
    NotAdmin(ChatId),
}

/// User -> connected group (lock-free).
#[derive(Clone, Default)]
pub struct Connections {
    data: Arc<DashMap<u64, ChatId>>,
}

impl Connections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, user_id: UserId, chat_id: ChatId) {
        debug!("User {} connected to chat {}", user_id, chat_id);
        self.data.insert(user_id.0, chat_id);
    }

    /// Returns the chat the user was connected to, if any.
    pub fn disconnect(&self, user_id: UserId) -> Option<ChatId> {
        self.data.remove(&user_id.0).map(|(_, chat)| chat)
    }

    pub fn connected_chat(&self, user_id: UserId) -> Option<ChatId> {
        self.data.get(&user_id.0).map(|chat| *chat)
    }

    /// Point every connection to `old` at `new` after a chat migration.
    pub fn migrate(&self, old: ChatId, new: ChatId) {
        for mut entry in self.data.iter_mut() {
            if *entry == old {
                *entry = new;
            }
        }
    }

    /// Resolve the target chat of a command.
    ///
    /// Connections only apply in private chats. With `need_admin` the
    /// user's admin standing in the connected group is re-checked.
    pub async fn resolve(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        permissions: &Permissions,
        need_admin: bool,
    ) -> anyhow::Result<Resolved> {
        if !chat_id.is_user() {
            return Ok(Resolved::Current);
        }

        let Some(connected) = self.connected_chat(user_id) else {
            return Ok(Resolved::Current);
        };

        if need_admin && !permissions.is_admin(connected, user_id).await? {
            return Ok(Resolved::NotAdmin(connected));
        }

        Ok(Resolved::Connected(connected))
    }
}

#[cfg(test)]
mod tests {
    use teloxide::Bot;

    use super::*;
    use crate::cache::CacheRegistry;

    fn permissions(owner: u64) -> Permissions {
        Permissions::with_owners(Bot::new("0:test"), Arc::new(CacheRegistry::new()), vec![owner])
    }

    #[test]
    fn test_connect_and_disconnect() {
        let conns = Connections::new();
        conns.connect(UserId(1), ChatId(-100));

        assert_eq!(conns.connected_chat(UserId(1)), Some(ChatId(-100)));
        assert_eq!(conns.disconnect(UserId(1)), Some(ChatId(-100)));
        assert_eq!(conns.disconnect(UserId(1)), None);
    }

    #[test]
    fn test_migrate_repoints_connections() {
        let conns = Connections::new();
        conns.connect(UserId(1), ChatId(-100));
        conns.connect(UserId(2), ChatId(-200));

        conns.migrate(ChatId(-100), ChatId(-100100));

        assert_eq!(conns.connected_chat(UserId(1)), Some(ChatId(-100100)));
        assert_eq!(conns.connected_chat(UserId(2)), Some(ChatId(-200)));
    }

    #[tokio::test]
    async fn test_resolve() {
        let conns = Connections::new();
        let perms = permissions(9);

        // Groups never follow connections
        conns.connect(UserId(9), ChatId(-100));
        let got = conns.resolve(ChatId(-555), UserId(9), &perms, true).await.unwrap();
        assert_eq!(got, Resolved::Current);

        // Private chat with a connection, owner passes the admin check
        let got = conns.resolve(ChatId(9), UserId(9), &perms, true).await.unwrap();
        assert_eq!(got, Resolved::Connected(ChatId(-100)));

        // Private chat without one
        let got = conns.resolve(ChatId(3), UserId(3), &perms, false).await.unwrap();
        assert_eq!(got, Resolved::Current);
    }
}
