use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::user::models::UserRecord;
use crate::domain::user::models::Username;
use crate::domain::user::ports::UserStore;
use crate::user::errors::UserError;

/// Process-local store. Contents are lost on restart.
///
/// Usernames are unique, like the `users_username_key` index of the
/// Postgres store.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn lookup(&self, username: &Username) -> Result<Option<UserRecord>, UserError> {
        Ok(self.users.read().await.get(username.as_str()).cloned())
    }

    async fn save(&self, record: UserRecord) -> Result<UserRecord, UserError> {
        let mut users = self.users.write().await;

        if users.contains_key(record.username.as_str()) {
            return Err(UserError::UsernameAlreadyExists(
                record.username.as_str().to_string(),
            ));
        }

        users.insert(record.username.as_str().to_string(), record.clone());
        Ok(record)
    }
}
