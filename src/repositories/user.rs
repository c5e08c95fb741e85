use std::collections::HashMap;
use std::collections::hash_map::Entry;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tokio::sync::RwLock;

use crate::{error::Result, models::user::User};

/// Persistence for user credentials, keyed by email.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Stores `user` unless a record with the same email exists.
    ///
    /// The check and the write are a single atomic step. Returns `false`
    /// when the email was already taken.
    async fn insert_if_absent(&self, user: &User) -> Result<bool>;

    /// Finds a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
}

/// Credentials held in process memory.
#[derive(Default)]
pub struct MemoryCredentialStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn insert_if_absent(&self, user: &User) -> Result<bool> {
        let mut users = self.users.write().await;
        match users.entry(user.email.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(user.clone());
                Ok(true)
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.get(email).cloned())
    }
}

/// Credentials stored as JSON under `user:{email}` in Redis.
#[derive(Clone)]
pub struct RedisCredentialStore {
    redis: ConnectionManager,
}

impl RedisCredentialStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

fn user_key(email: &str) -> String {
    format!("user:{}", email)
}

#[async_trait]
impl CredentialStore for RedisCredentialStore {
    async fn insert_if_absent(&self, user: &User) -> Result<bool> {
        let user_json = sonic_rs::to_string(user)?;

        // SET NX replies nil when the key already exists.
        let created: Option<String> = redis::cmd("SET")
            .arg(user_key(&user.email))
            .arg(&user_json)
            .arg("NX")
            .query_async(&mut self.redis.clone())
            .await?;

        Ok(created.is_some())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user_json: Option<String> = self.redis.clone().get(user_key(email)).await?;
        user_json
            .map(|json| sonic_rs::from_str::<User>(&json))
            .transpose()
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn second_insert_for_same_email_is_refused() {
        let store = MemoryCredentialStore::new();
        let first = User::new("a@x.com".to_string(), "d1".to_string());
        let second = User::new("a@x.com".to_string(), "d2".to_string());

        assert!(store.insert_if_absent(&first).await.unwrap());
        assert!(!store.insert_if_absent(&second).await.unwrap());

        let stored = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(stored.password_digest, "d1");
    }

    #[tokio::test]
    async fn concurrent_registrations_admit_exactly_one() {
        let store = Arc::new(MemoryCredentialStore::new());
        let mut tasks = Vec::new();
        for i in 0..16 {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                let user = User::new("race@x.com".to_string(), format!("digest-{}", i));
                store.insert_if_absent(&user).await.unwrap()
            }));
        }

        let mut created = 0;
        for task in tasks {
            if task.await.unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
    }

    #[tokio::test]
    async fn unknown_email_is_none() {
        let store = MemoryCredentialStore::new();
        assert!(store.find_by_email("nobody@x.com").await.unwrap().is_none());
    }
}
