use std::{collections::HashMap, error::Error};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::types::{Email, HashedPassword, TopicStatus, User, UserID, WatchedVideo};

pub type DirectoryError = Box<dyn Error + Send + Sync>;

#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    async fn lookup_by_id(&self, user_id: &UserID) -> Result<Option<User>, DirectoryError>;

    async fn lookup_by_email(&self, email: &Email) -> Result<Option<User>, DirectoryError>;

    /// Store the given user, and return its id. If a user with the same email already exists,
    /// return the id of that user instead and leave it untouched.
    async fn create_user_if_not_exists(&self, user: User) -> Result<UserID, DirectoryError>;

    /// Move `topic_id` into the list matching `status`. Returns false if the user is unknown.
    async fn update_user_progress(
        &self,
        user_id: &UserID,
        topic_id: &str,
        status: TopicStatus,
        score: Option<i64>,
    ) -> Result<bool, DirectoryError>;

    async fn update_password(
        &self,
        user_id: &UserID,
        hashed_password: HashedPassword,
    ) -> Result<bool, DirectoryError>;

    /// Append to the user's watch history. Returns false if the user is unknown.
    async fn add_watched_video(
        &self,
        user_id: &UserID,
        video: WatchedVideo,
    ) -> Result<bool, DirectoryError>;
}

/// A process-local directory, good enough for tests and demos.
#[derive(Default)]
pub struct InMemoryDirectory {
    users: RwLock<HashMap<UserID, User>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: RwLock::new(users.into_iter().map(|u| (u.id.clone(), u)).collect()),
        }
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn lookup_by_id(&self, user_id: &UserID) -> Result<Option<User>, DirectoryError> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn lookup_by_email(&self, email: &Email) -> Result<Option<User>, DirectoryError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == *email)
            .cloned())
    }

    async fn create_user_if_not_exists(&self, mut user: User) -> Result<UserID, DirectoryError> {
        let mut users = self.users.write().await;

        if let Some(existing) = users.values().find(|u| u.email == user.email) {
            return Ok(existing.id.clone());
        }

        user.rank = users.len() as u32 + 1;
        let user_id = user.id.clone();
        users.insert(user_id.clone(), user);

        Ok(user_id)
    }

    async fn update_user_progress(
        &self,
        user_id: &UserID,
        topic_id: &str,
        status: TopicStatus,
        score: Option<i64>,
    ) -> Result<bool, DirectoryError> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(user_id) else {
            return Ok(false);
        };

        for list in [
            &mut user.completed_topics,
            &mut user.pending_topics,
            &mut user.in_progress_topics,
        ] {
            list.retain(|t| t != topic_id);
        }

        match status {
            TopicStatus::Completed => {
                user.completed_topics.push(topic_id.to_string());
                if let Some(score) = score {
                    user.total_score = user.total_score.saturating_add(score);
                }
            }
            TopicStatus::InProgress => user.in_progress_topics.push(topic_id.to_string()),
            TopicStatus::Pending => user.pending_topics.push(topic_id.to_string()),
        }

        Ok(true)
    }

    async fn update_password(
        &self,
        user_id: &UserID,
        hashed_password: HashedPassword,
    ) -> Result<bool, DirectoryError> {
        let mut users = self.users.write().await;
        match users.get_mut(user_id) {
            Some(user) => {
                user.hashed_password = hashed_password;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn add_watched_video(
        &self,
        user_id: &UserID,
        video: WatchedVideo,
    ) -> Result<bool, DirectoryError> {
        let mut users = self.users.write().await;
        match users.get_mut(user_id) {
            Some(user) => {
                user.videos_watched.push(video);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
