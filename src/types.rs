use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[repr(transparent)]
pub struct UserID(pub String);

impl fmt::Display for UserID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[repr(transparent)]
pub struct Email(pub String);

/// An encoded argon2 hash. Deliberately not `Serialize`.
#[derive(Clone, PartialEq, Eq)]
#[repr(transparent)]
pub struct HashedPassword(pub String);

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashedPassword(..)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TopicStatus {
    Completed,
    InProgress,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchedVideo {
    pub id: String,
    pub title: String,
    pub language: String,
    pub youtube_id: String,
    pub thumbnail: String,
    pub duration: String,
    pub watched_at: String,
    pub time_watched: String,
}

/// A user as held by the directory, credential included.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserID,
    pub name: String,
    pub email: Email,
    pub hashed_password: HashedPassword,
    pub completed_topics: Vec<String>,
    pub pending_topics: Vec<String>,
    pub in_progress_topics: Vec<String>,
    pub videos_watched: Vec<WatchedVideo>,
    pub total_score: i64,
    pub rank: u32,
    pub preferred_style: String,
    pub confusion_count: u32,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl User {
    /// A fresh account with empty progress. Rank is assigned by the directory.
    pub fn new(id: UserID, name: String, email: Email, hashed_password: HashedPassword) -> Self {
        Self {
            id,
            name,
            email,
            hashed_password,
            completed_topics: Vec::new(),
            pending_topics: Vec::new(),
            in_progress_topics: Vec::new(),
            videos_watched: Vec::new(),
            total_score: 0,
            rank: 0,
            preferred_style: "visual".into(),
            confusion_count: 0,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile::from(self)
    }
}

/// The outward-facing view of a [`User`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserID,
    pub name: String,
    pub email: Email,
    pub completed_topics: Vec<String>,
    pub pending_topics: Vec<String>,
    pub in_progress_topics: Vec<String>,
    pub videos_watched: Vec<WatchedVideo>,
    pub total_score: i64,
    pub rank: u32,
    pub preferred_style: String,
    pub confusion_count: u32,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            completed_topics: user.completed_topics.clone(),
            pending_topics: user.pending_topics.clone(),
            in_progress_topics: user.in_progress_topics.clone(),
            videos_watched: user.videos_watched.clone(),
            total_score: user.total_score,
            rank: user.rank,
            preferred_style: user.preferred_style.clone(),
            confusion_count: user.confusion_count,
            created_at: user.created_at.clone(),
            updated_at: user.updated_at.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    pub exp: u64,
    #[serde(default)]
    pub iat: u64,
}
