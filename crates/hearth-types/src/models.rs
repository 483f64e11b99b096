use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity handed to the engine by the auth layer. Already verified;
/// the engine only uses it for ownership checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub username: String,
}

impl Actor {
    pub fn new(id: Uuid, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

// -- Content --

/// Entity collections that carry like/dislike sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactableKind {
    Story,
    Comment,
    Reply,
}

impl ReactableKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Story => "story",
            Self::Comment => "comment",
            Self::Reply => "reply",
        }
    }
}

impl fmt::Display for ReactableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactableKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "story" | "stories" => Ok(Self::Story),
            "comment" | "comments" => Ok(Self::Comment),
            "reply" | "replies" => Ok(Self::Reply),
            other => Err(format!("unknown reactable kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    Like,
    Dislike,
}

impl Reaction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Dislike => "dislike",
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Like => Self::Dislike,
            Self::Dislike => Self::Like,
        }
    }
}

impl FromStr for Reaction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Self::Like),
            "dislike" => Ok(Self::Dislike),
            other => Err(format!("unknown reaction: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: Uuid,
    pub author_username: String,
    pub title: String,
    pub content: String,
    pub preview: String,
    pub like_count: u32,
    pub dislike_count: u32,
    pub score: i64,
    /// Set once the author has edited the story.
    pub edited: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub story_id: Uuid,
    pub author_username: String,
    pub content: String,
    pub like_count: u32,
    pub dislike_count: u32,
    pub edited: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: Uuid,
    pub comment_id: Uuid,
    pub author_username: String,
    pub content: String,
    pub like_count: u32,
    pub dislike_count: u32,
    pub edited: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reaction state of a story, comment or reply. `likes` and `dislikes`
/// are disjoint and listed in the order the reactions were made.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reactable {
    pub id: Uuid,
    pub kind: ReactableKind,
    pub author_username: String,
    pub likes: Vec<String>,
    pub dislikes: Vec<String>,
    pub like_count: u32,
    pub dislike_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionTally {
    pub like_count: u32,
    pub dislike_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedStory {
    pub id: Uuid,
    pub username: String,
    pub story: Story,
    pub created_at: DateTime<Utc>,
}

// -- Reports --

/// What a flag points at. User-level reports are keyed by username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target", rename_all = "lowercase")]
pub enum FlagTarget {
    Story(Uuid),
    Comment(Uuid),
    Reply(Uuid),
    User(String),
}

impl FlagTarget {
    pub fn kind_str(&self) -> &'static str {
        match self {
            Self::Story(_) => "story",
            Self::Comment(_) => "comment",
            Self::Reply(_) => "reply",
            Self::User(_) => "user",
        }
    }

    /// Value stored in the flag's target column.
    pub fn key(&self) -> String {
        match self {
            Self::Story(id) | Self::Comment(id) | Self::Reply(id) => id.to_string(),
            Self::User(username) => username.clone(),
        }
    }

    pub fn from_parts(kind: &str, key: &str) -> Option<Self> {
        match kind {
            "user" => Some(Self::User(key.to_string())),
            _ => {
                let id = key.parse().ok()?;
                match kind {
                    "story" => Some(Self::Story(id)),
                    "comment" => Some(Self::Comment(id)),
                    "reply" => Some(Self::Reply(id)),
                    _ => None,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flag {
    pub id: Uuid,
    pub flagger_id: Uuid,
    pub target: FlagTarget,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

// -- Social graph --

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEdges {
    pub username: String,
    pub followers: Vec<String>,
    pub following: Vec<String>,
    pub follower_count: u32,
    pub flag_count: u32,
    pub block_list: Vec<String>,
    pub block_by_list: Vec<String>,
}

// -- Messaging --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub content: String,
    pub from: String,
    pub to: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// One participant's copy of a two-party conversation. `owner` is the
/// participant holding this copy, `to` the other side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,
    pub owner: String,
    pub to: String,
    pub messages: Vec<Message>,
    pub unread_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationPreview {
    pub id: Uuid,
    pub owner: String,
    pub to: String,
    pub preview_message: Message,
    pub unread_count: u32,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_target_round_trips_through_columns() {
        let id = Uuid::new_v4();
        let target = FlagTarget::Comment(id);
        assert_eq!(
            FlagTarget::from_parts(target.kind_str(), &target.key()),
            Some(target)
        );
        assert_eq!(
            FlagTarget::from_parts("user", "mallory"),
            Some(FlagTarget::User("mallory".into()))
        );
        assert_eq!(FlagTarget::from_parts("story", "not-a-uuid"), None);
    }

    #[test]
    fn reactable_kind_accepts_plural_path_segments() {
        assert_eq!("stories".parse::<ReactableKind>(), Ok(ReactableKind::Story));
        assert_eq!("reply".parse::<ReactableKind>(), Ok(ReactableKind::Reply));
        assert!("users".parse::<ReactableKind>().is_err());
    }
}
