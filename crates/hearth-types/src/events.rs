use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{FlagTarget, ReactableKind, Reaction};

/// Notification-worthy facts emitted after a mutation commits.
/// Delivery is best-effort; consumers may drop any of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Notice {
    /// `follower` started following `target`
    Followed { follower: String, target: String },

    /// `follower` stopped following `target`
    Unfollowed { follower: String, target: String },

    /// Someone liked or disliked a piece of content
    Reacted {
        actor: String,
        author: String,
        kind: ReactableKind,
        entity_id: Uuid,
        reaction: Reaction,
    },

    /// A flag was filed
    Reported {
        flagger_id: Uuid,
        target: FlagTarget,
        reason: String,
    },

    /// A direct message was delivered
    MessageSent {
        message_id: Uuid,
        from: String,
        to: String,
    },

    /// A story and everything hanging off it were removed
    StoryDeleted {
        story_id: Uuid,
        author: String,
        comments: usize,
        replies: usize,
    },

    /// A comment and its replies were removed
    CommentDeleted {
        comment_id: Uuid,
        author: String,
        replies: usize,
    },
}

impl Notice {
    /// The user this fact should be delivered to, if it targets anyone.
    /// `None` means the fact is only of interest to moderation/auditing.
    pub fn recipient(&self) -> Option<&str> {
        match self {
            Self::Followed { target, .. } => Some(target),
            Self::Unfollowed { target, .. } => Some(target),
            Self::Reacted { author, actor, .. } if author != actor => Some(author),
            Self::MessageSent { to, .. } => Some(to),
            _ => None,
        }
    }
}
