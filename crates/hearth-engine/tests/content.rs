mod common;

use uuid::Uuid;

use common::{Harness, NO_DEADLINE};
use hearth_engine::{EngineError, ErrorKind};
use hearth_types::models::ReactableKind;

#[test]
fn new_content_starts_without_reactions() {
    let h = Harness::new();
    let ada = h.user("ada");

    let long = "word ".repeat(100);
    let story = h
        .engine
        .create_story(&ada, "  Long read ", &long, NO_DEADLINE)
        .unwrap();
    assert_eq!(story.title, "Long read");
    assert!(story.preview.ends_with("..."));
    assert_eq!((story.like_count, story.dislike_count, story.score), (0, 0, 0));

    let stored = h.engine.story(story.id, NO_DEADLINE).unwrap();
    assert_eq!(stored.preview, story.preview);
    assert_eq!(stored.author_username, "ada");

    let view = h
        .engine
        .reactable(ReactableKind::Story, story.id, NO_DEADLINE)
        .unwrap();
    assert!(view.likes.is_empty() && view.dislikes.is_empty());
}

#[test]
fn children_need_an_existing_parent() {
    let h = Harness::new();
    let ada = h.user("ada");

    assert!(matches!(
        h.engine.create_comment(&ada, Uuid::new_v4(), "hi", NO_DEADLINE),
        Err(EngineError::NotFound("story"))
    ));
    assert!(matches!(
        h.engine.create_reply(&ada, Uuid::new_v4(), "hi", NO_DEADLINE),
        Err(EngineError::NotFound("comment"))
    ));
    assert_eq!(
        h.engine
            .create_story(&ada, "", "body", NO_DEADLINE)
            .unwrap_err()
            .kind(),
        ErrorKind::InvalidArgument
    );
}

#[test]
fn threads_list_oldest_first() {
    let h = Harness::new();
    let ada = h.user("ada");
    let story = h.story(&ada);
    let first = h.comment(&ada, &story);
    let second = h.comment(&ada, &story);
    let reply = h.reply(&ada, &first);

    let comments = h.engine.comments_for(story.id, NO_DEADLINE).unwrap();
    let ids: Vec<_> = comments.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);

    let replies = h.engine.replies_for(first.id, NO_DEADLINE).unwrap();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].id, reply.id);
    assert!(h.engine.replies_for(second.id, NO_DEADLINE).unwrap().is_empty());
}

#[test]
fn authors_edit_their_own_content() {
    let h = Harness::new();
    let ada = h.user("ada");
    let story = h.story(&ada);
    let comment = h.comment(&ada, &story);
    let reply = h.reply(&ada, &comment);
    assert!(!story.edited);
    let stored = h.engine.story(story.id, NO_DEADLINE).unwrap();

    let long = "b".repeat(200);
    let edited = h
        .engine
        .update_story(story.id, "ada", "  New title ", &long, NO_DEADLINE)
        .unwrap();
    assert!(edited.edited);
    assert_eq!(edited.title, "New title");
    assert_eq!(edited.preview, format!("{}...", "b".repeat(160)));
    assert!(edited.updated_at >= stored.updated_at);
    assert_eq!(edited.created_at, stored.created_at);
    assert_eq!(h.engine.story(story.id, NO_DEADLINE).unwrap().content, long);

    let comment = h
        .engine
        .update_comment(comment.id, "ada", "changed my mind", NO_DEADLINE)
        .unwrap();
    assert!(comment.edited);
    assert_eq!(
        h.engine.comments_for(story.id, NO_DEADLINE).unwrap()[0].content,
        "changed my mind"
    );

    let reply = h
        .engine
        .update_reply(reply.id, "ada", "typo fixed", NO_DEADLINE)
        .unwrap();
    assert!(reply.edited);
    assert_eq!(reply.content, "typo fixed");
}

#[test]
fn edits_by_others_or_of_missing_content_change_nothing() {
    let h = Harness::new();
    let ada = h.user("ada");
    h.user("grace");
    let story = h.story(&ada);
    let comment = h.comment(&ada, &story);

    let err = h
        .engine
        .update_story(story.id, "grace", "Hijacked", "mine now", NO_DEADLINE)
        .unwrap_err();
    assert!(matches!(err, EngineError::NotAuthorOrNotFound));
    assert!(matches!(
        h.engine.update_comment(comment.id, "grace", "mine now", NO_DEADLINE),
        Err(EngineError::NotAuthorOrNotFound)
    ));
    assert!(matches!(
        h.engine.update_reply(Uuid::new_v4(), "ada", "anything", NO_DEADLINE),
        Err(EngineError::NotAuthorOrNotFound)
    ));
    assert_eq!(
        h.engine
            .update_comment(comment.id, "ada", "   ", NO_DEADLINE)
            .unwrap_err()
            .kind(),
        ErrorKind::InvalidArgument
    );

    let unchanged = h.engine.story(story.id, NO_DEADLINE).unwrap();
    assert_eq!(unchanged.title, story.title);
    assert!(!unchanged.edited);
    assert!(!h.engine.comments_for(story.id, NO_DEADLINE).unwrap()[0].edited);
}
