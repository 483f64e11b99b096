mod common;

use std::thread;

use uuid::Uuid;

use common::{Harness, NO_DEADLINE};
use hearth_engine::{EngineError, ErrorKind};
use hearth_types::events::Notice;
use hearth_types::models::{ReactableKind, Reaction, ReactionTally};

#[test]
fn like_then_dislike_moves_the_actor_between_sets() {
    let h = Harness::new();
    let author = h.user("ada");
    let grace = h.user("grace");
    let linus = h.user("linus");
    let story = h.story(&author);

    let tally = h
        .engine
        .like(ReactableKind::Story, story.id, &grace.username, NO_DEADLINE)
        .unwrap();
    assert_eq!(tally, ReactionTally { like_count: 1, dislike_count: 0 });

    h.engine
        .like(ReactableKind::Story, story.id, &linus.username, NO_DEADLINE)
        .unwrap();
    let tally = h
        .engine
        .dislike(ReactableKind::Story, story.id, &grace.username, NO_DEADLINE)
        .unwrap();
    assert_eq!(tally, ReactionTally { like_count: 1, dislike_count: 1 });

    let view = h.engine.reactable(ReactableKind::Story, story.id, NO_DEADLINE).unwrap();
    assert_eq!(view.likes, vec!["linus"]);
    assert_eq!(view.dislikes, vec!["grace"]);
    assert_eq!(view.like_count as usize, view.likes.len());
    assert_eq!(view.dislike_count as usize, view.dislikes.len());

    // Score follows the counters
    let story = h.engine.story(story.id, NO_DEADLINE).unwrap();
    assert_eq!(story.score, 0);
}

#[test]
fn repeated_like_is_rejected_and_changes_nothing() {
    let h = Harness::new();
    let author = h.user("ada");
    let story = h.story(&author);
    let comment = h.comment(&author, &story);

    h.engine
        .like(ReactableKind::Comment, comment.id, "grace", NO_DEADLINE)
        .unwrap();
    let err = h
        .engine
        .like(ReactableKind::Comment, comment.id, "grace", NO_DEADLINE)
        .unwrap_err();
    assert!(matches!(err, EngineError::AlreadyReacted));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let view = h
        .engine
        .reactable(ReactableKind::Comment, comment.id, NO_DEADLINE)
        .unwrap();
    assert_eq!(view.likes, vec!["grace"]);
    assert!(view.dislikes.is_empty());
    assert_eq!((view.like_count, view.dislike_count), (1, 0));
}

#[test]
fn dislike_twice_is_rejected_too() {
    let h = Harness::new();
    let author = h.user("ada");
    let story = h.story(&author);
    let reply = h.reply(&author, &h.comment(&author, &story));

    h.engine
        .dislike(ReactableKind::Reply, reply.id, "grace", NO_DEADLINE)
        .unwrap();
    assert!(matches!(
        h.engine.dislike(ReactableKind::Reply, reply.id, "grace", NO_DEADLINE),
        Err(EngineError::AlreadyReacted)
    ));
}

#[test]
fn reacting_to_a_missing_entity_is_not_found() {
    let h = Harness::new();
    let err = h
        .engine
        .like(ReactableKind::Reply, Uuid::new_v4(), "grace", NO_DEADLINE)
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound("reply")));
}

#[test]
fn concurrent_likes_from_one_actor_count_once() {
    let h = Harness::new();
    let author = h.user("ada");
    let story = h.story(&author);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = h.engine.clone();
            thread::spawn(move || engine.like(ReactableKind::Story, story.id, "grace", NO_DEADLINE))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|t| t.join().unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, EngineError::AlreadyReacted))
    );

    let story = h.engine.story(story.id, NO_DEADLINE).unwrap();
    assert_eq!((story.like_count, story.score), (1, 1));
}

#[test]
fn reactable_view_matches_its_counts_while_reactions_change() {
    let h = Harness::new();
    let author = h.user("ada");
    let story = h.story(&author);
    let fans: Vec<String> = (0..4).map(|i| format!("fan{i}")).collect();
    for fan in &fans {
        h.user(fan);
    }

    let churners: Vec<_> = fans
        .iter()
        .cloned()
        .map(|fan| {
            let engine = h.engine.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    engine.like(ReactableKind::Story, story.id, &fan, NO_DEADLINE).unwrap();
                    engine.dislike(ReactableKind::Story, story.id, &fan, NO_DEADLINE).unwrap();
                }
            })
        })
        .collect();

    while churners.iter().any(|t| !t.is_finished()) {
        let view = h.engine.reactable(ReactableKind::Story, story.id, NO_DEADLINE).unwrap();
        assert_eq!(view.like_count as usize, view.likes.len());
        assert_eq!(view.dislike_count as usize, view.dislikes.len());
    }
    for t in churners {
        t.join().unwrap();
    }
    let view = h.engine.reactable(ReactableKind::Story, story.id, NO_DEADLINE).unwrap();
    assert_eq!(view.dislikes.len(), 4);
    assert!(view.likes.is_empty());
}

#[test]
fn reactions_are_announced_to_the_author() {
    let h = Harness::new();
    let author = h.user("ada");
    let story = h.story(&author);
    let mut rx = h.engine.notifier().subscribe();

    h.engine
        .like(ReactableKind::Story, story.id, "grace", NO_DEADLINE)
        .unwrap();
    let notice = rx.try_recv().unwrap();
    assert_eq!(notice.recipient(), Some("ada"));
    assert!(matches!(
        notice,
        Notice::Reacted { reaction: Reaction::Like, .. }
    ));

    // Rejected calls publish nothing
    let _ = h.engine.like(ReactableKind::Story, story.id, "grace", NO_DEADLINE);
    assert!(rx.try_recv().is_err());
}
