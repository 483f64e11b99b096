mod common;

use uuid::Uuid;

use common::{Harness, NO_DEADLINE};
use hearth_engine::EngineError;

#[test]
fn saving_is_at_most_once_per_story() {
    let h = Harness::new();
    let ada = h.user("ada");
    let first = h.story(&ada);
    let second = h.story(&ada);

    let saved = h.engine.save_story("grace", first.id, NO_DEADLINE).unwrap();
    assert_eq!(saved.story.id, first.id);
    h.engine.save_story("grace", second.id, NO_DEADLINE).unwrap();

    assert!(matches!(
        h.engine.save_story("grace", first.id, NO_DEADLINE),
        Err(EngineError::AlreadySaved)
    ));
    assert!(matches!(
        h.engine.save_story("grace", Uuid::new_v4(), NO_DEADLINE),
        Err(EngineError::NotFound("story"))
    ));

    let list = h.engine.saved_stories("grace", NO_DEADLINE).unwrap();
    let ids: Vec<_> = list.iter().map(|s| s.story.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert!(h.engine.saved_stories("ada", NO_DEADLINE).unwrap().is_empty());
}

#[test]
fn unsaving_removes_only_that_entry() {
    let h = Harness::new();
    let ada = h.user("ada");
    let story = h.story(&ada);
    h.engine.save_story("grace", story.id, NO_DEADLINE).unwrap();
    h.engine.save_story("linus", story.id, NO_DEADLINE).unwrap();

    h.engine.unsave_story("grace", story.id, NO_DEADLINE).unwrap();
    assert!(matches!(
        h.engine.unsave_story("grace", story.id, NO_DEADLINE),
        Err(EngineError::NotFound(_))
    ));
    assert_eq!(h.engine.saved_stories("linus", NO_DEADLINE).unwrap().len(), 1);
}
