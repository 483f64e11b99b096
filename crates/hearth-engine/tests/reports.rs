mod common;

use std::thread;

use uuid::Uuid;

use common::{Harness, NO_DEADLINE};
use hearth_engine::{EngineError, ErrorKind};
use hearth_types::models::FlagTarget;

#[test]
fn second_report_of_same_target_is_a_duplicate() {
    let h = Harness::new();
    let ada = h.user("ada");
    let grace = h.user("grace");
    let story = h.story(&ada);

    let flag = h
        .engine
        .report(&grace, FlagTarget::Story(story.id), "spam", NO_DEADLINE)
        .unwrap();
    assert_eq!(flag.flagger_id, grace.id);
    assert_eq!(flag.target, FlagTarget::Story(story.id));

    let err = h
        .engine
        .report(&grace, FlagTarget::Story(story.id), "still spam", NO_DEADLINE)
        .unwrap_err();
    assert!(matches!(err, EngineError::DuplicateReport));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(h.count("flags", ""), 1);

    // A different flagger may still report it
    let linus = h.user("linus");
    h.engine
        .report(&linus, FlagTarget::Story(story.id), "spam", NO_DEADLINE)
        .unwrap();
    assert_eq!(h.count("flags", ""), 2);
}

#[test]
fn concurrent_duplicate_reports_leave_one_flag() {
    let h = Harness::new();
    let ada = h.user("ada");
    let grace = h.user("grace");
    let story = h.story(&ada);
    let comment = h.comment(&ada, &story);

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let engine = h.engine.clone();
            let grace = grace.clone();
            thread::spawn(move || {
                engine.report(&grace, FlagTarget::Comment(comment.id), "rude", NO_DEADLINE)
            })
        })
        .collect();
    let ok = handles
        .into_iter()
        .map(|t| t.join().unwrap())
        .filter(|r| r.is_ok())
        .count();

    assert_eq!(ok, 1);
    assert_eq!(h.count("flags", "target_kind = 'comment'"), 1);
}

#[test]
fn user_reports_refresh_the_flag_count() {
    let h = Harness::new();
    let mallory = h.user("mallory");
    let ada = h.user("ada");
    let grace = h.user("grace");

    for flagger in [&ada, &grace] {
        h.engine
            .report(flagger, FlagTarget::User("mallory".into()), "harassment", NO_DEADLINE)
            .unwrap();
    }
    assert!(matches!(
        h.engine
            .report(&ada, FlagTarget::User("mallory".into()), "again", NO_DEADLINE),
        Err(EngineError::DuplicateReport)
    ));

    let edges = h.engine.user_edges(&mallory.username, NO_DEADLINE).unwrap();
    assert_eq!(edges.flag_count, 2);
}

#[test]
fn reports_are_validated() {
    let h = Harness::new();
    let ada = h.user("ada");

    let err = h
        .engine
        .report(&ada, FlagTarget::Reply(Uuid::new_v4()), "spam", NO_DEADLINE)
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound("reply")));

    let story = h.story(&ada);
    let err = h
        .engine
        .report(&ada, FlagTarget::Story(story.id), "   ", NO_DEADLINE)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = h
        .engine
        .report(&ada, FlagTarget::User("nobody".into()), "spam", NO_DEADLINE)
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound("user")));
    assert_eq!(h.count("flags", ""), 0);
}
