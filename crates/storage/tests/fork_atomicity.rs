#![forbid(unsafe_code)]

mod support;

use sf_core::{CloneConfig, SqlFilter};
use sf_storage::{
    CHAPTER, CHARACTER, ForkRequest, SCENE, SCENE_CHOICE, SqliteStore, StoreError,
    StoreSettings, story_catalog,
};
use std::time::Duration;
use support::*;

fn request(story: i64, cutoff: i64, label: &str) -> ForkRequest {
    ForkRequest {
        source_story_id: story,
        source_branch_id: None,
        fork_cutoff: cutoff,
        target_branch_label: label.to_string(),
    }
}

#[test]
fn failure_on_last_table_rolls_back_every_clone() {
    let mut fx = Fixture::open("failure_on_last_table_rolls_back_every_clone");
    let seeded = seed_story(&fx, None);
    fx.db
        .execute("DELETE FROM character_relationships", [])
        .expect("drop relationships");

    // Cara is left out of the roster, but she still owns a memory within the cutoff.
    let mut registry = story_catalog();
    registry.register(
        CloneConfig::new(CHARACTER, "characters")
            .priority(10)
            .creates_mapping()
            .filter(|_| SqlFilter::new("\"name\" <> 'Cara'", Vec::new())),
    );
    let before = fx.table_counts();

    let err = fx
        .store
        .fork(&registry, request(seeded.story, 5, "doomed"))
        .expect_err("memory of an uncloned character");

    match &err {
        StoreError::ReferentialResolution {
            table,
            row_id,
            field,
            target,
            old_value,
        } => {
            assert_eq!(table, "character_memories");
            assert_eq!(*row_id, seeded.memories[1]);
            assert_eq!(field, "character_id");
            assert_eq!(target, CHARACTER);
            assert_eq!(*old_value, seeded.cara);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.table(), Some("character_memories"));
    assert!(err.user_message().contains("no new branch was created"));

    assert_eq!(fx.count("story_branches"), 0);
    assert_eq!(fx.branch_scoped_rows(), 0);
    assert_eq!(fx.table_counts(), before);
}

#[test]
fn store_stays_usable_after_a_rolled_back_fork() {
    let mut fx = Fixture::open("store_stays_usable_after_a_rolled_back_fork");
    let seeded = seed_story(&fx, None);

    let mut broken = story_catalog();
    broken.register(
        CloneConfig::new(CHARACTER, "characters")
            .priority(10)
            .creates_mapping()
            .filter(|_| SqlFilter::new("0 = 1", Vec::new())),
    );
    let err = fx
        .store
        .fork(&broken, request(seeded.story, 3, "retry"))
        .expect_err("relationships reference no cloned character");
    assert_eq!(err.table(), Some("character_relationships"));

    let outcome = fx
        .store
        .fork(&story_catalog(), request(seeded.story, 3, "retry"))
        .expect("same label succeeds once the rules are fixed");
    assert_eq!(outcome.cloned("characters"), 3);
    assert_eq!(fx.count("story_branches"), 1);
}

#[test]
fn timeout_rolls_back() {
    let mut fx = Fixture::open_with(
        "timeout_rolls_back",
        StoreSettings {
            fork_timeout: Some(Duration::from_nanos(1)),
            ..StoreSettings::default()
        },
    );
    let seeded = seed_story(&fx, None);
    let before = fx.table_counts();

    let err = fx
        .store
        .fork(&story_catalog(), request(seeded.story, 5, "slow"))
        .expect_err("deadline passes before the first page");

    assert!(matches!(err, StoreError::Timeout { .. }), "{err}");
    assert!(err.table().is_some());
    assert_eq!(fx.count("story_branches"), 0);
    assert_eq!(fx.table_counts(), before);
}

#[test]
fn unusable_registry_is_refused_before_any_write() {
    let mut fx = Fixture::open("unusable_registry_is_refused_before_any_write");
    let seeded = seed_story(&fx, None);

    let mut dangling_target = story_catalog();
    dangling_target.register(
        CloneConfig::new("Prop", "props")
            .priority(80)
            .remap("location_id", "Location"),
    );
    let err = fx
        .store
        .fork(&dangling_target, request(seeded.story, 3, "props"))
        .expect_err("remap to unregistered entity type");
    match &err {
        StoreError::InvalidRegistry(problems) => {
            assert!(problems.iter().any(|p| p.contains("Location")), "{problems:?}");
        }
        other => panic!("unexpected error: {other}"),
    }

    let mut missing_column = story_catalog();
    missing_column.register(
        CloneConfig::new(SCENE, "scenes")
            .priority(30)
            .depends_on([CHAPTER])
            .remap("chapter_id", CHAPTER)
            .self_ref("parent_scene_id")
            .cutoff_on("sequence_number")
            .creates_mapping()
            .nested(SCENE_CHOICE, "scene_id")
            .reset("mood", "calm"),
    );
    let err = fx
        .store
        .fork(&missing_column, request(seeded.story, 3, "moody"))
        .expect_err("reset of a column the table lacks");
    match &err {
        StoreError::InvalidRegistry(problems) => {
            assert_eq!(problems, &vec!["scenes has no column mood".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }

    let mut missing_table = story_catalog();
    missing_table.register(CloneConfig::new("Prop", "props").priority(80));
    let err = fx
        .store
        .fork(&missing_table, request(seeded.story, 3, "props"))
        .expect_err("registered table does not exist");
    assert!(matches!(err, StoreError::InvalidRegistry(_)), "{err}");

    assert_eq!(fx.count("story_branches"), 0);
    assert_eq!(fx.branch_scoped_rows(), 0);
}

#[test]
fn concurrent_forks_are_serialized() {
    let fx = Fixture::open("concurrent_forks_are_serialized");
    let seeded = seed_story(&fx, None);

    let handles = (0..2)
        .map(|n| {
            let dir = fx.dir.clone();
            let story = seeded.story;
            std::thread::spawn(move || {
                let mut store =
                    SqliteStore::open_with(&dir, StoreSettings::default()).expect("open store");
                store
                    .fork(&story_catalog(), request(story, 5, &format!("parallel-{n}")))
                    .expect("fork")
            })
        })
        .collect::<Vec<_>>();
    let outcomes = handles
        .into_iter()
        .map(|handle| handle.join().expect("fork thread"))
        .collect::<Vec<_>>();

    assert_ne!(outcomes[0].branch_id, outcomes[1].branch_id);
    for outcome in &outcomes {
        assert_eq!(fx.count_in_branch("scenes", outcome.branch_id), 5);
        assert_eq!(outcome.cloned("scenes"), 5);
    }
    // Whichever fork ran second also cloned the first one's roster copies,
    // which is only possible if the first had fully committed.
    let mut rosters = outcomes
        .iter()
        .map(|outcome| fx.count_in_branch("characters", outcome.branch_id))
        .collect::<Vec<_>>();
    rosters.sort_unstable();
    assert_eq!(rosters, vec![3, 6]);
    assert_eq!(fx.count("story_branches"), 2);
}
