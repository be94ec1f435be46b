mod common;

use cheevos::{AchievementState, Error, LeaderboardState};
use common::{Harness, ram};

#[test]
fn test_capture_requires_game() {
    let h = Harness::softcore();
    assert!(matches!(h.client.capture_state(), Err(Error::NoGameLoaded)));
    assert!(matches!(
        h.client.restore_state(b"RCP1"),
        Err(Error::NoGameLoaded)
    ));
}

#[test]
fn test_progress_size_matches_capture() {
    let h = Harness::softcore().loaded();
    let mut memory = ram();
    memory[0x14] = 2;
    h.frame(&memory);

    let blob = h.client.capture_state().unwrap();
    assert_eq!(blob.len(), h.client.progress_size());
    assert_eq!(&blob[..4], b"RCP1");
}

#[test]
fn test_round_trip_on_same_session() {
    let h = Harness::softcore().loaded();
    let mut memory = ram();
    memory[0x10] = 1;
    memory[0x12] = 1;
    memory[0x14] = 4;
    h.frame(&memory);

    let achievements = |h: &Harness| {
        [1, 2, 3, 4, 5].map(|id| {
            let info = h.client.achievement_info(id).unwrap();
            (info.state, info.unlocked, info.measured_progress)
        })
    };
    let before = achievements(&h);
    let game = h.client.game_info();

    let blob = h.client.capture_state().unwrap();
    h.client.restore_state(&blob).unwrap();

    assert_eq!(achievements(&h), before);
    assert_eq!(h.client.game_info(), game);
    assert_eq!(h.client.capture_state().unwrap(), blob);
}

#[test]
fn test_restore_on_fresh_session() {
    let first = Harness::softcore().loaded();
    let mut memory = ram();
    memory[0x10] = 1;
    memory[0x14] = 5;
    first.frame(&memory);
    assert_eq!(first.count("AchievementTriggered"), 1);
    let blob = first.client.capture_state().unwrap();

    let second = Harness::softcore().loaded();
    second.client.restore_state(&blob).unwrap();

    let info = second.client.achievement_info(1).unwrap();
    assert_eq!(info.state, AchievementState::Unlocked);
    assert!(info.unlock_time.is_some());
    assert_eq!(
        second.client.achievement_info(4).unwrap().measured_progress,
        "5/10"
    );

    second.frame(&memory);
    assert_eq!(second.count("AchievementTriggered"), 0);
    assert_eq!(second.transport.count("awardachievement"), 0);
}

#[test]
fn test_restore_earlier_state_rearms() {
    let h = Harness::softcore().loaded();
    h.frame(&ram());
    let before = h.client.capture_state().unwrap();

    let mut memory = ram();
    memory[0x10] = 1;
    h.frame(&memory);
    assert_eq!(
        h.client.achievement_info(1).unwrap().state,
        AchievementState::Unlocked
    );

    h.client.restore_state(&before).unwrap();
    assert_eq!(
        h.client.achievement_info(1).unwrap().state,
        AchievementState::Active
    );
}

#[test]
fn test_restore_shows_primed_challenge() {
    let first = Harness::softcore().loaded();
    let mut memory = ram();
    memory[0x12] = 1;
    first.frame(&memory);
    let blob = first.client.capture_state().unwrap();

    let second = Harness::softcore().loaded();
    second.client.restore_state(&blob).unwrap();
    assert_eq!(second.count("ChallengeIndicatorShow"), 1);

    // restoring a state without the challenge hides it again
    let third = Harness::softcore().loaded();
    third.frame(&ram());
    let idle = third.client.capture_state().unwrap();
    second.client.restore_state(&idle).unwrap();
    assert_eq!(second.count("ChallengeIndicatorHide"), 1);
}

#[test]
fn test_restore_leaderboard_attempt() {
    let first = Harness::hardcore().loaded();
    let mut memory = ram();
    memory[0x30] = 1;
    memory[0x33] = 12;
    first.frame(&memory);
    let blob = first.client.capture_state().unwrap();

    let second = Harness::hardcore().loaded();
    second.client.restore_state(&blob).unwrap();
    let trackers = second.client.active_trackers();
    assert_eq!(trackers.len(), 1);
    assert_eq!(trackers[0].display, "000012");
    assert_eq!(second.count("TrackerShow"), 1);
    assert_eq!(
        second.client.leaderboard_info(100).unwrap().state,
        LeaderboardState::Tracking
    );

    // the attempt continues to a submission
    memory[0x32] = 1;
    second.frame(&memory);
    assert_eq!(second.count("LeaderboardSubmitted"), 1);
    assert!(second.transport.bodies("submitlbentry")[0].contains("s=12"));
}

#[test]
fn test_restore_rejects_bad_data() {
    let h = Harness::softcore().loaded();
    let mut memory = ram();
    memory[0x10] = 1;
    h.frame(&memory);
    let blob = h.client.capture_state().unwrap();

    assert!(matches!(
        h.client.restore_state(b"nope"),
        Err(Error::InvalidState(_))
    ));
    assert!(matches!(
        h.client.restore_state(&blob[..blob.len() - 1]),
        Err(Error::InvalidState(_))
    ));
    let mut trailing = blob.clone();
    trailing.push(0);
    assert!(matches!(
        h.client.restore_state(&trailing),
        Err(Error::InvalidState(_))
    ));

    // failed restores leave the session untouched
    assert_eq!(
        h.client.achievement_info(1).unwrap().state,
        AchievementState::Unlocked
    );
}

#[test]
fn test_restore_rejects_other_game() {
    let h = Harness::softcore().loaded();
    let mut blob = h.client.capture_state().unwrap();
    blob[4..8].copy_from_slice(&common::OTHER_GAME_ID.to_le_bytes());
    assert!(matches!(
        h.client.restore_state(&blob),
        Err(Error::InvalidState(_))
    ));
}
