mod common;

use cheevos::{
    AchievementState, ClientConfig, ConsoleId, Credential, Error, Event, LoadFailureReason,
    LoadGameState, LoadState, MediaSource, Mode,
};
use common::{GAME_ID, Harness, OTHER_GAME_ID, OTHER_GAME_SETS, ScriptedTransport};

fn game_one() -> MediaSource {
    MediaSource::bytes(b"game-one".to_vec())
}

#[test]
fn test_login_with_password() {
    let h = Harness::softcore();
    h.login();

    let user = h.client.user_info().unwrap();
    assert_eq!(user.username, "alice");
    assert_eq!(user.display_name, "Alice");
    assert_eq!(user.score, 100);
    assert_eq!(user.num_unread_messages, 2);
    assert_eq!(h.client.login_token().as_deref(), Some("tok123"));

    let body = &h.transport.bodies("login2")[0];
    assert!(body.contains("u=alice"));
    assert!(body.contains("p=pw"));
}

#[test]
fn test_login_with_token() {
    let h = Harness::softcore();
    let handle = h
        .client
        .login("alice", Credential::Token("tok123".into()))
        .unwrap();
    h.executor.run_all();
    handle.wait().unwrap();

    let body = &h.transport.bodies("login2")[0];
    assert!(body.contains("t=tok123"));
    assert!(!body.contains("p="));
}

#[test]
fn test_login_rejected() {
    let transport = ScriptedTransport::new();
    transport.respond_once(
        "login2",
        401,
        r#"{"Success":false,"Error":"Invalid User/Password combination.","Code":"invalid_credentials"}"#,
    );
    let h = Harness::with_transport(ClientConfig::default(), transport);

    let handle = h
        .client
        .login("alice", Credential::Password("wrong".into()))
        .unwrap();
    h.executor.run_all();
    assert!(matches!(handle.wait(), Err(Error::InvalidCredentials(_))));
    assert!(!h.client.is_logged_in());
}

#[test]
fn test_login_requires_username() {
    let h = Harness::softcore();
    let result = h.client.login("", Credential::Password("pw".into()));
    assert!(matches!(result, Err(Error::InvalidCredentials(_))));
    assert_eq!(h.executor.pending(), 0);
}

#[test]
fn test_load_requires_login() {
    let h = Harness::softcore();
    let result = h.client.load_game(game_one(), ConsoleId::Nintendo);
    assert!(matches!(result, Err(Error::NotLoggedIn)));
}

#[test]
fn test_load_game() {
    let h = Harness::softcore();
    h.login();

    let handle = h.client.load_game(game_one(), ConsoleId::Nintendo).unwrap();
    assert_eq!(h.client.load_state(), LoadState::Identifying);
    assert_eq!(h.client.load_game_state(), LoadGameState::IdentifyingGame);

    h.executor.run_all();
    let game = handle.wait().unwrap();
    assert_eq!(game.id, GAME_ID);
    assert_eq!(game.title, "Test Game");
    assert_eq!(game.hash, "game-one");
    assert_eq!(game.badge_name, "000001");
    assert_eq!(h.client.load_state(), LoadState::Loaded);
    assert_eq!(h.client.load_game_state(), LoadGameState::Done);

    // unofficial achievements are skipped without the mode
    assert!(h.client.achievement_info(6).is_none());
    assert_eq!(
        h.client.achievement_info(2).unwrap().state,
        AchievementState::Unlocked
    );
    assert_eq!(
        h.client.achievement_info(5).unwrap().state,
        AchievementState::Disabled
    );
    assert_eq!(
        h.client.achievement_info(1).unwrap().state,
        AchievementState::Active
    );
    assert!(h.client.has_leaderboards());
    assert!(h.client.has_rich_presence());
    assert!(h.client.is_processing_required());

    let events = h.events.take();
    assert!(matches!(&events[..], [Event::GameLoaded { game }] if game.id == GAME_ID));

    let start = &h.transport.bodies("startsession")[0];
    assert!(start.contains("g=1234"));
    assert!(start.contains("h=0"));
}

#[test]
fn test_load_with_unofficial_mode() {
    let h = Harness::new(ClientConfig::builder().unofficial(true).build()).loaded();
    let summary = h.client.user_game_summary();
    assert_eq!(summary.num_unofficial_achievements, 1);
    assert_eq!(summary.num_core_achievements, 5);
    assert_eq!(summary.num_unlocked_achievements, 1);
    assert_eq!(summary.points_unlocked, 10);
    assert_eq!(summary.num_unsupported_achievements, 1);
}

#[test]
fn test_load_unknown_game() {
    let h = Harness::softcore();
    h.login();
    h.transport.respond("gameid", r#"{"Success":true,"GameID":0}"#);

    let handle = h.client.load_game(game_one(), ConsoleId::Nintendo).unwrap();
    h.executor.run_all();
    assert!(matches!(handle.wait(), Err(Error::UnknownGame { .. })));
    assert_eq!(h.client.load_state(), LoadState::NoGame);

    let events = h.events.take();
    assert!(events.iter().any(|e| matches!(
        e,
        Event::GameLoadFailed {
            reason: LoadFailureReason::UnknownGame,
            ..
        }
    )));
    assert_eq!(h.transport.count("achievementsets"), 0);
}

#[test]
fn test_load_network_failure() {
    let h = Harness::softcore();
    h.login();
    h.transport.fail("achievementsets");

    let handle = h.client.load_game(game_one(), ConsoleId::Nintendo).unwrap();
    h.executor.run_all();
    let err = handle.wait().unwrap_err();
    assert!(err.is_retryable());
    assert!(!h.client.is_game_loaded());
    assert!(h.events.names().contains(&"GameLoadFailed"));
}

#[test]
fn test_second_load_while_loading_is_busy() {
    let h = Harness::softcore();
    h.login();

    let first = h.client.load_game(game_one(), ConsoleId::Nintendo).unwrap();
    let second = h.client.load_game(game_one(), ConsoleId::Nintendo);
    assert!(matches!(second, Err(Error::Busy)));

    h.executor.run_all();
    assert!(first.wait().is_ok());

    let third = h.client.load_game(game_one(), ConsoleId::Nintendo);
    assert!(matches!(third, Err(Error::InvalidState(_))));
}

#[test]
fn test_load_then_unload() {
    let h = Harness::softcore().loaded();

    h.client.unload_game().unwrap();
    assert_eq!(h.client.load_state(), LoadState::NoGame);
    assert!(h.client.game_info().is_none());
    assert!(h.client.achievement_info(1).is_none());
    assert!(h.client.achievement_list(Default::default(), Default::default()).is_empty());
    assert!(!h.client.is_processing_required());
    assert!(matches!(h.client.unload_game(), Err(Error::NoGameLoaded)));

    // a fresh load is accepted again
    let handle = h.client.load_game(game_one(), ConsoleId::Nintendo).unwrap();
    h.executor.run_all();
    assert!(handle.wait().is_ok());
}

#[test]
fn test_unload_aborts_load_in_progress() {
    let h = Harness::softcore();
    h.login();

    let handle = h.client.load_game(game_one(), ConsoleId::Nintendo).unwrap();
    h.client.unload_game().unwrap();
    h.executor.run_all();

    assert!(matches!(handle.wait(), Err(Error::Aborted)));
    assert_eq!(h.client.load_state(), LoadState::NoGame);
    assert_eq!(h.client.load_game_state(), LoadGameState::Aborted);
    assert!(!h.events.names().contains(&"GameLoaded"));
}

#[test]
fn test_cancel_load() {
    let h = Harness::softcore();
    h.login();
    h.events.take();

    let handle = h.client.load_game(game_one(), ConsoleId::Nintendo).unwrap();
    assert!(handle.cancel());
    assert!(handle.is_cancelled());
    assert_eq!(h.client.load_state(), LoadState::NoGame);

    h.executor.run_all();
    assert!(matches!(handle.wait(), Err(Error::Aborted)));
    assert!(h.events.take().is_empty());
    assert!(!h.client.is_game_loaded());
    assert_eq!(h.transport.count("achievementsets"), 0);

    // the slot is free again
    assert!(h.client.load_game(game_one(), ConsoleId::Nintendo).is_ok());
}

#[test]
fn test_cancel_login() {
    let h = Harness::softcore();
    h.events.take();
    let modes = h.client.modes();

    let handle = h
        .client
        .login("alice", Credential::Password("pw".into()))
        .unwrap();
    assert!(handle.cancel());
    h.executor.run_all();

    assert!(matches!(handle.wait(), Err(Error::Aborted)));
    assert!(h.events.take().is_empty());
    assert!(h.client.user_info().is_none());
    assert!(!h.client.is_logged_in());
    assert_eq!(h.client.modes(), modes);

    // the slot is free again
    h.login();
    assert!(h.client.is_logged_in());
}

#[test]
fn test_cancel_change_media() {
    let h = Harness::softcore().loaded();
    h.transport.respond_once(
        "gameid",
        200,
        &format!(r#"{{"Success":true,"GameID":{OTHER_GAME_ID}}}"#),
    );
    h.transport
        .respond_once("achievementsets", 200, OTHER_GAME_SETS);
    let (modes, game, user) = (h.client.modes(), h.client.game_info(), h.client.user_info());

    let handle = h
        .client
        .change_media(MediaSource::bytes(b"game-two".to_vec()))
        .unwrap();
    assert!(handle.cancel());
    h.executor.run_all();

    assert!(matches!(handle.wait(), Err(Error::Aborted)));
    assert!(h.events.take().is_empty());
    assert_eq!(h.client.modes(), modes);
    assert_eq!(h.client.game_info(), game);
    assert_eq!(h.client.user_info(), user);
    assert!(h.client.achievement_info(1).is_some());

    let handle = h
        .client
        .change_media(MediaSource::bytes(b"game-one-disc2".to_vec()))
        .unwrap();
    h.executor.run_all();
    assert_eq!(handle.wait().unwrap().id, GAME_ID);
}

#[test]
fn test_cancel_after_completion_keeps_result() {
    let h = Harness::softcore();
    h.login();

    let handle = h.client.load_game(game_one(), ConsoleId::Nintendo).unwrap();
    h.executor.run_all();
    assert!(!handle.cancel());
    assert!(handle.wait().is_ok());
    assert!(h.client.is_game_loaded());
}

#[test]
fn test_logout_unloads_game() {
    let h = Harness::softcore().loaded();
    h.client.logout();
    assert!(!h.client.is_logged_in());
    assert!(!h.client.is_game_loaded());
    assert!(h.client.login_token().is_none());
}

#[test]
fn test_change_media_same_game() {
    let h = Harness::softcore().loaded();

    let handle = h
        .client
        .change_media(MediaSource::bytes(b"game-one-disc2".to_vec()))
        .unwrap();
    h.executor.run_all();

    let game = handle.wait().unwrap();
    assert_eq!(game.id, GAME_ID);
    assert_eq!(game.hash, "game-one-disc2");
    assert_eq!(h.transport.count("achievementsets"), 1);
}

#[test]
fn test_change_media_unchanged_skips_lookup() {
    let h = Harness::softcore().loaded();
    let before = h.transport.count("gameid");

    let handle = h.client.change_media(game_one()).unwrap();
    h.executor.run_all();
    assert_eq!(handle.wait().unwrap().hash, "game-one");
    assert_eq!(h.transport.count("gameid"), before);
}

#[test]
fn test_change_media_unknown_in_hardcore() {
    let h = Harness::hardcore().loaded();
    h.transport
        .respond_once("gameid", 200, r#"{"Success":true,"GameID":0}"#);

    let handle = h
        .client
        .change_media(MediaSource::bytes(b"homebrew".to_vec()))
        .unwrap();
    h.executor.run_all();

    assert!(matches!(handle.wait(), Err(Error::HardcoreDisabled(_))));
    assert!(!h.client.modes().hardcore);
    assert!(h.client.is_game_loaded());
    assert_eq!(h.client.game_info().unwrap().hash, "game-one");
    assert_eq!(h.count("ResetRequested"), 1);
}

#[test]
fn test_change_media_unknown_in_softcore() {
    let h = Harness::softcore().loaded();
    h.transport
        .respond_once("gameid", 200, r#"{"Success":true,"GameID":0}"#);

    let handle = h
        .client
        .change_media(MediaSource::bytes(b"homebrew".to_vec()))
        .unwrap();
    h.executor.run_all();

    assert_eq!(handle.wait().unwrap().id, GAME_ID);
    assert_eq!(h.count("ResetRequested"), 0);
}

#[test]
fn test_change_media_other_game() {
    let h = Harness::softcore().loaded();
    h.transport.respond_once(
        "gameid",
        200,
        &format!(r#"{{"Success":true,"GameID":{OTHER_GAME_ID}}}"#),
    );
    h.transport
        .respond_once("achievementsets", 200, OTHER_GAME_SETS);
    h.transport
        .respond_once("startsession", 200, r#"{"Success":true}"#);

    let handle = h
        .client
        .change_media(MediaSource::bytes(b"game-two".to_vec()))
        .unwrap();
    h.executor.run_all();

    let game = handle.wait().unwrap();
    assert_eq!(game.id, OTHER_GAME_ID);
    assert_eq!(game.title, "Other Game");
    assert!(h.client.achievement_info(1).is_none());
    assert!(h.client.achievement_info(50).is_some());
    assert!(h.events.names().contains(&"GameLoaded"));
}

#[test]
fn test_change_media_requires_game() {
    let h = Harness::softcore();
    h.login();
    let result = h.client.change_media(game_one());
    assert!(matches!(result, Err(Error::NoGameLoaded)));
}

#[test]
fn test_change_media_while_loading_is_rejected() {
    let h = Harness::softcore();
    h.login();
    let _load = h.client.load_game(game_one(), ConsoleId::Nintendo).unwrap();
    let result = h.client.change_media(game_one());
    assert!(matches!(result, Err(Error::NoGameLoaded)));
}

#[test]
fn test_hardcore_pause_throttle() {
    let h = Harness::hardcore().loaded();
    let ram = common::ram();

    assert_eq!(h.client.can_pause(), (true, 0));
    h.frame(&ram);
    let (allowed, frames_left) = h.client.can_pause();
    assert!(!allowed);
    assert_eq!(frames_left as u64, cheevos::PAUSE_INTERVAL_FRAMES - 1);

    h.client.set_mode(Mode::Hardcore, false);
    assert_eq!(h.client.can_pause(), (true, 0));
}
