mod common;

use std::time::Duration;

use cheevos::{ClientConfig, Event, MediaSource};
use common::{Harness, ram};

fn retry_now() -> ClientConfig {
    ClientConfig::builder()
        .retry_delays(&[Duration::ZERO])
        .build()
}

#[test]
fn test_retry_after_network_failure() {
    let h = Harness::new(retry_now()).loaded();
    h.transport.respond_once("awardachievement", 503, "<html>down</html>");
    let mut memory = ram();
    memory[0x10] = 1;

    h.frame(&memory);
    assert_eq!(h.client.pending_submissions(), 1);
    assert_eq!(h.count("ClientDisconnected"), 1);
    assert!(h.client.is_disconnected());

    // the retry is due on the next tick
    h.frame(&memory);
    assert_eq!(h.client.pending_submissions(), 0);
    assert_eq!(h.transport.count("awardachievement"), 2);
    assert!(!h.client.is_disconnected());

    let names: Vec<_> = h
        .events
        .take()
        .iter()
        .map(Event::name)
        .filter(|n| n.starts_with("Client") || *n == "AchievementTriggered")
        .collect();
    assert_eq!(
        names,
        ["AchievementTriggered", "ClientDisconnected", "ClientReconnected"]
    );
}

#[test]
fn test_disconnect_reported_once() {
    let h = Harness::new(retry_now()).loaded();
    h.transport.fail("awardachievement");
    let mut memory = ram();
    memory[0x10] = 1;

    for _ in 0..4 {
        h.frame(&memory);
    }
    assert_eq!(h.count("ClientDisconnected"), 1);
    assert_eq!(h.count("ClientReconnected"), 0);
    assert!(h.transport.count("awardachievement") >= 4);
    assert_eq!(h.client.pending_submissions(), 1);

    h.transport.respond("awardachievement", common::AWARD);
    h.frame(&memory);
    assert_eq!(h.count("ClientReconnected"), 1);
    assert_eq!(h.count("AchievementTriggered"), 1);
}

#[test]
fn test_retry_waits_for_delay() {
    let config = ClientConfig::builder()
        .retry_delays(&[Duration::from_secs(60)])
        .build();
    let h = Harness::new(config).loaded();
    h.transport.respond_once("awardachievement", 0, "");
    let mut memory = ram();
    memory[0x10] = 1;

    h.frame(&memory);
    h.frame(&memory);
    h.client.idle();
    h.executor.run_all();
    assert_eq!(h.transport.count("awardachievement"), 1);
    assert_eq!(h.client.pending_submissions(), 1);
}

#[test]
fn test_rejected_unlock_reports_server_error() {
    let h = Harness::softcore().loaded();
    h.transport.respond_once(
        "awardachievement",
        200,
        r#"{"Success":false,"Error":"Achievement 1 does not exist"}"#,
    );
    let mut memory = ram();
    memory[0x10] = 1;

    h.frame(&memory);
    assert_eq!(h.client.pending_submissions(), 0);
    assert_eq!(h.transport.count("awardachievement"), 1);

    let error = h
        .events
        .take()
        .into_iter()
        .find_map(|e| match e {
            Event::ServerError {
                api,
                message,
                related_id,
            } => Some((api, message, related_id)),
            _ => None,
        })
        .unwrap();
    assert_eq!(error.0, "awardachievement");
    assert!(error.1.contains("does not exist"));
    assert_eq!(error.2, Some(1));
    assert_eq!(h.count("ClientDisconnected"), 0);
}

#[test]
fn test_already_unlocked_counts_as_success() {
    let h = Harness::softcore().loaded();
    h.transport.respond_once(
        "awardachievement",
        200,
        r#"{"Success":false,"Error":"User already has this achievement unlocked."}"#,
    );
    let mut memory = ram();
    memory[0x10] = 1;

    h.frame(&memory);
    assert_eq!(h.client.pending_submissions(), 0);
    assert_eq!(h.count("ServerError"), 0);
    // no award response, so the score is unchanged
    assert_eq!(h.client.user_info().unwrap().score, 100);
}

#[test]
fn test_media_swap_keeps_retrying_old_unlock() {
    let h = Harness::new(retry_now()).loaded();
    h.transport.fail("awardachievement");
    let mut memory = ram();
    memory[0x10] = 1;
    h.frame(&memory);
    assert!(h.client.is_disconnected());

    h.transport.respond_once(
        "gameid",
        200,
        &format!(r#"{{"Success":true,"GameID":{}}}"#, common::OTHER_GAME_ID),
    );
    h.transport
        .respond_once("achievementsets", 200, common::OTHER_GAME_SETS);
    h.transport.respond_once("startsession", 200, common::OK);
    let handle = h
        .client
        .change_media(MediaSource::bytes(b"game-two".to_vec()))
        .unwrap();
    h.executor.run_all();
    assert_eq!(handle.wait().unwrap().id, common::OTHER_GAME_ID);
    assert_eq!(h.client.pending_submissions(), 1);

    h.transport.respond("awardachievement", common::AWARD);
    h.frame(&ram());
    assert_eq!(h.client.pending_submissions(), 0);
    assert!(!h.client.is_disconnected());
    assert_eq!(h.count("ClientReconnected"), 1);

    let bodies = h.transport.bodies("awardachievement");
    assert!(bodies.last().unwrap().contains("m=game-one"));
}

#[test]
fn test_unload_drops_pending_submissions() {
    let h = Harness::new(retry_now()).loaded();
    h.transport.fail("awardachievement");
    let mut memory = ram();
    memory[0x10] = 1;

    // unlock is queued but its request has not run yet
    h.client.do_frame(&memory.as_slice());
    assert_eq!(h.executor.pending(), 1);

    h.client.unload_game().unwrap();
    assert_eq!(h.client.pending_submissions(), 0);

    h.executor.run_all();
    assert_eq!(h.count("ClientDisconnected"), 0);
    assert_eq!(h.count("ServerError"), 0);
    assert_eq!(h.client.pending_submissions(), 0);
}

#[test]
fn test_logout_drops_submissions() {
    let h = Harness::new(retry_now()).loaded();
    let mut memory = ram();
    memory[0x10] = 1;

    h.client.do_frame(&memory.as_slice());
    h.client.logout();
    h.executor.run_all();

    assert_eq!(h.transport.count("awardachievement"), 0);
    assert_eq!(h.count("ServerError"), 0);
}
