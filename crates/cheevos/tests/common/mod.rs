//! Shared fixtures for the integration tests.
//!
//! The fixture engine understands a tiny condition language:
//!
//! - achievements: `0xADDR=VAL` conditions joined by `_`; a `C:` prefix marks
//!   the final (challenge) condition; `M:0xADDR/TARGET` is a measured
//!   condition that holds once the byte reaches `TARGET`; `bad` fails
//!   validation
//! - leaderboards: `STA:cond|CAN:cond|SUB:cond|VAL:0xADDR`
//! - rich presence: text with `{0xADDR}` placeholders

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use cheevos::{
    Client, ClientConfig, ConsoleId, ContentHasher, Error, ErrorCode, Event, Executor, GameHash,
    HttpRequest, HttpResponse, LeaderboardOutcome, LeaderboardStatus, Measured, MediaSource,
    MemoryReader, Result, Task, Transport, TriggerEngine, TriggerMemo, TriggerOutcome,
    TriggerStatus,
};
use parking_lot::Mutex;

// ---- service fixtures ----

pub const GAME_ID: u32 = 1234;
pub const OTHER_GAME_ID: u32 = 5678;

pub const LOGIN: &str = r#"{"Success":true,"User":"alice","DisplayName":"Alice","Token":"tok123","Score":100,"SoftcoreScore":5,"Messages":2}"#;

pub const GAME_SETS: &str = r#"{
  "Success": true,
  "GameId": 1234,
  "Title": "Test Game",
  "ConsoleId": 7,
  "ImageIconUrl": "https://media.example/Images/000001.png",
  "RichPresencePatch": "Level {0x0020}",
  "Sets": [
    {
      "AchievementSetId": 11,
      "Type": "core",
      "Achievements": [
        {"ID": 1, "Title": "First Steps", "Description": "Set 0x10", "Points": 5, "MemAddr": "0x0010=1", "BadgeName": "00001", "Flags": 3},
        {"ID": 2, "Title": "Already Had It", "Description": "Set 0x11", "Points": 10, "MemAddr": "0x0011=1", "BadgeName": "00002", "Flags": 3},
        {"ID": 3, "Title": "Challenge", "Description": "Hold 0x12, then 0x13", "Points": 25, "MemAddr": "0x0012=1_C:0x0013=1", "BadgeName": "00003", "Flags": 3},
        {"ID": 4, "Title": "Collector", "Description": "Collect 10", "Points": 10, "MemAddr": "M:0x0014/10", "BadgeName": "00004", "Flags": 3},
        {"ID": 5, "Title": "Broken", "Description": "Never works", "Points": 5, "MemAddr": "bad", "BadgeName": "00005", "Flags": 3},
        {"ID": 6, "Title": "Unofficial", "Description": "Set 0x15", "Points": 1, "MemAddr": "0x0015=1", "BadgeName": "00006", "Flags": 5}
      ],
      "Leaderboards": [
        {"ID": 100, "Title": "Speedrun", "Description": "Fastest", "Mem": "STA:0x0030=1|CAN:0x0031=1|SUB:0x0032=1|VAL:0x0033", "Format": "SCORE", "LowerIsBetter": false}
      ]
    }
  ]
}"#;

pub const OTHER_GAME_SETS: &str = r#"{
  "Success": true,
  "GameId": 5678,
  "Title": "Other Game",
  "ConsoleId": 7,
  "Sets": [
    {
      "AchievementSetId": 21,
      "Type": "core",
      "Achievements": [
        {"ID": 50, "Title": "Elsewhere", "Points": 5, "MemAddr": "0x0040=1", "BadgeName": "00050"}
      ]
    }
  ]
}"#;

pub const START_SESSION: &str =
    r#"{"Success":true,"Unlocks":[{"ID":2,"When":1700000000}],"HardcoreUnlocks":[]}"#;

pub const AWARD: &str = r#"{"Success":true,"Score":105,"SoftcoreScore":5}"#;

pub const SUBMIT_SCORE: &str = r#"{"Success":true,"Response":{"Score":42,"BestScore":50,"RankInfo":{"Rank":3,"NumEntries":10},"TopEntries":[{"User":"bob","Score":99,"Rank":1}]}}"#;

pub const OK: &str = r#"{"Success":true}"#;

// ---- transport ----

/// Canned responses keyed by the `r` parameter. Queued responses are used
/// first, then the standing one; with neither the request fails like an
/// unreachable host.
#[derive(Default)]
pub struct ScriptedTransport {
    queued: Mutex<HashMap<String, VecDeque<HttpResponse>>>,
    standing: Mutex<HashMap<String, HttpResponse>>,
    requests: Mutex<Vec<(String, String)>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Standard service for the fixture game.
    pub fn with_service() -> Arc<Self> {
        let transport = Self::new();
        transport.respond("login2", LOGIN);
        transport.respond("gameid", &format!(r#"{{"Success":true,"GameID":{GAME_ID}}}"#));
        transport.respond("achievementsets", GAME_SETS);
        transport.respond("startsession", START_SESSION);
        transport.respond("awardachievement", AWARD);
        transport.respond("submitlbentry", SUBMIT_SCORE);
        transport.respond("ping", OK);
        transport
    }

    pub fn respond(&self, api: &str, body: &str) {
        self.standing
            .lock()
            .insert(api.to_string(), HttpResponse::new(200, body));
    }

    pub fn respond_once(&self, api: &str, status: u16, body: &str) {
        self.queued
            .lock()
            .entry(api.to_string())
            .or_default()
            .push_back(HttpResponse::new(status, body));
    }

    /// Make `api` fail like an unreachable host until it is scripted again.
    pub fn fail(&self, api: &str) {
        self.standing.lock().remove(api);
    }

    /// Bodies of every request sent to `api`.
    pub fn bodies(&self, api: &str) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .filter(|(name, _)| name == api)
            .map(|(_, body)| body.clone())
            .collect()
    }

    pub fn count(&self, api: &str) -> usize {
        self.bodies(api).len()
    }
}

fn api_name(body: &str) -> String {
    body.split('&')
        .find_map(|pair| pair.strip_prefix("r="))
        .unwrap_or_default()
        .to_string()
}

impl Transport for ScriptedTransport {
    fn perform(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let body = request.body.clone().unwrap_or_default();
        let api = api_name(&body);
        self.requests.lock().push((api.clone(), body));

        if let Some(response) = self.queued.lock().get_mut(&api).and_then(VecDeque::pop_front) {
            return Ok(response);
        }
        Ok(self
            .standing
            .lock()
            .get(&api)
            .cloned()
            .unwrap_or_else(|| HttpResponse::new(0, "")))
    }
}

// ---- executor ----

/// Holds tasks until the test runs them.
#[derive(Default)]
pub struct QueueExecutor {
    tasks: Mutex<VecDeque<(String, Task)>>,
}

impl QueueExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn pending(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Run the oldest task, returning its name.
    pub fn run_next(&self) -> Option<String> {
        let (name, task) = self.tasks.lock().pop_front()?;
        task();
        Some(name)
    }

    /// Run tasks (including ones spawned meanwhile) until none are left.
    pub fn run_all(&self) -> usize {
        let mut count = 0;
        while self.run_next().is_some() {
            count += 1;
        }
        count
    }
}

impl Executor for QueueExecutor {
    fn spawn(&self, name: &str, task: Task) {
        self.tasks.lock().push_back((name.to_string(), task));
    }
}

// ---- trigger engine ----

#[derive(Debug, Clone, Copy)]
enum Condition {
    Equals { address: u32, value: u8 },
    Measured { address: u32, target: u32 },
}

impl Condition {
    fn parse(text: &str) -> Option<Self> {
        if let Some(rest) = text.strip_prefix("M:") {
            let (address, target) = rest.split_once('/')?;
            return Some(Condition::Measured {
                address: parse_address(address)?,
                target: target.parse().ok()?,
            });
        }
        let (address, value) = text.split_once('=')?;
        Some(Condition::Equals {
            address: parse_address(address)?,
            value: value.parse().ok()?,
        })
    }

    fn holds(&self, memory: &MemoryReader<'_>) -> bool {
        match *self {
            Condition::Equals { address, value } => memory.read_u8(address) == value,
            Condition::Measured { address, target } => memory.read_u8(address) as u32 >= target,
        }
    }
}

fn parse_address(text: &str) -> Option<u32> {
    u32::from_str_radix(text.strip_prefix("0x")?, 16).ok()
}

struct Trigger {
    core: Vec<Condition>,
    challenge: Vec<Condition>,
}

fn parse_trigger(definition: &str) -> Option<Trigger> {
    let mut trigger = Trigger {
        core: Vec::new(),
        challenge: Vec::new(),
    };
    for part in definition.split('_') {
        match part.strip_prefix("C:") {
            Some(rest) => trigger.challenge.push(Condition::parse(rest)?),
            None => trigger.core.push(Condition::parse(part)?),
        }
    }
    Some(trigger)
}

struct LeaderboardDef {
    start: Condition,
    cancel: Condition,
    submit: Condition,
    value: u32,
}

fn parse_leaderboard(definition: &str) -> Option<LeaderboardDef> {
    let mut parts = HashMap::new();
    for part in definition.split('|') {
        let (key, rest) = part.split_once(':')?;
        parts.insert(key, rest);
    }
    Some(LeaderboardDef {
        start: Condition::parse(parts.get("STA")?)?,
        cancel: Condition::parse(parts.get("CAN")?)?,
        submit: Condition::parse(parts.get("SUB")?)?,
        value: parse_address(parts.get("VAL")?)?,
    })
}

const LB_IDLE: u8 = 0;
const LB_STARTED: u8 = 1;
const LB_FINISHED: u8 = 2;

#[derive(Debug, Default)]
pub struct FixtureEngine;

impl TriggerEngine for FixtureEngine {
    fn validate_trigger(&self, definition: &str) -> std::result::Result<(), ErrorCode> {
        parse_trigger(definition)
            .map(|_| ())
            .ok_or(ErrorCode::InvalidMemoryOperand)
    }

    fn evaluate_trigger(
        &self,
        definition: &str,
        memo: &mut TriggerMemo,
        memory: &MemoryReader<'_>,
    ) -> TriggerOutcome {
        let Some(trigger) = parse_trigger(definition) else {
            return TriggerOutcome::status(TriggerStatus::Disabled);
        };
        // evaluation count, so captured memos are never empty
        let frames = memo.0.first().copied().unwrap_or(0).saturating_add(1);
        memo.0 = vec![frames];

        let measured = trigger.core.iter().find_map(|c| match *c {
            Condition::Measured { address, target } => Some(Measured {
                value: memory.read_u8(address) as u32,
                target,
            }),
            _ => None,
        });
        let core = trigger.core.iter().all(|c| c.holds(memory));
        let challenge = trigger.challenge.iter().all(|c| c.holds(memory));
        let status = match (core, challenge) {
            (true, true) => TriggerStatus::Triggered,
            (true, false) => TriggerStatus::Primed,
            _ => TriggerStatus::Active,
        };
        TriggerOutcome { status, measured }
    }

    fn validate_leaderboard(&self, definition: &str) -> std::result::Result<(), ErrorCode> {
        parse_leaderboard(definition)
            .map(|_| ())
            .ok_or(ErrorCode::MissingStart)
    }

    fn evaluate_leaderboard(
        &self,
        definition: &str,
        memo: &mut TriggerMemo,
        memory: &MemoryReader<'_>,
    ) -> LeaderboardOutcome {
        let Some(def) = parse_leaderboard(definition) else {
            return LeaderboardOutcome {
                status: LeaderboardStatus::Disabled,
                value: 0,
            };
        };
        let value = memory.read_u8(def.value) as i32;
        let phase = memo.0.first().copied().unwrap_or(LB_IDLE);
        let (next, status) = match phase {
            LB_STARTED if def.cancel.holds(memory) => (LB_FINISHED, LeaderboardStatus::Canceled),
            LB_STARTED if def.submit.holds(memory) => (LB_FINISHED, LeaderboardStatus::Triggered),
            LB_STARTED => (LB_STARTED, LeaderboardStatus::Started),
            LB_FINISHED if def.start.holds(memory) => (LB_FINISHED, LeaderboardStatus::Active),
            _ if def.start.holds(memory) => (LB_STARTED, LeaderboardStatus::Started),
            _ => (LB_IDLE, LeaderboardStatus::Active),
        };
        memo.0 = vec![next];
        LeaderboardOutcome { status, value }
    }

    fn validate_rich_presence(&self, script: &str) -> std::result::Result<(), ErrorCode> {
        if script.is_empty() {
            Err(ErrorCode::MissingDisplayString)
        } else {
            Ok(())
        }
    }

    fn evaluate_rich_presence(
        &self,
        script: &str,
        _memo: &mut TriggerMemo,
        memory: &MemoryReader<'_>,
    ) -> String {
        let mut out = String::new();
        let mut rest = script;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let Some(close) = rest[open..].find('}') else {
                break;
            };
            let token = &rest[open + 1..open + close];
            match parse_address(token) {
                Some(address) => out.push_str(&memory.read_u8(address).to_string()),
                None => out.push_str(token),
            }
            rest = &rest[open + close + 1..];
        }
        out.push_str(rest);
        out
    }
}

// ---- hasher ----

/// Hashes byte sources to their UTF-8 text and paths to their file stem.
pub fn fixture_hasher() -> Arc<dyn ContentHasher> {
    Arc::new(|_console: ConsoleId, source: &MediaSource| -> Result<GameHash> {
        let text = match source {
            MediaSource::Bytes(data) => String::from_utf8_lossy(data).into_owned(),
            MediaSource::Path(path) => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        GameHash::new(text).map_err(|e| Error::InvalidSource(e.to_string()))
    })
}

// ---- listener ----

/// Collects delivered events.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Recorder {
    pub fn listener(&self) -> impl FnMut(Event) + Send + 'static {
        let events = Arc::clone(&self.events);
        move |event| events.lock().push(event)
    }

    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.take().iter().map(Event::name).collect()
    }

    pub fn snapshot(&self) -> Vec<Event> {
        self.events.lock().clone()
    }
}

// ---- memory ----

pub const RAM_SIZE: usize = 0x100;

pub fn ram() -> Vec<u8> {
    vec![0; RAM_SIZE]
}

// ---- assembled client ----

pub struct Harness {
    pub client: Client,
    pub transport: Arc<ScriptedTransport>,
    pub executor: Arc<QueueExecutor>,
    pub events: Recorder,
}

impl Harness {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, ScriptedTransport::with_service())
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<ScriptedTransport>) -> Self {
        let executor = QueueExecutor::new();
        let events = Recorder::default();
        let client = Client::builder()
            .config(config)
            .transport(transport.clone())
            .executor(executor.clone())
            .engine(Arc::new(FixtureEngine))
            .hasher(fixture_hasher())
            .listener(events.listener())
            .build()
            .expect("client");
        Self {
            client,
            transport,
            executor,
            events,
        }
    }

    pub fn softcore() -> Self {
        Self::new(ClientConfig::builder().build())
    }

    pub fn hardcore() -> Self {
        Self::new(ClientConfig::builder().hardcore(true).build())
    }

    pub fn login(&self) {
        let handle = self
            .client
            .login("alice", cheevos::Credential::Password("pw".into()))
            .expect("login accepted");
        self.executor.run_all();
        handle.wait().expect("login succeeds");
    }

    /// Log in and load the fixture game, then forget the events so far.
    pub fn loaded(self) -> Self {
        self.login();
        let handle = self
            .client
            .load_game(MediaSource::bytes(b"game-one".to_vec()), ConsoleId::Nintendo)
            .expect("load accepted");
        self.executor.run_all();
        handle.wait().expect("load succeeds");
        self.events.take();
        self
    }

    /// One frame, then run whatever network work it started.
    pub fn frame(&self, memory: &[u8]) {
        self.client.do_frame(&memory);
        self.executor.run_all();
    }

    pub fn count(&self, name: &str) -> usize {
        self.events
            .snapshot()
            .iter()
            .filter(|e| e.name() == name)
            .count()
    }
}
