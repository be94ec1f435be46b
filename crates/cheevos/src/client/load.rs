use std::sync::Arc;

use tracing::info;

use super::{Client, Shared};
use crate::api::{
    self, API_ACHIEVEMENT_SETS, API_GAME_ID, API_START_SESSION, ApiRequest, Credentials,
    GameIdResponse, GameSetsResponse, StartSessionResponse,
};
use crate::console::ConsoleId;
use crate::error::{Error, Result};
use crate::eval::TriggerEngine;
use crate::hash::MediaSource;
use crate::model::{GameInfo, LoadGameState};
use crate::operation::{self, AsyncHandle, Completer};
use crate::session::{Session, StageOptions, StagedGame, stage_game};
use crate::text::GameHash;

/// Service data for one game, fetched but not yet staged.
pub(super) struct GameData {
    pub hash: GameHash,
    pub sets: GameSetsResponse,
    pub unlocks: StartSessionResponse,
}

impl GameData {
    /// Build session tables using the session's current modes.
    pub fn stage(
        self,
        session: &Session,
        console: ConsoleId,
        engine: &dyn TriggerEngine,
    ) -> StagedGame {
        let options = StageOptions {
            media_host: &session.config.media_host,
            hardcore: session.modes.hardcore,
            encore: session.modes.encore,
            unofficial: session.modes.unofficial,
        };
        stage_game(self.sets, &self.unlocks, self.hash, console, engine, options)
    }
}

impl Client {
    /// Identify `source`, fetch its achievement sets and start a session.
    ///
    /// Fails immediately with [`Error::NotLoggedIn`], [`Error::Busy`] (a
    /// load or media change is in flight), [`Error::InvalidState`] (a game
    /// is already loaded) or [`Error::InvalidSource`].
    pub fn load_game(
        &self,
        source: MediaSource,
        console: ConsoleId,
    ) -> Result<AsyncHandle<GameInfo>> {
        source.validate()?;
        let engine = self.shared.engine()?;
        self.shared.hasher()?;

        let (token, credentials) = self.shared.with_session(|session| {
            let credentials = session.credentials()?;
            let token = session.begin_load()?;
            Ok::<_, Error>((token, credentials))
        })?;

        let (handle, completer) = operation::pair();
        let cancel = Arc::clone(&self.shared);
        completer.on_cancel(move || cancel.with_session(|session| session.abandon_op(token)));

        let shared = Arc::clone(&self.shared);
        self.shared.executor.spawn(
            "load",
            Box::new(move || {
                let fetched = shared.fetch_game(token, &credentials, &source, console, &completer);
                shared.complete(completer, |session| {
                    if !session.is_current(token) {
                        return Err(Error::Aborted);
                    }
                    let result = fetched.map(|data| {
                        let staged = data.stage(session, console, engine.as_ref());
                        session.commit_game(staged)
                    });
                    if let Err(e) = &result {
                        session.fail_load(e);
                    }
                    session.finish_op(token);
                    result
                });
            }),
        );
        Ok(handle)
    }
}

impl Shared {
    fn fetch_game(
        &self,
        token: u64,
        credentials: &Credentials,
        source: &MediaSource,
        console: ConsoleId,
        completer: &Completer<GameInfo>,
    ) -> Result<GameData> {
        let hash = self.hasher()?.hash(console, source)?;
        info!(%hash, %console, "identifying game");

        let identified: GameIdResponse = api::call(
            self.transport.as_ref(),
            &self.config,
            &ApiRequest::new(API_GAME_ID).param("m", &hash),
        )?;
        if identified.game_id == 0 {
            return Err(Error::UnknownGame {
                hash: hash.to_string(),
            });
        }

        self.advance(token, completer, LoadGameState::FetchingGameData)?;
        self.fetch_game_data(credentials, identified.game_id, hash, Some((token, completer)))
    }

    /// Achievement sets and session start for `game_id`. With `progress`,
    /// the load state is advanced between the two calls.
    pub(super) fn fetch_game_data(
        &self,
        credentials: &Credentials,
        game_id: u32,
        hash: GameHash,
        progress: Option<(u64, &Completer<GameInfo>)>,
    ) -> Result<GameData> {
        let sets: GameSetsResponse = api::call(
            self.transport.as_ref(),
            &self.config,
            &ApiRequest::new(API_ACHIEVEMENT_SETS)
                .auth(credentials)
                .param("g", game_id),
        )?;

        if let Some((token, completer)) = progress {
            self.advance(token, completer, LoadGameState::StartingSession)?;
        }

        let hardcore = self.with_session(|session| session.modes.hardcore);
        let unlocks: StartSessionResponse = api::call(
            self.transport.as_ref(),
            &self.config,
            &ApiRequest::new(API_START_SESSION)
                .auth(credentials)
                .param("g", game_id)
                .param("h", u8::from(hardcore))
                .param("m", &hash),
        )?;

        Ok(GameData {
            hash,
            sets,
            unlocks,
        })
    }

    /// Move the visible load progress forward, or stop if the load was
    /// cancelled or superseded meanwhile.
    fn advance(
        &self,
        token: u64,
        completer: &Completer<GameInfo>,
        progress: LoadGameState,
    ) -> Result<()> {
        if completer.is_cancelled() {
            return Err(Error::Aborted);
        }
        if self.with_session(|session| session.advance_load(token, progress)) {
            Ok(())
        } else {
            Err(Error::Aborted)
        }
    }
}
