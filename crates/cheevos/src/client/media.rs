use std::sync::Arc;

use tracing::info;

use super::load::GameData;
use super::{Client, Shared};
use crate::api::{self, API_GAME_ID, ApiRequest, Credentials, GameIdResponse};
use crate::config::LogLevel;
use crate::error::{Error, Result};
use crate::hash::MediaSource;
use crate::model::GameInfo;
use crate::operation::{self, AsyncHandle, Completer};
use crate::session::{LoadState, OpKind};
use crate::text::GameHash;

/// What a media change turned out to be.
enum MediaChange {
    /// Same content as the loaded media.
    Unchanged,
    /// Another disc of the loaded game.
    SameGame(GameHash),
    /// Content the service does not know.
    Unknown(GameHash),
    /// A different game entirely.
    OtherGame(GameData),
}

impl Client {
    /// Swap the media of the loaded game (multi-disc titles).
    ///
    /// Unrecognized media in hardcore mode disables hardcore and resolves
    /// with [`Error::HardcoreDisabled`]; the loaded game stays loaded.
    pub fn change_media(&self, source: MediaSource) -> Result<AsyncHandle<GameInfo>> {
        source.validate()?;
        let engine = self.shared.engine()?;
        self.shared.hasher()?;

        let (token, credentials, current) = self.shared.with_session(|session| {
            if session.load_state != LoadState::Loaded {
                return Err(Error::NoGameLoaded);
            }
            let credentials = session.credentials()?;
            let current = session.game.clone().ok_or(Error::NoGameLoaded)?;
            let token = session.begin_op(OpKind::ChangeMedia)?;
            Ok((token, credentials, current))
        })?;

        let (handle, completer) = operation::pair();
        let cancel = Arc::clone(&self.shared);
        completer.on_cancel(move || cancel.with_session(|session| session.abandon_op(token)));

        let shared = Arc::clone(&self.shared);
        self.shared.executor.spawn(
            "change-media",
            Box::new(move || {
                let change = shared.identify_media(&credentials, &current, &source, &completer);
                shared.complete(completer, |session| {
                    if !session.finish_op(token) {
                        return Err(Error::Aborted);
                    }
                    let change = change.inspect_err(|e| {
                        session.log(LogLevel::Error, format!("Media change failed: {e}"));
                    })?;
                    let no_game = || Error::NoGameLoaded;
                    match change {
                        MediaChange::Unchanged => session.game.clone().ok_or_else(no_game),
                        MediaChange::SameGame(hash) => {
                            session.log(LogLevel::Info, format!("Switched media to {hash}"));
                            session.update_hash(hash).ok_or_else(no_game)
                        }
                        MediaChange::Unknown(hash) if session.modes.hardcore => {
                            session.log(
                                LogLevel::Warning,
                                format!("Unrecognized media {hash}, disabling hardcore"),
                            );
                            session.set_hardcore(false);
                            Err(Error::HardcoreDisabled(format!(
                                "unrecognized media {hash} is not allowed in hardcore"
                            )))
                        }
                        MediaChange::Unknown(hash) => {
                            session.log(LogLevel::Info, format!("Unrecognized media {hash}"));
                            session.game.clone().ok_or_else(no_game)
                        }
                        MediaChange::OtherGame(data) => {
                            let console = current.console_id;
                            let staged = data.stage(session, console, engine.as_ref());
                            Ok(session.swap_media_game(staged))
                        }
                    }
                });
            }),
        );
        Ok(handle)
    }
}

impl Shared {
    fn identify_media(
        &self,
        credentials: &Credentials,
        current: &GameInfo,
        source: &MediaSource,
        completer: &Completer<GameInfo>,
    ) -> Result<MediaChange> {
        let hash = self.hasher()?.hash(current.console_id, source)?;
        if hash == current.hash {
            return Ok(MediaChange::Unchanged);
        }
        info!(%hash, game = current.id, "identifying new media");

        let identified: GameIdResponse = api::call(
            self.transport.as_ref(),
            &self.config,
            &ApiRequest::new(API_GAME_ID).param("m", &hash),
        )?;
        match identified.game_id {
            0 => Ok(MediaChange::Unknown(hash)),
            id if id == current.id => Ok(MediaChange::SameGame(hash)),
            id => {
                if completer.is_cancelled() {
                    return Err(Error::Aborted);
                }
                let data = self.fetch_game_data(credentials, id, hash, None)?;
                Ok(MediaChange::OtherGame(data))
            }
        }
    }
}
