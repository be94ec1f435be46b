//! Public runtime client.
//!
//! [`Client`] is a cheap handle over shared state: the session behind one
//! mutex, the event dispatcher and the host supplied capabilities. Every
//! mutation, whether from [`Client::do_frame`] or from a network completion
//! on an executor thread, goes through [`Shared::with_session`], which
//! queues the produced events before unlocking and delivers them after.

mod fetch;
mod load;
mod login;
mod media;
mod query;
mod submit;

pub use login::Credential;

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::eval::TriggerEngine;
use crate::event::{Dispatcher, EventListener};
use crate::executor::{Executor, ThreadExecutor};
use crate::frame;
use crate::hash::ContentHasher;
use crate::memory::ReadMemory;
use crate::operation::Completer;
use crate::session::{Mode, Modes, Session};
use crate::transport::Transport;

pub(crate) struct Shared {
    session: Mutex<Session>,
    dispatcher: Dispatcher,
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
    executor: Arc<dyn Executor>,
    engine: Option<Arc<dyn TriggerEngine>>,
    hasher: Option<Arc<dyn ContentHasher>>,
}

impl Shared {
    /// Mutate the session, then deliver the events the mutation produced.
    pub(crate) fn with_session<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let result = {
            let mut session = self.session.lock();
            let result = f(&mut session);
            self.dispatcher.enqueue(session.take_events());
            result
        };
        self.dispatcher.flush();
        result
    }

    /// Resolve `completer` with `apply` run under the session lock, unless
    /// the handle was cancelled first.
    pub(crate) fn complete<T>(
        &self,
        completer: Completer<T>,
        apply: impl FnOnce(&mut Session) -> Result<T>,
    ) {
        let applied = self.with_session(|session| completer.resolve(|| apply(session)));
        if !applied {
            debug!("operation cancelled before completion");
        }
    }

    pub(crate) fn engine(&self) -> Result<Arc<dyn TriggerEngine>> {
        self.engine
            .clone()
            .ok_or_else(|| Error::Config("no trigger engine configured".to_string()))
    }

    pub(crate) fn hasher(&self) -> Result<Arc<dyn ContentHasher>> {
        self.hasher
            .clone()
            .ok_or_else(|| Error::Config("no content hasher configured".to_string()))
    }
}

/// Achievement runtime client.
///
/// Cloning is cheap; clones share one session.
///
/// ```no_run
/// use cheevos::{Client, ConsoleId, Credential, MediaSource};
/// # fn engine() -> std::sync::Arc<dyn cheevos::TriggerEngine> { unimplemented!() }
/// # fn hasher() -> std::sync::Arc<dyn cheevos::ContentHasher> { unimplemented!() }
///
/// let client = Client::builder()
///     .engine(engine())
///     .hasher(hasher())
///     .listener(|event: cheevos::Event| println!("{}", event.name()))
///     .build()?;
///
/// client.login("alice", Credential::Password("hunter2".into()))?.wait()?;
/// let game = client
///     .load_game(MediaSource::path("roms/game.nes"), ConsoleId::Nintendo)?
///     .wait()?;
/// println!("playing {}", game.title);
///
/// let ram = vec![0u8; 0x800];
/// client.do_frame(&ram);
/// # Ok::<(), cheevos::Error>(())
/// ```
#[derive(Clone)]
pub struct Client {
    shared: Arc<Shared>,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    /// Replace the event listener. Events produced while no listener is
    /// set are dropped.
    pub fn set_listener(&self, listener: impl EventListener + 'static) {
        self.shared.dispatcher.set_listener(Some(Box::new(listener)));
    }

    pub fn clear_listener(&self) {
        self.shared.dispatcher.set_listener(None);
    }

    /// Evaluate one emulated frame against `memory`.
    ///
    /// Call once per frame from the emulation thread. Never fails; a reset
    /// request pauses evaluation until [`Client::reset`].
    pub fn do_frame(&self, memory: &dyn ReadMemory) {
        let Some(engine) = self.shared.engine.as_deref() else {
            self.idle();
            return;
        };
        let jobs = self
            .shared
            .with_session(|session| frame::do_frame(session, engine, memory));
        self.shared.spawn_jobs(jobs);
    }

    /// Periodic work while emulation is paused (retries, pings).
    pub fn idle(&self) {
        let jobs = self.shared.with_session(frame::idle);
        self.shared.spawn_jobs(jobs);
    }

    /// The emulator was reset: hide indicators and trackers, re-arm every
    /// trigger and clear a pending reset request.
    pub fn reset(&self) {
        self.shared.with_session(Session::reset);
    }

    /// Acknowledge a [`Event::ResetRequested`](crate::Event::ResetRequested)
    /// after resetting the emulator.
    pub fn acknowledge_reset(&self) {
        self.reset();
    }

    /// Discard the loaded game, or abort a load in progress.
    pub fn unload_game(&self) -> Result<()> {
        self.shared.with_session(Session::unload_game)
    }

    /// Toggle a mode. Hardcore changes on a loaded game request a reset;
    /// encore and unofficial apply from the next load.
    pub fn set_mode(&self, mode: Mode, enabled: bool) {
        self.shared
            .with_session(|session| session.set_mode(mode, enabled));
    }

    pub fn modes(&self) -> Modes {
        self.shared.session.lock().modes
    }

    /// Hardcore pause throttle: `(allowed, frames until the next pause)`.
    pub fn can_pause(&self) -> (bool, u32) {
        self.shared.with_session(Session::can_pause)
    }

    /// Exact size of the blob [`Client::capture_state`] returns.
    pub fn progress_size(&self) -> usize {
        self.shared.session.lock().progress_size()
    }

    /// Serialize runtime progress for a save state.
    pub fn capture_state(&self) -> Result<Vec<u8>> {
        self.shared.session.lock().capture_progress()
    }

    /// Restore runtime progress from [`Client::capture_state`] output.
    ///
    /// All or nothing: on error the session is unchanged.
    pub fn restore_state(&self, data: &[u8]) -> Result<()> {
        self.shared
            .with_session(|session| session.restore_progress(data))
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.shared.session.lock();
        f.debug_struct("Client")
            .field("load_state", &session.load_state)
            .field("modes", &session.modes)
            .field("user", &session.user.as_ref().map(|u| &u.username))
            .finish()
    }
}

/// Builder for [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    config: Option<ClientConfig>,
    transport: Option<Arc<dyn Transport>>,
    executor: Option<Arc<dyn Executor>>,
    engine: Option<Arc<dyn TriggerEngine>>,
    hasher: Option<Arc<dyn ContentHasher>>,
    listener: Option<Box<dyn EventListener>>,
}

impl ClientBuilder {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// HTTP capability. Defaults to the bundled `ureq` transport when the
    /// `http` feature is enabled.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Where network work runs. Defaults to [`ThreadExecutor`].
    pub fn executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn engine(mut self, engine: Arc<dyn TriggerEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn hasher(mut self, hasher: Arc<dyn ContentHasher>) -> Self {
        self.hasher = Some(hasher);
        self
    }

    pub fn listener(mut self, listener: impl EventListener + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn build(self) -> Result<Client> {
        let config = Arc::new(self.config.unwrap_or_default());
        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport()?,
        };
        let dispatcher = Dispatcher::default();
        dispatcher.set_listener(self.listener);

        Ok(Client {
            shared: Arc::new(Shared {
                session: Mutex::new(Session::new(Arc::clone(&config))),
                dispatcher,
                config,
                transport,
                executor: self.executor.unwrap_or_else(|| Arc::new(ThreadExecutor)),
                engine: self.engine,
                hasher: self.hasher,
            }),
        })
    }
}

#[cfg(feature = "http")]
fn default_transport() -> Result<Arc<dyn Transport>> {
    Ok(Arc::new(crate::transport::UreqTransport::default()))
}

#[cfg(not(feature = "http"))]
fn default_transport() -> Result<Arc<dyn Transport>> {
    Err(Error::Config(
        "no transport configured (enable the `http` feature for the default)".to_string(),
    ))
}
