//! Read-only fetches. These do not take the operation slot and may run
//! alongside a login, load or media change.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use super::Client;
use crate::api::{
    self, API_ALL_PROGRESS, API_HASH_LIBRARY, AllProgressResponse, ApiRequest,
    HashLibraryResponse,
};
use crate::console::ConsoleId;
use crate::error::Result;
use crate::model::{HashEntry, UserProgressEntry};
use crate::operation::{self, AsyncHandle};

impl Client {
    /// Unlock counts for every game of `console` the user has played.
    pub fn fetch_all_user_progress(
        &self,
        console: ConsoleId,
    ) -> Result<AsyncHandle<Vec<UserProgressEntry>>> {
        let credentials = self.shared.session.lock().credentials()?;
        let request = ApiRequest::new(API_ALL_PROGRESS)
            .auth(&credentials)
            .param("c", console.id());
        Ok(self.fetch(request, AllProgressResponse::into_entries))
    }

    /// Every known content hash for `console` and the game it maps to.
    pub fn fetch_hash_library(&self, console: ConsoleId) -> Result<AsyncHandle<Vec<HashEntry>>> {
        let request = ApiRequest::new(API_HASH_LIBRARY).param("c", console.id());
        Ok(self.fetch(request, HashLibraryResponse::into_entries))
    }

    fn fetch<R, T>(&self, request: ApiRequest, convert: fn(R) -> T) -> AsyncHandle<T>
    where
        R: DeserializeOwned + 'static,
        T: Send + 'static,
    {
        let (handle, completer) = operation::pair();
        let shared = Arc::clone(&self.shared);
        self.shared.executor.spawn(
            request.api,
            Box::new(move || {
                let result =
                    api::call::<R>(shared.transport.as_ref(), &shared.config, &request).map(convert);
                if !completer.resolve(|| result) {
                    debug!(api = request.api, "fetch cancelled");
                }
            }),
        );
        handle
    }
}
