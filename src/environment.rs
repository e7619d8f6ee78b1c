use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::Logger;
use uuid::Uuid;

use crate::db::Db;
use crate::errors::BackendError;
use crate::session::Sessions;
use crate::urls::Urls;
use crate::user::Owner;

pub type SafeDb = dyn Db + Send + Sync;

#[derive(Clone)]
pub struct Environment {
    pub logger: Arc<Logger>,
    pub db: Arc<SafeDb>,
    pub sessions: Arc<Sessions>,
    pub urls: Arc<Urls>,
    pub config: Arc<Config>,
}

impl Environment {
    pub fn new(
        logger: Arc<Logger>,
        db: Arc<SafeDb>,
        sessions: Arc<Sessions>,
        urls: Arc<Urls>,
        config: Config,
    ) -> Self {
        Self {
            logger,
            db,
            sessions,
            urls,
            config: Arc::new(config),
        }
    }

    /// Returns the username behind a session cookie, if it names a live
    /// session.
    pub async fn current_user(&self, session: Option<&str>) -> Option<String> {
        let id = session.and_then(|s| Uuid::parse_str(s.trim()).ok())?;

        self.sessions.resolve(&id).await
    }

    /// Decides whose records a request may touch. Page and API routes
    /// both go through here.
    pub async fn authenticate(&self, session: Option<&str>) -> Result<Owner, BackendError> {
        match self.current_user(session).await {
            Some(username) => Ok(Owner::user(username)),
            None if self.config.require_login => Err(BackendError::Unauthenticated),
            None => Ok(Owner::anonymous()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Whether records may only be accessed after logging in.
    pub(crate) require_login: bool,

    /// The directory holding the HTML pages and the `static` assets.
    pub(crate) public_dir: PathBuf,
}

impl Config {
    pub fn new(require_login: bool, public_dir: impl Into<PathBuf>) -> Self {
        Self {
            require_login,
            public_dir: public_dir.into(),
        }
    }

    pub fn require_login(&self) -> bool {
        self.require_login
    }

    pub fn public_dir(&self) -> &Path {
        &self.public_dir
    }
}
