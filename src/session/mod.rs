//! Registry of named sessions.
//!
//! Each alias maps to one [`Session`]: a base URL, a default header map, the
//! transport options and the connection issued by the [`Transport`]. Header
//! replacement rebinds the connection outside the lock and swaps the whole
//! entry in, so readers observe either the old or the new session.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use http::HeaderMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{
    BasicAuth, Connection, SessionOptions, SessionProfile, Transport, TransportError,
};

/// What `create` does when the alias is already registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasPolicy {
    /// Replace the existing session.
    #[default]
    Overwrite,
    /// Refuse with [`SessionError::DuplicateAlias`].
    Reject,
}

#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("session '{0}' not found")]
    NotFound(String),
    #[error("session alias '{0}' already exists")]
    DuplicateAlias(String),
    #[error(transparent)]
    Bind(#[from] TransportError),
}

/// A live session binding.
pub struct Session {
    alias: String,
    base_url: String,
    headers: HeaderMap,
    options: SessionOptions,
    connection: Arc<dyn Connection>,
}

impl Session {
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    pub fn cookies(&self) -> HashMap<String, String> {
        self.connection.cookies()
    }

    fn profile(&self) -> SessionProfile {
        SessionProfile {
            alias: self.alias.clone(),
            base_url: self.base_url.clone(),
            headers: self.headers.clone(),
            options: self.options.clone(),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("alias", &self.alias)
            .field("base_url", &self.base_url)
            .field("headers", &self.headers)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Snapshot of a session as currently bound.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionDetails {
    pub alias: String,
    pub url: String,
    pub headers: HeaderMap,
    pub cookies: HashMap<String, String>,
    pub timeout: Option<Duration>,
    pub proxy: Option<String>,
    pub verify: bool,
    pub auth: Option<BasicAuth>,
}

/// Owned registry of sessions; one instance per relay.
pub struct SessionStore {
    transport: Arc<dyn Transport>,
    policy: AliasPolicy,
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionStore {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            policy: AliasPolicy::default(),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_policy(mut self, policy: AliasPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> AliasPolicy {
        self.policy
    }

    /// Registers a session and issues its transport binding.
    pub fn create(
        &self,
        alias: impl Into<String>,
        base_url: impl Into<String>,
        headers: HeaderMap,
        options: SessionOptions,
    ) -> Result<String, SessionError> {
        let alias = alias.into();
        if self.policy == AliasPolicy::Reject && self.exists(&alias) {
            return Err(SessionError::DuplicateAlias(alias));
        }

        let profile = SessionProfile {
            alias: alias.clone(),
            base_url: base_url.into(),
            headers,
            options,
        };
        let session = self.bind(profile)?;

        let mut sessions = self.write();
        if self.policy == AliasPolicy::Reject && sessions.contains_key(&alias) {
            return Err(SessionError::DuplicateAlias(alias));
        }
        if sessions.insert(alias.clone(), session).is_some() {
            debug!("Session '{alias}' replaced");
        }
        info!("Created session '{alias}'");
        Ok(alias)
    }

    /// Creates a session under a generated `session_<8 hex>` alias.
    pub fn create_random(
        &self,
        base_url: impl Into<String>,
        headers: HeaderMap,
        options: SessionOptions,
    ) -> Result<String, SessionError> {
        let alias = loop {
            let candidate = format!("session_{}", short_id());
            if !self.exists(&candidate) {
                break candidate;
            }
        };
        self.create(alias, base_url, headers, options)
    }

    pub fn delete(&self, alias: &str) -> bool {
        let removed = self.write().remove(alias).is_some();
        if removed {
            info!("Deleted session '{alias}'");
        } else {
            warn!("Session '{alias}' not found");
        }
        removed
    }

    pub fn delete_all(&self) {
        let mut sessions = self.write();
        let count = sessions.len();
        sessions.clear();
        info!("Deleted all sessions ({count})");
    }

    /// Replaces the header map of a session and rebinds it.
    ///
    /// Returns `false` when the alias is unknown; no session is created.
    pub fn update_headers(&self, alias: &str, headers: HeaderMap) -> bool {
        match self.replace_headers(alias, headers) {
            Ok(()) => true,
            Err(err) => {
                warn!("Failed to update headers: {err}");
                false
            }
        }
    }

    pub fn replace_headers(&self, alias: &str, headers: HeaderMap) -> Result<(), SessionError> {
        let current = self
            .get(alias)
            .ok_or_else(|| SessionError::NotFound(alias.to_string()))?;
        let mut profile = current.profile();
        profile.headers = headers;
        self.swap(alias, profile)
    }

    /// Overlays `headers` on top of the session's current headers and rebinds.
    pub fn merge_headers(&self, alias: &str, headers: HeaderMap) -> Result<(), SessionError> {
        let current = self
            .get(alias)
            .ok_or_else(|| SessionError::NotFound(alias.to_string()))?;
        let mut profile = current.profile();
        for (name, value) in headers.iter() {
            profile.headers.insert(name.clone(), value.clone());
        }
        self.swap(alias, profile)
    }

    pub fn details(&self, alias: &str) -> Option<SessionDetails> {
        let session = self.get(alias)?;
        Some(SessionDetails {
            alias: session.alias.clone(),
            url: session.base_url.clone(),
            headers: session.headers.clone(),
            cookies: session.cookies(),
            timeout: session.options.timeout,
            proxy: session.options.proxy.clone(),
            verify: session.options.verify,
            auth: session.options.auth.clone(),
        })
    }

    pub fn exists(&self, alias: &str) -> bool {
        self.read().contains_key(alias)
    }

    pub fn url(&self, alias: &str) -> Option<String> {
        self.get(alias).map(|session| session.base_url.clone())
    }

    pub fn headers(&self, alias: &str) -> Option<HeaderMap> {
        self.get(alias).map(|session| session.headers.clone())
    }

    pub fn get(&self, alias: &str) -> Option<Arc<Session>> {
        self.read().get(alias).cloned()
    }

    pub fn aliases(&self) -> Vec<String> {
        let mut aliases: Vec<String> = self.read().keys().cloned().collect();
        aliases.sort();
        aliases
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn bind(&self, profile: SessionProfile) -> Result<Arc<Session>, SessionError> {
        let connection = self.transport.bind(&profile)?;
        Ok(Arc::new(Session {
            alias: profile.alias,
            base_url: profile.base_url,
            headers: profile.headers,
            options: profile.options,
            connection,
        }))
    }

    fn swap(&self, alias: &str, profile: SessionProfile) -> Result<(), SessionError> {
        let session = self.bind(profile)?;
        let mut sessions = self.write();
        match sessions.get_mut(alias) {
            Some(slot) => {
                *slot = session;
                debug!("Rebound session '{alias}' with new headers");
                Ok(())
            }
            None => Err(SessionError::NotFound(alias.to_string())),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<Session>>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<Session>>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("policy", &self.policy)
            .field("aliases", &self.aliases())
            .finish_non_exhaustive()
    }
}

/// Eight lowercase hex characters.
pub(crate) fn short_id() -> String {
    format!("{:08x}", rand::random::<u32>())
}
