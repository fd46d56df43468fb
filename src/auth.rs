//! Identity of the person using the tracker
//!
//! Sign-in is delegated to an [`AuthProvider`]. The bundled [`LocalAuth`]
//! keeps the signed-in profile in `session.json`; there are no passwords.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::session::Session;
use crate::error::{Result, TrackerError};

/// A signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable identifier used as the storage key
    pub id: String,
    /// Name shown on the leaderboard
    pub display_name: Option<String>,
}

impl User {
    /// Name to display, falling back to the id
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}

/// Handle returned by [`AuthProvider::on_state_change`]
pub type ListenerId = usize;

/// Callback invoked with the new user (or `None` after sign-out)
pub type AuthListener = Box<dyn FnMut(Option<&User>) + Send>;

/// Source of the current identity
pub trait AuthProvider {
    /// The signed-in user, if any
    fn current_user(&self) -> Option<User>;

    /// Register a listener for sign-in / sign-out
    fn on_state_change(&mut self, listener: AuthListener) -> ListenerId;

    /// Remove a listener registered with `on_state_change`
    fn unsubscribe(&mut self, id: ListenerId);

    /// Sign the current user out
    fn sign_out(&mut self) -> Result<()>;

    /// The signed-in user, or `NotSignedIn`
    fn require_user(&self) -> Result<User> {
        self.current_user().ok_or(TrackerError::NotSignedIn)
    }
}

/// Session-file backed profiles
pub struct LocalAuth {
    session: Session,
    path: PathBuf,
    listeners: Vec<(ListenerId, AuthListener)>,
    next_listener: ListenerId,
}

impl LocalAuth {
    /// Open the session stored at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let session =
            Session::load_from(&path).map_err(|e| TrackerError::Store(format!("{:#}", e)))?;
        Ok(Self { session, path, listeners: Vec::new(), next_listener: 0 })
    }

    /// Path of the backing session file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sign in as `display_name`, creating the profile id from it
    pub fn sign_in(&mut self, display_name: &str) -> Result<User> {
        let display_name = display_name.trim();
        let user = User {
            id: slugify(display_name),
            display_name: (!display_name.is_empty()).then(|| display_name.to_string()),
        };
        self.session.current_user = Some(user.clone());
        self.persist()?;
        tracing::info!(user = %user.id, "Signed in");
        self.emit();
        Ok(user)
    }

    /// Mutable access to the session (e.g., to remember the active phase)
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Read access to the session
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Write the session back to disk
    pub fn persist(&self) -> Result<()> {
        self.session.save_to(&self.path).map_err(|e| TrackerError::Store(format!("{:#}", e)))
    }

    fn emit(&mut self) {
        let user = self.session.current_user.clone();
        for (_, listener) in self.listeners.iter_mut() {
            listener(user.as_ref());
        }
    }
}

impl AuthProvider for LocalAuth {
    fn current_user(&self) -> Option<User> {
        self.session.current_user.clone()
    }

    fn on_state_change(&mut self, listener: AuthListener) -> ListenerId {
        let id = self.next_listener;
        self.next_listener += 1;
        self.listeners.push((id, listener));
        id
    }

    fn unsubscribe(&mut self, id: ListenerId) {
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
    }

    fn sign_out(&mut self) -> Result<()> {
        if let Some(user) = self.session.current_user.take() {
            tracing::info!(user = %user.id, "Signed out");
        }
        self.persist()?;
        self.emit();
        Ok(())
    }
}

/// Lowercase ASCII slug used as a profile id
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() { "local".to_string() } else { slug }
}
