use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{dir::DataDirectory, signup::form::UserRole};

pub const SESSION_FILENAME: &str = "session.json";

/// Client-held state of the signed-in user.
///
/// It is filled on login and cleared on logout; flows receive it explicitly.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_role: Option<UserRole>,
}

#[derive(Debug, Clone)]
pub enum SessionError {
    ReadingFile(String),
    WritingFile(String),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::ReadingFile(e) => write!(f, "Error while reading session file: {}", e),
            Self::WritingFile(e) => write!(f, "Error while writing session file: {}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl Session {
    pub fn path(datadir: &DataDirectory) -> PathBuf {
        datadir.file(SESSION_FILENAME)
    }

    /// Loads the stored session. A missing or unreadable session file is an
    /// empty session.
    pub fn load(datadir: &DataDirectory) -> Result<Self, SessionError> {
        let path = Self::path(datadir);
        let content = match std::fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(SessionError::ReadingFile(e.to_string())),
        };
        match serde_json::from_slice::<Session>(&content) {
            Ok(session) => Ok(session),
            Err(e) => {
                tracing::warn!("Something wrong with session file: {:?}", e);
                tracing::warn!("Session file is reset");
                Ok(Self::default())
            }
        }
    }

    pub fn store(&self, datadir: &DataDirectory) -> Result<(), SessionError> {
        let content = serde_json::to_vec_pretty(self).map_err(|e| {
            SessionError::WritingFile(format!("Failed to serialize session: {}", e))
        })?;
        std::fs::write(Self::path(datadir), content).map_err(|e| {
            tracing::warn!("failed to write to file: {:?}", e);
            SessionError::WritingFile(e.to_string())
        })
    }

    pub fn init(&mut self, email: String, user_id: Option<String>, role: UserRole) {
        self.email = Some(email);
        self.user_id = user_id;
        self.user_role = Some(role);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn user_role(&self) -> Option<UserRole> {
        self.user_role
    }

    pub fn is_signed_in(&self) -> bool {
        self.user_role.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_lifecycle() {
        let tmp = tempfile::tempdir().unwrap();
        let datadir = DataDirectory::new(tmp.path().to_path_buf());

        assert_eq!(Session::load(&datadir).unwrap(), Session::default());

        let mut session = Session::default();
        session.init(
            "a@b.com".to_string(),
            Some("user-1".to_string()),
            UserRole::Regular,
        );
        session.store(&datadir).unwrap();

        let loaded = Session::load(&datadir).unwrap();
        assert_eq!(loaded.email(), Some("a@b.com"));
        assert_eq!(loaded.user_id(), Some("user-1"));
        assert_eq!(loaded.user_role(), Some(UserRole::Regular));
        assert!(loaded.is_signed_in());

        session.clear();
        session.store(&datadir).unwrap();
        assert!(!Session::load(&datadir).unwrap().is_signed_in());
    }

    #[test]
    fn corrupt_session_is_reset() {
        let tmp = tempfile::tempdir().unwrap();
        let datadir = DataDirectory::new(tmp.path().to_path_buf());
        std::fs::write(Session::path(&datadir), b"{ not json").unwrap();
        assert_eq!(Session::load(&datadir).unwrap(), Session::default());
    }
}
