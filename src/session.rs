use std::fs;
use std::path::PathBuf;

use parking_lot::RwLock;

use crate::config::AuthConfig;

/// Holds the bearer token for the moderation backend. The token comes either
/// inline from config or from a token file that an external login flow keeps
/// fresh; `reload` re-reads the sources so the UI can pick up a token that
/// appears after startup.
pub struct Session {
    inline: Option<String>,
    token_file: Option<PathBuf>,
    current: RwLock<Option<String>>,
}

impl Session {
    pub fn new(auth: &AuthConfig) -> Self {
        let session = Session {
            inline: normalize(&auth.token),
            token_file: auth.token_file.clone(),
            current: RwLock::new(None),
        };
        session.reload();
        session
    }

    /// Current token, if one is known. Empty and whitespace-only values count
    /// as absent.
    pub fn token(&self) -> Option<String> {
        self.current.read().clone()
    }

    /// Re-read the token sources. Returns true when the value changed.
    pub fn reload(&self) -> bool {
        let fresh = self.resolve();
        let mut current = self.current.write();
        if *current == fresh {
            return false;
        }
        *current = fresh;
        true
    }

    fn resolve(&self) -> Option<String> {
        if self.inline.is_some() {
            return self.inline.clone();
        }
        let path = self.token_file.as_ref()?;
        let contents = fs::read_to_string(path).ok()?;
        contents.lines().next().and_then(normalize)
    }
}

fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(token: &str, token_file: Option<PathBuf>) -> AuthConfig {
        AuthConfig {
            token: token.to_string(),
            token_file,
        }
    }

    #[test]
    fn inline_token_wins_over_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("token");
        fs::write(&path, "file-token\n").expect("write token");
        let session = Session::new(&auth("inline-token", Some(path)));
        assert_eq!(session.token().as_deref(), Some("inline-token"));
    }

    #[test]
    fn file_token_is_trimmed_to_first_line() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("token");
        fs::write(&path, "  file-token  \nsecond line\n").expect("write token");
        let session = Session::new(&auth("", Some(path)));
        assert_eq!(session.token().as_deref(), Some("file-token"));
    }

    #[test]
    fn missing_file_means_no_token() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session = Session::new(&auth("", Some(dir.path().join("absent"))));
        assert!(session.token().is_none());
    }

    #[test]
    fn empty_file_means_no_token() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("token");
        fs::write(&path, "   \n").expect("write token");
        let session = Session::new(&auth("", Some(path)));
        assert!(session.token().is_none());
    }

    #[test]
    fn reload_reports_token_changes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("token");
        let session = Session::new(&auth("", Some(path.clone())));
        assert!(session.token().is_none());

        fs::write(&path, "fresh-token\n").expect("write token");
        assert!(session.reload());
        assert_eq!(session.token().as_deref(), Some("fresh-token"));

        assert!(!session.reload());

        fs::write(&path, "rotated-token\n").expect("write token");
        assert!(session.reload());
        assert_eq!(session.token().as_deref(), Some("rotated-token"));
    }
}
