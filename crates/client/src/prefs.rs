//! Durable client-side preferences.
//!
//! One flag lives here today: whether the user dismissed the "install this
//! app" suggestion. Dismissal is permanent for the device - there is no
//! expiry and no way to re-arm the prompt short of wiping the data
//! directory.

use std::fs;
use std::io;
use std::path::PathBuf;

/// Fixed marker name; presence of the file is the flag.
const INSTALL_PROMPT_DISMISSED: &str = "install_prompt_dismissed";

#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    #[error("failed to persist preference: {0}")]
    Io(#[from] io::Error),
}

/// File-backed preference store rooted at the client data directory.
#[derive(Debug, Clone)]
pub struct ClientPrefs {
    dir: PathBuf,
}

impl ClientPrefs {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Whether the install suggestion has ever been dismissed on this
    /// device. An unreadable data directory reads as not dismissed; the
    /// worst case is showing the prompt again.
    #[must_use]
    pub fn install_prompt_dismissed(&self) -> bool {
        self.dir.join(INSTALL_PROMPT_DISMISSED).exists()
    }

    /// Record the dismissal.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory or marker cannot be written.
    pub fn dismiss_install_prompt(&self) -> Result<(), PrefsError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.dir.join(INSTALL_PROMPT_DISMISSED), b"")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use uuid::Uuid;

    struct TempDir(PathBuf);

    impl TempDir {
        fn new() -> Self {
            Self(std::env::temp_dir().join(format!("beanpass-prefs-{}", Uuid::new_v4())))
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn test_prompt_starts_undismissed() {
        let dir = TempDir::new();
        let prefs = ClientPrefs::new(&dir.0);
        assert!(!prefs.install_prompt_dismissed());
    }

    #[test]
    fn test_dismissal_persists_across_instances() {
        let dir = TempDir::new();
        ClientPrefs::new(&dir.0).dismiss_install_prompt().unwrap();

        let reopened = ClientPrefs::new(&dir.0);
        assert!(reopened.install_prompt_dismissed());
    }

    #[test]
    fn test_dismissal_is_idempotent() {
        let dir = TempDir::new();
        let prefs = ClientPrefs::new(&dir.0);
        prefs.dismiss_install_prompt().unwrap();
        prefs.dismiss_install_prompt().unwrap();
        assert!(prefs.install_prompt_dismissed());
    }
}
