use std::path::{Path, PathBuf};

/// Folder holding the configuration, the session and the log file.
#[derive(Clone, Debug, PartialEq)]
pub struct DataDirectory(PathBuf);

impl DataDirectory {
    pub fn new(p: PathBuf) -> Self {
        DataDirectory(p)
    }

    /// `~/.dalvacation` on Linux, `DalVacation` in the user configuration
    /// directory elsewhere.
    pub fn new_default() -> Result<Self, std::io::Error> {
        #[cfg(target_os = "linux")]
        let path = dirs::home_dir().map(|home| home.join(".dalvacation"));

        #[cfg(not(target_os = "linux"))]
        let path = dirs::config_dir().map(|config| config.join("DalVacation"));

        path.map(DataDirectory).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Failed to get default data directory",
            )
        })
    }

    /// Creates the directory and its parents, readable by the owner only.
    /// Nothing is done if it already exists.
    pub fn init(&self) -> Result<(), std::io::Error> {
        if self.0.is_dir() {
            return Ok(());
        }
        let mut builder = std::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder.create(&self.0)?;
        tracing::info!("Data directory created at {}", self.0.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Path of a file stored in the directory.
    pub fn file(&self, name: &str) -> PathBuf {
        self.0.join(name)
    }
}
