//! Launch-at-login via an XDG autostart desktop entry.

use crate::paths::SurfacingPaths;
use std::fs;
use std::path::{Path, PathBuf};
use surfacing_core::{LoginItemRegistrar, Result, SurfacingError};

const ENTRY_FILE_NAME: &str = "cinoa-surfacing.desktop";

/// [`LoginItemRegistrar`] that writes `~/.config/autostart/cinoa-surfacing.desktop`.
#[derive(Debug, Clone)]
pub struct XdgAutostart {
    entry_path: PathBuf,
    exec: String,
}

impl XdgAutostart {
    /// Registers the currently running executable.
    pub fn new(paths: &SurfacingPaths) -> Result<Self> {
        let exe = std::env::current_exe()?;
        Ok(Self::with_exec(
            &paths.autostart_dir()?,
            format!("{} run", quote_exec_arg(&exe.to_string_lossy())),
        ))
    }

    pub fn with_exec(autostart_dir: &Path, exec: impl Into<String>) -> Self {
        Self {
            entry_path: autostart_dir.join(ENTRY_FILE_NAME),
            exec: exec.into(),
        }
    }

    pub fn entry_path(&self) -> &Path {
        &self.entry_path
    }

    fn desktop_entry(&self) -> String {
        format!(
            "[Desktop Entry]\n\
             Type=Application\n\
             Name=Cinoa Surfacing\n\
             Comment=Floating Gemini prompt\n\
             Exec={}\n\
             Terminal=false\n\
             X-GNOME-Autostart-enabled=true\n",
            self.exec
        )
    }
}

/// Quotes an `Exec=` argument when it contains characters the Desktop Entry
/// format reserves.
fn quote_exec_arg(arg: &str) -> String {
    if arg.chars().any(|c| c.is_whitespace() || "\"'\\$`".contains(c)) {
        let escaped = arg
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('$', "\\$")
            .replace('`', "\\`");
        format!("\"{escaped}\"")
    } else {
        arg.to_string()
    }
}

impl LoginItemRegistrar for XdgAutostart {
    fn is_enabled(&self) -> bool {
        fs::read_to_string(&self.entry_path)
            .map(|content| !content.contains("Hidden=true"))
            .unwrap_or(false)
    }

    fn register(&self) -> Result<()> {
        if let Some(parent) = self.entry_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.entry_path, self.desktop_entry()).map_err(|e| {
            SurfacingError::registration(format!(
                "failed to write {}: {e}",
                self.entry_path.display()
            ))
        })?;
        tracing::info!(path = %self.entry_path.display(), "Registered launch at login");
        Ok(())
    }

    fn unregister(&self) -> Result<()> {
        match fs::remove_file(&self.entry_path) {
            Ok(()) => {
                tracing::info!(path = %self.entry_path.display(), "Unregistered launch at login");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SurfacingError::registration(format!(
                "failed to remove {}: {e}",
                self.entry_path.display()
            ))),
        }
    }
}
