use crate::errors::{PrStackError, Result};
use std::fs;
use std::path::Path;

/// Progress spinner used while talking to the review service
pub mod spinner;

/// Atomic file operations so a crash never leaves a half-written stack file
pub mod atomic_file {
    use super::*;

    /// Write string content to a file atomically using a temporary file + rename strategy
    pub fn write_string(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    PrStackError::config(format!(
                        "Failed to create directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        // Temporary file lives next to the target so the rename stays on one filesystem
        let temp_path = path.with_extension("tmp");

        fs::write(&temp_path, content)
            .map_err(|e| PrStackError::config(format!("Failed to write temporary file: {e}")))?;

        atomic_rename(&temp_path, path)
    }

    #[cfg(windows)]
    fn atomic_rename(temp_path: &Path, final_path: &Path) -> Result<()> {
        const MAX_RETRIES: u32 = 3;
        const RETRY_DELAY: std::time::Duration = std::time::Duration::from_millis(100);

        let mut attempt = 1;
        loop {
            match fs::rename(temp_path, final_path) {
                Ok(()) => return Ok(()),
                Err(e) if attempt == MAX_RETRIES => {
                    let _ = fs::remove_file(temp_path);
                    return Err(PrStackError::config(format!(
                        "Failed to finalize file write after {MAX_RETRIES} attempts on Windows: {e}"
                    )));
                }
                Err(_) => {
                    attempt += 1;
                    std::thread::sleep(RETRY_DELAY);
                }
            }
        }
    }

    #[cfg(not(windows))]
    fn atomic_rename(temp_path: &Path, final_path: &Path) -> Result<()> {
        fs::rename(temp_path, final_path)
            .map_err(|e| PrStackError::config(format!("Failed to finalize file write: {e}")))?;
        Ok(())
    }
}
