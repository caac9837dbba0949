use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Spinner currently on screen; log lines pause it while they print
static ACTIVE: Mutex<Option<ProgressBar>> = Mutex::new(None);

fn active_bar() -> Option<ProgressBar> {
    ACTIVE.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Thin wrapper around an `indicatif` spinner that clears itself when dropped.
///
/// While a spinner runs, output written through [`LogWriter`] suspends it so
/// log lines never land in the middle of the spinner line.
pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    const TICK_RATE: Duration = Duration::from_millis(80);
    const TEMPLATE: &'static str = "{spinner:.green} {msg}";

    /// Start a spinner with the provided message.
    pub fn new(message: impl Into<String>) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template(Self::TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.into());
        pb.enable_steady_tick(Self::TICK_RATE);
        *ACTIVE.lock().unwrap_or_else(PoisonError::into_inner) = Some(pb.clone());
        Spinner { pb }
    }

    /// Stop the spinner and clear it from the terminal.
    pub fn stop(&self) {
        self.pb.finish_and_clear();
        ACTIVE.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if !self.pb.is_finished() {
            self.stop();
        }
    }
}

/// Stdout writer for `tracing` that pauses the running spinner, if any
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match active_bar() {
            Some(pb) => pb.suspend(|| io::stdout().write(buf)),
            None => io::stdout().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_spinner_creation_and_stop() {
        let spinner = Spinner::new("Syncing");
        spinner.stop();
    }

    #[test]
    #[serial]
    fn test_log_writer_follows_active_spinner() {
        let spinner = Spinner::new("Syncing");
        assert!(active_bar().is_some());
        assert_eq!(LogWriter.write(b"while spinning\n").unwrap(), 15);

        drop(spinner);
        assert!(active_bar().is_none());
        assert_eq!(LogWriter.write(b"after\n").unwrap(), 6);
    }
}
