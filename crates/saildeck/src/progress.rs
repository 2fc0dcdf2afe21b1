//! Progress and status reporting for install operations
//!
//! The pipeline reports side effects exclusively through one event enum
//! delivered over a single callback, so a UI can render progress without the
//! installer knowing anything about presentation. Callbacks may be invoked
//! from a background task; marshaling onto a UI thread is the caller's job.

use std::sync::Arc;

/// Callback invoked for every event during an install attempt
pub type InstallCallback = Arc<dyn Fn(InstallEvent) + Send + Sync>;

/// Events emitted during an install attempt
#[derive(Debug, Clone)]
pub enum InstallEvent {
    /// Bytes transferred so far; `total` is `None` when the server omits
    /// a content length
    Progress { downloaded: u64, total: Option<u64> },
    /// Human-readable phase description ("Downloading...", "Extracting...")
    Status { message: String },
    /// Final outcome; emitted exactly once per attempt
    Complete { success: bool, message: String },
    /// Failure detail; emitted before the failing `Complete`
    Error { message: String },
}

/// Trait form of the callback interface for callers that prefer methods
/// over matching on the enum
pub trait InstallReporter: Send + Sync {
    fn on_progress(&self, _downloaded: u64, _total: Option<u64>) {}
    fn on_status(&self, _message: &str) {}
    fn on_complete(&self, _success: bool, _message: &str) {}
    fn on_error(&self, _message: &str) {}
}

/// Extension trait to convert an `InstallReporter` into an `InstallCallback`
pub trait IntoInstallCallback {
    fn into_callback(self) -> InstallCallback;
}

impl<T: InstallReporter + 'static> IntoInstallCallback for T {
    fn into_callback(self) -> InstallCallback {
        Arc::new(move |event| match event {
            InstallEvent::Progress { downloaded, total } => self.on_progress(downloaded, total),
            InstallEvent::Status { message } => self.on_status(&message),
            InstallEvent::Complete { success, message } => self.on_complete(success, &message),
            InstallEvent::Error { message } => self.on_error(&message),
        })
    }
}

/// Reporter that discards every event
#[derive(Debug, Default)]
pub struct NullReporter;

impl InstallReporter for NullReporter {}

/// Simple console reporter used by the CLI
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    pub verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl InstallReporter for ConsoleReporter {
    fn on_progress(&self, downloaded: u64, total: Option<u64>) {
        if !self.verbose {
            return;
        }
        match total {
            Some(total) if total > 0 => {
                let percent = (downloaded as f64 / total as f64) * 100.0;
                println!("  {:.1}% ({}/{} bytes)", percent, downloaded, total);
            }
            _ => println!("  {} bytes downloaded", downloaded),
        }
    }

    // the final message arrives as a Status or Error event, so Complete
    // needs no output of its own
    fn on_status(&self, message: &str) {
        println!("{}", message);
    }

    fn on_error(&self, message: &str) {
        eprintln!("error: {}", message);
    }
}

/// Emit an event if a callback is present
pub(crate) fn emit(callback: Option<&InstallCallback>, event: InstallEvent) {
    if let Some(callback) = callback {
        callback(event);
    }
}
