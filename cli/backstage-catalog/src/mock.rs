//! Recording and replaying catalog traffic through a local mock server.
//!
//! In [CatalogMockMode::Record] requests are forwarded to the real catalog
//! and every interaction is written to a file once the client goes away.
//! In [CatalogMockMode::Replay] a recording is served instead of the catalog.

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use httpmock::{MockServer, RecordingID};
use tracing::{debug, error};

use crate::config::{CatalogClientConfig, CatalogMockMode};

/// Keeps the mock server alive for as long as the transport using it.
#[allow(dead_code)] // https://github.com/rust-lang/rust/issues/122833
pub(crate) enum MockGuard {
    Record(Recorder),
    Replay(MockServer),
}

impl MockGuard {
    pub(crate) fn new(config: &CatalogClientConfig) -> Option<Self> {
        match &config.mock_mode {
            CatalogMockMode::None => None,
            CatalogMockMode::Record(path) => {
                let server = MockServer::start();
                let recording = start_recording(&server, &config.catalog_url);
                debug!(?path, server = server.base_url(), "recording catalog traffic");

                Some(MockGuard::Record(Recorder {
                    path: path.clone(),
                    server,
                    recording,
                }))
            },
            CatalogMockMode::Replay(path) => {
                let server = MockServer::start();
                server.playback(path);
                debug!(?path, server = server.base_url(), "replaying catalog traffic");

                Some(MockGuard::Replay(server))
            },
        }
    }

    /// Base url of the mock server, to be used instead of the catalog url.
    pub(crate) fn url(&self) -> String {
        match self {
            MockGuard::Record(recorder) => recorder.server.base_url(),
            MockGuard::Replay(server) => server.base_url(),
        }
    }
}

impl Debug for MockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match self {
            MockGuard::Record(_) => "record",
            MockGuard::Replay(_) => "replay",
        };
        f.debug_struct("MockGuard")
            .field("mode", &mode)
            .field("url", &self.url())
            .finish()
    }
}

fn start_recording(server: &MockServer, catalog_url: &str) -> RecordingID {
    server.forward_to(catalog_url, |rule| {
        rule.filter(|when| {
            when.any_request();
        });
    });
    server.record(|rule| {
        rule.filter(|when| {
            when.any_request();
        });
    })
}

/// Writes the recorded interactions to `path` when dropped.
pub(crate) struct Recorder {
    path: PathBuf,
    server: MockServer,
    recording: RecordingID,
}

impl Recorder {
    fn save(&self) -> Result<(), String> {
        // The file name has to be unique across threads recording in parallel.
        let file_name = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| format!("invalid recording path {}", self.path.display()))?;

        // `record_save` appends a timestamp to the name, so the file is moved
        // into place afterwards.
        let saved = self
            .server
            .record_save(&self.recording, format!("httpmock_{file_name}"))
            .map_err(|e| e.to_string())?;
        move_recording(&saved, &self.path)
    }
}

fn move_recording(from: &Path, to: &Path) -> Result<(), String> {
    debug!(from = %from.display(), to = %to.display(), "moving recording into place");
    fs::rename(from, to).map_err(|e| e.to_string())
}

impl Drop for Recorder {
    fn drop(&mut self) {
        match self.save() {
            Ok(()) => debug!(path = ?self.path, "saved catalog recording"),
            Err(err) => error!(path = ?self.path, %err, "failed to save catalog recording"),
        }
    }
}
