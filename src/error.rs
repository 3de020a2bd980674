//! Error types shared across the player
//!
//! Library-style errors use `thiserror`; `main` and config loading wrap them in
//! `anyhow` with context.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Errors raised while loading or validating the playlist catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog has no playlists")]
    Empty,

    #[error("first playlist '{0}' has no songs to pre-select")]
    EmptyFirstPlaylist(String),

    #[error("duplicate playlist id '{0}'")]
    DuplicatePlaylist(String),

    #[error("duplicate song id '{song}' in playlist '{playlist}'")]
    DuplicateSong { playlist: String, song: String },

    #[error("failed to read catalog {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Failure category reported by a media element, numbered like HTML `MediaError`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaErrorCode {
    Aborted,
    Network,
    Decode,
    SrcNotSupported,
}

impl MediaErrorCode {
    pub fn code(self) -> u16 {
        match self {
            MediaErrorCode::Aborted => 1,
            MediaErrorCode::Network => 2,
            MediaErrorCode::Decode => 3,
            MediaErrorCode::SrcNotSupported => 4,
        }
    }
}

impl fmt::Display for MediaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaErrorCode::Aborted => "aborted",
            MediaErrorCode::Network => "network",
            MediaErrorCode::Decode => "decode",
            MediaErrorCode::SrcNotSupported => "source not supported",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

/// Playback failure surfaced through the media element's error event
#[derive(Error, Clone, Debug, PartialEq)]
#[error("media error {code}: {message}")]
pub struct MediaError {
    pub code: MediaErrorCode,
    pub message: String,
}

impl MediaError {
    pub fn new(code: MediaErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Rejection of a deferred start-playback request
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum PlayError {
    /// The output refused to start (no device, device busy). Treated like an
    /// autoplay-policy denial: play intent falls back to paused.
    #[error("playback not allowed: {0}")]
    NotAllowed(String),

    /// Superseded by a pause or a new source before playback began
    #[error("play request aborted")]
    Aborted,

    #[error("source not supported: {0}")]
    NotSupported(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_error_codes_follow_html_numbering() {
        assert_eq!(MediaErrorCode::Aborted.code(), 1);
        assert_eq!(MediaErrorCode::Network.code(), 2);
        assert_eq!(MediaErrorCode::Decode.code(), 3);
        assert_eq!(MediaErrorCode::SrcNotSupported.code(), 4);
    }

    #[test]
    fn media_error_display_includes_code_and_message() {
        let err = MediaError::new(MediaErrorCode::Network, "connection reset");
        assert_eq!(err.to_string(), "media error network (2): connection reset");
    }
}
