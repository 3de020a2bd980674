//! Fetching and decoding audio sources

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rodio::{Decoder, Source};
use thiserror::Error;

use crate::error::{MediaError, MediaErrorCode};

/// Encoded audio bytes, shared so a finished track can be decoded again
pub type SourceBytes = Arc<[u8]>;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported source scheme: {0}")]
    UnsupportedScheme(String),

    #[error("could not decode audio: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
}

impl SourceError {
    pub fn to_media_error(&self) -> MediaError {
        let code = match self {
            SourceError::Network(_) => MediaErrorCode::Network,
            SourceError::Io { .. } => MediaErrorCode::Network,
            SourceError::UnsupportedScheme(_) => MediaErrorCode::SrcNotSupported,
            SourceError::Decode(_) => MediaErrorCode::Decode,
        };
        MediaError::new(code, self.to_string())
    }
}

pub fn build_http_client(connect_timeout: Duration) -> Result<reqwest::blocking::Client, reqwest::Error> {
    reqwest::blocking::Client::builder()
        .connect_timeout(connect_timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Load the raw bytes behind a source URI. `http(s)://` goes over the network,
/// `file://` and bare paths are read from disk.
pub fn fetch(uri: &str, client: &reqwest::blocking::Client) -> Result<SourceBytes, SourceError> {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        tracing::debug!(uri, "Fetching remote source");
        let response = client.get(uri).send()?.error_for_status()?;
        let bytes = response.bytes()?;
        tracing::debug!(uri, bytes = bytes.len(), "Remote source fetched");
        return Ok(Arc::from(&bytes[..]));
    }

    let path = match uri.strip_prefix("file://") {
        Some(path) => path,
        None if uri.contains("://") => {
            let scheme = uri.split("://").next().unwrap_or_default();
            return Err(SourceError::UnsupportedScheme(scheme.to_string()));
        }
        None => uri,
    };

    let data = std::fs::read(Path::new(path)).map_err(|source| SourceError::Io {
        path: path.to_string(),
        source,
    })?;
    Ok(Arc::from(data))
}

/// Decode shared bytes into a playable source plus its total length in
/// seconds (NaN when the container does not say)
pub fn decode(bytes: &SourceBytes) -> Result<(Decoder<Cursor<SourceBytes>>, f64), SourceError> {
    let decoder = Decoder::new(Cursor::new(Arc::clone(bytes)))?;
    let duration = decoder
        .total_duration()
        .map(|d| d.as_secs_f64())
        .unwrap_or(f64::NAN);
    Ok((decoder, duration))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    fn client() -> reqwest::blocking::Client {
        build_http_client(Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn reads_local_paths() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not really audio").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let bytes = fetch(&path, &client()).unwrap();
        assert_eq!(&bytes[..], b"not really audio");

        let bytes = fetch(&format!("file://{path}"), &client()).unwrap();
        assert_eq!(bytes.len(), 16);
    }

    #[test]
    fn missing_file_maps_to_network_error() {
        let err = fetch("/no/such/track.mp3", &client()).unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
        assert_eq!(err.to_media_error().code, MediaErrorCode::Network);
    }

    #[test]
    fn unknown_scheme_is_not_supported() {
        let err = fetch("spotify://track/123", &client()).unwrap_err();
        assert!(matches!(err, SourceError::UnsupportedScheme(ref s) if s == "spotify"));
        assert_eq!(err.to_media_error().code, MediaErrorCode::SrcNotSupported);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let bytes: SourceBytes = Arc::from(&b"definitely not an mp3 stream"[..]);
        let err = decode(&bytes).err().expect("decode should fail");
        assert_eq!(err.to_media_error().code, MediaErrorCode::Decode);
    }

    /// 16-bit mono silence at 8 kHz wrapped in a WAV header
    pub(crate) fn wav_silence(seconds: u32) -> SourceBytes {
        let sample_rate: u32 = 8000;
        let data_len: u32 = sample_rate * 2 * seconds;
        let mut wav = Vec::new();
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(36 + data_len).to_le_bytes());
        wav.extend_from_slice(b"WAVEfmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes());
        wav.extend_from_slice(&sample_rate.to_le_bytes());
        wav.extend_from_slice(&(sample_rate * 2).to_le_bytes());
        wav.extend_from_slice(&2u16.to_le_bytes());
        wav.extend_from_slice(&16u16.to_le_bytes());
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&data_len.to_le_bytes());
        wav.resize(wav.len() + data_len as usize, 0);
        Arc::from(wav)
    }

    #[test]
    fn decodes_wav_silence() {
        let (_decoder, duration) = decode(&wav_silence(1)).unwrap();
        // Length is only reported when the demuxer knows the frame count
        assert!(duration.is_nan() || (duration - 1.0).abs() < 0.01, "duration was {duration}");
    }
}
