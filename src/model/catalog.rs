//! Static song and playlist catalog

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// A single track in the catalog
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Display-formatted length, e.g. "3:18"
    pub duration: String,
    #[serde(default)]
    pub image_url: String,
    pub audio_url: String,
}

/// An ordered list of songs; order drives next/previous
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub cover_url: String,
    /// Style token for the header accent (e.g. "from-indigo-900")
    #[serde(default)]
    pub gradient: String,
    #[serde(default)]
    pub songs: Vec<Song>,
}

impl Playlist {
    pub fn position_of(&self, song_id: &str) -> Option<usize> {
        self.songs.iter().position(|s| s.id == song_id)
    }

    pub fn contains(&self, song_id: &str) -> bool {
        self.position_of(song_id).is_some()
    }
}

/// Immutable set of playlists supplied at startup
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub playlists: Vec<Playlist>,
}

impl Catalog {
    /// Build a validated catalog. The first playlist must have a song because
    /// the player starts with it pre-selected.
    pub fn new(playlists: Vec<Playlist>) -> Result<Self, CatalogError> {
        let first = playlists.first().ok_or(CatalogError::Empty)?;
        if first.songs.is_empty() {
            return Err(CatalogError::EmptyFirstPlaylist(first.id.clone()));
        }

        let mut playlist_ids = HashSet::new();
        for playlist in &playlists {
            if !playlist_ids.insert(playlist.id.as_str()) {
                return Err(CatalogError::DuplicatePlaylist(playlist.id.clone()));
            }
            let mut song_ids = HashSet::new();
            for song in &playlist.songs {
                if !song_ids.insert(song.id.as_str()) {
                    return Err(CatalogError::DuplicateSong {
                        playlist: playlist.id.clone(),
                        song: song.id.clone(),
                    });
                }
            }
        }

        Ok(Self { playlists })
    }

    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, CatalogError> {
        let parsed: Catalog = toml::from_str(content).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(parsed.playlists)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_toml_str(&content, path)?;
        tracing::info!(
            path = %path.display(),
            playlists = catalog.playlists.len(),
            "Catalog loaded from file"
        );
        Ok(catalog)
    }

    pub fn playlist(&self, index: usize) -> Option<&Playlist> {
        self.playlists.get(index)
    }

    pub fn len(&self) -> usize {
        self.playlists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playlists.is_empty()
    }

    /// The song pre-selected at startup
    pub fn first_song(&self) -> Option<&Song> {
        self.playlists.first().and_then(|p| p.songs.first())
    }

    /// The catalog shipped with the binary: public-domain readings and
    /// Creative Commons tracks hosted on archive.org and the Free Music Archive.
    pub fn builtin() -> Self {
        let playlists = vec![
            Playlist {
                id: "p1".into(),
                name: "Slam Poetry Classics".into(),
                description: "Spoken word, raw emotion, and timeless snaps.".into(),
                author: "PoetryFoundation".into(),
                cover_url: "https://images.unsplash.com/photo-1470549638415-0a0755be0619?w=600&h=600&fit=crop".into(),
                gradient: "from-amber-900".into(),
                songs: vec![
                    song(
                        "sp-1",
                        "The Raven",
                        "Edgar Allan Poe",
                        "Classic Poetry Vol 1",
                        "8:42",
                        "https://images.unsplash.com/photo-1470549638415-0a0755be0619?w=300&h=300&fit=crop",
                        "https://ia800304.us.archive.org/28/items/Poetry_001/The_Raven_128kb.mp3",
                    ),
                    song(
                        "sp-2",
                        "Invictus",
                        "William Ernest Henley",
                        "Fortitude Collection",
                        "1:15",
                        "https://images.unsplash.com/photo-1481627834876-b7833e8f5570?w=300&h=300&fit=crop",
                        "https://ia902606.us.archive.org/14/items/short_poetry_038_librivox/invictus_henley_ear_64kb.mp3",
                    ),
                    song(
                        "sp-3",
                        "The Road Not Taken",
                        "Robert Frost",
                        "Mountain Interval",
                        "1:10",
                        "https://images.unsplash.com/photo-1490730141103-6cac27aaab94?w=300&h=300&fit=crop",
                        "https://ia802606.us.archive.org/14/items/short_poetry_038_librivox/roadnottaken_frost_ear_64kb.mp3",
                    ),
                    song(
                        "sp-4",
                        "Ozymandias",
                        "Percy Bysshe Shelley",
                        "Romantic Era",
                        "1:12",
                        "https://images.unsplash.com/photo-1505664194779-8beaceb93744?w=300&h=300&fit=crop",
                        "https://ia802606.us.archive.org/14/items/short_poetry_038_librivox/ozymandias_shelley_ear_64kb.mp3",
                    ),
                ],
            },
            Playlist {
                id: "p2".into(),
                name: "Jacob Collier Energy".into(),
                description: "Harmonies, syncopation, and multi-instrumental madness.".into(),
                author: "Jacob Collier".into(),
                cover_url: "https://images.unsplash.com/photo-1514320291840-2e0a9bf2a9ae?w=600&h=600&fit=crop".into(),
                gradient: "from-indigo-900".into(),
                songs: vec![
                    song(
                        "jc-1",
                        "Night Owl",
                        "Broke For Free",
                        "Directionless EP",
                        "3:18",
                        "https://images.unsplash.com/photo-1511671782779-c97d3d27a1d4?w=300&h=300&fit=crop",
                        "https://files.freemusicarchive.org/storage-freemusicarchive-org/music/WFMU/Broke_For_Free/Directionless_EP/Broke_For_Free_-_01_-_Night_Owl.mp3",
                    ),
                    song(
                        "jc-2",
                        "Algorithms",
                        "Chad Crouch",
                        "Arps",
                        "4:02",
                        "https://images.unsplash.com/photo-1514320291840-2e0a9bf2a9ae?w=300&h=300&fit=crop",
                        "https://files.freemusicarchive.org/storage-freemusicarchive-org/music/ccCommunity/Chad_Crouch/Arps/Chad_Crouch_-_01_-_Algorithms.mp3",
                    ),
                    song(
                        "jc-3",
                        "Enthusiast",
                        "Tours",
                        "Enthusiast",
                        "3:11",
                        "https://images.unsplash.com/photo-1460723237483-7a6dc9d0b212?w=300&h=300&fit=crop",
                        "https://files.freemusicarchive.org/storage-freemusicarchive-org/music/no_curator/Tours/Enthusiast/Tours_-_01_-_Enthusiast.mp3",
                    ),
                    song(
                        "jc-4",
                        "Shipping Lanes",
                        "Chad Crouch",
                        "Arps",
                        "3:52",
                        "https://images.unsplash.com/photo-1511192336575-5a79af67a629?w=300&h=300&fit=crop",
                        "https://files.freemusicarchive.org/storage-freemusicarchive-org/music/ccCommunity/Chad_Crouch/Arps/Chad_Crouch_-_02_-_Shipping_Lanes.mp3",
                    ),
                ],
            },
            Playlist {
                id: "p3".into(),
                name: "Deep Focus".into(),
                description: "Music to help you concentrate and code.".into(),
                author: "Spotify".into(),
                cover_url: "https://images.unsplash.com/photo-1516280440614-6697288d5d38?w=600&h=600&fit=crop".into(),
                gradient: "from-blue-900".into(),
                songs: vec![
                    song(
                        "lf-1",
                        "Sepia",
                        "Podington Bear",
                        "Piano I",
                        "2:45",
                        "https://images.unsplash.com/photo-1516280440614-6697288d5d38?w=300&h=300&fit=crop",
                        "https://files.freemusicarchive.org/storage-freemusicarchive-org/music/Music_for_Video/Podington_Bear/Piano_I/Podington_Bear_-_Sepia.mp3",
                    ),
                    song(
                        "lf-2",
                        "Starling",
                        "Podington Bear",
                        "Solo Piano",
                        "3:12",
                        "https://images.unsplash.com/photo-1518609878373-06d740f60d8b?w=300&h=300&fit=crop",
                        "https://files.freemusicarchive.org/storage-freemusicarchive-org/music/Music_for_Video/Podington_Bear/Solo_Piano/Podington_Bear_-_Starling.mp3",
                    ),
                ],
            },
        ];

        Self { playlists }
    }
}

fn song(
    id: &str,
    title: &str,
    artist: &str,
    album: &str,
    duration: &str,
    image_url: &str,
    audio_url: &str,
) -> Song {
    Song {
        id: id.to_string(),
        title: title.to_string(),
        artist: artist.to_string(),
        album: album.to_string(),
        duration: duration.to_string(),
        image_url: image_url.to_string(),
        audio_url: audio_url.to_string(),
    }
}
