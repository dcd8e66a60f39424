//! Folder hierarchy builder
//!
//! Songs carry their file path; the directory tree above them is derived,
//! not listed by the remote. Every `/`-delimited ancestor becomes a Folder
//! row, and parent links are resolved by exact path against the folders
//! created from the same batch of songs. An ancestor first seen in a later
//! batch is linked when that batch runs; links across batches are not
//! searched for.

use crate::error::Result;
use core_library::models::Folder;
use core_library::repositories::FolderRepository;
use provider_traits::records::SongRecord;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Every ancestor directory of the given file paths, deduplicated.
///
/// Empty segments are dropped, and the final segment of each path (the
/// file itself) is not a folder. Parents always precede their children in
/// the returned order.
pub fn ancestor_paths<'a, I>(paths: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();

    for path in paths {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.len() < 2 {
            continue;
        }

        let mut prefix = String::new();
        for segment in &segments[..segments.len() - 1] {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);
            if seen.insert(prefix.clone()) {
                ordered.push(prefix.clone());
            }
        }
    }

    ordered
}

/// The path one level up, or `None` at the root
pub fn parent_path(path: &str) -> Option<&str> {
    path.rsplit_once('/').map(|(parent, _)| parent)
}

/// The final segment of a path
pub fn folder_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// The normalized directory a file lives in, or `None` for files at the
/// root. Matches the keys produced by [`ancestor_paths`].
pub fn song_folder_path(path: &str) -> Option<String> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() < 2 {
        return None;
    }
    Some(segments[..segments.len() - 1].join("/"))
}

/// Upsert the folder tree implied by a batch of songs and link parents.
///
/// Returns the upserted folders keyed by path so the caller can wire each
/// song to its containing directory.
pub async fn build_folders(
    folders: &dyn FolderRepository,
    server_id: i64,
    server_folder_id: i64,
    stamp: i64,
    songs: &[SongRecord],
) -> Result<HashMap<String, Folder>> {
    let paths = ancestor_paths(songs.iter().filter_map(|s| s.path.as_deref()));
    let mut by_path = HashMap::with_capacity(paths.len());

    for path in &paths {
        let folder = folders
            .upsert(server_id, path, folder_name(path), server_folder_id, stamp)
            .await?;
        by_path.insert(path.clone(), folder);
    }

    // Parent search is scoped to the folders this batch created
    for path in &paths {
        let Some(parent) = parent_path(path) else {
            continue;
        };
        if let Some(parent_folder) = by_path.get(parent) {
            let parent_id = parent_folder.id;
            if let Some(folder) = by_path.get_mut(path.as_str()) {
                folders.set_parent(folder.id, parent_id).await?;
                folder.parent_id = Some(parent_id);
            }
        }
    }

    debug!(folders = by_path.len(), "Built folder hierarchy for batch");

    Ok(by_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ancestor_paths_excludes_the_file() {
        let paths = ancestor_paths(["music/rock/album/track.flac"]);
        assert_eq!(paths, ["music", "music/rock", "music/rock/album"]);
    }

    #[test]
    fn test_ancestor_paths_deduplicates_shared_prefixes() {
        let paths = ancestor_paths([
            "music/rock/album/track1.flac",
            "music/rock/album/track2.flac",
            "music/jazz/other/track3.flac",
        ]);
        assert_eq!(
            paths,
            [
                "music",
                "music/rock",
                "music/rock/album",
                "music/jazz",
                "music/jazz/other"
            ]
        );
    }

    #[test]
    fn test_ancestor_paths_drops_empty_segments() {
        let paths = ancestor_paths(["/music//rock/track.flac"]);
        assert_eq!(paths, ["music", "music/rock"]);
    }

    #[test]
    fn test_file_at_root_has_no_ancestors() {
        let paths = ancestor_paths(["track.flac"]);
        assert!(paths.is_empty());
    }

    #[test]
    fn test_parents_precede_children() {
        let paths = ancestor_paths(["a/b/c/d/song.mp3"]);
        for (i, path) in paths.iter().enumerate() {
            if let Some(parent) = parent_path(path) {
                let parent_index = paths.iter().position(|p| p == parent).unwrap();
                assert!(parent_index < i);
            }
        }
    }

    #[test]
    fn test_song_folder_path_matches_ancestor_keys() {
        let path = "/music//rock/track.flac";
        let ancestors = ancestor_paths([path]);
        let folder = song_folder_path(path).unwrap();
        assert_eq!(folder, "music/rock");
        assert!(ancestors.contains(&folder));
        assert_eq!(song_folder_path("track.flac"), None);
    }

    #[test]
    fn test_parent_path_and_folder_name() {
        assert_eq!(parent_path("music/rock/album"), Some("music/rock"));
        assert_eq!(parent_path("music"), None);
        assert_eq!(folder_name("music/rock/album"), "album");
        assert_eq!(folder_name("music"), "music");
    }
}
