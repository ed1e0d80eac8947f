use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::feed::{STOPS_FILE, TRIPS_FILE};
use crate::input::is_zip_path;

/// Finds feed sources below each folder, recursively.
///
/// A directory holding `stops.txt` or `trips.txt` is one feed and is not
/// searched further; any `.zip` file is one feed. The result is sorted and
/// free of duplicates.
pub fn discover_feed_sources<P: AsRef<Path>>(folders: &[P]) -> Vec<PathBuf> {
    let mut sources = Vec::new();
    for folder in folders {
        let folder = folder.as_ref();
        match fs::metadata(folder) {
            Ok(metadata) if metadata.is_dir() => visit_dir(folder, &mut sources),
            Ok(metadata) if metadata.is_file() && is_zip_path(folder) => {
                sources.push(folder.to_path_buf());
            }
            Ok(_) => warn!("'{}' is neither a folder nor a zip archive", folder.display()),
            Err(err) => warn!("cannot access '{}': {}", folder.display(), err),
        }
    }
    sources.sort();
    sources.dedup();
    sources
}

/// A directory with any core GTFS table counts as a feed, so incomplete feeds
/// are still attempted and reported as skipped.
pub fn is_feed_directory(dir: &Path) -> bool {
    [STOPS_FILE, TRIPS_FILE]
        .iter()
        .any(|name| dir.join(name).is_file())
}

fn visit_dir(dir: &Path, sources: &mut Vec<PathBuf>) {
    if is_feed_directory(dir) {
        sources.push(dir.to_path_buf());
        return;
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("cannot read folder '{}': {}", dir.display(), err);
            return;
        }
    };
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("cannot read entry in '{}': {}", dir.display(), err);
                continue;
            }
        };
        // Symlinked folders are not followed.
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let path = entry.path();
        if file_type.is_dir() {
            visit_dir(&path, sources);
        } else if file_type.is_file() && is_zip_path(&path) {
            sources.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        std::env::temp_dir().join(format!("{}_{}_{}", prefix, std::process::id(), nanos))
    }

    #[test]
    fn finds_directories_and_archives_recursively() {
        let root = temp_dir("gtfs_discovery");
        let feed_a = root.join("agency_a");
        let nested = root.join("region").join("agency_b");
        fs::create_dir_all(&feed_a).expect("create dir");
        fs::create_dir_all(&nested).expect("create dir");
        fs::write(feed_a.join(TRIPS_FILE), "trip_id\n").expect("write file");
        fs::write(nested.join("feed.zip"), "zip").expect("write file");
        fs::write(nested.join("README.md"), "docs").expect("write file");

        let sources = discover_feed_sources(&[&root]);
        assert_eq!(sources, vec![feed_a.clone(), nested.join("feed.zip")]);

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn feed_directory_is_not_searched_further() {
        let root = temp_dir("gtfs_discovery_feed");
        let inner = root.join("old");
        fs::create_dir_all(&inner).expect("create dir");
        fs::write(root.join(TRIPS_FILE), "trip_id\n").expect("write file");
        fs::write(inner.join("backup.zip"), "zip").expect("write file");

        let sources = discover_feed_sources(&[&root]);
        assert_eq!(sources, vec![root.clone()]);

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn directory_with_stops_but_no_trips_is_a_source() {
        let root = temp_dir("gtfs_discovery_partial");
        let partial = root.join("partial");
        let unrelated = root.join("docs");
        fs::create_dir_all(&partial).expect("create dir");
        fs::create_dir_all(&unrelated).expect("create dir");
        fs::write(partial.join(STOPS_FILE), "stop_id\n").expect("write file");
        fs::write(unrelated.join("notes.txt"), "notes").expect("write file");

        let sources = discover_feed_sources(&[&root]);
        assert_eq!(sources, vec![partial.clone()]);

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn zip_argument_is_a_source_and_duplicates_collapse() {
        let root = temp_dir("gtfs_discovery_zip");
        fs::create_dir_all(&root).expect("create dir");
        let archive = root.join("gtfs.zip");
        fs::write(&archive, "zip").expect("write file");

        let sources = discover_feed_sources(&[archive.clone(), root.clone()]);
        assert_eq!(sources, vec![archive]);

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn missing_and_empty_folders_yield_nothing() {
        let root = temp_dir("gtfs_discovery_empty");
        fs::create_dir_all(&root).expect("create dir");

        let sources = discover_feed_sources(&[root.clone(), root.join("does_not_exist")]);
        assert!(sources.is_empty());

        fs::remove_dir_all(&root).ok();
    }
}
