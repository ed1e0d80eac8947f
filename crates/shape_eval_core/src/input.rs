use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use zip::ZipArchive;

use crate::csv_reader::{read_csv_from_reader, CsvTable};

#[derive(Debug, thiserror::Error)]
pub enum GtfsInputError {
    #[error("input path does not exist: {0}")]
    MissingPath(PathBuf),
    #[error("input path is neither a directory nor a zip archive: {0}")]
    InvalidPath(PathBuf),
    #[error("missing required file {0}")]
    MissingFile(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid zip archive {path}: {source}")]
    ZipArchive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("failed to open {file} in zip archive: {source}")]
    ZipFile {
        file: String,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("failed to read {file} from zip archive: {source}")]
    ZipFileIo {
        file: String,
        #[source]
        source: std::io::Error,
    },
    #[error("csv error in {file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GtfsInputSource {
    Directory,
    Zip,
}

/// A feed location on disk: a directory of GTFS tables or a zip archive.
#[derive(Debug, Clone)]
pub struct GtfsInput {
    path: PathBuf,
    source: GtfsInputSource,
}

impl GtfsInput {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, GtfsInputError> {
        let path = path.as_ref();
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(GtfsInputError::MissingPath(path.to_path_buf()));
            }
            Err(source) => {
                return Err(GtfsInputError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let source = if metadata.is_dir() {
            GtfsInputSource::Directory
        } else if metadata.is_file() && is_zip_path(path) {
            GtfsInputSource::Zip
        } else {
            return Err(GtfsInputError::InvalidPath(path.to_path_buf()));
        };

        Ok(Self {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> GtfsInputSource {
        self.source
    }

    pub fn reader(&self) -> Result<GtfsInputReader, GtfsInputError> {
        match self.source {
            GtfsInputSource::Directory => Ok(GtfsInputReader::Directory(self.path.clone())),
            GtfsInputSource::Zip => {
                let file = File::open(&self.path).map_err(|source| GtfsInputError::Io {
                    path: self.path.clone(),
                    source,
                })?;
                let archive = ZipArchive::new(BufReader::new(file)).map_err(|source| {
                    GtfsInputError::ZipArchive {
                        path: self.path.clone(),
                        source,
                    }
                })?;
                let entries = table_entries(archive.file_names());
                Ok(GtfsInputReader::Zip { archive, entries })
            }
        }
    }
}

pub fn is_zip_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}

/// Maps table file names to zip entry names, preferring the shallowest entry
/// so archives that wrap the feed in a single folder still load.
fn table_entries<'a>(names: impl Iterator<Item = &'a str>) -> HashMap<String, String> {
    let mut entries: HashMap<String, String> = HashMap::new();
    for name in names {
        if name.ends_with('/') || name.starts_with("__MACOSX/") {
            continue;
        }
        let base = name.rsplit('/').next().unwrap_or(name);
        let depth = name.matches('/').count();
        let replace = match entries.get(base) {
            Some(existing) => existing.matches('/').count() > depth,
            None => true,
        };
        if replace {
            entries.insert(base.to_string(), name.to_string());
        }
    }
    entries
}

pub enum GtfsInputReader {
    Directory(PathBuf),
    Zip {
        archive: ZipArchive<BufReader<File>>,
        entries: HashMap<String, String>,
    },
}

impl GtfsInputReader {
    pub fn read_file(&mut self, file_name: &str) -> Result<Option<Vec<u8>>, GtfsInputError> {
        match self {
            GtfsInputReader::Directory(dir) => {
                let path = dir.join(file_name);
                if !path.is_file() {
                    return Ok(None);
                }
                std::fs::read(&path)
                    .map(Some)
                    .map_err(|source| GtfsInputError::Io { path, source })
            }
            GtfsInputReader::Zip { archive, entries } => {
                let Some(entry_name) = entries.get(file_name) else {
                    return Ok(None);
                };
                let mut entry =
                    archive
                        .by_name(entry_name)
                        .map_err(|source| GtfsInputError::ZipFile {
                            file: file_name.to_string(),
                            source,
                        })?;
                let mut data = Vec::new();
                entry
                    .read_to_end(&mut data)
                    .map_err(|source| GtfsInputError::ZipFileIo {
                        file: file_name.to_string(),
                        source,
                    })?;
                Ok(Some(data))
            }
        }
    }

    pub fn read_optional_csv<T: DeserializeOwned>(
        &mut self,
        file_name: &str,
    ) -> Result<Option<CsvTable<T>>, GtfsInputError> {
        match self.read_file(file_name)? {
            Some(data) => read_csv_from_reader(data.as_slice(), file_name).map(Some),
            None => Ok(None),
        }
    }

    pub fn read_required_csv<T: DeserializeOwned>(
        &mut self,
        file_name: &str,
    ) -> Result<CsvTable<T>, GtfsInputError> {
        self.read_optional_csv(file_name)?
            .ok_or_else(|| GtfsInputError::MissingFile(file_name.to_string()))
    }
}
