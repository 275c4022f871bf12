//! On-disk dataset format and loader.
//!
//! A dataset file is a bincode-encoded [`DatasetFile`]: a small header
//! followed by the records. Files are written through a sibling temporary
//! file and renamed into place, so a reader never sees a half-written
//! dataset.
//!
//! Older files stored the two columns separately (`Columns`); the loader
//! still accepts them.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::control::ActionVec;
use crate::core::{LoadError, PersistError};

use super::trajectory::{Dataset, StepRecord};

/// File signature.
pub const DATASET_MAGIC: [u8; 4] = *b"DRVC";

/// Current format version.
pub const DATASET_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetHeader {
    pub magic: [u8; 4],
    pub version: u32,
    pub count: u64,
    pub state_dim: u32,
    pub action_dim: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DatasetLayout {
    /// One record per sample. Written by this crate.
    Paired(Vec<StepRecord>),

    /// Legacy layout with states and actions stored as separate columns.
    Columns {
        states: Vec<Vec<f32>>,
        actions: Vec<ActionVec>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetFile {
    pub header: DatasetHeader,
    pub layout: DatasetLayout,
}

impl DatasetFile {
    /// Wrap records in the current paired layout.
    pub fn paired(records: Vec<StepRecord>) -> Self {
        let (state_dim, action_dim) = records
            .first()
            .map(|r| (r.state_dim(), r.action_dim()))
            .unwrap_or((0, 0));
        Self {
            header: DatasetHeader {
                magic: DATASET_MAGIC,
                version: DATASET_VERSION,
                count: records.len() as u64,
                state_dim: state_dim as u32,
                action_dim: action_dim as u32,
            },
            layout: DatasetLayout::Paired(records),
        }
    }
}

/// A record whose width differs from the expected one.
struct Ragged {
    index: usize,
    kind: &'static str,
    expected: usize,
    found: usize,
}

fn find_ragged(records: &[StepRecord], state_dim: usize, action_dim: usize) -> Option<Ragged> {
    records.iter().enumerate().find_map(|(index, record)| {
        if record.state_dim() != state_dim {
            Some(Ragged {
                index,
                kind: "state",
                expected: state_dim,
                found: record.state_dim(),
            })
        } else if record.action_dim() != action_dim {
            Some(Ragged {
                index,
                kind: "action",
                expected: action_dim,
                found: record.action_dim(),
            })
        } else {
            None
        }
    })
}

/// Write `dataset` to `path`. Returns the number of records written.
///
/// Parent directories are created as needed. Every record must share the
/// widths of the first one; otherwise nothing is written.
pub fn save_dataset(path: &Path, dataset: &Dataset) -> Result<usize, PersistError> {
    let file = DatasetFile::paired(dataset.records().to_vec());
    let (state_dim, action_dim) = (
        file.header.state_dim as usize,
        file.header.action_dim as usize,
    );
    if let Some(r) = find_ragged(dataset.records(), state_dim, action_dim) {
        return Err(PersistError::RaggedDimension {
            path: path.to_path_buf(),
            index: r.index,
            kind: r.kind,
            expected: r.expected,
            found: r.found,
        });
    }
    let bytes = bincode::serialize(&file).map_err(|e| PersistError::Encode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    write_atomic(path, &bytes)?;
    Ok(dataset.len())
}

/// Load a dataset as aligned `(states, actions)` columns in recorded order.
pub fn load(path: impl AsRef<Path>) -> Result<(Vec<Vec<f32>>, Vec<ActionVec>), LoadError> {
    let records = load_records(path)?;
    Ok(Dataset::from(records).into_columns())
}

/// Load a dataset as records in recorded order.
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<StepRecord>, LoadError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            LoadError::Missing(path.to_path_buf())
        } else {
            LoadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let decode_err = |reason: String| LoadError::Decode {
        path: path.to_path_buf(),
        reason,
    };
    let file: DatasetFile = bincode::deserialize(&bytes).map_err(|e| decode_err(e.to_string()))?;

    let header = file.header;
    if header.magic != DATASET_MAGIC {
        return Err(decode_err(format!("bad magic {:?}", header.magic)));
    }
    if header.version == 0 || header.version > DATASET_VERSION {
        return Err(decode_err(format!("unsupported version {}", header.version)));
    }

    let records = match file.layout {
        DatasetLayout::Paired(records) => records,
        DatasetLayout::Columns { states, actions } => {
            if states.len() != actions.len() {
                return Err(LoadError::LengthMismatch {
                    states: states.len(),
                    actions: actions.len(),
                });
            }
            states
                .into_iter()
                .zip(actions)
                .map(|(state, action)| StepRecord::new(state, action))
                .collect()
        }
    };

    if header.count != records.len() as u64 {
        return Err(LoadError::CountMismatch {
            declared: header.count as usize,
            found: records.len(),
        });
    }

    let state_dim = header.state_dim as usize;
    let action_dim = header.action_dim as usize;
    if let Some(r) = find_ragged(&records, state_dim, action_dim) {
        return Err(LoadError::RaggedDimension {
            index: r.index,
            kind: r.kind,
            expected: r.expected,
            found: r.found,
        });
    }

    Ok(records)
}

/// Write `bytes` to a temporary sibling of `path`, sync it, then rename it
/// over `path`.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PersistError> {
    let io_err = |source: io::Error| PersistError::Io {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(io_err)?;

    let file_name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = parent.join(format!(".tmp_{}_{}", std::process::id(), file_name));

    let written = File::create(&temp_path).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(io_err(e));
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        io_err(e)
    })
}
