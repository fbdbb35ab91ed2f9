//! Recorded landmark streams, one JSON file per sample:
//! `{"frames": [null | [{"x", "y", "z"?, "confidence"}, ...], ...]}`.

use std::path::{Path, PathBuf};

use glob::glob;
use serde::{Deserialize, Serialize};

use crate::error::{GestureError, Result};
use crate::types::Frame;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    /// `None` where the estimator found no subject.
    pub frames: Vec<Option<Frame>>,
}

impl Recording {
    pub fn new(frames: Vec<Option<Frame>>) -> Recording {
        Recording { frames }
    }

    /// Reads a recording and checks that every tracked frame has the same landmark count.
    pub fn load(path: impl AsRef<Path>) -> Result<Recording> {
        let path = path.as_ref();
        let recording: Recording = crate::io::object_from_json(&path.to_string_lossy())?;
        let mut counts = recording.frames.iter().flatten().map(|f| f.len());
        if let Some(expected) = counts.next() {
            if let Some(got) = counts.find(|c| *c != expected) {
                return Err(GestureError::DimensionMismatch { expected, got });
            }
        }
        Ok(recording)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        crate::io::object_to_json(&path.as_ref().to_string_lossy(), self)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames in which the estimator found a subject.
    pub fn tracked_frames(&self) -> usize {
        self.frames.iter().filter(|f| f.is_some()).count()
    }
}

fn json_filter(rp: glob::GlobResult) -> Option<PathBuf> {
    if let Ok(p) = rp {
        if p.is_file() && p.extension().is_some_and(|e| e == "json") {
            return Some(p);
        }
    }
    None
}

/// Every `*.json` below `root`, sorted.
pub fn list_recordings(root: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    let pattern = format!("{}/**/*.json", glob::Pattern::escape(&root.to_string_lossy()));
    let mut paths: Vec<PathBuf> = glob(&pattern)?.filter_map(json_filter).collect();
    paths.sort();
    log::debug!("found {} recordings under {}", paths.len(), root.display());
    Ok(paths)
}
