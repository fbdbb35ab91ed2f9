//! Stored pose and gesture templates.
//!
//! Templates live under a models directory as `poses/<name>.json` (a flat array of the
//! pose vector) and `gestures/<name>.json` (`{"name", "points", "first"?, "last"?}`).

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use glob::glob;
use serde::{Deserialize, Serialize};

use crate::descriptor::PoseVector;
use crate::dtw::dtw_distance;
use crate::error::{GestureError, Result};
use crate::history::LandmarkHistory;
use crate::pose::AnchorPose;
use crate::trajectory::{TrajectoryPreprocessor, process_landmarks};
use crate::types::{LandmarkId, Point, points_map};

pub const POSE_DIR: &str = "poses";
pub const GESTURE_DIR: &str = "gestures";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseTemplate {
    pub name: String,
    pub vector: PoseVector,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureTemplate {
    pub name: String,
    #[serde(with = "points_map")]
    pub points: BTreeMap<LandmarkId, Vec<Point>>,
    #[serde(rename = "first", default, skip_serializing_if = "Option::is_none")]
    pub anchor_first: Option<AnchorPose>,
    #[serde(rename = "last", default, skip_serializing_if = "Option::is_none")]
    pub anchor_last: Option<AnchorPose>,
}

impl GestureTemplate {
    pub fn new(
        name: impl Into<String>,
        points: BTreeMap<LandmarkId, Vec<Point>>,
    ) -> GestureTemplate {
        GestureTemplate {
            name: name.into(),
            points,
            anchor_first: None,
            anchor_last: None,
        }
    }

    /// Preprocesses the `selection` windows of a completed recording.
    pub fn from_history(
        name: impl Into<String>,
        history: &LandmarkHistory,
        selection: &BTreeSet<LandmarkId>,
        preprocessor: &TrajectoryPreprocessor,
    ) -> GestureTemplate {
        GestureTemplate::new(name, process_landmarks(history, selection, preprocessor))
    }

    pub fn with_anchors(mut self, first: Option<AnchorPose>, last: Option<AnchorPose>) -> Self {
        self.anchor_first = first;
        self.anchor_last = last;
        self
    }

    pub fn landmark_ids(&self) -> impl Iterator<Item = LandmarkId> + '_ {
        self.points.keys().copied()
    }

    /// Stored points summed over every landmark.
    pub fn point_count(&self) -> usize {
        self.points.values().map(|p| p.len()).sum()
    }

    /// Parses a gesture file. A file holding only the points object is accepted and
    /// named after `fallback_name`.
    pub fn from_json_str(contents: &str, fallback_name: &str) -> Result<GestureTemplate> {
        let value: serde_json::Value = serde_json::from_str(contents)?;
        if value.get("points").is_some() {
            let raw: RawGestureFile = serde_json::from_value(value)?;
            let points = points_map::from_raw(raw.points).map_err(|e| {
                GestureError::Json(serde::de::Error::custom(e))
            })?;
            Ok(GestureTemplate {
                name: raw.name.unwrap_or_else(|| fallback_name.to_string()),
                points,
                anchor_first: raw.first,
                anchor_last: raw.last,
            })
        } else {
            let raw: BTreeMap<LandmarkId, Vec<Vec<f64>>> = serde_json::from_value(value)?;
            let points = points_map::from_raw(raw).map_err(|e| {
                GestureError::Json(serde::de::Error::custom(e))
            })?;
            Ok(GestureTemplate::new(fallback_name, points))
        }
    }
}

#[derive(Deserialize)]
struct RawGestureFile {
    name: Option<String>,
    points: BTreeMap<LandmarkId, Vec<Vec<f64>>>,
    first: Option<AnchorPose>,
    last: Option<AnchorPose>,
}

fn json_filter(rp: glob::GlobResult) -> Option<PathBuf> {
    match rp {
        Ok(p) if p.extension().is_some_and(|e| e == "json") => Some(p),
        Ok(_) => None,
        Err(e) => {
            log::warn!("unreadable template entry: {}", e);
            None
        }
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn sorted_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        log::debug!("template directory {} does not exist", dir.display());
        return Ok(Vec::new());
    }
    let pattern = format!("{}/*.json", glob::Pattern::escape(&dir.to_string_lossy()));
    let mut paths: Vec<PathBuf> = glob(&pattern)?.filter_map(json_filter).collect();
    paths.sort();
    Ok(paths)
}

fn included(name: &str, include: Option<&HashSet<String>>) -> bool {
    include.is_none_or(|names| names.contains(name))
}

/// Loads every gesture file in `dir`, skipping unreadable or malformed ones.
pub fn load_gestures(
    dir: &Path,
    include: Option<&HashSet<String>>,
) -> Result<Vec<GestureTemplate>> {
    let mut gestures = Vec::new();
    for path in sorted_json_files(dir)? {
        let stem = file_stem(&path);
        if !included(&stem, include) {
            continue;
        }
        let parsed = std::fs::read_to_string(&path)
            .map_err(GestureError::from)
            .and_then(|contents| GestureTemplate::from_json_str(&contents, &stem));
        match parsed {
            Ok(template) => gestures.push(template),
            Err(e) => log::warn!("skipping gesture template {}: {}", path.display(), e),
        }
    }
    Ok(gestures)
}

/// Loads every pose file in `dir`, skipping unreadable or malformed ones.
pub fn load_poses(dir: &Path, include: Option<&HashSet<String>>) -> Result<Vec<PoseTemplate>> {
    let mut poses = Vec::new();
    for path in sorted_json_files(dir)? {
        let name = file_stem(&path);
        if !included(&name, include) {
            continue;
        }
        match crate::io::object_from_json::<PoseVector>(&path.to_string_lossy()) {
            Ok(vector) => poses.push(PoseTemplate { name, vector }),
            Err(e) => log::warn!("skipping pose template {}: {}", path.display(), e),
        }
    }
    Ok(poses)
}

/// In-memory pose and gesture collections, optionally backed by a models directory.
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    root: Option<PathBuf>,
    poses: Vec<PoseTemplate>,
    gestures: Vec<GestureTemplate>,
}

impl TemplateStore {
    pub fn new() -> TemplateStore {
        TemplateStore::default()
    }

    /// Reads `root/poses` and `root/gestures`; `include` restricts by template file name.
    pub fn load_dir(
        root: impl AsRef<Path>,
        include: Option<&HashSet<String>>,
    ) -> Result<TemplateStore> {
        let root = root.as_ref();
        let poses = load_poses(&root.join(POSE_DIR), include)?;
        let gestures = load_gestures(&root.join(GESTURE_DIR), include)?;
        log::info!(
            "loaded {} pose and {} gesture templates from {}",
            poses.len(),
            gestures.len(),
            root.display()
        );
        Ok(TemplateStore {
            root: Some(root.to_path_buf()),
            poses,
            gestures,
        })
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn poses(&self) -> &[PoseTemplate] {
        &self.poses
    }

    pub fn gestures(&self) -> &[GestureTemplate] {
        &self.gestures
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty() && self.gestures.is_empty()
    }

    pub fn gesture(&self, name: &str) -> Option<&GestureTemplate> {
        self.gestures.iter().find(|g| g.name == name)
    }

    /// Inserts `template`, replacing a gesture of the same name in place.
    pub fn add_gesture(&mut self, template: GestureTemplate) {
        match self.gestures.iter_mut().find(|g| g.name == template.name) {
            Some(existing) => *existing = template,
            None => self.gestures.push(template),
        }
    }

    pub fn add_pose(&mut self, template: PoseTemplate) {
        match self.poses.iter_mut().find(|p| p.name == template.name) {
            Some(existing) => *existing = template,
            None => self.poses.push(template),
        }
    }

    /// Name given to a pose saved without one.
    pub fn next_pose_name(&self) -> String {
        let mut n = self.poses.len() + 1;
        while self.poses.iter().any(|p| p.name == n.to_string()) {
            n += 1;
        }
        n.to_string()
    }

    pub fn next_gesture_name(&self) -> String {
        let mut n = self.gestures.len() + 1;
        while self.gestures.iter().any(|g| g.name == format!("gesture_{}", n)) {
            n += 1;
        }
        format!("gesture_{}", n)
    }

    fn target_dir(&self, sub: &str) -> Result<PathBuf> {
        let root = self.root.as_ref().ok_or_else(|| {
            GestureError::InvalidConfig("template store has no models directory".to_string())
        })?;
        let dir = root.join(sub);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Writes `template` to `gestures/<name>.json` and adds it to the store.
    pub fn save_gesture(&mut self, template: GestureTemplate) -> Result<PathBuf> {
        let path = self.target_dir(GESTURE_DIR)?.join(format!("{}.json", template.name));
        crate::io::object_to_json(&path.to_string_lossy(), &template)?;
        log::info!("saved gesture {} to {}", template.name, path.display());
        self.add_gesture(template);
        Ok(path)
    }

    /// Writes `vector` to `poses/<name>.json`, naming it `count + 1` when no name is given.
    pub fn save_pose(&mut self, vector: PoseVector, name: Option<&str>) -> Result<PoseTemplate> {
        let name = name.map(str::to_string).unwrap_or_else(|| self.next_pose_name());
        let path = self.target_dir(POSE_DIR)?.join(format!("{}.json", name));
        crate::io::object_to_json(&path.to_string_lossy(), &vector)?;
        log::info!("saved pose {} to {}", name, path.display());
        let template = PoseTemplate { name, vector };
        self.add_pose(template.clone());
        Ok(template)
    }
}

/// Index of the recording closest to all others, by summed DTW distance.
///
/// Only recordings covering exactly the same landmarks are compared. Recordings with no
/// comparable partner are passed over unless nothing else is available.
pub fn pick_representative(recordings: &[BTreeMap<LandmarkId, Vec<Point>>]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, candidate) in recordings.iter().enumerate() {
        let mut total = 0.0;
        let mut partners = 0;
        for (j, other) in recordings.iter().enumerate() {
            if i == j || !candidate.keys().eq(other.keys()) {
                continue;
            }
            total += candidate
                .iter()
                .map(|(id, points)| dtw_distance(points, &other[id]))
                .sum::<f64>();
            partners += 1;
        }
        if partners == 0 {
            continue;
        }
        log::debug!("recording {} summed distance {:.4} over {} partners", i, total, partners);
        if best.is_none_or(|(_, b)| total < b) {
            best = Some((i, total));
        }
    }
    best.map(|(i, _)| i)
        .or_else(|| (!recordings.is_empty()).then_some(0))
}
