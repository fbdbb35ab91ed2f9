use std::collections::BTreeMap;

use glam::DVec3;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub type LandmarkId = usize;

/// A landmark position. Planar data keeps `z == 0.0`.
pub type Point = DVec3;

/// Where every sample below the visibility floor ends up.
pub const SENTINEL: Point = DVec3::ZERO;

pub fn is_sentinel(p: &Point) -> bool {
    *p == SENTINEL
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Dimension {
    #[default]
    #[serde(rename = "2d")]
    TwoD,
    #[serde(rename = "3d")]
    ThreeD,
}

fn full_confidence() -> f64 {
    1.0
}

/// One landmark in one frame as reported by the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSample {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    #[serde(default = "full_confidence")]
    pub confidence: f64,
}

impl LandmarkSample {
    pub fn new_2d(x: f64, y: f64, confidence: f64) -> LandmarkSample {
        LandmarkSample {
            x,
            y,
            z: None,
            confidence,
        }
    }

    pub fn new_3d(x: f64, y: f64, z: f64, confidence: f64) -> LandmarkSample {
        LandmarkSample {
            x,
            y,
            z: Some(z),
            confidence,
        }
    }

    /// Geometry of the sample, or [`SENTINEL`] when it is not visible enough to use.
    pub fn position(&self, visibility_floor: f64, dimension: Dimension) -> Point {
        if self.confidence < visibility_floor {
            return SENTINEL;
        }
        match dimension {
            Dimension::TwoD => DVec3::new(self.x, self.y, 0.0),
            Dimension::ThreeD => DVec3::new(self.x, self.y, self.z.unwrap_or(0.0)),
        }
    }
}

/// All landmarks of one estimator frame, indexed by landmark id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frame {
    pub landmarks: Vec<LandmarkSample>,
}

impl Frame {
    pub fn new(landmarks: Vec<LandmarkSample>) -> Frame {
        Frame { landmarks }
    }
    pub fn get(&self, id: LandmarkId) -> Option<&LandmarkSample> {
        self.landmarks.get(id)
    }
    pub fn len(&self) -> usize {
        self.landmarks.len()
    }
    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub template_name: String,
    pub score: f64,
}

impl MatchResult {
    pub fn new(template_name: impl Into<String>, score: f64) -> MatchResult {
        MatchResult {
            template_name: template_name.into(),
            score,
        }
    }
}

/// `[x, y]` or `[x, y, z]`.
pub fn point_from_coords(coords: &[f64]) -> Option<Point> {
    match *coords {
        [x, y] => Some(DVec3::new(x, y, 0.0)),
        [x, y, z] => Some(DVec3::new(x, y, z)),
        _ => None,
    }
}

pub fn point_to_coords(p: &Point, planar: bool) -> Vec<f64> {
    if planar {
        vec![p.x, p.y]
    } else {
        vec![p.x, p.y, p.z]
    }
}

/// Serde adapter for `landmark id -> point list`, written as `{"16": [[x, y], ...]}`.
pub mod points_map {
    use super::*;
    use serde::de::Error;

    pub fn serialize<S: Serializer>(
        points: &BTreeMap<LandmarkId, Vec<Point>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let planar = points.values().flatten().all(|p| p.z == 0.0);
        let raw: BTreeMap<LandmarkId, Vec<Vec<f64>>> = points
            .iter()
            .map(|(id, pts)| (*id, pts.iter().map(|p| point_to_coords(p, planar)).collect()))
            .collect();
        raw.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<LandmarkId, Vec<Point>>, D::Error> {
        let raw = BTreeMap::<LandmarkId, Vec<Vec<f64>>>::deserialize(deserializer)?;
        from_raw(raw).map_err(D::Error::custom)
    }

    pub fn from_raw(
        raw: BTreeMap<LandmarkId, Vec<Vec<f64>>>,
    ) -> Result<BTreeMap<LandmarkId, Vec<Point>>, String> {
        raw.into_iter()
            .map(|(id, coords)| {
                coords
                    .iter()
                    .map(|c| {
                        point_from_coords(c).ok_or_else(|| {
                            format!("landmark {} has a point with {} coordinates", id, c.len())
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(|pts| (id, pts))
            })
            .collect()
    }
}
