//! Transform type and interpolation helpers, plus the serde-friendly wire
//! structs the JSON formats use for vectors, quaternions and transforms.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Decomposed transform: translation, orientation, non-uniform scale.
#[derive(Debug, Clone, PartialEq)]
pub struct Xfo {
    pub tr: Vec3,
    pub ori: Quat,
    pub sc: Vec3,
}

impl Default for Xfo {
    fn default() -> Self {
        Self { tr: Vec3::ZERO, ori: Quat::IDENTITY, sc: Vec3::ONE }
    }
}

impl Xfo {
    pub fn new(tr: Vec3, ori: Quat, sc: Vec3) -> Self {
        Self { tr, ori, sc }
    }

    pub fn from_translation(tr: Vec3) -> Self {
        Self { tr, ..Self::default() }
    }

    /// Componentwise interpolation: translation and scale linearly, the
    /// orientation spherically along the shorter arc.
    pub fn lerp(&self, end: &Xfo, t: f32) -> Xfo {
        let start_ori = align_quat(end.ori, self.ori);
        Xfo {
            tr: self.tr.lerp(end.tr, t),
            ori: start_ori.slerp(end.ori, t),
            sc: self.sc.lerp(end.sc, t),
        }
    }
}

/// Returns `q` or its negation, whichever lies in the same hemisphere as
/// `reference`. Slerping between the aligned pair takes the shorter path.
pub fn align_quat(reference: Quat, q: Quat) -> Quat {
    if reference.dot(q) < 0.0 {
        -q
    } else {
        q
    }
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Hermite easing: 0 at `edge0`, 1 at `edge1`, zero slope at both ends.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

// /////////////////////////////////////////
// Wire structs

fn default_w() -> f32 {
    1.0
}

fn unit_scale() -> Vec3Data {
    Vec3Data { x: 1.0, y: 1.0, z: 1.0 }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vec3Data {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl From<Vec3> for Vec3Data {
    fn from(v: Vec3) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

impl From<Vec3Data> for Vec3 {
    fn from(data: Vec3Data) -> Self {
        Vec3::new(data.x, data.y, data.z)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuatData {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub z: f32,
    #[serde(default = "default_w")]
    pub w: f32,
}

impl Default for QuatData {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, z: 0.0, w: 1.0 }
    }
}

impl From<Quat> for QuatData {
    fn from(q: Quat) -> Self {
        Self { x: q.x, y: q.y, z: q.z, w: q.w }
    }
}

impl From<QuatData> for Quat {
    fn from(data: QuatData) -> Self {
        Quat::from_xyzw(data.x, data.y, data.z, data.w).normalize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XfoData {
    #[serde(default)]
    pub tr: Vec3Data,
    #[serde(default)]
    pub ori: QuatData,
    #[serde(default = "unit_scale")]
    pub sc: Vec3Data,
}

impl Default for XfoData {
    fn default() -> Self {
        Self { tr: Vec3Data::default(), ori: QuatData::default(), sc: unit_scale() }
    }
}

impl From<&Xfo> for XfoData {
    fn from(xfo: &Xfo) -> Self {
        Self { tr: xfo.tr.into(), ori: xfo.ori.into(), sc: xfo.sc.into() }
    }
}

impl From<XfoData> for Xfo {
    fn from(data: XfoData) -> Self {
        Self { tr: data.tr.into(), ori: data.ori.into(), sc: data.sc.into() }
    }
}
