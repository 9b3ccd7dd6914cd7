use crate::math::Xfo;
use glam::Vec3;
use std::cell::RefCell;
use std::rc::Rc;

/// Look-at camera cell driven by view activation. The renderer owns the real
/// camera; this mirrors the surface the snapshot system reads and writes.
#[derive(Debug, Clone)]
pub struct Camera {
    global_xfo: Xfo,
    target: Vec3,
    focal_distance: f32,
}

pub type CameraRef = Rc<RefCell<Camera>>;

impl Default for Camera {
    fn default() -> Self {
        Self { global_xfo: Xfo::default(), target: Vec3::ZERO, focal_distance: 1.0 }
    }
}

impl Camera {
    pub fn new_ref() -> CameraRef {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn global_xfo(&self) -> Xfo {
        self.global_xfo.clone()
    }

    pub fn set_global_xfo(&mut self, xfo: Xfo) {
        self.global_xfo = xfo;
    }

    pub fn target_position(&self) -> Vec3 {
        self.target
    }

    pub fn focal_distance(&self) -> f32 {
        self.focal_distance
    }

    pub fn set_focal_distance(&mut self, distance: f32) {
        self.focal_distance = distance;
    }

    /// Places the camera at `position` looking at `target`, with +Z pointing
    /// back from the target through the eye.
    pub fn set_position_and_target(&mut self, position: Vec3, target: Vec3) {
        let dir = position - target;
        let distance = dir.length().max(f32::EPSILON);
        let ori = glam::Quat::from_rotation_arc(Vec3::Z, dir / distance);
        self.global_xfo = Xfo { tr: position, ori, sc: Vec3::ONE };
        self.target = target;
        self.focal_distance = distance;
    }

    pub fn set_target_position(&mut self, target: Vec3) {
        self.target = target;
    }
}
