//! Fixed-step transition driver. The host pumps `Animator::update` from its
//! frame loop; each in-flight transition fires whole steps as its interval
//! elapses and drops itself after the final step. Every spawn returns a
//! handle that can cancel the transition before its next step, so starting
//! a new transition never leaves two writers fighting over the same
//! parameters.

use crate::camera::CameraRef;
use crate::math::{align_quat, lerp, smoothstep, Xfo};
use crate::scene::{ParamRef, ParamValue};
use glam::{Quat, Vec3};
use std::cell::Cell;
use std::rc::Rc;

/// One parameter's start/end pair inside a pose transition.
#[derive(Debug)]
pub struct LerpTrack {
    param: ParamRef,
    start: ParamValue,
    end: ParamValue,
}

impl LerpTrack {
    pub fn new(param: ParamRef, start: ParamValue, end: ParamValue) -> Self {
        Self { param, start, end }
    }
}

pub trait Animation {
    /// Applies step `step` of `steps` (1-based; the final step must land on
    /// the exact end state).
    fn apply_step(&mut self, step: usize, steps: usize);
}

/// Interpolates heterogeneous pose values. Transforms and numbers ease
/// smoothly; booleans and strings snap to the end value on the first step so
/// discrete state such as visibility takes effect immediately.
pub struct PoseLerp {
    tracks: Vec<LerpTrack>,
}

impl PoseLerp {
    pub fn new(tracks: Vec<LerpTrack>) -> Self {
        Self { tracks }
    }
}

impl Animation for PoseLerp {
    fn apply_step(&mut self, step: usize, steps: usize) {
        let t = step as f32 / steps as f32;
        let smooth_t = smoothstep(0.0, 1.0, t);
        for track in &self.tracks {
            if track.end.is_discrete() {
                if step == 1 {
                    track.param.borrow_mut().set_value(track.end.clone());
                }
                continue;
            }
            let value = if step == steps {
                track.end.clone()
            } else {
                track.start.lerp(&track.end, smooth_t)
            };
            track.param.borrow_mut().set_value(value);
        }
    }
}

/// Orbit-style camera transition: the look-at target and the camera-to-target
/// distance interpolate linearly, the orientation spherically, and the eye is
/// reconstructed as `target + ori.z_axis * distance` each step — the camera
/// orbits and dollies instead of cutting straight through geometry.
pub struct CameraLerp {
    camera: CameraRef,
    start_ori: Quat,
    start_target: Vec3,
    start_dist: f32,
    end_xfo: Xfo,
    end_target: Vec3,
    end_dist: f32,
}

impl CameraLerp {
    /// Captures the start state from the live camera at call time, aligning
    /// the start orientation with the destination so the slerp takes the
    /// shorter rotational path.
    pub fn new(camera: &CameraRef, end_xfo: Xfo, end_target: Vec3) -> Self {
        let (start_xfo, start_target) = {
            let cam = camera.borrow();
            (cam.global_xfo(), cam.target_position())
        };
        let start_ori = align_quat(end_xfo.ori, start_xfo.ori);
        let start_dist = start_xfo.tr.distance(start_target);
        let end_dist = end_xfo.tr.distance(end_target);
        Self {
            camera: Rc::clone(camera),
            start_ori,
            start_target,
            start_dist,
            end_xfo,
            end_target,
            end_dist,
        }
    }
}

impl Animation for CameraLerp {
    fn apply_step(&mut self, step: usize, steps: usize) {
        let mut cam = self.camera.borrow_mut();
        if step == steps {
            cam.set_global_xfo(self.end_xfo.clone());
            cam.set_target_position(self.end_target);
            cam.set_focal_distance(self.end_dist);
            return;
        }
        let t = step as f32 / steps as f32;
        let smooth_t = smoothstep(0.0, 1.0, t);
        let target = self.start_target.lerp(self.end_target, smooth_t);
        let dist = lerp(self.start_dist, self.end_dist, smooth_t);
        let ori = self.start_ori.slerp(self.end_xfo.ori, smooth_t);
        let position = target + (ori * Vec3::Z) * dist;
        cam.set_global_xfo(Xfo { tr: position, ori, sc: Vec3::ONE });
        cam.set_target_position(target);
        cam.set_focal_distance(dist);
    }
}

/// Cancellation/completion flags shared with the animator.
#[derive(Debug, Clone)]
pub struct AnimationHandle {
    cancelled: Rc<Cell<bool>>,
    finished: Rc<Cell<bool>>,
}

impl AnimationHandle {
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    pub fn is_finished(&self) -> bool {
        self.finished.get()
    }
}

struct ActiveAnimation {
    animation: Box<dyn Animation>,
    steps: usize,
    interval: f32,
    step: usize,
    accum: f32,
    cancelled: Rc<Cell<bool>>,
    finished: Rc<Cell<bool>>,
}

#[derive(Default)]
pub struct Animator {
    active: Vec<ActiveAnimation>,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(
        &mut self,
        animation: Box<dyn Animation>,
        steps: usize,
        interval: f32,
    ) -> AnimationHandle {
        let cancelled = Rc::new(Cell::new(false));
        let finished = Rc::new(Cell::new(false));
        let handle =
            AnimationHandle { cancelled: Rc::clone(&cancelled), finished: Rc::clone(&finished) };
        if steps == 0 {
            finished.set(true);
            return handle;
        }
        self.active.push(ActiveAnimation {
            animation,
            steps,
            interval,
            step: 0,
            accum: 0.0,
            cancelled,
            finished,
        });
        handle
    }

    /// Advances every in-flight transition by `dt` seconds, firing whole
    /// steps and retiring transitions that finish or were cancelled.
    pub fn update(&mut self, dt: f32) {
        for entry in &mut self.active {
            if entry.cancelled.get() {
                continue;
            }
            entry.accum += dt;
            while entry.accum + 1e-6 >= entry.interval && entry.step < entry.steps {
                entry.accum -= entry.interval;
                entry.step += 1;
                entry.animation.apply_step(entry.step, entry.steps);
                if entry.cancelled.get() {
                    break;
                }
            }
            if entry.step >= entry.steps {
                entry.finished.set(true);
            }
        }
        self.active.retain(|entry| !entry.cancelled.get() && !entry.finished.get());
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }
}
