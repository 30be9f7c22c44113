// src/camera.rs
//! Orbit camera and its input state machine.
//!
//! Window events are translated into [`CameraCommand`]s and queued; the
//! controller drains the queue once per frame in [`CameraController::update`],
//! so the transition logic is testable without a window or a real clock.

use glam::{Mat4, Quat, Vec3};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Default eye position, looking at the origin.
pub const DEFAULT_EYE: Vec3 = Vec3::new(0.0, -100.0, 50.0);
/// The fixed look-at target; panning never moves it.
pub const DEFAULT_TARGET: Vec3 = Vec3::ZERO;

/// Radians of orbit per pixel of pointer travel.
const ROTATE_SPEED: f32 = 0.01;
/// World units travelled per pan step.
const PAN_STEP: f32 = 2.0;
/// Interval between repeated pan steps while a direction is held.
pub const PAN_INTERVAL: Duration = Duration::from_millis(50);
/// Distance multiplier per unit of wheel delta: 1 + delta * 0.1 * 0.001.
const ZOOM_SENSITIVITY: f32 = 0.1 * 0.001;

pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_rad: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn default_pose() -> Self {
        Self {
            position: DEFAULT_EYE,
            target: DEFAULT_TARGET,
            up: Vec3::Z,
            fov_y_rad: 55.0f32.to_radians(),
            near: 0.1,
            far: 2000.0,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix_gl(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y_rad, aspect_ratio, self.near, self.far)
    }

    pub fn distance(&self) -> f32 {
        (self.position - self.target).length()
    }
}

/// Camera-relative pan directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanDirection {
    Forward,
    Backward,
    Left,
    Right,
}

/// One frame's worth of camera input, produced by the event wiring.
#[derive(Debug, Clone, Copy)]
pub enum CameraCommand {
    /// Gesture start: pointer pressed at (x, y).
    RotateStart { x: f64, y: f64 },
    /// Pointer sample; only rotates while a gesture is active.
    PointerMoved { x: f64, y: f64 },
    /// Gesture end (release, leave, or touch end).
    RotateEnd,
    /// Directional control pressed; held until [`CameraCommand::PanEnd`].
    PanStart(PanDirection),
    /// Directional control released.
    PanEnd,
    /// Wheel input; positive delta zooms out.
    Zoom { delta: f32 },
    /// Return to the fixed default pose, from any state.
    Reset,
}

/// The repeating movement task scheduled while a pan control is held.
struct PanTask {
    direction: PanDirection,
    next_step: Instant,
}

/// Interprets queued commands into camera pose changes.
///
/// States: idle, rotating (pointer held), panning (direction held). At most
/// one pan task exists; scheduling a new one replaces the old, and
/// cancellation is idempotent.
pub struct CameraController {
    queue: VecDeque<CameraCommand>,
    rotating: bool,
    last_pointer: Option<(f64, f64)>,
    pan: Option<PanTask>,
}

impl CameraController {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            rotating: false,
            last_pointer: None,
            pan: None,
        }
    }

    pub fn push(&mut self, command: CameraCommand) {
        self.queue.push_back(command);
    }

    pub fn is_rotating(&self) -> bool {
        self.rotating
    }

    pub fn is_panning(&self) -> bool {
        self.pan.is_some()
    }

    /// Drains the command queue, then runs any pan steps that have come due.
    /// Called once per frame with the current time.
    pub fn update(&mut self, camera: &mut Camera, now: Instant) {
        while let Some(command) = self.queue.pop_front() {
            self.apply(command, camera, now);
        }

        // A held direction keeps stepping on a fixed cadence. The first step
        // already ran inside `apply`, so only overdue repeats fire here.
        while let Some(task) = self.pan.as_mut().filter(|t| t.next_step <= now) {
            let direction = task.direction;
            task.next_step += PAN_INTERVAL;
            Self::pan_step(camera, direction);
        }
    }

    fn apply(&mut self, command: CameraCommand, camera: &mut Camera, now: Instant) {
        match command {
            CameraCommand::RotateStart { x, y } => {
                self.rotating = true;
                self.last_pointer = Some((x, y));
            }
            CameraCommand::PointerMoved { x, y } => {
                if self.rotating {
                    if let Some((lx, ly)) = self.last_pointer {
                        let dx = (x - lx) as f32 * ROTATE_SPEED;
                        let dy = (y - ly) as f32 * ROTATE_SPEED;
                        Self::orbit(camera, dx, dy);
                    }
                    self.last_pointer = Some((x, y));
                }
            }
            CameraCommand::RotateEnd => {
                self.rotating = false;
                self.last_pointer = None;
            }
            CameraCommand::PanStart(direction) => {
                // Replace any running task so exactly one cadence is active,
                // and answer the press immediately.
                Self::pan_step(camera, direction);
                self.pan = Some(PanTask {
                    direction,
                    next_step: now + PAN_INTERVAL,
                });
            }
            CameraCommand::PanEnd => {
                self.pan = None;
            }
            CameraCommand::Zoom { delta } => {
                let offset = camera.position - camera.target;
                camera.position = camera.target + offset * (1.0 + delta * ZOOM_SENSITIVITY);
            }
            CameraCommand::Reset => {
                self.rotating = false;
                self.last_pointer = None;
                self.pan = None;
                camera.position = DEFAULT_EYE;
                camera.target = DEFAULT_TARGET;
                camera.up = Vec3::Z;
            }
        }
    }

    /// Orbits the eye about the target: yaw about world-up, then pitch about
    /// the camera's instantaneous right vector. Incremental, not absolute.
    fn orbit(camera: &mut Camera, dx: f32, dy: f32) {
        let offset = camera.position - camera.target;
        let forward = (-offset).normalize_or_zero();
        let right = forward.cross(camera.up).normalize_or_zero();

        let yaw = Quat::from_axis_angle(camera.up, -dx);
        let pitch = Quat::from_axis_angle(right, -dy);
        camera.position = camera.target + pitch * (yaw * offset);
    }

    /// One movement step along the camera-relative direction, keeping the
    /// look-at target at the origin.
    fn pan_step(camera: &mut Camera, direction: PanDirection) {
        let forward = (camera.target - camera.position).normalize_or_zero();
        let right = forward.cross(camera.up).normalize_or_zero();

        let step = match direction {
            PanDirection::Forward => forward,
            PanDirection::Backward => -forward,
            PanDirection::Left => -right,
            PanDirection::Right => right,
        };
        camera.position += step * PAN_STEP;
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig() -> (Camera, CameraController, Instant) {
        (Camera::default_pose(), CameraController::new(), Instant::now())
    }

    #[test]
    fn zero_delta_rotation_is_identity() {
        let (mut cam, mut ctl, t0) = rig();
        let before = cam.position;

        ctl.push(CameraCommand::RotateStart { x: 10.0, y: 20.0 });
        ctl.push(CameraCommand::PointerMoved { x: 10.0, y: 20.0 });
        ctl.update(&mut cam, t0);

        assert_eq!(cam.position, before);
    }

    #[test]
    fn rotation_preserves_distance() {
        let (mut cam, mut ctl, t0) = rig();
        let before = cam.distance();

        ctl.push(CameraCommand::RotateStart { x: 0.0, y: 0.0 });
        ctl.push(CameraCommand::PointerMoved { x: 35.0, y: -12.0 });
        ctl.update(&mut cam, t0);

        assert!((cam.distance() - before).abs() < 1e-3);
        assert_ne!(cam.position, DEFAULT_EYE);
    }

    #[test]
    fn pointer_moves_without_gesture_do_nothing() {
        let (mut cam, mut ctl, t0) = rig();
        ctl.push(CameraCommand::PointerMoved { x: 500.0, y: 500.0 });
        ctl.update(&mut cam, t0);
        assert_eq!(cam.position, DEFAULT_EYE);
    }

    #[test]
    fn wheel_delta_100_scales_distance_by_1_01() {
        let (mut cam, mut ctl, t0) = rig();
        let before = cam.distance();

        ctl.push(CameraCommand::Zoom { delta: 100.0 });
        ctl.update(&mut cam, t0);

        let expected = before * 1.01;
        assert!((cam.distance() - expected).abs() < 1e-3);
    }

    #[test]
    fn pan_steps_once_immediately_then_on_interval() {
        let (mut cam, mut ctl, t0) = rig();
        let start = cam.position;

        ctl.push(CameraCommand::PanStart(PanDirection::Forward));
        ctl.update(&mut cam, t0);
        let after_press = cam.position;
        assert_ne!(after_press, start, "no immediate step");

        // Nothing more before the interval elapses.
        ctl.update(&mut cam, t0 + PAN_INTERVAL / 2);
        assert_eq!(cam.position, after_press);

        // Ten intervals later, exactly ten more steps have run.
        ctl.update(&mut cam, t0 + PAN_INTERVAL * 10);
        let travelled = (cam.position - start).length();
        let per_step = (after_press - start).length();
        assert!((travelled - per_step * 11.0).abs() < 1e-2);
    }

    #[test]
    fn second_pan_replaces_the_first() {
        let (mut cam, mut ctl, t0) = rig();

        ctl.push(CameraCommand::PanStart(PanDirection::Left));
        ctl.update(&mut cam, t0);
        ctl.push(CameraCommand::PanStart(PanDirection::Right));
        ctl.update(&mut cam, t0);

        // Over a simulated second, steps accrue at the single-task rate:
        // 20 repeats, never 40.
        let before = cam.position;
        ctl.update(&mut cam, t0 + Duration::from_secs(1));
        let steps = ((cam.position - before).length() / PAN_STEP).round() as u32;
        assert_eq!(steps, 20);
        assert!(ctl.is_panning());
    }

    #[test]
    fn pan_cancellation_is_idempotent() {
        let (mut cam, mut ctl, t0) = rig();

        ctl.push(CameraCommand::PanStart(PanDirection::Backward));
        ctl.update(&mut cam, t0);
        ctl.push(CameraCommand::PanEnd);
        ctl.push(CameraCommand::PanEnd);
        ctl.update(&mut cam, t0);

        let frozen = cam.position;
        ctl.update(&mut cam, t0 + Duration::from_secs(5));
        assert_eq!(cam.position, frozen, "tick fired after cancellation");
        assert!(!ctl.is_panning());
    }

    #[test]
    fn reset_restores_default_pose_from_any_state() {
        let (mut cam, mut ctl, t0) = rig();

        // From Rotating.
        ctl.push(CameraCommand::RotateStart { x: 0.0, y: 0.0 });
        ctl.push(CameraCommand::PointerMoved { x: 80.0, y: 40.0 });
        ctl.push(CameraCommand::Reset);
        ctl.update(&mut cam, t0);
        assert_eq!(cam.position, DEFAULT_EYE);
        assert_eq!(cam.target, DEFAULT_TARGET);
        assert!(!ctl.is_rotating());

        // From Panning; the repeating task must die with the reset.
        ctl.push(CameraCommand::PanStart(PanDirection::Forward));
        ctl.update(&mut cam, t0);
        ctl.push(CameraCommand::Reset);
        ctl.update(&mut cam, t0);
        ctl.update(&mut cam, t0 + Duration::from_secs(1));
        assert_eq!(cam.position, DEFAULT_EYE);
        assert!(!ctl.is_panning());

        // From Idle, after a zoom.
        ctl.push(CameraCommand::Zoom { delta: 300.0 });
        ctl.push(CameraCommand::Reset);
        ctl.update(&mut cam, t0);
        assert_eq!(cam.position, DEFAULT_EYE);
    }

    #[test]
    fn pan_is_camera_relative() {
        let (mut cam, mut ctl, t0) = rig();

        // Looking along +Y-ish from the default eye: forward gains +Y and
        // descends toward the target.
        ctl.push(CameraCommand::PanStart(PanDirection::Forward));
        ctl.update(&mut cam, t0);
        assert!(cam.position.y > DEFAULT_EYE.y);
        assert!(cam.position.z < DEFAULT_EYE.z);

        ctl.push(CameraCommand::PanEnd);
        ctl.push(CameraCommand::Reset);
        ctl.update(&mut cam, t0);

        // Right is +X when forward is +Y-ish and up is +Z.
        ctl.push(CameraCommand::PanStart(PanDirection::Right));
        ctl.update(&mut cam, t0);
        assert!(cam.position.x > 0.0);
    }
}
