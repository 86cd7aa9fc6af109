//! Projection and view-platform management for the home camera.
//!
//! Plan coordinates map to the renderer as `(x, elevation, y)`: the plan `y`
//! axis points towards the viewer and the elevation is the up axis.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use cgmath::{Matrix4, Point3, Rad, Vector3};

use crate::bounds::BoundsCache;
use crate::config::ViewConfig;
use crate::home::{Camera, Home};
use crate::scene::View;
use crate::tasks::TaskQueue;

/// Location and orientation part of a camera, the part that gets animated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub yaw: f32,
    pub pitch: f32,
}

impl CameraPose {
    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            x: camera.x,
            y: camera.y,
            z: camera.z,
            yaw: camera.yaw,
            pitch: camera.pitch,
        }
    }

    /// Linear interpolation from `self` to `target`; `alpha` in `[0, 1]`.
    pub fn interpolate(&self, target: &CameraPose, alpha: f32) -> CameraPose {
        let lerp = |from: f32, to: f32| from + (to - from) * alpha;
        CameraPose {
            x: lerp(self.x, target.x),
            y: lerp(self.y, target.y),
            z: lerp(self.z, target.z),
            yaw: lerp(self.yaw, target.yaw),
            pitch: lerp(self.pitch, target.pitch),
        }
    }
}

/// Returns the transform placing the eye of a camera in the world: a
/// translation to the camera location after the yaw then pitch rotations.
pub fn compute_view_platform_transform(pose: &CameraPose) -> Matrix4<f32> {
    Matrix4::from_translation(Vector3::new(pose.x, pose.z, pose.y))
        * Matrix4::from_angle_y(Rad(std::f32::consts::PI - pose.yaw))
        * Matrix4::from_angle_x(Rad(-pose.pitch))
}

#[derive(Debug, Clone, Copy)]
struct CameraAnimation {
    initial: CameraPose,
    target: CameraPose,
    start: Duration,
    alpha: f32,
}

/// Owns the renderer [`View`] and keeps it in sync with the home camera.
pub struct ViewController {
    view: View,
    config: ViewConfig,
    bounds: BoundsCache,
    applied: Option<CameraPose>,
    animation: Option<CameraAnimation>,
    frame_requested: bool,
}

impl ViewController {
    pub fn new(config: ViewConfig, width: u32, height: u32) -> Self {
        let view = View::new(width, height, config.depth_bits);
        Self {
            view,
            config,
            bounds: BoundsCache::new(),
            applied: None,
            animation: None,
            frame_requested: false,
        }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.view.set_size(width, height);
    }

    /// Drops the cached home bounds and height.
    pub fn invalidate_bounds(&mut self) {
        self.bounds.invalidate();
    }

    pub fn bounds_cached(&self) -> bool {
        self.bounds.is_valid()
    }

    /// Pose of the last view-platform transform set on the view.
    pub fn applied_pose(&self) -> Option<CameraPose> {
        self.applied
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some_and(|animation| animation.alpha < 1.0)
    }

    /// Updates the field of view and the clip distances for `camera`.
    ///
    /// The front clip distance grows when the camera is far from the home so
    /// the depth buffer keeps enough precision, and shrinks when the ground
    /// would otherwise be cut at the bottom of the view.
    pub fn update_projection(&mut self, camera: &Camera, home: &Home) {
        let field_of_view = if camera.field_of_view == 0.0 {
            self.config.default_field_of_view_degrees.to_radians()
        } else {
            camera.field_of_view
        };
        self.view.set_field_of_view(field_of_view);

        let mut front = self.config.min_front_clip_distance;
        let ratio;
        if self.view.depth_bits() <= self.config.low_precision_depth_bits {
            ratio = self.config.low_precision_back_clip_ratio;
            let eye = Point3::new(camera.x, camera.y, camera.z);
            if let Some(bounds) = self.bounds.bounds(home) {
                if !bounds.contains_point(eye) {
                    let distance = bounds.distance_to_point(eye);
                    if distance.is_finite() {
                        front = front.max(0.1 * distance);
                    }
                }
            }
        } else {
            ratio = self.config.back_clip_ratio;
            let home_height = self.bounds.home_height(home);
            if camera.z > home_height {
                front = front.max((camera.z - home_height) / 10.0);
            }
        }

        if camera.z > 0.0 && self.view.has_area() {
            let aspect = self.view.height() as f32 / self.view.width() as f32;
            let half_vertical = ((field_of_view / 2.0).tan() * aspect).atan();
            let bottom_angle = camera.pitch + half_vertical;
            // Horizon above the frustum bottom: the ground must stay visible
            if bottom_angle > 0.0 {
                let ground_distance = camera.z / bottom_angle.sin();
                front = front.min(self.config.horizon_front_clip_factor * ground_distance);
                if front * ratio < ground_distance {
                    front = ground_distance / ratio;
                }
            }
        }

        log::trace!("Clip distances {} .. {}", front, front * ratio);
        self.view.set_front_clip_distance(front);
        self.view.set_back_clip_distance(front * ratio);
    }

    /// Places the eye at `camera` at once, cancelling any animation.
    pub fn apply_camera(&mut self, camera: &Camera) {
        self.animation = None;
        self.set_pose(CameraPose::from_camera(camera));
    }

    fn set_pose(&mut self, pose: CameraPose) {
        self.view.set_view_platform_transform(compute_view_platform_transform(&pose));
        self.applied = Some(pose);
    }

    /// Starts or retargets an animation towards `camera`.
    ///
    /// Returns `true` when animation frames are needed.
    pub fn begin_animation(&mut self, camera: &Camera, now: Duration) -> bool {
        let target = CameraPose::from_camera(camera);
        match self.animation {
            Some(animation) if animation.target == target => return false,
            None if self.applied == Some(target) => return false,
            _ => {}
        }

        let initial = match self.animation.take() {
            None => self.applied.unwrap_or(target),
            Some(animation) if animation.alpha >= 1.0 => animation.target,
            Some(animation) if animation.alpha > self.config.animation_rebase_threshold => {
                // Well under way: finish the previous move at once
                self.set_pose(animation.target);
                animation.target
            }
            Some(animation) => animation.initial.interpolate(&animation.target, animation.alpha),
        };
        self.animation = Some(CameraAnimation {
            initial,
            target,
            start: now,
            alpha: 0.0,
        });
        true
    }

    /// Moves the running animation to the time `now`.
    ///
    /// Returns `true` while the target is not reached.
    pub fn step_animation(&mut self, now: Duration) -> bool {
        let Some(animation) = self.animation.as_mut() else {
            return false;
        };
        if animation.alpha >= 1.0 {
            return false;
        }
        let duration = self.config.animation_duration().as_secs_f32();
        let alpha = if duration > 0.0 {
            (now.saturating_sub(animation.start).as_secs_f32() / duration).min(1.0)
        } else {
            1.0
        };
        if alpha != animation.alpha {
            animation.alpha = alpha;
            let pose = animation.initial.interpolate(&animation.target, alpha);
            self.set_pose(pose);
        }
        alpha < 1.0
    }

    /// Updates the view-platform transform for `camera`, smoothly when
    /// `animated` is set.
    pub fn update_view_transform(controller: &Rc<RefCell<Self>>, camera: &Camera, animated: bool, tasks: &TaskQueue) {
        let needs_frame = {
            let mut this = controller.borrow_mut();
            if animated {
                this.begin_animation(camera, tasks.now()) && !this.frame_requested
            } else {
                this.apply_camera(camera);
                false
            }
        };
        if needs_frame {
            Self::request_frame(controller, tasks);
        }
    }

    fn request_frame(controller: &Rc<RefCell<Self>>, tasks: &TaskQueue) {
        controller.borrow_mut().frame_requested = true;
        let weak = Rc::downgrade(controller);
        let queue = tasks.clone();
        tasks.request_animation_frame(move || {
            let Some(controller) = weak.upgrade() else {
                return;
            };
            let running = {
                let mut this = controller.borrow_mut();
                this.frame_requested = false;
                this.step_animation(queue.now())
            };
            if running {
                Self::request_frame(&controller, &queue);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::home::Wall;
    use cgmath::{InnerSpace, SquareMatrix, Vector4};

    const EPSILON: f32 = 1e-3;

    fn camera(x: f32, y: f32, z: f32, yaw: f32, pitch: f32) -> Camera {
        Camera::new(x, y, z, yaw, pitch, 63f32.to_radians())
    }

    fn assert_matrix_eq(a: Matrix4<f32>, b: Matrix4<f32>) {
        for column in 0..4 {
            assert!((a[column] - b[column]).magnitude() < EPSILON, "{:?} != {:?}", a, b);
        }
    }

    // ===== View Transform Tests =====

    #[test]
    fn test_view_transform_round_trip() {
        let pose = CameraPose { x: 120.0, y: -340.0, z: 170.0, yaw: 0.7, pitch: 0.3 };
        let transform = compute_view_platform_transform(&pose);
        let eye = transform * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!((eye.truncate() - Vector3::new(120.0, 170.0, -340.0)).magnitude() < EPSILON);

        let view_matrix = transform.invert().unwrap();
        let origin = view_matrix * Vector4::new(120.0, 170.0, -340.0, 1.0);
        assert!(origin.truncate().magnitude() < EPSILON);
    }

    #[test]
    fn test_zero_yaw_looks_towards_plan_y() {
        let pose = CameraPose { x: 0.0, y: 0.0, z: 0.0, yaw: 0.0, pitch: 0.0 };
        let forward = compute_view_platform_transform(&pose) * Vector4::new(0.0, 0.0, -1.0, 0.0);
        // Renderer z is the plan y axis
        assert!((forward.truncate() - Vector3::new(0.0, 0.0, 1.0)).magnitude() < EPSILON);
    }

    #[test]
    fn test_apply_camera_sets_transform() {
        let mut controller = ViewController::new(ViewConfig::default(), 200, 100);
        let target = camera(10.0, 20.0, 30.0, 1.0, 0.2);
        controller.apply_camera(&target);
        assert_matrix_eq(
            controller.view().view_platform_transform(),
            compute_view_platform_transform(&CameraPose::from_camera(&target)),
        );
        assert!(!controller.is_animating());
    }

    // ===== Animation Tests =====

    #[test]
    fn test_animation_converges_to_target() {
        let controller = Rc::new(RefCell::new(ViewController::new(ViewConfig::default(), 200, 100)));
        let tasks = TaskQueue::new();
        ViewController::update_view_transform(&controller, &camera(0.0, 0.0, 100.0, 0.0, 0.0), false, &tasks);

        let target = camera(500.0, 300.0, 200.0, 1.5, 0.4);
        ViewController::update_view_transform(&controller, &target, true, &tasks);
        assert!(controller.borrow().is_animating());
        assert_eq!(tasks.pending_frames(), 1);

        let frames = tasks.run_frames_until_idle(Duration::from_millis(16));
        assert_eq!(frames, 5);
        assert!(!controller.borrow().is_animating());
        assert_matrix_eq(
            controller.borrow().view().view_platform_transform(),
            compute_view_platform_transform(&CameraPose::from_camera(&target)),
        );
    }

    #[test]
    fn test_same_target_does_not_restart() {
        let mut controller = ViewController::new(ViewConfig::default(), 200, 100);
        let target = camera(50.0, 0.0, 100.0, 0.0, 0.0);
        controller.apply_camera(&camera(0.0, 0.0, 100.0, 0.0, 0.0));
        assert!(controller.begin_animation(&target, Duration::ZERO));
        assert!(!controller.begin_animation(&target, Duration::from_millis(10)));

        let mut idle = ViewController::new(ViewConfig::default(), 200, 100);
        idle.apply_camera(&target);
        assert!(!idle.begin_animation(&target, Duration::ZERO));
    }

    #[test]
    fn test_late_retarget_jumps_to_previous_target() {
        let mut controller = ViewController::new(ViewConfig::default(), 200, 100);
        controller.apply_camera(&camera(0.0, 0.0, 100.0, 0.0, 0.0));
        controller.begin_animation(&camera(100.0, 0.0, 100.0, 0.0, 0.0), Duration::ZERO);
        controller.step_animation(Duration::from_millis(45));

        controller.begin_animation(&camera(200.0, 0.0, 100.0, 0.0, 0.0), Duration::from_millis(45));
        assert_eq!(controller.applied_pose().unwrap().x, 100.0);
        controller.step_animation(Duration::from_millis(45 + 75 / 2));
        let x = controller.applied_pose().unwrap().x;
        assert!((x - 150.0).abs() < 1.0, "x = {}", x);
    }

    #[test]
    fn test_early_retarget_rebases_on_current_pose() {
        let mut controller = ViewController::new(ViewConfig::default(), 200, 100);
        controller.apply_camera(&camera(0.0, 0.0, 100.0, 0.0, 0.0));
        controller.begin_animation(&camera(100.0, 0.0, 100.0, 0.0, 0.0), Duration::ZERO);
        controller.step_animation(Duration::from_millis(15));
        let before = controller.applied_pose().unwrap().x;
        assert!((before - 20.0).abs() < 0.5);

        controller.begin_animation(&camera(0.0, 100.0, 100.0, 0.0, 0.0), Duration::from_millis(15));
        assert_eq!(controller.applied_pose().unwrap().x, before);
        controller.step_animation(Duration::from_millis(15 + 75));
        let pose = controller.applied_pose().unwrap();
        assert_eq!((pose.x, pose.y), (0.0, 100.0));
    }

    #[test]
    fn test_immediate_update_cancels_animation() {
        let controller = Rc::new(RefCell::new(ViewController::new(ViewConfig::default(), 200, 100)));
        let tasks = TaskQueue::new();
        ViewController::update_view_transform(&controller, &camera(0.0, 0.0, 100.0, 0.0, 0.0), false, &tasks);
        ViewController::update_view_transform(&controller, &camera(100.0, 0.0, 100.0, 0.0, 0.0), true, &tasks);
        let last = camera(-50.0, 0.0, 100.0, 0.0, 0.0);
        ViewController::update_view_transform(&controller, &last, false, &tasks);

        tasks.run_frames_until_idle(Duration::from_millis(16));
        assert_eq!(controller.borrow().applied_pose(), Some(CameraPose::from_camera(&last)));
    }

    // ===== Projection Tests =====

    fn square_home() -> Home {
        let mut home = Home::new();
        home.add_wall(Wall::new(0.0, 0.0, 1000.0, 1000.0, 10.0));
        home
    }

    #[test]
    fn test_default_field_of_view_when_zero() {
        let mut controller = ViewController::new(ViewConfig::default(), 200, 100);
        let mut top = camera(0.0, 0.0, 100.0, 0.0, 0.0);
        top.field_of_view = 0.0;
        controller.update_projection(&top, &Home::new());
        assert!((controller.view().field_of_view() - 63f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn test_low_precision_front_clip_grows_outside_bounds() {
        let config = ViewConfig {
            depth_bits: 16,
            ..ViewConfig::default()
        };
        let home = square_home();
        let mut controller = ViewController::new(config, 200, 100);
        let looking_up = -std::f32::consts::FRAC_PI_4;

        controller.update_projection(&camera(500.0, 500.0, 100.0, 0.0, looking_up), &home);
        assert_eq!(controller.view().front_clip_distance(), 2.5);
        assert_eq!(controller.view().back_clip_distance(), 7500.0);

        controller.update_projection(&camera(11000.0, 500.0, 100.0, 0.0, looking_up), &home);
        assert!((controller.view().front_clip_distance() - 1000.0).abs() < EPSILON);
        assert!((controller.view().back_clip_distance() - 3_000_000.0).abs() < 1.0);
    }

    #[test]
    fn test_front_clip_grows_above_home() {
        let home = square_home();
        let mut controller = ViewController::new(ViewConfig::default(), 200, 100);
        controller.update_projection(&camera(0.0, 0.0, 1250.0, 0.0, -std::f32::consts::FRAC_PI_4), &home);
        assert!((controller.view().front_clip_distance() - 100.0).abs() < EPSILON);
        assert!((controller.view().back_clip_distance() - 50_000_000.0).abs() < 10.0);
    }

    #[test]
    fn test_front_clip_keeps_ground_visible() {
        let home = square_home();
        let mut controller = ViewController::new(ViewConfig::default(), 200, 100);
        let pitch = std::f32::consts::FRAC_PI_4;
        controller.update_projection(&camera(0.0, 0.0, 1.0, 0.0, pitch), &home);

        let half_vertical = ((63f32.to_radians() / 2.0).tan() * 0.5).atan();
        let ground_distance = 1.0 / (pitch + half_vertical).sin();
        let front = controller.view().front_clip_distance();
        assert!(front < 2.5);
        assert!((front - 0.35 * ground_distance).abs() < 1e-4);
    }

    #[test]
    fn test_bounds_cache_needs_invalidation() {
        let config = ViewConfig {
            depth_bits: 16,
            ..ViewConfig::default()
        };
        let mut home = Home::new();
        let mut controller = ViewController::new(config, 200, 100);
        let outside = camera(11000.0, 500.0, 100.0, 0.0, -std::f32::consts::FRAC_PI_4);
        controller.update_projection(&outside, &home);
        assert_eq!(controller.view().front_clip_distance(), 2.5);

        home.add_wall(Wall::new(0.0, 0.0, 1000.0, 1000.0, 10.0));
        controller.update_projection(&outside, &home);
        assert_eq!(controller.view().front_clip_distance(), 2.5);
        controller.invalidate_bounds();
        controller.update_projection(&outside, &home);
        assert!(controller.view().front_clip_distance() > 2.5);
    }
}
