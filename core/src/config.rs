//! Tunable constants of the 3D component.
//!
//! Every struct implements [`Default`] with the values the component was
//! designed around, and deserializes with missing fields defaulted so hosts
//! can override a few settings from JSON.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::input::PlatformFamily;

/// Touch, mouse and wheel gesture settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Delay before a still touch starts the long touch countdown.
    pub long_touch_delay_ms: u64,
    /// Countdown duration once the long touch delay elapsed.
    pub long_touch_duration_ms: u64,
    pub double_touch_delay_ms: u64,
    /// Maximum distance in pixels between the two taps of a double tap.
    pub double_tap_radius: f32,
    /// Jitter threshold right after a touch start, in pixels.
    pub touch_start_jitter: f32,
    /// Jitter threshold for the other touch events, in pixels.
    pub touch_jitter: f32,
    /// Radians per pixel for mouse rotation.
    pub rotation_factor: f32,
    /// Camera move per pixel for vertical mouse moves with alt.
    pub mouse_move_factor: f32,
    pub wheel_delta_divisor: f32,
    pub wheel_move_factor: f32,
    /// Camera move for a pinch that would bring both fingers together.
    pub pinch_zoom_factor: f32,
    /// Multiplier applied when shift is down.
    pub fast_multiplier: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            long_touch_delay_ms: 200,
            long_touch_duration_ms: 800,
            double_touch_delay_ms: 500,
            double_tap_radius: 5.0,
            touch_start_jitter: 5.0,
            touch_jitter: 1.5,
            rotation_factor: 0.005,
            mouse_move_factor: 1.25,
            wheel_delta_divisor: 4.0,
            wheel_move_factor: 2.5,
            pinch_zoom_factor: 50.0,
            fast_multiplier: 5.0,
        }
    }
}

impl GestureConfig {
    pub fn long_touch_delay(&self) -> Duration {
        Duration::from_millis(self.long_touch_delay_ms)
    }

    pub fn long_touch_duration(&self) -> Duration {
        Duration::from_millis(self.long_touch_duration_ms)
    }

    pub fn double_touch_delay(&self) -> Duration {
        Duration::from_millis(self.double_touch_delay_ms)
    }
}

/// Projection and camera animation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Used when the camera field of view is zero.
    pub default_field_of_view_degrees: f32,
    pub min_front_clip_distance: f32,
    pub back_clip_ratio: f32,
    pub low_precision_back_clip_ratio: f32,
    /// Depth buffers with at most this many bits are low precision.
    pub low_precision_depth_bits: u32,
    /// Depth buffer precision of the canvas.
    pub depth_bits: u32,
    /// Share of the distance to the horizon intersection kept as front clip distance.
    pub horizon_front_clip_factor: f32,
    pub animation_duration_ms: u64,
    /// Animation progress below which a new target rebases on the current pose.
    pub animation_rebase_threshold: f32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_field_of_view_degrees: 63.0,
            min_front_clip_distance: 2.5,
            back_clip_ratio: 500_000.0,
            low_precision_back_clip_ratio: 3000.0,
            low_precision_depth_bits: 16,
            depth_bits: 24,
            horizon_front_clip_factor: 0.35,
            animation_duration_ms: 75,
            animation_rebase_threshold: 0.3,
        }
    }
}

impl ViewConfig {
    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_duration_ms)
    }

    pub fn is_low_precision(&self) -> bool {
        self.depth_bits <= self.low_precision_depth_bits
    }
}

/// Camera deltas applied by keyboard actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardConfig {
    pub move_delta: f32,
    pub fast_move_delta: f32,
    pub sideways_delta: f32,
    pub fast_sideways_delta: f32,
    pub elevate_delta: f32,
    pub fast_elevate_delta: f32,
    pub yaw_delta: f32,
    pub fast_yaw_delta: f32,
    pub pitch_delta: f32,
    pub fast_pitch_delta: f32,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        use std::f32::consts::PI;
        Self {
            move_delta: 6.5,
            fast_move_delta: 32.5,
            sideways_delta: 2.5,
            fast_sideways_delta: 10.0,
            elevate_delta: 2.5,
            fast_elevate_delta: 10.0,
            yaw_delta: PI / 60.0,
            fast_yaw_delta: PI / 12.0,
            pitch_delta: PI / 120.0,
            fast_pitch_delta: PI / 24.0,
        }
    }
}

/// Configuration of a [`crate::HomeComponent3D`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Component3DConfig {
    /// Selects the modifier keys for alignment, duplication and magnetism.
    pub platform: PlatformFamily,
    pub gesture: GestureConfig,
    pub view: ViewConfig,
    pub keyboard: KeyboardConfig,
}

fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}

impl Component3DConfig {
    /// Checks that every ratio, factor and duration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let gesture = &self.gesture;
        positive("gesture.double_tap_radius", gesture.double_tap_radius)?;
        positive("gesture.rotation_factor", gesture.rotation_factor)?;
        positive("gesture.mouse_move_factor", gesture.mouse_move_factor)?;
        positive("gesture.wheel_delta_divisor", gesture.wheel_delta_divisor)?;
        positive("gesture.wheel_move_factor", gesture.wheel_move_factor)?;
        positive("gesture.pinch_zoom_factor", gesture.pinch_zoom_factor)?;
        positive("gesture.fast_multiplier", gesture.fast_multiplier)?;
        if gesture.touch_jitter < 0.0 || gesture.touch_start_jitter < 0.0 {
            return Err(ConfigError::NotPositive {
                name: "gesture.touch_jitter",
                value: gesture.touch_jitter.min(gesture.touch_start_jitter),
            });
        }
        if gesture.long_touch_duration_ms == 0 {
            return Err(ConfigError::ZeroDuration { name: "gesture.long_touch_duration_ms" });
        }

        let view = &self.view;
        positive("view.default_field_of_view_degrees", view.default_field_of_view_degrees)?;
        positive("view.min_front_clip_distance", view.min_front_clip_distance)?;
        positive("view.back_clip_ratio", view.back_clip_ratio)?;
        positive("view.low_precision_back_clip_ratio", view.low_precision_back_clip_ratio)?;
        positive("view.horizon_front_clip_factor", view.horizon_front_clip_factor)?;
        if view.animation_duration_ms == 0 {
            return Err(ConfigError::ZeroDuration { name: "view.animation_duration_ms" });
        }
        if !(0.0..=1.0).contains(&view.animation_rebase_threshold) {
            return Err(ConfigError::OutOfUnitRange {
                name: "view.animation_rebase_threshold",
                value: view.animation_rebase_threshold,
            });
        }

        let keyboard = &self.keyboard;
        for (name, value) in [
            ("keyboard.move_delta", keyboard.move_delta),
            ("keyboard.fast_move_delta", keyboard.fast_move_delta),
            ("keyboard.sideways_delta", keyboard.sideways_delta),
            ("keyboard.fast_sideways_delta", keyboard.fast_sideways_delta),
            ("keyboard.elevate_delta", keyboard.elevate_delta),
            ("keyboard.fast_elevate_delta", keyboard.fast_elevate_delta),
            ("keyboard.yaw_delta", keyboard.yaw_delta),
            ("keyboard.fast_yaw_delta", keyboard.fast_yaw_delta),
            ("keyboard.pitch_delta", keyboard.pitch_delta),
            ("keyboard.fast_pitch_delta", keyboard.fast_pitch_delta),
        ] {
            positive(name, value)?;
        }
        Ok(())
    }
}
