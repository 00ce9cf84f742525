/*!
Tolerances, default rates and physical constants shared by the controller and
the replay engine.

Notes
- Distances are in meters, time in seconds.
- Per-instance settings structs default to these values; override them from
  configuration rather than editing the constants.
*/

/// Gravity magnitude in meters per second squared (positive value).
///
/// The jump fall boost is expressed in multiples of this constant, independent
/// of the configured gravity strength.
pub const GRAVITY_MPS2: f32 = 9.81;

/// Vertical speed below which a body counts as falling (m/s).
///
/// Slightly positive so the apex of a jump already counts as falling.
pub const FALLING_VELOCITY_THRESHOLD: f32 = 0.1;

/// Move-input magnitude that separates Idle from Moving.
pub const MOVE_INPUT_DEADZONE: f32 = 0.01;

/// Move-input magnitude that counts as intentional movement for facing and
/// for picking Moving over Idle when a jump ends.
pub const MOVE_INTENT_THRESHOLD: f32 = 0.1;

/// Default sampling interval for player-class objects (seconds, 50 Hz).
pub const DEFAULT_PLAYER_RECORD_INTERVAL: f32 = 0.02;

/// Default sampling interval for normal-class objects (seconds, 10 Hz).
pub const DEFAULT_NORMAL_RECORD_INTERVAL: f32 = 0.1;

/// Playback speed bounds (multiplier of real time).
pub const MIN_PLAYBACK_SPEED: f32 = 0.1;
pub const MAX_PLAYBACK_SPEED: f32 = 3.0;

/// Slack when comparing accumulated timestamps against a due time (seconds).
///
/// Sums of `f32` frame deltas land a hair below exact multiples of the sample
/// interval; without this slack a sample would slip one frame late.
pub const TIME_EPS: f32 = 1.0e-4;

/// Practical small length for normalization guards (meters).
pub const DIST_EPS: f32 = 1.0e-6;
