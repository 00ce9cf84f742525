//! Vector and quaternion helpers used by the force components, the camera rig
//! and replay interpolation.
//!
//! Conventions
//! - Right-handed, +Y up. Yaw 0 faces +Z; positive yaw rotates about +Y.
//! - Interpolation factors are clamped to `[0, 1]`.

use nalgebra as na;

use crate::constants::DIST_EPS;

pub type Vec2 = na::Vector2<f32>;
pub type Vec3 = na::Vector3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;

/// Rotation that takes `from` to `to`, always on the short arc.
///
/// The result is `from⁻¹ · to`, negated when its scalar part is negative so the
/// extracted angle never exceeds π.
pub fn shortest_rotation(from: &Quat, to: &Quat) -> Quat {
    let q = from.inverse() * to;
    if q.w < 0.0 {
        Quat::new_unchecked(-q.into_inner())
    } else {
        q
    }
}

/// Where `value` sits between `a` and `b`, clamped to `[0, 1]`. Returns 0 when
/// the range is empty.
#[inline]
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if a != b {
        ((value - a) / (b - a)).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Maps `value` from `[from_min, from_max]` onto `[to_min, to_max]`, clamped.
#[inline]
pub fn remap(value: f32, from_min: f32, from_max: f32, to_min: f32, to_max: f32) -> f32 {
    lerp(to_min, to_max, inverse_lerp(from_min, from_max, value))
}

#[inline]
pub fn lerp_vec3(a: &Vec3, b: &Vec3, t: f32) -> Vec3 {
    a.lerp(b, t.clamp(0.0, 1.0))
}

/// Spherical interpolation that never panics.
///
/// `UnitQuaternion::slerp` is undefined for rotations exactly half a turn
/// apart; those fall back to a normalized linear blend.
pub fn slerp(a: &Quat, b: &Quat, t: f32) -> Quat {
    let t = t.clamp(0.0, 1.0);
    a.try_slerp(b, t, 1.0e-6)
        .unwrap_or_else(|| Quat::new_normalize(a.into_inner().lerp(&b.into_inner(), t)))
}

/// Drops the vertical component and normalizes. `None` for (near) vertical input.
#[inline]
pub fn flatten(v: &Vec3) -> Option<Vec3> {
    Vec3::new(v.x, 0.0, v.z).try_normalize(DIST_EPS)
}

/// Rotation about +Y by `yaw` radians.
#[inline]
pub fn yaw_rotation(yaw: f32) -> Quat {
    Quat::from_axis_angle(&Vec3::y_axis(), yaw)
}

/// Yaw-only orientation facing along `direction`; `None` if it has no
/// horizontal extent.
pub fn yaw_look_rotation(direction: &Vec3) -> Option<Quat> {
    let flat = flatten(direction)?;
    Some(yaw_rotation(flat.x.atan2(flat.z)))
}

/// Orientation whose +Z points along `direction`, keeping +Y up where
/// possible. Straight up or down uses +Z as the up hint. `None` for a zero
/// vector.
pub fn look_rotation(direction: &Vec3) -> Option<Quat> {
    let dir = direction.try_normalize(DIST_EPS)?;
    let up = if dir.cross(&Vec3::y()).norm_squared() > 1.0e-8 {
        Vec3::y()
    } else {
        Vec3::z()
    };
    Some(Quat::face_towards(&dir, &up))
}

/// Critically damped approach of `current` toward `target`.
///
/// `velocity` carries state between calls. Movement per call is limited to
/// `max_speed * smooth_time` and the result never overshoots `target`.
pub fn smooth_damp_vec3(
    current: &Vec3,
    target: &Vec3,
    velocity: &mut Vec3,
    smooth_time: f32,
    max_speed: f32,
    dt: f32,
) -> Vec3 {
    if dt <= 0.0 {
        return *current;
    }

    let smooth_time = smooth_time.max(1.0e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let mut change = current - target;
    let max_change = max_speed * smooth_time;
    let change_sq = change.norm_squared();
    if change_sq > max_change * max_change {
        change *= max_change / change_sq.sqrt();
    }
    let clamped_target = current - change;

    let temp = (*velocity + change * omega) * dt;
    *velocity = (*velocity - temp * omega) * exp;
    let mut output = clamped_target + (change + temp) * exp;

    // Overshoot check against the unclamped target.
    if (target - current).dot(&(output - target)) > 0.0 {
        output = *target;
        *velocity = (output - target) / dt;
    }

    output
}

/// Rotational counterpart of [`smooth_damp_vec3`] driven by an angular
/// velocity (radians per second, world axes).
pub fn smooth_damp_quat(
    current: &Quat,
    target: &Quat,
    angular_velocity: &mut Vec3,
    smooth_time: f32,
    dt: f32,
) -> Quat {
    if dt <= 0.0 {
        return *current;
    }
    let smooth_time = smooth_time.max(1.0e-4);

    let diff = target * current.inverse();
    let target_velocity = diff
        .axis_angle()
        .map(|(axis, angle)| axis.into_inner() * (angle / smooth_time))
        .unwrap_or_else(Vec3::zeros);

    *angular_velocity = angular_velocity.lerp(&target_velocity, (dt / smooth_time).min(1.0));

    match angular_velocity.try_normalize(DIST_EPS) {
        Some(axis) => {
            let delta = Quat::from_axis_angle(
                &na::Unit::new_unchecked(axis),
                angular_velocity.norm() * dt,
            );
            delta * current
        }
        None => *current,
    }
}
