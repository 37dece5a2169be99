// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fan curve interpolation: clamp at the ends, linear between the enclosing
//! pair, round to the nearest integer speed (spec §4.5).

use pankha_storage::types::CurvePoint;

/// Interpolates `temperature` against `points` (must be sorted by
/// `point_order`, already guaranteed by `ProfilesRepo::curve_points`).
/// Panics only if `points` is empty — callers must reject such profiles at
/// creation time (`ProfilesRepo::create` already does).
pub fn interpolate(points: &[CurvePoint], temperature: f64) -> i64 {
    assert!(!points.is_empty(), "a fan curve must have at least one point");

    if temperature <= points[0].temperature {
        return points[0].fan_speed;
    }
    let last = points.len() - 1;
    if temperature >= points[last].temperature {
        return points[last].fan_speed;
    }

    for window in points.windows(2) {
        let (lo, hi) = (&window[0], &window[1]);
        if temperature >= lo.temperature && temperature <= hi.temperature {
            if (hi.temperature - lo.temperature).abs() < f64::EPSILON {
                return hi.fan_speed;
            }
            let fraction = (temperature - lo.temperature) / (hi.temperature - lo.temperature);
            let speed = lo.fan_speed as f64 + fraction * (hi.fan_speed - lo.fan_speed) as f64;
            return speed.round() as i64;
        }
    }

    points[last].fan_speed
}

#[cfg(test)]
#[path = "curve_tests.rs"]
mod tests;
