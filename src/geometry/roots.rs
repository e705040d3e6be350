//! Real polynomial roots up to degree three.
//!
//! Curve/line intersection reduces to finding where the signed distance of a
//! bezier to the line vanishes, which is a polynomial in the curve parameter.

use std::f64::consts::PI;

use crate::defaults::EPSILON;

/// Real roots of `c0 + c1*t`
fn solve_linear(c0: f64, c1: f64) -> Vec<f64> {
    if c1.abs() < EPSILON {
        return Vec::new();
    }
    vec![-c0 / c1]
}

/// Real roots of `c0 + c1*t + c2*t^2`
pub fn solve_quadratic(c0: f64, c1: f64, c2: f64) -> Vec<f64> {
    let scale = c0.abs().max(c1.abs()).max(c2.abs());
    if scale == 0.0 {
        return Vec::new();
    }
    if c2.abs() < EPSILON * scale {
        return solve_linear(c0, c1);
    }

    let disc = c1 * c1 - 4.0 * c2 * c0;
    if disc < -EPSILON * scale * scale {
        return Vec::new();
    }
    if disc <= EPSILON * scale * scale {
        return vec![-c1 / (2.0 * c2)];
    }

    // Numerically stable form avoids cancellation when c1^2 >> 4*c2*c0
    let q = -0.5 * (c1 + c1.signum() * disc.sqrt());
    let mut roots = vec![q / c2];
    if q != 0.0 {
        roots.push(c0 / q);
    } else {
        roots.push(-roots[0]);
    }
    roots
}

/// Real roots of `c0 + c1*t + c2*t^2 + c3*t^3`
pub fn solve_cubic(c0: f64, c1: f64, c2: f64, c3: f64) -> Vec<f64> {
    let scale = c0.abs().max(c1.abs()).max(c2.abs()).max(c3.abs());
    if scale == 0.0 {
        return Vec::new();
    }
    if c3.abs() < EPSILON * scale {
        return solve_quadratic(c0, c1, c2);
    }

    // Normalize to t^3 + a t^2 + b t + c
    let a = c2 / c3;
    let b = c1 / c3;
    let c = c0 / c3;

    let q = (3.0 * b - a * a) / 9.0;
    let r = (9.0 * a * b - 27.0 * c - 2.0 * a * a * a) / 54.0;
    let disc = q * q * q + r * r;
    let shift = -a / 3.0;

    let mut roots = if disc > EPSILON {
        let sq = disc.sqrt();
        vec![shift + (r + sq).cbrt() + (r - sq).cbrt()]
    } else if disc >= -EPSILON {
        let s = r.cbrt();
        vec![shift + 2.0 * s, shift - s]
    } else {
        let theta = (r / (-q * q * q).sqrt()).clamp(-1.0, 1.0).acos();
        let m = 2.0 * (-q).sqrt();
        vec![
            shift + m * (theta / 3.0).cos(),
            shift + m * ((theta + 2.0 * PI) / 3.0).cos(),
            shift + m * ((theta + 4.0 * PI) / 3.0).cos(),
        ]
    };

    // One Newton step per root to polish the closed-form result
    for t in roots.iter_mut() {
        let f = ((c3 * *t + c2) * *t + c1) * *t + c0;
        let df = (3.0 * c3 * *t + 2.0 * c2) * *t + c1;
        if df.abs() > EPSILON {
            *t -= f / df;
        }
    }
    roots
}
