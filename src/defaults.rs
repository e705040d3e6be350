//! Default tolerances and sampling settings for outline geometry

/// Distance under which a point counts as lying on a curve
pub const ON_CURVE_TOLERANCE: f64 = 1e-6;

/// Tolerance used when comparing parameters and coordinates for equality
pub const EPSILON: f64 = 1e-9;

/// Uniform samples taken along a bezier before refining the nearest point
pub const BEZIER_SAMPLES: usize = 32;

/// Golden-section refinement steps for the nearest point on a bezier
pub const NEAREST_REFINE_STEPS: usize = 48;

/// Line segments per bezier when flattening for containment tests
pub const FLATTEN_SEGMENTS: usize = 24;

/// Cubic approximation constant for a quarter ellipse: 4/3 * (sqrt(2) - 1)
pub const KAPPA: f64 = 0.552_284_749_830_793_4;
