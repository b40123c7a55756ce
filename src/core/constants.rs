//! Physical constants and numeric guards shared by the estimators

/// Mean Earth radius used by the equirectangular projection (m)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Weakest RSSI accepted before any distance or weight computation (dBm)
pub const RSSI_FLOOR_DBM: f64 = -140.0;

/// Strongest RSSI accepted before any distance or weight computation (dBm)
pub const RSSI_CEILING_DBM: f64 = -20.0;

/// Lower bound for the path-loss exponent
pub const MIN_PATH_LOSS_EXPONENT: f64 = 0.1;

/// Inferred distances are clipped to this range (m)
pub const MIN_DISTANCE_M: f64 = 1.0;
pub const MAX_DISTANCE_M: f64 = 50_000.0;

/// Smallest clustering radius for the accumulator method (m)
pub const MIN_BANDWIDTH_M: f64 = 5.0;

/// Separation/half-chord below which circle geometry is treated as degenerate (m)
pub const GEOMETRY_EPSILON_M: f64 = 1e-6;

/// Normal-equation determinant below which the 2x2 system is singular
pub const SINGULAR_DETERMINANT: f64 = 1e-10;

/// Consistency constant turning a MAD into a Gaussian sigma
pub const MAD_TO_SIGMA: f64 = 1.4826;

/// Fewest observations for circle intersection voting
pub const MIN_OBSERVATIONS_GEOMETRIC: usize = 2;

/// Fewest observations for the least-squares solvers
pub const MIN_OBSERVATIONS_LEAST_SQUARES: usize = 3;
