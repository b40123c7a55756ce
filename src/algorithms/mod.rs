//! Geolocation algorithms, leaf to root: path loss, projection, circle
//! intersection, then the four estimators.

pub mod accumulator;
pub mod centroid;
pub mod intersection;
pub mod linalg;
pub mod path_loss;
pub mod projection;
pub mod robust;
pub mod wls;

pub use accumulator::{VoteEstimate, VotingClusterer};
pub use centroid::CentroidEstimator;
pub use intersection::{intersect, pairwise_intersections};
pub use linalg::{solve_2x2, ClosedForm2x2, LuSolver, NormalEquationSolver};
pub use path_loss::PathLossModel;
pub use projection::{to_lat_lon, to_xy, LocalPlane};
pub use robust::{RobustEstimator, RobustSolution};
pub use wls::{Termination, WeightedLeastSquaresSolver, WlsSolution};
