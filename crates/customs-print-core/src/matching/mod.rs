pub mod policy;
pub mod proximity;

pub use policy::{MatchPolicy, PageVerdict};
pub use proximity::{box_distance, cm_to_points, within_distance, POINTS_PER_CM};
