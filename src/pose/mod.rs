pub mod crop;
pub mod detector;
pub mod keypoint;
pub mod preprocess;
pub mod taxonomy;

pub use crop::{bbox_from_landmarks, remap_landmarks, roi_from_bbox, BBox, CropRegion};
#[cfg(feature = "desktop")]
pub use detector::BlazePoseDetector;
pub use detector::{DetectorOptions, ModelComplexity, PoseEstimator, TrackingState};
pub use keypoint::{KeypointIndex, Landmark, LandmarkFrame};
pub use preprocess::preprocess_for_blazepose;
pub use taxonomy::{GroupId, KeypointInfo, Side, Taxonomy};
