//! Input conditioning: button debounce and CV hysteresis.

pub mod button;
pub mod cv;

pub use button::Button;
pub use cv::CvInput;
