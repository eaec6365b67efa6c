//! Pure policies used while configuring sessions and requests.
//!
//! - [`best_fit_size`]: choose the supported output size matching the
//!   preview surface's aspect ratio (transposed for the portrait view)
//! - [`focus_rect`] / [`metering_region`]: map a touch point into a clamped
//!   sensor-space metering rectangle

mod best_fit;
mod focus;

pub use best_fit::best_fit_size;
pub use focus::{focus_rect, metering_region};
