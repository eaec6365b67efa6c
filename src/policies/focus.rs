//! # Touch point → sensor metering rectangle.
//!
//! The sensor is mounted rotated 90° relative to the portrait view, so a
//! touch at view coordinates (x, y) lands on the sensor at
//! `reflect_x = y`, `reflect_y = view_width - x`, scaled by the active-array
//! dimensions. The metered region is a 40×40-unit rectangle centered on the
//! mapped point and clamped to the active array on every edge.

use crate::hal::{FocusPoint, MeteringRect, SensorRect};

/// Half-extent of the metered square, in sensor units.
const FOCUS_REGION_HALF: i64 = 20;

/// Weight applied to AF/AE metering regions.
const METERING_WEIGHT: u32 = 1000;

/// Maps a touch point into a rectangle in sensor coordinates.
pub fn focus_rect(point: FocusPoint, active_array: SensorRect) -> SensorRect {
    let reflect_x = f64::from(point.y);
    let reflect_y = f64::from(point.view_width.saturating_sub(point.x));

    let array_w = i64::from(active_array.width());
    let array_h = i64::from(active_array.height());
    let focus_x = (reflect_x / f64::from(point.view_height.max(1)) * array_w as f64) as i64;
    let focus_y = (reflect_y / f64::from(point.view_width.max(1)) * array_h as f64) as i64;

    SensorRect::new(
        clamp_to(focus_x - FOCUS_REGION_HALF, array_w),
        clamp_to(focus_y - FOCUS_REGION_HALF, array_h),
        clamp_to(focus_x + FOCUS_REGION_HALF, array_w),
        clamp_to(focus_y + FOCUS_REGION_HALF, array_h),
    )
}

/// Builds the weighted metering region for an AF/AE scan.
pub fn metering_region(point: FocusPoint, active_array: SensorRect) -> MeteringRect {
    MeteringRect {
        region: focus_rect(point, active_array),
        weight: METERING_WEIGHT,
    }
}

fn clamp_to(value: i64, max: i64) -> u32 {
    value.clamp(0, max) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array_4000x3000() -> SensorRect {
        SensorRect::new(0, 0, 4000, 3000)
    }

    #[test]
    fn test_origin_touch_clamps_to_array() {
        let point = FocusPoint {
            x: 0,
            y: 0,
            view_width: 1000,
            view_height: 2000,
        };
        let rect = focus_rect(point, array_4000x3000());
        // reflect maps (0,0) to the right edge of the sensor's y axis.
        assert_eq!(rect, SensorRect::new(0, 2980, 20, 3000));
        assert!(rect.right <= 4000 && rect.bottom <= 3000);
    }

    #[test]
    fn test_center_touch_is_a_40_unit_square() {
        let point = FocusPoint {
            x: 500,
            y: 1000,
            view_width: 1000,
            view_height: 2000,
        };
        let rect = focus_rect(point, array_4000x3000());
        assert_eq!(rect.width(), 40);
        assert_eq!(rect.height(), 40);
        // view center maps to the array center under the 90° reflection
        assert_eq!(rect, SensorRect::new(1980, 1480, 2020, 1520));
    }

    #[test]
    fn test_far_corner_clamps_right_edge() {
        let point = FocusPoint {
            x: 0,
            y: 2000,
            view_width: 1000,
            view_height: 2000,
        };
        let rect = focus_rect(point, array_4000x3000());
        assert_eq!(rect.right, 4000);
        assert!(rect.left >= 3980 - 20);
    }

    #[test]
    fn test_metering_region_weight() {
        let point = FocusPoint {
            x: 500,
            y: 1000,
            view_width: 1000,
            view_height: 2000,
        };
        let region = metering_region(point, array_4000x3000());
        assert_eq!(region.weight, 1000);
        assert_eq!(region.region.width(), 40);
    }
}
