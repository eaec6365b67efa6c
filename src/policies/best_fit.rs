//! # Best-fit output-size selection.
//!
//! Supported output sizes are reported landscape-oriented (width ≥ height)
//! while the preview surface is authored in portrait, so the requested view
//! size has its aspect ratio compared against the *transposed* supported
//! ratio and the chosen size is returned transposed. Dropping the
//! transposition stretches the preview; it must be preserved exactly.
//!
//! Selection rule: first supported size whose width/height ratio is within
//! `tolerance` (absolute difference) of the view's height/width ratio; if
//! none qualifies, the first supported size.

use crate::hal::OutputSize;

/// Picks the supported size best matching the requested view, transposed
/// into the view's portrait orientation.
///
/// Returns `None` when `supported` is empty; the caller decides the fallback
/// (the orchestrator falls back to the view size itself).
pub fn best_fit_size(
    supported: &[OutputSize],
    view: OutputSize,
    tolerance: f64,
) -> Option<OutputSize> {
    if supported.is_empty() {
        return None;
    }
    let target = f64::from(view.height) / f64::from(view.width);
    for size in supported {
        if (size.aspect() - target).abs() <= tolerance {
            return Some(size.transposed());
        }
    }
    Some(supported[0].transposed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_aspect_match_is_transposed() {
        let supported = [OutputSize::new(1920, 1080), OutputSize::new(1280, 720)];
        let view = OutputSize::new(1080, 1920);
        let chosen = best_fit_size(&supported, view, 0.1).expect("non-empty");
        assert_eq!(chosen, OutputSize::new(1080, 1920));
    }

    #[test]
    fn test_first_within_tolerance_wins() {
        // 4:3 view; both 16:9 entries are out of tolerance, 1440x1080 is in.
        let supported = [
            OutputSize::new(1920, 1080),
            OutputSize::new(1440, 1080),
            OutputSize::new(640, 480),
        ];
        let view = OutputSize::new(1080, 1440);
        let chosen = best_fit_size(&supported, view, 0.1).expect("non-empty");
        assert_eq!(chosen, OutputSize::new(1080, 1440));
    }

    #[test]
    fn test_no_match_falls_back_to_first() {
        let supported = [OutputSize::new(800, 600), OutputSize::new(640, 480)];
        let view = OutputSize::new(1080, 2340); // ~2.17, far from 4:3
        let chosen = best_fit_size(&supported, view, 0.1).expect("non-empty");
        assert_eq!(chosen, OutputSize::new(600, 800));
    }

    #[test]
    fn test_empty_supported_list() {
        assert_eq!(best_fit_size(&[], OutputSize::new(1080, 1920), 0.1), None);
    }
}
