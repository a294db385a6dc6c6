//! Print Layout Tables
//!
//! Physical-layout constants for A4 label sheets. These are hand-tuned
//! lookups, not packing computations.

use crate::templates::{LabelSize, Orientation};

pub const PAGE_MARGIN_MM: f64 = 10.0;
pub const LABEL_GAP_MM: f64 = 3.0;
pub const A4_MM: (f64, f64) = (210.0, 297.0);

pub const MIN_QUANTITY: i64 = 1;
pub const MAX_QUANTITY: i64 = 20;

/// Labels per A4 sheet.
pub fn page_capacity(size: LabelSize, orientation: Orientation) -> usize {
    match (size, orientation) {
        (LabelSize::Small, Orientation::Portrait) => 15,
        (LabelSize::Small, Orientation::Landscape) => 16,
        (LabelSize::Medium, Orientation::Portrait) => 8,
        (LabelSize::Medium, Orientation::Landscape) => 9,
        (LabelSize::Large, Orientation::Portrait) => 3,
        (LabelSize::Large, Orientation::Landscape) => 4,
    }
}

/// Grid columns used to lay out a sheet.
pub fn grid_columns(size: LabelSize, orientation: Orientation) -> usize {
    match (size, orientation) {
        (LabelSize::Small, Orientation::Portrait) => 3,
        (LabelSize::Small, Orientation::Landscape) => 4,
        (LabelSize::Medium, Orientation::Portrait) => 2,
        (LabelSize::Medium, Orientation::Landscape) => 3,
        (LabelSize::Large, Orientation::Portrait) => 1,
        (LabelSize::Large, Orientation::Landscape) => 2,
    }
}

/// Label footprint (width, height) in millimetres.
pub fn label_dimensions_mm(size: LabelSize) -> (f64, f64) {
    match size {
        LabelSize::Small => (60.0, 45.0),
        LabelSize::Medium => (85.0, 60.0),
        LabelSize::Large => (130.0, 85.0),
    }
}

/// Hazard statements shown by the standard template before "+N more".
pub fn standard_hazard_cap(size: LabelSize) -> usize {
    match size {
        LabelSize::Small => 2,
        LabelSize::Medium => 3,
        LabelSize::Large => 4,
    }
}

/// Hazard block font size (px) for the full template.
pub fn full_hazard_font_px(hazard_count: usize, size: LabelSize) -> f64 {
    let tier = match hazard_count {
        0..=5 => 0,
        6..=8 => 1,
        9..=12 => 2,
        _ => 3,
    };
    let tiers: [f64; 4] = match size {
        LabelSize::Small => [7.0, 6.5, 6.0, 5.5],
        LabelSize::Medium => [8.0, 7.0, 6.0, 5.5],
        LabelSize::Large => [10.0, 9.0, 8.0, 7.5],
    };
    tiers[tier]
}

/// Base font size (px) for label text outside the hazard block.
pub fn base_font_px(size: LabelSize) -> f64 {
    match size {
        LabelSize::Small => 8.0,
        LabelSize::Medium => 10.0,
        LabelSize::Large => 13.0,
    }
}

/// Pictogram edge length in millimetres.
pub fn pictogram_mm(size: LabelSize) -> f64 {
    match size {
        LabelSize::Small => 10.0,
        LabelSize::Medium => 14.0,
        LabelSize::Large => 22.0,
    }
}

pub fn page_count(units: usize, size: LabelSize, orientation: Orientation) -> usize {
    units.div_ceil(page_capacity(size, orientation))
}

/// Guard against zero or negative quantities as well as oversized ones.
pub fn clamp_quantity(quantity: Option<i64>) -> usize {
    quantity.unwrap_or(MIN_QUANTITY).clamp(MIN_QUANTITY, MAX_QUANTITY) as usize
}

pub fn page_size_css(orientation: Orientation) -> &'static str {
    match orientation {
        Orientation::Portrait => "A4 portrait",
        Orientation::Landscape => "A4 landscape",
    }
}

/// Printable area (width, height) in millimetres.
pub fn printable_area_mm(orientation: Orientation) -> (f64, f64) {
    let (w, h) = match orientation {
        Orientation::Portrait => A4_MM,
        Orientation::Landscape => (A4_MM.1, A4_MM.0),
    };
    (w - 2.0 * PAGE_MARGIN_MM, h - 2.0 * PAGE_MARGIN_MM)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZES: [LabelSize; 3] = [LabelSize::Small, LabelSize::Medium, LabelSize::Large];
    const ORIENTATIONS: [Orientation; 2] = [Orientation::Portrait, Orientation::Landscape];

    #[test]
    fn test_grid_fits_a4() {
        for size in SIZES {
            for orientation in ORIENTATIONS {
                let capacity = page_capacity(size, orientation);
                let columns = grid_columns(size, orientation);
                let rows = capacity.div_ceil(columns);
                let (w, h) = label_dimensions_mm(size);
                let (area_w, area_h) = printable_area_mm(orientation);

                let used_w = columns as f64 * w + (columns - 1) as f64 * LABEL_GAP_MM;
                let used_h = rows as f64 * h + (rows - 1) as f64 * LABEL_GAP_MM;
                assert!(used_w <= area_w, "{size:?}/{orientation:?} too wide: {used_w}");
                assert!(used_h <= area_h, "{size:?}/{orientation:?} too tall: {used_h}");
            }
        }
    }

    #[test]
    fn test_font_tiers_step_down() {
        assert_eq!(full_hazard_font_px(5, LabelSize::Medium), 8.0);
        assert_eq!(full_hazard_font_px(6, LabelSize::Medium), 7.0);
        assert_eq!(full_hazard_font_px(12, LabelSize::Medium), 6.0);
        assert_eq!(full_hazard_font_px(13, LabelSize::Medium), 5.5);
        assert_eq!(full_hazard_font_px(3, LabelSize::Small), 7.0);
        assert_eq!(full_hazard_font_px(8, LabelSize::Small), 6.5);
        assert_eq!(full_hazard_font_px(9, LabelSize::Small), 6.0);
        assert_eq!(full_hazard_font_px(5, LabelSize::Large), 10.0);
        assert_eq!(full_hazard_font_px(6, LabelSize::Large), 9.0);
        assert_eq!(full_hazard_font_px(12, LabelSize::Large), 8.0);
        assert_eq!(full_hazard_font_px(20, LabelSize::Small), 5.5);
        assert_eq!(full_hazard_font_px(20, LabelSize::Large), 7.5);
        for size in SIZES {
            assert!(full_hazard_font_px(1, size) >= full_hazard_font_px(13, size));
        }
    }

    #[test]
    fn test_page_size_css() {
        assert_eq!(page_size_css(Orientation::Portrait), "A4 portrait");
        assert_eq!(page_size_css(Orientation::Landscape), "A4 landscape");
    }

    #[test]
    fn test_quantity_clamp() {
        assert_eq!(clamp_quantity(None), 1);
        assert_eq!(clamp_quantity(Some(0)), 1);
        assert_eq!(clamp_quantity(Some(-4)), 1);
        assert_eq!(clamp_quantity(Some(7)), 7);
        assert_eq!(clamp_quantity(Some(99)), 20);
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(5, LabelSize::Medium, Orientation::Portrait), 1);
        assert_eq!(page_count(17, LabelSize::Medium, Orientation::Portrait), 3);
        assert_eq!(page_count(0, LabelSize::Large, Orientation::Landscape), 0);
    }
}
