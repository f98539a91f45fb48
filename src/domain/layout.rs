// Grid placement - First-fit search for a free rectangle
use super::widget::{Position, Size};
use std::collections::HashSet;

pub const DEFAULT_GRID_COLUMNS: u32 = 12;
pub const DEFAULT_MAX_ROWS: u32 = 100;

/// Shape of the placement grid: its width and how far down a search goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpec {
    pub columns: u32,
    pub max_rows: u32,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            columns: DEFAULT_GRID_COLUMNS,
            max_rows: DEFAULT_MAX_ROWS,
        }
    }
}

impl GridSpec {
    pub fn find_position<I>(&self, existing: I, size: Size) -> Position
    where
        I: IntoIterator<Item = (Position, Size)>,
    {
        find_position(existing, self.columns, self.max_rows, size.width, size.height)
    }

    /// Whether a widget of `size` may be stored on this grid: at least 1x1, no
    /// wider than the grid and no taller than the rows a search covers.
    pub fn admits(&self, size: Size) -> bool {
        !size.is_empty() && size.width <= self.columns && size.height <= self.max_rows
    }
}

/// Finds the top-left corner for a `width` x `height` rectangle on a grid
/// `grid_columns` wide, scanning rows top to bottom and columns left to right.
///
/// The first candidate whose cells are all free wins. Existing widgets are
/// never moved and may already overlap each other. When nothing fits within
/// `max_rows` rows (or `width` exceeds the grid), `(0, 0)` is returned even
/// though it may overlap.
pub fn find_position<I>(
    existing: I,
    grid_columns: u32,
    max_rows: u32,
    width: u32,
    height: u32,
) -> Position
where
    I: IntoIterator<Item = (Position, Size)>,
{
    let Some(last_x) = grid_columns.checked_sub(width) else {
        return Position::default();
    };

    // Only cells a candidate in the scan window can touch matter.
    let window = (grid_columns, max_rows.saturating_add(height));
    let occupied = occupied_cells(existing, window);

    for y in 0..max_rows {
        for x in 0..=last_x {
            if fits(&occupied, x, y, width, height) {
                return Position::new(x, y);
            }
        }
    }

    Position::default()
}

fn occupied_cells<I>(existing: I, (columns, rows): (u32, u32)) -> HashSet<(u32, u32)>
where
    I: IntoIterator<Item = (Position, Size)>,
{
    let mut occupied = HashSet::new();
    for (position, size) in existing {
        let right = position.x.saturating_add(size.width).min(columns);
        let bottom = position.y.saturating_add(size.height).min(rows);
        for x in position.x..right {
            for y in position.y..bottom {
                occupied.insert((x, y));
            }
        }
    }
    occupied
}

fn fits(occupied: &HashSet<(u32, u32)>, x: u32, y: u32, width: u32, height: u32) -> bool {
    (0..width).all(|dx| (0..height).all(|dy| !occupied.contains(&(x + dx, y + dy))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// True when the two rectangles share at least one cell.
    fn overlaps(a: (Position, Size), b: (Position, Size)) -> bool {
        let (pa, sa) = a;
        let (pb, sb) = b;
        if sa.is_empty() || sb.is_empty() {
            return false;
        }
        pa.x < pb.x + sb.width
            && pb.x < pa.x + sa.width
            && pa.y < pb.y + sb.height
            && pb.y < pa.y + sa.height
    }

    fn rect(x: u32, y: u32, w: u32, h: u32) -> (Position, Size) {
        (Position::new(x, y), Size::new(w, h))
    }

    fn place(existing: &[(Position, Size)], width: u32, height: u32) -> Position {
        find_position(
            existing.iter().copied(),
            DEFAULT_GRID_COLUMNS,
            DEFAULT_MAX_ROWS,
            width,
            height,
        )
    }

    #[test]
    fn test_empty_grid_places_at_origin() {
        assert_eq!(place(&[], 4, 2), Position::new(0, 0));
        assert_eq!(place(&[], 12, 5), Position::new(0, 0));
    }

    #[test]
    fn test_fills_first_row_left_to_right() {
        let existing = [rect(0, 0, 4, 2), rect(4, 0, 4, 2)];
        assert_eq!(place(&existing, 4, 2), Position::new(8, 0));
    }

    #[test]
    fn test_wraps_to_next_free_row() {
        let existing = [rect(0, 0, 4, 2), rect(4, 0, 4, 2), rect(8, 0, 4, 2)];
        assert_eq!(place(&existing, 4, 2), Position::new(0, 2));
    }

    #[test]
    fn test_lower_x_wins_on_same_row() {
        // Gaps at x=2..4 and x=8..12 on row 0; the leftmost one is chosen.
        let existing = [rect(0, 0, 2, 1), rect(4, 0, 4, 1)];
        assert_eq!(place(&existing, 2, 1), Position::new(2, 0));
    }

    #[test]
    fn test_tall_widget_skips_partially_blocked_gap() {
        // A 1-row gap at row 0 cannot hold a 2-row widget when row 1 is taken.
        let existing = [rect(0, 0, 6, 1), rect(6, 1, 6, 1)];
        assert_eq!(place(&existing, 6, 2), Position::new(0, 1));
    }

    #[test]
    fn test_too_wide_falls_back_to_origin() {
        let existing = [rect(0, 0, 4, 2)];
        assert_eq!(place(&existing, 13, 1), Position::new(0, 0));
    }

    #[test]
    fn test_full_scan_window_falls_back_to_origin() {
        let existing = [rect(0, 0, 12, 3)];
        let position = find_position(existing.iter().copied(), 12, 3, 1, 1);
        assert_eq!(position, Position::new(0, 0));
    }

    #[test]
    fn test_tolerates_overlapping_existing_widgets() {
        let existing = [rect(0, 0, 6, 2), rect(4, 0, 6, 1)];
        let position = place(&existing, 3, 1);
        assert_eq!(position, Position::new(9, 0));
        for r in existing {
            assert!(!overlaps((position, Size::new(3, 1)), r));
        }
    }

    #[test]
    fn test_huge_existing_widget_is_clipped_to_the_window() {
        let existing = [rect(0, 0, u32::MAX, u32::MAX)];
        assert_eq!(place(&existing, 4, 2), Position::new(0, 0));

        let existing = [rect(0, 0, 12, u32::MAX - 1)];
        let position = find_position(existing.iter().copied(), 12, 5, 1, 1);
        assert_eq!(position, Position::new(0, 0));
    }

    #[test]
    fn test_grid_admits_sizes_within_bounds() {
        let grid = GridSpec::default();
        assert!(grid.admits(Size::new(1, 1)));
        assert!(grid.admits(Size::new(12, 100)));
        assert!(!grid.admits(Size::new(0, 2)));
        assert!(!grid.admits(Size::new(13, 1)));
        assert!(!grid.admits(Size::new(1, 101)));
    }

    #[test]
    fn test_overlaps() {
        assert!(overlaps(rect(0, 0, 2, 2), rect(1, 1, 2, 2)));
        assert!(!overlaps(rect(0, 0, 2, 2), rect(2, 0, 2, 2)));
        assert!(!overlaps(rect(0, 0, 2, 2), rect(0, 2, 2, 2)));
        assert!(!overlaps(rect(0, 0, 0, 2), rect(0, 0, 2, 2)));
    }

    proptest! {
        #[test]
        fn placed_rectangle_is_free_or_origin(
            existing in proptest::collection::vec((0u32..12, 0u32..20, 1u32..6, 1u32..5), 0..12),
            width in 1u32..=12,
            height in 1u32..5,
        ) {
            let rects: Vec<(Position, Size)> = existing
                .iter()
                .map(|&(x, y, w, h)| rect(x, y, w, h))
                .collect();
            let position = place(&rects, width, height);
            let placed = (position, Size::new(width, height));

            let clear = rects.iter().all(|r| !overlaps(placed, *r));
            prop_assert!(clear || position == Position::new(0, 0));
            prop_assert!(position.x + width <= DEFAULT_GRID_COLUMNS);
        }
    }
}
