//! FILENAME: app/src/window.rs
//! PURPOSE: Virtualized body windowing.
//! CONTEXT: Only the rows intersecting the viewport, plus `overscan` rows on
//! each side, are rendered. The skipped rows become top and bottom padding so
//! the scroll height stays right. `Virtualizer` damps one-row jitter from
//! sub-pixel scroll events by comparing against the previous stable base.

use serde::Serialize;

/// The three body layouts; they differ only in hysteresis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BodyKind {
    Flat,
    Grouped,
    Tree,
}

/// Half-open index range `[start, end)` plus the pixel padding around it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VisibleRange {
    pub start: usize,
    pub end: usize,
    pub padding_top: f64,
    pub padding_bottom: f64,
}

impl VisibleRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start..self.end).contains(&index)
    }
}

/// First row index under `scroll_top`.
fn base_index(scroll_top: f64, row_height: f64) -> usize {
    if !(scroll_top > 0.0) {
        return 0;
    }
    (scroll_top / row_height).floor() as usize
}

fn range_from_base(base: usize, viewport_height: f64, row_height: f64, overscan: usize, total: usize) -> VisibleRange {
    let visible_count = if viewport_height > 0.0 {
        (viewport_height / row_height).ceil() as usize
    } else {
        0
    };
    let base = base.min(total);
    let start = base.saturating_sub(overscan);
    // The window is inclusive of base + visible_count + overscan.
    let end = base
        .saturating_add(visible_count)
        .saturating_add(overscan)
        .saturating_add(1)
        .min(total);
    VisibleRange {
        start,
        end,
        padding_top: start as f64 * row_height,
        padding_bottom: (total - end) as f64 * row_height,
    }
}

/// Stateless window for one scroll position.
pub fn compute_visible_range(
    scroll_top: f64,
    viewport_height: f64,
    row_height: f64,
    overscan: usize,
    total: usize,
) -> VisibleRange {
    if !(row_height > 0.0) {
        return VisibleRange::default();
    }
    range_from_base(base_index(scroll_top, row_height), viewport_height, row_height, overscan, total)
}

#[derive(Debug, Clone)]
pub struct Virtualizer {
    pub row_height: f64,
    pub viewport_height: f64,
    pub overscan: usize,
    stable_base: Option<usize>,
    last_scroll_top: f64,
}

impl Virtualizer {
    pub fn new(row_height: f64, viewport_height: f64, overscan: usize) -> Self {
        Virtualizer {
            row_height,
            viewport_height,
            overscan,
            stable_base: None,
            last_scroll_top: 0.0,
        }
    }

    pub fn set_viewport_height(&mut self, height: f64) {
        self.viewport_height = height;
    }

    /// Forgets the stable base, e.g. after the body was rebuilt.
    pub fn reset(&mut self) {
        self.stable_base = None;
        self.last_scroll_top = 0.0;
    }

    pub fn stable_base(&self) -> Option<usize> {
        self.stable_base
    }

    /// Window for `scroll_top`. A one-row base change is ignored for flat
    /// bodies, and for grouped and tree bodies only when the scroll moved
    /// less than half a row. With no overscan nothing is damped.
    pub fn update(&mut self, scroll_top: f64, total: usize, kind: BodyKind) -> VisibleRange {
        if !(self.row_height > 0.0) {
            return VisibleRange::default();
        }
        let raw = base_index(scroll_top, self.row_height).min(total);
        let delta = (scroll_top - self.last_scroll_top).abs();
        self.last_scroll_top = scroll_top;

        let base = match self.stable_base {
            Some(prev) if self.overscan > 0 && prev.abs_diff(raw) == 1 && prev <= total => {
                let hold = match kind {
                    BodyKind::Flat => true,
                    BodyKind::Grouped | BodyKind::Tree => delta < self.row_height / 2.0,
                };
                if hold {
                    prev
                } else {
                    raw
                }
            }
            _ => raw,
        };
        self.stable_base = Some(base);
        range_from_base(base, self.viewport_height, self.row_height, self.overscan, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_window_with_overscan() {
        let r = compute_visible_range(400.0, 200.0, 40.0, 3, 100);
        // base 10, 5 visible rows
        assert_eq!((r.start, r.end), (7, 19));
        assert_eq!(r.padding_top, 280.0);
        assert_eq!(r.padding_bottom, 81.0 * 40.0);
    }

    #[test]
    fn test_window_clamps_at_both_ends() {
        let top = compute_visible_range(0.0, 200.0, 40.0, 3, 100);
        assert_eq!((top.start, top.end), (0, 9));
        let bottom = compute_visible_range(3800.0, 200.0, 40.0, 3, 100);
        assert_eq!((bottom.start, bottom.end), (92, 100));
        assert_eq!(bottom.padding_bottom, 0.0);
        let empty = compute_visible_range(0.0, 200.0, 40.0, 3, 0);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(compute_visible_range(100.0, 200.0, 0.0, 3, 10).is_empty());
        let r = compute_visible_range(-50.0, 200.0, 40.0, 0, 10);
        assert_eq!(r.start, 0);
    }

    #[test]
    fn test_coverage_over_every_scroll_position() {
        let (row_height, viewport, total) = (37.0, 300.0, 250usize);
        let max_scroll = total as f64 * row_height - viewport;
        for overscan in [0usize, 1, 4] {
            for kind in [BodyKind::Flat, BodyKind::Grouped, BodyKind::Tree] {
                let mut v = Virtualizer::new(row_height, viewport, overscan);
                let steps = (max_scroll / 7.5) as usize;
                let forward = (0..=steps).map(|i| i as f64 * 7.5);
                let backward = (0..=steps).rev().map(|i| i as f64 * 7.5);
                for scroll in forward.chain(backward) {
                    let r = v.update(scroll, total, kind);
                    let first = (scroll / row_height).floor() as usize;
                    let last = ((scroll + viewport) / row_height).ceil() as usize - 1;
                    assert!(r.start <= first, "{:?} {} start {}", kind, scroll, r.start);
                    assert!(last.min(total - 1) < r.end, "{:?} {} end {}", kind, scroll, r.end);
                }
            }
        }
    }

    #[test]
    fn test_flat_hysteresis_holds_one_row_moves() {
        let mut v = Virtualizer::new(40.0, 200.0, 2);
        let first = v.update(400.0, 100, BodyKind::Flat);
        let jitter = v.update(399.0, 100, BodyKind::Flat);
        assert_eq!(first, jitter);
        let jump = v.update(480.0, 100, BodyKind::Flat);
        assert_eq!(jump.start, 10);
    }

    #[test]
    fn test_grouped_hysteresis_needs_a_small_delta() {
        let mut v = Virtualizer::new(40.0, 200.0, 2);
        v.update(400.0, 100, BodyKind::Grouped);
        // 1px back across the row boundary: held.
        assert_eq!(v.update(399.0, 100, BodyKind::Grouped).start, 8);
        // A full row in one event: follows.
        assert_eq!(v.update(440.0, 100, BodyKind::Grouped).start, 9);
    }

    #[test]
    fn test_no_hysteresis_without_overscan() {
        let mut v = Virtualizer::new(40.0, 200.0, 0);
        v.update(400.0, 100, BodyKind::Flat);
        assert_eq!(v.update(399.0, 100, BodyKind::Flat).start, 9);
    }
}
