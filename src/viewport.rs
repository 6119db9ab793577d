/// Converts display dimensions into a target page length.
///
/// Widths map to items per row through fixed breakpoints; heights map to
/// rows by dividing by an estimated item height, rounding up so a partially
/// visible row is still filled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSampler {
    pub item_height: f64,
}

impl ViewportSampler {
    pub const DEFAULT_ITEM_HEIGHT: f64 = 300.0;

    /// Upper bounds (inclusive) for 1..=4 items per row; wider gets 5.
    const BREAKPOINTS: [(f64, usize); 4] = [(200.0, 1), (400.0, 2), (800.0, 3), (1600.0, 4)];
    const WIDEST: usize = 5;

    pub fn new(item_height: f64) -> Self {
        Self { item_height }
    }

    pub fn items_per_row(&self, width: f64) -> usize {
        Self::BREAKPOINTS
            .iter()
            .find(|(max, _)| width <= *max)
            .map(|(_, n)| *n)
            .unwrap_or(Self::WIDEST)
    }

    pub fn rows_per_page(&self, height: f64) -> usize {
        if !(self.item_height > 0.0) || !(height > 0.0) {
            return 1;
        }
        (height / self.item_height).ceil() as usize
    }

    /// Page length for a viewport, never less than 1.
    pub fn sample(&self, width: f64, height: f64) -> usize {
        self.items_per_row(width)
            .saturating_mul(self.rows_per_page(height))
            .max(1)
    }
}

impl Default for ViewportSampler {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ITEM_HEIGHT)
    }
}
