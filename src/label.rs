/// A step function from a numeric measure to a label.
///
/// Each band is a lower bound paired with the label assigned to every
/// value at or above it (and below the previous bound). Bounds must be
/// strictly descending; values below the last bound, and NaN, get the
/// floor label.
#[derive(Debug)]
pub struct Bands<L: 'static> {
    bands: &'static [(f64, L)],
    floor: L,
}

impl<L: Copy + 'static> Bands<L> {
    pub const fn new(bands: &'static [(f64, L)], floor: L) -> Self {
        Bands { bands, floor }
    }

    /// Returns the label for `value`.
    pub fn classify(&self, value: f64) -> L {
        self.bands
            .iter()
            .find(|(bound, _)| value >= *bound)
            .map(|(_, label)| *label)
            .unwrap_or(self.floor)
    }

    /// Iterates over the bands from highest to lowest, ending with the
    /// floor label (which has no bound).
    pub fn iter(&self) -> impl Iterator<Item = (Option<f64>, L)> + '_ {
        self.bands
            .iter()
            .map(|(bound, label)| (Some(*bound), *label))
            .chain(std::iter::once((None, self.floor)))
    }

    /// Checks that the bounds are finite and strictly descending.
    pub fn is_well_formed(&self) -> bool {
        self.bands.iter().all(|(bound, _)| bound.is_finite())
            && self.bands.windows(2).all(|pair| pair[0].0 > pair[1].0)
    }
}
