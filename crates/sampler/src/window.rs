use std::collections::VecDeque;
use std::num::NonZeroUsize;

/// Bounded FIFO of raw samples for one channel.
///
/// Holds at most `capacity` values; once full, every push evicts the oldest.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples:  VecDeque<f64>,
    capacity: NonZeroUsize,
}

impl SampleWindow {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.get()),
            capacity,
        }
    }

    /// Push a new sample, evicting the oldest if at capacity.
    pub fn push(&mut self, value: f64) {
        if self.samples.len() == self.capacity.get() {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity.get()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Samples in chronological order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    /// Index of the first sample in the tail slice for `divisor`.
    ///
    /// The slice starts one element before the last `len / divisor` samples,
    /// so it spans `len / divisor + 1` values (capped at `len`).
    pub fn tail_start(&self, divisor: NonZeroUsize) -> usize {
        let len = self.samples.len();
        len.saturating_sub(len / divisor.get() + 1)
    }

    /// The most recent samples selected by [`Self::tail_start`].
    pub fn tail(&self, divisor: NonZeroUsize) -> impl Iterator<Item = f64> + '_ {
        self.samples.range(self.tail_start(divisor)..).copied()
    }

    /// Arithmetic mean of the whole window, `None` when empty.
    pub fn mean(&self) -> Option<f64> {
        mean_of(self.iter())
    }

    /// Arithmetic mean of the tail slice, `None` when empty.
    pub fn mean_tail(&self, divisor: NonZeroUsize) -> Option<f64> {
        mean_of(self.tail(divisor))
    }

    /// Median of the whole window, `None` when empty.
    pub fn median(&self) -> Option<f64> {
        median_of(self.iter().collect())
    }

    /// Median of the tail slice, `None` when empty.
    pub fn median_tail(&self, divisor: NonZeroUsize) -> Option<f64> {
        median_of(self.tail(divisor).collect())
    }
}

fn mean_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

fn median_of(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn window(capacity: usize) -> SampleWindow {
        SampleWindow::new(NonZeroUsize::new(capacity).unwrap())
    }

    fn half() -> NonZeroUsize {
        NonZeroUsize::new(2).unwrap()
    }

    /// Deterministic pseudo-random values in roughly `[-500, 500)`.
    fn noise(seed: u64, count: usize) -> Vec<f64> {
        let mut state = seed;
        (0..count)
            .map(|_| {
                state = state
                    .wrapping_mul(6_364_136_223_846_793_005)
                    .wrapping_add(1_442_695_040_888_963_407);
                ((state >> 11) as f64 / (1u64 << 53) as f64) * 1000.0 - 500.0
            })
            .collect()
    }

    #[test]
    fn length_never_exceeds_capacity() {
        let mut w = window(4);
        for (i, v) in noise(1, 20).into_iter().enumerate() {
            w.push(v);
            assert!(w.len() <= 4);
            if i + 1 >= 4 {
                assert_eq!(w.len(), 4);
                assert!(w.is_full());
            }
        }
    }

    #[test]
    fn evicts_oldest_first() {
        let mut w = window(3);
        for v in [1.0, 2.0, 3.0, 4.0] {
            w.push(v);
        }
        assert_eq!(w.iter().collect::<Vec<_>>(), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn mean_matches_contents() {
        for seed in 0..16 {
            let mut w = window(10);
            for v in noise(seed, 3 + seed as usize) {
                w.push(v);
            }
            let contents: Vec<f64> = w.iter().collect();
            let expected = contents.iter().sum::<f64>() / contents.len() as f64;
            assert_abs_diff_eq!(w.mean().unwrap(), expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn empty_window_has_no_aggregates() {
        let w = window(5);
        assert_eq!(w.mean(), None);
        assert_eq!(w.mean_tail(half()), None);
        assert_eq!(w.median(), None);
    }

    // The tail slice is one element longer than a plain "most recent half":
    // `len / 2 + 1` samples. Kept on purpose; do not "fix" without a product decision.
    #[test]
    fn tail_slice_keeps_one_extra_sample() {
        let mut w = window(10);
        for len in 1..=10 {
            w.push(len as f64);
            let taken = w.tail(half()).count();
            assert_eq!(taken, (len / 2 + 1).min(len), "len {len}");
        }
    }

    #[test]
    fn tail_mean_over_full_window() {
        let mut w = window(10);
        for v in 1..=10 {
            w.push(v as f64);
        }
        // Start index 10 - 5 - 1 = 4, i.e. samples 5..=10.
        assert_eq!(w.tail_start(half()), 4);
        assert_abs_diff_eq!(w.mean_tail(half()).unwrap(), 7.5);
    }

    #[test]
    fn tail_with_divisor_one_is_whole_window() {
        let mut w = window(6);
        for v in noise(7, 6) {
            w.push(v);
        }
        let one = NonZeroUsize::new(1).unwrap();
        assert_eq!(w.tail_start(one), 0);
        assert_eq!(w.mean_tail(one), w.mean());
    }

    #[test]
    fn single_sample_tail_does_not_underflow() {
        let mut w = window(4);
        w.push(3.3);
        assert_eq!(w.tail_start(NonZeroUsize::new(4).unwrap()), 0);
        assert_abs_diff_eq!(w.mean_tail(half()).unwrap(), 3.3);
    }

    #[test]
    fn median_of_odd_and_even_counts() {
        let mut w = window(5);
        for v in [5.0, 1.0, 4.0] {
            w.push(v);
        }
        assert_abs_diff_eq!(w.median().unwrap(), 4.0);
        w.push(2.0);
        assert_abs_diff_eq!(w.median().unwrap(), 3.0);
        // Tail of 4 samples at divisor 2: start 4 - 2 - 1 = 1 → [1, 4, 2].
        assert_abs_diff_eq!(w.median_tail(half()).unwrap(), 2.0);
    }

    #[test]
    fn non_finite_values_are_stored_as_given() {
        let mut w = window(2);
        w.push(f64::NAN);
        w.push(1.0);
        assert!(w.mean().unwrap().is_nan());
        w.push(2.0);
        assert_abs_diff_eq!(w.mean().unwrap(), 1.5);
    }
}
