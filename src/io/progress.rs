/// Fractional progress over `items + 1` steps: one per item, plus the
/// final step that only [`BatchProgress::finish`] reports.
pub struct BatchProgress<F: FnMut(f64)> {
    done: usize,
    max: usize,
    cb: F,
}

impl<F: FnMut(f64)> BatchProgress<F> {
    /// Emits `0.0` right away.
    pub fn start(items: usize, mut cb: F) -> Self {
        cb(0.0);
        Self {
            done: 0,
            max: items + 1,
            cb,
        }
    }

    pub fn advance(&mut self) {
        self.done = (self.done + 1).min(self.max);
        (self.cb)(self.done as f64 / self.max as f64);
    }

    pub fn finish(mut self) {
        (self.cb)(1.0);
    }
}
