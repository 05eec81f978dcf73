use ndarray::Array1;

/// Incumbent and convergence measures after one shuffle loop.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopRecord {
    /// Shuffle loop number (0 is the initial population).
    pub nloop: usize,
    /// Objective evaluations spent so far.
    pub nfev: usize,
    /// Best point after the loop.
    pub x: Array1<f64>,
    /// Best value after the loop.
    pub fun: f64,
    /// Relative change of the best value over the plateau window;
    /// `None` until `kstop` loops have run.
    pub ratio: Option<f64>,
    /// Normalized geometric range of the population.
    pub gnrng: f64,
}

/// Largest number of records reserved up front; longer runs grow the vector.
pub const MAX_PRESIZED_LOOPS: usize = 1024;

/// Append-only per-loop trace of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunHistory {
    records: Vec<LoopRecord>,
}

impl RunHistory {
    /// Empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty history with room for `loops` records, at most
    /// [`MAX_PRESIZED_LOOPS`].
    pub fn with_capacity(loops: usize) -> Self {
        Self {
            records: Vec::with_capacity(loops.min(MAX_PRESIZED_LOOPS)),
        }
    }

    /// Appends the record of a finished loop.
    pub fn push(&mut self, record: LoopRecord) {
        self.records.push(record);
    }

    /// All records in loop order.
    pub fn records(&self) -> &[LoopRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent record.
    pub fn last(&self) -> Option<&LoopRecord> {
        self.records.last()
    }

    /// Best value of every loop.
    pub fn best_values(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.fun).collect()
    }

    /// Relative change of the best value across the last `kstop` loops.
    ///
    /// `|f[last] - f[last-kstop]| / mean(|f|)` over the last `kstop` records.
    /// `None` while fewer than `kstop + 1` records exist. An all-zero window
    /// has not moved, so its ratio is 0.
    pub fn plateau_ratio(&self, kstop: usize) -> Option<f64> {
        window_ratio(&self.best_values(), kstop)
    }

    /// Plateau ratio as it will read once a record with best value `next`
    /// is appended.
    pub fn plateau_ratio_with(&self, next: f64, kstop: usize) -> Option<f64> {
        let mut values = self.best_values();
        values.push(next);
        window_ratio(&values, kstop)
    }
}

fn window_ratio(values: &[f64], kstop: usize) -> Option<f64> {
    let len = values.len();
    if kstop == 0 || len <= kstop {
        return None;
    }
    let denom = values[len - kstop..].iter().map(|f| f.abs()).sum::<f64>() / kstop as f64;
    if denom == 0.0 {
        return Some(0.0);
    }
    Some((values[len - 1] - values[len - 1 - kstop]).abs() / denom)
}
