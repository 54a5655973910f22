//! Statistics recorders: discrete samples and time-weighted (continuous)
//! step signals.

const DEFAULT_BUCKET_WIDTH: f64 = 1.0;

/// Accumulates discrete samples (a waiting time, a service time, a batch
/// size) without retaining every sample: count, sum, sum-of-squares, min,
/// max, and a fixed-width histogram.
#[derive(Debug, Clone)]
pub struct DiscreteRecorder {
    bucket_width: f64,
    count: u64,
    sum: f64,
    sum_sq: f64,
    min: f64,
    max: f64,
    histogram: Vec<u64>,
}

impl Default for DiscreteRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscreteRecorder {
    pub fn new() -> Self {
        Self::with_bucket_width(DEFAULT_BUCKET_WIDTH)
    }

    pub fn with_bucket_width(bucket_width: f64) -> Self {
        assert!(bucket_width > 0.0, "bucket width must be positive");
        DiscreteRecorder {
            bucket_width,
            count: 0,
            sum: 0.0,
            sum_sq: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            histogram: Vec::new(),
        }
    }

    /// Record one sample. Negative samples are logged and dropped rather
    /// than corrupting the running statistics.
    pub fn record(&mut self, x: f64) {
        if x < 0.0 || !x.is_finite() {
            log::debug!("dropping out-of-range sample {x}");
            return;
        }
        self.count += 1;
        self.sum += x;
        self.sum_sq += x * x;
        self.min = self.min.min(x);
        self.max = self.max.max(x);

        let bucket = (x / self.bucket_width) as usize;
        if bucket >= self.histogram.len() {
            self.histogram.resize(bucket + 1, 0);
        }
        self.histogram[bucket] += 1;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        let n = self.count as f64;
        let mean = self.mean();
        ((self.sum_sq / n) - mean * mean).max(0.0)
    }

    pub fn stdev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn coefficient_of_variation(&self) -> f64 {
        let mean = self.mean();
        if self.count < 2 || mean == 0.0 {
            0.0
        } else {
            self.stdev() / mean
        }
    }

    pub fn min(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.min
        }
    }

    pub fn max(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.max
        }
    }

    pub fn bucket_width(&self) -> f64 {
        self.bucket_width
    }

    pub fn histogram(&self) -> &[u64] {
        &self.histogram
    }
}

/// Accumulates a time-weighted step signal `y(t)` (work in progress,
/// number in queue, number of busy servers): `mean` reports
/// `integral(y dt) / total_time`.
#[derive(Debug, Clone)]
pub struct ContinuousRecorder {
    bucket_width: f64,
    last_time: f64,
    last_value: f64,
    total_time: f64,
    weighted_sum: f64,
    weighted_sum_sq: f64,
    min: f64,
    max: f64,
    histogram: Vec<f64>,
    record_values: bool,
    values: Vec<(f64, f64)>,
    started: bool,
}

impl ContinuousRecorder {
    pub fn new() -> Self {
        Self::with_bucket_width(DEFAULT_BUCKET_WIDTH, false)
    }

    pub fn with_bucket_width(bucket_width: f64, record_values: bool) -> Self {
        assert!(bucket_width > 0.0, "bucket width must be positive");
        ContinuousRecorder {
            bucket_width,
            last_time: 0.0,
            last_value: 0.0,
            total_time: 0.0,
            weighted_sum: 0.0,
            weighted_sum_sq: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            histogram: Vec::new(),
            record_values,
            values: Vec::new(),
            started: false,
        }
    }

    /// Record that the signal changed to `y` at time `t`. The *previous*
    /// value is charged for the interval `[t_prev, t]`.
    pub fn set(&mut self, t: f64, y: f64) {
        if !self.started {
            self.started = true;
            self.last_time = t;
            self.last_value = y;
            if self.record_values {
                self.values.push((t, y));
            }
            return;
        }
        let delta_t = t - self.last_time;
        if delta_t > 0.0 {
            self.accumulate(delta_t, self.last_value);
        }
        self.last_time = t;
        self.last_value = y;
        if self.record_values {
            self.values.push((t, y));
        }
    }

    /// Close out the signal at the end of a run: charges the final value
    /// for the interval up to `now`.
    pub fn finalize(&mut self, now: f64) {
        if !self.started {
            return;
        }
        let delta_t = now - self.last_time;
        if delta_t > 0.0 {
            self.accumulate(delta_t, self.last_value);
            self.last_time = now;
        }
    }

    fn accumulate(&mut self, delta_t: f64, y: f64) {
        self.total_time += delta_t;
        self.weighted_sum += y * delta_t;
        self.weighted_sum_sq += y * y * delta_t;
        self.min = self.min.min(y);
        self.max = self.max.max(y);

        let bucket = (y.max(0.0) / self.bucket_width) as usize;
        if bucket >= self.histogram.len() {
            self.histogram.resize(bucket + 1, 0.0);
        }
        self.histogram[bucket] += delta_t;
    }

    pub fn mean(&self) -> f64 {
        if self.total_time <= 0.0 {
            0.0
        } else {
            self.weighted_sum / self.total_time
        }
    }

    pub fn variance(&self) -> f64 {
        if self.total_time <= 0.0 {
            return 0.0;
        }
        let mean = self.mean();
        ((self.weighted_sum_sq / self.total_time) - mean * mean).max(0.0)
    }

    pub fn stdev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        if self.total_time <= 0.0 {
            0.0
        } else {
            self.min
        }
    }

    pub fn max(&self) -> f64 {
        if self.total_time <= 0.0 {
            0.0
        } else {
            self.max
        }
    }

    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    pub fn histogram(&self) -> &[f64] {
        &self.histogram
    }

    pub fn values(&self) -> &[(f64, f64)] {
        &self.values
    }
}

impl Default for ContinuousRecorder {
    fn default() -> Self {
        Self::new()
    }
}
