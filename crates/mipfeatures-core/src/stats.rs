/// Min, max, mean and sample standard deviation of a sequence
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Summary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// `None` with fewer than two values
    pub stdev: Option<f64>,
}

impl Summary {
    /// `None` for an empty slice.
    pub fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let n = values.len() as f64;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for &v in values {
            min = min.min(v);
            max = max.max(v);
            sum += v;
        }
        let mean = sum / n;

        let stdev = (values.len() > 1).then(|| {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1.0)).sqrt()
        });

        Some(Self { min, max, mean, stdev })
    }

    pub fn of_counts(counts: &[usize]) -> Option<Self> {
        let values: Vec<f64> = counts.iter().map(|&c| c as f64).collect();
        Self::of(&values)
    }
}

/// Sample standard deviation, `None` with fewer than two values.
pub fn sample_stdev(values: &[f64]) -> Option<f64> {
    Summary::of(values).and_then(|s| s.stdev)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    Summary::of(values).map(|s| s.mean)
}
