//! Per-feature standardization

/// Z-score scaler fitted on one matrix: `(x - mean) / std`
///
/// Uses the population standard deviation. Constant features keep a scale
/// of 1, so they end up centred at 0 instead of dividing by zero.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[&[f64]]) -> Self {
        let n = rows.len().max(1) as f64;
        let d = rows.first().map_or(0, |r| r.len());

        let means: Vec<f64> = (0..d)
            .map(|j| rows.iter().map(|r| r[j]).sum::<f64>() / n)
            .collect();
        let scales = (0..d)
            .map(|j| {
                let var = rows.iter().map(|r| (r[j] - means[j]).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                if std > f64::EPSILON {
                    std
                } else {
                    1.0
                }
            })
            .collect();

        Self { means, scales }
    }

    pub fn transform(&self, rows: &[&[f64]]) -> Vec<Vec<f64>> {
        rows.iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(j, &v)| (v - self.means[j]) / self.scales[j])
                    .collect()
            })
            .collect()
    }
}
