//! Least-squares models used by the regression analyzers.

/// Goodness-of-fit summary of a model over its training points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitQuality {
    /// Sum of squared residuals.
    pub sse: f64,
    /// Mean squared error (`sse / n`).
    pub mse: f64,
    /// Mean absolute deviation of the residuals.
    pub mad: f64,
    /// Mean absolute percentage error over points with a nonzero actual value.
    pub mape: f64,
    /// Akaike information criterion, lower is better. Diagnostic only.
    pub aic: f64,
}

impl FitQuality {
    /// Evaluate `predict` against `(x, y)` points for a model with `parameters` coefficients.
    pub fn evaluate<F>(points: &[(f64, f64)], parameters: usize, predict: F) -> Self
    where
        F: Fn(f64) -> f64,
    {
        let n = points.len().max(1) as f64;
        let mut sse = 0.0;
        let mut abs_total = 0.0;
        let mut pct_total = 0.0;
        let mut pct_count = 0usize;
        for &(x, y) in points {
            let residual = y - predict(x);
            sse += residual * residual;
            abs_total += residual.abs();
            if y != 0.0 {
                pct_total += (residual / y).abs();
                pct_count += 1;
            }
        }
        let mse = sse / n;
        let mape = if pct_count > 0 {
            100.0 * pct_total / pct_count as f64
        } else {
            0.0
        };
        let aic = if mse > 0.0 {
            n * mse.ln() + 2.0 * parameters as f64
        } else {
            f64::NEG_INFINITY
        };
        Self {
            sse,
            mse,
            mad: abs_total / n,
            mape,
            aic,
        }
    }
}

/// Total sum of squares of `values` around their mean.
pub fn total_sum_of_squares<'a, I>(values: I) -> f64
where
    I: IntoIterator<Item = &'a f64>,
    I::IntoIter: Clone,
{
    let iter = values.into_iter();
    let (sum, count) = iter.clone().fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        return 0.0;
    }
    let mean = sum / count as f64;
    iter.map(|v| (v - mean).powi(2)).sum()
}

/// Polynomial `y = c0 + c1*u + ... + cd*u^d` fitted by ordinary least squares.
///
/// `x` is rescaled to `u = (x - origin) / scale` so that the training range
/// maps onto `[0, 1]`; raw epoch timestamps would make the normal equations
/// numerically useless.
#[derive(Debug, Clone, PartialEq)]
pub struct PolynomialFit {
    coefficients: Vec<f64>,
    origin: f64,
    scale: f64,
}

impl PolynomialFit {
    /// Fit a polynomial of at most `degree` to `points`.
    ///
    /// The degree is capped at `points.len() - 1`. Returns `None` when there
    /// are no points or the system is singular.
    pub fn fit(points: &[(f64, f64)], degree: usize) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let degree = degree.min(points.len() - 1);
        let origin = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let max = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        let scale = if max > origin { max - origin } else { 1.0 };

        let size = degree + 1;
        let mut matrix = vec![vec![0.0; size + 1]; size];
        for &(x, y) in points {
            let u = (x - origin) / scale;
            let mut powers = vec![1.0; 2 * size - 1];
            for k in 1..powers.len() {
                powers[k] = powers[k - 1] * u;
            }
            for row in 0..size {
                for col in 0..size {
                    matrix[row][col] += powers[row + col];
                }
                matrix[row][size] += powers[row] * y;
            }
        }

        let coefficients = solve(matrix)?;
        Some(Self {
            coefficients,
            origin,
            scale,
        })
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn predict(&self, x: f64) -> f64 {
        let u = (x - self.origin) / self.scale;
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, c| acc * u + c)
    }
}

/// Gauss-Jordan elimination with partial pivoting on an augmented matrix.
fn solve(mut m: Vec<Vec<f64>>) -> Option<Vec<f64>> {
    let n = m.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&a, &b| m[a][col].abs().total_cmp(&m[b][col].abs()))?;
        if m[pivot][col].abs() < 1e-12 {
            return None;
        }
        m.swap(col, pivot);
        let p = m[col][col];
        for v in m[col].iter_mut() {
            *v /= p;
        }
        let pivot_row = m[col].clone();
        for (row, values) in m.iter_mut().enumerate() {
            if row == col {
                continue;
            }
            let factor = values[col];
            if factor == 0.0 {
                continue;
            }
            for k in col..=n {
                values[k] -= factor * pivot_row[k];
            }
        }
    }
    Some(m.into_iter().map(|row| row[n]).collect())
}

/// Single-variable linear regression `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimpleRegression {
    pub slope: f64,
    pub intercept: f64,
    /// Sum of squared residuals.
    pub sse: f64,
    /// Total sum of squares of `y`.
    pub sst: f64,
    pub n: usize,
}

impl SimpleRegression {
    /// Fit on `(x, y)` points. Needs at least two points.
    pub fn fit(points: &[(f64, f64)]) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let n = points.len() as f64;
        let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
        let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        let mut sst = 0.0;
        for &(x, y) in points {
            let dx = x - mean_x;
            let dy = y - mean_y;
            sxx += dx * dx;
            sxy += dx * dy;
            sst += dy * dy;
        }
        let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
        let intercept = mean_y - slope * mean_x;
        let sse = if sxx > 0.0 {
            (sst - sxy * sxy / sxx).max(0.0)
        } else {
            sst
        };

        Some(Self {
            slope,
            intercept,
            sse,
            sst,
            n: points.len(),
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// Residual error relative to total variance (`1 - R²`).
    ///
    /// A constant target (zero total variance) is perfectly explained and
    /// yields `0.0`.
    pub fn relative_error(&self) -> f64 {
        if self.sst > 0.0 {
            self.sse / self.sst
        } else {
            0.0
        }
    }
}
