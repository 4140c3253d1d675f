pub mod config;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod outlier;
pub mod sample;
pub mod series;

pub use config::{Concurrency, DetectorConfig};
pub use error::*;
pub use loader::{DataLoader, InMemoryLoader};
pub use normalize::NormalizationMode;
pub use outlier::{AnalyzerId, Inlier, Outlier, OutlierDetails, ValidatedOutlier};
pub use sample::{RawSamples, RawSeries, Sample};
pub use series::{AlertPolicy, Series, SeriesSet, TrainStats};
