use tracing::debug;

use tsod_core::{Result, SeriesSet};

/// (current resolution, longest series allowed at it, next resolution).
const ROLLUP_STEPS: [(i64, usize, i64); 3] = [
    // more than a day of minutes -> 5 minute buckets
    (60, 1440, 300),
    // more than three days of 5 minutes -> 15 minute buckets
    (300, 864, 900),
    // more than five days of 15 minutes -> 30 minute buckets
    (900, 480, 1800),
];

/// The coarser resolution to move to, if a series of `longest` points is too long.
pub fn next_resolution(resolution: i64, longest: usize) -> Option<i64> {
    ROLLUP_STEPS
        .iter()
        .find(|(from, max_points, _)| *from == resolution && longest > *max_points)
        .map(|(_, _, to)| *to)
}

/// Coarsen every series until none exceeds the size threshold for the
/// current resolution. Returns the final resolution.
pub fn auto_rollup(set: &mut SeriesSet, resolution: i64) -> Result<i64> {
    let mut resolution = resolution;
    loop {
        let longest = set.values().map(|s| s.len()).max().unwrap_or(0);
        let Some(next) = next_resolution(resolution, longest) else {
            break;
        };
        debug!(from = resolution, to = next, longest, "rolling up resolution");
        for series in set.values_mut() {
            series.rollup(next)?;
            series.prepare()?;
        }
        resolution = next;
    }
    Ok(resolution)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use tsod_core::Series;

    fn series(name: &str, n: usize) -> Series {
        let data: BTreeMap<i64, f64> = (0..n).map(|i| (i as i64 * 60, 1.0)).collect();
        Series::with_data(name, 60, 10, data).unwrap()
    }

    #[test]
    fn thresholds() {
        assert_eq!(next_resolution(60, 1440), None);
        assert_eq!(next_resolution(60, 1441), Some(300));
        assert_eq!(next_resolution(300, 865), Some(900));
        assert_eq!(next_resolution(900, 481), Some(1800));
        assert_eq!(next_resolution(1800, 100_000), None);
        assert_eq!(next_resolution(120, 100_000), None);
    }

    #[test]
    fn short_series_keep_resolution() {
        let mut set = SeriesSet::new();
        set.insert("a".into(), series("a", 1000));
        assert_eq!(auto_rollup(&mut set, 60).unwrap(), 60);
        assert_eq!(set["a"].len(), 1000);
    }

    #[test]
    fn long_series_roll_up_repeatedly_and_together() {
        let mut set = SeriesSet::new();
        set.insert("long".into(), series("long", 5000));
        set.insert("short".into(), series("short", 600));

        let resolution = auto_rollup(&mut set, 60).unwrap();

        // 5000 minutes -> 1000 x 5m -> 334 x 15m
        assert_eq!(resolution, 900);
        assert_eq!(set["long"].len(), 334);
        assert_eq!(set["long"].resolution(), 900);
        assert_eq!(set["short"].resolution(), 900);
        assert_eq!(set["short"].data()[&0], 15.0);
        let total: f64 = set["long"].data().values().sum();
        assert_eq!(total, 5000.0);
        assert!(set["long"].is_prepared());
    }
}
