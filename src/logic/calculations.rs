use crate::models::{mm_to_inches, DailyRainfall, ForecastPeriod, MoistureCell, PrecipitationSample, SensorMoistureRecord};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// True if any forecast period mentions rain.
pub fn any_rain_likely(periods: &[ForecastPeriod]) -> bool {
    periods.iter().any(|p| p.rain_likely)
}

/// Mean QPF over non-null samples. No data means no rain credit (0.0).
pub fn mean_qpf(samples: &[PrecipitationSample]) -> f64 {
    let values: Vec<f64> = samples.iter().filter_map(|s| s.qpf_inches).collect();
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Sum QPF per calendar day (in the forecast's own offset), ordered by date.
pub fn daily_rainfall(samples: &[PrecipitationSample]) -> Vec<DailyRainfall> {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for sample in samples {
        *by_date.entry(sample.valid_time.date_naive()).or_insert(0.0) +=
            sample.qpf_inches.unwrap_or(0.0).max(0.0);
    }

    by_date
        .into_iter()
        .map(|(date, rainfall_inches)| DailyRainfall {
            date,
            rainfall_inches,
        })
        .collect()
}

/// Average the latest date's readings and convert millimeters to inches.
/// An empty history gives 0.
pub fn latest_average_moisture_inches(records: &[SensorMoistureRecord]) -> f64 {
    let Some(latest) = records.iter().map(|r| r.date).max() else {
        return 0.0;
    };

    let recent: Vec<f64> = records
        .iter()
        .filter(|r| r.date == latest)
        .map(|r| r.moisture_level)
        .collect();

    mm_to_inches(recent.iter().sum::<f64>() / recent.len() as f64)
}

/// Depth profile: duplicate (sensor, date, depth) readings are averaged first,
/// then each (date, depth) cell is averaged across sensors.
pub fn moisture_profile(records: &[SensorMoistureRecord]) -> Vec<MoistureCell> {
    let mut per_sensor: BTreeMap<(i64, NaiveDate, u64), (f64, usize)> = BTreeMap::new();
    for r in records {
        let entry = per_sensor
            .entry((r.sensor_id, r.date, r.depth_inches.to_bits()))
            .or_insert((0.0, 0));
        entry.0 += r.moisture_level;
        entry.1 += 1;
    }

    let mut cells: BTreeMap<(NaiveDate, u64), (f64, usize)> = BTreeMap::new();
    for ((_, date, depth_bits), (sum, count)) in per_sensor {
        let entry = cells.entry((date, depth_bits)).or_insert((0.0, 0));
        entry.0 += sum / count as f64;
        entry.1 += 1;
    }

    let mut profile: Vec<MoistureCell> = cells
        .into_iter()
        .map(|((date, depth_bits), (sum, count))| MoistureCell {
            date,
            depth_inches: f64::from_bits(depth_bits),
            moisture_level: sum / count as f64,
            sample_count: count,
        })
        .collect();

    profile.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then(a.depth_inches.total_cmp(&b.depth_inches))
    });
    profile
}
