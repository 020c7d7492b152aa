//! Seeded stand-in data for when no uploads or forecast are available.

use crate::models::{mm_to_inches, DailyRainfall, SensorMoistureRecord, UsageRecord};
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;

pub const DEFAULT_SEED: u64 = 42;
pub const SIMULATED_SENSORS: i64 = 50;
pub const SIMULATED_SENSOR_TYPE: &str = "Simulated";

const HYBRIDS: [&str; 3] = ["Hybrid_A", "Hybrid_B", "Hybrid_C"];
const FIELD_LOCATIONS: [&str; 4] = ["North", "South", "East", "West"];

const OPTIMAL_WATER_GALLONS: f64 = 1200.0;
const WATER_SPREAD: f64 = 300.0;
const YIELD_POTENTIAL: f64 = 10.0;
const OPTIMAL_TEMPERATURE_C: f64 = 25.0;
const TEMPERATURE_SPREAD: f64 = 5.0;
const OPTIMAL_HUMIDITY_PCT: f64 = 50.0;
const HUMIDITY_SPREAD: f64 = 10.0;
const YIELD_NOISE_SD: f64 = 0.5;

fn gaussian_response(value: f64, optimum: f64, spread: f64) -> f64 {
    (-((value - optimum).powi(2)) / (2.0 * spread.powi(2))).exp()
}

/// Yield as the product of water, temperature and humidity responses, clipped to potential.
pub fn modeled_yield(water_gallons: f64, temperature_c: f64, humidity_pct: f64, noise: f64) -> f64 {
    let base = YIELD_POTENTIAL * gaussian_response(water_gallons, OPTIMAL_WATER_GALLONS, WATER_SPREAD);
    let y = base
        * gaussian_response(temperature_c, OPTIMAL_TEMPERATURE_C, TEMPERATURE_SPREAD)
        * gaussian_response(humidity_pct, OPTIMAL_HUMIDITY_PCT, HUMIDITY_SPREAD)
        + noise;
    y.clamp(0.0, YIELD_POTENTIAL)
}

/// 50 sensors of usage and yield. The same seed always gives the same rows.
pub fn simulate_usage(seed: u64) -> Vec<UsageRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, YIELD_NOISE_SD).ok();

    (1..=SIMULATED_SENSORS)
        .map(|sensor_id| {
            let hybrid = HYBRIDS.choose(&mut rng).map(|h| h.to_string());
            let field_location = FIELD_LOCATIONS.choose(&mut rng).map(|l| l.to_string());
            let temperature_c = rng.gen_range(15.0..35.0);
            let humidity_pct = rng.gen_range(30.0..70.0);
            let water_usage_gallons = rng.gen_range(500.0..2000.0);
            let jitter = noise.map(|n| rng.sample(n)).unwrap_or(0.0);

            UsageRecord {
                sensor_id,
                hybrid,
                field_location,
                temperature_c: Some(temperature_c),
                humidity_pct: Some(humidity_pct),
                water_usage_gallons,
                yield_units: modeled_yield(water_usage_gallons, temperature_c, humidity_pct, jitter),
                cost_per_gallon: rng.gen_range(0.05..0.15),
            }
        })
        .collect()
}

/// Thirty days of readings ending at `today`, every 5 cm from 3 cm to 63 cm
/// (stored in inches), for each sensor.
pub fn simulate_moisture(sensor_ids: &[i64], today: NaiveDate, seed: u64) -> Vec<SensorMoistureRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = today - Duration::days(29);
    let mut records = Vec::new();

    for &sensor_id in sensor_ids {
        for depth in (3..65).step_by(5) {
            for offset in 0..30 {
                records.push(SensorMoistureRecord {
                    sensor_id,
                    date: start + Duration::days(offset),
                    depth_inches: mm_to_inches(depth as f64 * 10.0),
                    moisture_level: rng.gen_range(10.0..50.0),
                    sensor_type: SIMULATED_SENSOR_TYPE.to_string(),
                });
            }
        }
    }
    records
}

/// Seven days of rain starting at `start`, 0-20 mm per day, in inches.
pub fn simulate_rainfall(start: NaiveDate, seed: u64) -> Vec<DailyRainfall> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..7)
        .map(|offset| DailyRainfall {
            date: start + Duration::days(offset),
            rainfall_inches: mm_to_inches(rng.gen_range(0.0..20.0)),
        })
        .collect()
}
