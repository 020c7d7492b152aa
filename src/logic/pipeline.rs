//! Stage facades for the presentation layer. None of these return `Err`:
//! failures become empty data plus an error status.

use super::costs::{combine_by_farm_date, farm_totals, normalize_costs, rollup_by_hybrid, DateRange};
use super::efficiency::{attach_hybrids, compute_efficiency, summarize_by_hybrid, EfficiencyReport};
use super::forecast_sync::ForecastSnapshot;
use super::rules::{RuleEvaluation, RulesEngine};
use super::simulation::{simulate_moisture, simulate_usage, SIMULATED_SENSORS};
use super::water_balance::water_balance_from_sensors;
use crate::config::Config;
use crate::error::{MaxWaterError, Result};
use crate::models::{
    CostKind, CostRecord, DailyRainfall, FarmCostTotal, FarmDateCost, FieldConditions,
    HybridEfficiency, HybridRollup, PlantingRecord, SensorMoistureRecord, StageOutcome,
    StageStatus, WaterBalanceState,
};
use crate::tables::{hybrid_assignments, planting_records, sensor_records, usage_records, Upload};
use chrono::NaiveDate;
use serde::Serialize;

/// Uploaded sensor history, or a simulated month when nothing was uploaded.
pub fn load_sensor_data(
    upload: Option<&Upload>,
    today: NaiveDate,
    seed: u64,
) -> StageOutcome<Vec<SensorMoistureRecord>> {
    let Some(upload) = upload else {
        let ids: Vec<i64> = (1..=SIMULATED_SENSORS).collect();
        return StageOutcome::new(
            simulate_moisture(&ids, today, seed),
            StageStatus::ok("Using simulated sensor data."),
        );
    };

    match upload.read_table().and_then(sensor_records) {
        Ok(parsed) => {
            let summary = parsed.report.summary("Sensor");
            let status = if parsed.report.dropped_rows > 0 {
                StageStatus::warning(summary)
            } else {
                StageStatus::ok(summary)
            };
            StageOutcome::new(parsed.records, status)
        }
        Err(e) => {
            tracing::warn!("Sensor upload {} rejected: {}", upload.filename, e);
            StageOutcome::failed(e.to_string())
        }
    }
}

/// Run the rule engine with the forecast's rain signal.
pub fn recommend_irrigation(
    soil_moisture_pct: f64,
    crop_stage: &str,
    ndvi: Option<f64>,
    forecast: &ForecastSnapshot,
    config: &Config,
) -> StageOutcome<RuleEvaluation> {
    let (rain, qpf) = forecast.rain_signal();
    let mut conditions = FieldConditions::new(soil_moisture_pct, crop_stage).with_rain(rain, qpf);
    conditions.ndvi = ndvi;

    let evaluation = RulesEngine::new().evaluate_with_config(&conditions, config);
    let verdict = if evaluation.decision.needed {
        format!(
            "Irrigate {:.2}\" (${:.2}/acre)",
            evaluation.decision.depth_inches, evaluation.decision.cost_usd
        )
    } else {
        "No irrigation needed".to_string()
    };

    let status = StageStatus::combine([
        StageStatus::ok(verdict),
        StageStatus {
            level: forecast.status.level,
            message: if forecast.status.is_ok() {
                String::new()
            } else {
                forecast.status.message.clone()
            },
        },
    ]);
    StageOutcome::new(evaluation, status)
}

pub fn water_balance_stage(
    sensors: &[SensorMoistureRecord],
    rainfall: &[DailyRainfall],
    crop_stage: &str,
    config: &Config,
) -> StageOutcome<WaterBalanceState> {
    let params = config.stage_parameters(crop_stage);
    let state = water_balance_from_sensors(sensors, rainfall, &params);

    let status = if sensors.is_empty() {
        StageStatus::warning("No sensor readings; assuming dry soil")
    } else if rainfall.is_empty() {
        StageStatus::warning("No forecast rainfall; threshold assumes no rain")
    } else {
        StageStatus::ok(format!(
            "Irrigation threshold {:.2}\" over {} forecast days",
            state.irrigation_threshold_inches,
            state.daily_forecast.len()
        ))
    };
    StageOutcome::new(state, status)
}

/// Uploads and prices for the cost views.
#[derive(Debug, Clone, Default)]
pub struct CostInputs<'a> {
    pub irrigation: Option<&'a Upload>,
    pub fertilizer: Option<&'a Upload>,
    pub planting: Option<&'a Upload>,
    pub range: Option<DateRange>,
    pub irrigation_price: f64,
    pub fertilizer_price: f64,
    pub selected_hybrids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CostOverview {
    pub irrigation: Vec<CostRecord>,
    pub fertilizer: Vec<CostRecord>,
    pub combined: Vec<FarmDateCost>,
    pub hybrids: HybridRollup,
}

struct CostTable {
    records: Vec<CostRecord>,
    totals: Vec<FarmCostTotal>,
    dropped_rows: usize,
}

fn load_cost_table(
    upload: &Upload,
    kind: CostKind,
    range: Option<DateRange>,
    unit_price: f64,
) -> Result<CostTable> {
    let table = upload.read_table()?;
    let normalized = normalize_costs(&table, kind, range, unit_price)?;
    let totals = farm_totals(&table, kind, unit_price)?;
    Ok(CostTable {
        records: normalized.records,
        totals,
        dropped_rows: normalized.dropped_rows,
    })
}

fn cost_source(
    upload: Option<&Upload>,
    kind: CostKind,
    range: Option<DateRange>,
    unit_price: f64,
    statuses: &mut Vec<StageStatus>,
) -> Option<CostTable> {
    let upload = upload?;
    match load_cost_table(upload, kind, range, unit_price) {
        Ok(table) => {
            let message = format!("{} data: {} rows", kind, table.records.len());
            statuses.push(if table.dropped_rows > 0 {
                StageStatus::warning(format!("{}, {} dropped", message, table.dropped_rows))
            } else {
                StageStatus::ok(message)
            });
            Some(table)
        }
        Err(e) => {
            tracing::warn!("{} upload {} rejected: {}", kind, upload.filename, e);
            statuses.push(StageStatus::error(e.to_string()));
            None
        }
    }
}

/// Long-form irrigation and fertilizer costs, their per-farm-per-date
/// combination, and the per-hybrid rollup.
pub fn cost_overview(inputs: &CostInputs<'_>) -> StageOutcome<CostOverview> {
    if inputs.irrigation.is_none() && inputs.fertilizer.is_none() {
        return StageOutcome::new(
            CostOverview::default(),
            StageStatus::warning("No irrigation or fertilizer data uploaded"),
        );
    }

    let mut statuses = Vec::new();
    let irrigation = cost_source(
        inputs.irrigation,
        CostKind::Irrigation,
        inputs.range,
        inputs.irrigation_price,
        &mut statuses,
    );
    let fertilizer = cost_source(
        inputs.fertilizer,
        CostKind::Fertilizer,
        inputs.range,
        inputs.fertilizer_price,
        &mut statuses,
    );

    let planting: Option<Vec<PlantingRecord>> = match inputs.planting {
        Some(upload) => match upload.read_table().and_then(planting_records) {
            Ok(parsed) => Some(parsed.records),
            Err(e) => {
                statuses.push(StageStatus::error(e.to_string()));
                None
            }
        },
        None => None,
    };

    let hybrids = match (&planting, inputs.planting) {
        (None, Some(_)) => HybridRollup::unavailable(&MaxWaterError::DataJoin(
            "Planting data could not be read".into(),
        )),
        _ => rollup_by_hybrid(
            irrigation.as_ref().map(|t| t.totals.as_slice()),
            fertilizer.as_ref().map(|t| t.totals.as_slice()),
            planting.as_deref(),
            &inputs.selected_hybrids,
        ),
    };

    let irrigation = irrigation.map(|t| t.records).unwrap_or_default();
    let fertilizer = fertilizer.map(|t| t.records).unwrap_or_default();
    let combined = combine_by_farm_date(&irrigation, &fertilizer);

    StageOutcome::new(
        CostOverview {
            irrigation,
            fertilizer,
            combined,
            hybrids,
        },
        StageStatus::combine(statuses),
    )
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EfficiencyOverview {
    pub report: EfficiencyReport,
    pub by_hybrid: Vec<HybridEfficiency>,
}

/// Efficiency metrics for uploaded usage, or for the simulated dataset.
/// Uploaded hybrid assignments are laid over either.
pub fn efficiency_overview(
    usage: Option<&Upload>,
    hybrids: Option<&Upload>,
    config: &Config,
    seed: u64,
) -> StageOutcome<EfficiencyOverview> {
    let mut statuses = Vec::new();

    let rows = match usage {
        Some(upload) => match upload.read_table().and_then(usage_records) {
            Ok(parsed) => {
                statuses.push(StageStatus::ok(parsed.report.summary("Usage")));
                parsed.records
            }
            Err(e) => return StageOutcome::failed(e.to_string()),
        },
        None => {
            statuses.push(StageStatus::ok("Using simulated usage data."));
            simulate_usage(seed)
        }
    };

    let rows = match hybrids {
        Some(upload) => match upload.read_table().and_then(hybrid_assignments) {
            Ok(parsed) => {
                statuses.push(StageStatus::ok(parsed.report.summary("Hybrid")));
                attach_hybrids(&rows, &parsed.records)
            }
            Err(e) => return StageOutcome::failed(e.to_string()),
        },
        None => rows,
    };

    let report = compute_efficiency(&rows, &config.economics);
    if report.skipped > 0 {
        statuses.push(StageStatus::warning(format!(
            "{} rows skipped for zero water usage",
            report.skipped
        )));
    }
    let by_hybrid = summarize_by_hybrid(&report.records);

    StageOutcome::new(EfficiencyOverview { report, by_hybrid }, StageStatus::combine(statuses))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StatusLevel;

    fn csv(name: &str, body: &str) -> Upload {
        Upload::from_bytes(body.as_bytes().to_vec(), name)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 30).unwrap()
    }

    #[test]
    fn sensor_stage_reports_missing_columns() {
        let upload = csv("sensors.csv", "Sensor_ID,Date\n1,2024-07-01\n");
        let outcome = load_sensor_data(Some(&upload), today(), 42);
        assert!(outcome.data.is_empty());
        assert_eq!(outcome.status.level, StatusLevel::Error);
        assert!(outcome
            .status
            .message
            .ends_with("Missing columns in sensor data: Depth, Moisture_Level"));
    }

    #[test]
    fn sensor_stage_simulates_without_upload() {
        let outcome = load_sensor_data(None, today(), 42);
        assert!(outcome.status.is_ok());
        assert_eq!(outcome.data.len(), 50 * 13 * 30);
    }

    #[test]
    fn unsupported_upload_is_an_error_status() {
        let upload = csv("sensors.json", "{}");
        let outcome = load_sensor_data(Some(&upload), today(), 42);
        assert_eq!(outcome.status.level, StatusLevel::Error);
    }

    #[test]
    fn recommendation_without_forecast_warns() {
        let outcome = recommend_irrigation(25.0, "vegetative", None, &ForecastSnapshot::default(), &Config::default());
        assert!(outcome.data.decision.needed);
        assert_eq!(outcome.status.level, StatusLevel::Warning);
        assert!(outcome.status.message.starts_with("Irrigate 0.30\""));
    }

    #[test]
    fn water_balance_without_sensors_warns() {
        let outcome = water_balance_stage(&[], &[], "flowering", &Config::default());
        assert_eq!(outcome.status.level, StatusLevel::Warning);
        assert!((outcome.data.irrigation_threshold_inches - 1.97).abs() < 1e-9);
    }

    #[test]
    fn cost_overview_end_to_end() {
        let irrigation = csv(
            "irrigation.csv",
            "FarmID,2024-01-01,2024-01-02,Total\nA,1,2,3\nB,0,1,1\n",
        );
        let fertilizer = csv("fertilizer.csv", "FarmID,2024-01-01,Total\nA,2,2\n");
        let planting = csv(
            "planting.csv",
            "FarmID,PlantingDate,CompanyHybrid,Seeding Rate(plants/ac)\nA,2024-04-20,P1197,34000\nB,2024-04-22,DKC62,32000\n",
        );
        let inputs = CostInputs {
            irrigation: Some(&irrigation),
            fertilizer: Some(&fertilizer),
            planting: Some(&planting),
            irrigation_price: 15.0,
            fertilizer_price: 5.0,
            ..Default::default()
        };

        let outcome = cost_overview(&inputs);
        assert!(outcome.status.is_ok(), "{}", outcome.status);
        assert_eq!(outcome.data.irrigation.len(), 4);
        assert_eq!(outcome.data.fertilizer.len(), 1);
        assert_eq!(outcome.data.combined.len(), 4);

        let hybrids = outcome.data.hybrids.hybrids();
        assert_eq!(hybrids.len(), 2);
        assert_eq!(hybrids[0].company_hybrid, "DKC62");
        assert_eq!(hybrids[0].total_cost_usd, 15.0);
        // A: 3 * 15 + 2 * 5
        assert_eq!(hybrids[1].total_cost_usd, 55.0);
    }

    #[test]
    fn cost_overview_without_planting_still_returns_costs() {
        let irrigation = csv("irrigation.csv", "FarmID,2024-01-01\nA,1\n");
        let inputs = CostInputs {
            irrigation: Some(&irrigation),
            irrigation_price: 15.0,
            ..Default::default()
        };
        let outcome = cost_overview(&inputs);
        assert_eq!(outcome.data.irrigation.len(), 1);
        assert!(!outcome.data.hybrids.is_available());
    }

    #[test]
    fn bad_fertilizer_upload_does_not_hide_irrigation() {
        let irrigation = csv("irrigation.csv", "FarmID,2024-01-01\nA,1\n");
        let fertilizer = csv("fertilizer.csv", "Farm,2024-01-01\nA,1\n");
        let inputs = CostInputs {
            irrigation: Some(&irrigation),
            fertilizer: Some(&fertilizer),
            irrigation_price: 1.0,
            fertilizer_price: 1.0,
            ..Default::default()
        };
        let outcome = cost_overview(&inputs);
        assert_eq!(outcome.status.level, StatusLevel::Error);
        assert!(outcome.status.message.contains("fertilizer"));
        assert_eq!(outcome.data.irrigation.len(), 1);
        assert!(outcome.data.fertilizer.is_empty());
    }

    #[test]
    fn unreadable_cost_uploads_leave_rollup_without_data() {
        let irrigation = csv("irrigation.csv", "Farm,2024-01-01\nA,1\n");
        let fertilizer = csv("fertilizer.csv", "Farm,2024-01-01\nA,1\n");
        let planting = csv(
            "planting.csv",
            "FarmID,PlantingDate,CompanyHybrid,Seeding Rate(plants/ac)\nA,2024-04-20,P1197,34000\n",
        );
        let inputs = CostInputs {
            irrigation: Some(&irrigation),
            fertilizer: Some(&fertilizer),
            planting: Some(&planting),
            irrigation_price: 1.0,
            fertilizer_price: 1.0,
            ..Default::default()
        };
        let outcome = cost_overview(&inputs);
        assert_eq!(outcome.status.level, StatusLevel::Error);
        assert_eq!(
            outcome.data.hybrids,
            HybridRollup::NoData {
                reason: "No readable irrigation or fertilizer data".into()
            }
        );
    }

    #[test]
    fn unreadable_planting_upload_is_no_data() {
        let irrigation = csv("irrigation.csv", "FarmID,2024-01-01\nA,1\n");
        let planting = csv("planting.csv", "FarmID,CompanyHybrid\nA,P1197\n");
        let inputs = CostInputs {
            irrigation: Some(&irrigation),
            planting: Some(&planting),
            irrigation_price: 1.0,
            ..Default::default()
        };
        let outcome = cost_overview(&inputs);
        assert_eq!(
            outcome.data.hybrids,
            HybridRollup::NoData {
                reason: "Planting data could not be read".into()
            }
        );
    }

    #[test]
    fn efficiency_uses_simulation_by_default() {
        let outcome = efficiency_overview(None, None, &Config::default(), 42);
        assert!(outcome.status.is_ok());
        assert_eq!(outcome.data.report.records.len(), 50);
        assert!(!outcome.data.by_hybrid.is_empty());
    }

    #[test]
    fn efficiency_overlays_uploaded_hybrids() {
        let hybrids = csv("hybrids.csv", "Sensor_ID,CompanyHybrid\n1,P1197\n");
        let outcome = efficiency_overview(None, Some(&hybrids), &Config::default(), 42);
        assert_eq!(outcome.data.report.records[0].hybrid.as_deref(), Some("P1197"));
        assert!(outcome.data.by_hybrid.iter().any(|h| h.hybrid == "P1197"));
    }
}
