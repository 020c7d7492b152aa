use crate::config::EconomicsConfig;
use crate::models::{EfficiencyRecord, HybridAssignment, HybridEfficiency, UsageRecord};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EfficiencyReport {
    pub records: Vec<EfficiencyRecord>,
    /// Rows skipped because water usage was zero or negative.
    pub skipped: usize,
}

/// Overlay uploaded hybrid assignments onto usage rows by sensor id.
/// Sensors without an assignment keep whatever hybrid they had.
pub fn attach_hybrids(usage: &[UsageRecord], assignments: &[HybridAssignment]) -> Vec<UsageRecord> {
    let by_sensor: HashMap<i64, &str> = assignments
        .iter()
        .map(|a| (a.sensor_id, a.company_hybrid.as_str()))
        .collect();

    usage
        .iter()
        .map(|u| {
            let mut row = u.clone();
            if let Some(hybrid) = by_sensor.get(&u.sensor_id) {
                row.hybrid = Some(hybrid.to_string());
            }
            row
        })
        .collect()
}

pub fn efficiency_record(usage: &UsageRecord, economics: &EconomicsConfig) -> Option<EfficiencyRecord> {
    if usage.water_usage_gallons <= 0.0 {
        return None;
    }

    let total_water_cost_usd = usage.water_usage_gallons * usage.cost_per_gallon;
    let gross_revenue_usd = usage.yield_units * economics.market_price_per_unit;

    Some(EfficiencyRecord {
        sensor_id: usage.sensor_id,
        hybrid: usage.hybrid.clone(),
        water_usage_gallons: usage.water_usage_gallons,
        yield_units: usage.yield_units,
        cost_per_gallon: usage.cost_per_gallon,
        total_water_cost_usd,
        gross_revenue_usd,
        ewue: 100.0 * (gross_revenue_usd - total_water_cost_usd) / usage.water_usage_gallons,
        iwue: 100.0 * (usage.yield_units - economics.baseline_yield) / usage.water_usage_gallons,
    })
}

pub fn compute_efficiency(usage: &[UsageRecord], economics: &EconomicsConfig) -> EfficiencyReport {
    let records: Vec<EfficiencyRecord> = usage
        .iter()
        .filter_map(|u| efficiency_record(u, economics))
        .collect();
    let skipped = usage.len() - records.len();
    if skipped > 0 {
        tracing::warn!("Skipped {} usage rows with non-positive water usage", skipped);
    }
    EfficiencyReport { records, skipped }
}

/// Mean EWUE/IWUE and total water cost per hybrid, ordered by hybrid name.
/// Rows with no hybrid are left out.
pub fn summarize_by_hybrid(records: &[EfficiencyRecord]) -> Vec<HybridEfficiency> {
    let mut groups: BTreeMap<&str, Vec<&EfficiencyRecord>> = BTreeMap::new();
    for r in records {
        if let Some(hybrid) = r.hybrid.as_deref() {
            groups.entry(hybrid).or_default().push(r);
        }
    }

    groups
        .into_iter()
        .map(|(hybrid, rows)| {
            let n = rows.len() as f64;
            HybridEfficiency {
                hybrid: hybrid.to_string(),
                sensor_count: rows.len(),
                mean_ewue: rows.iter().map(|r| r.ewue).sum::<f64>() / n,
                mean_iwue: rows.iter().map(|r| r.iwue).sum::<f64>() / n,
                total_water_cost_usd: rows.iter().map(|r| r.total_water_cost_usd).sum(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(sensor_id: i64, hybrid: Option<&str>, gallons: f64, yield_units: f64) -> UsageRecord {
        UsageRecord {
            sensor_id,
            hybrid: hybrid.map(String::from),
            field_location: None,
            temperature_c: None,
            humidity_pct: None,
            water_usage_gallons: gallons,
            yield_units,
            cost_per_gallon: 0.1,
        }
    }

    #[test]
    fn ewue_and_iwue_formulas() {
        let report = compute_efficiency(&[usage(1, Some("A"), 1000.0, 8.0)], &EconomicsConfig::default());
        let r = &report.records[0];
        assert!((r.total_water_cost_usd - 100.0).abs() < 1e-9);
        assert!((r.gross_revenue_usd - 16.0).abs() < 1e-9);
        // 100 * (16 - 100) / 1000
        assert!((r.ewue - (-8.4)).abs() < 1e-9);
        // 100 * (8 - 2) / 1000
        assert!((r.iwue - 0.6).abs() < 1e-9);
    }

    #[test]
    fn below_baseline_yield_gives_negative_iwue() {
        let report = compute_efficiency(&[usage(1, None, 500.0, 1.0)], &EconomicsConfig::default());
        assert!(report.records[0].iwue < 0.0);
    }

    #[test]
    fn zero_usage_rows_are_skipped() {
        let report = compute_efficiency(
            &[usage(1, None, 0.0, 5.0), usage(2, None, -3.0, 5.0), usage(3, None, 800.0, 5.0)],
            &EconomicsConfig::default(),
        );
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.skipped, 2);
        assert!(report.records.iter().all(|r| r.ewue.is_finite() && r.iwue.is_finite()));
    }

    #[test]
    fn uploaded_hybrids_override_and_fill() {
        let rows = vec![usage(1, Some("Hybrid_A"), 1000.0, 5.0), usage(2, None, 1000.0, 5.0), usage(3, Some("Hybrid_C"), 1000.0, 5.0)];
        let assignments = vec![
            HybridAssignment { sensor_id: 1, company_hybrid: "P1197".into() },
            HybridAssignment { sensor_id: 2, company_hybrid: "DKC62".into() },
        ];
        let merged = attach_hybrids(&rows, &assignments);
        assert_eq!(merged[0].hybrid.as_deref(), Some("P1197"));
        assert_eq!(merged[1].hybrid.as_deref(), Some("DKC62"));
        assert_eq!(merged[2].hybrid.as_deref(), Some("Hybrid_C"));
    }

    #[test]
    fn summary_groups_by_hybrid() {
        let report = compute_efficiency(
            &[
                usage(1, Some("B"), 1000.0, 4.0),
                usage(2, Some("A"), 1000.0, 6.0),
                usage(3, Some("B"), 1000.0, 8.0),
                usage(4, None, 1000.0, 8.0),
            ],
            &EconomicsConfig::default(),
        );
        let summary = summarize_by_hybrid(&report.records);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].hybrid, "A");
        assert_eq!(summary[1].sensor_count, 2);
        // IWUE for B: (0.2 + 0.6) / 2
        assert!((summary[1].mean_iwue - 0.4).abs() < 1e-9);
        assert!((summary[1].total_water_cost_usd - 200.0).abs() < 1e-9);
    }
}
