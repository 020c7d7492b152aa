use crate::error::{MaxWaterError, Result, ValidationError};
use crate::models::{
    CostKind, CostRecord, FarmCostTotal, FarmDateCost, HybridCostRollup, HybridRollup,
    PlantingRecord,
};
use crate::tables::dates::parse_date;
use crate::tables::readers::FARM_ID;
use crate::tables::{parse_number, RawTable};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Per-farm running total column; never treated as a date.
pub const TOTAL: &str = "Total";

/// Inclusive date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(ValidationError::InvalidValue(format!(
                "date range starts ({}) after it ends ({})",
                start, end
            ))
            .into());
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Long-form cost rows plus how many were lost to unreadable date headers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedCosts {
    pub records: Vec<CostRecord>,
    pub dropped_rows: usize,
}

fn check_price(unit_price: f64, kind: CostKind) -> Result<()> {
    if !unit_price.is_finite() || unit_price < 0.0 {
        return Err(ValidationError::InvalidValue(format!(
            "{} unit price must be a non-negative number, got {}",
            kind, unit_price
        ))
        .into());
    }
    Ok(())
}

fn farm_column(table: &RawTable, kind: CostKind) -> Result<usize> {
    table.column_index(FARM_ID).ok_or_else(|| {
        ValidationError::MissingColumns {
            table: kind.as_str().to_string(),
            missing: vec![FARM_ID.to_string()],
        }
        .into()
    })
}

/// Every column except FarmID and Total, by index.
fn date_columns(table: &RawTable) -> Vec<usize> {
    table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.as_str() != FARM_ID && c.as_str() != TOTAL)
        .map(|(i, _)| i)
        .collect()
}

/// Reshape a wide farm-by-date table into one priced row per farm per date.
///
/// Rows come out date column first, then table row. Columns whose header is
/// not a date are dropped and counted; blank or non-numeric amounts count as 0.
pub fn normalize_costs(
    table: &RawTable,
    kind: CostKind,
    range: Option<DateRange>,
    unit_price: f64,
) -> Result<NormalizedCosts> {
    check_price(unit_price, kind)?;
    let farm_idx = farm_column(table, kind)?;
    let columns = date_columns(table);
    if columns.is_empty() {
        return Err(ValidationError::NoDateColumns(kind.as_str().to_string()).into());
    }

    let mut records = Vec::new();
    let mut dropped_rows = 0;

    for idx in columns {
        let Some(date) = parse_date(&table.columns[idx]) else {
            dropped_rows += table.rows.len();
            continue;
        };
        if range.map(|r| !r.contains(date)).unwrap_or(false) {
            continue;
        }

        for row in &table.rows {
            let amount = parse_number(&row[idx]).unwrap_or(0.0);
            records.push(CostRecord {
                farm_id: row[farm_idx].clone(),
                date,
                amount,
                cost_usd: amount * unit_price,
            });
        }
    }

    if dropped_rows > 0 {
        tracing::warn!(
            "{} data: dropped {} rows under non-date column headers",
            kind,
            dropped_rows
        );
    }
    tracing::debug!("{} data: {} long-form rows", kind, records.len());

    Ok(NormalizedCosts {
        records,
        dropped_rows,
    })
}

/// Per-farm totals from the `Total` column, or the sum of the date columns
/// when there is none. Repeated farm rows are summed, first-seen order kept.
pub fn farm_totals(table: &RawTable, kind: CostKind, unit_price: f64) -> Result<Vec<FarmCostTotal>> {
    check_price(unit_price, kind)?;
    let farm_idx = farm_column(table, kind)?;

    let amount_of: Box<dyn Fn(&[String]) -> f64> = match table.column_index(TOTAL) {
        Some(total_idx) => Box::new(move |row: &[String]| parse_number(&row[total_idx]).unwrap_or(0.0)),
        None => {
            let dated: Vec<usize> = date_columns(table)
                .into_iter()
                .filter(|&i| parse_date(&table.columns[i]).is_some())
                .collect();
            if dated.is_empty() {
                return Err(ValidationError::NoDateColumns(kind.as_str().to_string()).into());
            }
            Box::new(move |row: &[String]| {
                dated
                    .iter()
                    .map(|&i| parse_number(&row[i]).unwrap_or(0.0))
                    .sum()
            })
        }
    };

    let mut totals: Vec<FarmCostTotal> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for row in &table.rows {
        let farm_id = row[farm_idx].as_str();
        if farm_id.is_empty() {
            continue;
        }
        let amount = amount_of(row.as_slice());
        match positions.get(farm_id) {
            Some(&pos) => {
                totals[pos].amount += amount;
                totals[pos].cost_usd += amount * unit_price;
            }
            None => {
                positions.insert(farm_id.to_string(), totals.len());
                totals.push(FarmCostTotal {
                    farm_id: farm_id.to_string(),
                    amount,
                    cost_usd: amount * unit_price,
                });
            }
        }
    }
    Ok(totals)
}

/// Irrigation and fertilizer cost side by side per (farm, date), ordered by
/// date then farm. Either side may be missing for a key; it counts as 0.
pub fn combine_by_farm_date(irrigation: &[CostRecord], fertilizer: &[CostRecord]) -> Vec<FarmDateCost> {
    let mut combined: BTreeMap<(NaiveDate, String), (f64, f64)> = BTreeMap::new();
    for r in irrigation {
        combined.entry((r.date, r.farm_id.clone())).or_default().0 += r.cost_usd;
    }
    for r in fertilizer {
        combined.entry((r.date, r.farm_id.clone())).or_default().1 += r.cost_usd;
    }

    combined
        .into_iter()
        .map(|((date, farm_id), (irrigation_cost_usd, fertilizer_cost_usd))| FarmDateCost {
            farm_id,
            date,
            irrigation_cost_usd,
            fertilizer_cost_usd,
            total_cost_usd: irrigation_cost_usd + fertilizer_cost_usd,
        })
        .collect()
}

/// Total irrigation plus fertilizer cost per hybrid.
///
/// Irrigation farms are the base when present and fertilizer is joined onto
/// them (missing → 0); otherwise fertilizer farms are the base. Each base farm
/// contributes to every hybrid planted on it. Farms with no planting row are
/// left out. A non-empty `selected` keeps only those hybrids.
pub fn rollup_by_hybrid(
    irrigation: Option<&[FarmCostTotal]>,
    fertilizer: Option<&[FarmCostTotal]>,
    planting: Option<&[PlantingRecord]>,
    selected: &[String],
) -> HybridRollup {
    match join_hybrids(irrigation, fertilizer, planting, selected) {
        Ok(hybrids) => HybridRollup::Available { hybrids },
        Err(e) => {
            tracing::debug!("Hybrid rollup unavailable: {}", e);
            HybridRollup::unavailable(&e)
        }
    }
}

fn join_hybrids(
    irrigation: Option<&[FarmCostTotal]>,
    fertilizer: Option<&[FarmCostTotal]>,
    planting: Option<&[PlantingRecord]>,
    selected: &[String],
) -> Result<Vec<HybridCostRollup>> {
    let planting =
        planting.ok_or_else(|| MaxWaterError::DataJoin("Planting data not uploaded".into()))?;

    let base: Vec<(String, f64)> = match (irrigation, fertilizer) {
        (Some(irr), fert) => {
            let fert_by_farm: HashMap<&str, f64> = fert
                .unwrap_or_default()
                .iter()
                .map(|f| (f.farm_id.as_str(), f.cost_usd))
                .collect();
            irr.iter()
                .map(|i| {
                    let fert_cost = fert_by_farm.get(i.farm_id.as_str()).copied().unwrap_or(0.0);
                    (i.farm_id.clone(), i.cost_usd + fert_cost)
                })
                .collect()
        }
        (None, Some(fert)) => fert.iter().map(|f| (f.farm_id.clone(), f.cost_usd)).collect(),
        (None, None) => {
            return Err(MaxWaterError::DataJoin(
                "No readable irrigation or fertilizer data".into(),
            ))
        }
    };

    let mut hybrids_by_farm: HashMap<&str, Vec<&str>> = HashMap::new();
    for p in planting {
        if selected.is_empty() || selected.iter().any(|s| s == &p.company_hybrid) {
            hybrids_by_farm
                .entry(p.farm_id.as_str())
                .or_default()
                .push(p.company_hybrid.as_str());
        }
    }

    let mut per_hybrid: BTreeMap<&str, f64> = BTreeMap::new();
    let mut unmatched = 0;
    for (farm_id, cost) in &base {
        match hybrids_by_farm.get(farm_id.as_str()) {
            Some(hybrids) => {
                for hybrid in hybrids {
                    *per_hybrid.entry(*hybrid).or_insert(0.0) += cost;
                }
            }
            None => unmatched += 1,
        }
    }
    if unmatched > 0 {
        tracing::debug!("{} farms had no matching planting row", unmatched);
    }

    Ok(per_hybrid
        .into_iter()
        .map(|(hybrid, total)| HybridCostRollup {
            company_hybrid: hybrid.to_string(),
            total_cost_usd: total,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn irrigation_table() -> RawTable {
        RawTable::from_rows(
            &["FarmID", "2024-01-01", "2024-01-02", "Total"],
            &[&["A", "1.5", "2", "3.5"], &["B", "", "abc", "0"]],
        )
    }

    fn planting(farm: &str, hybrid: &str) -> PlantingRecord {
        PlantingRecord {
            farm_id: farm.into(),
            planting_date: None,
            company_hybrid: hybrid.into(),
            seeding_rate: None,
        }
    }

    fn total(farm: &str, cost: f64) -> FarmCostTotal {
        FarmCostTotal {
            farm_id: farm.into(),
            amount: cost,
            cost_usd: cost,
        }
    }

    #[test]
    fn melts_two_farms_by_two_dates() {
        let out = normalize_costs(&irrigation_table(), CostKind::Irrigation, None, 15.0).unwrap();
        assert_eq!(out.records.len(), 4);
        assert_eq!(out.dropped_rows, 0);

        let first = &out.records[0];
        assert_eq!((first.farm_id.as_str(), first.date), ("A", d(2024, 1, 1)));
        assert!((first.cost_usd - 22.5).abs() < 1e-9);
        // Blank and non-numeric amounts become 0
        assert_eq!(out.records[1].amount, 0.0);
        assert_eq!(out.records[3].cost_usd, 0.0);
        assert!(out.records.iter().all(|r| (r.cost_usd - r.amount * 15.0).abs() < 1e-9));
    }

    #[test]
    fn date_range_filters_inclusively() {
        let range = DateRange::new(d(2024, 1, 2), d(2024, 1, 31)).unwrap();
        let out = normalize_costs(&irrigation_table(), CostKind::Irrigation, Some(range), 1.0).unwrap();
        assert_eq!(out.records.len(), 2);
        assert!(out.records.iter().all(|r| r.date == d(2024, 1, 2)));
        assert!(DateRange::new(d(2024, 2, 1), d(2024, 1, 1)).is_err());
    }

    #[test]
    fn non_date_headers_are_dropped() {
        let table = RawTable::from_rows(&["FarmID", "2024-01-01", "Notes"], &[&["A", "1", "x"]]);
        let out = normalize_costs(&table, CostKind::Fertilizer, None, 2.0).unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.dropped_rows, 1);
    }

    #[test]
    fn missing_farm_id_is_a_validation_error() {
        let table = RawTable::from_rows(&["Farm", "2024-01-01"], &[&["A", "1"]]);
        let err = normalize_costs(&table, CostKind::Irrigation, None, 1.0).unwrap_err();
        match err {
            MaxWaterError::Validation(ValidationError::MissingColumns { table, missing }) => {
                assert_eq!(table, "irrigation");
                assert_eq!(missing, vec!["FarmID"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn table_without_date_columns() {
        let table = RawTable::from_rows(&["FarmID", "Total"], &[&["A", "1"]]);
        let err = normalize_costs(&table, CostKind::Irrigation, None, 1.0).unwrap_err();
        assert!(matches!(
            err,
            MaxWaterError::Validation(ValidationError::NoDateColumns(_))
        ));
    }

    #[test]
    fn negative_price_rejected() {
        let err = normalize_costs(&irrigation_table(), CostKind::Irrigation, None, -1.0).unwrap_err();
        assert!(matches!(
            err,
            MaxWaterError::Validation(ValidationError::InvalidValue(_))
        ));
        assert!(farm_totals(&irrigation_table(), CostKind::Irrigation, f64::NAN).is_err());
    }

    #[test]
    fn farm_totals_prefer_total_column() {
        let totals = farm_totals(&irrigation_table(), CostKind::Irrigation, 10.0).unwrap();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].amount, 3.5);
        assert!((totals[0].cost_usd - 35.0).abs() < 1e-9);
    }

    #[test]
    fn farm_totals_sum_dates_without_total() {
        let table = RawTable::from_rows(
            &["FarmID", "2024-01-01", "2024-01-02"],
            &[&["A", "1", "2"], &["A", "4", ""], &["", "9", "9"]],
        );
        let totals = farm_totals(&table, CostKind::Fertilizer, 2.0).unwrap();
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].amount, 7.0);
        assert_eq!(totals[0].cost_usd, 14.0);
    }

    #[test]
    fn combine_aligns_both_sources() {
        let irr = vec![CostRecord { farm_id: "A".into(), date: d(2024, 1, 1), amount: 1.0, cost_usd: 15.0 }];
        let fert = vec![
            CostRecord { farm_id: "A".into(), date: d(2024, 1, 1), amount: 1.0, cost_usd: 5.0 },
            CostRecord { farm_id: "B".into(), date: d(2023, 12, 31), amount: 1.0, cost_usd: 2.0 },
        ];
        let combined = combine_by_farm_date(&irr, &fert);
        assert_eq!(combined.len(), 2);
        assert_eq!(combined[0].farm_id, "B");
        assert_eq!(combined[0].irrigation_cost_usd, 0.0);
        assert_eq!(combined[1].total_cost_usd, 20.0);
    }

    #[test]
    fn rollup_without_planting_is_no_data() {
        let irr = vec![total("A", 10.0)];
        let out = rollup_by_hybrid(Some(&irr), None, None, &[]);
        assert!(!out.is_available());
        assert!(out.hybrids().is_empty());
        assert_eq!(
            out,
            HybridRollup::NoData {
                reason: "Planting data not uploaded".into()
            }
        );
    }

    #[test]
    fn rollup_without_cost_sources_is_no_data() {
        let planted = vec![planting("A", "P1197")];
        let out = rollup_by_hybrid(None, None, Some(&planted), &[]);
        assert_eq!(
            out,
            HybridRollup::NoData {
                reason: "No readable irrigation or fertilizer data".into()
            }
        );
    }

    #[test]
    fn rollup_joins_fertilizer_onto_irrigation() {
        let irr = vec![total("A", 10.0), total("B", 5.0), total("C", 1.0)];
        let fert = vec![total("A", 2.0), total("Z", 100.0)];
        let plant = vec![planting("A", "P1197"), planting("B", "P1197"), planting("C", "DKC62")];
        let out = rollup_by_hybrid(Some(&irr), Some(&fert), Some(&plant), &[]);
        let hybrids = out.hybrids();
        assert_eq!(hybrids.len(), 2);
        assert_eq!(hybrids[0].company_hybrid, "DKC62");
        assert_eq!(hybrids[0].total_cost_usd, 1.0);
        // Fertilizer-only farm Z is not in the irrigation base
        assert_eq!(hybrids[1].total_cost_usd, 17.0);
    }

    #[test]
    fn rollup_with_fertilizer_only() {
        let fert = vec![total("A", 2.0)];
        let plant = vec![planting("A", "P1197")];
        let out = rollup_by_hybrid(None, Some(&fert), Some(&plant), &[]);
        assert_eq!(out.hybrids()[0].total_cost_usd, 2.0);
    }

    #[test]
    fn rollup_respects_hybrid_selection() {
        let irr = vec![total("A", 10.0), total("B", 5.0)];
        let plant = vec![planting("A", "P1197"), planting("B", "DKC62")];
        let out = rollup_by_hybrid(Some(&irr), None, Some(&plant), &["DKC62".to_string()]);
        assert_eq!(out.hybrids().len(), 1);
        assert_eq!(out.hybrids()[0].company_hybrid, "DKC62");
    }

    proptest! {
        #[test]
        fn melt_yields_farms_times_dates(farms in 1usize..8, dates in 1usize..8) {
            let mut columns = vec!["FarmID".to_string()];
            for i in 0..dates {
                columns.push((d(2024, 3, 1) + chrono::Duration::days(i as i64)).to_string());
            }
            let rows: Vec<Vec<String>> = (0..farms)
                .map(|f| {
                    let mut row = vec![format!("F{f}")];
                    row.extend((0..dates).map(|i| format!("{}", f + i)));
                    row
                })
                .collect();
            let table = RawTable::new(columns, rows);
            let out = normalize_costs(&table, CostKind::Irrigation, None, 3.0).unwrap();
            prop_assert_eq!(out.records.len(), farms * dates);
        }

        #[test]
        fn zero_fertilizer_does_not_change_rollup(costs in proptest::collection::vec(0.0f64..1000.0, 1..10)) {
            let irr: Vec<FarmCostTotal> = costs
                .iter()
                .enumerate()
                .map(|(i, c)| total(&format!("F{i}"), *c))
                .collect();
            let zero: Vec<FarmCostTotal> = irr.iter().map(|t| total(&t.farm_id, 0.0)).collect();
            let plant: Vec<PlantingRecord> = irr
                .iter()
                .enumerate()
                .map(|(i, t)| planting(&t.farm_id, if i % 2 == 0 { "H1" } else { "H2" }))
                .collect();

            let without = rollup_by_hybrid(Some(&irr), None, Some(&plant), &[]);
            let with_zero = rollup_by_hybrid(Some(&irr), Some(&zero), Some(&plant), &[]);
            prop_assert_eq!(without, with_zero);
        }
    }
}
