//! Typed readers for each upload kind. Each validates its schema, then
//! converts rows, dropping (and counting) rows whose numeric cells don't parse.

use super::dates::parse_date;
use super::schema::{TableSchema, ValidationReport};
use super::{parse_id, parse_number, RawTable};
use crate::error::Result;
use crate::models::{
    HybridAssignment, PlantingRecord, SensorMoistureRecord, UsageRecord, UNKNOWN_SENSOR_TYPE,
};

pub const SENSOR_ID: &str = "Sensor_ID";
pub const DATE: &str = "Date";
pub const DEPTH: &str = "Depth";
pub const MOISTURE_LEVEL: &str = "Moisture_Level";
pub const SENSOR_TYPE: &str = "Sensor_Type";
pub const FARM_ID: &str = "FarmID";
pub const PLANTING_DATE: &str = "PlantingDate";
pub const COMPANY_HYBRID: &str = "CompanyHybrid";
pub const SEEDING_RATE: &str = "Seeding Rate(plants/ac)";
pub const HYBRID: &str = "Hybrid";
pub const FIELD_LOCATION: &str = "Field_Location";
pub const TEMPERATURE: &str = "Temperature";
pub const HUMIDITY: &str = "Humidity";
pub const WATER_USAGE: &str = "Water_Usage";
pub const YIELD: &str = "Yield";
pub const COST_PER_GALLON: &str = "Cost_per_Gallon";

#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub records: Vec<T>,
    pub report: ValidationReport,
}

pub fn sensor_schema() -> TableSchema {
    TableSchema::new("sensor")
        .required(&[SENSOR_ID, DATE, DEPTH, MOISTURE_LEVEL])
        .optional(SENSOR_TYPE, UNKNOWN_SENSOR_TYPE)
        .dates(&[DATE])
}

pub fn planting_schema() -> TableSchema {
    TableSchema::new("planting").required(&[FARM_ID, PLANTING_DATE, COMPANY_HYBRID, SEEDING_RATE])
}

pub fn hybrid_schema() -> TableSchema {
    TableSchema::new("hybrid").required(&[SENSOR_ID, COMPANY_HYBRID])
}

pub fn usage_schema() -> TableSchema {
    TableSchema::new("usage").required(&[SENSOR_ID, WATER_USAGE, YIELD, COST_PER_GALLON])
}

fn convert<T>(
    table: &RawTable,
    mut report: ValidationReport,
    mut row_fn: impl FnMut(&[String]) -> Option<T>,
) -> Parsed<T> {
    let records: Vec<T> = table.rows.iter().filter_map(|row| row_fn(row.as_slice())).collect();
    report.dropped_rows += table.rows.len() - records.len();
    Parsed { records, report }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

pub fn sensor_records(table: RawTable) -> Result<Parsed<SensorMoistureRecord>> {
    let validated = sensor_schema().validate(table)?;
    let t = &validated.table;
    Ok(convert(t, validated.report, |row| {
        Some(SensorMoistureRecord {
            sensor_id: parse_id(t.cell(row, SENSOR_ID))?,
            date: parse_date(t.cell(row, DATE))?,
            depth_inches: parse_number(t.cell(row, DEPTH))?,
            moisture_level: parse_number(t.cell(row, MOISTURE_LEVEL))?,
            sensor_type: t.cell(row, SENSOR_TYPE).to_string(),
        })
    }))
}

/// Planting rows only need a farm and a hybrid; date and seeding rate are kept when readable.
pub fn planting_records(table: RawTable) -> Result<Parsed<PlantingRecord>> {
    let validated = planting_schema().validate(table)?;
    let t = &validated.table;
    Ok(convert(t, validated.report, |row| {
        Some(PlantingRecord {
            farm_id: non_empty(t.cell(row, FARM_ID))?,
            planting_date: parse_date(t.cell(row, PLANTING_DATE)),
            company_hybrid: non_empty(t.cell(row, COMPANY_HYBRID))?,
            seeding_rate: parse_number(t.cell(row, SEEDING_RATE)),
        })
    }))
}

pub fn hybrid_assignments(table: RawTable) -> Result<Parsed<HybridAssignment>> {
    let validated = hybrid_schema().validate(table)?;
    let t = &validated.table;
    Ok(convert(t, validated.report, |row| {
        Some(HybridAssignment {
            sensor_id: parse_id(t.cell(row, SENSOR_ID))?,
            company_hybrid: non_empty(t.cell(row, COMPANY_HYBRID))?,
        })
    }))
}

pub fn usage_records(table: RawTable) -> Result<Parsed<UsageRecord>> {
    let validated = usage_schema().validate(table)?;
    let t = &validated.table;
    Ok(convert(t, validated.report, |row| {
        Some(UsageRecord {
            sensor_id: parse_id(t.cell(row, SENSOR_ID))?,
            hybrid: non_empty(t.cell(row, HYBRID)),
            field_location: non_empty(t.cell(row, FIELD_LOCATION)),
            temperature_c: parse_number(t.cell(row, TEMPERATURE)),
            humidity_pct: parse_number(t.cell(row, HUMIDITY)),
            water_usage_gallons: parse_number(t.cell(row, WATER_USAGE))?,
            yield_units: parse_number(t.cell(row, YIELD))?,
            cost_per_gallon: parse_number(t.cell(row, COST_PER_GALLON))?,
        })
    }))
}
