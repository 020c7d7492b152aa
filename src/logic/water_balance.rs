use super::calculations::latest_average_moisture_inches;
use crate::models::{
    CropStageParameters, DailyRainfall, DailyWaterBalance, SensorMoistureRecord, WaterBalanceState,
};

/// Project available water across the forecast window.
///
/// Each day's available water is current moisture plus rain accumulated so
/// far. The threshold is what remains to fill soil capacity after all
/// forecast rain, floored at zero.
pub fn compute_water_balance(
    average_soil_moisture_inches: f64,
    rainfall: &[DailyRainfall],
    soil_capacity_inches: f64,
) -> WaterBalanceState {
    let mut ordered = rainfall.to_vec();
    ordered.sort_by_key(|d| d.date);

    let mut cumulative = 0.0;
    let daily_forecast: Vec<DailyWaterBalance> = ordered
        .into_iter()
        .map(|day| {
            cumulative += day.rainfall_inches;
            DailyWaterBalance {
                date: day.date,
                rainfall_inches: day.rainfall_inches,
                cumulative_rainfall_inches: cumulative,
                total_available_water_inches: average_soil_moisture_inches + cumulative,
            }
        })
        .collect();

    let irrigation_threshold_inches =
        (soil_capacity_inches - (average_soil_moisture_inches + cumulative)).max(0.0);

    WaterBalanceState {
        average_soil_moisture_inches,
        soil_capacity_inches,
        daily_forecast,
        irrigation_threshold_inches,
    }
}

/// Water balance from raw sensor history: the latest date's mean reading is
/// the starting moisture.
pub fn water_balance_from_sensors(
    records: &[SensorMoistureRecord],
    rainfall: &[DailyRainfall],
    params: &CropStageParameters,
) -> WaterBalanceState {
    let moisture = latest_average_moisture_inches(records);
    tracing::debug!(
        "Water balance: {:.2}\" moisture, {:.2}\" capacity, {} forecast days",
        moisture,
        params.soil_capacity_inches,
        rainfall.len()
    );
    compute_water_balance(moisture, rainfall, params.soil_capacity_inches)
}
