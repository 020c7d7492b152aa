pub mod calculations;
pub mod costs;
pub mod efficiency;
pub mod forecast_sync;
pub mod pipeline;
pub mod rules;
pub mod simulation;
pub mod water_balance;

pub use forecast_sync::{ForecastSnapshot, ForecastSync};
pub use rules::{recommend, RulesEngine};
