pub mod weather_gov;

pub use weather_gov::{ForecastClient, NetResult};
