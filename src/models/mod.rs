pub mod cost;
pub mod crop_stage;
pub mod efficiency;
pub mod forecast;
pub mod irrigation;
pub mod sensor;
pub mod status;
pub mod water_balance;

pub use cost::*;
pub use crop_stage::*;
pub use efficiency::*;
pub use forecast::*;
pub use irrigation::*;
pub use sensor::*;
pub use status::*;
pub use water_balance::*;

pub const MM_PER_INCH: f64 = 25.4;

pub fn mm_to_inches(mm: f64) -> f64 {
    mm / MM_PER_INCH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mm_to_inches_known_values() {
        assert!((mm_to_inches(25.4) - 1.0).abs() < 1e-9);
        assert!((mm_to_inches(30.0) - 1.18).abs() < 0.01);
        assert_eq!(mm_to_inches(0.0), 0.0);
    }
}
