//! Smooth environment curves for the emulated grow chamber.

/// Chamber temperature in Celsius: minimum before dawn, peak in the early
/// afternoon.
pub fn simulated_temperature(day_fraction: f64) -> f64 {
    let radians = day_fraction * 2.0 * std::f64::consts::PI;

    21.0 - 3.5 * (radians + std::f64::consts::PI / 3.0).cos()
}

/// Relative humidity %: runs opposite to temperature inside the chamber.
pub fn simulated_humidity(day_fraction: f64) -> f64 {
    let radians = day_fraction * 2.0 * std::f64::consts::PI;

    86.0 + 6.0 * (radians + std::f64::consts::PI / 3.0).cos()
}

/// Soil moisture %: the substrate dries through the day and is re-misted
/// overnight.
pub fn simulated_soil(day_fraction: f64) -> f64 {
    let drift = 10.0 * (day_fraction * std::f64::consts::PI).sin();

    (62.0 - drift).round()
}
