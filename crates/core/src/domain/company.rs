use serde::{Deserialize, Serialize};

/// Slow-moving aggregate published by an external reporting process.
/// Personas read it to calibrate tone; this core never writes it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompanyState {
    pub momentum: f64,
    pub stress_level: f64,
    pub growth_velocity: f64,
}

/// Externally owned goal, read-only prompt context.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub title: String,
    pub priority: u32,
    pub current_value: f64,
    pub target_value: f64,
}
