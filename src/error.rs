use std::fmt;

/// Errors from render-configuration validation. The DSP core itself is
/// total — once an engine exists, rendering never fails.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DroneError {
    InvalidSampleRate(f32),
    InvalidDuration(f32),
}

impl fmt::Display for DroneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DroneError::InvalidSampleRate(sr) => {
                write!(f, "Sample rate must be positive and finite, got {sr}")
            }
            DroneError::InvalidDuration(secs) => {
                write!(f, "Render duration must be positive and finite, got {secs}")
            }
        }
    }
}

impl std::error::Error for DroneError {}
