//! Post-validators run after a setter stored its value.

use std::time::Duration;

use crate::command::PostValidator;
use crate::error::SetError;
use crate::slot::SlotValue;

/// Inclusive bounds for integers and sizes.
#[derive(Debug, Clone, Copy)]
pub struct NumBounds {
    low: i64,
    high: Option<i64>,
}

impl NumBounds {
    pub fn new(low: i64, high: i64) -> Self {
        Self {
            low,
            high: Some(high),
        }
    }

    /// Only a lower bound.
    pub fn at_least(low: i64) -> Self {
        Self { low, high: None }
    }

    fn check_value(&self, value: i64) -> Result<(), SetError> {
        if value < self.low {
            return Err(SetError::OutOfRange(format!(
                "value must be equal or more than {}",
                self.low
            )));
        }
        match self.high {
            Some(high) if value > high => Err(SetError::OutOfRange(format!(
                "value must be between {} and {}",
                self.low, high
            ))),
            _ => Ok(()),
        }
    }
}

impl PostValidator for NumBounds {
    fn check(&self, value: &SlotValue) -> Result<(), SetError> {
        match value {
            SlotValue::Int(v) => self.check_value(*v),
            SlotValue::Size(v) => self.check_value(i64::try_from(*v).unwrap_or(i64::MAX)),
            other => Err(SetError::OutOfRange(format!(
                "bounds apply to numbers, got {:?}",
                other
            ))),
        }
    }
}

/// Inclusive bounds for durations.
#[derive(Debug, Clone, Copy)]
pub struct DurationBounds {
    min: Duration,
    max: Duration,
}

impl DurationBounds {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }
}

impl PostValidator for DurationBounds {
    fn check(&self, value: &SlotValue) -> Result<(), SetError> {
        match value {
            SlotValue::Duration(d) if *d < self.min || *d > self.max => {
                Err(SetError::OutOfRange(format!(
                    "value must be between {:?} and {:?}",
                    self.min, self.max
                )))
            }
            SlotValue::Duration(_) => Ok(()),
            other => Err(SetError::OutOfRange(format!(
                "bounds apply to durations, got {:?}",
                other
            ))),
        }
    }
}
