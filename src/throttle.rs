use serde::{Deserialize, Serialize};

/// The speed counter wraps here so it never overflows
pub const COUNTER_WRAP: i32 = 12000;

/// What a character does with its movement this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepDecision {
    /// Take this many plan steps
    Advance(u8),
    /// Take one plan step but only show half of the distance
    AdvanceHalf,
    /// Skip movement this tick
    Hold,
    /// Skip movement, catching up on the half step buffered last tick
    SettleHalf,
}

impl StepDecision {
    /// Plan steps taken for this decision
    pub fn plan_steps(self) -> u8 {
        match self {
            StepDecision::Advance(n) => n,
            StepDecision::AdvanceHalf => 1,
            StepDecision::Hold | StepDecision::SettleHalf => 0,
        }
    }
}

/// Keep a counter inside `[0, COUNTER_WRAP)`
pub fn wrap_counter(counter: i32) -> i32 {
    counter.rem_euclid(COUNTER_WRAP)
}

/// Movement decision for a character shown at `scale_percent`.
///
/// Larger characters sometimes take two steps, smaller ones skip ticks or
/// split a step over two ticks.
pub fn decide(scale_percent: i32, scale_adjusts_speed: bool, counter: i32) -> StepDecision {
    if scale_percent == 100 || !scale_adjusts_speed {
        return StepDecision::Advance(1);
    }
    let counter = wrap_counter(counter);
    let phase = counter % 4;
    let odd = counter % 2 == 1;

    match scale_percent {
        s if s >= 170 => StepDecision::Advance(if phase >= 1 { 2 } else { 1 }),
        s if s >= 140 => StepDecision::Advance(if odd { 2 } else { 1 }),
        s if s >= 115 => StepDecision::Advance(if phase == 3 { 2 } else { 1 }),
        s if s >= 80 => StepDecision::Advance(1),
        s if s >= 60 => {
            if phase >= 1 {
                StepDecision::Advance(1)
            } else {
                StepDecision::Hold
            }
        }
        s if s >= 30 => {
            if odd {
                StepDecision::AdvanceHalf
            } else {
                StepDecision::SettleHalf
            }
        }
        _ => match phase {
            3 => StepDecision::AdvanceHalf,
            1 => StepDecision::SettleHalf,
            _ => StepDecision::Hold,
        },
    }
}
