//! # Status Indicator
//!
//! Duty-cycled color signal reflecting the fix state machine:
//! red = no fix, green = fresh fix, orange = stale fix, with a magenta
//! pulse when a frame has just been received.
//!
//! The indicator runs on its own fine-grained timer (~10ms) registered
//! as a scheduler task. Each refresh advances a 0..100 counter used as
//! a lightness ramp; the LED is lit for the first 90 counts and blanked
//! for the rest, so an observer can tell the loop is alive.
//!
//! The LED hardware itself is an external collaborator behind the
//! [`StatusLed`] trait.

use tracing::trace;

use crate::fix::FixState;

/// Indicator hues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedColor {
    /// No fix held
    Red,
    /// Fresh fix
    Green,
    /// Stale fix
    Orange,
    /// Frame just received
    Magenta,
    /// Startup
    Blue,
}

/// One output command per refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedCommand {
    /// Light the LED at the given hue and lightness (0-89)
    Set { color: LedColor, lightness: u8 },
    /// Blank the LED (liveness blink)
    Off,
}

/// Driver seam for the physical LED.
pub trait StatusLed: Send {
    fn apply(&mut self, command: LedCommand);
}

/// Default driver: traces commands instead of touching hardware.
/// Useful on dev machines without the base station board attached.
#[derive(Debug, Default)]
pub struct TraceLed;

impl StatusLed for TraceLed {
    fn apply(&mut self, command: LedCommand) {
        trace!(?command, "led");
    }
}

/// Counts up to one full duty cycle (90 lit + 10 blank refreshes)
const DUTY_CYCLE: u8 = 100;
/// Refreshes within a cycle during which the LED is lit
const DUTY_ON: u8 = 90;

/// Duty-cycle state machine for the status LED.
#[derive(Debug, Default)]
pub struct Indicator {
    count: u8,
}

impl Indicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one refresh step and produce the LED command.
    ///
    /// `msg_pulse` is the engine's just-received flag; it is consumed
    /// (reset to false) the first time it is rendered, matching the
    /// one-shot magenta pulse behavior.
    pub fn refresh(&mut self, fix: FixState, msg_pulse: &mut bool) -> LedCommand {
        let count = self.count;
        self.count = (self.count + 1) % DUTY_CYCLE;

        if count >= DUTY_ON {
            return LedCommand::Off;
        }

        let color = if *msg_pulse {
            *msg_pulse = false;
            LedColor::Magenta
        } else {
            match fix {
                FixState::NoFix => LedColor::Red,
                FixState::Fresh => LedColor::Green,
                FixState::Stale => LedColor::Orange,
            }
        };

        LedCommand::Set {
            color,
            lightness: count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colors_follow_fix_state() {
        let mut indicator = Indicator::new();
        let mut pulse = false;

        assert_eq!(
            indicator.refresh(FixState::NoFix, &mut pulse),
            LedCommand::Set {
                color: LedColor::Red,
                lightness: 0
            }
        );
        assert_eq!(
            indicator.refresh(FixState::Fresh, &mut pulse),
            LedCommand::Set {
                color: LedColor::Green,
                lightness: 1
            }
        );
        assert_eq!(
            indicator.refresh(FixState::Stale, &mut pulse),
            LedCommand::Set {
                color: LedColor::Orange,
                lightness: 2
            }
        );
    }

    #[test]
    fn test_message_pulse_is_one_shot() {
        let mut indicator = Indicator::new();
        let mut pulse = true;

        let first = indicator.refresh(FixState::Fresh, &mut pulse);
        assert!(matches!(
            first,
            LedCommand::Set {
                color: LedColor::Magenta,
                ..
            }
        ));
        assert!(!pulse, "pulse consumed on first render");

        let second = indicator.refresh(FixState::Fresh, &mut pulse);
        assert!(matches!(
            second,
            LedCommand::Set {
                color: LedColor::Green,
                ..
            }
        ));
    }

    #[test]
    fn test_duty_cycle_blanks_ten_percent() {
        let mut indicator = Indicator::new();
        let mut pulse = false;
        let mut lit = 0;
        let mut blank = 0;

        for _ in 0..DUTY_CYCLE {
            match indicator.refresh(FixState::NoFix, &mut pulse) {
                LedCommand::Set { .. } => lit += 1,
                LedCommand::Off => blank += 1,
            }
        }

        assert_eq!(lit, 90);
        assert_eq!(blank, 10);
    }

    #[test]
    fn test_lightness_ramps_with_count() {
        let mut indicator = Indicator::new();
        let mut pulse = false;
        let mut last = None;

        for _ in 0..DUTY_ON {
            if let LedCommand::Set { lightness, .. } =
                indicator.refresh(FixState::Fresh, &mut pulse)
            {
                if let Some(prev) = last {
                    assert!(lightness > prev);
                }
                last = Some(lightness);
            }
        }
    }
}
