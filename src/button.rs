//! Button reading and press classification.
//!
//! The firmware samples the debounced pin levels once per tick into a
//! [`ButtonBank`]; every event evaluated during that tick sees the same view.

use crate::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonId {
    Play = 0,
    Next = 1,
    Previous = 2,
    VolumeUp = 3,
    VolumeDown = 4,
}

const BUTTON_COUNT: usize = 5;

/// Pressed buttons of one sample, one bit per [`ButtonId`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ButtonLevels(u8);

impl ButtonLevels {
    pub const NONE: ButtonLevels = ButtonLevels(0);

    pub fn with(self, button: ButtonId) -> Self {
        ButtonLevels(self.0 | (1 << button as u8))
    }

    pub fn set(&mut self, button: ButtonId, pressed: bool) {
        if pressed {
            self.0 |= 1 << button as u8;
        } else {
            self.0 &= !(1 << button as u8);
        }
    }

    pub fn is_pressed(&self, button: ButtonId) -> bool {
        self.0 & (1 << button as u8) != 0
    }
}

#[derive(Clone, Copy, Debug)]
struct ButtonState {
    pressed: bool,
    was_pressed: bool,
    since: Instant,
    consumed: bool,
}

impl ButtonState {
    const fn new() -> Self {
        Self {
            pressed: false,
            was_pressed: false,
            since: crate::config::BOOT,
            consumed: false,
        }
    }
}

/// Edge detecting reader for all buttons, updated once per tick.
pub struct ButtonBank {
    states: [ButtonState; BUTTON_COUNT],
}

impl Default for ButtonBank {
    fn default() -> Self {
        Self::new()
    }
}

impl ButtonBank {
    pub const fn new() -> Self {
        Self {
            states: [ButtonState::new(); BUTTON_COUNT],
        }
    }

    pub fn sample(&mut self, levels: ButtonLevels, now: Instant) {
        for (index, state) in self.states.iter_mut().enumerate() {
            let pressed = levels.0 & (1 << index) != 0;
            state.was_pressed = state.pressed;
            state.pressed = pressed;
            if pressed && !state.was_pressed {
                state.since = now;
                state.consumed = false;
            }
        }
    }

    pub fn is_pressed(&self, button: ButtonId) -> bool {
        self.state(button).pressed
    }

    /// True on the tick the button goes up, whatever the hold time was.
    pub fn released(&self, button: ButtonId) -> bool {
        let state = self.state(button);
        state.was_pressed && !state.pressed
    }

    /// True on every tick the button has been held for at least `threshold`.
    pub fn held_for(&self, button: ButtonId, threshold: Duration, now: Instant) -> bool {
        let state = self.state(button);
        state.pressed
            && now
                .checked_duration_since(state.since)
                .map_or(false, |held| held >= threshold)
    }

    /// Marks the current press as handled; dispatchers ignore it until the next press.
    pub fn consume(&mut self, button: ButtonId) {
        self.states[button as usize].consumed = true;
    }

    pub fn is_consumed(&self, button: ButtonId) -> bool {
        self.state(button).consumed
    }

    fn state(&self, button: ButtonId) -> &ButtonState {
        &self.states[button as usize]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Press {
    Short,
    Long,
}

/// Short/long classification of one button without double firing.
///
/// The long press fires once when the threshold is crossed while the button
/// is still down; the release that follows is swallowed. A release before the
/// threshold is a short press. Without a threshold every release is short.
#[derive(Clone, Copy, Debug)]
pub struct PressDispatcher {
    button: ButtonId,
    threshold: Option<Duration>,
    long_pressed: bool,
}

impl PressDispatcher {
    pub fn new(button: ButtonId, threshold: Duration) -> Self {
        Self {
            button,
            threshold: Some(threshold),
            long_pressed: false,
        }
    }

    /// Drops the long classification, for buttons without a long action.
    pub fn short_only(self) -> Self {
        Self {
            threshold: None,
            long_pressed: false,
            ..self
        }
    }

    pub fn button(&self) -> ButtonId {
        self.button
    }

    pub fn check(&mut self, bank: &ButtonBank, now: Instant) -> Option<Press> {
        if bank.released(self.button) {
            let was_long = core::mem::replace(&mut self.long_pressed, false);
            return (!was_long && !bank.is_consumed(self.button)).then(|| Press::Short);
        }
        if bank.is_consumed(self.button) {
            return None;
        }
        match self.threshold {
            Some(threshold) if !self.long_pressed && bank.held_for(self.button, threshold, now) => {
                self.long_pressed = true;
                Some(Press::Long)
            }
            _ => None,
        }
    }
}

/// Several buttons held together past a threshold. Fires once per hold and
/// consumes the involved presses.
#[derive(Clone, Copy, Debug)]
pub struct Chord {
    buttons: [ButtonId; 3],
    threshold: Duration,
    fired: bool,
}

impl Chord {
    pub fn new(buttons: [ButtonId; 3], threshold: Duration) -> Self {
        Self {
            buttons,
            threshold,
            fired: false,
        }
    }

    pub fn check(&mut self, bank: &mut ButtonBank, now: Instant) -> bool {
        if !self.buttons.iter().all(|b| bank.is_pressed(*b)) {
            self.fired = false;
            return false;
        }
        if self.fired || !self.buttons.iter().all(|b| bank.held_for(*b, self.threshold, now)) {
            return false;
        }
        self.fired = true;
        for button in self.buttons {
            bank.consume(button);
        }
        true
    }
}
