//! Compile-time configuration of the jukebox.
//!
//! Every tunable lives here so the core modules only ever see named values.
//! Durations are expressed in milliseconds on top of the poll loop's
//! millisecond clock.

use crate::{Duration, Instant};

/// Time base of the poll loop.
pub mod timing {
    use super::Duration;

    /// Period of one poll tick (50 Hz).
    pub const POLL_PERIOD: Duration = Duration::millis(20);

    /// Hold time after which a press counts as a long press.
    pub const LONG_PRESS: Duration = Duration::millis(1_000);

    /// Inactivity in Standby before the box powers itself down.
    pub const STANDBY_TIMEOUT: Duration = Duration::minutes(5);

    /// Inactivity in Locked mode before power-down. Much shorter than Standby.
    pub const LOCKED_TIMEOUT: Duration = Duration::secs(30);

    /// Time a paused playback waits before falling back to Standby.
    pub const PAUSE_ABORT_TIMEOUT: Duration = Duration::minutes(5);

    /// Inactivity in the admin menu before it is abandoned.
    pub const MENU_TIMEOUT: Duration = Duration::secs(60);

    /// Blink period of the status indicator while locked.
    pub const LOCKED_BLINK: Duration = Duration::millis(250);
}

/// Volume limits.
pub mod volume {
    /// Volume applied when no settings are stored yet.
    pub const DEFAULT: u8 = 12;
    /// Lower volume bound when no settings are stored yet.
    pub const DEFAULT_MIN: u8 = 5;
    /// Upper volume bound when no settings are stored yet.
    pub const DEFAULT_MAX: u8 = 25;
    /// Highest volume the decoder module accepts.
    pub const CEILING: u8 = 30;
    /// Step of the coarse jump in admin pickers.
    pub const COARSE_STEP: u16 = 10;
}

/// Battery calibration. The cell is measured through a resistor divider.
pub mod battery {
    /// Ratio of the resistor divider in front of the ADC pin.
    pub const DIVIDER_FACTOR: f32 = 2.0;
    /// ADC reference voltage.
    pub const REFERENCE_VOLTAGE: f32 = 3.3;
    /// Full scale reading of the 12 bit ADC.
    pub const FULL_SCALE: f32 = 4095.0;
    /// Voltage at which the battery counts as charged.
    pub const HIGH_VOLTAGE: f32 = 4.0;
    /// Voltage at which the low battery warning is shown.
    pub const LOW_VOLTAGE: f32 = 3.5;
    /// Voltage below which the box shuts down unconditionally.
    pub const CRITICAL_VOLTAGE: f32 = 3.2;
    /// Window of the moving average applied to the battery samples.
    pub const AVERAGE_WINDOW: usize = 8;
}

/// Fixed capacities of the statically sized collections.
pub mod capacity {
    /// Events that can be registered at the same time.
    pub const EVENTS: usize = 16;
    /// Deepest admin menu stack.
    pub const MENU_DEPTH: usize = 4;
    /// Audiobook progress entries kept in the settings record.
    pub const PROGRESS_ENTRIES: usize = 100;
    /// Highest track number addressable inside one folder.
    pub const TRACKS_PER_FOLDER: usize = 255;
    /// Highest folder number on the module's SD card.
    pub const FOLDERS: u8 = 99;
}

/// Buttons fitted to the box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonLayout {
    /// Play/pause, next and previous. Long presses of next/previous change the volume.
    Compact,
    /// Additional volume up/down buttons.
    Dedicated,
}

/// Instant of the first poll tick.
pub const BOOT: Instant = Instant::from_ticks(0);

#[allow(unused)]
mod validation {
    use super::*;

    const _: () = assert!(volume::DEFAULT_MIN <= volume::DEFAULT, "default volume below minimum");
    const _: () = assert!(volume::DEFAULT <= volume::DEFAULT_MAX, "default volume above maximum");
    const _: () = assert!(volume::DEFAULT_MAX <= volume::CEILING, "maximum above module ceiling");
    const _: () = assert!(timing::LOCKED_TIMEOUT.ticks() < timing::STANDBY_TIMEOUT.ticks(), "locked timeout must be shorter");
    const _: () = assert!(timing::POLL_PERIOD.ticks() < timing::LONG_PRESS.ticks(), "long press shorter than a tick");
    const _: () = assert!(capacity::MENU_DEPTH >= 2, "menu needs root plus one level");
    const _: () = assert!(battery::AVERAGE_WINDOW > 0, "empty average window");
    const _: () = assert!(capacity::TRACKS_PER_FOLDER <= u8::MAX as usize, "tracks are stored as bytes");
}
