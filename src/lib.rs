//! Core of an RFID card operated audio player.
//!
//! The core is hardware independent: it polls buttons, a battery monitor, the
//! card reader and the MP3 decoder module through the traits in
//! [`peripherals`], and drives the box through a small set of system modes.
//! Everything runs inside [`app::App::tick`], called from the firmware's poll
//! loop.

#![cfg_attr(not(test), no_std)]

pub mod analog;
pub mod announcement;
pub mod app;
pub mod button;
pub mod card;
pub mod config;
pub mod event;
pub mod hex;
pub mod menu;
pub mod mode;
pub mod peripherals;
pub mod playlist;
pub mod serial_command;
pub mod settings;
pub mod timer;

#[cfg(test)]
pub(crate) mod mock;

/// Point in time on the poll loop's millisecond clock.
pub type Instant = fugit::TimerInstantU32<1_000>;
/// Span of time on the poll loop's millisecond clock.
pub type Duration = fugit::MillisDurationU32;
