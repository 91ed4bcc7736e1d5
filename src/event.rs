//! Event sources and the registry that polls them.
//!
//! Registered events form a singly linked list inside a fixed arena. New
//! events are prepended, so a pass visits the most recently registered event
//! first. A pass is driven step by step through [`EventRegistry::begin_pass`]
//! and [`EventRegistry::next_fired`]; between two steps the caller runs the
//! fired action and may register or deregister events. Deregistering the
//! event the pass would visit next moves the pass cursor past it, and events
//! registered during a pass are first evaluated on the next one.

use crate::analog::{AnalogMonitor, ThresholdEvent};
use crate::button::{ButtonBank, ButtonLevels, Chord, Press, PressDispatcher};
use crate::config::{battery, capacity};
use crate::serial_command;
use crate::timer::Timer;
use crate::Instant;
use log::error;

/// Timers owned by the active system mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerId {
    /// Shutdown or menu abort after inactivity.
    Inactivity,
    /// Leaving a paused playback.
    PauseAbort,
    /// Status light blinking.
    Blink,
}

/// What a fired event asks the application to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Play,
    Stop,
    /// Stop when the mode is playing, play otherwise.
    PlayPause,
    Next,
    Previous,
    VolumeUp,
    VolumeDown,
    TrackFinished,
    NewCard,
    Timer(TimerId),
    BatteryHigh,
    BatteryLow,
    BatteryCritical,
    EnterAdmin,
    Shutdown,
    DumpSettings,
    Help,
}

/// Hardware state sampled at the start of a tick.
///
/// This is the per-tick transient state of all events; [`Inputs::clear`]
/// resets it once every event has been evaluated.
pub struct Inputs {
    pub buttons: ButtonBank,
    pub battery: AnalogMonitor<{ battery::AVERAGE_WINDOW }>,
    pub card_present: bool,
    pub track_finished: bool,
    pub serial: Option<u8>,
}

impl Default for Inputs {
    fn default() -> Self {
        Self::new()
    }
}

impl Inputs {
    pub const fn new() -> Self {
        Self {
            buttons: ButtonBank::new(),
            battery: AnalogMonitor::averaged(),
            card_present: false,
            track_finished: false,
            serial: None,
        }
    }

    pub fn sample(&mut self, buttons: ButtonLevels, battery: u16, card_present: bool, serial: Option<u8>, now: Instant) {
        self.buttons.sample(buttons, now);
        self.battery.sample(battery);
        self.card_present = card_present;
        self.serial = serial;
    }

    pub fn clear(&mut self) {
        self.track_finished = false;
        self.serial = None;
    }
}

/// Trigger condition of an event together with the action it fires.
#[derive(Clone, Copy, Debug)]
pub enum Source {
    Press {
        dispatcher: PressDispatcher,
        short: Action,
        long: Option<Action>,
    },
    Chord {
        chord: Chord,
        action: Action,
    },
    Timer {
        timer: Timer,
        action: Action,
    },
    Threshold {
        threshold: ThresholdEvent,
        action: Action,
    },
    /// Rising edge of the card presence probe.
    CardPresent {
        was_present: bool,
        action: Action,
    },
    TrackFinished(Action),
    SerialCommand,
}

impl Source {
    /// Without a long action the button fires its short action on every release.
    pub fn press(dispatcher: PressDispatcher, short: Action, long: Option<Action>) -> Self {
        let dispatcher = if long.is_some() { dispatcher } else { dispatcher.short_only() };
        Source::Press { dispatcher, short, long }
    }

    pub fn timer(timer: Timer, action: Action) -> Self {
        Source::Timer { timer, action }
    }

    pub fn card_present(action: Action) -> Self {
        Source::CardPresent {
            was_present: false,
            action,
        }
    }

    fn poll(&mut self, inputs: &mut Inputs, now: Instant) -> Option<Action> {
        match self {
            Source::Press { dispatcher, short, long } => match dispatcher.check(&inputs.buttons, now)? {
                Press::Short => Some(*short),
                Press::Long => *long,
            },
            Source::Chord { chord, action } => chord.check(&mut inputs.buttons, now).then(|| *action),
            Source::Timer { timer, action } => timer.check(now).then(|| *action),
            Source::Threshold { threshold, action } => threshold.check(inputs.battery.value()).then(|| *action),
            Source::CardPresent { was_present, action } => {
                let rising = inputs.card_present && !*was_present;
                *was_present = inputs.card_present;
                rising.then(|| *action)
            }
            Source::TrackFinished(action) => inputs.track_finished.then(|| *action),
            Source::SerialCommand => inputs.serial.and_then(serial_command::action_for),
        }
    }
}

/// Stable reference to a registered event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventHandle {
    index: u8,
    generation: u8,
}

#[derive(Debug)]
pub struct RegistryFull;

#[derive(Clone, Copy)]
struct Slot {
    source: Option<Source>,
    next: Option<u8>,
    generation: u8,
}

impl Slot {
    const EMPTY: Slot = Slot {
        source: None,
        next: None,
        generation: 0,
    };
}

pub struct EventRegistry {
    slots: [Slot; capacity::EVENTS],
    head: Option<u8>,
    cursor: Option<u8>,
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EventRegistry {
    pub const fn new() -> Self {
        Self {
            slots: [Slot::EMPTY; capacity::EVENTS],
            head: None,
            cursor: None,
        }
    }

    pub fn register(&mut self, source: Source) -> Result<EventHandle, RegistryFull> {
        let index = match self.slots.iter().position(|slot| slot.source.is_none()) {
            Some(index) => index,
            None => {
                error!("Event registry full");
                return Err(RegistryFull);
            }
        };
        let slot = &mut self.slots[index];
        slot.source = Some(source);
        slot.next = self.head;
        self.head = Some(index as u8);
        Ok(EventHandle {
            index: index as u8,
            generation: slot.generation,
        })
    }

    /// Removes the event. Unknown or stale handles are ignored.
    pub fn deregister(&mut self, handle: EventHandle) {
        if !self.is_registered(handle) {
            return;
        }
        let index = handle.index;
        let next = self.slots[index as usize].next;
        if self.head == Some(index) {
            self.head = next;
        } else {
            let mut current = self.head;
            while let Some(i) = current {
                let slot = &mut self.slots[i as usize];
                if slot.next == Some(index) {
                    slot.next = next;
                    break;
                }
                current = slot.next;
            }
        }
        if self.cursor == Some(index) {
            self.cursor = next;
        }
        let slot = &mut self.slots[index as usize];
        slot.source = None;
        slot.next = None;
        slot.generation = slot.generation.wrapping_add(1);
    }

    pub fn is_registered(&self, handle: EventHandle) -> bool {
        let slot = &self.slots[handle.index as usize];
        slot.source.is_some() && slot.generation == handle.generation
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.source.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Re-arms a timer event relative to `now`.
    pub fn reset_timer(&mut self, handle: EventHandle, now: Instant) {
        if !self.is_registered(handle) {
            return;
        }
        if let Some(Source::Timer { timer, .. }) = self.slots[handle.index as usize].source.as_mut() {
            timer.reset(now);
        }
    }

    /// Starts a pass at the most recently registered event.
    pub fn begin_pass(&mut self) {
        self.cursor = self.head;
    }

    /// Evaluates events in pass order until one fires, returning its action.
    /// `None` ends the pass.
    pub fn next_fired(&mut self, inputs: &mut Inputs, now: Instant) -> Option<Action> {
        while let Some(index) = self.cursor {
            let slot = &mut self.slots[index as usize];
            self.cursor = slot.next;
            if let Some(action) = slot.source.as_mut().and_then(|source| source.poll(inputs, now)) {
                return Some(action);
            }
        }
        None
    }
}
