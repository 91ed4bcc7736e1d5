//! Application context and poll tick.
//!
//! [`App`] owns every collaborator, the settings, the event registry and the
//! active mode. The firmware calls [`App::tick`] once per poll period; a tick
//! samples the inputs, runs one registry pass, dispatching every fired action
//! to the active mode right away, and finally drains the decoder module's
//! notifications. A transition requested by an action takes effect before
//! the next event of the same pass is evaluated.

use crate::analog::{adc_reference, Comparison, ThresholdEvent};
use crate::button::{ButtonId, ButtonLevels, Chord, PressDispatcher};
use crate::config::{battery, timing, ButtonLayout};
use crate::event::{Action, EventRegistry, Inputs, Source};
use crate::mode::{extract_shared_state, Context, ModeKind, SharedState, SystemMode, Transition};
use crate::peripherals::{CardTransport, DecoderModule, Notification, NvStore, StatusIndicator};
use crate::serial_command;
use crate::settings::Settings;
use crate::Instant;
use log::{debug, error, info};
use nanorand::WyRand;

/// Build options of the box.
#[derive(Clone, Copy, Debug)]
pub struct AppConfig {
    pub layout: ButtonLayout,
    /// Registers the single character command source.
    pub debug_serial: bool,
    /// Seed of the shuffle generator, taken from a floating ADC pin.
    pub seed: u64,
}

/// Hardware readings of one tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sample {
    pub buttons: ButtonLevels,
    /// Raw battery ADC reading.
    pub battery: u16,
    /// Byte received on the debug serial port.
    pub serial: Option<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Running,
    /// Settings are flushed and the peripherals are off. Nothing runs anymore.
    PoweredDown,
}

pub struct App<M, R, S, I> {
    module: M,
    reader: R,
    store: S,
    indicator: I,
    settings: Settings,
    events: EventRegistry,
    inputs: Inputs,
    rng: WyRand,
    mode: Option<SystemMode>,
    powered_down: bool,
}

impl<M, R, S, I> App<M, R, S, I>
where
    M: DecoderModule,
    R: CardTransport,
    S: NvStore,
    I: StatusIndicator,
{
    /// Loads the settings, applies them to the module and enters the first mode.
    pub fn new(mut module: M, reader: R, mut store: S, indicator: I, config: AppConfig, now: Instant) -> Self {
        let mut settings = Settings::load(&mut store);
        settings.normalize_volumes();
        module.set_volume(settings.volume);
        module.set_equalizer(settings.equalizer);

        let mut app = Self {
            module,
            reader,
            store,
            indicator,
            settings,
            events: EventRegistry::new(),
            inputs: Inputs::new(),
            rng: WyRand::new_seed(config.seed),
            mode: None,
            powered_down: false,
        };
        app.register_global_events(config);
        let first = if app.settings.locked {
            Transition::Locked
        } else {
            Transition::Standby
        };
        app.transition(first, now);
        app
    }

    fn register_global_events(&mut self, config: AppConfig) {
        let events = &mut self.events;
        let press = |button| PressDispatcher::new(button, timing::LONG_PRESS);
        let threshold = |comparison, voltage, action| Source::Threshold {
            threshold: ThresholdEvent::new(
                comparison,
                adc_reference(voltage, battery::DIVIDER_FACTOR, battery::FULL_SCALE, battery::REFERENCE_VOLTAGE),
            ),
            action,
        };

        let mut sources: heapless::Vec<Source, 12> = heapless::Vec::new();
        sources.push(Source::TrackFinished(Action::TrackFinished)).ok();
        sources.push(Source::card_present(Action::NewCard)).ok();
        sources.push(threshold(Comparison::GreaterOrEqual, battery::HIGH_VOLTAGE, Action::BatteryHigh)).ok();
        sources.push(threshold(Comparison::LessOrEqual, battery::LOW_VOLTAGE, Action::BatteryLow)).ok();
        sources.push(threshold(Comparison::Less, battery::CRITICAL_VOLTAGE, Action::BatteryCritical)).ok();
        sources.push(Source::press(press(ButtonId::Play), Action::PlayPause, Some(Action::Stop))).ok();
        match config.layout {
            ButtonLayout::Compact => {
                sources.push(Source::press(press(ButtonId::Next), Action::Next, Some(Action::VolumeUp))).ok();
                sources.push(Source::press(press(ButtonId::Previous), Action::Previous, Some(Action::VolumeDown))).ok();
            }
            ButtonLayout::Dedicated => {
                sources.push(Source::press(press(ButtonId::Next), Action::Next, None)).ok();
                sources.push(Source::press(press(ButtonId::Previous), Action::Previous, None)).ok();
                sources.push(Source::press(press(ButtonId::VolumeUp), Action::VolumeUp, None)).ok();
                sources.push(Source::press(press(ButtonId::VolumeDown), Action::VolumeDown, None)).ok();
            }
        }
        // evaluated ahead of the single presses it swallows
        sources.push(Source::Chord {
            chord: Chord::new([ButtonId::Play, ButtonId::Next, ButtonId::Previous], timing::LONG_PRESS),
            action: Action::EnterAdmin,
        })
        .ok();
        if config.debug_serial {
            sources.push(Source::SerialCommand).ok();
        }

        for source in sources {
            events.register(source).ok();
        }
    }

    /// Runs one poll period.
    pub fn tick(&mut self, now: Instant, sample: Sample) -> TickOutcome {
        if self.powered_down {
            return TickOutcome::PoweredDown;
        }
        let card_present = self.reader.card_present();
        self.inputs
            .sample(sample.buttons, sample.battery, card_present, sample.serial, now);

        self.events.begin_pass();
        while let Some(action) = self.events.next_fired(&mut self.inputs, now) {
            debug!("Fired {:?}", action);
            self.fire(action, now);
            if self.powered_down {
                return TickOutcome::PoweredDown;
            }
        }
        self.inputs.clear();

        while let Some(notification) = self.module.poll_notification() {
            match notification {
                Notification::TrackFinished(track) => {
                    debug!("Track {} finished", track);
                    self.inputs.track_finished = true;
                }
                Notification::Error(code) => error!("Decoder module error {}", code),
            }
        }
        TickOutcome::Running
    }

    pub fn mode_kind(&self) -> Option<ModeKind> {
        self.mode.as_ref().map(SystemMode::kind)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn module(&self) -> &M {
        &self.module
    }

    pub fn module_mut(&mut self) -> &mut M {
        &mut self.module
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn reader_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    pub fn is_powered_down(&self) -> bool {
        self.powered_down
    }

    fn context(&mut self, now: Instant) -> (Context<'_>, &mut Option<SystemMode>) {
        let cx = Context {
            module: &mut self.module,
            reader: &mut self.reader,
            indicator: &mut self.indicator,
            settings: &mut self.settings,
            events: &mut self.events,
            rng: &mut self.rng,
            now,
        };
        (cx, &mut self.mode)
    }

    fn fire(&mut self, action: Action, now: Instant) {
        match action {
            Action::DumpSettings => {
                info!("{:?}, module busy: {}", self.settings, self.module.is_playing());
                return;
            }
            Action::Help => {
                for (command, meaning) in serial_command::HELP {
                    info!("{} {}", *command as char, meaning);
                }
                return;
            }
            _ => {}
        }

        let (mut cx, mode) = self.context(now);
        let Some(mode) = mode.as_mut() else {
            return;
        };
        if is_user_input(action) {
            mode.as_mode_mut().user_activity(&mut cx);
        }
        if let Some(transition) = mode.handle(action, &mut cx) {
            self.transition(transition, now);
        }
    }

    /// Closes the active mode, then enters the requested one.
    fn transition(&mut self, transition: Transition, now: Instant) {
        if transition == Transition::Shutdown {
            self.shutdown(now);
            return;
        }
        let (mut cx, mode) = self.context(now);
        let shared = match mode.take() {
            Some(outgoing) => {
                let shared = extract_shared_state(&outgoing);
                outgoing.close(&mut cx);
                shared
            }
            None => SharedState::BOOT,
        };
        info!("Entering {:?}", transition);
        *mode = Some(SystemMode::enter(transition, shared, &mut cx));
    }

    /// Persists the settings and switches the peripherals off.
    fn shutdown(&mut self, now: Instant) {
        if self.powered_down {
            return;
        }
        info!("Shutting down");
        let (mut cx, mode) = self.context(now);
        if let Some(outgoing) = mode.take() {
            outgoing.close(&mut cx);
        }
        self.module.stop();
        self.settings.flush(&mut self.store);
        self.reader.power_down();
        self.indicator.set(false);
        self.powered_down = true;
    }
}

fn is_user_input(action: Action) -> bool {
    matches!(
        action,
        Action::Play
            | Action::Stop
            | Action::PlayPause
            | Action::Next
            | Action::Previous
            | Action::VolumeUp
            | Action::VolumeDown
            | Action::NewCard
            | Action::EnterAdmin
    )
}
