//! System modes of the box.
//!
//! Exactly one mode is active. A mode reacts to actions and may ask for a
//! [`Transition`]; the application then closes the outgoing mode, which
//! deregisters its timers and persists what it must, and enters the new one.
//! Modes are never resumed, every transition builds a fresh instance.

mod admin;
mod locked;
mod playback;
mod standby;

pub use admin::Admin;
pub use locked::Locked;
pub use playback::Playback;
pub use standby::Standby;

use crate::announcement::Announcement;
use crate::card::{self, CardError, CardRecord, FolderCard, SpecialCard};
use crate::event::{Action, EventHandle, EventRegistry, Source, TimerId};
use crate::hex::Hex;
use crate::peripherals::{CardTransport, DecoderModule, StatusIndicator};
use crate::settings::Settings;
use crate::timer::Timer;
use crate::{Duration, Instant};
use log::{error, info, warn};
use nanorand::WyRand;

/// Everything a mode may touch while handling an action.
pub struct Context<'a> {
    pub module: &'a mut dyn DecoderModule,
    pub reader: &'a mut dyn CardTransport,
    pub indicator: &'a mut dyn StatusIndicator,
    pub settings: &'a mut Settings,
    pub events: &'a mut EventRegistry,
    pub rng: &'a mut WyRand,
    pub now: Instant,
}

impl Context<'_> {
    pub fn announce(&mut self, announcement: Announcement) {
        self.module.play_announcement(announcement.track());
    }

    /// Reads and decodes the card on the reader.
    pub fn read_card(&mut self) -> Result<CardRecord, CardError> {
        let block = self.reader.read_block().map_err(|e| {
            error!("Reading card failed: {:?}", e);
            e
        })?;
        card::decode(&block).map_err(|e| {
            warn!("Ignoring card ({:?}): {}", e, Hex(&block));
            e
        })
    }

    pub fn one_shot(&mut self, duration: Duration, id: TimerId) -> Option<EventHandle> {
        self.register_timer(Timer::one_shot(self.now, duration), id)
    }

    pub fn repeating(&mut self, duration: Duration, id: TimerId) -> Option<EventHandle> {
        self.register_timer(Timer::repeating(self.now, duration), id)
    }

    fn register_timer(&mut self, timer: Timer, id: TimerId) -> Option<EventHandle> {
        self.events.register(Source::timer(timer, Action::Timer(id))).ok()
    }

    pub fn restart(&mut self, timer: Option<EventHandle>) {
        if let Some(handle) = timer {
            self.events.reset_timer(handle, self.now);
        }
    }

    pub fn cancel(&mut self, timer: &mut Option<EventHandle>) {
        if let Some(handle) = timer.take() {
            self.events.deregister(handle);
        }
    }
}

/// Request of a mode to be replaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Standby,
    Playback(FolderCard),
    Admin,
    Locked,
    Shutdown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeKind {
    Standby,
    Playback,
    Admin,
    Locked,
}

/// What an incoming mode learns about the outgoing one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SharedState {
    pub from: Option<ModeKind>,
    pub was_playing: bool,
}

impl SharedState {
    pub const BOOT: SharedState = SharedState {
        from: None,
        was_playing: false,
    };
}

pub fn extract_shared_state(mode: &SystemMode) -> SharedState {
    SharedState {
        from: Some(mode.kind()),
        was_playing: mode.as_mode().is_playing(),
    }
}

/// Mode reached by a freshly read card, shared by every mode that accepts cards.
pub(crate) fn card_transition(record: CardRecord) -> Option<Transition> {
    match record {
        CardRecord::Folder(folder) => Some(Transition::Playback(folder)),
        CardRecord::Special(SpecialCard::Admin) => Some(Transition::Admin),
        CardRecord::Special(SpecialCard::Lock) => Some(Transition::Locked),
        CardRecord::Special(SpecialCard::Unlock) | CardRecord::None => None,
    }
}

/// Reads the card and maps it to a transition. A transport failure is
/// announced, an unreadable format is ignored.
pub(crate) fn read_card_transition(cx: &mut Context) -> Option<Transition> {
    match cx.read_card() {
        Ok(record) => card_transition(record),
        Err(CardError::Transport(_)) => {
            cx.announce(Announcement::CardError);
            None
        }
        Err(_) => None,
    }
}

/// Actions every mode understands. Defaults ignore the action.
pub trait Mode {
    fn play(&mut self, _cx: &mut Context) -> Option<Transition> {
        None
    }
    fn stop(&mut self, _cx: &mut Context) -> Option<Transition> {
        None
    }
    fn next(&mut self, _cx: &mut Context) -> Option<Transition> {
        None
    }
    fn previous(&mut self, _cx: &mut Context) -> Option<Transition> {
        None
    }
    fn volume_up(&mut self, _cx: &mut Context) -> Option<Transition> {
        None
    }
    fn volume_down(&mut self, _cx: &mut Context) -> Option<Transition> {
        None
    }
    fn track_finished(&mut self, _cx: &mut Context) -> Option<Transition> {
        None
    }
    fn new_card(&mut self, _cx: &mut Context) -> Option<Transition> {
        None
    }
    fn timer(&mut self, _id: TimerId, _cx: &mut Context) -> Option<Transition> {
        None
    }
    /// Three button chord or debug command asking for the admin menu.
    fn admin_requested(&mut self, _cx: &mut Context) -> Option<Transition> {
        Some(Transition::Admin)
    }
    /// Any user input, before the action itself is dispatched.
    fn user_activity(&mut self, _cx: &mut Context) {}
    fn battery_high(&mut self, cx: &mut Context) {
        cx.indicator.battery_low(false);
    }
    fn battery_low(&mut self, cx: &mut Context) {
        cx.indicator.battery_low(true);
    }
    fn is_playing(&self) -> bool {
        false
    }
}

pub enum SystemMode {
    Standby(Standby),
    Playback(Playback),
    Admin(Admin),
    Locked(Locked),
}

impl SystemMode {
    /// Builds the mode a transition asks for. A folder that cannot be played
    /// falls back to Standby.
    pub fn enter(transition: Transition, shared: SharedState, cx: &mut Context) -> SystemMode {
        match transition {
            Transition::Standby | Transition::Shutdown => SystemMode::Standby(Standby::enter(shared, cx)),
            Transition::Playback(card) => match Playback::enter(card, cx) {
                Ok(playback) => SystemMode::Playback(playback),
                Err(e) => {
                    warn!("Cannot play folder {}: {:?}", card.folder, e);
                    cx.announce(Announcement::EmptyFolder);
                    SystemMode::Standby(Standby::enter(shared, cx))
                }
            },
            Transition::Admin => SystemMode::Admin(Admin::enter(shared, cx)),
            Transition::Locked => SystemMode::Locked(Locked::enter(shared, cx)),
        }
    }

    /// Releases the mode's timers, then its resources.
    pub fn close(self, cx: &mut Context) {
        info!("Leaving {:?}", self.kind());
        match self {
            SystemMode::Standby(mode) => mode.close(cx),
            SystemMode::Playback(mode) => mode.close(cx),
            SystemMode::Admin(mode) => mode.close(cx),
            SystemMode::Locked(mode) => mode.close(cx),
        }
    }

    pub fn kind(&self) -> ModeKind {
        match self {
            SystemMode::Standby(_) => ModeKind::Standby,
            SystemMode::Playback(_) => ModeKind::Playback,
            SystemMode::Admin(_) => ModeKind::Admin,
            SystemMode::Locked(_) => ModeKind::Locked,
        }
    }

    pub fn as_mode(&self) -> &dyn Mode {
        match self {
            SystemMode::Standby(mode) => mode,
            SystemMode::Playback(mode) => mode,
            SystemMode::Admin(mode) => mode,
            SystemMode::Locked(mode) => mode,
        }
    }

    pub fn as_mode_mut(&mut self) -> &mut dyn Mode {
        match self {
            SystemMode::Standby(mode) => mode,
            SystemMode::Playback(mode) => mode,
            SystemMode::Admin(mode) => mode,
            SystemMode::Locked(mode) => mode,
        }
    }

    /// Dispatches a mode level action.
    pub fn handle(&mut self, action: Action, cx: &mut Context) -> Option<Transition> {
        let mode = self.as_mode_mut();
        match action {
            Action::Play => mode.play(cx),
            Action::Stop => mode.stop(cx),
            Action::PlayPause if mode.is_playing() => mode.stop(cx),
            Action::PlayPause => mode.play(cx),
            Action::Next => mode.next(cx),
            Action::Previous => mode.previous(cx),
            Action::VolumeUp => mode.volume_up(cx),
            Action::VolumeDown => mode.volume_down(cx),
            Action::TrackFinished => mode.track_finished(cx),
            Action::NewCard => mode.new_card(cx),
            Action::Timer(id) => mode.timer(id, cx),
            Action::EnterAdmin => mode.admin_requested(cx),
            Action::BatteryHigh => {
                mode.battery_high(cx);
                None
            }
            Action::BatteryLow => {
                mode.battery_low(cx);
                None
            }
            Action::BatteryCritical | Action::Shutdown => Some(Transition::Shutdown),
            Action::DumpSettings | Action::Help => None,
        }
    }
}
