use super::{Context, Mode, SharedState, Transition};
use crate::announcement::Announcement;
use crate::card::{CardError, CardRecord, SpecialCard};
use crate::config::timing;
use crate::event::{EventHandle, TimerId};
use log::info;

/// Ignores everything but the unlock card. Blinks the status light and
/// powers down soon.
pub struct Locked {
    inactivity: Option<EventHandle>,
    blink: Option<EventHandle>,
}

impl Locked {
    pub fn enter(shared: SharedState, cx: &mut Context) -> Self {
        if shared.was_playing {
            cx.module.stop();
        }
        info!("Locked");
        cx.settings.locked = true;
        cx.announce(Announcement::Locked);
        Self {
            inactivity: cx.one_shot(timing::LOCKED_TIMEOUT, TimerId::Inactivity),
            blink: cx.repeating(timing::LOCKED_BLINK, TimerId::Blink),
        }
    }

    pub fn close(mut self, cx: &mut Context) {
        cx.cancel(&mut self.blink);
        cx.cancel(&mut self.inactivity);
        cx.indicator.set(false);
    }
}

impl Mode for Locked {
    fn new_card(&mut self, cx: &mut Context) -> Option<Transition> {
        match cx.read_card() {
            Ok(CardRecord::Special(SpecialCard::Unlock)) => {
                info!("Unlocked");
                cx.settings.locked = false;
                cx.announce(Announcement::Unlocked);
                Some(Transition::Standby)
            }
            Err(CardError::Transport(_)) => {
                cx.announce(Announcement::CardError);
                None
            }
            _ => None,
        }
    }

    fn timer(&mut self, id: TimerId, cx: &mut Context) -> Option<Transition> {
        match id {
            TimerId::Inactivity => Some(Transition::Shutdown),
            TimerId::Blink => {
                cx.indicator.toggle();
                None
            }
            TimerId::PauseAbort => None,
        }
    }

    fn admin_requested(&mut self, _cx: &mut Context) -> Option<Transition> {
        None
    }
}
