use super::{read_card_transition, Context, Mode, SharedState, Transition};
use crate::config::timing;
use crate::event::{EventHandle, TimerId};
use log::info;

/// Idle, waiting for a card or the play button. Powers the box down after
/// a period without input.
pub struct Standby {
    inactivity: Option<EventHandle>,
}

impl Standby {
    pub fn enter(shared: SharedState, cx: &mut Context) -> Self {
        if shared.was_playing {
            cx.module.stop();
        }
        info!("Standby");
        Self {
            inactivity: cx.one_shot(timing::STANDBY_TIMEOUT, TimerId::Inactivity),
        }
    }

    pub fn close(mut self, cx: &mut Context) {
        cx.cancel(&mut self.inactivity);
    }
}

impl Mode for Standby {
    /// Resumes the folder played last.
    fn play(&mut self, cx: &mut Context) -> Option<Transition> {
        cx.settings.last_folder.map(Transition::Playback)
    }

    fn new_card(&mut self, cx: &mut Context) -> Option<Transition> {
        read_card_transition(cx)
    }

    fn timer(&mut self, id: TimerId, _cx: &mut Context) -> Option<Transition> {
        (id == TimerId::Inactivity).then_some(Transition::Shutdown)
    }

    fn user_activity(&mut self, cx: &mut Context) {
        cx.restart(self.inactivity);
    }
}
