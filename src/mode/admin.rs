use super::{Context, Mode, SharedState, Transition};
use crate::announcement::Announcement;
use crate::config::{timing, volume};
use crate::event::{EventHandle, TimerId};
use crate::menu::{Menu, MenuOutcome};
use log::info;

/// On-device configuration through the admin menu.
///
/// Play confirms the current screen and stop leaves it; next/previous step
/// the selection by one, the volume actions by a coarse step.
pub struct Admin {
    menu: Menu,
    inactivity: Option<EventHandle>,
}

impl Admin {
    pub fn enter(shared: SharedState, cx: &mut Context) -> Self {
        if shared.was_playing {
            cx.module.stop();
        }
        info!("Admin menu");
        let inactivity = cx.one_shot(timing::MENU_TIMEOUT, TimerId::Inactivity);
        Self {
            menu: Menu::open(cx),
            inactivity,
        }
    }

    pub fn close(mut self, cx: &mut Context) {
        cx.cancel(&mut self.inactivity);
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    fn leave_on_exit(outcome: MenuOutcome) -> Option<Transition> {
        match outcome {
            MenuOutcome::Stay => None,
            MenuOutcome::Exit => Some(Transition::Standby),
        }
    }
}

impl Mode for Admin {
    fn play(&mut self, cx: &mut Context) -> Option<Transition> {
        Self::leave_on_exit(self.menu.confirm(cx))
    }

    fn stop(&mut self, cx: &mut Context) -> Option<Transition> {
        Self::leave_on_exit(self.menu.abort(cx))
    }

    fn next(&mut self, cx: &mut Context) -> Option<Transition> {
        self.menu.step(1, cx);
        None
    }

    fn previous(&mut self, cx: &mut Context) -> Option<Transition> {
        self.menu.step(-1, cx);
        None
    }

    fn volume_up(&mut self, cx: &mut Context) -> Option<Transition> {
        self.menu.step(volume::COARSE_STEP as i16, cx);
        None
    }

    fn volume_down(&mut self, cx: &mut Context) -> Option<Transition> {
        self.menu.step(-(volume::COARSE_STEP as i16), cx);
        None
    }

    fn new_card(&mut self, cx: &mut Context) -> Option<Transition> {
        self.menu.card_detected(cx);
        None
    }

    fn timer(&mut self, id: TimerId, cx: &mut Context) -> Option<Transition> {
        if id != TimerId::Inactivity {
            return None;
        }
        info!("Admin menu timed out");
        cx.announce(Announcement::Cancelled);
        Some(Transition::Standby)
    }

    fn admin_requested(&mut self, _cx: &mut Context) -> Option<Transition> {
        None
    }

    fn user_activity(&mut self, cx: &mut Context) {
        cx.restart(self.inactivity);
    }
}
