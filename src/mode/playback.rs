use super::{read_card_transition, Context, Mode, Transition};
use crate::card::FolderCard;
use crate::config::timing;
use crate::event::{EventHandle, TimerId};
use crate::playlist::{PlaybackError, Playlist, PlaylistMoveDirection};
use log::{debug, info};

/// Plays one folder.
///
/// Stopping pauses; stopping again while paused rewinds the folder. A pause
/// left alone for too long falls back to Standby.
pub struct Playback {
    playlist: Playlist,
    pause_abort: Option<EventHandle>,
}

impl Playback {
    pub fn enter(card: FolderCard, cx: &mut Context) -> Result<Self, PlaybackError> {
        let mut playlist = Playlist::open(card, cx.module, cx.settings, cx.rng)?;
        cx.settings.last_folder = Some(card);
        playlist.play(cx.module);
        Ok(Self {
            playlist,
            pause_abort: None,
        })
    }

    /// Persists the playlist's progress after releasing the pause timer.
    pub fn close(mut self, cx: &mut Context) {
        cx.cancel(&mut self.pause_abort);
        self.playlist.close(cx.settings);
    }

    pub fn card(&self) -> FolderCard {
        self.playlist.card()
    }

    pub fn current_track(&self) -> u8 {
        self.playlist.current_track()
    }

    fn move_to(&mut self, dir: PlaylistMoveDirection, cx: &mut Context) -> Option<Transition> {
        if self.playlist.skip(dir, cx.module) {
            None
        } else {
            info!("Skipped past the end of folder {}", self.playlist.card().folder);
            Some(Transition::Standby)
        }
    }
}

impl Mode for Playback {
    fn play(&mut self, cx: &mut Context) -> Option<Transition> {
        if self.playlist.is_paused() {
            let command = self.playlist.play(cx.module);
            debug!("Play: {:?}", command);
            cx.cancel(&mut self.pause_abort);
        }
        None
    }

    fn stop(&mut self, cx: &mut Context) -> Option<Transition> {
        if self.playlist.is_paused() {
            info!("Rewinding folder {}", self.playlist.card().folder);
            self.playlist.rewind();
        } else {
            self.playlist.pause(cx.module);
            self.pause_abort = cx.one_shot(timing::PAUSE_ABORT_TIMEOUT, TimerId::PauseAbort);
        }
        None
    }

    fn next(&mut self, cx: &mut Context) -> Option<Transition> {
        self.move_to(PlaylistMoveDirection::Next, cx)
    }

    fn previous(&mut self, cx: &mut Context) -> Option<Transition> {
        self.move_to(PlaylistMoveDirection::Previous, cx)
    }

    fn volume_up(&mut self, cx: &mut Context) -> Option<Transition> {
        if cx.settings.volume < cx.settings.max_volume {
            cx.settings.volume += 1;
            cx.module.increase_volume();
        }
        None
    }

    fn volume_down(&mut self, cx: &mut Context) -> Option<Transition> {
        if cx.settings.volume > cx.settings.min_volume {
            cx.settings.volume -= 1;
            cx.module.decrease_volume();
        }
        None
    }

    fn track_finished(&mut self, cx: &mut Context) -> Option<Transition> {
        if self.playlist.track_finished(cx.module) {
            None
        } else {
            info!("Folder {} finished", self.playlist.card().folder);
            Some(Transition::Standby)
        }
    }

    fn new_card(&mut self, cx: &mut Context) -> Option<Transition> {
        read_card_transition(cx)
    }

    fn timer(&mut self, id: TimerId, _cx: &mut Context) -> Option<Transition> {
        (id == TimerId::PauseAbort).then_some(Transition::Standby)
    }

    fn is_playing(&self) -> bool {
        !self.playlist.is_paused()
    }
}
