use crate::card::{FolderCard, PlaybackMode};
use crate::config::capacity;
use crate::peripherals::DecoderModule;
use crate::settings::Settings;
use heapless::Vec;
use log::{debug, info};
use nanorand::{Rng, WyRand};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaylistMoveDirection {
    Next,
    Previous,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackError {
    EmptyFolder(u8),
}

/// Which command `play` sent to the decoder module.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayCommand {
    /// First play of the playlist.
    Fresh,
    /// Continue the paused track.
    Resume,
    /// The track changed while paused.
    Changed,
}

/// Track sequencing policy of a folder.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Order {
    Album { track: u8 },
    Party { order: Vec<u8, { capacity::TRACKS_PER_FOLDER }>, position: usize },
    RepeatOne { track: u8 },
    AudioBook { track: u8 },
}

impl Order {
    fn current(&self) -> u8 {
        match self {
            Order::Album { track } | Order::RepeatOne { track } | Order::AudioBook { track } => *track,
            Order::Party { order, position } => order[*position],
        }
    }

    /// Moves the cursor; false when there is nowhere to go.
    fn advance(&mut self, dir: PlaylistMoveDirection, track_count: u8) -> bool {
        match self {
            Order::Album { track } | Order::AudioBook { track } => match dir {
                PlaylistMoveDirection::Next if *track < track_count => {
                    *track += 1;
                    true
                }
                PlaylistMoveDirection::Previous if *track > 1 => {
                    *track -= 1;
                    true
                }
                _ => false,
            },
            Order::Party { order, position } => {
                let len = order.len();
                *position = match dir {
                    PlaylistMoveDirection::Next => (*position + 1) % len,
                    PlaylistMoveDirection::Previous => (*position + len - 1) % len,
                };
                true
            }
            Order::RepeatOne { .. } => false,
        }
    }

    fn reset(&mut self) {
        match self {
            Order::Album { track } | Order::AudioBook { track } => *track = 1,
            Order::Party { position, .. } => *position = 0,
            Order::RepeatOne { .. } => {}
        }
    }
}

/// Shuffled play order of `1..=track_count`.
fn shuffle(track_count: u8, rng: &mut WyRand) -> Vec<u8, { capacity::TRACKS_PER_FOLDER }> {
    let mut order: Vec<u8, { capacity::TRACKS_PER_FOLDER }> = (1..=track_count).collect();
    for i in (1..order.len()).rev() {
        let j = rng.generate_range(0..=i);
        order.swap(i, j);
    }
    order
}

/// The folder being played and the cursor inside it.
///
/// Closing an audiobook stores its cursor in the settings, or drops the
/// folder's progress when the book was played to its end.
pub struct Playlist {
    card: FolderCard,
    track_count: u8,
    order: Order,
    started: bool,
    paused: bool,
    changed: bool,
    finished: bool,
}

impl Playlist {
    pub fn open(
        card: FolderCard,
        module: &mut dyn DecoderModule,
        settings: &Settings,
        rng: &mut WyRand,
    ) -> Result<Self, PlaybackError> {
        let track_count = module.folder_track_count(card.folder).min(capacity::TRACKS_PER_FOLDER as u16) as u8;
        if track_count == 0 {
            return Err(PlaybackError::EmptyFolder(card.folder));
        }
        let in_folder = |track: u8| if (1..=track_count).contains(&track) { track } else { 1 };
        let order = match card.mode {
            PlaybackMode::Album => Order::Album { track: 1 },
            PlaybackMode::Party => Order::Party {
                order: shuffle(track_count, rng),
                position: 0,
            },
            PlaybackMode::RepeatOne => Order::RepeatOne {
                track: in_folder(card.special),
            },
            PlaybackMode::AudioBook => Order::AudioBook {
                track: in_folder(settings.progress(card.folder)),
            },
        };
        info!(
            "Opened folder {} ({:?}, {} tracks) at track {}",
            card.folder,
            card.mode,
            track_count,
            order.current()
        );
        Ok(Self {
            card,
            track_count,
            order,
            started: false,
            paused: false,
            changed: false,
            finished: false,
        })
    }

    pub fn card(&self) -> FolderCard {
        self.card
    }

    pub fn current_track(&self) -> u8 {
        self.order.current()
    }

    pub fn track_count(&self) -> u8 {
        self.track_count
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn play(&mut self, module: &mut dyn DecoderModule) -> PlayCommand {
        let command = if !self.started {
            self.started = true;
            self.play_current(module);
            PlayCommand::Fresh
        } else if self.changed {
            self.play_current(module);
            PlayCommand::Changed
        } else {
            module.resume();
            PlayCommand::Resume
        };
        self.paused = false;
        self.changed = false;
        command
    }

    pub fn pause(&mut self, module: &mut dyn DecoderModule) {
        if !self.paused {
            module.pause();
            self.paused = true;
        }
    }

    /// Moves to the neighbouring track. A running playlist switches right away,
    /// a paused one picks the new track up on the next `play`.
    pub fn move_next(&mut self, dir: PlaylistMoveDirection, module: &mut dyn DecoderModule) -> bool {
        if !self.order.advance(dir, self.track_count) {
            debug!("No track {:?} of {}", dir, self.current_track());
            return false;
        }
        if self.paused {
            self.changed = true;
        } else {
            self.started = true;
            self.play_current(module);
        }
        true
    }

    /// Skips to the neighbouring track on request. Skipping past the last
    /// track of an album or audiobook finishes the folder and returns false.
    pub fn skip(&mut self, dir: PlaylistMoveDirection, module: &mut dyn DecoderModule) -> bool {
        if self.move_next(dir, module) {
            return true;
        }
        let linear = matches!(self.order, Order::Album { .. } | Order::AudioBook { .. });
        if linear && dir == PlaylistMoveDirection::Next {
            self.finished = true;
            return false;
        }
        true
    }

    /// Back to the start of the play order.
    pub fn rewind(&mut self) {
        let before = self.current_track();
        self.order.reset();
        if self.current_track() != before {
            self.changed = true;
        }
    }

    /// Reacts to the end of the current track. False when the folder is exhausted.
    pub fn track_finished(&mut self, module: &mut dyn DecoderModule) -> bool {
        if let Order::RepeatOne { .. } = self.order {
            self.play_current(module);
            return true;
        }
        if self.move_next(PlaylistMoveDirection::Next, module) {
            true
        } else {
            self.finished = true;
            false
        }
    }

    pub fn close(self, settings: &mut Settings) {
        if let Order::AudioBook { track } = self.order {
            if self.finished {
                info!("Audiobook {} finished", self.card.folder);
                settings.remove_progress(self.card.folder);
            } else {
                settings.save_progress(self.card.folder, track);
            }
        }
    }

    fn play_current(&self, module: &mut dyn DecoderModule) {
        module.play_folder_track(self.card.folder, self.current_track());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Command, MockModule};
    use proptest::prelude::*;

    fn open(mode: PlaybackMode, tracks: u16, settings: &Settings) -> (Playlist, MockModule) {
        let mut module = MockModule::with_tracks(tracks);
        let playlist = Playlist::open(FolderCard::new(7, mode), &mut module, settings, &mut WyRand::new_seed(3)).unwrap();
        module.commands.clear();
        (playlist, module)
    }

    #[test]
    fn empty_folder_is_rejected() {
        let mut module = MockModule::with_tracks(0);
        let result = Playlist::open(
            FolderCard::new(7, PlaybackMode::Album),
            &mut module,
            &Settings::default(),
            &mut WyRand::new_seed(1),
        );
        assert_eq!(result.err(), Some(PlaybackError::EmptyFolder(7)));
    }

    #[test]
    fn album_stops_at_both_ends() {
        let (mut playlist, mut module) = open(PlaybackMode::Album, 3, &Settings::default());
        playlist.play(&mut module);
        assert!(!playlist.move_next(PlaylistMoveDirection::Previous, &mut module));
        assert_eq!(playlist.current_track(), 1);
        assert!(playlist.move_next(PlaylistMoveDirection::Next, &mut module));
        assert!(playlist.move_next(PlaylistMoveDirection::Next, &mut module));
        assert!(!playlist.move_next(PlaylistMoveDirection::Next, &mut module));
        assert_eq!(playlist.current_track(), 3);
        playlist.rewind();
        assert_eq!(playlist.current_track(), 1);
    }

    #[test]
    fn repeat_one_never_moves() {
        let mut module = MockModule::with_tracks(9);
        let card = FolderCard {
            special: 4,
            ..FolderCard::new(2, PlaybackMode::RepeatOne)
        };
        let mut playlist = Playlist::open(card, &mut module, &Settings::default(), &mut WyRand::new_seed(1)).unwrap();
        playlist.play(&mut module);
        assert!(!playlist.move_next(PlaylistMoveDirection::Next, &mut module));
        assert!(!playlist.move_next(PlaylistMoveDirection::Previous, &mut module));
        playlist.rewind();
        assert_eq!(playlist.current_track(), 4);
        module.commands.clear();
        assert!(playlist.track_finished(&mut module));
        assert_eq!(module.commands.as_slice(), &[Command::PlayFolderTrack(2, 4)]);
    }

    #[test]
    fn play_distinguishes_fresh_resume_and_changed() {
        let (mut playlist, mut module) = open(PlaybackMode::Album, 5, &Settings::default());
        assert_eq!(playlist.play(&mut module), PlayCommand::Fresh);
        playlist.pause(&mut module);
        assert_eq!(playlist.play(&mut module), PlayCommand::Resume);
        playlist.pause(&mut module);
        playlist.move_next(PlaylistMoveDirection::Next, &mut module);
        assert_eq!(playlist.play(&mut module), PlayCommand::Changed);
        assert_eq!(
            module.commands.as_slice(),
            &[
                Command::PlayFolderTrack(7, 1),
                Command::Pause,
                Command::Resume,
                Command::Pause,
                Command::PlayFolderTrack(7, 2),
            ]
        );
    }

    #[test]
    fn running_playlist_switches_immediately() {
        let (mut playlist, mut module) = open(PlaybackMode::Album, 5, &Settings::default());
        playlist.play(&mut module);
        module.commands.clear();
        playlist.move_next(PlaylistMoveDirection::Next, &mut module);
        assert_eq!(module.commands.as_slice(), &[Command::PlayFolderTrack(7, 2)]);
    }

    #[test]
    fn audiobook_resumes_and_stores_progress() {
        let mut settings = Settings::default();
        settings.save_progress(7, 4);
        let (mut playlist, mut module) = open(PlaybackMode::AudioBook, 10, &settings);
        assert_eq!(playlist.current_track(), 4);
        playlist.play(&mut module);
        playlist.move_next(PlaylistMoveDirection::Next, &mut module);
        playlist.close(&mut settings);
        assert_eq!(settings.progress(7), 5);
    }

    #[test]
    fn finished_audiobook_forgets_progress() {
        let mut settings = Settings::default();
        settings.save_progress(7, 2);
        let (mut playlist, mut module) = open(PlaybackMode::AudioBook, 3, &settings);
        playlist.play(&mut module);
        assert!(playlist.track_finished(&mut module));
        assert!(!playlist.track_finished(&mut module));
        playlist.close(&mut settings);
        assert!(settings.progress_entries().is_empty());
    }

    #[test]
    fn skipping_past_the_end_finishes_linear_folders() {
        let mut settings = Settings::default();
        settings.save_progress(7, 2);
        let (mut playlist, mut module) = open(PlaybackMode::AudioBook, 3, &settings);
        playlist.play(&mut module);
        assert!(playlist.skip(PlaylistMoveDirection::Next, &mut module));
        assert!(!playlist.skip(PlaylistMoveDirection::Next, &mut module));
        playlist.close(&mut settings);
        assert!(settings.progress_entries().is_empty());

        let (mut playlist, mut module) = open(PlaybackMode::Album, 3, &Settings::default());
        playlist.play(&mut module);
        assert!(playlist.skip(PlaylistMoveDirection::Previous, &mut module));
        assert_eq!(playlist.current_track(), 1);
    }

    #[test]
    fn skipping_never_finishes_party_or_repeat_one() {
        for mode in [PlaybackMode::Party, PlaybackMode::RepeatOne] {
            let (mut playlist, mut module) = open(mode, 2, &Settings::default());
            playlist.play(&mut module);
            for _ in 0..4 {
                assert!(playlist.skip(PlaylistMoveDirection::Next, &mut module));
            }
        }
    }

    #[test]
    fn stale_progress_beyond_folder_restarts() {
        let mut settings = Settings::default();
        settings.save_progress(7, 40);
        let (playlist, _) = open(PlaybackMode::AudioBook, 10, &settings);
        assert_eq!(playlist.current_track(), 1);
    }

    proptest! {
        #[test]
        fn party_order_is_a_permutation(tracks in 1u16..=255, seed in any::<u64>()) {
            let mut module = MockModule::with_tracks(tracks);
            let mut playlist = Playlist::open(
                FolderCard::new(1, PlaybackMode::Party),
                &mut module,
                &Settings::default(),
                &mut WyRand::new_seed(seed),
            ).unwrap();
            let start = playlist.current_track();
            let mut seen = std::collections::BTreeSet::new();
            for _ in 0..tracks {
                prop_assert!(seen.insert(playlist.current_track()), "track repeated before all were played");
                prop_assert!(playlist.move_next(PlaylistMoveDirection::Next, &mut module));
            }
            prop_assert_eq!(playlist.current_track(), start);
            prop_assert_eq!(seen, (1..=tracks as u8).collect::<std::collections::BTreeSet<u8>>());
        }

        #[test]
        fn party_previous_undoes_next(tracks in 1u16..=40, seed in any::<u64>(), steps in 0usize..100) {
            let mut module = MockModule::with_tracks(tracks);
            let mut playlist = Playlist::open(
                FolderCard::new(1, PlaybackMode::Party),
                &mut module,
                &Settings::default(),
                &mut WyRand::new_seed(seed),
            ).unwrap();
            let start = playlist.current_track();
            for _ in 0..steps {
                playlist.move_next(PlaylistMoveDirection::Previous, &mut module);
            }
            for _ in 0..steps {
                playlist.move_next(PlaylistMoveDirection::Next, &mut module);
            }
            prop_assert_eq!(playlist.current_track(), start);
        }
    }
}
