//! Recording doubles of the hardware collaborators.

use crate::peripherals::{
    Block, CardTransport, DecoderModule, Equalizer, Notification, NvStore, StatusIndicator, TransportError,
};
use crate::event::EventRegistry;
use crate::mode::Context;
use crate::settings::Settings;
use crate::Instant;
use nanorand::WyRand;
use std::collections::{BTreeMap, VecDeque};
use std::vec::Vec;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    PlayFolderTrack(u8, u8),
    Pause,
    Resume,
    Stop,
    SetVolume(u8),
    IncreaseVolume,
    DecreaseVolume,
    SetEqualizer(Equalizer),
    Announcement(u16),
}

#[derive(Default)]
pub struct MockModule {
    pub commands: Vec<Command>,
    pub default_tracks: u16,
    pub tracks: BTreeMap<u8, u16>,
    pub playing: bool,
    pub notifications: VecDeque<Notification>,
}

impl MockModule {
    pub fn with_tracks(default_tracks: u16) -> Self {
        Self {
            default_tracks,
            ..Self::default()
        }
    }

    pub fn announcements(&self) -> Vec<u16> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::Announcement(track) => Some(*track),
                _ => None,
            })
            .collect()
    }

    pub fn last_played(&self) -> Option<(u8, u8)> {
        self.commands.iter().rev().find_map(|c| match c {
            Command::PlayFolderTrack(folder, track) => Some((*folder, *track)),
            _ => None,
        })
    }
}

impl DecoderModule for MockModule {
    fn play_folder_track(&mut self, folder: u8, track: u8) {
        self.playing = true;
        self.commands.push(Command::PlayFolderTrack(folder, track));
    }

    fn pause(&mut self) {
        self.playing = false;
        self.commands.push(Command::Pause);
    }

    fn resume(&mut self) {
        self.playing = true;
        self.commands.push(Command::Resume);
    }

    fn stop(&mut self) {
        self.playing = false;
        self.commands.push(Command::Stop);
    }

    fn set_volume(&mut self, volume: u8) {
        self.commands.push(Command::SetVolume(volume));
    }

    fn increase_volume(&mut self) {
        self.commands.push(Command::IncreaseVolume);
    }

    fn decrease_volume(&mut self) {
        self.commands.push(Command::DecreaseVolume);
    }

    fn set_equalizer(&mut self, equalizer: Equalizer) {
        self.commands.push(Command::SetEqualizer(equalizer));
    }

    fn folder_track_count(&mut self, folder: u8) -> u16 {
        self.tracks.get(&folder).copied().unwrap_or(self.default_tracks)
    }

    fn play_announcement(&mut self, track: u16) {
        self.commands.push(Command::Announcement(track));
    }

    fn is_playing(&mut self) -> bool {
        self.playing
    }

    fn poll_notification(&mut self) -> Option<Notification> {
        self.notifications.pop_front()
    }
}

#[derive(Default)]
pub struct MockTransport {
    pub present: bool,
    pub block: Option<Block>,
    pub fail_write: bool,
    pub written: Vec<Block>,
    pub powered_down: bool,
}

impl MockTransport {
    /// A card holding `block` lies on the reader.
    pub fn insert(&mut self, block: Block) {
        self.present = true;
        self.block = Some(block);
    }

    pub fn remove(&mut self) {
        self.present = false;
        self.block = None;
    }
}

impl CardTransport for MockTransport {
    fn card_present(&mut self) -> bool {
        self.present
    }

    fn read_block(&mut self) -> Result<Block, TransportError> {
        self.block.ok_or(TransportError::NoCard)
    }

    fn write_block(&mut self, block: &Block) -> Result<(), TransportError> {
        if self.fail_write || !self.present {
            return Err(TransportError::Write);
        }
        self.written.push(*block);
        self.block = Some(*block);
        Ok(())
    }

    fn power_down(&mut self) {
        self.powered_down = true;
    }
}

/// Erased 2 KiB page.
#[derive(Clone)]
pub struct MemoryStore {
    bytes: [u8; 2048],
    pub writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            bytes: [0xff; 2048],
            writes: 0,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl NvStore for MemoryStore {
    fn read(&mut self, offset: usize) -> u8 {
        self.bytes[offset]
    }

    fn update(&mut self, offset: usize, value: u8) {
        if self.bytes[offset] != value {
            self.bytes[offset] = value;
            self.writes += 1;
        }
    }
}

#[derive(Default)]
pub struct MockIndicator {
    pub on: bool,
    pub toggles: usize,
    pub battery_low: bool,
}

impl StatusIndicator for MockIndicator {
    fn set(&mut self, on: bool) {
        self.on = on;
    }

    fn toggle(&mut self) {
        self.on = !self.on;
        self.toggles += 1;
    }

    fn battery_low(&mut self, low: bool) {
        self.battery_low = low;
    }
}

/// Owns one of each double and lends them out as a mode [`Context`].
pub struct Rig {
    pub module: MockModule,
    pub reader: MockTransport,
    pub indicator: MockIndicator,
    pub settings: Settings,
    pub events: EventRegistry,
    pub rng: WyRand,
}

impl Rig {
    pub fn new() -> Self {
        Self {
            module: MockModule::with_tracks(12),
            reader: MockTransport::default(),
            indicator: MockIndicator::default(),
            settings: Settings::default(),
            events: EventRegistry::new(),
            rng: WyRand::new_seed(5),
        }
    }

    pub fn cx(&mut self, now: Instant) -> Context<'_> {
        Context {
            module: &mut self.module,
            reader: &mut self.reader,
            indicator: &mut self.indicator,
            settings: &mut self.settings,
            events: &mut self.events,
            rng: &mut self.rng,
            now,
        }
    }
}
