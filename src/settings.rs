//! Persistent settings record.
//!
//! ```text
//! 0..4   cookie              13     equalizer
//! 4      version             14..19 reserved
//! 5      volume              19     flags (bit 0 locked)
//! 6      min volume          20     progress count
//! 7      max volume          21..   (folder, track) pairs
//! 8      last folder valid
//! 9..13  last folder {folder, mode, special, special2}
//! ```

use crate::card::{FolderCard, PlaybackMode};
use crate::config::{capacity, volume};
use crate::peripherals::{Equalizer, NvStore};
use heapless::Vec;
use log::{info, warn};

pub const SETTINGS_COOKIE: u32 = 0x4A55_4B45;
pub const SETTINGS_VERSION: u8 = 1;

const COOKIE: usize = 0;
const VERSION: usize = 4;
const VOLUME: usize = 5;
const MIN_VOLUME: usize = 6;
const MAX_VOLUME: usize = 7;
const LAST_FOLDER_VALID: usize = 8;
const LAST_FOLDER: usize = 9;
const EQUALIZER: usize = 13;
const RESERVED: core::ops::Range<usize> = 14..19;
const FLAGS: usize = 19;
const PROGRESS_COUNT: usize = 20;
const PROGRESS: usize = 21;

const FLAG_LOCKED: u8 = 1 << 0;

/// Last track played in an audiobook folder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub folder: u8,
    pub track: u8,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub volume: u8,
    pub min_volume: u8,
    pub max_volume: u8,
    pub equalizer: Equalizer,
    pub locked: bool,
    pub last_folder: Option<FolderCard>,
    /// Ordered by last touch, most recent last.
    progress: Vec<Progress, { capacity::PROGRESS_ENTRIES }>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            volume: volume::DEFAULT,
            min_volume: volume::DEFAULT_MIN,
            max_volume: volume::DEFAULT_MAX,
            equalizer: Equalizer::Normal,
            locked: false,
            last_folder: None,
            progress: Vec::new(),
        }
    }
}

impl Settings {
    /// Reads the record, falling back to defaults when cookie or version do not match.
    pub fn load(store: &mut dyn NvStore) -> Self {
        let cookie = u32::from_be_bytes([
            store.read(COOKIE),
            store.read(COOKIE + 1),
            store.read(COOKIE + 2),
            store.read(COOKIE + 3),
        ]);
        let version = store.read(VERSION);
        if cookie != SETTINGS_COOKIE || version != SETTINGS_VERSION {
            warn!("No valid settings stored (cookie {:x}, version {}), using defaults", cookie, version);
            return Self::default();
        }

        let last_folder = if store.read(LAST_FOLDER_VALID) != 0 {
            let mode = store.read(LAST_FOLDER + 1);
            match PlaybackMode::from_byte(mode) {
                Some(mode) => Some(FolderCard {
                    folder: store.read(LAST_FOLDER),
                    mode,
                    special: store.read(LAST_FOLDER + 2),
                    special2: store.read(LAST_FOLDER + 3),
                }),
                None => {
                    warn!("Dropping last folder with unknown mode {}", mode);
                    None
                }
            }
        } else {
            None
        };

        let mut progress = Vec::new();
        let count = usize::from(store.read(PROGRESS_COUNT));
        if count > capacity::PROGRESS_ENTRIES {
            warn!("Truncating {} progress entries to {}", count, capacity::PROGRESS_ENTRIES);
        }
        for i in 0..count.min(capacity::PROGRESS_ENTRIES) {
            let offset = PROGRESS + 2 * i;
            let entry = Progress {
                folder: store.read(offset),
                track: store.read(offset + 1),
            };
            progress.push(entry).ok();
        }

        Self {
            volume: store.read(VOLUME),
            min_volume: store.read(MIN_VOLUME),
            max_volume: store.read(MAX_VOLUME),
            equalizer: Equalizer::from_index(store.read(EQUALIZER)),
            locked: store.read(FLAGS) & FLAG_LOCKED != 0,
            last_folder,
            progress,
        }
    }

    /// Writes the full record.
    pub fn flush(&self, store: &mut dyn NvStore) {
        for (i, byte) in SETTINGS_COOKIE.to_be_bytes().iter().enumerate() {
            store.update(COOKIE + i, *byte);
        }
        store.update(VERSION, SETTINGS_VERSION);
        store.update(VOLUME, self.volume);
        store.update(MIN_VOLUME, self.min_volume);
        store.update(MAX_VOLUME, self.max_volume);
        let (valid, folder) = match self.last_folder {
            Some(card) => (1, [card.folder, card.mode as u8, card.special, card.special2]),
            None => (0, [0; 4]),
        };
        store.update(LAST_FOLDER_VALID, valid);
        for (i, byte) in folder.iter().enumerate() {
            store.update(LAST_FOLDER + i, *byte);
        }
        store.update(EQUALIZER, self.equalizer as u8);
        for offset in RESERVED {
            store.update(offset, 0);
        }
        store.update(FLAGS, if self.locked { FLAG_LOCKED } else { 0 });
        store.update(PROGRESS_COUNT, self.progress.len() as u8);
        for (i, entry) in self.progress.iter().enumerate() {
            store.update(PROGRESS + 2 * i, entry.folder);
            store.update(PROGRESS + 2 * i + 1, entry.track);
        }
        store.commit();
        info!("Settings written ({} progress entries)", self.progress.len());
    }

    /// Last known track of `folder`, 1 when the folder was never played.
    pub fn progress(&self, folder: u8) -> u8 {
        self.progress
            .iter()
            .find(|entry| entry.folder == folder)
            .map_or(1, |entry| entry.track)
    }

    /// Restores `1 <= min <= volume <= max <= CEILING`. A loaded record may
    /// carry any bytes behind a valid cookie.
    pub fn normalize_volumes(&mut self) {
        let stored = (self.volume, self.min_volume, self.max_volume);
        self.max_volume = self.max_volume.clamp(1, volume::CEILING);
        self.min_volume = self.min_volume.clamp(1, self.max_volume);
        self.volume = self.volume.clamp(self.min_volume, self.max_volume);
        if stored != (self.volume, self.min_volume, self.max_volume) {
            warn!(
                "Volumes {:?} out of order, using {}/{}/{}",
                stored, self.volume, self.min_volume, self.max_volume
            );
        }
    }

    /// Inserts or updates the entry of `folder`. A full list drops its least
    /// recently touched entry.
    pub fn save_progress(&mut self, folder: u8, track: u8) {
        if let Some(index) = self.progress.iter().position(|entry| entry.folder == folder) {
            self.progress.remove(index);
        } else if self.progress.is_full() {
            let evicted = self.progress.remove(0);
            info!("Progress list full, forgetting folder {}", evicted.folder);
        }
        self.progress.push(Progress { folder, track }).ok();
    }

    pub fn remove_progress(&mut self, folder: u8) {
        self.progress.retain(|entry| entry.folder != folder);
    }

    pub fn progress_entries(&self) -> &[Progress] {
        &self.progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MemoryStore;
    use proptest::prelude::*;

    #[test]
    fn blank_store_loads_defaults() {
        let mut store = MemoryStore::new();
        let settings = Settings::load(&mut store);
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.volume, 12);
        assert_eq!(settings.min_volume, 5);
        assert_eq!(settings.max_volume, 25);
        assert!(!settings.locked);
        assert!(settings.last_folder.is_none());
        assert!(settings.progress_entries().is_empty());
    }

    #[test]
    fn wrong_version_loads_defaults() {
        let mut store = MemoryStore::new();
        let mut settings = Settings::default();
        settings.volume = 20;
        settings.flush(&mut store);
        store.update(VERSION, SETTINGS_VERSION + 1);
        assert_eq!(Settings::load(&mut store), Settings::default());
    }

    #[test]
    fn flush_writes_documented_layout() {
        let mut store = MemoryStore::new();
        let mut settings = Settings::default();
        settings.locked = true;
        settings.equalizer = Equalizer::Rock;
        settings.last_folder = Some(FolderCard::new(3, PlaybackMode::Album));
        settings.save_progress(5, 4);
        settings.save_progress(9, 2);
        settings.flush(&mut store);
        assert_eq!(&store.bytes()[..25], &[
            0x4a, 0x55, 0x4b, 0x45, 1, 12, 5, 25, 1, 3, 2, 0, 0, 2, 0, 0, 0, 0, 0, 1, 2, 5, 4, 9, 2,
        ]);
    }

    #[test]
    fn normalizing_orders_volumes() {
        let mut settings = Settings {
            volume: 40,
            min_volume: 20,
            max_volume: 10,
            ..Settings::default()
        };
        settings.normalize_volumes();
        assert_eq!((settings.volume, settings.min_volume, settings.max_volume), (10, 10, 10));

        settings.max_volume = 0;
        settings.min_volume = 0;
        settings.normalize_volumes();
        assert_eq!((settings.volume, settings.min_volume, settings.max_volume), (1, 1, 1));

        let mut defaults = Settings::default();
        defaults.normalize_volumes();
        assert_eq!(defaults, Settings::default());
    }

    #[test]
    fn progress_defaults_to_first_track() {
        let mut settings = Settings::default();
        assert_eq!(settings.progress(4), 1);
        settings.save_progress(4, 6);
        settings.save_progress(4, 8);
        assert_eq!(settings.progress(4), 8);
        assert_eq!(settings.progress_entries().len(), 1);
        settings.remove_progress(4);
        settings.remove_progress(4);
        assert_eq!(settings.progress(4), 1);
    }

    #[test]
    fn full_progress_list_evicts_least_recent() {
        let mut settings = Settings::default();
        for folder in 0..capacity::PROGRESS_ENTRIES as u8 {
            settings.save_progress(folder, 2);
        }
        // touching folder 0 makes folder 1 the oldest
        settings.save_progress(0, 3);
        settings.save_progress(200, 5);
        assert_eq!(settings.progress_entries().len(), capacity::PROGRESS_ENTRIES);
        assert_eq!(settings.progress(1), 1);
        assert_eq!(settings.progress(0), 3);
        assert_eq!(settings.progress(200), 5);
    }

    fn any_settings() -> impl Strategy<Value = Settings> {
        (
            (1u8..=30, 1u8..=30, 1u8..=30),
            0u8..=Equalizer::LAST,
            any::<bool>(),
            proptest::option::of((1u8..=99, PlaybackMode::FIRST..=PlaybackMode::LAST, any::<u8>(), any::<u8>())),
            proptest::collection::btree_map(any::<u8>(), any::<u8>(), 0..capacity::PROGRESS_ENTRIES),
        )
            .prop_map(|((volume, min_volume, max_volume), equalizer, locked, last, progress)| {
                let mut settings = Settings {
                    volume,
                    min_volume,
                    max_volume,
                    equalizer: Equalizer::from_index(equalizer),
                    locked,
                    last_folder: last.map(|(folder, mode, special, special2)| FolderCard {
                        folder,
                        mode: PlaybackMode::from_byte(mode).unwrap(),
                        special,
                        special2,
                    }),
                    ..Settings::default()
                };
                for (folder, track) in progress {
                    settings.save_progress(folder, track);
                }
                settings
            })
    }

    proptest! {
        #[test]
        fn load_inverts_flush(settings in any_settings()) {
            let mut store = MemoryStore::new();
            settings.flush(&mut store);
            prop_assert_eq!(Settings::load(&mut store), settings);
        }

        #[test]
        fn reflush_over_longer_record(first in any_settings(), second in any_settings()) {
            let mut store = MemoryStore::new();
            first.flush(&mut store);
            second.flush(&mut store);
            prop_assert_eq!(Settings::load(&mut store), second);
        }
    }
}
