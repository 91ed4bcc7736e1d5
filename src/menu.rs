//! Admin menu.
//!
//! Screens live on a small fixed stack; the bottom entry is the main menu.
//! Confirming a leaf commits its value and pops back to the parent, wizard
//! steps replace the top screen with the next step. Popping the main menu
//! leaves the admin mode.

use crate::announcement::Announcement;
use crate::card::{self, CardRecord, FolderCard, PlaybackMode, SpecialCard};
use crate::config::{capacity, volume};
use crate::mode::Context;
use crate::peripherals::Equalizer;
use heapless::Vec;
use log::{debug, error, info};

/// Entries of the main menu, numbered as they are announced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MainItem {
    Volume = 1,
    MinVolume,
    MaxVolume,
    Equalizer,
    FolderCard,
    SpecialCard,
    ResetProgress,
}

impl MainItem {
    const LAST: u16 = MainItem::ResetProgress as u16;

    fn from_value(value: u16) -> Option<Self> {
        Some(match value {
            1 => MainItem::Volume,
            2 => MainItem::MinVolume,
            3 => MainItem::MaxVolume,
            4 => MainItem::Equalizer,
            5 => MainItem::FolderCard,
            6 => MainItem::SpecialCard,
            7 => MainItem::ResetProgress,
            _ => return None,
        })
    }
}

/// What a selection screen picks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Purpose {
    Main,
    Volume,
    MinVolume,
    MaxVolume,
    /// Preset index plus one.
    Equalizer,
    Folder,
    PlaybackMode,
    Track,
    SpecialCard,
    ResetProgress,
}

impl Purpose {
    fn prompt(self) -> Announcement {
        match self {
            Purpose::Main => Announcement::AdminMenu,
            Purpose::Volume => Announcement::ChooseVolume,
            Purpose::MinVolume => Announcement::ChooseMinVolume,
            Purpose::MaxVolume => Announcement::ChooseMaxVolume,
            Purpose::Equalizer => Announcement::ChooseEqualizer,
            Purpose::Folder => Announcement::ChooseFolder,
            Purpose::PlaybackMode => Announcement::ChoosePlaybackMode,
            Purpose::Track => Announcement::ChooseTrack,
            Purpose::SpecialCard => Announcement::ChooseSpecialCard,
            Purpose::ResetProgress => Announcement::ResetProgress,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    /// Numeric picker over `min..=max`, wrapping at both ends.
    Select {
        purpose: Purpose,
        min: u16,
        max: u16,
        value: u16,
    },
    /// Last step of the card wizards. Waits for a card, then for one more confirm.
    WaitForCard { card_ready: bool },
}

impl Screen {
    fn select(purpose: Purpose, min: u16, max: u16, value: u16) -> Self {
        let max = max.max(min);
        Screen::Select {
            purpose,
            min,
            max,
            value: value.clamp(min, max),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuOutcome {
    Stay,
    Exit,
}

pub struct Menu {
    stack: Vec<Screen, { capacity::MENU_DEPTH }>,
    /// Card being put together by the wizards.
    draft: CardRecord,
}

impl Menu {
    /// Opens the main menu.
    pub fn open(cx: &mut Context) -> Self {
        let mut menu = Self {
            stack: Vec::new(),
            draft: CardRecord::None,
        };
        menu.push(Screen::select(Purpose::Main, 1, MainItem::LAST, 1), cx);
        menu
    }

    pub fn screen(&self) -> Option<&Screen> {
        self.stack.last()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Moves the selection by `delta`, wrapping around the screen's range.
    pub fn step(&mut self, delta: i16, cx: &mut Context) {
        if let Some(Screen::Select { min, max, value, .. }) = self.stack.last_mut() {
            let span = i32::from(*max) - i32::from(*min) + 1;
            let offset = (i32::from(*value) - i32::from(*min) + i32::from(delta)).rem_euclid(span);
            *value = *min + offset as u16;
            debug!("Menu value {}", value);
            let announced = *value;
            cx.announce(Announcement::Number(announced.min(u16::from(u8::MAX)) as u8));
        }
    }

    pub fn confirm(&mut self, cx: &mut Context) -> MenuOutcome {
        match self.stack.last().copied() {
            Some(Screen::Select { purpose, value, .. }) => self.commit(purpose, value, cx),
            Some(Screen::WaitForCard { card_ready: true }) => self.write_card(cx),
            Some(Screen::WaitForCard { card_ready: false }) => MenuOutcome::Stay,
            None => MenuOutcome::Exit,
        }
    }

    /// Leaves the current screen without committing.
    pub fn abort(&mut self, cx: &mut Context) -> MenuOutcome {
        if let Some(Screen::WaitForCard { card_ready: false }) = self.stack.last() {
            return MenuOutcome::Stay;
        }
        cx.announce(Announcement::Cancelled);
        self.pop(cx)
    }

    pub fn card_detected(&mut self, cx: &mut Context) {
        if let Some(Screen::WaitForCard { card_ready }) = self.stack.last_mut() {
            *card_ready = true;
            cx.announce(Announcement::ConfirmWrite);
        }
    }

    fn commit(&mut self, purpose: Purpose, value: u16, cx: &mut Context) -> MenuOutcome {
        let byte = value as u8;
        match purpose {
            Purpose::Main => {
                let Some(item) = MainItem::from_value(value) else {
                    return MenuOutcome::Stay;
                };
                let screen = self.item_screen(item, cx);
                self.push(screen, cx);
                return MenuOutcome::Stay;
            }
            Purpose::Volume => {
                cx.settings.volume = byte;
                cx.module.set_volume(byte);
            }
            Purpose::MinVolume => {
                cx.settings.min_volume = byte;
                cx.settings.volume = cx.settings.volume.max(byte);
            }
            Purpose::MaxVolume => {
                cx.settings.max_volume = byte;
                cx.settings.volume = cx.settings.volume.min(byte);
            }
            Purpose::Equalizer => {
                let equalizer = Equalizer::from_index(byte.saturating_sub(1));
                cx.settings.equalizer = equalizer;
                cx.module.set_equalizer(equalizer);
            }
            Purpose::Folder => {
                self.draft = CardRecord::Folder(FolderCard::new(byte, PlaybackMode::Album));
                let screen = Screen::select(Purpose::PlaybackMode, PlaybackMode::FIRST.into(), PlaybackMode::LAST.into(), 0);
                self.replace(screen, cx);
                return MenuOutcome::Stay;
            }
            Purpose::PlaybackMode => return self.choose_playback_mode(byte, cx),
            Purpose::Track => {
                if let CardRecord::Folder(folder) = &mut self.draft {
                    folder.special = byte;
                }
                self.replace(Screen::WaitForCard { card_ready: false }, cx);
                return MenuOutcome::Stay;
            }
            Purpose::SpecialCard => {
                self.draft = SpecialCard::from_byte(byte).map_or(CardRecord::None, CardRecord::Special);
                self.replace(Screen::WaitForCard { card_ready: false }, cx);
                return MenuOutcome::Stay;
            }
            Purpose::ResetProgress => {
                info!("Resetting progress of folder {}", byte);
                cx.settings.remove_progress(byte);
            }
        }
        self.pop(cx)
    }

    fn choose_playback_mode(&mut self, byte: u8, cx: &mut Context) -> MenuOutcome {
        let CardRecord::Folder(folder) = &mut self.draft else {
            return self.pop(cx);
        };
        let Some(mode) = PlaybackMode::from_byte(byte) else {
            return MenuOutcome::Stay;
        };
        folder.mode = mode;
        let next = if mode == PlaybackMode::RepeatOne {
            let tracks = cx.module.folder_track_count(folder.folder).min(capacity::TRACKS_PER_FOLDER as u16);
            if tracks == 0 {
                cx.announce(Announcement::EmptyFolder);
                return self.pop(cx);
            }
            Screen::select(Purpose::Track, 1, tracks, 1)
        } else {
            Screen::WaitForCard { card_ready: false }
        };
        self.replace(next, cx);
        MenuOutcome::Stay
    }

    fn item_screen(&mut self, item: MainItem, cx: &mut Context) -> Screen {
        let settings = &*cx.settings;
        match item {
            MainItem::Volume => Screen::select(
                Purpose::Volume,
                settings.min_volume.into(),
                settings.max_volume.into(),
                settings.volume.into(),
            ),
            MainItem::MinVolume => Screen::select(
                Purpose::MinVolume,
                1,
                settings.max_volume.into(),
                settings.min_volume.into(),
            ),
            MainItem::MaxVolume => Screen::select(
                Purpose::MaxVolume,
                settings.min_volume.into(),
                volume::CEILING.into(),
                settings.max_volume.into(),
            ),
            MainItem::Equalizer => Screen::select(
                Purpose::Equalizer,
                1,
                u16::from(Equalizer::LAST) + 1,
                settings.equalizer as u16 + 1,
            ),
            MainItem::FolderCard => {
                self.draft = CardRecord::None;
                Screen::select(Purpose::Folder, 1, capacity::FOLDERS.into(), 1)
            }
            MainItem::SpecialCard => {
                self.draft = CardRecord::None;
                Screen::select(Purpose::SpecialCard, SpecialCard::FIRST.into(), SpecialCard::LAST.into(), 0)
            }
            MainItem::ResetProgress => Screen::select(Purpose::ResetProgress, 1, capacity::FOLDERS.into(), 1),
        }
    }

    fn write_card(&mut self, cx: &mut Context) -> MenuOutcome {
        let written = card::encode(&self.draft).and_then(|block| cx.reader.write_block(&block).map_err(Into::into));
        match written {
            Ok(()) => {
                info!("Programmed card {:?}", self.draft);
                cx.announce(Announcement::CardWritten);
                self.pop(cx)
            }
            Err(e) => {
                error!("Writing card failed: {:?}", e);
                cx.announce(Announcement::CardError);
                if let Some(Screen::WaitForCard { card_ready }) = self.stack.last_mut() {
                    *card_ready = false;
                }
                MenuOutcome::Stay
            }
        }
    }

    fn push(&mut self, screen: Screen, cx: &mut Context) {
        if self.stack.push(screen).is_err() {
            error!("Menu stack full, dropping {:?}", screen);
            return;
        }
        Self::announce_screen(&screen, cx);
    }

    fn replace(&mut self, screen: Screen, cx: &mut Context) {
        self.stack.pop();
        self.push(screen, cx);
    }

    fn pop(&mut self, cx: &mut Context) -> MenuOutcome {
        self.stack.pop();
        match self.stack.last() {
            Some(parent) => {
                Self::announce_screen(parent, cx);
                MenuOutcome::Stay
            }
            None => MenuOutcome::Exit,
        }
    }

    fn announce_screen(screen: &Screen, cx: &mut Context) {
        match *screen {
            Screen::Select { purpose, value, .. } => {
                cx.announce(purpose.prompt());
                if purpose == Purpose::Main {
                    cx.announce(Announcement::MainMenuItems);
                }
                cx.announce(Announcement::Number(value as u8));
            }
            Screen::WaitForCard { .. } => cx.announce(Announcement::WaitForCard),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::Rig;
    use crate::Instant;

    fn rig() -> Rig {
        Rig::new()
    }

    fn value(menu: &Menu) -> u16 {
        match menu.screen() {
            Some(Screen::Select { value, .. }) => *value,
            other => panic!("not a selection: {:?}", other),
        }
    }

    fn choose(menu: &mut Menu, target: u16, cx: &mut Context) {
        while value(menu) != target {
            menu.step(1, cx);
        }
        assert_eq!(menu.confirm(cx), MenuOutcome::Stay);
    }

    #[test]
    fn max_volume_wraps_at_top_of_range() {
        let mut rig = rig();
        let mut cx = rig.cx(Instant::from_ticks(0));
        let mut menu = Menu::open(&mut cx);
        choose(&mut menu, MainItem::MaxVolume as u16, &mut cx);
        assert_eq!(
            menu.screen(),
            Some(&Screen::Select {
                purpose: Purpose::MaxVolume,
                min: 5,
                max: 30,
                value: 25
            })
        );
        let mut wraps = 0;
        for _ in 0..10 {
            let before = value(&menu);
            menu.step(1, &mut cx);
            if value(&menu) < before {
                wraps += 1;
            }
        }
        assert_eq!(wraps, 1);
        assert_eq!(value(&menu), 9);
        assert_eq!(menu.confirm(&mut cx), MenuOutcome::Stay);
        assert_eq!(rig.settings.max_volume, 9);
        assert_eq!(rig.settings.volume, 9);
    }

    #[test]
    fn inverted_volume_range_opens_every_picker() {
        let mut rig = rig();
        rig.settings.min_volume = 20;
        rig.settings.max_volume = 10;
        let mut cx = rig.cx(Instant::from_ticks(0));
        let mut menu = Menu::open(&mut cx);
        for item in [MainItem::Volume, MainItem::MinVolume, MainItem::MaxVolume] {
            choose(&mut menu, item as u16, &mut cx);
            menu.step(1, &mut cx);
            menu.step(-3, &mut cx);
            assert!(matches!(
                menu.screen(),
                Some(Screen::Select { min, max, value, .. }) if *min <= *max && (*min..=*max).contains(value)
            ));
            assert_eq!(menu.abort(&mut cx), MenuOutcome::Stay);
        }
    }

    #[test]
    fn coarse_step_wraps_backwards() {
        let mut rig = rig();
        let mut cx = rig.cx(Instant::from_ticks(0));
        let mut menu = Menu::open(&mut cx);
        choose(&mut menu, MainItem::ResetProgress as u16, &mut cx);
        menu.step(-(volume::COARSE_STEP as i16), &mut cx);
        assert_eq!(value(&menu), 90);
    }

    #[test]
    fn volume_commits_on_confirm_only() {
        let mut rig = rig();
        let mut cx = rig.cx(Instant::from_ticks(0));
        let mut menu = Menu::open(&mut cx);
        choose(&mut menu, MainItem::Volume as u16, &mut cx);
        menu.step(3, &mut cx);
        assert_eq!(cx.settings.volume, 12);
        assert_eq!(menu.confirm(&mut cx), MenuOutcome::Stay);
        assert_eq!(menu.depth(), 1);
        drop(cx);
        assert_eq!(rig.settings.volume, 15);
        assert!(rig.module.commands.contains(&crate::mock::Command::SetVolume(15)));
    }

    #[test]
    fn aborting_root_exits() {
        let mut rig = rig();
        let mut cx = rig.cx(Instant::from_ticks(0));
        let mut menu = Menu::open(&mut cx);
        choose(&mut menu, MainItem::Equalizer as u16, &mut cx);
        assert_eq!(menu.abort(&mut cx), MenuOutcome::Stay);
        assert_eq!(menu.abort(&mut cx), MenuOutcome::Exit);
    }

    #[test]
    fn folder_wizard_programs_repeat_one_card() {
        let mut rig = rig();
        let mut cx = rig.cx(Instant::from_ticks(0));
        let mut menu = Menu::open(&mut cx);
        choose(&mut menu, MainItem::FolderCard as u16, &mut cx);
        choose(&mut menu, 4, &mut cx);
        choose(&mut menu, PlaybackMode::RepeatOne as u16, &mut cx);
        assert!(matches!(menu.screen(), Some(Screen::Select { purpose: Purpose::Track, max: 12, .. })));
        choose(&mut menu, 7, &mut cx);
        assert_eq!(menu.screen(), Some(&Screen::WaitForCard { card_ready: false }));
        assert_eq!(menu.depth(), 2);

        // neither confirm nor abort count before a card shows up
        assert_eq!(menu.confirm(&mut cx), MenuOutcome::Stay);
        assert_eq!(menu.abort(&mut cx), MenuOutcome::Stay);
        assert_eq!(menu.screen(), Some(&Screen::WaitForCard { card_ready: false }));

        drop(cx);
        rig.reader.insert([0; 16]);
        let mut cx = rig.cx(Instant::from_ticks(0));
        menu.card_detected(&mut cx);
        assert_eq!(menu.confirm(&mut cx), MenuOutcome::Stay);
        assert_eq!(menu.depth(), 1);
        drop(cx);

        let expected = CardRecord::Folder(FolderCard {
            special: 7,
            ..FolderCard::new(4, PlaybackMode::RepeatOne)
        });
        assert_eq!(rig.reader.written.len(), 1);
        assert_eq!(card::decode(&rig.reader.written[0]), Ok(expected));
        assert!(rig.module.announcements().contains(&Announcement::CardWritten.track()));
    }

    #[test]
    fn album_wizard_skips_track_choice() {
        let mut rig = rig();
        let mut cx = rig.cx(Instant::from_ticks(0));
        let mut menu = Menu::open(&mut cx);
        choose(&mut menu, MainItem::FolderCard as u16, &mut cx);
        choose(&mut menu, 2, &mut cx);
        choose(&mut menu, PlaybackMode::Party as u16, &mut cx);
        assert_eq!(menu.screen(), Some(&Screen::WaitForCard { card_ready: false }));
    }

    #[test]
    fn failed_write_waits_for_another_card() {
        let mut rig = rig();
        rig.reader.insert([0; 16]);
        rig.reader.fail_write = true;
        let mut cx = rig.cx(Instant::from_ticks(0));
        let mut menu = Menu::open(&mut cx);
        choose(&mut menu, MainItem::SpecialCard as u16, &mut cx);
        choose(&mut menu, SpecialCard::Lock as u16, &mut cx);
        menu.card_detected(&mut cx);
        assert_eq!(menu.confirm(&mut cx), MenuOutcome::Stay);
        assert_eq!(menu.screen(), Some(&Screen::WaitForCard { card_ready: false }));
        drop(cx);
        assert!(rig.module.announcements().contains(&Announcement::CardError.track()));
    }

    #[test]
    fn reset_progress_removes_entry() {
        let mut rig = rig();
        rig.settings.save_progress(3, 8);
        let mut cx = rig.cx(Instant::from_ticks(0));
        let mut menu = Menu::open(&mut cx);
        choose(&mut menu, MainItem::ResetProgress as u16, &mut cx);
        choose(&mut menu, 3, &mut cx);
        drop(cx);
        assert_eq!(rig.settings.progress(3), 1);
    }
}
