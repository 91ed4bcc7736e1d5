//! Spoken prompts stored in the decoder module's announcement folder.
//!
//! Tracks `1..=255` of that folder speak their own number; the prompts
//! follow from track 300 on.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Announcement {
    Number(u8),
    AdminMenu,
    MainMenuItems,
    ChooseVolume,
    ChooseMinVolume,
    ChooseMaxVolume,
    ChooseEqualizer,
    ChooseFolder,
    ChoosePlaybackMode,
    ChooseTrack,
    ChooseSpecialCard,
    ResetProgress,
    WaitForCard,
    ConfirmWrite,
    CardWritten,
    CardError,
    Cancelled,
    Locked,
    Unlocked,
    EmptyFolder,
}

impl Announcement {
    /// Track number inside the announcement folder.
    pub fn track(self) -> u16 {
        match self {
            Announcement::Number(n) => u16::from(n),
            Announcement::AdminMenu => 300,
            Announcement::MainMenuItems => 301,
            Announcement::ChooseVolume => 302,
            Announcement::ChooseMinVolume => 303,
            Announcement::ChooseMaxVolume => 304,
            Announcement::ChooseEqualizer => 305,
            Announcement::ChooseFolder => 306,
            Announcement::ChoosePlaybackMode => 307,
            Announcement::ChooseTrack => 308,
            Announcement::ChooseSpecialCard => 309,
            Announcement::ResetProgress => 310,
            Announcement::WaitForCard => 311,
            Announcement::ConfirmWrite => 312,
            Announcement::CardWritten => 313,
            Announcement::CardError => 314,
            Announcement::Cancelled => 315,
            Announcement::Locked => 316,
            Announcement::Unlocked => 317,
            Announcement::EmptyFolder => 318,
        }
    }
}
