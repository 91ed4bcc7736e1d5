//! Boundaries to the hardware collaborators.
//!
//! The firmware implements these traits on top of the board support crates;
//! tests implement them with recording doubles.

/// Size of one block on the card.
pub const BLOCK_SIZE: usize = 16;

/// Raw content of the card's data block.
pub type Block = [u8; BLOCK_SIZE];

/// Equalizer presets of the decoder module.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Equalizer {
    Normal = 0,
    Pop = 1,
    Rock = 2,
    Jazz = 3,
    Classic = 4,
    Bass = 5,
}

impl Equalizer {
    pub const LAST: u8 = Equalizer::Bass as u8;

    /// Preset for a stored index. Unknown indices fall back to `Normal`.
    pub fn from_index(index: u8) -> Self {
        match index {
            1 => Equalizer::Pop,
            2 => Equalizer::Rock,
            3 => Equalizer::Jazz,
            4 => Equalizer::Classic,
            5 => Equalizer::Bass,
            _ => Equalizer::Normal,
        }
    }
}

/// Asynchronous reports of the decoder module.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notification {
    /// The given track ran to its end.
    TrackFinished(u16),
    /// The module reported an error code.
    Error(u8),
}

/// Serial MP3 decoder module.
///
/// Commands are fire and forget; failures to send are the adapter's business.
pub trait DecoderModule {
    fn play_folder_track(&mut self, folder: u8, track: u8);
    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);
    fn set_volume(&mut self, volume: u8);
    fn increase_volume(&mut self);
    fn decrease_volume(&mut self);
    fn set_equalizer(&mut self, equalizer: Equalizer);
    /// Number of tracks in `folder`, 0 when the folder is missing or the query failed.
    fn folder_track_count(&mut self, folder: u8) -> u16;
    /// Play a spoken prompt from the module's announcement folder.
    fn play_announcement(&mut self, track: u16);
    /// State of the module's busy line.
    fn is_playing(&mut self) -> bool;
    /// Next queued notification, if any.
    fn poll_notification(&mut self) -> Option<Notification>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportError {
    NoCard,
    Authentication,
    Read,
    Write,
}

/// Contactless card reader, authenticated against the fixed sector with the fixed key.
pub trait CardTransport {
    /// Non-blocking presence probe.
    fn card_present(&mut self) -> bool;
    fn read_block(&mut self) -> Result<Block, TransportError>;
    fn write_block(&mut self, block: &Block) -> Result<(), TransportError>;
    fn power_down(&mut self);
}

/// Byte addressable non-volatile memory.
pub trait NvStore {
    fn read(&mut self, offset: usize) -> u8;
    /// Writes `value` only when it differs from the stored byte.
    fn update(&mut self, offset: usize, value: u8);
    /// Makes the updates durable. Stores that write through need nothing here.
    fn commit(&mut self) {}
}

/// Status light of the box.
pub trait StatusIndicator {
    fn set(&mut self, on: bool);
    fn toggle(&mut self);
    fn battery_low(&mut self, low: bool);
}
