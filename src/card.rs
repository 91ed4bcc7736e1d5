//! Binary layout of the data block on RFID cards.
//!
//! ```text
//! current:  cookie[0..4] version[4] kind[5] folder[6] mode[7] special[8] special2[9]
//!                                           special-mode[6]
//! legacy:   cookie[0..4] version[4] folder[5] mode[6] special[7] special2[8]
//! ```
//! The rest of the block is zero filled.

use crate::peripherals::{Block, TransportError, BLOCK_SIZE};

pub const CARD_COOKIE: u32 = 0x1337_B347;
pub const CARD_VERSION: u8 = 2;
const LEGACY_VERSION: u8 = 1;

const KIND_NONE: u8 = 0;
const KIND_FOLDER: u8 = 1;
const KIND_SPECIAL: u8 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardError {
    BadCookie,
    UnknownVersion(u8),
    UnknownKind(u8),
    UnknownMode(u8),
    /// An empty record cannot be written.
    Empty,
    Transport(TransportError),
}

impl From<TransportError> for CardError {
    fn from(e: TransportError) -> Self {
        CardError::Transport(e)
    }
}

/// How a folder card walks through its folder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PlaybackMode {
    Album = 2,
    Party = 3,
    RepeatOne = 4,
    AudioBook = 5,
}

impl PlaybackMode {
    pub const FIRST: u8 = PlaybackMode::Album as u8;
    pub const LAST: u8 = PlaybackMode::AudioBook as u8;

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            2 => Some(PlaybackMode::Album),
            3 => Some(PlaybackMode::Party),
            4 => Some(PlaybackMode::RepeatOne),
            5 => Some(PlaybackMode::AudioBook),
            _ => None,
        }
    }
}

/// System command carried by a special card.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum SpecialCard {
    Admin = 1,
    Lock = 2,
    Unlock = 3,
}

impl SpecialCard {
    pub const FIRST: u8 = SpecialCard::Admin as u8;
    pub const LAST: u8 = SpecialCard::Unlock as u8;

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(SpecialCard::Admin),
            2 => Some(SpecialCard::Lock),
            3 => Some(SpecialCard::Unlock),
            _ => None,
        }
    }
}

/// Folder to play and how. `special` is the track for [`PlaybackMode::RepeatOne`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FolderCard {
    pub folder: u8,
    pub mode: PlaybackMode,
    pub special: u8,
    pub special2: u8,
}

impl FolderCard {
    pub fn new(folder: u8, mode: PlaybackMode) -> Self {
        Self {
            folder,
            mode,
            special: 0,
            special2: 0,
        }
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, CardError> {
        let mode = PlaybackMode::from_byte(bytes[1]).ok_or(CardError::UnknownMode(bytes[1]))?;
        Ok(Self {
            folder: bytes[0],
            mode,
            special: bytes[2],
            special2: bytes[3],
        })
    }

    fn to_bytes(&self) -> [u8; 4] {
        [self.folder, self.mode as u8, self.special, self.special2]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardRecord {
    None,
    Folder(FolderCard),
    Special(SpecialCard),
}

pub fn decode(block: &Block) -> Result<CardRecord, CardError> {
    let cookie = u32::from_be_bytes([block[0], block[1], block[2], block[3]]);
    if cookie != CARD_COOKIE {
        return Err(CardError::BadCookie);
    }
    match block[4] {
        CARD_VERSION => match block[5] {
            KIND_NONE => Ok(CardRecord::None),
            KIND_FOLDER => FolderCard::from_bytes(&block[6..10]).map(CardRecord::Folder),
            KIND_SPECIAL => SpecialCard::from_byte(block[6])
                .map(CardRecord::Special)
                .ok_or(CardError::UnknownMode(block[6])),
            kind => Err(CardError::UnknownKind(kind)),
        },
        LEGACY_VERSION => FolderCard::from_bytes(&block[5..9]).map(CardRecord::Folder),
        version => Err(CardError::UnknownVersion(version)),
    }
}

pub fn encode(record: &CardRecord) -> Result<Block, CardError> {
    let mut block = [0u8; BLOCK_SIZE];
    block[0..4].copy_from_slice(&CARD_COOKIE.to_be_bytes());
    block[4] = CARD_VERSION;
    match record {
        CardRecord::None => return Err(CardError::Empty),
        CardRecord::Folder(folder) => {
            block[5] = KIND_FOLDER;
            block[6..10].copy_from_slice(&folder.to_bytes());
        }
        CardRecord::Special(special) => {
            block[5] = KIND_SPECIAL;
            block[6] = *special as u8;
        }
    }
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn block(bytes: &[u8]) -> Block {
        let mut block = [0u8; BLOCK_SIZE];
        block[..bytes.len()].copy_from_slice(bytes);
        block
    }

    #[test]
    fn encodes_folder_layout() {
        let card = CardRecord::Folder(FolderCard {
            folder: 3,
            mode: PlaybackMode::RepeatOne,
            special: 7,
            special2: 9,
        });
        let raw = encode(&card).unwrap();
        assert_eq!(raw, block(&[0x13, 0x37, 0xb3, 0x47, 2, 1, 3, 4, 7, 9]));
    }

    #[test]
    fn encodes_special_layout() {
        let raw = encode(&CardRecord::Special(SpecialCard::Unlock)).unwrap();
        assert_eq!(raw, block(&[0x13, 0x37, 0xb3, 0x47, 2, 2, 3]));
    }

    #[test]
    fn empty_record_is_not_encodable() {
        assert_eq!(encode(&CardRecord::None), Err(CardError::Empty));
    }

    #[test]
    fn decodes_legacy_layout_as_folder() {
        let raw = block(&[0x13, 0x37, 0xb3, 0x47, 1, 8, 5, 0, 0]);
        assert_eq!(
            decode(&raw),
            Ok(CardRecord::Folder(FolderCard::new(8, PlaybackMode::AudioBook)))
        );
    }

    #[test]
    fn rejects_foreign_blocks() {
        assert_eq!(decode(&block(&[0xde, 0xad, 0xbe, 0xef, 2, 1, 1, 2])), Err(CardError::BadCookie));
        assert_eq!(decode(&block(&[0x13, 0x37, 0xb3, 0x47, 9, 1, 1, 2])), Err(CardError::UnknownVersion(9)));
        assert_eq!(decode(&block(&[0x13, 0x37, 0xb3, 0x47, 2, 7])), Err(CardError::UnknownKind(7)));
        assert_eq!(decode(&block(&[0x13, 0x37, 0xb3, 0x47, 2, 1, 1, 42])), Err(CardError::UnknownMode(42)));
        assert_eq!(decode(&block(&[0x13, 0x37, 0xb3, 0x47, 2, 2, 0])), Err(CardError::UnknownMode(0)));
    }

    #[test]
    fn blank_kind_decodes_to_none() {
        assert_eq!(decode(&block(&[0x13, 0x37, 0xb3, 0x47, 2, 0])), Ok(CardRecord::None));
    }

    fn any_record() -> impl Strategy<Value = CardRecord> {
        let mode = (PlaybackMode::FIRST..=PlaybackMode::LAST).prop_map(|b| PlaybackMode::from_byte(b).unwrap());
        let folder = (any::<u8>(), mode, any::<u8>(), any::<u8>()).prop_map(|(folder, mode, special, special2)| {
            CardRecord::Folder(FolderCard {
                folder,
                mode,
                special,
                special2,
            })
        });
        let special = (SpecialCard::FIRST..=SpecialCard::LAST)
            .prop_map(|b| CardRecord::Special(SpecialCard::from_byte(b).unwrap()));
        prop_oneof![folder, special]
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(record in any_record()) {
            let raw = encode(&record).unwrap();
            prop_assert_eq!(decode(&raw), Ok(record));
        }
    }
}
