use crate::hal::flash::{self, WriteErase};
use log::{error, info};
use rfid_jukebox::peripherals::NvStore;

pub const PAGE_SIZE: usize = 2048;
const FLASH_PAGE_ID: usize = 127;
/// Double words programmed per flash write.
const CHUNK_WORDS: usize = 32;

/// Settings page in the last flash page.
///
/// Reads and updates go to a RAM mirror of the page; `commit` erases and
/// reprograms the page when the mirror changed.
pub struct FlashStore {
    sr: flash::SR,
    cr: flash::CR,
    keyr: flash::KEYR,
    mirror: [u8; PAGE_SIZE],
    dirty: bool,
}

impl FlashStore {
    pub fn new(keyr: flash::KEYR, sr: flash::SR, cr: flash::CR) -> Self {
        let address = flash::FlashPage(FLASH_PAGE_ID).to_address();
        let mirror = unsafe { core::ptr::read(address as *const [u8; PAGE_SIZE]) };
        Self {
            sr,
            cr,
            keyr,
            mirror,
            dirty: false,
        }
    }

    fn program(&mut self) -> Result<(), flash::Error> {
        let mut prog = self.keyr.unlock_flash(&mut self.sr, &mut self.cr)?;
        let page = flash::FlashPage(FLASH_PAGE_ID);
        prog.erase_page(page)?;
        let mut words = [0u64; CHUNK_WORDS];
        for (index, chunk) in self.mirror.chunks(CHUNK_WORDS * 8).enumerate() {
            for (word, bytes) in words.iter_mut().zip(chunk.chunks(8)) {
                let mut quad = [0xffu8; 8];
                quad[..bytes.len()].copy_from_slice(bytes);
                *word = u64::from_le_bytes(quad);
            }
            prog.write_native(page.to_address() + index * CHUNK_WORDS * 8, &words)?;
        }
        Ok(())
    }
}

impl NvStore for FlashStore {
    fn read(&mut self, offset: usize) -> u8 {
        self.mirror.get(offset).copied().unwrap_or(0xff)
    }

    fn update(&mut self, offset: usize, value: u8) {
        if let Some(byte) = self.mirror.get_mut(offset) {
            if *byte != value {
                *byte = value;
                self.dirty = true;
            }
        }
    }

    fn commit(&mut self) {
        if !self.dirty {
            return;
        }
        match self.program() {
            Ok(()) => {
                info!("Settings page written");
                self.dirty = false;
            }
            Err(err) => error!("Error writing settings page: {:?}", err),
        }
    }
}
