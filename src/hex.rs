use core::fmt;

const HEX_CHARS_UPPER: &[u8; 16] = b"0123456789ABCDEF";

fn byte2hex(byte: u8) -> (u8, u8) {
    let high = HEX_CHARS_UPPER[((byte & 0xf0) >> 4) as usize];
    let low = HEX_CHARS_UPPER[(byte & 0x0f) as usize];

    (high, low)
}

/// Formats raw bytes as space separated upper case hex, for logging card blocks.
pub struct Hex<'a>(pub &'a [u8]);

impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            let (high, low) = byte2hex(*byte);
            write!(f, "{}{}", high as char, low as char)?;
        }
        Ok(())
    }
}
