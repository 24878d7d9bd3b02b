//! Outer RIFF/WAVE header layout.
//!
//! Offset | Size | Field
//! -----: | ---: | ---------------------------------------------
//!      0 |    4 | `RIFF`
//!      4 |    4 | declared size, little-endian, counts from offset 8
//!      8 |    4 | `WAVE`
//!
//! Nothing past these 12 bytes is interpreted.

/// Leading tag of every RIFF container.
pub const RIFF_TAG: [u8; 4] = *b"RIFF";

/// Form type identifying a WAVE file inside a RIFF container.
pub const WAVE_TAG: [u8; 4] = *b"WAVE";

/// Bytes that follow the leading tag: size field plus form type.
pub const HEADER_TAIL_LEN: usize = 8;

/// Size field and form type read right after a `RIFF` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiffHeader {
    size_field: [u8; 4],
    form_type: [u8; 4],
}

impl RiffHeader {
    #[must_use]
    pub fn from_tail(tail: [u8; HEADER_TAIL_LEN]) -> Self {
        let [s0, s1, s2, s3, f0, f1, f2, f3] = tail;
        Self {
            size_field: [s0, s1, s2, s3],
            form_type: [f0, f1, f2, f3],
        }
    }

    /// Raw size field exactly as found in the source.
    #[inline]
    #[must_use]
    pub fn size_field(&self) -> [u8; 4] {
        self.size_field
    }

    #[inline]
    #[must_use]
    pub fn form_type(&self) -> [u8; 4] {
        self.form_type
    }

    #[inline]
    #[must_use]
    pub fn is_wave(&self) -> bool {
        self.form_type == WAVE_TAG
    }

    #[inline]
    #[must_use]
    pub fn declared_size(&self) -> u32 {
        u32::from_le_bytes(self.size_field)
    }

    /// Bytes still to copy after the form type, or `None` when the declared
    /// size cannot even cover the form type.
    #[inline]
    #[must_use]
    pub fn payload_len(&self) -> Option<u64> {
        u64::from(self.declared_size()).checked_sub(WAVE_TAG.len() as u64)
    }

    /// The 12 header bytes of the reconstructed record.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 12] {
        let mut out = [0u8; 12];
        out[..4].copy_from_slice(&RIFF_TAG);
        out[4..8].copy_from_slice(&self.size_field);
        out[8..].copy_from_slice(&self.form_type);
        out
    }
}
