//! Fixed-width key encoding.
//!
//! Node records have a compile-time-fixed byte layout, so every key type
//! must encode to a fixed number of bytes. [`IndexKey`] is the seam: the
//! tree only needs `Ord` + `Clone`, the file store additionally needs the
//! codec.

use std::fmt::Debug;

/// A key type that can live in a B*-tree node record.
///
/// Encoding must be fixed-width: `encode_into` always writes exactly
/// [`IndexKey::ENCODED_LEN`] bytes and `decode_from` reads them back.
/// Decoding never fails; record integrity is the codec's job (checksums),
/// not the key's.
///
/// Note that byte order here is storage layout only - key comparison uses
/// `Ord` on the decoded value, never the encoded bytes.
pub trait IndexKey: Clone + Ord + Debug {
    /// Number of bytes this key occupies in a record.
    const ENCODED_LEN: usize;

    /// Write the key into `buf`, which is exactly `ENCODED_LEN` bytes.
    fn encode_into(&self, buf: &mut [u8]);

    /// Read a key back from `buf`, which is exactly `ENCODED_LEN` bytes.
    fn decode_from(buf: &[u8]) -> Self;
}

macro_rules! impl_index_key_for_int {
    ($($ty:ty),*) => {
        $(
            impl IndexKey for $ty {
                const ENCODED_LEN: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn encode_into(&self, buf: &mut [u8]) {
                    buf.copy_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn decode_from(buf: &[u8]) -> Self {
                    let mut bytes = [0u8; std::mem::size_of::<$ty>()];
                    bytes.copy_from_slice(buf);
                    <$ty>::from_le_bytes(bytes)
                }
            }
        )*
    };
}

impl_index_key_for_int!(u8, u16, u32, u64, i32, i64);

impl IndexKey for char {
    const ENCODED_LEN: usize = 4;

    #[inline]
    fn encode_into(&self, buf: &mut [u8]) {
        buf.copy_from_slice(&(*self as u32).to_le_bytes());
    }

    #[inline]
    fn decode_from(buf: &[u8]) -> Self {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(buf);
        // A non-scalar value can only appear through file corruption that
        // slipped past the checksum; map it to the replacement character.
        char::from_u32(u32::from_le_bytes(bytes)).unwrap_or(char::REPLACEMENT_CHARACTER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip<K: IndexKey>(key: K) -> K {
        let mut buf = vec![0u8; K::ENCODED_LEN];
        key.encode_into(&mut buf);
        K::decode_from(&buf)
    }

    #[test]
    fn test_integer_roundtrip() {
        assert_eq!(roundtrip(0u8), 0);
        assert_eq!(roundtrip(u64::MAX), u64::MAX);
        assert_eq!(roundtrip(-12345i32), -12345);
        assert_eq!(roundtrip(i64::MIN), i64::MIN);
    }

    #[test]
    fn test_char_roundtrip() {
        assert_eq!(roundtrip('a'), 'a');
        assert_eq!(roundtrip('之'), '之');
        assert_eq!(roundtrip('\u{10FFFF}'), '\u{10FFFF}');
    }

    #[test]
    fn test_encoding_is_little_endian() {
        let mut buf = [0u8; 4];
        0x04030201u32.encode_into(&mut buf);
        assert_eq!(buf, [0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_invalid_char_decodes_to_replacement() {
        // 0xD800 is a surrogate, not a scalar value
        let buf = 0xD800u32.to_le_bytes();
        assert_eq!(char::decode_from(&buf), char::REPLACEMENT_CHARACTER);
    }
}
