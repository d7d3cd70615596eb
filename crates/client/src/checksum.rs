//! Rolling checksum used to verify reads against the recorded file CRC.

/// A 32-bit checksum that can be folded chunk by chunk.
///
/// Folding `b` into the result of folding `a` must equal folding `a ++ b`
/// from the same seed, so the engine can checksum a file in whatever chunk
/// sizes the transport hands back.
pub trait ChecksumAlgorithm: Send + Sync {
    /// Extends `crc` with `data` and returns the new running value.
    fn fold(&self, crc: u32, data: &[u8]) -> u32;
}

/// CRC-32 (IEEE 802.3, zlib compatible), the algorithm the TFS writer
/// records in file metadata. The initial running value is `0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc32;

impl ChecksumAlgorithm for Crc32 {
    fn fold(&self, crc: u32, data: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new_with_initial(crc);
        hasher.update(data);
        hasher.finalize()
    }
}

/// Computes the CRC-32 of `data` in one pass.
pub fn checksum(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_check_value() {
        assert_eq!(checksum(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn empty_input_keeps_seed() {
        assert_eq!(Crc32.fold(0, b""), 0);
        assert_eq!(Crc32.fold(0x1234_5678, b""), 0x1234_5678);
    }

    #[test]
    fn folding_is_chunk_independent() {
        let data: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        let whole = checksum(&data);

        for chunk in [1, 7, 64, 4096, 10_000] {
            let folded = data.chunks(chunk).fold(0, |crc, c| Crc32.fold(crc, c));
            assert_eq!(folded, whole, "chunk size {chunk}");
        }
    }

    #[test]
    fn single_byte_flip_changes_checksum() {
        let mut data = b"The quick brown fox jumps over the lazy dog".to_vec();
        let before = checksum(&data);
        data[10] ^= 0x01;
        assert_ne!(checksum(&data), before);
    }
}
