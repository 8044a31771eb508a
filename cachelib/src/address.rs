use crate::config::CacheConfig;

/// The fields of an address which the cache cares about
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DecodedAddress {
    pub tag: u64,
    pub set_index: usize,
    /// Byte within the block. Never used by the cache, kept for diagnostics
    pub offset: u64,
}

/// Splits addresses into tag, set index and block offset for a fixed geometry
///
/// The shifts and masks are worked out once up front rather than per access. All shifts are
/// logical and checked, so a geometry where `s + b` covers the whole address still decodes
/// (with a tag of 0) instead of overflowing
#[derive(Debug, Copy, Clone)]
pub struct AddressDecoder {
    set_shift: u32,
    tag_shift: u32,
    set_mask: u64,
    offset_mask: u64,
}

impl AddressDecoder {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            set_shift: config.block_bits,
            tag_shift: config.block_bits.saturating_add(config.set_bits),
            set_mask: low_bits_mask(config.set_bits),
            offset_mask: low_bits_mask(config.block_bits),
        }
    }

    /// Decodes an address into its tag, set index and offset
    ///
    /// # Examples
    ///
    /// ```
    /// use cachelib::address::AddressDecoder;
    /// use cachelib::config::CacheConfig;
    /// let decoder = AddressDecoder::new(&CacheConfig::new(4, 1, 4));
    /// let decoded = decoder.decode(0x7ff0_0123);
    /// assert_eq!((decoded.tag, decoded.set_index, decoded.offset), (0x7ff001, 2, 3));
    /// ```
    #[inline]
    pub fn decode(&self, address: u64) -> DecodedAddress {
        DecodedAddress {
            tag: address.checked_shr(self.tag_shift).unwrap_or(0),
            set_index: (address.checked_shr(self.set_shift).unwrap_or(0) & self.set_mask) as usize,
            offset: address & self.offset_mask,
        }
    }
}

/// One-off decode into `(tag, set_index)` for `s` set bits and `b` block bits
///
/// ```
/// use cachelib::address::decode;
/// assert_eq!(decode(0x1234, 0, 0), (0x1234, 0));
/// assert_eq!(decode(u64::MAX, 60, 4), (0, (1 << 60) - 1));
/// ```
pub fn decode(address: u64, set_bits: u32, block_bits: u32) -> (u64, usize) {
    let decoded = AddressDecoder::new(&CacheConfig::new(set_bits, 1, block_bits)).decode(address);
    (decoded.tag, decoded.set_index)
}

fn low_bits_mask(bits: u32) -> u64 {
    1u64.checked_shl(bits).map_or(u64::MAX, |bit| bit - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_set_keeps_everything_above_the_offset_in_the_tag() {
        let decoder = AddressDecoder::new(&CacheConfig::new(0, 4, 3));
        let decoded = decoder.decode(0xffff_ffff_ffff_fffd);
        assert_eq!(decoded.set_index, 0);
        assert_eq!(decoded.tag, 0xffff_ffff_ffff_fffd >> 3);
        assert_eq!(decoded.offset, 5);
    }

    #[test]
    fn high_bit_is_not_sign_extended() {
        let (tag, set) = decode(0x8000_0000_0000_0010, 4, 4);
        assert_eq!(tag, 0x0080_0000_0000_0000);
        assert_eq!(set, 1);
    }

    #[test]
    fn fields_covering_the_whole_address() {
        let decoder = AddressDecoder::new(&CacheConfig::new(32, 1, 32));
        let decoded = decoder.decode(0xdead_beef_0000_0042);
        assert_eq!(decoded.tag, 0);
        assert_eq!(decoded.set_index, 0xdead_beef);
        assert_eq!(decoded.offset, 0x42);

        let decoder = AddressDecoder::new(&CacheConfig::new(0, 1, 63));
        assert_eq!(decoder.decode(u64::MAX).tag, 1);
    }

    #[test]
    fn zero_bit_fields() {
        let decoded = AddressDecoder::new(&CacheConfig::new(0, 1, 0)).decode(1);
        assert_eq!(decoded, DecodedAddress { tag: 1, set_index: 0, offset: 0 });
    }
}
