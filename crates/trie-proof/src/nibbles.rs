//! Nibble paths and the hex-prefix encoding used by trie nodes.

/// Expands bytes into their high/low nibbles.
pub(crate) fn to_nibbles(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().flat_map(|b| [b >> 4, b & 0x0f]).collect()
}

/// A decoded hex-prefix path of a leaf or extension node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CompactPath {
    pub(crate) nibbles: Vec<u8>,
    pub(crate) is_leaf: bool,
}

/// Decodes a hex-prefix encoded path.
///
/// The high nibble of the first byte carries the flags: bit 1 marks a leaf, bit 0 an odd number
/// of path nibbles (in which case the low nibble of the first byte is the first path nibble).
pub(crate) fn decode_compact(encoded: &[u8]) -> Option<CompactPath> {
    let (first, rest) = encoded.split_first()?;
    let flag = first >> 4;
    if flag > 3 {
        return None;
    }

    let is_leaf = flag & 2 != 0;
    let odd = flag & 1 != 0;

    let mut nibbles = Vec::with_capacity(rest.len() * 2 + 1);
    if odd {
        nibbles.push(first & 0x0f);
    } else if first & 0x0f != 0 {
        // padding nibble must be zero
        return None;
    }
    nibbles.extend(to_nibbles(rest));

    Some(CompactPath { nibbles, is_leaf })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_nibbles() {
        assert_eq!(to_nibbles(&[0x12, 0xab]), vec![1, 2, 0xa, 0xb]);
        assert!(to_nibbles(&[]).is_empty());
    }

    #[test]
    fn test_decode_compact() {
        // even extension
        assert_eq!(
            decode_compact(&[0x00, 0x12]),
            Some(CompactPath { nibbles: vec![1, 2], is_leaf: false })
        );
        // odd extension
        assert_eq!(
            decode_compact(&[0x11, 0x23]),
            Some(CompactPath { nibbles: vec![1, 2, 3], is_leaf: false })
        );
        // even leaf with empty path
        assert_eq!(
            decode_compact(&[0x20]),
            Some(CompactPath { nibbles: vec![], is_leaf: true })
        );
        // odd leaf
        assert_eq!(
            decode_compact(&[0x3f]),
            Some(CompactPath { nibbles: vec![0xf], is_leaf: true })
        );
    }

    #[test]
    fn test_decode_compact_rejects_bad_flags() {
        assert_eq!(decode_compact(&[]), None);
        assert_eq!(decode_compact(&[0x40]), None);
        assert_eq!(decode_compact(&[0x01]), None);
    }
}
