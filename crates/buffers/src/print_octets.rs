//! Hex dumps for logs and test expectations.

/// Formats bytes as lowercase hex grouped in 4-byte words, the way FBE
/// payloads are usually read (one word per length, count or pointer).
///
/// At most `max` bytes are shown; the remainder is summarized.
///
/// ```
/// use fbe_buffers::print_octets;
///
/// assert_eq!(print_octets(&[0x2a, 0, 0, 0, 6, 0], 16), "2a000000 0600");
/// assert_eq!(print_octets(&[1, 2, 3, 4, 5], 4), "01020304 ... (1 more)");
/// assert_eq!(print_octets(&[], 16), "");
/// ```
pub fn print_octets(octets: &[u8], max: usize) -> String {
    let shown = &octets[..octets.len().min(max)];
    let mut result = shown
        .chunks(4)
        .map(hex)
        .collect::<Vec<_>>()
        .join(" ");
    if octets.len() > max {
        result.push_str(&format!(" ... ({} more)", octets.len() - max));
    }
    result
}

/// Formats bytes as contiguous lowercase hex.
///
/// ```
/// use fbe_buffers::hex;
///
/// assert_eq!(hex(&[0x45, 0x55, 0x52]), "455552");
/// ```
pub fn hex(octets: &[u8]) -> String {
    octets.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_octets_words() {
        let data: Vec<u8> = (0..10).collect();
        assert_eq!(print_octets(&data, 16), "00010203 04050607 0809");
    }

    #[test]
    fn test_print_octets_truncated() {
        let data: Vec<u8> = (0..20).collect();
        assert!(print_octets(&data, 8).ends_with("... (12 more)"));
    }

    #[test]
    fn test_hex_empty() {
        assert_eq!(hex(&[]), "");
    }
}
