/// UTF-16LE encodes a candidate, the way NTLM expects its input.
/// Invalid UTF-8 is replaced before encoding.
#[inline]
pub fn utf16_le(candidate: &[u8]) -> Vec<u8> {
    String::from_utf8_lossy(candidate)
        .encode_utf16()
        .flat_map(u16::to_le_bytes)
        .collect()
}
