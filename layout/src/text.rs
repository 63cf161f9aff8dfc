//! NUL-terminated character buffer helpers.

/// Reads a C string from a fixed buffer: up to the first NUL or the end.
///
/// Invalid UTF-8 is replaced rather than rejected.
#[must_use]
pub fn read_c_str(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Packs a string into a zero-filled buffer of exactly `length` bytes.
///
/// Longer input is truncated; no terminator is reserved.
#[must_use]
pub fn write_fixed(value: &str, length: usize) -> Vec<u8> {
    let mut buf = vec![0u8; length];
    let src = truncate_at_nul(value).as_bytes();
    let n = src.len().min(length);
    buf[..n].copy_from_slice(&src[..n]);
    buf
}

/// Returns the prefix of `value` before the first NUL.
#[must_use]
pub fn truncate_at_nul(value: &str) -> &str {
    value.find('\0').map_or(value, |end| &value[..end])
}
