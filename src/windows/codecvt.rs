//! Conversion between Rust strings and null-terminated wide strings.
use std::ffi::OsStr;
use std::os::windows::ffi::OsStrExt;

/// Convert `s` to a null-terminated wide string.
pub fn str_to_c_wstr(s: &str) -> Vec<u16> {
    OsStr::new(s).encode_wide().chain(std::iter::once(0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminates_with_nul() {
        let w = str_to_c_wstr("ab");
        assert_eq!(w, vec![0x61, 0x62, 0]);
    }

    #[test]
    fn non_bmp_chars_become_surrogate_pairs() {
        let w = str_to_c_wstr("\u{1F600}");
        assert_eq!(w, vec![0xD83D, 0xDE00, 0]);
    }
}
