//! Fixed-capacity names.

use arrayvec::ArrayString;

/// Copy as many whole characters of `s` as fit in `N` bytes.
pub fn fit<const N: usize>(s: &str) -> ArrayString<N> {
    let mut out = ArrayString::new();
    for c in s.chars() {
        if out.try_push(c).is_err() {
            break;
        }
    }
    out
}
