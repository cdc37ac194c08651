//! Column addressing (A, B, ..., Z, AA, AB, ...)
//!
//! Labels use bijective base-26: there is no zero digit, so `index / 26 - 1`
//! carries into the next letter instead of `index / 26`.

/// Longest label a `usize` index can produce.
const MAX_LABEL_LEN: usize = 14;

/// Convert a zero-based column index to its label (`0 -> "A"`, `26 -> "AA"`).
///
/// Total over all indices; enforcing the format's column limit is up to the caller.
pub fn column_label(index: usize) -> String {
    let mut buffer = Vec::with_capacity(3);
    push_column_label(&mut buffer, index);
    // Only ASCII capitals are ever pushed.
    String::from_utf8(buffer).unwrap_or_default()
}

/// Append the label for a zero-based column index to `buffer` without allocating.
#[inline]
pub fn push_column_label(buffer: &mut Vec<u8>, index: usize) {
    let mut tmp = [0u8; MAX_LABEL_LEN];
    let mut len = 0;
    let mut n = index;
    loop {
        tmp[len] = b'A' + (n % 26) as u8;
        len += 1;
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    for i in (0..len).rev() {
        buffer.push(tmp[i]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels() {
        let expected = [
            (0, "A"),
            (1, "B"),
            (25, "Z"),
            (26, "AA"),
            (27, "AB"),
            (51, "AZ"),
            (52, "BA"),
            (53, "BB"),
            (701, "ZZ"),
            (702, "AAA"),
            (16383, "XFD"),
        ];
        for (index, label) in expected {
            assert_eq!(column_label(index), label, "index {}", index);
        }
    }

    #[test]
    fn test_push_appends() {
        let mut buffer = b"<c r=\"".to_vec();
        push_column_label(&mut buffer, 27);
        assert_eq!(buffer, b"<c r=\"AB");
    }

    #[test]
    fn test_largest_index() {
        let label = column_label(usize::MAX);
        assert!(label.len() <= MAX_LABEL_LEN);
        assert!(label.bytes().all(|b| b.is_ascii_uppercase()));
    }
}
