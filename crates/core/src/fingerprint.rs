//! Content fingerprint for lesson sources.
//!
//! A fast non-cryptographic hash used to detect that a lesson changed since
//! a session snapshot was taken. Line position is the identity anchor for
//! resuming, so the hash covers every trimmed non-empty line in original
//! order, comment lines included; reordering or editing a comment
//! invalidates a prior snapshot, while inserting blank lines or trailing
//! whitespace does not.

/// djb2 rolling hash folded to 32 bits, rendered as lowercase hex.
#[must_use]
pub fn hash_str(input: &str) -> String {
    let mut hash: i32 = 5381;
    for byte in input.bytes() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_add(hash)
            .wrapping_add(i32::from(byte));
    }
    format!("{:x}", hash.unsigned_abs())
}

/// Fingerprint of a lesson source.
#[must_use]
pub fn fingerprint(content: &str) -> String {
    let normalized: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    hash_str(&normalized.join("\n"))
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable() {
        assert_eq!(hash_str("abc"), hash_str("abc"));
        assert_ne!(hash_str("abc"), hash_str("abd"));
    }

    #[test]
    fn empty_input_hashes_to_seed() {
        assert_eq!(hash_str(""), format!("{:x}", 5381));
    }

    #[test]
    fn blank_lines_and_trailing_whitespace_do_not_matter() {
        let a = "hond, dog\nkat, cat\n";
        let b = "\nhond, dog   \n\n\nkat, cat\n\n";
        assert_eq!(fingerprint(a), fingerprint(b));
    }

    #[test]
    fn line_order_matters() {
        let a = "hond, dog\nkat, cat";
        let b = "kat, cat\nhond, dog";
        assert_ne!(fingerprint(a), fingerprint(b));
    }

    #[test]
    fn comment_lines_are_covered() {
        let a = "#question1=Translate \"\"\nhond, dog";
        let b = "#question1=Say \"\"\nhond, dog";
        assert_ne!(fingerprint(a), fingerprint(b));
    }
}
