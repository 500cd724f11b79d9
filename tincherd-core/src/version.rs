//! Natural-order comparison of version tokens.
//!
//! `"1.0.9"` sorts before `"1.0.12"`. Both strings are walked lock-step,
//! partitioned into maximal runs of digits versus non-digits. Digit runs
//! compare as unsigned integers of arbitrary length (leading zeros
//! ignored), non-digit runs compare byte-for-byte. The shorter string
//! sorts first when one side runs out.
//!
//! Callers must treat an absent version as "feature not present" and take
//! the conservative branch themselves; there is no `Option` overload here.

use std::cmp::Ordering;

/// Compare two version tokens in natural order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let mut ia = 0;
    let mut ib = 0;

    while ia < a.len() && ib < b.len() {
        if a[ia].is_ascii_digit() && b[ib].is_ascii_digit() {
            let ra = digit_run(a, ia);
            let rb = digit_run(b, ib);
            match cmp_digit_runs(&a[ia..ra], &b[ib..rb]) {
                Ordering::Equal => {}
                other => return other,
            }
            ia = ra;
            ib = rb;
        } else {
            // Non-digit position on at least one side: byte comparison.
            // A digit meeting a non-digit falls through here too, which
            // orders them by raw byte value like the reference strnatcmp.
            match a[ia].cmp(&b[ib]) {
                Ordering::Equal => {}
                other => return other,
            }
            ia += 1;
            ib += 1;
        }
    }

    (a.len() - ia).cmp(&(b.len() - ib))
}

/// True when `version` sorts strictly after `threshold`.
///
/// This is the shape every feature gate uses: `StrictSubnets` and the
/// primary-only connect policy gate on `> "1.0.12"`, the control-socket
/// PID lookup gates on `> "1.1"`.
pub fn version_newer_than(version: &str, threshold: &str) -> bool {
    natural_cmp(version, threshold) == Ordering::Greater
}

fn digit_run(s: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < s.len() && s[end].is_ascii_digit() {
        end += 1;
    }
    end
}

/// Compare two all-digit byte runs as unsigned integers without parsing:
/// strip leading zeros, then longer run wins, then lexicographic.
fn cmp_digit_runs(a: &[u8], b: &[u8]) -> Ordering {
    let a = strip_leading_zeros(a);
    let b = strip_leading_zeros(b);
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn strip_leading_zeros(s: &[u8]) -> &[u8] {
    let mut i = 0;
    while i + 1 < s.len() && s[i] == b'0' {
        i += 1;
    }
    &s[i..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nine_sorts_before_twelve() {
        assert_eq!(natural_cmp("1.0.9", "1.0.12"), Ordering::Less);
        assert_eq!(natural_cmp("1.0.12", "1.0.9"), Ordering::Greater);
    }

    #[test]
    fn equal_versions_compare_equal() {
        for v in ["1.0.12", "1.1", "2", "1.0.13-git", ""] {
            assert_eq!(natural_cmp(v, v), Ordering::Equal, "cmp({v:?},{v:?})");
        }
    }

    #[test]
    fn leading_zeros_are_ignored() {
        assert_eq!(natural_cmp("1.007", "1.7"), Ordering::Equal);
        assert_eq!(natural_cmp("1.007", "1.8"), Ordering::Less);
    }

    #[test]
    fn shorter_string_sorts_first() {
        assert_eq!(natural_cmp("1.0", "1.0.1"), Ordering::Less);
        assert_eq!(natural_cmp("1.1", "1.1-git"), Ordering::Less);
    }

    #[test]
    fn big_numeric_runs_do_not_overflow() {
        let a = "1.184467440737095516160";
        let b = "1.184467440737095516159";
        assert_eq!(natural_cmp(a, b), Ordering::Greater);
    }

    #[test]
    fn relation_is_antisymmetric_and_transitive() {
        let set = ["1.0.9", "1.0.12", "1.0.13", "1.1", "1.1-git", "2.0"];
        for x in set {
            for y in set {
                let xy = natural_cmp(x, y);
                let yx = natural_cmp(y, x);
                assert_eq!(xy, yx.reverse(), "antisymmetry for ({x},{y})");
                for z in set {
                    if xy == natural_cmp(y, z) {
                        assert_eq!(natural_cmp(x, z), xy, "transitivity for ({x},{y},{z})");
                    }
                }
            }
        }
    }

    #[test]
    fn feature_gate_helper() {
        assert!(version_newer_than("1.0.13", "1.0.12"));
        assert!(version_newer_than("1.0.12-git", "1.0.12"));
        assert!(!version_newer_than("1.0.12", "1.0.12"));
        assert!(!version_newer_than("1.0.9", "1.0.12"));
        assert!(version_newer_than("1.1-git", "1.1"));
    }
}
