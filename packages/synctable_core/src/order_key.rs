//! Fractional order keys
//!
//! Row ids double as sort keys. A key is an *integer part* followed by an
//! optional *fraction part*, both written in base-62 digits `0-9A-Za-z`, so
//! plain byte-wise string comparison gives the row order.
//!
//! The head character of the integer part encodes its length: `a`..`z`
//! cover 2..27 characters on the positive side, `A`..`Z` cover 27..2
//! characters on the negative side. Appending and prepending walk the
//! integer space; inserting between two neighbours that share an integer
//! part grows the fraction, which never runs out of room.

use thiserror::Error;

/// A row identifier that is also its position.
pub type OrderKey = String;

/// The key handed out when there are no neighbours at all.
pub const INITIAL_KEY: &str = "a0";

const DIGITS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const BASE: usize = 62;
const ZERO: u8 = b'0';

// "A" followed by 26 zeros: the lowest integer, never a key on its own.
const SMALLEST_INTEGER: &str = "A00000000000000000000000000";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderKeyError {
    #[error("Invalid key range: {before:?} is not below {after:?}")]
    InvalidRange { before: String, after: String },

    #[error("Invalid order key: {0:?}")]
    InvalidKey(String),

    #[error("Order key space exhausted next to {0:?}")]
    Exhausted(String),
}

fn digit_index(c: u8) -> Option<usize> {
    match c {
        b'0'..=b'9' => Some((c - b'0') as usize),
        b'A'..=b'Z' => Some((c - b'A') as usize + 10),
        b'a'..=b'z' => Some((c - b'a') as usize + 36),
        _ => None,
    }
}

fn integer_length(head: u8) -> Option<usize> {
    match head {
        b'a'..=b'z' => Some((head - b'a') as usize + 2),
        b'A'..=b'Z' => Some((b'Z' - head) as usize + 2),
        _ => None,
    }
}

/// Split a key into its integer and fraction parts, checking its shape.
fn split(key: &str) -> Result<(&str, &str), OrderKeyError> {
    let invalid = || OrderKeyError::InvalidKey(key.to_string());

    if !key.bytes().all(|c| digit_index(c).is_some()) {
        return Err(invalid());
    }
    let head = *key.as_bytes().first().ok_or_else(invalid)?;
    let len = integer_length(head).ok_or_else(invalid)?;
    if len > key.len() {
        return Err(invalid());
    }
    Ok(key.split_at(len))
}

/// Check that `key` could have been produced by [`generate`].
pub fn validate(key: &str) -> Result<(), OrderKeyError> {
    if key == SMALLEST_INTEGER {
        return Err(OrderKeyError::InvalidKey(key.to_string()));
    }
    let (_, fraction) = split(key)?;
    if fraction.as_bytes().last() == Some(&ZERO) {
        return Err(OrderKeyError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// A digit string strictly between fractions `a` and `b` (`b = None` is +1).
///
/// Both inputs are digit strings without trailing zeros and `a < b`.
fn midpoint(a: &[u8], b: Option<&[u8]>) -> Vec<u8> {
    if let Some(b) = b {
        // Shared prefix, treating a missing digit of `a` as zero
        let mut n = 0;
        while n < b.len() && a.get(n).copied().unwrap_or(ZERO) == b[n] {
            n += 1;
        }
        if n > 0 {
            let mut out = b[..n].to_vec();
            out.extend(midpoint(a.get(n..).unwrap_or(&[]), Some(&b[n..])));
            return out;
        }
    }

    let digit_a = a.first().and_then(|&c| digit_index(c)).unwrap_or(0);
    let digit_b = match b {
        Some(b) => b.first().and_then(|&c| digit_index(c)).unwrap_or(BASE),
        None => BASE,
    };

    if digit_b - digit_a > 1 {
        vec![DIGITS[(digit_a + digit_b + 1) / 2]]
    } else if let Some(b) = b.filter(|b| b.len() > 1) {
        vec![b[0]]
    } else {
        let mut out = vec![DIGITS[digit_a]];
        out.extend(midpoint(a.get(1..).unwrap_or(&[]), None));
        out
    }
}

fn increment_integer(x: &str) -> Option<String> {
    let bytes = x.as_bytes();
    let head = bytes[0];
    let mut digs = bytes[1..].to_vec();

    let mut carry = true;
    for d in digs.iter_mut().rev() {
        let next = digit_index(*d).unwrap_or(0) + 1;
        if next == BASE {
            *d = ZERO;
        } else {
            *d = DIGITS[next];
            carry = false;
            break;
        }
    }

    if carry {
        if head == b'Z' {
            return Some(INITIAL_KEY.to_string());
        }
        if head == b'z' {
            return None;
        }
        let h = head + 1;
        if h > b'a' {
            digs.push(ZERO);
        } else {
            digs.pop();
        }
        return Some(assemble(h, &digs));
    }
    Some(assemble(head, &digs))
}

fn decrement_integer(x: &str) -> Option<String> {
    let bytes = x.as_bytes();
    let head = bytes[0];
    let mut digs = bytes[1..].to_vec();
    let max_digit = DIGITS[BASE - 1];

    let mut borrow = true;
    for d in digs.iter_mut().rev() {
        match digit_index(*d).unwrap_or(0) {
            0 => *d = max_digit,
            v => {
                *d = DIGITS[v - 1];
                borrow = false;
                break;
            }
        }
    }

    if borrow {
        if head == b'a' {
            return Some(assemble(b'Z', &[max_digit]));
        }
        if head == b'A' {
            return None;
        }
        let h = head - 1;
        if h < b'Z' {
            digs.push(max_digit);
        } else {
            digs.pop();
        }
        return Some(assemble(h, &digs));
    }
    Some(assemble(head, &digs))
}

fn assemble(head: u8, digits: &[u8]) -> String {
    let mut out = String::with_capacity(digits.len() + 1);
    out.push(head as char);
    out.extend(digits.iter().map(|&d| d as char));
    out
}

fn join(integer: &str, fraction: Vec<u8>) -> String {
    let mut out = integer.to_string();
    out.extend(fraction.into_iter().map(|d| d as char));
    out
}

/// Mint a key between two neighbours.
///
/// - `(None, None)` returns [`INITIAL_KEY`]
/// - `(Some(a), None)` returns a key above `a`
/// - `(None, Some(b))` returns a key below `b`
/// - `(Some(a), Some(b))` returns a key strictly between, and fails with
///   [`OrderKeyError::InvalidRange`] unless `a < b`
pub fn generate(before: Option<&str>, after: Option<&str>) -> Result<OrderKey, OrderKeyError> {
    if let Some(a) = before {
        validate(a)?;
    }
    if let Some(b) = after {
        validate(b)?;
    }

    match (before, after) {
        (Some(a), Some(b)) if a >= b => Err(OrderKeyError::InvalidRange {
            before: a.to_string(),
            after: b.to_string(),
        }),
        (None, None) => Ok(INITIAL_KEY.to_string()),
        (None, Some(b)) => {
            let (ib, fb) = split(b)?;
            if ib == SMALLEST_INTEGER {
                return Ok(join(ib, midpoint(&[], Some(fb.as_bytes()))));
            }
            if ib.len() < b.len() {
                // `b` carries a fraction, so its bare integer part sorts below it
                return Ok(ib.to_string());
            }
            decrement_integer(ib).ok_or_else(|| OrderKeyError::Exhausted(b.to_string()))
        }
        (Some(a), None) => {
            let (ia, fa) = split(a)?;
            Ok(increment_integer(ia).unwrap_or_else(|| join(ia, midpoint(fa.as_bytes(), None))))
        }
        (Some(a), Some(b)) => {
            let (ia, fa) = split(a)?;
            let (ib, fb) = split(b)?;
            if ia == ib {
                return Ok(join(ia, midpoint(fa.as_bytes(), Some(fb.as_bytes()))));
            }
            let next = increment_integer(ia).ok_or_else(|| OrderKeyError::Exhausted(a.to_string()))?;
            if next.as_str() < b {
                Ok(next)
            } else {
                Ok(join(ia, midpoint(fa.as_bytes(), None)))
            }
        }
    }
}

/// Mint `n` ascending keys between two neighbours.
///
/// With both neighbours given the keys are spread by bisection, so the
/// resulting keys stay short; at an open end they are consecutive.
pub fn generate_n(
    before: Option<&str>,
    after: Option<&str>,
    n: usize,
) -> Result<Vec<OrderKey>, OrderKeyError> {
    match n {
        0 => return Ok(Vec::new()),
        1 => return Ok(vec![generate(before, after)?]),
        _ => {}
    }

    match (before, after) {
        (_, None) => {
            let mut keys = Vec::with_capacity(n);
            let mut current = generate(before, None)?;
            for _ in 1..n {
                let next = generate(Some(&current), None)?;
                keys.push(std::mem::replace(&mut current, next));
            }
            keys.push(current);
            Ok(keys)
        }
        (None, Some(b)) => {
            let mut keys = Vec::with_capacity(n);
            let mut current = generate(None, Some(b))?;
            for _ in 1..n {
                let next = generate(None, Some(&current))?;
                keys.push(std::mem::replace(&mut current, next));
            }
            keys.push(current);
            keys.reverse();
            Ok(keys)
        }
        (Some(a), Some(b)) => {
            let mid = n / 2;
            let pivot = generate(Some(a), Some(b))?;
            let mut keys = generate_n(Some(a), Some(&pivot), mid)?;
            keys.push(pivot.clone());
            keys.extend(generate_n(Some(&pivot), Some(b), n - mid - 1)?);
            Ok(keys)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn between(a: Option<&str>, b: Option<&str>) -> String {
        generate(a, b).unwrap()
    }

    #[test]
    fn test_initial_and_open_ends() {
        assert_eq!(between(None, None), "a0");
        assert_eq!(between(Some("a0"), None), "a1");
        assert_eq!(between(Some("a1"), None), "a2");
        assert_eq!(between(None, Some("a0")), "Zz");
        assert_eq!(between(Some("az"), None), "b00");
        assert_eq!(between(None, Some("b00")), "az");
        assert_eq!(between(Some("Zz"), None), "a0");
    }

    #[test]
    fn test_between_neighbours() {
        assert_eq!(between(Some("a0"), Some("a1")), "a0V");
        assert_eq!(between(Some("a0"), Some("a2")), "a1");
        assert_eq!(between(Some("a0V"), Some("a1")), "a0l");
        assert_eq!(between(Some("Zz"), Some("a0")), "ZzV");
        assert_eq!(between(Some("a0"), Some("a0V")), "a0G");
        assert_eq!(between(None, Some("a0V")), "a0");
    }

    #[test]
    fn test_invalid_range() {
        let err = generate(Some("a1"), Some("a0")).unwrap_err();
        assert!(matches!(err, OrderKeyError::InvalidRange { .. }));

        let err = generate(Some("a1"), Some("a1")).unwrap_err();
        assert!(matches!(err, OrderKeyError::InvalidRange { .. }));
    }

    #[test]
    fn test_invalid_keys_rejected() {
        for bad in ["", "a", "a10", "1", "a:0", SMALLEST_INTEGER, "b0"] {
            assert!(validate(bad).is_err(), "{:?} should be rejected", bad);
        }
        for good in ["a0", "Zz", "a0V", "b00", "A000000000000000000000000001"] {
            assert!(validate(good).is_ok(), "{:?} should be accepted", good);
        }
    }

    #[test]
    fn test_below_smallest_integer_uses_fraction() {
        let lowest = format!("{}1", SMALLEST_INTEGER);
        let below = between(None, Some(&lowest));
        assert!(below < lowest);
        assert!(below.starts_with(SMALLEST_INTEGER));
    }

    #[test]
    fn test_nested_insertion_never_collides() {
        let mut low = between(None, None);
        let mut high = between(Some(&low), None);

        for i in 0..1000 {
            let mid = between(Some(&low), Some(&high));
            assert!(low < mid && mid < high, "iteration {}", i);
            if i % 2 == 0 {
                low = mid;
            } else {
                high = mid;
            }
        }
    }

    #[test]
    fn test_repeated_insert_before_same_key() {
        let anchor = between(None, None);
        let upper = between(Some(&anchor), None);
        let mut current = upper.clone();

        for _ in 0..500 {
            let next = between(Some(&anchor), Some(&current));
            assert!(anchor < next && next < current);
            current = next;
        }
    }

    #[test]
    fn test_generate_n() {
        let keys = generate_n(None, None, 5).unwrap();
        assert_eq!(keys, vec!["a0", "a1", "a2", "a3", "a4"]);

        let keys = generate_n(None, Some("a0"), 3).unwrap();
        assert_eq!(keys.len(), 3);
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
        assert!(keys[2].as_str() < "a0");

        let keys = generate_n(Some("a0"), Some("a1"), 10).unwrap();
        assert_eq!(keys.len(), 10);
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
        assert!(keys[0].as_str() > "a0" && keys[9].as_str() < "a1");
    }
}
