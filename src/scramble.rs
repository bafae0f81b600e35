//! Format-preserving scramble functions.
//!
//! Every function is pure for a given [`Salt`]: the same input always maps to
//! the same output within a run, and nothing here performs I/O. Callers are
//! expected to skip empty values and the `\N` NULL marker before calling in.

use crate::salt::Salt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Output alphabet of [`scramble_bytes`]. None of these bytes is special in
/// COPY text format, so scrambled values never need escaping.
pub const ALPHABET: &[u8; 65] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ+-_";

/// Domain appended to every scrambled mailbox.
pub const EMAIL_DOMAIN: &[u8] = b"@example.com";

/// E.164 caps a phone number at 15 digits.
pub const PHONE_MAX_DIGITS: usize = 15;
pub const PHONE_DEFAULT_DIGITS: usize = 10;

/// Length-preserving scramble over [`ALPHABET`].
pub fn scramble_bytes(salt: &Salt, s: &[u8]) -> Vec<u8> {
    let hash = salt.digest(s);
    s.iter()
        .enumerate()
        .map(|(i, &b)| {
            let idx = (hash[i % hash.len()] as usize + b as usize) % ALPHABET.len();
            ALPHABET[idx]
        })
        .collect()
}

/// [`scramble_bytes`] truncated to at most `max_len` bytes.
pub fn scramble_bytes_bounded(salt: &Salt, s: &[u8], max_len: usize) -> Vec<u8> {
    let mut out = scramble_bytes(salt, s);
    out.truncate(max_len);
    out
}

/// Replace every ASCII digit, keep every other byte where it is.
///
/// The hash byte and the digit byte are summed modulo 256, then reduced to a
/// decimal digit.
pub fn scramble_digits(salt: &Salt, s: &[u8]) -> Vec<u8> {
    let hash = salt.digest(s);
    s.iter()
        .enumerate()
        .map(|(i, &b)| {
            if b.is_ascii_digit() {
                b'0' + hash[i % hash.len()].wrapping_add(b) % 10
            } else {
                b
            }
        })
        .collect()
}

/// Scramble a single address or a `{a,b,...}` array literal of addresses.
pub fn scramble_email(salt: &Salt, s: &[u8]) -> Vec<u8> {
    match s {
        [b'{', inner @ .., b'}'] => {
            let mut out = Vec::with_capacity(s.len() + EMAIL_DOMAIN.len());
            out.push(b'{');
            if !inner.is_empty() {
                for (i, element) in inner.split(|&b| b == b',').enumerate() {
                    if i > 0 {
                        out.push(b',');
                    }
                    out.extend(scramble_address(salt, element));
                }
            }
            out.push(b'}');
            out
        }
        _ => scramble_address(salt, s),
    }
}

fn scramble_address(salt: &Salt, s: &[u8]) -> Vec<u8> {
    let mailbox = match s.iter().position(|&b| b == b'@') {
        Some(at) if at > 0 => &s[..at],
        _ => salt.as_bytes(),
    };
    let mut out = scramble_bytes(salt, mailbox);
    out.extend_from_slice(EMAIL_DOMAIN);
    out
}

/// Replace the value with an unrelated IPv4 or IPv6 literal.
pub fn scramble_inet(salt: &Salt, s: &[u8]) -> Vec<u8> {
    let hash = salt.digest(s);
    let rendered = if hash[0] & 0x80 == 0 {
        Ipv4Addr::new(hash[0], hash[1], hash[2], hash[3]).to_string()
    } else {
        let mut octets = [0u8; 16];
        octets.copy_from_slice(&hash[..16]);
        Ipv6Addr::from(octets).to_string()
    };
    rendered.into_bytes()
}

/// Clean international number: `+` and hash-derived digits, punctuation dropped.
pub fn scramble_phone(salt: &Salt, s: &[u8]) -> Vec<u8> {
    let hash = salt.digest(s);
    let digits = match s.iter().filter(|b| b.is_ascii_digit()).count() {
        0 => PHONE_DEFAULT_DIGITS,
        n => n.min(PHONE_MAX_DIGITS),
    };
    let mut out = Vec::with_capacity(digits + 1);
    out.push(b'+');
    out.extend((0..digits).map(|i| b'0' + hash[i % hash.len()] % 10));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn salt() -> Salt {
        Salt::from_bytes(b"test-salt".to_vec()).unwrap()
    }

    #[test]
    fn test_scramble_bytes_preserves_length() {
        let input = b"pbkdf2_sha256$10000$qweqweqweqwe$cThxOHE4";
        let out = scramble_bytes(&salt(), input);
        assert_eq!(out.len(), input.len());
        assert_ne!(&out[..], &input[..]);
        assert!(out.iter().all(|b| ALPHABET.contains(b)));
    }

    #[test]
    fn test_scramble_bytes_is_deterministic_per_salt() {
        let a = scramble_bytes(&salt(), b"whoisthere");
        let b = scramble_bytes(&salt(), b"whoisthere");
        let other = Salt::from_bytes(b"other-salt".to_vec()).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, scramble_bytes(&other, b"whoisthere"));
    }

    #[test]
    fn test_scramble_bytes_bounded() {
        let out = scramble_bytes_bounded(&salt(), b"a-very-long-password-hash", 7);
        assert_eq!(out.len(), 7);
        assert_eq!(&out[..], &scramble_bytes(&salt(), b"a-very-long-password-hash")[..7]);

        let short = scramble_bytes_bounded(&salt(), b"abc", 7);
        assert_eq!(short.len(), 3);
    }

    #[test]
    fn test_scramble_digits_keeps_punctuation() {
        let input = "+7(876) 123-0011 или 99999999999;".as_bytes();
        let out = scramble_digits(&salt(), input);
        assert_eq!(out.len(), input.len());
        for (a, b) in input.iter().zip(out.iter()) {
            if a.is_ascii_digit() {
                assert!(b.is_ascii_digit());
            } else {
                assert_eq!(a, b);
            }
        }
        assert_ne!(out, input);
        assert_eq!(out, "+1(584) 047-9250 или 22280031035;".as_bytes());
    }

    #[test]
    fn test_scramble_email_single() {
        let out = scramble_email(&salt(), b"noreply@bing.com");
        assert!(out.ends_with(EMAIL_DOMAIN));
        assert_eq!(out.len(), "noreply".len() + EMAIL_DOMAIN.len());
        assert!(!out.starts_with(b"noreply"));
    }

    #[test]
    fn test_scramble_email_without_at_uses_salt() {
        let s = salt();
        let out = scramble_email(&s, b"not-an-email");
        let mut expected = scramble_bytes(&s, s.as_bytes());
        expected.extend_from_slice(EMAIL_DOMAIN);
        assert_eq!(out, expected);
        assert_eq!(out, scramble_email(&s, b"something-else"));
    }

    #[test]
    fn test_scramble_email_array() {
        let s = salt();
        let out = scramble_email(&s, b"{a@x.com,b@y.com}");
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with('{') && text.ends_with('}'));
        let elements: Vec<&str> = text[1..text.len() - 1].split(',').collect();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].as_bytes(), &scramble_email(&s, b"a@x.com")[..]);
        assert_eq!(elements[1].as_bytes(), &scramble_email(&s, b"b@y.com")[..]);
        assert_eq!(scramble_email(&s, b"{}"), b"{}");
    }

    #[test]
    fn test_scramble_inet_is_valid_address() {
        for input in ["10.0.0.1", "::1", "192.168.1.0/24", "fe80::1"] {
            let out = scramble_inet(&salt(), input.as_bytes());
            let text = String::from_utf8(out).unwrap();
            assert!(text.parse::<std::net::IpAddr>().is_ok(), "{}", text);
        }
    }

    #[test]
    fn test_scramble_inet_family_follows_hash() {
        let s = salt();
        let input = b"127.0.0.1";
        let text = String::from_utf8(scramble_inet(&s, input)).unwrap();
        let ip: std::net::IpAddr = text.parse().unwrap();
        assert_eq!(ip.is_ipv4(), s.digest(input)[0] & 0x80 == 0);
    }

    #[test]
    fn test_scramble_phone() {
        let out = scramble_phone(&salt(), b"+7 (499) 100-20-00");
        assert_eq!(out[0], b'+');
        assert_eq!(out.len(), 1 + 11);
        assert!(out[1..].iter().all(u8::is_ascii_digit));

        let no_digits = scramble_phone(&salt(), b"unknown");
        assert_eq!(no_digits.len(), 1 + PHONE_DEFAULT_DIGITS);

        let long = scramble_phone(&salt(), "1".repeat(40).as_bytes());
        assert_eq!(long.len(), 1 + PHONE_MAX_DIGITS);
    }
}
