// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Decoding of fixed-width bit-vector numerals into bit strings.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LiteralError {
    #[error("numeral `{0}` does not start with `#b` or `#x`")]
    Prefix(String),
    #[error("numeral `{token}` contains invalid digit `{digit}`")]
    Digit { token: String, digit: char },
    #[error("numeral `{0}` has no digits")]
    Empty(String),
    #[error("numeral `{token}` has {found} bits but its sort has {declared}")]
    Width {
        token: String,
        declared: u32,
        found: usize,
    },
}

/// Converts `#b...` or `#x...` into a string of `0`/`1` characters, most significant bit first.
///
/// Binary numerals must match `declared_width` exactly. Hexadecimal numerals
/// expand each digit to four bits and their width is taken as given.
pub fn decode(token: &str, declared_width: u32) -> Result<String, LiteralError> {
    if let Some(digits) = token.strip_prefix("#b") {
        if digits.is_empty() {
            return Err(LiteralError::Empty(token.to_string()));
        }
        if let Some(digit) = digits.chars().find(|c| !matches!(c, '0' | '1')) {
            return Err(LiteralError::Digit {
                token: token.to_string(),
                digit,
            });
        }
        if digits.len() != declared_width as usize {
            return Err(LiteralError::Width {
                token: token.to_string(),
                declared: declared_width,
                found: digits.len(),
            });
        }
        Ok(digits.to_string())
    } else if let Some(digits) = token.strip_prefix("#x") {
        if digits.is_empty() {
            return Err(LiteralError::Empty(token.to_string()));
        }
        let mut bits = String::with_capacity(digits.len() * 4);
        for c in digits.chars() {
            let nibble = c.to_digit(16).ok_or_else(|| LiteralError::Digit {
                token: token.to_string(),
                digit: c,
            })?;
            bits.push_str(&format!("{nibble:04b}"));
        }
        Ok(bits)
    } else {
        Err(LiteralError::Prefix(token.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_numerals() {
        assert_eq!(decode("#b0101", 4).unwrap(), "0101");
        assert!(matches!(
            decode("#b0101", 5),
            Err(LiteralError::Width { found: 4, .. })
        ));
        assert!(matches!(
            decode("#b0121", 4),
            Err(LiteralError::Digit { digit: '2', .. })
        ));
    }

    #[test]
    fn hex_numerals() {
        assert_eq!(decode("#xA5", 8).unwrap(), "10100101");
        assert_eq!(decode("#x0f", 8).unwrap(), "00001111");
        assert!(decode("#xg0", 8).is_err());
    }

    #[test]
    fn malformed_tokens() {
        assert_eq!(decode("5", 4), Err(LiteralError::Prefix("5".to_string())));
        assert_eq!(decode("#b", 0), Err(LiteralError::Empty("#b".to_string())));
        assert_eq!(decode("#x", 0), Err(LiteralError::Empty("#x".to_string())));
    }
}
