use std::net::{SocketAddr, ToSocketAddrs};

use crate::error::ServerError;

/// Convert a byte slice into a string.
/// Includes printable ASCII characters as-is.
/// Converts non-printable or non-ASCII characters to strings like "\n" and "\x19".
///
/// Uses
/// [`core::ascii::escape_default`](https://doc.rust-lang.org/core/ascii/fn.escape_default.html)
/// internally to escape each byte.
///
/// This function is useful for printing byte slices to logs and comparing byte slices in tests.
#[must_use]
pub fn escape_ascii(input: &[u8]) -> String {
    let mut result = String::new();
    for byte in input {
        for ascii_byte in core::ascii::escape_default(*byte) {
            result.push(char::from(ascii_byte));
        }
    }
    result
}

#[must_use]
pub fn escape_and_elide(input: &[u8], max_len: usize) -> String {
    if input.len() > max_len {
        escape_ascii(&input[..max_len]) + "..."
    } else {
        escape_ascii(input)
    }
}

pub fn find_slice<T: std::cmp::PartialEq>(needle: &[T], haystack: &[T]) -> Option<usize> {
    if needle.len() <= haystack.len() {
        for n in 0..=(haystack.len() - needle.len()) {
            if &haystack[n..(n + needle.len())] == needle {
                return Some(n);
            }
        }
    }
    None
}

/// Resolves a `host:port` string to the first socket address the OS resolver returns.
///
/// # Errors
/// Returns [`ServerError::InvalidAddress`] when `address` is empty, malformed,
/// or resolves to nothing.
pub fn resolve_address(address: &str) -> Result<SocketAddr, ServerError> {
    let invalid = || ServerError::InvalidAddress {
        address: address.to_string(),
    };
    if address.trim().is_empty() {
        return Err(invalid());
    }
    address
        .to_socket_addrs()
        .map_err(|_| invalid())?
        .next()
        .ok_or_else(invalid)
}
