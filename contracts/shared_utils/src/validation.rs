//! Input validation.

use soroban_sdk::String;

pub struct Validation;

impl Validation {
    pub fn is_positive(amount: i128) -> bool {
        amount > 0
    }

    pub fn is_in_range(value: u32, min: u32, max: u32) -> bool {
        value >= min && value <= max
    }

    /// Non-empty and at most `max_len` bytes.
    pub fn is_bounded_string(value: &String, max_len: u32) -> bool {
        let len = value.len();
        len > 0 && len <= max_len
    }

    /// Maps a failed check onto the caller's error.
    pub fn ensure<E>(condition: bool, err: E) -> Result<(), E> {
        if condition {
            Ok(())
        } else {
            Err(err)
        }
    }
}
