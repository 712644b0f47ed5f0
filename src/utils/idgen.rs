//! Short identifier generation.
//!
//! Identifiers are fixed-length strings over a 62-character alphabet, drawn
//! from the OS cryptographic RNG with rejection sampling so every character
//! is uniformly distributed.

use crate::error::AppError;
use serde_json::json;

/// Alphabet for short identifiers.
pub const CHARSET: &[u8; 62] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a generated short identifier.
pub const LENGTH: usize = 8;

// Bytes >= this value would wrap unevenly under `% 62` and are re-drawn.
const REJECT_FROM: u8 = (256u16 - (256u16 % CHARSET.len() as u16)) as u8;

/// Generates a short identifier of [`LENGTH`] characters over [`CHARSET`].
///
/// Uniqueness is not checked here; the storage backends enforce it through
/// their key constraints, and at 62^8 identifiers collisions are negligible.
///
/// # Errors
///
/// Only RNG failures propagate, as [`AppError::Internal`].
pub fn generate_short_id() -> Result<String, AppError> {
    let mut random = [0u8; LENGTH];
    getrandom::fill(&mut random).map_err(|e| {
        AppError::internal(
            "Failed to generate random bytes",
            json!({ "cause": e.to_string() }),
        )
    })?;

    let mut id = String::with_capacity(LENGTH);
    for mut byte in random {
        while byte >= REJECT_FROM {
            let mut redraw = [0u8; 1];
            getrandom::fill(&mut redraw).map_err(|e| {
                AppError::internal(
                    "Failed to generate random bytes",
                    json!({ "cause": e.to_string() }),
                )
            })?;
            byte = redraw[0];
        }
        id.push(CHARSET[(byte % CHARSET.len() as u8) as usize] as char);
    }

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_id_has_correct_length() {
        let id = generate_short_id().unwrap();
        assert_eq!(id.len(), LENGTH);
    }

    #[test]
    fn test_generated_id_uses_charset_only() {
        for _ in 0..1000 {
            let id = generate_short_id().unwrap();
            assert!(id.bytes().all(|b| CHARSET.contains(&b)), "bad id: {id}");
        }
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let mut ids = HashSet::new();
        for _ in 0..10_000 {
            assert!(ids.insert(generate_short_id().unwrap()));
        }
    }

    #[test]
    fn test_character_distribution_is_close_to_uniform() {
        const DRAWS: usize = 200_000;

        let mut counts = [0usize; CHARSET.len()];
        for _ in 0..DRAWS {
            for b in generate_short_id().unwrap().bytes() {
                let idx = CHARSET.iter().position(|&c| c == b).unwrap();
                counts[idx] += 1;
            }
        }

        let expected = (DRAWS * LENGTH) as f64 / CHARSET.len() as f64;
        for (idx, &count) in counts.iter().enumerate() {
            let deviation = (count as f64 - expected).abs() / expected;
            assert!(
                deviation < 0.05,
                "character {} deviates {:.2}% from uniform",
                CHARSET[idx] as char,
                deviation * 100.0
            );
        }
    }
}
