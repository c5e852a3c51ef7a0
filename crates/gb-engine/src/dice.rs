//! Dice rolls (`rnd<n>`).

use rand::Rng;

use crate::error::{ExprError, ExprResult};

/// Roll a die with `sides` faces: a uniform integer in `[1, sides]`.
pub fn roll<R: Rng + ?Sized>(rng: &mut R, sides: i64) -> ExprResult<i64> {
    if sides < 1 {
        return Err(ExprError::InvalidDice(sides));
    }
    Ok(rng.random_range(1..=sides))
}

/// Recognize a dice word (`rnd6`, case-insensitive) and return its side count.
///
/// Returns `None` when the word is not a dice word at all.
pub fn parse_dice(word: &str) -> Option<ExprResult<i64>> {
    let prefix = word.get(..3)?;
    if !prefix.eq_ignore_ascii_case("rnd") {
        return None;
    }
    let digits = &word[3..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(digits.parse().map_err(|_| ExprError::Overflow))
}
