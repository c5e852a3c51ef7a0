use rand::Rng;

use super::Scope;
use crate::dice;
use crate::error::{ExprError, ExprResult};

/// Evaluate a value expression: a sum of terms with implicit addition.
///
/// Terms are integers, `rnd<n>` rolls, or attribute keys (0 when unset).
/// Terms are separated by whitespace or by a sign; `+` is ignored and `-`
/// negates the term that follows. `str rnd6 -2` and `str+rnd6-2` are the
/// same sum.
pub fn evaluate_sum<S, R>(source: &str, scope: &S, rng: &mut R) -> ExprResult<i64>
where
    S: Scope + ?Sized,
    R: Rng + ?Sized,
{
    let mut total: i64 = 0;
    let mut negative = false;

    for word in source.split_whitespace() {
        let mut rest = word;
        while let Some(c) = rest.chars().next() {
            match c {
                '+' => {
                    rest = &rest[1..];
                    continue;
                }
                '-' => {
                    negative = !negative;
                    rest = &rest[1..];
                    continue;
                }
                _ => {}
            }
            let end = rest.find(['+', '-']).unwrap_or(rest.len());
            let value = term(&rest[..end], scope, rng)?;
            let value = if negative {
                value.checked_neg().ok_or(ExprError::Overflow)?
            } else {
                value
            };
            negative = false;
            total = total.checked_add(value).ok_or(ExprError::Overflow)?;
            rest = &rest[end..];
        }
    }

    Ok(total)
}

fn term<S, R>(token: &str, scope: &S, rng: &mut R) -> ExprResult<i64>
where
    S: Scope + ?Sized,
    R: Rng + ?Sized,
{
    if let Some(sides) = dice::parse_dice(token) {
        return dice::roll(rng, sides?);
    }
    if token.bytes().all(|b| b.is_ascii_digit()) {
        return token.parse().map_err(|_| ExprError::Overflow);
    }
    Ok(scope.attribute(&token.to_lowercase()).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    struct Stats;

    impl Scope for Stats {
        fn attribute(&self, key: &str) -> Option<i64> {
            match key {
                "str" => Some(10),
                "dex" => Some(4),
                _ => None,
            }
        }

        fn has_item(&self, _name: &str) -> bool {
            true
        }
    }

    fn sum(source: &str) -> ExprResult<i64> {
        let mut rng = StdRng::seed_from_u64(9);
        evaluate_sum(source, &Stats, &mut rng)
    }

    #[test]
    fn sums_terms() {
        assert_eq!(sum("10"), Ok(10));
        assert_eq!(sum("str dex 1"), Ok(15));
        assert_eq!(sum("str + dex"), Ok(14));
        assert_eq!(sum(""), Ok(0));
    }

    #[test]
    fn signs_negate_following_term() {
        assert_eq!(sum("str - 3"), Ok(7));
        assert_eq!(sum("-5"), Ok(-5));
        assert_eq!(sum("str-1"), Ok(9));
        assert_eq!(sum("- - 2"), Ok(2));
    }

    #[test]
    fn unknown_terms_are_zero() {
        assert_eq!(sum("luck + 2"), Ok(2));
        assert_eq!(sum("Str"), Ok(10));
    }

    #[test]
    fn dice_terms_roll() {
        for _ in 0..20 {
            let value = sum("RND6 + 6").unwrap();
            assert!((7..=12).contains(&value));
        }
    }

    #[test]
    fn faults() {
        assert_eq!(sum("rnd0"), Err(ExprError::InvalidDice(0)));
        assert_eq!(sum("99999999999999999999"), Err(ExprError::Overflow));
        assert_eq!(
            sum("9223372036854775807 1"),
            Err(ExprError::Overflow)
        );
    }
}
