//! `{key}` attribute placeholders in narrative text.

use crate::expr::Scope;

/// Replace each `{key}` with the attribute's current value.
///
/// Unknown keys and unclosed braces are left as written.
pub fn substitute<S: Scope + ?Sized>(text: &str, scope: &S) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            rest = &rest[open..];
            break;
        };
        let key = after[..close].trim().to_lowercase();
        match scope.attribute(&key) {
            Some(value) if !key.is_empty() => out.push_str(&value.to_string()),
            _ => out.push_str(&rest[open..open + close + 2]),
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}
