//! Literal coercion
//!
//! Every bare token is coerced exactly once, when its line is tokenized.
//! Rules, first match wins:
//!
//! 1. `true` / `false` → boolean
//! 2. `-?\d+(\.\d+)?` → number
//! 3. `a|b|c` (every element non-empty) → group, elements coerced recursively
//! 4. `~-?\d+` → relative position
//! 5. a registered [`CustomType`] predicate → that tag
//! 6. otherwise → identifier
//!
//! After coercion, identifiers that belong to a literal class are upgraded
//! to that class's tag: the built-in comparator class first, then classes
//! registered through [`CustomType::literal_class`], latest first.

use crate::memory::value::{CustomType, RawValue, TypeTag, Value};

/// Tokens recognised as comparators by `if` and block continuations
pub const COMPARATORS: &[&str] = &["=", "!=", "<", ">", "in", "!in"];

pub fn coerce_literal(token: &str, types: &[CustomType]) -> Value {
    match token {
        "true" => return Value::boolean(true),
        "false" => return Value::boolean(false),
        _ => {}
    }

    if is_number_literal(token) {
        if let Ok(n) = token.parse::<f64>() {
            return Value::number(n);
        }
    }

    if is_group_literal(token) {
        let items = token
            .split('|')
            .map(|item| coerce_literal(item, types))
            .collect();
        return Value::group(items);
    }

    if let Some(offset) = relpos_offset(token) {
        return Value::relpos(offset);
    }

    if let Some(custom) = types
        .iter()
        .rev()
        .find(|t| !t.literal_class && t.matches(token))
    {
        return Value::custom(token, &custom.name);
    }

    Value::identifier(token)
}

/// Upgrade an identifier to a literal class tag where one applies
pub fn classify(value: Value, types: &[CustomType]) -> Value {
    let kind = match &value.raw {
        RawValue::Identifier(text) if COMPARATORS.contains(&text.as_str()) => TypeTag::Comparator,
        RawValue::Identifier(text) => match types
            .iter()
            .rev()
            .find(|t| t.literal_class && t.matches(text))
        {
            Some(class) => TypeTag::from_name(&class.name),
            None => return value,
        },
        _ => return value,
    };
    Value { kind, ..value }
}

pub fn is_number_literal(token: &str) -> bool {
    let digits = token.strip_prefix('-').unwrap_or(token);
    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (digits, None),
    };
    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    all_digits(whole) && fraction.map_or(true, all_digits)
}

fn is_group_literal(token: &str) -> bool {
    token.contains('|') && token.split('|').all(|item| !item.is_empty())
}

fn relpos_offset(token: &str) -> Option<i64> {
    let rest = token.strip_prefix('~')?;
    let digits = rest.strip_prefix('-').unwrap_or(rest);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}
