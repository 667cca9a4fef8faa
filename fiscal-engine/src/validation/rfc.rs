//! RFC syntax
//!
//! Legal entities: 3 letters + YYMMDD + 3 alphanumerics (12 chars).
//! Individuals: 4 letters + YYMMDD + 3 alphanumerics (13 chars).
//! `Ñ` and `&` count as letters in the name part.

/// Generic RFC for domestic sales to the public
pub const RFC_GENERIC_PUBLIC: &str = "XAXX010101000";
/// Generic RFC for foreign receivers
pub const RFC_GENERIC_FOREIGN: &str = "XEXX010101000";

pub fn is_valid_rfc(rfc: &str) -> bool {
    let chars: Vec<char> = rfc.trim().to_uppercase().chars().collect();
    let letters = match chars.len() {
        12 => 3,
        13 => 4,
        _ => return false,
    };

    let (name, rest) = chars.split_at(letters);
    let (date, homoclave) = rest.split_at(6);

    name.iter().all(|c| c.is_ascii_uppercase() || *c == 'Ñ' || *c == '&')
        && date.iter().all(char::is_ascii_digit)
        && is_plausible_date(date)
        && homoclave.iter().all(char::is_ascii_alphanumeric)
}

fn is_plausible_date(date: &[char]) -> bool {
    let number = |a: char, b: char| a.to_digit(10).unwrap_or(0) * 10 + b.to_digit(10).unwrap_or(0);
    let month = number(date[2], date[3]);
    let day = number(date[4], date[5]);
    (1..=12).contains(&month) && (1..=31).contains(&day)
}

pub fn is_generic_public(rfc: &str) -> bool {
    rfc.trim().eq_ignore_ascii_case(RFC_GENERIC_PUBLIC)
}
