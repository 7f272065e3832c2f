/// Certificate id formatting.
///
/// Raw token ids are numeric; callers see them as padded certificate
/// numbers, e.g. token 42 becomes `VTC-000042` or `VTC-2026-000042`.

const PREFIX: &str = "VTC-";
const INVALID: &str = "VTC-INVALID";

pub fn format_certificate_id(token_id: i64) -> String {
    if token_id <= 0 {
        return INVALID.to_string();
    }
    format!("{}{:06}", PREFIX, token_id)
}

pub fn format_with_year(token_id: i64, year: i32) -> String {
    if token_id <= 0 {
        return INVALID.to_string();
    }
    format!("{}{}-{:06}", PREFIX, year, token_id)
}

/// Parses a formatted certificate id back to its token id. Accepts both the
/// standard and the year-prefixed form.
pub fn parse_token_id(formatted: &str) -> Option<i64> {
    let rest = formatted.strip_prefix(PREFIX)?;
    let numeric = rest.rsplit('-').next()?;
    match numeric.parse::<i64>() {
        Ok(id) if id > 0 => Some(id),
        _ => None,
    }
}
