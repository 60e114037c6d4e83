//! Canonical form for city names.
//!
//! Every city name that enters the system (explicit city creation, rename,
//! connection endpoints, search terms) passes through [`normalize_city_name`]
//! before it is compared or stored.

/// Uppercase the first character and lowercase the rest.
///
/// Callers trim and reject blank input first; an empty string is returned
/// unchanged. Only ASCII letters change case.
///
/// ```
/// use airfare::normalize::normalize_city_name;
///
/// assert_eq!(normalize_city_name("mUMBAI"), "Mumbai");
/// assert_eq!(normalize_city_name("new delhi"), "New delhi");
/// ```
pub fn normalize_city_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => {
            let mut normalized = String::with_capacity(name.len());
            normalized.push(first.to_ascii_uppercase());
            normalized.extend(chars.map(|c| c.to_ascii_lowercase()));
            normalized
        }
        None => String::new(),
    }
}

/// Trim `raw` and normalize it, or `None` when nothing is left.
pub fn normalize_required(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(normalize_city_name(trimmed))
    }
}
