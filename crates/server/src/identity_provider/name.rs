/// Splits a display name into `(given, family)`.
///
/// The first whitespace-separated word is the given name; the remaining words,
/// re-joined with single spaces, form the family name. A missing or blank name
/// yields two empty strings.
pub fn split_full_name(full_name: Option<&str>) -> (String, String) {
    let mut words = full_name.unwrap_or_default().split_whitespace();
    let given = words.next().unwrap_or_default().to_string();
    let family = words.collect::<Vec<_>>().join(" ");
    (given, family)
}
