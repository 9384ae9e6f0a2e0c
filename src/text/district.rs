/// Districts of Đà Nẵng recognized by keyword match, lowercase
///
/// The list is curated so that no entry is a substring of another, which is
/// what makes "first match wins" unambiguous.
pub const DISTRICTS: &[&str] = &[
    "hải châu",
    "thanh khê",
    "sơn trà",
    "ngũ hành sơn",
    "cẩm lệ",
    "liên chiểu",
    "hòa vang",
];

/// Detects a district name in free text
///
/// Matching is case-insensitive containment against [`DISTRICTS`]. The matched
/// name is returned in title case, or an empty string when nothing matches.
///
/// # Examples
///
/// ```
/// use cheap_home::text::detect_district;
///
/// assert_eq!(detect_district("Kiệt 12 Ngô Quyền, SƠN TRÀ"), "Sơn Trà");
/// assert_eq!(detect_district("Quận 1, TP.HCM"), "");
/// ```
pub fn detect_district(raw: &str) -> String {
    let lowered = raw.to_lowercase();

    DISTRICTS
        .iter()
        .find(|district| lowered.contains(*district))
        .map(|district| title_case(district))
        .unwrap_or_default()
}

fn title_case(name: &str) -> String {
    name.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_lowercase_mention() {
        assert_eq!(detect_district("phòng trọ gần biển sơn trà"), "Sơn Trà");
    }

    #[test]
    fn test_multi_word_title_case() {
        assert_eq!(detect_district("đường lê văn hiến, ngũ hành sơn"), "Ngũ Hành Sơn");
        assert_eq!(detect_district("Hòa Vang"), "Hòa Vang");
    }

    #[test]
    fn test_first_whitelisted_entry_wins() {
        assert_eq!(detect_district("Cẩm Lệ giáp Hải Châu"), "Hải Châu");
    }

    #[test]
    fn test_no_match_is_empty() {
        assert_eq!(detect_district(""), "");
        assert_eq!(detect_district("Hà Nội"), "");
    }
}
