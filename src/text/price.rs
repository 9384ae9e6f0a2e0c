use regex::Regex;
use std::sync::OnceLock;

const MILLION_MARKER: &str = "triệu";
const THOUSAND_MARKERS: &[&str] = &["k", "nghìn"];

fn mention_regexes() -> &'static [(Regex, f64)] {
    static MENTIONS: OnceLock<Vec<(Regex, f64)>> = OnceLock::new();
    MENTIONS.get_or_init(|| {
        [
            (r"(?i)(\d+(?:[.,]\d+)*)\s*(?:triệu|tr)\b", 1_000_000.0),
            (r"(?i)(\d+(?:[.,]\d+)*)\s*(?:nghìn|ngàn|k)\b", 1_000.0),
            (r"(?i)(\d[\d.,]*)\s*(?:vnđ|vnd|đồng|đ)\b", 1.0),
            (r"(\d{4,})", 1.0),
        ]
        .into_iter()
        .filter_map(|(pattern, multiplier)| Regex::new(pattern).ok().map(|re| (re, multiplier)))
        .collect()
    })
}

fn area_regex() -> Option<&'static Regex> {
    static AREA: OnceLock<Option<Regex>> = OnceLock::new();
    AREA
        .get_or_init(|| Regex::new(r"(?i)([0-9]+(?:[.,][0-9]+)?)\s*(?:m²|m2)").ok())
        .as_ref()
}

/// Parses a free-text price into whole VND
///
/// # Rules
///
/// 1. Lowercase the input and take the first numeric token (`[0-9][0-9.,]*`)
/// 2. If the text contains `triệu` the amount is in millions; if it contains
///    `k` or `nghìn` it is in thousands; otherwise it is already VND
/// 3. `.` and `,` are grouping punctuation and are stripped. The single
///    exception: a scaled amount whose only separator is followed by one or
///    two digits (`2.5 triệu`, `1,5tr`) treats that separator as a decimal point
///
/// Returns 0 when no numeric token exists.
///
/// # Examples
///
/// ```
/// use cheap_home::text::parse_price;
///
/// assert_eq!(parse_price("2.5 triệu/tháng"), 2_500_000);
/// assert_eq!(parse_price("800k"), 800_000);
/// assert_eq!(parse_price("1500000"), 1_500_000);
/// assert_eq!(parse_price("2.000.000 đ"), 2_000_000);
/// assert_eq!(parse_price("Thỏa thuận"), 0);
/// ```
pub fn parse_price(raw: &str) -> i64 {
    let cleaned = raw.to_lowercase();

    let token = match first_numeric_token(&cleaned) {
        Some(token) => token,
        None => return 0,
    };

    let multiplier: f64 = if cleaned.contains(MILLION_MARKER) {
        1_000_000.0
    } else if THOUSAND_MARKERS.iter().any(|m| cleaned.contains(m)) {
        1_000.0
    } else {
        1.0
    };

    let amount = if multiplier > 1.0 {
        parse_scaled_token(token)
    } else {
        parse_grouped_token(token)
    };

    match amount {
        Some(value) => (value * multiplier).round() as i64,
        None => 0,
    }
}

/// Extracts a floor area in square meters (`25 m²`, `30m2`)
///
/// # Examples
///
/// ```
/// use cheap_home::text::parse_area;
///
/// assert_eq!(parse_area("Diện tích: 25 m²"), Some(25.0));
/// assert_eq!(parse_area("không rõ"), None);
/// ```
pub fn parse_area(raw: &str) -> Option<f64> {
    let captures = area_regex()?.captures(raw)?;
    captures[1].replace(',', ".").parse().ok()
}

/// Scans free-form post text for a price mention
///
/// Social posts mix prices with phone numbers and dates, so a bare first
/// number is unreliable. Patterns are tried in order: millions (`triệu`,
/// `tr`), thousands (`nghìn`, `ngàn`, `k`), explicit currency (`vnđ`, `đ`),
/// then any run of four or more digits.
///
/// # Examples
///
/// ```
/// use cheap_home::text::find_price_mention;
///
/// assert_eq!(find_price_mention("Phòng 25m2, giá 2tr LH 0905"), Some(2_000_000));
/// assert_eq!(find_price_mention("Cho thuê phòng 1,8 triệu/tháng"), Some(1_800_000));
/// assert_eq!(find_price_mention("Liên hệ chủ nhà"), None);
/// ```
pub fn find_price_mention(text: &str) -> Option<i64> {
    mention_regexes().iter().find_map(|(re, multiplier)| {
        let token = re.captures(text)?.get(1)?.as_str();
        let value = if *multiplier > 1.0 {
            parse_scaled_token(token)?
        } else {
            parse_grouped_token(token)?
        };
        Some((value * multiplier).round() as i64).filter(|price| *price > 0)
    })
}

/// Finds the first `[0-9][0-9.,]*` run, without trailing separators
fn first_numeric_token(text: &str) -> Option<&str> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let rest = &text[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
        .unwrap_or(rest.len());

    Some(rest[..end].trim_end_matches(['.', ',']))
}

fn parse_grouped_token(token: &str) -> Option<f64> {
    let digits: String = token.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

fn parse_scaled_token(token: &str) -> Option<f64> {
    let separators: Vec<usize> = token
        .char_indices()
        .filter(|(_, c)| *c == '.' || *c == ',')
        .map(|(i, _)| i)
        .collect();

    if let [only] = separators.as_slice() {
        let fraction = &token[only + 1..];
        if (1..=2).contains(&fraction.len()) {
            let whole = &token[..*only];
            return format!("{}.{}", whole, fraction).parse().ok();
        }
    }

    parse_grouped_token(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_million_marker() {
        assert_eq!(parse_price("3 triệu"), 3_000_000);
        assert_eq!(parse_price("Giá: 2.5 Triệu/tháng"), 2_500_000);
        assert_eq!(parse_price("1,5 triệu"), 1_500_000);
    }

    #[test]
    fn test_thousand_markers() {
        assert_eq!(parse_price("800k"), 800_000);
        assert_eq!(parse_price("500 nghìn"), 500_000);
    }

    #[test]
    fn test_plain_amount_strips_grouping() {
        assert_eq!(parse_price("1500000"), 1_500_000);
        assert_eq!(parse_price("1.500.000đ"), 1_500_000);
        assert_eq!(parse_price("2,000,000 VND"), 2_000_000);
    }

    #[test]
    fn test_scaled_grouping_is_not_decimal() {
        // three digits after the separator means grouping, not a fraction
        assert_eq!(parse_price("1.200 k"), 1_200_000);
    }

    #[test]
    fn test_first_token_wins() {
        assert_eq!(parse_price("2 triệu, cọc 1 tháng"), 2_000_000);
    }

    #[test]
    fn test_non_numeric_is_zero() {
        assert_eq!(parse_price(""), 0);
        assert_eq!(parse_price("Liên hệ"), 0);
    }

    #[test]
    fn test_trailing_separator_ignored() {
        assert_eq!(parse_price("Giá 3.500.000."), 3_500_000);
    }

    #[test]
    fn test_price_mention_prefers_scaled_amounts() {
        assert_eq!(
            find_price_mention("LH 0905123456, phòng 3 triệu"),
            Some(3_000_000)
        );
        assert_eq!(find_price_mention("giá 900k bao điện nước"), Some(900_000));
        assert_eq!(find_price_mention("giá 2.500.000đ"), Some(2_500_000));
        assert_eq!(find_price_mention("giá 1500000"), Some(1_500_000));
        assert_eq!(find_price_mention("phòng đẹp gần biển"), None);
    }

    #[test]
    fn test_parse_area_variants() {
        assert_eq!(parse_area("30m2"), Some(30.0));
        assert_eq!(parse_area("22,5 m²"), Some(22.5));
        assert_eq!(parse_area("25 M2"), Some(25.0));
    }
}
