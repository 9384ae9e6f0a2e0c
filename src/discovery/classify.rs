use crate::model::Source;
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

fn group_path_regex() -> Option<&'static Regex> {
    static GROUP: OnceLock<Option<Regex>> = OnceLock::new();
    GROUP.get_or_init(|| Regex::new(r"^/groups/\d+").ok()).as_ref()
}

/// Maps a search result link to the adapter that can crawl it
///
/// | Host (without `www.`) contains | Source |
/// |---|---|
/// | `phongtro123.com` | `phongtro123` |
/// | `batdongsan.com.vn` | `batdongsan` |
/// | `chotot.com` | `chotot` |
/// | `facebook.com`, path `/groups/<digits>` | `facebook_group_pw` |
///
/// Anything else (including unparseable links) is `None`.
///
/// # Examples
///
/// ```
/// use cheap_home::discovery::classify_link;
/// use cheap_home::Source;
///
/// assert_eq!(
///     classify_link("https://www.batdongsan.com.vn/cho-thue-nha-tro-da-nang"),
///     Some(Source::Batdongsan)
/// );
/// assert_eq!(classify_link("https://example.com/phong-tro"), None);
/// ```
pub fn classify_link(link: &str) -> Option<Source> {
    let url = Url::parse(link).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    if host.contains("phongtro123.com") {
        Some(Source::Phongtro123)
    } else if host.contains("batdongsan.com.vn") {
        Some(Source::Batdongsan)
    } else if host.contains("chotot.com") {
        Some(Source::Chotot)
    } else if host.contains("facebook.com") && group_path_regex().is_some_and(|re| re.is_match(url.path())) {
        Some(Source::FacebookGroupPw)
    } else {
        None
    }
}
