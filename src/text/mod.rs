//! Text normalization for scraped listing fields
//!
//! Every source adapter runs its raw strings through these pure functions:
//! - whitespace normalization
//! - price parsing into whole VND
//! - district detection against the Đà Nẵng whitelist
//! - floor-area extraction

mod district;
mod normalize;
mod price;

pub use district::{detect_district, DISTRICTS};
pub use normalize::{normalize_text, truncate_chars};
pub use price::{find_price_mention, parse_area, parse_price};
