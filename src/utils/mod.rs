//! Utility modules shared by the adapters.
//!
//! - [`HttpClient`]: one reqwest client per adapter with the shared status policy
//! - [`RateLimiter`]: minimum-interval throttle over an injectable [`Clock`]
//! - [`XmlElement`]: small element tree for XML responses
//! - text helpers: [`author_list`], [`truncate_chars`], [`collapse_whitespace`],
//!   [`strip_markup`]

mod http;
mod rate_limit;
mod text;
mod xml;

pub use http::HttpClient;
pub use rate_limit::{Clock, ManualClock, RateLimiter, SystemClock};
pub use text::{author_list, collapse_whitespace, strip_markup, truncate_chars};
pub use xml::{XmlElement, XmlNode};
