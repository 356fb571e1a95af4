//! Pure helpers shared by the workers: URL assembly, response-code
//! classification and the batch join latch.

mod latch;
mod status;
mod url;

pub(crate) use latch::{Latch, LatchGuard};
pub(crate) use status::classify_status;
pub(crate) use url::{build_url, normalize_scheme};
