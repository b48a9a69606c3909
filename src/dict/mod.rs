//! Expiring dictionary engine
//!
//! Maps keys to opaque values with an optional absolute expiry per key.
//! Expired keys are removed lazily, on the next read.

mod clock;
mod dictionary;
mod object;

pub use clock::{Clock, ManualClock, SystemClock};
pub use dictionary::{DictStats, Dictionary, ExpireMap};
pub use object::Object;
