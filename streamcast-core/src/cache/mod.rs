pub mod guide;
pub mod singleflight;

pub use guide::{GuideCache, GuideView};
pub use singleflight::SingleFlight;
