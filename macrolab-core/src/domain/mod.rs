//! Domain types shared by the collection pipeline.
//!
//! - `Frequency`: bucket key and calendar normalization
//! - `Source`, `SeriesRequest`: what to collect and from where
//! - `TimeSeriesTable`: what every adapter produces
//! - `DateWindow`: bounded request spans

pub mod frequency;
pub mod request;
pub mod table;
pub mod window;

pub use frequency::Frequency;
pub use request::{CollectionMethod, SeriesRequest, Source};
pub use table::{Observation, TimeSeriesTable};
pub use window::{format_br, parse_br, DateWindow, BR_DATE_FORMAT};
