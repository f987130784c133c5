pub mod info;
pub mod timeline;

// Re-export commonly used types at the model level.
pub use info::{BackendMode, TrackInfo, TracksInfo};
pub use timeline::{Clip, ClipRef, Sequence, TimeRange, Track, TrackKind};
