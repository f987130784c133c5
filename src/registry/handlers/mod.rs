pub mod edit;
pub mod playback;
pub mod selection;
pub mod tracks;
