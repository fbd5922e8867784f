//! Command implementations for the trackfig CLI

pub mod make_tracks;
pub mod plot;
