//! Empty vertical space between tracks.

use trackfig_core::TrackProperties;

use super::{Track, TrackContext};
use crate::axis::Axis;
use crate::error::RenderResult;

pub struct SpacerTrack {
    props: TrackProperties,
}

impl SpacerTrack {
    pub fn new(props: TrackProperties) -> Self {
        Self { props }
    }
}

impl Track for SpacerTrack {
    fn properties(&self) -> &TrackProperties {
        &self.props
    }

    fn load(&mut self, _ctx: &TrackContext) -> RenderResult<()> {
        Ok(())
    }

    fn draw(&self, _axis: &mut Axis<'_>) {}
}
