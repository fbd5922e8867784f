/*!
# trackfig rendering

Turns validated track properties into a stacked, x-aligned figure.

## Pipeline

1. **Handlers**: each track type reads its data for the region ([`tracks`])
2. **Layout**: panels are grouped, sized and given y scales ([`layout`])
3. **Output**: the [`scene::Scene`] is serialized to SVG, or rasterized to PNG
*/

/// RGBA colors and colormaps
pub mod color;

/// Errors raised while building and drawing figures
pub mod error;

/// Drawing primitives collected before output
pub mod scene;

/// SVG serialization
pub mod svg;

/// PNG rasterization
pub mod raster;

/// Data to pixel transforms
pub mod axis;

/// Tick placement and labels
pub mod ticks;

/// Track handlers and the registry
pub mod tracks;

/// Figure compositor
pub mod layout;

pub use color::{Color, Colormap};
pub use error::{RenderError, RenderResult};
pub use layout::{Columns, Figure, FigureOptions};
pub use scene::Scene;
pub use tracks::{build_track, LabelAlign, Track, TrackContext, YLimits};
