//! Layout model shared by the extractors and the renderers.
//!
//! Extractors produce [`TextBlock`]s and [`TableRegion`]s per page; the page
//! compositor wraps them in [`LayoutItem`]s to order them top to bottom.

mod geometry;
mod layout;
mod table;
mod text;

pub use geometry::BoundingBox;
pub use layout::{LayoutItem, PageLayout};
pub use table::{Grid, TableRegion};
pub use text::{Run, TextBlock, TextLine};
