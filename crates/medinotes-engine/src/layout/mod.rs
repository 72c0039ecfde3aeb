//! Geometry supplied by the rendering host and the queries the editor runs on it:
//! coordinate to position hit-testing, selection bounds, and floating menu
//! placement.

pub mod hit_test;
pub mod menu;
pub mod rect;

pub use hit_test::{
    BlockBox, RenderedLayout, TextRunBox, block_at_coordinates, bounding_rect_for_range,
    position_at_coordinates,
};
pub use menu::{MenuOptions, MenuPlacement, MenuSide, MenuSize, compute_menu_position};
pub use rect::{Point, Rect};
