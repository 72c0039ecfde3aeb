use crate::layout::rect::Rect;

/// Spacing used when placing the floating menu
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MenuOptions {
    /// Vertical distance between the selection and the menu
    pub gap: f32,
    /// Minimum distance between the menu and the container's side edges
    pub gutter: f32,
}

impl Default for MenuOptions {
    fn default() -> Self {
        Self {
            gap: 8.0,
            gutter: 8.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MenuSize {
    pub width: f32,
    pub height: f32,
}

impl MenuSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuSide {
    Above,
    Below,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MenuPlacement {
    Hidden,
    /// Top-left corner of the menu in container coordinates
    Shown { top: f32, left: f32, side: MenuSide },
}

/// Place the formatting menu for a selection whose on-screen bounds are `anchor`
/// (`None` for a collapsed selection).
///
/// The menu is centred over the anchor, kept inside `container` with `gutter` on
/// either side, and shown above the anchor unless there is not enough room there.
pub fn compute_menu_position(
    anchor: Option<Rect>,
    container: Rect,
    menu: MenuSize,
    options: MenuOptions,
) -> MenuPlacement {
    let Some(anchor) = anchor else {
        return MenuPlacement::Hidden;
    };

    let half = menu.width / 2.0;
    let min_center = container.left() + half + options.gutter;
    let max_center = container.right() - half - options.gutter;
    let center = if min_center > max_center {
        container.center_x()
    } else {
        anchor.center_x().clamp(min_center, max_center)
    };

    let above = anchor.top() - menu.height - options.gap;
    let (top, side) = if above < container.top() {
        (anchor.bottom() + options.gap, MenuSide::Below)
    } else {
        (above, MenuSide::Above)
    };

    MenuPlacement::Shown {
        top,
        left: center - half,
        side,
    }
}
