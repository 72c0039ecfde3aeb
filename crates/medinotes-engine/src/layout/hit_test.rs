//! Coordinate <-> position mapping over a host-supplied layout.
//!
//! The host reports one box per rendered text run and one per block. Runs are
//! grouped into horizontal bands (visual lines) when the layout is built, so a
//! lookup is two binary searches: band by `y`, then run by `x`.

use crate::editing::document::Document;
use crate::layout::rect::{Point, Rect};

/// On-screen box of the characters `from..to` of one text run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextRunBox {
    pub from: usize,
    pub to: usize,
    pub rect: Rect,
}

impl TextRunBox {
    pub fn new(from: usize, to: usize, rect: Rect) -> Self {
        Self { from, to, rect }
    }

    fn len(&self) -> usize {
        self.to.saturating_sub(self.from)
    }

    /// Character boundary closest to `x`, assuming evenly spaced characters
    fn position_at_x(&self, x: f32) -> usize {
        if self.len() == 0 || self.rect.width <= 0.0 {
            return self.from;
        }
        let ratio = ((x - self.rect.left()) / self.rect.width).clamp(0.0, 1.0);
        self.from + (ratio * self.len() as f32).round() as usize
    }

    fn x_at(&self, pos: usize) -> f32 {
        if self.len() == 0 {
            return self.rect.left();
        }
        let offset = pos.clamp(self.from, self.to) - self.from;
        self.rect.left() + self.rect.width * offset as f32 / self.len() as f32
    }
}

/// On-screen box of the block node starting at `pos`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockBox {
    pub pos: usize,
    pub rect: Rect,
}

impl BlockBox {
    pub fn new(pos: usize, rect: Rect) -> Self {
        Self { pos, rect }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Band {
    top: f32,
    bottom: f32,
    /// Sorted by left edge
    runs: Vec<TextRunBox>,
}

/// Precomputed geometry of the rendered document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderedLayout {
    bands: Vec<Band>,
    blocks: Vec<BlockBox>,
    bounds: Option<Rect>,
}

impl RenderedLayout {
    pub fn new(mut runs: Vec<TextRunBox>, blocks: Vec<BlockBox>) -> Self {
        runs.sort_by(|a, b| {
            a.rect
                .top()
                .total_cmp(&b.rect.top())
                .then(a.rect.left().total_cmp(&b.rect.left()))
        });

        let mut bands: Vec<Band> = Vec::new();
        for run in runs {
            match bands.last_mut() {
                Some(band) if run.rect.top() < band.bottom => {
                    band.bottom = band.bottom.max(run.rect.bottom());
                    band.runs.push(run);
                }
                _ => bands.push(Band {
                    top: run.rect.top(),
                    bottom: run.rect.bottom(),
                    runs: vec![run],
                }),
            }
        }
        for band in &mut bands {
            band.runs
                .sort_by(|a, b| a.rect.left().total_cmp(&b.rect.left()));
        }

        let bounds = bands
            .iter()
            .flat_map(|band| band.runs.iter().map(|run| run.rect))
            .chain(blocks.iter().map(|block| block.rect))
            .reduce(|a, b| a.union(&b));

        Self {
            bands,
            blocks,
            bounds,
        }
    }

    /// Bounding box of everything in the layout
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    pub fn blocks(&self) -> &[BlockBox] {
        &self.blocks
    }

    pub fn runs(&self) -> impl Iterator<Item = &TextRunBox> {
        self.bands.iter().flat_map(|band| band.runs.iter())
    }

    /// Blocks whose box contains `point`, innermost first
    pub fn blocks_at(&self, point: Point) -> Vec<BlockBox> {
        let mut hits: Vec<BlockBox> = self
            .blocks
            .iter()
            .filter(|block| block.rect.contains(point))
            .copied()
            .collect();
        hits.sort_by(|a, b| {
            a.rect
                .height
                .total_cmp(&b.rect.height)
                .then(b.pos.cmp(&a.pos))
        });
        hits
    }

    fn band_at(&self, y: f32) -> Option<&Band> {
        let index = self.bands.partition_point(|band| band.bottom <= y);
        let Some(band) = self.bands.get(index) else {
            return self.bands.last();
        };
        if y >= band.top || index == 0 {
            return Some(band);
        }
        // Between two lines: take whichever is closer
        let previous = &self.bands[index - 1];
        if y - previous.bottom <= band.top - y {
            Some(previous)
        } else {
            Some(band)
        }
    }
}

impl Band {
    fn run_at(&self, x: f32) -> Option<&TextRunBox> {
        let index = self.runs.partition_point(|run| run.rect.right() <= x);
        let Some(run) = self.runs.get(index) else {
            return self.runs.last();
        };
        if x >= run.rect.left() || index == 0 {
            return Some(run);
        }
        let previous = &self.runs[index - 1];
        if x - previous.rect.right() <= run.rect.left() - x {
            Some(previous)
        } else {
            Some(run)
        }
    }
}

/// Position under the point `(x, y)`, or `None` outside the document's bounds
pub fn position_at_coordinates(
    doc: &Document,
    layout: &RenderedLayout,
    x: f32,
    y: f32,
) -> Option<usize> {
    let bounds = layout.bounds()?;
    if !bounds.contains(Point::new(x, y)) {
        return None;
    }
    let run = layout.band_at(y)?.run_at(x)?;
    Some(run.position_at_x(x).min(doc.size()))
}

/// Screen rectangle covering `from..to`, or `None` for a collapsed range or one
/// with no rendered text
pub fn bounding_rect_for_range(
    doc: &Document,
    layout: &RenderedLayout,
    from: usize,
    to: usize,
) -> Option<Rect> {
    let (from, to) = (from.min(to), from.max(to).min(doc.size()));
    if from >= to {
        return None;
    }
    layout
        .runs()
        .filter(|run| run.to > from && run.from < to)
        .map(|run| {
            let left = run.x_at(from.max(run.from));
            let right = run.x_at(to.min(run.to));
            Rect::new(left, run.rect.top(), right - left, run.rect.height)
        })
        .reduce(|a, b| a.union(&b))
}

/// Innermost block whose box contains `(x, y)`
pub fn block_at_coordinates(layout: &RenderedLayout, x: f32, y: f32) -> Option<BlockBox> {
    layout.blocks_at(Point::new(x, y)).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::document::Node;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn doc() -> Document {
        // 0 <p> 1 Hello 6 </p> 7 <p> 8 World 13 </p> 14
        Document::new(vec![
            Node::paragraph(vec![Node::text("Hello")]),
            Node::paragraph(vec![Node::text("World")]),
        ])
        .unwrap()
    }

    fn layout() -> RenderedLayout {
        RenderedLayout::new(
            vec![
                TextRunBox::new(8, 13, Rect::new(0.0, 20.0, 50.0, 10.0)),
                TextRunBox::new(1, 6, Rect::new(0.0, 0.0, 50.0, 10.0)),
            ],
            vec![
                BlockBox::new(0, Rect::new(0.0, 0.0, 50.0, 10.0)),
                BlockBox::new(7, Rect::new(0.0, 20.0, 50.0, 10.0)),
            ],
        )
    }

    #[rstest]
    #[case(0.0, 5.0, Some(1))]
    #[case(20.0, 5.0, Some(3))]
    #[case(49.0, 25.0, Some(13))]
    // in the gap between lines, closer to the first
    #[case(10.0, 13.0, Some(2))]
    // closer to the second
    #[case(10.0, 17.0, Some(9))]
    #[case(60.0, 5.0, None)]
    #[case(10.0, -1.0, None)]
    fn test_position_at_coordinates(
        #[case] x: f32,
        #[case] y: f32,
        #[case] expected: Option<usize>,
    ) {
        assert_eq!(position_at_coordinates(&doc(), &layout(), x, y), expected);
    }

    #[test]
    fn test_runs_on_one_line_are_searched_by_x() {
        let doc = Document::new(vec![Node::paragraph(vec![
            Node::text("ab"),
            Node::marked_text("cd", [crate::editing::marks::Mark::Bold]),
        ])])
        .unwrap();
        let layout = RenderedLayout::new(
            vec![
                TextRunBox::new(1, 3, Rect::new(0.0, 0.0, 20.0, 10.0)),
                TextRunBox::new(3, 5, Rect::new(20.0, 0.0, 20.0, 10.0)),
            ],
            Vec::new(),
        );
        assert_eq!(position_at_coordinates(&doc, &layout, 30.0, 5.0), Some(4));
    }

    #[test]
    fn test_bounding_rect_spans_lines() {
        let rect = bounding_rect_for_range(&doc(), &layout(), 2, 10).unwrap();
        assert_eq!(rect, Rect::new(0.0, 0.0, 50.0, 30.0));
    }

    #[test]
    fn test_bounding_rect_within_one_run() {
        let rect = bounding_rect_for_range(&doc(), &layout(), 2, 4).unwrap();
        assert_eq!(rect, Rect::new(10.0, 0.0, 20.0, 10.0));
    }

    #[test]
    fn test_bounding_rect_for_collapsed_range_is_none() {
        assert_eq!(bounding_rect_for_range(&doc(), &layout(), 4, 4), None);
    }

    #[test]
    fn test_block_at_coordinates() {
        let layout = layout();
        assert_eq!(block_at_coordinates(&layout, 5.0, 25.0).map(|b| b.pos), Some(7));
        assert_eq!(block_at_coordinates(&layout, 5.0, 15.0), None);
    }

    #[test]
    fn test_nested_blocks_innermost_first() {
        let layout = RenderedLayout::new(
            Vec::new(),
            vec![
                BlockBox::new(0, Rect::new(0.0, 0.0, 50.0, 30.0)),
                BlockBox::new(1, Rect::new(2.0, 0.0, 48.0, 10.0)),
            ],
        );
        let hits: Vec<usize> = layout
            .blocks_at(Point::new(5.0, 5.0))
            .iter()
            .map(|b| b.pos)
            .collect();
        assert_eq!(hits, vec![1, 0]);
        // left of the inner box only the outer one is hit
        let hits: Vec<usize> = layout
            .blocks_at(Point::new(1.0, 5.0))
            .iter()
            .map(|b| b.pos)
            .collect();
        assert_eq!(hits, vec![0]);
        assert!(layout.blocks_at(Point::new(-500.0, 5.0)).is_empty());
    }
}
