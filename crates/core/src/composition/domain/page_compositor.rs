use ndarray::s;

use crate::shared::constants::BACKGROUND_RGB;
use crate::shared::frame::Frame;

use super::page_layout::{page_height_for, paginate, PageLayout};

/// Stitches frames top-to-bottom onto white canvases.
///
/// Canvas width is taken from the first frame. Frames are pasted unscaled;
/// anything wider than the canvas is clipped on the right.
pub struct PageCompositor;

impl PageCompositor {
    /// One tall image holding every frame with no gaps.
    pub fn stack(&self, frames: &[Frame]) -> Frame {
        let width = frames.first().map_or(0, Frame::width);
        let height = frames.iter().map(Frame::height).sum();
        let mut canvas = Frame::filled(width, height, BACKGROUND_RGB, 0);

        let mut offset = 0;
        for frame in frames {
            paste(&mut canvas, frame, offset);
            offset += frame.height();
        }
        canvas
    }

    /// Pages of height `round(width * 842 / 595)`, filled greedily.
    ///
    /// Each returned frame carries its page number as its index.
    pub fn paginate(&self, frames: &[Frame]) -> Vec<Frame> {
        let Some(first) = frames.first() else {
            return Vec::new();
        };
        let width = first.width();
        let heights: Vec<u32> = frames.iter().map(Frame::height).collect();

        paginate(&heights, page_height_for(width))
            .iter()
            .enumerate()
            .map(|(number, layout)| render(layout, frames, width, number))
            .collect()
    }
}

fn render(layout: &PageLayout, frames: &[Frame], width: u32, number: usize) -> Frame {
    let mut page = Frame::filled(width, layout.height, BACKGROUND_RGB, number);
    for placement in &layout.placements {
        paste(&mut page, &frames[placement.item], placement.offset);
    }
    page
}

fn paste(canvas: &mut Frame, frame: &Frame, offset: u32) {
    let width = canvas.width().min(frame.width()) as usize;
    let top = offset as usize;
    let rows = (frame.height().min(canvas.height().saturating_sub(offset))) as usize;
    if width == 0 || rows == 0 {
        return;
    }
    let source = frame.as_ndarray();
    canvas
        .as_ndarray_mut()
        .slice_mut(s![top..top + rows, ..width, ..])
        .assign(&source.slice(s![..rows, ..width, ..]));
}
