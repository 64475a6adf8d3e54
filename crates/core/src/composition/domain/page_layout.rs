use crate::shared::constants::PAGE_HEIGHT_RATIO;

/// Height of a portrait page for images of the given width.
pub fn page_height_for(width: u32) -> u32 {
    (width as f64 * PAGE_HEIGHT_RATIO).round() as u32
}

/// One image on a page: its position in the input and its top row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub item: usize,
    pub offset: u32,
}

/// A sealed page.
///
/// `height` is the nominal page height unless the page holds a single
/// image taller than that, in which case it matches the image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageLayout {
    pub height: u32,
    pub placements: Vec<Placement>,
}

impl PageLayout {
    pub fn items(&self) -> impl Iterator<Item = usize> + '_ {
        self.placements.iter().map(|p| p.item)
    }
}

/// Greedy top-to-bottom page filler.
///
/// An image that does not fit below the current content seals the page and
/// starts the next one. Nothing is ever scaled or split.
pub struct PagePacker {
    page_height: u32,
    offset: u32,
    current: Vec<Placement>,
}

impl PagePacker {
    pub fn new(page_height: u32) -> Self {
        Self {
            page_height,
            offset: 0,
            current: Vec::new(),
        }
    }

    /// Places image `item` of height `height`; returns the page it sealed,
    /// if any.
    pub fn place(&mut self, item: usize, height: u32) -> Option<PageLayout> {
        let sealed = if self.offset + height > self.page_height && !self.current.is_empty() {
            self.seal()
        } else {
            None
        };
        self.current.push(Placement {
            item,
            offset: self.offset,
        });
        self.offset += height;
        sealed
    }

    /// Seals the last page, if it holds anything.
    pub fn finish(mut self) -> Option<PageLayout> {
        self.seal()
    }

    fn seal(&mut self) -> Option<PageLayout> {
        if self.current.is_empty() {
            return None;
        }
        let page = PageLayout {
            height: self.page_height.max(self.offset),
            placements: std::mem::take(&mut self.current),
        };
        self.offset = 0;
        Some(page)
    }
}

/// Lays out images of the given heights onto pages of `page_height`.
pub fn paginate(heights: &[u32], page_height: u32) -> Vec<PageLayout> {
    let mut packer = PagePacker::new(page_height);
    let mut pages: Vec<PageLayout> = heights
        .iter()
        .enumerate()
        .filter_map(|(item, &height)| packer.place(item, height))
        .collect();
    pages.extend(packer.finish());
    pages
}
