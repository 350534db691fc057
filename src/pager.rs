use crate::document::{Block, Canvas};

/// Where content resumes after a page break
pub const TOP_MARGIN_MM: f32 = 20.0;

/// Where content starts on a record's first page, below the header
pub const CONTENT_TOP_MM: f32 = 50.0;

/// Content is kept above this line; anything lower moves to a new page
pub const PAGE_BOTTOM_MM: f32 = 280.0;

/// Room on a continuation page
pub const PAGE_CAPACITY_MM: f32 = PAGE_BOTTOM_MM - TOP_MARGIN_MM;

/// Current page and vertical write position.
///
/// The pager is the only layout state that survives between sections; each
/// section is laid out as a block and flowed in at `y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pager {
    pub page_index: usize,
    pub y: f32,
}

impl Pager {
    /// Open a fresh page for `record_index` with the cursor below the header.
    pub fn start_record(canvas: &mut Canvas, record_index: usize) -> Pager {
        let page_index = canvas.start_page(record_index);
        Pager {
            page_index,
            y: CONTENT_TOP_MM,
        }
    }

    pub fn needs_break(&self, height: f32) -> bool {
        self.y + height > PAGE_BOTTOM_MM
    }

    /// Break the page before a block of `height` unless it fits here.
    ///
    /// A block taller than a whole page stays where it is as long as its
    /// `min_height` fits, and flows onto continuation pages. Returns whether
    /// the page broke.
    pub fn ensure_room(&mut self, canvas: &mut Canvas, min_height: f32, height: f32) -> bool {
        let needed = height.max(min_height);
        if !self.needs_break(needed) {
            return false;
        }
        if needed > PAGE_CAPACITY_MM && !self.needs_break(min_height) {
            return false;
        }
        self.page_break(canvas);
        true
    }

    /// Continue the current record on a new page.
    pub fn page_break(&mut self, canvas: &mut Canvas) {
        let record_index = canvas.current_record();
        self.page_index = canvas.start_page(record_index);
        self.y = TOP_MARGIN_MM;
        log::debug!("Page break: record {} continues on page {}", record_index + 1, self.page_index + 1);
    }

    /// Draw `block` from the cursor and move the cursor past it.
    ///
    /// Elements that would land below the bottom margin are carried over to
    /// continuation pages. Returns how many continuation pages were opened.
    pub fn flow(&mut self, canvas: &mut Canvas, block: Block) -> usize {
        let record_index = canvas.current_record();
        let start_page = self.page_index;
        let start_y = self.y;
        let mut last_drawn = 0;

        for element in block.elements {
            let (offset, y) = flow_position(start_y, element.y());
            while canvas.page_count() <= start_page + offset {
                canvas.start_page(record_index);
            }
            let dy = y - element.y();
            canvas.place(start_page + offset, element.shifted(dy));
            last_drawn = last_drawn.max(offset);
        }

        let (end_offset, end_y) = flow_position(start_y, block.height);
        if end_offset > last_drawn {
            // Only trailing space spilled over: leave the page full rather than open a blank one
            self.page_index = start_page + last_drawn;
            self.y = PAGE_BOTTOM_MM;
        } else {
            self.page_index = start_page + end_offset;
            self.y = end_y;
        }
        canvas.select_page(self.page_index);
        last_drawn
    }
}

/// Page offset and y of a point `dy` below `start_y` once content is carried
/// past the bottom margin.
fn flow_position(start_y: f32, dy: f32) -> (usize, f32) {
    let y = start_y + dy;
    if y <= PAGE_BOTTOM_MM {
        return (0, y);
    }
    let carried = y - PAGE_BOTTOM_MM;
    let pages = (carried / PAGE_CAPACITY_MM).ceil().max(1.0);
    (pages as usize, TOP_MARGIN_MM + carried - (pages - 1.0) * PAGE_CAPACITY_MM)
}
