/// Smallest width or height a floating window can be resized to.
pub const MIN_WINDOW_SIZE: i32 = 20;

/// Floating windows are never centered smaller than this on first map.
pub const MIN_FLOATING_SIZE: i32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Splits the rectangle in two around `gap` pixels.
    ///
    /// Wide or square rectangles are cut into a left and a right half, tall
    /// ones into a top and a bottom half. The first half gets
    /// `(span - gap) / 2`, the second absorbs the rounding remainder.
    pub fn split(&self, gap: i32) -> (Rect, Rect) {
        if self.width >= self.height {
            let first_w = (self.width - gap) / 2;
            let second_w = self.width - first_w - gap;
            (
                Rect::new(self.x, self.y, first_w, self.height),
                Rect::new(self.x + first_w + gap, self.y, second_w, self.height),
            )
        } else {
            let first_h = (self.height - gap) / 2;
            let second_h = self.height - first_h - gap;
            (
                Rect::new(self.x, self.y, self.width, first_h),
                Rect::new(self.x, self.y + first_h + gap, self.width, second_h),
            )
        }
    }

    /// Interior rectangle left once a border of `border` pixels is drawn on
    /// every side, never smaller than one pixel.
    pub fn shrink_border(&self, border: i32) -> Rect {
        Rect::new(
            self.x,
            self.y,
            (self.width - 2 * border).max(1),
            (self.height - 2 * border).max(1),
        )
    }

    pub fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }
}

/// Reserved screen margins, one per edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Margins {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

/// Screen minus reserved margins. Width and height never drop below one.
pub fn work_area(screen_width: i32, screen_height: i32, margins: Margins) -> Rect {
    Rect::new(
        margins.left,
        margins.top,
        (screen_width - margins.left - margins.right).max(1),
        (screen_height - margins.top - margins.bottom).max(1),
    )
}

/// Unlike `Ord::clamp` this never panics: the lower bound wins when `lo > hi`.
pub fn clamp(value: i32, lo: i32, hi: i32) -> i32 {
    if value < lo {
        lo
    } else if value > hi {
        hi
    } else {
        value
    }
}

/// Pulls `pos` flush against either screen edge when it is within
/// `snap_dist` pixels of it.
pub fn snap_coordinate(pos: i32, size: i32, screen_size: i32, snap_dist: i32) -> i32 {
    if pos.abs() <= snap_dist {
        return 0;
    }
    if (pos + size - screen_size).abs() <= snap_dist {
        return screen_size - size;
    }
    pos
}

pub fn center_window(screen_width: i32, screen_height: i32, win_width: i32, win_height: i32) -> (i32, i32) {
    ((screen_width - win_width) / 2, (screen_height - win_height) / 2)
}
