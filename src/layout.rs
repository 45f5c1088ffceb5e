/// Fixed measurements for the 1200x630 card. An explicit struct rather than
/// scattered constants so tests can exercise the layout with alternate
/// metrics.
#[derive(Debug, Clone)]
pub(crate) struct LayoutMetrics {
    pub canvas_w: u32,
    pub canvas_h: u32,
    /// Left margin for all text rows.
    pub margin_x: i32,
    /// Content never starts above this, however short the block is.
    pub min_margin_y: i32,
    pub title_size: f32,
    pub title_cols: usize,
    pub title_gap: i32,
    pub meta_size: f32,
    pub pill_pad_x: i32,
    pub pill_pad_y: i32,
    pub pill_gap_before: i32,
    pub pill_gap_after: i32,
    pub desc_size: f32,
    pub desc_cols: usize,
    pub desc_gap: i32,
    pub desc_max_lines: usize,
    pub desc_gap_after: i32,
    pub author_size: f32,
    pub avatar_size: u32,
    pub footer_h: i32,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            canvas_w: 1200,
            canvas_h: 630,
            margin_x: 60,
            min_margin_y: 55,
            title_size: 58.0,
            title_cols: 28,
            title_gap: 8,
            meta_size: 20.0,
            pill_pad_x: 12,
            pill_pad_y: 7,
            pill_gap_before: 18,
            pill_gap_after: 22,
            desc_size: 26.0,
            desc_cols: 55,
            desc_gap: 6,
            desc_max_lines: 3,
            desc_gap_after: 24,
            author_size: 24.0,
            avatar_size: 60,
            footer_h: 80,
        }
    }
}

impl LayoutMetrics {
    pub fn title_line_h(&self) -> i32 {
        self.title_size.ceil() as i32
    }

    pub fn meta_line_h(&self) -> i32 {
        self.meta_size.ceil() as i32
    }

    pub fn desc_line_h(&self) -> i32 {
        self.desc_size.ceil() as i32
    }

    pub fn pill_h(&self) -> i32 {
        self.meta_line_h() + 2 * self.pill_pad_y
    }
}

/// Resolved vertical placement for one card, computed before any drawing.
#[derive(Debug)]
pub(crate) struct CardLayout {
    pub title_lines: Vec<String>,
    pub desc_lines: Vec<String>,
    pub title_y: i32,
    pub pill_y: i32,
    pub desc_y: i32,
    pub footer_y: i32,
    pub block_h: i32,
}

/// Greedy word wrap to a character-count column. Breaks only at whitespace,
/// never mid-word; a single token longer than `cols` gets its own line.
/// Character count is an approximation of rendered width, which is accepted:
/// the card fonts are proportional and visual line length will vary a little.
pub(crate) fn wrap(text: &str, cols: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.len() + 1 + word.len() <= cols {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Wraps both text blocks and vertically centers the whole content block
/// (title, pill, description, footer row) in the canvas, clamped so short
/// cards never sit above `min_margin_y`.
pub(crate) fn layout_card(m: &LayoutMetrics, title: &str, description: &str) -> CardLayout {
    let title_lines = wrap(title, m.title_cols);
    let desc_lines: Vec<String> = wrap(description, m.desc_cols)
        .into_iter()
        .take(m.desc_max_lines)
        .collect();

    let title_h = title_lines.len() as i32 * (m.title_line_h() + m.title_gap);
    let desc_h = if desc_lines.is_empty() {
        0
    } else {
        desc_lines.len() as i32 * (m.desc_line_h() + m.desc_gap) + m.desc_gap_after
    };
    let block_h =
        title_h + m.pill_gap_before + m.pill_h() + m.pill_gap_after + desc_h + m.footer_h;

    let title_y = ((m.canvas_h as i32 - block_h) / 2).max(m.min_margin_y);
    let pill_y = title_y + title_h + m.pill_gap_before;
    let desc_y = pill_y + m.pill_h() + m.pill_gap_after;
    let footer_y = desc_y + desc_h;

    CardLayout {
        title_lines,
        desc_lines,
        title_y,
        pill_y,
        desc_y,
        footer_y,
        block_h,
    }
}
