use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Stacked layout, top to bottom
pub struct AppLayout {
    pub tabs_area: Rect,
    pub transcript_area: Rect,
    pub input_area: Rect,
    pub status_area: Rect,
}

impl AppLayout {
    /// - Conversation tabs: 1 row
    /// - Transcript: everything left (bordered)
    /// - Input line: 3 rows (bordered)
    /// - Status bar: 1 row
    pub fn new(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(area);

        Self {
            tabs_area: chunks[0],
            transcript_area: chunks[1],
            input_area: chunks[2],
            status_area: chunks[3],
        }
    }

    /// Transcript rows and columns inside the border
    pub fn transcript_inner(&self) -> (usize, usize) {
        let width = self.transcript_area.width.saturating_sub(2) as usize;
        let height = self.transcript_area.height.saturating_sub(2) as usize;
        (width, height)
    }
}
