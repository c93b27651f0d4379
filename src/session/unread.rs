/// Inbound messages rendered while the window was collapsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnreadCounter {
    count: u32,
}

impl UnreadCounter {
    pub fn count(self) -> u32 {
        self.count
    }

    /// Whether the launcher badge should be shown.
    pub fn badge_visible(self) -> bool {
        self.count > 0
    }

    /// Count one rendered inbound message; ignored while the window is open.
    pub fn record(&mut self, window_open: bool) {
        if !window_open {
            self.count = self.count.saturating_add(1);
        }
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}
