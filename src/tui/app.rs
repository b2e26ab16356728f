use crate::session::Session;

/// Episodes per row in the episode grid
pub const EPISODE_COLUMNS: usize = 10;

const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pane {
    #[default]
    Search,
    Shows,
    Episodes,
}

impl Pane {
    pub fn next(self) -> Self {
        match self {
            Pane::Search => Pane::Shows,
            Pane::Shows => Pane::Episodes,
            Pane::Episodes => Pane::Search,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Pane::Search => Pane::Episodes,
            Pane::Shows => Pane::Search,
            Pane::Episodes => Pane::Shows,
        }
    }
}

/// Terminal-only view state; everything about the pipeline lives in `Session`
#[derive(Debug, Default)]
pub struct App {
    pub focus: Pane,
    pub should_quit: bool,
    pub search_input: String,
    pub selected_show: usize,
    /// Position on the current episode page
    pub selected_episode: usize,
    tick: usize,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER[self.tick % SPINNER.len()]
    }

    pub fn select_next_show(&mut self, len: usize) {
        if len > 0 {
            self.selected_show = (self.selected_show + 1).min(len - 1);
        }
    }

    pub fn select_previous_show(&mut self) {
        self.selected_show = self.selected_show.saturating_sub(1);
    }

    /// Move the episode cursor by `delta` cells within a page of `len` episodes
    pub fn move_episode(&mut self, delta: isize, len: usize) {
        if len == 0 {
            self.selected_episode = 0;
            return;
        }
        let target = self.selected_episode as isize + delta;
        self.selected_episode = target.clamp(0, len as isize - 1) as usize;
    }

    /// Keep cursors inside whatever the session currently holds
    pub fn clamp_to(&mut self, session: &Session) {
        let shows = session.shows().len();
        if self.selected_show >= shows {
            self.selected_show = shows.saturating_sub(1);
        }
        let visible = session.visible_episodes().len();
        if self.selected_episode >= visible {
            self.selected_episode = visible.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pane_cycle() {
        assert_eq!(Pane::Search.next(), Pane::Shows);
        assert_eq!(Pane::Episodes.next(), Pane::Search);
        assert_eq!(Pane::Search.prev(), Pane::Episodes);
    }

    #[test]
    fn test_move_episode_clamps() {
        let mut app = App::new();
        app.move_episode(EPISODE_COLUMNS as isize, 25);
        assert_eq!(app.selected_episode, 10);
        app.move_episode(100, 25);
        assert_eq!(app.selected_episode, 24);
        app.move_episode(-100, 25);
        assert_eq!(app.selected_episode, 0);
        app.move_episode(1, 0);
        assert_eq!(app.selected_episode, 0);
    }

    #[test]
    fn test_show_selection_bounds() {
        let mut app = App::new();
        app.select_next_show(2);
        app.select_next_show(2);
        assert_eq!(app.selected_show, 1);
        app.select_previous_show();
        app.select_previous_show();
        assert_eq!(app.selected_show, 0);
    }

    #[test]
    fn test_clamp_to_empty_session() {
        let mut app = App::new();
        app.selected_show = 4;
        app.selected_episode = 7;
        app.clamp_to(&Session::default());
        assert_eq!(app.selected_show, 0);
        assert_eq!(app.selected_episode, 0);
    }
}
