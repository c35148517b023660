//! Visibility and keyboard focus of the search panel, independent of any
//! UI toolkit. A front end maps its key events to [`Intent`]s, applies them
//! and performs the returned [`Effect`].

/// Where keyboard focus sits while the panel is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    None,
    Input,
    Result(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Toggle,
    Close,
    /// Enter: follow the focused result and close.
    Submit,
    Next,
    Prev,
    ClickOutside,
}

impl Intent {
    /// Default key bindings: Ctrl+P, Escape, Enter, ArrowDown, ArrowUp.
    pub fn from_key(key: &str, ctrl: bool) -> Option<Intent> {
        match key {
            "p" | "P" if ctrl => Some(Intent::Toggle),
            "Escape" => Some(Intent::Close),
            "Enter" => Some(Intent::Submit),
            "ArrowDown" => Some(Intent::Next),
            "ArrowUp" => Some(Intent::Prev),
            _ => None,
        }
    }
}

/// What the front end has to do after an intent was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Nothing,
    /// Panel opened: clear the input and focus it.
    ClearInput,
    /// Panel closed: drop focus.
    Blur,
    /// Move focus to the given target.
    Focus(Focus),
    /// Navigate to the result at this position, then close.
    Open(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    visible: bool,
    focus: Focus,
    results: usize,
}

impl Default for Panel {
    fn default() -> Self {
        Panel {
            visible: false,
            focus: Focus::None,
            results: 0,
        }
    }
}

impl Panel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn result_count(&self) -> usize {
        self.results
    }

    /// Record how many results are rendered. An empty list keeps the panel
    /// open; focus on a result that no longer exists returns to the input.
    pub fn set_results(&mut self, count: usize) {
        self.results = count;
        if let Focus::Result(i) = self.focus {
            if i >= count {
                self.focus = Focus::Input;
            }
        }
    }

    pub fn apply(&mut self, intent: Intent) -> Effect {
        match intent {
            Intent::Toggle if self.visible => self.hide(),
            Intent::Toggle => self.show(),
            Intent::Close | Intent::ClickOutside => {
                if self.visible {
                    self.hide()
                } else {
                    Effect::Nothing
                }
            }
            Intent::Submit => {
                if !self.visible {
                    return Effect::Nothing;
                }
                let focused = self.focus;
                self.hide();
                match focused {
                    Focus::Result(i) => Effect::Open(i),
                    _ => Effect::Blur,
                }
            }
            Intent::Next => self.step(Direction::Down),
            Intent::Prev => self.step(Direction::Up),
        }
    }

    fn show(&mut self) -> Effect {
        self.visible = true;
        self.focus = Focus::Input;
        Effect::ClearInput
    }

    fn hide(&mut self) -> Effect {
        self.visible = false;
        self.focus = Focus::None;
        Effect::Blur
    }

    fn step(&mut self, direction: Direction) -> Effect {
        if !self.visible || self.results == 0 {
            return Effect::Nothing;
        }
        let last = self.results - 1;
        let next = match (direction, self.focus) {
            (Direction::Down, Focus::Result(i)) => Focus::Result((i + 1).min(last)),
            (Direction::Down, _) => Focus::Result(0),
            (Direction::Up, Focus::Result(0)) => Focus::Input,
            (Direction::Up, Focus::Result(i)) => Focus::Result(i - 1),
            (Direction::Up, _) => Focus::Input,
        };
        self.focus = next;
        Effect::Focus(next)
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Up,
    Down,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_with(results: usize) -> Panel {
        let mut panel = Panel::new();
        assert_eq!(panel.apply(Intent::Toggle), Effect::ClearInput);
        panel.set_results(results);
        panel
    }

    #[test]
    fn toggle_shows_and_hides() {
        let mut panel = Panel::new();
        assert!(!panel.is_visible());
        assert_eq!(panel.apply(Intent::Toggle), Effect::ClearInput);
        assert!(panel.is_visible());
        assert_eq!(panel.focus(), Focus::Input);
        assert_eq!(panel.apply(Intent::Toggle), Effect::Blur);
        assert!(!panel.is_visible());
        assert_eq!(panel.focus(), Focus::None);
    }

    #[test]
    fn down_walks_results_and_stops_at_last() {
        let mut panel = open_with(3);
        assert_eq!(panel.apply(Intent::Next), Effect::Focus(Focus::Result(0)));
        assert_eq!(panel.apply(Intent::Next), Effect::Focus(Focus::Result(1)));
        assert_eq!(panel.apply(Intent::Next), Effect::Focus(Focus::Result(2)));
        assert_eq!(panel.apply(Intent::Next), Effect::Focus(Focus::Result(2)));
    }

    #[test]
    fn up_returns_to_input() {
        let mut panel = open_with(2);
        panel.apply(Intent::Next);
        panel.apply(Intent::Next);
        assert_eq!(panel.apply(Intent::Prev), Effect::Focus(Focus::Result(0)));
        assert_eq!(panel.apply(Intent::Prev), Effect::Focus(Focus::Input));
        assert_eq!(panel.apply(Intent::Prev), Effect::Focus(Focus::Input));
    }

    #[test]
    fn navigation_needs_visible_panel_and_results() {
        let mut panel = open_with(0);
        assert_eq!(panel.apply(Intent::Next), Effect::Nothing);
        assert!(panel.is_visible());

        let mut hidden = Panel::new();
        hidden.set_results(5);
        assert_eq!(hidden.apply(Intent::Next), Effect::Nothing);
        assert_eq!(hidden.apply(Intent::Close), Effect::Nothing);
    }

    #[test]
    fn submit_opens_focused_result() {
        let mut panel = open_with(2);
        panel.apply(Intent::Next);
        panel.apply(Intent::Next);
        assert_eq!(panel.apply(Intent::Submit), Effect::Open(1));
        assert!(!panel.is_visible());

        let mut panel = open_with(2);
        assert_eq!(panel.apply(Intent::Submit), Effect::Blur);
    }

    #[test]
    fn shrinking_results_resets_focus() {
        let mut panel = open_with(4);
        for _ in 0..4 {
            panel.apply(Intent::Next);
        }
        assert_eq!(panel.focus(), Focus::Result(3));
        panel.set_results(2);
        assert_eq!(panel.focus(), Focus::Input);
    }

    #[test]
    fn escape_and_outside_click_close() {
        let mut panel = open_with(1);
        assert_eq!(panel.apply(Intent::ClickOutside), Effect::Blur);
        panel.apply(Intent::Toggle);
        assert_eq!(panel.apply(Intent::Close), Effect::Blur);
    }

    #[test]
    fn key_bindings() {
        assert_eq!(Intent::from_key("p", true), Some(Intent::Toggle));
        assert_eq!(Intent::from_key("p", false), None);
        assert_eq!(Intent::from_key("Escape", false), Some(Intent::Close));
        assert_eq!(Intent::from_key("ArrowDown", false), Some(Intent::Next));
        assert_eq!(Intent::from_key("ArrowUp", true), Some(Intent::Prev));
        assert_eq!(Intent::from_key("Enter", false), Some(Intent::Submit));
    }
}
