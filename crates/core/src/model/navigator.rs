/// Pointer to the question currently on screen, clamped to `[0, total - 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigator {
    current: usize,
    total: usize,
}

impl Navigator {
    /// Creates a navigator over `total` questions positioned at the first one.
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self { current: 0, total }
    }

    #[must_use]
    pub fn current(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Moves to `index`, clamped into range. Returns the resulting position.
    pub fn go_to(&mut self, index: usize) -> usize {
        self.current = index.min(self.total.saturating_sub(1));
        self.current
    }

    pub fn next(&mut self) -> usize {
        self.go_to(self.current.saturating_add(1))
    }

    pub fn previous(&mut self) -> usize {
        self.go_to(self.current.saturating_sub(1))
    }

    #[must_use]
    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_both_ends() {
        let mut nav = Navigator::new(3);
        assert_eq!(nav.go_to(10), 2);
        assert!(nav.is_last());
        assert_eq!(nav.next(), 2);
        assert_eq!(nav.go_to(0), 0);
        assert_eq!(nav.previous(), 0);
        assert!(nav.is_first());
    }

    #[test]
    fn steps_without_wraparound() {
        let mut nav = Navigator::new(3);
        assert_eq!(nav.next(), 1);
        assert_eq!(nav.next(), 2);
        assert_eq!(nav.next(), 2);
        assert_eq!(nav.previous(), 1);
    }
}
