use std::time::{Duration, Instant};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Trailing-edge debounce for snapshot writes: every change pushes the
/// deadline out to `debounce` after the latest change.
#[derive(Debug, Clone)]
pub struct Autosave {
    debounce: Duration,
    deadline: Option<Instant>,
}

impl Autosave {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            deadline: None,
        }
    }

    pub fn touch(&mut self, now: Instant) {
        self.deadline = Some(now + self.debounce);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_dirty(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }

    pub fn clear(&mut self) {
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_changes_push_the_deadline_out() {
        let mut a = Autosave::new(Duration::from_millis(500));
        let t0 = Instant::now();
        a.touch(t0);
        a.touch(t0 + Duration::from_millis(300));
        assert!(!a.due(t0 + Duration::from_millis(600)));
        assert!(a.due(t0 + Duration::from_millis(800)));
        a.clear();
        assert!(!a.is_dirty());
        assert!(!a.due(t0 + Duration::from_secs(10)));
    }
}
