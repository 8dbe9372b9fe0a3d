use crate::models::Robot;

/// In-memory list of known robots with a derived, installation-filtered view.
///
/// Records are unique by id and keep their first-seen position: an upsert
/// replaces in place, a new arrival is appended. The filtered view is a pure
/// function of the list and the active installation code and is recomputed
/// on demand, never patched incrementally.
#[derive(Debug)]
pub struct RobotRegistry {
    robots: Vec<Robot>,
    active_installation: String,
}

impl RobotRegistry {
    pub fn new(active_installation: impl Into<String>) -> Self {
        Self {
            robots: Vec::new(),
            active_installation: active_installation.into(),
        }
    }

    /// Insert-or-replace by id. Replacement keeps the record's position.
    pub fn upsert(&mut self, robot: Robot) {
        match self.robots.iter_mut().find(|r| r.id == robot.id) {
            Some(slot) => *slot = robot,
            None => self.robots.push(robot),
        }
    }

    /// Remove the record with the given id. Returns whether anything was
    /// removed; a missing id is a no-op, not an error.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.robots.len();
        self.robots.retain(|r| r.id != id);
        self.robots.len() != before
    }

    /// Fold a bulk-fetch result into the list by upserting each record.
    ///
    /// The fetch races freely with push events, so the result must not
    /// replace the list wholesale: events applied before a slow fetch
    /// resolves would be wiped. Merging record by record keeps them.
    pub fn merge_fetched(&mut self, robots: Vec<Robot>) {
        for robot in robots {
            self.upsert(robot);
        }
    }

    pub fn set_active_installation(&mut self, code: impl Into<String>) {
        self.active_installation = code.into();
    }

    pub fn active_installation(&self) -> &str {
        &self.active_installation
    }

    pub fn all(&self) -> &[Robot] {
        &self.robots
    }

    pub fn len(&self) -> usize {
        self.robots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.robots.is_empty()
    }

    /// The subsequence of robots whose installation code matches the active
    /// code, compared case-insensitively.
    pub fn visible(&self) -> Vec<Robot> {
        self.robots
            .iter()
            .filter(|r| {
                r.current_installation
                    .installation_code
                    .eq_ignore_ascii_case(&self.active_installation)
            })
            .cloned()
            .collect()
    }
}
