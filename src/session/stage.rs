/// Status of one pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StageStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

impl StageStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, StageStatus::Loading)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, StageStatus::Error)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StageStatus::Success)
    }
}

/// Identifies one triggered call of a stage. A completion is only applied
/// when its ticket is still the stage's current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub(crate) generation: u64,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Per-stage slot: status plus a monotonically increasing generation counter
#[derive(Debug, Clone, Default)]
pub struct Stage {
    status: StageStatus,
    generation: u64,
}

impl Stage {
    pub fn status(&self) -> StageStatus {
        self.status
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a new call, superseding any call still in flight
    pub fn begin(&mut self) -> Ticket {
        self.generation += 1;
        self.status = StageStatus::Loading;
        Ticket {
            generation: self.generation,
        }
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.generation == self.generation
    }

    /// Forget any in-flight call and go back to idle
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.status = StageStatus::Idle;
    }

    /// Close out `ticket` with `status`; returns false if the ticket is stale
    pub fn finish(&mut self, ticket: Ticket, status: StageStatus) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.status = status;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_supersedes_previous_ticket() {
        let mut stage = Stage::default();
        let first = stage.begin();
        let second = stage.begin();

        assert!(!stage.is_current(first));
        assert!(stage.is_current(second));
        assert!(!stage.finish(first, StageStatus::Success));
        assert_eq!(stage.status(), StageStatus::Loading);
        assert!(stage.finish(second, StageStatus::Success));
        assert_eq!(stage.status(), StageStatus::Success);
    }

    #[test]
    fn test_invalidate_orphans_in_flight_ticket() {
        let mut stage = Stage::default();
        let ticket = stage.begin();
        stage.invalidate();

        assert_eq!(stage.status(), StageStatus::Idle);
        assert!(!stage.finish(ticket, StageStatus::Error));
        assert_eq!(stage.status(), StageStatus::Idle);
    }

    #[test]
    fn test_generation_is_monotonic() {
        let mut stage = Stage::default();
        let mut last = stage.generation();
        for _ in 0..5 {
            stage.begin();
            assert!(stage.generation() > last);
            last = stage.generation();
            stage.invalidate();
            assert!(stage.generation() > last);
            last = stage.generation();
        }
    }
}
