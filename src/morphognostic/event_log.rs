//! Age-bounded event window for short-term memory.

use std::collections::VecDeque;

/// A timestamped, located observation vector.
///
/// A value of [`UNKNOWN_VALUE`](crate::params::UNKNOWN_VALUE) marks a
/// dimension that was not observed at this step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub values: Vec<i32>,
    pub x: i32,
    pub y: i32,
    pub time: i32,
}

impl Event {
    #[must_use]
    pub fn new(values: &[i32], x: i32, y: i32, time: i32) -> Self {
        Self {
            values: values.to_vec(),
            x,
            y,
            time,
        }
    }

    /// Age of this event relative to `now`, saturating at the `i32` bounds.
    #[must_use]
    pub const fn age(&self, now: i32) -> i32 {
        now.saturating_sub(self.time)
    }
}

/// A sliding window of events whose age is within `[0, max_age]`.
///
/// Events are kept oldest first, so scans are deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLog {
    events: VecDeque<Event>,
    max_age: i32,
}

impl EventLog {
    /// Creates an empty log retaining events up to `max_age` steps old.
    #[must_use]
    pub fn new(max_age: i32) -> Self {
        Self {
            events: VecDeque::with_capacity(usize::try_from(max_age).unwrap_or(0) + 1),
            max_age,
        }
    }

    /// Appends an event stamped `time`, then drops events older than `max_age`.
    pub fn append(&mut self, values: &[i32], x: i32, y: i32, time: i32) {
        self.push(Event::new(values, x, y, time));
    }

    /// Appends an already built event and trims against its timestamp.
    pub fn push(&mut self, event: Event) {
        let now = event.time;
        self.events.push_back(event);
        while self
            .events
            .front()
            .is_some_and(|oldest| oldest.age(now) > self.max_age)
        {
            self.events.pop_front();
        }
    }

    /// Appends without trimming. Used when restoring persisted state verbatim.
    pub(crate) fn restore(&mut self, event: Event) {
        self.events.push_back(event);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub const fn max_age(&self) -> i32 {
        self.max_age
    }

    /// Gets an event by index (0 = oldest).
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    /// Returns the most recently appended event.
    #[must_use]
    pub fn last(&self) -> Option<&Event> {
        self.events.back()
    }

    /// Iterates from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Event> {
        self.events.iter_mut()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_len() {
        let mut log = EventLog::new(3);
        assert!(log.is_empty());

        log.append(&[1], 0, 0, 0);
        assert_eq!(log.len(), 1);
        log.append(&[2], 0, 0, 1);
        log.append(&[3], 0, 0, 2);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_window_drops_old_events() {
        let mut log = EventLog::new(2);
        for t in 0..6 {
            log.append(&[t], 0, 0, t);
        }

        assert_eq!(log.len(), 3);
        let times: Vec<_> = log.iter().map(|e| e.time).collect();
        assert_eq!(times, vec![3, 4, 5]);
    }

    #[test]
    fn test_time_gap_drops_several() {
        let mut log = EventLog::new(2);
        log.append(&[1], 0, 0, 0);
        log.append(&[1], 0, 0, 1);
        log.append(&[1], 0, 0, 2);
        log.append(&[1], 0, 0, 10);

        assert_eq!(log.len(), 1);
        assert_eq!(log.get(0).unwrap().time, 10);
    }

    #[test]
    fn test_zero_age_keeps_only_newest() {
        let mut log = EventLog::new(0);
        log.append(&[1], 0, 0, 0);
        log.append(&[2], 1, 1, 1);

        assert_eq!(log.len(), 1);
        assert_eq!(log.last().unwrap().values, vec![2]);
    }

    #[test]
    fn test_get_ordering() {
        let mut log = EventLog::new(5);
        log.append(&[10], 0, 0, 0);
        log.append(&[20], 0, 0, 1);
        log.append(&[30], 0, 0, 2);

        assert_eq!(log.get(0).unwrap().values, vec![10]);
        assert_eq!(log.get(2).unwrap().values, vec![30]);
        assert!(log.get(3).is_none());
    }

    #[test]
    fn test_age_saturates() {
        let event = Event::new(&[1], 0, 0, i32::MIN);
        assert_eq!(event.age(5), i32::MAX);
        let future = Event::new(&[1], 0, 0, i32::MAX);
        assert_eq!(future.age(-5), i32::MIN);
    }

    #[test]
    fn test_clear() {
        let mut log = EventLog::new(4);
        log.append(&[1], 0, 0, 0);
        log.append(&[2], 0, 0, 1);
        log.clear();

        assert!(log.is_empty());
        assert!(log.last().is_none());
    }
}
