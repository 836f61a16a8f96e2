// Copyright 2018 Kodebox, Inc.
// This file is part of CodeChain.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::collections::VecDeque;

use backtrack_engine::{CheckpointGroup, Rollbackable, Timestamp};

use crate::config::Retention;
use crate::error::Error;

/// Restore points over one checkpoint group.
///
/// `checkpoint` returns a point; `rollback` to that point brings every
/// attached object back to the state it had when the point was taken.
/// Points are kept oldest first. Committing a point, or exceeding the
/// retention limit, forgets the points before it together with the history
/// only they needed.
pub struct Timeline {
    group: CheckpointGroup,
    points: VecDeque<Timestamp>,
    max_restore_points: Option<usize>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::with_retention(&Retention::default())
    }

    pub fn with_retention(retention: &Retention) -> Self {
        Self {
            group: CheckpointGroup::new(),
            points: VecDeque::new(),
            max_restore_points: retention.max_restore_points.map(|max| max.max(1)),
        }
    }

    pub fn group(&self) -> CheckpointGroup {
        self.group.resolve()
    }

    /// Put `object`, and everything in its group, on this timeline.
    ///
    /// Rolling back to a point taken before the call detaches it again.
    pub fn attach<R>(&self, object: &R)
    where
        R: Rollbackable + ?Sized, {
        object.set_checkpoint_group(&self.group());
    }

    /// Take a restore point.
    pub fn checkpoint(&mut self) -> Timestamp {
        let point = self.group.open();
        self.points.push_back(point);
        cdebug!(TIMELINE, "Restore point {} taken", point);
        self.enforce_retention();
        point
    }

    fn enforce_retention(&mut self) {
        let max = match self.max_restore_points {
            Some(max) => max,
            None => return,
        };
        if self.points.len() <= max {
            return
        }
        let excess = self.points.len() - max;
        self.points.drain(..excess);
        let oldest = *self.points.front().expect("max is at least one; qed");
        ctrace!(TIMELINE, "Retention committed {} restore points", excess);
        self.group.commit(oldest - 1);
    }

    fn position(&self, point: Timestamp) -> Result<usize, Error> {
        self.points.iter().position(|p| *p == point).ok_or(Error::UnknownRestorePoint(point))
    }

    /// Bring every attached object back to its state at `point`.
    ///
    /// `point` stays available; newer points are dropped along with the
    /// history they covered.
    pub fn rollback(&mut self, point: Timestamp) -> Result<(), Error> {
        let index = self.position(point)?;
        self.group.restore(point - 1, true);
        self.points.truncate(index + 1);
        cinfo!(TIMELINE, "Rolled back to restore point {}", point);
        Ok(())
    }

    /// Roll back to the newest restore point and drop it.
    pub fn rollback_last(&mut self) -> Option<Timestamp> {
        let point = *self.points.back()?;
        self.group.restore(point - 1, true);
        self.points.pop_back();
        cinfo!(TIMELINE, "Rolled back to restore point {}", point);
        Some(point)
    }

    /// Make `point` the oldest restore point, forgetting older ones.
    pub fn commit(&mut self, point: Timestamp) -> Result<(), Error> {
        let index = self.position(point)?;
        self.points.drain(..index);
        self.group.commit(point - 1);
        cdebug!(TIMELINE, "Committed up to restore point {}", point);
        Ok(())
    }

    /// Available restore points, oldest first.
    pub fn restore_points(&self) -> Vec<Timestamp> {
        self.points.iter().cloned().collect()
    }

    /// The oldest restore point.
    pub fn horizon(&self) -> Option<Timestamp> {
        self.points.front().cloned()
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backtrack_engine::{versioned, Anchor, Versioned};

    #[derive(Rollbackable)]
    struct Cell {
        #[rollback(anchor)]
        anchor: Anchor,
        value: Versioned<u32>,
    }

    fn cell(timeline: &Timeline) -> std::rc::Rc<Cell> {
        let cell = versioned(|anchor| Cell {
            anchor,
            value: Versioned::new(0),
        });
        timeline.attach(&*cell);
        cell
    }

    #[test]
    fn rollback_returns_to_the_checkpoint() {
        let mut timeline = Timeline::new();
        let c = cell(&timeline);
        c.value.set(&c.anchor, 1);
        let p1 = timeline.checkpoint();
        c.value.set(&c.anchor, 2);
        let p2 = timeline.checkpoint();
        c.value.set(&c.anchor, 3);

        timeline.rollback(p2).unwrap();
        assert_eq!(c.value.get(), 2);
        assert_eq!(timeline.restore_points(), vec![p1, p2]);

        c.value.set(&c.anchor, 7);
        timeline.rollback(p2).unwrap();
        assert_eq!(c.value.get(), 2);

        timeline.rollback(p1).unwrap();
        assert_eq!(c.value.get(), 1);
        assert_eq!(timeline.restore_points(), vec![p1]);
        assert!(timeline.rollback(p2).is_err());
    }

    #[test]
    fn rollback_last_walks_back() {
        let mut timeline = Timeline::new();
        let c = cell(&timeline);
        for value in 1..=3 {
            timeline.checkpoint();
            c.value.set(&c.anchor, value);
        }
        assert_eq!(timeline.rollback_last(), Some(3));
        assert_eq!(c.value.get(), 2);
        assert_eq!(timeline.rollback_last(), Some(2));
        assert_eq!(c.value.get(), 1);
        assert_eq!(timeline.rollback_last(), Some(1));
        assert_eq!(c.value.get(), 0);
        assert_eq!(timeline.rollback_last(), None);
    }

    #[test]
    fn commit_forgets_older_points() {
        let mut timeline = Timeline::new();
        let c = cell(&timeline);
        let p1 = timeline.checkpoint();
        c.value.set(&c.anchor, 1);
        let p2 = timeline.checkpoint();
        c.value.set(&c.anchor, 2);

        timeline.commit(p2).unwrap();
        assert_eq!(timeline.horizon(), Some(p2));
        assert_eq!(c.value.history_len(), 1);
        match timeline.rollback(p1) {
            Err(Error::UnknownRestorePoint(point)) => assert_eq!(point, p1),
            other => panic!("Unexpected result: {:?}", other),
        }
        timeline.rollback(p2).unwrap();
        assert_eq!(c.value.get(), 1);
    }

    #[test]
    fn retention_keeps_the_newest_points() {
        let mut timeline = Timeline::with_retention(&Retention {
            max_restore_points: Some(2),
        });
        let c = cell(&timeline);
        let mut points = Vec::new();
        for value in 1..=5 {
            points.push(timeline.checkpoint());
            c.value.set(&c.anchor, value);
        }
        assert_eq!(timeline.restore_points(), points[3..].to_vec());
        assert_eq!(c.value.history_len(), 2);

        timeline.rollback(points[3]).unwrap();
        assert_eq!(c.value.get(), 3);
    }

    #[test]
    fn attaching_to_an_idle_timeline_keeps_older_points() {
        let mut a = Timeline::new();
        let b = Timeline::new();
        let x = versioned(|anchor| Cell {
            anchor,
            value: Versioned::new(0),
        });
        let private = x.checkpoint_group();

        let p1 = a.checkpoint();
        a.attach(&*x);
        x.value.set(&x.anchor, 5);
        b.attach(&*x);
        assert_eq!(a.group(), b.group());

        a.rollback(p1).unwrap();
        assert_eq!(x.value.get(), 0);
        assert_eq!(x.checkpoint_group(), private);
        assert_eq!(a.restore_points(), vec![p1]);
    }
}
