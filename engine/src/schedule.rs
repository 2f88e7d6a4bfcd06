//! Interval and conflict detection for time-bound items.
//!
//! Two items can only collide when they start on the same calendar date, as seen
//! from the event's UTC offset. Within a date, the [`ConflictPolicy`] decides what
//! counts as a collision. The default is containment: a candidate is blocked by a
//! selected item only when it lies entirely inside that item's span.

use crate::selection::SelectionSet;
use crate::types::{Catalog, Interval, SelectableItem};
use chrono::{FixedOffset, NaiveDate, NaiveTime, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Containment rule: `a` is blocked by `b` when `a` lies within `b`
#[must_use]
pub fn conflicts(a: &Interval, b: &Interval) -> bool {
    a.is_within(b)
}

/// What counts as a scheduling conflict
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Candidate contained within a selected item's span
    #[default]
    Containment,
    /// Any overlap of the half-open spans
    Overlap,
}

impl ConflictPolicy {
    /// Whether `candidate` is blocked by `selected`
    #[must_use]
    pub fn conflicts(self, candidate: &Interval, selected: &Interval) -> bool {
        match self {
            Self::Containment => conflicts(candidate, selected),
            Self::Overlap => candidate.overlaps(selected),
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Containment => f.write_str("containment"),
            Self::Overlap => f.write_str("overlap"),
        }
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "containment" => Ok(Self::Containment),
            "overlap" => Ok(Self::Overlap),
            other => Err(format!("unknown conflict policy '{other}'")),
        }
    }
}

/// Items starting at the same time of day
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeSlot<'a> {
    /// Local start time
    pub time: NaiveTime,
    /// Items in input order
    pub items: Vec<&'a SelectableItem>,
}

/// Items starting on the same calendar date, split by start time
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateGroup<'a> {
    /// Local calendar date
    pub date: NaiveDate,
    /// Time slots in chronological order
    pub slots: Vec<TimeSlot<'a>>,
}

/// Conflict policy plus the offset used to derive calendar dates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduleRules {
    /// Collision rule
    pub policy: ConflictPolicy,
    /// UTC offset of the event's local time
    pub offset: FixedOffset,
}

impl Default for ScheduleRules {
    fn default() -> Self {
        Self::new(ConflictPolicy::default(), Utc.fix())
    }
}

impl ScheduleRules {
    /// Creates rules from a policy and offset
    #[must_use]
    pub const fn new(policy: ConflictPolicy, offset: FixedOffset) -> Self {
        Self { policy, offset }
    }

    /// Local calendar date on which the interval starts
    #[must_use]
    pub fn calendar_date(&self, interval: &Interval) -> NaiveDate {
        interval.start().with_timezone(&self.offset).date_naive()
    }

    /// Local time of day at which the interval starts
    #[must_use]
    pub fn start_time(&self, interval: &Interval) -> NaiveTime {
        interval.start().with_timezone(&self.offset).time()
    }

    /// Whether `candidate` is blocked by `selected` under these rules
    #[must_use]
    pub fn collides(&self, candidate: &Interval, selected: &Interval) -> bool {
        self.calendar_date(candidate) == self.calendar_date(selected)
            && self.policy.conflicts(candidate, selected)
    }

    /// Every selected or committed item the candidate collides with, in selection order
    #[must_use]
    pub fn collisions<'a>(
        &self,
        candidate: &SelectableItem,
        selection: &SelectionSet,
        catalog: &'a Catalog,
    ) -> Vec<&'a SelectableItem> {
        let Some(interval) = candidate.interval else {
            return Vec::new();
        };

        selection
            .iter()
            .filter(|entry| entry.id != candidate.id)
            .filter_map(|entry| catalog.get(&entry.id))
            .filter(|other| {
                other
                    .interval
                    .is_some_and(|selected| self.collides(&interval, &selected))
            })
            .collect()
    }

    /// Whether selecting `candidate` would violate the schedule
    ///
    /// Committed candidates are never disabled: they are already booked and can
    /// only leave through withdrawal.
    #[must_use]
    pub fn is_disabled(
        &self,
        candidate: &SelectableItem,
        selection: &SelectionSet,
        catalog: &Catalog,
    ) -> bool {
        !selection.is_committed(&candidate.id)
            && !self.collisions(candidate, selection, catalog).is_empty()
    }

    /// Groups time-bound items by local date, then by local start time
    ///
    /// Dates and times are chronological; items sharing a slot keep input order.
    /// Items without an interval are left out.
    #[must_use]
    pub fn group_by_date_and_time<'a, I>(&self, items: I) -> Vec<DateGroup<'a>>
    where
        I: IntoIterator<Item = &'a SelectableItem>,
    {
        let mut timed: Vec<(NaiveDate, NaiveTime, &'a SelectableItem)> = items
            .into_iter()
            .filter_map(|item| {
                item.interval.map(|interval| {
                    (self.calendar_date(&interval), self.start_time(&interval), item)
                })
            })
            .collect();
        timed.sort_by_key(|&(date, time, _)| (date, time));

        let mut groups: Vec<DateGroup<'a>> = Vec::new();
        for (date, time, item) in timed {
            match groups.last_mut() {
                Some(group) if group.date == date => match group.slots.last_mut() {
                    Some(slot) if slot.time == time => slot.items.push(item),
                    _ => group.slots.push(TimeSlot {
                        time,
                        items: vec![item],
                    }),
                },
                _ => groups.push(DateGroup {
                    date,
                    slots: vec![TimeSlot {
                        time,
                        items: vec![item],
                    }],
                }),
            }
        }
        groups
    }
}
