//! Virtual-time queue for delayed controller messages.
//!
//! The controller never sleeps; it returns [`Cmd::After`] and expects the
//! host to deliver the message later. Hosts with a real timer API can map
//! each `After` to one timer. Hosts without one, and the tests, feed elapsed
//! time into a [`Scheduler`] and let it replay due messages in order.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

use crate::controller::{Cmd, FilterController, FilterMsg};
use crate::host::HostPage;

#[derive(Debug)]
struct Scheduled {
    due: Duration,
    seq: u64,
    msg: FilterMsg,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due
            .cmp(&other.due)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    now: Duration,
    seq: u64,
    queue: BinaryHeap<Reverse<Scheduled>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed since the scheduler was created.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.queue.peek().map(|Reverse(item)| item.due)
    }

    /// Queue every delayed message in `cmd`, relative to the current time.
    pub fn push(&mut self, cmd: Cmd) {
        match cmd {
            Cmd::None => {}
            Cmd::After(delay, msg) => {
                self.seq += 1;
                self.queue.push(Reverse(Scheduled {
                    due: self.now + delay,
                    seq: self.seq,
                    msg,
                }));
            }
            Cmd::Batch(cmds) => {
                for cmd in cmds {
                    self.push(cmd);
                }
            }
        }
    }

    /// Pop the earliest message due at or before `at`, moving the clock to
    /// its due time.
    pub fn pop_due(&mut self, at: Duration) -> Option<FilterMsg> {
        if self.next_due()? > at {
            return None;
        }
        let Reverse(item) = self.queue.pop()?;
        self.now = self.now.max(item.due);
        Some(item.msg)
    }

    /// Advance the clock by `elapsed`, delivering due messages to the
    /// controller (including ones scheduled by those messages that fall due
    /// within the window). Returns the number of delivered messages.
    pub fn advance<H: HostPage>(
        &mut self,
        controller: &mut FilterController<H>,
        elapsed: Duration,
    ) -> usize {
        let target = self.now + elapsed;
        let mut delivered = 0;
        while let Some(msg) = self.pop_due(target) {
            let cmd = controller.update(msg);
            self.push(cmd);
            delivered += 1;
        }
        self.now = target;
        delivered
    }
}
