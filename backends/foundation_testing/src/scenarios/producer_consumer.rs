//! Many-producer, many-consumer pipeline through one `BoundedQueue`.

use foundation_sync::{BoundedQueue, SyncResult};
use std::collections::HashMap;
use std::thread;

/// One item as it travelled through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Item {
    /// Index of the producer that pushed it
    pub producer: usize,
    /// Position in that producer's push order, from 0
    pub sequence: usize,
}

/// Shape of a pipeline run.
///
/// Producers each push `items_per_producer` items. Once every producer is
/// done, one `None` end marker per consumer is pushed, and each consumer
/// stops at the first marker it pops.
///
/// # Examples
///
/// ```
/// use foundation_testing::scenarios::Pipeline;
///
/// let report = Pipeline::new(8, 3).items_per_producer(50).capacity(4).run().unwrap();
///
/// assert_eq!(report.total(), 400);
/// assert!(report.is_complete(8, 50));
/// assert!(report.is_fifo_per_producer());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Pipeline {
    producers: usize,
    consumers: usize,
    items_per_producer: usize,
    capacity: usize,
}

/// What each consumer received, in the order it popped them.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// One list per consumer that finished
    pub received: Vec<Vec<Item>>,
    /// Worker threads that panicked before finishing
    pub panicked: usize,
}

impl Pipeline {
    /// Defaults to 10 items per producer through a 4-slot queue.
    #[must_use]
    pub const fn new(producers: usize, consumers: usize) -> Self {
        Self {
            producers,
            consumers,
            items_per_producer: 10,
            capacity: 4,
        }
    }

    /// Sets how many items each producer pushes.
    #[must_use]
    pub const fn items_per_producer(mut self, count: usize) -> Self {
        self.items_per_producer = count;
        self
    }

    /// Sets the queue capacity. Zero makes [`Pipeline::run`] fail.
    #[must_use]
    pub const fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Runs the pipeline to completion.
    ///
    /// # Errors
    ///
    /// Fails when the queue capacity is zero.
    pub fn run(self) -> SyncResult<PipelineReport> {
        let queue = BoundedQueue::<Option<Item>>::new(self.capacity)?;
        let queue = &queue;

        let report = thread::scope(|scope| {
            let consumers: Vec<_> = (0..self.consumers)
                .map(|_| {
                    scope.spawn(move || {
                        let mut received = Vec::new();
                        while let Some(item) = queue.pop() {
                            received.push(item);
                        }
                        received
                    })
                })
                .collect();

            let producers: Vec<_> = (0..self.producers)
                .map(|producer| {
                    scope.spawn(move || {
                        for sequence in 0..self.items_per_producer {
                            queue.push(Some(Item { producer, sequence }));
                        }
                    })
                })
                .collect();

            let mut report = PipelineReport::default();
            report.panicked += producers
                .into_iter()
                .map(thread::ScopedJoinHandle::join)
                .filter(Result::is_err)
                .count();

            for _ in 0..self.consumers {
                queue.push(None);
            }

            for consumer in consumers {
                match consumer.join() {
                    Ok(received) => report.received.push(received),
                    Err(_) => report.panicked += 1,
                }
            }
            report
        });

        tracing::debug!(
            total = report.total(),
            panicked = report.panicked,
            "pipeline finished"
        );
        Ok(report)
    }
}

impl PipelineReport {
    /// Items received across all consumers.
    #[must_use]
    pub fn total(&self) -> usize {
        self.received.iter().map(Vec::len).sum()
    }

    /// True when every consumer saw each producer's items in increasing
    /// sequence order.
    #[must_use]
    pub fn is_fifo_per_producer(&self) -> bool {
        self.received.iter().all(|items| {
            let mut last: HashMap<usize, usize> = HashMap::new();
            items.iter().all(|item| {
                let in_order = last.get(&item.producer).is_none_or(|previous| *previous < item.sequence);
                last.insert(item.producer, item.sequence);
                in_order
            })
        })
    }

    /// True when every `(producer, sequence)` pair arrived exactly once.
    #[must_use]
    pub fn is_complete(&self, producers: usize, items_per_producer: usize) -> bool {
        let mut seen = vec![vec![false; items_per_producer]; producers];
        for item in self.received.iter().flatten() {
            let Some(slot) = seen
                .get_mut(item.producer)
                .and_then(|row| row.get_mut(item.sequence))
            else {
                return false;
            };
            if *slot {
                return false;
            }
            *slot = true;
        }
        seen.iter().flatten().all(|delivered| *delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_fails() {
        assert!(Pipeline::new(1, 1).capacity(0).run().unwrap_err().is_invalid_argument());
    }

    /// WHY: A single slot forces a handoff on every item
    /// WHAT: One producer, one consumer, capacity 1 delivers everything in order
    #[test]
    #[ntest::timeout(10000)]
    fn test_single_slot_pipeline() {
        let report = Pipeline::new(1, 1).items_per_producer(200).capacity(1).run().unwrap();
        let sequences: Vec<usize> = report.received[0].iter().map(|item| item.sequence).collect();
        assert_eq!(sequences, (0..200).collect::<Vec<_>>());
        assert_eq!(report.panicked, 0);
    }

    #[test]
    fn test_report_checks() {
        let item = |producer, sequence| Item { producer, sequence };
        let report = PipelineReport {
            received: vec![vec![item(0, 1), item(0, 0)], vec![item(1, 0)]],
            panicked: 0,
        };
        assert!(!report.is_fifo_per_producer());
        assert!(!report.is_complete(2, 1));
        assert!(!PipelineReport::default().is_complete(1, 1));
        assert!(PipelineReport::default().is_complete(0, 0));
    }
}
