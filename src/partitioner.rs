use std::{ops::Index, panic, thread};

use crate::partition::Partition;

/// Fewer rows than this per worker are not worth a thread.
pub const MIN_ITEMS_PER_PARTITION: usize = 256;

/// Number of worker threads the machine offers, falling back to 1.
pub fn available_workers() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// Splits operator rows, mask slots or harness cases into contiguous runs
/// processed on scoped threads. Results come back in index order.
#[derive(Hash, Debug, Clone, PartialEq, Default)]
pub struct Partitioner {
    partitions: Vec<Partition>
}

impl Index<usize> for Partitioner {
    type Output = Partition;

    fn index(&self, index: usize) -> &Self::Output {
        &self.partitions[index]
    }
}

impl Partitioner {
    /// Splits `count` items into at most `workers` runs whose sizes differ by no more than 1,
    /// the larger runs first. Nothing to do means no partitions.
    pub fn with_partitions(count: usize, workers: usize) -> Self {
        if count == 0 {
            return Self::default();
        }

        let workers = workers.clamp(1, count);
        let (base, extra) = (count / workers, count % workers);
        let partitions = (0..workers)
            .scan(0, |start, worker| {
                let len = base + usize::from(worker < extra);
                let partition = Partition::new(*start, *start + len);
                *start += len;
                Some(partition)
            })
            .collect();

        Self { partitions }
    }

    /// Like `with_partitions`, but keeps small builds on the calling thread.
    pub fn for_workload(count: usize, workers: usize) -> Self {
        let useful = (count / MIN_ITEMS_PER_PARTITION).max(1);
        Self::with_partitions(count, workers.clamp(1, useful))
    }

    pub fn len(&self) -> usize { self.partitions.len() }

    pub fn is_empty(&self) -> bool { self.partitions.is_empty() }

    /// Runs `work` on every partition and concatenates what each returns.
    /// A panic in any worker is re-raised on the caller.
    pub fn parallelized<T, F>(&self, work: F) -> Vec<T>
    where
        F: Fn(&Partition) -> Vec<T> + Sync,
        T: Send
    {
        if let [only] = self.partitions.as_slice() {
            return work(only);
        }

        let work = &work;
        thread::scope(|scope| {
            let handles: Vec<_> = self.partitions.iter()
                .map(|partition| scope.spawn(move || work(partition)))
                .collect();

            let mut values = Vec::new();
            for handle in handles {
                values.extend(handle.join().unwrap_or_else(|payload| panic::resume_unwind(payload)));
            }
            values
        })
    }
}
