/// Ordered slice of work items owned by one worker process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkPartition {
    items: Vec<String>,
}

impl WorkPartition {
    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<String> {
        self.items
    }
}

/// Deal `items` round-robin into exactly `workers` partitions.
///
/// Item `i` lands in partition `i % workers`, so each partition keeps
/// discovery order and sizes differ by at most one. A worker count of zero
/// is treated as one.
pub fn partition_round_robin<I>(items: I, workers: usize) -> Vec<WorkPartition>
where
    I: IntoIterator<Item = String>,
{
    let workers = workers.max(1);
    let mut partitions = vec![WorkPartition::default(); workers];
    for (index, item) in items.into_iter().enumerate() {
        partitions[index % workers].items.push(item);
    }
    partitions
}
