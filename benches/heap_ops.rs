//! Benchmarks for linked heap operations.
//!
//! Compares the linked heap's push/pop against `std::collections::BinaryHeap`
//! and measures the operation arrays have no equivalent for: removal from
//! the middle by handle.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use linked_heap::{HeapLinked, HeapNode, LinkedHeap, Pool, Storage};

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

struct Item {
    priority: u64,
    node: HeapNode<u32>,
}

impl Item {
    fn new(priority: u64) -> Self {
        Self {
            priority,
            node: HeapNode::new(),
        }
    }
}

impl HeapLinked<u32> for Item {
    fn heap_node(&self) -> &HeapNode<u32> {
        &self.node
    }
    fn heap_node_mut(&mut self) -> &mut HeapNode<u32> {
        &mut self.node
    }
}

impl Ord for Item {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority.cmp(&other.priority)
    }
}

impl PartialOrd for Item {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}

impl Eq for Item {}

/// Deterministic scramble so both contenders see the same priorities.
fn priority(i: usize, size: usize) -> u64 {
    ((i * 7 + 13) % size) as u64
}

fn loaded(size: usize) -> (Pool<Item>, LinkedHeap<u32>) {
    let mut pool: Pool<Item> = Pool::with_capacity(size);
    let mut heap: LinkedHeap<u32> = LinkedHeap::new();
    for i in 0..size {
        let idx = pool.try_insert(Item::new(priority(i, size))).unwrap();
        heap.push(&mut pool, idx);
    }
    (pool, heap)
}

fn bench_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_pop");

    for size in [64usize, 1024, 16384] {
        // Pop the minimum and push it back with a rotated priority, the
        // steady-state cycle of a timer queue.
        group.bench_with_input(BenchmarkId::new("linked_heap", size), &size, |b, &size| {
            let (mut pool, mut heap) = loaded(size);
            let mut i = 0u64;
            b.iter(|| {
                let idx = heap.pop(&mut pool).unwrap();
                pool.get_mut(idx).unwrap().priority = i % size as u64;
                heap.push(&mut pool, black_box(idx));
                i += 1;
            });
        });

        group.bench_with_input(BenchmarkId::new("std_binary_heap", size), &size, |b, &size| {
            let mut heap: BinaryHeap<Reverse<u64>> =
                (0..size).map(|i| Reverse(priority(i, size))).collect();
            let mut i = 0u64;
            b.iter(|| {
                let Reverse(_min) = heap.pop().unwrap();
                heap.push(black_box(Reverse(i % size as u64)));
                i += 1;
            });
        });
    }

    group.finish();
}

fn bench_remove_from_middle(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove_from_middle");

    for size in [64usize, 1024, 16384] {
        // Cancel an element halfway down the tree by handle, then
        // reinsert it. A BinaryHeap would need an O(n) scan for this.
        group.bench_with_input(BenchmarkId::new("linked_heap", size), &size, |b, &size| {
            let (mut pool, mut heap) = loaded(size);
            let mut i = 0u64;
            b.iter(|| {
                let victim = heap.node_at(&pool, size / 2).unwrap();
                heap.remove(&mut pool, black_box(victim));
                pool.get_mut(victim).unwrap().priority = i % size as u64;
                heap.push(&mut pool, victim);
                i += 1;
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_push_pop, bench_remove_from_middle);
criterion_main!(benches);
