// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded queue with drop-oldest-on-overflow semantics, used for the
//! subscriber outbound queue (a slow dashboard shouldn't block the
//! broadcaster, and losing the newest frame is worse than losing the
//! stalest one).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tokio::sync::Notify;

pub struct DropOldestQueue<T> {
    capacity: usize,
    items: Mutex<VecDeque<T>>,
    notify: Notify,
    closed: AtomicBool,
}

impl<T> DropOldestQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, items: Mutex::new(VecDeque::with_capacity(capacity)), notify: Notify::new(), closed: AtomicBool::new(false) }
    }

    /// Pushes `item`, evicting the oldest queued item if full. Returns
    /// `true` if an eviction happened.
    pub fn push(&self, item: T) -> bool {
        let mut items = self.items.lock().unwrap();
        let dropped = if items.len() >= self.capacity {
            items.pop_front();
            true
        } else {
            false
        };
        items.push_back(item);
        drop(items);
        self.notify.notify_one();
        dropped
    }

    /// Waits for and removes the next item, or returns `None` once the
    /// queue is closed and drained.
    pub async fn recv(&self) -> Option<T> {
        loop {
            {
                let mut items = self.items.lock().unwrap();
                if let Some(item) = items.pop_front() {
                    return Some(item);
                }
                if self.closed.load(Ordering::Acquire) {
                    return None;
                }
            }
            self.notify.notified().await;
        }
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
