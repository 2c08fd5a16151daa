//! Single-slot "latest value" mailbox.
//!
//! A producer overwrites the slot whenever a new value arrives; a consumer reads whatever is
//! currently there without blocking. Values that are never read are simply replaced, so a
//! reader may observe the same value on several reads, or skip values entirely. Each published
//! value carries a sequence number so readers can tell a fresh value from one they have
//! already seen.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// 最新の値を1つだけ保持するスロット
pub struct LatestSlot<T> {
    latest: Mutex<Option<Snapshot<T>>>,
    sequence: AtomicU64,
}

/// スロットから読み出した値と、その発行番号 (1始まり)
#[derive(Debug)]
pub struct Snapshot<T> {
    pub sequence: u64,
    pub value: Arc<T>,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            sequence: self.sequence,
            value: self.value.clone(),
        }
    }
}

impl<T> LatestSlot<T> {
    pub fn new() -> Self {
        Self {
            latest: Mutex::new(None),
            sequence: AtomicU64::new(0),
        }
    }

    /// 値を書き込む。未読の値は上書きされる。発行番号を返す
    pub fn publish(&self, value: T) -> u64 {
        let mut guard = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        let sequence = self.sequence.fetch_add(1, Ordering::AcqRel) + 1;
        *guard = Some(Snapshot {
            sequence,
            value: Arc::new(value),
        });
        sequence
    }

    /// 最新の値を取得。何度でも取得可能で、次の publish まで同じ値が返る。
    /// 初回の publish 前のみ None。
    pub fn latest(&self) -> Option<Snapshot<T>> {
        let guard = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        guard.clone()
    }

    /// これまでに publish された回数
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::Acquire)
    }
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
