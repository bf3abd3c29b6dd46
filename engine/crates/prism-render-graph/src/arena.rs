//! Pass 私有数据的分配器
//!
//! 每个 pass 的数据在 `add_pass` 时分配一次，按字节数计入预算；
//! `reset()` 时统一释放（析构函数会正常运行），之前返回的句柄全部失效。

use slotmap::SlotMap;
use std::any::Any;

use crate::error::{RgError, RgResult};
use crate::handle::RgPassDataHandle;

struct RgArenaEntry {
    value: Box<dyn Any>,
    bytes: usize,
}

pub struct RgPassArena {
    entries: SlotMap<RgPassDataHandle, RgArenaEntry>,
    used: usize,
    capacity: usize,
}

// new & init
impl RgPassArena {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: SlotMap::with_key(),
            used: 0,
            capacity,
        }
    }
}

// getters
impl RgPassArena {
    /// 已使用的字节数
    #[inline]
    pub fn used(&self) -> usize {
        self.used
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn contains(&self, handle: RgPassDataHandle) -> bool {
        self.entries.contains_key(handle)
    }

    pub fn get<T: 'static>(&self, handle: RgPassDataHandle) -> Option<&T> {
        self.entries.get(handle).and_then(|entry| entry.value.downcast_ref::<T>())
    }

    pub fn get_mut<T: 'static>(&mut self, handle: RgPassDataHandle) -> Option<&mut T> {
        self.entries.get_mut(handle).and_then(|entry| entry.value.downcast_mut::<T>())
    }

    /// 类型擦除的访问，交给 pass 的 invoke 函数自行 downcast
    pub fn get_any(&self, handle: RgPassDataHandle) -> Option<&(dyn Any + 'static)> {
        self.entries.get(handle).map(|entry| entry.value.as_ref())
    }
}

// tools
impl RgPassArena {
    /// 分配一份 pass 数据，超出预算时返回 `RgError::ArenaExhausted`
    pub fn alloc<T: 'static>(&mut self, value: T) -> RgResult<RgPassDataHandle> {
        let bytes = size_of::<T>();
        if self.used + bytes > self.capacity {
            return Err(RgError::ArenaExhausted {
                requested: bytes,
                used: self.used,
                capacity: self.capacity,
            });
        }

        self.used += bytes;
        Ok(self.entries.insert(RgArenaEntry {
            value: Box::new(value),
            bytes,
        }))
    }

    /// 释放所有数据
    pub fn reset(&mut self) {
        self.entries.clear();
        self.used = 0;
    }

    /// 释放单个数据，返回释放的字节数
    pub fn free(&mut self, handle: RgPassDataHandle) -> Option<usize> {
        let entry = self.entries.remove(handle)?;
        self.used -= entry.bytes;
        Some(entry.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_alloc_and_budget() {
        let mut arena = RgPassArena::new(16);
        let a = arena.alloc(7u64).unwrap();
        let b = arena.alloc([1u32, 2]).unwrap();

        assert_eq!(arena.get::<u64>(a), Some(&7));
        assert_eq!(arena.get::<[u32; 2]>(b), Some(&[1, 2]));
        assert_eq!(arena.get::<u32>(a), None);
        assert_eq!(arena.used(), 16);

        let err = arena.alloc(1u8).unwrap_err();
        assert_eq!(
            err,
            RgError::ArenaExhausted {
                requested: 1,
                used: 16,
                capacity: 16
            }
        );
    }

    #[test]
    fn test_reset_invalidates_handles() {
        let mut arena = RgPassArena::new(64);
        let old = arena.alloc(1u32).unwrap();
        arena.reset();

        let new = arena.alloc(2u32).unwrap();
        assert!(!arena.contains(old));
        assert_eq!(arena.get::<u32>(old), None);
        assert_eq!(arena.get::<u32>(new), Some(&2));
        assert_eq!(arena.used(), 4);
    }

    #[test]
    fn test_reset_runs_destructors() {
        let shared = Rc::new(());
        let mut arena = RgPassArena::new(64);
        arena.alloc(shared.clone()).unwrap();
        assert_eq!(Rc::strong_count(&shared), 2);

        arena.reset();
        assert_eq!(Rc::strong_count(&shared), 1);
    }

    #[test]
    fn test_free_returns_budget() {
        let mut arena = RgPassArena::new(8);
        let a = arena.alloc(1u64).unwrap();
        assert_eq!(arena.free(a), Some(8));
        assert_eq!(arena.free(a), None);
        assert!(arena.alloc(2u64).is_ok());
    }
}
