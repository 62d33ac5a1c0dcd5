//! Source tree watching for kitbuild.
//!
//! Filesystem events are collected by a [`FileWatcher`] and folded by a
//! [`CoalescingQueue`] so that a rebuild never overlaps the previous one.

pub mod queue;
pub mod watcher;

pub use queue::CoalescingQueue;
pub use watcher::{FileWatcher, WatchEvent};
