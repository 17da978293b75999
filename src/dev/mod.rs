use shared::io::{OpenFlags, Whence};

use crate::{
    fs::FsResult,
    lock::Signal,
    uaccess::{UserReader, UserWriter},
};

pub mod pcd;

/// The operations a character device exposes to the file layer, the equivalent of
/// `struct file_operations`.
///
/// `pos` is the open file's position. The device clamps it to its current end under its lock,
/// then `read` and `write` advance it past the bytes transferred and `seek` moves it on success.
pub trait Device: Send + Sync {
    fn open(&self, flags: OpenFlags) -> FsResult<()>;
    fn read(&self, signal: &Signal, pos: &mut u64, out: &mut dyn UserWriter) -> FsResult<usize>;
    fn write(&self, signal: &Signal, pos: &mut u64, src: &mut dyn UserReader) -> FsResult<usize>;
    fn seek(&self, signal: &Signal, pos: &mut u64, offset: i64, whence: Whence) -> FsResult<u64>;
    fn release(&self) {}
}
