//! Pseudo character device: a fixed-capacity, zero-initialized memory region exposed through
//! file semantics, with an access policy checked at open time.

use arrayvec::ArrayString;
use log::{debug, error, info};
use shared::io::{OpenFlags, Whence};

use crate::{
    fs::{FsError, FsResult},
    lock::{LockInterruptible, Signal, SleepLock},
    uaccess::{UserReader, UserWriter},
};

use super::Device;

pub const SERIAL_MAX: usize = 32;

pub type SerialNumber = ArrayString<SERIAL_MAX>;

/// Access policy of a device. Discriminants are the `org,perm` codes used by board
/// configuration.
#[derive(strum::FromRepr, strum::IntoStaticStr, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Permission {
    ReadOnly = 0x01,
    WriteOnly = 0x10,
    ReadWrite = 0x11,
}

impl Permission {
    pub fn allows(self, flags: OpenFlags) -> bool {
        match self {
            Permission::ReadWrite => true,
            Permission::ReadOnly => flags.read_only(),
            Permission::WriteOnly => flags.write_only(),
        }
    }
}

pub struct PseudoDevice {
    buf: SleepLock<Vec<u8>>,
    perm: Permission,
    serial: SerialNumber,
}

impl PseudoDevice {
    pub fn new(size: usize, perm: Permission, serial: &str) -> FsResult<Self> {
        if size == 0 {
            return Err(FsError::InvalidArgument);
        }
        let serial = SerialNumber::from(serial).map_err(|_| FsError::InvalidArgument)?;

        let mut buf = Vec::new();
        buf.try_reserve_exact(size)
            .map_err(|_| FsError::OutOfSpace)?;
        buf.resize(size, 0);

        Ok(Self {
            buf: SleepLock::new(buf),
            perm,
            serial,
        })
    }

    pub fn serial_number(&self) -> &str {
        &self.serial
    }

    pub fn permission(&self) -> Permission {
        self.perm
    }

    pub fn capacity(&self) -> usize {
        self.buf.lock().len()
    }

    /// Reallocates the backing memory. Bytes below `min(old, new)` are kept, any growth is
    /// zero-filled. Open files past the new end are moved back to it on their next operation.
    pub fn resize(&self, size: usize) -> FsResult<()> {
        if size == 0 {
            return Err(FsError::InvalidArgument);
        }

        let mut buf = self.buf.lock();
        let old = buf.len();
        if size > old {
            buf.try_reserve_exact(size - old)
                .map_err(|_| FsError::OutOfSpace)?;
        }
        buf.resize(size, 0);
        buf.shrink_to_fit();

        info!("{}: resized from {old} to {size} bytes", self.serial);
        Ok(())
    }
}

/// Pulls a position left past the end by a shrink back to the end, and returns it as an index.
fn clamp(buf: &[u8], pos: &mut u64) -> usize {
    let start = usize::try_from(*pos).map_or(buf.len(), |pos| pos.min(buf.len()));
    *pos = start as u64;
    start
}

impl Device for PseudoDevice {
    fn open(&self, flags: OpenFlags) -> FsResult<()> {
        if self.perm.allows(flags) {
            info!("{}: open was successful", self.serial);
            Ok(())
        } else {
            info!(
                "{}: open was unsuccessful, {flags:?} on a {} device",
                self.serial,
                <&str>::from(self.perm)
            );
            Err(FsError::PermissionDenied)
        }
    }

    fn read(&self, signal: &Signal, pos: &mut u64, out: &mut dyn UserWriter) -> FsResult<usize> {
        let buf = self
            .buf
            .lock_interruptible(signal)
            .ok_or(FsError::Interrupted)?;

        debug!("{}: read requested for {} bytes at {pos}", self.serial, out.len());

        let start = clamp(&buf, pos);
        let count = out.len().min(buf.len() - start);
        out.write_slice(&buf[start..][..count])?;
        *pos += count as u64;

        debug!("{}: read {count} bytes, position {pos}", self.serial);
        Ok(count)
    }

    fn write(&self, signal: &Signal, pos: &mut u64, src: &mut dyn UserReader) -> FsResult<usize> {
        let mut buf = self
            .buf
            .lock_interruptible(signal)
            .ok_or(FsError::Interrupted)?;

        debug!("{}: write requested for {} bytes at {pos}", self.serial, src.len());

        let start = clamp(&buf, pos);
        let count = src.len().min(buf.len() - start);
        if count == 0 {
            error!("{}: no space left on the device", self.serial);
            return Err(FsError::OutOfSpace);
        }

        // stage the copy so a fault leaves the buffer untouched
        let mut staged = vec![0; count];
        src.read_slice(&mut staged)?;
        buf[start..][..count].copy_from_slice(&staged);
        *pos += count as u64;

        debug!("{}: wrote {count} bytes, position {pos}", self.serial);
        Ok(count)
    }

    fn seek(&self, signal: &Signal, pos: &mut u64, offset: i64, whence: Whence) -> FsResult<u64> {
        let buf = self
            .buf
            .lock_interruptible(signal)
            .ok_or(FsError::Interrupted)?;

        let old = clamp(&buf, pos);
        let end = i64::try_from(buf.len()).map_err(|_| FsError::InvalidArgument)?;
        let base = match whence {
            Whence::Start => 0,
            Whence::Current => i64::try_from(old).map_err(|_| FsError::InvalidArgument)?,
            Whence::End => end,
        };

        let Some(new) = base.checked_add(offset).filter(|p| (0..=end).contains(p)) else {
            debug!(
                "{}: seek {offset} from {whence:?} out of bounds, position stays {old}",
                self.serial
            );
            return Err(FsError::InvalidArgument);
        };

        debug!("{}: position {old} -> {new}", self.serial);
        *pos = new as u64;
        Ok(*pos)
    }

    fn release(&self) {
        debug!("{}: release was successful", self.serial);
    }
}
