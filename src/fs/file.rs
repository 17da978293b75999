use std::sync::Arc;

use shared::io::{OpenFlags, Whence};

use crate::{
    dev::Device,
    lock::Signal,
    uaccess::{SliceReader, SliceWriter, UserReader, UserWriter},
};

use super::{FsError, FsResult};

/// An open session on a device. Dropping it releases the session.
pub struct File {
    dev: Arc<dyn Device>,
    flags: OpenFlags,
    pos: u64,
    signal: Signal,
}

impl File {
    /// Runs the device's open check and starts a session at position 0. `signal` is the
    /// caller's context; raising it interrupts any lock wait this file is sleeping in.
    pub fn open(dev: Arc<dyn Device>, flags: OpenFlags, signal: Signal) -> FsResult<Self> {
        if flags.is_empty() {
            return Err(FsError::InvalidArgument);
        }
        dev.open(flags)?;
        Ok(Self {
            dev,
            flags,
            pos: 0,
            signal,
        })
    }

    pub fn pos(&self) -> u64 {
        self.pos
    }

    pub fn flags(&self) -> OpenFlags {
        self.flags
    }

    pub fn signal(&self) -> &Signal {
        &self.signal
    }

    pub fn read(&mut self, out: &mut dyn UserWriter) -> FsResult<usize> {
        if !self.flags.contains(OpenFlags::Read) {
            return Err(FsError::BadMode);
        }

        self.dev.read(&self.signal, &mut self.pos, out)
    }

    pub fn write(&mut self, src: &mut dyn UserReader) -> FsResult<usize> {
        if !self.flags.contains(OpenFlags::Write) {
            return Err(FsError::BadMode);
        }

        self.dev.write(&self.signal, &mut self.pos, src)
    }

    pub fn read_into(&mut self, buf: &mut [u8]) -> FsResult<usize> {
        self.read(&mut SliceWriter::new(buf))
    }

    /// Reads up to `len` bytes. An empty result means end of data.
    pub fn read_vec(&mut self, len: usize) -> FsResult<Vec<u8>> {
        let mut buf = vec![0; len];
        let read = self.read_into(&mut buf)?;
        buf.truncate(read);
        Ok(buf)
    }

    pub fn write_from(&mut self, buf: &[u8]) -> FsResult<usize> {
        self.write(&mut SliceReader::new(buf))
    }

    pub fn seek(&mut self, offset: i64, whence: Whence) -> FsResult<u64> {
        self.dev.seek(&self.signal, &mut self.pos, offset, whence)
    }

    /// Seek with a raw `SEEK_*` code.
    pub fn lseek(&mut self, offset: i64, whence: i32) -> FsResult<u64> {
        let whence = Whence::from_repr(whence).ok_or(FsError::InvalidArgument)?;
        self.seek(offset, whence)
    }
}

impl Drop for File {
    fn drop(&mut self) {
        self.dev.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dev::pcd::{Permission, PseudoDevice};

    fn open(perm: Permission, flags: OpenFlags) -> FsResult<File> {
        let dev = Arc::new(PseudoDevice::new(16, perm, "PCDEVFILE").unwrap());
        File::open(dev, flags, Signal::new())
    }

    #[test]
    fn open_needs_an_access_mode() {
        assert_eq!(
            open(Permission::ReadWrite, OpenFlags::empty()).err(),
            Some(FsError::InvalidArgument)
        );
    }

    #[test]
    fn position_follows_a_shrinking_device() {
        let dev = Arc::new(PseudoDevice::new(8, Permission::ReadWrite, "PCDEVFILE").unwrap());
        let mut file = File::open(dev.clone(), OpenFlags::ReadWrite, Signal::new()).unwrap();
        file.seek(0, Whence::End).unwrap();

        dev.resize(4).unwrap();
        assert_eq!(file.seek(0, Whence::Current), Ok(4));
        assert_eq!(file.pos(), 4);

        file.seek(8, Whence::Start).unwrap_err();
        dev.resize(8).unwrap();
        file.seek(8, Whence::Start).unwrap();
        dev.resize(2).unwrap();
        assert!(file.read_vec(4).unwrap().is_empty());
        assert_eq!(file.pos(), 2);
    }

    #[test]
    fn cursor_advances_by_transferred_bytes() {
        let mut file = open(Permission::ReadWrite, OpenFlags::ReadWrite).unwrap();
        assert_eq!(file.write_from(b"hello"), Ok(5));
        assert_eq!(file.pos(), 5);

        assert_eq!(file.seek(0, Whence::Start), Ok(0));
        assert_eq!(file.read_vec(3).unwrap(), b"hel");
        assert_eq!(file.pos(), 3);
    }

    #[test]
    fn failed_seek_keeps_position() {
        let mut file = open(Permission::ReadWrite, OpenFlags::ReadWrite).unwrap();
        file.seek(4, Whence::Start).unwrap();
        assert_eq!(file.seek(-5, Whence::Current), Err(FsError::InvalidArgument));
        assert_eq!(file.lseek(0, 7), Err(FsError::InvalidArgument));
        assert_eq!(file.pos(), 4);
        assert_eq!(file.lseek(-2, 2), Ok(14));
    }

    #[test]
    fn access_follows_open_flags() {
        let mut file = open(Permission::ReadWrite, OpenFlags::Read).unwrap();
        assert_eq!(file.write_from(b"x"), Err(FsError::BadMode));

        let mut file = open(Permission::ReadWrite, OpenFlags::Write).unwrap();
        assert_eq!(file.read_vec(1), Err(FsError::BadMode));

        assert_eq!(
            open(Permission::WriteOnly, OpenFlags::Read).err(),
            Some(FsError::PermissionDenied)
        );
    }

    #[test]
    fn read_until_end_of_data() {
        let mut file = open(Permission::ReadOnly, OpenFlags::Read).unwrap();
        assert_eq!(file.read_vec(10).unwrap().len(), 10);
        assert_eq!(file.read_vec(10).unwrap().len(), 6);
        assert!(file.read_vec(10).unwrap().is_empty());
        assert_eq!(file.pos(), 16);
    }
}
