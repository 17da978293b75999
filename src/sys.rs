//! Syscall layer over the device table: a per-process descriptor table and the entry points a
//! user program reaches through `open`, `read`, `write`, `lseek` and `close`.

use log::debug;
use shared::{io::OpenFlags, sys::Errno};

use crate::{
    fs::{File, FsError, SharedDeviceFs},
    lock::Signal,
};

pub const MAX_FILES: usize = 32;

impl From<FsError> for Errno {
    fn from(value: FsError) -> Self {
        match value {
            FsError::PermissionDenied => Errno::Perm,
            FsError::InvalidArgument => Errno::Inval,
            FsError::OutOfSpace => Errno::NoMem,
            FsError::Io => Errno::Fault,
            FsError::Interrupted => Errno::Intr,
            FsError::BadMode => Errno::BadF,
            FsError::NotFound => Errno::NoEnt,
            FsError::AlreadyExists => Errno::Exist,
            FsError::NoDevice => Errno::NoDev,
        }
    }
}

pub type SysResult = Result<usize, Errno>;

pub struct Process {
    devfs: SharedDeviceFs,
    files: [Option<File>; MAX_FILES],
    signal: Signal,
}

impl Process {
    pub fn new(devfs: SharedDeviceFs) -> Self {
        Self {
            devfs,
            files: [const { None }; MAX_FILES],
            signal: Signal::new(),
        }
    }

    /// Raising this interrupts whatever device lock the process is waiting on.
    pub fn signal(&self) -> &Signal {
        &self.signal
    }

    pub fn open_files(&self) -> usize {
        self.files.iter().flatten().count()
    }

    fn file(&mut self, fd: usize) -> Result<&mut File, Errno> {
        self.files
            .get_mut(fd)
            .and_then(Option::as_mut)
            .ok_or(Errno::BadF)
    }
}

// int open(const char *path, u32 flags);
pub fn sys_open(proc: &mut Process, path: &str, flags: u32) -> SysResult {
    let name = path.strip_prefix("/dev/").unwrap_or(path);
    let Some(fd) = proc.files.iter().position(Option::is_none) else {
        return Err(Errno::MFile);
    };

    let flags = OpenFlags::from_open_flags(flags).ok_or(Errno::Inval)?;

    let file = proc.devfs.lock().open(name, flags, proc.signal.clone())?;
    proc.files[fd] = Some(file);
    Ok(fd)
}

// void close(int fd);
pub fn sys_close(proc: &mut Process, fd: usize) -> SysResult {
    let Some(_file) = proc.files.get_mut(fd).and_then(Option::take) else {
        return Err(Errno::BadF);
    };
    Ok(0)
}

// ssize_t read(int fd, char *buf, size_t count);
pub fn sys_read(proc: &mut Process, fd: usize, buf: &mut [u8]) -> SysResult {
    Ok(proc.file(fd)?.read_into(buf)?)
}

// ssize_t write(int fd, const char *buf, size_t count);
pub fn sys_write(proc: &mut Process, fd: usize, buf: &[u8]) -> SysResult {
    Ok(proc.file(fd)?.write_from(buf)?)
}

// off_t lseek(int fd, off_t offset, int whence);
pub fn sys_lseek(proc: &mut Process, fd: usize, offset: i64, whence: i32) -> SysResult {
    let pos = proc.file(fd)?.lseek(offset, whence)?;
    usize::try_from(pos).map_err(|_| Errno::Inval)
}

#[derive(Debug)]
pub enum Syscall<'a> {
    Open { path: &'a str, flags: u32 },
    Close { fd: usize },
    Read { fd: usize, buf: &'a mut [u8] },
    Write { fd: usize, buf: &'a [u8] },
    Lseek { fd: usize, offset: i64, whence: i32 },
}

/// Runs a syscall and encodes the result the way it crosses the boundary: the result on
/// success, the negated errno on failure.
pub fn handle_syscall(proc: &mut Process, call: Syscall) -> isize {
    let result = match call {
        Syscall::Open { path, flags } => sys_open(proc, path, flags),
        Syscall::Close { fd } => sys_close(proc, fd),
        Syscall::Read { fd, buf } => sys_read(proc, fd, buf),
        Syscall::Write { fd, buf } => sys_write(proc, fd, buf),
        Syscall::Lseek { fd, offset, whence } => sys_lseek(proc, fd, offset, whence),
    };

    match result {
        Ok(res) => res as isize,
        Err(err) => {
            debug!("syscall failed: {err:?}");
            err.as_ret()
        }
    }
}

#[cfg(test)]
mod tests {
    use shared::io::{Whence, O_ACCMODE, O_RDONLY, O_RDWR, O_WRONLY};

    use super::*;
    use crate::{board, fs::DeviceFs};

    fn process() -> Process {
        let devfs = DeviceFs::shared();
        board::register_table(&mut devfs.lock(), &board::multi_device_table()).unwrap();
        Process::new(devfs)
    }

    #[test]
    fn descriptors_are_reused_after_close() {
        let mut proc = process();
        let rw = O_RDWR;

        assert_eq!(sys_open(&mut proc, "/dev/pcdev-3", rw), Ok(0));
        assert_eq!(sys_open(&mut proc, "pcdev-4", rw), Ok(1));
        assert_eq!(sys_close(&mut proc, 0), Ok(0));
        assert_eq!(sys_close(&mut proc, 0), Err(Errno::BadF));
        assert_eq!(sys_open(&mut proc, "pcdev-4", rw), Ok(0));
        assert_eq!(proc.open_files(), 2);
    }

    #[test]
    fn errors_map_to_errno() {
        let mut proc = process();
        let read = O_RDONLY;
        let write = O_WRONLY;

        assert_eq!(sys_open(&mut proc, "/dev/pcdev-1", write), Err(Errno::Perm));
        assert_eq!(sys_open(&mut proc, "/dev/pcdev-9", read), Err(Errno::NoEnt));

        let fd = sys_open(&mut proc, "/dev/pcdev-2", write).unwrap();
        assert_eq!(sys_lseek(&mut proc, fd, 513, Whence::Start as i32), Err(Errno::Inval));
        assert_eq!(sys_lseek(&mut proc, fd, 0, 3), Err(Errno::Inval));
        assert_eq!(sys_lseek(&mut proc, fd, 0, Whence::End as i32), Ok(512));
        assert_eq!(sys_write(&mut proc, fd, b"x"), Err(Errno::NoMem));
        assert_eq!(sys_read(&mut proc, fd, &mut [0; 4]), Err(Errno::BadF));
        assert_eq!(sys_read(&mut proc, 17, &mut [0; 4]), Err(Errno::BadF));
    }

    #[test]
    fn open_decodes_access_mode() {
        let mut proc = process();

        let fd = sys_open(&mut proc, "/dev/pcdev-1", O_RDONLY).unwrap();
        assert_eq!(sys_read(&mut proc, fd, &mut [1; 4]), Ok(4));
        assert_eq!(sys_write(&mut proc, fd, b"x"), Err(Errno::BadF));

        let fd = sys_open(&mut proc, "/dev/pcdev-2", O_WRONLY).unwrap();
        assert_eq!(sys_write(&mut proc, fd, b"x"), Ok(1));
        assert_eq!(sys_read(&mut proc, fd, &mut [0; 4]), Err(Errno::BadF));

        assert_eq!(sys_open(&mut proc, "/dev/pcdev-1", O_RDWR), Err(Errno::Perm));
        assert_eq!(sys_open(&mut proc, "/dev/pcdev-3", O_ACCMODE), Err(Errno::Inval));
        assert_eq!(proc.open_files(), 2);
    }

    #[test]
    fn descriptor_table_is_bounded() {
        let mut proc = process();
        let read = O_RDONLY;
        for _ in 0..MAX_FILES {
            sys_open(&mut proc, "pcdev-1", read).unwrap();
        }
        assert_eq!(sys_open(&mut proc, "pcdev-1", read), Err(Errno::MFile));
    }

    #[test]
    fn handle_syscall_encodes_results() {
        let mut proc = process();
        let fd = handle_syscall(
            &mut proc,
            Syscall::Open {
                path: "/dev/pcdev-3",
                flags: O_RDWR,
            },
        );
        assert_eq!(fd, 0);
        let fd = fd as usize;

        assert_eq!(handle_syscall(&mut proc, Syscall::Write { fd, buf: b"test" }), 4);
        let ret = handle_syscall(
            &mut proc,
            Syscall::Lseek {
                fd,
                offset: -4,
                whence: Whence::Current as i32,
            },
        );
        assert_eq!(ret, 0);

        let mut buf = [0; 4];
        assert_eq!(handle_syscall(&mut proc, Syscall::Read { fd, buf: &mut buf }), 4);
        assert_eq!(&buf, b"test");

        let ret = handle_syscall(&mut proc, Syscall::Close { fd: 5 });
        assert_eq!(Errno::from_ret(ret), Some(Errno::BadF));
        assert_eq!(handle_syscall(&mut proc, Syscall::Close { fd }), 0);
    }
}
