use thiserror::Error;

use crate::uaccess::Fault;

pub mod dev;
pub mod file;

pub use dev::{DeviceFs, SharedDeviceFs, MAX_DEVICES};
pub use file::File;

pub type FsResult<T> = Result<T, FsError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FsError {
    #[error("operation not permitted")]
    PermissionDenied,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("no space left on device")]
    OutOfSpace,
    #[error("copy to or from the caller failed")]
    Io,
    #[error("interrupted while waiting for the device")]
    Interrupted,
    #[error("file not open for this kind of access")]
    BadMode,
    #[error("no such device")]
    NotFound,
    #[error("device name already registered")]
    AlreadyExists,
    #[error("no free device number")]
    NoDevice,
}

impl From<Fault> for FsError {
    fn from(_: Fault) -> Self {
        Self::Io
    }
}
