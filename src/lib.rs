#![deny(unsafe_op_in_unsafe_fn)]

pub mod board;
pub mod dev;
pub mod fs;
pub mod lock;
pub mod of;
pub mod platform;
pub mod sys;
pub mod sysfs;
pub mod uaccess;

pub use shared::{
    io::{OpenFlags, Whence},
    sys::Errno,
};
