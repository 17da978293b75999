//! Device attributes: a read-only `serial_num` and a read-write `max_size` through which the
//! buffer can be resized.

use std::sync::Arc;

use strum::IntoEnumIterator;

use crate::{
    dev::pcd::PseudoDevice,
    fs::{FsError, FsResult},
};

#[derive(
    strum::EnumString, strum::IntoStaticStr, strum::EnumIter, Debug, Clone, Copy, PartialEq, Eq,
)]
#[strum(serialize_all = "snake_case")]
pub enum Attribute {
    MaxSize,
    SerialNum,
}

impl Attribute {
    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn writable(self) -> bool {
        matches!(self, Attribute::MaxSize)
    }

    pub fn show(self, dev: &PseudoDevice) -> String {
        match self {
            Attribute::MaxSize => format!("{}\n", dev.capacity()),
            Attribute::SerialNum => format!("{}\n", dev.serial_number()),
        }
    }

    /// Returns the number of input bytes consumed.
    pub fn store(self, dev: &PseudoDevice, input: &str) -> FsResult<usize> {
        match self {
            Attribute::SerialNum => Err(FsError::PermissionDenied),
            Attribute::MaxSize => {
                let size: i64 = input.trim().parse().map_err(|_| FsError::InvalidArgument)?;
                let size = usize::try_from(size).map_err(|_| FsError::InvalidArgument)?;
                dev.resize(size)?;
                Ok(input.len())
            }
        }
    }
}

/// The attributes of one device, looked up by name.
#[derive(Clone)]
pub struct AttributeGroup {
    dev: Arc<PseudoDevice>,
}

impl AttributeGroup {
    pub fn new(dev: Arc<PseudoDevice>) -> Self {
        Self { dev }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        Attribute::iter().map(Attribute::name)
    }

    pub fn show(&self, name: &str) -> FsResult<String> {
        Ok(Self::lookup(name)?.show(&self.dev))
    }

    pub fn store(&self, name: &str, input: &str) -> FsResult<usize> {
        Self::lookup(name)?.store(&self.dev, input)
    }

    fn lookup(name: &str) -> FsResult<Attribute> {
        name.parse().map_err(|_| FsError::NotFound)
    }
}
