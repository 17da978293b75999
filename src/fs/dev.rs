use std::sync::Arc;

use log::info;
use shared::io::OpenFlags;

use crate::{
    dev::Device,
    lock::{Signal, SleepLock},
};

use super::{File, FsError, FsResult};

/// Number of device numbers reserved for the driver.
pub const MAX_DEVICES: usize = 10;

pub type SharedDeviceFs = Arc<SleepLock<DeviceFs>>;

struct DevNode {
    name: String,
    dev: Arc<dyn Device>,
}

/// Table of registered character devices, indexed by minor number.
pub struct DeviceFs {
    nodes: [Option<DevNode>; MAX_DEVICES],
}

impl DeviceFs {
    pub const fn new() -> Self {
        Self {
            nodes: [const { None }; MAX_DEVICES],
        }
    }

    pub fn shared() -> SharedDeviceFs {
        Arc::new(SleepLock::new(Self::new()))
    }

    /// Registers `dev` under the lowest free minor number and returns that number.
    pub fn add_device(&mut self, name: impl Into<String>, dev: Arc<dyn Device>) -> FsResult<usize> {
        let name = name.into();
        if self.find_device(&name).is_some() {
            return Err(FsError::AlreadyExists);
        }

        let minor = self.next_minor().ok_or(FsError::NoDevice)?;
        info!("device number <minor> = {minor}, created /dev/{name}");
        self.nodes[minor] = Some(DevNode { name, dev });
        Ok(minor)
    }

    /// The minor number the next [`DeviceFs::add_device`] will hand out.
    pub fn next_minor(&self) -> Option<usize> {
        self.nodes.iter().position(Option::is_none)
    }

    pub fn remove_device(&mut self, minor: usize) -> FsResult<Arc<dyn Device>> {
        let node = self
            .nodes
            .get_mut(minor)
            .and_then(Option::take)
            .ok_or(FsError::NotFound)?;
        info!("removed /dev/{}", node.name);
        Ok(node.dev)
    }

    pub fn find_device(&self, name: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|node| node.as_ref().is_some_and(|node| node.name == name))
    }

    pub fn device(&self, minor: usize) -> Option<&Arc<dyn Device>> {
        self.node(minor).map(|node| &node.dev)
    }

    pub fn name(&self, minor: usize) -> Option<&str> {
        self.node(minor).map(|node| node.name.as_str())
    }

    /// Registered devices as `(minor, name)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(minor, node)| Some((minor, node.as_ref()?.name.as_str())))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn open(&self, name: &str, flags: OpenFlags, signal: Signal) -> FsResult<File> {
        let minor = self.find_device(name).ok_or(FsError::NotFound)?;
        self.open_minor(minor, flags, signal)
    }

    pub fn open_minor(&self, minor: usize, flags: OpenFlags, signal: Signal) -> FsResult<File> {
        info!("minor access = {minor}");
        let dev = self.device(minor).ok_or(FsError::NotFound)?;
        File::open(dev.clone(), flags, signal)
    }

    fn node(&self, minor: usize) -> Option<&DevNode> {
        self.nodes.get(minor).and_then(Option::as_ref)
    }
}

impl Default for DeviceFs {
    fn default() -> Self {
        Self::new()
    }
}
