//! Platform driver for pseudo character devices. Board code (a static table or the device
//! tree) describes devices; probing one builds its memory, registers `/dev/pcdev-N` and exposes
//! its attribute group.

use std::{collections::BTreeMap, sync::Arc};

use log::{info, warn};

use crate::{
    dev::pcd::{Permission, PseudoDevice},
    fs::{FsError, FsResult, SharedDeviceFs},
    lock::SleepLock,
    sysfs::AttributeGroup,
};

/// Device variants this driver binds to, matched by platform device name or `compatible`.
#[derive(strum::EnumString, strum::IntoStaticStr, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    #[strum(serialize = "pcdev-A1x")]
    A1x,
    #[strum(serialize = "pcdev-B1x")]
    B1x,
    #[strum(serialize = "pcdev-C1x")]
    C1x,
    #[strum(serialize = "pcdev-D1x")]
    D1x,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    pub config_item1: u32,
    pub config_item2: u32,
}

impl Variant {
    pub const fn config(self) -> DeviceConfig {
        let (config_item1, config_item2) = match self {
            Variant::A1x => (60, 21),
            Variant::B1x => (50, 22),
            Variant::C1x => (40, 23),
            Variant::D1x => (30, 24),
        };
        DeviceConfig {
            config_item1,
            config_item2,
        }
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// Construction input of a device as board configuration describes it. `perm` is one of the
/// [`Permission`] codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformData {
    pub size: u32,
    pub perm: u32,
    pub serial_number: String,
}

impl PlatformData {
    pub fn new(size: u32, perm: Permission, serial_number: impl Into<String>) -> Self {
        Self {
            size,
            perm: perm as u32,
            serial_number: serial_number.into(),
        }
    }

    pub fn permission(&self) -> FsResult<Permission> {
        Permission::from_repr(self.perm).ok_or(FsError::InvalidArgument)
    }

    pub fn build(&self) -> FsResult<PseudoDevice> {
        let size = usize::try_from(self.size).map_err(|_| FsError::InvalidArgument)?;
        PseudoDevice::new(size, self.permission()?, &self.serial_number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDevice {
    pub name: String,
    pub data: Option<PlatformData>,
}

impl PlatformDevice {
    pub fn new(variant: Variant, data: PlatformData) -> Self {
        Self {
            name: variant.name().into(),
            data: Some(data),
        }
    }
}

struct Bound {
    variant: Variant,
    dev: Arc<PseudoDevice>,
}

/// Lock order is `devfs` before `bound`.
pub struct PlatformDriver {
    devfs: SharedDeviceFs,
    bound: SleepLock<BTreeMap<usize, Bound>>,
}

impl PlatformDriver {
    pub fn new(devfs: SharedDeviceFs) -> Self {
        info!("pcd platform driver loaded");
        Self {
            devfs,
            bound: SleepLock::new(BTreeMap::new()),
        }
    }

    pub fn devfs(&self) -> &SharedDeviceFs {
        &self.devfs
    }

    /// Binds a platform device and returns the minor number of its device file.
    pub fn probe(&self, pdev: &PlatformDevice) -> FsResult<usize> {
        info!("{}: a device is detected", pdev.name);

        let Ok(variant) = pdev.name.parse::<Variant>() else {
            warn!("{}: no matching device id", pdev.name);
            return Err(FsError::NoDevice);
        };

        let Some(pdata) = &pdev.data else {
            warn!("{}: no platform data available", pdev.name);
            return Err(FsError::InvalidArgument);
        };

        let dev = Arc::new(pdata.build()?);
        let config = variant.config();
        info!("{}: device serial number = {}", pdev.name, dev.serial_number());
        info!("{}: device size = {}", pdev.name, dev.capacity());
        info!("{}: device permission = {:#x}", pdev.name, pdata.perm);
        info!("{}: config item 1 = {}", pdev.name, config.config_item1);
        info!("{}: config item 2 = {}", pdev.name, config.config_item2);

        let mut devfs = self.devfs.lock();
        let minor = devfs.next_minor().ok_or(FsError::NoDevice)?;
        devfs.add_device(format!("pcdev-{minor}"), dev.clone())?;
        self.bound.lock().insert(minor, Bound { variant, dev });

        info!("{}: probe was successful", pdev.name);
        Ok(minor)
    }

    /// Probes every device, logging failures. Returns the minors that were bound.
    pub fn probe_all(&self, pdevs: &[PlatformDevice]) -> Vec<usize> {
        pdevs
            .iter()
            .filter_map(|pdev| match self.probe(pdev) {
                Ok(minor) => Some(minor),
                Err(err) => {
                    warn!("{}: probe failed: {err}", pdev.name);
                    None
                }
            })
            .collect()
    }

    /// Unbinds a device. Files already open on it stay usable until released.
    pub fn remove(&self, minor: usize) -> FsResult<()> {
        let mut devfs = self.devfs.lock();
        let Some(bound) = self.bound.lock().remove(&minor) else {
            return Err(FsError::NotFound);
        };
        devfs.remove_device(minor)?;
        info!("{}: device is removed", bound.variant.name());
        Ok(())
    }

    pub fn device(&self, minor: usize) -> Option<Arc<PseudoDevice>> {
        self.bound.lock().get(&minor).map(|b| b.dev.clone())
    }

    pub fn variant(&self, minor: usize) -> Option<Variant> {
        self.bound.lock().get(&minor).map(|b| b.variant)
    }

    pub fn attributes(&self, minor: usize) -> Option<AttributeGroup> {
        self.device(minor).map(AttributeGroup::new)
    }

    pub fn bound(&self) -> Vec<usize> {
        self.bound.lock().keys().copied().collect()
    }
}

impl Drop for PlatformDriver {
    fn drop(&mut self) {
        let mut devfs = self.devfs.lock();
        for minor in std::mem::take(&mut *self.bound.lock()).into_keys() {
            _ = devfs.remove_device(minor);
        }
        info!("pcd platform driver unloaded");
    }
}

#[cfg(test)]
mod tests {
    use shared::io::OpenFlags;

    use super::*;
    use crate::{fs::DeviceFs, lock::Signal};

    fn a1x(size: u32, perm: Permission, serial: &str) -> PlatformDevice {
        PlatformDevice::new(Variant::A1x, PlatformData::new(size, perm, serial))
    }

    #[test]
    fn variant_table() {
        assert_eq!("pcdev-C1x".parse::<Variant>(), Ok(Variant::C1x));
        assert!("pcdev-E1x".parse::<Variant>().is_err());
        assert_eq!(
            Variant::B1x.config(),
            DeviceConfig {
                config_item1: 50,
                config_item2: 22
            }
        );
        assert_eq!(Variant::D1x.name(), "pcdev-D1x");
    }

    #[test]
    fn probe_registers_device_file() {
        let driver = PlatformDriver::new(DeviceFs::shared());
        let minor = driver
            .probe(&a1x(512, Permission::ReadWrite, "PCDEVABC1111"))
            .unwrap();

        assert_eq!(minor, 0);
        assert_eq!(driver.variant(minor), Some(Variant::A1x));
        assert_eq!(driver.devfs().lock().name(minor), Some("pcdev-0"));

        let attrs = driver.attributes(minor).unwrap();
        assert_eq!(attrs.show("serial_num").unwrap(), "PCDEVABC1111\n");

        let mut file = driver
            .devfs()
            .lock()
            .open("pcdev-0", OpenFlags::ReadWrite, Signal::new())
            .unwrap();
        assert_eq!(file.write_from(&[1; 600]), Ok(512));
    }

    #[test]
    fn probe_rejects_unknown_or_incomplete_devices() {
        let driver = PlatformDriver::new(DeviceFs::shared());

        let unknown = PlatformDevice {
            name: "pseudo-char-device".into(),
            data: Some(PlatformData::new(8, Permission::ReadWrite, "X")),
        };
        assert_eq!(driver.probe(&unknown), Err(FsError::NoDevice));

        let no_data = PlatformDevice {
            name: "pcdev-B1x".into(),
            data: None,
        };
        assert_eq!(driver.probe(&no_data), Err(FsError::InvalidArgument));

        let bad_perm = PlatformDevice {
            name: "pcdev-B1x".into(),
            data: Some(PlatformData {
                size: 8,
                perm: 0x3,
                serial_number: "X".into(),
            }),
        };
        assert_eq!(driver.probe(&bad_perm), Err(FsError::InvalidArgument));
        assert!(driver.devfs().lock().is_empty());
    }

    #[test]
    fn remove_frees_the_minor() {
        let driver = PlatformDriver::new(DeviceFs::shared());
        let minors = driver.probe_all(&[
            a1x(16, Permission::ReadOnly, "ONE"),
            a1x(0, Permission::ReadOnly, "BAD"),
            a1x(16, Permission::WriteOnly, "TWO"),
        ]);
        assert_eq!(minors, [0, 1]);

        driver.remove(0).unwrap();
        assert_eq!(driver.remove(0), Err(FsError::NotFound));
        assert!(driver.device(0).is_none());
        assert_eq!(driver.bound(), [1]);

        assert_eq!(driver.probe(&a1x(16, Permission::ReadWrite, "THREE")), Ok(0));
    }

    #[test]
    fn dropping_the_driver_unregisters_devices() {
        let devfs = DeviceFs::shared();
        let driver = PlatformDriver::new(devfs.clone());
        driver.probe(&a1x(16, Permission::ReadWrite, "ONE")).unwrap();
        assert_eq!(devfs.lock().len(), 1);

        drop(driver);
        assert!(devfs.lock().is_empty());
    }
}
