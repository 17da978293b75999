//! Static board configuration.

use std::sync::Arc;

use crate::{
    dev::pcd::{Permission, PseudoDevice},
    fs::{DeviceFs, FsResult},
    platform::{PlatformData, PlatformDevice, Variant},
};

/// The fixed set of four devices registered directly, without a platform driver.
pub fn multi_device_table() -> [PlatformData; 4] {
    [
        PlatformData::new(1024, Permission::ReadOnly, "PCDEV1XYZ123"),
        PlatformData::new(512, Permission::WriteOnly, "PCDEV2XYZ123"),
        PlatformData::new(1024, Permission::ReadWrite, "PCDEV3XYZ123"),
        PlatformData::new(512, Permission::ReadWrite, "PCDEV4XYZ123"),
    ]
}

/// Platform devices a board without a device tree registers for the platform driver.
pub fn platform_device_setup() -> [PlatformDevice; 2] {
    [
        PlatformDevice::new(
            Variant::A1x,
            PlatformData::new(512, Permission::ReadWrite, "PCDEVABC1111"),
        ),
        PlatformDevice::new(
            Variant::B1x,
            PlatformData::new(1024, Permission::ReadWrite, "PCDDEVXYZ2222"),
        ),
    ]
}

/// Registers each entry of `table` as `/dev/pcdev-N`, N counting from 1. On failure, devices
/// registered so far are removed again.
pub fn register_table(
    devfs: &mut DeviceFs,
    table: &[PlatformData],
) -> FsResult<Vec<Arc<PseudoDevice>>> {
    let mut added = Vec::with_capacity(table.len());
    for (i, pdata) in table.iter().enumerate() {
        let res = pdata.build().map(Arc::new).and_then(|dev| {
            let minor = devfs.add_device(format!("pcdev-{}", i + 1), dev.clone())?;
            Ok((minor, dev))
        });

        match res {
            Ok(entry) => added.push(entry),
            Err(err) => {
                for (minor, _) in added {
                    _ = devfs.remove_device(minor);
                }
                return Err(err);
            }
        }
    }

    Ok(added.into_iter().map(|(_, dev)| dev).collect())
}
