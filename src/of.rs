//! Device tree glue: finds nodes compatible with a [`Variant`] in a flattened device tree and
//! reads their platform data from the `org,*` properties.

use fdt_rs::{
    base::{DevTree, DevTreeNode},
    error::DevTreeError,
    prelude::*,
};
use log::info;
use thiserror::Error;

use crate::platform::{PlatformData, PlatformDevice, Variant};

pub const PROP_SERIAL: &str = "org,device-serial-num";
pub const PROP_SIZE: &str = "org,size";
pub const PROP_PERM: &str = "org,perm";

#[derive(Debug, Error)]
pub enum OfError {
    #[error("malformed device tree blob: {0:?}")]
    Blob(DevTreeError),
    #[error("{node}: missing {prop} property")]
    MissingProperty { node: String, prop: &'static str },
}

impl From<DevTreeError> for OfError {
    fn from(err: DevTreeError) -> Self {
        Self::Blob(err)
    }
}

/// Platform devices for every matching node, in tree order. Nodes without a known
/// `compatible` are skipped.
pub fn platform_devices(blob: &[u8]) -> Result<Vec<PlatformDevice>, OfError> {
    let words = aligned_copy(blob);
    // SAFETY: `words` holds the whole blob, is u32 aligned and outlives the tree.
    let buf = unsafe { core::slice::from_raw_parts(words.as_ptr().cast::<u8>(), blob.len()) };
    // SAFETY: `buf` is u32 aligned and borrows `words`, which outlives `dt`.
    let dt = unsafe { DevTree::new(buf) }?;

    let mut found = Vec::new();
    let mut nodes = dt.nodes();
    while let Some(node) = nodes.next()? {
        let Some(compatible) = prop_str(&node, "compatible")? else {
            continue;
        };
        let Ok(variant) = compatible.parse::<Variant>() else {
            continue;
        };

        let name = node.name()?;
        info!("{name}: compatible with {compatible}");
        found.push(PlatformDevice::new(variant, platdata_from_node(&node, name)?));
    }

    Ok(found)
}

fn platdata_from_node(node: &DevTreeNode, name: &str) -> Result<PlatformData, OfError> {
    let missing = |prop| OfError::MissingProperty {
        node: name.into(),
        prop,
    };

    let serial_number = prop_str(node, PROP_SERIAL)?.ok_or_else(|| missing(PROP_SERIAL))?;
    let size = prop_u32(node, PROP_SIZE)?.ok_or_else(|| missing(PROP_SIZE))?;
    let perm = prop_u32(node, PROP_PERM)?.ok_or_else(|| missing(PROP_PERM))?;

    Ok(PlatformData {
        size,
        perm,
        serial_number,
    })
}

fn prop_u32(node: &DevTreeNode, name: &str) -> Result<Option<u32>, DevTreeError> {
    node.props()
        .find(|prop| Ok(prop.name()? == name))?
        .map(|prop| prop.u32(0))
        .transpose()
}

fn prop_str(node: &DevTreeNode, name: &str) -> Result<Option<String>, DevTreeError> {
    node.props()
        .find(|prop| Ok(prop.name()? == name))?
        .map(|prop| prop.str().map(String::from))
        .transpose()
}

fn aligned_copy(blob: &[u8]) -> Vec<u32> {
    blob.chunks(4)
        .map(|chunk| {
            let mut word = [0; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            u32::from_ne_bytes(word)
        })
        .collect()
}
