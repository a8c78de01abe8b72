//! Leak characteristic as a BooleanState cluster (0x0045).
//!
//! On a Water Leak Detector endpoint `StateValue == true` means "leak
//! detected".

use super::super::sensors::LeakAccessory;
use super::sync_dataver_with_sensor;
use rs_matter::dm::{
    Access, Attribute, Cluster, Dataver, Handler, NonBlockingHandler, Quality, ReadContext,
    ReadReply, Reply, WriteContext,
};
use rs_matter::error::{Error, ErrorCode};
use rs_matter::tlv::TLVWrite;
use rs_matter::{attribute_enum, attributes, with};
use std::sync::Arc;
use std::sync::atomic::AtomicU32;
use strum::FromRepr;

pub const CLUSTER_ID: u32 = 0x0045;
pub const CLUSTER_REVISION: u16 = 1;

#[derive(Clone, Copy, Debug, Eq, PartialEq, FromRepr)]
#[repr(u32)]
pub enum LeakAttribute {
    StateValue = 0x00,
}

attribute_enum!(LeakAttribute);

pub const CLUSTER: Cluster<'static> = Cluster {
    id: CLUSTER_ID,
    revision: CLUSTER_REVISION,
    feature_map: 0,
    attributes: attributes!(Attribute::new(
        LeakAttribute::StateValue as _,
        Access::RV,
        Quality::NONE
    ),),
    commands: &[],
    with_attrs: with!(all),
    with_cmds: with!(all),
};

pub struct BooleanStateHandler {
    dataver: Dataver,
    accessory: Arc<LeakAccessory>,
    seen_version: AtomicU32,
}

impl BooleanStateHandler {
    pub const CLUSTER: Cluster<'static> = CLUSTER;

    pub fn new(dataver: Dataver, accessory: Arc<LeakAccessory>) -> Self {
        Self {
            dataver,
            accessory,
            seen_version: AtomicU32::new(0),
        }
    }

    /// Bump the dataver if the accessory changed since the last refresh.
    ///
    /// Called from the leak change forwarder so the subscription processor
    /// reports the new value without waiting for a read. Returns whether the
    /// dataver moved.
    pub fn refresh(&self) -> bool {
        sync_dataver_with_sensor(&*self.accessory, &self.seen_version, &self.dataver)
    }

    pub fn dataver(&self) -> u32 {
        self.dataver.get()
    }
}

impl Handler for BooleanStateHandler {
    fn read(&self, ctx: impl ReadContext, reply: impl ReadReply) -> Result<(), Error> {
        self.refresh();

        let attr = ctx.attr();
        let Some(mut writer) = reply.with_dataver(self.dataver.get())? else {
            return Ok(());
        };

        if attr.is_system() {
            return CLUSTER.read(attr, writer);
        }

        let leak = match attr.attr_id.try_into()? {
            LeakAttribute::StateValue => self.accessory.leak_detected(),
        };
        let tag = writer.tag();
        writer.writer().bool(tag, leak)?;
        writer.complete()
    }

    fn write(&self, _ctx: impl WriteContext) -> Result<(), Error> {
        Err(ErrorCode::UnsupportedAccess.into())
    }
}

impl NonBlockingHandler for BooleanStateHandler {}
