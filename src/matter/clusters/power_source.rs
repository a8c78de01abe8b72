//! PowerSource cluster handler exposing fixed battery information.
//!
//! The PowerSource cluster (0x002F) with the Battery and Rechargeable
//! features carries the battery fields hubs show next to the leak sensor.
//! All values come from [`BatteryStatus`] and never change at runtime.

use super::super::sensors::BatteryStatus;
use rs_matter::dm::{
    Access, Attribute, Cluster, Dataver, Handler, NonBlockingHandler, ReadContext, ReadReply,
    Reply, WriteContext,
};
use rs_matter::error::{Error, ErrorCode};
use rs_matter::tlv::TLVWrite;
use rs_matter::{attribute_enum, attributes, with};
use strum::FromRepr;

/// Matter Cluster ID for PowerSource
pub const CLUSTER_ID: u32 = 0x002F;

/// Cluster revision
pub const CLUSTER_REVISION: u16 = 1;

/// Feature bits: BAT (bit 1) and RECHG (bit 2)
pub const FEATURE_MAP: u32 = 0x02 | 0x04;

/// PowerSourceStatusEnum
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum PowerSourceStatus {
    Unspecified = 0,
    Active = 1,
    Standby = 2,
    Unavailable = 3,
}

/// BatChargeLevelEnum
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum BatChargeLevel {
    Ok = 0,
    Warning = 1,
    Critical = 2,
}

/// Attribute IDs served by this handler
#[derive(Clone, Copy, Debug, Eq, PartialEq, FromRepr)]
#[repr(u32)]
pub enum PowerSourceAttribute {
    Status = 0x0000,
    Order = 0x0001,
    Description = 0x0002,
    BatPercentRemaining = 0x000C,
    BatChargeLevel = 0x000E,
    BatReplacementNeeded = 0x000F,
    BatReplaceability = 0x0010,
    BatChargeState = 0x001A,
    BatFunctionalWhileCharging = 0x001B,
}

attribute_enum!(PowerSourceAttribute);

/// Cluster metadata definition
pub const CLUSTER: Cluster<'static> = Cluster {
    id: CLUSTER_ID,
    revision: CLUSTER_REVISION,
    feature_map: FEATURE_MAP,
    attributes: attributes!(
        Attribute::new(
            PowerSourceAttribute::Status as _,
            Access::RV,
            rs_matter::dm::Quality::NONE
        ),
        Attribute::new(
            PowerSourceAttribute::Order as _,
            Access::RV,
            rs_matter::dm::Quality::NONE
        ),
        Attribute::new(
            PowerSourceAttribute::Description as _,
            Access::RV,
            rs_matter::dm::Quality::FIXED
        ),
        Attribute::new(
            PowerSourceAttribute::BatPercentRemaining as _,
            Access::RV,
            rs_matter::dm::Quality::NONE
        ),
        Attribute::new(
            PowerSourceAttribute::BatChargeLevel as _,
            Access::RV,
            rs_matter::dm::Quality::NONE
        ),
        Attribute::new(
            PowerSourceAttribute::BatReplacementNeeded as _,
            Access::RV,
            rs_matter::dm::Quality::NONE
        ),
        Attribute::new(
            PowerSourceAttribute::BatReplaceability as _,
            Access::RV,
            rs_matter::dm::Quality::FIXED
        ),
        Attribute::new(
            PowerSourceAttribute::BatChargeState as _,
            Access::RV,
            rs_matter::dm::Quality::NONE
        ),
        Attribute::new(
            PowerSourceAttribute::BatFunctionalWhileCharging as _,
            Access::RV,
            rs_matter::dm::Quality::NONE
        ),
    ),
    commands: &[],
    with_attrs: with!(all),
    with_cmds: with!(all),
};

/// Read-only PowerSource cluster with fixed battery values.
pub struct PowerSourceHandler {
    dataver: Dataver,
    battery: BatteryStatus,
}

impl PowerSourceHandler {
    /// Cluster definition for use in the data model
    pub const CLUSTER: Cluster<'static> = CLUSTER;

    pub fn new(dataver: Dataver, battery: BatteryStatus) -> Self {
        Self { dataver, battery }
    }

    fn charge_level(&self) -> BatChargeLevel {
        if self.battery.low_battery {
            BatChargeLevel::Warning
        } else {
            BatChargeLevel::Ok
        }
    }

    fn read_impl(&self, ctx: impl ReadContext, reply: impl ReadReply) -> Result<(), Error> {
        let attr = ctx.attr();

        let Some(mut writer) = reply.with_dataver(self.dataver.get())? else {
            return Ok(());
        };

        if attr.is_system() {
            return CLUSTER.read(attr, writer);
        }

        let tag = writer.tag();
        {
            let mut tw = writer.writer();

            match attr.attr_id.try_into()? {
                PowerSourceAttribute::Status => {
                    tw.u8(tag, PowerSourceStatus::Active as u8)?;
                }
                PowerSourceAttribute::Order => {
                    tw.u8(tag, 0)?;
                }
                PowerSourceAttribute::Description => {
                    tw.utf8(tag, "Battery")?;
                }
                PowerSourceAttribute::BatPercentRemaining => {
                    tw.u8(tag, self.battery.half_percent())?;
                }
                PowerSourceAttribute::BatChargeLevel => {
                    tw.u8(tag, self.charge_level() as u8)?;
                }
                PowerSourceAttribute::BatReplacementNeeded => {
                    tw.bool(tag, false)?;
                }
                PowerSourceAttribute::BatReplaceability => {
                    // NotReplaceable
                    tw.u8(tag, 1)?;
                }
                PowerSourceAttribute::BatChargeState => {
                    tw.u8(tag, self.battery.charge_state as u8)?;
                }
                PowerSourceAttribute::BatFunctionalWhileCharging => {
                    tw.bool(tag, true)?;
                }
            }
        }

        writer.complete()
    }

    fn write_impl(&self, _ctx: impl WriteContext) -> Result<(), Error> {
        Err(ErrorCode::UnsupportedAccess.into())
    }
}

impl Handler for PowerSourceHandler {
    fn read(&self, ctx: impl ReadContext, reply: impl ReadReply) -> Result<(), Error> {
        self.read_impl(ctx, reply)
    }

    fn write(&self, ctx: impl WriteContext) -> Result<(), Error> {
        self.write_impl(ctx)
    }
}

impl NonBlockingHandler for PowerSourceHandler {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_ids_round_trip() {
        assert_eq!(
            PowerSourceAttribute::from_repr(0x000C),
            Some(PowerSourceAttribute::BatPercentRemaining)
        );
        assert_eq!(
            PowerSourceAttribute::from_repr(0x001A),
            Some(PowerSourceAttribute::BatChargeState)
        );
        assert_eq!(PowerSourceAttribute::from_repr(0x0003), None);
    }

    #[test]
    fn test_feature_map_has_battery_and_rechargeable() {
        assert_eq!(CLUSTER.feature_map, 0x06);
        assert_eq!(CLUSTER.id, 0x002F);
    }
}
