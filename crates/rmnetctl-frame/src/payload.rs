//! Typed payloads, one variant per operation code.
//!
//! Every payload lives in the fixed 64-byte data area of the control message.
//! Field offsets follow the driver's C unions:
//!
//! ```text
//! device:        dev[16]
//! data format:   dev[16] | flags u32 @16 | agg_size u16 @20 | agg_count u16 @22
//! logical ep:    dev[16] | ep_id i32 @16 | mode u8 @20 | next_dev[16] @21
//! vnd:           id u32 @0 | vnd_name[16] @4
//! ```

use serde::Serialize;

use crate::error::{FrameError, Result};
use crate::message::{KernelStatus, MessageType};
use crate::name::{DeviceName, MAX_NAME_LEN};

/// Size of the data area in every control message.
pub const DATA_LEN: usize = 64;

const DEV_OFFSET: usize = 0;
const FLAGS_OFFSET: usize = 16;
const AGG_SIZE_OFFSET: usize = 20;
const AGG_COUNT_OFFSET: usize = 22;
const EP_ID_OFFSET: usize = 16;
const MODE_OFFSET: usize = 20;
const NEXT_DEV_OFFSET: usize = 21;
const VND_ID_OFFSET: usize = 0;
const VND_NAME_OFFSET: usize = 4;

const DEVICE_ARG_LEN: u16 = MAX_NAME_LEN as u16;
const EGRESS_ARG_LEN: u16 = DEVICE_ARG_LEN + 4 + 2 + 2;
const INGRESS_ARG_LEN: u16 = DEVICE_ARG_LEN + 4;
const LOGICAL_EP_ARG_LEN: u16 = DEVICE_ARG_LEN + 4 + 1 + DEVICE_ARG_LEN;
const VND_ARG_LEN: u16 = 4;
const VND_PREFIX_ARG_LEN: u16 = VND_ARG_LEN + DEVICE_ARG_LEN;

/// Egress (uplink) data format of a physical device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct EgressFormat {
    /// Bitwise OR of [`crate::message::egress`] flags.
    pub flags: u32,
    /// Maximum size in bytes of an aggregated packet.
    pub agg_size: u16,
    /// Maximum number of packets per aggregate.
    pub agg_count: u16,
}

/// Logical endpoint identifier. -1 addresses the device's default endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EndpointId(i32);

impl EndpointId {
    /// The device's default endpoint.
    pub const DEFAULT: EndpointId = EndpointId(-1);
    /// Number of muxed logical endpoints per device.
    pub const MAX_LOGICAL: i32 = 32;

    pub fn new(id: i32) -> Result<Self> {
        if !(-1..Self::MAX_LOGICAL).contains(&id) {
            return Err(FrameError::InvalidArgument(format!(
                "logical endpoint id {id} outside -1..={}",
                Self::MAX_LOGICAL - 1
            )));
        }
        Ok(Self(id))
    }

    pub fn get(self) -> i32 {
        self.0
    }
}

/// How a logical endpoint forwards traffic.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    /// Endpoint is unconfigured; packets are dropped.
    None = 0,
    /// Packets are delivered to a virtual network device.
    Vnd = 1,
    /// Packets are bridged to another physical device.
    Bridge = 2,
}

impl OperatingMode {
    pub fn from_wire(mode: u8) -> Result<Self> {
        match mode {
            0 => Ok(OperatingMode::None),
            1 => Ok(OperatingMode::Vnd),
            2 => Ok(OperatingMode::Bridge),
            other => Err(FrameError::UnknownMode(other)),
        }
    }

    /// Whether this mode forwards to a next-hop device.
    pub fn has_next_device(self) -> bool {
        !matches!(self, OperatingMode::None)
    }
}

/// Configuration written to one logical endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogicalEpConfig {
    pub ep_id: EndpointId,
    pub device: DeviceName,
    pub mode: OperatingMode,
    pub next_device: Option<DeviceName>,
}

impl LogicalEpConfig {
    /// Build a configuration, checking that the next-hop device matches the mode.
    pub fn new(
        ep_id: EndpointId,
        device: DeviceName,
        mode: OperatingMode,
        next_device: Option<DeviceName>,
    ) -> Result<Self> {
        match (mode.has_next_device(), next_device.is_some()) {
            (true, false) => Err(FrameError::InvalidArgument(format!(
                "{mode:?} mode requires a next-hop device"
            ))),
            (false, true) => Err(FrameError::InvalidArgument(
                "mode None does not take a next-hop device".to_string(),
            )),
            _ => Ok(Self {
                ep_id,
                device,
                mode,
                next_device,
            }),
        }
    }
}

/// Logical endpoint state as reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogicalEpState {
    pub mode: OperatingMode,
    pub next_device: Option<DeviceName>,
}

/// A configuration request, one variant per operation code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    AssociateNetworkDevice {
        device: DeviceName,
    },
    UnassociateNetworkDevice {
        device: DeviceName,
    },
    GetNetworkDeviceAssociated {
        device: DeviceName,
    },
    SetLinkEgressDataFormat {
        device: DeviceName,
        format: EgressFormat,
    },
    GetLinkEgressDataFormat {
        device: DeviceName,
    },
    SetLinkIngressDataFormat {
        device: DeviceName,
        flags: u32,
    },
    GetLinkIngressDataFormat {
        device: DeviceName,
    },
    SetLogicalEpConfig {
        config: LogicalEpConfig,
    },
    UnsetLogicalEpConfig {
        ep_id: EndpointId,
        device: DeviceName,
    },
    GetLogicalEpConfig {
        ep_id: EndpointId,
        device: DeviceName,
    },
    NewVnd {
        id: u32,
    },
    NewVndWithPrefix {
        id: u32,
        prefix: DeviceName,
    },
    GetVndName {
        id: u32,
    },
    FreeVnd {
        id: u32,
    },
}

impl Request {
    /// Operation code for this request.
    pub fn message_type(&self) -> MessageType {
        match self {
            Request::AssociateNetworkDevice { .. } => MessageType::AssociateNetworkDevice,
            Request::UnassociateNetworkDevice { .. } => MessageType::UnassociateNetworkDevice,
            Request::GetNetworkDeviceAssociated { .. } => MessageType::GetNetworkDeviceAssociated,
            Request::SetLinkEgressDataFormat { .. } => MessageType::SetLinkEgressDataFormat,
            Request::GetLinkEgressDataFormat { .. } => MessageType::GetLinkEgressDataFormat,
            Request::SetLinkIngressDataFormat { .. } => MessageType::SetLinkIngressDataFormat,
            Request::GetLinkIngressDataFormat { .. } => MessageType::GetLinkIngressDataFormat,
            Request::SetLogicalEpConfig { .. } => MessageType::SetLogicalEpConfig,
            Request::UnsetLogicalEpConfig { .. } => MessageType::UnsetLogicalEpConfig,
            Request::GetLogicalEpConfig { .. } => MessageType::GetLogicalEpConfig,
            Request::NewVnd { .. } => MessageType::NewVnd,
            Request::NewVndWithPrefix { .. } => MessageType::NewVndWithPrefix,
            Request::GetVndName { .. } => MessageType::GetVndName,
            Request::FreeVnd { .. } => MessageType::FreeVnd,
        }
    }

    /// Value of the `arg_length` header field.
    pub fn arg_length(&self) -> u16 {
        match self {
            Request::SetLinkEgressDataFormat { .. } => EGRESS_ARG_LEN,
            Request::SetLinkIngressDataFormat { .. } => INGRESS_ARG_LEN,
            Request::SetLogicalEpConfig { .. }
            | Request::UnsetLogicalEpConfig { .. }
            | Request::GetLogicalEpConfig { .. } => LOGICAL_EP_ARG_LEN,
            Request::NewVnd { .. } | Request::GetVndName { .. } | Request::FreeVnd { .. } => {
                VND_ARG_LEN
            }
            Request::NewVndWithPrefix { .. } => VND_PREFIX_ARG_LEN,
            _ => DEVICE_ARG_LEN,
        }
    }

    /// Fill the data area for this request.
    pub(crate) fn encode_data(&self, data: &mut [u8; DATA_LEN]) {
        match self {
            Request::AssociateNetworkDevice { device }
            | Request::UnassociateNetworkDevice { device }
            | Request::GetNetworkDeviceAssociated { device }
            | Request::GetLinkEgressDataFormat { device }
            | Request::GetLinkIngressDataFormat { device } => {
                put_name(data, DEV_OFFSET, device);
            }
            Request::SetLinkEgressDataFormat { device, format } => {
                put_egress(data, device, format);
            }
            Request::SetLinkIngressDataFormat { device, flags } => {
                put_name(data, DEV_OFFSET, device);
                put_u32(data, FLAGS_OFFSET, *flags);
            }
            Request::SetLogicalEpConfig { config } => {
                put_name(data, DEV_OFFSET, &config.device);
                put_i32(data, EP_ID_OFFSET, config.ep_id.get());
                data[MODE_OFFSET] = config.mode as u8;
                if let Some(next) = &config.next_device {
                    put_name(data, NEXT_DEV_OFFSET, next);
                }
            }
            Request::UnsetLogicalEpConfig { ep_id, device }
            | Request::GetLogicalEpConfig { ep_id, device } => {
                put_name(data, DEV_OFFSET, device);
                put_i32(data, EP_ID_OFFSET, ep_id.get());
            }
            Request::NewVnd { id } | Request::GetVndName { id } | Request::FreeVnd { id } => {
                put_u32(data, VND_ID_OFFSET, *id);
            }
            Request::NewVndWithPrefix { id, prefix } => {
                put_u32(data, VND_ID_OFFSET, *id);
                put_name(data, VND_NAME_OFFSET, prefix);
            }
        }
    }

    /// Rebuild a request from its operation code and data area.
    pub(crate) fn decode_data(message_type: MessageType, data: &[u8]) -> Result<Self> {
        let view = DataView(data);
        let request = match message_type {
            MessageType::AssociateNetworkDevice => Request::AssociateNetworkDevice {
                device: view.required_name(DEV_OFFSET)?,
            },
            MessageType::UnassociateNetworkDevice => Request::UnassociateNetworkDevice {
                device: view.required_name(DEV_OFFSET)?,
            },
            MessageType::GetNetworkDeviceAssociated => Request::GetNetworkDeviceAssociated {
                device: view.required_name(DEV_OFFSET)?,
            },
            MessageType::SetLinkEgressDataFormat => Request::SetLinkEgressDataFormat {
                device: view.required_name(DEV_OFFSET)?,
                format: view.egress()?,
            },
            MessageType::GetLinkEgressDataFormat => Request::GetLinkEgressDataFormat {
                device: view.required_name(DEV_OFFSET)?,
            },
            MessageType::SetLinkIngressDataFormat => Request::SetLinkIngressDataFormat {
                device: view.required_name(DEV_OFFSET)?,
                flags: view.u32_at(FLAGS_OFFSET)?,
            },
            MessageType::GetLinkIngressDataFormat => Request::GetLinkIngressDataFormat {
                device: view.required_name(DEV_OFFSET)?,
            },
            MessageType::SetLogicalEpConfig => {
                let mode = OperatingMode::from_wire(view.u8_at(MODE_OFFSET)?)?;
                let next_device = if mode.has_next_device() {
                    view.name(NEXT_DEV_OFFSET)?
                } else {
                    None
                };
                Request::SetLogicalEpConfig {
                    config: LogicalEpConfig::new(
                        EndpointId::new(view.i32_at(EP_ID_OFFSET)?)?,
                        view.required_name(DEV_OFFSET)?,
                        mode,
                        next_device,
                    )?,
                }
            }
            MessageType::UnsetLogicalEpConfig => Request::UnsetLogicalEpConfig {
                ep_id: EndpointId::new(view.i32_at(EP_ID_OFFSET)?)?,
                device: view.required_name(DEV_OFFSET)?,
            },
            MessageType::GetLogicalEpConfig => Request::GetLogicalEpConfig {
                ep_id: EndpointId::new(view.i32_at(EP_ID_OFFSET)?)?,
                device: view.required_name(DEV_OFFSET)?,
            },
            MessageType::NewVnd => Request::NewVnd {
                id: view.u32_at(VND_ID_OFFSET)?,
            },
            MessageType::NewVndWithPrefix => Request::NewVndWithPrefix {
                id: view.u32_at(VND_ID_OFFSET)?,
                prefix: view.required_name(VND_NAME_OFFSET)?,
            },
            MessageType::GetVndName => Request::GetVndName {
                id: view.u32_at(VND_ID_OFFSET)?,
            },
            MessageType::FreeVnd => Request::FreeVnd {
                id: view.u32_at(VND_ID_OFFSET)?,
            },
        };
        Ok(request)
    }
}

/// Data returned by a query operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseData {
    /// Whether the driver is registered on the device.
    Associated(bool),
    EgressFormat(EgressFormat),
    /// Ingress format flags, see [`crate::message::ingress`].
    IngressFormat(u32),
    LogicalEp(LogicalEpState),
    VndName(DeviceName),
}

impl ResponseData {
    /// Operation code this data answers.
    pub fn message_type(&self) -> MessageType {
        match self {
            ResponseData::Associated(_) => MessageType::GetNetworkDeviceAssociated,
            ResponseData::EgressFormat(_) => MessageType::GetLinkEgressDataFormat,
            ResponseData::IngressFormat(_) => MessageType::GetLinkIngressDataFormat,
            ResponseData::LogicalEp(_) => MessageType::GetLogicalEpConfig,
            ResponseData::VndName(_) => MessageType::GetVndName,
        }
    }

    /// Fill the data area; returns the value of the `return_code` field.
    pub(crate) fn encode_data(&self, data: &mut [u8; DATA_LEN]) -> u16 {
        match self {
            ResponseData::Associated(registered) => return u16::from(*registered),
            ResponseData::EgressFormat(format) => {
                put_u32(data, FLAGS_OFFSET, format.flags);
                put_u16(data, AGG_SIZE_OFFSET, format.agg_size);
                put_u16(data, AGG_COUNT_OFFSET, format.agg_count);
            }
            ResponseData::IngressFormat(flags) => put_u32(data, FLAGS_OFFSET, *flags),
            ResponseData::LogicalEp(state) => {
                data[MODE_OFFSET] = state.mode as u8;
                if let Some(next) = &state.next_device {
                    put_name(data, NEXT_DEV_OFFSET, next);
                }
            }
            ResponseData::VndName(name) => put_name(data, VND_NAME_OFFSET, name),
        }
        KernelStatus::Ok.code()
    }

    /// Decode the data of a `return data` reply.
    ///
    /// Reads only within `data`, whatever the header claimed.
    pub(crate) fn decode_data(
        message_type: MessageType,
        return_code: u16,
        data: &[u8],
    ) -> Result<Self> {
        let view = DataView(data);
        match message_type {
            MessageType::GetNetworkDeviceAssociated => {
                Ok(ResponseData::Associated(return_code != 0))
            }
            MessageType::GetLinkEgressDataFormat => {
                Ok(ResponseData::EgressFormat(view.egress()?))
            }
            MessageType::GetLinkIngressDataFormat => {
                Ok(ResponseData::IngressFormat(view.u32_at(FLAGS_OFFSET)?))
            }
            MessageType::GetLogicalEpConfig => Ok(ResponseData::LogicalEp(LogicalEpState {
                mode: OperatingMode::from_wire(view.u8_at(MODE_OFFSET)?)?,
                next_device: view.name(NEXT_DEV_OFFSET)?,
            })),
            MessageType::GetVndName => view
                .name(VND_NAME_OFFSET)?
                .map(ResponseData::VndName)
                .ok_or(FrameError::InvalidName("driver returned an empty name")),
            other => Err(FrameError::UnexpectedReply {
                message_type: other.name(),
                crd: crate::message::ReplyKind::ReturnData as u8,
            }),
        }
    }
}

/// Bounds-checked reads over a received data area.
struct DataView<'a>(&'a [u8]);

impl DataView<'_> {
    fn bytes(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.0
            .get(offset..offset + len)
            .ok_or(FrameError::Truncated {
                need: offset + len,
                have: self.0.len(),
            })
    }

    fn u8_at(&self, offset: usize) -> Result<u8> {
        Ok(self.bytes(offset, 1)?[0])
    }

    fn u16_at(&self, offset: usize) -> Result<u16> {
        let mut raw = [0u8; 2];
        raw.copy_from_slice(self.bytes(offset, 2)?);
        Ok(u16::from_ne_bytes(raw))
    }

    fn u32_at(&self, offset: usize) -> Result<u32> {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(self.bytes(offset, 4)?);
        Ok(u32::from_ne_bytes(raw))
    }

    fn i32_at(&self, offset: usize) -> Result<i32> {
        self.u32_at(offset).map(|v| v as i32)
    }

    fn name(&self, offset: usize) -> Result<Option<DeviceName>> {
        // A name field may be cut short by the end of the datagram; whatever
        // is present must still hold the terminator.
        let field = self.0.get(offset..).unwrap_or(&[]);
        if field.is_empty() {
            return Err(FrameError::Truncated {
                need: offset + 1,
                have: self.0.len(),
            });
        }
        DeviceName::from_field(field)
    }

    fn required_name(&self, offset: usize) -> Result<DeviceName> {
        self.name(offset)?
            .ok_or(FrameError::InvalidName("name is empty"))
    }

    fn egress(&self) -> Result<EgressFormat> {
        Ok(EgressFormat {
            flags: self.u32_at(FLAGS_OFFSET)?,
            agg_size: self.u16_at(AGG_SIZE_OFFSET)?,
            agg_count: self.u16_at(AGG_COUNT_OFFSET)?,
        })
    }
}

fn put_name(data: &mut [u8; DATA_LEN], offset: usize, name: &DeviceName) {
    data[offset..offset + MAX_NAME_LEN].copy_from_slice(&name.to_field());
}

fn put_u16(data: &mut [u8; DATA_LEN], offset: usize, value: u16) {
    data[offset..offset + 2].copy_from_slice(&value.to_ne_bytes());
}

fn put_u32(data: &mut [u8; DATA_LEN], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_ne_bytes());
}

fn put_i32(data: &mut [u8; DATA_LEN], offset: usize, value: i32) {
    data[offset..offset + 4].copy_from_slice(&value.to_ne_bytes());
}

fn put_egress(data: &mut [u8; DATA_LEN], device: &DeviceName, format: &EgressFormat) {
    put_name(data, DEV_OFFSET, device);
    put_u32(data, FLAGS_OFFSET, format.flags);
    put_u16(data, AGG_SIZE_OFFSET, format.agg_size);
    put_u16(data, AGG_COUNT_OFFSET, format.agg_count);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::egress;

    fn dev(name: &str) -> DeviceName {
        DeviceName::new(name).unwrap()
    }

    #[test]
    fn egress_fields_land_at_union_offsets() {
        let request = Request::SetLinkEgressDataFormat {
            device: dev("rmnet0"),
            format: EgressFormat {
                flags: egress::MAP | egress::AGGREGATION,
                agg_size: 8192,
                agg_count: 20,
            },
        };
        let mut data = [0u8; DATA_LEN];
        request.encode_data(&mut data);

        assert_eq!(&data[..7], b"rmnet0\0");
        assert_eq!(
            u32::from_ne_bytes(data[16..20].try_into().unwrap()),
            egress::MAP | egress::AGGREGATION
        );
        assert_eq!(u16::from_ne_bytes(data[20..22].try_into().unwrap()), 8192);
        assert_eq!(u16::from_ne_bytes(data[22..24].try_into().unwrap()), 20);
        assert_eq!(request.arg_length(), 24);
    }

    #[test]
    fn logical_ep_fields_land_at_union_offsets() {
        let config = LogicalEpConfig::new(
            EndpointId::new(3).unwrap(),
            dev("rmnet_ipa0"),
            OperatingMode::Vnd,
            Some(dev("rmnet_data3")),
        )
        .unwrap();
        let request = Request::SetLogicalEpConfig { config };
        let mut data = [0u8; DATA_LEN];
        request.encode_data(&mut data);

        assert_eq!(i32::from_ne_bytes(data[16..20].try_into().unwrap()), 3);
        assert_eq!(data[20], OperatingMode::Vnd as u8);
        assert_eq!(&data[21..33], b"rmnet_data3\0");
        assert_eq!(request.arg_length(), 37);
    }

    #[test]
    fn vnd_prefix_follows_id() {
        let request = Request::NewVndWithPrefix {
            id: 5,
            prefix: dev("wwan"),
        };
        let mut data = [0u8; DATA_LEN];
        request.encode_data(&mut data);

        assert_eq!(u32::from_ne_bytes(data[0..4].try_into().unwrap()), 5);
        assert_eq!(&data[4..9], b"wwan\0");
        assert_eq!(request.arg_length(), 20);
    }

    #[test]
    fn request_data_decodes_back() {
        let request = Request::UnsetLogicalEpConfig {
            ep_id: EndpointId::DEFAULT,
            device: dev("rmnet_ipa0"),
        };
        let mut data = [0u8; DATA_LEN];
        request.encode_data(&mut data);
        let back = Request::decode_data(request.message_type(), &data).unwrap();
        assert_eq!(back, request);
    }

    #[test]
    fn endpoint_id_range() {
        assert!(EndpointId::new(-1).is_ok());
        assert!(EndpointId::new(31).is_ok());
        assert!(matches!(
            EndpointId::new(32),
            Err(FrameError::InvalidArgument(_))
        ));
        assert!(matches!(
            EndpointId::new(-2),
            Err(FrameError::InvalidArgument(_))
        ));
    }

    #[test]
    fn next_device_must_match_mode() {
        let ep = EndpointId::new(0).unwrap();
        assert!(LogicalEpConfig::new(ep, dev("rmnet0"), OperatingMode::Bridge, None).is_err());
        assert!(LogicalEpConfig::new(
            ep,
            dev("rmnet0"),
            OperatingMode::None,
            Some(dev("rmnet1"))
        )
        .is_err());
        assert!(LogicalEpConfig::new(ep, dev("rmnet0"), OperatingMode::None, None).is_ok());
    }

    #[test]
    fn association_flag_travels_in_return_code() {
        let mut data = [0u8; DATA_LEN];
        let code = ResponseData::Associated(true).encode_data(&mut data);
        assert_eq!(code, 1);
        assert_eq!(
            ResponseData::decode_data(MessageType::GetNetworkDeviceAssociated, 0, &data).unwrap(),
            ResponseData::Associated(false)
        );
    }

    #[test]
    fn short_data_area_is_reported_not_read_past() {
        let data = [0u8; 18];
        let err = ResponseData::decode_data(MessageType::GetLinkEgressDataFormat, 0, &data)
            .unwrap_err();
        assert_eq!(err, FrameError::Truncated { need: 20, have: 18 });
    }

    #[test]
    fn unknown_mode_in_reply_is_rejected() {
        let mut data = [0u8; DATA_LEN];
        data[MODE_OFFSET] = 9;
        let err =
            ResponseData::decode_data(MessageType::GetLogicalEpConfig, 0, &data).unwrap_err();
        assert_eq!(err, FrameError::UnknownMode(9));
    }

    #[test]
    fn empty_vnd_name_reply_is_rejected() {
        let data = [0u8; DATA_LEN];
        assert!(matches!(
            ResponseData::decode_data(MessageType::GetVndName, 0, &data),
            Err(FrameError::InvalidName(_))
        ));
    }
}
