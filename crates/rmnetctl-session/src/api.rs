//! Typed configuration operations, one per driver operation code.
//!
//! Every operation validates its arguments before any I/O, runs exactly one
//! transaction and reports the driver's answer. A driver that refuses a
//! request is not an error here: status operations return the
//! [`KernelStatus`], and queries return [`QueryReply::Status`].

use rmnetctl_frame::{
    DeviceName, EgressFormat, EndpointId, KernelStatus, LogicalEpConfig, LogicalEpState,
    MessageType, Reply, Request, ResponseData,
};
use rmnetctl_transport::Transport;
use serde::Serialize;

use crate::error::{Result, RmnetError};
use crate::session::Session;

/// Answer to a query operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryReply<T> {
    /// The driver answered with data.
    Data(T),
    /// The driver refused the query.
    Status(KernelStatus),
}

impl<T> QueryReply<T> {
    /// The data, if the driver answered with some.
    pub fn data(self) -> Option<T> {
        match self {
            QueryReply::Data(data) => Some(data),
            QueryReply::Status(_) => None,
        }
    }

    /// Kernel status of the answer; `Ok` for data replies.
    pub fn status(&self) -> KernelStatus {
        match self {
            QueryReply::Data(_) => KernelStatus::Ok,
            QueryReply::Status(status) => *status,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryReply<U> {
        match self {
            QueryReply::Data(data) => QueryReply::Data(f(data)),
            QueryReply::Status(status) => QueryReply::Status(status),
        }
    }
}

/// Register or unregister the driver on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Association {
    Associate,
    Unassociate,
}

/// Create or free a virtual network device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VndAction {
    Create,
    Free,
}

impl<T: Transport> Session<T> {
    /// Register (or unregister) the driver on `device`.
    pub fn associate_network_device(
        &mut self,
        device: &str,
        action: Association,
    ) -> Result<KernelStatus> {
        let device = DeviceName::new(device)?;
        let request = match action {
            Association::Associate => Request::AssociateNetworkDevice { device },
            Association::Unassociate => Request::UnassociateNetworkDevice { device },
        };
        self.status_op(&request)
    }

    /// Whether the driver is registered on `device`.
    pub fn network_device_associated(&mut self, device: &str) -> Result<QueryReply<bool>> {
        let device = DeviceName::new(device)?;
        self.query_op(&Request::GetNetworkDeviceAssociated { device }, |data| {
            match data {
                ResponseData::Associated(registered) => Some(registered),
                _ => None,
            }
        })
    }

    /// Set the egress data format of `device`.
    pub fn set_link_egress_data_format(
        &mut self,
        device: &str,
        format: EgressFormat,
    ) -> Result<KernelStatus> {
        let device = DeviceName::new(device)?;
        self.status_op(&Request::SetLinkEgressDataFormat { device, format })
    }

    /// Egress data format of `device`.
    pub fn link_egress_data_format(&mut self, device: &str) -> Result<QueryReply<EgressFormat>> {
        let device = DeviceName::new(device)?;
        self.query_op(&Request::GetLinkEgressDataFormat { device }, |data| match data {
            ResponseData::EgressFormat(format) => Some(format),
            _ => None,
        })
    }

    /// Set the ingress data format flags of `device`.
    pub fn set_link_ingress_data_format(
        &mut self,
        device: &str,
        flags: u32,
    ) -> Result<KernelStatus> {
        let device = DeviceName::new(device)?;
        self.status_op(&Request::SetLinkIngressDataFormat { device, flags })
    }

    /// Ingress data format flags of `device`.
    pub fn link_ingress_data_format(&mut self, device: &str) -> Result<QueryReply<u32>> {
        let device = DeviceName::new(device)?;
        self.query_op(&Request::GetLinkIngressDataFormat { device }, |data| match data {
            ResponseData::IngressFormat(flags) => Some(flags),
            _ => None,
        })
    }

    /// Configure a logical endpoint.
    pub fn set_logical_ep_config(&mut self, config: LogicalEpConfig) -> Result<KernelStatus> {
        self.status_op(&Request::SetLogicalEpConfig { config })
    }

    /// Return a logical endpoint to its unconfigured state.
    pub fn unset_logical_ep_config(&mut self, ep_id: i32, device: &str) -> Result<KernelStatus> {
        let ep_id = EndpointId::new(ep_id)?;
        let device = DeviceName::new(device)?;
        self.status_op(&Request::UnsetLogicalEpConfig { ep_id, device })
    }

    /// Configuration of a logical endpoint.
    pub fn logical_ep_config(
        &mut self,
        ep_id: i32,
        device: &str,
    ) -> Result<QueryReply<LogicalEpState>> {
        let ep_id = EndpointId::new(ep_id)?;
        let device = DeviceName::new(device)?;
        self.query_op(&Request::GetLogicalEpConfig { ep_id, device }, |data| {
            match data {
                ResponseData::LogicalEp(state) => Some(state),
                _ => None,
            }
        })
    }

    /// Create (or free) virtual network device `id` with the driver's default name.
    pub fn new_vnd(&mut self, id: u32, action: VndAction) -> Result<KernelStatus> {
        self.new_vnd_prefix(id, action, None)
    }

    /// Create virtual network device `id` named `<prefix><id>`, or free it.
    ///
    /// The prefix only applies to creation; it is ignored when freeing.
    pub fn new_vnd_prefix(
        &mut self,
        id: u32,
        action: VndAction,
        prefix: Option<&str>,
    ) -> Result<KernelStatus> {
        let request = match (action, prefix) {
            (VndAction::Free, _) => Request::FreeVnd { id },
            (VndAction::Create, None) => Request::NewVnd { id },
            (VndAction::Create, Some(prefix)) => Request::NewVndWithPrefix {
                id,
                prefix: DeviceName::new(prefix)?,
            },
        };
        self.status_op(&request)
    }

    /// Name of virtual network device `id`.
    pub fn vnd_name(&mut self, id: u32) -> Result<QueryReply<DeviceName>> {
        self.query_op(&Request::GetVndName { id }, |data| match data {
            ResponseData::VndName(name) => Some(name),
            _ => None,
        })
    }

    /// Resolve the name of virtual network device `id` into `buf`.
    ///
    /// `buf` is zero-filled first. On success it holds the NUL-terminated
    /// name. A name that does not fit together with its terminator fails
    /// with [`RmnetError::BufferTooSmall`] and leaves `buf` zeroed.
    pub fn vnd_name_into(&mut self, id: u32, buf: &mut [u8]) -> Result<KernelStatus> {
        buf.fill(0);
        match self.vnd_name(id)? {
            QueryReply::Data(name) => {
                let needed = name.len() + 1;
                if needed > buf.len() {
                    return Err(RmnetError::BufferTooSmall {
                        capacity: buf.len(),
                        needed,
                    });
                }
                buf[..name.len()].copy_from_slice(name.as_str().as_bytes());
                Ok(KernelStatus::Ok)
            }
            QueryReply::Status(status) => Ok(status),
        }
    }

    fn status_op(&mut self, request: &Request) -> Result<KernelStatus> {
        match self.execute(request)? {
            Reply::Status(status) => Ok(status),
            Reply::Data(data) => Err(unexpected(request.message_type(), &data)),
        }
    }

    fn query_op<R>(
        &mut self,
        request: &Request,
        extract: impl FnOnce(ResponseData) -> Option<R>,
    ) -> Result<QueryReply<R>> {
        match self.execute(request)? {
            Reply::Status(status) => Ok(QueryReply::Status(status)),
            Reply::Data(data) => {
                let message_type = data.message_type();
                extract(data)
                    .map(QueryReply::Data)
                    .ok_or(RmnetError::MessageTypeMismatch {
                        expected: request.message_type(),
                        received: message_type.code(),
                    })
            }
        }
    }
}

fn unexpected(expected: MessageType, data: &ResponseData) -> RmnetError {
    RmnetError::MessageTypeMismatch {
        expected,
        received: data.message_type().code(),
    }
}

#[cfg(test)]
mod tests {
    use rmnetctl_frame::{egress, ingress, OperatingMode};

    use super::*;
    use crate::classify::{ErrorCode, Outcome};
    use crate::config::SessionConfig;
    use crate::stub::StubKernel;

    fn session() -> Session<StubKernel> {
        Session::with_transport(StubKernel::default(), 777, &SessionConfig::default()).unwrap()
    }

    fn requests_sent(session: &Session<StubKernel>) -> usize {
        session.transport().unwrap().requests.len()
    }

    fn dev(name: &str) -> DeviceName {
        DeviceName::new(name).unwrap()
    }

    #[test]
    fn associate_device() {
        let mut session = session();
        let status = session
            .associate_network_device("rmnet_data0", Association::Associate)
            .unwrap();
        assert_eq!(status, KernelStatus::Ok);
        assert_eq!(
            session.transport().unwrap().operations(),
            vec![MessageType::AssociateNetworkDevice]
        );
        assert_eq!(
            session.network_device_associated("rmnet_data0").unwrap(),
            QueryReply::Data(true)
        );
    }

    #[test]
    fn unregistered_device_reports_false() {
        let mut session = session();
        assert_eq!(
            session.network_device_associated("rmnet_ipa0").unwrap(),
            QueryReply::Data(false)
        );
    }

    #[test]
    fn unassociate_unknown_device_is_kernel_status() {
        let mut session = session();
        let status = session
            .associate_network_device("rmnet0", Association::Unassociate)
            .unwrap();
        assert_eq!(status, KernelStatus::NoSuchDevice);
    }

    #[test]
    fn oversized_name_fails_before_io() {
        let mut session = session();
        let err = session
            .associate_network_device("this_name_is_too_long", Association::Associate)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::StringTruncation);
        assert_eq!(err.outcome(), Outcome::InvalidArgument);
        assert_eq!(requests_sent(&session), 0);
        assert_eq!(session.next_sequence(), 0);
    }

    #[test]
    fn out_of_range_endpoint_fails_before_io() {
        let mut session = session();
        let err = session.logical_ep_config(32, "rmnet0").unwrap_err();
        assert_eq!(err.code(), ErrorCode::RequestInvalid);
        assert_eq!(requests_sent(&session), 0);
    }

    #[test]
    fn egress_format_round_trips_through_driver() {
        let mut session = session();
        session
            .associate_network_device("rmnet_ipa0", Association::Associate)
            .unwrap();
        let format = EgressFormat {
            flags: egress::MAP | egress::AGGREGATION,
            agg_size: 8192,
            agg_count: 20,
        };
        assert_eq!(
            session
                .set_link_egress_data_format("rmnet_ipa0", format)
                .unwrap(),
            KernelStatus::Ok
        );
        assert_eq!(
            session.link_egress_data_format("rmnet_ipa0").unwrap(),
            QueryReply::Data(format)
        );
    }

    #[test]
    fn ingress_query_on_unknown_device_is_status() {
        let mut session = session();
        let reply = session.link_ingress_data_format("rmnet9").unwrap();
        assert_eq!(reply, QueryReply::Status(KernelStatus::NoSuchDevice));
        assert_eq!(reply.status(), KernelStatus::NoSuchDevice);
    }

    #[test]
    fn ingress_flags_round_trip() {
        let mut session = session();
        session
            .associate_network_device("rmnet_ipa0", Association::Associate)
            .unwrap();
        let flags = ingress::MAP | ingress::DEAGGREGATION;
        session
            .set_link_ingress_data_format("rmnet_ipa0", flags)
            .unwrap();
        assert_eq!(
            session
                .link_ingress_data_format("rmnet_ipa0")
                .unwrap()
                .data(),
            Some(flags)
        );
    }

    #[test]
    fn logical_endpoint_lifecycle() {
        let mut session = session();
        session
            .associate_network_device("rmnet_ipa0", Association::Associate)
            .unwrap();
        let config = LogicalEpConfig::new(
            EndpointId::new(3).unwrap(),
            dev("rmnet_ipa0"),
            OperatingMode::Vnd,
            Some(dev("rmnet_data3")),
        )
        .unwrap();
        assert_eq!(
            session.set_logical_ep_config(config).unwrap(),
            KernelStatus::Ok
        );

        let state = session
            .logical_ep_config(3, "rmnet_ipa0")
            .unwrap()
            .data()
            .unwrap();
        assert_eq!(state.mode, OperatingMode::Vnd);
        assert_eq!(state.next_device, Some(dev("rmnet_data3")));

        assert_eq!(
            session.unset_logical_ep_config(3, "rmnet_ipa0").unwrap(),
            KernelStatus::Ok
        );
        let state = session
            .logical_ep_config(3, "rmnet_ipa0")
            .unwrap()
            .data()
            .unwrap();
        assert_eq!(state.mode, OperatingMode::None);
        assert_eq!(state.next_device, None);
    }

    #[test]
    fn vnd_with_prefix_resolves_name() {
        let mut session = session();
        assert_eq!(
            session
                .new_vnd_prefix(5, VndAction::Create, Some("wwan"))
                .unwrap(),
            KernelStatus::Ok
        );
        assert_eq!(
            session.transport().unwrap().operations(),
            vec![MessageType::NewVndWithPrefix]
        );
        assert_eq!(
            session.vnd_name(5).unwrap(),
            QueryReply::Data(dev("wwan5"))
        );

        let mut buf = [0xAAu8; 16];
        assert_eq!(session.vnd_name_into(5, &mut buf).unwrap(), KernelStatus::Ok);
        assert_eq!(&buf[..6], b"wwan5\0");
        assert!(buf[6..].iter().all(|&b| b == 0));
    }

    #[test]
    fn small_name_buffer_fails_zeroed() {
        let mut session = session();
        session.new_vnd_prefix(5, VndAction::Create, Some("wwan")).unwrap();

        let mut buf = [0xAAu8; 2];
        let err = session.vnd_name_into(5, &mut buf).unwrap_err();
        assert!(matches!(
            err,
            RmnetError::BufferTooSmall {
                capacity: 2,
                needed: 6
            }
        ));
        assert_eq!(err.code(), ErrorCode::StringTruncation);
        assert_eq!(buf, [0, 0]);
    }

    #[test]
    fn name_exactly_filling_buffer_fits() {
        let mut session = session();
        session.new_vnd_prefix(5, VndAction::Create, Some("wwan")).unwrap();
        let mut buf = [0xAAu8; 6];
        session.vnd_name_into(5, &mut buf).unwrap();
        assert_eq!(&buf, b"wwan5\0");
    }

    #[test]
    fn vnd_name_of_unknown_id_is_status() {
        let mut session = session();
        let mut buf = [0xAAu8; 16];
        assert_eq!(
            session.vnd_name_into(8, &mut buf).unwrap(),
            KernelStatus::NoSuchDevice
        );
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn free_ignores_prefix() {
        let mut session = session();
        session.new_vnd(2, VndAction::Create).unwrap();
        assert_eq!(
            session
                .new_vnd_prefix(2, VndAction::Free, Some("not a valid prefix"))
                .unwrap(),
            KernelStatus::Ok
        );
        assert_eq!(
            session.transport().unwrap().operations(),
            vec![MessageType::NewVnd, MessageType::FreeVnd]
        );
    }

    #[test]
    fn duplicate_vnd_is_kernel_status() {
        let mut session = session();
        session.new_vnd(1, VndAction::Create).unwrap();
        assert_eq!(
            session.new_vnd(1, VndAction::Create).unwrap(),
            KernelStatus::DeviceInUse
        );
        assert_eq!(
            session.vnd_name(1).unwrap().data(),
            Some(dev("rmnet_data1"))
        );
    }

    #[test]
    fn operations_after_close_fail() {
        let mut session = session();
        session.close();
        let err = session.new_vnd(1, VndAction::Create).unwrap_err();
        assert_eq!(err.code(), ErrorCode::HndlInvalid);
    }

    #[test]
    fn query_reply_serializes() {
        let reply: QueryReply<bool> = QueryReply::Status(KernelStatus::NoSuchDevice);
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            serde_json::json!({ "status": "no_such_device" })
        );
        assert_eq!(
            serde_json::to_value(QueryReply::Data(true)).unwrap(),
            serde_json::json!({ "data": true })
        );
    }
}
