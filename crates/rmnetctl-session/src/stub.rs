//! In-process stand-in for the driver, answering requests from a small
//! in-memory device table.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::time::Duration;

use bytes::BytesMut;
use rmnetctl_frame::{
    decode_request, encode_response, DeviceName, EgressFormat, EndpointId, FrameHeader,
    KernelStatus, LogicalEpState, MessageType, OperatingMode, Reply, Request, Response,
    ResponseData, NLMSG_HDRLEN,
};
use rmnetctl_transport::{Result, Transport, TransportError};

/// One-shot corruption applied to the next reply.
#[derive(Debug, Clone)]
pub(crate) enum Tamper {
    /// Shift the reply's sequence number.
    Sequence(u32),
    /// Answer with a different operation code.
    MessageType(u16),
    /// Deliver only the first bytes of the reply.
    Truncate(usize),
    /// Deliver these bytes instead of the reply.
    Raw(Vec<u8>),
}

#[derive(Debug, Default)]
pub(crate) struct StubKernel {
    pub associated: BTreeSet<DeviceName>,
    pub egress: BTreeMap<DeviceName, EgressFormat>,
    pub ingress: BTreeMap<DeviceName, u32>,
    pub endpoints: BTreeMap<(DeviceName, EndpointId), LogicalEpState>,
    pub vnds: BTreeMap<u32, DeviceName>,
    /// Every request received, in order.
    pub requests: Vec<(FrameHeader, Request)>,
    pub tamper: Option<Tamper>,
    pub fail_send: bool,
    pending: VecDeque<Vec<u8>>,
}

impl StubKernel {
    /// Decode one request datagram and produce the reply datagram.
    pub fn answer(&mut self, datagram: &[u8]) -> Vec<u8> {
        let (header, request) = decode_request(datagram).expect("stub received a bad request");
        let reply = self.handle(&request);
        let mut message_type = request.message_type().code();
        let mut sequence = header.sequence;
        let tamper = self.tamper.take();

        match &tamper {
            Some(Tamper::Sequence(delta)) => sequence = sequence.wrapping_add(*delta),
            Some(Tamper::MessageType(code)) => message_type = *code,
            _ => {}
        }

        self.requests.push((header, request.clone()));

        let mut buf = BytesMut::new();
        let response = Response {
            sequence,
            message_type: request.message_type(),
            reply,
        };
        encode_response(&response, 0, &mut buf);
        buf[NLMSG_HDRLEN + 2..NLMSG_HDRLEN + 4].copy_from_slice(&message_type.to_ne_bytes());

        match tamper {
            Some(Tamper::Truncate(len)) => buf[..len].to_vec(),
            Some(Tamper::Raw(bytes)) => bytes,
            _ => buf.to_vec(),
        }
    }

    fn handle(&mut self, request: &Request) -> Reply {
        match request {
            Request::AssociateNetworkDevice { device } => {
                self.associated.insert(device.clone());
                Reply::Status(KernelStatus::Ok)
            }
            Request::UnassociateNetworkDevice { device } => {
                status(self.associated.remove(device), KernelStatus::NoSuchDevice)
            }
            Request::GetNetworkDeviceAssociated { device } => {
                Reply::Data(ResponseData::Associated(self.associated.contains(device)))
            }
            Request::SetLinkEgressDataFormat { device, format } => {
                if !self.associated.contains(device) {
                    return Reply::Status(KernelStatus::NoSuchDevice);
                }
                self.egress.insert(device.clone(), *format);
                Reply::Status(KernelStatus::Ok)
            }
            Request::GetLinkEgressDataFormat { device } => {
                if !self.associated.contains(device) {
                    return Reply::Status(KernelStatus::NoSuchDevice);
                }
                let format = self.egress.get(device).copied().unwrap_or_default();
                Reply::Data(ResponseData::EgressFormat(format))
            }
            Request::SetLinkIngressDataFormat { device, flags } => {
                if !self.associated.contains(device) {
                    return Reply::Status(KernelStatus::NoSuchDevice);
                }
                self.ingress.insert(device.clone(), *flags);
                Reply::Status(KernelStatus::Ok)
            }
            Request::GetLinkIngressDataFormat { device } => {
                if !self.associated.contains(device) {
                    return Reply::Status(KernelStatus::NoSuchDevice);
                }
                let flags = self.ingress.get(device).copied().unwrap_or_default();
                Reply::Data(ResponseData::IngressFormat(flags))
            }
            Request::SetLogicalEpConfig { config } => {
                if !self.associated.contains(&config.device) {
                    return Reply::Status(KernelStatus::NoSuchDevice);
                }
                self.endpoints.insert(
                    (config.device.clone(), config.ep_id),
                    LogicalEpState {
                        mode: config.mode,
                        next_device: config.next_device.clone(),
                    },
                );
                Reply::Status(KernelStatus::Ok)
            }
            Request::UnsetLogicalEpConfig { ep_id, device } => status(
                self.endpoints.remove(&(device.clone(), *ep_id)).is_some(),
                KernelStatus::InvalidRequest,
            ),
            Request::GetLogicalEpConfig { ep_id, device } => {
                if !self.associated.contains(device) {
                    return Reply::Status(KernelStatus::NoSuchDevice);
                }
                let state = self
                    .endpoints
                    .get(&(device.clone(), *ep_id))
                    .cloned()
                    .unwrap_or(LogicalEpState {
                        mode: OperatingMode::None,
                        next_device: None,
                    });
                Reply::Data(ResponseData::LogicalEp(state))
            }
            Request::NewVnd { id } => {
                let name = DeviceName::new(&format!("rmnet_data{id}")).expect("vnd name");
                self.create_vnd(*id, name)
            }
            Request::NewVndWithPrefix { id, prefix } => {
                match DeviceName::new(&format!("{prefix}{id}")) {
                    Ok(name) => self.create_vnd(*id, name),
                    Err(_) => Reply::Status(KernelStatus::BadArguments),
                }
            }
            Request::GetVndName { id } => match self.vnds.get(id) {
                Some(name) => Reply::Data(ResponseData::VndName(name.clone())),
                None => Reply::Status(KernelStatus::NoSuchDevice),
            },
            Request::FreeVnd { id } => {
                status(self.vnds.remove(id).is_some(), KernelStatus::NoSuchDevice)
            }
        }
    }

    fn create_vnd(&mut self, id: u32, name: DeviceName) -> Reply {
        if self.vnds.contains_key(&id) {
            return Reply::Status(KernelStatus::DeviceInUse);
        }
        self.vnds.insert(id, name);
        Reply::Status(KernelStatus::Ok)
    }

    /// Operation codes of every request received, in order.
    pub fn operations(&self) -> Vec<MessageType> {
        self.requests
            .iter()
            .map(|(_, request)| request.message_type())
            .collect()
    }
}

fn status(ok: bool, failure: KernelStatus) -> Reply {
    Reply::Status(if ok { KernelStatus::Ok } else { failure })
}

impl Transport for StubKernel {
    fn send(&mut self, datagram: &[u8]) -> Result<()> {
        if self.fail_send {
            return Err(TransportError::Send(std::io::Error::from(
                std::io::ErrorKind::ConnectionRefused,
            )));
        }
        let reply = self.answer(datagram);
        self.pending.push_back(reply);
        Ok(())
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        let datagram = self.pending.pop_front().ok_or_else(|| {
            TransportError::Receive(std::io::Error::from(std::io::ErrorKind::WouldBlock))
        })?;
        let len = datagram.len().min(buf.len());
        buf[..len].copy_from_slice(&datagram[..len]);
        Ok(len)
    }

    fn set_read_timeout(&mut self, _timeout: Option<Duration>) -> Result<()> {
        Ok(())
    }

    fn set_write_timeout(&mut self, _timeout: Option<Duration>) -> Result<()> {
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "stub"
    }
}
