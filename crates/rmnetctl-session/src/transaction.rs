use rmnetctl_frame::{decode_response, encode_request, Reply, Request, FRAME_LEN};
use rmnetctl_transport::Transport;
use tracing::{debug, warn};

use crate::error::{Result, RmnetError};
use crate::session::Session;

impl<T: Transport> Session<T> {
    /// Run one request/response transaction.
    ///
    /// Stamps the request with the next sequence number and this session's
    /// port id, sends it as a single datagram and receives a single datagram
    /// back. The reply must carry the request's operation code and sequence
    /// number; anything else fails the transaction rather than being
    /// matched to a later request.
    ///
    /// A non-OK kernel status comes back as `Ok(Reply::Status(..))`; only
    /// failures to complete the exchange are errors.
    pub fn execute(&mut self, request: &Request) -> Result<Reply> {
        let transport = self.transport.as_mut().ok_or(RmnetError::HandleClosed)?;

        let message_type = request.message_type();
        let sequence = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);

        self.buf.clear();
        encode_request(request, sequence, self.port_id, &mut self.buf);
        transport.send(&self.buf)?;

        let mut rx = [0u8; FRAME_LEN];
        let len = transport.recv(&mut rx).inspect_err(|err| {
            if err.is_timeout() {
                warn!(%message_type, sequence, "timed out waiting for driver reply");
            }
        })?;

        let frame = decode_response(&rx[..len]).map_err(RmnetError::Response)?;
        if frame.header.message_type != message_type.code() {
            warn!(
                expected = %message_type,
                received = frame.header.message_type,
                sequence,
                "reply answers a different operation"
            );
            return Err(RmnetError::MessageTypeMismatch {
                expected: message_type,
                received: frame.header.message_type,
            });
        }
        if frame.header.sequence != sequence {
            warn!(
                %message_type,
                expected = sequence,
                received = frame.header.sequence,
                "reply belongs to a different transaction"
            );
            return Err(RmnetError::SequenceMismatch {
                expected: sequence,
                received: frame.header.sequence,
            });
        }

        let reply = frame.reply(message_type).map_err(RmnetError::Response)?;
        debug!(%message_type, sequence, ?reply, "transaction complete");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use rmnetctl_frame::{
        encode_response, DeviceName, KernelStatus, MessageType, Response, ResponseData, FRAME_LEN,
    };

    use super::*;
    use crate::classify::{ErrorCode, Outcome};
    use crate::config::SessionConfig;
    use crate::stub::{StubKernel, Tamper};

    fn session() -> Session<StubKernel> {
        Session::with_transport(StubKernel::default(), 4242, &SessionConfig::default()).unwrap()
    }

    fn stub(session: &mut Session<StubKernel>) -> &mut StubKernel {
        session.transport.as_mut().unwrap()
    }

    fn associate(name: &str) -> Request {
        Request::AssociateNetworkDevice {
            device: DeviceName::new(name).unwrap(),
        }
    }

    #[test]
    fn request_carries_port_id_and_sequence() {
        let mut session = session();
        let reply = session.execute(&associate("rmnet_data0")).unwrap();
        assert_eq!(reply, Reply::Status(KernelStatus::Ok));

        let (header, _) = &stub(&mut session).requests[0];
        assert_eq!(header.port_id, 4242);
        assert_eq!(header.sequence, 0);
    }

    #[test]
    fn sequence_numbers_strictly_increase() {
        let mut session = session();
        for _ in 0..5 {
            session.execute(&Request::GetVndName { id: 1 }).unwrap();
        }
        let sequences: Vec<u32> = stub(&mut session)
            .requests
            .iter()
            .map(|(header, _)| header.sequence)
            .collect();
        assert_eq!(sequences, vec![0, 1, 2, 3, 4]);
        assert_eq!(session.next_sequence(), 5);
    }

    #[test]
    fn sequence_wraps() {
        let config = SessionConfig {
            initial_sequence: u32::MAX,
            ..SessionConfig::default()
        };
        let mut session = Session::with_transport(StubKernel::default(), 1, &config).unwrap();
        session.execute(&Request::NewVnd { id: 0 }).unwrap();
        session.execute(&Request::NewVnd { id: 1 }).unwrap();
        assert_eq!(session.next_sequence(), 1);
    }

    #[test]
    fn kernel_refusal_is_data() {
        let mut session = session();
        let reply = session.execute(&Request::FreeVnd { id: 9 }).unwrap();
        assert_eq!(reply, Reply::Status(KernelStatus::NoSuchDevice));
    }

    #[test]
    fn mismatched_operation_code_is_rejected() {
        let mut session = session();
        stub(&mut session).tamper = Some(Tamper::MessageType(MessageType::FreeVnd.code()));

        let err = session.execute(&Request::NewVnd { id: 3 }).unwrap_err();
        assert!(matches!(
            err,
            RmnetError::MessageTypeMismatch {
                expected: MessageType::NewVnd,
                received: 13
            }
        ));
        assert_eq!(err.code(), ErrorCode::MessageType);
        assert_eq!(err.outcome(), Outcome::KernelError);
    }

    #[test]
    fn stale_sequence_is_rejected() {
        let mut session = session();
        session.execute(&Request::NewVnd { id: 1 }).unwrap();
        stub(&mut session).tamper = Some(Tamper::Sequence(u32::MAX));

        let err = session.execute(&Request::GetVndName { id: 1 }).unwrap_err();
        assert!(matches!(
            err,
            RmnetError::SequenceMismatch {
                expected: 1,
                received: 0
            }
        ));
        assert_eq!(err.code(), ErrorCode::MessageReceive);

        // The session stays usable and the counter kept moving.
        let reply = session.execute(&Request::GetVndName { id: 1 }).unwrap();
        assert!(matches!(reply, Reply::Data(ResponseData::VndName(_))));
        assert_eq!(stub(&mut session).requests[2].0.sequence, 2);
    }

    #[test]
    fn operation_code_is_checked_before_sequence() {
        let mut session = session();
        stub(&mut session).tamper = Some(Tamper::Raw({
            let mut bytes = vec![0u8; FRAME_LEN];
            bytes[..4].copy_from_slice(&(FRAME_LEN as u32).to_ne_bytes());
            bytes[8..12].copy_from_slice(&77u32.to_ne_bytes());
            bytes[18..20].copy_from_slice(&9u16.to_ne_bytes());
            bytes
        }));
        let err = session.execute(&Request::NewVnd { id: 1 }).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MessageType);
    }

    #[test]
    fn short_reply_is_receive_failure() {
        let mut session = session();
        stub(&mut session).tamper = Some(Tamper::Truncate(10));
        let err = session.execute(&Request::NewVnd { id: 1 }).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MessageReceive);
    }

    #[test]
    fn query_answered_with_ok_status_is_return_type_failure() {
        let mut session = session();
        stub(&mut session).tamper = Some(Tamper::Raw(status_frame(MessageType::GetVndName, 0)));
        let err = session.execute(&Request::GetVndName { id: 4 }).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ReturnType);
        assert_eq!(err.outcome(), Outcome::LibraryError);
    }

    #[test]
    fn send_failure_is_kernel_error() {
        let mut session = session();
        stub(&mut session).fail_send = true;
        let err = session.execute(&Request::NewVnd { id: 1 }).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MessageSend);
        assert_eq!(err.outcome(), Outcome::KernelError);
    }

    #[test]
    fn closed_session_does_no_io() {
        let mut session = session();
        session.close();
        let err = session.execute(&Request::NewVnd { id: 1 }).unwrap_err();
        assert!(matches!(err, RmnetError::HandleClosed));
        assert_eq!(err.code(), ErrorCode::HndlInvalid);
        assert_eq!(session.next_sequence(), 0);
    }

    #[test]
    fn exchange_over_datagram_socket() {
        use std::os::unix::net::UnixDatagram;

        let (local, remote) = UnixDatagram::pair().unwrap();
        let driver = std::thread::spawn(move || {
            let mut kernel = StubKernel::default();
            let mut buf = [0u8; FRAME_LEN];
            for _ in 0..2 {
                let len = remote.recv(&mut buf).unwrap();
                let reply = kernel.answer(&buf[..len]);
                remote.send(&reply).unwrap();
            }
            kernel.operations()
        });

        let config = SessionConfig {
            read_timeout: Some(std::time::Duration::from_secs(5)),
            ..SessionConfig::default()
        };
        let mut session = Session::with_transport(local, 99, &config).unwrap();
        let status = session
            .execute(&Request::NewVndWithPrefix {
                id: 5,
                prefix: DeviceName::new("wwan").unwrap(),
            })
            .unwrap();
        assert_eq!(status, Reply::Status(KernelStatus::Ok));
        let name = session.execute(&Request::GetVndName { id: 5 }).unwrap();
        assert_eq!(
            name,
            Reply::Data(ResponseData::VndName(DeviceName::new("wwan5").unwrap()))
        );

        assert_eq!(
            driver.join().unwrap(),
            vec![MessageType::NewVndWithPrefix, MessageType::GetVndName]
        );
    }

    fn status_frame(message_type: MessageType, sequence: u32) -> Vec<u8> {
        let mut buf = bytes::BytesMut::new();
        encode_response(
            &Response {
                sequence,
                message_type,
                reply: Reply::Status(KernelStatus::Ok),
            },
            0,
            &mut buf,
        );
        buf.to_vec()
    }
}
