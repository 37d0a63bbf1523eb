//! MAVLink parameter link over UDP
//!
//! Implements [`ParamTransport`] with the MAVLink parameter microservice:
//!
//! | Transport call  | Message sent          |
//! |-----------------|-----------------------|
//! | `request_all`   | PARAM_REQUEST_LIST    |
//! | `request_one`   | PARAM_REQUEST_READ    |
//! | `set_one`       | PARAM_SET             |
//!
//! A receiver thread decodes every PARAM_VALUE from the target system and
//! hands it to the registered sink. When no target address is configured the
//! first datagram received selects the device.

use std::io::{self, Cursor};
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use mavlink::common::{
    MavMessage, PARAM_REQUEST_LIST_DATA, PARAM_REQUEST_READ_DATA, PARAM_SET_DATA,
};
use mavlink::peek_reader::PeekReader;
use mavlink::MavHeader;
use param_sync_core::parameters::ParamValue;

use super::codec::{decode_param_id, decode_value, encode_param_id, encode_value};
use crate::communication::transport::{ParamSink, ParamTransport};
use crate::config::LinkConfig;
use crate::error::TransportError;
use crate::{log_debug, log_info, log_warn};

/// How often the receiver checks for shutdown
const RECV_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Largest MAVLink v2 frame
const MAX_FRAME_LEN: usize = 280;

/// State shared with the receiver thread
struct Shared {
    target_addr: Mutex<Option<SocketAddr>>,
    sink: Mutex<Option<Weak<dyn ParamSink>>>,
    running: AtomicBool,
}

impl Shared {
    fn target(&self) -> MutexGuard<'_, Option<SocketAddr>> {
        self.target_addr.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sink(&self) -> Option<Arc<dyn ParamSink>> {
        self.sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(Weak::upgrade)
    }
}

/// MAVLink UDP connection to one device
pub struct MavlinkParamLink {
    socket: UdpSocket,
    config: LinkConfig,
    sequence: AtomicU8,
    shared: Arc<Shared>,
    receiver: Mutex<Option<JoinHandle<()>>>,
}

impl MavlinkParamLink {
    /// Bind the local socket and start the receiver thread.
    pub fn bind(config: LinkConfig) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(config.bind_addr)?;
        let recv_socket = socket.try_clone()?;
        recv_socket.set_read_timeout(Some(RECV_POLL_INTERVAL))?;

        let shared = Arc::new(Shared {
            target_addr: Mutex::new(config.target_addr),
            sink: Mutex::new(None),
            running: AtomicBool::new(true),
        });

        let receiver = {
            let shared = shared.clone();
            let target_system = config.target_system;
            thread::Builder::new()
                .name("mavlink-param-rx".to_string())
                .spawn(move || receive_loop(recv_socket, shared, target_system))?
        };

        log_info!("MAVLink param link bound to {}", socket.local_addr()?);
        Ok(Self {
            socket,
            config,
            sequence: AtomicU8::new(0),
            shared,
            receiver: Mutex::new(Some(receiver)),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Whether a device address is known.
    pub fn is_connected(&self) -> bool {
        self.shared.target().is_some()
    }

    /// Stop the receiver thread and wait for it to exit.
    ///
    /// When called from the receiver thread itself (the last owner was
    /// released while delivering a reply) the thread is only signalled.
    pub fn shutdown(&self) {
        self.shared.running.store(false, Ordering::Relaxed);
        let handle = self
            .receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }

    /// Send a MAVLink v2 message to the device.
    fn send(&self, msg: &MavMessage) -> Result<(), TransportError> {
        let addr = (*self.shared.target()).ok_or(TransportError::NotConnected)?;

        let header = MavHeader {
            system_id: self.config.system_id,
            component_id: self.config.component_id,
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
        };

        let mut buf = Cursor::new(Vec::with_capacity(MAX_FRAME_LEN));
        mavlink::write_v2_msg(&mut buf, header, msg)
            .map_err(|e| TransportError::ProtocolError(format!("{e:?}")))?;

        self.socket.send_to(&buf.into_inner(), addr)?;
        Ok(())
    }
}

impl ParamTransport for MavlinkParamLink {
    fn register_model(&self, sink: Weak<dyn ParamSink>) {
        *self
            .shared
            .sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(sink);
    }

    fn request_all(&self) -> Result<(), TransportError> {
        self.send(&MavMessage::PARAM_REQUEST_LIST(PARAM_REQUEST_LIST_DATA {
            target_system: self.config.target_system,
            target_component: self.config.target_component,
        }))
    }

    fn request_one(&self, index: u16) -> Result<(), TransportError> {
        let param_index = i16::try_from(index).map_err(|_| {
            TransportError::ProtocolError(format!("parameter index {index} out of range"))
        })?;

        self.send(&MavMessage::PARAM_REQUEST_READ(PARAM_REQUEST_READ_DATA {
            param_index,
            target_system: self.config.target_system,
            target_component: self.config.target_component,
            param_id: [0; 16],
        }))
    }

    fn set_one(&self, id: &str, value: &ParamValue) -> Result<(), TransportError> {
        let param_id = encode_param_id(id)?;
        let (param_value, param_type) = encode_value(id, value)?;

        self.send(&MavMessage::PARAM_SET(PARAM_SET_DATA {
            param_value,
            target_system: self.config.target_system,
            target_component: self.config.target_component,
            param_id,
            param_type,
        }))
    }
}

impl Drop for MavlinkParamLink {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn receive_loop(socket: UdpSocket, shared: Arc<Shared>, target_system: u8) {
    let mut buf = vec![0u8; 2048];

    while shared.running.load(Ordering::Relaxed) {
        let (len, addr) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(ref e)
                if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut =>
            {
                continue
            }
            Err(e) => {
                log_warn!("MAVLink receive failed: {}", e);
                thread::sleep(RECV_POLL_INTERVAL);
                continue;
            }
        };

        {
            let mut target = shared.target();
            if target.is_none() {
                log_info!("MAVLink device discovered at {}", addr);
                *target = Some(addr);
            }
        }

        for (header, msg) in parse_datagram(&buf[..len]) {
            let MavMessage::PARAM_VALUE(data) = msg else {
                continue;
            };
            if header.system_id != target_system {
                continue;
            }

            let id = decode_param_id(&data.param_id);
            let value = decode_value(data.param_value, data.param_type);
            log_debug!("PARAM_VALUE {} #{}/{}: {}", id, data.param_index, data.param_count, value);

            match shared.sink() {
                Some(sink) => sink.update_param(&id, data.param_index, data.param_count, value),
                None => log_debug!("No sink registered, dropping {}", id),
            }
        }
    }
}

/// Decode every MAVLink v2 frame in one datagram
fn parse_datagram(data: &[u8]) -> Vec<(MavHeader, MavMessage)> {
    let mut reader = PeekReader::new(Cursor::new(data));
    let mut messages = Vec::new();
    while let Ok(msg) = mavlink::read_v2_msg::<MavMessage, _>(&mut reader) {
        messages.push(msg);
    }
    messages
}
