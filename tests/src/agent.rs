//! Loopback SNMP agents for the integration tests.
//!
//! [`Agent`] serves a [`MibView`] through the `async-snmp` agent on its own
//! thread and runtime, answering v1, v2c and v3 with or without privacy.
//! [`Silent`] and [`Relay`] are plain sockets that swallow traffic.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use async_snmp::Agent as SnmpAgent;
use async_snmp::{
    AgentBuilder, AuthProtocol, BoxFuture, GetNextResult, GetResult, MibHandler, PrivProtocol, RequestContext,
};
use fleetpoll_protocols::mib::MibView;
use fleetpoll_protocols::{Oid, VarBind, value};
use tokio::runtime;
use tokio::sync::oneshot;
use tracing::{debug, trace};

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const UPSTREAM_WAIT: Duration = Duration::from_secs(2);

/// Answers GET and GETNEXT from a [`MibView`], counting what it serves.
struct ViewHandler {
    view: MibView,
    requests: Arc<AtomicUsize>,
}

impl MibHandler for ViewHandler {
    fn get<'a>(&'a self, _ctx: &'a RequestContext, oid: &'a Oid) -> BoxFuture<'a, GetResult> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let result: GetResult = match self.view.get(oid) {
            Some(value) => GetResult::Value(value.clone()),
            None => GetResult::NoSuchObject,
        };
        Box::pin(async move { result })
    }

    fn get_next<'a>(&'a self, _ctx: &'a RequestContext, oid: &'a Oid) -> BoxFuture<'a, GetNextResult> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let result: GetNextResult = match self.view.next_after(oid) {
            Some((next, value)) => GetNextResult::Value(VarBind::new(next.clone(), value.clone())),
            None => GetNextResult::EndOfMibView,
        };
        Box::pin(async move { result })
    }
}

pub struct Agent {
    addr: SocketAddr,
    requests: Arc<AtomicUsize>,
    stop: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Agent {
    pub fn community(view: MibView, community: &str) -> io::Result<Self> {
        let community: String = community.to_string();
        Self::spawn(view, move |builder| builder.community(community.as_bytes()))
    }

    /// A v3 agent with one user. Privacy requires authentication.
    pub fn usm(
        view: MibView,
        user: &str,
        auth: Option<(AuthProtocol, &str)>,
        privacy: Option<(PrivProtocol, &str)>,
    ) -> io::Result<Self> {
        let user: String = user.to_string();
        let auth: Option<(AuthProtocol, String)> = auth.map(|(p, pass)| (p, pass.to_string()));
        let privacy: Option<(PrivProtocol, String)> = privacy.map(|(p, pass)| (p, pass.to_string()));

        Self::spawn(view, move |builder| {
            builder.usm_user(user, move |mut u| {
                if let Some((protocol, passphrase)) = &auth {
                    u = u.auth(*protocol, passphrase.as_bytes());
                }
                if let Some((protocol, passphrase)) = &privacy {
                    u = u.privacy(*protocol, passphrase.as_bytes());
                }
                u
            })
        })
    }

    fn spawn<F>(view: MibView, configure: F) -> io::Result<Self>
    where
        F: FnOnce(AgentBuilder) -> AgentBuilder + Send + 'static,
    {
        let addr: SocketAddr = free_port()?;
        let requests: Arc<AtomicUsize> = Arc::new(AtomicUsize::new(0));
        let handler = ViewHandler {
            view,
            requests: Arc::clone(&requests),
        };
        let (ready_tx, ready_rx) = mpsc::channel::<io::Result<()>>();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let handle: JoinHandle<()> = thread::Builder::new().name(format!("agent-{}", addr.port())).spawn(move || {
            let rt = match runtime::Builder::new_current_thread().enable_all().build() {
                Ok(rt) => rt,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            rt.block_on(async move {
                let bind: String = addr.to_string();
                let built = configure(SnmpAgent::builder().bind(&bind))
                    .handler(value::oid(&[1]), Arc::new(handler))
                    .build()
                    .await;
                let agent = match built {
                    Ok(agent) => agent,
                    Err(e) => {
                        let _ = ready_tx.send(Err(io::Error::other(e.to_string())));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));
                tokio::select! {
                    _ = stop_rx => {}
                    result = agent.run() => {
                        if let Err(e) = result {
                            debug!(%addr, error = %e, "agent stopped");
                        }
                    }
                }
            });
        })?;

        ready_rx.recv().map_err(io::Error::other)??;
        debug!(%addr, "agent listening");
        Ok(Self {
            addr,
            requests,
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Object lookups served so far.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Drop for Agent {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// An address nothing listens on. The kernel refuses datagrams sent to it.
pub fn closed_port() -> io::Result<SocketAddr> {
    free_port()
}

fn free_port() -> io::Result<SocketAddr> {
    let socket: UdpSocket = UdpSocket::bind("127.0.0.1:0")?;
    socket.local_addr()
}

/// A socket loop on its own thread, stopped on drop.
struct Listener {
    addr: SocketAddr,
    received: Arc<AtomicUsize>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Listener {
    fn spawn<F>(name: &str, mut on_datagram: F) -> io::Result<Self>
    where
        F: FnMut(&UdpSocket, &[u8], SocketAddr, usize) + Send + 'static,
    {
        let socket: UdpSocket = UdpSocket::bind("127.0.0.1:0")?;
        socket.set_read_timeout(Some(POLL_INTERVAL))?;
        let addr: SocketAddr = socket.local_addr()?;
        let received: Arc<AtomicUsize> = Arc::new(AtomicUsize::new(0));
        let stop: Arc<AtomicBool> = Arc::new(AtomicBool::new(false));

        let handle: JoinHandle<()> = thread::Builder::new().name(format!("{name}-{}", addr.port())).spawn({
            let received = Arc::clone(&received);
            let stop = Arc::clone(&stop);
            move || {
                let mut buf: Vec<u8> = vec![0u8; 65_535];
                while !stop.load(Ordering::SeqCst) {
                    let (n, peer) = match socket.recv_from(&mut buf) {
                        Ok(got) => got,
                        // Read timeouts only give the loop a chance to see `stop`.
                        Err(_) => continue,
                    };
                    let seen: usize = received.fetch_add(1, Ordering::SeqCst) + 1;
                    on_datagram(&socket, &buf[..n], peer, seen);
                }
            }
        })?;

        Ok(Self {
            addr,
            received,
            stop,
            handle: Some(handle),
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Receives and counts everything, answers nothing.
pub struct Silent(Listener);

impl Silent {
    pub fn start() -> io::Result<Self> {
        Listener::spawn("silent", |_, _, _, _| {}).map(Self)
    }

    pub fn addr(&self) -> SocketAddr {
        self.0.addr
    }

    pub fn requests(&self) -> usize {
        self.0.received.load(Ordering::SeqCst)
    }
}

/// Passes the first datagram to `upstream` and relays its answer, then goes
/// silent. In front of a v3 agent this completes engine discovery only.
pub struct Relay(Listener);

impl Relay {
    pub fn first_exchange_only(upstream: SocketAddr) -> io::Result<Self> {
        let outbound: UdpSocket = UdpSocket::bind("127.0.0.1:0")?;
        outbound.set_read_timeout(Some(UPSTREAM_WAIT))?;

        Listener::spawn("relay", move |socket, datagram, peer, seen| {
            if seen > 1 {
                trace!(%peer, seen, "relay dropping datagram");
                return;
            }
            let mut buf: Vec<u8> = vec![0u8; 65_535];
            let answered = outbound
                .send_to(datagram, upstream)
                .and_then(|_| outbound.recv_from(&mut buf));
            match answered {
                Ok((n, _)) => {
                    let _ = socket.send_to(&buf[..n], peer);
                }
                Err(e) => debug!(%upstream, error = %e, "upstream did not answer"),
            }
        })
        .map(Self)
    }

    pub fn addr(&self) -> SocketAddr {
        self.0.addr
    }

    pub fn received(&self) -> usize {
        self.0.received.load(Ordering::SeqCst)
    }
}
