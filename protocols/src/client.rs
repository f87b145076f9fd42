//! Blocking SNMP session on top of the async client.
//!
//! A [`UdpSession`] is cheap to build: the address is resolved, the runtime
//! started and the client connected on the first query, so building one never
//! touches the network and every failure surfaces at query time.

use std::error::Error as StdError;
use std::io;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::time::Duration;

use async_snmp::{Auth, Client, ErrorStatus, UdpClient, UsmBuilder};
use fleetpoll_common::PollError;
use fleetpoll_common::fleet::template::{AuthProtocol, PrivProtocol, SecurityLevel, SnmpVersion};
use thiserror::Error;
use tokio::runtime::{self, Runtime};
use tracing::{debug, trace};

use crate::value::{Oid, OidExt, ValueExt, VarBind};

pub const SNMP_PORT: u16 = 161;
const MIN_TIMEOUT: Duration = Duration::from_millis(1);
const MAX_WALK_ROWS: usize = 10_000;

#[derive(Debug, Error)]
pub enum SnmpError {
    #[error("cannot resolve address {0:?}")]
    BadAddress(String),
    #[error("cannot start session runtime: {0}")]
    Runtime(#[source] io::Error),
    #[error("no response after {attempts} attempt(s)")]
    NoResponse { attempts: u32, answered_before: bool },
    #[error("agent returned {0:?}")]
    Agent(ErrorStatus),
    #[error("transport failure: {0}")]
    Transport(#[source] async_snmp::Error),
    #[error("protocol failure: {0}")]
    Protocol(#[source] async_snmp::Error),
    #[error("{0}")]
    Unsupported(String),
}

impl From<SnmpError> for PollError {
    fn from(err: SnmpError) -> Self {
        match err {
            SnmpError::NoResponse {
                attempts,
                answered_before: true,
            } => PollError::Timeout { attempts },
            SnmpError::NoResponse { .. }
            | SnmpError::BadAddress(_)
            | SnmpError::Runtime(_)
            | SnmpError::Transport(_) => PollError::Unreachable(err.to_string()),
            SnmpError::Agent(_) | SnmpError::Protocol(_) => PollError::Malformed(err.to_string()),
            SnmpError::Unsupported(_) => PollError::Unsupported(err.to_string()),
        }
    }
}

/// A live, per-host protocol session.
///
/// Mappers only ever borrow a session, so none of them can keep it past the
/// host it was opened for.
pub trait SnmpSession {
    fn get(&mut self, oid: &Oid) -> Result<VarBind, SnmpError>;

    fn get_next(&mut self, oid: &Oid) -> Result<VarBind, SnmpError>;

    /// Collects every row under `root` with successive GETNEXT requests.
    fn walk(&mut self, root: &Oid) -> Result<Vec<VarBind>, SnmpError> {
        let mut rows: Vec<VarBind> = Vec::new();
        let mut cursor: Oid = root.clone();

        while rows.len() < MAX_WALK_ROWS {
            let next: VarBind = match self.get_next(&cursor) {
                Ok(vb) => vb,
                // v1 agents signal the end of the MIB this way.
                Err(SnmpError::Agent(ErrorStatus::NoSuchName)) => break,
                Err(e) => return Err(e),
            };
            if next.value.is_exception() || !next.oid.is_within(root) || next.oid <= cursor {
                break;
            }
            cursor = next.oid.clone();
            rows.push(next);
        }
        Ok(rows)
    }
}

/// Resolved v3 security settings of a session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SecurityProfile {
    pub level: SecurityLevel,
    pub auth_protocol: Option<AuthProtocol>,
    pub auth_passphrase: Option<String>,
    pub priv_protocol: Option<PrivProtocol>,
    pub priv_passphrase: Option<String>,
    pub context_name: Option<String>,
    /// Hex encoded. The discovered authoritative engine id is used when absent.
    pub context_engine_id: Option<String>,
}

/// Everything a session needs to talk to one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProfile {
    pub address: String,
    pub version: SnmpVersion,
    /// Community for v1/v2c, USM user name for v3.
    pub community: String,
    /// Only present for v3.
    pub security: Option<SecurityProfile>,
    pub timeout: Duration,
    pub retries: u32,
}

impl SessionProfile {
    pub fn attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Upper bound on one query, engine discovery and clock resync included.
    pub fn budget(&self) -> Duration {
        self.timeout.max(MIN_TIMEOUT) * self.attempts()
    }
}

#[derive(Debug, Clone, Copy)]
enum Request {
    Get,
    GetNext,
}

pub struct UdpSession {
    profile: SessionProfile,
    runtime: Option<Runtime>,
    client: Option<UdpClient>,
    answered: bool,
}

impl UdpSession {
    pub fn new(profile: SessionProfile) -> Self {
        Self {
            profile,
            runtime: None,
            client: None,
            answered: false,
        }
    }

    pub fn profile(&self) -> &SessionProfile {
        &self.profile
    }

    /// Runs one request under a single deadline of [`SessionProfile::budget`].
    fn request(&mut self, request: Request, oid: &Oid) -> Result<VarBind, SnmpError> {
        // Credentials are checked before anything touches the network.
        let pending: Pending = match self.client.take() {
            Some(client) => Pending::Connected(client),
            None => {
                let auth: Auth = credentials(&self.profile)?;
                Pending::Connect {
                    target: resolve(&self.profile.address)?,
                    auth,
                }
            }
        };

        if self.runtime.is_none() {
            let rt: Runtime = runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(SnmpError::Runtime)?;
            self.runtime = Some(rt);
        }
        let Some(rt) = self.runtime.as_ref() else {
            return Err(SnmpError::Runtime(io::Error::other("session runtime unavailable")));
        };

        let budget: Duration = self.profile.budget();
        let timeout: Duration = self.profile.timeout.max(MIN_TIMEOUT);
        let retries: u32 = self.profile.retries;

        let outcome = rt.block_on(tokio::time::timeout(budget, async move {
            let client: UdpClient = match pending {
                Pending::Connected(client) => client,
                Pending::Connect { target, auth } => {
                    debug!(%target, "connecting SNMP client");
                    Client::builder(target.to_string(), auth)
                        .timeout(timeout)
                        .retries(retries)
                        .connect()
                        .await?
                }
            };
            let reply: async_snmp::Result<VarBind> = match request {
                Request::Get => client.get(oid).await,
                Request::GetNext => client.get_next(oid).await,
            };
            Ok::<_, async_snmp::Error>((client, reply))
        }));

        match outcome {
            Err(_) => {
                debug!(address = %self.profile.address, ?budget, "query exceeded its budget");
                Err(self.no_response())
            }
            Ok(Err(e)) => Err(self.classify(e)),
            Ok(Ok((client, reply))) => {
                self.client = Some(client);
                let vb: VarBind = reply.map_err(|e| self.classify(e))?;
                trace!(address = %self.profile.address, oid = %vb.oid, "received varbind");
                self.answered = true;
                Ok(vb)
            }
        }
    }

    fn no_response(&self) -> SnmpError {
        SnmpError::NoResponse {
            attempts: self.profile.attempts(),
            answered_before: self.answered,
        }
    }

    fn classify(&mut self, err: async_snmp::Error) -> SnmpError {
        match err {
            async_snmp::Error::Timeout { .. } => self.no_response(),
            async_snmp::Error::Snmp { status, .. } => {
                self.answered = true;
                SnmpError::Agent(status)
            }
            other if caused_by_io(&other) => SnmpError::Transport(other),
            other => SnmpError::Protocol(other),
        }
    }
}

enum Pending {
    Connected(UdpClient),
    Connect { target: SocketAddr, auth: Auth },
}

impl SnmpSession for UdpSession {
    fn get(&mut self, oid: &Oid) -> Result<VarBind, SnmpError> {
        self.request(Request::Get, oid)
    }

    fn get_next(&mut self, oid: &Oid) -> Result<VarBind, SnmpError> {
        self.request(Request::GetNext, oid)
    }
}

fn caused_by_io(err: &(dyn StdError + 'static)) -> bool {
    let mut cause: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = cause {
        if e.is::<io::Error>() {
            return true;
        }
        cause = e.source();
    }
    false
}

/// Client credentials for the profile's version and security level.
fn credentials(profile: &SessionProfile) -> Result<Auth, SnmpError> {
    match profile.version {
        SnmpVersion::V1 => Ok(Auth::v1(profile.community.clone())),
        SnmpVersion::V2c => Ok(Auth::v2c(profile.community.clone())),
        SnmpVersion::V3 => usm(profile).map(Into::into),
    }
}

fn usm(profile: &SessionProfile) -> Result<UsmBuilder, SnmpError> {
    let security: SecurityProfile = profile.security.clone().unwrap_or_default();
    let mut user: UsmBuilder = Auth::usm(profile.community.clone());

    if security.level.authenticated() {
        let protocol: AuthProtocol = security
            .auth_protocol
            .ok_or_else(|| SnmpError::Unsupported("authentication protocol missing".into()))?;
        let passphrase: String = required(security.auth_passphrase, "authentication passphrase")?;
        user = user.auth(auth_protocol(protocol), passphrase);
    }
    if security.level.private() {
        let protocol: PrivProtocol = security
            .priv_protocol
            .ok_or_else(|| SnmpError::Unsupported("privacy protocol missing".into()))?;
        let passphrase: String = required(security.priv_passphrase, "privacy passphrase")?;
        user = user.privacy(priv_protocol(protocol), passphrase);
    }

    let custom_context: bool = security.context_name.as_deref().is_some_and(|c| !c.is_empty())
        || security.context_engine_id.as_deref().is_some_and(|c| !c.trim().is_empty());
    if custom_context {
        debug!(address = %profile.address, "requests go to the agent's default context");
    }
    Ok(user)
}

fn required(value: Option<String>, what: &str) -> Result<String, SnmpError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| SnmpError::Unsupported(format!("{what} missing")))
}

fn auth_protocol(protocol: AuthProtocol) -> async_snmp::AuthProtocol {
    match protocol {
        AuthProtocol::Md5 => async_snmp::AuthProtocol::Md5,
        AuthProtocol::Sha1 => async_snmp::AuthProtocol::Sha1,
        AuthProtocol::Sha224 => async_snmp::AuthProtocol::Sha224,
        AuthProtocol::Sha256 => async_snmp::AuthProtocol::Sha256,
        AuthProtocol::Sha384 => async_snmp::AuthProtocol::Sha384,
        AuthProtocol::Sha512 => async_snmp::AuthProtocol::Sha512,
    }
}

/// `AES` is AES-128 in CFB mode, as net-snmp names it.
fn priv_protocol(protocol: PrivProtocol) -> async_snmp::PrivProtocol {
    match protocol {
        PrivProtocol::Des => async_snmp::PrivProtocol::Des,
        PrivProtocol::Aes => async_snmp::PrivProtocol::Aes128,
    }
}

/// Accepts `a.b.c.d`, `a.b.c.d:port`, `[v6]:port`, bare IPv6 and DNS names.
pub fn resolve(address: &str) -> Result<SocketAddr, SnmpError> {
    let address: &str = address.trim();
    if let Ok(addr) = address.parse::<SocketAddr>() {
        return Ok(addr);
    }
    if let Ok(ip) = address.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, SNMP_PORT));
    }

    let with_port: String = if address.contains(':') {
        address.to_string()
    } else {
        format!("{address}:{SNMP_PORT}")
    };
    with_port
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .ok_or_else(|| SnmpError::BadAddress(address.to_string()))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
