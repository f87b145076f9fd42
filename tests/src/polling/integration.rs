use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use fleetpoll_common::config::{ExchangeMode, PollerConfig};
use fleetpoll_common::fleet::host::{HostCategory, HostDescriptor, PollRequest};
use fleetpoll_common::fleet::record::DeviceRecord;
use fleetpoll_common::fleet::template::{
    AuthProtocol, ConfigTemplate, PrivProtocol, SecurityLevel, SnmpVersion, TemplateId, TemplateTable,
};
use fleetpoll_core::Poller;
use fleetpoll_protocols::mib::MibView;
use fleetpoll_protocols::{
    Oid, SecurityProfile, SessionProfile, SnmpError, SnmpSession, UdpSession, Value, value,
};

use crate::agent::{self, Agent, Relay, Silent};

const V2C: TemplateId = 1;
const V1: TemplateId = 2;
const V3_NO_AUTH: TemplateId = 3;
const V3_SHA: TemplateId = 4;
const V3_PRIV: TemplateId = 5;
const V3_WRONG_PASS: TemplateId = 6;

fn templates() -> TemplateTable {
    let v3 = |level: SecurityLevel, passphrase: Option<&str>| ConfigTemplate {
        version: SnmpVersion::V3,
        community: "monitor".into(),
        sec_level: Some(level),
        auth_protocol: passphrase.map(|_| AuthProtocol::Sha1),
        auth_passphrase: passphrase.map(str::to_string),
        ..ConfigTemplate::default()
    };
    let private = ConfigTemplate {
        priv_protocol: Some(PrivProtocol::Aes),
        priv_passphrase: Some("pancakes".into()),
        ..v3(SecurityLevel::AuthPriv, Some("maplesyrup"))
    };

    let mut table: TemplateTable = TemplateTable::new();
    table.insert(V2C, ConfigTemplate { version: SnmpVersion::V2c, community: "public".into(), ..ConfigTemplate::default() });
    table.insert(V1, ConfigTemplate { version: SnmpVersion::V1, community: "public".into(), ..ConfigTemplate::default() });
    table.insert(V3_NO_AUTH, v3(SecurityLevel::NoAuthNoPriv, None));
    table.insert(V3_SHA, v3(SecurityLevel::AuthNoPriv, Some("maplesyrup")));
    table.insert(V3_PRIV, private);
    table.insert(V3_WRONG_PASS, v3(SecurityLevel::AuthNoPriv, Some("not the passphrase")));
    table
}

fn device(sys_object_id: &str, name: &str) -> MibView {
    let oid: Oid = value::parse_oid(sys_object_id).unwrap();
    MibView::new()
        .with("1.3.6.1.2.1.1.1.0", value::string("integration device"))
        .with("1.3.6.1.2.1.1.2.0", Value::ObjectIdentifier(oid))
        .with("1.3.6.1.2.1.1.3.0", Value::TimeTicks(4200))
        .with("1.3.6.1.2.1.1.5.0", value::string(name))
        .with("1.3.6.1.2.1.2.2.1.2.1", value::string("ether1"))
        .with("1.3.6.1.2.1.2.2.1.6.1", value::octets(&[0x4c, 0x5e, 0x0c, 0x11, 0x22, 0x33]))
        .with("1.3.6.1.2.1.2.2.1.8.1", Value::Integer(1))
        .with("1.3.6.1.2.1.4.20.1.2.192.0.2.1", Value::Integer(1))
        .with("1.3.6.1.2.1.4.20.1.3.192.0.2.1", Value::IpAddress([255, 255, 255, 252]))
        .with("1.3.6.1.2.1.4.22.1.2.1.192.0.2.2", value::octets(&[0x4c, 0x5e, 0x0c, 0x44, 0x55, 0x66]))
}

fn config(workers: usize) -> PollerConfig {
    PollerConfig {
        workers,
        timeout: Duration::from_millis(300),
        retries: 0,
        debug: true,
        exchange: ExchangeMode::InMemory,
    }
}

fn by_id(records: Vec<DeviceRecord>) -> BTreeMap<u64, DeviceRecord> {
    records.into_iter().map(|r| (r.id, r)).collect()
}

struct Fleet {
    mikrotik: Agent,
    edge: Agent,
    site: Agent,
}

impl Fleet {
    fn start() -> Self {
        Self {
            mikrotik: Agent::community(device("1.3.6.1.4.1.14988.1", "rb4011"), "public").unwrap(),
            edge: Agent::community(device("1.3.6.1.4.1.10002.1", "er-x"), "public").unwrap(),
            site: Agent::community(device("1.3.6.1.4.1.9.1.1", "tower-7"), "public").unwrap(),
        }
    }

    /// Ten hosts spread over the three agents.
    fn hosts(&self) -> Vec<HostDescriptor> {
        (1..=10)
            .map(|id| match id % 3 {
                0 => HostDescriptor::new(id, self.mikrotik.addr().to_string(), V2C),
                1 => HostDescriptor::new(id, self.edge.addr().to_string(), V1),
                _ => HostDescriptor::new(id, self.site.addr().to_string(), V2C)
                    .with_category(HostCategory::NetworkSite),
            })
            .collect()
    }
}

#[test]
fn ten_hosts_four_workers_yield_ten_records() {
    let fleet = Fleet::start();
    let records = by_id(Poller::new(config(4)).poll(&fleet.hosts(), &templates()));

    assert_eq!(records.len(), 10);
    assert_eq!(records[&3].mapper, "mikrotik");
    assert_eq!(records[&1].mapper, "ubiquiti-edge");
    assert_eq!(records[&2].mapper, "generic-site");

    let site: &DeviceRecord = &records[&2];
    assert_eq!(site.system.name.as_deref(), Some("tower-7"));
    assert_eq!(site.interfaces[0].ip_addresses, vec!["192.0.2.1/30".to_string()]);
    assert_eq!(site.interfaces[0].connected_l3_macs, vec!["4c:5e:0c:44:55:66".to_string()]);
    assert!(records[&3].interfaces[0].connected_l3_macs.is_empty());
}

#[test]
fn unreachable_hosts_are_dropped() {
    let fleet = Fleet::start();
    let silent: Silent = Silent::start().unwrap();
    let closed = agent::closed_port().unwrap();

    let mut hosts: Vec<HostDescriptor> = fleet.hosts().into_iter().take(8).collect();
    hosts.push(HostDescriptor::new(11, silent.addr().to_string(), V2C));
    hosts.push(HostDescriptor::new(12, closed.to_string(), V2C));

    let records = by_id(Poller::new(config(4)).poll(&hosts, &templates()));
    assert_eq!(records.len(), 8);
    assert!(!records.contains_key(&11));
    assert!(!records.contains_key(&12));
    assert_eq!(silent.requests(), 1);
}

/// One V2C template, every host answered by an agent no vendor mapper claims.
fn generic_fleet(agent: &Agent, count: u64) -> Vec<HostDescriptor> {
    (1..=count)
        .map(|id| HostDescriptor::new(id, agent.addr().to_string(), V2C))
        .collect()
}

#[test]
fn ten_generic_v2c_hosts_yield_ten_records() {
    let agent: Agent = Agent::community(device("1.3.6.1.4.1.9.1.1", "access-1"), "public").unwrap();
    let records = by_id(Poller::new(config(4)).poll(&generic_fleet(&agent, 10), &templates()));

    assert_eq!(records.len(), 10);
    for record in records.values() {
        assert_eq!(record.mapper, "generic");
        assert_eq!(record.system.name.as_deref(), Some("access-1"));
        assert_eq!(record.interfaces[0].ip_addresses, vec!["192.0.2.1/30".to_string()]);
        assert!(record.interfaces[0].connected_l3_macs.is_empty());
    }
}

#[test]
fn generic_v2c_fleet_with_two_unreachable_hosts_yields_eight_records() {
    let agent: Agent = Agent::community(device("1.3.6.1.4.1.9.1.1", "access-1"), "public").unwrap();
    let silent: Silent = Silent::start().unwrap();
    let closed = agent::closed_port().unwrap();

    let mut hosts: Vec<HostDescriptor> = generic_fleet(&agent, 8);
    hosts.push(HostDescriptor::new(9, silent.addr().to_string(), V2C));
    hosts.push(HostDescriptor::new(10, closed.to_string(), V2C));

    let records = by_id(Poller::new(config(4)).poll(&hosts, &templates()));
    assert_eq!(records.keys().copied().collect::<Vec<u64>>(), (1..=8).collect::<Vec<u64>>());
    assert!(records.values().all(|r| r.mapper == "generic"));
}

#[test]
fn repeated_polls_are_identical() {
    let fleet = Fleet::start();
    let poller = Poller::new(config(3));
    let first = by_id(poller.poll(&fleet.hosts(), &templates()));
    let second = by_id(poller.poll(&fleet.hosts(), &templates()));
    assert_eq!(first, second);
}

#[test]
fn v3_user_security_levels() {
    use async_snmp::{AuthProtocol as AgentAuth, PrivProtocol as AgentPriv};

    let plain: Agent = Agent::usm(device("1.3.6.1.4.1.14988.1", "v3-plain"), "monitor", None, None).unwrap();
    let signed: Agent = Agent::usm(
        device("1.3.6.1.4.1.17713.21", "v3-signed"),
        "monitor",
        Some((AgentAuth::Sha1, "maplesyrup")),
        None,
    )
    .unwrap();
    let private: Agent = Agent::usm(
        device("1.3.6.1.4.1.14988.1", "v3-priv"),
        "monitor",
        Some((AgentAuth::Sha1, "maplesyrup")),
        Some((AgentPriv::Aes128, "pancakes")),
    )
    .unwrap();

    let hosts: Vec<HostDescriptor> = vec![
        HostDescriptor::new(1, plain.addr().to_string(), V3_NO_AUTH),
        HostDescriptor::new(2, signed.addr().to_string(), V3_SHA),
        HostDescriptor::new(3, private.addr().to_string(), V3_PRIV),
        HostDescriptor::new(4, signed.addr().to_string(), V3_WRONG_PASS),
    ];
    let records = by_id(Poller::new(config(2)).poll(&hosts, &templates()));

    assert_eq!(records.keys().copied().collect::<Vec<u64>>(), vec![1, 2, 3]);
    assert_eq!(records[&1].system.name.as_deref(), Some("v3-plain"));
    assert_eq!(records[&2].mapper, "cambium-epmp");
    assert_eq!(records[&3].mapper, "mikrotik");
    assert_eq!(records[&3].system.name.as_deref(), Some("v3-priv"));
    assert!(private.requests() > 0);
}

#[test]
fn v3_query_that_stalls_after_discovery_stays_within_budget() {
    use async_snmp::AuthProtocol as AgentAuth;

    let agent: Agent = Agent::usm(
        device("1.3.6.1.4.1.14988.1", "stalled"),
        "monitor",
        Some((AgentAuth::Sha1, "maplesyrup")),
        None,
    )
    .unwrap();
    let relay: Relay = Relay::first_exchange_only(agent.addr()).unwrap();

    let profile = SessionProfile {
        address: relay.addr().to_string(),
        version: SnmpVersion::V3,
        community: "monitor".into(),
        security: Some(SecurityProfile {
            level: SecurityLevel::AuthNoPriv,
            auth_protocol: Some(AuthProtocol::Sha1),
            auth_passphrase: Some("maplesyrup".into()),
            ..SecurityProfile::default()
        }),
        timeout: Duration::from_millis(200),
        retries: 1,
    };
    let budget: Duration = profile.budget();
    let mut session = UdpSession::new(profile);

    let started: Instant = Instant::now();
    let err: SnmpError = session.get(&value::oid(&[1, 3, 6, 1, 2, 1, 1, 2, 0])).unwrap_err();
    let elapsed: Duration = started.elapsed();

    assert!(elapsed <= budget + Duration::from_millis(150), "{elapsed:?} over {budget:?}");
    assert!(matches!(err, SnmpError::NoResponse { .. }), "{err}");
    assert!(relay.received() >= 2, "the request after discovery never left the client");
    assert_eq!(agent.requests(), 0);
}

#[test]
fn work_file_round_trip_through_spool() {
    let fleet = Fleet::start();
    let spool = std::env::temp_dir().join(format!("fleetpoll-it-{}", std::process::id()));
    std::fs::create_dir_all(&spool).unwrap();

    let json: String = format!(
        r#"{{
            "hosts": [
                {{ "id": 1, "ip": "{m}", "template_id": 1 }},
                {{ "id": 2, "ip": "{e}", "template_id": 1, "snmp_overrides": {{ "snmp_version": 1 }} }},
                {{ "id": 3, "ip": "{s}", "template_id": 1, "type": "network_sites" }},
                {{ "id": 4, "ip": "{m}", "template_id": 1, "snmp_overrides": {{ "snmp_community": "wrong" }} }},
                {{ "id": 5, "ip": "{m}", "template_id": 99 }}
            ],
            "templates": {{ "1": {{ "snmp_version": 2, "snmp_community": "public" }} }}
        }}"#,
        m = fleet.mikrotik.addr(),
        e = fleet.edge.addr(),
        s = fleet.site.addr(),
    );
    let request: PollRequest = serde_json_from(&json);

    let poller = Poller::new(PollerConfig {
        exchange: ExchangeMode::Spool(spool.clone()),
        ..config(2)
    });
    let records = by_id(poller.poll_request(&request));

    assert_eq!(records.keys().copied().collect::<Vec<u64>>(), vec![1, 2, 3]);
    assert_eq!(records[&2].mapper, "ubiquiti-edge");
    assert_eq!(std::fs::read_dir(&spool).unwrap().count(), 0);
    std::fs::remove_dir_all(&spool).unwrap();
}

#[tokio::test]
async fn poll_runs_on_a_blocking_thread() {
    let fleet = Fleet::start();
    let hosts: Vec<HostDescriptor> = fleet.hosts();
    let poller = Poller::new(config(4));

    let task = tokio::task::spawn_blocking(move || poller.poll(&hosts, &templates()));
    let records: Vec<DeviceRecord> = tokio::time::timeout(Duration::from_secs(30), task)
        .await
        .expect("poll exceeded its deadline")
        .unwrap();
    assert_eq!(records.len(), 10);
}

fn serde_json_from(json: &str) -> PollRequest {
    serde_json::from_str(json).unwrap()
}
