use super::clusters::{BooleanStateHandler, PowerSourceHandler, boolean_state};
use super::device_types::{DEV_TYPE_POWER_SOURCE, DEV_TYPE_WATER_LEAK_DETECTOR};
use super::netif::{FilteredNetifs, detect_interface, interface_addresses, interface_index};
use super::sensors::helpers::notifier::ChangeSignal;
use super::sensors::{ClusterNotifier, LeakAccessory, NotifiableSensor};
use crate::config::AccessoryConfig;
use crate::error::MonitorError;
use embassy_futures::select::{select, select4};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::signal::Signal;
use log::{debug, error, info};
use rs_matter::dm::IMBuffer;
use rs_matter::dm::clusters::desc::{self, ClusterHandler as _};
use rs_matter::dm::devices::test::{TEST_DEV_ATT, TEST_DEV_COMM, TEST_DEV_DET};
use rs_matter::dm::endpoints;
use rs_matter::dm::subscriptions::DefaultSubscriptions;
use rs_matter::dm::{
    Async, AsyncHandler, AsyncMetadata, DataModel, Dataver, EmptyHandler, Endpoint, EpClMatcher,
    Node,
};
use rs_matter::error::Error;
use rs_matter::pairing::DiscoveryCapabilities;
use rs_matter::pairing::qr::QrTextType;
use rs_matter::persist::{NO_NETWORKS, Psm};
use rs_matter::respond::DefaultResponder;
use rs_matter::transport::network::mdns::builtin::{BuiltinMdnsResponder, Host};
use rs_matter::transport::network::mdns::{
    MDNS_IPV4_BROADCAST_ADDR, MDNS_IPV6_BROADCAST_ADDR, MDNS_SOCKET_DEFAULT_BIND_ADDR,
};
use rs_matter::utils::init::InitMaybeUninit;
use rs_matter::utils::select::Coalesce;
use rs_matter::utils::storage::pooled::PooledBuffers;
use rs_matter::{Matter, clusters, devices};
use socket2::{Domain, Protocol, Socket, Type};
use static_cell::StaticCell;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::path::PathBuf;
use std::pin::pin;
use std::sync::{Arc, OnceLock};
use tokio::sync::oneshot;

/// Static cells for Matter resources (required for 'static lifetime)
static MATTER: StaticCell<Matter> = StaticCell::new();
static BUFFERS: StaticCell<PooledBuffers<10, NoopRawMutex, IMBuffer>> = StaticCell::new();
static SUBSCRIPTIONS: StaticCell<DefaultSubscriptions> = StaticCell::new();
static PSM: StaticCell<Psm<4096>> = StaticCell::new();

/// Static hostname storage for mDNS (needs 'static lifetime for Host struct)
static HOSTNAME: OnceLock<String> = OnceLock::new();
/// Selected interface name (FilteredNetifs needs 'static)
static INTERFACE: OnceLock<String> = OnceLock::new();
static NETIFS: OnceLock<FilteredNetifs> = OnceLock::new();

/// Raised by the leak accessory whenever the leak state changes
static LEAK_CHANGED: ChangeSignal = Signal::new();

/// Endpoint carrying the leak detector clusters
pub const LEAK_ENDPOINT_ID: u16 = 1;

/// Directory for persistence data
const PERSIST_DIR: &str = ".config/water-level-monitor";
const PERSIST_FILE: &str = "matter.bin";

/// Commissioning window length after first start
const COMM_WINDOW_TIMEOUT_SECS: u16 = 900;

/// Get the persistence file path
fn get_persist_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(PERSIST_DIR)
        .join(PERSIST_FILE)
}

/// Node definition for the leak sensor accessory
const NODE: Node<'static> = Node {
    id: 0,
    endpoints: &[
        // Endpoint 0: Root endpoint with standard Matter system clusters
        endpoints::root_endpoint(rs_matter::dm::clusters::net_comm::NetworkType::Ethernet),
        // Endpoint 1: Water leak detector with battery information
        Endpoint {
            id: LEAK_ENDPOINT_ID,
            device_types: devices!(DEV_TYPE_WATER_LEAK_DETECTOR, DEV_TYPE_POWER_SOURCE),
            clusters: clusters!(
                desc::DescHandler::CLUSTER,
                BooleanStateHandler::CLUSTER,
                PowerSourceHandler::CLUSTER
            ),
        },
    ],
};

/// Bound accessory transport, created on the main thread so that a missing
/// network or an occupied port fails startup before the stack thread runs.
pub struct MatterTransport {
    socket: async_io::Async<UdpSocket>,
    mdns_socket: async_io::Async<UdpSocket>,
    interface_name: &'static str,
    interface_index: u32,
    ipv4: Ipv4Addr,
    ipv6: Ipv6Addr,
    port: u16,
}

fn unavailable(what: &str, e: impl std::fmt::Display) -> MonitorError {
    MonitorError::TransportUnavailable(format!("{}: {}", what, e))
}

/// mDNS socket on port 5353, joined to both multicast groups on the interface.
fn bind_mdns(
    interface_index: u32,
    ipv4: Ipv4Addr,
) -> crate::error::Result<async_io::Async<UdpSocket>> {
    let raw_socket = Socket::new(Domain::IPV6, Type::DGRAM, Some(Protocol::UDP))
        .map_err(|e| unavailable("failed to create mDNS socket", e))?;
    raw_socket
        .set_reuse_address(true)
        .map_err(|e| unavailable("failed to set SO_REUSEADDR on mDNS socket", e))?;
    raw_socket
        .set_only_v6(false)
        .map_err(|e| unavailable("failed to set IPV6_V6ONLY=false on mDNS socket", e))?;
    raw_socket
        .set_nonblocking(true)
        .map_err(|e| unavailable("failed to set non-blocking on mDNS socket", e))?;
    raw_socket
        .bind(&MDNS_SOCKET_DEFAULT_BIND_ADDR.into())
        .map_err(|e| unavailable("failed to bind mDNS socket", e))?;

    let socket = async_io::Async::<UdpSocket>::new_nonblocking(raw_socket.into())
        .map_err(|e| unavailable("failed to create async mDNS socket", e))?;
    socket
        .get_ref()
        .join_multicast_v6(&MDNS_IPV6_BROADCAST_ADDR, interface_index)
        .map_err(|e| unavailable("failed to join IPv6 mDNS multicast group", e))?;
    socket
        .get_ref()
        .join_multicast_v4(&MDNS_IPV4_BROADCAST_ADDR, &ipv4)
        .map_err(|e| unavailable("failed to join IPv4 mDNS multicast group", e))?;

    info!("mDNS socket bound to {:?}", MDNS_SOCKET_DEFAULT_BIND_ADDR);
    Ok(socket)
}

impl MatterTransport {
    /// Select the interface and bind the UDP socket on the pairing port.
    ///
    /// The socket is bound to the IPv6 address that is later advertised via
    /// mDNS so that responses leave from the address controllers talk to.
    pub fn bind(config: &AccessoryConfig) -> crate::error::Result<Self> {
        let name = match &config.interface {
            Some(name) => name.clone(),
            None => detect_interface().ok_or_else(|| {
                MonitorError::TransportUnavailable("no usable network interface".into())
            })?,
        };
        let interface_name = INTERFACE.get_or_init(|| name).as_str();
        let interface_index = interface_index(interface_name)?;

        let addresses = interface_addresses(interface_name)?.ok_or_else(|| {
            MonitorError::TransportUnavailable(format!(
                "interface '{}' not found",
                interface_name
            ))
        })?;

        let Some(ipv4) = addresses.ipv4.first().copied() else {
            return Err(MonitorError::TransportUnavailable(format!(
                "no IPv4 address on interface '{}'",
                interface_name
            )));
        };

        let ipv6 = addresses.ipv6.first().copied().unwrap_or_else(|| {
            info!(
                "No global IPv6 address on '{}', using unspecified",
                interface_name
            );
            Ipv6Addr::UNSPECIFIED
        });

        let raw_socket = Socket::new(Domain::IPV6, Type::DGRAM, Some(Protocol::UDP))
            .map_err(|e| unavailable("failed to create UDP socket", e))?;
        raw_socket
            .set_reuse_address(true)
            .map_err(|e| unavailable("failed to set SO_REUSEADDR", e))?;
        raw_socket
            .set_only_v6(false)
            .map_err(|e| unavailable("failed to set IPV6_V6ONLY=false", e))?;
        raw_socket
            .set_nonblocking(true)
            .map_err(|e| unavailable("failed to set non-blocking", e))?;

        let bind_addr = SocketAddr::new(IpAddr::V6(ipv6), config.port);
        raw_socket
            .bind(&bind_addr.into())
            .map_err(|e| unavailable(&format!("failed to bind {}", bind_addr), e))?;
        let socket = async_io::Async::<UdpSocket>::new(raw_socket.into())
            .map_err(|e| unavailable("failed to create async socket", e))?;

        info!(
            "Accessory transport bound to {} on '{}' (index {}, IPv4 {})",
            bind_addr, interface_name, interface_index, ipv4
        );

        let mdns_socket = bind_mdns(interface_index, ipv4)?;

        Ok(Self {
            socket,
            mdns_socket,
            interface_name,
            interface_index,
            ipv4,
            ipv6,
            port: config.port,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn interface_name(&self) -> &'static str {
        self.interface_name
    }
}

/// Build the data model handler with the leak detector clusters
fn dm_handler<'a>(
    matter: &'a Matter<'a>,
    netifs: &'a FilteredNetifs,
    boolean_handler: &'a BooleanStateHandler,
    power_handler: &'a PowerSourceHandler,
) -> impl AsyncMetadata + AsyncHandler + 'a {
    (
        NODE,
        endpoints::with_eth(
            &(),
            netifs,
            matter.rand(),
            endpoints::with_sys(
                &false,
                matter.rand(),
                EmptyHandler
                    // Endpoint 1: Descriptor
                    .chain(
                        EpClMatcher::new(
                            Some(LEAK_ENDPOINT_ID),
                            Some(desc::DescHandler::CLUSTER.id),
                        ),
                        Async(desc::DescHandler::new(Dataver::new_rand(matter.rand())).adapt()),
                    )
                    // Endpoint 1: BooleanState (leak detected)
                    .chain(
                        EpClMatcher::new(
                            Some(LEAK_ENDPOINT_ID),
                            Some(BooleanStateHandler::CLUSTER.id),
                        ),
                        Async(boolean_handler),
                    )
                    // Endpoint 1: PowerSource (battery)
                    .chain(
                        EpClMatcher::new(
                            Some(LEAK_ENDPOINT_ID),
                            Some(PowerSourceHandler::CLUSTER.id),
                        ),
                        Async(power_handler),
                    ),
            ),
        ),
    )
}

/// Wait until [`run_matter_stack`] reports it is serving.
///
/// A stack that failed during initialisation drops its sender, which turns
/// into [`MonitorError::TransportUnavailable`].
pub async fn stack_ready(ready: oneshot::Receiver<()>) -> crate::error::Result<()> {
    ready.await.map_err(|_| {
        MonitorError::TransportUnavailable("Matter stack failed to initialise".into())
    })
}

/// Move the BooleanState dataver as soon as the leak state changes, so the
/// next subscription report carries the new value.
async fn forward_leak_changes(handler: &BooleanStateHandler) -> Result<(), Error> {
    loop {
        LEAK_CHANGED.wait().await;
        if handler.refresh() {
            debug!("Leak state changed, dataver now {}", handler.dataver());
        }
    }
}

/// Run the Matter stack exposing the leak sensor accessory.
///
/// Handles mDNS discovery, commissioning (pairing) with controllers and the
/// Matter protocol itself. The accessory is marked online while the stack
/// runs; if the stack stops, further leak writes are rejected so the monitor
/// keeps them pending.
///
/// `ready` is completed once initialisation succeeded and the stack starts
/// serving; on an init error it is dropped instead (see [`stack_ready`]).
///
/// Note: Uses test device credentials (discriminator 3840, passcode 20202021).
pub async fn run_matter_stack(
    transport: MatterTransport,
    accessory: Arc<LeakAccessory>,
    ready: oneshot::Sender<()>,
) -> Result<(), Error> {
    info!("Initializing Matter stack...");

    let matter = MATTER.uninit().init_with(Matter::init(
        &TEST_DEV_DET,
        TEST_DEV_COMM,
        &TEST_DEV_ATT,
        rs_matter::utils::epoch::sys_epoch,
        rs_matter::utils::rand::sys_rand,
        transport.port,
    ));

    matter.initialize_transport_buffers()?;

    // Initialize Psm (Persistent State Manager) and load existing pairings
    let persist_path = get_persist_path();
    if let Some(parent) = persist_path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        error!("Failed to create persistence directory {:?}: {}", parent, e);
    }

    let psm = PSM.uninit().init_with(Psm::init());
    if let Err(e) = psm.load(&persist_path, matter, NO_NETWORKS) {
        error!(
            "Failed to load persisted state from {:?}: {:?}",
            persist_path, e
        );
    }

    if matter.is_commissioned() {
        info!("Device already commissioned, skipping commissioning window");
        info!("  (Delete {:?} to reset commissioning)", persist_path);
    } else {
        info!(
            "Opening commissioning window for {} seconds...",
            COMM_WINDOW_TIMEOUT_SECS
        );
        matter.open_basic_comm_window(COMM_WINDOW_TIMEOUT_SECS)?;

        info!("Add the accessory in your Home app using the code below");
        info!("  Discriminator: {}", TEST_DEV_COMM.discriminator);
        info!("  Passcode: {}", TEST_DEV_COMM.password);

        if let Err(e) = matter.print_standard_qr_text(DiscoveryCapabilities::IP) {
            error!("Failed to print QR text: {:?}", e);
        }

        if let Err(e) =
            matter.print_standard_qr_code(QrTextType::Unicode, DiscoveryCapabilities::IP)
        {
            error!("Failed to print QR code: {:?}", e);
        }
    }

    let buffers = BUFFERS.uninit().init_with(PooledBuffers::init(0));
    let subscriptions = SUBSCRIPTIONS
        .uninit()
        .init_with(DefaultSubscriptions::init());

    // Handlers need randomized Dataver seeds for subscription change tracking
    let boolean_handler =
        BooleanStateHandler::new(Dataver::new_rand(matter.rand()), accessory.clone());
    let power_handler =
        PowerSourceHandler::new(Dataver::new_rand(matter.rand()), accessory.battery());

    accessory.set_notifier(ClusterNotifier::new(
        &LEAK_CHANGED,
        LEAK_ENDPOINT_ID,
        boolean_state::CLUSTER_ID,
    ));

    let netifs = NETIFS.get_or_init(|| FilteredNetifs::new(transport.interface_name));
    let handler = dm_handler(matter, netifs, &boolean_handler, &power_handler);
    let dm = DataModel::new(matter, buffers, subscriptions, handler);

    let responder = DefaultResponder::new(&dm);

    let mut transport_task = pin!(matter.run(&transport.socket, &transport.socket));

    let hostname =
        HOSTNAME.get_or_init(|| gethostname::gethostname().to_string_lossy().into_owned());

    let host = Host {
        id: 0,
        hostname,
        ip: transport.ipv4.octets().into(),
        ipv6: transport.ipv6.octets().into(),
    };

    let mdns_responder = BuiltinMdnsResponder::new(matter);
    let mut mdns = pin!(mdns_responder.run(
        &transport.mdns_socket,
        &transport.mdns_socket,
        &host,
        Some(transport.ipv4.octets().into()),
        Some(transport.interface_index),
    ));

    let mut respond = pin!(responder.run::<4, 4>());
    let mut dm_job = pin!(dm.run());
    let mut persist = pin!(psm.run(&persist_path, matter, NO_NETWORKS));
    let mut leak_changes = pin!(forward_leak_changes(&boolean_handler));

    accessory.set_online(true);
    // Receiver gone means supervise already gave up; nothing to report to
    let _ = ready.send(());
    info!("Matter stack running. Waiting for controller connections...");

    let result = select4(
        &mut transport_task,
        &mut mdns,
        select(&mut respond, &mut dm_job).coalesce(),
        select(&mut persist, &mut leak_changes).coalesce(),
    )
    .coalesce()
    .await;

    accessory.set_online(false);

    if let Err(e) = result {
        error!("Matter stack error: {:?}", e);
        return Err(e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stack_ready_after_send() {
        let (tx, rx) = oneshot::channel();
        tx.send(()).unwrap();
        assert!(stack_ready(rx).await.is_ok());
    }

    #[tokio::test]
    async fn test_stack_init_failure_is_transport_error() {
        let (tx, rx) = oneshot::channel::<()>();
        // The stack thread returns early and drops its sender
        drop(tx);
        let err = stack_ready(rx).await.unwrap_err();
        assert!(matches!(err, MonitorError::TransportUnavailable(_)));
    }

    #[test]
    fn test_persist_path_under_config_dir() {
        let path = get_persist_path();
        assert!(path.ends_with(".config/water-level-monitor/matter.bin"));
    }
}
