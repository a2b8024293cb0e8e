use std::fmt;
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    error::CheckError,
    observer::CheckObserver,
    report::CheckResponse,
    types::{PerformanceMetric, Severity},
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

// Accepts any casing, same as the command line.
impl<'de> Deserialize<'de> for Protocol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
        })
    }
}

impl FromStr for Protocol {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TCP" => Ok(Protocol::Tcp),
            "UDP" => Ok(Protocol::Udp),
            _ => Err(CheckError::InvalidArgument(format!(
                "Please specify protocol of TCP,UDP only (got {s})"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOptions {
    pub protocol: Protocol,
    pub timeout: Duration,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            protocol: Protocol::Tcp,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    Reachable,
    Unreachable,
}

/// Whether `host:port` answers, and how long it took to find out.
pub fn probe(
    host: &str,
    port: u16,
    opts: &ProbeOptions,
) -> Result<(Reachability, Duration), CheckError> {
    if opts.timeout.is_zero() {
        return Err(CheckError::InvalidArgument(
            "timeout must be greater than zero".to_string(),
        ));
    }

    let addr = resolve(host, port)?;
    let started = Instant::now();
    let outcome = match opts.protocol {
        Protocol::Tcp => probe_tcp(addr, opts.timeout),
        Protocol::Udp => probe_udp(addr, opts.timeout),
    }
    .map_err(|e| CheckError::io(format!("probe {addr}"), e))?;

    Ok((outcome, started.elapsed()))
}

fn resolve(host: &str, port: u16) -> Result<SocketAddr, CheckError> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|source| CheckError::Resolve {
            host: host.to_string(),
            source,
        })?
        .collect();

    addrs
        .iter()
        .find(|a| a.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| CheckError::Resolve {
            host: host.to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no addresses"),
        })
}

fn is_closed(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused | io::ErrorKind::TimedOut
    )
}

fn probe_tcp(addr: SocketAddr, timeout: Duration) -> io::Result<Reachability> {
    match TcpStream::connect_timeout(&addr, timeout) {
        Ok(_) => Ok(Reachability::Reachable),
        Err(e) if is_closed(&e) => Ok(Reachability::Unreachable),
        Err(e) => Err(e),
    }
}

// UDP cannot tell open from filtered; only an ICMP rejection counts as closed.
fn probe_udp(addr: SocketAddr, timeout: Duration) -> io::Result<Reachability> {
    let local: SocketAddr = if addr.is_ipv4() {
        ([0u8; 4], 0).into()
    } else {
        ([0u16; 8], 0).into()
    };
    let sock = UdpSocket::bind(local)?;
    sock.set_read_timeout(Some(timeout))?;
    sock.connect(addr)?;

    if let Err(e) = sock.send(&[]) {
        return if e.kind() == io::ErrorKind::ConnectionRefused {
            Ok(Reachability::Unreachable)
        } else {
            Err(e)
        };
    }

    let mut buf = [0u8; 512];
    match sock.recv(&mut buf) {
        Ok(_) => Ok(Reachability::Reachable),
        Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => Ok(Reachability::Unreachable),
        Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
            Ok(Reachability::Reachable)
        }
        Err(e) => Err(e),
    }
}

fn timing_metrics(elapsed: Duration, timeout: Duration, connected: bool) -> [PerformanceMetric; 2] {
    let ms = |d: Duration| (d.as_secs_f64() * 1000.0 * 1000.0).round() / 1000.0;
    [
        PerformanceMetric::new("time", ms(elapsed), "ms")
            .with_thresholds(None, Some(ms(timeout)))
            .with_range(Some(0.0), None),
        PerformanceMetric::new("connected", if connected { 1.0 } else { 0.0 }, "")
            .with_range(Some(0.0), Some(1.0)),
    ]
}

/// OK when `host:port` accepts a connection.
pub fn check_connect(
    host: &str,
    port: u16,
    opts: &ProbeOptions,
    observer: &dyn CheckObserver,
) -> CheckResponse {
    run_probe("connect test", host, port, opts, observer, Reachability::Reachable)
}

/// OK when `host:port` refuses or ignores a connection.
pub fn check_blocked(
    host: &str,
    port: u16,
    opts: &ProbeOptions,
    observer: &dyn CheckObserver,
) -> CheckResponse {
    run_probe("block test", host, port, opts, observer, Reachability::Unreachable)
}

fn run_probe(
    name: &str,
    host: &str,
    port: u16,
    opts: &ProbeOptions,
    observer: &dyn CheckObserver,
    wanted: Reachability,
) -> CheckResponse {
    let mut response = CheckResponse::new(name);
    let target = format!("{host}:{port} via {}", opts.protocol);

    let (outcome, elapsed) = match probe(host, port, opts) {
        Ok(v) => v,
        Err(e) => {
            observer.error(format_args!("{name} for {target} failed: {e}"));
            response.resolve(
                Severity::Unknown,
                format!("Unable to check connection to {target} because {e}"),
            );
            return response;
        }
    };
    observer.debug(format_args!("{target}: {outcome:?} after {elapsed:?}"));

    let severity = if outcome == wanted {
        Severity::Ok
    } else {
        Severity::Critical
    };
    let message = match (wanted, outcome) {
        (Reachability::Reachable, Reachability::Reachable) => {
            format!("Able to connect to {target}")
        }
        (Reachability::Reachable, Reachability::Unreachable) => {
            format!("Not able to connect to {target}")
        }
        (Reachability::Unreachable, Reachability::Unreachable) => format!("{target} is blocked"),
        (Reachability::Unreachable, Reachability::Reachable) => {
            format!("Able to connect to {target}, expected it to be blocked")
        }
    };
    response.resolve(severity, message);

    for m in timing_metrics(elapsed, opts.timeout, outcome == Reachability::Reachable) {
        response.push_metric(m);
    }

    response
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use super::*;
    use crate::observer::NullObserver;

    fn closed_port() -> u16 {
        let l = TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    }

    #[test]
    fn protocol_parses_case_insensitively() {
        assert_eq!("tcp".parse::<Protocol>().unwrap(), Protocol::Tcp);
        assert_eq!("UDP".parse::<Protocol>().unwrap(), Protocol::Udp);
        assert!("icmp".parse::<Protocol>().is_err());
    }

    #[test]
    fn open_tcp_port_connects() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let r = check_connect("127.0.0.1", port, &ProbeOptions::default(), &NullObserver);
        assert_eq!(r.severity, Severity::Ok);
        assert_eq!(r.message, format!("Able to connect to 127.0.0.1:{port} via TCP"));
        let perf = r.performance.as_ref().unwrap();
        assert_eq!(perf.len(), 2);
        assert_eq!(perf[1].value, 1.0);
        assert_eq!(perf[0].crit_threshold, Some(5000.0));
    }

    #[test]
    fn closed_tcp_port_is_critical_for_connect_and_ok_for_block() {
        let port = closed_port();
        let opts = ProbeOptions::default();

        let r = check_connect("127.0.0.1", port, &opts, &NullObserver);
        assert_eq!(r.severity, Severity::Critical);

        let r = check_blocked("127.0.0.1", port, &opts, &NullObserver);
        assert_eq!(r.severity, Severity::Ok);
        assert!(r.message.ends_with("is blocked"));
        assert_eq!(r.performance.as_ref().unwrap()[1].value, 0.0);
    }

    #[test]
    fn open_port_fails_block_check() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let r = check_blocked("127.0.0.1", port, &ProbeOptions::default(), &NullObserver);
        assert_eq!(r.severity, Severity::Critical);
        assert!(r.message.contains("expected it to be blocked"));
    }

    #[test]
    fn zero_timeout_is_unknown() {
        let opts = ProbeOptions {
            timeout: Duration::ZERO,
            ..ProbeOptions::default()
        };
        let r = check_connect("127.0.0.1", 80, &opts, &NullObserver);
        assert_eq!(r.severity, Severity::Unknown);
        assert!(r.performance.is_none());
    }

    #[test]
    fn unresolvable_host_is_unknown() {
        let r = check_connect(
            "host.invalid",
            80,
            &ProbeOptions::default(),
            &NullObserver,
        );
        assert_eq!(r.severity, Severity::Unknown);
        assert!(r.message.starts_with("Unable to check connection to host.invalid:80 via TCP"));
    }
}
