//! SNTP server loop against the scripted vendor stack.

use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

use heapless::{String, Vec as HVec};
use simplelink_iot::config::SntpConfig;
use simplelink_iot::ports::{SocketKind, VendorError};
use simplelink_iot::sntp::calendar::TIME_2013;
use simplelink_iot::sntp::{self, SntpSession};
use simplelink_iot::SntpError;

use crate::mock_stack::{Call, FIRST_SOCKET, MockStack, Opt};

const SERVER_A: &str = "0.pool.ntp.org";
const SERVER_B: &str = "1.pool.ntp.org";
const IP_A: Ipv4Addr = Ipv4Addr::new(198, 51, 100, 1);
const IP_B: Ipv4Addr = Ipv4Addr::new(198, 51, 100, 2);

/// 2013-02-15 13:07:09 as NTP seconds.
const FEB_15_NTP: u32 = TIME_2013 + 45 * 86_400 + 13 * 3600 + 7 * 60 + 9;

fn config(servers: &[&str]) -> SntpConfig {
    let mut list = HVec::new();
    for s in servers {
        list.push(String::try_from(*s).unwrap()).unwrap();
    }
    SntpConfig {
        servers: list,
        ..SntpConfig::default()
    }
}

fn stack() -> MockStack {
    let mut s = MockStack::new();
    s.dns.insert(SERVER_A.into(), Ok(IP_A));
    s.dns.insert(SERVER_B.into(), Ok(IP_B));
    s
}

fn reply(mode_byte: u8, ntp_secs: u32) -> Vec<u8> {
    let mut r = vec![0u8; 48];
    r[0] = mode_byte;
    r[40..44].copy_from_slice(&ntp_secs.to_be_bytes());
    r
}

fn server_reply(ntp_secs: u32) -> Vec<u8> {
    reply(0x24, ntp_secs)
}

fn count(calls: &[Call], pred: impl Fn(&Call) -> bool) -> usize {
    calls.iter().filter(|c| pred(c)).count()
}

#[test]
fn single_server_exchange_sets_device_clock() {
    let mut stack = stack();
    stack.recv_from_script.push_back(Ok(server_reply(FEB_15_NTP)));
    let cfg = config(&[SERVER_A]);

    let time = sntp::update_system_time(&mut stack, &cfg).unwrap();
    assert_eq!(time.to_string(), "Fri Feb 15 13:07:09 UTC 2013");
    assert_eq!((time.month, time.day), (2, 15));
    assert_eq!(stack.device_time, Some(time));

    let s = FIRST_SOCKET;
    let mut request = vec![0u8; 48];
    request[0] = 0x1B;
    assert_eq!(
        stack.calls(),
        vec![
            Call::Socket(SocketKind::Datagram),
            Call::Resolve(SERVER_A.into()),
            Call::SetOption(s, Opt::RecvTimeout(Duration::from_secs(5))),
            Call::SendTo(s, request, SocketAddrV4::new(IP_A, 123)),
            Call::Bind(s, 0),
            Call::RecvFrom(s),
            Call::SetDateTime(time),
            Call::Close(s),
        ]
    );
}

#[test]
fn falls_through_to_next_server_after_dns_failure() {
    let mut stack = stack();
    stack.dns.insert(SERVER_A.into(), Err(VendorError::Code(-161)));
    stack.recv_from_script.push_back(Ok(server_reply(FEB_15_NTP)));

    let time = sntp::update_system_time(&mut stack, &config(&[SERVER_A, SERVER_B])).unwrap();
    assert_eq!(time.day, 15);

    let calls = stack.calls();
    assert!(calls.contains(&Call::Resolve(SERVER_A.into())));
    assert_eq!(
        count(&calls, |c| matches!(c, Call::SendTo(_, _, a) if *a.ip() == IP_B)),
        1
    );
    assert_eq!(count(&calls, |c| matches!(c, Call::SendTo(_, _, a) if *a.ip() == IP_A)), 0);
}

#[test]
fn socket_is_bound_once_across_servers() {
    let mut stack = stack();
    // Client-mode echo from the first server, good reply from the second.
    stack.recv_from_script.extend([
        Ok(reply(0x1B, FEB_15_NTP)),
        Ok(server_reply(FEB_15_NTP)),
    ]);

    let mut session = SntpSession::new();
    let time = session
        .update_system_time(&mut stack, &config(&[SERVER_A, SERVER_B]))
        .unwrap();

    let calls = stack.calls();
    assert_eq!(count(&calls, |c| matches!(c, Call::Bind(..))), 1);
    assert_eq!(count(&calls, |c| matches!(c, Call::SendTo(..))), 2);
    assert_eq!(session.destination, Some(IP_B));
    assert_eq!(session.time, Some(time));
    assert_eq!(session.socket, None);
}

#[test]
fn every_server_failing_reports_all_servers_failed_and_closes_socket() {
    let mut stack = stack();
    stack.recv_from_script.extend([
        Err(VendorError::WouldBlock),
        Ok(vec![0x24; 20]),
    ]);

    let err = sntp::update_system_time(&mut stack, &config(&[SERVER_A, SERVER_B])).unwrap_err();
    assert_eq!(err, SntpError::AllServersFailed);
    assert_eq!(stack.device_time, None);
    assert_eq!(stack.calls().last(), Some(&Call::Close(FIRST_SOCKET)));
}

#[test]
fn socket_creation_failure_is_reported_without_close() {
    let mut stack = stack();
    stack.socket_error = Some(VendorError::Code(-10));

    let err = sntp::update_system_time(&mut stack, &config(&[SERVER_A])).unwrap_err();
    assert_eq!(err, SntpError::Socket(VendorError::Code(-10)));
    assert_eq!(stack.calls(), vec![Call::Socket(SocketKind::Datagram)]);
}

#[test]
fn short_send_moves_to_next_server() {
    let mut stack = stack();
    stack.send_to_script.push_back(Ok(20));
    stack.recv_from_script.push_back(Ok(server_reply(FEB_15_NTP)));

    let time = sntp::update_system_time(&mut stack, &config(&[SERVER_A, SERVER_B])).unwrap();
    assert_eq!(time.hour, 13);
    assert_eq!(count(&stack.calls(), |c| matches!(c, Call::RecvFrom(_))), 1);
}

#[test]
fn timestamp_before_2013_is_rejected() {
    let mut stack = stack();
    stack
        .recv_from_script
        .push_back(Ok(server_reply(TIME_2013 - 1)));

    let err = sntp::update_system_time(&mut stack, &config(&[SERVER_A])).unwrap_err();
    assert_eq!(err, SntpError::AllServersFailed);
    assert_eq!(
        count(&stack.calls(), |c| matches!(c, Call::SetDateTime(_))),
        0
    );
}

#[test]
fn device_refusing_time_moves_to_next_server() {
    let mut stack = stack();
    stack.set_time_script.push_back(Err(VendorError::Code(-1)));
    stack.recv_from_script.extend([
        Ok(server_reply(FEB_15_NTP)),
        Ok(server_reply(FEB_15_NTP + 1)),
    ]);

    let time = sntp::update_system_time(&mut stack, &config(&[SERVER_A, SERVER_B])).unwrap();
    assert_eq!(time.second, 10);
    assert_eq!(stack.device_time, Some(time));
}

#[test]
fn timezone_offset_is_applied() {
    let mut stack = stack();
    stack.recv_from_script.push_back(Ok(server_reply(FEB_15_NTP)));
    let mut cfg = config(&[SERVER_A]);
    cfg.gmt_diff_hours = 5;
    cfg.gmt_diff_mins = 30;

    let mut session = SntpSession::new();
    let time = session.update_system_time(&mut stack, &cfg).unwrap();
    assert_eq!((time.hour, time.minute, time.second), (18, 37, 9));
    assert_eq!(
        session.elapsed_secs,
        45 * 86_400 + 18 * 3600 + 37 * 60 + 9
    );
}

#[test]
fn zero_response_timeout_waits_at_least_one_second() {
    let mut stack = stack();
    stack.recv_from_script.push_back(Ok(server_reply(FEB_15_NTP)));
    let mut cfg = config(&[SERVER_A]);
    cfg.response_timeout_secs = 0;

    sntp::update_system_time(&mut stack, &cfg).unwrap();
    let calls = stack.calls();
    assert!(calls.contains(&Call::SetOption(
        FIRST_SOCKET,
        Opt::RecvTimeout(Duration::from_secs(1))
    )));
    assert!(!calls.contains(&Call::SetOption(
        FIRST_SOCKET,
        Opt::RecvTimeout(Duration::ZERO)
    )));
}

#[test]
fn response_timeout_comes_from_config() {
    let mut stack = stack();
    stack.recv_from_script.push_back(Ok(server_reply(FEB_15_NTP)));
    let mut cfg = config(&[SERVER_A]);
    cfg.response_timeout_secs = 10;

    sntp::update_system_time(&mut stack, &cfg).unwrap();
    assert!(stack.calls().contains(&Call::SetOption(
        FIRST_SOCKET,
        Opt::RecvTimeout(Duration::from_secs(10))
    )));
}
