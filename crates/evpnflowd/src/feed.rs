//! Newline-delimited JSON advertisement feed
//!
//! One EVPN MAC/IP advertisement per line:
//!
//! ```text
//! {"mac": "aa:bb:cc:dd:ee:ff", "ip": "10.0.0.5", "vni": [42], "nexthop": "10.1.1.1"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. A line that is not
//! a valid record, including one that is not UTF-8, is logged and skipped.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{info, warn};

use crate::flow_mgr::EvpnFlowMgr;
use crate::types::Advertisement;

/// Counters for one feed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub processed: u64,
    pub malformed: u64,
}

/// Decodes one feed line. Returns `None` for lines that carry no record.
pub fn parse_line(line: &[u8]) -> Option<Result<Advertisement, serde_json::Error>> {
    let line = line.trim_ascii();
    if line.is_empty() || line.starts_with(b"#") {
        return None;
    }
    Some(serde_json::from_slice(line))
}

/// Feeds every advertisement from `reader` to `mgr`, serially and in
/// arrival order, until end of input.
///
/// Only a failing read ends the run early.
pub async fn run<R>(mgr: &mut EvpnFlowMgr, reader: R) -> std::io::Result<FeedStats>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut stats = FeedStats::default();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        match parse_line(&buf) {
            None => continue,
            Some(Err(e)) => {
                stats.malformed += 1;
                warn!(
                    error = %e,
                    line = %String::from_utf8_lossy(buf.trim_ascii()),
                    "Skipping malformed advertisement record"
                );
            }
            Some(Ok(adv)) => {
                mgr.handle_advertisement(&adv).await;
                stats.processed += 1;
            }
        }
    }

    info!(
        processed = stats.processed,
        malformed = stats.malformed,
        "Advertisement feed closed"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::StaticHost;
    use crate::mock::MockSwitch;
    use crate::types::{HostIdentity, InventorySnapshot};
    use evpn_types::Ipv4Address;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;
    use std::sync::Arc;

    fn mgr() -> EvpnFlowMgr {
        EvpnFlowMgr::new(
            Arc::new(MockSwitch::new()),
            Arc::new(InventorySnapshot::default()),
            Arc::new(StaticHost(HostIdentity::new(Ipv4Address::new(10, 1, 1, 2)))),
        )
    }

    #[test]
    fn test_parse_line() {
        let adv = parse_line(
            br#"  {"mac": "aa:bb:cc:dd:ee:ff", "ip": "10.0.0.5", "vni": [42], "nexthop": "10.1.1.1"}  "#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(adv.vni, vec![42]);
        assert_eq!(adv.nexthop, "10.1.1.1");
    }

    #[test]
    fn test_skip_blank_and_comment() {
        assert!(parse_line(b"").is_none());
        assert!(parse_line(b"   \r\n").is_none());
        assert!(parse_line(b"# replayed from rib dump\n").is_none());
    }

    #[test]
    fn test_missing_vni_defaults_to_empty() {
        let adv = parse_line(br#"{"mac": "aa:bb:cc:dd:ee:ff", "ip": "10.0.0.5", "nexthop": "0.0.0.0"}"#)
            .unwrap()
            .unwrap();
        assert!(adv.vni.is_empty());
    }

    #[test]
    fn test_bad_json() {
        assert!(parse_line(b"{\"mac\": ").unwrap().is_err());
        assert!(parse_line(br#"{"ip": "10.0.0.5"}"#).unwrap().is_err());
        assert!(parse_line(b"{\"mac\": \"aa:bb:\xff\"}").unwrap().is_err());
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_is_skipped() {
        let mut feed = Vec::new();
        feed.extend_from_slice(
            b"{\"mac\": \"aa:bb:cc:\xff:ee:ff\", \"ip\": \"10.0.0.5\", \"vni\": [42], \"nexthop\": \"10.1.1.1\"}\n",
        );
        feed.extend_from_slice(
            br#"{"mac": "aa:bb:cc:dd:ee:ff", "ip": "10.0.0.6", "vni": [42], "nexthop": "0.0.0.0"}"#,
        );
        feed.push(b'\n');

        let mut mgr = mgr();
        let stats = run(&mut mgr, Cursor::new(feed)).await.unwrap();

        assert_eq!(
            stats,
            FeedStats {
                processed: 1,
                malformed: 1
            }
        );
        assert_eq!(
            mgr.last_nexthop("aa:bb:cc:dd:ee:ff".parse().unwrap(), Ipv4Address::new(10, 0, 0, 6)),
            Some(Ipv4Address::UNSPECIFIED)
        );
    }

    #[tokio::test]
    async fn test_last_line_without_newline() {
        let feed = br#"# header
{"mac": "aa:bb:cc:dd:ee:ff", "ip": "10.0.0.5", "vni": [42], "nexthop": "10.1.1.1"}

{"mac": "aa:bb:cc:dd:ee:01", "ip": "10.0.0.7", "vni": [42], "nexthop": "10.1.1.1"}"#;

        let mut mgr = mgr();
        let stats = run(&mut mgr, Cursor::new(feed.to_vec())).await.unwrap();
        assert_eq!(stats.processed, 2);
        assert_eq!(stats.malformed, 0);
    }
}
