//! Port table parsed from `ovs-ofctl show <bridge>`
//!
//! Port lines look like:
//!
//! ```text
//!  1(vxlan-10.1.1.1): addr:9e:6d:02:5c:4e:11
//!  LOCAL(docker0-ovs): addr:be:3a:48:a2:9f:4c
//! ```

use evpn_types::Ipv4Address;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::PortNo;

static PORT_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+|LOCAL)\(([^)]+)\):\s*addr:")
        .expect("Invalid regex pattern")
});

/// One bridge port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortEntry {
    pub number: PortNo,
    pub name: String,
}

/// Ports of a bridge at the time of the query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortTable {
    entries: Vec<PortEntry>,
}

impl PortTable {
    /// Parses `ovs-ofctl show` output. Lines that are not port lines are
    /// ignored.
    pub fn parse(output: &str) -> Self {
        let entries = output
            .lines()
            .filter_map(|line| {
                let caps = PORT_LINE_RE.captures(line)?;
                let number = match &caps[1] {
                    "LOCAL" => PortNo::LOCAL,
                    n => PortNo::new(n.parse().ok()?),
                };
                Some(PortEntry {
                    number,
                    name: caps[2].to_string(),
                })
            })
            .collect();
        Self { entries }
    }

    /// Exact port name lookup.
    pub fn find_by_name(&self, name: &str) -> Option<PortNo> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.number)
    }

    /// Finds the tunnel port whose name embeds `address` (e.g. `vxlan-10.1.1.1`).
    ///
    /// The address must appear as a whole token, so `10.1.1.1` does not
    /// match a port named for `10.1.1.10`.
    pub fn find_by_address(&self, address: Ipv4Address) -> Option<PortNo> {
        let needle = address.to_string();
        self.entries
            .iter()
            .find(|e| contains_token(&e.name, &needle))
            .map(|e| e.number)
    }
}

fn contains_token(haystack: &str, needle: &str) -> bool {
    let is_addr_char = |c: char| c.is_ascii_digit() || c == '.';
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(is_addr_char) && !after.is_some_and(is_addr_char)
    })
}
