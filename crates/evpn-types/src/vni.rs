//! Virtual network identifier carried in EVPN route labels.

use crate::{ParseError, VlanId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 24-bit VXLAN network identifier.
///
/// EVPN MAC/IP routes carry one or more labels; the first label is the
/// layer-2 VNI of the advertised endpoint.
///
/// ```
/// use evpn_types::Vni;
///
/// let vni = Vni::from_labels(&[42, 1000]).unwrap();
/// assert_eq!(vni.as_u32(), 42);
/// assert!(Vni::from_labels(&[]).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Vni(u32);

impl Vni {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 0x00ff_ffff;

    pub const fn new(id: u32) -> Result<Self, ParseError> {
        if id >= Self::MIN && id <= Self::MAX {
            Ok(Vni(id))
        } else {
            Err(ParseError::InvalidVni(id))
        }
    }

    /// Picks the VNI from a route's label stack. Only the first label is used.
    pub fn from_labels(labels: &[u32]) -> Result<Self, ParseError> {
        labels
            .first()
            .ok_or(ParseError::MissingVni)
            .and_then(|&label| Vni::new(label))
    }

    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Maps the VNI onto the 802.1Q tag used as its surrogate on the bridge.
    ///
    /// Fails when the VNI does not fit the 12-bit VLAN space.
    pub fn to_vlan(&self) -> Result<VlanId, ParseError> {
        VlanId::new(self.0)
    }
}

impl fmt::Display for Vni {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for Vni {
    type Error = ParseError;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        Vni::new(id)
    }
}

impl From<Vni> for u32 {
    fn from(vni: Vni) -> u32 {
        vni.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_valid_range() {
        assert!(Vni::new(1).is_ok());
        assert!(Vni::new(0x00ff_ffff).is_ok());
        assert_eq!(Vni::new(0), Err(ParseError::InvalidVni(0)));
        assert_eq!(Vni::new(0x0100_0000), Err(ParseError::InvalidVni(0x0100_0000)));
    }

    #[test]
    fn test_first_label_wins() {
        let vni = Vni::from_labels(&[42, 7]).unwrap();
        assert_eq!(vni.as_u32(), 42);
        assert_eq!(Vni::from_labels(&[]), Err(ParseError::MissingVni));
        assert_eq!(Vni::from_labels(&[0, 42]), Err(ParseError::InvalidVni(0)));
    }

    #[test]
    fn test_vlan_surrogate() {
        assert_eq!(Vni::new(42).unwrap().to_vlan().unwrap().as_u16(), 42);
        assert_eq!(
            Vni::new(5000).unwrap().to_vlan(),
            Err(ParseError::InvalidVlanId(5000))
        );
    }
}
