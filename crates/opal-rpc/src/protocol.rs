//! Protocol and method identifiers.

use std::fmt;
use std::str::FromStr;

use crate::error::RpcError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// The standard AM protocol.
    ApplicationMaster,
    /// Extends the standard protocol with distributed-scheduling calls.
    DistributedScheduling,
}

impl Protocol {
    pub const ALL: [Protocol; 2] = [Protocol::ApplicationMaster, Protocol::DistributedScheduling];

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::ApplicationMaster => "ApplicationMasterProtocol",
            Protocol::DistributedScheduling => "DistributedSchedulingAMProtocol",
        }
    }

    /// Methods this protocol serves.
    pub fn methods(&self) -> &'static [Method] {
        match self {
            Protocol::ApplicationMaster => &[
                Method::RegisterApplicationMaster,
                Method::Allocate,
                Method::FinishApplicationMaster,
            ],
            Protocol::DistributedScheduling => &[
                Method::RegisterApplicationMaster,
                Method::Allocate,
                Method::FinishApplicationMaster,
                Method::RegisterForDistributedScheduling,
                Method::AllocateForDistributedScheduling,
            ],
        }
    }

    pub fn offers(&self, method: Method) -> bool {
        self.methods().contains(&method)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Protocol::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| RpcError::UnknownProtocol(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    RegisterApplicationMaster,
    Allocate,
    FinishApplicationMaster,
    RegisterForDistributedScheduling,
    AllocateForDistributedScheduling,
}

impl Method {
    pub const ALL: [Method; 5] = [
        Method::RegisterApplicationMaster,
        Method::Allocate,
        Method::FinishApplicationMaster,
        Method::RegisterForDistributedScheduling,
        Method::AllocateForDistributedScheduling,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::RegisterApplicationMaster => "registerApplicationMaster",
            Method::Allocate => "allocate",
            Method::FinishApplicationMaster => "finishApplicationMaster",
            Method::RegisterForDistributedScheduling => {
                "registerApplicationMasterForDistributedScheduling"
            }
            Method::AllocateForDistributedScheduling => "allocateForDistributedScheduling",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| RpcError::UnknownMethod(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_parse_back() {
        for p in Protocol::ALL {
            assert_eq!(p.as_str().parse::<Protocol>().unwrap(), p);
        }
        for m in Method::ALL {
            assert_eq!(m.to_string().parse::<Method>().unwrap(), m);
        }
    }

    #[test]
    fn unknown_identifiers_are_rejected() {
        assert!(matches!(
            "ClientRMProtocol".parse::<Protocol>(),
            Err(RpcError::UnknownProtocol(_))
        ));
        assert!(matches!(
            "Allocate".parse::<Method>(),
            Err(RpcError::UnknownMethod(_))
        ));
    }

    #[test]
    fn distributed_protocol_extends_standard() {
        for m in Protocol::ApplicationMaster.methods() {
            assert!(Protocol::DistributedScheduling.offers(*m));
        }
        assert!(!Protocol::ApplicationMaster.offers(Method::AllocateForDistributedScheduling));
        assert!(!Protocol::ApplicationMaster.offers(Method::RegisterForDistributedScheduling));
    }
}
