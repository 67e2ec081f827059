use serde::{Deserialize, Serialize};

/// Stage reached by a trade. Only moves forward, except into `Expired`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum TradeStatusCode {
    #[default]
    Undefined = 0,
    Proposal = 1,
    Accepted = 2,
    Completed = 3,
    Settled = 4,
    Expired = 5,
}

impl TradeStatusCode {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Undefined),
            1 => Some(Self::Proposal),
            2 => Some(Self::Accepted),
            3 => Some(Self::Completed),
            4 => Some(Self::Settled),
            5 => Some(Self::Expired),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Status code plus the sticky rejection flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradeStatus {
    pub code: TradeStatusCode,
    pub failed: bool,
}

/// One recorded swap protocol message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Swap {
    pub id: String,
    pub message: Vec<u8>,
    /// Unix seconds.
    pub timestamp: i64,
}
