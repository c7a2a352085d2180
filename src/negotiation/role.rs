use std::fmt;

/// Who drives the offer. Fixed for the life of a negotiation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Received `peer-ready`; impolite in a collision.
    OfferCreator,
    /// Polite: yields to the remote offer in a collision.
    Answerer,
}

impl Role {
    #[must_use]
    pub fn is_polite(self) -> bool {
        matches!(self, Self::Answerer)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OfferCreator => "offer-creator",
            Self::Answerer => "answerer",
        })
    }
}
