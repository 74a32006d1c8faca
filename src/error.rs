use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Classification of a service error.
///
/// The distinction that matters to callers is between failures that abort a
/// pipeline ([`Fetch`](ErrorKind::Fetch), [`Transaction`](ErrorKind::Transaction))
/// and conditions that are recovered locally with a zero/none default and
/// should never reach the user ([`Unavailable`](ErrorKind::Unavailable)).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum ErrorKind {
    /// Requested data does not exist for this account (e.g. no staking
    /// history, no unbonding entries). Recovered locally by defaulting.
    Unavailable,

    /// A network or upstream RPC failure while fetching required data.
    Fetch,

    /// A stake/unstake transaction was rejected at signing or broadcast.
    Transaction,

    /// The computed maximum stakeable amount is non-positive; submitting
    /// would produce a doomed transaction.
    InsufficientFunds,

    /// A caller-supplied deadline elapsed while waiting for confirmation.
    Timeout,

    /// An internal consistency error.
    Internal,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let name = match self {
            Self::Unavailable => "unavailable",
            Self::Fetch => "fetch failed",
            Self::Transaction => "transaction failed",
            Self::InsufficientFunds => "insufficient funds",
            Self::Timeout => "timed out",
            Self::Internal => "internal error",
        };
        write!(f, "{name}")
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    /// Extend an error message with additional context, keeping the same kind.
    pub fn context(self, context: impl Display) -> Self {
        Self {
            message: format!("{context}: {}", self.message),
            kind: self.kind,
        }
    }

    /// Stock error for data that does not exist for this account.
    ///
    /// Callers treat this as a local condition, not a failure: the coin
    /// service maps it to a zero amount or empty list. It is generally best
    /// practice to extend the message with specifics using
    /// [`context`](Self::context).
    pub fn unavailable() -> Self {
        Self {
            message: "no data for account".to_string(),
            kind: ErrorKind::Unavailable,
        }
    }

    /// Stock error for a failed upstream fetch (network, RPC, or index
    /// service). Propagated to the caller; the dashboard surfaces it as a
    /// single error state rather than partial data.
    pub fn fetch() -> Self {
        Self {
            message: "upstream request failed".to_string(),
            kind: ErrorKind::Fetch,
        }
    }

    /// Stock error for a rejected stake or unstake transaction.
    pub fn transaction() -> Self {
        Self {
            message: "transaction rejected".to_string(),
            kind: ErrorKind::Transaction,
        }
    }

    /// The computed maximum stakeable amount is non-positive.
    pub fn insufficient_funds() -> Self {
        Self {
            message: "insufficient funds to pay fees".to_string(),
            kind: ErrorKind::InsufficientFunds,
        }
    }

    /// A deadline elapsed while polling for transaction confirmation.
    pub fn timeout() -> Self {
        Self {
            message: "deadline elapsed".to_string(),
            kind: ErrorKind::Timeout,
        }
    }

    /// An error internal to the service.
    pub fn internal() -> Self {
        Self {
            message: "internal error".to_string(),
            kind: ErrorKind::Internal,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Error {}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::fetch().context(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::internal().context(err)
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Extension functions for converting other result types into [`Result`].
pub trait ResultExt {
    type Ok;

    /// Wrap an error with a service error kind, preserving the original error
    /// context.
    fn context(self, f: impl FnOnce() -> Error) -> Result<Self::Ok>;
}

impl<T, E> ResultExt for Result<T, E>
where
    E: std::error::Error,
{
    type Ok = T;

    fn context(self, f: impl FnOnce() -> Error) -> Result<<Self as ResultExt>::Ok> {
        self.map_err(|err| f().context(err))
    }
}

macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
}
pub(crate) use ensure;
