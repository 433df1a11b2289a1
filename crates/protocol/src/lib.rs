pub mod codec;

use std::borrow::Cow;

/// Reply to an accepted batch.
pub const ACK: &str = "ACK\n";
/// Sent once every batch of the agency went out.
pub const END: &str = "END\n";
/// Asks whether the draw results are ready.
pub const WIN: &str = "WIN\n";
/// Positive reply to [`WIN`].
pub const READY: &str = "Y\n";

const REJECTED_PREFIX: &str = "REJECTED ";

/// Client-to-aggregator messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request<'a> {
    /// Serialized batch, newline-terminated bet lines back to back.
    Bets(Cow<'a, [u8]>),
    End,
    Poll,
    Query { agency: &'a str },
}

impl Request<'_> {
    /// Frame payload for this request.
    pub fn encode(&self) -> Cow<'_, [u8]> {
        match self {
            Request::Bets(payload) => Cow::Borrowed(payload.as_ref()),
            Request::End => Cow::Borrowed(END.as_bytes()),
            Request::Poll => Cow::Borrowed(WIN.as_bytes()),
            Request::Query { agency } => Cow::Owned(format!("CON|{agency}\n").into_bytes()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchReply {
    Accepted,
    /// The aggregator refused `n` bets of the batch.
    Rejected(usize),
    Unexpected(String),
}

impl BatchReply {
    pub fn parse(reply: &str) -> Self {
        if reply == ACK {
            return BatchReply::Accepted;
        }

        reply
            .strip_prefix(REJECTED_PREFIX)
            .and_then(|rest| rest.trim_end_matches('\n').parse().ok())
            .map(BatchReply::Rejected)
            .unwrap_or_else(|| BatchReply::Unexpected(reply.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollReply {
    Ready,
    Pending,
}

impl PollReply {
    pub fn parse(reply: &str) -> Self {
        if reply == READY {
            PollReply::Ready
        } else {
            PollReply::Pending
        }
    }
}

/// Winner documents from a query reply.
///
/// `"\n"` means no winners; otherwise the ids are `|`-separated and the
/// list ends with a newline.
pub fn parse_winners(reply: &str) -> Vec<&str> {
    let body = reply.strip_suffix('\n').unwrap_or(reply);
    if body.is_empty() {
        return Vec::new();
    }
    body.split('|').collect()
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
