//! Non-data command options. These pass through to the store unencrypted.

use cloak_common::Command;

/// Options for `SET`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Expire after this many seconds.
    pub ex: Option<u64>,
    /// Expire after this many milliseconds.
    pub px: Option<u64>,
    /// Only set if the key does not exist.
    pub nx: bool,
    /// Only set if the key already exists.
    pub xx: bool,
    /// Keep the existing time to live.
    pub keep_ttl: bool,
}

impl SetOptions {
    pub fn ex(seconds: u64) -> Self {
        Self {
            ex: Some(seconds),
            ..Self::default()
        }
    }

    pub fn nx() -> Self {
        Self {
            nx: true,
            ..Self::default()
        }
    }

    pub(crate) fn apply(&self, mut cmd: Command) -> Command {
        if let Some(ex) = self.ex {
            cmd = cmd.arg("EX").arg(ex);
        }
        if let Some(px) = self.px {
            cmd = cmd.arg("PX").arg(px);
        }
        if self.nx {
            cmd = cmd.arg("NX");
        }
        if self.xx {
            cmd = cmd.arg("XX");
        }
        if self.keep_ttl {
            cmd = cmd.arg("KEEPTTL");
        }
        cmd
    }
}

/// Options for `ZADD`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZAddOptions {
    pub nx: bool,
    pub xx: bool,
    pub gt: bool,
    pub lt: bool,
    /// Return the number of changed elements instead of added ones.
    pub ch: bool,
}

impl ZAddOptions {
    pub(crate) fn apply(&self, mut cmd: Command) -> Command {
        for (on, flag) in [
            (self.nx, "NX"),
            (self.xx, "XX"),
            (self.gt, "GT"),
            (self.lt, "LT"),
            (self.ch, "CH"),
        ] {
            if on {
                cmd = cmd.arg(flag);
            }
        }
        cmd
    }
}

/// Score aggregation for `ZINTERSTORE` / `ZUNIONSTORE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Sum,
    Min,
    Max,
}

impl Aggregate {
    pub(crate) fn as_arg(self) -> &'static str {
        match self {
            Aggregate::Sum => "SUM",
            Aggregate::Min => "MIN",
            Aggregate::Max => "MAX",
        }
    }
}

/// Options for the `SCAN` family.
///
/// There is no `MATCH`: patterns cannot be evaluated against ciphertext.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Page size hint.
    pub count: Option<usize>,
}

impl ScanOptions {
    pub fn count(count: usize) -> Self {
        Self { count: Some(count) }
    }

    pub(crate) fn apply(&self, cmd: Command) -> Command {
        match self.count {
            Some(n) => cmd.arg("COUNT").arg(n),
            None => cmd,
        }
    }
}
