//! Commands sent to, and replies received from, the remote store.
//!
//! These types model the store's request/response shape without committing to
//! a wire codec: a store adapter turns a [`Command`] into protocol frames and
//! parses the answer into a [`Reply`].

use std::fmt;

use bytes::Bytes;

use crate::error::StoreError;

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

/// Conversion of a command argument into its binary form.
pub trait IntoArg {
    /// Encode `self` as the bytes sent to the store.
    fn into_arg(self) -> Bytes;
}

impl IntoArg for Bytes {
    fn into_arg(self) -> Bytes {
        self
    }
}

impl IntoArg for Vec<u8> {
    fn into_arg(self) -> Bytes {
        Bytes::from(self)
    }
}

impl IntoArg for &[u8] {
    fn into_arg(self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl IntoArg for &str {
    fn into_arg(self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl IntoArg for String {
    fn into_arg(self) -> Bytes {
        Bytes::from(self.into_bytes())
    }
}

impl IntoArg for &String {
    fn into_arg(self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

macro_rules! display_arg {
    ($($t:ty),*) => {
        $(
            impl IntoArg for $t {
                fn into_arg(self) -> Bytes {
                    Bytes::from(self.to_string().into_bytes())
                }
            }
        )*
    };
}

display_arg!(i32, i64, u32, u64, usize, f64);

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// A single store command: an upper-case name plus binary arguments.
#[derive(Clone, PartialEq, Eq)]
pub struct Command {
    name: &'static str,
    args: Vec<Bytes>,
}

impl Command {
    /// Start a command with no arguments.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            args: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl IntoArg) -> Self {
        self.args.push(arg.into_arg());
        self
    }

    /// Append every argument yielded by `args`, preserving order.
    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: IntoArg,
    {
        self.args.extend(args.into_iter().map(IntoArg::into_arg));
        self
    }

    /// Append one argument in place.
    pub fn push_arg(&mut self, arg: impl IntoArg) {
        self.args.push(arg.into_arg());
    }

    /// Command name, e.g. `"GET"`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Arguments in send order.
    pub fn arguments(&self) -> &[Bytes] {
        &self.args
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Arguments are ciphertext; only their count is printed.
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("args", &self.args.len())
            .finish()
    }
}

/// How a batch of commands is executed by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    /// Commands are sent back to back and replies read afterwards.
    Pipeline,
    /// Commands are wrapped in a MULTI/EXEC transaction.
    Transaction,
}

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

/// A decoded store reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Absent value (missing key, timeout of a blocking command).
    Nil,
    /// Integer reply.
    Int(i64),
    /// Binary-safe bulk string.
    Bulk(Bytes),
    /// Simple status string such as `OK` or `PONG`.
    Status(String),
    /// Ordered sequence of replies.
    Array(Vec<Reply>),
}

impl Reply {
    /// Short name of the reply kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Reply::Nil => "nil",
            Reply::Int(_) => "integer",
            Reply::Bulk(_) => "bulk",
            Reply::Status(_) => "status",
            Reply::Array(_) => "array",
        }
    }

    /// `true` for [`Reply::Nil`].
    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::Nil)
    }

    fn unexpected(&self, expected: &'static str) -> StoreError {
        StoreError::UnexpectedReply {
            expected,
            got: self.kind(),
        }
    }

    /// Interpret as an integer.
    pub fn into_int(self) -> Result<i64, StoreError> {
        match self {
            Reply::Int(n) => Ok(n),
            Reply::Bulk(b) => parse_number(&b),
            other => Err(other.unexpected("integer")),
        }
    }

    /// Interpret as an integer that may be absent.
    pub fn into_opt_int(self) -> Result<Option<i64>, StoreError> {
        match self {
            Reply::Nil => Ok(None),
            other => other.into_int().map(Some),
        }
    }

    /// Interpret an integer or `OK` status as a boolean.
    pub fn into_bool(self) -> Result<bool, StoreError> {
        match self {
            Reply::Int(n) => Ok(n != 0),
            Reply::Status(s) => Ok(s == "OK"),
            Reply::Nil => Ok(false),
            other => Err(other.unexpected("boolean")),
        }
    }

    /// Interpret as a floating point number (scores, float increments).
    pub fn into_float(self) -> Result<f64, StoreError> {
        match self {
            Reply::Int(n) => Ok(n as f64),
            Reply::Bulk(b) => parse_number(&b),
            Reply::Status(s) => parse_number(s.as_bytes()),
            other => Err(other.unexpected("float")),
        }
    }

    /// Interpret as a floating point number that may be absent.
    pub fn into_opt_float(self) -> Result<Option<f64>, StoreError> {
        match self {
            Reply::Nil => Ok(None),
            other => other.into_float().map(Some),
        }
    }

    /// Interpret as a bulk payload that may be absent.
    pub fn into_opt_bulk(self) -> Result<Option<Bytes>, StoreError> {
        match self {
            Reply::Nil => Ok(None),
            Reply::Bulk(b) => Ok(Some(b)),
            Reply::Status(s) => Ok(Some(Bytes::from(s.into_bytes()))),
            other => Err(other.unexpected("bulk")),
        }
    }

    /// Interpret as a bulk payload that must be present.
    pub fn into_bulk(self) -> Result<Bytes, StoreError> {
        match self {
            Reply::Bulk(b) => Ok(b),
            Reply::Status(s) => Ok(Bytes::from(s.into_bytes())),
            other => Err(other.unexpected("bulk")),
        }
    }

    /// Interpret as a status string.
    pub fn into_status(self) -> Result<String, StoreError> {
        match self {
            Reply::Status(s) => Ok(s),
            Reply::Bulk(b) => Ok(String::from_utf8_lossy(&b).into_owned()),
            other => Err(other.unexpected("status")),
        }
    }

    /// Interpret as an array. A nil reply is an empty array.
    pub fn into_array(self) -> Result<Vec<Reply>, StoreError> {
        match self {
            Reply::Array(items) => Ok(items),
            Reply::Nil => Ok(Vec::new()),
            other => Err(other.unexpected("array")),
        }
    }

    /// Interpret as an array that may be absent (blocking pops).
    pub fn into_opt_array(self) -> Result<Option<Vec<Reply>>, StoreError> {
        match self {
            Reply::Nil => Ok(None),
            Reply::Array(items) => Ok(Some(items)),
            other => Err(other.unexpected("array")),
        }
    }
}

fn parse_number<T: std::str::FromStr>(raw: &[u8]) -> Result<T, StoreError> {
    let text = std::str::from_utf8(raw)
        .map_err(|_| StoreError::InvalidNumber("non-utf8 payload".into()))?;
    text.trim()
        .parse()
        .map_err(|_| StoreError::InvalidNumber(text.to_owned()))
}
