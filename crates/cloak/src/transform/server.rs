//! Connection and administrative commands.
//!
//! Administrative commands carry no application data. Only the ones listed
//! in [`AdminCommand`] are forwarded; anything else has no way to reach the
//! store through this crate.

use std::sync::Arc;

use bytes::Bytes;
use cloak_common::{Command, Reply};

use super::{opt_with, raw, Call};
use crate::crypto::{Cipher, Plaintext};
use crate::error::Result;

/// Administrative commands forwarded to the store verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Select(u32),
    DbSize,
    FlushDb,
    FlushAll,
    Info(Option<String>),
    LastSave,
    Save,
    BgSave,
    BgRewriteAof,
    Time,
    ConfigGet(String),
    ConfigSet(String, String),
    ClientGetName,
    /// Connection names are sent in the clear.
    ClientSetName(String),
    ClientList,
    SlowlogGet(Option<u32>),
    SlowlogLen,
    SlowlogReset,
    Quit,
    Unwatch,
    /// `SHUTDOWN [SAVE|NOSAVE]`. `None` leaves the choice to the server.
    Shutdown(Option<bool>),
    /// `SLAVEOF host port`, or `SLAVEOF NO ONE` with `None`.
    SlaveOf(Option<(String, u16)>),
    /// Replication stream. The payload is the store's own, still encrypted.
    Sync,
}

impl AdminCommand {
    pub fn into_command(self) -> Command {
        match self {
            AdminCommand::Select(db) => Command::new("SELECT").arg(db),
            AdminCommand::DbSize => Command::new("DBSIZE"),
            AdminCommand::FlushDb => Command::new("FLUSHDB"),
            AdminCommand::FlushAll => Command::new("FLUSHALL"),
            AdminCommand::Info(section) => {
                let cmd = Command::new("INFO");
                match section {
                    Some(section) => cmd.arg(section),
                    None => cmd,
                }
            }
            AdminCommand::LastSave => Command::new("LASTSAVE"),
            AdminCommand::Save => Command::new("SAVE"),
            AdminCommand::BgSave => Command::new("BGSAVE"),
            AdminCommand::BgRewriteAof => Command::new("BGREWRITEAOF"),
            AdminCommand::Time => Command::new("TIME"),
            AdminCommand::ConfigGet(param) => Command::new("CONFIG").arg("GET").arg(param),
            AdminCommand::ConfigSet(param, value) => {
                Command::new("CONFIG").arg("SET").arg(param).arg(value)
            }
            AdminCommand::ClientGetName => Command::new("CLIENT").arg("GETNAME"),
            AdminCommand::ClientSetName(name) => Command::new("CLIENT").arg("SETNAME").arg(name),
            AdminCommand::ClientList => Command::new("CLIENT").arg("LIST"),
            AdminCommand::SlowlogGet(count) => {
                let cmd = Command::new("SLOWLOG").arg("GET");
                match count {
                    Some(n) => cmd.arg(n),
                    None => cmd,
                }
            }
            AdminCommand::SlowlogLen => Command::new("SLOWLOG").arg("LEN"),
            AdminCommand::SlowlogReset => Command::new("SLOWLOG").arg("RESET"),
            AdminCommand::Quit => Command::new("QUIT"),
            AdminCommand::Unwatch => Command::new("UNWATCH"),
            AdminCommand::Shutdown(save) => match save {
                Some(true) => Command::new("SHUTDOWN").arg("SAVE"),
                Some(false) => Command::new("SHUTDOWN").arg("NOSAVE"),
                None => Command::new("SHUTDOWN"),
            },
            AdminCommand::SlaveOf(Some((host, port))) => {
                Command::new("SLAVEOF").arg(host).arg(u32::from(port))
            }
            AdminCommand::SlaveOf(None) => Command::new("SLAVEOF").arg("NO").arg("ONE"),
            AdminCommand::Sync => Command::new("SYNC"),
        }
    }
}

/// Forward an allow-listed administrative command. The reply is returned raw.
pub fn forward(command: AdminCommand) -> Call<Reply> {
    raw(command.into_command())
}

/// `PING [message]`. A message round-trips encrypted as a value; without one
/// the store's status reply is returned as bytes.
pub fn ping(cipher: &Arc<Cipher>, message: Option<&Plaintext>) -> Result<Call<Vec<u8>>> {
    let Some(message) = message else {
        return Ok(Call::new(Command::new("PING"), |r| {
            Ok(match r {
                Reply::Status(s) => s.into_bytes(),
                other => other.into_bulk()?.to_vec(),
            })
        }));
    };
    let command = Command::new("PING").arg(cipher.seal_value(message)?);
    let cipher = Arc::clone(cipher);
    Ok(Call::new(command, move |r| {
        Ok(opt_with(&cipher, r, Cipher::open_value)?.unwrap_or_default())
    }))
}

/// `ECHO message`, encrypted both ways.
pub fn echo(cipher: &Arc<Cipher>, message: &Plaintext) -> Result<Call<Vec<u8>>> {
    let command = Command::new("ECHO").arg(cipher.seal_value(message)?);
    let cipher = Arc::clone(cipher);
    Ok(Call::new(command, move |r| {
        let blob: Bytes = r.into_bulk()?;
        Ok(cipher.open_value(&blob)?)
    }))
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;

    #[test]
    fn admin_commands_render_verbatim() {
        let cmd = AdminCommand::ConfigSet("maxmemory".into(), "1gb".into()).into_command();
        assert_eq!(cmd.name(), "CONFIG");
        let args: Vec<&[u8]> = cmd.arguments().iter().map(|a| &a[..]).collect();
        let expected: [&[u8]; 3] = [b"SET", b"maxmemory", b"1gb"];
        assert_eq!(args, expected);

        assert_eq!(AdminCommand::Select(2).into_command().arguments()[0], "2");
        assert!(AdminCommand::Info(None).into_command().arguments().is_empty());
    }

    #[test]
    fn replication_and_shutdown_render_verbatim() {
        let args = |c: AdminCommand| -> Vec<String> {
            c.into_command()
                .arguments()
                .iter()
                .map(|a| String::from_utf8_lossy(a).into_owned())
                .collect()
        };
        assert_eq!(args(AdminCommand::SlaveOf(None)), ["NO", "ONE"]);
        assert_eq!(
            args(AdminCommand::SlaveOf(Some(("10.0.0.2".into(), 6380)))),
            ["10.0.0.2", "6380"]
        );
        assert_eq!(args(AdminCommand::Shutdown(Some(false))), ["NOSAVE"]);
        assert!(args(AdminCommand::Shutdown(None)).is_empty());
        assert_eq!(AdminCommand::Sync.into_command().name(), "SYNC");
    }

    #[test]
    fn bare_ping_returns_status() {
        let c = cipher();
        let call = ping(&c, None).unwrap();
        assert!(call.command().arguments().is_empty());
        assert_eq!(call.decode(Reply::Status("PONG".into())).unwrap(), b"PONG");
    }

    #[test]
    fn ping_and_echo_encrypt_payloads() {
        let c = cipher();
        let message = Plaintext::from("hello");
        let call = ping(&c, Some(&message)).unwrap();
        assert_ne!(arg(&call, 0), b"hello");
        let echoed = Reply::Bulk(call.command().arguments()[0].clone());
        assert_eq!(call.decode(echoed).unwrap(), b"hello");

        let call = echo(&c, &message).unwrap();
        let echoed = Reply::Bulk(call.command().arguments()[0].clone());
        assert_eq!(call.decode(echoed).unwrap(), b"hello");
    }

    #[test]
    fn forward_returns_reply_untouched() {
        let reply = forward(AdminCommand::DbSize).decode(Reply::Int(12)).unwrap();
        assert_eq!(reply, Reply::Int(12));
    }
}
