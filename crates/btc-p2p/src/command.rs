//! The 12-byte command tag of a wire message.

use std::fmt;

/// A message command: ASCII, right-padded with NUL to 12 bytes.
///
/// Commands compare and hash by their raw tag, so unknown commands can
/// be carried through the codec and logged without loss.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Command([u8; 12]);

impl Command {
    /// The `verack` command.
    pub const VERACK: Command = Command::from_static(b"verack");
    /// The `ping` command.
    pub const PING: Command = Command::from_static(b"ping");
    /// The `pong` command.
    pub const PONG: Command = Command::from_static(b"pong");
    /// The `inv` command.
    pub const INV: Command = Command::from_static(b"inv");
    /// The `getdata` command.
    pub const GETDATA: Command = Command::from_static(b"getdata");
    /// The `mempool` command.
    pub const MEMPOOL: Command = Command::from_static(b"mempool");

    /// Build a command from a static name of at most 12 bytes.
    const fn from_static(name: &[u8]) -> Command {
        let mut tag = [0u8; 12];
        let mut i = 0;
        while i < name.len() {
            tag[i] = name[i];
            i += 1;
        }
        Command(tag)
    }

    /// Build a command from a raw wire tag.
    pub fn from_wire(tag: [u8; 12]) -> Command {
        Command(tag)
    }

    /// The raw 12-byte tag.
    pub fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }

    /// The command name: the bytes before the first NUL, when they are
    /// printable ASCII.
    pub fn name(&self) -> Option<&str> {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(12);
        // Padding after the first NUL must also be NUL.
        if self.0[end..].iter().any(|&b| b != 0) {
            return None;
        }
        let head = &self.0[..end];
        if head.iter().all(|&b| (0x20..0x7f).contains(&b)) {
            std::str::from_utf8(head).ok()
        } else {
            None
        }
    }

    /// Whether the tag satisfies the wire invariant: printable ASCII
    /// followed by NUL padding only.
    pub fn is_well_formed(&self) -> bool {
        self.name().is_some()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "0x{}", hex::encode(self.0)),
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command({})", self)
    }
}

impl From<&str> for Command {
    /// Build a command from a name; anything past 12 bytes is truncated.
    fn from(name: &str) -> Self {
        let mut tag = [0u8; 12];
        let bytes = name.as_bytes();
        let len = bytes.len().min(12);
        tag[..len].copy_from_slice(&bytes[..len]);
        Command(tag)
    }
}
