//! # Context
//!
//! Per-instance state stored in the `wasmtime::Store`: the guest's argv and
//! environment, its descriptor table, the policy for unsupported calls, and
//! the diagnostics counters. Built once through [`ContextBuilder`] before the
//! store exists; each instance gets its own.

use std::collections::BTreeMap;
use std::io::Read;
use std::io::Write;
use std::sync::Arc;
use std::sync::Mutex;

use shimabi::Errno;
use shimabi::Fd;
use shimabi::Fdflags;
use shimabi::Fdstat;
use shimabi::Filetype;
use shimabi::Rights;

use crate::diagnostics::Diagnostics;

/// How calls to functions without a host implementation are answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnsupportedPolicy {
    /// Return `e_nosys`.
    #[default]
    Nosys,
    /// Return `e_success` without writing any outputs.
    PretendSuccess,
    /// Trap the guest.
    Trap,
}

impl std::str::FromStr for UnsupportedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nosys" => Ok(Self::Nosys),
            "success" => Ok(Self::PretendSuccess),
            "trap" => Ok(Self::Trap),
            other => Err(format!("unknown policy '{}', expected nosys, success or trap", other)),
        }
    }
}

impl std::fmt::Display for UnsupportedPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nosys => write!(f, "nosys"),
            Self::PretendSuccess => write!(f, "success"),
            Self::Trap => write!(f, "trap"),
        }
    }
}

/// An in-memory byte sink that can be handed to a context and read back later.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// The host object behind a descriptor.
pub enum Stream {
    Reader(Box<dyn Read + Send>),
    Writer(Box<dyn Write + Send>),
}

/// One open descriptor.
pub struct FdEntry {
    pub filetype: Filetype,
    pub flags: Fdflags,
    pub rights_base: Rights,
    pub rights_inheriting: Rights,
    pub(crate) stream: Stream,
}

impl FdEntry {
    /// A character device with TTY rights, as used for stdio.
    pub fn tty(stream: Stream) -> Self {
        Self {
            filetype: Filetype::CharacterDevice,
            flags: Fdflags::empty(),
            rights_base: Rights::TTY_BASE,
            rights_inheriting: Rights::TTY_INHERITING,
            stream,
        }
    }

    pub fn fdstat(&self) -> Fdstat {
        Fdstat {
            fs_filetype: self.filetype,
            fs_flags: self.flags,
            fs_rights_base: self.rights_base,
            fs_rights_inheriting: self.rights_inheriting,
        }
    }

    /// Replaces the rights with a subset of the current ones.
    ///
    /// Any attempt to add a right fails with `e_notcapable` and changes nothing.
    pub fn narrow_rights(&mut self, base: Rights, inheriting: Rights) -> Result<(), Errno> {
        Rights::require(self.rights_base, base)?;
        Rights::require(self.rights_inheriting, inheriting)?;
        self.rights_base = Rights::derive(self.rights_base, base);
        self.rights_inheriting = Rights::derive(self.rights_inheriting, inheriting);
        Ok(())
    }
}

/// Descriptor table. Lookups of closed or never-opened descriptors fail with `e_badf`.
#[derive(Default)]
pub struct FdTable {
    entries: BTreeMap<Fd, FdEntry>,
}

impl FdTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, fd: Fd, entry: FdEntry) -> Option<FdEntry> {
        self.entries.insert(fd, entry)
    }

    pub fn get(&self, fd: Fd) -> Result<&FdEntry, Errno> {
        self.entries.get(&fd).ok_or(Errno::Badf)
    }

    pub fn get_mut(&mut self, fd: Fd) -> Result<&mut FdEntry, Errno> {
        self.entries.get_mut(&fd).ok_or(Errno::Badf)
    }

    pub fn remove(&mut self, fd: Fd) -> Result<FdEntry, Errno> {
        self.entries.remove(&fd).ok_or(Errno::Badf)
    }

    pub fn contains(&self, fd: Fd) -> bool {
        self.entries.contains_key(&fd)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Staging area for a [`ShimCtx`].
pub struct ContextBuilder {
    args: Vec<String>,
    env: Vec<(String, String)>,
    stdin: Option<Box<dyn Read + Send>>,
    stdout: Option<Box<dyn Write + Send>>,
    stderr: Option<Box<dyn Write + Send>>,
    policy: UnsupportedPolicy,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self {
            args: Vec::new(),
            env: Vec::new(),
            stdin: None,
            stdout: None,
            stderr: None,
            policy: UnsupportedPolicy::default(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env.extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Appends the host process environment. Variables that are not valid
    /// UTF-8 are skipped.
    pub fn inherit_env(mut self) -> Self {
        self.env.extend(
            std::env::vars_os().filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?))),
        );
        self
    }

    pub fn stdin(mut self, reader: impl Read + Send + 'static) -> Self {
        self.stdin = Some(Box::new(reader));
        self
    }

    pub fn stdout(mut self, writer: impl Write + Send + 'static) -> Self {
        self.stdout = Some(Box::new(writer));
        self
    }

    pub fn stderr(mut self, writer: impl Write + Send + 'static) -> Self {
        self.stderr = Some(Box::new(writer));
        self
    }

    pub fn unsupported_policy(mut self, policy: UnsupportedPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> ShimCtx {
        let mut fds = FdTable::new();
        let stdin = self.stdin.unwrap_or_else(|| Box::new(std::io::stdin()));
        let stdout = self.stdout.unwrap_or_else(|| Box::new(std::io::stdout()));
        let stderr = self.stderr.unwrap_or_else(|| Box::new(std::io::stderr()));
        fds.insert(0, FdEntry::tty(Stream::Reader(stdin)));
        fds.insert(1, FdEntry::tty(Stream::Writer(stdout)));
        fds.insert(2, FdEntry::tty(Stream::Writer(stderr)));

        // A later entry for the same key replaces the earlier value in place.
        let mut env: Vec<(String, String)> = Vec::with_capacity(self.env.len());
        for (key, value) in self.env {
            match env.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => env.push((key, value)),
            }
        }

        ShimCtx {
            args: self.args,
            env: env.into_iter().map(|(k, v)| format!("{}={}", k, v)).collect(),
            fds,
            policy: self.policy,
            diagnostics: Diagnostics::new(),
        }
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Store data for an instance running against the shim.
pub struct ShimCtx {
    pub(crate) args: Vec<String>,
    pub(crate) env: Vec<String>,
    pub(crate) fds: FdTable,
    pub(crate) policy: UnsupportedPolicy,
    pub(crate) diagnostics: Diagnostics,
}

impl ShimCtx {
    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Environment entries in `KEY=VALUE` form.
    pub fn env(&self) -> &[String] {
        &self.env
    }

    pub fn fds(&self) -> &FdTable {
        &self.fds
    }

    pub fn fds_mut(&mut self) -> &mut FdTable {
        &mut self.fds
    }

    pub fn policy(&self) -> UnsupportedPolicy {
        self.policy
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let ctx = ContextBuilder::new().build();
        assert!(ctx.args().is_empty());
        assert!(ctx.env().is_empty());
        assert_eq!(ctx.policy(), UnsupportedPolicy::Nosys);
        assert_eq!(ctx.fds().len(), 3);
        for fd in 0..3 {
            let entry = ctx.fds().get(fd).unwrap();
            assert_eq!(entry.filetype, Filetype::CharacterDevice);
            assert_eq!(entry.rights_base, Rights::TTY_BASE);
            assert_eq!(entry.rights_inheriting, Rights::TTY_INHERITING);
        }
        assert_eq!(ctx.fds().get(3).err(), Some(Errno::Badf));
    }

    #[test]
    fn test_builder_args_and_env() {
        let ctx = ShimCtx::builder()
            .arg("prog.wasm")
            .args(["a", "bc"])
            .env("HOME", "/home/guest")
            .envs([("A", "1")])
            .unsupported_policy(UnsupportedPolicy::Trap)
            .build();
        assert_eq!(ctx.args(), &["prog.wasm", "a", "bc"]);
        assert_eq!(ctx.env(), &["HOME=/home/guest", "A=1"]);
        assert_eq!(ctx.policy(), UnsupportedPolicy::Trap);
    }

    #[test]
    fn test_later_env_entry_wins() {
        let ctx = ContextBuilder::new()
            .env("A", "1")
            .env("B", "2")
            .env("A", "3")
            .build();
        assert_eq!(ctx.env(), &["A=3", "B=2"]);
    }

    #[test]
    fn test_explicit_env_overrides_inherited() {
        let Some((key, _)) = std::env::vars().find(|(_, v)| v != "guest") else {
            return;
        };
        let ctx = ContextBuilder::new().inherit_env().env(key.as_str(), "guest").build();
        let prefix = format!("{}=", key);
        let matches: Vec<&str> = ctx
            .env()
            .iter()
            .filter(|e| e.starts_with(&prefix))
            .map(String::as_str)
            .collect();
        assert_eq!(matches, [format!("{}guest", prefix).as_str()]);
    }

    #[test]
    fn test_narrow_rights_never_widens() {
        let mut entry = FdEntry::tty(Stream::Writer(Box::new(SharedBuffer::new())));
        assert_eq!(
            entry.narrow_rights(Rights::TTY_BASE | Rights::FD_SEEK, Rights::empty()),
            Err(Errno::Notcapable)
        );
        assert_eq!(entry.rights_base, Rights::TTY_BASE);

        assert_eq!(entry.narrow_rights(Rights::FD_WRITE, Rights::empty()), Ok(()));
        assert_eq!(entry.rights_base, Rights::FD_WRITE);
        assert_eq!(
            entry.narrow_rights(Rights::FD_WRITE | Rights::FD_READ, Rights::empty()),
            Err(Errno::Notcapable)
        );
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("nosys".parse::<UnsupportedPolicy>(), Ok(UnsupportedPolicy::Nosys));
        assert_eq!("success".parse::<UnsupportedPolicy>(), Ok(UnsupportedPolicy::PretendSuccess));
        assert_eq!("trap".parse::<UnsupportedPolicy>(), Ok(UnsupportedPolicy::Trap));
        assert!("ignore".parse::<UnsupportedPolicy>().is_err());
        assert_eq!(UnsupportedPolicy::PretendSuccess.to_string(), "success");
    }

    #[test]
    fn test_shared_buffer_clones_share_storage() {
        let buffer = SharedBuffer::new();
        let mut writer = buffer.clone();
        writer.write_all(b"hello").unwrap();
        assert_eq!(buffer.contents(), b"hello");
        assert_eq!(buffer.to_string_lossy(), "hello");
    }
}
