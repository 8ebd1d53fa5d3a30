//! # Errno
//!
//! The 77 WASI error numbers. The numbering is the wire contract between the
//! shim and every guest libc; a value returned in a result slot is read back
//! by the guest as exactly one of these.

macro_rules! errnos {
    ( $( $variant:ident = $value:literal => $abi:literal, $desc:literal; )* ) => {
        /// Error codes returned by every `wasi_snapshot_preview1` function.
        #[repr(u16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Errno {
            $( $variant = $value, )*
        }

        impl Errno {
            /// Every errno, in numeric order.
            pub const ALL: &'static [Errno] = &[ $( Errno::$variant, )* ];

            pub fn from_raw(raw: u16) -> Option<Self> {
                match raw {
                    $( $value => Some(Errno::$variant), )*
                    _ => None,
                }
            }

            /// ABI spelling, e.g. `"e_2big"`.
            pub fn name(self) -> &'static str {
                match self {
                    $( Errno::$variant => $abi, )*
                }
            }

            /// Human-readable meaning.
            pub fn description(self) -> &'static str {
                match self {
                    $( Errno::$variant => $desc, )*
                }
            }
        }
    };
}

errnos! {
    Success = 0 => "e_success", "No error occurred. System call completed successfully.";
    TooBig = 1 => "e_2big", "Argument list too long.";
    Acces = 2 => "e_acces", "Permission denied.";
    Addrinuse = 3 => "e_addrinuse", "Address in use.";
    Addrnotavail = 4 => "e_addrnotavail", "Address not available.";
    Afnosupport = 5 => "e_afnosupport", "Address family not supported.";
    Again = 6 => "e_again", "Resource unavailable, or operation would block.";
    Already = 7 => "e_already", "Connection already in progress.";
    Badf = 8 => "e_badf", "Bad file descriptor.";
    Badmsg = 9 => "e_badmsg", "Bad message.";
    Busy = 10 => "e_busy", "Device or resource busy.";
    Canceled = 11 => "e_canceled", "Operation canceled.";
    Child = 12 => "e_child", "No child processes.";
    Connaborted = 13 => "e_connaborted", "Connection aborted.";
    Connrefused = 14 => "e_connrefused", "Connection refused.";
    Connreset = 15 => "e_connreset", "Connection reset.";
    Deadlk = 16 => "e_deadlk", "Resource deadlock would occur.";
    Destaddrreq = 17 => "e_destaddrreq", "Destination address required.";
    Dom = 18 => "e_dom", "Mathematics argument out of domain of function.";
    Dquot = 19 => "e_dquot", "Reserved.";
    Exist = 20 => "e_exist", "File exists.";
    Fault = 21 => "e_fault", "Bad address.";
    Fbig = 22 => "e_fbig", "File too large.";
    Hostunreach = 23 => "e_hostunreach", "Host is unreachable.";
    Idrm = 24 => "e_idrm", "Identifier removed.";
    Ilseq = 25 => "e_ilseq", "Illegal byte sequence.";
    Inprogress = 26 => "e_inprogress", "Operation in progress.";
    Intr = 27 => "e_intr", "Interrupted function.";
    Inval = 28 => "e_inval", "Invalid argument.";
    Io = 29 => "e_io", "I/O error.";
    Isconn = 30 => "e_isconn", "Socket is connected.";
    Isdir = 31 => "e_isdir", "Is a directory.";
    Loop = 32 => "e_loop", "Too many levels of symbolic links.";
    Mfile = 33 => "e_mfile", "File descriptor value too large.";
    Mlink = 34 => "e_mlink", "Too many links.";
    Msgsize = 35 => "e_msgsize", "Message too large.";
    Multihop = 36 => "e_multihop", "Reserved.";
    Nametoolong = 37 => "e_nametoolong", "Filename too long.";
    Netdown = 38 => "e_netdown", "Network is down.";
    Netreset = 39 => "e_netreset", "Connection aborted by network.";
    Netunreach = 40 => "e_netunreach", "Network unreachable.";
    Nfile = 41 => "e_nfile", "Too many files open in system.";
    Nobufs = 42 => "e_nobufs", "No buffer space available.";
    Nodev = 43 => "e_nodev", "No such device.";
    Noent = 44 => "e_noent", "No such file or directory.";
    Noexec = 45 => "e_noexec", "Executable file format error.";
    Nolck = 46 => "e_nolck", "No locks available.";
    Nolink = 47 => "e_nolink", "Reserved.";
    Nomem = 48 => "e_nomem", "Not enough space.";
    Nomsg = 49 => "e_nomsg", "No message of the desired type.";
    Noprotoopt = 50 => "e_noprotoopt", "Protocol not available.";
    Nospc = 51 => "e_nospc", "No space left on device.";
    Nosys = 52 => "e_nosys", "Function not supported.";
    Notconn = 53 => "e_notconn", "The socket is not connected.";
    Notdir = 54 => "e_notdir", "Not a directory or a symbolic link to a directory.";
    Notempty = 55 => "e_notempty", "Directory not empty.";
    Notrecoverable = 56 => "e_notrecoverable", "State not recoverable.";
    Notsock = 57 => "e_notsock", "Not a socket.";
    Notsup = 58 => "e_notsup", "Not supported, or operation not supported on socket.";
    Notty = 59 => "e_notty", "Inappropriate I/O control operation.";
    Nxio = 60 => "e_nxio", "No such device or address.";
    Overflow = 61 => "e_overflow", "Value too large to be stored in data type.";
    Ownerdead = 62 => "e_ownerdead", "Previous owner died.";
    Perm = 63 => "e_perm", "Operation not permitted.";
    Pipe = 64 => "e_pipe", "Broken pipe.";
    Proto = 65 => "e_proto", "Protocol error.";
    Protonosupport = 66 => "e_protonosupport", "Protocol not supported.";
    Prototype = 67 => "e_prototype", "Protocol wrong type for socket.";
    Range = 68 => "e_range", "Result too large.";
    Rofs = 69 => "e_rofs", "Read-only file system.";
    Spipe = 70 => "e_spipe", "Invalid seek.";
    Srch = 71 => "e_srch", "No such process.";
    Stale = 72 => "e_stale", "Reserved.";
    Timedout = 73 => "e_timedout", "Connection timed out.";
    Txtbsy = 74 => "e_txtbsy", "Text file busy.";
    Xdev = 75 => "e_xdev", "Cross-device link.";
    Notcapable = 76 => "e_notcapable", "Extension: Capabilities insufficient.";
}

impl Errno {
    /// The wire value.
    #[inline]
    pub fn raw(self) -> u16 {
        self as u16
    }

    /// The value as written into an `i32` result slot.
    #[inline]
    pub fn as_i32(self) -> i32 {
        self as u16 as i32
    }

    pub fn is_success(self) -> bool {
        self == Errno::Success
    }
}

impl Default for Errno {
    fn default() -> Self {
        Errno::Success
    }
}

impl std::fmt::Display for Errno {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description(), self.name())
    }
}

impl std::error::Error for Errno {}
