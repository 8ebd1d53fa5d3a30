//! Closed ABI enumerations.

wasi_enum! {
    /// Identifiers for clocks.
    pub enum Clockid: u32 {
        Realtime = 0 => "realtime",
        Monotonic = 1 => "monotonic",
        ProcessCputimeId = 2 => "process_cputime_id",
        ThreadCputimeId = 3 => "thread_cputime_id",
    }
}

wasi_enum! {
    /// The type of a file descriptor or file.
    pub enum Filetype: u8 {
        Unknown = 0 => "unknown",
        BlockDevice = 1 => "block_device",
        CharacterDevice = 2 => "character_device",
        Directory = 3 => "directory",
        RegularFile = 4 => "regular_file",
        SocketDgram = 5 => "socket_dgram",
        SocketStream = 6 => "socket_stream",
        SymbolicLink = 7 => "symbolic_link",
    }
}

wasi_enum! {
    /// The position relative to which to set the offset of a descriptor.
    pub enum Whence: u8 {
        Set = 0 => "set",
        Cur = 1 => "cur",
        End = 2 => "end",
    }
}

wasi_enum! {
    /// File or memory access pattern advisory information.
    pub enum Advice: u8 {
        Normal = 0 => "normal",
        Sequential = 1 => "sequential",
        Random = 2 => "random",
        Willneed = 3 => "willneed",
        Dontneed = 4 => "dontneed",
        Noreuse = 5 => "noreuse",
    }
}

wasi_enum! {
    /// Identifiers for preopened capabilities.
    pub enum Preopentype: u8 {
        Dir = 0 => "dir",
    }
}

wasi_enum! {
    /// Type of a subscription to an event or its occurrence.
    pub enum Eventtype: u8 {
        Clock = 0 => "clock",
        FdRead = 1 => "fd_read",
        FdWrite = 2 => "fd_write",
    }
}
