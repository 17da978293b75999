use bitflags::bitflags;

bitflags! {
    /// Access intent of an open request, the equivalent of `FMODE_READ` / `FMODE_WRITE`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenFlags: u32 {
        /// Open for reading
        const Read = 1 << 0;
        /// Open for writing
        const Write = 1 << 1;
        /// Open for reading and writing
        const ReadWrite = Self::Read.bits() | Self::Write.bits();
    }
}

/// Access mode values of the raw `open` flags.
pub const O_RDONLY: u32 = 0;
pub const O_WRONLY: u32 = 1;
pub const O_RDWR: u32 = 2;
pub const O_ACCMODE: u32 = 3;

impl OpenFlags {
    /// Decodes the access mode of raw `open` flags, ignoring every other bit. `None` for the
    /// invalid mode 3.
    pub fn from_open_flags(flags: u32) -> Option<Self> {
        match flags & O_ACCMODE {
            O_RDONLY => Some(Self::Read),
            O_WRONLY => Some(Self::Write),
            O_RDWR => Some(Self::ReadWrite),
            _ => None,
        }
    }

    pub fn read_only(self) -> bool {
        self.contains(Self::Read) && !self.contains(Self::Write)
    }

    pub fn write_only(self) -> bool {
        self.contains(Self::Write) && !self.contains(Self::Read)
    }
}

/// Reference point of a seek, numbered like `SEEK_SET`, `SEEK_CUR` and `SEEK_END`.
#[derive(strum::FromRepr, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Whence {
    Start = 0,
    Current = 1,
    End = 2,
}
