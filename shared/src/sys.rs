/// Error codes handed back across the syscall boundary. Values match Linux errno numbers.
#[derive(strum::FromRepr, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(isize)]
pub enum Errno {
    Perm = 1,
    NoEnt = 2,
    Intr = 4,
    BadF = 9,
    NoMem = 12,
    Fault = 14,
    Exist = 17,
    NoDev = 19,
    Inval = 22,
    MFile = 24,
}

impl Errno {
    /// The negated errno, as returned by a failed syscall.
    pub const fn as_ret(self) -> isize {
        -(self as isize)
    }

    pub fn from_ret(ret: isize) -> Option<Self> {
        if ret < 0 {
            Self::from_repr(-ret)
        } else {
            None
        }
    }
}
