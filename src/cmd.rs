use std::time::Duration;

use bytes::Bytes;

use crate::frame::Frame;

/// Anything that can be sent as a single command argument.
pub trait ToArg {
    fn to_arg(&self) -> Bytes;
}

impl<T: ToArg + ?Sized> ToArg for &T {
    fn to_arg(&self) -> Bytes {
        (**self).to_arg()
    }
}

impl ToArg for str {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl ToArg for String {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl ToArg for [u8] {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl ToArg for Vec<u8> {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl ToArg for Bytes {
    fn to_arg(&self) -> Bytes {
        self.clone()
    }
}

macro_rules! integer_arg {
    ($($t:ty),*) => {
        $(
            impl ToArg for $t {
                fn to_arg(&self) -> Bytes {
                    Bytes::from(self.to_string())
                }
            }
        )*
    };
}

integer_arg!(i32, i64, isize, u32, u64, usize);

impl ToArg for f64 {
    fn to_arg(&self) -> Bytes {
        // The store spells infinities as `inf`/`-inf`, which matches `Display` for f64.
        Bytes::from(self.to_string())
    }
}

/// A single store command: its name, its arguments, and the key(s) it touches for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct Cmd {
    name: &'static str,
    args: Vec<Bytes>,
    keys: Vec<String>,
    block: Duration,
}

impl Cmd {
    pub fn new(name: &'static str) -> Cmd {
        Cmd {
            name,
            args: Vec::new(),
            keys: Vec::new(),
            block: Duration::ZERO,
        }
    }

    pub fn arg(mut self, arg: impl ToArg) -> Self {
        self.args.push(arg.to_arg());
        self
    }

    pub fn args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.args.extend(args.into_iter().map(|arg| arg.to_arg()));
        self
    }

    /// Appends an argument that names a key. Keys are recorded so failures and slow
    /// commands can be reported against them.
    pub fn key(mut self, key: impl ToArg) -> Self {
        let key = key.to_arg();
        self.keys.push(String::from_utf8_lossy(&key).into_owned());
        self.args.push(key);
        self
    }

    pub fn keys<I>(self, keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        keys.into_iter().fold(self, |cmd, key| cmd.key(key))
    }

    /// Marks the command as one the store may hold for up to `block` before replying,
    /// such as `BRPOP`. The reply deadline is extended by that amount.
    pub fn blocking(mut self, block: Duration) -> Self {
        self.block = block;
        self
    }

    pub fn block_time(&self) -> Duration {
        self.block
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn key_label(&self) -> String {
        self.keys.join(",")
    }

    pub fn into_frame(self) -> Frame {
        let mut frames = Vec::with_capacity(self.args.len() + 1);
        frames.push(Frame::Bulk(Bytes::from_static(self.name.as_bytes())));
        frames.extend(self.args.into_iter().map(Frame::Bulk));
        Frame::Array(frames)
    }
}
