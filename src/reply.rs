use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::str;

use bytes::Bytes;
use itertools::Itertools;

use crate::frame::Frame;
use crate::{Error, Result};

/// Converts a reply frame into the value type a command declares.
///
/// Nullable replies decode into `Option<T>`, so an absent key (`Ok(None)`) can never be
/// confused with a failed command (`Err`).
pub trait FromFrame: Sized {
    fn from_frame(frame: Frame) -> Result<Self>;
}

impl FromFrame for Frame {
    fn from_frame(frame: Frame) -> Result<Self> {
        Ok(frame)
    }
}

/// Status replies such as `+OK`.
impl FromFrame for () {
    fn from_frame(frame: Frame) -> Result<Self> {
        match frame {
            Frame::Simple(_) => Ok(()),
            frame => Err(Error::unexpected("status reply", frame)),
        }
    }
}

impl FromFrame for i64 {
    fn from_frame(frame: Frame) -> Result<Self> {
        match frame {
            Frame::Integer(i) => Ok(i),
            Frame::Bulk(ref bytes) => match parse_str(bytes).and_then(|s| s.parse().ok()) {
                Some(i) => Ok(i),
                None => Err(Error::unexpected("integer", frame)),
            },
            frame => Err(Error::unexpected("integer", frame)),
        }
    }
}

impl FromFrame for bool {
    fn from_frame(frame: Frame) -> Result<Self> {
        match frame {
            Frame::Integer(0) => Ok(false),
            Frame::Integer(1) => Ok(true),
            frame => Err(Error::unexpected("integer 0 or 1", frame)),
        }
    }
}

/// Floating point replies travel as bulk strings, e.g. `INCRBYFLOAT` or `ZSCORE`.
impl FromFrame for f64 {
    fn from_frame(frame: Frame) -> Result<Self> {
        match frame {
            Frame::Integer(i) => Ok(i as f64),
            Frame::Bulk(ref bytes) => match parse_str(bytes).and_then(|s| s.parse().ok()) {
                Some(f) => Ok(f),
                None => Err(Error::unexpected("floating point number", frame)),
            },
            Frame::Simple(ref s) => match s.parse() {
                Ok(f) => Ok(f),
                Err(_) => Err(Error::unexpected("floating point number", frame)),
            },
            frame => Err(Error::unexpected("floating point number", frame)),
        }
    }
}

impl FromFrame for String {
    fn from_frame(frame: Frame) -> Result<Self> {
        match frame {
            Frame::Simple(s) => Ok(s),
            Frame::Bulk(bytes) => match String::from_utf8(bytes.to_vec()) {
                Ok(s) => Ok(s),
                Err(_) => Err(Error::unexpected("UTF-8 string", Frame::Bulk(bytes))),
            },
            Frame::Integer(i) => Ok(i.to_string()),
            frame => Err(Error::unexpected("string", frame)),
        }
    }
}

impl FromFrame for Bytes {
    fn from_frame(frame: Frame) -> Result<Self> {
        match frame {
            Frame::Bulk(bytes) => Ok(bytes),
            Frame::Simple(s) => Ok(Bytes::from(s)),
            frame => Err(Error::unexpected("bulk string", frame)),
        }
    }
}

impl<T: FromFrame> FromFrame for Option<T> {
    fn from_frame(frame: Frame) -> Result<Self> {
        match frame {
            Frame::Null => Ok(None),
            frame => T::from_frame(frame).map(Some),
        }
    }
}

impl<T: FromFrame> FromFrame for Vec<T> {
    fn from_frame(frame: Frame) -> Result<Self> {
        match frame {
            Frame::Array(items) => items.into_iter().map(T::from_frame).collect(),
            Frame::Null => Ok(Vec::new()),
            frame => Err(Error::unexpected("array", frame)),
        }
    }
}

impl<T: FromFrame + Eq + Hash> FromFrame for HashSet<T> {
    fn from_frame(frame: Frame) -> Result<Self> {
        match frame {
            Frame::Array(items) => items.into_iter().map(T::from_frame).collect(),
            Frame::Null => Ok(HashSet::new()),
            frame => Err(Error::unexpected("array", frame)),
        }
    }
}

/// Flat `[field, value, field, value, ...]` replies, e.g. `HGETALL`.
impl<K, V> FromFrame for HashMap<K, V>
where
    K: FromFrame + Eq + Hash,
    V: FromFrame,
{
    fn from_frame(frame: Frame) -> Result<Self> {
        Ok(pairs(frame)?.into_iter().collect())
    }
}

/// Decodes a flat array into consecutive pairs, keeping the store's order. Used for
/// `HGETALL` and `WITHSCORES` replies.
pub fn pairs<A: FromFrame, B: FromFrame>(frame: Frame) -> Result<Vec<(A, B)>> {
    let items = match frame {
        Frame::Array(items) => items,
        Frame::Null => return Ok(Vec::new()),
        frame => return Err(Error::unexpected("array of pairs", frame)),
    };

    if items.len() % 2 != 0 {
        return Err(Error::unexpected(
            "array with an even number of elements",
            Frame::Array(items),
        ));
    }

    items
        .into_iter()
        .tuples()
        .map(|(a, b)| Ok((A::from_frame(a)?, B::from_frame(b)?)))
        .collect()
}

fn parse_str(bytes: &Bytes) -> Option<&str> {
    str::from_utf8(bytes).ok()
}
