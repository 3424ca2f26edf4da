//! In-process store speaking the wire protocol, for integration tests.
//!
//! Keys with special prefixes inject faults:
//! - `fault:...` closes the connection without replying,
//! - `garbage:...` replies with bytes that are not a valid frame,
//! - `slow:<ms>:...` delays the reply by `<ms>` milliseconds.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::net::SocketAddr;
use std::str;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;

use kvpool::codec::FrameCodec;
use kvpool::{Frame, PoolConfig};

const WRONGTYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";
const NOT_INTEGER: &str = "ERR value is not an integer or out of range";
const NOT_FLOAT: &str = "ERR value is not a valid float";

pub struct FakeStore {
    addr: SocketAddr,
    shared: Arc<Shared>,
    accept: JoinHandle<()>,
}

impl FakeStore {
    pub async fn start() -> FakeStore {
        FakeStore::spawn(None).await
    }

    /// A store that rejects every command until the client sent `AUTH <password>`.
    pub async fn with_password(password: &str) -> FakeStore {
        FakeStore::spawn(Some(password.to_string())).await
    }

    async fn spawn(password: Option<String>) -> FakeStore {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (kill, _) = watch::channel(0u64);
        let shared = Arc::new(Shared {
            data: Mutex::new(HashMap::new()),
            ttls: Mutex::new(HashMap::new()),
            log: Mutex::new(Vec::new()),
            subscribers: Mutex::new(Vec::new()),
            password,
            accepted: AtomicUsize::new(0),
            kill,
        });

        let accept = tokio::spawn({
            let shared = shared.clone();
            async move {
                while let Ok((socket, _)) = listener.accept().await {
                    tokio::spawn(serve(socket, shared.clone()));
                }
            }
        });

        FakeStore {
            addr,
            shared,
            accept,
        }
    }

    /// Pool settings pointing at this store, with timeouts short enough for tests.
    pub fn config(&self) -> PoolConfig {
        PoolConfig {
            host: self.addr.ip().to_string(),
            port: self.addr.port(),
            max_wait_ms: 2_000,
            connect_timeout_ms: 2_000,
            ..Default::default()
        }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Every command received so far, as `[NAME, arg, ...]`.
    pub fn commands(&self) -> Vec<Vec<String>> {
        self.shared.log.lock().unwrap().clone()
    }

    pub fn commands_named(&self, name: &str) -> Vec<Vec<String>> {
        self.commands()
            .into_iter()
            .filter(|cmd| cmd[0] == name)
            .collect()
    }

    /// Number of connections accepted so far.
    pub fn connections(&self) -> usize {
        self.shared.accepted.load(Ordering::SeqCst)
    }

    /// Closes every open connection from the store side.
    pub fn kill_connections(&self) {
        self.shared.kill.send_modify(|generation| *generation += 1);
    }
}

impl Drop for FakeStore {
    fn drop(&mut self) {
        self.accept.abort();
    }
}

enum Value {
    Str(Bytes),
    Set(HashSet<Bytes>),
    ZSet(Vec<(f64, Bytes)>),
    Hash(HashMap<Bytes, Bytes>),
    List(VecDeque<Bytes>),
}

struct Subscriber {
    conn: usize,
    channel: String,
    push: mpsc::UnboundedSender<Frame>,
}

struct Shared {
    data: Mutex<HashMap<String, Value>>,
    /// Time to live per key in milliseconds. Nothing expires on its own.
    ttls: Mutex<HashMap<String, u64>>,
    log: Mutex<Vec<Vec<String>>>,
    subscribers: Mutex<Vec<Subscriber>>,
    password: Option<String>,
    accepted: AtomicUsize,
    kill: watch::Sender<u64>,
}

struct Session {
    id: usize,
    authenticated: bool,
    push: mpsc::UnboundedSender<Frame>,
}

enum Reply {
    Frames(Vec<Frame>),
    Raw(&'static [u8]),
    Hangup,
}

async fn serve(socket: TcpStream, shared: Arc<Shared>) {
    let id = shared.accepted.fetch_add(1, Ordering::SeqCst);
    let mut framed = Framed::new(socket, FrameCodec::new());
    let (push, mut pushed) = mpsc::unbounded_channel();
    let mut kill = shared.kill.subscribe();
    let mut session = Session {
        id,
        authenticated: shared.password.is_none(),
        push,
    };

    loop {
        tokio::select! {
            frame = framed.next() => {
                let Some(Ok(frame)) = frame else {
                    break;
                };
                match shared.execute(&mut session, frame).await {
                    Reply::Frames(frames) => {
                        for frame in frames {
                            if framed.send(frame).await.is_err() {
                                break;
                            }
                        }
                    }
                    Reply::Raw(bytes) => {
                        if framed.get_mut().write_all(bytes).await.is_err() {
                            break;
                        }
                    }
                    Reply::Hangup => break,
                }
            }
            Some(frame) = pushed.recv() => {
                if framed.send(frame).await.is_err() {
                    break;
                }
            }
            _ = kill.changed() => break,
        }
    }

    shared
        .subscribers
        .lock()
        .unwrap()
        .retain(|sub| sub.conn != id);
}

impl Shared {
    async fn execute(&self, session: &mut Session, frame: Frame) -> Reply {
        let Frame::Array(items) = frame else {
            return Reply::Frames(vec![error("ERR expected an array of bulk strings")]);
        };
        let args: Vec<Bytes> = items
            .into_iter()
            .filter_map(|item| match item {
                Frame::Bulk(bytes) => Some(bytes),
                _ => None,
            })
            .collect();
        let Some((name, args)) = args.split_first() else {
            return Reply::Frames(vec![error("ERR empty command")]);
        };
        let name = text(name).to_ascii_uppercase();

        let mut entry = vec![name.clone()];
        entry.extend(args.iter().map(text));
        self.log.lock().unwrap().push(entry);

        if let Some(key) = args.first().map(text) {
            if key.starts_with("fault:") {
                return Reply::Hangup;
            }
            if key.starts_with("garbage:") {
                return Reply::Raw(b"?garbage\r\n");
            }
            if let Some(delay) = slow_delay(&key) {
                tokio::time::sleep(delay).await;
            }
        }

        if !session.authenticated && name != "AUTH" {
            return Reply::Frames(vec![error("NOAUTH Authentication required.")]);
        }

        match name.as_str() {
            "SUBSCRIBE" => Reply::Frames(self.subscribe(session, args)),
            "UNSUBSCRIBE" => {
                self.subscribers
                    .lock()
                    .unwrap()
                    .retain(|sub| sub.conn != session.id);
                Reply::Frames(vec![Frame::Array(vec![
                    bulk("unsubscribe"),
                    Frame::Null,
                    Frame::Integer(0),
                ])])
            }
            "PUBLISH" if args.len() == 2 => {
                Reply::Frames(vec![Frame::Integer(self.publish(&text(&args[0]), &args[1]))])
            }
            _ => Reply::Frames(vec![self.apply(session, &name, args)]),
        }
    }

    fn subscribe(&self, session: &Session, channels: &[Bytes]) -> Vec<Frame> {
        let mut subscribers = self.subscribers.lock().unwrap();
        let mut confirmations = Vec::new();

        for channel in channels.iter().map(text) {
            subscribers.push(Subscriber {
                conn: session.id,
                channel: channel.clone(),
                push: session.push.clone(),
            });
            let count = subscribers
                .iter()
                .filter(|sub| sub.conn == session.id)
                .count();
            confirmations.push(Frame::Array(vec![
                bulk("subscribe"),
                bulk(&channel),
                Frame::Integer(count as i64),
            ]));
        }

        confirmations
    }

    fn publish(&self, channel: &str, payload: &Bytes) -> i64 {
        let subscribers = self.subscribers.lock().unwrap();
        subscribers
            .iter()
            .filter(|sub| sub.channel == channel)
            .filter(|sub| {
                let message =
                    Frame::Array(vec![bulk("message"), bulk(channel), Frame::Bulk(payload.clone())]);
                sub.push.send(message).is_ok()
            })
            .count() as i64
    }

    fn apply(&self, session: &mut Session, name: &str, args: &[Bytes]) -> Frame {
        let mut data = self.data.lock().unwrap();
        let mut ttls = self.ttls.lock().unwrap();
        let key = args.first().map(text).unwrap_or_default();

        match (name, args.len()) {
            ("PING", 0) => Frame::Simple("PONG".to_string()),
            ("ECHO", 1) => Frame::Bulk(args[0].clone()),
            ("AUTH", 1) => match &self.password {
                Some(password) if password.as_bytes() == &args[0][..] => {
                    session.authenticated = true;
                    ok()
                }
                _ => error("WRONGPASS invalid username-password pair or user is disabled."),
            },
            ("SELECT", 1) => ok(),
            ("GET", 1) => match data.get(&key) {
                None => Frame::Null,
                Some(Value::Str(value)) => Frame::Bulk(value.clone()),
                Some(_) => error(WRONGTYPE),
            },
            ("SET", 2) => {
                ttls.remove(&key);
                data.insert(key, Value::Str(args[1].clone()));
                ok()
            }
            ("SETEX", 3) => {
                let Some(seconds) = parse::<u64>(&args[1]) else {
                    return error(NOT_INTEGER);
                };
                data.insert(key.clone(), Value::Str(args[2].clone()));
                ttls.insert(key, seconds * 1000);
                ok()
            }
            ("GETSET", 2) => {
                let previous = match data.get(&key) {
                    None => Frame::Null,
                    Some(Value::Str(value)) => Frame::Bulk(value.clone()),
                    Some(_) => return error(WRONGTYPE),
                };
                ttls.remove(&key);
                data.insert(key, Value::Str(args[1].clone()));
                previous
            }
            ("GETRANGE", 3) => {
                let (Some(start), Some(end)) = (parse::<i64>(&args[1]), parse::<i64>(&args[2]))
                else {
                    return error(NOT_INTEGER);
                };
                match data.get(&key) {
                    None => bulk(""),
                    Some(Value::Str(value)) => {
                        Frame::Bulk(value.slice(rank_range(value.len(), start, end)))
                    }
                    Some(_) => error(WRONGTYPE),
                }
            }
            ("SETRANGE", 3) => {
                let Some(offset) = parse::<usize>(&args[1]) else {
                    return error(NOT_INTEGER);
                };
                let mut value = match data.get(&key) {
                    None => Vec::new(),
                    Some(Value::Str(value)) => value.to_vec(),
                    Some(_) => return error(WRONGTYPE),
                };
                let end = offset + args[2].len();
                if value.len() < end {
                    value.resize(end, 0);
                }
                value[offset..end].copy_from_slice(&args[2]);
                let len = value.len();
                data.insert(key, Value::Str(Bytes::from(value)));
                Frame::Integer(len as i64)
            }
            ("MSET", n) if n >= 2 && n % 2 == 0 => {
                for pair in args.chunks(2) {
                    data.insert(text(&pair[0]), Value::Str(pair[1].clone()));
                }
                ok()
            }
            ("SETNX", 2) => {
                if data.contains_key(&key) {
                    Frame::Integer(0)
                } else {
                    data.insert(key, Value::Str(args[1].clone()));
                    Frame::Integer(1)
                }
            }
            ("INCR", 1) | ("DECR", 1) | ("INCRBY", 2) | ("DECRBY", 2) => {
                let delta = match name {
                    "INCR" => 1,
                    "DECR" => -1,
                    _ => match parse::<i64>(&args[1]) {
                        Some(delta) if name == "DECRBY" => -delta,
                        Some(delta) => delta,
                        None => return error(NOT_INTEGER),
                    },
                };
                let current = match data.get(&key) {
                    None => 0,
                    Some(Value::Str(value)) => match parse::<i64>(value) {
                        Some(current) => current,
                        None => return error(NOT_INTEGER),
                    },
                    Some(_) => return error(WRONGTYPE),
                };
                let next = current + delta;
                data.insert(key, Value::Str(Bytes::from(next.to_string())));
                Frame::Integer(next)
            }
            ("INCRBYFLOAT", 2) => {
                let Some(delta) = parse::<f64>(&args[1]) else {
                    return error(NOT_FLOAT);
                };
                let current = match data.get(&key) {
                    None => 0.0,
                    Some(Value::Str(value)) => match parse::<f64>(value) {
                        Some(current) => current,
                        None => return error(NOT_FLOAT),
                    },
                    Some(_) => return error(WRONGTYPE),
                };
                let next = Bytes::from((current + delta).to_string());
                data.insert(key, Value::Str(next.clone()));
                Frame::Bulk(next)
            }
            ("SADD", n) if n >= 2 => {
                let Value::Set(set) = data
                    .entry(key)
                    .or_insert_with(|| Value::Set(HashSet::new()))
                else {
                    return error(WRONGTYPE);
                };
                let added = args[1..]
                    .iter()
                    .filter(|member| set.insert((*member).clone()))
                    .count();
                Frame::Integer(added as i64)
            }
            ("SMEMBERS", 1) => match data.get(&key) {
                None => Frame::Array(Vec::new()),
                Some(Value::Set(set)) => Frame::Array(set.iter().cloned().map(Frame::Bulk).collect()),
                Some(_) => error(WRONGTYPE),
            },
            ("SCARD", 1) => match data.get(&key) {
                None => Frame::Integer(0),
                Some(Value::Set(set)) => Frame::Integer(set.len() as i64),
                Some(_) => error(WRONGTYPE),
            },
            ("SREM", n) if n >= 2 => match data.get_mut(&key) {
                None => Frame::Integer(0),
                Some(Value::Set(set)) => {
                    let removed = args[1..].iter().filter(|member| set.remove(*member)).count();
                    Frame::Integer(removed as i64)
                }
                Some(_) => error(WRONGTYPE),
            },
            ("SMOVE", 3) => {
                let member = args[2].clone();
                match data.get_mut(&key) {
                    None => return Frame::Integer(0),
                    Some(Value::Set(set)) => {
                        if !set.remove(&member) {
                            return Frame::Integer(0);
                        }
                    }
                    Some(_) => return error(WRONGTYPE),
                }
                let Value::Set(target) = data
                    .entry(text(&args[1]))
                    .or_insert_with(|| Value::Set(HashSet::new()))
                else {
                    return error(WRONGTYPE);
                };
                target.insert(member);
                Frame::Integer(1)
            }
            ("SUNION", n) | ("SINTER", n) | ("SDIFF", n) if n >= 1 => {
                match combine_sets(&data, name, args) {
                    Ok(set) => Frame::Array(set.into_iter().map(Frame::Bulk).collect()),
                    Err(frame) => frame,
                }
            }
            ("SUNIONSTORE", n) | ("SINTERSTORE", n) | ("SDIFFSTORE", n) if n >= 2 => {
                match combine_sets(&data, name.trim_end_matches("STORE"), &args[1..]) {
                    Ok(set) => {
                        let len = set.len();
                        data.insert(key, Value::Set(set));
                        Frame::Integer(len as i64)
                    }
                    Err(frame) => frame,
                }
            }
            ("SRANDMEMBER", 1) | ("SRANDMEMBER", 2) => {
                let members: Vec<Bytes> = match data.get(&key) {
                    None => Vec::new(),
                    Some(Value::Set(set)) => set.iter().cloned().collect(),
                    Some(_) => return error(WRONGTYPE),
                };
                if args.len() == 1 {
                    return members.first().cloned().map_or(Frame::Null, Frame::Bulk);
                }
                let Some(count) = parse::<i64>(&args[1]) else {
                    return error(NOT_INTEGER);
                };
                // A negative count may repeat members.
                let picked: Vec<Frame> = if count >= 0 {
                    members
                        .into_iter()
                        .take(count as usize)
                        .map(Frame::Bulk)
                        .collect()
                } else {
                    members
                        .iter()
                        .cycle()
                        .take(count.unsigned_abs() as usize)
                        .cloned()
                        .map(Frame::Bulk)
                        .collect()
                };
                Frame::Array(picked)
            }
            ("PFADD", n) if n >= 1 => {
                let Value::Set(set) = data
                    .entry(key)
                    .or_insert_with(|| Value::Set(HashSet::new()))
                else {
                    return error(WRONGTYPE);
                };
                let added = args[1..]
                    .iter()
                    .filter(|element| set.insert((*element).clone()))
                    .count();
                Frame::Integer(i64::from(added > 0))
            }
            ("PFCOUNT", n) if n >= 1 => match combine_sets(&data, "SUNION", args) {
                Ok(set) => Frame::Integer(set.len() as i64),
                Err(frame) => frame,
            },
            ("ZADD", 3) => {
                let Some(score) = parse::<f64>(&args[1]) else {
                    return error(NOT_FLOAT);
                };
                let Value::ZSet(zset) = data
                    .entry(key)
                    .or_insert_with(|| Value::ZSet(Vec::new()))
                else {
                    return error(WRONGTYPE);
                };
                let member = args[2].clone();
                let added = match zset.iter_mut().find(|(_, m)| *m == member) {
                    Some(entry) => {
                        entry.0 = score;
                        0
                    }
                    None => {
                        zset.push((score, member));
                        1
                    }
                };
                sort_zset(zset);
                Frame::Integer(added)
            }
            ("ZINCRBY", 3) => {
                let Some(delta) = parse::<f64>(&args[1]) else {
                    return error(NOT_FLOAT);
                };
                let Value::ZSet(zset) = data
                    .entry(key)
                    .or_insert_with(|| Value::ZSet(Vec::new()))
                else {
                    return error(WRONGTYPE);
                };
                let score = match zset.iter_mut().find(|(_, m)| *m == args[2]) {
                    Some(entry) => {
                        entry.0 += delta;
                        entry.0
                    }
                    None => {
                        zset.push((delta, args[2].clone()));
                        delta
                    }
                };
                sort_zset(zset);
                bulk(&score.to_string())
            }
            ("ZSCORE", 2) => match data.get(&key) {
                None => Frame::Null,
                Some(Value::ZSet(zset)) => zset
                    .iter()
                    .find(|(_, m)| *m == args[1])
                    .map_or(Frame::Null, |(score, _)| bulk(&score.to_string())),
                Some(_) => error(WRONGTYPE),
            },
            ("ZRANK", 2) | ("ZREVRANK", 2) => match data.get(&key) {
                None => Frame::Null,
                Some(Value::ZSet(zset)) => match zset.iter().position(|(_, m)| *m == args[1]) {
                    Some(rank) if name == "ZREVRANK" => Frame::Integer((zset.len() - 1 - rank) as i64),
                    Some(rank) => Frame::Integer(rank as i64),
                    None => Frame::Null,
                },
                Some(_) => error(WRONGTYPE),
            },
            ("ZRANGEBYLEX", 3) | ("ZREVRANGEBYLEX", 3) => {
                let reverse = name == "ZREVRANGEBYLEX";
                let (min, max) = if reverse {
                    (&args[2], &args[1])
                } else {
                    (&args[1], &args[2])
                };
                let (Some(min), Some(max)) = (LexBound::parse(min), LexBound::parse(max)) else {
                    return error("ERR min or max not valid string range item");
                };
                let mut zset: Vec<_> = match data.get(&key) {
                    None => Vec::new(),
                    Some(Value::ZSet(zset)) => zset
                        .iter()
                        .filter(|(_, member)| min.below(member) && max.above(member))
                        .cloned()
                        .collect(),
                    Some(_) => return error(WRONGTYPE),
                };
                if reverse {
                    zset.reverse();
                }
                scored(&zset, false)
            }
            ("ZUNIONSTORE", n) | ("ZINTERSTORE", n) if n >= 3 => {
                let Some(numkeys) = parse::<usize>(&args[1]) else {
                    return error(NOT_INTEGER);
                };
                if numkeys == 0 || args.len() != numkeys + 2 {
                    return error("ERR syntax error");
                }
                let mut sources = Vec::new();
                for source in &args[2..] {
                    match data.get(&text(source)) {
                        None => sources.push(Vec::new()),
                        Some(Value::ZSet(zset)) => sources.push(zset.clone()),
                        Some(_) => return error(WRONGTYPE),
                    }
                }
                let mut combined: Vec<(f64, Bytes)> = Vec::new();
                for (score, member) in sources.iter().flatten() {
                    match combined.iter_mut().find(|(_, m)| *m == *member) {
                        Some(entry) => entry.0 += *score,
                        None => combined.push((*score, member.clone())),
                    }
                }
                if name == "ZINTERSTORE" {
                    combined.retain(|(_, member)| {
                        sources
                            .iter()
                            .all(|zset| zset.iter().any(|(_, m)| m == member))
                    });
                }
                sort_zset(&mut combined);
                let len = combined.len();
                data.insert(key, Value::ZSet(combined));
                Frame::Integer(len as i64)
            }
            ("ZRANGE", 3) | ("ZRANGE", 4) | ("ZREVRANGE", 3) | ("ZREVRANGE", 4) => {
                let (Some(start), Some(stop)) = (parse::<i64>(&args[1]), parse::<i64>(&args[2]))
                else {
                    return error(NOT_INTEGER);
                };
                let with_scores = args.len() == 4;
                let mut zset = match data.get(&key) {
                    None => Vec::new(),
                    Some(Value::ZSet(zset)) => zset.clone(),
                    Some(_) => return error(WRONGTYPE),
                };
                if name == "ZREVRANGE" {
                    zset.reverse();
                }
                let range = rank_range(zset.len(), start, stop);
                scored(&zset[range], with_scores)
            }
            ("ZRANGEBYSCORE", 3) | ("ZREVRANGEBYSCORE", 3) => {
                let reverse = name == "ZREVRANGEBYSCORE";
                let (min, max) = if reverse {
                    (&args[2], &args[1])
                } else {
                    (&args[1], &args[2])
                };
                let (Some(min), Some(max)) = (score_bound(min), score_bound(max)) else {
                    return error("ERR min or max is not a float");
                };
                let mut zset: Vec<_> = match data.get(&key) {
                    None => Vec::new(),
                    Some(Value::ZSet(zset)) => zset
                        .iter()
                        .filter(|(score, _)| min.below(*score) && max.above(*score))
                        .cloned()
                        .collect(),
                    Some(_) => return error(WRONGTYPE),
                };
                if reverse {
                    zset.reverse();
                }
                scored(&zset, false)
            }
            ("HSET", 3) | ("HSETNX", 3) => {
                let Value::Hash(hash) = data
                    .entry(key)
                    .or_insert_with(|| Value::Hash(HashMap::new()))
                else {
                    return error(WRONGTYPE);
                };
                let exists = hash.contains_key(&args[1]);
                if name == "HSET" || !exists {
                    hash.insert(args[1].clone(), args[2].clone());
                }
                Frame::Integer(i64::from(!exists))
            }
            ("HMSET", n) if n >= 3 && n % 2 == 1 => {
                let Value::Hash(hash) = data
                    .entry(key)
                    .or_insert_with(|| Value::Hash(HashMap::new()))
                else {
                    return error(WRONGTYPE);
                };
                for pair in args[1..].chunks(2) {
                    hash.insert(pair[0].clone(), pair[1].clone());
                }
                ok()
            }
            ("HMGET", n) if n >= 2 => match data.get(&key) {
                None => Frame::Array(vec![Frame::Null; n - 1]),
                Some(Value::Hash(hash)) => Frame::Array(
                    args[1..]
                        .iter()
                        .map(|field| hash.get(field).cloned().map_or(Frame::Null, Frame::Bulk))
                        .collect(),
                ),
                Some(_) => error(WRONGTYPE),
            },
            ("HDEL", n) if n >= 2 => match data.get_mut(&key) {
                None => Frame::Integer(0),
                Some(Value::Hash(hash)) => {
                    let removed = args[1..]
                        .iter()
                        .filter(|field| hash.remove(*field).is_some())
                        .count();
                    Frame::Integer(removed as i64)
                }
                Some(_) => error(WRONGTYPE),
            },
            ("HINCRBYFLOAT", 3) => {
                let Some(delta) = parse::<f64>(&args[2]) else {
                    return error(NOT_FLOAT);
                };
                let Value::Hash(hash) = data
                    .entry(key)
                    .or_insert_with(|| Value::Hash(HashMap::new()))
                else {
                    return error(WRONGTYPE);
                };
                let current = match hash.get(&args[1]) {
                    None => 0.0,
                    Some(value) => match parse::<f64>(value) {
                        Some(current) => current,
                        None => return error(NOT_FLOAT),
                    },
                };
                let next = Bytes::from((current + delta).to_string());
                hash.insert(args[1].clone(), next.clone());
                Frame::Bulk(next)
            }
            ("HGET", 2) => match data.get(&key) {
                None => Frame::Null,
                Some(Value::Hash(hash)) => hash
                    .get(&args[1])
                    .cloned()
                    .map_or(Frame::Null, Frame::Bulk),
                Some(_) => error(WRONGTYPE),
            },
            ("HGETALL", 1) => match data.get(&key) {
                None => Frame::Array(Vec::new()),
                Some(Value::Hash(hash)) => Frame::Array(
                    hash.iter()
                        .flat_map(|(field, value)| {
                            [Frame::Bulk(field.clone()), Frame::Bulk(value.clone())]
                        })
                        .collect(),
                ),
                Some(_) => error(WRONGTYPE),
            },
            ("LPUSH", n) | ("RPUSH", n) if n >= 2 => {
                let Value::List(list) = data
                    .entry(key)
                    .or_insert_with(|| Value::List(VecDeque::new()))
                else {
                    return error(WRONGTYPE);
                };
                for value in &args[1..] {
                    if name == "LPUSH" {
                        list.push_front(value.clone());
                    } else {
                        list.push_back(value.clone());
                    }
                }
                Frame::Integer(list.len() as i64)
            }
            ("LPUSHX", n) | ("RPUSHX", n) if n >= 2 => match data.get_mut(&key) {
                None => Frame::Integer(0),
                Some(Value::List(list)) => {
                    for value in &args[1..] {
                        if name == "LPUSHX" {
                            list.push_front(value.clone());
                        } else {
                            list.push_back(value.clone());
                        }
                    }
                    Frame::Integer(list.len() as i64)
                }
                Some(_) => error(WRONGTYPE),
            },
            ("LRANGE", 3) => {
                let (Some(start), Some(stop)) = (parse::<i64>(&args[1]), parse::<i64>(&args[2]))
                else {
                    return error(NOT_INTEGER);
                };
                match data.get(&key) {
                    None => Frame::Array(Vec::new()),
                    Some(Value::List(list)) => Frame::Array(
                        list.range(rank_range(list.len(), start, stop))
                            .cloned()
                            .map(Frame::Bulk)
                            .collect(),
                    ),
                    Some(_) => error(WRONGTYPE),
                }
            }
            ("DEL", n) if n >= 1 => {
                let removed = args
                    .iter()
                    .map(text)
                    .filter(|key| {
                        ttls.remove(key);
                        data.remove(key).is_some()
                    })
                    .count();
                Frame::Integer(removed as i64)
            }
            ("EXISTS", n) if n >= 1 => {
                let found = args
                    .iter()
                    .filter(|key| data.contains_key(&text(key)))
                    .count();
                Frame::Integer(found as i64)
            }
            ("EXPIRE", 2) | ("PEXPIRE", 2) => {
                let Some(amount) = parse::<u64>(&args[1]) else {
                    return error(NOT_INTEGER);
                };
                if !data.contains_key(&key) {
                    return Frame::Integer(0);
                }
                let millis = if name == "EXPIRE" { amount * 1000 } else { amount };
                if millis == 0 {
                    data.remove(&key);
                    ttls.remove(&key);
                } else {
                    ttls.insert(key, millis);
                }
                Frame::Integer(1)
            }
            ("TTL", 1) | ("PTTL", 1) => {
                if !data.contains_key(&key) {
                    return Frame::Integer(-2);
                }
                match ttls.get(&key) {
                    None => Frame::Integer(-1),
                    Some(millis) if name == "TTL" => Frame::Integer((millis / 1000) as i64),
                    Some(millis) => Frame::Integer(*millis as i64),
                }
            }
            ("PERSIST", 1) => {
                Frame::Integer(i64::from(data.contains_key(&key) && ttls.remove(&key).is_some()))
            }
            ("KEYS", 1) => Frame::Array(
                data.keys()
                    .filter(|candidate| glob_match::glob_match(&key, candidate))
                    .map(|candidate| bulk(candidate))
                    .collect(),
            ),
            _ => error(&format!(
                "ERR unknown command '{name}' with {} arguments",
                args.len()
            )),
        }
    }
}

fn combine_sets(
    data: &HashMap<String, Value>,
    op: &str,
    keys: &[Bytes],
) -> Result<HashSet<Bytes>, Frame> {
    let mut sets = Vec::new();
    for key in keys {
        match data.get(&text(key)) {
            None => sets.push(HashSet::new()),
            Some(Value::Set(set)) => sets.push(set.clone()),
            Some(_) => return Err(error(WRONGTYPE)),
        }
    }

    let mut sets = sets.into_iter();
    let first = sets.next().unwrap_or_default();
    Ok(sets.fold(first, |acc, set| match op {
        "SUNION" => &acc | &set,
        "SINTER" => &acc & &set,
        _ => &acc - &set,
    }))
}

fn sort_zset(zset: &mut [(f64, Bytes)]) {
    zset.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
}

/// `-`, `+`, `[member` or `(member`.
enum LexBound {
    Min,
    Max,
    Inclusive(Bytes),
    Exclusive(Bytes),
}

impl LexBound {
    fn parse(raw: &Bytes) -> Option<LexBound> {
        match (raw.first()?, raw.len()) {
            (b'-', 1) => Some(LexBound::Min),
            (b'+', 1) => Some(LexBound::Max),
            (b'[', _) => Some(LexBound::Inclusive(raw.slice(1..))),
            (b'(', _) => Some(LexBound::Exclusive(raw.slice(1..))),
            _ => None,
        }
    }

    fn below(&self, member: &Bytes) -> bool {
        match self {
            LexBound::Min => true,
            LexBound::Max => false,
            LexBound::Inclusive(bound) => bound <= member,
            LexBound::Exclusive(bound) => bound < member,
        }
    }

    fn above(&self, member: &Bytes) -> bool {
        match self {
            LexBound::Min => false,
            LexBound::Max => true,
            LexBound::Inclusive(bound) => member <= bound,
            LexBound::Exclusive(bound) => member < bound,
        }
    }
}

struct Bound {
    value: f64,
    exclusive: bool,
}

impl Bound {
    fn below(&self, score: f64) -> bool {
        if self.exclusive {
            self.value < score
        } else {
            self.value <= score
        }
    }

    fn above(&self, score: f64) -> bool {
        if self.exclusive {
            score < self.value
        } else {
            score <= self.value
        }
    }
}

fn score_bound(raw: &Bytes) -> Option<Bound> {
    let raw = text(raw);
    let (raw, exclusive) = match raw.strip_prefix('(') {
        Some(rest) => (rest, true),
        None => (raw.as_str(), false),
    };
    let value = match raw {
        "-inf" => f64::NEG_INFINITY,
        "inf" | "+inf" => f64::INFINITY,
        raw => raw.parse().ok()?,
    };
    Some(Bound { value, exclusive })
}

/// Inclusive, possibly negative, rank bounds turned into a slice range.
fn rank_range(len: usize, start: i64, stop: i64) -> std::ops::Range<usize> {
    let len = len as i64;
    let normalize = |index: i64| if index < 0 { (len + index).max(0) } else { index };
    let start = normalize(start);
    let stop = normalize(stop).min(len - 1);

    if start > stop {
        0..0
    } else {
        start as usize..stop as usize + 1
    }
}

fn scored(entries: &[(f64, Bytes)], with_scores: bool) -> Frame {
    let mut frames = Vec::new();
    for (score, member) in entries {
        frames.push(Frame::Bulk(member.clone()));
        if with_scores {
            frames.push(bulk(&score.to_string()));
        }
    }
    Frame::Array(frames)
}

fn slow_delay(key: &str) -> Option<Duration> {
    let rest = key.strip_prefix("slow:")?;
    let (millis, _) = rest.split_once(':')?;
    millis.parse().ok().map(Duration::from_millis)
}

fn parse<T: str::FromStr>(bytes: &Bytes) -> Option<T> {
    str::from_utf8(bytes).ok()?.parse().ok()
}

fn text(bytes: &Bytes) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn bulk(s: &str) -> Frame {
    Frame::Bulk(Bytes::from(s.to_string()))
}

fn ok() -> Frame {
    Frame::Simple("OK".to_string())
}

fn error(message: &str) -> Frame {
    Frame::Error(message.to_string())
}
