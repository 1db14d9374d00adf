//! Generic value slot setters.
//!
//! # Responsibilities
//! - Parse directive arguments into typed values
//! - Store them into one field of a module record through a typed accessor
//! - Report what was stored so a post-validator can check it
//!
//! # Design Decisions
//! - One setter per value type, reused for every field of that type
//! - Re-setting a field in the same context overwrites it (last write wins)
//! - Bitmask and list setters accumulate instead of overwriting
//!
//! ```ignore
//! Command::new("sendfile", ArgShape::FLAG, HTTP_ANY)
//!     .with_setter(slot::flag(|c: &mut HttpConf| &mut c.sendfile))
//! ```

pub mod parse;
pub mod post;

use std::time::Duration;

use serde::Serialize;

use crate::command::{Args, Setter};
use crate::conf::{AnyConf, ModuleConf, Setting};
use crate::error::SetError;

pub use parse::{parse_flag, parse_int, parse_size, parse_time, TimeUnit};
pub use post::{DurationBounds, NumBounds};

/// The value a setter just stored, as seen by post-validators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotValue {
    /// Setter stored nothing inspectable.
    Unit,
    Flag(bool),
    Str(String),
    Int(i64),
    Duration(Duration),
    Size(u64),
    Bitmask(u32),
    Enum(u32),
    List(Vec<String>),
    Bufs(Bufs),
}

/// Buffer count and size, as in `client_body_buffers 4 8k;`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bufs {
    pub num: usize,
    pub size: u64,
}

/// Typed accessor for one field of record `R`.
pub type Field<R, T> = fn(&mut R) -> &mut Setting<T>;

/// Name → value table for enum and bitmask setters.
pub type Names = &'static [(&'static str, u32)];

fn record<R: ModuleConf>(conf: &mut dyn AnyConf) -> Result<&mut R, SetError> {
    conf.as_any_mut()
        .downcast_mut::<R>()
        .ok_or(SetError::RecordMismatch)
}

fn lookup(names: Names, token: &str) -> Result<u32, SetError> {
    names
        .iter()
        .find(|(name, _)| *name == token)
        .map(|(_, value)| *value)
        .ok_or_else(|| SetError::invalid(token, "unknown value"))
}

/// Stores a single parsed argument.
pub struct ValueSlot<R, T> {
    field: Field<R, T>,
    parse: fn(&str) -> Result<T, SetError>,
    report: fn(&T) -> SlotValue,
}

impl<R, T> Setter for ValueSlot<R, T>
where
    R: ModuleConf,
    T: Send + Sync + 'static,
{
    fn set(&self, args: &Args<'_>, conf: &mut dyn AnyConf) -> Result<SlotValue, SetError> {
        let value = (self.parse)(args.require(0)?)?;
        let stored = (self.report)(&value);
        (self.field)(record::<R>(conf)?).set(value);
        Ok(stored)
    }
}

/// `on`/`off` into `Setting<bool>`.
pub fn flag<R: ModuleConf>(field: Field<R, bool>) -> ValueSlot<R, bool> {
    ValueSlot {
        field,
        parse: parse_flag,
        report: |v| SlotValue::Flag(*v),
    }
}

/// Argument verbatim into `Setting<String>`.
pub fn string<R: ModuleConf>(field: Field<R, String>) -> ValueSlot<R, String> {
    ValueSlot {
        field,
        parse: |s| Ok(s.to_string()),
        report: |v| SlotValue::Str(v.clone()),
    }
}

/// Signed integer into `Setting<i64>`.
pub fn num<R: ModuleConf>(field: Field<R, i64>) -> ValueSlot<R, i64> {
    ValueSlot {
        field,
        parse: parse_int,
        report: |v| SlotValue::Int(*v),
    }
}

/// Duration where a bare number means seconds.
pub fn sec<R: ModuleConf>(field: Field<R, Duration>) -> ValueSlot<R, Duration> {
    ValueSlot {
        field,
        parse: |s| parse_time(s, TimeUnit::Seconds),
        report: |v| SlotValue::Duration(*v),
    }
}

/// Duration where a bare number means milliseconds.
pub fn msec<R: ModuleConf>(field: Field<R, Duration>) -> ValueSlot<R, Duration> {
    ValueSlot {
        field,
        parse: |s| parse_time(s, TimeUnit::Millis),
        report: |v| SlotValue::Duration(*v),
    }
}

/// Byte size (`k`, `m`, `g` suffixes, powers of 1024).
pub fn size<R: ModuleConf>(field: Field<R, u64>) -> ValueSlot<R, u64> {
    ValueSlot {
        field,
        parse: parse_size,
        report: |v| SlotValue::Size(*v),
    }
}

/// One name out of a fixed table.
pub struct EnumSlot<R> {
    field: Field<R, u32>,
    names: Names,
}

impl<R: ModuleConf> Setter for EnumSlot<R> {
    fn set(&self, args: &Args<'_>, conf: &mut dyn AnyConf) -> Result<SlotValue, SetError> {
        let value = lookup(self.names, args.require(0)?)?;
        (self.field)(record::<R>(conf)?).set(value);
        Ok(SlotValue::Enum(value))
    }
}

pub fn enumeration<R: ModuleConf>(field: Field<R, u32>, names: Names) -> EnumSlot<R> {
    EnumSlot { field, names }
}

/// Every argument names a flag whose bit is OR-ed into the field.
pub struct BitmaskSlot<R> {
    field: Field<R, u32>,
    names: Names,
}

impl<R: ModuleConf> Setter for BitmaskSlot<R> {
    fn set(&self, args: &Args<'_>, conf: &mut dyn AnyConf) -> Result<SlotValue, SetError> {
        let mut bits = 0;
        for token in args.iter() {
            bits |= lookup(self.names, token)?;
        }
        let field = (self.field)(record::<R>(conf)?);
        let value = field.get_or_insert_with(|| 0);
        *value |= bits;
        Ok(SlotValue::Bitmask(*value))
    }
}

pub fn bitmask<R: ModuleConf>(field: Field<R, u32>, names: Names) -> BitmaskSlot<R> {
    BitmaskSlot { field, names }
}

/// Appends every argument to a list.
pub struct ListSlot<R> {
    field: Field<R, Vec<String>>,
}

impl<R: ModuleConf> Setter for ListSlot<R> {
    fn set(&self, args: &Args<'_>, conf: &mut dyn AnyConf) -> Result<SlotValue, SetError> {
        let field = (self.field)(record::<R>(conf)?);
        let list = field.get_or_insert_with(Vec::new);
        list.extend(args.iter().map(str::to_string));
        Ok(SlotValue::List(list.clone()))
    }
}

pub fn list<R: ModuleConf>(field: Field<R, Vec<String>>) -> ListSlot<R> {
    ListSlot { field }
}

/// Exactly two arguments: a count and a size.
pub struct BufsSlot<R> {
    field: Field<R, Bufs>,
}

impl<R: ModuleConf> Setter for BufsSlot<R> {
    fn set(&self, args: &Args<'_>, conf: &mut dyn AnyConf) -> Result<SlotValue, SetError> {
        let count = args.require(0)?;
        let num = count
            .parse::<usize>()
            .map_err(|_| SetError::invalid(count, "not a number"))?;
        let size = parse_size(args.require(1)?)?;
        if num == 0 || size == 0 {
            return Err(SetError::invalid(count, "buffer count and size must be positive"));
        }
        let bufs = Bufs { num, size };
        (self.field)(record::<R>(conf)?).set(bufs);
        Ok(SlotValue::Bufs(bufs))
    }
}

pub fn bufs<R: ModuleConf>(field: Field<R, Bufs>) -> BufsSlot<R> {
    BufsSlot { field }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Location;
    use crate::tokenizer::Token;

    #[derive(Debug, Default, Serialize)]
    struct Demo {
        enabled: Setting<bool>,
        name: Setting<String>,
        count: Setting<i64>,
        timeout: Setting<Duration>,
        limit: Setting<u64>,
        methods: Setting<u32>,
        mode: Setting<u32>,
        tags: Setting<Vec<String>>,
        buffers: Setting<Bufs>,
    }

    impl ModuleConf for Demo {
        fn merge(&mut self, _parent: Option<&Self>) {}
    }

    const METHODS: Names = &[("GET", 1), ("POST", 2), ("PUT", 4)];

    fn run(setter: &dyn Setter, conf: &mut Demo, values: &[&str]) -> Result<SlotValue, SetError> {
        let tokens: Vec<Token> = values
            .iter()
            .map(|v| Token {
                value: v.to_string(),
                line: 1,
                quoted: false,
            })
            .collect();
        let location = Location::new("test", 1);
        let args = Args::new("directive", &tokens, &location, 0);
        setter.set(&args, conf)
    }

    #[test]
    fn test_flag_and_string() {
        let mut conf = Demo::default();
        run(&flag(|c: &mut Demo| &mut c.enabled), &mut conf, &["on"]).unwrap();
        assert_eq!(conf.enabled.get(), Some(&true));

        let err = run(&flag(|c: &mut Demo| &mut c.enabled), &mut conf, &["maybe"]).unwrap_err();
        assert!(matches!(err, SetError::Invalid { .. }));

        run(&string(|c: &mut Demo| &mut c.name), &mut conf, &["/var/log"]).unwrap();
        assert_eq!(conf.name.get().map(String::as_str), Some("/var/log"));
    }

    #[test]
    fn test_last_write_wins() {
        let mut conf = Demo::default();
        let setter = num(|c: &mut Demo| &mut c.count);
        run(&setter, &mut conf, &["1"]).unwrap();
        run(&setter, &mut conf, &["7"]).unwrap();
        assert_eq!(conf.count.get(), Some(&7));
    }

    #[test]
    fn test_durations() {
        let mut conf = Demo::default();
        let value = run(&sec(|c: &mut Demo| &mut c.timeout), &mut conf, &["30s"]).unwrap();
        assert_eq!(value, SlotValue::Duration(Duration::from_secs(30)));

        run(&msec(|c: &mut Demo| &mut c.timeout), &mut conf, &["250"]).unwrap();
        assert_eq!(conf.timeout.get(), Some(&Duration::from_millis(250)));

        assert!(run(&sec(|c: &mut Demo| &mut c.timeout), &mut conf, &["10x"]).is_err());
    }

    #[test]
    fn test_size() {
        let mut conf = Demo::default();
        run(&size(|c: &mut Demo| &mut c.limit), &mut conf, &["1k"]).unwrap();
        assert_eq!(conf.limit.get(), Some(&1024));
    }

    #[test]
    fn test_bitmask_or() {
        let mut conf = Demo::default();
        let setter = bitmask(|c: &mut Demo| &mut c.methods, METHODS);
        run(&setter, &mut conf, &["GET", "POST"]).unwrap();
        assert_eq!(conf.methods.get(), Some(&3));

        run(&setter, &mut conf, &["PUT"]).unwrap();
        assert_eq!(conf.methods.get(), Some(&7));

        let err = run(&setter, &mut conf, &["DELETE"]).unwrap_err();
        assert!(matches!(err, SetError::Invalid { token, .. } if token == "DELETE"));
        assert_eq!(conf.methods.get(), Some(&7));
    }

    #[test]
    fn test_enum() {
        let mut conf = Demo::default();
        let setter = enumeration(|c: &mut Demo| &mut c.mode, METHODS);
        run(&setter, &mut conf, &["POST"]).unwrap();
        run(&setter, &mut conf, &["PUT"]).unwrap();
        assert_eq!(conf.mode.get(), Some(&4));
    }

    #[test]
    fn test_list_appends() {
        let mut conf = Demo::default();
        let setter = list(|c: &mut Demo| &mut c.tags);
        run(&setter, &mut conf, &["a", "b"]).unwrap();
        run(&setter, &mut conf, &["c"]).unwrap();
        assert_eq!(conf.tags.get().map(Vec::len), Some(3));
    }

    #[test]
    fn test_bufs() {
        let mut conf = Demo::default();
        let setter = bufs(|c: &mut Demo| &mut c.buffers);
        run(&setter, &mut conf, &["4", "8k"]).unwrap();
        assert_eq!(conf.buffers.get(), Some(&Bufs { num: 4, size: 8192 }));

        assert!(run(&setter, &mut conf, &["x", "8k"]).is_err());
        assert!(run(&setter, &mut conf, &["0", "8k"]).is_err());
    }

    #[test]
    fn test_record_mismatch() {
        #[derive(Debug, Serialize)]
        struct Other;
        impl ModuleConf for Other {
            fn merge(&mut self, _parent: Option<&Self>) {}
        }

        let tokens = vec![Token {
            value: "on".into(),
            line: 1,
            quoted: false,
        }];
        let location = Location::new("test", 1);
        let args = Args::new("x", &tokens, &location, 0);
        let mut other = Other;
        let err = flag(|c: &mut Demo| &mut c.enabled).set(&args, &mut other).unwrap_err();
        assert_eq!(err, SetError::RecordMismatch);
    }
}
