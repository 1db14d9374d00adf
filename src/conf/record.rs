//! Per-module configuration records.

use std::any::Any;
use std::fmt;

use serde::Serialize;

/// A module's configuration for one context.
///
/// Every field the command table can reach should be a
/// [`Setting`](super::Setting) so that `merge` can see what was left unset.
pub trait ModuleConf: Any + fmt::Debug + Send + Sync + Serialize {
    /// Fill every unset field from `parent`, or from its default when the
    /// parent has no value either. Must be idempotent.
    fn merge(&mut self, parent: Option<&Self>);
}

/// Object-safe view of a [`ModuleConf`], as stored in context nodes.
pub trait AnyConf: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Merge against a parent record of the same concrete type. A parent of
    /// another type is treated as absent.
    fn merge_from(&mut self, parent: Option<&dyn AnyConf>);

    /// Serialized record; fails if a field's `Serialize` impl does.
    fn to_json(&self) -> serde_json::Result<serde_json::Value>;

    fn type_name(&self) -> &'static str;
}

impl<T: ModuleConf> AnyConf for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn merge_from(&mut self, parent: Option<&dyn AnyConf>) {
        let parent = parent.and_then(|p| p.as_any().downcast_ref::<T>());
        self.merge(parent);
    }

    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

impl dyn AnyConf {
    pub fn downcast_ref<T: ModuleConf>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: ModuleConf>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// Merge `child` against `parent` (see [`ModuleConf::merge`]).
pub fn merge_records(child: &mut dyn AnyConf, parent: Option<&dyn AnyConf>) {
    child.merge_from(parent);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::Setting;

    #[derive(Debug, Default, Serialize)]
    struct Demo {
        size: Setting<u64>,
    }

    impl ModuleConf for Demo {
        fn merge(&mut self, parent: Option<&Self>) {
            self.size.merge(parent.map(|p| &p.size), 8);
        }
    }

    #[derive(Debug, Default, Serialize)]
    struct Other;

    impl ModuleConf for Other {
        fn merge(&mut self, _parent: Option<&Self>) {}
    }

    #[test]
    fn test_erased_merge() {
        let parent: Box<dyn AnyConf> = Box::new(Demo {
            size: Setting::new(16),
        });
        let mut child: Box<dyn AnyConf> = Box::new(Demo::default());
        merge_records(child.as_mut(), Some(parent.as_ref()));
        assert_eq!(child.downcast_ref::<Demo>().and_then(|d| d.size.get()), Some(&16));
    }

    #[test]
    fn test_mismatched_parent_is_absent() {
        let parent: Box<dyn AnyConf> = Box::new(Other);
        let mut child: Box<dyn AnyConf> = Box::new(Demo::default());
        child.merge_from(Some(parent.as_ref()));
        assert_eq!(child.downcast_ref::<Demo>().and_then(|d| d.size.get()), Some(&8));
    }

    #[test]
    fn test_to_json() {
        let conf = Demo::default();
        assert_eq!(conf.to_json().unwrap(), serde_json::json!({ "size": null }));
    }

    #[derive(Debug)]
    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("record cannot be serialized"))
        }
    }

    impl ModuleConf for Unserializable {
        fn merge(&mut self, _parent: Option<&Self>) {}
    }

    #[test]
    fn test_to_json_reports_failure() {
        let conf: Box<dyn AnyConf> = Box::new(Unserializable);
        let err = conf.to_json().unwrap_err();
        assert!(err.to_string().contains("record cannot be serialized"));
    }
}
