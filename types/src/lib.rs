use std::borrow::Cow;

use displaydoc::Display;
use indexmap::IndexSet;
use thiserror::Error;

/// Integer type code carried by every node. `0` is [`UNKNOWN`].
pub type Code = usize;

pub const UNKNOWN: Code = 0;
pub const UNKNOWN_NAME: &str = "UNKNOWN";

#[derive(Debug, Clone, PartialEq, Eq, Error, Display)]
pub enum TypeError {
    /// type name {0:?} is not registered
    UnknownName(String),
}

/// A type given either as its code or as its registered name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Code(Code),
    Name(String),
}

impl From<Code> for TypeRef {
    fn from(value: Code) -> Self {
        TypeRef::Code(value)
    }
}

impl From<&str> for TypeRef {
    fn from(value: &str) -> Self {
        TypeRef::Name(value.to_owned())
    }
}

impl From<String> for TypeRef {
    fn from(value: String) -> Self {
        TypeRef::Name(value)
    }
}

/// Bidirectional map between type codes and names.
///
/// Names are assigned codes in registration order starting at 1, so the
/// first name registered is the one a new tree gives its root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeRegistry {
    names: IndexSet<String>,
}

impl TypeRegistry {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::default();
        for name in names {
            registry.register(name);
        }
        registry
    }

    pub fn register<S: Into<String>>(&mut self, name: S) -> Code {
        let name = name.into();
        if name == UNKNOWN_NAME {
            return UNKNOWN;
        }
        let (index, _) = self.names.insert_full(name);
        index + 1
    }

    pub fn name_for_code(&self, code: Code) -> Option<&str> {
        if code == UNKNOWN {
            return Some(UNKNOWN_NAME);
        }
        self.names.get_index(code - 1).map(String::as_str)
    }

    pub fn code_for_name(&self, name: &str) -> Option<Code> {
        if name == UNKNOWN_NAME {
            return Some(UNKNOWN);
        }
        self.names.get_index_of(name).map(|index| index + 1)
    }

    pub fn resolve(&self, type_ref: &TypeRef) -> Result<Code, TypeError> {
        match type_ref {
            TypeRef::Code(code) => Ok(*code),
            TypeRef::Name(name) => self
                .code_for_name(name)
                .ok_or_else(|| TypeError::UnknownName(name.clone())),
        }
    }

    /// Name for display, falling back to the decimal code when unregistered.
    pub fn display_name(&self, code: Code) -> Cow<'_, str> {
        match self.name_for_code(code) {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(code.to_string()),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Code, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(index, name)| (index + 1, name.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_registration_order() {
        let registry = TypeRegistry::new(["root", "word", "space"]);
        assert_eq!(registry.code_for_name("root"), Some(1));
        assert_eq!(registry.code_for_name("space"), Some(3));
        assert_eq!(registry.name_for_code(2), Some("word"));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn unknown_is_reserved() {
        let mut registry = TypeRegistry::new(["root"]);
        assert_eq!(registry.name_for_code(UNKNOWN), Some(UNKNOWN_NAME));
        assert_eq!(registry.code_for_name(UNKNOWN_NAME), Some(UNKNOWN));
        assert_eq!(registry.register(UNKNOWN_NAME), UNKNOWN);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicates_keep_first_code() {
        let mut registry = TypeRegistry::new(["root", "word"]);
        assert_eq!(registry.register("root"), 1);
        assert_eq!(registry.register("tag"), 3);
    }

    #[test]
    fn resolve_codes_and_names() {
        let registry = TypeRegistry::new(["root", "word"]);
        assert_eq!(registry.resolve(&TypeRef::from(42)), Ok(42));
        assert_eq!(registry.resolve(&"word".into()), Ok(2));
        assert_eq!(
            registry.resolve(&"nope".into()),
            Err(TypeError::UnknownName("nope".to_owned()))
        );
    }

    #[test]
    fn display_name_falls_back_to_code() {
        let registry = TypeRegistry::new(["root"]);
        assert_eq!(registry.display_name(1), "root");
        assert_eq!(registry.display_name(7), "7");
        assert_eq!(
            registry.iter().collect::<Vec<_>>(),
            vec![(1, "root")]
        );
    }
}
