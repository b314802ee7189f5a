use std::borrow::Cow;
use std::fmt::{Debug, Display, Error as FmtError, Formatter};

/// Names of methods, fields, and local variables
///
/// See <https://docs.oracle.com/javase/specs/jvms/se16/html/jvms-4.html#jvms-4.2.2>
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct UnqualifiedName(Cow<'static, str>);

/// Names of classes and interfaces, in internal form (eg. `java/lang/Object`)
///
/// See <https://docs.oracle.com/javase/specs/jvms/se16/html/jvms-4.html#jvms-4.2.1>
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct BinaryName(Cow<'static, str>);

/// Validated JVM name
pub trait Name: Sized {
    /// Check if a string would be a valid name, explaining why not if it isn't
    fn check_valid(name: &str) -> Result<(), String>;

    /// Wrap a string that is already known to be valid
    fn from_valid(name: Cow<'static, str>) -> Self;

    /// Underlying string data
    fn as_cow(&self) -> &Cow<'static, str>;

    fn as_str(&self) -> &str {
        self.as_cow().as_ref()
    }

    /// Try to construct a name from a string
    fn from_string(name: String) -> Result<Self, String> {
        Self::check_valid(&name)?;
        Ok(Self::from_valid(Cow::Owned(name)))
    }

    /// Try to construct a name from a string slice
    fn from_str(name: &str) -> Result<Self, String> {
        Self::from_string(name.to_owned())
    }
}

impl Name for UnqualifiedName {
    fn check_valid(name: &str) -> Result<(), String> {
        if name.is_empty() {
            return Err(String::from("Unqualified name is empty"));
        }
        if let Some(c) = name.chars().find(|&c| matches!(c, '.' | ';' | '[' | '/')) {
            return Err(format!("Unqualified name '{}' contains '{}'", name, c));
        }
        let special = name == "<init>" || name == "<clinit>";
        if !special && name.contains(|c: char| c == '<' || c == '>') {
            return Err(format!(
                "Unqualified name '{}' uses angle brackets outside of '<init>' or '<clinit>'",
                name
            ));
        }
        Ok(())
    }

    fn from_valid(name: Cow<'static, str>) -> Self {
        UnqualifiedName(name)
    }

    fn as_cow(&self) -> &Cow<'static, str> {
        &self.0
    }
}

impl Name for BinaryName {
    fn check_valid(name: &str) -> Result<(), String> {
        if name.is_empty() {
            return Err(String::from("Binary name is empty"));
        }
        for segment in name.split('/') {
            if segment.is_empty() {
                return Err(format!("Binary name '{}' has an empty segment", name));
            }
            UnqualifiedName::check_valid(segment)
                .map_err(|msg| format!("Binary name '{}': {}", name, msg))?;
        }
        Ok(())
    }

    fn from_valid(name: Cow<'static, str>) -> Self {
        BinaryName(name)
    }

    fn as_cow(&self) -> &Cow<'static, str> {
        &self.0
    }
}

impl Debug for UnqualifiedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "{:?}", self.as_str())
    }
}

impl Debug for BinaryName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "{:?}", self.as_str())
    }
}

impl Display for UnqualifiedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(self.as_str())
    }
}

impl Display for BinaryName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(self.as_str())
    }
}

impl UnqualifiedName {
    const fn name(value: &'static str) -> UnqualifiedName {
        UnqualifiedName(Cow::Borrowed(value))
    }

    pub const INIT: Self = Self::name("<init>");
    pub const CLINIT: Self = Self::name("<clinit>");
}

impl BinaryName {
    const fn name(value: &'static str) -> BinaryName {
        BinaryName(Cow::Borrowed(value))
    }

    pub const CALLSITE: Self = Self::name("java/lang/invoke/CallSite");
    pub const OBJECT: Self = Self::name("java/lang/Object");
    pub const STRING: Self = Self::name("java/lang/String");
    pub const THROWABLE: Self = Self::name("java/lang/Throwable");
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unqualified_names() {
        assert!(UnqualifiedName::from_str("count").is_ok());
        assert!(UnqualifiedName::from_str("<init>").is_ok());
        assert!(UnqualifiedName::from_str("").is_err());
        assert!(UnqualifiedName::from_str("a.b").is_err());
        assert!(UnqualifiedName::from_str("a/b").is_err());
        assert!(UnqualifiedName::from_str("<foo>").is_err());
        assert_eq!(
            UnqualifiedName::from_str("<clinit>").unwrap(),
            UnqualifiedName::CLINIT
        );
    }

    #[test]
    fn binary_names() {
        let name = BinaryName::from_str("java/util/HashMap").unwrap();
        assert_eq!(name.as_str(), "java/util/HashMap");
        assert!(BinaryName::from_str("java//HashMap").is_err());
        assert!(BinaryName::from_str("java.util.HashMap").is_err());
        assert!(BinaryName::from_str("java/util/").is_err());
        assert_eq!(format!("{:?}", name), "\"java/util/HashMap\"");
        assert_eq!(BinaryName::OBJECT.to_string(), "java/lang/Object");
    }
}
