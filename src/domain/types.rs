/// Value Types
///
/// The value types a Relapse terminal, variable or list can carry.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Type {
    #[default]
    Unknown,
    SingleDouble,
    SingleInt,
    SingleUint,
    SingleBool,
    SingleString,
    SingleBytes,
    ListDouble,
    ListInt,
    ListUint,
    ListBool,
    ListString,
    ListBytes,
}

impl Type {
    /// Resolve a `$variable` type name (without the `$`).
    pub fn from_variable(s: &str) -> Option<Type> {
        match s {
            "double" => Some(Type::SingleDouble),
            "int" => Some(Type::SingleInt),
            "uint" => Some(Type::SingleUint),
            "bool" => Some(Type::SingleBool),
            "string" => Some(Type::SingleString),
            "[]byte" => Some(Type::SingleBytes),
            _ => None,
        }
    }

    /// Resolve the element type of a `[]elem{...}` list literal.
    pub fn from_list_elem(s: &str) -> Option<Type> {
        match s {
            "double" => Some(Type::ListDouble),
            "int" => Some(Type::ListInt),
            "uint" => Some(Type::ListUint),
            "bool" => Some(Type::ListBool),
            "string" => Some(Type::ListString),
            "[]byte" => Some(Type::ListBytes),
            _ => None,
        }
    }

    /// The upper-snake name used in node labels.
    pub fn name(&self) -> &'static str {
        match self {
            Type::Unknown => "UNKNOWN",
            Type::SingleDouble => "SINGLE_DOUBLE",
            Type::SingleInt => "SINGLE_INT",
            Type::SingleUint => "SINGLE_UINT",
            Type::SingleBool => "SINGLE_BOOL",
            Type::SingleString => "SINGLE_STRING",
            Type::SingleBytes => "SINGLE_BYTES",
            Type::ListDouble => "LIST_DOUBLE",
            Type::ListInt => "LIST_INT",
            Type::ListUint => "LIST_UINT",
            Type::ListBool => "LIST_BOOL",
            Type::ListString => "LIST_STRING",
            Type::ListBytes => "LIST_BYTES",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_variable() {
        assert_eq!(Type::from_variable("int"), Some(Type::SingleInt));
        assert_eq!(Type::from_variable("[]byte"), Some(Type::SingleBytes));
        assert_eq!(Type::from_variable("float"), None);
    }

    #[test]
    fn test_from_list_elem() {
        assert_eq!(Type::from_list_elem("string"), Some(Type::ListString));
        assert_eq!(Type::from_list_elem("uint"), Some(Type::ListUint));
        assert_eq!(Type::from_list_elem("map"), None);
    }

    #[test]
    fn test_name() {
        assert_eq!(Type::SingleBool.to_string(), "SINGLE_BOOL");
        assert_eq!(Type::default().name(), "UNKNOWN");
    }
}
