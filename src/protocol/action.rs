//! CRUD action codes and their HTTP method mapping.
//!
//! On the wire an action is a single byte: `c`, `r`, `u` or `d`. Packets
//! keep the raw byte so that an unknown code can reach the dispatcher and be
//! reported as a per-packet error instead of failing envelope decoding.

use std::fmt;

/// One of the four CRUD capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    /// `c` / POST
    Create,
    /// `r` / GET
    Read,
    /// `u` / PUT
    Update,
    /// `d` / DELETE
    Delete,
}

impl Action {
    /// All actions in wire order.
    pub const ALL: [Action; 4] = [Action::Create, Action::Read, Action::Update, Action::Delete];

    /// Wire code for this action.
    #[inline]
    pub const fn code(self) -> u8 {
        match self {
            Action::Create => b'c',
            Action::Read => b'r',
            Action::Update => b'u',
            Action::Delete => b'd',
        }
    }

    /// Parse a wire code.
    #[inline]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            b'c' => Some(Action::Create),
            b'r' => Some(Action::Read),
            b'u' => Some(Action::Update),
            b'd' => Some(Action::Delete),
            _ => None,
        }
    }

    /// Map an HTTP method to an action.
    ///
    /// POST→create, GET→read, PUT→update, DELETE→delete. Anything else maps
    /// to no action.
    pub fn from_http_method(method: &str) -> Option<Self> {
        match method {
            "POST" => Some(Action::Create),
            "GET" => Some(Action::Read),
            "PUT" => Some(Action::Update),
            "DELETE" => Some(Action::Delete),
            _ => None,
        }
    }

    /// HTTP method serving this action.
    pub const fn http_method(self) -> &'static str {
        match self {
            Action::Create => "POST",
            Action::Read => "GET",
            Action::Update => "PUT",
            Action::Delete => "DELETE",
        }
    }

    /// Lowercase action name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }

    /// Slot of this action in per-action tables.
    #[inline]
    pub(crate) const fn index(self) -> usize {
        match self {
            Action::Create => 0,
            Action::Read => 1,
            Action::Update => 2,
            Action::Delete => 3,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", char::from(self.code()))
    }
}

impl From<Action> for u8 {
    fn from(action: Action) -> Self {
        action.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for action in Action::ALL {
            assert_eq!(Action::from_code(action.code()), Some(action));
        }
        assert_eq!(Action::from_code(b'x'), None);
        assert_eq!(Action::from_code(0), None);
    }

    #[test]
    fn test_http_method_mapping() {
        let cases = [
            ("POST", Some(Action::Create)),
            ("GET", Some(Action::Read)),
            ("PUT", Some(Action::Update)),
            ("DELETE", Some(Action::Delete)),
            ("INVALID", None),
            ("PATCH", None),
        ];

        for (method, expected) in cases {
            assert_eq!(Action::from_http_method(method), expected, "method {}", method);
            if let Some(action) = expected {
                assert_eq!(action.http_method(), method);
            }
        }
    }

    #[test]
    fn test_display_uses_wire_code() {
        assert_eq!(Action::Delete.to_string(), "d");
        assert_eq!(Action::Create.as_str(), "create");
    }

    #[test]
    fn test_index_is_dense() {
        let indices: Vec<usize> = Action::ALL.iter().map(|a| a.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }
}
