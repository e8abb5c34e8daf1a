use serde::{Deserialize, Serialize};

/// Sort order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Match a direction token case-insensitively.
    pub fn parse(token: &str) -> Option<SortOrder> {
        if token.eq_ignore_ascii_case("asc") {
            Some(SortOrder::Asc)
        } else if token.eq_ignore_ascii_case("desc") {
            Some(SortOrder::Desc)
        } else {
            None
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

/// A dotted sequence of member names, not yet bound to any type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberChain(pub Vec<String>);

impl MemberChain {
    /// Split chain text on '.', discarding empty parts.
    pub fn parse(text: &str) -> MemberChain {
        MemberChain(
            text.split('.')
                .filter(|part| !part.is_empty())
                .map(|part| part.to_string())
                .collect(),
        )
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for MemberChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// One parsed ordering key: a member chain plus a direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderingSpec {
    pub chain: MemberChain,
    pub direction: SortOrder,
}
