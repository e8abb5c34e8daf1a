pub mod ordering;
pub mod values;

pub use self::ordering::{MemberChain, OrderingSpec, SortOrder};
pub use self::values::Value;
