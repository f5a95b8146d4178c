use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Logical kind of paging request. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// First page, requested when the local store is empty.
    Initial,
    /// Page preceding the first item currently held.
    Before,
    /// Page following the last item currently held.
    After,
}

impl Category {
    pub const COUNT: usize = 3;
    pub const ALL: [Category; Category::COUNT] =
        [Category::Initial, Category::Before, Category::After];

    pub(crate) fn index(self) -> usize {
        match self {
            Category::Initial => 0,
            Category::Before => 1,
            Category::After => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Initial => "initial",
            Category::Before => "before",
            Category::After => "after",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown request category: {0:?}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| UnknownCategory(raw.to_string()))
    }
}
