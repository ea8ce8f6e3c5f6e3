//! Common types used across the service

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Declares a selection field: a closed set of values with a stable storage key
/// and a human readable label.
macro_rules! selection {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => ($key:literal, $label:literal) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $( $(#[$vmeta])* #[serde(rename = $key)] $variant ),+
        }

        impl $name {
            /// Every value of the selection, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Storage key
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $key),+
                }
            }

            /// Display label
            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::types::UnknownSelection;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($key => Ok($name::$variant),)+
                    _ => Err($crate::types::UnknownSelection {
                        selection: stringify!($name),
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

/// A stored value that is not part of its selection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {selection} value: {value}")]
pub struct UnknownSelection {
    pub selection: &'static str,
    pub value: String,
}

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl Pagination {
    /// Number of rows to skip
    pub fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1) * self.per_page as usize
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    /// Slice an already filtered list into one page
    pub fn from_items(items: Vec<T>, pagination: &Pagination) -> Self {
        let total_items = items.len() as u64;
        let per_page = pagination.per_page.max(1);
        let total_pages = ((total_items + per_page as u64 - 1) / per_page as u64) as u32;
        let data = items
            .into_iter()
            .skip(pagination.offset())
            .take(per_page as usize)
            .collect();

        Self {
            data,
            pagination: PaginationMeta {
                page: pagination.page.max(1),
                per_page,
                total_items,
                total_pages,
            },
        }
    }
}
