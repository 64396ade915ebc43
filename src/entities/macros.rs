//! Macros for reducing boilerplate when declaring column maps
//!
//! Each entity declares its filterable and updatable fields as a closed enum.
//! These macros generate the enum and the matching trait implementation so
//! the allow-list lives in one place.

/// Declare a filterable-field enum and implement [`FilterColumns`](crate::query::FilterColumns)
///
/// Each variant maps to `(request key, column, operator)` and optionally a
/// [`ValueKind`](crate::query::ValueKind) (defaults to `Text`). Variant order is
/// the order predicate terms are emitted in.
///
/// # Example
/// ```rust,ignore
/// filter_columns! {
///     /// Filters accepted by the item search
///     pub enum ItemFilter {
///         Name => ("name", "name", Contains),
///         MaxPrice => ("maxPrice", "initial_price", AtMost, Numeric),
///     }
/// }
/// ```
#[macro_export]
macro_rules! filter_columns {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => ($key:literal, $column:literal, $op:ident $(, $kind:ident)?)
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant
            ),+
        }

        impl $crate::query::FilterColumns for $name {
            const ALL: &'static [Self] = &[$($name::$variant),+];

            fn key(self) -> &'static str {
                match self {
                    $($name::$variant => $key),+
                }
            }

            fn column(self) -> &'static str {
                match self {
                    $($name::$variant => $column),+
                }
            }

            fn op(self) -> $crate::query::FilterOp {
                match self {
                    $($name::$variant => $crate::query::FilterOp::$op),+
                }
            }

            fn kind(self) -> $crate::query::ValueKind {
                match self {
                    $($name::$variant => $crate::filter_columns!(@kind $($kind)?)),+
                }
            }
        }
    };
    (@kind) => {
        $crate::query::ValueKind::Text
    };
    (@kind $kind:ident) => {
        $crate::query::ValueKind::$kind
    };
}

/// Declare an updatable-field enum and implement [`UpdateColumns`](crate::query::UpdateColumns)
///
/// Each variant maps a semantic field name to its column.
///
/// # Example
/// ```rust,ignore
/// update_columns! {
///     pub enum ItemColumn {
///         Name => ("name", "name"),
///         InitialPrice => ("initialPrice", "initial_price"),
///     }
/// }
/// ```
#[macro_export]
macro_rules! update_columns {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => ($field:literal, $column:literal)
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant
            ),+
        }

        impl $crate::query::UpdateColumns for $name {
            const ALL: &'static [Self] = &[$($name::$variant),+];

            fn field(self) -> &'static str {
                match self {
                    $($name::$variant => $field),+
                }
            }

            fn column(self) -> &'static str {
                match self {
                    $($name::$variant => $column),+
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::query::{FilterColumns, FilterOp, UpdateColumns, ValueKind};

    filter_columns! {
        enum BikeFilter {
            Brand => ("brand", "brand", Contains),
            MinGears => ("minGears", "gear_count", AtLeast, Numeric),
        }
    }

    update_columns! {
        enum BikeColumn {
            Brand => ("brand", "brand"),
            GearCount => ("gearCount", "gear_count"),
        }
    }

    #[test]
    fn test_filter_columns_macro() {
        assert_eq!(BikeFilter::ALL, &[BikeFilter::Brand, BikeFilter::MinGears]);
        assert_eq!(BikeFilter::MinGears.key(), "minGears");
        assert_eq!(BikeFilter::MinGears.column(), "gear_count");
        assert_eq!(BikeFilter::MinGears.op(), FilterOp::AtLeast);
        assert_eq!(BikeFilter::MinGears.kind(), ValueKind::Numeric);
        assert_eq!(BikeFilter::Brand.kind(), ValueKind::Text);
        assert_eq!(BikeFilter::from_key("brand"), Some(BikeFilter::Brand));
    }

    #[test]
    fn test_update_columns_macro() {
        assert_eq!(BikeColumn::column_for("gearCount"), Some("gear_count"));
        assert_eq!(BikeColumn::column_for("colour"), None);
        assert_eq!(BikeColumn::Brand.field(), "brand");
    }
}
