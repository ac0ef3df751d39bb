// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative macros for reducing boilerplate.
//!
//! - [`simple_display!`] — `Display` impl mapping enum variants to string literals
//! - [`setters!`] — setter methods for production builder/config structs

/// Generate a `Display` impl that maps enum variants to string literals.
///
/// Unit variants match directly; data-carrying variants use `(..)` to ignore fields.
#[macro_export]
macro_rules! simple_display {
    ($enum:ty { $( $variant:ident $(( $($ignore:tt)* ))? => $str:expr ),+ $(,)? }) => {
        impl std::fmt::Display for $enum {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(match self {
                    $( Self::$variant $(( $($ignore)* ))? => $str, )+
                })
            }
        }
    };
}

/// Generate setter methods for a builder struct.
///
/// Field groups:
/// - `into { field: Type }` — setter uses `impl Into<Type>`
/// - `set { field: Type }` — setter takes `Type` directly
/// - `option { field: Type }` — builder field is `Option<Type>`, setter wraps in `Some(v.into())`
#[macro_export]
macro_rules! setters {
    (
        $( into { $( $into_field:ident : $into_ty:ty ),* $(,)? } )?
        $( set { $( $set_field:ident : $set_ty:ty ),* $(,)? } )?
        $( option { $( $opt_field:ident : $opt_ty:ty ),* $(,)? } )?
    ) => {
        $( $(
            pub fn $into_field(mut self, value: impl Into<$into_ty>) -> Self {
                self.$into_field = value.into();
                self
            }
        )* )?
        $( $(
            pub fn $set_field(mut self, value: $set_ty) -> Self {
                self.$set_field = value;
                self
            }
        )* )?
        $( $(
            pub fn $opt_field(mut self, value: impl Into<$opt_ty>) -> Self {
                self.$opt_field = Some(value.into());
                self
            }
        )* )?
    };
}
