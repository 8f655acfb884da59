/// Declare an enumeration carried on the wire as a 32-bit integer.
///
/// Generates the `#[repr(i32)]` enum plus range-checked conversion from the
/// raw value (`TryFrom<i32>` / `TryFrom<u32>`), a stable text name per
/// variant, and `Display`.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $value:literal => $text:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(i32)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant = $value,
            )+
        }

        impl $name {
            /// Every variant in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Raw wire value.
            pub const fn code(self) -> i32 {
                self as i32
            }

            /// Stable text name.
            pub const fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }

            /// Inverse of [`name`](Self::name).
            pub fn from_name(name: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|v| v.name() == name)
            }
        }

        impl TryFrom<i32> for $name {
            type Error = $crate::error::IntegrityError;

            fn try_from(value: i32) -> ::std::result::Result<Self, $crate::error::IntegrityError> {
                match value {
                    $($value => Ok($name::$variant),)+
                    _ => Err($crate::error::IntegrityError::InvalidEnumerator {
                        enumeration: stringify!($name),
                        value: i64::from(value),
                    }),
                }
            }
        }

        impl TryFrom<u32> for $name {
            type Error = $crate::error::IntegrityError;

            fn try_from(value: u32) -> ::std::result::Result<Self, $crate::error::IntegrityError> {
                match i32::try_from(value) {
                    Ok(v) => Self::try_from(v),
                    Err(_) => Err($crate::error::IntegrityError::InvalidEnumerator {
                        enumeration: stringify!($name),
                        value: i64::from(value),
                    }),
                }
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> i32 {
                value as i32
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}
