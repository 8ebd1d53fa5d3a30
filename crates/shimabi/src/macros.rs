//! Table macros for the closed ABI enumerations.

/// Declares a closed, `#[repr]` enumeration with stable discriminants.
///
/// Generates:
/// 1. The enum itself (`Copy`, `Eq`, `Hash`, `Debug`)
/// 2. `from_raw` returning `None` for any value outside the table
/// 3. `raw` returning the wire value
/// 4. `name` returning the snake_case ABI name
macro_rules! wasi_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $repr:ty {
            $( $(#[$vmeta:meta])* $variant:ident = $value:expr => $abi:literal, )*
        }
    ) => {
        $(#[$meta])*
        #[repr($repr)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant = $value, )*
        }

        impl $name {
            /// Every variant, in wire order.
            pub const ALL: &'static [$name] = &[ $( $name::$variant, )* ];

            /// Returns the variant for a wire value, or `None` if it is not in the ABI.
            pub fn from_raw(raw: $repr) -> Option<Self> {
                match raw {
                    $( v if v == $value => Some($name::$variant), )*
                    _ => None,
                }
            }

            /// The wire value.
            #[inline]
            pub fn raw(self) -> $repr {
                self as $repr
            }

            /// The ABI spelling, e.g. `"monotonic"`.
            pub fn name(self) -> &'static str {
                match self {
                    $( $name::$variant => $abi, )*
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}
