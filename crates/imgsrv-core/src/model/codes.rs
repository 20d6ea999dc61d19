//! Enumerations persisted as stable text codes

/// Declare an enum stored as a text code
///
/// Generates `as_str`, `ALL`, `Display`, `FromStr` (unknown codes are an
/// `UnknownCode` error), serde as the code string, and `Into<Value>`.
macro_rules! code_enum {
    (
        $(#[$doc:meta])*
        $name:ident {
            $($variant:ident => $code:literal),+ $(,)?
        }
    ) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $code)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Stable code stored in the database
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $code,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::errors::ExError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($code => Ok($name::$variant),)+
                    other => Err($crate::errors::DomainError::UnknownCode {
                        enum_name: stringify!($name),
                        code: other.to_string(),
                    }
                    .into()),
                }
            }
        }

        impl From<$name> for $crate::model::Value {
            fn from(v: $name) -> Self {
                $crate::model::Value::Text(v.as_str().to_string())
            }
        }
    };
}

pub(crate) use code_enum;

/// Declare the field enum of an entity
///
/// The first variant must be the key column.
macro_rules! entity_fields {
    (
        $(#[$doc:meta])*
        $name:ident {
            $key:ident => $key_col:literal,
            $($variant:ident => $column:literal),+ $(,)?
        }
    ) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $key,
            $($variant,)+
        }

        impl $crate::model::Field for $name {
            const KEY: Self = $name::$key;
            const ALL: &'static [Self] = &[$name::$key, $($name::$variant),+];

            fn column(self) -> &'static str {
                match self {
                    $name::$key => $key_col,
                    $($name::$variant => $column,)+
                }
            }
        }
    };
}

pub(crate) use entity_fields;
