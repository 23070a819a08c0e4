use serde::{Deserialize, Serialize};

/// Macro to generate a serde enum with as_str + Display
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

// Pending, Shipped and Delivered are accepted when reading stored history
// but nothing in the desk moves an order into them.
str_enum!(OrderStatus {
    Pending => "Pending",
    Confirmed => "Confirmed",
    Shipped => "Shipped",
    Delivered => "Delivered",
});
