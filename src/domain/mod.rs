/// A closed set of lowercase string values, stored as TEXT and sent as JSON strings.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!(
                        "unknown {} '{}'",
                        stringify!($name),
                        other
                    )),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<$name> for rusqlite::types::Value {
            fn from(value: $name) -> Self {
                rusqlite::types::Value::Text(value.as_str().to_string())
            }
        }
    };
}

pub mod activity;
pub mod blog;
pub mod book;
pub mod calendar;
pub mod challenge;
pub mod goal;
pub mod movie;
pub mod photo;
pub mod timestamp;
pub mod user;

#[cfg(test)]
mod tests {
    text_enum! {
        pub enum Flavor {
            Sweet => "sweet",
            SaltAndVinegar => "salt_and_vinegar",
        }
    }

    #[test]
    fn text_round_trips_through_from_str() {
        for flavor in Flavor::ALL {
            assert_eq!(flavor.as_str().parse::<Flavor>().unwrap(), *flavor);
        }
        assert!("bitter".parse::<Flavor>().is_err());
    }

    #[test]
    fn serde_uses_the_text_form() {
        assert_eq!(
            serde_json::to_string(&Flavor::SaltAndVinegar).unwrap(),
            "\"salt_and_vinegar\""
        );
        let parsed: Flavor = serde_json::from_str("\"sweet\"").unwrap();
        assert_eq!(parsed, Flavor::Sweet);
    }
}
