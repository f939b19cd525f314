use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid {field} value: '{value}'")]
    InvalidEnum { field: String, value: String },
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
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

str_enum!(Gender {
    Male => "Male",
    Female => "Female",
    Other => "Other",
});

// Ayurvedic prakriti: single, dual, and balanced dosha types.
str_enum!(Constitution {
    Vata => "Vata",
    Pitta => "Pitta",
    Kapha => "Kapha",
    VataPitta => "Vata-Pitta",
    PittaKapha => "Pitta-Kapha",
    VataKapha => "Vata-Kapha",
    TriDosha => "Tri-Dosha",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn gender_round_trip() {
        for (variant, s) in [
            (Gender::Male, "Male"),
            (Gender::Female, "Female"),
            (Gender::Other, "Other"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(Gender::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn constitution_round_trip() {
        for (variant, s) in [
            (Constitution::Vata, "Vata"),
            (Constitution::Pitta, "Pitta"),
            (Constitution::Kapha, "Kapha"),
            (Constitution::VataPitta, "Vata-Pitta"),
            (Constitution::PittaKapha, "Pitta-Kapha"),
            (Constitution::VataKapha, "Vata-Kapha"),
            (Constitution::TriDosha, "Tri-Dosha"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(Constitution::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn serializes_with_display_names() {
        let json = serde_json::to_string(&Constitution::VataKapha).unwrap();
        assert_eq!(json, "\"Vata-Kapha\"");
    }

    #[test]
    fn invalid_enum_returns_error() {
        let err = Gender::from_str("male").unwrap_err();
        assert_eq!(
            err,
            ModelError::InvalidEnum {
                field: "Gender".into(),
                value: "male".into()
            }
        );
        assert!(Constitution::from_str("Tridosha").is_err());
    }
}
