// src/common/extract.rs

use axum::extract::{FromRequest, FromRequestParts};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};

use crate::common::error::AppError;

// Extratores que trocam a rejeição padrão do axum (texto puro, 415/422)
// pelo nosso `{ "error": ... }` com status 400.

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// Corpo que aceita um objeto único ou um array de objetos.
#[derive(Debug, Clone)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn is_many(&self) -> bool {
        matches!(self, OneOrMany::Many(_))
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

// Desserialização manual: com `#[serde(untagged)]` um campo com tipo errado
// vira "data did not match any variant", sem dizer qual item falhou.
impl<'de, T> Deserialize<'de> for OneOrMany<T>
where
    T: DeserializeOwned,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Array(values) => values
                .into_iter()
                .enumerate()
                .map(|(index, value)| {
                    T::deserialize(value).map_err(|e| D::Error::custom(format!("item {index}: {e}")))
                })
                .collect::<Result<Vec<T>, _>>()
                .map(OneOrMany::Many),
            value @ serde_json::Value::Object(_) => T::deserialize(value)
                .map(OneOrMany::One)
                .map_err(D::Error::custom),
            _ => Err(D::Error::custom("esperado um objeto ou um array de objetos")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        codigo: i32,
    }

    #[test]
    fn aceita_objeto_ou_array() {
        let um: OneOrMany<Item> = serde_json::from_str(r#"{"codigo": 1}"#).unwrap();
        assert!(!um.is_many());
        assert_eq!(um.into_vec(), vec![Item { codigo: 1 }]);

        let varios: OneOrMany<Item> = serde_json::from_str(r#"[{"codigo": 1}, {"codigo": 2}]"#).unwrap();
        assert!(varios.is_many());
        assert_eq!(varios.into_vec().len(), 2);
    }

    #[test]
    fn erro_aponta_o_item() {
        let err = serde_json::from_str::<OneOrMany<Item>>(r#"[{"codigo": 1}, {"codigo": "x"}]"#).unwrap_err();
        assert!(err.to_string().contains("item 1"));

        assert!(serde_json::from_str::<OneOrMany<Item>>("42").is_err());
    }
}
